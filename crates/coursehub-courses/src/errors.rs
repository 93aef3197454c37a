use coursehub_net::NetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourseError {
    #[error(transparent)]
    Net(#[from] NetError),
    #[error("course payload decode failed: {0}")]
    Decode(String),
    #[error("invalid course: {0}")]
    Invalid(String),
}

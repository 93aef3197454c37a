pub mod client;
pub mod errors;
pub mod model;
pub mod search;

pub use client::CoursesApi;
pub use errors::CourseError;
pub use model::{Course, CourseSection, CourseVideo, NewCourse};
pub use search::CourseSearch;

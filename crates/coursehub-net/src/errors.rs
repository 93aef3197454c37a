use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    Transport,
    UpstreamStatus,
    Decode,
    Config,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Transport => "net.transport",
            ErrorCode::UpstreamStatus => "net.upstream_status",
            ErrorCode::Decode => "net.decode",
            ErrorCode::Config => "net.config",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorObj {
    pub code: ErrorCode,
    pub message_user: String,
    pub message_dev: Option<String>,
    pub http_status: Option<u16>,
}

impl ErrorObj {
    /// The most specific description available, used in logs.
    pub fn message(&self) -> &str {
        self.message_dev.as_deref().unwrap_or(&self.message_user)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}", .0.message())]
pub struct NetError(pub Box<ErrorObj>);

impl NetError {
    fn build(code: ErrorCode, user: &str, dev: impl Into<String>, status: Option<u16>) -> Self {
        NetError(Box::new(ErrorObj {
            code,
            message_user: user.to_string(),
            message_dev: Some(dev.into()),
            http_status: status,
        }))
    }

    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn code(&self) -> ErrorCode {
        self.0.code
    }

    pub fn message(&self) -> &str {
        self.0.message()
    }

    pub fn status(&self) -> Option<u16> {
        self.0.http_status
    }

    pub fn transport(detail: &str) -> Self {
        Self::build(
            ErrorCode::Transport,
            "Upstream request failed.",
            detail,
            None,
        )
    }

    pub fn upstream_status(status: u16) -> Self {
        Self::build(
            ErrorCode::UpstreamStatus,
            "Upstream request failed.",
            format!("Request failed with status code {status}"),
            Some(status),
        )
    }

    pub fn decode(detail: &str) -> Self {
        Self::build(
            ErrorCode::Decode,
            "Upstream response could not be read.",
            detail,
            None,
        )
    }

    pub fn config(detail: &str) -> Self {
        Self::build(
            ErrorCode::Config,
            "Request client configuration is invalid.",
            detail,
            None,
        )
    }
}

impl From<reqwest::Error> for NetError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return NetError::upstream_status(status.as_u16());
        }
        if err.is_decode() || err.is_body() {
            return NetError::decode(&format!("response body error: {err}"));
        }
        NetError::transport(&format!("request error: {err}"))
    }
}

impl From<config::ConfigError> for NetError {
    fn from(err: config::ConfigError) -> Self {
        NetError::config(&format!("configuration load failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefers_dev_message() {
        let err = NetError::transport("Network Error");
        assert_eq!(err.to_string(), "Network Error");
        assert_eq!(err.code(), ErrorCode::Transport);
    }

    #[test]
    fn status_errors_carry_code() {
        let err = NetError::upstream_status(503);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.message(), "Request failed with status code 503");
        assert_eq!(NetError::config("bad").code().as_str(), "net.config");
    }
}

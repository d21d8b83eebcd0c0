use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherError {
    pub status_code: u16,
    pub cause: String,
    pub message: Option<String>,
}

impl DispatcherError {
    pub fn new(
        cause: &str,
        message: &str,
    ) -> Self {
        Self {
            status_code: 500,
            cause: cause.to_string(),
            message: Some(message.to_string()),
        }
    }

    pub fn bad_request(
        cause: &str,
        message: &str,
    ) -> Self {
        Self {
            status_code: 400,
            cause: cause.to_string(),
            message: Some(message.to_string()),
        }
    }

    pub fn is_validation(&self) -> bool {
        self.status_code == 400
    }
}

impl std::error::Error for DispatcherError {}

impl fmt::Display for DispatcherError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", message, self.cause),
            None => write!(f, "{}", self.cause),
        }
    }
}

use std::fmt;

/// Transport-level failure talking to the vehicle bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum HTTPError {
    /// The bridge did not answer within the request timeout.
    Timeout,
    /// No connection to the bridge could be established.
    NoConnection,
    /// The bridge answered with a 4xx code, the request itself was refused.
    BadRequest { code: u16, detail: String },
    /// The bridge answered with a 5xx code.
    InternalServer(u16),
    /// The answer could not be parsed.
    Decode(String),
    Unknown(String),
}

impl HTTPError {
    /// The bridge received the request and refused it.
    pub fn is_rejection(&self) -> bool { matches!(self, HTTPError::BadRequest { .. }) }
}

impl fmt::Display for HTTPError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HTTPError::Timeout => write!(f, "request timed out"),
            HTTPError::NoConnection => write!(f, "no connection to vehicle bridge"),
            HTTPError::BadRequest { code, detail } => write!(f, "bad request ({code}): {detail}"),
            HTTPError::InternalServer(code) => write!(f, "vehicle bridge error ({code})"),
            HTTPError::Decode(why) => write!(f, "malformed response: {why}"),
            HTTPError::Unknown(why) => write!(f, "unknown transport error: {why}"),
        }
    }
}

impl std::error::Error for HTTPError {}

impl From<reqwest::Error> for HTTPError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            HTTPError::Timeout
        } else if value.is_connect() {
            HTTPError::NoConnection
        } else if value.is_decode() {
            HTTPError::Decode(value.to_string())
        } else {
            HTTPError::Unknown(value.to_string())
        }
    }
}

/// Passes successful responses on and turns error codes into [`HTTPError`].
pub(crate) async fn unwrap_return_code(response: reqwest::Response) -> Result<reqwest::Response, HTTPError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status.is_server_error() {
        Err(HTTPError::InternalServer(status.as_u16()))
    } else if status.is_client_error() {
        let detail = response.text().await.unwrap_or_default();
        Err(HTTPError::BadRequest { code: status.as_u16(), detail })
    } else {
        Err(HTTPError::Unknown(format!("unexpected status {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::HTTPError;

    #[test]
    fn test_only_bad_requests_are_rejections() {
        let refused = HTTPError::BadRequest { code: 409, detail: String::from("not armed") };
        assert!(refused.is_rejection());
        assert!(!HTTPError::Timeout.is_rejection());
        assert!(!HTTPError::InternalServer(503).is_rejection());
        assert_eq!(refused.to_string(), "bad request (409): not armed");
    }
}

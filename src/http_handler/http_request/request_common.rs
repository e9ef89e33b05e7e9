/// HTTP methods used by the vehicle bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HTTPRequestMethod {
    Get,
    Post,
    Put,
}

/// A request against one vehicle bridge endpoint.
pub(crate) trait HTTPRequestType: Send {
    /// Type of the expected response.
    type Response: for<'de> serde::Deserialize<'de>;
    /// Type of the JSON body, `()` for requests without one.
    type Body: serde::Serialize;
    /// `str` object representing the specific endpoint.
    fn endpoint(&self) -> &'static str;
    /// The corresponding HTTP Request Method.
    fn request_method(&self) -> HTTPRequestMethod;
    /// The JSON body, if the request carries one.
    fn body(&self) -> Option<&Self::Body> { None }
}

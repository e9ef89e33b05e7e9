use super::http_request::request_common::{HTTPRequestMethod, HTTPRequestType};
use super::http_response::response_common::{HTTPError, unwrap_return_code};
use std::time::Duration;

/// A thin wrapper around `reqwest::Client` with a fixed base URL and request timeout.
#[derive(Debug)]
pub(crate) struct HTTPClient {
    /// The underlying `reqwest::Client` used to perform HTTP requests.
    client: reqwest::Client,
    /// Base URL of the vehicle bridge, prepended to all endpoint paths.
    base_url: String,
}

impl HTTPClient {
    /// Timeout applied to every single request.
    pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    /// Constructs a new `HTTPClient` for `base_url`.
    ///
    /// A trailing slash on `base_url` is dropped, endpoints always start with one.
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Result<HTTPClient, HTTPError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HTTPClient { client, base_url: String::from(base_url.trim_end_matches('/')) })
    }

    /// Returns the base URL that the client was initialized with.
    pub(crate) fn url(&self) -> &str { self.base_url.as_str() }

    /// Sends `request` to its endpoint and parses the JSON answer.
    pub(crate) async fn send<R: HTTPRequestType>(&self, request: R) -> Result<R::Response, HTTPError> {
        let url = format!("{}{}", self.base_url, request.endpoint());
        let builder = match request.request_method() {
            HTTPRequestMethod::Get => self.client.get(url),
            HTTPRequestMethod::Post => self.client.post(url),
            HTTPRequestMethod::Put => self.client.put(url),
        };
        let builder = match request.body() {
            Some(body) => builder.json(body),
            None => builder,
        };
        let response = unwrap_return_code(builder.send().await?).await?;
        Ok(response.json::<R::Response>().await?)
    }
}

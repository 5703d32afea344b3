use reqwest::Client;

use crate::transport::{
    BoxFuture, CredentialsPolicy, Transport, TransportError, TransportRequest, TransportResponse,
};

/// [`Transport`] backed by `reqwest`.
///
/// Native clients have no browser cookie jar, so credential policies map to
/// two clients: one with a cookie store (`include`, `same-origin`) and one
/// without (`omit`). Bodies are buffered in full before the response is
/// returned, so a failed body read is a transport failure.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    with_cookies: Client,
    without_cookies: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let with_cookies = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::with_source("failed to build HTTP client", e))?;
        Ok(Self {
            with_cookies,
            without_cookies: Client::new(),
        })
    }

    fn client_for(&self, policy: CredentialsPolicy) -> &Client {
        match policy {
            CredentialsPolicy::Include | CredentialsPolicy::SameOrigin => &self.with_cookies,
            CredentialsPolicy::Omit => &self.without_cookies,
        }
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, TransportError>> {
        let mut builder = self
            .client_for(request.credentials)
            .request(request.method.into(), &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let url = request.url;

        Box::pin(async move {
            let resp = builder
                .send()
                .await
                .map_err(|e| TransportError::with_source(format!("request to {url} failed"), e))?;
            let status = resp.status();
            let body = resp.bytes().await.map_err(|e| {
                TransportError::with_source(format!("reading response from {url} failed"), e)
            })?;
            Ok(TransportResponse::new(status, body))
        })
    }
}

//! Browser-profile dispatcher.
//!
//! Mirrors what a page script gets from the platform: one ambient client,
//! timeout-driven cancellation, and none of the transport knobs. The
//! native-only option fields (`agent`, `cookie_jar`) have no effect here,
//! the same way a browser ignores unrecognized request-init members;
//! cookie handling and TLS policy belong to the platform.

use std::sync::OnceLock;

use reqwest::Response;
use tracing::debug;
use url::Url;

use crate::deadline;
use crate::error::FetchError;
use crate::init::{normalize, FetchInit};

/// Process-wide client, standing in for the browser's ambient fetch.
fn platform_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

/// Dispatch a request through the ambient client.
///
/// Normalizes the options and races the request against its timeout or
/// cancellation token. The response is returned untouched; HTTP error
/// statuses are successful results.
pub async fn fetch(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    let url = Url::parse(url.as_ref())?;
    let init = normalize(init)?;

    debug!(
        method = %init.method,
        url = %url,
        timeout = ?init.timeout,
        "dispatching request"
    );

    let mut request = platform_client()
        .request(init.method, url)
        .headers(init.headers);
    if let Some(body) = init.body {
        request = request.body(body.into_transport());
    }

    deadline::run(
        async move { request.send().await.map_err(FetchError::from) },
        init.timeout,
        init.cancel,
    )
    .await
}

fn with_method(init: FetchInit, method: &str) -> FetchInit {
    FetchInit {
        method: Some(method.to_owned()),
        ..init
    }
}

/// Dispatch with the method forced to GET.
pub async fn get(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    fetch(url, with_method(init, "GET")).await
}

/// Dispatch with the method forced to HEAD.
pub async fn head(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    fetch(url, with_method(init, "HEAD")).await
}

/// Dispatch with the method forced to POST.
pub async fn post(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    fetch(url, with_method(init, "POST")).await
}

/// Dispatch with the method forced to PUT.
pub async fn put(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    fetch(url, with_method(init, "PUT")).await
}

/// Dispatch with the method forced to DELETE.
pub async fn delete(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    fetch(url, with_method(init, "DELETE")).await
}

/// Dispatch with the method forced to CONNECT.
pub async fn connect(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    fetch(url, with_method(init, "CONNECT")).await
}

/// Dispatch with the method forced to OPTIONS.
pub async fn options(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    fetch(url, with_method(init, "OPTIONS")).await
}

/// Dispatch with the method forced to TRACE.
pub async fn trace(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    fetch(url, with_method(init, "TRACE")).await
}

/// Dispatch with the method forced to PATCH.
pub async fn patch(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    fetch(url, with_method(init, "PATCH")).await
}

//! Server-side dispatcher.
//!
//! Adds what a browser environment would not let a caller control:
//! per-scheme transport agents, TLS verification toggles, and cookie-jar
//! routing. Everything else is shared with the web dispatcher through
//! [`normalize`](crate::init::normalize).

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::Response;
use tracing::{debug, warn};
use url::Url;

use crate::deadline;
use crate::error::FetchError;
use crate::init::{normalize, FetchInit};

/// A transport agent: the connection-pooling and TLS configuration a
/// request is dispatched through.
///
/// When absent from the options, one is selected from the URL scheme:
/// [`Agent::Https`] carrying the resolved `reject_unauthorized` flag for
/// `https` URLs, [`Agent::Http`] otherwise.
#[derive(Debug, Clone)]
pub enum Agent {
    /// Plain HTTP connection pool.
    Http,
    /// TLS connection pool. `reject_unauthorized: false` accepts invalid
    /// and self-signed certificates.
    Https { reject_unauthorized: bool },
    /// Caller-owned client, shared across calls for pool reuse.
    Client(reqwest::Client),
}

impl Agent {
    fn for_url(url: &Url, reject_unauthorized: bool) -> Self {
        if url.scheme().eq_ignore_ascii_case("https") {
            Agent::Https { reject_unauthorized }
        } else {
            Agent::Http
        }
    }

    /// Build the client this agent stands for, installing the cookie jar
    /// when one was supplied.
    fn build_client(
        self,
        jar: Option<Arc<Jar>>,
        reject_unauthorized: bool,
    ) -> Result<reqwest::Client, FetchError> {
        match (self, jar) {
            (Agent::Client(client), None) => Ok(client),
            (agent, jar) => {
                let mut builder = reqwest::Client::builder();

                match agent {
                    Agent::Http => {}
                    Agent::Https {
                        reject_unauthorized,
                    } => {
                        builder = builder.danger_accept_invalid_certs(!reject_unauthorized);
                    }
                    Agent::Client(_) => {
                        // The transport binds cookie stores at client
                        // construction, so a jar cannot be attached to an
                        // existing client. The jar wins and the supplied
                        // client's pool settings are lost.
                        warn!("cookie jar supplied alongside a caller-owned client; building a fresh client");
                        builder = builder.danger_accept_invalid_certs(!reject_unauthorized);
                    }
                }

                if let Some(jar) = jar {
                    builder = builder.cookie_provider(jar);
                }

                Ok(builder.build()?)
            }
        }
    }
}

/// Dispatch a request.
///
/// Normalizes the options, selects a transport agent when none was
/// supplied, routes through the cookie jar when one was, and races the
/// request against its timeout or cancellation token. The response is
/// returned untouched; HTTP error statuses are successful results.
///
/// ```rust,ignore
/// use unifetch::{fetch, FetchInit};
/// use serde_json::json;
///
/// let response = fetch("https://example.com/api", FetchInit {
///     method: Some("post".into()),
///     json: Some(json!({ "n": 1 }).into()),
///     ..Default::default()
/// })
/// .await?;
/// ```
pub async fn fetch(url: impl AsRef<str>, init: FetchInit) -> Result<Response, FetchError> {
    let url = Url::parse(url.as_ref())?;
    let init = normalize(init)?;

    debug!(
        method = %init.method,
        url = %url,
        timeout = ?init.timeout,
        "dispatching request"
    );

    let agent = match init.agent.clone() {
        Some(agent) => agent,
        None => Agent::for_url(&url, init.reject_unauthorized),
    };
    let client = agent.build_client(init.cookie_jar.clone(), init.reject_unauthorized)?;

    let mut request = client.request(init.method, url).headers(init.headers);
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

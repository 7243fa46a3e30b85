//! Request initialization options and the normalization pipeline.
//!
//! Every request, from either dispatcher, funnels through [`normalize`]
//! before anything touches the network. The pipeline resolves defaults,
//! validates the method, coerces headers into a canonical [`HeaderMap`],
//! and reconciles the mutually exclusive body-encoding modes.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::Method;
use reqwest::cookie::Jar;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::native::Agent;
use crate::params::UrlEncodedParams;

/// The nine request methods recognized by the normalizer. Anything else
/// is rejected outright rather than silently defaulted.
pub const METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
    Method::PATCH,
];

/// The accepted shapes for the `headers` field.
///
/// The shape is carried by the variant tag rather than inspected at
/// runtime. Entries that fail to parse into canonical header names or
/// values are rejected during coercion.
#[derive(Debug, Clone)]
pub enum HeaderInput {
    /// Ordered list of (name, value) pairs, inserted in order.
    Pairs(Vec<(String, String)>),
    /// Plain mapping, inserted in iteration order.
    Map(BTreeMap<String, String>),
    /// Already-canonical header map, used as-is.
    Canonical(HeaderMap),
}

impl Default for HeaderInput {
    fn default() -> Self {
        HeaderInput::Pairs(Vec::new())
    }
}

impl From<HeaderMap> for HeaderInput {
    fn from(map: HeaderMap) -> Self {
        HeaderInput::Canonical(map)
    }
}

impl From<Vec<(String, String)>> for HeaderInput {
    fn from(pairs: Vec<(String, String)>) -> Self {
        HeaderInput::Pairs(pairs)
    }
}

impl From<BTreeMap<String, String>> for HeaderInput {
    fn from(map: BTreeMap<String, String>) -> Self {
        HeaderInput::Map(map)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for HeaderInput {
    fn from(pairs: [(&str, &str); N]) -> Self {
        HeaderInput::Pairs(
            pairs
                .into_iter()
                .map(|(n, v)| (n.to_owned(), v.to_owned()))
                .collect(),
        )
    }
}

/// A JSON request payload.
///
/// Pre-serialized text is used verbatim; a [`Value`] is serialized during
/// normalization.
#[derive(Debug, Clone)]
pub enum JsonPayload {
    Text(String),
    Value(Value),
}

impl From<Value> for JsonPayload {
    fn from(value: Value) -> Self {
        JsonPayload::Value(value)
    }
}

impl From<String> for JsonPayload {
    fn from(text: String) -> Self {
        JsonPayload::Text(text)
    }
}

impl From<&str> for JsonPayload {
    fn from(text: &str) -> Self {
        JsonPayload::Text(text.to_owned())
    }
}

/// A form-data request payload.
#[derive(Debug, Clone)]
pub enum FormPayload {
    /// Already URL-encoded parameters, assigned to the body as-is.
    Encoded(UrlEncodedParams),
    /// Key/value fields, run through the URL encoder.
    Fields(serde_json::Map<String, Value>),
}

impl From<UrlEncodedParams> for FormPayload {
    fn from(params: UrlEncodedParams) -> Self {
        FormPayload::Encoded(params)
    }
}

impl From<serde_json::Map<String, Value>> for FormPayload {
    fn from(fields: serde_json::Map<String, Value>) -> Self {
        FormPayload::Fields(fields)
    }
}

/// A resolved request body.
#[derive(Debug, Clone)]
pub enum Body {
    /// Raw binary payload.
    Bytes(Bytes),
    /// Text payload. Serialized JSON lands here.
    Text(String),
    /// URL-encoded form payload.
    Form(UrlEncodedParams),
}

impl Body {
    /// Length of the body in bytes, as it would go on the wire.
    pub fn len(&self) -> usize {
        match self {
            Body::Bytes(b) => b.len(),
            Body::Text(s) => s.len(),
            Body::Form(p) => p.to_query().len(),
        }
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn into_transport(self) -> reqwest::Body {
        match self {
            Body::Bytes(b) => reqwest::Body::from(b),
            Body::Text(s) => reqwest::Body::from(s),
            Body::Form(p) => reqwest::Body::from(p.to_query()),
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Bytes(b)
    }
}

impl From<UrlEncodedParams> for Body {
    fn from(p: UrlEncodedParams) -> Self {
        Body::Form(p)
    }
}

/// Loosely-typed request options, the input to [`normalize`].
///
/// All fields are optional. Construct with struct-update syntax:
///
/// ```rust
/// use unifetch::FetchInit;
/// use serde_json::json;
///
/// let init = FetchInit {
///     method: Some("post".into()),
///     json: Some(json!({ "n": 1 }).into()),
///     ..Default::default()
/// };
/// ```
///
/// Each call consumes its own bag by value, so concurrent calls never
/// share mutable state through the options.
#[derive(Debug, Clone, Default)]
pub struct FetchInit {
    /// Request method in any casing; defaults to GET.
    pub method: Option<String>,
    /// Headers in any of the three accepted shapes.
    pub headers: Option<HeaderInput>,
    /// Raw body, used when neither `form_data` nor `json` is set.
    pub body: Option<Body>,
    /// Form-data payload. Takes priority over `json`.
    pub form_data: Option<FormPayload>,
    /// JSON payload.
    pub json: Option<JsonPayload>,
    /// Deadline after which the in-flight request is cancelled.
    pub timeout: Option<Duration>,
    /// Reject invalid or self-signed TLS certificates; defaults to true.
    pub reject_unauthorized: Option<bool>,
    /// Caller-supplied cancellation token. When present, no timeout timer
    /// is armed and cancellation is entirely in the caller's hands.
    pub cancel: Option<CancellationToken>,
    /// Transport agent. Native dispatcher only; selected per URL scheme
    /// when absent.
    pub agent: Option<Agent>,
    /// Cookie jar for persisting and replaying cookies. Native dispatcher
    /// only.
    pub cookie_jar: Option<Arc<Jar>>,
}

/// Fully defaulted, validated request options, ready for dispatch.
#[derive(Debug, Clone)]
pub struct NormalizedInit {
    /// One of the nine recognized verbs, uppercase by construction.
    pub method: Method,
    /// Canonical case-insensitive header map, last-write-wins.
    pub headers: HeaderMap,
    /// Absent unless the method is PUT, POST, PATCH, or DELETE.
    pub body: Option<Body>,
    pub reject_unauthorized: bool,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
    pub agent: Option<Agent>,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl From<NormalizedInit> for FetchInit {
    fn from(norm: NormalizedInit) -> Self {
        FetchInit {
            method: Some(norm.method.as_str().to_owned()),
            headers: Some(HeaderInput::Canonical(norm.headers)),
            body: norm.body,
            form_data: None,
            json: None,
            timeout: norm.timeout,
            reject_unauthorized: Some(norm.reject_unauthorized),
            cancel: norm.cancel,
            agent: norm.agent,
            cookie_jar: norm.cookie_jar,
        }
    }
}

/// Normalize a request options bag into a dispatch-ready record.
///
/// Steps, in order (later steps override earlier ones):
///
/// 1. Method: default GET, uppercase, validate against the nine-verb set.
/// 2. `reject_unauthorized`: default true.
/// 3. Headers: coerce into a canonical [`HeaderMap`].
/// 4. Body encoding: form-data wins over JSON; the chosen payload sets
///    `content-type` (overwriting any prior value) and becomes the body.
/// 5. Body suppression: methods outside PUT/POST/PATCH/DELETE carry no
///    body, even one supplied explicitly.
pub fn normalize(init: FetchInit) -> Result<NormalizedInit, FetchError> {
    let method = resolve_method(init.method.as_deref())?;
    let reject_unauthorized = init.reject_unauthorized.unwrap_or(true);
    let mut headers = coerce_headers(init.headers.unwrap_or_default())?;

    let mut body = init.body;

    if let Some(form) = init.form_data {
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let params = match form {
            FormPayload::Encoded(params) => params,
            FormPayload::Fields(fields) => UrlEncodedParams::from_map(&fields),
        };

        body = Some(Body::Form(params));
    } else if let Some(json) = init.json {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let text = match json {
            JsonPayload::Text(text) => text,
            JsonPayload::Value(value) => serde_json::to_string(&value)?,
        };

        body = Some(Body::Text(text));
    }

    // Bodies on non-body-bearing methods are dropped, not rejected.
    if !method_allows_body(&method) {
        body = None;
    }

    Ok(NormalizedInit {
        method,
        headers,
        body,
        reject_unauthorized,
        timeout: init.timeout,
        cancel: init.cancel,
        agent: init.agent,
        cookie_jar: init.cookie_jar,
    })
}

fn resolve_method(supplied: Option<&str>) -> Result<Method, FetchError> {
    let supplied = supplied.unwrap_or("GET");
    let upper = supplied.to_ascii_uppercase();

    METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
        .ok_or_else(|| FetchError::InvalidMethod(supplied.to_owned()))
}

fn method_allows_body(method: &Method) -> bool {
    matches!(method.as_str(), "PUT" | "POST" | "PATCH" | "DELETE")
}

fn coerce_headers(input: HeaderInput) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();

    match input {
        HeaderInput::Canonical(map) => return Ok(map),
        HeaderInput::Pairs(pairs) => {
            for (name, value) in pairs {
                insert_header(&mut headers, &name, &value)?;
            }
        }
        HeaderInput::Map(entries) => {
            for (name, value) in entries {
                insert_header(&mut headers, &name, &value)?;
            }
        }
    }

    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), FetchError> {
    let name_parsed =
        HeaderName::from_str(name).map_err(|_| FetchError::InvalidHeaderName(name.to_owned()))?;
    let value_parsed =
        HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeaderValue(name.to_owned()))?;

    headers.insert(name_parsed, value_parsed);
    Ok(())
}

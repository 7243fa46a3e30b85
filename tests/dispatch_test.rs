use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use unifetch::{native, web, CookieJar, FetchError, FetchInit};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn object(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

#[tokio::test]
async fn test_basic_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
        .mount(&server)
        .await;

    let response = native::fetch(format!("{}/hello", server.uri()), FetchInit::default())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "hi");
}

#[tokio::test]
async fn test_web_dispatcher_basic_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ambient"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let response = web::fetch(format!("{}/ambient", server.uri()), FetchInit::default())
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_shorthand_overrides_supplied_method() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/override"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // the caller-supplied method loses to the shorthand
    let response = native::post(
        format!("{}/override", server.uri()),
        FetchInit {
            method: Some("get".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_json_body_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json"))
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"n":1}"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = native::post(
        format!("{}/json", server.uri()),
        FetchInit {
            json: Some(json!({ "n": 1 }).into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_form_body_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("a=1&b=x"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = native::post(
        format!("{}/form", server.uri()),
        FetchInit {
            form_data: Some(object(json!({ "a": 1, "b": "x" })).into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_get_body_suppressed_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nobody"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = native::get(
        format!("{}/nobody", server.uri()),
        FetchInit {
            json: Some(json!({ "dropped": true }).into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_error_status_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = native::fetch(format!("{}/missing", server.uri()), FetchInit::default())
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_cookie_jar_persists_and_replays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "session=abc123; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let jar = Arc::new(CookieJar::default());

    native::fetch(
        format!("{}/login", server.uri()),
        FetchInit {
            cookie_jar: Some(jar.clone()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let response = native::fetch(
        format!("{}/account", server.uri()),
        FetchInit {
            cookie_jar: Some(jar),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_preseeded_jar_cookie_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pre"))
        .and(header("cookie", "tok=xyz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let jar = Arc::new(CookieJar::default());
    let origin = url::Url::parse(&server.uri()).unwrap();
    jar.add_cookie_str(&unifetch::Cookie::new("tok", "xyz").to_string(), &origin);

    let response = native::fetch(
        format!("{}/pre", server.uri()),
        FetchInit {
            cookie_jar: Some(jar),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_timeout_cancels_promptly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let started = Instant::now();
    let result = native::fetch(
        format!("{}/slow", server.uri()),
        FetchInit {
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        },
    )
    .await;

    assert!(matches!(result, Err(FetchError::Cancelled)));
    // the call settles with the timer, not with the server
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_caller_token_cancels_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = native::fetch(
        format!("{}/slow", server.uri()),
        FetchInit {
            cancel: Some(token),
            // a timeout alongside a caller token arms no timer
            timeout: Some(Duration::from_secs(60)),
            ..Default::default()
        },
    )
    .await;

    assert!(matches!(result, Err(FetchError::Cancelled)));
}

#[tokio::test]
async fn test_connection_refused_passes_through() {
    // nothing listens on this port
    let result = native::fetch("http://127.0.0.1:1/unreachable", FetchInit::default()).await;
    assert!(matches!(result, Err(FetchError::Transport(_))));
}

#[tokio::test]
async fn test_headers_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hdr"))
        .and(header("x-request-id", "42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = native::fetch(
        format!("{}/hdr", server.uri()),
        FetchInit {
            headers: Some([("X-Request-Id", "42")].into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), 200);
}

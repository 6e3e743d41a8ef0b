use std::sync::Arc;

use easyreq::{
    ClientBuilder, Cookie, EnvProxyResolver, FileUpload, Method, RequestOptions, Requester,
    StatusCode, DEFAULT_USER_AGENT,
};
use serde::Serialize;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[derive(Serialize)]
struct Note {
    text: String,
}

fn requester() -> Requester {
    let builder = ClientBuilder::new()
        .unwrap()
        .proxy_resolver(Arc::new(EnvProxyResolver::new()));
    Requester::with_client_builder(builder)
}

#[tokio::test]
async fn form_post_is_sorted_and_authenticated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/form"))
        .and(body_string("a=1&b=2"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("authorization", "Basic YWxpY2U6c2VjcmV0"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new()
        .data("b", "2")
        .data("a", "1")
        .basic_auth("alice", "secret");
    let response = requester()
        .post(&format!("{}/form", server.uri()), options)
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn json_body_and_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/notes/1"))
        .and(query_param("draft", "false"))
        .and(query_param("v", "2"))
        .and(header("content-type", "application/json"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_json(json!({ "text": "hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "saved": true })))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new()
        .json(Note { text: "hi".into() })
        .xml(Note { text: "ignored".into() })
        .param("v", "2")
        .ajax(true);
    let response = requester()
        .put(&format!("{}/notes/1?draft=false&v=1", server.uri()), options)
        .await
        .unwrap();

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["saved"], true);
}

#[tokio::test]
async fn multipart_upload_on_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(|req: &Request| {
            let body = String::from_utf8_lossy(&req.body);
            body.contains("name=\"file\"; filename=\"a.txt\"")
                && body.contains("0123456789")
                && body.contains("name=\"note\"")
        })
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new()
        .file(FileUpload::new("a.txt", &b"0123456789"[..]))
        .data("note", "hi");
    requester()
        .post(&format!("{}/upload", server.uri()), options)
        .await
        .unwrap()
        .error_for_status()
        .unwrap();
}

#[tokio::test]
async fn raw_upload_on_put() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/files/a.txt"))
        .and(header("content-type", "text/plain"))
        .and(body_string("0123456789"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new().file(FileUpload::new("a.txt", &b"0123456789"[..]));
    let response = requester()
        .perform_request(Method::PUT, &format!("{}/files/a.txt", server.uri()), options)
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn explicit_cookies_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "a=1; b=2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new()
        .cookie(Cookie::new("a", "1"))
        .cookie(Cookie::new("b", "2"));
    requester()
        .get(&format!("{}/", server.uri()), options)
        .await
        .unwrap()
        .error_for_status()
        .unwrap();
}

#[tokio::test]
async fn session_keeps_cookies_between_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "sid=abc; Path=/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("cookie", "sid=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("alice"))
        .expect(1)
        .mount(&server)
        .await;

    let session = requester().session(RequestOptions::new()).unwrap();
    session
        .post(&format!("{}/login", server.uri()), RequestOptions::new().data("user", "alice"))
        .await
        .unwrap();
    assert_eq!(session.cookie_jar().map(|jar| jar.len()), Some(1));

    let me = session
        .get(&format!("{}/me", server.uri()), RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(me.text().await.unwrap(), "alice");
}

#[tokio::test]
async fn session_merges_stored_and_explicit_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "sid=abc; Path=/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("cookie", "a=1; sid=abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let session = requester().session(RequestOptions::new()).unwrap();
    session
        .get(&format!("{}/login", server.uri()), RequestOptions::new())
        .await
        .unwrap();
    session
        .get(
            &format!("{}/me", server.uri()),
            RequestOptions::new().cookie(Cookie::new("a", "1")),
        )
        .await
        .unwrap()
        .error_for_status()
        .unwrap();
}

#[tokio::test]
async fn error_status_becomes_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = requester()
        .get(&server.uri(), RequestOptions::new())
        .await
        .unwrap()
        .error_for_status()
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(
        err.as_transport_error().and_then(|e| e.status()),
        Some(StatusCode::SERVICE_UNAVAILABLE)
    );
}

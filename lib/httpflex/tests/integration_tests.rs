//! Integration tests for `HttpFlex` and `HyperClient` using wiremock.

use std::io::Write;
use std::time::Duration;

use bytes::Bytes;
use httpflex::{
    Body, ByteStream, ContentType, HttpClient, HttpFlex, HyperClient, Json, JsonCodec, Method,
    Multipart, Request, Response, UrlEncoded,
};
use serde::{Deserialize, Serialize};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_bytes, body_json, body_string, header, method, path},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
}

fn flex(mock_server: &MockServer, route: &str) -> HttpFlex {
    HttpFlex::new(&format!("{}{route}", mock_server.uri())).expect("url")
}

async fn first_body(mock_server: &MockServer) -> String {
    let requests = mock_server
        .received_requests()
        .await
        .expect("request recording");
    let request = requests.first().expect("one request");
    String::from_utf8_lossy(&request.body).into_owned()
}

#[tokio::test]
async fn test_get_json() {
    let mock_server = MockServer::start().await;
    let user = User {
        id: 1,
        name: "Alice".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&user))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetched: User = flex(&mock_server, "/users/1")
        .header("Accept", "application/json")
        .get_json()
        .await
        .expect("user");

    assert_eq!(fetched, user);
}

#[tokio::test]
async fn test_post_json_round_trip() {
    let mock_server = MockServer::start().await;
    let input = User {
        id: 0,
        name: "Bob".to_string(),
    };
    let output = User {
        id: 42,
        name: "Bob".to_string(),
    };

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(&input))
        .respond_with(ResponseTemplate::new(201).set_body_json(&output))
        .mount(&mock_server)
        .await;

    let body = Body::json(&input).expect("json body");
    let response = flex(&mock_server, "/users")
        .exchange::<Json<User>>("post", body)
        .await
        .expect("response");

    assert_eq!(response.status(), 201);
    assert_eq!(response.into_body().into_inner(), output);
}

#[tokio::test]
async fn test_text_body_is_sent_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/notes"))
        .and(header("Content-Type", "text/plain"))
        .and(body_string("héllo, not json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = flex(&mock_server, "/notes")
        .content_type(&ContentType::PlainText)
        .exchange::<String>("put", "héllo, not json")
        .await
        .expect("response");

    assert_eq!(response.status(), 204);
    assert!(response.body().is_empty());
}

#[tokio::test]
async fn test_multipart_upload() {
    let mock_server = MockServer::start().await;

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"file content").expect("write");

    let expected = "--XyZ\r\n\
        Content-Disposition: form-data; name=\"title\"\r\n\
        \r\n\
        report\r\n\
        --XyZ\r\n\
        Content-Disposition: form-data; name=\"doc\"; filename=\"doc\"\r\n\
        Content-Type: application/octet-stream\r\n\
        \r\n\
        file content\r\n\
        --XyZ\r\n\
        Content-Disposition: form-data; name=\"pages\"\r\n\
        Content-Type: application/json\r\n\
        \r\n\
        3\r\n\
        --XyZ--\r\n";

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("Content-Type", "multipart/form-data; boundary=XyZ"))
        .and(body_string(expected))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let form = Multipart::with_boundary("XyZ")
        .put("title", "report")
        .put("doc", file.path())
        .put("pages", 3);

    let reply: String = flex(&mock_server, "/upload")
        .content_type(&ContentType::Json)
        .post(form)
        .await
        .expect("upload");

    assert_eq!(reply, "stored");
}

#[tokio::test]
async fn test_urlencoded_form() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string("user=alice&scope=read+write&remember=true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let form = UrlEncoded::new()
        .put("user", "alice")
        .put_encoded("scope", "read write")
        .put("remember", true);

    let () = flex(&mock_server, "/login").post(form).await.expect("login");
}

#[tokio::test]
async fn test_stream_body_and_stream_response() {
    let mock_server = MockServer::start().await;
    let payload: Vec<u8> = (0..10).collect();

    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(body_bytes(payload.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let stream: ByteStream = flex(&mock_server, "/echo")
        .post(Body::stream(std::io::Cursor::new(payload.clone())))
        .await
        .expect("stream");

    let received = stream.collect_bytes().await.expect("collect");
    assert_eq!(received.len(), 10);
    assert_eq!(received.as_ref(), payload.as_slice());
}

#[tokio::test]
async fn test_binary_response() {
    let mock_server = MockServer::start().await;
    let image = vec![0x89_u8, b'P', b'N', b'G', 0xFF, 0x00];

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image.clone()))
        .mount(&mock_server)
        .await;

    let bytes: Vec<u8> = flex(&mock_server, "/logo.png").get().await.expect("bytes");
    assert_eq!(bytes, image);

    // Text mode replaces invalid UTF-8 instead of failing.
    let text: String = flex(&mock_server, "/logo.png").get().await.expect("text");
    assert!(text.contains('\u{FFFD}'));
}

#[tokio::test]
async fn test_error_status_is_a_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/users/999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let response: Response<String> = flex(&mock_server, "/users/999")
        .exchange("delete", ())
        .await
        .expect("response");

    assert_eq!(response.status(), 404);
    assert!(response.is_client_error());
    assert_eq!(response.body(), "not found");
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"one"}"#))
        .mount(&mock_server)
        .await;

    let err = flex(&mock_server, "/users/1")
        .get_json::<User>()
        .await
        .expect_err("decode error");

    assert!(err.is_decode(), "Expected decode error, got: {err}");
}

#[tokio::test]
async fn test_custom_method_and_pretty_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PURGE"))
        .and(path("/cache"))
        .and(body_string("{\n  \"all\": true\n}"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let () = flex(&mock_server, "/cache")
        .json_codec(JsonCodec::Pretty)
        .method("purge", serde_json::json!({ "all": true }))
        .await
        .expect("purge");
}

#[tokio::test]
async fn test_proxy_receives_absolute_form_request() {
    // The mock server plays the proxy.
    let proxy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resource"))
        .and(header("Host", "upstream.invalid"))
        .and(header("Proxy-Authorization", "Basic dXNlcjpzZWNyZXQ="))
        .respond_with(ResponseTemplate::new(200).set_body_string("via proxy"))
        .expect(1)
        .mount(&proxy)
        .await;

    let address = proxy.address();
    let reply: String = HttpFlex::new("http://upstream.invalid/resource")
        .expect("url")
        .proxy(address.ip().to_string(), address.port())
        .proxy_auth("user", "secret")
        .get()
        .await
        .expect("proxied");

    assert_eq!(reply, "via proxy");
}

#[tokio::test]
async fn test_https_through_proxy_is_rejected() {
    let err = HttpFlex::new("https://upstream.invalid/")
        .expect("url")
        .proxy("127.0.0.1", 3128)
        .get::<String>()
        .await
        .expect_err("rejected");

    assert!(matches!(err, httpflex::Error::InvalidRequest(_)));
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    // Delay longer than client timeout
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .timeout(Duration::from_millis(100))
        .build();
    let flex = HttpFlex::with_client(client, &format!("{}/slow", mock_server.uri())).expect("url");

    let err = flex.get::<String>().await.expect_err("expected timeout error");
    assert!(err.is_timeout(), "Expected timeout error, got: {err}");
}

#[tokio::test]
async fn test_connection_error() {
    // Try to connect to a non-existent server
    let err = HttpFlex::new("http://127.0.0.1:1")
        .expect("url")
        .get::<String>()
        .await
        .expect_err("expected connection error");

    assert!(err.is_connection(), "Expected connection error, got: {err}");
}

#[tokio::test]
async fn test_raw_client_with_logging() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tags"))
        .and(header("X-Tag", "a"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Request-Id", "abc-123"))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_logging().build();
    let url = url::Url::parse(&format!("{}/tags", mock_server.uri())).expect("url");
    let request = Request::<Bytes>::builder(Method::Get, url)
        .header("X-Tag", "a")
        .build();

    let response = client.execute(request).await.expect("response");

    assert_eq!(response.status(), 200);
    assert_eq!(response.header("x-request-id"), Some("abc-123"));
}

#[tokio::test]
async fn test_download_to_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/report.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("quarterly numbers"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let target = dir.path().join("report.txt");
    let url = format!("{}/files/report.txt", mock_server.uri());

    let stored = httpflex::download_to(&url, &target).await.expect("download");
    // Already present: no second request.
    httpflex::download_to(&url, &target).await.expect("skip");

    assert_eq!(stored, target);
    assert_eq!(
        std::fs::read_to_string(&target).expect("read"),
        "quarterly numbers"
    );
}

#[tokio::test]
async fn test_fetch_bytes_and_stream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1_u8, 2, 3]))
        .mount(&mock_server)
        .await;

    let url = format!("{}/blob", mock_server.uri());

    let bytes = httpflex::fetch_bytes(&url).await.expect("bytes");
    assert_eq!(bytes.as_ref(), [1_u8, 2, 3].as_slice());

    let stream = httpflex::fetch_stream(&url).await.expect("stream");
    assert_eq!(stream.collect_bytes().await.expect("collect").len(), 3);
}

#[tokio::test]
async fn test_form_values_on_the_wire() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let mut form = UrlEncoded::new()
        .put("id", u64::MAX)
        .put("ratio", 1.0_f64)
        .put("tags", serde_json::json!(["a", "b"]));

    let items = flex(&mock_server, "/items");
    let () = items.post(&mut form).await.expect("post");

    insta::assert_snapshot!(first_body(&mock_server).await, @r#"id=18446744073709551615&ratio=1.0&tags=["a","b"]"#);
    // The form was taken, not lost: it can be filled again.
    assert!(form.is_empty());
}

#[tokio::test]
async fn test_client_default_json_codec() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().json_codec(JsonCodec::Pretty).build();
    let flex = HttpFlex::with_client(client, &format!("{}/users", mock_server.uri())).expect("url");
    let body = Body::json(&User {
        id: 7,
        name: "Eve".to_string(),
    })
    .expect("json body");

    let () = flex.post(body).await.expect("post");

    insta::assert_snapshot!(first_body(&mock_server).await, @r#"
    {
      "id": 7,
      "name": "Eve"
    }
    "#);
}

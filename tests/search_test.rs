//! Integration tests for the best-effort search client.

use komment_client::search::{self, SearchParams};
use komment_client::{Config, ForumClient, Session};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESULTS: &str = r#"
    <html><body>
    <div class="comment">
        <div>
            <b class="registered">alice</b> (42)
            <a href="/index.php?pageNo=7#comment-123">link</a>
        </div>
        <div>meta</div>
        <div>found it</div>
        <div>2024-01-02</div>
    </div>
    </body></html>
"#;

fn client_for(search_origin: String) -> ForumClient {
    let config = Config {
        search_origin,
        ..Config::default()
    };

    ForumClient::new(config, Session::new()).expect("client should build")
}

#[tokio::test]
async fn search_builds_the_query_and_parses_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results/"))
        .and(query_param("user", "alice"))
        .and(query_param("is_reg", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(server.uri());
    let params = SearchParams {
        user: Some("alice".to_string()),
        is_reg: Some("1".to_string()),
        ..SearchParams::default()
    };

    let results = search::search(&client, &params).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].author, "alice");
    assert_eq!(results[0].page_no, 7);
    assert_eq!(results[0].id, "123");
}

#[tokio::test]
async fn the_forum_session_cookie_is_not_sent_to_the_mirror() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS))
        .mount(&server)
        .await;

    let client = client_for(server.uri());
    client.session().set_cookie("sid=secret");

    search::search(&client, &SearchParams::default()).await;

    let requests = server
        .received_requests()
        .await
        .expect("request recording is enabled");
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("cookie"));
}

#[tokio::test]
async fn server_errors_degrade_to_no_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(server.uri());
    let results = search::search(&client, &SearchParams::default()).await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn unreachable_endpoint_degrades_to_no_results() {
    let client = client_for("http://127.0.0.1:1".to_string());

    let results = search::search(&client, &SearchParams::default()).await;

    assert!(results.is_empty());
}

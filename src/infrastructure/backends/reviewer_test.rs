use serde_json::json;

use super::Reviewer;
use crate::domain::models::Completion;

#[tokio::test]
async fn it_passes_a_health_check_when_the_service_answers() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/").with_status(200).create();

    let reviewer = Reviewer::with_url(server.url());
    reviewer.health_check().await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn it_fails_a_health_check_on_server_errors() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/").with_status(500).create();

    let reviewer = Reviewer::with_url(server.url());
    let res = reviewer.health_check().await;

    assert!(res.is_err());
}

#[tokio::test]
async fn it_fails_a_health_check_without_a_url() {
    let reviewer = Reviewer::with_url("".to_string());
    let res = reviewer.health_check().await;

    assert!(res.is_err());
}

#[tokio::test]
async fn it_generates_a_review() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/model")
        .match_body(mockito::Matcher::PartialJson(json!({
            "code_snippet": "fn main() {}",
        })))
        .with_status(200)
        .with_body(r#"{"review":"Looks reasonable."}"#)
        .create();

    let reviewer = Reviewer::with_url(server.url());
    let review = reviewer.generate("fn main() {}").await.unwrap();
    mock.assert();

    assert_eq!(review, "Looks reasonable.");
}

#[tokio::test]
async fn it_errors_when_the_model_request_fails() {
    let mut server = mockito::Server::new();
    server.mock("POST", "/model").with_status(500).create();

    let reviewer = Reviewer::with_url(server.url());
    let res = reviewer.generate("broken()").await;

    assert!(res.is_err());
}

//! API integration tests against a running server and database

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

/// Unique per run so repeated runs don't collide on the isbn constraint
fn unique_isbn(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

async fn create_book(client: &Client, title: &str, isbn: &str) -> Value {
    let response = client
        .post(format!("{}/api/books", BASE_URL))
        .json(&json!({ "title": title, "author": "Artur", "isbn": isbn }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "UP");
}

#[tokio::test]
#[ignore]
async fn test_create_and_get_book() {
    let client = Client::new();
    let isbn = unique_isbn("001");

    let created = create_book(&client, "As aventuras", &isbn).await;
    let id = created["id"].as_i64().expect("No id in response");

    let response = client
        .get(format!("{}/api/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["title"], "As aventuras");
    assert_eq!(body["isbn"], isbn.as_str());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_rejected() {
    let client = Client::new();
    let isbn = unique_isbn("dup");
    create_book(&client, "Primeiro", &isbn).await;

    let response = client
        .post(format!("{}/api/books", BASE_URL))
        .json(&json!({ "title": "Segundo", "author": "Fulano", "isbn": isbn }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0], "Isbn already registered");
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let isbn = unique_isbn("123");
    create_book(&client, "As aventuras", &isbn).await;

    let checkout = json!({ "isbn": isbn, "customer": "Fulano", "email": "fulano@email.com" });
    let response = client
        .post(format!("{}/api/loans", BASE_URL))
        .json(&checkout)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan_id: i64 = response.json().await.expect("Failed to parse loan id");

    // Second check-out of the same book
    let response = client
        .post(format!("{}/api/loans", BASE_URL))
        .json(&checkout)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0], "Book already loaned");

    let response = client
        .patch(format!("{}/api/loans/{}", BASE_URL, loan_id))
        .json(&json!({ "returned": true }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    // Book is free again
    let response = client
        .post(format!("{}/api/loans", BASE_URL))
        .json(&checkout)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .get(format!("{}/api/loans?isbn={}", BASE_URL, isbn))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["totalElements"], 2);
}

#[tokio::test]
#[ignore]
async fn test_loan_for_unknown_isbn() {
    let client = Client::new();

    let response = client
        .post(format!("{}/api/loans", BASE_URL))
        .json(&json!({ "isbn": unique_isbn("missing"), "customer": "Fulano" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"][0], "Book not found for passed isbn");
}

#[tokio::test]
#[ignore]
async fn test_missing_book_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/api/books/{}", BASE_URL, i64::MAX))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

//! API integration tests
//!
//! These run against a live server with a fresh database:
//! `cargo run`, then `cargo test -- --ignored`.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const ADMIN_USER: &str = "admin";
const ADMIN_PASSWORD: &str = "change-this-password";

/// Client with a cookie store, so the session cookie survives across calls
fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

/// Log the client in; its cookie store then carries the session
async fn login(client: &Client) {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": ADMIN_USER,
            "password": ADMIN_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send login request");

    assert!(response.status().is_success(), "login failed");
}

async fn create_device(client: &Client, call_sign: &str) -> String {
    let response = client
        .post(format!("{}/devices", BASE_URL))
        .json(&json!({
            "call_sign": call_sign,
            "device_type": "Handheld"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_str().expect("No device ID").to_string()
}

async fn delete_device(client: &Client, id: &str) {
    let _ = client
        .delete(format!("{}/devices/{}?force=true", BASE_URL, id))
        .send()
        .await;
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
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_and_session_lifecycle() {
    let client = session_client();
    login(&client).await;

    // Session is valid after login
    let response = client
        .get(format!("{}/auth/session", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], ADMIN_USER);
    assert_eq!(body["is_valid"], true);

    // Logout destroys it
    let response = client
        .post(format!("{}/auth/logout", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/auth/session", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_login_failures_are_uniform() {
    let client = Client::new();

    // Wrong password for a real user
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({"username": ADMIN_USER, "password": "wrong"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
    let wrong_password: Value = response.json().await.expect("Failed to parse response");

    // Unknown user
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({"username": "no-such-user", "password": "wrong"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
    let unknown_user: Value = response.json().await.expect("Failed to parse response");

    // Same message either way
    assert_eq!(wrong_password["message"], unknown_user["message"]);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/devices", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_device_lifecycle() {
    let client = session_client();
    login(&client).await;

    // Create
    let response = client
        .post(format!("{}/devices", BASE_URL))
        .json(&json!({"call_sign": "F-21", "device_type": "Handheld"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "AVAILABLE");
    let id = body["id"].as_str().expect("No device ID").to_string();

    // Move to maintenance
    let response = client
        .put(format!("{}/devices/{}/status", BASE_URL, id))
        .json(&json!({"status": "MAINTENANCE"}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "MAINTENANCE");

    // Delete (not on loan, no force needed)
    let response = client
        .delete(format!("{}/devices/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // Gone
    let response = client
        .get(format!("{}/devices/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_create_device_validation() {
    let client = session_client();
    login(&client).await;

    let response = client
        .post(format!("{}/devices", BASE_URL))
        .json(&json!({"call_sign": "   ", "device_type": "Handheld"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("{}/devices", BASE_URL))
        .json(&json!({"call_sign": "F-30", "device_type": ""}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_call_sign() {
    let client = session_client();
    login(&client).await;

    let id = create_device(&client, "F-DUP").await;

    let response = client
        .post(format!("{}/devices", BASE_URL))
        .json(&json!({"call_sign": "F-DUP", "device_type": "Mobile"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    delete_device(&client, &id).await;
}

#[tokio::test]
#[ignore]
async fn test_on_loan_is_not_a_settable_status() {
    let client = session_client();
    login(&client).await;

    let id = create_device(&client, "F-STAT").await;

    let response = client
        .put(format!("{}/devices/{}/status", BASE_URL, id))
        .json(&json!({"status": "ON_LOAN"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    delete_device(&client, &id).await;
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_cycle() {
    let client = session_client();
    login(&client).await;

    let id = create_device(&client, "F-LOAN").await;

    // Borrow
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({"device_id": id, "borrower_name": "Test Borrower"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["device_status"], "ON_LOAN");
    let loan_id = body["loan"]["id"].as_str().expect("No loan ID").to_string();

    // A device on loan cannot be deleted without force
    let response = client
        .delete(format!("{}/devices/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // A second borrow of the same device conflicts
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({"device_id": id, "borrower_name": "Someone Else"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Return releases the device
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .json(&json!({"note": "all good"}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["device_status"], "AVAILABLE");

    // Returning twice conflicts
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Force-delete removes the device and its loan history
    let response = client
        .delete(format!("{}/devices/{}?force=true", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_history_validation() {
    let client = session_client();
    login(&client).await;

    // Inverted range
    let response = client
        .get(format!(
            "{}/loans/history?from=2026-02-01T00:00:00Z&to=2026-01-01T00:00:00Z",
            BASE_URL
        ))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Span over 365 days
    let response = client
        .get(format!(
            "{}/loans/history?from=2025-01-01T00:00:00Z&to=2026-01-02T00:00:00Z",
            BASE_URL
        ))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Exactly 365 days is fine
    let response = client
        .get(format!(
            "{}/loans/history?from=2025-01-01T00:00:00Z&to=2026-01-01T00:00:00Z",
            BASE_URL
        ))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Page below 1
    let response = client
        .get(format!("{}/loans/history?page=0", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Malformed device id
    let response = client
        .get(format!("{}/loans/history?device_id=not-a-uuid", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_history_defaults_and_page_math() {
    let client = session_client();
    login(&client).await;

    let response = client
        .get(format!("{}/loans/history", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 100);

    let total = body["total"].as_i64().expect("No total");
    let total_pages = body["total_pages"].as_i64().expect("No total_pages");
    if total == 0 {
        assert_eq!(total_pages, 0);
    } else {
        assert_eq!(total_pages, (total + 99) / 100);
    }
}

#[tokio::test]
#[ignore]
async fn test_dashboard_stats() {
    let client = session_client();
    login(&client).await;

    let response = client
        .get(format!("{}/stats/dashboard", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["available"].is_number());
    assert!(body["on_loan"].is_number());
    assert!(body["defect"].is_number());
    assert!(body["maintenance"].is_number());
    assert!(body["open_loans"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_suggestion_wildcards_match_literally() {
    let client = session_client();
    login(&client).await;

    // Seed one historical loan
    let id = create_device(&client, "F-SUGG").await;
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({"device_id": id, "borrower_name": "Suggestion Seed"}))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["loan"]["id"].as_str().expect("No loan ID").to_string();
    let _ = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .json(&json!({}))
        .send()
        .await;

    // A literal '%' must not match every borrower
    for query in ["%", "_"] {
        let response = client
            .get(format!("{}/loans/suggestions?q={}", BASE_URL, query))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        let body: Value = response.json().await.expect("Failed to parse response");
        let names: Vec<&str> = body
            .as_array()
            .expect("Expected array")
            .iter()
            .filter_map(|s| s["borrower_name"].as_str())
            .collect();
        assert!(
            !names.contains(&"Suggestion Seed"),
            "wildcard '{}' matched a name that does not contain it",
            query
        );
    }

    // The real substring still matches
    let response = client
        .get(format!("{}/loans/suggestions?q=Suggestion", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let names: Vec<&str> = body
        .as_array()
        .expect("Expected array")
        .iter()
        .filter_map(|s| s["borrower_name"].as_str())
        .collect();
    assert!(names.contains(&"Suggestion Seed"));

    delete_device(&client, &id).await;
}

#[tokio::test]
#[ignore]
async fn test_login_timing_is_indistinguishable() {
    // Statistical check, not exact equality: the median latency for an
    // unknown username must stay in the same ballpark as a known username
    // with a wrong password.
    let client = Client::new();
    let rounds = 10;

    async fn median_millis(client: &Client, username: &str, rounds: usize) -> u128 {
        let mut samples = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            let start = std::time::Instant::now();
            let _ = client
                .post(format!("{}/auth/login", BASE_URL))
                .json(&json!({"username": username, "password": "definitely-wrong"}))
                .send()
                .await
                .expect("Failed to send request");
            samples.push(start.elapsed().as_millis());
        }
        samples.sort_unstable();
        samples[samples.len() / 2]
    }

    let known = median_millis(&client, ADMIN_USER, rounds).await;
    let unknown = median_millis(&client, "no-such-user-xyz", rounds).await;

    let (fast, slow) = if known < unknown {
        (known, unknown)
    } else {
        (unknown, known)
    };
    assert!(
        slow < fast.max(1) * 3,
        "login timing differs too much: known={}ms unknown={}ms",
        known,
        unknown
    );
}

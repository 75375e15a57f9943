//! Integration tests for signup, login, and bearer-token auth.

mod common;

use common::TestHarness;

#[tokio::test]
async fn signup_then_login_yields_working_token() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/auth/signup"))
        .json(&serde_json::json!({
            "username": "vera",
            "password": "password123",
            "display_name": "Vera Lane"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .post(format!("http://{addr}/api/auth/login"))
        .json(&serde_json::json!({"username": "vera", "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    let token = json["token"].as_str().unwrap().to_string();

    // The token opens protected routes.
    let resp = client
        .get(format!("http://{addr}/api/courses"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Status reflects the authenticated user.
    let resp = client
        .get(format!("http://{addr}/api/auth/status"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["authenticated"], true);
    assert_eq!(json["username"], "vera");
    assert_eq!(json["role"], "student");
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let body = serde_json::json!({
        "username": "dup",
        "password": "password123",
        "display_name": "Dup"
    });

    let resp = client
        .post(format!("http://{addr}/api/auth/signup"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .post(format!("http://{addr}/api/auth/signup"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn wrong_password_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_student("vera", "Vera");

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/auth/login"))
        .json(&serde_json::json!({"username": "vera", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/api/courses")).await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn short_password_rejected_on_signup() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/auth/signup"))
        .json(&serde_json::json!({
            "username": "shorty",
            "password": "short",
            "display_name": "S"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn logout_invalidates_token() {
    let (h, addr) = TestHarness::with_server().await;
    let (_user, token) = h.create_student("vera", "Vera");
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("http://{addr}/api/courses"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

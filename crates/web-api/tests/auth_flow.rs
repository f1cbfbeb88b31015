mod support;

use serde_json::{json, Value};
use support::TestServer;

#[tokio::test]
async fn status_endpoint_is_live() {
    let server = TestServer::spawn().await;
    let response = server.client.get(server.url("/api/status")).send().await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn signup_login_and_check() {
    let server = TestServer::spawn().await;
    let (user_id, token) = server.signup("Alice", "Alice@Example.com").await;

    let login: Value = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({"email": "alice@example.com", "password": "secret123"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(login["user"]["id"], user_id.as_str());
    assert!(login["user"].get("password").is_none());

    let check = server
        .client
        .get(server.url("/api/auth/check"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(check.status(), 200);
    let body: Value = check.json().await.unwrap();
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let server = TestServer::spawn().await;
    server.signup("Alice", "alice@example.com").await;

    let response = server
        .client
        .post(server.url("/api/auth/signup"))
        .json(&json!({
            "full_name": "Alice Again",
            "email": "alice@example.com",
            "password": "secret123",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "USER_EXISTS");
}

#[tokio::test]
async fn bad_credentials_share_one_response() {
    let server = TestServer::spawn().await;
    server.signup("Alice", "alice@example.com").await;

    let mut bodies = Vec::new();
    for payload in [
        json!({"email": "alice@example.com", "password": "wrong-password"}),
        json!({"email": "nobody@example.com", "password": "secret123"}),
    ] {
        let response = server
            .client
            .post(server.url("/api/auth/login"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        bodies.push(response.json::<Value>().await.unwrap());
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let server = TestServer::spawn().await;

    let missing = server
        .client
        .get(server.url("/api/auth/check"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 401);

    let garbage = server
        .client
        .get(server.url("/api/messages/users"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), 401);
}

#[tokio::test]
async fn update_profile_rules() {
    let server = TestServer::spawn().await;
    let (_, token) = server.signup("Alice", "alice@example.com").await;

    let empty = server
        .client
        .put(server.url("/api/auth/update-profile"))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 400);

    let updated: Value = server
        .client
        .put(server.url("/api/auth/update-profile"))
        .bearer_auth(&token)
        .json(&json!({"full_name": "Alice Liddell", "profile_pic": "https://img.example.com/a.png"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["user"]["full_name"], "Alice Liddell");
    assert_eq!(updated["user"]["profile_pic"], "https://img.example.com/a.png");
}

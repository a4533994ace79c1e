//! Registration, login and session handling over HTTP.

#![allow(clippy::unwrap_used)]

use nimbus_client::ClientError;
use nimbus_integration_tests::{TestServer, unique_email};

const PASSWORD: &str = "correct horse battery";

#[tokio::test]
async fn test_register_signs_in() {
    let server = TestServer::start().await;
    let client = server.client();
    let email = unique_email("ada");

    let user = client.register("ada", &email, PASSWORD).await.unwrap();
    assert_eq!(user.email.as_str(), email);

    let me = client.me().await.unwrap().unwrap();
    assert_eq!(me.id, user.id);
    assert_eq!(me.username.as_str(), "ada");
}

#[tokio::test]
async fn test_me_without_session_is_unauthorized() {
    let server = TestServer::start().await;
    assert!(server.client().me().await.unwrap().is_none());

    // Raw check of the status the client maps to `None`.
    let response = reqwest::get(format!("{}/api/auth/me", server.url()))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let server = TestServer::start().await;
    let email = unique_email("dup");

    server
        .client()
        .register("first", &email, PASSWORD)
        .await
        .unwrap();
    let err = server
        .client()
        .register("second", &email, PASSWORD)
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "User already exists");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_registration_data() {
    let server = TestServer::start().await;
    let err = server
        .client()
        .register("ok_name", "not-an-email", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));

    let err = server
        .client()
        .register("ok_name", &unique_email("short"), "short")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_login_and_logout() {
    let server = TestServer::start().await;
    let email = unique_email("grace");
    server
        .client()
        .register("grace", &email, PASSWORD)
        .await
        .unwrap();

    let client = server.client();
    assert!(client.me().await.unwrap().is_none());

    let user = client.login(&email, PASSWORD).await.unwrap();
    assert_eq!(client.me().await.unwrap().unwrap().id, user.id);

    client.logout().await.unwrap();
    assert!(client.me().await.unwrap().is_none());
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let server = TestServer::start().await;
    let email = unique_email("linus");
    server
        .client()
        .register("linus", &email, PASSWORD)
        .await
        .unwrap();

    let wrong_password = server
        .client()
        .login(&email, "not the password")
        .await
        .unwrap_err();
    let unknown_email = server
        .client()
        .login(&unique_email("nobody"), PASSWORD)
        .await
        .unwrap_err();

    assert_eq!(wrong_password.status(), Some(401));
    assert_eq!(unknown_email.status(), Some(401));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

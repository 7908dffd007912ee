//! Test utilities for integration testing (available with `test-utils` feature).

use crate::config::Config;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::Utc;
use sqlx::PgPool;

pub const TEST_ADMIN_USERNAME: &str = "admin";
pub const TEST_ADMIN_PASSWORD: &str = "test-admin-password";

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        admin_password: Some(TEST_ADMIN_PASSWORD.to_string()),
        ..Default::default()
    }
}

/// Build a test server over an already-migrated pool, with the admin
/// account seeded so [`admin_headers`] can log in.
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    crate::create_initial_admin_user(&config.admin_username, config.admin_password.as_deref(), &pool)
        .await
        .expect("Failed to seed admin user");

    let state = crate::AppState::builder().db(pool).config(config).build();
    let router = crate::build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Log in as the seeded admin and return the session cookie as a request
/// header, ready to pass to `add_header`.
pub async fn admin_headers(server: &TestServer) -> (HeaderName, HeaderValue) {
    let response = server
        .post("/authentication/login")
        .json(&serde_json::json!({
            "username": TEST_ADMIN_USERNAME,
            "password": TEST_ADMIN_PASSWORD,
        }))
        .await;
    response.assert_status_ok();

    let set_cookie = response.header("set-cookie");
    let session = set_cookie
        .to_str()
        .expect("set-cookie should be valid ASCII")
        .split(';')
        .next()
        .expect("set-cookie should carry a cookie pair")
        .to_string();

    (
        HeaderName::from_static("cookie"),
        HeaderValue::from_str(&session).expect("session cookie should be a valid header value"),
    )
}

/// Registration payload for a member admitted today with a discounted
/// admission fee of 1800, so the first payment amounts to
/// `1800 + monthly_salary`.
pub fn member_payload(member_id: &str, name: &str, monthly_salary: i64) -> serde_json::Value {
    serde_json::json!({
        "member_id": member_id,
        "name": name,
        "mobile_number": "01700000000",
        "blood_group": "O+",
        "reference_id": "walk-in",
        "age": 28,
        "height": 5.6,
        "weight": 72.0,
        "admission_date": Utc::now().date_naive(),
        "discounted_fee": 1800,
        "monthly_salary": monthly_salary,
    })
}

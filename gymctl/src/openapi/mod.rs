//! OpenAPI documentation configuration.
//!
//! Defines the spec for the management API (`/api/v1/*`) and the
//! authentication endpoints (`/authentication/*`). The interactive reference
//! is served at `/docs`.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api;

/// Registers the two ways a session can be presented: the HTTP-only cookie
/// set at login, or the same token as a bearer header.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_token".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("gymctl_session"))),
            );
            components.security_schemes.insert(
                "bearer_token".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token from /authentication/login, passed as a bearer header."))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Management API")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::me,
        api::handlers::members::list_members,
        api::handlers::members::create_member,
        api::handlers::members::check_member_id,
        api::handlers::members::get_member,
        api::handlers::members::update_member,
        api::handlers::members::delete_member,
        api::handlers::members::list_member_payments,
        api::handlers::members::get_member_standing,
        api::handlers::payments::list_payments,
        api::handlers::payments::create_payment,
        api::handlers::payments::generate_payments,
        api::handlers::payments::get_payment,
        api::handlers::payments::update_payment,
        api::handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::auth::AuthSuccessResponse,
            api::models::users::UserResponse,
            api::models::users::CurrentUser,
            api::models::members::BodyType,
            api::models::members::MemberCreate,
            api::models::members::MemberUpdate,
            api::models::members::MemberResponse,
            api::models::members::MemberIdCheck,
            api::models::members::StandingResponse,
            api::models::payments::PaymentCreate,
            api::models::payments::PaymentUpdate,
            api::models::payments::PaymentResponse,
            api::models::payments::SettlementResponse,
            api::models::payments::GenerateRequest,
            api::models::payments::GenerationFailure,
            api::models::payments::GenerationSummary,
            api::models::dashboard::DashboardStats,
            crate::dues::Month,
            crate::dues::PaymentStatus,
            crate::dues::Standing,
        )
    ),
    tags(
        (name = "authentication", description = "Admin login and session management."),
        (name = "members", description = "Member registration, profiles, payment history and dues standing."),
        (name = "payments", description = "Payment records: listing, manual corrections, settlement and the monthly generation sweep."),
        (name = "dashboard", description = "Aggregate statistics for the current billing period."),
    ),
    info(
        title = "Gym Management API",
        description = "Administrative API for member registration, monthly dues tracking and payment settlement.

## Authentication

Log in via `POST /authentication/login` with an admin username and password. The session
token is returned as an HTTP-only cookie and can also be sent as a bearer header:

```
Authorization: Bearer YOUR_SESSION_TOKEN
```

Read endpoints require a valid session; mutating endpoints require the admin flag.",
    ),
)]
pub struct ApiDoc;

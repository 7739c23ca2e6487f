//! User allocation handler.
//!
//! ```text
//! POST /api/v1/users  Allocate a new user identifier
//! ```

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::idempotency_key_from;
use crate::inbound::http::state::HttpState;

/// A freshly allocated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatedUserResponse {
    #[schema(example = 1001)]
    pub user_id: i32,
}

impl From<UserId> for CreatedUserResponse {
    fn from(value: UserId) -> Self {
        Self {
            user_id: value.get(),
        }
    }
}

/// Allocate the next user identifier.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    params(
        ("Idempotency-Key" = String, Header, description = "Opaque token; each may be used once")
    ),
    responses(
        (status = 201, description = "User allocated", body = CreatedUserResponse),
        (status = 400, description = "Missing key", body = Error),
        (status = 409, description = "Replayed key", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let key = idempotency_key_from(request.headers())?;
    let command = Arc::clone(&state.users);
    let user_id = state
        .idempotency
        .run(key.as_ref(), || async move { command.create_user().await })
        .await?;
    Ok(HttpResponse::Created().json(CreatedUserResponse::from(user_id)))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::MockUserCommand;
    use crate::inbound::http::test_utils::{test_app, unused_ports};

    #[rstest]
    #[actix_web::test]
    async fn allocation_runs_once_per_key() {
        let mut command = MockUserCommand::new();
        command
            .expect_create_user()
            .times(1)
            .returning(|| UserId::new(12).map_err(|err| Error::internal(err.to_string())));
        let mut ports = unused_ports();
        ports.users = Arc::new(command);
        let app = actix_test::init_service(test_app(ports)).await;

        let send = || {
            actix_test::TestRequest::post()
                .uri("/api/v1/users")
                .insert_header(("Idempotency-Key", "user-1"))
                .to_request()
        };

        let res = actix_test::call_service(&app, send()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: CreatedUserResponse = actix_test::read_body_json(res).await;
        assert_eq!(body.user_id, 12);

        let replay = actix_test::call_service(&app, send()).await;
        assert_eq!(replay.status(), StatusCode::CONFLICT);
    }
}

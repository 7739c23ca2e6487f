//! Membership API handlers.
//!
//! ```text
//! POST /api/v1/user-segments            Add and remove a user's segments
//! GET  /api/v1/user-segments?user_id=N  Read a user's active segments
//! ```
//!
//! The mutation requires an `Idempotency-Key` header. The key is consumed
//! before the body is validated, so a rejected request cannot be retried
//! with the same key.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, MembershipRequest, UserSegments};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::idempotency_key_from;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_slug_list, parse_ttl_days, parse_user_id, parse_user_id_param,
};

const USER_ID: FieldName = FieldName::new("user_id");
const ADD: FieldName = FieldName::new("add");
const DEL: FieldName = FieldName::new("del");
const TTL_DAYS: FieldName = FieldName::new("ttl_days");

/// Membership change body.
///
/// `add` and `del` are both required but may be empty. Memberships created
/// by this request expire `ttl_days` days from today when given.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct MembershipChangeRequest {
    #[schema(example = 1000)]
    pub user_id: Option<i64>,
    #[schema(example = json!(["AVITO_VOICE_MESSAGES"]))]
    pub add: Option<Vec<String>>,
    #[schema(example = json!(["AVITO_DISCOUNT_30"]))]
    pub del: Option<Vec<String>>,
    #[schema(example = 30)]
    pub ttl_days: Option<i64>,
}

/// Query parameters for the membership read.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSegmentsParams {
    pub user_id: Option<String>,
}

/// One segment in a membership read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SegmentView {
    pub slug: String,
}

/// Active memberships of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSegmentsResponse {
    pub user_id: i32,
    pub segments: Vec<SegmentView>,
}

impl From<UserSegments> for UserSegmentsResponse {
    fn from(value: UserSegments) -> Self {
        Self {
            user_id: value.user_id.get(),
            segments: value
                .segments
                .into_iter()
                .map(|segment| SegmentView {
                    slug: segment.slug.into(),
                })
                .collect(),
        }
    }
}

pub(crate) fn parse_membership_change(
    payload: MembershipChangeRequest,
) -> Result<MembershipRequest, Error> {
    let MembershipChangeRequest {
        user_id,
        add,
        del,
        ttl_days,
    } = payload;
    let user_id = parse_user_id(user_id, USER_ID)?;
    let add = parse_slug_list(add, ADD)?;
    let remove = parse_slug_list(del, DEL)?;
    let ttl = parse_ttl_days(ttl_days, TTL_DAYS)?;
    MembershipRequest::new(user_id, add, remove, ttl).map_err(Error::from)
}

/// Atomically add and remove segments for one user.
#[utoipa::path(
    post,
    path = "/api/v1/user-segments",
    request_body = MembershipChangeRequest,
    params(
        ("Idempotency-Key" = String, Header, description = "Opaque token; each may be used once")
    ),
    responses(
        (status = 200, description = "Memberships updated"),
        (status = 400, description = "Invalid request, missing key, or no segment to add exists", body = Error),
        (status = 409, description = "Replayed key or duplicate membership", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["memberships"],
    operation_id = "changeUserSegments"
)]
#[post("/user-segments")]
pub async fn change_user_segments(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<MembershipChangeRequest>,
) -> ApiResult<HttpResponse> {
    let key = idempotency_key_from(request.headers())?;
    let command = Arc::clone(&state.memberships);
    state
        .idempotency
        .run(key.as_ref(), || async move {
            let change = parse_membership_change(payload.into_inner())?;
            command.apply(change).await
        })
        .await?;
    Ok(HttpResponse::Ok().finish())
}

/// Read a user's active segments, served from the cache when warm.
#[utoipa::path(
    get,
    path = "/api/v1/user-segments",
    params(
        ("user_id" = i64, Query, description = "Positive user identifier")
    ),
    responses(
        (status = 200, description = "Active memberships", body = UserSegmentsResponse),
        (status = 204, description = "User has no memberships"),
        (status = 400, description = "Missing or invalid user_id", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["memberships"],
    operation_id = "getUserSegments"
)]
#[get("/user-segments")]
pub async fn get_user_segments(
    state: web::Data<HttpState>,
    query: web::Query<UserSegmentsParams>,
) -> ApiResult<HttpResponse> {
    let user_id = parse_user_id_param(query.user_id.as_deref(), USER_ID)?;
    match state.memberships_query.user_segments(user_id).await? {
        Some(snapshot) => Ok(HttpResponse::Ok().json(UserSegmentsResponse::from(snapshot))),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

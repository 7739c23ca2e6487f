//! Segment catalogue handlers.
//!
//! ```text
//! POST   /api/v1/segments         Create a segment
//! DELETE /api/v1/segments/{slug}  Delete an unused segment
//! ```
//!
//! Both require an `Idempotency-Key` header.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, delete, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Segment};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::idempotency_key_from;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_slug};

const SLUG: FieldName = FieldName::new("slug");

/// Segment creation body.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateSegmentRequest {
    #[schema(example = "AVITO_VOICE_MESSAGES")]
    pub slug: Option<String>,
}

/// A created segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SegmentResponse {
    pub segment_id: i32,
    pub slug: String,
}

impl From<Segment> for SegmentResponse {
    fn from(value: Segment) -> Self {
        Self {
            segment_id: value.id.get(),
            slug: value.slug.into(),
        }
    }
}

/// Create a segment.
#[utoipa::path(
    post,
    path = "/api/v1/segments",
    request_body = CreateSegmentRequest,
    params(
        ("Idempotency-Key" = String, Header, description = "Opaque token; each may be used once")
    ),
    responses(
        (status = 201, description = "Segment created", body = SegmentResponse),
        (status = 400, description = "Missing key or blank slug", body = Error),
        (status = 409, description = "Replayed key or slug already exists", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["segments"],
    operation_id = "createSegment"
)]
#[post("/segments")]
pub async fn create_segment(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<CreateSegmentRequest>,
) -> ApiResult<HttpResponse> {
    let key = idempotency_key_from(request.headers())?;
    let command = Arc::clone(&state.segments);
    let segment = state
        .idempotency
        .run(key.as_ref(), || async move {
            let slug = parse_slug(payload.into_inner().slug, SLUG)?;
            command.create_segment(slug).await
        })
        .await?;
    Ok(HttpResponse::Created().json(SegmentResponse::from(segment)))
}

/// Delete a segment that no user belongs to.
#[utoipa::path(
    delete,
    path = "/api/v1/segments/{slug}",
    params(
        ("slug" = String, Path, description = "Segment slug"),
        ("Idempotency-Key" = String, Header, description = "Opaque token; each may be used once")
    ),
    responses(
        (status = 204, description = "Segment deleted"),
        (status = 400, description = "Missing key or blank slug", body = Error),
        (status = 404, description = "Unknown segment", body = Error),
        (status = 409, description = "Replayed key or segment still has members", body = Error),
        (status = 500, description = "Store failure", body = Error)
    ),
    tags = ["segments"],
    operation_id = "deleteSegment"
)]
#[delete("/segments/{slug}")]
pub async fn delete_segment(
    state: web::Data<HttpState>,
    request: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let key = idempotency_key_from(request.headers())?;
    let command = Arc::clone(&state.segments);
    state
        .idempotency
        .run(key.as_ref(), || async move {
            let slug = parse_slug(Some(path.into_inner()), SLUG)?;
            command.delete_segment(slug).await
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

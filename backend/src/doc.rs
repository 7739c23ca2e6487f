//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every handler annotated with `#[utoipa::path]` and
//! the response schemas they reference. Swagger UI serves it in debug
//! builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::history::HistoryEntryResponse;
use crate::inbound::http::segments::{CreateSegmentRequest, SegmentResponse};
use crate::inbound::http::user_segments::{
    MembershipChangeRequest, SegmentView, UserSegmentsResponse,
};
use crate::inbound::http::users::CreatedUserResponse;

/// Describe the `Idempotency-Key` header once as a reusable scheme.
struct IdempotencyAddon;

impl Modify for IdempotencyAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "IdempotencyKey",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Idempotency-Key",
                "Required on every mutating request; a key is accepted once per TTL window.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&IdempotencyAddon),
    info(
        title = "Segment membership API",
        description = "Segment catalogue, user membership mutations with audit history, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::user_segments::change_user_segments,
        crate::inbound::http::user_segments::get_user_segments,
        crate::inbound::http::segments::create_segment,
        crate::inbound::http::segments::delete_segment,
        crate::inbound::http::users::create_user,
        crate::inbound::http::history::list_history,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        MembershipChangeRequest,
        UserSegmentsResponse,
        SegmentView,
        CreateSegmentRequest,
        SegmentResponse,
        CreatedUserResponse,
        HistoryEntryResponse,
    )),
    tags(
        (name = "memberships", description = "Add, remove and read user segments"),
        (name = "segments", description = "Segment catalogue"),
        (name = "users", description = "User allocation"),
        (name = "history", description = "Membership audit trail"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/user-segments")]
    #[case("/api/v1/segments")]
    #[case("/api/v1/segments/{slug}")]
    #[case("/api/v1/users")]
    #[case("/api/v1/history")]
    #[case("/health/ready")]
    fn every_route_is_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    fn membership_read_schema_has_wire_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas
            .get("UserSegmentsResponse")
            .expect("UserSegmentsResponse schema");

        assert_object_schema_has_field(schema, "user_id");
        assert_object_schema_has_field(schema, "segments");
    }

    #[rstest]
    fn error_schema_has_code_and_message() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(schema, "code");
        assert_object_schema_has_field(schema, "message");
    }
}

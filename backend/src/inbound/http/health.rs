//! Liveness and readiness probes for orchestrators and load balancers.
use actix_web::{HttpResponse, get, http::header, web};
use std::sync::atomic::{AtomicBool, Ordering};

/// Readiness and liveness flags shared between the server and its probes.
///
/// The process starts live but not ready. The binary flips readiness once
/// the listener is bound and background jobs are running, and drops
/// liveness as it begins draining.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness and readiness probes while shutting down.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
        self.ready.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Readiness probe: 200 once stores are wired and jobs started, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe: 200 while alive, 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    use super::*;

    async fn probe(state: web::Data<HealthState>, uri: &str) -> (StatusCode, Option<String>) {
        let app = actix_test::init_service(App::new().app_data(state).service(ready).service(live))
            .await;
        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
                .await;
        let cache = res
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        (res.status(), cache)
    }

    #[rstest]
    #[actix_web::test]
    async fn readiness_follows_lifecycle() {
        let state = web::Data::new(HealthState::new());
        assert_eq!(
            probe(state.clone(), "/health/ready").await.0,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.mark_ready();
        let (status, cache) = probe(state.clone(), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.as_deref(), Some("no-store"));

        state.mark_unhealthy();
        assert_eq!(
            probe(state, "/health/ready").await.0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn liveness_fails_once_draining() {
        let state = web::Data::new(HealthState::new());
        assert_eq!(probe(state.clone(), "/health/live").await.0, StatusCode::OK);

        state.mark_unhealthy();
        assert_eq!(
            probe(state, "/health/live").await.0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}

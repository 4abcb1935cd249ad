//! Application router.
//!
//! Layers (outermost → innermost): CORS → access log → handler.

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{request, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the router over shared state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let cors = cors_layer(&core.config().allowed_origins);
    let ctx = ApiContext::new(core);

    let api = Router::new()
        .route("/reload-procedures", post(endpoints::procedures::reload))
        .route("/ticket-assist", post(endpoints::ticket::assist))
        .route("/ask", post(endpoints::ask::ask));

    Router::new()
        .route("/health", get(endpoints::health::check))
        .nest("/api", api)
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::access_log::log_request))
        .layer(cors)
}

/// Whether a browser origin may call the API.
pub fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|a| a == origin) || is_localhost_dev_origin(origin)
}

/// `http://localhost:<port>`, any port.
fn is_localhost_dev_origin(origin: &str) -> bool {
    origin
        .strip_prefix("http://localhost:")
        .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
}

fn cors_layer(allowed: &[String]) -> CorsLayer {
    let allowed = allowed.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &request::Parts| {
                origin
                    .to_str()
                    .is_ok_and(|o| origin_allowed(o, &allowed))
            },
        ))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::pipeline::rag::generator::mock::MockGenerator;
    use crate::pipeline::rag::generator::LlmGenerate;
    use crate::pipeline::rag::loader::mock::{doc, MemoryLoader};
    use crate::ticket_log::mock::RecordingSink;
    use crate::ticket_log::TicketLogSink;

    const TICKET: &str = "\
Subject Refund request
Itinerary/Confirmation Number H1234567
Reason for Call: flight cancelled
The booking has RPP. Guest email guest@example.com";

    fn documents() -> Vec<crate::pipeline::rag::types::ProcedureDocument> {
        vec![
            doc("P00001", "Refunds", "RPP claim", "Guest has RPP: direct to the claim site"),
            doc("P00002", "Hotel", "Courtesy waiver", "Call the hotel and ask for a waiver"),
        ]
    }

    fn core_with(
        generator: Option<Arc<dyn LlmGenerate>>,
        sink: Option<Arc<dyn TicketLogSink>>,
    ) -> Arc<CoreState> {
        Arc::new(CoreState::with_parts(
            AppConfig::default(),
            Box::new(MemoryLoader::new(documents())),
            generator,
            sink,
        ))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    // =================================================================
    // HEALTH / RELOAD
    // =================================================================

    #[tokio::test]
    async fn health_reports_corpus() {
        let app = api_router(core_with(None, None));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["procedures"], 2);
        assert_eq!(json["sheetsFilter"], "ALL");
        assert!(json["generator"].is_null());
    }

    #[tokio::test]
    async fn reload_reports_count() {
        let app = api_router(core_with(None, None));
        let req = Request::builder()
            .method("POST")
            .uri("/api/reload-procedures")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["count"], 2);
    }

    // =================================================================
    // TICKET ASSIST
    // =================================================================

    #[tokio::test]
    async fn short_ticket_rejected() {
        let app = api_router(core_with(None, None));
        let req = post_json("/api/ticket-assist", serde_json::json!({ "rawTicketText": "   too short   " }));
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn malformed_json_rejected() {
        let app = api_router(core_with(None, None));
        let req = Request::builder()
            .method("POST")
            .uri("/api/ticket-assist")
            .header("Content-Type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ticket_assist_without_agent_is_not_saved() {
        let sink = Arc::new(RecordingSink::default());
        let app = api_router(core_with(None, Some(sink.clone() as Arc<dyn TicketLogSink>)));
        let req = post_json(
            "/api/ticket-assist",
            serde_json::json!({ "rawTicketText": TICKET, "useAI": false }),
        );
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["mode"], "rag-only");
        assert_eq!(json["itinerary"], "H1234567");
        assert_eq!(json["parsed"]["hasRPP"], true);
        assert_eq!(json["saved"], false);
        assert!(json["saveError"].as_str().unwrap().contains("agentName"));
        assert!(json["latencyMs"].is_number());
        assert!(sink.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ticket_assist_logs_entry() {
        let sink = Arc::new(RecordingSink::default());
        let generator: Arc<dyn LlmGenerate> = Arc::new(MockGenerator::answering("AI plan"));
        let app = api_router(core_with(Some(generator), Some(sink.clone() as Arc<dyn TicketLogSink>)));
        let req = post_json(
            "/api/ticket-assist",
            serde_json::json!({
                "agentName": "Ana",
                "agentEmail": "ana@example.com",
                "callCenter": "Manila",
                "rawTicketText": TICKET,
                "solved": "YES"
            }),
        );
        let response = app.oneshot(req).await.unwrap();

        let json = json_body(response).await;
        assert_eq!(json["mode"], "ai+rag");
        assert_eq!(json["planText"], "AI plan");
        assert_eq!(json["saved"], true);
        assert_eq!(json["saveError"], "");
        assert!(!json["parsed"]["redactedText"]
            .as_str()
            .unwrap()
            .contains("guest@example.com"));

        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].solved, "YES");
        assert_eq!(entries[0].ticket_plan_output, "AI plan");
    }

    #[tokio::test]
    async fn lowercase_itinerary_still_logged() {
        let sink = Arc::new(RecordingSink::default());
        let app = api_router(core_with(None, Some(sink.clone() as Arc<dyn TicketLogSink>)));
        let req = post_json(
            "/api/ticket-assist",
            serde_json::json!({
                "agentName": "Ana",
                "agentEmail": "ana@example.com",
                "rawTicketText": "Guest booked (h1234567) and wants to cancel the stay",
                "useAI": false
            }),
        );
        let response = app.oneshot(req).await.unwrap();

        let json = json_body(response).await;
        assert_eq!(json["saved"], true);
        assert_eq!(json["itinerary"], "H1234567");
        assert_eq!(json["parsed"]["itinerary"], "");
        assert_eq!(sink.entries.lock().unwrap()[0].itinerary, "H1234567");
    }

    #[tokio::test]
    async fn generator_failure_degrades_not_fails() {
        let generator: Arc<dyn LlmGenerate> = Arc::new(MockGenerator::failing());
        let app = api_router(core_with(Some(generator), None));
        let req = post_json("/api/ticket-assist", serde_json::json!({ "rawTicketText": TICKET }));
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["mode"], "rag-only");
        assert!(json["warn"].is_string());
        assert!(json["planText"].as_str().unwrap().starts_with("Ticket Summary"));
    }

    // =================================================================
    // ASK
    // =================================================================

    #[tokio::test]
    async fn ask_requires_question() {
        let app = api_router(core_with(None, None));
        let req = post_json("/api/ask", serde_json::json!({ "scenario": "RPP guest" }));
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ask_without_generator_is_503() {
        let app = api_router(core_with(None, None));
        let req = post_json("/api/ask", serde_json::json!({ "question": "Can I refund?" }));
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn ask_generator_failure_is_502() {
        let generator: Arc<dyn LlmGenerate> = Arc::new(MockGenerator::failing());
        let app = api_router(core_with(Some(generator), None));
        let req = post_json("/api/ask", serde_json::json!({ "question": "Can I refund?" }));
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn ask_returns_answer() {
        let generator: Arc<dyn LlmGenerate> = Arc::new(MockGenerator::answering("Use the waiver macro."));
        let app = api_router(core_with(Some(generator), None));
        let req = post_json(
            "/api/ask",
            serde_json::json!({ "scenario": "Hotel", "question": "waiver?" }),
        );
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["answer"], "Use the waiver macro.");
        assert_eq!(json["rag"]["picked"][0]["id"], "P00002");
    }

    // =================================================================
    // CORS
    // =================================================================

    #[test]
    fn localhost_any_port_allowed() {
        let allowed = vec!["https://copilot.example.com".to_string()];
        assert!(origin_allowed("http://localhost:5173", &allowed));
        assert!(origin_allowed("https://copilot.example.com", &allowed));
        assert!(!origin_allowed("http://localhost:", &allowed));
        assert!(!origin_allowed("http://localhost:80.evil.com", &allowed));
        assert!(!origin_allowed("https://evil.example.com", &allowed));
    }

    #[tokio::test]
    async fn cors_header_for_allowed_origin() {
        let app = api_router(core_with(None, None));
        let req = Request::builder()
            .uri("/health")
            .header("Origin", "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn no_cors_header_for_unknown_origin() {
        let app = api_router(core_with(None, None));
        let req = Request::builder()
            .uri("/health")
            .header("Origin", "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}

pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::wizard::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Wizard sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/student",
            patch(handlers::handle_patch_student),
        )
        .route(
            "/api/v1/sessions/:id/project",
            patch(handlers::handle_patch_project),
        )
        .route("/api/v1/sessions/:id/next", post(handlers::handle_next))
        .route("/api/v1/sessions/:id/back", post(handlers::handle_back))
        // AI assist
        .route(
            "/api/v1/sessions/:id/assist/suggest",
            post(handlers::handle_suggest),
        )
        .route(
            "/api/v1/sessions/:id/assist/improve",
            post(handlers::handle_improve),
        )
        // Export
        .route(
            "/api/v1/sessions/:id/export/:format",
            get(handlers::handle_export),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{self, Body},
        http::{header, HeaderMap, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::assist::AiAssist;
    use crate::config::{Config, DEFAULT_GEMINI_API_URL};
    use crate::layout::default_page_config;
    use crate::llm_client::{GenerationConfig, LlmError, TextGenerator};

    struct StubGenerator {
        response: Result<String, String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _system: &str,
            _config: &GenerationConfig,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .map_err(|message| LlmError::Api { status: 503, message })
        }
    }

    fn stub(response: Result<&str, &str>) -> Arc<StubGenerator> {
        Arc::new(StubGenerator {
            response: response.map(str::to_string).map_err(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }

    fn test_state(generator: Option<Arc<StubGenerator>>) -> AppState {
        let config = Config {
            gemini_api_key: None,
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            export_dir: None,
            port: 0,
            rust_log: "info".to_string(),
        };
        let generator = generator.map(|g| g as Arc<dyn TextGenerator>);
        AppState::new(config, AiAssist::new(generator), default_page_config())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, headers, bytes.to_vec())
    }

    async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, _, bytes) = send(app, method, uri, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json")
        };
        (status, json)
    }

    async fn create_session(app: &Router) -> String {
        let (status, view) = send_json(app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        view["session_id"].as_str().expect("session id").to_string()
    }

    fn identity() -> Value {
        json!({
            "first_name": "Jean",
            "last_name": "Dupont",
            "email": "jean.dupont@exemple.fr",
            "phone": "06 12 34 56 78",
            "major": "Master Informatique"
        })
    }

    fn project() -> Value {
        json!({
            "topic": "L'impact de l'IA générative sur les PME",
            "general_objective": "Évaluer l'effet de l'IA sur la productivité",
            "specific_objectives": ["Recenser les usages", "Mesurer les gains", "Identifier les freins"]
        })
    }

    /// Creates a session and walks it to the project step.
    async fn session_at_project(app: &Router) -> String {
        let id = create_session(app).await;
        let base = format!("/api/v1/sessions/{id}");
        let (status, _) = send_json(app, "PATCH", &format!("{base}/student"), Some(identity())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, view) = send_json(app, "POST", &format!("{base}/next"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "project");
        id
    }

    async fn session_at_review(app: &Router) -> String {
        let id = session_at_project(app).await;
        let base = format!("/api/v1/sessions/{id}");
        let (status, _) = send_json(app, "PATCH", &format!("{base}/project"), Some(project())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, view) = send_json(app, "POST", &format!("{base}/next"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "review");
        id
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let app = build_router(test_state(None));
        let (status, body) = send_json(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "memoire-api");
    }

    #[tokio::test]
    async fn test_new_session_starts_at_identity() {
        let app = build_router(test_state(None));
        let (_, view) = send_json(&app, "POST", "/api/v1/sessions", None).await;

        assert_eq!(view["step"], "identity");
        assert_eq!(view["steps"][0]["status"], "current");
        assert_eq!(view["steps"][2]["label"], "Validation");
        assert_eq!(view["student"]["email"], "");
        assert_eq!(view["assist"]["status"], "idle");
        assert_eq!(view["ai_available"], false);
        assert_eq!(view["controls"]["back"], false);
        assert_eq!(view["controls"]["next"], true);
    }

    #[tokio::test]
    async fn test_next_with_empty_identity_is_422_with_every_field() {
        let app = build_router(test_state(None));
        let id = create_session(&app).await;

        let (status, body) =
            send_json(&app, "POST", &format!("/api/v1/sessions/{id}/next"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_FIELDS");
        assert_eq!(body["error"]["details"].as_array().unwrap().len(), 5);

        let (_, view) = send_json(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["step"], "identity");
        assert_eq!(view["errors"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_editing_a_field_clears_its_error() {
        let app = build_router(test_state(None));
        let id = create_session(&app).await;
        let base = format!("/api/v1/sessions/{id}");
        send_json(&app, "POST", &format!("{base}/next"), None).await;

        let (_, view) = send_json(
            &app,
            "PATCH",
            &format!("{base}/student"),
            Some(json!({ "email": "pas-un-email" })),
        )
        .await;
        let fields: Vec<&str> = view["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields.len(), 4);
        assert!(!fields.contains(&"email"));
    }

    #[tokio::test]
    async fn test_back_keeps_data_and_is_rejected_at_identity() {
        let app = build_router(test_state(None));
        let id = create_session(&app).await;
        let base = format!("/api/v1/sessions/{id}");

        let (status, body) = send_json(&app, "POST", &format!("{base}/back"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let id = session_at_project(&app).await;
        let base = format!("/api/v1/sessions/{id}");
        let (status, view) = send_json(&app, "POST", &format!("{base}/back"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "identity");
        assert_eq!(view["student"]["last_name"], "Dupont");
    }

    #[tokio::test]
    async fn test_project_edit_rejected_outside_project_step() {
        let app = build_router(test_state(None));
        let id = create_session(&app).await;
        let (status, _) = send_json(
            &app,
            "PATCH",
            &format!("/api/v1/sessions/{id}/project"),
            Some(project()),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_project_step_reports_each_blank_objective() {
        let app = build_router(test_state(None));
        let id = session_at_project(&app).await;
        let base = format!("/api/v1/sessions/{id}");
        send_json(
            &app,
            "PATCH",
            &format!("{base}/project"),
            Some(json!({
                "topic": "Un sujet",
                "general_objective": "Un objectif",
                "specific_objectives": ["Premier", null, null]
            })),
        )
        .await;

        let (status, body) = send_json(&app, "POST", &format!("{base}/next"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["error"]["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["specific_objectives[1]", "specific_objectives[2]"]);
    }

    #[tokio::test]
    async fn test_suggest_without_key_is_503_and_leaves_state() {
        let app = build_router(test_state(None));
        let id = session_at_project(&app).await;
        let base = format!("/api/v1/sessions/{id}");

        let (status, body) =
            send_json(&app, "POST", &format!("{base}/assist/suggest"), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "AI_NOT_CONFIGURED");

        let (_, view) = send_json(&app, "GET", &base, None).await;
        assert_eq!(view["assist"]["status"], "idle");
        assert_eq!(view["controls"]["suggest"], true);
    }

    #[tokio::test]
    async fn test_suggest_overwrites_objectives() {
        let generator = stub(Ok(
            r#"{"generalObjective": "Objectif IA", "specificObjectives": ["Un", "Deux", "Trois", "Quatre"]}"#,
        ));
        let app = build_router(test_state(Some(generator.clone())));
        let id = session_at_project(&app).await;
        let base = format!("/api/v1/sessions/{id}");
        send_json(
            &app,
            "PATCH",
            &format!("{base}/project"),
            Some(json!({ "topic": "La blockchain dans la logistique" })),
        )
        .await;

        let (status, view) =
            send_json(&app, "POST", &format!("{base}/assist/suggest"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["project"]["general_objective"], "Objectif IA");
        assert_eq!(
            view["project"]["specific_objectives"],
            json!(["Un", "Deux", "Trois"])
        );
        assert_eq!(view["project"]["topic"], "La blockchain dans la logistique");
        assert_eq!(view["assist"]["status"], "succeeded");
        assert_eq!(view["assist"]["operation"], "suggest");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_suggest_with_short_topic_never_calls_service() {
        let generator = stub(Ok("{}"));
        let app = build_router(test_state(Some(generator.clone())));
        let id = session_at_project(&app).await;
        let base = format!("/api/v1/sessions/{id}");
        send_json(
            &app,
            "PATCH",
            &format!("{base}/project"),
            Some(json!({ "topic": "IA" })),
        )
        .await;

        let (status, body) =
            send_json(&app, "POST", &format!("{base}/assist/suggest"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

        let (_, view) = send_json(&app, "GET", &base, None).await;
        assert_eq!(view["assist"]["status"], "idle");
    }

    #[tokio::test]
    async fn test_improve_without_general_objective_leaves_tracker_idle() {
        let generator = stub(Ok("{}"));
        let app = build_router(test_state(Some(generator.clone())));
        let id = session_at_project(&app).await;
        let base = format!("/api/v1/sessions/{id}");
        send_json(
            &app,
            "PATCH",
            &format!("{base}/project"),
            Some(json!({ "topic": "La blockchain dans la logistique" })),
        )
        .await;

        let (status, _) = send_json(&app, "POST", &format!("{base}/assist/improve"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

        let (_, view) = send_json(&app, "GET", &base, None).await;
        assert_eq!(view["assist"]["status"], "idle");
        assert_eq!(view["controls"]["improve"], true);
    }

    #[tokio::test]
    async fn test_assist_on_unknown_session_is_404_even_without_key() {
        let app = build_router(test_state(None));
        let (status, body) = send_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/assist/suggest", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_ai_failure_is_502_and_keeps_project() {
        let generator = stub(Err("quota exceeded"));
        let app = build_router(test_state(Some(generator)));
        let id = session_at_project(&app).await;
        let base = format!("/api/v1/sessions/{id}");
        send_json(&app, "PATCH", &format!("{base}/project"), Some(project())).await;

        let (status, body) =
            send_json(&app, "POST", &format!("{base}/assist/improve"), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "AI_FAILED");

        let (_, view) = send_json(&app, "GET", &base, None).await;
        assert_eq!(view["project"], project());
        assert_eq!(view["assist"]["status"], "failed");
        assert_eq!(view["controls"]["improve"], true);
    }

    #[tokio::test]
    async fn test_improve_falls_back_per_field() {
        let generator = stub(Ok(
            r#"{"topic": "Sujet reformulé", "generalObjective": "", "specificObjectives": ["Nouveau 1"]}"#,
        ));
        let app = build_router(test_state(Some(generator)));
        let id = session_at_project(&app).await;
        let base = format!("/api/v1/sessions/{id}");
        send_json(&app, "PATCH", &format!("{base}/project"), Some(project())).await;

        let (status, view) =
            send_json(&app, "POST", &format!("{base}/assist/improve"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["project"]["topic"], "Sujet reformulé");
        assert_eq!(
            view["project"]["general_objective"],
            "Évaluer l'effet de l'IA sur la productivité"
        );
        assert_eq!(
            view["project"]["specific_objectives"],
            json!(["Nouveau 1", "Mesurer les gains", "Identifier les freins"])
        );
    }

    #[tokio::test]
    async fn test_second_ai_call_while_in_flight_is_rejected() {
        let generator = stub(Ok("{}"));
        let state = test_state(Some(generator.clone()));
        let app = build_router(state.clone());
        let id = session_at_project(&app).await;
        let session_id: Uuid = id.parse().unwrap();

        state
            .sessions
            .with_session(session_id, |s| s.assist.begin("suggest"))
            .await
            .unwrap()
            .unwrap();

        let (status, body) = send_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/assist/improve"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "OPERATION_IN_PROGRESS");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

        let (_, view) = send_json(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["controls"]["suggest"], false);
        assert_eq!(view["controls"]["improve"], false);
    }

    #[tokio::test]
    async fn test_assist_outside_project_step_is_conflict() {
        let generator = stub(Ok("{}"));
        let app = build_router(test_state(Some(generator)));
        let id = create_session(&app).await;
        let (status, _) = send_json(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/assist/suggest"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_export_docx_from_review() {
        let app = build_router(test_state(None));
        let id = session_at_review(&app).await;

        let (status, headers, bytes) =
            send(&app, "GET", &format!("/api/v1/sessions/{id}/export/docx"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains("Synthese_Dupont_Jean.docx"));
        assert!(bytes.starts_with(b"PK"));

        // Export does not move the wizard.
        let (_, view) = send_json(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(view["step"], "review");
        assert_eq!(view["export"]["status"], "succeeded");
        assert_eq!(view["controls"]["export"], true);
    }

    #[tokio::test]
    async fn test_export_pdf_from_review() {
        let app = build_router(test_state(None));
        let id = session_at_review(&app).await;

        let (status, headers, bytes) =
            send(&app, "GET", &format!("/api/v1/sessions/{id}/export/pdf"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("Synthese_Dupont_Jean.pdf"));
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_rules() {
        let app = build_router(test_state(None));
        let id = session_at_project(&app).await;
        let (status, _) = send_json(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/export/pdf"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let id = session_at_review(&app).await;
        let (status, body) = send_json(
            &app,
            "GET",
            &format!("/api/v1/sessions/{id}/export/odt"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_export_archives_when_dir_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(None);
        state.config = Arc::new(Config {
            gemini_api_key: None,
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            export_dir: Some(dir.path().to_path_buf()),
            port: 0,
            rust_log: "info".to_string(),
        });
        let app = build_router(state);
        let id = session_at_review(&app).await;

        let (status, _, _) =
            send(&app, "GET", &format!("/api/v1/sessions/{id}/export/pdf"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(dir.path().join("Synthese_Dupont_Jean.pdf").exists());
    }

    #[tokio::test]
    async fn test_unknown_and_deleted_sessions_are_404() {
        let app = build_router(test_state(None));
        let (status, body) = send_json(
            &app,
            "GET",
            &format!("/api/v1/sessions/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let id = create_session(&app).await;
        let (status, _) =
            send_json(&app, "DELETE", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send_json(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

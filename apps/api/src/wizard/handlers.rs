//! Axum route handlers for the wizard session API.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assist::{check_improve, check_suggest};
use crate::errors::AppError;
use crate::export::{archive, content_disposition, export_document, ExportError, ExportFormat};
use crate::models::{ProjectPatch, StudentPatch};
use crate::state::AppState;
use crate::wizard::session::{SessionView, WizardSession};
use crate::wizard::state::{Step, WizardError};

fn require_step(session: &WizardSession, target: Step) -> Result<(), AppError> {
    if session.state.step == target {
        Ok(())
    } else {
        Err(WizardError::WrongStep {
            target,
            current: session.state.step,
        }
        .into())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Starts a wizard at the identity step with empty records.
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let ai_available = state.assist.is_configured();
    let view = state.sessions.create(|s| s.view(ai_available)).await;
    (StatusCode::CREATED, Json(view))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let ai_available = state.assist.is_configured();
    let view = state
        .sessions
        .with_session(id, |s| s.view(ai_available))
        .await?;
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:id
///
/// Ends the session; its data is discarded.
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Editing and navigation
// ────────────────────────────────────────────────────────────────────────────

/// PATCH /api/v1/sessions/:id/student
pub async fn handle_patch_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<StudentPatch>,
) -> Result<Json<SessionView>, AppError> {
    let ai_available = state.assist.is_configured();
    let view = state
        .sessions
        .with_session(id, |s| {
            s.edit_student(patch)?;
            Ok::<_, AppError>(s.view(ai_available))
        })
        .await??;
    Ok(Json(view))
}

/// PATCH /api/v1/sessions/:id/project
pub async fn handle_patch_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<SessionView>, AppError> {
    let ai_available = state.assist.is_configured();
    let view = state
        .sessions
        .with_session(id, |s| {
            s.edit_project(patch)?;
            Ok::<_, AppError>(s.view(ai_available))
        })
        .await??;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/next
///
/// Validates the current step. On failure the per-field errors come back as
/// 422 details and stay on the session until the fields are edited.
pub async fn handle_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let ai_available = state.assist.is_configured();
    let view = state
        .sessions
        .with_session(id, |s| {
            let step = s.next()?;
            info!(session_id = %id, %step, "Wizard advanced");
            Ok::<_, AppError>(s.view(ai_available))
        })
        .await??;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:id/back
pub async fn handle_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let ai_available = state.assist.is_configured();
    let view = state
        .sessions
        .with_session(id, |s| {
            let step = s.back()?;
            info!(session_id = %id, %step, "Wizard went back");
            Ok::<_, AppError>(s.view(ai_available))
        })
        .await??;
    Ok(Json(view))
}

// ────────────────────────────────────────────────────────────────────────────
// AI assist
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum AssistOperation {
    Suggest,
    Improve,
}

impl AssistOperation {
    fn name(&self) -> &'static str {
        match self {
            AssistOperation::Suggest => "suggest",
            AssistOperation::Improve => "improve",
        }
    }
}

/// POST /api/v1/sessions/:id/assist/suggest
///
/// Drafts the general and specific objectives from the topic, replacing the current ones.
pub async fn handle_suggest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    run_assist(state, id, AssistOperation::Suggest).await
}

/// POST /api/v1/sessions/:id/assist/improve
///
/// Rewrites the whole project record in an academic register.
pub async fn handle_improve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    run_assist(state, id, AssistOperation::Improve).await
}

/// Snapshot under the lock, call the service without it, then apply under the lock again.
async fn run_assist(
    state: AppState,
    id: Uuid,
    operation: AssistOperation,
) -> Result<Json<SessionView>, AppError> {
    let (major, project) = state
        .sessions
        .with_session(id, |s| {
            require_step(s, Step::Project)?;
            if !state.assist.is_configured() {
                return Err(AppError::AiNotConfigured);
            }
            // Rejected requests never touch the tracker.
            match operation {
                AssistOperation::Suggest => check_suggest(&s.state.project.topic)?,
                AssistOperation::Improve => check_improve(&s.state.project)?,
            }
            s.assist.begin(operation.name())?;
            Ok::<_, AppError>((s.state.student.major.clone(), s.state.project.clone()))
        })
        .await??;

    info!(session_id = %id, operation = operation.name(), "AI assist started");
    let outcome = match operation {
        AssistOperation::Suggest => state
            .assist
            .suggest(&project.topic, &major)
            .await
            .map(|suggestion| {
                let mut updated = project.clone();
                suggestion.apply_to(&mut updated);
                updated
            }),
        AssistOperation::Improve => state.assist.improve(&project, &major).await,
    };

    let view = state
        .sessions
        .with_session(id, |s| {
            let applied = outcome
                .map_err(AppError::from)
                .and_then(|updated| s.replace_project(updated).map_err(AppError::from));
            match applied {
                Ok(()) => {
                    s.assist.succeed();
                    Ok(s.view(true))
                }
                Err(e) => {
                    warn!(session_id = %id, operation = operation.name(), error = %e, "AI assist failed");
                    s.assist.fail(e.to_string());
                    Err(e)
                }
            }
        })
        .await??;
    Ok(Json(view))
}

// ────────────────────────────────────────────────────────────────────────────
// Export
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/sessions/:id/export/:format
///
/// Renders the summary sheet as `docx` or `pdf` and returns it as an attachment.
/// Only available from the review step. The wizard stays where it is.
pub async fn handle_export(
    State(state): State<AppState>,
    Path((id, format)): Path<(Uuid, String)>,
) -> Result<Response, AppError> {
    let format: ExportFormat = format
        .parse()
        .map_err(|e: crate::export::UnsupportedFormat| AppError::Validation(e.to_string()))?;

    let (student, project) = state
        .sessions
        .with_session(id, |s| {
            require_step(s, Step::Review)?;
            s.export.begin(format.extension())?;
            Ok::<_, AppError>((s.state.student.clone(), s.state.project.clone()))
        })
        .await??;

    info!(session_id = %id, %format, "Export started");
    let page = state.page_config.clone();
    let archive_dir = state.config.export_dir.clone();
    let date = Local::now().date_naive();

    let result = tokio::task::spawn_blocking(move || {
        let document = export_document(&student, &project, format, date, &page)?;
        if let Some(dir) = archive_dir {
            archive(&dir, &document)?;
        }
        Ok::<_, ExportError>(document)
    })
    .await
    .map_err(ExportError::from)
    .and_then(|rendered| rendered);

    state
        .sessions
        .with_session(id, |s| match &result {
            Ok(_) => s.export.succeed(),
            Err(e) => s.export.fail(e.to_string()),
        })
        .await?;

    let document = result?;
    info!(session_id = %id, filename = %document.filename, "Export finished");

    let disposition = HeaderValue::from_str(&content_disposition(&document.filename))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid Content-Disposition: {e}")))?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(document.content_type()),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

// src/handlers/videos.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    config::RECENT_LIMIT,
    error::AppError,
    handlers::current_student,
    models::{
        Pagination,
        video::{SubmitVideoRequest, VideoAnalysisResponse, VideoStatus, VideoSubmission},
    },
    notifications::{Mailer, dispatch},
    services::{ai::LanguageModel, video_analyzer},
    state::AppState,
    store::Store,
    utils::jwt::{Capability, Claims},
};

/// Loads a submission the caller may see: admins see all, students their own.
async fn visible_video(
    store: &dyn Store,
    claims: &Claims,
    id: &str,
) -> Result<VideoSubmission, AppError> {
    let video = store
        .get_video(id)
        .await?
        .ok_or(AppError::NotFound("Video submission not found".to_string()))?;
    claims.require_self_or_admin(&video.student_email)?;
    Ok(video)
}

/// Analyses one submission and writes the outcome back.
///
/// Status goes processing, then analyzed. If the store rejects the write the
/// status is reset to uploaded so the analysis can be triggered again.
pub async fn run_analysis(
    store: Arc<dyn Store>,
    model: Arc<dyn LanguageModel>,
    mailer: Arc<dyn Mailer>,
    video_id: String,
) {
    let video = match store.get_video(&video_id).await {
        Ok(Some(video)) => video,
        Ok(None) => {
            tracing::warn!(video_id = %video_id, "Video vanished before analysis");
            return;
        }
        Err(e) => {
            tracing::error!(video_id = %video_id, "Failed to load video: {:?}", e);
            return;
        }
    };

    if let Err(e) = store.set_video_status(&video_id, VideoStatus::Processing).await {
        tracing::error!(video_id = %video_id, "Failed to mark video processing: {:?}", e);
        return;
    }

    let analysis = video_analyzer::analyze(model.as_ref(), &video).await;

    match store.save_video_analysis(&video_id, &analysis).await {
        Ok(Some(analyzed)) => {
            tracing::info!(video_id = %video_id, "Video analyzed");
            dispatch::notify_video_feedback(mailer.as_ref(), &analyzed).await;
        }
        Ok(None) => tracing::warn!(video_id = %video_id, "Video deleted during analysis"),
        Err(e) => {
            tracing::error!(video_id = %video_id, "Failed to save analysis: {:?}", e);
            if let Err(e) = store.set_video_status(&video_id, VideoStatus::Uploaded).await {
                tracing::error!(video_id = %video_id, "Failed to reset video status: {:?}", e);
            }
        }
    }
}

fn spawn_analysis(state: &AppState, video_id: String) {
    tokio::spawn(run_analysis(
        state.store.clone(),
        state.ai.clone(),
        state.mailer.clone(),
        video_id,
    ));
}

/// Records a video for the caller and starts its analysis.
/// Student only.
pub async fn submit_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::TakeQuizzes)?;
    payload.validate()?;

    let student = current_student(state.store.as_ref(), &claims).await?;

    let video = VideoSubmission {
        id: uuid::Uuid::new_v4().to_string(),
        student_id: student.id,
        student_name: student.name,
        student_email: student.email,
        video_url: payload.video_url,
        title: payload.title,
        description: payload.description,
        status: VideoStatus::Uploaded,
        transcription: None,
        analysis_summary: None,
        feedback: None,
        submitted_at: Utc::now(),
        analyzed_at: None,
    };
    let video = state.store.insert_video(video).await?;

    spawn_analysis(&state, video.id.clone());

    Ok((StatusCode::CREATED, Json(video)))
}

/// Admins list every submission, students only their own.
pub async fn list_videos(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let videos = if claims.role.can(Capability::ManageClass) {
        store.list_videos(None, page).await?
    } else {
        let student = current_student(store.as_ref(), &claims).await?;
        store.list_videos(Some(&student.id), page).await?
    };
    Ok(Json(videos))
}

pub async fn get_video(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(visible_video(store.as_ref(), &claims, &id).await?))
}

pub async fn delete_video(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video = visible_video(store.as_ref(), &claims, &id).await?;

    if !store.delete_video(&video.id).await? {
        return Err(AppError::NotFound("Video submission not found".to_string()));
    }

    Ok(Json(json!({ "message": "Video submission deleted successfully" })))
}

pub async fn video_analysis(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video = visible_video(store.as_ref(), &claims, &id).await?;
    Ok(Json(VideoAnalysisResponse::from(&video)))
}

/// Re-runs the analysis in the background.
/// Admin only.
pub async fn analyze_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;

    let video = state
        .store
        .get_video(&id)
        .await?
        .ok_or(AppError::NotFound("Video submission not found".to_string()))?;

    spawn_analysis(&state, video.id);

    Ok(Json(json!({ "message": "Video analysis started" })))
}

/// The caller's newest submissions.
/// Student only.
pub async fn recent_videos(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::TakeQuizzes)?;

    let student = current_student(store.as_ref(), &claims).await?;
    let page = Pagination {
        skip: Some(0),
        limit: Some(RECENT_LIMIT as i64),
    };
    Ok(Json(store.list_videos(Some(&student.id), page).await?))
}

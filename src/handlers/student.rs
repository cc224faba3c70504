// src/handlers/student.rs
//
// Student dashboard. The router wraps these in `student_middleware`.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    handlers::{all_quizzes, all_videos_for, current_student, mean, round1},
    models::{Pagination, quiz::StudentQuizEntry, video::VideoStatus},
    store::Store,
    utils::jwt::Claims,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuizStats {
    pub total_quizzes: i64,
    pub completed_quizzes: usize,
    pub average_score: f64,
    pub best_score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentVideoStats {
    pub total_videos: usize,
    pub analyzed_videos: usize,
    pub pending_videos: usize,
}

/// Every quiz with the caller's completion status and score.
pub async fn my_quizzes(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = match store.find_student_by_email(&claims.email).await? {
        Some(student) => store.results_for_student(&student.id).await?,
        None => Vec::new(),
    };

    let entries: Vec<StudentQuizEntry> = all_quizzes(store.as_ref())
        .await?
        .iter()
        .map(|quiz| StudentQuizEntry::new(quiz, results.iter().find(|r| r.quiz_id == quiz.id)))
        .collect();

    Ok(Json(entries))
}

pub async fn my_quiz_stats(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student = current_student(store.as_ref(), &claims).await?;
    let percentages: Vec<f64> = store
        .results_for_student(&student.id)
        .await?
        .iter()
        .map(|r| r.percentage)
        .collect();

    Ok(Json(StudentQuizStats {
        total_quizzes: store.count_quizzes().await?,
        completed_quizzes: percentages.len(),
        average_score: round1(mean(&percentages)),
        best_score: round1(percentages.iter().copied().fold(0.0, f64::max)),
    }))
}

pub async fn my_videos(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let student = current_student(store.as_ref(), &claims).await?;
    Ok(Json(store.list_videos(Some(&student.id), page).await?))
}

fn default_recent_videos() -> i64 {
    3
}

/// `?limit=` for the dashboard's recent-videos panel.
#[derive(Debug, Deserialize)]
pub struct RecentVideosQuery {
    #[serde(default = "default_recent_videos")]
    pub limit: i64,
}

/// The caller's newest submissions, `limit` of them (3 unless asked).
pub async fn my_recent_videos(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RecentVideosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let student = current_student(store.as_ref(), &claims).await?;
    let page = Pagination {
        skip: Some(0),
        limit: Some(query.limit),
    };
    Ok(Json(store.list_videos(Some(&student.id), page).await?))
}

pub async fn my_video_stats(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student = current_student(store.as_ref(), &claims).await?;
    let videos = all_videos_for(store.as_ref(), &student.id).await?;
    let analyzed = videos
        .iter()
        .filter(|v| v.status == VideoStatus::Analyzed)
        .count();

    Ok(Json(StudentVideoStats {
        total_videos: videos.len(),
        analyzed_videos: analyzed,
        pending_videos: videos.len() - analyzed,
    }))
}

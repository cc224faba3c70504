// src/handlers/admin.rs
//
// Admin dashboard. The router wraps these in `admin_middleware`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Serialize;

use crate::{
    error::AppError,
    handlers::{all_quizzes, mean, round1},
    models::{
        Pagination,
        quiz::{Quiz, QuizStatus},
        user::Role,
    },
    store::Store,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_students: i64,
    pub total_quizzes: i64,
    pub total_videos: i64,
    pub average_score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuizStats {
    pub total_quizzes: usize,
    pub active_quizzes: usize,
    pub total_attempts: usize,
    pub average_score: f64,
}

/// A quiz with how it has been received so far.
#[derive(Debug, Serialize)]
pub struct AdminQuizEntry {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub attempts_count: usize,
    pub average_score: f64,
}

/// Headline counts. `averageScore` is the mean result percentage.
pub async fn admin_stats(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    let percentages: Vec<f64> = store
        .all_results()
        .await?
        .iter()
        .map(|r| r.percentage)
        .collect();

    Ok(Json(AdminStats {
        total_students: store.count_users_with_role(Role::Student).await?,
        total_quizzes: store.count_quizzes().await?,
        total_videos: store.count_videos().await?,
        average_score: round1(mean(&percentages)),
    }))
}

pub async fn admin_quiz_stats(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = all_quizzes(store.as_ref()).await?;
    let percentages: Vec<f64> = store
        .all_results()
        .await?
        .iter()
        .map(|r| r.percentage)
        .collect();

    Ok(Json(AdminQuizStats {
        total_quizzes: quizzes.len(),
        active_quizzes: quizzes
            .iter()
            .filter(|q| q.status == QuizStatus::Published)
            .count(),
        total_attempts: percentages.len(),
        average_score: round1(mean(&percentages)),
    }))
}

/// Every quiz, newest first, with attempt counts and mean percentage.
pub async fn admin_quizzes(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    let mut by_quiz: HashMap<String, Vec<f64>> = HashMap::new();
    for result in store.all_results().await? {
        by_quiz
            .entry(result.quiz_id)
            .or_default()
            .push(result.percentage);
    }

    let entries: Vec<AdminQuizEntry> = all_quizzes(store.as_ref())
        .await?
        .into_iter()
        .map(|quiz| {
            let scores = by_quiz.get(&quiz.id).map(Vec::as_slice).unwrap_or(&[]);
            AdminQuizEntry {
                attempts_count: scores.len(),
                average_score: round1(mean(scores)),
                quiz,
            }
        })
        .collect();

    Ok(Json(entries))
}

/// Roster with its running counters.
pub async fn admin_students(
    State(store): State<Arc<dyn Store>>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_students(page).await?))
}

pub async fn admin_videos(
    State(store): State<Arc<dyn Store>>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_videos(None, page).await?))
}

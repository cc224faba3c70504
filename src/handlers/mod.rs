// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod notifications;
pub mod quizzes;
pub mod student;
pub mod students;
pub mod videos;

use crate::{
    config::MAX_PAGE_SIZE,
    error::AppError,
    models::{Pagination, quiz::Quiz, student::Student, video::VideoSubmission},
    store::Store,
    utils::jwt::Claims,
};

/// Roster entry of the caller, matched by token email.
pub(crate) async fn current_student(
    store: &dyn Store,
    claims: &Claims,
) -> Result<Student, AppError> {
    store
        .find_student_by_email(&claims.email)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))
}

/// Every quiz, newest first, fetched page by page.
pub(crate) async fn all_quizzes(store: &dyn Store) -> Result<Vec<Quiz>, AppError> {
    let mut quizzes = Vec::new();
    loop {
        let page = Pagination {
            skip: Some(quizzes.len() as i64),
            limit: Some(MAX_PAGE_SIZE),
        };
        let batch = store.list_quizzes(page).await?;
        let done = (batch.len() as i64) < MAX_PAGE_SIZE;
        quizzes.extend(batch);
        if done {
            return Ok(quizzes);
        }
    }
}

/// Every submission of one student, newest first, fetched page by page.
pub(crate) async fn all_videos_for(
    store: &dyn Store,
    student_id: &str,
) -> Result<Vec<VideoSubmission>, AppError> {
    let mut videos = Vec::new();
    loop {
        let page = Pagination {
            skip: Some(videos.len() as i64),
            limit: Some(MAX_PAGE_SIZE),
        };
        let batch = store.list_videos(Some(student_id), page).await?;
        let done = (batch.len() as i64) < MAX_PAGE_SIZE;
        videos.extend(batch);
        if done {
            return Ok(videos);
        }
    }
}

/// Rounds to one decimal place for dashboard figures.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

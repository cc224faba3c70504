// src/handlers/students.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    grading::class_statistics,
    models::{
        Pagination,
        student::{CreateStudentRequest, Student, UpdateStudentRequest},
    },
    store::Store,
    utils::jwt::{Capability, Claims},
};

fn duplicate_email(err: AppError) -> AppError {
    match err {
        AppError::Conflict(_) => {
            AppError::BadRequest("Student with this email already exists".to_string())
        }
        other => other,
    }
}

/// Loads a roster entry the caller may see: admins see all, students themselves.
async fn visible_student(
    store: &dyn Store,
    claims: &Claims,
    id: &str,
) -> Result<Student, AppError> {
    let student = store
        .get_student(id)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;
    claims.require_self_or_admin(&student.email)?;
    Ok(student)
}

/// Enrols a student on the roster.
/// Admin only.
pub async fn create_student(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;
    payload.validate()?;

    let student = Student::new(
        payload.name,
        payload.email,
        payload.student_id,
        payload.class_name,
    );
    let student = store.create_student(student).await.map_err(duplicate_email)?;

    Ok((StatusCode::CREATED, Json(student)))
}

/// Admin only.
pub async fn list_students(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;
    Ok(Json(store.list_students(page).await?))
}

pub async fn get_student(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(visible_student(store.as_ref(), &claims, &id).await?))
}

/// Partial update; absent fields stay as they are.
/// Admin only.
pub async fn update_student(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;
    payload.validate()?;

    let student = store
        .update_student(&id, &payload)
        .await
        .map_err(duplicate_email)?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;

    Ok(Json(student))
}

/// Admin only.
pub async fn delete_student(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;

    if !store.delete_student(&id).await? {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    Ok(Json(json!({ "message": "Student deleted successfully" })))
}

pub async fn student_quiz_results(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let student = visible_student(store.as_ref(), &claims, &id).await?;
    Ok(Json(store.results_for_student(&student.id).await?))
}

pub async fn student_video_submissions(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let student = visible_student(store.as_ref(), &claims, &id).await?;
    Ok(Json(store.list_videos(Some(&student.id), page).await?))
}

/// Aggregate over every result of one student. `{}` when there are none.
pub async fn student_statistics(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let student = visible_student(store.as_ref(), &claims, &id).await?;
    let results = store.results_for_student(&student.id).await?;
    Ok(Json(class_statistics(&results)))
}

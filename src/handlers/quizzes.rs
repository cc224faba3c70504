// src/handlers/quizzes.rs

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
    grading::{class_statistics, compose_result, score_answers},
    handlers::current_student,
    models::{
        Pagination,
        quiz::{
            CreateQuizRequest, GenerateQuizRequest, Question, Quiz, QuizDraft, QuizStatus,
            StudentQuizEntry, UpdateQuizRequest,
        },
        result::{SubmitQuizRequest, Submission},
    },
    notifications::dispatch,
    services::{
        commentary::grading_commentary,
        quiz_generator::{GenerationTask, generate_or_default},
    },
    state::AppState,
    store::Store,
    utils::jwt::{Capability, Claims},
};

const DEFAULT_DIFFICULTY: &str = "medium";

fn total_points(questions: &[Question]) -> i64 {
    questions
        .iter()
        .fold(0i64, |total, q| total.saturating_add(q.points))
}

async fn find_quiz(store: &dyn Store, id: &str) -> Result<Quiz, AppError> {
    store
        .get_quiz(id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Previews an AI-generated quiz without saving it.
/// Admin only.
pub async fn generate_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;
    payload.validate()?;

    let task = GenerationTask {
        subject: payload.topic.clone(),
        topic: payload.topic.clone(),
        difficulty: payload.difficulty.clone(),
        num_questions: payload.num_questions,
    };
    let questions = generate_or_default(state.ai.as_ref(), &task).await;

    Ok(Json(QuizDraft {
        title: format!("{} Quiz", payload.topic),
        description: format!(
            "A {} level quiz on {}",
            payload.difficulty, payload.topic
        ),
        topic: payload.topic,
        difficulty: payload.difficulty,
        time_limit: payload.time_limit,
        status: QuizStatus::Draft,
        total_points: total_points(&questions),
        questions,
    }))
}

/// Creates and publishes a quiz, then emails every roster student.
///
/// Explicit questions must satisfy the answer-key invariant; without them
/// the set is generated from the title and subject.
/// Admin only.
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;
    payload.validate()?;

    let questions: Vec<Question> = match payload.questions {
        Some(inputs) => {
            if inputs.is_empty() {
                return Err(AppError::BadRequest(
                    "A quiz needs at least one question".to_string(),
                ));
            }
            let questions: Vec<Question> = inputs.into_iter().map(Question::from).collect();
            for question in &questions {
                question.check().map_err(AppError::BadRequest)?;
            }
            questions
        }
        None => {
            let task = GenerationTask {
                subject: payload.subject.clone(),
                topic: payload.title.clone(),
                difficulty: DEFAULT_DIFFICULTY.to_string(),
                num_questions: payload.total_questions as u32,
            };
            generate_or_default(state.ai.as_ref(), &task).await
        }
    };

    let now = Utc::now();
    let quiz = Quiz {
        id: uuid::Uuid::new_v4().to_string(),
        title: payload.title,
        description: payload.description,
        subject: payload.subject,
        duration_minutes: payload.duration_minutes,
        total_questions: questions.len() as i32,
        total_points: total_points(&questions),
        questions,
        status: QuizStatus::Published,
        created_by: claims.email.clone(),
        created_at: now,
        updated_at: now,
    };
    let quiz = state.store.insert_quiz(quiz).await?;
    tracing::info!(quiz_id = %quiz.id, questions = quiz.questions.len(), "Quiz created");

    let (store, mailer, published) = (state.store.clone(), state.mailer.clone(), quiz.clone());
    tokio::spawn(async move {
        dispatch::notify_quiz_created(store.as_ref(), mailer.as_ref(), &published).await;
    });

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Lists quizzes, newest first. Students get them without answer keys.
pub async fn list_quizzes(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list_quizzes(page).await?;
    if claims.role.can(Capability::ManageClass) {
        return Ok(Json(quizzes));
    }
    Ok(Json(quizzes.iter().map(Quiz::redacted).collect::<Vec<_>>()))
}

pub async fn get_quiz(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = find_quiz(store.as_ref(), &id).await?;
    if claims.role.can(Capability::ManageClass) {
        Ok(Json(quiz))
    } else {
        Ok(Json(quiz.redacted()))
    }
}

/// Admin only. Questions cannot be edited once stored.
pub async fn update_quiz(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;
    payload.validate()?;

    let quiz = store
        .update_quiz(&id, &payload)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// Admin only.
pub async fn delete_quiz(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;

    if !store.delete_quiz(&id).await? {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(Json(json!({ "message": "Quiz deleted successfully" })))
}

/// The newest quizzes with the caller's completion status.
/// Student only.
pub async fn recent_quizzes(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::TakeQuizzes)?;

    let page = Pagination {
        skip: Some(0),
        limit: Some(RECENT_LIMIT as i64),
    };
    let quizzes = store.list_quizzes(page).await?;

    let results = match store.find_student_by_email(&claims.email).await? {
        Some(student) => store.results_for_student(&student.id).await?,
        None => Vec::new(),
    };

    let entries: Vec<StudentQuizEntry> = quizzes
        .iter()
        .map(|quiz| StudentQuizEntry::new(quiz, results.iter().find(|r| r.quiz_id == quiz.id)))
        .collect();

    Ok(Json(entries))
}

/// Grades a submission and records it.
///
/// One attempt per quiz and student (409 on a second). The roster counters
/// are folded in atomically and the result email goes out in the background.
/// Student only.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::TakeQuizzes)?;

    let store = state.store.as_ref();
    let quiz = find_quiz(store, &id).await?;
    let student = current_student(store, &claims).await?;

    let already_submitted = store
        .results_for_student(&student.id)
        .await?
        .iter()
        .any(|r| r.quiz_id == quiz.id);
    if already_submitted {
        return Err(AppError::Conflict("Quiz already submitted".to_string()));
    }

    let submission = Submission::received(quiz.id.clone(), student.id.clone(), payload);
    let score = score_answers(&quiz.questions, &submission.answers);
    let commentary =
        grading_commentary(state.ai.as_ref(), &quiz.questions, &submission.answers, &score).await;

    let result = compose_result(submission, &student.name, score, commentary);
    let result = store.record_result(result).await?;

    tracing::info!(
        quiz_id = %quiz.id,
        student_id = %student.id,
        percentage = result.percentage,
        "Quiz graded"
    );

    let (mailer, graded, to) = (state.mailer.clone(), result.clone(), student.email);
    tokio::spawn(async move {
        dispatch::notify_quiz_result(mailer.as_ref(), &to, &graded).await;
    });

    Ok(Json(result))
}

/// Admin only.
pub async fn quiz_results(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;
    let quiz = find_quiz(store.as_ref(), &id).await?;
    Ok(Json(store.results_for_quiz(&quiz.id).await?))
}

/// Class statistics for one quiz; `{}` before anyone has submitted.
/// Admin only.
pub async fn quiz_statistics(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require(Capability::ManageClass)?;
    let quiz = find_quiz(store.as_ref(), &id).await?;
    let results = store.results_for_quiz(&quiz.id).await?;
    Ok(Json(class_statistics(&results)))
}

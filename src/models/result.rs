// src/models/result.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// Key: question id. Value: chosen option id.
    /// Need not cover every question.
    pub answers: HashMap<String, String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A student's answers for one quiz, as handed to the grader.
#[derive(Debug, Clone)]
pub struct Submission {
    pub quiz_id: String,
    pub student_id: String,
    pub answers: HashMap<String, String>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// `submitted_at` falls back to the time of receipt.
    pub fn received(
        quiz_id: String,
        student_id: String,
        request: SubmitQuizRequest,
    ) -> Self {
        Self {
            quiz_id,
            student_id,
            answers: request.answers,
            submitted_at: request.submitted_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Represents the 'quiz_results' table. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: String,
    pub quiz_id: String,
    pub student_id: String,
    pub student_name: String,
    pub answers: HashMap<String, String>,
    pub score: i64,
    pub total_points: i64,
    pub percentage: f64,
    pub feedback: String,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: DateTime<Utc>,
}

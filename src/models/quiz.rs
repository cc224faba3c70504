// src/models/quiz.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::MAX_QUESTION_POINTS;
use crate::models::result::QuizResult;

/// One selectable answer of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

/// A single multiple-choice item. Immutable once its quiz is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question_text: String,
    pub options: Vec<QuestionOption>,
    pub correct_answer_id: String,
    #[serde(default = "default_points")]
    pub points: i64,
}

fn default_points() -> i64 {
    1
}

impl Question {
    /// Checks that exactly one option is flagged correct, that it is the
    /// designated answer, and that the point value lies in
    /// `0..=MAX_QUESTION_POINTS`.
    pub fn check(&self) -> Result<(), String> {
        if self.points < 0 {
            return Err(format!("question '{}' has negative points", self.id));
        }
        if self.points > MAX_QUESTION_POINTS {
            return Err(format!(
                "question '{}' is worth more than {MAX_QUESTION_POINTS} points",
                self.id
            ));
        }
        let mut correct = self.options.iter().filter(|o| o.is_correct);
        match (correct.next(), correct.next()) {
            (Some(option), None) if option.id == self.correct_answer_id => Ok(()),
            (Some(_), None) => Err(format!(
                "question '{}': correct option does not match correct_answer_id",
                self.id
            )),
            (None, _) => Err(format!("question '{}' has no correct option", self.id)),
            (Some(_), Some(_)) => Err(format!(
                "question '{}' has more than one correct option",
                self.id
            )),
        }
    }

    /// Copy with every answer key removed, for students.
    pub fn redacted(&self) -> Question {
        Question {
            options: self
                .options
                .iter()
                .map(|o| QuestionOption {
                    is_correct: false,
                    ..o.clone()
                })
                .collect(),
            correct_answer_id: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizStatus {
    Draft,
    Published,
    Completed,
}

impl QuizStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuizStatus::Draft => "draft",
            QuizStatus::Published => "published",
            QuizStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(QuizStatus::Draft),
            "published" => Ok(QuizStatus::Published),
            "completed" => Ok(QuizStatus::Completed),
            other => Err(format!("unknown quiz status '{other}'")),
        }
    }
}

/// Represents the 'quizzes' table. Questions are stored as a JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub duration_minutes: i32,
    pub total_questions: i32,
    pub questions: Vec<Question>,
    pub status: QuizStatus,

    /// Email of the admin who created the quiz.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_points: i64,
}

impl Quiz {
    /// Copy safe to hand to a student: no correct answers.
    pub fn redacted(&self) -> Quiz {
        Quiz {
            questions: self.questions.iter().map(Question::redacted).collect(),
            ..self.clone()
        }
    }
}

/// A question as typed by an admin; ids are assigned on save.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub question_text: String,
    pub options: Vec<QuestionOption>,
    pub correct_answer_id: String,
    #[serde(default = "default_points")]
    pub points: i64,
}

impl From<QuestionInput> for Question {
    fn from(input: QuestionInput) -> Self {
        Question {
            id: uuid::Uuid::new_v4().to_string(),
            question_text: input.question_text,
            options: input.options,
            correct_answer_id: input.correct_answer_id,
            points: input.points,
        }
    }
}

fn default_duration() -> i32 {
    30
}

fn default_question_count() -> i32 {
    10
}

/// DTO for creating a quiz. Without `questions` the set is AI-generated.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[serde(default = "default_duration")]
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: i32,
    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = 50))]
    pub total_questions: i32,
    pub questions: Option<Vec<QuestionInput>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<i32>,
}

/// DTO for previewing an AI-generated quiz without saving it.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    #[validate(length(min = 1, max = 20))]
    pub difficulty: String,
    #[validate(range(min = 1, max = 50))]
    pub num_questions: u32,
    #[validate(range(min = 1, max = 600))]
    pub time_limit: u32,
}

/// Unsaved preview returned by the generate endpoint.
#[derive(Debug, Serialize)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub topic: String,
    pub difficulty: String,
    pub time_limit: u32,
    pub status: QuizStatus,
    pub total_points: i64,
    pub questions: Vec<Question>,
}

/// A quiz as listed on a student's dashboard.
#[derive(Debug, Serialize)]
pub struct StudentQuizEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub duration_minutes: i32,
    pub total_points: i64,
    pub questions_count: usize,
    /// "completed" or "available".
    pub status: &'static str,
    pub score: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl StudentQuizEntry {
    pub fn new(quiz: &Quiz, result: Option<&QuizResult>) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            subject: quiz.subject.clone(),
            duration_minutes: quiz.duration_minutes,
            total_points: quiz.total_points,
            questions_count: quiz.questions.len(),
            status: if result.is_some() { "completed" } else { "available" },
            score: result.map(|r| r.percentage),
            completed_at: result.map(|r| r.submitted_at),
            created_at: quiz.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str, is_correct: bool) -> QuestionOption {
        QuestionOption {
            id: id.to_string(),
            text: format!("Option {id}"),
            is_correct,
        }
    }

    fn question(options: Vec<QuestionOption>, correct: &str, points: i64) -> Question {
        Question {
            id: "q1".to_string(),
            question_text: "What?".to_string(),
            options,
            correct_answer_id: correct.to_string(),
            points,
        }
    }

    #[test]
    fn accepts_single_matching_correct_option() {
        let q = question(vec![option("A", true), option("B", false)], "A", 1);
        assert!(q.check().is_ok());
    }

    #[test]
    fn rejects_broken_answer_keys() {
        assert!(question(vec![option("A", false), option("B", false)], "A", 1).check().is_err());
        assert!(question(vec![option("A", true), option("B", true)], "A", 1).check().is_err());
        assert!(question(vec![option("A", true), option("B", false)], "B", 1).check().is_err());
        assert!(question(vec![option("A", true)], "A", -1).check().is_err());
    }

    #[test]
    fn rejects_oversized_point_values() {
        let options = || vec![option("A", true), option("B", false)];
        assert!(question(options(), "A", MAX_QUESTION_POINTS).check().is_ok());
        assert!(question(options(), "A", MAX_QUESTION_POINTS + 1).check().is_err());
        assert!(question(options(), "A", i64::MAX).check().is_err());
    }

    #[test]
    fn redaction_hides_answers() {
        let q = question(vec![option("A", true), option("B", false)], "A", 2);
        let r = q.redacted();
        assert!(r.options.iter().all(|o| !o.is_correct));
        assert!(r.correct_answer_id.is_empty());
        assert_eq!(r.points, 2);
    }
}

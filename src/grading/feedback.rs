// src/grading/feedback.rs

use chrono::Utc;
use serde::Serialize;

use crate::grading::scoring::Score;
use crate::models::result::{QuizResult, Submission};
use crate::services::ai::AiOutcome;

/// Display band derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Performance {
    Excellent,
    Good,
    Satisfactory,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Performance {
    /// Thresholds are inclusive: exactly 90.0 is `Excellent`.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Performance::Excellent
        } else if percentage >= 80.0 {
            Performance::Good
        } else if percentage >= 70.0 {
            Performance::Satisfactory
        } else {
            Performance::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Performance::Excellent => "Excellent",
            Performance::Good => "Good",
            Performance::Satisfactory => "Satisfactory",
            Performance::NeedsImprovement => "Needs Improvement",
        }
    }

    /// Banner colour used by the result email.
    pub fn color(self) -> &'static str {
        match self {
            Performance::Excellent => "#28a745",
            Performance::Good => "#17a2b8",
            Performance::Satisfactory => "#ffc107",
            Performance::NeedsImprovement => "#dc3545",
        }
    }
}

/// Canned feedback used whenever no commentary could be generated.
pub fn fallback_feedback(score: &Score) -> String {
    format!(
        "Quiz completed with a score of {}/{} ({:.1}%). Keep studying and practicing!",
        score.score,
        score.total_points,
        score.percentage()
    )
}

/// Builds the immutable result record for a graded submission.
///
/// Never fails: blank or unavailable commentary is replaced by
/// [`fallback_feedback`].
pub fn compose_result(
    submission: Submission,
    student_name: &str,
    score: Score,
    commentary: AiOutcome<String>,
) -> QuizResult {
    let feedback = match commentary {
        AiOutcome::Generated(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => fallback_feedback(&score),
    };

    QuizResult {
        id: uuid::Uuid::new_v4().to_string(),
        quiz_id: submission.quiz_id,
        student_id: submission.student_id,
        student_name: student_name.to_string(),
        answers: submission.answers,
        score: score.score,
        total_points: score.total_points,
        percentage: score.percentage(),
        feedback,
        submitted_at: submission.submitted_at,
        graded_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn submission() -> Submission {
        Submission {
            quiz_id: "quiz-1".to_string(),
            student_id: "student-1".to_string(),
            answers: HashMap::from([("q1".to_string(), "A".to_string())]),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn performance_bands_take_the_higher_band_on_ties() {
        assert_eq!(Performance::from_percentage(100.0), Performance::Excellent);
        assert_eq!(Performance::from_percentage(90.0), Performance::Excellent);
        assert_eq!(Performance::from_percentage(89.99), Performance::Good);
        assert_eq!(Performance::from_percentage(80.0), Performance::Good);
        assert_eq!(Performance::from_percentage(70.0), Performance::Satisfactory);
        assert_eq!(
            Performance::from_percentage(69.9),
            Performance::NeedsImprovement
        );
        assert_eq!(
            Performance::from_percentage(50.0).label(),
            "Needs Improvement"
        );
    }

    #[test]
    fn fallback_text_matches_template() {
        let score = Score {
            score: 1,
            total_points: 3,
        };
        assert_eq!(
            fallback_feedback(&score),
            "Quiz completed with a score of 1/3 (33.3%). Keep studying and practicing!"
        );
    }

    #[test]
    fn generated_commentary_is_attached() {
        let score = Score {
            score: 1,
            total_points: 2,
        };
        let result = compose_result(
            submission(),
            "Ana",
            score,
            AiOutcome::Generated("  Nice work on question one.  ".to_string()),
        );

        assert_eq!(result.feedback, "Nice work on question one.");
        assert_eq!(result.student_name, "Ana");
        assert_eq!(result.percentage, 50.0);
        assert!(result.graded_at >= result.submitted_at);
        assert!(uuid::Uuid::parse_str(&result.id).is_ok());
    }

    #[test]
    fn unavailable_or_blank_commentary_falls_back() {
        let score = Score {
            score: 2,
            total_points: 2,
        };
        let expected = "Quiz completed with a score of 2/2 (100.0%). Keep studying and practicing!";

        let unavailable = compose_result(
            submission(),
            "Ana",
            score,
            AiOutcome::Unavailable {
                reason: "timeout".to_string(),
            },
        );
        let blank = compose_result(
            submission(),
            "Ana",
            score,
            AiOutcome::Generated("   ".to_string()),
        );

        assert_eq!(unavailable.feedback, expected);
        assert_eq!(blank.feedback, expected);
    }

    #[test]
    fn every_result_gets_a_fresh_id() {
        let score = Score {
            score: 0,
            total_points: 0,
        };
        let a = compose_result(submission(), "Ana", score, AiOutcome::unavailable("off"));
        let b = compose_result(submission(), "Ana", score, AiOutcome::unavailable("off"));
        assert_ne!(a.id, b.id);
        assert_eq!(a.percentage, 0.0);
    }
}

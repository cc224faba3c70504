// src/grading/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::quiz::Question;

/// Points earned against points available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub score: i64,
    pub total_points: i64,
}

impl Score {
    /// Score as a percentage of the total. Zero when nothing was available.
    pub fn percentage(&self) -> f64 {
        percentage(self.score, self.total_points)
    }
}

pub fn percentage(score: i64, total_points: i64) -> f64 {
    if total_points > 0 {
        score as f64 / total_points as f64 * 100.0
    } else {
        0.0
    }
}

/// Scores a set of answers against the answer key.
///
/// Every question counts towards the total whether or not it was answered.
/// Only an exact match with `correct_answer_id` earns points; unknown
/// question ids in `answers` are ignored. Sums saturate at `i64::MAX`, so
/// `score <= total_points` holds for any input.
pub fn score_answers(questions: &[Question], answers: &HashMap<String, String>) -> Score {
    questions.iter().fold(
        Score {
            score: 0,
            total_points: 0,
        },
        |acc, question| {
            let earned = match answers.get(&question.id) {
                Some(choice) if *choice == question.correct_answer_id => question.points,
                _ => 0,
            };
            Score {
                score: acc.score.saturating_add(earned),
                total_points: acc.total_points.saturating_add(question.points),
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::QuestionOption;

    fn question(id: &str, correct: &str, points: i64) -> Question {
        Question {
            id: id.to_string(),
            question_text: format!("Question {id}"),
            options: ["A", "B", "C", "D"]
                .iter()
                .map(|o| QuestionOption {
                    id: o.to_string(),
                    text: format!("Option {o}"),
                    is_correct: *o == correct,
                })
                .collect(),
            correct_answer_id: correct.to_string(),
            points,
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn one_of_two_correct_is_fifty_percent() {
        let questions = vec![question("q1", "A", 1), question("q2", "B", 1)];
        let score = score_answers(&questions, &answers(&[("q1", "A"), ("q2", "C")]));

        assert_eq!(score, Score { score: 1, total_points: 2 });
        assert_eq!(score.percentage(), 50.0);
    }

    #[test]
    fn unanswered_quiz_scores_zero() {
        let questions = vec![
            question("q1", "A", 1),
            question("q2", "B", 1),
            question("q3", "C", 1),
        ];
        let score = score_answers(&questions, &HashMap::new());

        assert_eq!(score, Score { score: 0, total_points: 3 });
        assert_eq!(score.percentage(), 0.0);
    }

    #[test]
    fn zero_total_points_never_divides() {
        let questions = vec![question("q1", "A", 0)];
        let score = score_answers(&questions, &answers(&[("q1", "A")]));

        assert_eq!(score.total_points, 0);
        assert_eq!(score.percentage(), 0.0);
        assert_eq!(score_answers(&[], &HashMap::new()).percentage(), 0.0);
    }

    #[test]
    fn weighted_points_and_bounds() {
        let questions = vec![question("q1", "A", 3), question("q2", "B", 2)];
        let score = score_answers(&questions, &answers(&[("q1", "A"), ("q2", "B")]));

        assert_eq!(score, Score { score: 5, total_points: 5 });
        assert!((score.percentage() - 100.0).abs() < f64::EPSILON);

        let partial = score_answers(&questions, &answers(&[("q2", "B")]));
        assert!((partial.percentage() - 40.0).abs() < 1e-9);
        assert!(partial.score <= partial.total_points);
    }

    #[test]
    fn wrong_and_missing_answers_score_the_same() {
        let questions = vec![question("q1", "A", 2), question("q2", "B", 2)];
        let wrong = score_answers(&questions, &answers(&[("q1", "A"), ("q2", "D")]));
        let missing = score_answers(&questions, &answers(&[("q1", "A")]));
        let blank = score_answers(&questions, &answers(&[("q1", "A"), ("q2", "")]));

        assert_eq!(wrong, missing);
        assert_eq!(missing, blank);
    }

    #[test]
    fn order_and_extra_keys_do_not_matter() {
        let forward = vec![question("q1", "A", 1), question("q2", "B", 4)];
        let reversed: Vec<Question> = forward.iter().rev().cloned().collect();
        let base = answers(&[("q1", "A"), ("q2", "B")]);
        let noisy = answers(&[("q1", "A"), ("q2", "B"), ("q9", "A"), ("bogus", "Z")]);

        let expected = score_answers(&forward, &base);
        assert_eq!(score_answers(&reversed, &base), expected);
        assert_eq!(score_answers(&forward, &noisy), expected);
    }

    #[test]
    fn huge_point_values_saturate_instead_of_overflowing() {
        let questions = vec![question("q1", "A", i64::MAX), question("q2", "B", i64::MAX)];
        let score = score_answers(&questions, &answers(&[("q1", "A"), ("q2", "B")]));

        assert_eq!(score, Score { score: i64::MAX, total_points: i64::MAX });
        assert!((score.percentage() - 100.0).abs() < f64::EPSILON);

        let partial = score_answers(&questions, &answers(&[("q1", "A")]));
        assert!(partial.score <= partial.total_points);
        assert!((0.0..=100.0).contains(&partial.percentage()));
    }
}

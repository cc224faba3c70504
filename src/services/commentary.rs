// src/services/commentary.rs

use std::collections::HashMap;

use crate::grading::Score;
use crate::models::quiz::Question;
use crate::services::ai::{AiOutcome, LanguageModel};

const SYSTEM_PROMPT: &str = "You are an experienced educator and assessment specialist. \
You give fair, constructive and encouraging feedback on quiz attempts.";

fn prompt(questions: &[Question], answers: &HashMap<String, String>, score: &Score) -> String {
    let mut lines = String::new();
    for (i, q) in questions.iter().enumerate() {
        let given = answers.get(&q.id).map(String::as_str).unwrap_or("(no answer)");
        lines.push_str(&format!(
            "{}. {} | correct: {} | student: {}\n",
            i + 1,
            q.question_text,
            q.correct_answer_id,
            given
        ));
    }

    format!(
        "Grade the following quiz attempt and write feedback for the student.\n\n\
         {lines}\n\
         Score: {}/{} ({:.1}%)\n\n\
         Cover overall performance, strengths, areas for improvement, the incorrect \
         answers, and next steps. Keep it constructive and under 200 words.",
        score.score,
        score.total_points,
        score.percentage()
    )
}

/// Free-text commentary on a graded attempt.
pub async fn grading_commentary(
    model: &dyn LanguageModel,
    questions: &[Question],
    answers: &HashMap<String, String>,
    score: &Score,
) -> AiOutcome<String> {
    let result = model
        .complete(SYSTEM_PROMPT, &prompt(questions, answers, score))
        .await;
    AiOutcome::from_result(result, "grading_commentary")
}

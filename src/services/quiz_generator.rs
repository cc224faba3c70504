// src/services/quiz_generator.rs

use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::models::quiz::{Question, QuestionInput, QuestionOption};
use crate::services::ai::{AiOutcome, LanguageModel};

const SYSTEM_PROMPT: &str = "You are an expert educational content creator. You write fair, \
engaging multiple choice questions that test understanding rather than memorization. \
You answer with JSON only.";

/// Matches a fenced code block, optionally tagged `json`.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid fenced block regex")
});

#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub subject: String,
    pub topic: String,
    pub difficulty: String,
    pub num_questions: u32,
}

fn prompt(task: &GenerationTask) -> String {
    format!(
        r#"Generate {count} multiple choice questions for the subject: {subject}
Topic: {topic}
Difficulty: {difficulty}

Each question must have 4 options with ids "A", "B", "C", "D", exactly one of
which is correct, and plausible distractors.

Respond with a JSON array where each element is:
{{
  "question_text": "The question text",
  "options": [
    {{"id": "A", "text": "Option A text", "is_correct": true}},
    {{"id": "B", "text": "Option B text", "is_correct": false}},
    {{"id": "C", "text": "Option C text", "is_correct": false}},
    {{"id": "D", "text": "Option D text", "is_correct": false}}
  ],
  "correct_answer_id": "A",
  "points": 1
}}"#,
        count = task.num_questions,
        subject = task.subject,
        topic = task.topic,
        difficulty = task.difficulty,
    )
}

/// Asks the model for questions. Questions violating the answer-key
/// invariant are dropped; if none survive the outcome is `Unavailable`.
pub async fn generate_questions(
    model: &dyn LanguageModel,
    task: &GenerationTask,
) -> AiOutcome<Vec<Question>> {
    let result = async {
        let raw = model.complete(SYSTEM_PROMPT, &prompt(task)).await?;
        let mut questions = parse_questions(&raw)?;
        questions.truncate(task.num_questions as usize);
        Ok::<_, anyhow::Error>(questions)
    }
    .await;

    AiOutcome::from_result(result, "quiz_generation")
}

/// Like [`generate_questions`] but never empty-handed.
pub async fn generate_or_default(model: &dyn LanguageModel, task: &GenerationTask) -> Vec<Question> {
    generate_questions(model, task)
        .await
        .unwrap_or_else(|| default_questions(task.num_questions))
}

/// Parses model output into validated questions with fresh ids.
pub fn parse_questions(raw: &str) -> Result<Vec<Question>> {
    let json = extract_json_array(raw).context("No JSON array in model output")?;
    let inputs: Vec<QuestionInput> =
        serde_json::from_str(json).context("Model output is not a question array")?;

    let questions: Vec<Question> = inputs
        .into_iter()
        .map(Question::from)
        .filter(|q| match q.check() {
            Ok(()) => true,
            Err(reason) => {
                tracing::warn!("Dropping generated question: {}", reason);
                false
            }
        })
        .collect();

    if questions.is_empty() {
        bail!("Model output contained no valid questions");
    }
    Ok(questions)
}

fn extract_json_array(raw: &str) -> Option<&str> {
    let body = FENCED_BLOCK
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);
    let start = body.find('[')?;
    let end = body.rfind(']')?;
    (start < end).then(|| &body[start..=end])
}

/// Placeholder questions used when generation is unavailable.
pub fn default_questions(count: u32) -> Vec<Question> {
    (1..=count)
        .map(|i| Question {
            id: uuid::Uuid::new_v4().to_string(),
            question_text: format!("Sample question {i}: What is the correct answer?"),
            options: ["A", "B", "C", "D"]
                .iter()
                .map(|id| QuestionOption {
                    id: id.to_string(),
                    text: format!("Option {id}"),
                    is_correct: *id == "A",
                })
                .collect(),
            correct_answer_id: "A".to_string(),
            points: 1,
        })
        .collect()
}

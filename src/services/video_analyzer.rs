// src/services/video_analyzer.rs

use chrono::Utc;

use crate::models::video::{VideoAnalysis, VideoSubmission};
use crate::services::ai::{AiOutcome, LanguageModel};

const SYSTEM_PROMPT: &str = "You are an expert educational content analyst. You review student \
video submissions for content quality, presentation skills and educational value.";

pub const ANALYSIS_FALLBACK: &str = "Unable to analyze video content. Please try again later.";
pub const FEEDBACK_FALLBACK: &str =
    "Good work on your video submission! Keep practicing and improving your presentation skills.";

/// There is no speech-to-text collaborator; the transcript is a marker.
pub fn transcribe(video_url: &str) -> String {
    format!("[Video transcription placeholder for: {video_url}]")
}

fn analysis_prompt(video: &VideoSubmission, transcription: &str) -> String {
    format!(
        "Analyze the following video submission:\n\n\
         Title: {}\n\
         Description: {}\n\
         Video URL: {}\n\
         Transcription: {}\n\n\
         Assess content quality (accuracy, depth, organisation, examples), presentation \
         skills (clarity, confidence, pace), educational value, and areas for improvement. \
         Finish with overall feedback.",
        video.title,
        video.description.as_deref().unwrap_or("(none)"),
        video.video_url,
        transcription
    )
}

fn summary_prompt(analysis: &str) -> String {
    format!(
        "Create a concise, actionable feedback summary from this analysis:\n\n{analysis}\n\n\
         Use 2-3 sentences: highlight the main strengths, mention 1-2 key areas for \
         improvement, and stay encouraging."
    )
}

/// Runs the two-step analysis. Each step falls back independently.
pub async fn analyze(model: &dyn LanguageModel, video: &VideoSubmission) -> VideoAnalysis {
    let transcription = transcribe(&video.video_url);

    let analysis = AiOutcome::from_result(
        model
            .complete(SYSTEM_PROMPT, &analysis_prompt(video, &transcription))
            .await,
        "video_analysis",
    );

    let (analysis_summary, feedback) = match analysis {
        AiOutcome::Generated(summary) => {
            let feedback = AiOutcome::from_result(
                model.complete(SYSTEM_PROMPT, &summary_prompt(&summary)).await,
                "video_feedback_summary",
            )
            .unwrap_or_else(|| FEEDBACK_FALLBACK.to_string());
            (summary, feedback)
        }
        AiOutcome::Unavailable { .. } => {
            (ANALYSIS_FALLBACK.to_string(), FEEDBACK_FALLBACK.to_string())
        }
    };

    VideoAnalysis {
        transcription,
        analysis_summary,
        feedback,
        analyzed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::models::video::VideoStatus;
    use crate::services::ai::UnavailableModel;

    struct Echo;

    #[async_trait]
    impl LanguageModel for Echo {
        async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
            if prompt.starts_with("Create a concise") {
                Ok("Short summary.".to_string())
            } else {
                Ok("Detailed analysis.".to_string())
            }
        }
    }

    fn video() -> VideoSubmission {
        VideoSubmission {
            id: "v1".into(),
            student_id: "s1".into(),
            student_name: "Ana".into(),
            student_email: "ana@example.com".into(),
            video_url: "https://videos.example.com/a.mp4".into(),
            title: "Cells".into(),
            description: None,
            status: VideoStatus::Processing,
            transcription: None,
            analysis_summary: None,
            feedback: None,
            submitted_at: Utc::now(),
            analyzed_at: None,
        }
    }

    #[tokio::test]
    async fn uses_model_output_when_available() {
        let analysis = analyze(&Echo, &video()).await;
        assert_eq!(analysis.analysis_summary, "Detailed analysis.");
        assert_eq!(analysis.feedback, "Short summary.");
        assert!(analysis.transcription.contains("https://videos.example.com/a.mp4"));
    }

    #[tokio::test]
    async fn falls_back_when_model_is_down() {
        let analysis = analyze(&UnavailableModel, &video()).await;
        assert_eq!(analysis.analysis_summary, ANALYSIS_FALLBACK);
        assert_eq!(analysis.feedback, FEEDBACK_FALLBACK);
    }
}

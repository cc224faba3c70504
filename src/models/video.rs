// src/models/video.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Uploaded,
    Processing,
    Analyzed,
}

impl VideoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Analyzed => "analyzed",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(VideoStatus::Uploaded),
            "processing" => Ok(VideoStatus::Processing),
            "analyzed" => Ok(VideoStatus::Analyzed),
            other => Err(format!("unknown video status '{other}'")),
        }
    }
}

/// Represents the 'video_submissions' table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSubmission {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub student_email: String,
    pub video_url: String,
    pub title: String,
    pub description: Option<String>,
    pub status: VideoStatus,
    pub transcription: Option<String>,
    pub analysis_summary: Option<String>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

/// Output of the video analyzer, written back onto the submission.
#[derive(Debug, Clone, Serialize)]
pub struct VideoAnalysis {
    pub transcription: String,
    pub analysis_summary: String,
    pub feedback: String,
    pub analyzed_at: DateTime<Utc>,
}

/// The analysis view of a submission.
#[derive(Debug, Serialize)]
pub struct VideoAnalysisResponse {
    pub transcription: Option<String>,
    pub analysis_summary: Option<String>,
    pub feedback: Option<String>,
    pub status: VideoStatus,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl From<&VideoSubmission> for VideoAnalysisResponse {
    fn from(video: &VideoSubmission) -> Self {
        Self {
            transcription: video.transcription.clone(),
            analysis_summary: video.analysis_summary.clone(),
            feedback: video.feedback.clone(),
            status: video.status,
            analyzed_at: video.analyzed_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitVideoRequest {
    #[validate(length(max = 2048), custom(function = validate_video_url))]
    pub video_url: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

fn validate_video_url(url: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err(validator::ValidationError::new("video_url_scheme")),
        Err(_) => Err(validator::ValidationError::new("invalid_video_url")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_url_must_be_http() {
        assert!(validate_video_url("https://videos.example.com/talk.mp4").is_ok());
        assert!(validate_video_url("ftp://videos.example.com/talk.mp4").is_err());
        assert!(validate_video_url("not a url").is_err());
    }
}

// src/notifications/templates.rs

use serde::Serialize;

use crate::grading::Performance;

const SIGN_OFF_HTML: &str = "<p>Best regards,<br>Your Education Team</p>";
const SIGN_OFF_TEXT: &str = "Best regards,\nYour Education Team";

/// Subject plus the two bodies handed to the mailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    QuizCreated,
    QuizResult,
    VideoFeedback,
    Test,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::QuizCreated => "quiz_created",
            NotificationKind::QuizResult => "quiz_result",
            NotificationKind::VideoFeedback => "video_feedback",
            NotificationKind::Test => "test",
        }
    }
}

/// Data for one outbound message.
#[derive(Debug, Clone)]
pub enum Notification {
    QuizCreated {
        student_name: String,
        quiz_title: String,
        quiz_subject: String,
    },
    QuizResult {
        student_name: String,
        score: i64,
        total_points: i64,
        percentage: f64,
        feedback: String,
    },
    VideoFeedback {
        student_name: String,
        video_title: String,
        analysis_summary: String,
        feedback: String,
    },
    Test,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::QuizCreated { .. } => NotificationKind::QuizCreated,
            Notification::QuizResult { .. } => NotificationKind::QuizResult,
            Notification::VideoFeedback { .. } => NotificationKind::VideoFeedback,
            Notification::Test => NotificationKind::Test,
        }
    }

    /// Deterministic, side-effect free. Values are inserted verbatim.
    pub fn render(&self) -> RenderedEmail {
        match self {
            Notification::QuizCreated {
                student_name,
                quiz_title,
                quiz_subject,
            } => RenderedEmail {
                subject: format!("New Quiz Available: {quiz_title}"),
                html: format!(
                    "<html>\n<body>\n\
                     <h2>New Quiz Available!</h2>\n\
                     <p>Hello {student_name},</p>\n\
                     <p>A new quiz has been created for you:</p>\n\
                     <ul>\n\
                     <li><strong>Quiz:</strong> {quiz_title}</li>\n\
                     <li><strong>Subject:</strong> {quiz_subject}</li>\n\
                     </ul>\n\
                     <p>Please log in to your student portal to complete the quiz. Good luck!</p>\n\
                     {SIGN_OFF_HTML}\n\
                     </body>\n</html>\n"
                ),
                text: format!(
                    "New Quiz Available!\n\n\
                     Hello {student_name},\n\n\
                     A new quiz has been created for you:\n\
                     - Quiz: {quiz_title}\n\
                     - Subject: {quiz_subject}\n\n\
                     Please log in to your student portal to complete the quiz. Good luck!\n\n\
                     {SIGN_OFF_TEXT}\n"
                ),
            },
            Notification::QuizResult {
                student_name,
                score,
                total_points,
                percentage,
                feedback,
            } => {
                let performance = Performance::from_percentage(*percentage);
                let label = performance.label();
                let color = performance.color();
                RenderedEmail {
                    subject: format!("Quiz Results: {percentage:.1}% Score"),
                    html: format!(
                        "<html>\n<body>\n\
                         <h2>Quiz Results</h2>\n\
                         <p>Hello {student_name},</p>\n\
                         <p>Your quiz has been graded. Here are your results:</p>\n\
                         <div style=\"background-color: {color}; color: white; padding: 10px; border-radius: 5px; margin: 10px 0;\">\n\
                         <h3>Score: {score}/{total_points} ({percentage:.1}%)</h3>\n\
                         <p>Performance: {label}</p>\n\
                         </div>\n\
                         <h3>Feedback:</h3>\n\
                         <p>{feedback}</p>\n\
                         <p>Keep up the great work and continue learning!</p>\n\
                         {SIGN_OFF_HTML}\n\
                         </body>\n</html>\n"
                    ),
                    text: format!(
                        "Quiz Results\n\n\
                         Hello {student_name},\n\n\
                         Your quiz has been graded. Here are your results:\n\n\
                         Score: {score}/{total_points} ({percentage:.1}%)\n\
                         Performance: {label}\n\n\
                         Feedback:\n\
                         {feedback}\n\n\
                         Keep up the great work and continue learning!\n\n\
                         {SIGN_OFF_TEXT}\n"
                    ),
                }
            }
            Notification::VideoFeedback {
                student_name,
                video_title,
                analysis_summary,
                feedback,
            } => RenderedEmail {
                subject: format!("Video Analysis Feedback: {video_title}"),
                html: format!(
                    "<html>\n<body>\n\
                     <h2>Video Analysis Feedback</h2>\n\
                     <p>Hello {student_name},</p>\n\
                     <p>Your video submission \"{video_title}\" has been analyzed. Here's your feedback:</p>\n\
                     <h3>Analysis Summary:</h3>\n\
                     <p>{analysis_summary}</p>\n\
                     <h3>Feedback:</h3>\n\
                     <p>{feedback}</p>\n\
                     <p>Great job on your submission! Keep practicing and improving.</p>\n\
                     {SIGN_OFF_HTML}\n\
                     </body>\n</html>\n"
                ),
                text: format!(
                    "Video Analysis Feedback\n\n\
                     Hello {student_name},\n\n\
                     Your video submission \"{video_title}\" has been analyzed. Here's your feedback:\n\n\
                     Analysis Summary:\n\
                     {analysis_summary}\n\n\
                     Feedback:\n\
                     {feedback}\n\n\
                     Great job on your submission! Keep practicing and improving.\n\n\
                     {SIGN_OFF_TEXT}\n"
                ),
            },
            Notification::Test => RenderedEmail {
                subject: "Test Notification - Student Management System".to_string(),
                html: format!(
                    "<html>\n<body>\n\
                     <h2>Test Notification</h2>\n\
                     <p>This is a test notification from the Student Management System.</p>\n\
                     <p>If you received this email, the notification system is working correctly.</p>\n\
                     {SIGN_OFF_HTML}\n\
                     </body>\n</html>\n"
                ),
                text: format!(
                    "Test Notification\n\n\
                     This is a test notification from the Student Management System.\n\
                     If you received this email, the notification system is working correctly.\n\n\
                     {SIGN_OFF_TEXT}\n"
                ),
            },
        }
    }
}

/// Describes one template for the admin UI.
#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub kind: NotificationKind,
    pub subject: &'static str,
    pub fields: &'static [&'static str],
}

pub fn template_catalog() -> Vec<TemplateInfo> {
    vec![
        TemplateInfo {
            kind: NotificationKind::QuizCreated,
            subject: "New Quiz Available: {quiz_title}",
            fields: &["student_name", "quiz_title", "quiz_subject"],
        },
        TemplateInfo {
            kind: NotificationKind::QuizResult,
            subject: "Quiz Results: {percentage}% Score",
            fields: &[
                "student_name",
                "score",
                "total_points",
                "percentage",
                "performance",
                "feedback",
            ],
        },
        TemplateInfo {
            kind: NotificationKind::VideoFeedback,
            subject: "Video Analysis Feedback: {video_title}",
            fields: &["student_name", "video_title", "analysis_summary", "feedback"],
        },
        TemplateInfo {
            kind: NotificationKind::Test,
            subject: "Test Notification - Student Management System",
            fields: &[],
        },
    ]
}

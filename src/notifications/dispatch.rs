// src/notifications/dispatch.rs
//
// Fire-and-forget delivery used by the quiz and video flows. Failures are
// logged and counted, never returned to the request that triggered them.

use crate::models::{quiz::Quiz, result::QuizResult, video::VideoSubmission};
use crate::notifications::{Mailer, Notification};
use crate::store::Store;

/// Renders and sends one notification. Returns whether it was accepted.
pub async fn deliver(mailer: &dyn Mailer, to: &str, notification: &Notification) -> bool {
    let email = notification.render();
    match mailer.send(to, &email).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                to = %to,
                kind = notification.kind().as_str(),
                "Failed to send notification: {:#}",
                e
            );
            false
        }
    }
}

/// Tells every roster student about a newly published quiz.
pub async fn notify_quiz_created(store: &dyn Store, mailer: &dyn Mailer, quiz: &Quiz) -> usize {
    let students = match store.all_students().await {
        Ok(students) => students,
        Err(e) => {
            tracing::error!("Failed to load roster for quiz notification: {:?}", e);
            return 0;
        }
    };

    let mut sent = 0;
    for student in students {
        let notification = Notification::QuizCreated {
            student_name: student.name,
            quiz_title: quiz.title.clone(),
            quiz_subject: quiz.subject.clone(),
        };
        if deliver(mailer, &student.email, &notification).await {
            sent += 1;
        }
    }
    tracing::info!(quiz_id = %quiz.id, sent, "Quiz notifications dispatched");
    sent
}

pub async fn notify_quiz_result(mailer: &dyn Mailer, to: &str, result: &QuizResult) -> bool {
    let notification = Notification::QuizResult {
        student_name: result.student_name.clone(),
        score: result.score,
        total_points: result.total_points,
        percentage: result.percentage,
        feedback: result.feedback.clone(),
    };
    deliver(mailer, to, &notification).await
}

pub async fn notify_video_feedback(mailer: &dyn Mailer, video: &VideoSubmission) -> bool {
    let notification = Notification::VideoFeedback {
        student_name: video.student_name.clone(),
        video_title: video.title.clone(),
        analysis_summary: video.analysis_summary.clone().unwrap_or_default(),
        feedback: video.feedback.clone().unwrap_or_default(),
    };
    deliver(mailer, &video.student_email, &notification).await
}

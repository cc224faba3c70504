// src/store/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    Pagination,
    notification::NotificationLog,
    quiz::{Quiz, UpdateQuizRequest},
    result::QuizResult,
    student::{Student, UpdateStudentRequest},
    user::{Role, User},
    video::{VideoAnalysis, VideoStatus, VideoSubmission},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence boundary. Handlers only ever talk to this trait.
///
/// Implementations own uniqueness (one user per email, one roster entry per
/// email, one result per quiz and student) and report violations as
/// `AppError::Conflict`. The roster lists in enrolment order; quizzes,
/// results, videos and logs list newest first.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, AppError>;
    async fn find_user(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn count_users_with_role(&self, role: Role) -> Result<i64, AppError>;

    async fn create_student(&self, student: Student) -> Result<Student, AppError>;
    async fn list_students(&self, page: Pagination) -> Result<Vec<Student>, AppError>;
    async fn all_students(&self) -> Result<Vec<Student>, AppError>;
    async fn get_student(&self, id: &str) -> Result<Option<Student>, AppError>;
    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>, AppError>;
    async fn update_student(
        &self,
        id: &str,
        update: &UpdateStudentRequest,
    ) -> Result<Option<Student>, AppError>;
    async fn delete_student(&self, id: &str) -> Result<bool, AppError>;

    async fn insert_quiz(&self, quiz: Quiz) -> Result<Quiz, AppError>;
    async fn list_quizzes(&self, page: Pagination) -> Result<Vec<Quiz>, AppError>;
    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, AppError>;
    async fn update_quiz(
        &self,
        id: &str,
        update: &UpdateQuizRequest,
    ) -> Result<Option<Quiz>, AppError>;
    async fn delete_quiz(&self, id: &str) -> Result<bool, AppError>;
    async fn count_quizzes(&self) -> Result<i64, AppError>;

    /// Stores a graded result and folds it into the student's
    /// `total_quizzes`/`average_score` as one atomic step. Either both
    /// writes land or neither does; a second result for the same quiz and
    /// student is a `Conflict` and leaves the counters untouched.
    async fn record_result(&self, result: QuizResult) -> Result<QuizResult, AppError>;
    async fn results_for_quiz(&self, quiz_id: &str) -> Result<Vec<QuizResult>, AppError>;
    async fn results_for_student(&self, student_id: &str) -> Result<Vec<QuizResult>, AppError>;
    async fn all_results(&self) -> Result<Vec<QuizResult>, AppError>;

    async fn insert_video(&self, video: VideoSubmission) -> Result<VideoSubmission, AppError>;
    /// `student_id = None` lists every submission.
    async fn list_videos(
        &self,
        student_id: Option<&str>,
        page: Pagination,
    ) -> Result<Vec<VideoSubmission>, AppError>;
    async fn get_video(&self, id: &str) -> Result<Option<VideoSubmission>, AppError>;
    async fn set_video_status(&self, id: &str, status: VideoStatus) -> Result<bool, AppError>;
    async fn save_video_analysis(
        &self,
        id: &str,
        analysis: &VideoAnalysis,
    ) -> Result<Option<VideoSubmission>, AppError>;
    async fn delete_video(&self, id: &str) -> Result<bool, AppError>;
    async fn count_videos(&self) -> Result<i64, AppError>;

    async fn insert_notification_log(&self, log: NotificationLog) -> Result<(), AppError>;
    async fn list_notification_logs(
        &self,
        page: Pagination,
    ) -> Result<Vec<NotificationLog>, AppError>;
}

/// Running mean after one more observation.
pub(crate) fn fold_average(average: f64, count: i64, value: f64) -> f64 {
    (average * count as f64 + value) / (count + 1) as f64
}

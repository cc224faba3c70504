// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, types::Json};

use super::Store;
use crate::error::AppError;
use crate::models::{
    Pagination,
    notification::NotificationLog,
    quiz::{Question, Quiz, QuizStatus, UpdateQuizRequest},
    result::QuizResult,
    student::{Student, UpdateStudentRequest},
    user::{Role, User},
    video::{VideoAnalysis, VideoStatus, VideoSubmission},
};

/// `Store` backed by PostgreSQL. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Logs the failure and rewrites a unique violation into a readable message.
fn db_error(context: &'static str, conflict: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        let err = AppError::from(e);
        match err {
            AppError::Conflict(_) => AppError::Conflict(conflict.to_string()),
            other => {
                tracing::error!("{}: {:?}", context, other);
                other
            }
        }
    }
}

fn parse_text<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T, AppError> {
    value.parse::<T>().map_err(AppError::InternalServerError)
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            role: parse_text::<Role>(&row.role)?,
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StudentRow {
    id: String,
    name: String,
    email: String,
    student_id: String,
    class_name: Option<String>,
    total_quizzes: i64,
    average_score: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: row.id,
            name: row.name,
            email: row.email,
            student_id: row.student_id,
            class_name: row.class_name,
            total_quizzes: row.total_quizzes,
            average_score: row.average_score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct QuizRow {
    id: String,
    title: String,
    description: String,
    subject: String,
    duration_minutes: i32,
    total_questions: i32,
    questions: Json<Vec<Question>>,
    status: String,
    created_by: String,
    total_points: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<QuizRow> for Quiz {
    type Error = AppError;

    fn try_from(row: QuizRow) -> Result<Self, Self::Error> {
        Ok(Quiz {
            status: parse_text::<QuizStatus>(&row.status)?,
            id: row.id,
            title: row.title,
            description: row.description,
            subject: row.subject,
            duration_minutes: row.duration_minutes,
            total_questions: row.total_questions,
            questions: row.questions.0,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            total_points: row.total_points,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResultRow {
    id: String,
    quiz_id: String,
    student_id: String,
    student_name: String,
    answers: Json<HashMap<String, String>>,
    score: i64,
    total_points: i64,
    percentage: f64,
    feedback: String,
    submitted_at: DateTime<Utc>,
    graded_at: DateTime<Utc>,
}

impl From<ResultRow> for QuizResult {
    fn from(row: ResultRow) -> Self {
        QuizResult {
            id: row.id,
            quiz_id: row.quiz_id,
            student_id: row.student_id,
            student_name: row.student_name,
            answers: row.answers.0,
            score: row.score,
            total_points: row.total_points,
            percentage: row.percentage,
            feedback: row.feedback,
            submitted_at: row.submitted_at,
            graded_at: row.graded_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VideoRow {
    id: String,
    student_id: String,
    student_name: String,
    student_email: String,
    video_url: String,
    title: String,
    description: Option<String>,
    status: String,
    transcription: Option<String>,
    analysis_summary: Option<String>,
    feedback: Option<String>,
    submitted_at: DateTime<Utc>,
    analyzed_at: Option<DateTime<Utc>>,
}

impl TryFrom<VideoRow> for VideoSubmission {
    type Error = AppError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        Ok(VideoSubmission {
            status: parse_text::<VideoStatus>(&row.status)?,
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            student_email: row.student_email,
            video_url: row.video_url,
            title: row.title,
            description: row.description,
            transcription: row.transcription,
            analysis_summary: row.analysis_summary,
            feedback: row.feedback,
            submitted_at: row.submitted_at,
            analyzed_at: row.analyzed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NotificationLogRow {
    id: String,
    to_email: String,
    subject: String,
    notification_type: String,
    sent_by: String,
    sent_at: DateTime<Utc>,
    status: String,
}

impl From<NotificationLogRow> for NotificationLog {
    fn from(row: NotificationLogRow) -> Self {
        NotificationLog {
            id: row.id,
            to_email: row.to_email,
            subject: row.subject,
            notification_type: row.notification_type,
            sent_by: row.sent_by,
            sent_at: row.sent_at,
            status: row.status,
        }
    }
}

const USER_COLUMNS: &str = "id, email, name, role, password_hash, created_at, updated_at";
const STUDENT_COLUMNS: &str = "id, name, email, student_id, class_name, total_quizzes, \
    average_score, created_at, updated_at";
const QUIZ_COLUMNS: &str = "id, title, description, subject, duration_minutes, total_questions, \
    questions, status, created_by, total_points, created_at, updated_at";
const RESULT_COLUMNS: &str = "id, quiz_id, student_id, student_name, answers, score, \
    total_points, percentage, feedback, submitted_at, graded_at";
const VIDEO_COLUMNS: &str = "id, student_id, student_name, student_email, video_url, title, \
    description, status, transcription, analysis_summary, feedback, submitted_at, analyzed_at";

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        sqlx::query(
            "INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to insert user", "Email already registered"))?;
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn count_users_with_role(&self, role: Role) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_student(&self, student: Student) -> Result<Student, AppError> {
        sqlx::query(
            "INSERT INTO students (id, name, email, student_id, class_name, total_quizzes, \
             average_score, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&student.id)
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.student_id)
        .bind(&student.class_name)
        .bind(student.total_quizzes)
        .bind(student.average_score)
        .bind(student.created_at)
        .bind(student.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error(
            "Failed to insert student",
            "Student with this email already exists",
        ))?;
        Ok(student)
    }

    async fn list_students(&self, page: Pagination) -> Result<Vec<Student>, AppError> {
        let sql = format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY created_at, id OFFSET $1 LIMIT $2"
        );
        let rows = sqlx::query_as::<_, StudentRow>(&sql)
            .bind(page.skip())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Student::from).collect())
    }

    async fn all_students(&self) -> Result<Vec<Student>, AppError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, StudentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Student::from).collect())
    }

    async fn get_student(&self, id: &str) -> Result<Option<Student>, AppError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1");
        let row = sqlx::query_as::<_, StudentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Student::from))
    }

    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>, AppError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1");
        let row = sqlx::query_as::<_, StudentRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Student::from))
    }

    async fn update_student(
        &self,
        id: &str,
        update: &UpdateStudentRequest,
    ) -> Result<Option<Student>, AppError> {
        let sql = format!(
            "UPDATE students SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                class_name = COALESCE($4, class_name), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {STUDENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StudentRow>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(&update.email)
            .bind(&update.class_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(
                "Failed to update student",
                "Student with this email already exists",
            ))?;
        Ok(row.map(Student::from))
    }

    async fn delete_student(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_quiz(&self, quiz: Quiz) -> Result<Quiz, AppError> {
        sqlx::query(
            "INSERT INTO quizzes (id, title, description, subject, duration_minutes, \
             total_questions, questions, status, created_by, total_points, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&quiz.id)
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.subject)
        .bind(quiz.duration_minutes)
        .bind(quiz.total_questions)
        .bind(Json(&quiz.questions))
        .bind(quiz.status.as_str())
        .bind(&quiz.created_by)
        .bind(quiz.total_points)
        .bind(quiz.created_at)
        .bind(quiz.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to insert quiz", "Quiz already exists"))?;
        Ok(quiz)
    }

    async fn list_quizzes(&self, page: Pagination) -> Result<Vec<Quiz>, AppError> {
        let sql = format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY created_at DESC, id DESC OFFSET $1 LIMIT $2"
        );
        sqlx::query_as::<_, QuizRow>(&sql)
            .bind(page.skip())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Quiz::try_from)
            .collect()
    }

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, AppError> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1");
        sqlx::query_as::<_, QuizRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Quiz::try_from)
            .transpose()
    }

    async fn update_quiz(
        &self,
        id: &str,
        update: &UpdateQuizRequest,
    ) -> Result<Option<Quiz>, AppError> {
        let sql = format!(
            "UPDATE quizzes SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                duration_minutes = COALESCE($4, duration_minutes), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {QUIZ_COLUMNS}"
        );
        sqlx::query_as::<_, QuizRow>(&sql)
            .bind(id)
            .bind(&update.title)
            .bind(&update.description)
            .bind(update.duration_minutes)
            .fetch_optional(&self.pool)
            .await?
            .map(Quiz::try_from)
            .transpose()
    }

    async fn delete_quiz(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_quizzes(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn record_result(&self, result: QuizResult) -> Result<QuizResult, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO quiz_results (id, quiz_id, student_id, student_name, answers, score, \
             total_points, percentage, feedback, submitted_at, graded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&result.id)
        .bind(&result.quiz_id)
        .bind(&result.student_id)
        .bind(&result.student_name)
        .bind(Json(&result.answers))
        .bind(result.score)
        .bind(result.total_points)
        .bind(result.percentage)
        .bind(&result.feedback)
        .bind(result.submitted_at)
        .bind(result.graded_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to insert quiz result", "Quiz already submitted"))?;

        // Single statement: the row lock serialises concurrent submissions.
        sqlx::query(
            "UPDATE students SET \
                average_score = (average_score * total_quizzes + $2) / (total_quizzes + 1), \
                total_quizzes = total_quizzes + 1, \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(&result.student_id)
        .bind(result.percentage)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result)
    }

    async fn results_for_quiz(&self, quiz_id: &str) -> Result<Vec<QuizResult>, AppError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM quiz_results WHERE quiz_id = $1 ORDER BY submitted_at DESC"
        );
        let rows = sqlx::query_as::<_, ResultRow>(&sql)
            .bind(quiz_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(QuizResult::from).collect())
    }

    async fn results_for_student(&self, student_id: &str) -> Result<Vec<QuizResult>, AppError> {
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM quiz_results WHERE student_id = $1 \
             ORDER BY submitted_at DESC"
        );
        let rows = sqlx::query_as::<_, ResultRow>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(QuizResult::from).collect())
    }

    async fn all_results(&self) -> Result<Vec<QuizResult>, AppError> {
        let sql = format!("SELECT {RESULT_COLUMNS} FROM quiz_results");
        let rows = sqlx::query_as::<_, ResultRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(QuizResult::from).collect())
    }

    async fn insert_video(&self, video: VideoSubmission) -> Result<VideoSubmission, AppError> {
        sqlx::query(
            "INSERT INTO video_submissions (id, student_id, student_name, student_email, \
             video_url, title, description, status, transcription, analysis_summary, feedback, \
             submitted_at, analyzed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(&video.id)
        .bind(&video.student_id)
        .bind(&video.student_name)
        .bind(&video.student_email)
        .bind(&video.video_url)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.status.as_str())
        .bind(&video.transcription)
        .bind(&video.analysis_summary)
        .bind(&video.feedback)
        .bind(video.submitted_at)
        .bind(video.analyzed_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to insert video submission", "Video already exists"))?;
        Ok(video)
    }

    async fn list_videos(
        &self,
        student_id: Option<&str>,
        page: Pagination,
    ) -> Result<Vec<VideoSubmission>, AppError> {
        let sql = format!(
            "SELECT {VIDEO_COLUMNS} FROM video_submissions \
             WHERE ($1::TEXT IS NULL OR student_id = $1) \
             ORDER BY submitted_at DESC, id DESC OFFSET $2 LIMIT $3"
        );
        sqlx::query_as::<_, VideoRow>(&sql)
            .bind(student_id)
            .bind(page.skip())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(VideoSubmission::try_from)
            .collect()
    }

    async fn get_video(&self, id: &str) -> Result<Option<VideoSubmission>, AppError> {
        let sql = format!("SELECT {VIDEO_COLUMNS} FROM video_submissions WHERE id = $1");
        sqlx::query_as::<_, VideoRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(VideoSubmission::try_from)
            .transpose()
    }

    async fn set_video_status(&self, id: &str, status: VideoStatus) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE video_submissions SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_video_analysis(
        &self,
        id: &str,
        analysis: &VideoAnalysis,
    ) -> Result<Option<VideoSubmission>, AppError> {
        let sql = format!(
            "UPDATE video_submissions SET \
                transcription = $2, \
                analysis_summary = $3, \
                feedback = $4, \
                analyzed_at = $5, \
                status = $6 \
             WHERE id = $1 \
             RETURNING {VIDEO_COLUMNS}"
        );
        sqlx::query_as::<_, VideoRow>(&sql)
            .bind(id)
            .bind(&analysis.transcription)
            .bind(&analysis.analysis_summary)
            .bind(&analysis.feedback)
            .bind(analysis.analyzed_at)
            .bind(VideoStatus::Analyzed.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(VideoSubmission::try_from)
            .transpose()
    }

    async fn delete_video(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM video_submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_videos(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_submissions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_notification_log(&self, log: NotificationLog) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notification_logs (id, to_email, subject, notification_type, sent_by, \
             sent_at, status) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&log.id)
        .bind(&log.to_email)
        .bind(&log.subject)
        .bind(&log.notification_type)
        .bind(&log.sent_by)
        .bind(log.sent_at)
        .bind(&log.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notification_logs(
        &self,
        page: Pagination,
    ) -> Result<Vec<NotificationLog>, AppError> {
        let rows = sqlx::query_as::<_, NotificationLogRow>(
            "SELECT id, to_email, subject, notification_type, sent_by, sent_at, status \
             FROM notification_logs ORDER BY sent_at DESC OFFSET $1 LIMIT $2",
        )
        .bind(page.skip())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(NotificationLog::from).collect())
    }
}

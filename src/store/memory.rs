// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Store, fold_average};
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

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    students: HashMap<String, Student>,
    quizzes: HashMap<String, Quiz>,
    results: Vec<QuizResult>,
    videos: HashMap<String, VideoSubmission>,
    notification_logs: Vec<NotificationLog>,
}

/// In-process store for tests and local development. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T>(mut rows: Vec<T>, page: Pagination) -> Vec<T> {
    rows.drain(..)
        .skip(page.skip() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        t.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn count_users_with_role(&self, role: Role) -> Result<i64, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.values().filter(|u| u.role == role).count() as i64)
    }

    async fn create_student(&self, student: Student) -> Result<Student, AppError> {
        let mut t = self.tables.write().await;
        if t.students.values().any(|s| s.email == student.email) {
            return Err(AppError::Conflict(
                "Student with this email already exists".to_string(),
            ));
        }
        t.students.insert(student.id.clone(), student.clone());
        Ok(student)
    }

    async fn list_students(&self, p: Pagination) -> Result<Vec<Student>, AppError> {
        Ok(page(self.all_students().await?, p))
    }

    async fn all_students(&self) -> Result<Vec<Student>, AppError> {
        let t = self.tables.read().await;
        let mut rows: Vec<Student> = t.students.values().cloned().collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn get_student(&self, id: &str) -> Result<Option<Student>, AppError> {
        Ok(self.tables.read().await.students.get(id).cloned())
    }

    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>, AppError> {
        let t = self.tables.read().await;
        Ok(t.students.values().find(|s| s.email == email).cloned())
    }

    async fn update_student(
        &self,
        id: &str,
        update: &UpdateStudentRequest,
    ) -> Result<Option<Student>, AppError> {
        let mut t = self.tables.write().await;
        if let Some(email) = &update.email {
            if t.students.values().any(|s| s.id != id && &s.email == email) {
                return Err(AppError::Conflict(
                    "Student with this email already exists".to_string(),
                ));
            }
        }
        let Some(student) = t.students.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            student.name = name.clone();
        }
        if let Some(email) = &update.email {
            student.email = email.clone();
        }
        if let Some(class_name) = &update.class_name {
            student.class_name = Some(class_name.clone());
        }
        student.updated_at = Utc::now();
        Ok(Some(student.clone()))
    }

    async fn delete_student(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.tables.write().await.students.remove(id).is_some())
    }

    async fn insert_quiz(&self, quiz: Quiz) -> Result<Quiz, AppError> {
        let mut t = self.tables.write().await;
        t.quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn list_quizzes(&self, p: Pagination) -> Result<Vec<Quiz>, AppError> {
        let t = self.tables.read().await;
        let mut rows: Vec<Quiz> = t.quizzes.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page(rows, p))
    }

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, AppError> {
        Ok(self.tables.read().await.quizzes.get(id).cloned())
    }

    async fn update_quiz(
        &self,
        id: &str,
        update: &UpdateQuizRequest,
    ) -> Result<Option<Quiz>, AppError> {
        let mut t = self.tables.write().await;
        let Some(quiz) = t.quizzes.get_mut(id) else {
            return Ok(None);
        };
        if let Some(title) = &update.title {
            quiz.title = title.clone();
        }
        if let Some(description) = &update.description {
            quiz.description = description.clone();
        }
        if let Some(duration) = update.duration_minutes {
            quiz.duration_minutes = duration;
        }
        quiz.updated_at = Utc::now();
        Ok(Some(quiz.clone()))
    }

    async fn delete_quiz(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.tables.write().await.quizzes.remove(id).is_some())
    }

    async fn count_quizzes(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().await.quizzes.len() as i64)
    }

    async fn record_result(&self, result: QuizResult) -> Result<QuizResult, AppError> {
        let mut t = self.tables.write().await;
        if t.results
            .iter()
            .any(|r| r.quiz_id == result.quiz_id && r.student_id == result.student_id)
        {
            return Err(AppError::Conflict("Quiz already submitted".to_string()));
        }
        if let Some(student) = t.students.get_mut(&result.student_id) {
            student.average_score =
                fold_average(student.average_score, student.total_quizzes, result.percentage);
            student.total_quizzes += 1;
            student.updated_at = Utc::now();
        }
        t.results.push(result.clone());
        Ok(result)
    }

    async fn results_for_quiz(&self, quiz_id: &str) -> Result<Vec<QuizResult>, AppError> {
        let mut rows: Vec<QuizResult> = self
            .all_results()
            .await?
            .into_iter()
            .filter(|r| r.quiz_id == quiz_id)
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn results_for_student(&self, student_id: &str) -> Result<Vec<QuizResult>, AppError> {
        let mut rows: Vec<QuizResult> = self
            .all_results()
            .await?
            .into_iter()
            .filter(|r| r.student_id == student_id)
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn all_results(&self) -> Result<Vec<QuizResult>, AppError> {
        Ok(self.tables.read().await.results.clone())
    }

    async fn insert_video(&self, video: VideoSubmission) -> Result<VideoSubmission, AppError> {
        let mut t = self.tables.write().await;
        t.videos.insert(video.id.clone(), video.clone());
        Ok(video)
    }

    async fn list_videos(
        &self,
        student_id: Option<&str>,
        p: Pagination,
    ) -> Result<Vec<VideoSubmission>, AppError> {
        let t = self.tables.read().await;
        let mut rows: Vec<VideoSubmission> = t
            .videos
            .values()
            .filter(|v| student_id.is_none_or(|id| v.student_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        Ok(page(rows, p))
    }

    async fn get_video(&self, id: &str) -> Result<Option<VideoSubmission>, AppError> {
        Ok(self.tables.read().await.videos.get(id).cloned())
    }

    async fn set_video_status(&self, id: &str, status: VideoStatus) -> Result<bool, AppError> {
        let mut t = self.tables.write().await;
        match t.videos.get_mut(id) {
            Some(video) => {
                video.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_video_analysis(
        &self,
        id: &str,
        analysis: &VideoAnalysis,
    ) -> Result<Option<VideoSubmission>, AppError> {
        let mut t = self.tables.write().await;
        let Some(video) = t.videos.get_mut(id) else {
            return Ok(None);
        };
        video.transcription = Some(analysis.transcription.clone());
        video.analysis_summary = Some(analysis.analysis_summary.clone());
        video.feedback = Some(analysis.feedback.clone());
        video.analyzed_at = Some(analysis.analyzed_at);
        video.status = VideoStatus::Analyzed;
        Ok(Some(video.clone()))
    }

    async fn delete_video(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.tables.write().await.videos.remove(id).is_some())
    }

    async fn count_videos(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().await.videos.len() as i64)
    }

    async fn insert_notification_log(&self, log: NotificationLog) -> Result<(), AppError> {
        self.tables.write().await.notification_logs.push(log);
        Ok(())
    }

    async fn list_notification_logs(
        &self,
        p: Pagination,
    ) -> Result<Vec<NotificationLog>, AppError> {
        let mut rows = self.tables.read().await.notification_logs.clone();
        rows.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        Ok(page(rows, p))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;

    fn student(email: &str) -> Student {
        Student::new("Ana".into(), email.into(), "S-1".into(), None)
    }

    fn result(quiz_id: &str, student_id: &str, percentage: f64) -> QuizResult {
        QuizResult {
            id: uuid::Uuid::new_v4().to_string(),
            quiz_id: quiz_id.into(),
            student_id: student_id.into(),
            student_name: "Ana".into(),
            answers: HashMap::new(),
            score: 0,
            total_points: 0,
            percentage,
            feedback: String::new(),
            submitted_at: Utc::now(),
            graded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn roster_email_is_unique() {
        let store = MemoryStore::new();
        store.create_student(student("ana@example.com")).await.unwrap();
        let err = store.create_student(student("ana@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn one_result_per_quiz_and_student() {
        let store = MemoryStore::new();
        store.record_result(result("q", "s", 50.0)).await.unwrap();
        let err = store.record_result(result("q", "s", 80.0)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        store.record_result(result("q", "other", 80.0)).await.unwrap();
        assert_eq!(store.results_for_quiz("q").await.unwrap().len(), 2);
        assert_eq!(store.results_for_student("s").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn result_and_counters_land_together() {
        let store = MemoryStore::new();
        let s = store.create_student(student("ana@example.com")).await.unwrap();

        store.record_result(result("q1", &s.id, 40.0)).await.unwrap();
        let after_first = store.get_student(&s.id).await.unwrap().unwrap();
        assert_eq!(after_first.total_quizzes, 1);
        assert!((after_first.average_score - 40.0).abs() < 1e-9);

        let err = store.record_result(result("q1", &s.id, 100.0)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let after_retry = store.get_student(&s.id).await.unwrap().unwrap();
        assert_eq!(after_retry.total_quizzes, 1);
        assert!((after_retry.average_score - 40.0).abs() < 1e-9);
        assert_eq!(store.results_for_student(&s.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_outcomes_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let s = store.create_student(student("ana@example.com")).await.unwrap();

        let mut handles = Vec::new();
        for (n, p) in [100.0, 50.0, 0.0, 50.0].into_iter().enumerate() {
            let store = store.clone();
            let graded = result(&format!("q{n}"), &s.id, p);
            handles.push(tokio::spawn(async move {
                store.record_result(graded).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let s = store.get_student(&s.id).await.unwrap().unwrap();
        assert_eq!(s.total_quizzes, 4);
        assert!((s.average_score - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let store = MemoryStore::new();
        let s = store.create_student(student("ana@example.com")).await.unwrap();
        let update = UpdateStudentRequest {
            class_name: Some("7B".into()),
            ..Default::default()
        };
        let updated = store.update_student(&s.id, &update).await.unwrap().unwrap();
        assert_eq!(updated.class_name.as_deref(), Some("7B"));
        assert_eq!(updated.email, "ana@example.com");
        assert!(store.update_student("missing", &update).await.unwrap().is_none());
    }
}

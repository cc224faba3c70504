// tests/api_tests.rs

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use classroom_backend::{
    config::{Config, StorageBackend},
    notifications::{Mailer, RenderedEmail},
    routes,
    services::ai::UnavailableModel,
    state::AppState,
    store::MemoryStore,
};
use serde_json::{Value, json};

/// Captures outbound email instead of sending it. Refuses one address.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    fn subjects_for(&self, to: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(addr, _)| addr == to)
            .map(|(_, subject)| subject.clone())
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<()> {
        if to == "bounce@example.com" {
            bail!("mailbox unavailable");
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), email.subject.clone()));
        Ok(())
    }
}

struct TestApp {
    address: String,
    client: reqwest::Client,
    mailer: Arc<RecordingMailer>,
}

/// Spawns the app on a random port, backed by the in-memory store and with
/// no language model, so every AI path takes its fallback.
async fn spawn_app() -> TestApp {
    let config = Config {
        storage: StorageBackend::Memory,
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
        admin_name: "Administrator".to_string(),
        openai_api_key: None,
        openai_base_url: "http://127.0.0.1:9".to_string(),
        ai_model: "test".to_string(),
        ai_timeout_secs: 1,
        sendgrid_api_key: None,
        from_email: "noreply@example.com".to_string(),
        port: 0,
    };

    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        config,
        ai: Arc::new(UnavailableModel),
        mailer: mailer.clone(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        mailer,
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn register(&self, email: &str, name: &str, role: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "email": email,
                "name": name,
                "password": "password123",
                "role": role
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Registers (if needed) and logs in, returning a bearer token.
    async fn token_for(&self, email: &str, role: &str) -> String {
        self.register(email, "Test User", role).await;
        let body: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": "password123" }))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Background emails land shortly after the request returns.
    async fn wait_for_email(&self, to: &str, subject: &str) -> bool {
        for _ in 0..50 {
            if self.mailer.subjects_for(to).iter().any(|s| s == subject) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    /// Admin creates a two-question quiz; returns its id.
    async fn create_two_question_quiz(&self, admin: &str) -> String {
        let response = self
            .post(
                "/api/quizzes",
                admin,
                json!({
                    "title": "Capitals",
                    "description": "European capitals",
                    "subject": "Geography",
                    "questions": [
                        {
                            "question_text": "Capital of France?",
                            "options": [
                                {"id": "A", "text": "Paris", "is_correct": true},
                                {"id": "B", "text": "Lyon", "is_correct": false}
                            ],
                            "correct_answer_id": "A"
                        },
                        {
                            "question_text": "Capital of Spain?",
                            "options": [
                                {"id": "A", "text": "Seville", "is_correct": false},
                                {"id": "B", "text": "Madrid", "is_correct": true}
                            ],
                            "correct_answer_id": "B"
                        }
                    ]
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let quiz: Value = response.json().await.unwrap();
        assert_eq!(quiz["total_points"], 2);
        assert_eq!(quiz["status"], "published");
        quiz["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_and_unknown_paths() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "healthy"}));

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_login_and_me() {
    let app = spawn_app().await;

    let response = app.register("ana@example.com", "Ana", "student").await;
    assert_eq!(response.status().as_u16(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["role"], "student");
    assert!(user.get("password_hash").is_none());

    let duplicate = app.register("ana@example.com", "Ana", "student").await;
    assert_eq!(duplicate.status().as_u16(), 409);

    let invalid = app.register("not-an-email", "Ana", "student").await;
    assert_eq!(invalid.status().as_u16(), 400);

    let bad_login = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({"email": "ana@example.com", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_login.status().as_u16(), 401);

    let token = app.token_for("ana@example.com", "student").await;
    let me: Value = app.get("/api/auth/me", &token).await.json().await.unwrap();
    assert_eq!(me["email"], "ana@example.com");

    let anonymous = app.client.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);
}

#[tokio::test]
async fn students_cannot_use_admin_operations() {
    let app = spawn_app().await;
    let student = app.token_for("ana@example.com", "student").await;

    let cases = [
        app.get("/api/students", &student).await,
        app.get("/api/admin/stats", &student).await,
        app.get("/api/notifications/logs", &student).await,
        app.post(
            "/api/quizzes",
            &student,
            json!({"title": "T", "description": "", "subject": "S"}),
        )
        .await,
    ];
    for response in cases {
        assert_eq!(response.status().as_u16(), 403);
    }

    let admin = app.token_for("admin@example.com", "admin").await;
    let response = app.get("/api/student/quiz-stats", &admin).await;
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn roster_crud_and_self_access() {
    let app = spawn_app().await;
    let admin = app.token_for("admin@example.com", "admin").await;

    let response = app
        .post(
            "/api/students",
            &admin,
            json!({"name": "Bo", "email": "bo@example.com", "student_id": "S-42"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let bo: Value = response.json().await.unwrap();
    let bo_id = bo["id"].as_str().unwrap().to_string();
    assert_eq!(bo["total_quizzes"], 0);

    let duplicate = app
        .post(
            "/api/students",
            &admin,
            json!({"name": "Bo", "email": "bo@example.com", "student_id": "S-43"}),
        )
        .await;
    assert_eq!(duplicate.status().as_u16(), 400);

    let updated: Value = app
        .client
        .put(app.url(&format!("/api/students/{bo_id}")))
        .bearer_auth(&admin)
        .json(&json!({"class_name": "7B"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["class_name"], "7B");
    assert_eq!(updated["student_id"], "S-42");

    // Registration enrols Ana; she may read herself but not Bo.
    let ana = app.token_for("ana@example.com", "student").await;
    let roster: Value = app.get("/api/students", &admin).await.json().await.unwrap();
    let ana_id = roster
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["email"] == "ana@example.com")
        .expect("registration enrols students")["id"]
        .as_str()
        .unwrap()
        .to_string();

    let own = app.get(&format!("/api/students/{ana_id}"), &ana).await;
    assert_eq!(own.status().as_u16(), 200);
    let other = app.get(&format!("/api/students/{bo_id}"), &ana).await;
    assert_eq!(other.status().as_u16(), 403);

    let stats: Value = app
        .get(&format!("/api/students/{ana_id}/statistics"), &ana)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats, json!({}));

    let deleted = app
        .client
        .delete(app.url(&format!("/api/students/{bo_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);
    let missing = app.get(&format!("/api/students/{bo_id}"), &admin).await;
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn quiz_submission_is_graded_once() {
    let app = spawn_app().await;
    let admin = app.token_for("admin@example.com", "admin").await;
    let student = app.token_for("ana@example.com", "student").await;

    let quiz_id = app.create_two_question_quiz(&admin).await;

    // Quiz-created email goes to the roster in the background.
    assert!(app.wait_for_email("ana@example.com", "New Quiz Available: Capitals").await);

    // Students never see the answer key.
    let quiz: Value = app
        .get(&format!("/api/quizzes/{quiz_id}"), &student)
        .await
        .json()
        .await
        .unwrap();
    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    for q in questions {
        assert_eq!(q["correct_answer_id"], "");
        assert!(q["options"].as_array().unwrap().iter().all(|o| o["is_correct"] == false));
    }
    let (q1, q2) = (
        questions[0]["id"].as_str().unwrap(),
        questions[1]["id"].as_str().unwrap(),
    );

    let response = app
        .post(
            &format!("/api/quizzes/{quiz_id}/submit"),
            &student,
            json!({"answers": {q1: "A", q2: "A"}}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["score"], 1);
    assert_eq!(result["total_points"], 2);
    assert_eq!(result["percentage"], 50.0);
    assert_eq!(
        result["feedback"],
        "Quiz completed with a score of 1/2 (50.0%). Keep studying and practicing!"
    );

    let again = app
        .post(
            &format!("/api/quizzes/{quiz_id}/submit"),
            &student,
            json!({"answers": {q1: "A", q2: "B"}}),
        )
        .await;
    assert_eq!(again.status().as_u16(), 409);

    let stats: Value = app
        .get(&format!("/api/quizzes/{quiz_id}/statistics"), &admin)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_students"], 1);
    assert_eq!(stats["average_score"], 50.0);
    assert_eq!(stats["pass_rate"], 0.0);
    assert_eq!(stats["grade_distribution"]["F (0-59)"], 1);

    let mine: Value = app.get("/api/student/quiz-stats", &student).await.json().await.unwrap();
    assert_eq!(mine["completedQuizzes"], 1);
    assert_eq!(mine["averageScore"], 50.0);

    let recent: Value = app
        .get("/api/quizzes/student/recent", &student)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(recent[0]["status"], "completed");
    assert_eq!(recent[0]["score"], 50.0);

    let roster: Value = app.get("/api/admin/students", &admin).await.json().await.unwrap();
    assert_eq!(roster[0]["total_quizzes"], 1);
    assert_eq!(roster[0]["average_score"], 50.0);

    assert!(app.wait_for_email("ana@example.com", "Quiz Results: 50.0% Score").await);
}

#[tokio::test]
async fn explicit_questions_must_have_one_correct_option() {
    let app = spawn_app().await;
    let admin = app.token_for("admin@example.com", "admin").await;

    let response = app
        .post(
            "/api/quizzes",
            &admin,
            json!({
                "title": "Broken",
                "description": "",
                "subject": "Math",
                "questions": [{
                    "question_text": "1 + 1?",
                    "options": [
                        {"id": "A", "text": "2", "is_correct": true},
                        {"id": "B", "text": "two", "is_correct": true}
                    ],
                    "correct_answer_id": "A"
                }]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let oversized = app
        .post(
            "/api/quizzes",
            &admin,
            json!({
                "title": "Jackpot",
                "description": "",
                "subject": "Math",
                "questions": [{
                    "question_text": "1 + 1?",
                    "options": [
                        {"id": "A", "text": "2", "is_correct": true},
                        {"id": "B", "text": "3", "is_correct": false}
                    ],
                    "correct_answer_id": "A",
                    "points": 9223372036854775807i64
                }]
            }),
        )
        .await;
    assert_eq!(oversized.status().as_u16(), 400);
}

#[tokio::test]
async fn quiz_without_questions_falls_back_to_defaults() {
    let app = spawn_app().await;
    let admin = app.token_for("admin@example.com", "admin").await;

    let response = app
        .post(
            "/api/quizzes",
            &admin,
            json!({
                "title": "Photosynthesis",
                "description": "",
                "subject": "Biology",
                "total_questions": 3
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let quiz: Value = response.json().await.unwrap();
    assert_eq!(quiz["total_questions"], 3);
    assert_eq!(quiz["total_points"], 3);

    let draft: Value = app
        .post(
            "/api/quizzes/generate",
            &admin,
            json!({"topic": "Cells", "difficulty": "easy", "num_questions": 2, "time_limit": 10}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(draft["title"], "Cells Quiz");
    assert_eq!(draft["status"], "draft");
    assert_eq!(draft["questions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn video_is_analyzed_in_background() {
    let app = spawn_app().await;
    let admin = app.token_for("admin@example.com", "admin").await;
    let ana = app.token_for("ana@example.com", "student").await;
    let bo = app.token_for("bo@example.com", "student").await;

    let rejected = app
        .post(
            "/api/videos",
            &ana,
            json!({"video_url": "ftp://videos.example.com/a.mp4", "title": "Cells"}),
        )
        .await;
    assert_eq!(rejected.status().as_u16(), 400);

    let response = app
        .post(
            "/api/videos",
            &ana,
            json!({"video_url": "https://videos.example.com/a.mp4", "title": "Cells"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let video: Value = response.json().await.unwrap();
    let video_id = video["id"].as_str().unwrap().to_string();
    let analysis_path = format!("/api/videos/{video_id}/analysis");

    let mut analysis = Value::Null;
    for _ in 0..50 {
        analysis = app.get(&analysis_path, &ana).await.json().await.unwrap();
        if analysis["status"] == "analyzed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(analysis["status"], "analyzed");
    assert_eq!(
        analysis["analysis_summary"],
        "Unable to analyze video content. Please try again later."
    );
    assert_eq!(
        analysis["feedback"],
        "Good work on your video submission! Keep practicing and improving your presentation skills."
    );

    let foreign = app.get(&format!("/api/videos/{video_id}"), &bo).await;
    assert_eq!(foreign.status().as_u16(), 403);

    let all: Value = app.get("/api/videos", &admin).await.json().await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);
    let bos: Value = app.get("/api/videos", &bo).await.json().await.unwrap();
    assert!(bos.as_array().unwrap().is_empty());

    let stats: Value = app.get("/api/student/video-stats", &ana).await.json().await.unwrap();
    assert_eq!(stats["totalVideos"], 1);
    assert_eq!(stats["analyzedVideos"], 1);

    for n in 2..=4 {
        let response = app
            .post(
                "/api/videos",
                &ana,
                json!({"video_url": format!("https://videos.example.com/{n}.mp4"), "title": format!("Talk {n}")}),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
    }
    let recent: Value = app.get("/api/student/videos/recent", &ana).await.json().await.unwrap();
    assert_eq!(recent.as_array().unwrap().len(), 3);
    assert_eq!(recent[0]["title"], "Talk 4");
    let two: Value = app
        .get("/api/student/videos/recent?limit=2", &ana)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(two.as_array().unwrap().len(), 2);
    let none_for_bo: Value = app.get("/api/student/videos/recent", &bo).await.json().await.unwrap();
    assert!(none_for_bo.as_array().unwrap().is_empty());

    assert!(app.wait_for_email("ana@example.com", "Video Analysis Feedback: Cells").await);
}

#[tokio::test]
async fn admin_notifications_are_sent_and_logged() {
    let app = spawn_app().await;
    let admin = app.token_for("admin@example.com", "admin").await;
    app.register("ana@example.com", "Ana", "student").await;
    app.register("bounce@example.com", "Bounce", "student").await;

    let response = app
        .post(
            "/api/notifications/send",
            &admin,
            json!({
                "to_email": "ana@example.com",
                "subject": "Reminder",
                "body": "<p>Exam on Friday</p><script>alert(1)</script>"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert!(app.mailer.subjects_for("ana@example.com").contains(&"Reminder".to_string()));

    let logs: Value = app.get("/api/notifications/logs", &admin).await.json().await.unwrap();
    assert_eq!(logs[0]["to_email"], "ana@example.com");
    assert_eq!(logs[0]["notification_type"], "general");
    assert_eq!(logs[0]["status"], "sent");

    let broadcast: Value = app
        .post(
            "/api/notifications/broadcast",
            &admin,
            json!({"subject": "Holiday", "body": "No class Monday"}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(broadcast["sent_count"], 1);
    assert_eq!(broadcast["failed_count"], 1);

    let templates: Value = app
        .get("/api/notifications/templates", &admin)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(templates.as_array().unwrap().len(), 4);
}

// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, notifications, quizzes, student, students, videos},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware},
};

async fn root() -> Json<Value> {
    Json(json!({ "message": "Student Management System API" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Assembles the main application router.
///
/// * `/api/auth` register and login are public; everything else needs a token.
/// * Admin-only groups are layered with `admin_middleware`, the student
///   dashboard with `student_middleware`. Mixed groups check the caller's
///   capability inside the handler.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let authenticated = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(authenticated.clone()),
        );

    let student_routes = Router::new()
        .route(
            "/",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/{id}",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/{id}/quiz-results", get(students::student_quiz_results))
        .route(
            "/{id}/video-submissions",
            get(students::student_video_submissions),
        )
        .route("/{id}/statistics", get(students::student_statistics))
        .layer(authenticated.clone());

    let quiz_routes = Router::new()
        .route("/", get(quizzes::list_quizzes).post(quizzes::create_quiz))
        .route("/generate", post(quizzes::generate_quiz))
        .route("/student/recent", get(quizzes::recent_quizzes))
        .route(
            "/{id}",
            get(quizzes::get_quiz)
                .put(quizzes::update_quiz)
                .delete(quizzes::delete_quiz),
        )
        .route("/{id}/submit", post(quizzes::submit_quiz))
        .route("/{id}/results", get(quizzes::quiz_results))
        .route("/{id}/statistics", get(quizzes::quiz_statistics))
        .layer(authenticated.clone());

    let video_routes = Router::new()
        .route("/", get(videos::list_videos).post(videos::submit_video))
        .route("/student/recent", get(videos::recent_videos))
        .route(
            "/{id}",
            get(videos::get_video).delete(videos::delete_video),
        )
        .route("/{id}/analysis", get(videos::video_analysis))
        .route("/{id}/analyze", post(videos::analyze_video))
        .layer(authenticated.clone());

    let notification_routes = Router::new()
        .route("/send", post(notifications::send_notification))
        .route("/broadcast", post(notifications::broadcast_notification))
        .route("/logs", get(notifications::notification_logs))
        .route("/templates", get(notifications::notification_templates))
        .route("/test", post(notifications::test_notification))
        // Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(authenticated.clone());

    let admin_routes = Router::new()
        .route("/stats", get(admin::admin_stats))
        .route("/quiz-stats", get(admin::admin_quiz_stats))
        .route("/quizzes", get(admin::admin_quizzes))
        .route("/students", get(admin::admin_students))
        .route("/videos", get(admin::admin_videos))
        .layer(middleware::from_fn(admin_middleware))
        .layer(authenticated.clone());

    let dashboard_routes = Router::new()
        .route("/quizzes", get(student::my_quizzes))
        .route("/quiz-stats", get(student::my_quiz_stats))
        .route("/videos", get(student::my_videos))
        .route("/videos/recent", get(student::my_recent_videos))
        .route("/video-stats", get(student::my_video_stats))
        .layer(middleware::from_fn(student_middleware))
        .layer(authenticated);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/students", student_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/videos", video_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/student", dashboard_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a test config
//! with a temp media directory, and a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port
//! for HTTP-level testing with reqwest.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use aula_core::config::Config;
use aula_core::{CourseId, LectureId, UserId};
use aula_db::models::{Course, Lecture, User};
use aula_db::pool::{init_memory_pool, DbPool, PooledConnection};
use aula_server::context::AppContext;
use aula_server::middleware::auth::hash_password;
use aula_server::middleware::rate_limit::create_limiter;
use aula_server::router::build_router;
use aula_server::session::SessionIssuer;

pub const TEST_SIGNING_SECRET: &str = "integration-test-signing-secret";

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temp media directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub media_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with the default test configuration.
    pub fn new() -> Self {
        let media_dir = tempfile::tempdir().expect("failed to create temp media dir");

        let mut config = Config::default();
        config.auth.enabled = true;
        config.media.signing_secret = TEST_SIGNING_SECRET.to_string();
        config.media.storage_dir = media_dir.path().to_path_buf();
        config.media.public_base_url = "http://localhost:8080".to_string();

        Self::with_config(config, media_dir)
    }

    fn with_config(config: Config, media_dir: tempfile::TempDir) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let issuer = Arc::new(SessionIssuer::from_config(&config));

        let ctx = AppContext {
            db: db.clone(),
            config: Arc::new(config),
            issuer,
            play_limiter: create_limiter(100_000),
        };

        Self { ctx, db, media_dir }
    }

    /// Start an Axum server on a random port and return the harness
    /// together with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = build_router(harness.ctx.clone(), None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> PooledConnection {
        aula_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Create an admin account and a valid bearer token for it.
    pub fn create_admin(&self) -> (User, String) {
        self.create_user("admin", "Admin", "admin")
    }

    /// Create a student account and a valid bearer token for it.
    pub fn create_student(&self, username: &str, display_name: &str) -> (User, String) {
        self.create_user(username, display_name, "student")
    }

    fn create_user(&self, username: &str, display_name: &str, role: &str) -> (User, String) {
        let conn = self.conn();
        let hash = hash_password("password123").expect("bcrypt");
        let user = aula_db::queries::users::create_user(&conn, username, &hash, display_name, role)
            .expect("create user");
        let token = uuid::Uuid::new_v4().to_string();
        aula_db::queries::auth::create_token(&conn, user.id, &token, "2099-01-01T00:00:00Z")
            .expect("create token");
        (user, token)
    }

    /// Create a course directly in the DB.
    pub fn create_course(&self, title: &str) -> Course {
        let conn = self.conn();
        aula_db::queries::courses::create_course(&conn, title, "", "beginner")
            .expect("create course")
    }

    /// Create a lecture directly in the DB.
    pub fn create_lecture(
        &self,
        course_id: CourseId,
        media_path: &str,
        duration_secs: i64,
    ) -> Lecture {
        let conn = self.conn();
        aula_db::queries::lectures::create_lecture(
            &conn,
            course_id,
            "Test Lecture",
            "",
            media_path,
            duration_secs,
            0,
        )
        .expect("create lecture")
    }

    /// Enroll a user and approve the enrollment in one step.
    pub fn approve_enrollment(&self, user_id: UserId, course_id: CourseId) {
        let conn = self.conn();
        let e = aula_db::queries::enrollments::request_enrollment(&conn, user_id, course_id)
            .expect("request enrollment");
        aula_db::queries::enrollments::approve_enrollment(&conn, e.id).expect("approve");
    }

    /// Enroll a user without approving.
    pub fn pending_enrollment(&self, user_id: UserId, course_id: CourseId) {
        let conn = self.conn();
        aula_db::queries::enrollments::request_enrollment(&conn, user_id, course_id)
            .expect("request enrollment");
    }

    /// Write a fake media file into the storage dir.
    pub fn write_media_file(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.media_dir.path().join(name), contents).expect("write media file");
    }

    /// A signer sharing the harness signing secret, for crafting tokens in
    /// negative tests.
    pub fn signer(&self) -> aula_server::signer::MediaTokenSigner {
        aula_server::signer::MediaTokenSigner::new(TEST_SIGNING_SECRET.as_bytes().to_vec())
    }

    /// Fully provisioned playback fixture: approved student + lecture with
    /// a real media file. Returns (student, bearer token, lecture id).
    pub fn playback_fixture(&self, media_bytes: &[u8]) -> (User, String, LectureId) {
        let (student, token) = self.create_student("viewer", "Vera Lane");
        let course = self.create_course("Rust 101");
        self.write_media_file("lecture.mp4", media_bytes);
        let lecture = self.create_lecture(course.id, "lecture.mp4", 120);
        self.approve_enrollment(student.id, course.id);
        (student, token, lecture.id)
    }
}

#![allow(dead_code)]

use std::io::Cursor;

use actix_web::http::header::{self, HeaderName};
use image::{ImageBuffer, ImageFormat, Rgb};
use recipe_server::AppState;
use recipe_server::domain::user::User;
use recipe_server::infrastructure::security::JwtKeys;
use recipe_server::infrastructure::storage::ImageStorage;
use tempfile::TempDir;

pub const PASSWORD: &str = "testpass123";
const BOUNDARY: &str = "----recipe-test-boundary";

/// Application state over an in-memory store plus a scratch media root.
pub struct TestContext {
    pub state: AppState,
    pub media: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let state = AppState::in_memory(
            JwtKeys::new("test-secret".into(), 300, 86_400),
            ImageStorage::new(media.path(), "/media/"),
            1024 * 1024,
        );
        Self { state, media }
    }

    /// Creates an account and returns it with a fresh access token.
    pub async fn user_with_token(&self, email: &str) -> (User, String) {
        let user = self
            .state
            .auth
            .create_user(email, PASSWORD, "Test User")
            .await
            .unwrap();
        let pair = self
            .state
            .auth
            .obtain_token_pair(email, PASSWORD)
            .await
            .unwrap();
        (user, pair.access)
    }

    pub fn uploaded_files(&self) -> usize {
        std::fs::read_dir(self.media.path().join("uploads/recipe"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn bearer(token: &str) -> (HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub fn png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(10, 10);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// A single-part `multipart/form-data` body; returns (content type, body).
pub fn multipart(field: &str, filename: &str, content: &[u8]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

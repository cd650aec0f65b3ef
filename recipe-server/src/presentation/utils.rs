use actix_web::dev::Payload;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::{Ready, ready};
use futures_util::stream::once;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::presentation::middleware::RequestId;

/// The caller resolved by `JwtAuthMiddleware`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(DomainError::Unauthorized.into())),
        }
    }
}

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

/// Pulls the bytes of the file part named `field` out of a
/// `multipart/form-data` body. Other parts are ignored.
pub async fn read_file_field(
    req: &HttpRequest,
    body: web::Bytes,
    field: &str,
) -> Result<Vec<u8>, DomainError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        DomainError::BadRequest(format!("Multipart form parse error - {}", e))
    })?;

    let stream = once(ready(Ok::<_, std::io::Error>(body)));
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::BadRequest(format!("Multipart form parse error - {}", e)))?
    {
        if part.name() == Some(field) {
            let data = part.bytes().await.map_err(|e| {
                DomainError::BadRequest(format!("Multipart form parse error - {}", e))
            })?;
            return Ok(data.to_vec());
        }
    }

    Err(DomainError::field(field, "No file was submitted."))
}

use actix_web::{HttpRequest, HttpResponse, Responder, error, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::attribute::{Ingredient, Tag};
use crate::domain::error::DomainError;
use crate::presentation::handlers::{attribute, recipe, user};
use crate::presentation::middleware::JwtAuthMiddleware;
use crate::state::AppState;

/// Registers application data and every `/api` route.
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let AppState {
            auth,
            tags,
            ingredients,
            recipes,
            upload_limit,
        } = state;

        cfg.app_data(web::Data::new(auth.clone()))
            .app_data(web::Data::new(tags))
            .app_data(web::Data::new(ingredients))
            .app_data(web::Data::new(recipes))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::PayloadConfig::new(upload_limit))
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health))
                    .service(
                        web::scope("/user")
                            .service(web::resource("/create").route(web::post().to(user::create_user)))
                            .service(web::resource("/token").route(web::post().to(user::obtain_token)))
                            .service(
                                web::resource("/token/refresh")
                                    .route(web::post().to(user::refresh_token)),
                            )
                            .service(
                                web::resource("/me")
                                    .wrap(JwtAuthMiddleware::new(auth.clone()))
                                    .route(web::get().to(user::get_me))
                                    .route(web::put().to(user::replace_me))
                                    .route(web::patch().to(user::patch_me)),
                            ),
                    )
                    .service(
                        web::scope("/recipe")
                            .wrap(JwtAuthMiddleware::new(auth))
                            .configure(attribute::configure::<Tag>)
                            .configure(attribute::configure::<Ingredient>)
                            .configure(recipe::configure),
                    ),
            );
    }
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    DomainError::BadRequest(format!("JSON parse error - {}", err)).into()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

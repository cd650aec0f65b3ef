use actix_web::{HttpRequest, HttpResponse, web};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::application::recipe_service::RecipeService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{ImageResponse, RecipePatchRequest, RecipeRequest};
use crate::presentation::utils::{AuthenticatedUser, read_file_field, request_id};

const IMAGE_FIELD: &str = "image";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/recipes")
            .route(web::get().to(list))
            .route(web::post().to(create)),
    )
    .service(
        web::resource("/recipes/{id}")
            .route(web::get().to(retrieve))
            .route(web::put().to(replace))
            .route(web::patch().to(patch))
            .route(web::delete().to(delete)),
    )
    .service(web::resource("/recipes/{id}/upload-image").route(web::post().to(upload_image)));
}

pub async fn list(
    user: AuthenticatedUser,
    service: web::Data<RecipeService>,
) -> Result<HttpResponse, DomainError> {
    let recipes = service.list(user.id).await?;
    Ok(HttpResponse::Ok().json(recipes))
}

pub async fn create(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<RecipeService>,
    payload: web::Json<RecipeRequest>,
) -> Result<HttpResponse, DomainError> {
    let draft = payload.into_inner().into_draft()?;
    let recipe = service.create(user.id, draft).await?;

    info!(
        request_id = %request_id(&req),
        owner = %user.email,
        recipe_id = %recipe.id,
        "recipe created"
    );
    Ok(HttpResponse::Created().json(recipe))
}

pub async fn retrieve(
    user: AuthenticatedUser,
    service: web::Data<RecipeService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let detail = service.get_detail(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn replace(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<RecipeService>,
    path: web::Path<Uuid>,
    payload: web::Json<RecipeRequest>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    service.get(user.id, id).await?;
    let draft = payload.into_inner().into_draft()?;
    let recipe = service.replace(user.id, id, draft).await?;

    info!(request_id = %request_id(&req), recipe_id = %id, "recipe replaced");
    Ok(HttpResponse::Ok().json(recipe))
}

pub async fn patch(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<RecipeService>,
    path: web::Path<Uuid>,
    payload: web::Json<RecipePatchRequest>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    service.get(user.id, id).await?;
    let payload = payload.into_inner();
    payload.validate()?;
    let recipe = service.patch(user.id, id, payload.into()).await?;

    info!(request_id = %request_id(&req), recipe_id = %id, "recipe updated");
    Ok(HttpResponse::Ok().json(recipe))
}

pub async fn delete(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<RecipeService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    service.delete(user.id, id).await?;

    info!(request_id = %request_id(&req), recipe_id = %id, "recipe deleted");
    Ok(HttpResponse::NoContent().finish())
}

pub async fn upload_image(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<RecipeService>,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    service.get(user.id, id).await?;
    let bytes = read_file_field(&req, body, IMAGE_FIELD).await?;
    let recipe = service.upload_image(user.id, id, &bytes).await?;

    info!(request_id = %request_id(&req), recipe_id = %id, "recipe image replaced");
    Ok(HttpResponse::Ok().json(ImageResponse::from(recipe)))
}

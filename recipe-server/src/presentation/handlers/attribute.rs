//! Handlers shared by tags and ingredients, instantiated per attribute type.

use actix_web::{HttpRequest, HttpResponse, web};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::application::attribute_service::AttributeService;
use crate::domain::attribute::RecipeAttribute;
use crate::domain::error::DomainError;
use crate::presentation::dto::{AttributePatchRequest, AttributeRequest};
use crate::presentation::utils::{AuthenticatedUser, request_id};

pub fn configure<A: RecipeAttribute>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(A::PATH)
            .route(web::get().to(list::<A>))
            .route(web::post().to(create::<A>)),
    )
    .service(
        web::resource(format!("{}/{{id}}", A::PATH))
            .route(web::get().to(retrieve::<A>))
            .route(web::put().to(replace::<A>))
            .route(web::patch().to(patch::<A>))
            .route(web::delete().to(delete::<A>)),
    );
}

pub async fn list<A: RecipeAttribute>(
    user: AuthenticatedUser,
    service: web::Data<AttributeService<A>>,
) -> Result<HttpResponse, DomainError> {
    let items = service.list(user.id).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn create<A: RecipeAttribute>(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<AttributeService<A>>,
    payload: web::Json<AttributeRequest>,
) -> Result<HttpResponse, DomainError> {
    payload.validate()?;
    let item = service.create(user.id, payload.into_inner().name).await?;

    info!(
        request_id = %request_id(&req),
        owner = %user.email,
        kind = A::TABLE,
        id = %item.id(),
        "attribute created"
    );
    Ok(HttpResponse::Created().json(item))
}

pub async fn retrieve<A: RecipeAttribute>(
    user: AuthenticatedUser,
    service: web::Data<AttributeService<A>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let item = service.get(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

pub async fn replace<A: RecipeAttribute>(
    user: AuthenticatedUser,
    service: web::Data<AttributeService<A>>,
    path: web::Path<Uuid>,
    payload: web::Json<AttributeRequest>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    // a foreign id is 404 even when the payload is also invalid
    service.get(user.id, id).await?;
    payload.validate()?;
    let item = service
        .rename(user.id, id, payload.into_inner().name)
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

pub async fn patch<A: RecipeAttribute>(
    user: AuthenticatedUser,
    service: web::Data<AttributeService<A>>,
    path: web::Path<Uuid>,
    payload: web::Json<AttributePatchRequest>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    let current = service.get(user.id, id).await?;
    payload.validate()?;
    let item = match payload.into_inner().name {
        Some(name) => service.rename(user.id, id, name).await?,
        None => current,
    };
    Ok(HttpResponse::Ok().json(item))
}

pub async fn delete<A: RecipeAttribute>(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<AttributeService<A>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let id = path.into_inner();
    service.delete(user.id, id).await?;

    info!(
        request_id = %request_id(&req),
        owner = %user.email,
        kind = A::TABLE,
        id = %id,
        "attribute deleted"
    );
    Ok(HttpResponse::NoContent().finish())
}

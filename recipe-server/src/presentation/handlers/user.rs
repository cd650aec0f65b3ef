use actix_web::{HttpRequest, HttpResponse, web};
use tracing::info;
use validator::Validate;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{
    AccessTokenResponse, ProfilePatchRequest, ProfileUpdateRequest, RefreshRequest,
    RegisterRequest, TokenPairResponse, TokenRequest, UserResponse,
};
use crate::presentation::utils::{AuthenticatedUser, request_id};

pub async fn create_user(
    req: HttpRequest,
    service: web::Data<AuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, DomainError> {
    payload.validate()?;
    let user = service
        .create_user(&payload.email, &payload.password, &payload.name)
        .await?;

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        email = %user.email,
        "user registered"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

pub async fn obtain_token(
    service: web::Data<AuthService>,
    payload: web::Json<TokenRequest>,
) -> Result<HttpResponse, DomainError> {
    payload.validate()?;
    let pair = service
        .obtain_token_pair(&payload.email, &payload.password)
        .await?;

    Ok(HttpResponse::Ok().json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

pub async fn refresh_token(
    service: web::Data<AuthService>,
    payload: web::Json<RefreshRequest>,
) -> Result<HttpResponse, DomainError> {
    payload.validate()?;
    let access = service.refresh_access(&payload.refresh).await?;
    Ok(HttpResponse::Ok().json(AccessTokenResponse { access }))
}

pub async fn get_me(
    user: AuthenticatedUser,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, DomainError> {
    let user = service.get_user(user.id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub async fn replace_me(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<AuthService>,
    payload: web::Json<ProfileUpdateRequest>,
) -> Result<HttpResponse, DomainError> {
    let payload = payload.into_inner();
    payload.validate()?;
    let updated = service.update_profile(user.id, payload.into()).await?;

    info!(request_id = %request_id(&req), user_id = %updated.id, "profile replaced");
    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

pub async fn patch_me(
    req: HttpRequest,
    user: AuthenticatedUser,
    service: web::Data<AuthService>,
    payload: web::Json<ProfilePatchRequest>,
) -> Result<HttpResponse, DomainError> {
    let payload = payload.into_inner();
    payload.validate()?;
    let updated = service.update_profile(user.id, payload.into()).await?;

    info!(request_id = %request_id(&req), user_id = %updated.id, "profile updated");
    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

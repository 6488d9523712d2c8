use crate::application::auth_service::AuthService;
use crate::data::user_repository::PostgresUserRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use actix_web::{HttpResponse, Responder, Scope, post, web};
use tracing::info;

pub fn scope() -> Scope {
    web::scope("/auth").service(register).service(login)
}

#[post("/register")]
async fn register(
    service: web::Data<AuthService<PostgresUserRepository>>,
    payload: web::Json<RegisterRequest>,
) -> Result<impl Responder, DomainError> {
    let user = service
        .register(&payload.username, &payload.password)
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");

    Ok(HttpResponse::Ok().json(RegisterResponse {
        message: "Registration successful",
        user_id: user.id,
    }))
}

#[post("/login")]
async fn login(
    service: web::Data<AuthService<PostgresUserRepository>>,
    payload: web::Json<LoginRequest>,
) -> Result<impl Responder, DomainError> {
    let user = service.login(&payload.username, &payload.password).await?;

    info!(username = %user.username, "user logged in");

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful",
        username: user.username,
        roles: user.roles,
    }))
}

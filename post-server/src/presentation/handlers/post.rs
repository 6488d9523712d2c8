use crate::application::post_service::PostService;
use crate::data::post_repository::PostgresPostRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{CreatePostRequest, UpdatePostRequest};
use crate::presentation::handlers::request_id;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::info;

#[get("/posts")]
pub async fn get_posts(
    req: HttpRequest,
    service: web::Data<PostService<PostgresPostRepository>>,
) -> Result<HttpResponse, DomainError> {
    let posts = service.get_posts().await?;

    info!(request_id = %request_id(&req), total = posts.len(), "posts retrieved");

    if posts.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok().json(posts))
}

// Registered ahead of `get_post` so the literal segment wins over `{id}`.
#[get("/posts/top")]
pub async fn top_posts(
    req: HttpRequest,
    service: web::Data<PostService<PostgresPostRepository>>,
) -> Result<HttpResponse, DomainError> {
    let posts = service.get_top_liked().await?;

    info!(request_id = %request_id(&req), total = posts.len(), "top posts retrieved");

    Ok(HttpResponse::Ok().json(posts))
}

#[get("/posts/{id}")]
pub async fn get_post(
    service: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post = service.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[post("/posts")]
pub async fn create_post(
    req: HttpRequest,
    service: web::Data<PostService<PostgresPostRepository>>,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = service
        .create_post(&payload.title, &payload.content)
        .await?;

    info!(request_id = %request_id(&req), post_id = %post.id, "post created");

    Ok(HttpResponse::Created().json(post))
}

#[put("/posts/{id}")]
pub async fn update_post(
    req: HttpRequest,
    service: web::Data<PostService<PostgresPostRepository>>,
    payload: web::Json<UpdatePostRequest>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = service
        .update_post(post_id, &payload.title, &payload.content)
        .await?;

    info!(request_id = %request_id(&req), post_id = %post_id, "post updated");

    Ok(HttpResponse::Ok().json(post))
}

#[delete("/posts/{id}")]
pub async fn delete_post(
    req: HttpRequest,
    service: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    if !service.delete_post(post_id).await? {
        return Err(DomainError::PostNotFound(post_id));
    }

    info!(request_id = %request_id(&req), post_id = %post_id, "post deleted");

    Ok(HttpResponse::NoContent().finish())
}

#[post("/posts/{id}/like")]
pub async fn like_post(
    req: HttpRequest,
    service: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post = service.like_post(path.into_inner()).await?;

    info!(request_id = %request_id(&req), post_id = %post.id, likes = post.likes, "post liked");

    Ok(HttpResponse::Ok().json(post))
}

#[post("/posts/{id}/unlike")]
pub async fn unlike_post(
    req: HttpRequest,
    service: web::Data<PostService<PostgresPostRepository>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post = service.unlike_post(path.into_inner()).await?;

    info!(request_id = %request_id(&req), post_id = %post.id, likes = post.likes, "post unliked");

    Ok(HttpResponse::Ok().json(post))
}

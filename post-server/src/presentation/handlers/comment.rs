use crate::application::comment_service::CommentService;
use crate::data::comment_repository::PostgresCommentRepository;
use crate::data::post_repository::PostgresPostRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{CreateCommentRequest, ListCommentsQuery};
use crate::presentation::handlers::request_id;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, web};
use tracing::info;

type Comments = CommentService<PostgresCommentRepository, PostgresPostRepository>;

#[post("/comments")]
pub async fn add_comment(
    req: HttpRequest,
    service: web::Data<Comments>,
    payload: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, DomainError> {
    let comment = service
        .add_comment(payload.post_id, &payload.author, &payload.content)
        .await?;

    info!(
        request_id = %request_id(&req),
        comment_id = %comment.id,
        post_id = %comment.post_id,
        "comment created"
    );

    Ok(HttpResponse::Created().json(comment))
}

#[get("/comments/post/{post_id}")]
pub async fn get_comments(
    req: HttpRequest,
    service: web::Data<Comments>,
    path: web::Path<i64>,
    query: web::Query<ListCommentsQuery>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let comments = service
        .get_comments(post_id, query.page, query.size)
        .await?;

    info!(
        request_id = %request_id(&req),
        post_id = %post_id,
        total = comments.len(),
        "comments retrieved"
    );

    Ok(HttpResponse::Ok().json(comments))
}

#[delete("/comments/{id}")]
pub async fn delete_comment(
    req: HttpRequest,
    service: web::Data<Comments>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let comment_id = path.into_inner();
    if !service.delete_comment(comment_id).await? {
        return Err(DomainError::CommentNotFound(comment_id));
    }

    info!(request_id = %request_id(&req), comment_id = %comment_id, "comment deleted");

    Ok(HttpResponse::NoContent().finish())
}

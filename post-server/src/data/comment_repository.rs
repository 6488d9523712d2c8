use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgExecutor};
use tracing::{error, info};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, post_id: i64, author: &str, content: &str)
    -> Result<Comment, DomainError>;
    /// One 0-indexed page of a post's comments, newest first. Callers
    /// validate that `page` and `size` are non-negative.
    async fn find_by_post(
        &self,
        post_id: i64,
        page: i64,
        size: i64,
    ) -> Result<Vec<Comment>, DomainError>;
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;
    async fn delete_all_for_post(&self, post_id: i64) -> Result<u64, DomainError>;
}

/// Bulk delete shared with the post repository, which runs the same query
/// inside its cascade transaction.
pub(crate) async fn delete_comments_for_post<'e, E>(
    executor: E,
    post_id: i64,
) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
        .bind(post_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[derive(Clone)]
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(
        &self,
        post_id: i64,
        author: &str,
        content: &str,
    ) -> Result<Comment, DomainError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author, content)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, author, content, created_at
            "#,
        )
        .bind(post_id)
        .bind(author)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create comment on post {}: {}", post_id, e);
            DomainError::Storage(format!("database error: {}", e))
        })?;

        info!(comment_id = %comment.id, post_id = %post_id, "comment created");
        Ok(comment)
    }

    async fn find_by_post(
        &self,
        post_id: i64,
        page: i64,
        size: i64,
    ) -> Result<Vec<Comment>, DomainError> {
        let limit = size;
        let offset = page.saturating_mul(limit);

        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author, content, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching comments for post {}: {}", post_id, e);
            DomainError::Storage(e.to_string())
        })
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete comment {}: {}", id, e);
                DomainError::Storage(e.to_string())
            })?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(comment_id = %id, "comment deleted");
        }
        Ok(deleted)
    }

    async fn delete_all_for_post(&self, post_id: i64) -> Result<u64, DomainError> {
        let count = delete_comments_for_post(&self.pool, post_id)
            .await
            .map_err(|e| {
                error!("failed to delete comments for post {}: {}", post_id, e);
                DomainError::Storage(e.to_string())
            })?;

        info!(post_id = %post_id, count, "comments deleted for post");
        Ok(count)
    }
}

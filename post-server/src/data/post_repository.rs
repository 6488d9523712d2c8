use crate::data::comment_repository::delete_comments_for_post;
use crate::domain::error::DomainError;
use crate::domain::post::Post;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, title: &str, content: &str) -> Result<Post, DomainError>;
    /// Fetches the row whether or not it is soft-deleted; classification is
    /// up to the caller.
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn find_active(&self) -> Result<Vec<Post>, DomainError>;
    async fn find_top_liked(&self) -> Result<Vec<Post>, DomainError>;
    /// Compare-and-swap write: returns `None` when no active row matched
    /// `id` at `expected_version`.
    async fn update(
        &self,
        id: i64,
        title: &str,
        content: &str,
        expected_version: i64,
    ) -> Result<Option<Post>, DomainError>;
    /// Removes the post and all of its comments in one transaction.
    /// Returns `false` when the post does not exist.
    async fn delete_cascade(&self, id: i64) -> Result<bool, DomainError>;
    /// Atomic increment on an active row; `None` when absent or deleted.
    async fn like(&self, id: i64) -> Result<Option<Post>, DomainError>;
    /// Atomic decrement floored at zero; `None` when absent or deleted.
    async fn unlike(&self, id: i64) -> Result<Option<Post>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, title: &str, content: &str) -> Result<Post, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, content)
            VALUES ($1, $2)
            RETURNING id, title, content, likes, deleted, version, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Storage(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, content, likes, deleted, version, created_at, updated_at
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })
    }

    async fn find_active(&self) -> Result<Vec<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, content, likes, deleted, version, created_at, updated_at
            FROM posts
            WHERE deleted = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching posts: {}", e);
            DomainError::Storage(e.to_string())
        })
    }

    async fn find_top_liked(&self) -> Result<Vec<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, content, likes, deleted, version, created_at, updated_at
            FROM posts
            WHERE deleted = FALSE
            ORDER BY likes DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching top liked posts: {}", e);
            DomainError::Storage(e.to_string())
        })
    }

    async fn update(
        &self,
        id: i64,
        title: &str,
        content: &str,
        expected_version: i64,
    ) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $1, content = $2, updated_at = NOW(), version = version + 1
            WHERE id = $3 AND version = $4 AND deleted = FALSE
            RETURNING id, title, content, likes, deleted, version, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })?;

        if post.is_some() {
            info!(post_id = %id, "post updated");
        }

        Ok(post)
    }

    async fn delete_cascade(&self, id: i64) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("failed to begin delete transaction for post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })?;

        // Comments go first: the foreign key has no ON DELETE action, so
        // deleting the post while comments remain would fail the whole
        // transaction.
        let comments_removed = delete_comments_for_post(&mut *tx, id).await.map_err(|e| {
            error!("failed to delete comments for post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })?;

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("failed to delete post {}: {}", id, e);
                DomainError::Storage(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                error!("failed to roll back delete of post {}: {}", id, e);
                DomainError::Storage(e.to_string())
            })?;
            return Ok(false);
        }

        tx.commit().await.map_err(|e| {
            error!("failed to commit delete of post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })?;

        info!(post_id = %id, comments_removed, "post deleted");
        Ok(true)
    }

    async fn like(&self, id: i64) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET likes = likes + 1, updated_at = NOW(), version = version + 1
            WHERE id = $1 AND deleted = FALSE
            RETURNING id, title, content, likes, deleted, version, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to like post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })
    }

    async fn unlike(&self, id: i64) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET likes = GREATEST(likes - 1, 0), updated_at = NOW(), version = version + 1
            WHERE id = $1 AND deleted = FALSE
            RETURNING id, title, content, likes, deleted, version, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to unlike post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })
    }
}

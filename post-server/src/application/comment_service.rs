use std::sync::Arc;

use crate::application::require_non_blank;
use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::{comment::Comment, error::DomainError};
use tracing::instrument;

/// Largest page a caller may request; mirrors the post listing cap.
const MAX_PAGE_SIZE: i64 = 100;

/// Comments are validated and paged here; the parent post is resolved
/// through the post repository, never held as a reference.
#[derive(Clone)]
pub struct CommentService<C, P>
where
    C: CommentRepository + 'static,
    P: PostRepository + 'static,
{
    comments: Arc<C>,
    posts: Arc<P>,
}

impl<C, P> CommentService<C, P>
where
    C: CommentRepository + 'static,
    P: PostRepository + 'static,
{
    pub fn new(comments: Arc<C>, posts: Arc<P>) -> Self {
        Self { comments, posts }
    }

    /// The parent post must exist and be active before the insert is
    /// attempted; the foreign key only backs this up.
    #[instrument(skip(self))]
    pub async fn add_comment(
        &self,
        post_id: i64,
        author: &str,
        content: &str,
    ) -> Result<Comment, DomainError> {
        require_non_blank("author", author)?;
        require_non_blank("content", content)?;
        self.ensure_post_active(post_id).await?;
        self.comments.create(post_id, author, content).await
    }

    /// One 0-indexed page of a post's comments, newest first.
    pub async fn get_comments(
        &self,
        post_id: i64,
        page: i64,
        size: i64,
    ) -> Result<Vec<Comment>, DomainError> {
        if page < 0 {
            return Err(DomainError::Validation("page cannot be negative".into()));
        }
        if size <= 0 {
            return Err(DomainError::Validation("size must be positive".into()));
        }
        self.ensure_post_active(post_id).await?;

        let size = size.min(MAX_PAGE_SIZE);
        self.comments.find_by_post(post_id, page, size).await
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(&self, id: i64) -> Result<bool, DomainError> {
        self.comments.delete(id).await
    }

    async fn ensure_post_active(&self, post_id: i64) -> Result<(), DomainError> {
        match self.posts.find_by_id(post_id).await? {
            Some(post) if post.is_active() => Ok(()),
            Some(_) => Err(DomainError::PostGone(post_id)),
            None => Err(DomainError::PostNotFound(post_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;
    use crate::data::post_repository::PostRepository;
    use chrono::{Duration, Utc};

    fn service() -> (CommentService<MemoryStore, MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (
            CommentService::new(Arc::clone(&store), Arc::clone(&store)),
            store,
        )
    }

    async fn seed_post(store: &MemoryStore) -> i64 {
        PostRepository::create(store, "Hello", "World")
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn add_comment_assigns_id_and_timestamp() {
        let (service, store) = service();
        let post_id = seed_post(&store).await;

        let comment = service.add_comment(post_id, "alice", "Nice!").await.unwrap();
        assert_eq!(comment.id, 1);
        assert_eq!(comment.post_id, post_id);
    }

    #[tokio::test]
    async fn add_comment_rejects_blank_author_and_content() {
        let (service, store) = service();
        let post_id = seed_post(&store).await;

        let err = service.add_comment(post_id, " ", "text").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service.add_comment(post_id, "alice", "").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        assert_eq!(store.comment_count(post_id), 0);
    }

    #[tokio::test]
    async fn add_comment_requires_an_existing_active_post() {
        let (service, store) = service();

        let err = service.add_comment(7, "alice", "hi").await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(7)));

        let post_id = seed_post(&store).await;
        store.mark_deleted(post_id);
        let err = service.add_comment(post_id, "alice", "hi").await.unwrap_err();
        assert!(matches!(err, DomainError::PostGone(_)));
    }

    #[tokio::test]
    async fn pages_are_newest_first() {
        let (service, store) = service();
        let post_id = seed_post(&store).await;

        let base = Utc::now();
        for i in 0..10 {
            store.insert_comment_at(
                post_id,
                "bob",
                &format!("comment {}", i),
                base + Duration::seconds(i),
            );
        }

        let page = service.get_comments(post_id, 0, 5).await.unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].content, "comment 9");
        assert!(page[0].created_at > page[4].created_at);

        let next = service.get_comments(post_id, 1, 5).await.unwrap();
        assert_eq!(next.len(), 5);
        assert_eq!(next[0].content, "comment 4");
        assert!(page[4].created_at > next[0].created_at);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let (service, store) = service();
        let post_id = seed_post(&store).await;
        service.add_comment(post_id, "bob", "only one").await.unwrap();

        let page = service.get_comments(post_id, 3, 5).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn listing_rejects_bad_page_bounds() {
        let (service, store) = service();
        let post_id = seed_post(&store).await;

        let err = service.get_comments(post_id, -1, 5).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service.get_comments(post_id, 0, 0).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn listing_for_missing_post_is_not_found() {
        let (service, _) = service();
        let err = service.get_comments(12, 0, 5).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(12)));
    }

    #[tokio::test]
    async fn bulk_delete_returns_the_count() {
        let (service, store) = service();
        let post_id = seed_post(&store).await;
        let other_id = seed_post(&store).await;
        for i in 0..4 {
            service
                .add_comment(post_id, "bob", &format!("c{}", i))
                .await
                .unwrap();
        }
        service.add_comment(other_id, "bob", "kept").await.unwrap();

        let removed = store.delete_all_for_post(post_id).await.unwrap();
        assert_eq!(removed, 4);
        assert_eq!(store.delete_all_for_post(post_id).await.unwrap(), 0);
        assert_eq!(store.comment_count(other_id), 1);
    }

    #[tokio::test]
    async fn delete_comment_reports_whether_it_existed() {
        let (service, store) = service();
        let post_id = seed_post(&store).await;
        let comment = service.add_comment(post_id, "bob", "bye").await.unwrap();

        assert!(service.delete_comment(comment.id).await.unwrap());
        assert!(!service.delete_comment(comment.id).await.unwrap());
    }
}

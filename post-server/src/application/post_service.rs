use std::sync::Arc;

use crate::application::require_non_blank;
use crate::data::post_repository::PostRepository;
use crate::domain::{error::DomainError, post::Post};
use tracing::instrument;

#[derive(Clone)]
pub struct PostService<R: PostRepository + 'static> {
    repo: Arc<R>,
}

impl<R> PostService<R>
where
    R: PostRepository + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Distinguishes a missing post from a soft-deleted one: the former is
    /// not found, the latter is gone.
    pub async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        match self.repo.find_by_id(id).await? {
            Some(post) if post.is_active() => Ok(post),
            Some(_) => Err(DomainError::PostGone(id)),
            None => Err(DomainError::PostNotFound(id)),
        }
    }

    pub async fn get_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.repo.find_active().await
    }

    pub async fn get_top_liked(&self) -> Result<Vec<Post>, DomainError> {
        self.repo.find_top_liked().await
    }

    #[instrument(skip(self))]
    pub async fn create_post(&self, title: &str, content: &str) -> Result<Post, DomainError> {
        require_non_blank("title", title)?;
        require_non_blank("content", content)?;
        self.repo.create(title, content).await
    }

    /// No-op updates are rejected: callers sending back the values they
    /// read get an error instead of a silent write.
    #[instrument(skip(self))]
    pub async fn update_post(
        &self,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Post, DomainError> {
        require_non_blank("title", title)?;
        require_non_blank("content", content)?;

        let existing = self.get_post(id).await?;
        if existing.title == title && existing.content == content {
            return Err(DomainError::NoChange);
        }

        match self
            .repo
            .update(id, title, content, existing.version)
            .await?
        {
            Some(post) => Ok(post),
            None => Err(DomainError::Conflict(id)),
        }
    }

    /// Removes the post together with all of its comments, or returns
    /// `false` when there is nothing to remove.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        if id <= 0 {
            return Err(DomainError::Validation("post id must be positive".into()));
        }
        self.repo.delete_cascade(id).await
    }

    #[instrument(skip(self))]
    pub async fn like_post(&self, id: i64) -> Result<Post, DomainError> {
        match self.repo.like(id).await? {
            Some(post) => Ok(post),
            None => match self.repo.find_by_id(id).await? {
                Some(_) => Err(DomainError::PostGone(id)),
                None => Err(DomainError::PostNotFound(id)),
            },
        }
    }

    /// Decrementing an already-zero counter is a no-op, not an error.
    #[instrument(skip(self))]
    pub async fn unlike_post(&self, id: i64) -> Result<Post, DomainError> {
        match self.repo.unlike(id).await? {
            Some(post) => Ok(post),
            None => match self.repo.find_by_id(id).await? {
                Some(_) => Err(DomainError::PostGone(id)),
                None => Err(DomainError::PostNotFound(id)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::comment_repository::CommentRepository;
    use crate::data::memory::MemoryStore;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn service() -> (PostService<MemoryStore>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (PostService::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn create_post_assigns_defaults() {
        let (service, _) = service();
        let post = service.create_post("Hello", "World").await.unwrap();

        assert_eq!(post.id, 1);
        assert_eq!(post.likes, 0);
        assert!(!post.deleted);
        assert_eq!(post.version, 0);
    }

    #[tokio::test]
    async fn create_post_rejects_blank_input() {
        let (service, store) = service();

        let err = service.create_post("  ", "content").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service.create_post("title", "\t\n").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        // Nothing may have been persisted.
        assert!(store.find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn like_twice_then_unlike_three_times_floors_at_zero() {
        let (service, _) = service();
        let post = service.create_post("Hello", "World").await.unwrap();

        service.like_post(post.id).await.unwrap();
        let liked = service.like_post(post.id).await.unwrap();
        assert_eq!(liked.likes, 2);

        service.unlike_post(post.id).await.unwrap();
        service.unlike_post(post.id).await.unwrap();
        let floored = service.unlike_post(post.id).await.unwrap();
        assert_eq!(floored.likes, 0);
    }

    #[tokio::test]
    async fn like_missing_post_is_not_found() {
        let (service, _) = service();
        let err = service.like_post(99).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(99)));
    }

    #[tokio::test]
    async fn like_deleted_post_is_gone() {
        let (service, store) = service();
        let post = service.create_post("T", "C").await.unwrap();
        store.mark_deleted(post.id);

        let err = service.like_post(post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::PostGone(_)));
        let err = service.unlike_post(post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::PostGone(_)));
    }

    #[tokio::test]
    async fn update_changes_fields_and_bumps_version() {
        let (service, _) = service();
        let post = service.create_post("Old", "Body").await.unwrap();

        let updated = service.update_post(post.id, "New", "Body2").await.unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.content, "Body2");
        assert_eq!(updated.version, post.version + 1);
        assert!(updated.updated_at >= post.updated_at);
    }

    #[tokio::test]
    async fn update_with_identical_values_is_rejected() {
        let (service, _) = service();
        let post = service.create_post("T", "C").await.unwrap();

        let err = service.update_post(post.id, "T", "C").await.unwrap_err();
        assert!(matches!(err, DomainError::NoChange));
    }

    #[tokio::test]
    async fn update_missing_and_deleted_posts_fail_distinctly() {
        let (service, store) = service();
        let post = service.create_post("T", "C").await.unwrap();
        store.mark_deleted(post.id);

        let err = service.update_post(99, "A", "B").await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(99)));

        let err = service.update_post(post.id, "A", "B").await.unwrap_err();
        assert!(matches!(err, DomainError::PostGone(_)));
    }

    #[tokio::test]
    async fn update_lost_race_is_a_conflict() {
        // A repository whose stored version moved on after the service
        // read the post, so the compare-and-swap write matches nothing.
        struct StaleRepo;

        #[async_trait::async_trait]
        impl PostRepository for StaleRepo {
            async fn create(&self, _: &str, _: &str) -> Result<Post, DomainError> {
                unreachable!()
            }
            async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
                let now = chrono::Utc::now();
                Ok(Some(Post {
                    id,
                    title: "T".into(),
                    content: "C".into(),
                    likes: 0,
                    deleted: false,
                    version: 3,
                    created_at: now,
                    updated_at: now,
                }))
            }
            async fn find_active(&self) -> Result<Vec<Post>, DomainError> {
                unreachable!()
            }
            async fn find_top_liked(&self) -> Result<Vec<Post>, DomainError> {
                unreachable!()
            }
            async fn update(
                &self,
                _: i64,
                _: &str,
                _: &str,
                _: i64,
            ) -> Result<Option<Post>, DomainError> {
                Ok(None)
            }
            async fn delete_cascade(&self, _: i64) -> Result<bool, DomainError> {
                unreachable!()
            }
            async fn like(&self, _: i64) -> Result<Option<Post>, DomainError> {
                unreachable!()
            }
            async fn unlike(&self, _: i64) -> Result<Option<Post>, DomainError> {
                unreachable!()
            }
        }

        let service = PostService::new(Arc::new(StaleRepo));
        let err = service.update_post(1, "New", "Body").await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(1)));
    }

    #[tokio::test]
    async fn delete_rejects_non_positive_ids() {
        let (service, _) = service();
        let err = service.delete_post(0).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = service.delete_post(-4).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_missing_post_returns_false() {
        let (service, _) = service();
        assert!(!service.delete_post(42).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_post_and_all_comments() {
        let (service, store) = service();
        let post = service.create_post("T", "C").await.unwrap();
        for i in 0..3 {
            CommentRepository::create(store.as_ref(), post.id, "bob", &format!("c{}", i))
                .await
                .unwrap();
        }

        assert!(service.delete_post(post.id).await.unwrap());

        assert!(store.find_by_id(post.id).await.unwrap().is_none());
        assert_eq!(store.comment_count(post.id), 0);
    }

    #[tokio::test]
    async fn delete_with_no_comments_succeeds() {
        let (service, store) = service();
        let post = service.create_post("T", "C").await.unwrap();

        assert!(service.delete_post(post.id).await.unwrap());
        assert!(store.find_by_id(post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_cascade_leaves_post_and_comments_intact() {
        let (service, store) = service();
        let post = service.create_post("T", "C").await.unwrap();
        CommentRepository::create(store.as_ref(), post.id, "bob", "hi")
            .await
            .unwrap();

        store.fail_comment_delete.store(true, Ordering::SeqCst);
        let err = service.delete_post(post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));

        assert!(store.find_by_id(post.id).await.unwrap().is_some());
        assert_eq!(store.comment_count(post.id), 1);
    }

    #[tokio::test]
    async fn deleted_posts_are_hidden_from_listings() {
        let (service, store) = service();
        let kept = service.create_post("Kept", "C").await.unwrap();
        let hidden = service.create_post("Hidden", "C").await.unwrap();
        store.mark_deleted(hidden.id);

        let active = service.get_posts().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, kept.id);

        let top = service.get_top_liked().await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, kept.id);

        let err = service.get_post(hidden.id).await.unwrap_err();
        assert!(matches!(err, DomainError::PostGone(_)));
        let err = service.get_post(999).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(999)));
    }

    #[tokio::test]
    async fn top_liked_orders_by_likes_then_id() {
        let (service, _) = service();
        let a = service.create_post("A", "C").await.unwrap();
        let b = service.create_post("B", "C").await.unwrap();
        let c = service.create_post("C", "C").await.unwrap();

        service.like_post(b.id).await.unwrap();
        service.like_post(b.id).await.unwrap();
        service.like_post(c.id).await.unwrap();
        service.like_post(a.id).await.unwrap();

        let top = service.get_top_liked().await.unwrap();
        let ids: Vec<i64> = top.iter().map(|p| p.id).collect();
        // b has two likes; a and c are tied on one, lower id first.
        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }
}

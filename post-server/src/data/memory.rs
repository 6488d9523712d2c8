//! In-memory repository used by the service tests. One store implements
//! all three repository traits so cascade behaviour can be observed across
//! posts and comments without a database.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::post::Post;
use crate::domain::user::User;

#[derive(Default)]
pub struct MemoryStore {
    posts: Mutex<HashMap<i64, Post>>,
    comments: Mutex<HashMap<i64, Comment>>,
    users: Mutex<HashMap<i64, User>>,
    next_post_id: AtomicI64,
    next_comment_id: AtomicI64,
    next_user_id: AtomicI64,
    /// When set, comment bulk-deletion fails without touching anything,
    /// standing in for a transaction that rolled back.
    pub fail_comment_delete: AtomicBool,
}

impl MemoryStore {
    pub fn mark_deleted(&self, id: i64) {
        if let Some(post) = self.posts.lock().unwrap().get_mut(&id) {
            post.deleted = true;
        }
    }

    /// Inserts a comment with an explicit timestamp, for ordering tests.
    pub fn insert_comment_at(
        &self,
        post_id: i64,
        author: &str,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Comment {
        let id = self.next_comment_id.fetch_add(1, Ordering::SeqCst) + 1;
        let comment = Comment {
            id,
            post_id,
            author: author.to_string(),
            content: content.to_string(),
            created_at,
        };
        self.comments.lock().unwrap().insert(id, comment.clone());
        comment
    }

    pub fn comment_count(&self, post_id: i64) -> usize {
        self.comments
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.post_id == post_id)
            .count()
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, title: &str, content: &str) -> Result<Post, DomainError> {
        let id = self.next_post_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let post = Post {
            id,
            title: title.to_string(),
            content: content.to_string(),
            likes: 0,
            deleted: false,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().insert(id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.posts.lock().unwrap().get(&id).cloned())
    }

    async fn find_active(&self) -> Result<Vec<Post>, DomainError> {
        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn find_top_liked(&self) -> Result<Vec<Post>, DomainError> {
        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.likes.cmp(&a.likes).then(a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn update(
        &self,
        id: i64,
        title: &str,
        content: &str,
        expected_version: i64,
    ) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        match posts.get_mut(&id) {
            Some(post) if post.is_active() && post.version == expected_version => {
                post.title = title.to_string();
                post.content = content.to_string();
                post.updated_at = Utc::now();
                post.version += 1;
                Ok(Some(post.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_cascade(&self, id: i64) -> Result<bool, DomainError> {
        if self.fail_comment_delete.load(Ordering::SeqCst) {
            return Err(DomainError::Storage("comment cleanup failed".into()));
        }
        let mut posts = self.posts.lock().unwrap();
        if !posts.contains_key(&id) {
            return Ok(false);
        }
        self.comments.lock().unwrap().retain(|_, c| c.post_id != id);
        posts.remove(&id);
        Ok(true)
    }

    async fn like(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        match posts.get_mut(&id) {
            Some(post) if post.is_active() => {
                post.likes += 1;
                post.version += 1;
                post.updated_at = Utc::now();
                Ok(Some(post.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn unlike(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        match posts.get_mut(&id) {
            Some(post) if post.is_active() => {
                post.likes = (post.likes - 1).max(0);
                post.version += 1;
                post.updated_at = Utc::now();
                Ok(Some(post.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(
        &self,
        post_id: i64,
        author: &str,
        content: &str,
    ) -> Result<Comment, DomainError> {
        Ok(self.insert_comment_at(post_id, author, content, Utc::now()))
    }

    async fn find_by_post(
        &self,
        post_id: i64,
        page: i64,
        size: i64,
    ) -> Result<Vec<Comment>, DomainError> {
        let mut comments: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let offset = page.saturating_mul(size) as usize;
        Ok(comments
            .into_iter()
            .skip(offset)
            .take(size as usize)
            .collect())
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.comments.lock().unwrap().remove(&id).is_some())
    }

    async fn delete_all_for_post(&self, post_id: i64) -> Result<u64, DomainError> {
        if self.fail_comment_delete.load(Ordering::SeqCst) {
            return Err(DomainError::Storage("comment cleanup failed".into()));
        }
        let mut comments = self.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|_, c| c.post_id != post_id);
        Ok((before - comments.len()) as u64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.username == username) {
            return Err(DomainError::UsernameTaken);
        }
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            roles: roles.to_vec(),
            created_at: Utc::now(),
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .any(|u| u.username == username))
    }
}

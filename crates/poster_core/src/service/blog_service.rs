//! Blog use-case service.
//!
//! # Responsibility
//! - Provide user/post/comment entry points for callers.
//! - Check author existence, field limits and the post comment policy before
//!   delegating to the store.
//!
//! # Invariants
//! - Service APIs never bypass store atomicity; every write is one store call.
//! - Comments under a post that disallows them are neither created nor listed.
//! - The service stays storage-agnostic.

use crate::collection::{empty, BoxCollection};
use crate::model::comment::{Comment, CommentId, NewComment};
use crate::model::post::{NewPost, Post, PostId};
use crate::model::target::{CommentableId, Target};
use crate::model::user::{NewUser, User, UserId};
use crate::repo::error::{EntityKind, RepoResult};
use crate::repo::{SortOrder, Store};
use crate::service::{single, ServiceError, ServiceResult, COMMENTS_NOT_ALLOWED};
use log::{info, warn};
use std::time::{SystemTime, UNIX_EPOCH};

/// Post creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub allow_comments: bool,
}

/// Comment creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentForm {
    pub content: String,
}

/// Use-case service over any full store.
pub struct BlogService<R: Store> {
    repo: R,
    clock: fn() -> i64,
}

impl<R: Store> BlogService<R> {
    /// Creates a service stamping new records with the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, now_epoch_ms)
    }

    /// Creates a service with a custom epoch-millisecond clock.
    pub fn with_clock(repo: R, clock: fn() -> i64) -> Self {
        Self { repo, clock }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn create_user(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> ServiceResult<User> {
        let user = NewUser::new(email, password);
        user.validate()?;
        let created = self.repo.create_user(user);
        log_write("user_create", &created, |user| user.id);
        Ok(created?)
    }

    pub fn get_users_by_id(&self, ids: &[UserId]) -> ServiceResult<BoxCollection<'_, User>> {
        Ok(self.repo.get_users_by_id(ids)?)
    }

    /// Creates a post authored by `user_id`.
    ///
    /// # Errors
    /// - `NotFound` when the author does not exist.
    /// - `Validation` for empty or oversized title/content.
    pub fn create_post(&self, user_id: UserId, form: PostForm) -> ServiceResult<Post> {
        self.ensure_user(user_id)?;
        let post = NewPost {
            author_id: user_id,
            title: form.title,
            content: form.content,
            comments_allowed: form.allow_comments,
            created_at: (self.clock)(),
        };
        post.validate()?;

        let created = self.repo.create_post(post);
        log_write("post_create", &created, |post| post.id);
        Ok(created?)
    }

    /// Replaces a post's title, content and comment policy.
    pub fn update_post(&self, post: &Post) -> ServiceResult<Post> {
        post.validate()?;
        let updated = self.repo.update_post(post);
        log_write("post_update", &updated, |post| post.id);
        Ok(updated?)
    }

    pub fn get_posts(&self, order: SortOrder) -> ServiceResult<BoxCollection<'_, Post>> {
        Ok(self.repo.get_posts(order)?)
    }

    pub fn get_posts_by_id(&self, ids: &[PostId]) -> ServiceResult<BoxCollection<'_, Post>> {
        Ok(self.repo.get_posts_by_id(ids)?)
    }

    /// Comments directly on a post.
    ///
    /// # Errors
    /// - `NotFound` for a missing author or post.
    /// - `Violation` when the post does not accept comments.
    /// - `Validation` for empty or oversized content.
    pub fn create_post_comment(
        &self,
        user_id: UserId,
        post_id: PostId,
        form: CommentForm,
    ) -> ServiceResult<Comment> {
        self.ensure_user(user_id)?;
        let post = self.get_post(post_id)?;
        if !post.comments_allowed {
            warn!(
                "event=comment_create module=service status=rejected reason=comments_disabled post_id={post_id}"
            );
            return Err(ServiceError::Violation(COMMENTS_NOT_ALLOWED));
        }

        let comment = self.new_comment(user_id, form)?;
        let created = self.repo.create_post_comment(post_id, comment);
        log_write("comment_create", &created, |comment| comment.id);
        Ok(created?)
    }

    /// Replies to an existing comment.
    pub fn create_comment_comment(
        &self,
        user_id: UserId,
        comment_id: CommentId,
        form: CommentForm,
    ) -> ServiceResult<Comment> {
        self.ensure_user(user_id)?;
        let comment = self.new_comment(user_id, form)?;
        let created = self.repo.create_comment_comment(comment_id, comment);
        log_write("comment_create", &created, |comment| comment.id);
        Ok(created?)
    }

    pub fn get_comments_by_id(
        &self,
        ids: &[CommentId],
    ) -> ServiceResult<BoxCollection<'_, Comment>> {
        Ok(self.repo.get_comments_by_id(ids)?)
    }

    /// Top-level comments of a post; empty when the post disallows comments.
    pub fn get_comments_by_post_id(
        &self,
        post_id: PostId,
        order: SortOrder,
    ) -> ServiceResult<BoxCollection<'_, Comment>> {
        if !self.get_post(post_id)?.comments_allowed {
            return Ok(Box::new(empty::<RepoResult<Comment>>(EntityKind::Comment)));
        }
        Ok(self.repo.get_comments_by_post_id(post_id, order)?)
    }

    pub fn get_comments_by_comment_id(
        &self,
        comment_id: CommentId,
        order: SortOrder,
    ) -> ServiceResult<BoxCollection<'_, Comment>> {
        Ok(self.repo.get_comments_by_comment_id(comment_id, order)?)
    }

    /// Post or comment a comment's `target_id` points at.
    pub fn resolve_target(&self, commentable_id: CommentableId) -> ServiceResult<Target> {
        Ok(self.repo.resolve_target(commentable_id)?)
    }

    fn ensure_user(&self, user_id: UserId) -> ServiceResult<User> {
        single(&self.repo.get_users_by_id(&[user_id])?)
    }

    fn get_post(&self, post_id: PostId) -> ServiceResult<Post> {
        single(&self.repo.get_posts_by_id(&[post_id])?)
    }

    fn new_comment(&self, user_id: UserId, form: CommentForm) -> ServiceResult<NewComment> {
        let comment = NewComment {
            author_id: user_id,
            content: form.content,
            created_at: (self.clock)(),
        };
        comment.validate()?;
        Ok(comment)
    }
}

fn log_write<T>(event: &str, result: &RepoResult<T>, id_of: impl Fn(&T) -> uuid::Uuid) {
    match result {
        Ok(value) => info!(
            "event={event} module=service status=ok id={}",
            id_of(value)
        ),
        Err(err) => warn!(
            "event={event} module=service status=error error_kind={:?} error={err}",
            err.kind()
        ),
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

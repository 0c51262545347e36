//! Core domain logic for the Poster blog backend.
//!
//! Users write posts, posts and comments collect comment threads, and every
//! read is a lazy, cursor-paginated [`Collection`]. Two interchangeable stores
//! implement the repository contracts: [`InMemoryStore`] and [`SqliteStore`].

pub mod collection;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use collection::{empty, map, try_map, BoxCollection, Collection, Cursor, Items};
pub use config::{AppConfig, ConfigError, SqlitePath, StoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::comment::{Comment, CommentId, NewComment};
pub use model::post::{NewPost, Post, PostId};
pub use model::target::{CommentableId, Target, TargetKind};
pub use model::user::{NewUser, User, UserId};
pub use model::ValidationError;
pub use repo::{
    CommentRepository, EntityKind, ErrorKind, InMemoryStore, PostRepository, RepoError,
    RepoResult, SortOrder, SqliteStore, Store, UserRepository,
};
pub use service::{
    single, BlogService, CommentForm, PostForm, ServiceError, ServiceErrorKind, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

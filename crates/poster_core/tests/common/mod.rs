#![allow(dead_code)]

use poster_core::{
    Collection, Comment, NewComment, NewPost, NewUser, Post, PostId, RepoError, Store, User,
    UserId,
};

/// Runs the same test body once per storage backend.
macro_rules! test_each_store {
    ($test_name:ident, |$store:ident| $test_code:block) => {
        #[test]
        fn $test_name() {
            {
                println!("=> testing with in-memory store");
                #[allow(unused_variables)]
                let $store = poster_core::InMemoryStore::new();
                $test_code
            }
            {
                println!("=> testing with sqlite store");
                let conn = poster_core::open_db_in_memory().unwrap();
                #[allow(unused_variables)]
                let $store = poster_core::SqliteStore::try_new(&conn).unwrap();
                $test_code
            }
        }
    };
}

pub fn user(store: &impl Store, email: &str) -> User {
    store.create_user(NewUser::new(email, "secret")).unwrap()
}

pub fn post(store: &impl Store, author_id: UserId, title: &str, created_at: i64) -> Post {
    store
        .create_post(NewPost {
            author_id,
            title: title.to_string(),
            content: format!("{title} body"),
            comments_allowed: true,
            created_at,
        })
        .unwrap()
}

pub fn closed_post(store: &impl Store, author_id: UserId, title: &str) -> Post {
    store
        .create_post(NewPost {
            author_id,
            title: title.to_string(),
            content: format!("{title} body"),
            comments_allowed: false,
            created_at: 0,
        })
        .unwrap()
}

pub fn new_comment(author_id: UserId, content: &str, created_at: i64) -> NewComment {
    NewComment {
        author_id,
        content: content.to_string(),
        created_at,
    }
}

pub fn comment_on_post(
    store: &impl Store,
    author_id: UserId,
    post_id: PostId,
    content: &str,
    created_at: i64,
) -> Comment {
    store
        .create_post_comment(post_id, new_comment(author_id, content, created_at))
        .unwrap()
}

/// Realizes a collection whose elements are all expected to load.
pub fn ok_items<C, T>(collection: &C) -> Vec<T>
where
    C: Collection<Item = Result<T, RepoError>> + ?Sized,
{
    collection.get().unwrap().map(Result::unwrap).collect()
}

pub fn titles(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|post| post.title.as_str()).collect()
}

pub fn contents(comments: &[Comment]) -> Vec<&str> {
    comments
        .iter()
        .map(|comment| comment.content.as_str())
        .collect()
}

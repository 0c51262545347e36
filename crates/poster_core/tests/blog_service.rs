use poster_core::{
    open_db_in_memory, BlogService, Collection, CommentForm, CommentRepository, EntityKind,
    InMemoryStore, PostForm, ServiceError, ServiceErrorKind, SortOrder, SqliteStore, Store,
    ValidationError,
};
use uuid::Uuid;

/// Runs the same test body once per storage backend, wrapped in a service.
macro_rules! test_each_service {
    ($test_name:ident, |$service:ident| $test_code:block) => {
        #[test]
        fn $test_name() {
            {
                println!("=> testing with in-memory store");
                let $service = BlogService::with_clock(InMemoryStore::new(), ticking_clock);
                $test_code
            }
            {
                println!("=> testing with sqlite store");
                let conn = open_db_in_memory().unwrap();
                let $service =
                    BlogService::with_clock(SqliteStore::try_new(&conn).unwrap(), ticking_clock);
                $test_code
            }
        }
    };
}

fn ticking_clock() -> i64 {
    use std::sync::atomic::{AtomicI64, Ordering};
    static NOW: AtomicI64 = AtomicI64::new(1_000);
    NOW.fetch_add(1, Ordering::SeqCst)
}

fn form(title: &str, allow_comments: bool) -> PostForm {
    PostForm {
        title: title.to_string(),
        content: format!("{title} body"),
        allow_comments,
    }
}

fn text(content: &str) -> CommentForm {
    CommentForm {
        content: content.to_string(),
    }
}

fn comment_count<R: Store>(service: &BlogService<R>, post_id: Uuid) -> usize {
    service
        .repo()
        .get_comments_by_post_id(post_id, SortOrder::DateAsc)
        .unwrap()
        .get()
        .unwrap()
        .count()
}

test_each_service!(create_user_validates_email, |service| {
    let err = service.create_user("nobody", "secret").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::Malformed("user.email"))
    ));
    assert_eq!(err.kind(), ServiceErrorKind::Incorrect);

    let err = service.create_user("", "secret").unwrap_err();
    assert_eq!(err.kind(), ServiceErrorKind::Empty);

    let user = service.create_user("ok@example.com", "secret").unwrap();
    let users = service.get_users_by_id(&[user.id]).unwrap();
    assert_eq!(users.get().unwrap().count(), 1);
});

test_each_service!(create_post_enforces_field_limits, |service| {
    let author = service.create_user("limits@example.com", "secret").unwrap();

    let mut empty_title = form("", true);
    empty_title.content = "body".to_string();
    let err = service.create_post(author.id, empty_title).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::Empty("post.title"))
    ));

    let mut long_title = form("t", true);
    long_title.title = "t".repeat(1001);
    assert_eq!(
        service.create_post(author.id, long_title).unwrap_err().kind(),
        ServiceErrorKind::Incorrect
    );

    let mut long_content = form("t", true);
    long_content.content = "c".repeat(4001);
    assert!(matches!(
        service.create_post(author.id, long_content).unwrap_err(),
        ServiceError::Validation(ValidationError::TooLong {
            field: "post.content",
            limit: 4000
        })
    ));

    let mut at_limit = form("t", true);
    at_limit.title = "t".repeat(1000);
    at_limit.content = "c".repeat(4000);
    service.create_post(author.id, at_limit).unwrap();

    let listed = service.get_posts(SortOrder::DateDesc).unwrap();
    assert_eq!(listed.get().unwrap().count(), 1);
});

test_each_service!(create_post_requires_existing_author, |service| {
    let ghost = Uuid::new_v4();
    let err = service.create_post(ghost, form("orphan", true)).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound { entity: EntityKind::User, id } if id == ghost
    ));
});

test_each_service!(disabled_post_rejects_and_hides_comments, |service| {
    let author = service.create_user("policy@example.com", "secret").unwrap();
    let post = service.create_post(author.id, form("closed", false)).unwrap();

    let err = service
        .create_post_comment(author.id, post.id, text("hello"))
        .unwrap_err();
    assert_eq!(err.kind(), ServiceErrorKind::Violation);
    assert_eq!(comment_count(&service, post.id), 0);

    let mut listing = service
        .get_comments_by_post_id(post.id, SortOrder::DateAsc)
        .unwrap();
    assert_eq!(listing.get().unwrap().count(), 0);
    assert!(listing.after(Uuid::new_v4()).unwrap_err().is_not_found());
});

test_each_service!(reenabling_comments_restores_thread, |service| {
    let author = service.create_user("toggle@example.com", "secret").unwrap();
    let post = service.create_post(author.id, form("toggle", true)).unwrap();
    service
        .create_post_comment(author.id, post.id, text("early"))
        .unwrap();

    let mut closed = post.clone();
    closed.comments_allowed = false;
    let stored = service.update_post(&closed).unwrap();
    assert!(!stored.comments_allowed);
    let hidden = service
        .get_comments_by_post_id(post.id, SortOrder::DateAsc)
        .unwrap();
    assert_eq!(hidden.get().unwrap().count(), 0);

    let mut reopened = stored.clone();
    reopened.comments_allowed = true;
    service.update_post(&reopened).unwrap();
    service
        .create_post_comment(author.id, post.id, text("late"))
        .unwrap();

    let thread: Vec<String> = service
        .get_comments_by_post_id(post.id, SortOrder::DateAsc)
        .unwrap()
        .get()
        .unwrap()
        .map(|comment| comment.unwrap().content)
        .collect();
    assert_eq!(thread, vec!["early", "late"]);
});

test_each_service!(update_post_validates_before_writing, |service| {
    let author = service.create_user("edit@example.com", "secret").unwrap();
    let post = service.create_post(author.id, form("draft", true)).unwrap();

    let mut invalid = post.clone();
    invalid.content = String::new();
    assert_eq!(
        service.update_post(&invalid).unwrap_err().kind(),
        ServiceErrorKind::Empty
    );

    let unchanged: Vec<_> = service
        .get_posts_by_id(&[post.id])
        .unwrap()
        .get()
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(unchanged, vec![post.clone()]);

    let mut unknown = post.clone();
    unknown.id = Uuid::new_v4();
    assert_eq!(
        service.update_post(&unknown).unwrap_err().kind(),
        ServiceErrorKind::NotFound
    );
});

test_each_service!(comment_content_limits_apply_to_replies, |service| {
    let author = service.create_user("replies@example.com", "secret").unwrap();
    let post = service.create_post(author.id, form("thread", true)).unwrap();
    let parent = service
        .create_post_comment(author.id, post.id, text(&"c".repeat(2000)))
        .unwrap();

    let err = service
        .create_comment_comment(author.id, parent.id, text(&"c".repeat(2001)))
        .unwrap_err();
    assert_eq!(err.kind(), ServiceErrorKind::Incorrect);
    let err = service
        .create_comment_comment(author.id, parent.id, text(""))
        .unwrap_err();
    assert_eq!(err.kind(), ServiceErrorKind::Empty);

    let reply = service
        .create_comment_comment(author.id, parent.id, text("reply"))
        .unwrap();
    let replies = service
        .get_comments_by_comment_id(parent.id, SortOrder::DateDesc)
        .unwrap();
    assert_eq!(replies.get().unwrap().count(), 1);
    assert_eq!(
        service.resolve_target(reply.target_id).unwrap(),
        poster_core::Target::Comment(parent.id)
    );

    let err = service
        .create_comment_comment(author.id, Uuid::new_v4(), text("lost"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: EntityKind::Comment,
            ..
        }
    ));
});

test_each_service!(clock_orders_comments, |service| {
    let author = service.create_user("clock@example.com", "secret").unwrap();
    let post = service.create_post(author.id, form("clock", true)).unwrap();
    for content in ["one", "two", "three"] {
        service
            .create_post_comment(author.id, post.id, text(content))
            .unwrap();
    }

    let newest: Vec<String> = service
        .get_comments_by_post_id(post.id, SortOrder::DateDesc)
        .unwrap()
        .get()
        .unwrap()
        .map(|comment| comment.unwrap().content)
        .collect();
    assert_eq!(newest, vec!["three", "two", "one"]);

    let err = service
        .get_comments_by_post_id(Uuid::new_v4(), SortOrder::DateAsc)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ServiceErrorKind::NotFound);
});

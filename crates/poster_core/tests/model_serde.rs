use poster_core::{Comment, Post, SortOrder, Target, User};
use uuid::Uuid;

#[test]
fn user_json_never_contains_password() {
    let user = User {
        id: Uuid::new_v4(),
        email: "reader@example.com".to_string(),
        password: "hunter2".to_string(),
    };

    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["email"], "reader@example.com");
    assert!(json.get("password").is_none());

    let restored: User = serde_json::from_value(json).unwrap();
    assert_eq!(restored.id, user.id);
    assert!(restored.password.is_empty());
}

#[test]
fn post_and_comment_use_snake_case_fields() {
    let post = Post {
        id: Uuid::new_v4(),
        author_id: Uuid::new_v4(),
        title: "title".to_string(),
        content: "content".to_string(),
        comments_allowed: true,
        created_at: 42,
    };
    let json = serde_json::to_value(&post).unwrap();
    assert_eq!(json["comments_allowed"], true);
    assert_eq!(json["created_at"], 42);

    let comment = Comment {
        id: Uuid::new_v4(),
        author_id: post.author_id,
        target_id: Uuid::new_v4(),
        content: "hi".to_string(),
        created_at: 43,
    };
    let json = serde_json::to_value(&comment).unwrap();
    assert_eq!(json["target_id"], comment.target_id.to_string());
}

#[test]
fn target_and_order_serialize_as_tagged_values() {
    let id = Uuid::new_v4();
    let json = serde_json::to_value(Target::Comment(id)).unwrap();
    assert_eq!(json["kind"], "comment");
    assert_eq!(json["id"], id.to_string());

    assert_eq!(
        serde_json::to_value(SortOrder::DateAsc).unwrap(),
        "date_asc"
    );
    let order: SortOrder = serde_json::from_str("\"date_desc\"").unwrap();
    assert_eq!(order, SortOrder::DateDesc);
}

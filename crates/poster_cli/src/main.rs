//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the store selected by `POSTER_*` environment variables.
//! - Seed a small thread and page through it to exercise both backends.

use log::info;
use poster_core::{
    core_version, init_logging, map, open_db, open_db_in_memory, AppConfig, BlogService,
    Collection, CommentForm, InMemoryStore, PostForm, SortOrder, SqlitePath, SqliteStore, Store,
    StoreConfig, Target,
};
use std::error::Error;
use std::process::ExitCode;

const PAGE_SIZE: usize = 2;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("poster_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir)?;
    }
    println!("poster_core version={}", core_version());

    match &config.store {
        StoreConfig::InMemory => {
            info!("event=cli_run module=cli status=start backend=inmemory");
            seed_and_print(BlogService::new(InMemoryStore::new()))
        }
        StoreConfig::Sqlite(path) => {
            info!("event=cli_run module=cli status=start backend=sqlite");
            let conn = match path {
                SqlitePath::Memory => open_db_in_memory()?,
                SqlitePath::File(file) => open_db(file)?,
            };
            seed_and_print(BlogService::new(SqliteStore::try_new(&conn)?))
        }
    }
}

fn seed_and_print<R: Store>(service: BlogService<R>) -> Result<(), Box<dyn Error>> {
    let author = service.create_user("demo@example.com", "demo-password")?;
    let post = service.create_post(
        author.id,
        PostForm {
            title: "Hello".to_string(),
            content: "First post".to_string(),
            allow_comments: true,
        },
    )?;
    let first = service.create_post_comment(
        author.id,
        post.id,
        CommentForm {
            content: "first!".to_string(),
        },
    )?;
    service.create_comment_comment(
        author.id,
        first.id,
        CommentForm {
            content: "reply to first".to_string(),
        },
    )?;
    for content in ["second", "third"] {
        service.create_post_comment(
            author.id,
            post.id,
            CommentForm {
                content: content.to_string(),
            },
        )?;
    }

    let titles = map(service.get_posts(SortOrder::DateDesc)?, |post| {
        post.map(|post| format!("{} ({})", post.title, post.id))
    });
    for title in titles.get()? {
        println!("post {}", title?);
    }

    let mut comments = service.get_comments_by_post_id(post.id, SortOrder::DateAsc)?;
    comments.limit(PAGE_SIZE);
    let mut page_number = 1;
    loop {
        let page = comments.get()?.collect::<Result<Vec<_>, _>>()?;
        let Some(last) = page.last() else {
            break;
        };
        for comment in &page {
            let parent = match service.resolve_target(comment.target_id)? {
                Target::Post(id) => format!("post {id}"),
                Target::Comment(id) => format!("comment {id}"),
            };
            println!(
                "page {page_number} comment {} on {parent}: {}",
                comment.id, comment.content
            );
        }
        comments.after(last.id)?;
        page_number += 1;
    }

    let replies = service.get_comments_by_comment_id(first.id, SortOrder::DateAsc)?;
    println!("replies to first={}", replies.get()?.count());
    Ok(())
}

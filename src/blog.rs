//! Public blog: submission, theme filtering and pagination.
//!
//! Posts are open to everyone; the author block is a denormalized snapshot
//! of whoever was logged in at submit time, or "Anonymous" when nobody was.

use chrono::Utc;
use serde::Serialize;

use crate::consts;
use crate::db::Database;
use crate::models::{BlogId, BlogPost};
use crate::utils::errors::ApiError;
use crate::utils::validation::TextInput;

/// Validated content of a new post.
pub struct BlogDraft {
    pub title: TextInput,
    pub theme: TextInput,
    pub content: TextInput,
    pub images: Vec<String>,
}

/// Display identity attached to a post at submit time.
pub struct BlogAuthor {
    pub name: String,
    pub email: String,
    pub kind: String,
}

impl BlogAuthor {
    pub fn anonymous() -> Self {
        Self {
            name: "Anonymous".to_string(),
            email: String::new(),
            kind: "Anonymous".to_string(),
        }
    }
}

/// One page of the listing, newest posts first.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPage<'db> {
    pub posts: Vec<&'db BlogPost>,
    pub page: usize,
    pub total_pages: usize,
    pub theme: Option<String>,
}

pub fn submit(db: &mut Database, draft: BlogDraft, author: BlogAuthor) -> BlogId {
    let post = BlogPost {
        id: BlogId::new(),
        title: draft.title.as_str().to_string(),
        theme: draft.theme.as_str().to_string(),
        content: draft.content.as_str().to_string(),
        author_name: author.name,
        author_email: author.email,
        author_type: author.kind,
        images: draft.images,
        created_at: Utc::now(),
    };
    let id = post.id;
    db.blogs.insert(id, post);
    id
}

/// Lists one page of posts, optionally restricted to a theme. Pages are
/// 1-based; out-of-range pages clamp to the last one.
pub fn list<'db>(db: &'db Database, theme: Option<&str>, page: usize) -> BlogPage<'db> {
    let mut posts: Vec<&BlogPost> = db
        .blogs
        .values()
        .filter(|p| theme.map_or(true, |t| p.theme.eq_ignore_ascii_case(t)))
        .collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total_pages = posts.len().div_ceil(consts::BLOGS_PER_PAGE).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * consts::BLOGS_PER_PAGE;
    let posts = posts
        .into_iter()
        .skip(start)
        .take(consts::BLOGS_PER_PAGE)
        .collect();

    BlogPage {
        posts,
        page,
        total_pages,
        theme: theme.map(str::to_string),
    }
}

pub fn get(db: &Database, id: BlogId) -> Result<&BlogPost, ApiError> {
    db.blogs
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Blog post not found".to_string()))
}

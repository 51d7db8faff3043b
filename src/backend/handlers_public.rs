//! Public routes: landing page, blog, chat and logout.
//!
//! Chat is nominally public routing-wise but requires a patient or doctor
//! session; the blog accepts anonymous submissions.

use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::{Path, Query};
use axum::response::{Html, Redirect};
use axum::{Extension, Json};
use handlebars::Handlebars;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::backend::middlewares::{Authed, MaybeAuthed};
use crate::backend::models::{BlogListQuery, BlogSubmitRequest, ChatSendRequest};
use crate::blog::{self, BlogAuthor, BlogDraft};
use crate::models::{AppointmentId, BlogId, ChatSender, Role};
use crate::utils::errors::ApiError;
use crate::utils::validation::TextInput;
use crate::{appointments, db};

/// Renders a registered template, surfacing render failures as internal
/// errors instead of half-rendered pages.
pub(crate) fn render(
    hbs: &Handlebars<'_>,
    name: &str,
    data: &Value,
) -> Result<Html<String>, ApiError> {
    hbs.render(name, data)
        .map(Html)
        .map_err(|e| ApiError::Internal(anyhow!("Failed to render template {name}: {e}")))
}

fn invalid(e: anyhow::Error) -> ApiError {
    ApiError::Validation(e.to_string())
}

pub async fn index(
    Extension(hbs): Extension<Arc<Handlebars<'static>>>,
    MaybeAuthed(principal): MaybeAuthed,
) -> Result<Html<String>, ApiError> {
    render(
        &hbs,
        "index",
        &json!({
            "loggedIn": principal.is_some(),
            "role": principal.map(|p| p.role.as_str()),
        }),
    )
}

/// Logs out by wiping the session state. Safe to call when not logged in.
pub async fn logout(session: Session) -> Redirect {
    session.clear();
    Redirect::to("/")
}

pub async fn blog_page(
    Extension(hbs): Extension<Arc<Handlebars<'static>>>,
    Query(query): Query<BlogListQuery>,
) -> Result<Html<String>, ApiError> {
    let db = db::read()?;
    let page = blog::list(&db, query.theme.as_deref(), query.page.unwrap_or(1));
    let data = serde_json::to_value(&page).map_err(anyhow::Error::from)?;
    render(&hbs, "blog", &data)
}

/// The blog submission form.
pub async fn blog_post_page(
    Extension(hbs): Extension<Arc<Handlebars<'static>>>,
    MaybeAuthed(principal): MaybeAuthed,
) -> Result<Html<String>, ApiError> {
    render(
        &hbs,
        "post",
        &json!({ "loggedIn": principal.is_some() }),
    )
}

pub async fn blog_submit(
    MaybeAuthed(principal): MaybeAuthed,
    Json(req): Json<BlogSubmitRequest>,
) -> Result<Json<Value>, ApiError> {
    let draft = BlogDraft {
        title: TextInput::new_short_form(&req.title).map_err(invalid)?,
        theme: TextInput::new_short_form(&req.theme).map_err(invalid)?,
        content: TextInput::new_long_form(&req.content).map_err(invalid)?,
        images: req.images,
    };

    let mut db = db::write()?;

    // A stale session falls back to anonymous authorship rather than
    // blocking the submission.
    let author = principal
        .and_then(|p| {
            db.account(p.role, p.id).map(|account| BlogAuthor {
                name: account.name.clone(),
                email: account.email.clone(),
                kind: p.role.as_str().to_string(),
            })
        })
        .unwrap_or_else(BlogAuthor::anonymous);

    let id = blog::submit(&mut db, draft, author);
    db::save(&db)?;
    Ok(Json(json!({ "message": "Blog post published", "id": id.to_string() })))
}

pub async fn blog_view(
    Extension(hbs): Extension<Arc<Handlebars<'static>>>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let id = BlogId::parse(&id)
        .ok_or_else(|| ApiError::Validation(format!("Invalid blog id: {id}")))?;

    let db = db::read()?;
    let post = blog::get(&db, id)?;
    let data = json!({ "post": post });
    render(&hbs, "single-blog", &data)
}

fn chat_sender(role: Role) -> Result<ChatSender, ApiError> {
    match role {
        Role::Patient => Ok(ChatSender::Patient),
        Role::Doctor => Ok(ChatSender::Doctor),
        _ => Err(ApiError::Forbidden(
            "Chat is only available to patients and doctors".to_string(),
        )),
    }
}

pub async fn chat_send(
    Authed(principal): Authed,
    Json(req): Json<ChatSendRequest>,
) -> Result<Json<Value>, ApiError> {
    let sender = chat_sender(principal.role)?;
    let appointment_id = AppointmentId::parse(&req.appointment_id).ok_or_else(|| {
        ApiError::Validation(format!("Invalid appointment id: {}", req.appointment_id))
    })?;
    let message = TextInput::new_long_form(&req.message).map_err(invalid)?;

    let mut db = db::write()?;
    let id = appointments::send_chat(&mut db, sender, principal.id, appointment_id, message)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Message sent", "id": id.to_string() })))
}

pub async fn chat_history(
    Authed(principal): Authed,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let viewer = chat_sender(principal.role)?;
    let appointment_id = AppointmentId::parse(&appointment_id).ok_or_else(|| {
        ApiError::Validation(format!("Invalid appointment id: {appointment_id}"))
    })?;

    let db = db::read()?;
    let messages = appointments::chat_history(&db, viewer, principal.id, appointment_id)?;
    Ok(Json(serde_json::to_value(messages).map_err(anyhow::Error::from)?))
}

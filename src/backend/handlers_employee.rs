//! Employee routes: the doctor approval queue.

use axum::extract::Path;
use axum::Json;
use serde_json::{json, Value};

use crate::backend::middlewares::Authed;
use crate::backend::models::DoctorView;
use crate::models::{Role, UserId};
use crate::utils::errors::ApiError;
use crate::{db, identity};

/// Doctors still waiting for approval, oldest signup first.
pub async fn doctor_requests(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    principal.require(Role::Employee)?;
    let db = db::read()?;

    let mut pending: Vec<&crate::models::Doctor> = db
        .doctors
        .values()
        .filter(|d| !d.is_approved)
        .collect();
    pending.sort_by_key(|d| d.account.created_at);

    let views: Vec<DoctorView> = pending.into_iter().map(DoctorView::new).collect();
    Ok(Json(serde_json::to_value(views).map_err(anyhow::Error::from)?))
}

pub async fn doctor_requests_count(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    principal.require(Role::Employee)?;
    let db = db::read()?;
    let count = db.doctors.values().filter(|d| !d.is_approved).count();
    Ok(Json(json!({ "count": count })))
}

pub async fn approve_doctor(
    Authed(principal): Authed,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    principal.require(Role::Employee)?;
    let id = UserId::parse(&id)
        .ok_or_else(|| ApiError::Validation(format!("Invalid doctor id: {id}")))?;

    let mut db = db::write()?;
    identity::approve_doctor(&mut db, id)?;
    let ssn = db.doctors.get(&id).and_then(|d| d.ssn.clone());
    db::save(&db)?;
    Ok(Json(json!({ "message": "Doctor approved", "ssn": ssn })))
}

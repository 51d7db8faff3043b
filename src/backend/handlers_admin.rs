//! Admin routes: user administration and platform-wide reporting.

use axum::extract::{Path, Query};
use axum::Json;
use serde_json::{json, Value};

use crate::backend::middlewares::Authed;
use crate::backend::models::{
    parse_date, AccountView, AppointmentRangeQuery, DoctorView, SigninRow,
};
use crate::consts;
use crate::models::{Appointment, Role, UserId};
use crate::utils::errors::ApiError;
use crate::{db, earnings, identity};

fn supplier_view(supplier: &crate::models::Supplier) -> Result<Value, ApiError> {
    let mut view = serde_json::to_value(AccountView::new(Role::Supplier, &supplier.account))
        .map_err(anyhow::Error::from)?;
    view["supplierId"] = json!(supplier.supplier_code);
    Ok(view)
}

/// Every account on the platform, grouped by role, excluding the admin
/// making the request.
pub async fn list_users(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let me = principal.require(Role::Admin)?;
    let db = db::read()?;

    let patients: Vec<AccountView> = db
        .patients
        .values()
        .map(|a| AccountView::new(Role::Patient, a))
        .collect();
    let doctors: Vec<DoctorView> = db.doctors.values().map(DoctorView::new).collect();
    let admins: Vec<AccountView> = db
        .admins
        .values()
        .filter(|a| a.id != me)
        .map(|a| AccountView::new(Role::Admin, a))
        .collect();
    let employees: Vec<AccountView> = db
        .employees
        .values()
        .map(|a| AccountView::new(Role::Employee, a))
        .collect();
    let suppliers: Vec<Value> = db
        .suppliers
        .values()
        .map(supplier_view)
        .collect::<Result<_, _>>()?;

    Ok(Json(json!({
        "patients": patients,
        "doctors": doctors,
        "admins": admins,
        "employees": employees,
        "suppliers": suppliers,
    })))
}

pub async fn delete_user(
    Authed(principal): Authed,
    Path((user_type, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let me = principal.require(Role::Admin)?;
    let role: Role = user_type.parse()?;
    let id = UserId::parse(&id)
        .ok_or_else(|| ApiError::Validation(format!("Invalid user id: {id}")))?;

    let mut db = db::write()?;
    identity::delete_principal(&mut db, role, id, me)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": format!("{role} deleted") })))
}

/// All appointments, optionally restricted to a date range (inclusive on
/// both ends).
pub async fn api_appointments(
    Authed(principal): Authed,
    Query(range): Query<AppointmentRangeQuery>,
) -> Result<Json<Value>, ApiError> {
    principal.require(Role::Admin)?;

    let start = range.start_date.as_deref().map(parse_date).transpose()?;
    let end = range.end_date.as_deref().map(parse_date).transpose()?;

    let db = db::read()?;
    let mut matching: Vec<&Appointment> = db
        .appointments
        .values()
        .filter(|a| start.map_or(true, |s| a.date >= s))
        .filter(|a| end.map_or(true, |e| a.date <= e))
        .collect();
    matching.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));

    Ok(Json(serde_json::to_value(matching).map_err(anyhow::Error::from)?))
}

pub async fn api_earnings(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    principal.require(Role::Admin)?;
    let db = db::read()?;
    let report = earnings::earnings_report(db.appointments.values());
    Ok(Json(serde_json::to_value(report).map_err(anyhow::Error::from)?))
}

/// Most recent sign-ins across all roles, newest first, capped.
pub async fn api_signins(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    principal.require(Role::Admin)?;
    let db = db::read()?;

    let mut rows: Vec<SigninRow> = db
        .all_accounts()
        .filter_map(|(role, account)| {
            account.last_login.map(|last_login| SigninRow {
                user_type: role,
                name: account.name.clone(),
                email: account.email.clone(),
                last_login,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.last_login.cmp(&a.last_login));
    rows.truncate(consts::MAX_SIGNIN_ROWS);

    Ok(Json(serde_json::to_value(rows).map_err(anyhow::Error::from)?))
}

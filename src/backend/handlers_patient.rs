//! Patient routes: booking, own appointments and prescriptions, and the
//! medicine store.

use axum::extract::Path;
use axum::Json;
use serde_json::{json, Value};

use crate::backend::middlewares::Authed;
use crate::backend::models::{parse_date, BookAppointmentRequest, DoctorView, PlaceOrderRequest};
use crate::models::{Appointment, MedicineId, Role, UserId};
use crate::utils::errors::ApiError;
use crate::utils::validation::TextInput;
use crate::{appointments, db, pharmacy, prescriptions};

fn invalid(e: anyhow::Error) -> ApiError {
    ApiError::Validation(e.to_string())
}

fn parse_appointment_id(raw: &str) -> Result<crate::models::AppointmentId, ApiError> {
    crate::models::AppointmentId::parse(raw)
        .ok_or_else(|| ApiError::Validation(format!("Invalid appointment id: {raw}")))
}

pub async fn book_appointment(
    Authed(principal): Authed,
    Json(req): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, ApiError> {
    let patient = principal.require(Role::Patient)?;
    let doctor = UserId::parse(&req.doctor_id)
        .ok_or_else(|| ApiError::Validation(format!("Invalid doctor id: {}", req.doctor_id)))?;
    let date = parse_date(&req.date)?;
    let time = TextInput::new_short_form(&req.time).map_err(invalid)?;

    let mut db = db::write()?;
    let id = appointments::book(
        &mut db,
        patient,
        doctor,
        date,
        time.as_str().to_string(),
        req.kind,
    )?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Appointment booked", "id": id.to_string() })))
}

/// Doctors available for booking: approved ones only.
pub async fn available_doctors(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    principal.require(Role::Patient)?;
    let db = db::read()?;

    let mut approved: Vec<DoctorView> = db
        .doctors
        .values()
        .filter(|d| d.is_approved)
        .map(DoctorView::new)
        .collect();
    approved.sort_by(|a, b| a.account.name.cmp(&b.account.name));
    Ok(Json(serde_json::to_value(approved).map_err(anyhow::Error::from)?))
}

pub async fn my_appointments(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let patient = principal.require(Role::Patient)?;
    let db = db::read()?;

    let mut mine: Vec<&Appointment> = db
        .appointments
        .values()
        .filter(|a| a.patient_id == Some(patient))
        .collect();
    mine.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
    Ok(Json(serde_json::to_value(mine).map_err(anyhow::Error::from)?))
}

pub async fn cancel_appointment(
    Authed(principal): Authed,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let patient = principal.require(Role::Patient)?;
    let id = parse_appointment_id(&id)?;

    let mut db = db::write()?;
    appointments::cancel(&mut db, Role::Patient, patient, id)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Appointment cancelled" })))
}

pub async fn my_prescriptions(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let patient = principal.require(Role::Patient)?;
    let db = db::read()?;
    let mine = prescriptions::for_patient(&db, patient);
    Ok(Json(serde_json::to_value(mine).map_err(anyhow::Error::from)?))
}

/// The store catalog: every in-stock medicine across all suppliers.
pub async fn store_medicines(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    principal.require(Role::Patient)?;
    let db = db::read()?;
    let available = pharmacy::available_medicines(&db);
    Ok(Json(serde_json::to_value(available).map_err(anyhow::Error::from)?))
}

pub async fn place_order(
    Authed(principal): Authed,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<Value>, ApiError> {
    let patient = principal.require(Role::Patient)?;
    let medicine = MedicineId::parse(&req.medicine_id)
        .ok_or_else(|| ApiError::Validation(format!("Invalid medicine id: {}", req.medicine_id)))?;

    let mut db = db::write()?;
    let id = pharmacy::place_order(&mut db, patient, medicine, req.quantity)?;
    let total_cost = db.orders.get(&id).map(|o| o.total_cost);
    db::save(&db)?;
    Ok(Json(json!({
        "message": "Order placed",
        "id": id.to_string(),
        "totalCost": total_cost,
    })))
}

pub async fn my_orders(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let patient = principal.require(Role::Patient)?;
    let db = db::read()?;
    let mine = pharmacy::orders_for_patient(&db, patient);
    Ok(Json(serde_json::to_value(mine).map_err(anyhow::Error::from)?))
}

//! Doctor routes: appointment management, slot blocking, prescriptions and
//! the doctor's own earnings view.

use axum::extract::Path;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::backend::middlewares::Authed;
use crate::backend::models::{parse_date, BlockSlotRequest, OnlineStatusRequest, PrescriptionRequest};
use crate::models::{Appointment, AppointmentId, ChatSender, PrescriptionId, Role};
use crate::prescriptions::PrescriptionDraft;
use crate::utils::errors::ApiError;
use crate::utils::validation::TextInput;
use crate::{appointments, db, earnings, identity, prescriptions};

fn invalid(e: anyhow::Error) -> ApiError {
    ApiError::Validation(e.to_string())
}

fn parse_appointment_id(raw: &str) -> Result<AppointmentId, ApiError> {
    AppointmentId::parse(raw)
        .ok_or_else(|| ApiError::Validation(format!("Invalid appointment id: {raw}")))
}

fn parse_prescription_id(raw: &str) -> Result<PrescriptionId, ApiError> {
    PrescriptionId::parse(raw)
        .ok_or_else(|| ApiError::Validation(format!("Invalid prescription id: {raw}")))
}

fn own_appointments(db: &db::Database, doctor: crate::models::UserId) -> Vec<&Appointment> {
    let mut mine: Vec<&Appointment> = db
        .appointments
        .values()
        .filter(|a| a.doctor_id == doctor)
        .collect();
    mine.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
    mine
}

pub async fn all_appointments(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let db = db::read()?;
    let mine = own_appointments(&db, doctor);
    Ok(Json(serde_json::to_value(mine).map_err(anyhow::Error::from)?))
}

pub async fn upcoming_appointments(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let today = Utc::now().date_naive();
    let db = db::read()?;

    let upcoming: Vec<&Appointment> = own_appointments(&db, doctor)
        .into_iter()
        .filter(|a| a.date >= today && !a.status.is_terminal())
        .collect();
    Ok(Json(serde_json::to_value(upcoming).map_err(anyhow::Error::from)?))
}

pub async fn previous_appointments(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let today = Utc::now().date_naive();
    let db = db::read()?;

    let previous: Vec<&Appointment> = own_appointments(&db, doctor)
        .into_iter()
        .filter(|a| a.date < today || a.status.is_terminal())
        .collect();
    Ok(Json(serde_json::to_value(previous).map_err(anyhow::Error::from)?))
}

pub async fn confirm_appointment(
    Authed(principal): Authed,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let id = parse_appointment_id(&id)?;

    let mut db = db::write()?;
    appointments::confirm(&mut db, doctor, id)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Appointment confirmed" })))
}

pub async fn complete_appointment(
    Authed(principal): Authed,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let id = parse_appointment_id(&id)?;

    let mut db = db::write()?;
    appointments::complete(&mut db, doctor, id)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Appointment completed" })))
}

pub async fn cancel_appointment(
    Authed(principal): Authed,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let id = parse_appointment_id(&id)?;

    let mut db = db::write()?;
    appointments::cancel(&mut db, Role::Doctor, doctor, id)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Appointment cancelled" })))
}

pub async fn block_slot(
    Authed(principal): Authed,
    Json(req): Json<BlockSlotRequest>,
) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let date = parse_date(&req.date)?;
    let time = TextInput::new_short_form(&req.time).map_err(invalid)?;

    let mut db = db::write()?;
    let id = appointments::block_slot(&mut db, doctor, date, time.as_str().to_string())?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Slot blocked", "id": id.to_string() })))
}

/// Presence flag shown to patients next to the doctor listing.
pub async fn set_online_status(
    Authed(principal): Authed,
    Json(req): Json<OnlineStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;

    let mut db = db::write()?;
    identity::set_online_status(&mut db, doctor, req.status)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Status updated" })))
}

/// Earnings over this doctor's own appointments only.
pub async fn daily_earnings(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let db = db::read()?;

    let report = earnings::earnings_report(
        db.appointments.values().filter(|a| a.doctor_id == doctor),
    );
    Ok(Json(serde_json::to_value(report).map_err(anyhow::Error::from)?))
}

fn draft_of(req: &PrescriptionRequest) -> Result<PrescriptionDraft, ApiError> {
    Ok(PrescriptionDraft {
        patient_name: TextInput::new_short_form(&req.patient_name).map_err(invalid)?,
        age: req.age,
        gender: req.gender,
        weight: req.weight,
        symptoms: TextInput::new_long_form(&req.symptoms).map_err(invalid)?,
        medicines: req.medicines.clone(),
        additional_notes: req
            .additional_notes
            .as_deref()
            .map(TextInput::new_long_form)
            .transpose()
            .map_err(invalid)?,
    })
}

pub async fn create_prescription(
    Authed(principal): Authed,
    Json(req): Json<PrescriptionRequest>,
) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let appointment_id = req.appointment_id.as_deref().ok_or_else(|| {
        ApiError::Validation("Appointment id is required".to_string())
    })?;
    let appointment_id = parse_appointment_id(appointment_id)?;
    let draft = draft_of(&req)?;

    let mut db = db::write()?;
    let id = prescriptions::create(&mut db, doctor, appointment_id, draft)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Prescription created", "id": id.to_string() })))
}

pub async fn list_prescriptions(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let db = db::read()?;
    let mine = prescriptions::for_doctor(&db, doctor);
    Ok(Json(serde_json::to_value(mine).map_err(anyhow::Error::from)?))
}

pub async fn get_prescription(
    Authed(principal): Authed,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let id = parse_prescription_id(&id)?;

    let db = db::read()?;
    let prescription = prescriptions::get(&db, ChatSender::Doctor, doctor, id)?;
    Ok(Json(serde_json::to_value(prescription).map_err(anyhow::Error::from)?))
}

pub async fn update_prescription(
    Authed(principal): Authed,
    Path(id): Path<String>,
    Json(req): Json<PrescriptionRequest>,
) -> Result<Json<Value>, ApiError> {
    let doctor = principal.require(Role::Doctor)?;
    let id = parse_prescription_id(&id)?;
    let draft = draft_of(&req)?;

    let mut db = db::write()?;
    prescriptions::update(&mut db, doctor, id, draft)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Prescription updated" })))
}

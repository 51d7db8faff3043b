//! Request and response shapes for the JSON API.
//!
//! Requests arrive as raw strings and are validated into the input newtypes
//! inside the handlers; responses never expose password hashes, so accounts
//! go out through the view structs below instead of the storage models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Account, AppointmentKind, Doctor, Gender, OnlineStatus, PrescribedMedicine, Role,
};

fn default_consultation_fee() -> f64 {
    100.0
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSignupFields {
    pub registration_number: String,
    pub specialization: String,
    pub college: String,
    pub year_of_passing: String,
    pub location: String,
    #[serde(default = "default_consultation_fee")]
    pub consultation_fee: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub password: String,
    /// Required for admin, employee and supplier signups.
    #[serde(default)]
    pub security_code: Option<String>,
    /// Required for supplier signups.
    #[serde(default)]
    pub supplier_id: Option<String>,
    /// Required for doctor signups.
    #[serde(default)]
    pub doctor: Option<DoctorSignupFields>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub security_code: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    /// Suppliers may change their business id together with the profile.
    #[serde(default)]
    pub supplier_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub doctor_id: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    pub time: String,
    pub kind: AppointmentKind,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSlotRequest {
    pub date: String,
    pub time: String,
}

#[derive(Deserialize)]
pub struct OnlineStatusRequest {
    pub status: OnlineStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRangeQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRequest {
    /// Only used on create; updates keep the original linkage.
    #[serde(default)]
    pub appointment_id: Option<String>,
    pub patient_name: String,
    pub age: u32,
    pub gender: Gender,
    pub weight: f64,
    pub symptoms: String,
    pub medicines: Vec<PrescribedMedicine>,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMedicineRequest {
    pub medicine_id: String,
    pub name: String,
    pub quantity: u32,
    pub cost: f64,
    pub manufacturer: String,
    /// ISO date, `YYYY-MM-DD`.
    pub expiry_date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub medicine_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendRequest {
    pub appointment_id: String,
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSubmitRequest {
    pub title: String,
    pub theme: String,
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Deserialize)]
pub struct BlogListQuery {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

/// Public view of an account, password hash excluded.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub user_type: Role,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AccountView {
    pub fn new(role: Role, account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            user_type: role,
            name: account.name.clone(),
            email: account.email.clone(),
            mobile: account.mobile.clone(),
            address: account.address.clone(),
            last_login: account.last_login,
            created_at: account.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorView {
    #[serde(flatten)]
    pub account: AccountView,
    pub is_approved: bool,
    pub ssn: Option<String>,
    pub registration_number: String,
    pub specialization: String,
    pub college: String,
    pub year_of_passing: String,
    pub location: String,
    pub online_status: OnlineStatus,
    pub consultation_fee: f64,
}

impl DoctorView {
    pub fn new(doctor: &Doctor) -> Self {
        Self {
            account: AccountView::new(Role::Doctor, &doctor.account),
            is_approved: doctor.is_approved,
            ssn: doctor.ssn.clone(),
            registration_number: doctor.registration_number.clone(),
            specialization: doctor.specialization.clone(),
            college: doctor.college.clone(),
            year_of_passing: doctor.year_of_passing.clone(),
            location: doctor.location.clone(),
            online_status: doctor.online_status,
            consultation_fee: doctor.consultation_fee,
        }
    }
}

/// One row of the admin sign-in report.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRow {
    pub user_type: Role,
    pub name: String,
    pub email: String,
    pub last_login: DateTime<Utc>,
}

/// Parses an ISO `YYYY-MM-DD` request date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, crate::utils::errors::ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        crate::utils::errors::ApiError::Validation(format!("Invalid date: {raw}"))
    })
}

//! Data model: principals, appointments, prescriptions, pharmacy and blog
//! records shared by the whole application.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::password::PwHash;

/// The five kinds of principals the platform knows about.
///
/// Dispatch on this enum replaces any stringly-typed collection lookup:
/// unknown tags are rejected at the boundary when parsing.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Patient,
    Doctor,
    Admin,
    Employee,
    Supplier,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Patient,
        Role::Doctor,
        Role::Admin,
        Role::Employee,
        Role::Supplier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
            Role::Admin => "Admin",
            Role::Employee => "Employee",
            Role::Supplier => "Supplier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown user type: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            "supplier" => Ok(Role::Supplier),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord,
        )]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn parse(s: &str) -> Option<Self> {
                Uuid::parse_str(s).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Unique identifier of a principal, generated at signup and immutable.
    UserId
);
id_type!(AppointmentId);
id_type!(PrescriptionId);
id_type!(ChatMessageId);
id_type!(MedicineId);
id_type!(OrderId);
id_type!(BlogId);

/// Fields common to every principal variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub password: PwHash,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, email: String, mobile: String, address: String, password: PwHash) -> Self {
        Self {
            id: UserId::new(),
            name,
            email,
            mobile,
            address,
            password,
            last_login: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    Online,
    Offline,
}

/// A doctor record. Starts unapproved: invisible for booking until an
/// employee approves it and assigns an SSN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub account: Account,
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub account: Account,
    /// Business identifier chosen at signup, unique among suppliers.
    pub supplier_code: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Blocked,
}

impl AppointmentStatus {
    /// Completed and cancelled appointments cannot move anymore; blocked
    /// slots are not part of the booking lifecycle at all.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::Blocked
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentKind {
    Online,
    Offline,
}

/// A booked consultation slot, or a doctor-blocked slot when
/// `is_blocked_slot` is set (no patient, no fee).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: Option<UserId>,
    pub doctor_id: UserId,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub kind: Option<AppointmentKind>,
    pub consultation_fee: f64,
    pub is_blocked_slot: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedMedicine {
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// A prescription issued by the attending doctor of a confirmed
/// appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: PrescriptionId,
    pub appointment_id: AppointmentId,
    pub doctor_id: UserId,
    pub patient_id: UserId,
    pub patient_name: String,
    pub age: u32,
    pub gender: Gender,
    pub weight: f64,
    pub symptoms: String,
    pub medicines: Vec<PrescribedMedicine>,
    pub additional_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    Patient,
    Doctor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub appointment_id: AppointmentId,
    pub sender_id: UserId,
    pub sender: ChatSender,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    /// Catalog identifier chosen by the supplier, unique platform-wide.
    pub medicine_code: String,
    pub name: String,
    pub quantity: u32,
    pub cost: f64,
    pub manufacturer: String,
    pub expiry_date: NaiveDate,
    pub supplier_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub medicine_id: MedicineId,
    pub patient_id: UserId,
    pub supplier_id: UserId,
    pub quantity: u32,
    pub total_cost: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Blog posts are not subject to the identity invariants; the author info
/// is a denormalized snapshot of whoever was logged in at submit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: BlogId,
    pub title: String,
    pub theme: String,
    pub content: String,
    pub author_name: String,
    pub author_email: String,
    pub author_type: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

//! In-memory data store with YAML snapshot persistence.
//!
//! One collection per entity, all behind a single process-wide lock. The
//! identity collections are kept separate per principal variant; the global
//! uniqueness scan in [`crate::identity`] fans out across all five through
//! [`Database::all_accounts`].

use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::models::{
    Account, Appointment, AppointmentId, BlogId, BlogPost, ChatMessage, Doctor, Medicine,
    MedicineId, Order, OrderId, Prescription, PrescriptionId, Role, Supplier, UserId,
};
use crate::utils::errors::ApiError;

#[derive(Default, Serialize, Deserialize)]
pub struct Database {
    pub patients: HashMap<UserId, Account>,
    pub doctors: HashMap<UserId, Doctor>,
    pub admins: HashMap<UserId, Account>,
    pub employees: HashMap<UserId, Account>,
    pub suppliers: HashMap<UserId, Supplier>,
    pub appointments: HashMap<AppointmentId, Appointment>,
    pub prescriptions: HashMap<PrescriptionId, Prescription>,
    pub chats: Vec<ChatMessage>,
    pub medicines: HashMap<MedicineId, Medicine>,
    pub orders: HashMap<OrderId, Order>,
    pub blogs: HashMap<BlogId, BlogPost>,
}

impl Database {
    /// Looks up the common account data of a principal in its variant's
    /// collection.
    pub fn account(&self, role: Role, id: UserId) -> Option<&Account> {
        match role {
            Role::Patient => self.patients.get(&id),
            Role::Doctor => self.doctors.get(&id).map(|d| &d.account),
            Role::Admin => self.admins.get(&id),
            Role::Employee => self.employees.get(&id),
            Role::Supplier => self.suppliers.get(&id).map(|s| &s.account),
        }
    }

    pub fn account_mut(&mut self, role: Role, id: UserId) -> Option<&mut Account> {
        match role {
            Role::Patient => self.patients.get_mut(&id),
            Role::Doctor => self.doctors.get_mut(&id).map(|d| &mut d.account),
            Role::Admin => self.admins.get_mut(&id),
            Role::Employee => self.employees.get_mut(&id),
            Role::Supplier => self.suppliers.get_mut(&id).map(|s| &mut s.account),
        }
    }

    /// Iterates over every principal of every variant, tagged with its role.
    /// This is the single fan-out point for all cross-collection scans.
    pub fn all_accounts(&self) -> impl Iterator<Item = (Role, &Account)> {
        self.patients
            .values()
            .map(|a| (Role::Patient, a))
            .chain(self.doctors.values().map(|d| (Role::Doctor, &d.account)))
            .chain(self.admins.values().map(|a| (Role::Admin, a)))
            .chain(self.employees.values().map(|a| (Role::Employee, a)))
            .chain(self.suppliers.values().map(|s| (Role::Supplier, &s.account)))
    }

    /// Global email uniqueness scan over all five variant collections.
    /// `exclude` skips the record being updated so a self-update to an
    /// unchanged address does not conflict with itself.
    pub fn email_in_use(&self, email: &str, exclude: Option<UserId>) -> bool {
        self.all_accounts()
            .any(|(_, a)| a.email == email && Some(a.id) != exclude)
    }

    /// Same scan for mobile numbers.
    pub fn mobile_in_use(&self, mobile: &str, exclude: Option<UserId>) -> bool {
        self.all_accounts()
            .any(|(_, a)| a.mobile == mobile && Some(a.id) != exclude)
    }

    pub fn find_by_email(&self, role: Role, email: &str) -> Option<&Account> {
        match role {
            Role::Patient => self.patients.values().find(|a| a.email == email),
            Role::Doctor => self
                .doctors
                .values()
                .map(|d| &d.account)
                .find(|a| a.email == email),
            Role::Admin => self.admins.values().find(|a| a.email == email),
            Role::Employee => self.employees.values().find(|a| a.email == email),
            Role::Supplier => self
                .suppliers
                .values()
                .map(|s| &s.account)
                .find(|a| a.email == email),
        }
    }

    pub fn remove_account(&mut self, role: Role, id: UserId) -> bool {
        match role {
            Role::Patient => self.patients.remove(&id).is_some(),
            Role::Doctor => self.doctors.remove(&id).is_some(),
            Role::Admin => self.admins.remove(&id).is_some(),
            Role::Employee => self.employees.remove(&id).is_some(),
            Role::Supplier => self.suppliers.remove(&id).is_some(),
        }
    }

    /// Cascade helper: drops every appointment referencing the given
    /// principal, as patient or as doctor.
    pub fn remove_appointments_for(&mut self, user: UserId) {
        self.appointments
            .retain(|_, a| a.doctor_id != user && a.patient_id != Some(user));
    }

    /// Chat history of one appointment, oldest first.
    pub fn chat_messages(&self, appointment: AppointmentId) -> Vec<&ChatMessage> {
        let mut messages: Vec<&ChatMessage> = self
            .chats
            .iter()
            .filter(|m| m.appointment_id == appointment)
            .collect();
        messages.sort_by_key(|m| m.sent_at);
        messages
    }
}

static STORE: Lazy<RwLock<Database>> = Lazy::new(Default::default);

pub fn read() -> Result<RwLockReadGuard<'static, Database>, ApiError> {
    STORE
        .read()
        .map_err(|_| ApiError::Internal(anyhow!("store lock poisoned")))
}

pub fn write() -> Result<RwLockWriteGuard<'static, Database>, ApiError> {
    STORE
        .write()
        .map_err(|_| ApiError::Internal(anyhow!("store lock poisoned")))
}

/// Persists a snapshot of the store. Called after each mutation and on
/// shutdown.
pub fn save(db: &Database) -> Result<()> {
    let path = Path::new(consts::STORE_DB_PATH);

    if let Some(parent_dir) = path.parent() {
        if !parent_dir.exists() {
            create_dir_all(parent_dir).or(Err(anyhow!("Failed to create data directory")))?;
        }
    }

    let file = File::create(path)?;
    serde_yaml::to_writer(file, db).or(Err(anyhow!("Failed to serialize store")))?;
    Ok(())
}

/// Loads the snapshot from disk, leaving the store empty when none exists.
pub fn load() -> Result<()> {
    if let Ok(file) = File::open(consts::STORE_DB_PATH) {
        let loaded: Database = serde_yaml::from_reader(file).unwrap_or_default();
        let mut db = STORE.write().or(Err(anyhow!("store lock poisoned")))?;
        *db = loaded;
    }
    Ok(())
}

//! Identity store: principal lifecycle and the invariants around it.
//!
//! All signup, login, profile-update and deletion paths go through this
//! module so that the two global invariants hold everywhere:
//!
//! - emails and mobile numbers are unique across ALL five principal
//!   collections combined, not just within one collection;
//! - staff roles (admin, employee, supplier) are gated by a shared-secret
//!   security code, checked before anything else.

use chrono::Utc;
use log::info;
use rand::Rng;

use crate::consts;
use crate::db::Database;
use crate::models::{Account, Doctor, OnlineStatus, Role, Supplier, UserId};
use crate::utils::errors::ApiError;
use crate::utils::password;
use crate::utils::validation::{EmailInput, MobileInput, TextInput};

/// Validated common fields for a new principal of any variant.
pub struct NewAccount {
    pub name: TextInput,
    pub email: EmailInput,
    pub mobile: MobileInput,
    pub address: TextInput,
    pub password: String,
}

impl NewAccount {
    fn into_account(self) -> Account {
        Account::new(
            self.name.as_str().to_string(),
            self.email.as_str().to_string(),
            self.mobile.as_str().to_string(),
            self.address.as_str().to_string(),
            password::hash(&self.password),
        )
    }
}

/// Doctor-specific signup fields.
pub struct DoctorDetails {
    pub registration_number: TextInput,
    pub specialization: TextInput,
    pub college: TextInput,
    pub year_of_passing: TextInput,
    pub location: TextInput,
    pub consultation_fee: f64,
}

/// Validated common fields for a profile update.
pub struct ProfileUpdate {
    pub name: TextInput,
    pub email: EmailInput,
    pub mobile: MobileInput,
    pub address: TextInput,
}

/// Checks the shared-secret code for the staff roles. Runs before any
/// uniqueness or credential check so a wrong code reveals nothing about
/// registered accounts. Patient and doctor logins carry no code.
pub fn check_security_code(role: Role, provided: Option<&str>) -> Result<(), ApiError> {
    let expected = match role {
        Role::Admin => Some(consts::ADMIN_SECURITY_CODE.as_str()),
        Role::Employee => Some(consts::EMPLOYEE_SECURITY_CODE.as_str()),
        Role::Supplier => Some(consts::SUPPLIER_SECURITY_CODE.as_str()),
        Role::Patient | Role::Doctor => None,
    };

    match expected {
        Some(code) if provided != Some(code) => Err(ApiError::InvalidSecurityCode),
        _ => Ok(()),
    }
}

/// One logical uniqueness check spanning all five collections.
fn check_identity_free(
    db: &Database,
    email: &str,
    mobile: &str,
    exclude: Option<UserId>,
) -> Result<(), ApiError> {
    if db.email_in_use(email, exclude) {
        return Err(ApiError::DuplicateEmail);
    }
    if db.mobile_in_use(mobile, exclude) {
        return Err(ApiError::DuplicateMobile);
    }
    Ok(())
}

/// Registers a new patient.
pub fn signup_patient(db: &mut Database, new: NewAccount) -> Result<UserId, ApiError> {
    check_identity_free(db, new.email.as_str(), new.mobile.as_str(), None)?;

    let account = new.into_account();
    let id = account.id;
    info!("Patient account created: {}", account.email);
    db.patients.insert(id, account);
    Ok(id)
}

/// Registers a new doctor. The record starts unapproved and stays
/// invisible for booking until an employee approves it.
pub fn signup_doctor(
    db: &mut Database,
    new: NewAccount,
    details: DoctorDetails,
) -> Result<UserId, ApiError> {
    check_identity_free(db, new.email.as_str(), new.mobile.as_str(), None)?;

    if details.consultation_fee < 0.0 {
        return Err(ApiError::Validation(
            "Consultation fee cannot be negative".to_string(),
        ));
    }

    if db
        .doctors
        .values()
        .any(|d| d.registration_number == details.registration_number.as_str())
    {
        return Err(ApiError::DuplicateId(
            "Registration number already in use by another doctor".to_string(),
        ));
    }

    let account = new.into_account();
    let id = account.id;
    info!("Doctor account created (pending approval): {}", account.email);
    db.doctors.insert(
        id,
        Doctor {
            account,
            is_approved: false,
            ssn: None,
            registration_number: details.registration_number.as_str().to_string(),
            specialization: details.specialization.as_str().to_string(),
            college: details.college.as_str().to_string(),
            year_of_passing: details.year_of_passing.as_str().to_string(),
            location: details.location.as_str().to_string(),
            online_status: OnlineStatus::Offline,
            consultation_fee: details.consultation_fee,
        },
    );
    Ok(id)
}

/// Registers a new admin or employee, gated by the role's security code.
pub fn signup_staff(
    db: &mut Database,
    role: Role,
    new: NewAccount,
    security_code: &str,
) -> Result<UserId, ApiError> {
    debug_assert!(matches!(role, Role::Admin | Role::Employee));
    check_security_code(role, Some(security_code))?;
    check_identity_free(db, new.email.as_str(), new.mobile.as_str(), None)?;

    let account = new.into_account();
    let id = account.id;
    info!("{role} account created: {}", account.email);
    match role {
        Role::Admin => db.admins.insert(id, account),
        Role::Employee => db.employees.insert(id, account),
        _ => return Err(ApiError::Validation("Invalid staff role".to_string())),
    };
    Ok(id)
}

/// Registers a new supplier, gated by the supplier security code. The
/// supplier code is an extra unique field within the supplier collection.
pub fn signup_supplier(
    db: &mut Database,
    new: NewAccount,
    supplier_code: TextInput,
    security_code: &str,
) -> Result<UserId, ApiError> {
    check_security_code(Role::Supplier, Some(security_code))?;
    check_identity_free(db, new.email.as_str(), new.mobile.as_str(), None)?;

    if db
        .suppliers
        .values()
        .any(|s| s.supplier_code == supplier_code.as_str())
    {
        return Err(ApiError::DuplicateId(
            "Supplier ID already in use by another supplier".to_string(),
        ));
    }

    let account = new.into_account();
    let id = account.id;
    info!("Supplier account created: {}", account.email);
    db.suppliers.insert(
        id,
        Supplier {
            account,
            supplier_code: supplier_code.as_str().to_string(),
        },
    );
    Ok(id)
}

/// Verifies credentials for one variant and records the login time.
///
/// A credential mismatch is an authentication failure, not a store error;
/// the password check runs against a decoy hash when the email is unknown
/// so both paths cost the same.
pub fn login(
    db: &mut Database,
    role: Role,
    email: &EmailInput,
    password_attempt: &str,
    security_code: Option<&str>,
) -> Result<UserId, ApiError> {
    check_security_code(role, security_code)?;

    let found = db
        .find_by_email(role, email.as_str())
        .map(|a| (a.id, a.password.clone()));

    let verified = password::verify(password_attempt, found.as_ref().map(|(_, h)| h));
    let (id, _) = found.filter(|_| verified).ok_or(ApiError::InvalidCredentials)?;

    let account = db
        .account_mut(role, id)
        .ok_or(ApiError::InvalidCredentials)?;
    account.last_login = Some(Utc::now());
    info!("{role} logged in: {}", account.email);
    Ok(id)
}

/// Resolves a session identifier back to a live account, distinguishing a
/// stale session (account deleted since login) from a missing one.
pub fn require_account(db: &Database, role: Role, id: UserId) -> Result<&Account, ApiError> {
    db.account(role, id).ok_or(ApiError::SessionInvalid)
}

/// Updates the common profile fields, re-validating global uniqueness but
/// excluding the record's own id so an unchanged email or mobile is not a
/// conflict with itself.
pub fn update_profile(
    db: &mut Database,
    role: Role,
    id: UserId,
    update: ProfileUpdate,
) -> Result<(), ApiError> {
    db.account(role, id).ok_or(ApiError::SessionInvalid)?;
    check_identity_free(db, update.email.as_str(), update.mobile.as_str(), Some(id))?;

    let account = db.account_mut(role, id).ok_or(ApiError::SessionInvalid)?;
    account.name = update.name.as_str().to_string();
    account.email = update.email.as_str().to_string();
    account.mobile = update.mobile.as_str().to_string();
    account.address = update.address.as_str().to_string();
    Ok(())
}

fn check_supplier_code_free(db: &Database, id: UserId, code: &str) -> Result<(), ApiError> {
    if db
        .suppliers
        .values()
        .any(|s| s.supplier_code == code && s.account.id != id)
    {
        return Err(ApiError::DuplicateId(
            "Supplier ID already in use by another supplier".to_string(),
        ));
    }
    Ok(())
}

/// Updates a supplier's profile and, optionally, its business code in one
/// operation. Every uniqueness check runs before the first field is
/// written, so a conflict leaves the record untouched.
pub fn update_supplier_profile(
    db: &mut Database,
    id: UserId,
    update: ProfileUpdate,
    supplier_code: Option<TextInput>,
) -> Result<(), ApiError> {
    if let Some(code) = &supplier_code {
        check_supplier_code_free(db, id, code.as_str())?;
    }

    update_profile(db, Role::Supplier, id, update)?;

    if let Some(code) = supplier_code {
        let supplier = db.suppliers.get_mut(&id).ok_or(ApiError::SessionInvalid)?;
        supplier.supplier_code = code.as_str().to_string();
    }
    Ok(())
}

/// Doctor presence flag shown alongside the booking listing.
pub fn set_online_status(
    db: &mut Database,
    id: UserId,
    status: OnlineStatus,
) -> Result<(), ApiError> {
    let doctor = db.doctors.get_mut(&id).ok_or(ApiError::SessionInvalid)?;
    doctor.online_status = status;
    Ok(())
}

/// Deletes a principal on behalf of an admin.
///
/// Deleting a patient or doctor cascades to every appointment referencing
/// it. An admin cannot delete its own account.
pub fn delete_principal(
    db: &mut Database,
    role: Role,
    id: UserId,
    acting_admin: UserId,
) -> Result<(), ApiError> {
    if role == Role::Admin && id == acting_admin {
        return Err(ApiError::Forbidden(
            "Cannot delete own admin account".to_string(),
        ));
    }

    // Existence is checked before the cascade so a miss mutates nothing.
    if db.account(role, id).is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    if matches!(role, Role::Patient | Role::Doctor) {
        db.remove_appointments_for(id);
    }

    db.remove_account(role, id);

    info!("{role} account {id} deleted by admin {acting_admin}");
    Ok(())
}

/// One-way approval transition for a pending doctor. Assigns the SSN on
/// first approval; approving an already-approved doctor is a no-op and
/// keeps the existing SSN.
pub fn approve_doctor(db: &mut Database, id: UserId) -> Result<(), ApiError> {
    let doctor = db
        .doctors
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;

    if doctor.is_approved {
        return Ok(());
    }

    doctor.is_approved = true;
    doctor.ssn = Some(generate_ssn());
    info!("Doctor {id} approved");
    Ok(())
}

fn generate_ssn() -> String {
    let digits: u32 = rand::thread_rng().gen_range(100_000_000..1_000_000_000);
    format!("{}{}", consts::SSN_PREFIX, digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, AppointmentId, AppointmentStatus};
    use chrono::NaiveDate;

    fn new_account(email: &str, mobile: &str) -> NewAccount {
        NewAccount {
            name: TextInput::new_short_form("Test User").unwrap(),
            email: EmailInput::new(email).unwrap(),
            mobile: MobileInput::new(mobile).unwrap(),
            address: TextInput::new_short_form("1 Test Street").unwrap(),
            password: "a strong passphrase".to_string(),
        }
    }

    fn doctor_details(registration: &str) -> DoctorDetails {
        DoctorDetails {
            registration_number: TextInput::new_short_form(registration).unwrap(),
            specialization: TextInput::new_short_form("Cardiology").unwrap(),
            college: TextInput::new_short_form("Test Medical College").unwrap(),
            year_of_passing: TextInput::new_short_form("2015").unwrap(),
            location: TextInput::new_short_form("Lausanne").unwrap(),
            consultation_fee: 100.0,
        }
    }

    #[test]
    fn email_unique_across_variants() {
        let mut db = Database::default();
        signup_patient(&mut db, new_account("shared@x.com", "1111111111")).unwrap();

        let err = signup_doctor(
            &mut db,
            new_account("shared@x.com", "2222222222"),
            doctor_details("REG-1"),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail));

        let err = signup_staff(
            &mut db,
            Role::Admin,
            new_account("shared@x.com", "3333333333"),
            consts::ADMIN_SECURITY_CODE.as_str(),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail));
    }

    #[test]
    fn mobile_unique_across_variants() {
        let mut db = Database::default();
        signup_patient(&mut db, new_account("a@x.com", "1111111111")).unwrap();

        let err = signup_supplier(
            &mut db,
            new_account("b@x.com", "1111111111"),
            TextInput::new_short_form("SUP-9").unwrap(),
            consts::SUPPLIER_SECURITY_CODE.as_str(),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateMobile));
    }

    #[test]
    fn successful_signups_keep_identities_pairwise_distinct() {
        let mut db = Database::default();
        signup_patient(&mut db, new_account("p@x.com", "1000000001")).unwrap();
        signup_doctor(
            &mut db,
            new_account("d@x.com", "1000000002"),
            doctor_details("REG-1"),
        )
        .unwrap();
        signup_staff(
            &mut db,
            Role::Employee,
            new_account("e@x.com", "1000000003"),
            consts::EMPLOYEE_SECURITY_CODE.as_str(),
        )
        .unwrap();

        let mut emails: Vec<_> = db.all_accounts().map(|(_, a)| a.email.clone()).collect();
        let mut mobiles: Vec<_> = db.all_accounts().map(|(_, a)| a.mobile.clone()).collect();
        emails.sort();
        mobiles.sort();
        emails.dedup();
        mobiles.dedup();
        assert_eq!(emails.len(), 3);
        assert_eq!(mobiles.len(), 3);
    }

    #[test]
    fn security_code_checked_before_uniqueness() {
        let mut db = Database::default();
        signup_patient(&mut db, new_account("taken@x.com", "1111111111")).unwrap();

        // Duplicate email AND wrong code: the code failure must win.
        let err = signup_staff(
            &mut db,
            Role::Admin,
            new_account("taken@x.com", "2222222222"),
            "wrong-code",
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidSecurityCode));
    }

    #[test]
    fn login_checks_code_then_credentials() {
        let mut db = Database::default();
        signup_staff(
            &mut db,
            Role::Admin,
            new_account("admin@x.com", "1111111111"),
            consts::ADMIN_SECURITY_CODE.as_str(),
        )
        .unwrap();

        let email = EmailInput::new("admin@x.com").unwrap();
        let err = login(&mut db, Role::Admin, &email, "a strong passphrase", Some("nope"))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidSecurityCode));

        let err = login(
            &mut db,
            Role::Admin,
            &email,
            "wrong password",
            Some(consts::ADMIN_SECURITY_CODE.as_str()),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));

        let id = login(
            &mut db,
            Role::Admin,
            &email,
            "a strong passphrase",
            Some(consts::ADMIN_SECURITY_CODE.as_str()),
        )
        .unwrap();
        assert!(db.account(Role::Admin, id).unwrap().last_login.is_some());
    }

    #[test]
    fn login_with_unknown_email_is_a_credential_failure() {
        let mut db = Database::default();
        let email = EmailInput::new("ghost@x.com").unwrap();
        let err = login(&mut db, Role::Patient, &email, "whatever", None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[test]
    fn self_update_to_unchanged_email_succeeds() {
        let mut db = Database::default();
        let id = signup_patient(&mut db, new_account("me@x.com", "1111111111")).unwrap();

        let update = ProfileUpdate {
            name: TextInput::new_short_form("Renamed User").unwrap(),
            email: EmailInput::new("me@x.com").unwrap(),
            mobile: MobileInput::new("1111111111").unwrap(),
            address: TextInput::new_short_form("2 New Street").unwrap(),
        };
        update_profile(&mut db, Role::Patient, id, update).unwrap();
        assert_eq!(db.patients[&id].name, "Renamed User");
    }

    #[test]
    fn update_rejects_email_taken_by_another_variant() {
        let mut db = Database::default();
        let id = signup_patient(&mut db, new_account("me@x.com", "1111111111")).unwrap();
        signup_staff(
            &mut db,
            Role::Employee,
            new_account("emp@x.com", "2222222222"),
            consts::EMPLOYEE_SECURITY_CODE.as_str(),
        )
        .unwrap();

        let update = ProfileUpdate {
            name: TextInput::new_short_form("Test User").unwrap(),
            email: EmailInput::new("emp@x.com").unwrap(),
            mobile: MobileInput::new("1111111111").unwrap(),
            address: TextInput::new_short_form("1 Test Street").unwrap(),
        };
        let err = update_profile(&mut db, Role::Patient, id, update).unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail));
    }

    #[test]
    fn failed_supplier_update_leaves_profile_untouched() {
        let mut db = Database::default();
        let s1 = signup_supplier(
            &mut db,
            new_account("s1@x.com", "1111111111"),
            TextInput::new_short_form("SUP-1").unwrap(),
            consts::SUPPLIER_SECURITY_CODE.as_str(),
        )
        .unwrap();
        signup_supplier(
            &mut db,
            new_account("s2@x.com", "2222222222"),
            TextInput::new_short_form("SUP-2").unwrap(),
            consts::SUPPLIER_SECURITY_CODE.as_str(),
        )
        .unwrap();

        // New email is free, but the code collides with the other
        // supplier: nothing at all may change.
        let update = ProfileUpdate {
            name: TextInput::new_short_form("Renamed Supplier").unwrap(),
            email: EmailInput::new("s1-new@x.com").unwrap(),
            mobile: MobileInput::new("1111111111").unwrap(),
            address: TextInput::new_short_form("9 New Street").unwrap(),
        };
        let err = update_supplier_profile(
            &mut db,
            s1,
            update,
            Some(TextInput::new_short_form("SUP-2").unwrap()),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateId(_)));

        let supplier = &db.suppliers[&s1];
        assert_eq!(supplier.account.email, "s1@x.com");
        assert_eq!(supplier.account.name, "Test User");
        assert_eq!(supplier.supplier_code, "SUP-1");
    }

    #[test]
    fn supplier_code_update_excludes_own_record() {
        let mut db = Database::default();
        let s1 = signup_supplier(
            &mut db,
            new_account("s1@x.com", "1111111111"),
            TextInput::new_short_form("SUP-1").unwrap(),
            consts::SUPPLIER_SECURITY_CODE.as_str(),
        )
        .unwrap();

        // Re-submitting the unchanged code together with the profile must
        // not conflict with itself.
        let update = ProfileUpdate {
            name: TextInput::new_short_form("Renamed Supplier").unwrap(),
            email: EmailInput::new("s1@x.com").unwrap(),
            mobile: MobileInput::new("1111111111").unwrap(),
            address: TextInput::new_short_form("1 Test Street").unwrap(),
        };
        update_supplier_profile(
            &mut db,
            s1,
            update,
            Some(TextInput::new_short_form("SUP-1").unwrap()),
        )
        .unwrap();
        assert_eq!(db.suppliers[&s1].account.name, "Renamed Supplier");
    }

    #[test]
    fn deleting_a_patient_cascades_to_appointments() {
        let mut db = Database::default();
        let patient = signup_patient(&mut db, new_account("p@x.com", "1111111111")).unwrap();
        let admin = signup_staff(
            &mut db,
            Role::Admin,
            new_account("a@x.com", "2222222222"),
            consts::ADMIN_SECURITY_CODE.as_str(),
        )
        .unwrap();

        let appointment = Appointment {
            id: AppointmentId::new(),
            patient_id: Some(patient),
            doctor_id: UserId::new(),
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            time: "09:00".into(),
            status: AppointmentStatus::Confirmed,
            kind: None,
            consultation_fee: 100.0,
            is_blocked_slot: false,
            created_at: Utc::now(),
        };
        db.appointments.insert(appointment.id, appointment);

        delete_principal(&mut db, Role::Patient, patient, admin).unwrap();
        assert!(db.patients.is_empty());
        assert!(db
            .appointments
            .values()
            .all(|a| a.patient_id != Some(patient)));
        assert!(db.appointments.is_empty());
    }

    #[test]
    fn deleting_unknown_user_mutates_nothing() {
        let mut db = Database::default();
        let admin = signup_staff(
            &mut db,
            Role::Admin,
            new_account("a@x.com", "1111111111"),
            consts::ADMIN_SECURITY_CODE.as_str(),
        )
        .unwrap();

        // Appointment referencing an id that has no account behind it.
        let ghost = UserId::new();
        let appointment = Appointment {
            id: AppointmentId::new(),
            patient_id: Some(ghost),
            doctor_id: UserId::new(),
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            time: "09:00".into(),
            status: AppointmentStatus::Pending,
            kind: None,
            consultation_fee: 100.0,
            is_blocked_slot: false,
            created_at: Utc::now(),
        };
        db.appointments.insert(appointment.id, appointment);

        let err = delete_principal(&mut db, Role::Patient, ghost, admin).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(db.appointments.len(), 1);
    }

    #[test]
    fn admin_cannot_delete_itself() {
        let mut db = Database::default();
        let admin = signup_staff(
            &mut db,
            Role::Admin,
            new_account("a@x.com", "1111111111"),
            consts::ADMIN_SECURITY_CODE.as_str(),
        )
        .unwrap();

        let err = delete_principal(&mut db, Role::Admin, admin, admin).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(db.admins.contains_key(&admin));
    }

    #[test]
    fn approval_assigns_ssn_once() {
        let mut db = Database::default();
        let id = signup_doctor(
            &mut db,
            new_account("d@x.com", "1111111111"),
            doctor_details("REG-1"),
        )
        .unwrap();
        assert!(!db.doctors[&id].is_approved);

        approve_doctor(&mut db, id).unwrap();
        let first_ssn = db.doctors[&id].ssn.clone().unwrap();
        assert!(db.doctors[&id].is_approved);
        assert!(first_ssn.starts_with(consts::SSN_PREFIX));
        let digits = &first_ssn[consts::SSN_PREFIX.len()..];
        assert_eq!(digits.len(), 9);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));

        // Re-approving is a no-op and keeps the SSN.
        approve_doctor(&mut db, id).unwrap();
        assert_eq!(db.doctors[&id].ssn.as_deref(), Some(first_ssn.as_str()));
    }

    #[test]
    fn online_status_can_be_toggled() {
        let mut db = Database::default();
        let id = signup_doctor(
            &mut db,
            new_account("d@x.com", "1111111111"),
            doctor_details("REG-1"),
        )
        .unwrap();
        assert_eq!(db.doctors[&id].online_status, OnlineStatus::Offline);

        set_online_status(&mut db, id, OnlineStatus::Online).unwrap();
        assert_eq!(db.doctors[&id].online_status, OnlineStatus::Online);

        let err = set_online_status(&mut db, UserId::new(), OnlineStatus::Online).unwrap_err();
        assert!(matches!(err, ApiError::SessionInvalid));
    }

    #[test]
    fn duplicate_registration_number_rejected() {
        let mut db = Database::default();
        signup_doctor(
            &mut db,
            new_account("d1@x.com", "1111111111"),
            doctor_details("REG-1"),
        )
        .unwrap();

        let err = signup_doctor(
            &mut db,
            new_account("d2@x.com", "2222222222"),
            doctor_details("REG-1"),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateId(_)));
    }
}

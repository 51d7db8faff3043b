//! Prescriptions issued against appointments.
//!
//! Only the attending doctor of a confirmed or completed appointment can
//! prescribe, and only the author can amend a prescription afterwards.
//! Patients see their own prescriptions read-only.

use chrono::Utc;
use log::info;

use crate::db::Database;
use crate::models::{
    AppointmentId, AppointmentStatus, ChatSender, Gender, PrescribedMedicine, Prescription,
    PrescriptionId, UserId,
};
use crate::utils::errors::ApiError;
use crate::utils::validation::TextInput;

/// Validated clinical content of a prescription, shared by create and
/// update.
pub struct PrescriptionDraft {
    pub patient_name: TextInput,
    pub age: u32,
    pub gender: Gender,
    pub weight: f64,
    pub symptoms: TextInput,
    pub medicines: Vec<PrescribedMedicine>,
    pub additional_notes: Option<TextInput>,
}

impl PrescriptionDraft {
    fn check(&self) -> Result<(), ApiError> {
        if self.medicines.is_empty() {
            return Err(ApiError::Validation(
                "A prescription needs at least one medicine".to_string(),
            ));
        }
        if self.weight <= 0.0 {
            return Err(ApiError::Validation(
                "Weight must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Issues a prescription for an appointment the doctor is attending. The
/// appointment must be confirmed or completed; prescribing against a
/// pending or cancelled booking is rejected.
pub fn create(
    db: &mut Database,
    doctor: UserId,
    appointment_id: AppointmentId,
    draft: PrescriptionDraft,
) -> Result<PrescriptionId, ApiError> {
    draft.check()?;

    let appointment = db
        .appointments
        .get(&appointment_id)
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;

    if appointment.doctor_id != doctor {
        return Err(ApiError::Forbidden(
            "Appointment belongs to another doctor".to_string(),
        ));
    }

    if !matches!(
        appointment.status,
        AppointmentStatus::Confirmed | AppointmentStatus::Completed
    ) {
        return Err(ApiError::Validation(format!(
            "Cannot prescribe for an appointment in state {}",
            appointment.status
        )));
    }

    let patient_id = appointment.patient_id.ok_or_else(|| {
        ApiError::Validation("Cannot prescribe for a blocked slot".to_string())
    })?;

    let prescription = Prescription {
        id: PrescriptionId::new(),
        appointment_id,
        doctor_id: doctor,
        patient_id,
        patient_name: draft.patient_name.as_str().to_string(),
        age: draft.age,
        gender: draft.gender,
        weight: draft.weight,
        symptoms: draft.symptoms.as_str().to_string(),
        medicines: draft.medicines,
        additional_notes: draft.additional_notes.map(|n| n.as_str().to_string()),
        created_at: Utc::now(),
    };
    let id = prescription.id;
    info!("Prescription {id} issued for appointment {appointment_id}");
    db.prescriptions.insert(id, prescription);
    Ok(id)
}

/// Amends an existing prescription. Only its author may do so; the
/// appointment linkage never changes.
pub fn update(
    db: &mut Database,
    doctor: UserId,
    id: PrescriptionId,
    draft: PrescriptionDraft,
) -> Result<(), ApiError> {
    draft.check()?;

    let prescription = db
        .prescriptions
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound("Prescription not found".to_string()))?;

    if prescription.doctor_id != doctor {
        return Err(ApiError::Forbidden(
            "Prescription was issued by another doctor".to_string(),
        ));
    }

    prescription.patient_name = draft.patient_name.as_str().to_string();
    prescription.age = draft.age;
    prescription.gender = draft.gender;
    prescription.weight = draft.weight;
    prescription.symptoms = draft.symptoms.as_str().to_string();
    prescription.medicines = draft.medicines;
    prescription.additional_notes = draft.additional_notes.map(|n| n.as_str().to_string());
    Ok(())
}

/// Prescriptions authored by a doctor, newest first.
pub fn for_doctor(db: &Database, doctor: UserId) -> Vec<&Prescription> {
    let mut found: Vec<&Prescription> = db
        .prescriptions
        .values()
        .filter(|p| p.doctor_id == doctor)
        .collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    found
}

/// Prescriptions issued to a patient, newest first.
pub fn for_patient(db: &Database, patient: UserId) -> Vec<&Prescription> {
    let mut found: Vec<&Prescription> = db
        .prescriptions
        .values()
        .filter(|p| p.patient_id == patient)
        .collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    found
}

/// Fetches a single prescription for one of its two parties.
pub fn get(
    db: &Database,
    viewer: ChatSender,
    viewer_id: UserId,
    id: PrescriptionId,
) -> Result<&Prescription, ApiError> {
    let prescription = db
        .prescriptions
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Prescription not found".to_string()))?;

    let allowed = match viewer {
        ChatSender::Doctor => prescription.doctor_id == viewer_id,
        ChatSender::Patient => prescription.patient_id == viewer_id,
    };
    if !allowed {
        return Err(ApiError::Forbidden(
            "Not a party to this prescription".to_string(),
        ));
    }
    Ok(prescription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments;
    use crate::identity::{self, DoctorDetails, NewAccount};
    use crate::models::AppointmentKind;
    use crate::utils::validation::{EmailInput, MobileInput};
    use chrono::NaiveDate;

    fn draft() -> PrescriptionDraft {
        PrescriptionDraft {
            patient_name: TextInput::new_short_form("Pat").unwrap(),
            age: 34,
            gender: Gender::Female,
            weight: 62.5,
            symptoms: TextInput::new_long_form("persistent cough").unwrap(),
            medicines: vec![PrescribedMedicine {
                medicine_name: "Amoxicillin".into(),
                dosage: "500mg".into(),
                frequency: "3x daily".into(),
                duration: "7 days".into(),
                instructions: Some("After meals".into()),
            }],
            additional_notes: None,
        }
    }

    fn setup() -> (Database, UserId, UserId, AppointmentId) {
        let mut db = Database::default();
        let patient = identity::signup_patient(
            &mut db,
            NewAccount {
                name: TextInput::new_short_form("Pat").unwrap(),
                email: EmailInput::new("pat@x.com").unwrap(),
                mobile: MobileInput::new("1111111111").unwrap(),
                address: TextInput::new_short_form("1 Street").unwrap(),
                password: "pw-pat".into(),
            },
        )
        .unwrap();
        let doctor = identity::signup_doctor(
            &mut db,
            NewAccount {
                name: TextInput::new_short_form("Doc").unwrap(),
                email: EmailInput::new("doc@x.com").unwrap(),
                mobile: MobileInput::new("2222222222").unwrap(),
                address: TextInput::new_short_form("2 Street").unwrap(),
                password: "pw-doc".into(),
            },
            DoctorDetails {
                registration_number: TextInput::new_short_form("REG-1").unwrap(),
                specialization: TextInput::new_short_form("Pulmonology").unwrap(),
                college: TextInput::new_short_form("College").unwrap(),
                year_of_passing: TextInput::new_short_form("2012").unwrap(),
                location: TextInput::new_short_form("Geneva").unwrap(),
                consultation_fee: 120.0,
            },
        )
        .unwrap();
        identity::approve_doctor(&mut db, doctor).unwrap();
        let appointment = appointments::book(
            &mut db,
            patient,
            doctor,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            "10:00".into(),
            AppointmentKind::Offline,
        )
        .unwrap();
        (db, patient, doctor, appointment)
    }

    #[test]
    fn cannot_prescribe_for_pending_appointment() {
        let (mut db, _, doctor, appointment) = setup();
        let err = create(&mut db, doctor, appointment, draft()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn attending_doctor_prescribes_after_confirmation() {
        let (mut db, patient, doctor, appointment) = setup();
        appointments::confirm(&mut db, doctor, appointment).unwrap();

        let id = create(&mut db, doctor, appointment, draft()).unwrap();
        let stored = &db.prescriptions[&id];
        assert_eq!(stored.patient_id, patient);
        assert_eq!(stored.doctor_id, doctor);
        assert_eq!(stored.medicines.len(), 1);
    }

    #[test]
    fn other_doctors_cannot_prescribe() {
        let (mut db, _, doctor, appointment) = setup();
        appointments::confirm(&mut db, doctor, appointment).unwrap();

        let err = create(&mut db, UserId::new(), appointment, draft()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn empty_medicine_list_rejected() {
        let (mut db, _, doctor, appointment) = setup();
        appointments::confirm(&mut db, doctor, appointment).unwrap();

        let mut empty = draft();
        empty.medicines.clear();
        let err = create(&mut db, doctor, appointment, empty).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn only_author_updates() {
        let (mut db, _, doctor, appointment) = setup();
        appointments::confirm(&mut db, doctor, appointment).unwrap();
        let id = create(&mut db, doctor, appointment, draft()).unwrap();

        let err = update(&mut db, UserId::new(), id, draft()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let mut amended = draft();
        amended.symptoms = TextInput::new_long_form("cough, now with fever").unwrap();
        update(&mut db, doctor, id, amended).unwrap();
        assert_eq!(db.prescriptions[&id].symptoms, "cough, now with fever");
    }

    #[test]
    fn visibility_restricted_to_parties() {
        let (mut db, patient, doctor, appointment) = setup();
        appointments::confirm(&mut db, doctor, appointment).unwrap();
        let id = create(&mut db, doctor, appointment, draft()).unwrap();

        assert!(get(&db, ChatSender::Patient, patient, id).is_ok());
        assert!(get(&db, ChatSender::Doctor, doctor, id).is_ok());
        let err = get(&db, ChatSender::Patient, UserId::new(), id).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        assert_eq!(for_patient(&db, patient).len(), 1);
        assert_eq!(for_doctor(&db, doctor).len(), 1);
        assert!(for_doctor(&db, UserId::new()).is_empty());
    }
}

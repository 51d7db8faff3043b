//! Appointment lifecycle and the chat channel attached to it.
//!
//! Lifecycle: pending -> confirmed -> completed, with cancellation allowed
//! from any non-terminal state. Blocked slots are doctor-created markers
//! outside the lifecycle. Chat is only open while an appointment is
//! confirmed, and only to its two participants.

use chrono::Utc;
use log::info;

use crate::db::Database;
use crate::models::{
    Appointment, AppointmentId, AppointmentKind, AppointmentStatus, ChatMessage, ChatMessageId,
    ChatSender, Role, UserId,
};
use crate::utils::errors::ApiError;
use crate::utils::validation::TextInput;

/// Books a consultation with an approved doctor. The consultation fee is
/// snapshotted from the doctor record at booking time.
///
/// Nothing prevents two bookings for the same doctor/date/time: overlap
/// policy is an open product question and is deliberately not enforced.
pub fn book(
    db: &mut Database,
    patient: UserId,
    doctor: UserId,
    date: chrono::NaiveDate,
    time: String,
    kind: AppointmentKind,
) -> Result<AppointmentId, ApiError> {
    db.account(Role::Patient, patient)
        .ok_or(ApiError::SessionInvalid)?;

    let doctor_record = db
        .doctors
        .get(&doctor)
        .ok_or_else(|| ApiError::NotFound("Doctor not found".to_string()))?;

    // Unapproved doctors are invisible for booking.
    if !doctor_record.is_approved {
        return Err(ApiError::Forbidden(
            "Doctor is not available for booking".to_string(),
        ));
    }

    let appointment = Appointment {
        id: AppointmentId::new(),
        patient_id: Some(patient),
        doctor_id: doctor,
        date,
        time,
        status: AppointmentStatus::Pending,
        kind: Some(kind),
        consultation_fee: doctor_record.consultation_fee,
        is_blocked_slot: false,
        created_at: Utc::now(),
    };
    let id = appointment.id;
    info!("Appointment {id} booked with doctor {doctor}");
    db.appointments.insert(id, appointment);
    Ok(id)
}

/// Marks a slot as unavailable. Blocked slots carry no patient and no fee
/// and never enter the booking lifecycle.
pub fn block_slot(
    db: &mut Database,
    doctor: UserId,
    date: chrono::NaiveDate,
    time: String,
) -> Result<AppointmentId, ApiError> {
    if !db.doctors.contains_key(&doctor) {
        return Err(ApiError::SessionInvalid);
    }

    let appointment = Appointment {
        id: AppointmentId::new(),
        patient_id: None,
        doctor_id: doctor,
        date,
        time,
        status: AppointmentStatus::Blocked,
        kind: None,
        consultation_fee: 0.0,
        is_blocked_slot: true,
        created_at: Utc::now(),
    };
    let id = appointment.id;
    db.appointments.insert(id, appointment);
    Ok(id)
}

fn owned_appointment_mut<'db>(
    db: &'db mut Database,
    id: AppointmentId,
    doctor: UserId,
) -> Result<&'db mut Appointment, ApiError> {
    let appointment = db
        .appointments
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;

    if appointment.doctor_id != doctor {
        return Err(ApiError::Forbidden(
            "Appointment belongs to another doctor".to_string(),
        ));
    }
    Ok(appointment)
}

/// Doctor confirms a pending booking. Requires the doctor to still be
/// approved: approval can only move one way, but the check keeps the gate
/// airtight.
pub fn confirm(db: &mut Database, doctor: UserId, id: AppointmentId) -> Result<(), ApiError> {
    let approved = db.doctors.get(&doctor).map(|d| d.is_approved);
    if approved != Some(true) {
        return Err(ApiError::Forbidden(
            "Only an approved doctor can confirm appointments".to_string(),
        ));
    }

    let appointment = owned_appointment_mut(db, id, doctor)?;
    if appointment.status != AppointmentStatus::Pending {
        return Err(ApiError::Validation(format!(
            "Cannot confirm an appointment in state {}",
            appointment.status
        )));
    }
    appointment.status = AppointmentStatus::Confirmed;
    Ok(())
}

/// Doctor marks a confirmed appointment as completed after the visit.
pub fn complete(db: &mut Database, doctor: UserId, id: AppointmentId) -> Result<(), ApiError> {
    let appointment = owned_appointment_mut(db, id, doctor)?;
    if appointment.status != AppointmentStatus::Confirmed {
        return Err(ApiError::Validation(format!(
            "Cannot complete an appointment in state {}",
            appointment.status
        )));
    }
    appointment.status = AppointmentStatus::Completed;
    Ok(())
}

/// Cancels a non-terminal appointment. Allowed for the booking patient and
/// for the attending doctor.
pub fn cancel(
    db: &mut Database,
    actor_role: Role,
    actor: UserId,
    id: AppointmentId,
) -> Result<(), ApiError> {
    let appointment = db
        .appointments
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;

    let is_participant = match actor_role {
        Role::Patient => appointment.patient_id == Some(actor),
        Role::Doctor => appointment.doctor_id == actor,
        _ => false,
    };
    if !is_participant {
        return Err(ApiError::Forbidden(
            "Not a participant of this appointment".to_string(),
        ));
    }

    if appointment.status.is_terminal() {
        return Err(ApiError::Validation(format!(
            "Cannot cancel an appointment in state {}",
            appointment.status
        )));
    }
    appointment.status = AppointmentStatus::Cancelled;
    info!("Appointment {id} cancelled by {actor_role} {actor}");
    Ok(())
}

fn check_participant(
    appointment: &Appointment,
    sender: ChatSender,
    sender_id: UserId,
) -> Result<(), ApiError> {
    let is_participant = match sender {
        ChatSender::Patient => appointment.patient_id == Some(sender_id),
        ChatSender::Doctor => appointment.doctor_id == sender_id,
    };
    if is_participant {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Not authorized to chat for this appointment".to_string(),
        ))
    }
}

/// Appends a chat message to a confirmed appointment's channel.
pub fn send_chat(
    db: &mut Database,
    sender: ChatSender,
    sender_id: UserId,
    appointment_id: AppointmentId,
    message: TextInput,
) -> Result<ChatMessageId, ApiError> {
    let appointment = db
        .appointments
        .get(&appointment_id)
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;

    check_participant(appointment, sender, sender_id)?;

    if appointment.status != AppointmentStatus::Confirmed {
        return Err(ApiError::Validation(
            "Chat is only available for confirmed appointments".to_string(),
        ));
    }

    let chat = ChatMessage {
        id: ChatMessageId::new(),
        appointment_id,
        sender_id,
        sender,
        message: message.as_str().to_string(),
        sent_at: Utc::now(),
    };
    let id = chat.id;
    db.chats.push(chat);
    Ok(id)
}

/// Chat history of an appointment, restricted to its two participants.
pub fn chat_history<'db>(
    db: &'db Database,
    viewer: ChatSender,
    viewer_id: UserId,
    appointment_id: AppointmentId,
) -> Result<Vec<&'db ChatMessage>, ApiError> {
    let appointment = db
        .appointments
        .get(&appointment_id)
        .ok_or_else(|| ApiError::NotFound("Appointment not found".to_string()))?;

    check_participant(appointment, viewer, viewer_id)?;
    Ok(db.chat_messages(appointment_id))
}

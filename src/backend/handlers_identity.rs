//! The identity surface shared by all five roles: signup, login, the
//! dashboard and profile pages, and profile updates.
//!
//! These handlers are mounted once per role prefix; the role arrives as a
//! router-level `Extension` so the same code serves `/patient/...` through
//! `/supplier/...` with typed dispatch instead of stringly-typed branches.

use std::sync::Arc;

use anyhow::anyhow;
use axum::response::Html;
use axum::{Extension, Json};
use handlebars::Handlebars;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::backend::handlers_public::render;
use crate::backend::middlewares::{Authed, SessionPrincipal, SESSION_PRINCIPAL_KEY};
use crate::backend::models::{
    AccountView, DoctorView, LoginRequest, SignupRequest, UpdateProfileRequest,
};
use crate::db;
use crate::identity::{self, DoctorDetails, NewAccount, ProfileUpdate};
use crate::models::Role;
use crate::utils::errors::ApiError;
use crate::utils::validation::{EmailInput, MobileInput, TextInput};

fn invalid(e: anyhow::Error) -> ApiError {
    ApiError::Validation(e.to_string())
}

fn validated_account(req: &SignupRequest) -> Result<NewAccount, ApiError> {
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(NewAccount {
        name: TextInput::new_short_form(&req.name).map_err(invalid)?,
        email: EmailInput::new(&req.email).map_err(invalid)?,
        mobile: MobileInput::new(&req.mobile).map_err(invalid)?,
        address: TextInput::new_short_form(&req.address).map_err(invalid)?,
        password: req.password.clone(),
    })
}

pub async fn signup(
    Extension(role): Extension<Role>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<Value>, ApiError> {
    let new = validated_account(&req)?;
    let mut db = db::write()?;

    let id = match role {
        Role::Patient => identity::signup_patient(&mut db, new)?,
        Role::Doctor => {
            let fields = req.doctor.as_ref().ok_or_else(|| {
                ApiError::Validation("Doctor details are required".to_string())
            })?;
            identity::signup_doctor(
                &mut db,
                new,
                DoctorDetails {
                    registration_number: TextInput::new_short_form(&fields.registration_number)
                        .map_err(invalid)?,
                    specialization: TextInput::new_short_form(&fields.specialization)
                        .map_err(invalid)?,
                    college: TextInput::new_short_form(&fields.college).map_err(invalid)?,
                    year_of_passing: TextInput::new_short_form(&fields.year_of_passing)
                        .map_err(invalid)?,
                    location: TextInput::new_short_form(&fields.location).map_err(invalid)?,
                    consultation_fee: fields.consultation_fee,
                },
            )?
        }
        Role::Admin | Role::Employee => {
            let code = req
                .security_code
                .as_deref()
                .ok_or(ApiError::InvalidSecurityCode)?;
            identity::signup_staff(&mut db, role, new, code)?
        }
        Role::Supplier => {
            let code = req
                .security_code
                .as_deref()
                .ok_or(ApiError::InvalidSecurityCode)?;
            let supplier_id = req.supplier_id.as_deref().ok_or_else(|| {
                ApiError::Validation("Supplier ID is required".to_string())
            })?;
            identity::signup_supplier(
                &mut db,
                new,
                TextInput::new_short_form(supplier_id).map_err(invalid)?,
                code,
            )?
        }
    };

    db::save(&db)?;
    Ok(Json(json!({
        "message": format!("{role} registered successfully"),
        "id": id.to_string(),
    })))
}

pub async fn login(
    Extension(role): Extension<Role>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = EmailInput::new(&req.email).map_err(|_| ApiError::InvalidCredentials)?;

    let mut db = db::write()?;
    let id = identity::login(&mut db, role, &email, &req.password, req.security_code.as_deref())?;

    // Overwrites any previous principal: one session, one identity.
    session
        .insert(SESSION_PRINCIPAL_KEY, SessionPrincipal { role, id })
        .map_err(|e| anyhow!("Failed to store session: {e}"))?;

    db::save(&db)?;
    Ok(Json(json!({
        "message": format!("{role} logged in"),
        "redirect": format!("/{}/dashboard", role.as_str().to_lowercase()),
    })))
}

pub async fn form_page(
    Extension(role): Extension<Role>,
    Extension(hbs): Extension<Arc<Handlebars<'static>>>,
) -> Result<Html<String>, ApiError> {
    render(
        &hbs,
        "form",
        &json!({
            "role": role.as_str(),
            "rolePath": role.as_str().to_lowercase(),
            "needsSecurityCode": matches!(role, Role::Admin | Role::Employee | Role::Supplier),
            "isDoctor": role == Role::Doctor,
            "isSupplier": role == Role::Supplier,
        }),
    )
}

pub async fn dashboard_page(
    Extension(role): Extension<Role>,
    Extension(hbs): Extension<Arc<Handlebars<'static>>>,
    Authed(principal): Authed,
) -> Result<Html<String>, ApiError> {
    let id = principal.require(role)?;
    let db = db::read()?;
    let account = identity::require_account(&db, role, id)?;

    render(
        &hbs,
        "dashboard",
        &json!({
            "role": role.as_str(),
            "rolePath": role.as_str().to_lowercase(),
            "name": account.name,
        }),
    )
}

pub async fn profile_page(
    Extension(role): Extension<Role>,
    Extension(hbs): Extension<Arc<Handlebars<'static>>>,
    Authed(principal): Authed,
) -> Result<Html<String>, ApiError> {
    let id = principal.require(role)?;
    let db = db::read()?;
    let profile = profile_view(&db, role, id)?;

    render(
        &hbs,
        "profile",
        &json!({
            "role": role.as_str(),
            "rolePath": role.as_str().to_lowercase(),
            "profile": profile,
        }),
    )
}

pub async fn profile_data(
    Extension(role): Extension<Role>,
    Authed(principal): Authed,
) -> Result<Json<Value>, ApiError> {
    let id = principal.require(role)?;
    let db = db::read()?;
    Ok(Json(profile_view(&db, role, id)?))
}

fn profile_view(db: &db::Database, role: Role, id: crate::models::UserId) -> Result<Value, ApiError> {
    let view = match role {
        Role::Doctor => {
            let doctor = db.doctors.get(&id).ok_or(ApiError::SessionInvalid)?;
            serde_json::to_value(DoctorView::new(doctor)).map_err(anyhow::Error::from)?
        }
        Role::Supplier => {
            let supplier = db.suppliers.get(&id).ok_or(ApiError::SessionInvalid)?;
            let mut view = serde_json::to_value(AccountView::new(role, &supplier.account))
                .map_err(anyhow::Error::from)?;
            view["supplierId"] = json!(supplier.supplier_code);
            view
        }
        _ => {
            let account = identity::require_account(db, role, id)?;
            serde_json::to_value(AccountView::new(role, account)).map_err(anyhow::Error::from)?
        }
    };
    Ok(view)
}

pub async fn update_profile(
    Extension(role): Extension<Role>,
    Authed(principal): Authed,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = principal.require(role)?;

    let update = ProfileUpdate {
        name: TextInput::new_short_form(&req.name).map_err(invalid)?,
        email: EmailInput::new(&req.email).map_err(invalid)?,
        mobile: MobileInput::new(&req.mobile).map_err(invalid)?,
        address: TextInput::new_short_form(&req.address).map_err(invalid)?,
    };

    let mut db = db::write()?;
    match role {
        Role::Supplier => {
            let code = req
                .supplier_id
                .as_deref()
                .map(|c| TextInput::new_short_form(c).map_err(invalid))
                .transpose()?;
            identity::update_supplier_profile(&mut db, id, update, code)?;
        }
        _ => identity::update_profile(&mut db, role, id, update)?,
    }
    db::save(&db)?;
    Ok(Json(json!({ "message": "Profile updated" })))
}

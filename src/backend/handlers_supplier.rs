//! Supplier routes: catalog management and incoming orders.

use axum::extract::Path;
use axum::Json;
use serde_json::{json, Value};

use crate::backend::middlewares::Authed;
use crate::backend::models::{parse_date, AddMedicineRequest};
use crate::models::{MedicineId, OrderId, Role};
use crate::pharmacy::{self, MedicineDraft};
use crate::utils::errors::ApiError;
use crate::utils::validation::TextInput;
use crate::db;

fn invalid(e: anyhow::Error) -> ApiError {
    ApiError::Validation(e.to_string())
}

pub async fn add_medicine(
    Authed(principal): Authed,
    Json(req): Json<AddMedicineRequest>,
) -> Result<Json<Value>, ApiError> {
    let supplier = principal.require(Role::Supplier)?;

    let draft = MedicineDraft {
        medicine_code: TextInput::new_short_form(&req.medicine_id).map_err(invalid)?,
        name: TextInput::new_short_form(&req.name).map_err(invalid)?,
        quantity: req.quantity,
        cost: req.cost,
        manufacturer: TextInput::new_short_form(&req.manufacturer).map_err(invalid)?,
        expiry_date: parse_date(&req.expiry_date)?,
    };

    let mut db = db::write()?;
    let id = pharmacy::add_medicine(&mut db, supplier, draft)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Medicine added", "id": id.to_string() })))
}

pub async fn my_medicines(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let supplier = principal.require(Role::Supplier)?;
    let db = db::read()?;
    let mine = pharmacy::medicines_of(&db, supplier);
    Ok(Json(serde_json::to_value(mine).map_err(anyhow::Error::from)?))
}

pub async fn delete_medicine(
    Authed(principal): Authed,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let supplier = principal.require(Role::Supplier)?;
    let id = MedicineId::parse(&id)
        .ok_or_else(|| ApiError::Validation(format!("Invalid medicine id: {id}")))?;

    let mut db = db::write()?;
    pharmacy::delete_medicine(&mut db, supplier, id)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Medicine deleted" })))
}

pub async fn my_orders(Authed(principal): Authed) -> Result<Json<Value>, ApiError> {
    let supplier = principal.require(Role::Supplier)?;
    let db = db::read()?;
    let mine = pharmacy::orders_for_supplier(&db, supplier);
    Ok(Json(serde_json::to_value(mine).map_err(anyhow::Error::from)?))
}

pub async fn deliver_order(
    Authed(principal): Authed,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let supplier = principal.require(Role::Supplier)?;
    let id = OrderId::parse(&id)
        .ok_or_else(|| ApiError::Validation(format!("Invalid order id: {id}")))?;

    let mut db = db::write()?;
    pharmacy::deliver_order(&mut db, supplier, id)?;
    db::save(&db)?;
    Ok(Json(json!({ "message": "Order delivered" })))
}

//! Medicine inventory and patient orders.
//!
//! Suppliers own their catalog entries; patients order against live stock.
//! Stock is decremented at order time, so an order can never be placed for
//! more units than the catalog currently holds.

use chrono::{NaiveDate, Utc};
use log::info;

use crate::db::Database;
use crate::models::{Medicine, MedicineId, Order, OrderId, OrderStatus, UserId};
use crate::utils::errors::ApiError;
use crate::utils::validation::TextInput;

/// Validated catalog entry fields.
pub struct MedicineDraft {
    pub medicine_code: TextInput,
    pub name: TextInput,
    pub quantity: u32,
    pub cost: f64,
    pub manufacturer: TextInput,
    pub expiry_date: NaiveDate,
}

/// Adds a medicine to the supplier's catalog. The medicine code is unique
/// platform-wide, not just within one supplier's listings.
pub fn add_medicine(
    db: &mut Database,
    supplier: UserId,
    draft: MedicineDraft,
) -> Result<MedicineId, ApiError> {
    if !db.suppliers.contains_key(&supplier) {
        return Err(ApiError::SessionInvalid);
    }

    if draft.cost < 0.0 {
        return Err(ApiError::Validation(
            "Cost cannot be negative".to_string(),
        ));
    }

    if db
        .medicines
        .values()
        .any(|m| m.medicine_code == draft.medicine_code.as_str())
    {
        return Err(ApiError::DuplicateId(
            "Medicine ID already in use".to_string(),
        ));
    }

    let medicine = Medicine {
        id: MedicineId::new(),
        medicine_code: draft.medicine_code.as_str().to_string(),
        name: draft.name.as_str().to_string(),
        quantity: draft.quantity,
        cost: draft.cost,
        manufacturer: draft.manufacturer.as_str().to_string(),
        expiry_date: draft.expiry_date,
        supplier_id: supplier,
        created_at: Utc::now(),
    };
    let id = medicine.id;
    info!("Medicine {} listed by supplier {supplier}", medicine.medicine_code);
    db.medicines.insert(id, medicine);
    Ok(id)
}

/// Removes a catalog entry. Only its owning supplier may delete it.
pub fn delete_medicine(db: &mut Database, supplier: UserId, id: MedicineId) -> Result<(), ApiError> {
    let medicine = db
        .medicines
        .get(&id)
        .ok_or_else(|| ApiError::NotFound("Medicine not found".to_string()))?;

    if medicine.supplier_id != supplier {
        return Err(ApiError::Forbidden(
            "Medicine belongs to another supplier".to_string(),
        ));
    }

    db.medicines.remove(&id);
    Ok(())
}

/// A supplier's own catalog, newest first.
pub fn medicines_of(db: &Database, supplier: UserId) -> Vec<&Medicine> {
    let mut found: Vec<&Medicine> = db
        .medicines
        .values()
        .filter(|m| m.supplier_id == supplier)
        .collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    found
}

/// The full catalog for the patient-facing store, in-stock entries only.
pub fn available_medicines(db: &Database) -> Vec<&Medicine> {
    let mut found: Vec<&Medicine> = db.medicines.values().filter(|m| m.quantity > 0).collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

/// Places an order for a patient, decrementing stock atomically with the
/// order insert. The total is priced at the current catalog cost.
pub fn place_order(
    db: &mut Database,
    patient: UserId,
    medicine_id: MedicineId,
    quantity: u32,
) -> Result<OrderId, ApiError> {
    if !db.patients.contains_key(&patient) {
        return Err(ApiError::SessionInvalid);
    }
    if quantity == 0 {
        return Err(ApiError::Validation(
            "Order quantity must be at least 1".to_string(),
        ));
    }

    let medicine = db
        .medicines
        .get_mut(&medicine_id)
        .ok_or_else(|| ApiError::NotFound("Medicine not found".to_string()))?;

    if medicine.quantity < quantity {
        return Err(ApiError::Validation(format!(
            "Only {} units in stock",
            medicine.quantity
        )));
    }

    medicine.quantity -= quantity;
    let order = Order {
        id: OrderId::new(),
        medicine_id,
        patient_id: patient,
        supplier_id: medicine.supplier_id,
        quantity,
        total_cost: medicine.cost * f64::from(quantity),
        status: OrderStatus::Pending,
        created_at: Utc::now(),
    };
    let id = order.id;
    info!("Order {id} placed for {quantity}x {}", medicine.medicine_code);
    db.orders.insert(id, order);
    Ok(id)
}

/// Marks one of the supplier's orders as delivered.
pub fn deliver_order(db: &mut Database, supplier: UserId, id: OrderId) -> Result<(), ApiError> {
    let order = db
        .orders
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    if order.supplier_id != supplier {
        return Err(ApiError::Forbidden(
            "Order belongs to another supplier".to_string(),
        ));
    }
    if order.status != OrderStatus::Pending {
        return Err(ApiError::Validation(format!(
            "Cannot deliver an order in state {:?}",
            order.status
        )));
    }
    order.status = OrderStatus::Delivered;
    Ok(())
}

/// Orders placed against a supplier's catalog, newest first.
pub fn orders_for_supplier(db: &Database, supplier: UserId) -> Vec<&Order> {
    let mut found: Vec<&Order> = db
        .orders
        .values()
        .filter(|o| o.supplier_id == supplier)
        .collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    found
}

/// A patient's order history, newest first.
pub fn orders_for_patient(db: &Database, patient: UserId) -> Vec<&Order> {
    let mut found: Vec<&Order> = db
        .orders
        .values()
        .filter(|o| o.patient_id == patient)
        .collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts;
    use crate::identity::{self, NewAccount};
    use crate::utils::validation::{EmailInput, MobileInput};

    fn draft(code: &str, quantity: u32, cost: f64) -> MedicineDraft {
        MedicineDraft {
            medicine_code: TextInput::new_short_form(code).unwrap(),
            name: TextInput::new_short_form("Paracetamol").unwrap(),
            quantity,
            cost,
            manufacturer: TextInput::new_short_form("Acme Pharma").unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
        }
    }

    fn setup() -> (Database, UserId, UserId) {
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
        let supplier = identity::signup_supplier(
            &mut db,
            NewAccount {
                name: TextInput::new_short_form("Sup").unwrap(),
                email: EmailInput::new("sup@x.com").unwrap(),
                mobile: MobileInput::new("2222222222").unwrap(),
                address: TextInput::new_short_form("2 Street").unwrap(),
                password: "pw-sup".into(),
            },
            TextInput::new_short_form("SUP-1").unwrap(),
            consts::SUPPLIER_SECURITY_CODE.as_str(),
        )
        .unwrap();
        (db, patient, supplier)
    }

    #[test]
    fn medicine_codes_are_unique() {
        let (mut db, _, supplier) = setup();
        add_medicine(&mut db, supplier, draft("MED-1", 10, 5.0)).unwrap();

        let err = add_medicine(&mut db, supplier, draft("MED-1", 3, 2.0)).unwrap_err();
        assert!(matches!(err, ApiError::DuplicateId(_)));
    }

    #[test]
    fn negative_cost_rejected() {
        let (mut db, _, supplier) = setup();
        let err = add_medicine(&mut db, supplier, draft("MED-1", 10, -1.0)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn order_decrements_stock_and_prices_total() {
        let (mut db, patient, supplier) = setup();
        let medicine = add_medicine(&mut db, supplier, draft("MED-1", 10, 2.5)).unwrap();

        let order = place_order(&mut db, patient, medicine, 4).unwrap();
        assert_eq!(db.medicines[&medicine].quantity, 6);
        assert_eq!(db.orders[&order].total_cost, 10.0);
        assert_eq!(db.orders[&order].status, OrderStatus::Pending);
        assert_eq!(db.orders[&order].supplier_id, supplier);
    }

    #[test]
    fn order_cannot_exceed_stock() {
        let (mut db, patient, supplier) = setup();
        let medicine = add_medicine(&mut db, supplier, draft("MED-1", 3, 2.5)).unwrap();

        let err = place_order(&mut db, patient, medicine, 4).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(db.medicines[&medicine].quantity, 3);

        let err = place_order(&mut db, patient, medicine, 0).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn out_of_stock_entries_hidden_from_store() {
        let (mut db, patient, supplier) = setup();
        let medicine = add_medicine(&mut db, supplier, draft("MED-1", 1, 2.5)).unwrap();
        assert_eq!(available_medicines(&db).len(), 1);

        place_order(&mut db, patient, medicine, 1).unwrap();
        assert!(available_medicines(&db).is_empty());
        assert_eq!(medicines_of(&db, supplier).len(), 1);
    }

    #[test]
    fn deletion_restricted_to_owner() {
        let (mut db, _, supplier) = setup();
        let medicine = add_medicine(&mut db, supplier, draft("MED-1", 10, 2.5)).unwrap();

        let err = delete_medicine(&mut db, UserId::new(), medicine).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        delete_medicine(&mut db, supplier, medicine).unwrap();
        assert!(db.medicines.is_empty());
    }

    #[test]
    fn delivery_restricted_to_owning_supplier() {
        let (mut db, patient, supplier) = setup();
        let medicine = add_medicine(&mut db, supplier, draft("MED-1", 10, 2.5)).unwrap();
        let order = place_order(&mut db, patient, medicine, 1).unwrap();

        let err = deliver_order(&mut db, UserId::new(), order).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        deliver_order(&mut db, supplier, order).unwrap();
        assert_eq!(db.orders[&order].status, OrderStatus::Delivered);

        // Delivered is final.
        let err = deliver_order(&mut db, supplier, order).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        assert_eq!(orders_for_supplier(&db, supplier).len(), 1);
        assert_eq!(orders_for_patient(&db, patient).len(), 1);
    }
}

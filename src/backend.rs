//! HTTP layer: route table, session middleware, request/response shapes
//! and one handler module per area of the platform.

pub mod handlers_admin;
pub mod handlers_doctor;
pub mod handlers_employee;
pub mod handlers_identity;
pub mod handlers_patient;
pub mod handlers_public;
pub mod handlers_supplier;
pub mod middlewares;
pub mod models;
pub mod router;

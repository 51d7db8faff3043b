//! Utility modules: error taxonomy, password hashing and input validation.

pub mod errors;
pub mod password;
pub mod validation;

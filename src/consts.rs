//! Global constants, with environment overrides for deployment secrets.

use once_cell::sync::Lazy;

pub const HTTP_PORT: u16 = 8080; // Default port for the HTTP server.
pub const STORE_DB_PATH: &str = "./data/store.yaml"; // Snapshot path for the data store.

/// Prefix for the SSN assigned when a doctor is approved.
pub const SSN_PREFIX: &str = "DOC-";

/// Platform share of each consultation fee.
pub const PLATFORM_CUT: f64 = 0.10;

pub const BLOGS_PER_PAGE: usize = 6;
pub const MAX_SIGNIN_ROWS: usize = 50;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

// Shared-secret security codes gating the non-patient staff roles.
// Defaults are for local development; override via .env in deployment.
pub static ADMIN_SECURITY_CODE: Lazy<String> =
    Lazy::new(|| env_or("ADMIN_SECURITY_CODE", "ADM-0000"));
pub static EMPLOYEE_SECURITY_CODE: Lazy<String> =
    Lazy::new(|| env_or("EMPLOYEE_SECURITY_CODE", "EMP-0000"));
pub static SUPPLIER_SECURITY_CODE: Lazy<String> =
    Lazy::new(|| env_or("SUPPLIER_SECURITY_CODE", "SUP-0000"));

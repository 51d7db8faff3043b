//! Type definitions for the validation system

mod email_input;
mod mobile_input;
mod text_input;

// Re-export commonly used types and functions
pub use email_input::EmailInput;
pub use mobile_input::MobileInput;
pub use text_input::TextInput;

//! Length limits shared by the validation types.

/// Maximum length for long-form content (blog posts, symptoms, chat).
pub const MAX_CONTENT_LENGTH: usize = 2_000;
/// Maximum length for short-form content (names, addresses, titles).
pub const MAX_SHORT_CONTENT_LENGTH: usize = 250;

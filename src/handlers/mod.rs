//! Handler modules for the Lambda function

pub mod bootstrap;
pub mod export;
pub mod roles;

// Re-export handler functions for convenience
pub use bootstrap::handle_user_created;
pub use export::handle_export_enrollments;
pub use roles::handle_set_user_role;

//! Web front: lookup form, results page and JSON endpoint

pub mod handlers;
pub mod routes;
pub mod template;

pub use routes::create_router;
pub use template::{PageTemplate, TemplateError};

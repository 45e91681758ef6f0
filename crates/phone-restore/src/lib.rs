//! Phone Restore - register a phone number under an email and get it back later.
//!
//! The service:
//! - Stores phone numbers encrypted per email in a flat JSON document
//! - Sends a stored number back to its email through a notification channel
//! - Serves plain HTML forms rendered from placeholder templates

pub mod api;
pub mod config;
pub mod error;
pub mod router;
pub mod template;

pub use config::Config;
pub use error::{AppError, TemplateError};
pub use router::{Exchange, Handler, Params, Router};
pub use template::{MissingKey, Template, TemplateEngine};

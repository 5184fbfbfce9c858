//! Transcript model, shared record types, configuration, and errors.
//!
//! The OCR collaborator is external: everything here consumes an ordered
//! sequence of [`TextLine`] values and produces plain data. Entities are
//! created fresh per document and discarded after assembly — no state is
//! carried across documents.

mod config;
mod countries;
mod error;
mod types;

pub use config::{ExtractionConfig, MAX_REGISTRY_LOOKUPS};
pub use countries::{
    COUNTRY_KEYWORDS, EU_COUNTRIES, country_from_keywords, country_hint_from_name, is_eu,
};
pub use error::ExtractionError;
pub use types::*;

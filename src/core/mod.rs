//! Core record types, validation, and fingerprint chaining.
//!
//! This module models invoice registration records for the Spanish
//! VERI*FACTU protocol: the high record and its cancellation, the breakdown
//! rules per tax and regime, and the SHA-256 chain linking an issuer's
//! records together.

mod breakdown;
mod builder;
mod cancellation;
mod chaining;
mod codes;
mod config;
pub mod countries;
mod error;
mod header;
mod information_system;
mod invoice_id;
mod party;
mod primitives;
mod record;
mod tax_id;
mod validation;

pub use breakdown::*;
pub use builder::*;
pub use cancellation::*;
pub use chaining::*;
pub use codes::*;
pub use self::config::*;
pub use countries::is_allowed_country_code;
pub use error::*;
pub use header::*;
pub use information_system::*;
pub use invoice_id::*;
pub use party::*;
pub use primitives::*;
pub use record::*;
pub use tax_id::*;
pub use validation::*;

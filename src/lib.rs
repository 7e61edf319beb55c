//! # verifactu
//!
//! Invoice registration records for the Spanish tax authority's VERI*FACTU
//! protocol: a validated record model, the breakdown rules per tax and
//! regime, and the SHA-256 fingerprint chain that links an issuer's records.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Every builder collects all violations before failing, so one call reports
//! everything that is wrong with a record.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use verifactu::core::*;
//!
//! let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
//! let id = InvoiceId::new("B12345674", "NC202500051", "22-07-2025", clock.today()).unwrap();
//! let system = InformationSystemBuilder::new(
//!     LegalEntity::from_tax_id("Software SL", "A58818501").unwrap(),
//!     "AB",
//!     "1.0",
//!     "1",
//! )
//! .build()
//! .unwrap();
//!
//! let record = HighRecordBuilder::new(id, "Mi Empresa SL", InvoiceType::F1)
//!     .add_recipient(LegalEntity::from_tax_id("Cliente SA", "A58818501").unwrap())
//!     .add_line(
//!         BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, "264.46")
//!             .regime_key(RegimeKey::GENERAL)
//!             .tax_rate("21")
//!             .charged_tax("55.54")
//!             .build()
//!             .unwrap(),
//!     )
//!     .total_tax("55.54")
//!     .total_amount("320.00")
//!     .chaining(Chaining::origin())
//!     .information_system(system.clone())
//!     .generated_at("2025-07-22T10:00:00+02:00")
//!     .build_with_clock(&clock)
//!     .unwrap();
//!
//! // The next record links to this one.
//! let next = Chaining::link_to(record.invoice_id(), record.fingerprint()).unwrap();
//! assert_eq!(next.previous_fingerprint(), record.fingerprint());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Records, validation, fingerprint chaining |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

//! Fingerprint chaining (`Encadenamiento` / `Huella`).
//!
//! Every record carries the SHA-256 fingerprint of a canonical string built
//! from its key fields and the fingerprint of the record before it. Altering
//! any earlier record therefore breaks every later link.
//!
//! The engine stores nothing: callers supply the previous record's identity
//! and fingerprint and must serialize chain extension per issuer.

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::cancellation::CancellationRecord;
use super::codes::InvoiceType;
use super::error::{ErrorKind, RecordError, ValidationError, into_result, reject};
use super::invoice_id::{InvoiceId, check_series_number};
use super::primitives::{DateInput, serialize_wire_date, validate_date, validate_epoch};
use super::record::HighRecord;
use super::tax_id::validate_tax_id;

/// Length of a hex-encoded SHA-256 fingerprint.
pub const FINGERPRINT_LEN: usize = 64;

/// Identity and fingerprint of the record a new record links to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PreviousRecord {
    issuer_tax_id: String,
    series_number: String,
    #[serde(serialize_with = "serialize_wire_date")]
    issue_date: NaiveDate,
    fingerprint: String,
}

impl PreviousRecord {
    pub fn issuer_tax_id(&self) -> &str {
        &self.issuer_tax_id
    }

    pub fn series_number(&self) -> &str {
        &self.series_number
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    /// Upper-case hex fingerprint of the previous record.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The previous record's identity as an [`InvoiceId`].
    pub fn invoice_id(&self) -> InvoiceId {
        InvoiceId::from_checked(
            self.issuer_tax_id.clone(),
            self.series_number.clone(),
            self.issue_date,
        )
    }

    fn refers_to(&self, id: &InvoiceId) -> bool {
        self.issuer_tax_id == id.issuer_tax_id()
            && self.series_number == id.series_number()
            && self.issue_date == id.issue_date()
    }
}

/// Position of a record in its issuer's chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Chaining {
    /// First record of the chain (`PrimerRegistro`).
    FirstRecord,
    /// Linked to the immediately preceding record (`RegistroAnterior`).
    Linked(PreviousRecord),
}

impl Chaining {
    pub fn origin() -> Self {
        Self::FirstRecord
    }

    /// Link to an already validated previous identity.
    pub fn link_to(previous: &InvoiceId, fingerprint: &str) -> Result<Self, RecordError> {
        let mut errors = Vec::new();
        check_fingerprint("previous_fingerprint", fingerprint, &mut errors);
        into_result(errors, || {
            Self::Linked(PreviousRecord {
                issuer_tax_id: previous.issuer_tax_id().to_string(),
                series_number: previous.series_number().to_string(),
                issue_date: previous.issue_date(),
                fingerprint: fingerprint.to_ascii_uppercase(),
            })
        })
    }

    /// Link to a previous record described by its raw parts, e.g. as loaded
    /// from storage.
    pub fn link_to_parts(
        issuer_tax_id: &str,
        series_number: &str,
        issue_date: impl Into<DateInput>,
        fingerprint: &str,
    ) -> Result<Self, RecordError> {
        let mut errors = Vec::new();

        if let Err(e) = validate_tax_id(issuer_tax_id) {
            errors.push(ValidationError::chaining("previous_issuer_tax_id", e.to_string()));
        }
        let mut series_errors = Vec::new();
        check_series_number("previous_series_number", series_number, &mut series_errors);
        errors.extend(series_errors.into_iter().map(as_chaining));

        let issue_date = match validate_date(issue_date).and_then(validate_epoch) {
            Ok(date) => Some(date),
            Err(e) => {
                errors.push(as_chaining(e.at("previous_issue_date")));
                None
            }
        };
        check_fingerprint("previous_fingerprint", fingerprint, &mut errors);

        let Some(issue_date) = issue_date else {
            return Err(reject(errors));
        };
        into_result(errors, || {
            Self::Linked(PreviousRecord {
                issuer_tax_id: issuer_tax_id.to_ascii_uppercase(),
                series_number: series_number.to_string(),
                issue_date,
                fingerprint: fingerprint.to_ascii_uppercase(),
            })
        })
    }

    pub fn is_first_record(&self) -> bool {
        matches!(self, Self::FirstRecord)
    }

    pub fn previous(&self) -> Option<&PreviousRecord> {
        match self {
            Self::FirstRecord => None,
            Self::Linked(previous) => Some(previous),
        }
    }

    /// Value of the `Huella` component of the canonical string.
    pub fn previous_fingerprint(&self) -> &str {
        self.previous().map_or("", PreviousRecord::fingerprint)
    }
}

fn as_chaining(mut error: ValidationError) -> ValidationError {
    error.kind = ErrorKind::InvalidChaining;
    error
}

/// Require exactly 64 hexadecimal characters.
pub(crate) fn check_fingerprint(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.len() != FINGERPRINT_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        errors.push(ValidationError::chaining(
            field,
            format!("must be {FINGERPRINT_LEN} hexadecimal characters"),
        ));
    }
}

/// Fields of a high record that enter its fingerprint, in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintInput {
    pub issuer_tax_id: String,
    pub series_number: String,
    /// `dd-mm-yyyy`.
    pub issue_date: String,
    pub invoice_type: InvoiceType,
    pub total_tax: String,
    pub total_amount: String,
    /// Generation timestamp with offset, e.g. `2025-07-22T10:00:00+02:00`.
    pub generated_at: String,
}

/// Fields of a cancellation record that enter its fingerprint, in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationFingerprintInput {
    pub issuer_tax_id: String,
    pub series_number: String,
    pub issue_date: String,
    pub generated_at: String,
}

/// The exact string hashed for a high record.
pub fn canonical_string(input: &FingerprintInput, chaining: &Chaining) -> String {
    format!(
        "IDEmisorFactura={}&NumSerieFactura={}&FechaExpedicionFactura={}&TipoFactura={}\
         &CuotaTotal={}&ImporteTotal={}&Huella={}&FechaHoraHusoGenRegistro={}",
        input.issuer_tax_id,
        input.series_number,
        input.issue_date,
        input.invoice_type.code(),
        input.total_tax,
        input.total_amount,
        chaining.previous_fingerprint(),
        input.generated_at,
    )
}

/// The exact string hashed for a cancellation record.
pub fn cancellation_canonical_string(
    input: &CancellationFingerprintInput,
    chaining: &Chaining,
) -> String {
    format!(
        "IDEmisorFacturaAnulada={}&NumSerieFacturaAnulada={}&FechaExpedicionFacturaAnulada={}\
         &Huella={}&FechaHoraHusoGenRegistro={}",
        input.issuer_tax_id,
        input.series_number,
        input.issue_date,
        chaining.previous_fingerprint(),
        input.generated_at,
    )
}

/// Upper-case hex SHA-256 of the high-record canonical string.
pub fn compute_fingerprint(input: &FingerprintInput, chaining: &Chaining) -> String {
    sha256_upper_hex(&canonical_string(input, chaining))
}

/// Upper-case hex SHA-256 of the cancellation canonical string.
pub fn compute_cancellation_fingerprint(
    input: &CancellationFingerprintInput,
    chaining: &Chaining,
) -> String {
    sha256_upper_hex(&cancellation_canonical_string(input, chaining))
}

fn sha256_upper_hex(text: &str) -> String {
    Sha256::digest(text.as_bytes())
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect()
}

/// A record taking part in an issuer's chain.
#[derive(Debug, Clone, Copy)]
pub enum ChainEntry<'a> {
    High(&'a HighRecord),
    Cancellation(&'a CancellationRecord),
}

impl ChainEntry<'_> {
    /// Identity the next record must link to.
    pub fn invoice_id(&self) -> &InvoiceId {
        match self {
            Self::High(record) => record.invoice_id(),
            Self::Cancellation(record) => record.cancelled_invoice(),
        }
    }

    pub fn chaining(&self) -> &Chaining {
        match self {
            Self::High(record) => record.chaining(),
            Self::Cancellation(record) => record.chaining(),
        }
    }

    pub fn fingerprint(&self) -> &str {
        match self {
            Self::High(record) => record.fingerprint(),
            Self::Cancellation(record) => record.fingerprint(),
        }
    }

    pub fn recompute_fingerprint(&self) -> String {
        match self {
            Self::High(record) => record.recompute_fingerprint(),
            Self::Cancellation(record) => record.recompute_fingerprint(),
        }
    }
}

impl<'a> From<&'a HighRecord> for ChainEntry<'a> {
    fn from(record: &'a HighRecord) -> Self {
        Self::High(record)
    }
}

impl<'a> From<&'a CancellationRecord> for ChainEntry<'a> {
    fn from(record: &'a CancellationRecord) -> Self {
        Self::Cancellation(record)
    }
}

/// First inconsistency found in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainBreak {
    #[error("record {position}: stored fingerprint {stored} does not match recomputed {computed}")]
    FingerprintMismatch {
        position: usize,
        stored: String,
        computed: String,
    },

    #[error("record {position}: marked as first record but follows another record")]
    UnexpectedOrigin { position: usize },

    #[error(
        "record {position}: links to {found_series} of {found_issuer} but the previous record is {expected_series} of {expected_issuer}"
    )]
    WrongPredecessor {
        position: usize,
        expected_issuer: String,
        expected_series: String,
        found_issuer: String,
        found_series: String,
    },

    #[error("record {position}: previous fingerprint {found} does not match {expected}")]
    PreviousFingerprintMismatch {
        position: usize,
        expected: String,
        found: String,
    },
}

/// Check an ordered slice of one issuer's records.
///
/// Every fingerprint must recompute, and every entry after the first must be
/// linked to its predecessor's identity and fingerprint. The first entry may
/// be an origin or a link to a record outside the slice.
pub fn verify_chain(entries: &[ChainEntry<'_>]) -> Result<(), ChainBreak> {
    let result = entries
        .iter()
        .enumerate()
        .try_for_each(|(position, entry)| verify_entry(position, entry, entries));
    match &result {
        Ok(()) => tracing::debug!(records = entries.len(), "chain verified"),
        Err(chain_break) => tracing::warn!(%chain_break, "chain verification failed"),
    }
    result
}

fn verify_entry(
    position: usize,
    entry: &ChainEntry<'_>,
    entries: &[ChainEntry<'_>],
) -> Result<(), ChainBreak> {
    let computed = entry.recompute_fingerprint();
    if computed != entry.fingerprint() {
        return Err(ChainBreak::FingerprintMismatch {
            position,
            stored: entry.fingerprint().to_string(),
            computed,
        });
    }

    let Some(predecessor) = position.checked_sub(1).and_then(|i| entries.get(i)) else {
        return Ok(());
    };
    let Some(link) = entry.chaining().previous() else {
        return Err(ChainBreak::UnexpectedOrigin { position });
    };

    let expected = predecessor.invoice_id();
    if !link.refers_to(expected) {
        return Err(ChainBreak::WrongPredecessor {
            position,
            expected_issuer: expected.issuer_tax_id().to_string(),
            expected_series: expected.series_number().to_string(),
            found_issuer: link.issuer_tax_id().to_string(),
            found_series: link.series_number().to_string(),
        });
    }
    if link.fingerprint() != predecessor.fingerprint() {
        return Err(ChainBreak::PreviousFingerprintMismatch {
            position,
            expected: predecessor.fingerprint().to_string(),
            found: link.fingerprint().to_string(),
        });
    }
    Ok(())
}

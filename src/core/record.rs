//! The high record aggregate (`RegistroAlta`).
//!
//! Instances only come out of [`HighRecordBuilder`](super::HighRecordBuilder),
//! which validates every rule before handing one out. Nothing mutates a
//! record afterwards.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::breakdown::BreakdownDetail;
use super::chaining::{Chaining, FingerprintInput, canonical_string, compute_fingerprint};
use super::codes::{FingerprintType, InvoiceType, IssuedBy, PreviousRejection, RectificationType};
use super::error::{RecordError, into_result};
use super::information_system::InformationSystem;
use super::invoice_id::InvoiceId;
use super::party::LegalEntity;
use super::primitives::{check_amount, serialize_wire_date_opt};

/// Amounts corrected by a substitution rectification (`ImporteRectificacion`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RectificationAmount {
    base: Decimal,
    tax: Decimal,
    surcharge: Option<Decimal>,
}

impl RectificationAmount {
    pub fn new(base: &str, tax: &str, surcharge: Option<&str>) -> Result<Self, RecordError> {
        let mut errors = Vec::new();
        let base = check_amount("base", base, 12, &mut errors);
        let tax = check_amount("tax", tax, 12, &mut errors);
        let surcharge = surcharge.and_then(|s| check_amount("surcharge", s, 12, &mut errors));
        into_result(errors, || Self {
            base: base.unwrap_or_default(),
            tax: tax.unwrap_or_default(),
            surcharge,
        })
    }

    pub fn base(&self) -> Decimal {
        self.base
    }

    pub fn tax(&self) -> Decimal {
        self.tax
    }

    pub fn surcharge(&self) -> Option<Decimal> {
        self.surcharge
    }
}

/// A validated invoice registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighRecord {
    pub(crate) id_version: String,
    pub(crate) invoice_id: InvoiceId,
    pub(crate) external_reference: Option<String>,
    pub(crate) issuer_name: String,
    pub(crate) correction: bool,
    pub(crate) previous_rejection: Option<PreviousRejection>,
    pub(crate) invoice_type: InvoiceType,
    pub(crate) rectification_type: Option<RectificationType>,
    pub(crate) rectified_invoices: Vec<InvoiceId>,
    pub(crate) replaced_invoices: Vec<InvoiceId>,
    pub(crate) rectification_amount: Option<RectificationAmount>,
    #[serde(serialize_with = "serialize_wire_date_opt")]
    pub(crate) operation_date: Option<NaiveDate>,
    pub(crate) operation_description: String,
    pub(crate) simplified_invoice: bool,
    pub(crate) without_recipient_id: bool,
    pub(crate) macro_data: bool,
    pub(crate) issued_by: Option<IssuedBy>,
    pub(crate) third_party: Option<LegalEntity>,
    pub(crate) recipients: Vec<LegalEntity>,
    pub(crate) coupon: bool,
    pub(crate) breakdown: Vec<BreakdownDetail>,
    pub(crate) total_tax: Decimal,
    pub(crate) total_amount: Decimal,
    #[serde(skip)]
    pub(crate) total_tax_text: String,
    #[serde(skip)]
    pub(crate) total_amount_text: String,
    pub(crate) chaining: Chaining,
    pub(crate) information_system: InformationSystem,
    pub(crate) generated_at: String,
    pub(crate) billing_agreement: Option<String>,
    pub(crate) system_agreement_id: Option<String>,
    pub(crate) fingerprint_type: FingerprintType,
    pub(crate) fingerprint: String,
}

impl HighRecord {
    /// Protocol version (`IDVersion`).
    pub fn id_version(&self) -> &str {
        &self.id_version
    }

    pub fn invoice_id(&self) -> &InvoiceId {
        &self.invoice_id
    }

    pub fn external_reference(&self) -> Option<&str> {
        self.external_reference.as_deref()
    }

    pub fn issuer_name(&self) -> &str {
        &self.issuer_name
    }

    /// Whether this record corrects a previously submitted one (`Subsanacion`).
    pub fn correction(&self) -> bool {
        self.correction
    }

    pub fn previous_rejection(&self) -> Option<PreviousRejection> {
        self.previous_rejection
    }

    pub fn invoice_type(&self) -> InvoiceType {
        self.invoice_type
    }

    pub fn rectification_type(&self) -> Option<RectificationType> {
        self.rectification_type
    }

    pub fn rectified_invoices(&self) -> &[InvoiceId] {
        &self.rectified_invoices
    }

    pub fn replaced_invoices(&self) -> &[InvoiceId] {
        &self.replaced_invoices
    }

    pub fn rectification_amount(&self) -> Option<&RectificationAmount> {
        self.rectification_amount.as_ref()
    }

    pub fn operation_date(&self) -> Option<NaiveDate> {
        self.operation_date
    }

    pub fn operation_description(&self) -> &str {
        &self.operation_description
    }

    /// `FacturaSimplificadaArt7273`.
    pub fn simplified_invoice(&self) -> bool {
        self.simplified_invoice
    }

    /// `FacturaSinIdentifDestinatarioArt61d`.
    pub fn without_recipient_id(&self) -> bool {
        self.without_recipient_id
    }

    /// Set by the caller or forced for totals above 100,000,000.00.
    pub fn macro_data(&self) -> bool {
        self.macro_data
    }

    pub fn issued_by(&self) -> Option<IssuedBy> {
        self.issued_by
    }

    pub fn third_party(&self) -> Option<&LegalEntity> {
        self.third_party.as_ref()
    }

    pub fn recipients(&self) -> &[LegalEntity] {
        &self.recipients
    }

    pub fn coupon(&self) -> bool {
        self.coupon
    }

    pub fn breakdown(&self) -> &[BreakdownDetail] {
        &self.breakdown
    }

    pub fn total_tax(&self) -> Decimal {
        self.total_tax
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Total tax exactly as supplied; this text enters the fingerprint.
    pub fn total_tax_text(&self) -> &str {
        &self.total_tax_text
    }

    /// Total amount exactly as supplied; this text enters the fingerprint.
    pub fn total_amount_text(&self) -> &str {
        &self.total_amount_text
    }

    pub fn chaining(&self) -> &Chaining {
        &self.chaining
    }

    pub fn information_system(&self) -> &InformationSystem {
        &self.information_system
    }

    /// Generation timestamp exactly as supplied (`FechaHoraHusoGenRegistro`).
    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }

    pub fn billing_agreement(&self) -> Option<&str> {
        self.billing_agreement.as_deref()
    }

    pub fn system_agreement_id(&self) -> Option<&str> {
        self.system_agreement_id.as_deref()
    }

    pub fn fingerprint_type(&self) -> FingerprintType {
        self.fingerprint_type
    }

    /// Upper-case hex fingerprint (`Huella`).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The record's fields that enter its fingerprint.
    pub fn fingerprint_input(&self) -> FingerprintInput {
        fingerprint_input(
            &self.invoice_id,
            self.invoice_type,
            &self.total_tax_text,
            &self.total_amount_text,
            &self.generated_at,
        )
    }

    pub fn canonical_string(&self) -> String {
        canonical_string(&self.fingerprint_input(), &self.chaining)
    }

    pub fn recompute_fingerprint(&self) -> String {
        compute_fingerprint(&self.fingerprint_input(), &self.chaining)
    }

    /// True if the stored fingerprint matches the record's fields.
    pub fn verify_fingerprint(&self) -> bool {
        self.recompute_fingerprint() == self.fingerprint
    }
}

pub(crate) fn fingerprint_input(
    invoice_id: &InvoiceId,
    invoice_type: InvoiceType,
    total_tax: &str,
    total_amount: &str,
    generated_at: &str,
) -> FingerprintInput {
    FingerprintInput {
        issuer_tax_id: invoice_id.issuer_tax_id().to_string(),
        series_number: invoice_id.series_number().to_string(),
        issue_date: invoice_id.issue_date_text(),
        invoice_type,
        total_tax: total_tax.to_string(),
        total_amount: total_amount.to_string(),
        generated_at: generated_at.to_string(),
    }
}

use chrono::{DateTime, Months, NaiveDate};
use rust_decimal::Decimal;

use super::breakdown::BreakdownDetail;
use super::chaining::{Chaining, check_fingerprint, compute_fingerprint};
use super::codes::{FingerprintType, InvoiceType, IssuedBy, PreviousRejection, RectificationType};
use super::config::{Clock, RecordConfig, SystemClock};
use super::error::{RecordError, ValidationError, reject};
use super::information_system::InformationSystem;
use super::invoice_id::InvoiceId;
use super::party::LegalEntity;
use super::primitives::{DateInput, check_amount, check_text, validate_date, validate_offset_datetime};
use super::record::{HighRecord, RectificationAmount, fingerprint_input};
use super::validation::{self, MACRO_DATA_THRESHOLD};

/// Builder for [`HighRecord`].
///
/// `build()` runs every rule and either returns a valid, immutable record or
/// a [`RecordError`] listing every violation. When no fingerprint is supplied
/// the builder computes it from the record and its [`Chaining`].
///
/// ```
/// use chrono::NaiveDate;
/// use verifactu::core::*;
///
/// let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
/// let id = InvoiceId::new("B12345674", "NC202500051", "22-07-2025", clock.today()).unwrap();
/// let system = InformationSystemBuilder::new(
///     LegalEntity::from_tax_id("Software SL", "A58818501").unwrap(),
///     "AB",
///     "1.0",
///     "1",
/// )
/// .build()
/// .unwrap();
///
/// let record = HighRecordBuilder::new(id, "Mi Empresa SL", InvoiceType::F1)
///     .add_recipient(LegalEntity::from_tax_id("Cliente SA", "A58818501").unwrap())
///     .add_line(
///         BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, "264.46")
///             .regime_key(RegimeKey::GENERAL)
///             .tax_rate("21")
///             .charged_tax("55.54")
///             .build()
///             .unwrap(),
///     )
///     .total_tax("55.54")
///     .total_amount("320.00")
///     .chaining(Chaining::origin())
///     .information_system(system)
///     .generated_at("2025-07-22T10:00:00+02:00")
///     .build_with_clock(&clock)
///     .unwrap();
///
/// assert_eq!(
///     record.fingerprint(),
///     "BAD9C5179F959D01102E57281686232CF6A0AB5EFE390F397C07BA63EE889815"
/// );
/// ```
pub struct HighRecordBuilder {
    invoice_id: InvoiceId,
    issuer_name: String,
    invoice_type: InvoiceType,
    config: RecordConfig,
    external_reference: Option<String>,
    correction: bool,
    previous_rejection: Option<PreviousRejection>,
    rectification_type: Option<RectificationType>,
    rectified_invoices: Vec<InvoiceId>,
    replaced_invoices: Vec<InvoiceId>,
    rectification_amount: Option<RectificationAmount>,
    operation_date: Option<DateInput>,
    operation_description: Option<String>,
    simplified_invoice: bool,
    without_recipient_id: bool,
    macro_data: bool,
    issued_by: Option<IssuedBy>,
    third_party: Option<LegalEntity>,
    recipients: Vec<LegalEntity>,
    coupon: bool,
    lines: Vec<BreakdownDetail>,
    total_tax: Option<String>,
    total_amount: Option<String>,
    chaining: Option<Chaining>,
    information_system: Option<InformationSystem>,
    generated_at: Option<String>,
    billing_agreement: Option<String>,
    system_agreement_id: Option<String>,
    fingerprint_type: FingerprintType,
    fingerprint: Option<String>,
}

impl HighRecordBuilder {
    pub fn new(invoice_id: InvoiceId, issuer_name: impl Into<String>, invoice_type: InvoiceType) -> Self {
        Self {
            invoice_id,
            issuer_name: issuer_name.into(),
            invoice_type,
            config: RecordConfig::default(),
            external_reference: None,
            correction: false,
            previous_rejection: None,
            rectification_type: None,
            rectified_invoices: Vec::new(),
            replaced_invoices: Vec::new(),
            rectification_amount: None,
            operation_date: None,
            operation_description: None,
            simplified_invoice: false,
            without_recipient_id: false,
            macro_data: false,
            issued_by: None,
            third_party: None,
            recipients: Vec::new(),
            coupon: false,
            lines: Vec::new(),
            total_tax: None,
            total_amount: None,
            chaining: None,
            information_system: None,
            generated_at: None,
            billing_agreement: None,
            system_agreement_id: None,
            fingerprint_type: FingerprintType::Sha256,
            fingerprint: None,
        }
    }

    pub fn config(mut self, config: RecordConfig) -> Self {
        self.config = config;
        self
    }

    pub fn external_reference(mut self, reference: impl Into<String>) -> Self {
        self.external_reference = Some(reference.into());
        self
    }

    /// Mark the record as a correction of an earlier submission.
    pub fn correction(mut self, correction: bool) -> Self {
        self.correction = correction;
        self
    }

    pub fn previous_rejection(mut self, rejection: PreviousRejection) -> Self {
        self.previous_rejection = Some(rejection);
        self
    }

    pub fn rectification_type(mut self, kind: RectificationType) -> Self {
        self.rectification_type = Some(kind);
        self
    }

    pub fn add_rectified_invoice(mut self, id: InvoiceId) -> Self {
        self.rectified_invoices.push(id);
        self
    }

    pub fn add_replaced_invoice(mut self, id: InvoiceId) -> Self {
        self.replaced_invoices.push(id);
        self
    }

    pub fn rectification_amount(mut self, amount: RectificationAmount) -> Self {
        self.rectification_amount = Some(amount);
        self
    }

    pub fn operation_date(mut self, date: impl Into<DateInput>) -> Self {
        self.operation_date = Some(date.into());
        self
    }

    /// Defaults to the configured description when not set.
    pub fn operation_description(mut self, description: impl Into<String>) -> Self {
        self.operation_description = Some(description.into());
        self
    }

    pub fn simplified_invoice(mut self, value: bool) -> Self {
        self.simplified_invoice = value;
        self
    }

    pub fn without_recipient_id(mut self, value: bool) -> Self {
        self.without_recipient_id = value;
        self
    }

    pub fn macro_data(mut self, value: bool) -> Self {
        self.macro_data = value;
        self
    }

    pub fn issued_by(mut self, issued_by: IssuedBy) -> Self {
        self.issued_by = Some(issued_by);
        self
    }

    pub fn third_party(mut self, party: LegalEntity) -> Self {
        self.third_party = Some(party);
        self
    }

    pub fn add_recipient(mut self, party: LegalEntity) -> Self {
        self.recipients.push(party);
        self
    }

    pub fn coupon(mut self, value: bool) -> Self {
        self.coupon = value;
        self
    }

    pub fn add_line(mut self, line: BreakdownDetail) -> Self {
        self.lines.push(line);
        self
    }

    pub fn total_tax(mut self, amount: impl Into<String>) -> Self {
        self.total_tax = Some(amount.into());
        self
    }

    pub fn total_amount(mut self, amount: impl Into<String>) -> Self {
        self.total_amount = Some(amount.into());
        self
    }

    pub fn chaining(mut self, chaining: Chaining) -> Self {
        self.chaining = Some(chaining);
        self
    }

    pub fn information_system(mut self, system: InformationSystem) -> Self {
        self.information_system = Some(system);
        self
    }

    /// Generation timestamp with offset, e.g. `2025-07-22T10:00:00+02:00`.
    pub fn generated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.generated_at = Some(timestamp.into());
        self
    }

    pub fn billing_agreement(mut self, number: impl Into<String>) -> Self {
        self.billing_agreement = Some(number.into());
        self
    }

    pub fn system_agreement_id(mut self, id: impl Into<String>) -> Self {
        self.system_agreement_id = Some(id.into());
        self
    }

    /// Use a fingerprint computed elsewhere instead of computing it here.
    pub fn fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn build(self) -> Result<HighRecord, RecordError> {
        self.build_with_clock(&SystemClock)
    }

    /// Build against an explicit source of "today".
    pub fn build_with_clock(self, clock: &dyn Clock) -> Result<HighRecord, RecordError> {
        self.config.check()?;
        let today = clock.today();
        let issuer = self.invoice_id.issuer_tax_id().to_string();
        let series = self.invoice_id.series_number().to_string();

        let result = self.assemble(today).and_then(|record| {
            let errors = validation::validate_high_record(&record, today);
            if errors.is_empty() {
                Ok(record)
            } else {
                Err(reject(errors))
            }
        });

        match &result {
            Ok(record) => tracing::debug!(
                issuer = %issuer,
                series = %series,
                fingerprint = %record.fingerprint,
                "high record accepted"
            ),
            Err(e) => tracing::debug!(
                issuer = %issuer,
                series = %series,
                errors = e.errors().len(),
                "high record rejected"
            ),
        }
        result
    }

    /// Check single fields and put the record together.
    fn assemble(self, today: NaiveDate) -> Result<HighRecord, RecordError> {
        let mut errors = Vec::new();
        let policy = self.config.text_policy;

        if let Some(reference) = &self.external_reference {
            check_text("external_reference", reference, 0, 60, policy, &mut errors);
        }
        check_text("issuer_name", &self.issuer_name, 1, 120, policy, &mut errors);
        let operation_description = self
            .operation_description
            .unwrap_or_else(|| self.config.default_operation_description.clone());
        check_text("operation_description", &operation_description, 1, 500, policy, &mut errors);
        if let Some(number) = &self.billing_agreement {
            check_text("billing_agreement", number, 1, 15, policy, &mut errors);
        }
        if let Some(id) = &self.system_agreement_id {
            check_text("system_agreement_id", id, 1, 16, policy, &mut errors);
        }

        let operation_date = self
            .operation_date
            .and_then(|input| check_operation_date(input, today, &mut errors));

        let total_tax = required_amount("total_tax", self.total_tax.as_deref(), &mut errors);
        let total_amount = required_amount("total_amount", self.total_amount.as_deref(), &mut errors);

        let generated_at = self.generated_at.unwrap_or_default();
        check_generated_at(&generated_at, &mut errors);

        if self.chaining.is_none() {
            errors.push(ValidationError::chaining("chaining", "is required"));
        }
        if self.information_system.is_none() {
            errors.push(ValidationError::field("information_system", "is required"));
        }
        if let Some(fingerprint) = &self.fingerprint {
            check_fingerprint("fingerprint", fingerprint, &mut errors);
        }

        let (Some(total_tax), Some(total_amount), Some(chaining), Some(information_system)) =
            (total_tax, total_amount, self.chaining, self.information_system)
        else {
            return Err(reject(errors));
        };
        if !errors.is_empty() {
            return Err(reject(errors));
        }
        let total_tax_text = self.total_tax.unwrap_or_default();
        let total_amount_text = self.total_amount.unwrap_or_default();

        let mut macro_data = self.macro_data;
        if total_amount.abs() > MACRO_DATA_THRESHOLD && !macro_data {
            tracing::info!(
                total_amount = %total_amount,
                series = %self.invoice_id.series_number(),
                "total amount above threshold, macro-data flag forced"
            );
            macro_data = true;
        }

        let fingerprint = match self.fingerprint {
            Some(supplied) => supplied.to_ascii_uppercase(),
            None => compute_fingerprint(
                &fingerprint_input(
                    &self.invoice_id,
                    self.invoice_type,
                    &total_tax_text,
                    &total_amount_text,
                    &generated_at,
                ),
                &chaining,
            ),
        };

        Ok(HighRecord {
            id_version: self.config.id_version,
            invoice_id: self.invoice_id,
            external_reference: self.external_reference,
            issuer_name: self.issuer_name,
            correction: self.correction,
            previous_rejection: self.previous_rejection,
            invoice_type: self.invoice_type,
            rectification_type: self.rectification_type,
            rectified_invoices: self.rectified_invoices,
            replaced_invoices: self.replaced_invoices,
            rectification_amount: self.rectification_amount,
            operation_date,
            operation_description,
            simplified_invoice: self.simplified_invoice,
            without_recipient_id: self.without_recipient_id,
            macro_data,
            issued_by: self.issued_by,
            third_party: self.third_party,
            recipients: self.recipients,
            coupon: self.coupon,
            breakdown: self.lines,
            total_tax,
            total_amount,
            total_tax_text,
            total_amount_text,
            chaining,
            information_system,
            generated_at,
            billing_agreement: self.billing_agreement,
            system_agreement_id: self.system_agreement_id,
            fingerprint_type: self.fingerprint_type,
            fingerprint,
        })
    }
}

fn required_amount(
    field: &str,
    raw: Option<&str>,
    errors: &mut Vec<ValidationError>,
) -> Option<Decimal> {
    match raw {
        Some(raw) => check_amount(field, raw, 12, errors),
        None => {
            errors.push(ValidationError::field(field, "is required"));
            None
        }
    }
}

/// Operation dates lie within twenty years before and one year after today.
fn check_operation_date(
    input: DateInput,
    today: NaiveDate,
    errors: &mut Vec<ValidationError>,
) -> Option<NaiveDate> {
    let date = match validate_date(input) {
        Ok(date) => date,
        Err(e) => {
            errors.push(e.at("operation_date"));
            return None;
        }
    };
    let earliest = today.checked_sub_months(Months::new(20 * 12)).unwrap_or(NaiveDate::MIN);
    let latest = today.checked_add_months(Months::new(12)).unwrap_or(NaiveDate::MAX);
    if date < earliest || date > latest {
        errors.push(ValidationError::field(
            "operation_date",
            format!(
                "must lie between {} and {}",
                earliest.format("%d-%m-%Y"),
                latest.format("%d-%m-%Y")
            ),
        ));
    }
    Some(date)
}

pub(crate) fn check_generated_at(value: &str, errors: &mut Vec<ValidationError>) {
    if value.is_empty() {
        errors.push(ValidationError::field("generated_at", "is required"));
    } else if !validate_offset_datetime(value) || DateTime::parse_from_rfc3339(value).is_err() {
        errors.push(ValidationError::field(
            "generated_at",
            format!("'{value}' must be YYYY-MM-DDThh:mm:ss followed by Z or an offset like +01:00"),
        ));
    }
}

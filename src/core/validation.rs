use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::breakdown::{AMOUNT_TOLERANCE, BreakdownDetail};
use super::codes::{
    ExemptionReason, InvoiceType, IssuedBy, Qualification, RectificationType, RegimeKey, TaxCode,
};
use super::error::ValidationError;
use super::record::HighRecord;

/// Upper bound of every list of invoice references and of recipients.
pub const MAX_REFERENCES: usize = 1000;
/// Most breakdown lines a record may carry.
pub const MAX_BREAKDOWN_LINES: usize = 12;
/// Largest simplified invoice (base plus tax) without a billing agreement.
pub const SIMPLIFIED_INVOICE_LIMIT: Decimal = dec!(3000);
/// Totals above this amount are always flagged as macro-data.
pub const MACRO_DATA_THRESHOLD: Decimal = dec!(100000000);

const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid calendar date"),
    }
}

/// Validate the cross-field rules of a high record.
///
/// Returns every violation found, not just the first. A record produced by
/// the builder always yields an empty list.
pub fn validate_high_record(record: &HighRecord, today: NaiveDate) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if record.previous_rejection.is_some() && !record.correction {
        errors.push(ValidationError::combination(
            "previous_rejection",
            "only allowed when the record is a correction",
        ));
    }

    validate_rectification(record, &mut errors);
    validate_flags(record, &mut errors);
    validate_third_party(record, &mut errors);
    validate_recipients(record, &mut errors);

    if let Some(operation_date) = record.operation_date {
        let restricted = record.breakdown.iter().any(|line| {
            line.tax_code().has_regime_matrix()
                && !line.regime_key().is_some_and(|k| k.allows_future_operation())
        });
        if operation_date > today && restricted {
            errors.push(ValidationError::combination(
                "operation_date",
                "may only be in the future when every VAT/IGIC line has regime key 14 or 15",
            ));
        }
    }

    if record.breakdown.is_empty() {
        errors.push(ValidationError::field("breakdown", "at least one line is required"));
    } else if record.breakdown.len() > MAX_BREAKDOWN_LINES {
        errors.push(ValidationError::field(
            "breakdown",
            format!("at most {MAX_BREAKDOWN_LINES} lines are allowed, got {}", record.breakdown.len()),
        ));
    }
    for (i, line) in record.breakdown.iter().enumerate() {
        validate_line(record, line, &format!("breakdown[{i}]"), &mut errors);
    }

    errors.extend(validate_totals(record));

    if let Some(previous) = record.chaining.previous() {
        if previous.issuer_tax_id() != record.invoice_id.issuer_tax_id() {
            errors.push(ValidationError::chaining(
                "chaining",
                format!(
                    "previous record belongs to {} but this record is issued by {}",
                    previous.issuer_tax_id(),
                    record.invoice_id.issuer_tax_id()
                ),
            ));
        }
    }

    errors
}

fn validate_rectification(record: &HighRecord, errors: &mut Vec<ValidationError>) {
    let invoice_type = record.invoice_type;

    if invoice_type.is_rectification() {
        if record.rectification_type.is_none() {
            errors.push(ValidationError::combination(
                "rectification_type",
                format!("is required for invoice type {invoice_type}"),
            ));
        }
        check_reference_count("rectified_invoices", record.rectified_invoices.len(), errors);
    } else {
        if record.rectification_type.is_some() {
            errors.push(ValidationError::combination(
                "rectification_type",
                format!("not allowed for invoice type {invoice_type}"),
            ));
        }
        if !record.rectified_invoices.is_empty() {
            errors.push(ValidationError::combination(
                "rectified_invoices",
                format!("not allowed for invoice type {invoice_type}"),
            ));
        }
    }

    if invoice_type == InvoiceType::F3 {
        check_reference_count("replaced_invoices", record.replaced_invoices.len(), errors);
    } else if !record.replaced_invoices.is_empty() {
        errors.push(ValidationError::combination(
            "replaced_invoices",
            format!("only allowed for invoice type F3, not {invoice_type}"),
        ));
    }

    match (record.rectification_type, &record.rectification_amount) {
        (Some(RectificationType::Substitution), None) => {
            errors.push(ValidationError::combination(
                "rectification_amount",
                "is required for a rectification by substitution",
            ));
        }
        (Some(RectificationType::Difference) | None, Some(_)) => {
            errors.push(ValidationError::combination(
                "rectification_amount",
                "only allowed for a rectification by substitution",
            ));
        }
        _ => {}
    }
}

fn check_reference_count(field: &str, count: usize, errors: &mut Vec<ValidationError>) {
    if count == 0 {
        errors.push(ValidationError::combination(field, "at least one invoice reference is required"));
    } else if count > MAX_REFERENCES {
        errors.push(ValidationError::combination(
            field,
            format!("at most {MAX_REFERENCES} references are allowed, got {count}"),
        ));
    }
}

fn validate_flags(record: &HighRecord, errors: &mut Vec<ValidationError>) {
    let invoice_type = record.invoice_type;
    if record.simplified_invoice && invoice_type.is_simplified() {
        errors.push(ValidationError::combination(
            "simplified_invoice",
            format!("only allowed for F1, F3 and R1 to R4, not {invoice_type}"),
        ));
    }
    if record.without_recipient_id && !invoice_type.is_simplified() {
        errors.push(ValidationError::combination(
            "without_recipient_id",
            format!("only allowed for F2 and R5, not {invoice_type}"),
        ));
    }
    if record.coupon && !matches!(invoice_type, InvoiceType::R1 | InvoiceType::R5) {
        errors.push(ValidationError::combination(
            "coupon",
            format!("only allowed for R1 and R5, not {invoice_type}"),
        ));
    }
    if record.total_amount.abs() > MACRO_DATA_THRESHOLD && !record.macro_data {
        errors.push(ValidationError::combination(
            "macro_data",
            "must be set when the total amount exceeds 100,000,000.00",
        ));
    }
}

fn validate_third_party(record: &HighRecord, errors: &mut Vec<ValidationError>) {
    match (&record.issued_by, &record.third_party) {
        (Some(IssuedBy::ThirdParty), None) => {
            errors.push(ValidationError::combination(
                "third_party",
                "is required when the invoice is issued by a third party",
            ));
        }
        (Some(IssuedBy::ThirdParty), Some(third_party)) => {
            if third_party.tax_id() == Some(record.invoice_id.issuer_tax_id()) {
                errors.push(ValidationError::combination(
                    "third_party",
                    "must differ from the invoice issuer",
                ));
            }
            if third_party.is_unregistered() {
                errors.push(ValidationError::combination(
                    "third_party",
                    "must be registered (id type 07 is not allowed)",
                ));
            }
        }
        (_, Some(_)) => {
            errors.push(ValidationError::combination(
                "third_party",
                "only allowed when issued_by is T (third party)",
            ));
        }
        (_, None) => {}
    }
}

fn validate_recipients(record: &HighRecord, errors: &mut Vec<ValidationError>) {
    let invoice_type = record.invoice_type;
    let count = record.recipients.len();

    if invoice_type.requires_recipients() {
        if count == 0 {
            errors.push(ValidationError::combination(
                "recipients",
                format!("at least one recipient is required for invoice type {invoice_type}"),
            ));
        } else if count > MAX_REFERENCES {
            errors.push(ValidationError::combination(
                "recipients",
                format!("at most {MAX_REFERENCES} recipients are allowed, got {count}"),
            ));
        }
    } else if count > 0 {
        errors.push(ValidationError::combination(
            "recipients",
            format!("not allowed for invoice type {invoice_type}"),
        ));
    }

    for (i, recipient) in record.recipients.iter().enumerate() {
        let foreign = recipient.foreign_id();
        if recipient.is_unregistered() && foreign.and_then(|f| f.country_code()) != Some("ES") {
            errors.push(ValidationError::combination(
                format!("recipients[{i}]"),
                "an unregistered recipient must have country code ES",
            ));
        }
    }
}

fn validate_line(
    record: &HighRecord,
    line: &BreakdownDetail,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    let invoice_type = record.invoice_type;

    if line.qualification() == Some(Qualification::S2) && invoice_type.is_simplified() {
        errors.push(ValidationError::combination(
            format!("{prefix}.qualification"),
            format!("S2 is only allowed for F1, F3 and R1 to R4, not {invoice_type}"),
        ));
    }

    if line.has_regime(RegimeKey::ENTITY_GROUP)
        && matches!(invoice_type, InvoiceType::F2 | InvoiceType::F3 | InvoiceType::R5)
    {
        errors.push(ValidationError::combination(
            format!("{prefix}.regime_key"),
            format!("regime 06 is not allowed for invoice type {invoice_type}"),
        ));
    }

    if line.regime_key() == Some(RegimeKey::THIRD_PARTY_COLLECTION) {
        if invoice_type != InvoiceType::F1 {
            errors.push(ValidationError::combination(
                format!("{prefix}.regime_key"),
                format!("regime 10 is only allowed for invoice type F1, not {invoice_type}"),
            ));
        }
        if record.recipients.iter().any(|r| r.tax_id().is_none()) {
            errors.push(ValidationError::combination(
                format!("{prefix}.regime_key"),
                "regime 10 requires every recipient to have a Spanish tax ID",
            ));
        }
    }

    if line.has_regime(RegimeKey::PUBLIC_WORKS_PENDING) {
        match record.operation_date {
            None => errors.push(ValidationError::combination(
                "operation_date",
                format!("is required by regime 14 in {prefix}"),
            )),
            Some(date) if date < record.invoice_id.issue_date() => {
                errors.push(ValidationError::combination(
                    "operation_date",
                    format!("must not be earlier than the issue date under regime 14 in {prefix}"),
                ));
            }
            Some(_) => {}
        }
    }

    if line.tax_code() == TaxCode::Vat {
        if line.exemption_reason() == Some(ExemptionReason::E5)
            && record.recipients.iter().any(|r| r.foreign_id().is_none())
        {
            errors.push(ValidationError::combination(
                format!("{prefix}.exemption_reason"),
                "E5 requires every recipient to be identified by a foreign ID",
            ));
        }
        let date = record.operation_date.unwrap_or(record.invoice_id.issue_date());
        validate_dated_rates(line, date, prefix, errors);
    }

    let skip_consistency = record.rectification_type == Some(RectificationType::Difference)
        || matches!(invoice_type, InvoiceType::R2 | InvoiceType::R3);
    if !skip_consistency && !line.tax_consistency_check() {
        errors.push(ValidationError::totals(
            format!("{prefix}.charged_tax"),
            format!(
                "{} does not match base {} at rate {} within {AMOUNT_TOLERANCE}",
                line.charged_tax().unwrap_or_default(),
                line.taxable_base(),
                line.tax_rate().unwrap_or_default()
            ),
        ));
    }
}

/// VAT rates that were only in force for a limited period.
fn validate_dated_rates(
    line: &BreakdownDetail,
    date: NaiveDate,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    let Some(rate) = line.tax_rate() else {
        return;
    };
    let surcharge = line.surcharge_rate();
    let within = |from: NaiveDate, to: NaiveDate| (from..=to).contains(&date);
    let mut fail = |field: &str, message: &str| {
        errors.push(ValidationError::combination(
            format!("{prefix}.{field}"),
            format!("{message} (operation date {})", date.format("%d-%m-%Y")),
        ));
    };

    if rate == dec!(5) {
        if !within(ymd(2022, 7, 1), ymd(2024, 9, 30)) {
            fail("tax_rate", "5% VAT only applies from 01-07-2022 to 30-09-2024");
        }
        if surcharge == Some(dec!(0.5)) && date > ymd(2022, 12, 31) {
            fail("surcharge_rate", "surcharge 0.5 with 5% VAT only applies until 31-12-2022");
        }
        if surcharge == Some(dec!(0.62)) && !within(ymd(2023, 1, 1), ymd(2024, 9, 30)) {
            fail("surcharge_rate", "surcharge 0.62 only applies from 01-01-2023 to 30-09-2024");
        }
    } else if rate == dec!(2) || rate == dec!(7.5) {
        if !within(ymd(2024, 10, 1), ymd(2024, 12, 31)) {
            fail("tax_rate", "2% and 7.5% VAT only apply from 01-10-2024 to 31-12-2024");
        }
    } else if rate.is_zero()
        && surcharge.is_some_and(|s| s.is_zero())
        && !within(ymd(2023, 1, 1), ymd(2024, 9, 30))
    {
        fail("surcharge_rate", "0% VAT with surcharge 0 only applies from 01-01-2023 to 30-09-2024");
    }
}

/// Reconcile declared totals against the breakdown lines.
pub fn validate_totals(record: &HighRecord) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let line_tax: Decimal = record.breakdown.iter().map(BreakdownDetail::tax_with_surcharge).sum();
    let tax_difference = record.total_tax - line_tax;
    if tax_difference.abs() > AMOUNT_TOLERANCE {
        errors.push(ValidationError::totals(
            "total_tax",
            format!(
                "{} does not match the breakdown tax {line_tax} (difference {tax_difference})",
                record.total_tax
            ),
        ));
    }

    let line_amount: Decimal = record
        .breakdown
        .iter()
        .filter(|line| line.regime_key().is_none_or(|key| key.counts_towards_total()))
        .map(|line| line.taxable_base() + line.tax_with_surcharge())
        .sum();
    let amount_difference = record.total_amount - line_amount;
    if amount_difference.abs() > AMOUNT_TOLERANCE {
        errors.push(ValidationError::totals(
            "total_amount",
            format!(
                "{} does not match the breakdown amount {line_amount} (difference {amount_difference})",
                record.total_amount
            ),
        ));
    }

    if record.invoice_type == InvoiceType::F2
        && record.billing_agreement.is_none()
        && !record.without_recipient_id
    {
        let simplified_total: Decimal = record
            .breakdown
            .iter()
            .map(|line| line.taxable_base() + line.charged_tax().unwrap_or_default())
            .sum();
        if simplified_total > SIMPLIFIED_INVOICE_LIMIT + AMOUNT_TOLERANCE {
            errors.push(ValidationError::totals(
                "breakdown",
                format!(
                    "a simplified invoice may not exceed {SIMPLIFIED_INVOICE_LIMIT} (got {simplified_total})"
                ),
            ));
        }
    }

    errors
}

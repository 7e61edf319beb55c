use chrono::NaiveDate;
use serde::Serialize;

use super::error::{RecordError, ValidationError, into_result, reject};
use super::primitives::{
    DateInput, format_date, serialize_wire_date, validate_epoch, validate_past_date,
};
use super::tax_id::validate_tax_id;

const MAX_SERIES_NUMBER: usize = 60;

/// Natural key of a record: issuer, series + number, issue date (`IDFactura`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InvoiceId {
    issuer_tax_id: String,
    series_number: String,
    #[serde(serialize_with = "serialize_wire_date")]
    issue_date: NaiveDate,
}

impl InvoiceId {
    /// Validate and build an invoice identity.
    ///
    /// The issue date must not be after `today` nor before the protocol epoch.
    pub fn new(
        issuer_tax_id: &str,
        series_number: impl Into<String>,
        issue_date: impl Into<DateInput>,
        today: NaiveDate,
    ) -> Result<Self, RecordError> {
        let series_number = series_number.into();
        let mut errors = Vec::new();

        if let Err(e) = validate_tax_id(issuer_tax_id) {
            errors.push(ValidationError::field("issuer_tax_id", e.to_string()));
        }
        check_series_number("series_number", &series_number, &mut errors);
        let issue_date = match validate_past_date(issue_date, today).and_then(validate_epoch) {
            Ok(date) => Some(date),
            Err(e) => {
                errors.push(e.at("issue_date"));
                None
            }
        };

        let Some(issue_date) = issue_date else {
            return Err(reject(errors));
        };
        into_result(errors, || Self {
            issuer_tax_id: issuer_tax_id.to_ascii_uppercase(),
            series_number,
            issue_date,
        })
    }

    /// Build an identity whose parts were already checked.
    pub(crate) fn from_checked(issuer_tax_id: String, series_number: String, issue_date: NaiveDate) -> Self {
        Self {
            issuer_tax_id,
            series_number,
            issue_date,
        }
    }

    pub fn issuer_tax_id(&self) -> &str {
        &self.issuer_tax_id
    }

    pub fn series_number(&self) -> &str {
        &self.series_number
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    /// Issue date in wire format (`dd-mm-yyyy`).
    pub fn issue_date_text(&self) -> String {
        format_date(self.issue_date)
    }
}

/// Series numbers: 1 to 60 printable ASCII characters, none of `" ' < > =`.
pub(crate) fn check_series_number(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    let len = value.chars().count();
    if len == 0 {
        errors.push(ValidationError::field(field, "must not be empty"));
        return;
    }
    if len > MAX_SERIES_NUMBER {
        errors.push(ValidationError::field(
            field,
            format!("must have at most {MAX_SERIES_NUMBER} characters, got {len}"),
        ));
    }
    if !value.chars().all(|c| (' '..='~').contains(&c)) {
        errors.push(ValidationError::field(
            field,
            "must contain only printable ASCII characters",
        ));
    }
    if value.chars().any(|c| matches!(c, '"' | '\'' | '<' | '>' | '=')) {
        errors.push(ValidationError::field(
            field,
            "must not contain any of \" ' < > =",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    }

    #[test]
    fn valid_identity() {
        let id = InvoiceId::new("b12345674", "NC202500051", "22-07-2025", today()).unwrap();
        assert_eq!(id.issuer_tax_id(), "B12345674");
        assert_eq!(id.series_number(), "NC202500051");
        assert_eq!(id.issue_date_text(), "22-07-2025");
    }

    #[test]
    fn issue_date_window() {
        assert!(InvoiceId::new("B12345674", "A1", "28-10-2024", today()).is_ok());
        let err = InvoiceId::new("B12345674", "A1", "27-10-2024", today()).unwrap_err();
        assert!(err.has_field("issue_date"));
        let err = InvoiceId::new("B12345674", "A1", "02-08-2025", today()).unwrap_err();
        assert!(err.has_field("issue_date"));
    }

    #[test]
    fn series_number_characters() {
        for bad in ["A\"1", "A'1", "A<1", "A>1", "A=1", "Añ1", ""] {
            let err = InvoiceId::new("B12345674", bad, "22-07-2025", today()).unwrap_err();
            assert!(err.has_field("series_number"), "accepted {bad:?}");
        }
    }

    #[test]
    fn all_violations_reported() {
        let err = InvoiceId::new("B12345675", "", "2025-07-22", today()).unwrap_err();
        assert_eq!(err.errors().len(), 3);
    }

    #[test]
    fn ordering_is_by_issuer_then_series() {
        let a = InvoiceId::new("B12345674", "A2", "01-07-2025", today()).unwrap();
        let b = InvoiceId::new("B12345674", "B1", "01-01-2025", today()).unwrap();
        assert!(a < b);
    }
}

//! Tax breakdown lines (`DetalleDesglose`) and their compatibility matrix.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::codes::{ExemptionReason, Qualification, RegimeKey, TaxCode};
use super::error::{RecordError, ValidationError, into_result, reject};
use super::primitives::check_amount;

/// VAT rates accepted for S1 lines.
pub const VAT_RATES: [Decimal; 7] = [
    dec!(0),
    dec!(2),
    dec!(4),
    dec!(5),
    dec!(7.5),
    dec!(10),
    dec!(21),
];

/// Equivalence surcharge rates accepted for VAT S1 lines.
pub const SURCHARGE_RATES: [Decimal; 8] = [
    dec!(0),
    dec!(0.26),
    dec!(0.5),
    dec!(0.62),
    dec!(1),
    dec!(1.4),
    dec!(1.75),
    dec!(5.2),
];

/// Absolute tolerance, in euros, of every amount reconciliation.
pub const AMOUNT_TOLERANCE: Decimal = dec!(10);

const MAX_AMOUNT_DIGITS: usize = 12;
const MAX_RATE_DIGITS: usize = 3;

/// Surcharge rates that may accompany a VAT rate. `None` means any listed rate.
pub fn surcharge_rates_for(tax_rate: Decimal) -> Option<&'static [Decimal]> {
    const R21: [Decimal; 2] = [dec!(5.2), dec!(1.75)];
    const R10: [Decimal; 1] = [dec!(1.4)];
    const R7_5: [Decimal; 1] = [dec!(1)];
    const R5: [Decimal; 2] = [dec!(0.5), dec!(0.62)];
    const R4: [Decimal; 1] = [dec!(0.5)];
    const R2: [Decimal; 1] = [dec!(0.26)];

    if tax_rate == dec!(21) {
        Some(&R21)
    } else if tax_rate == dec!(10) {
        Some(&R10)
    } else if tax_rate == dec!(7.5) {
        Some(&R7_5)
    } else if tax_rate == dec!(5) {
        Some(&R5)
    } else if tax_rate == dec!(4) {
        Some(&R4)
    } else if tax_rate == dec!(2) {
        Some(&R2)
    } else {
        None
    }
}

/// Whether a line is a taxed operation or an exempt one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LineTreatment {
    Taxed {
        qualification: Qualification,
        tax_rate: Option<Decimal>,
        charged_tax: Option<Decimal>,
        surcharge_rate: Option<Decimal>,
        surcharge_amount: Option<Decimal>,
    },
    Exempt {
        reason: ExemptionReason,
    },
}

/// One validated tax line of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownDetail {
    tax_code: TaxCode,
    regime_key: Option<RegimeKey>,
    treatment: LineTreatment,
    taxable_base: Decimal,
    cost_basis: Option<Decimal>,
}

impl BreakdownDetail {
    pub fn tax_code(&self) -> TaxCode {
        self.tax_code
    }

    pub fn regime_key(&self) -> Option<RegimeKey> {
        self.regime_key
    }

    pub fn treatment(&self) -> &LineTreatment {
        &self.treatment
    }

    pub fn is_exempt(&self) -> bool {
        matches!(self.treatment, LineTreatment::Exempt { .. })
    }

    pub fn qualification(&self) -> Option<Qualification> {
        match self.treatment {
            LineTreatment::Taxed { qualification, .. } => Some(qualification),
            LineTreatment::Exempt { .. } => None,
        }
    }

    pub fn exemption_reason(&self) -> Option<ExemptionReason> {
        match self.treatment {
            LineTreatment::Taxed { .. } => None,
            LineTreatment::Exempt { reason } => Some(reason),
        }
    }

    pub fn tax_rate(&self) -> Option<Decimal> {
        match self.treatment {
            LineTreatment::Taxed { tax_rate, .. } => tax_rate,
            LineTreatment::Exempt { .. } => None,
        }
    }

    pub fn charged_tax(&self) -> Option<Decimal> {
        match self.treatment {
            LineTreatment::Taxed { charged_tax, .. } => charged_tax,
            LineTreatment::Exempt { .. } => None,
        }
    }

    pub fn surcharge_rate(&self) -> Option<Decimal> {
        match self.treatment {
            LineTreatment::Taxed { surcharge_rate, .. } => surcharge_rate,
            LineTreatment::Exempt { .. } => None,
        }
    }

    pub fn surcharge_amount(&self) -> Option<Decimal> {
        match self.treatment {
            LineTreatment::Taxed {
                surcharge_amount, ..
            } => surcharge_amount,
            LineTreatment::Exempt { .. } => None,
        }
    }

    /// Taxable base, or the non-subject amount for N1/N2 lines.
    pub fn taxable_base(&self) -> Decimal {
        self.taxable_base
    }

    pub fn cost_basis(&self) -> Option<Decimal> {
        self.cost_basis
    }

    /// True if the line falls under `key` and its tax uses the regime matrix.
    pub fn has_regime(&self, key: RegimeKey) -> bool {
        self.tax_code.has_regime_matrix() && self.regime_key == Some(key)
    }

    /// Charged tax plus surcharge amount, absent values counting as zero.
    pub fn tax_with_surcharge(&self) -> Decimal {
        self.charged_tax().unwrap_or_default() + self.surcharge_amount().unwrap_or_default()
    }

    /// Check the charged tax against `base × rate / 100`.
    ///
    /// Fails when charged tax and base have opposite signs or when they
    /// differ by more than [`AMOUNT_TOLERANCE`].
    pub fn tax_consistency_check(&self) -> bool {
        let charged = self.charged_tax().unwrap_or_default();
        let rate = self.tax_rate().unwrap_or_default();
        if charged * self.taxable_base < Decimal::ZERO {
            return false;
        }
        let expected = self.taxable_base * rate / dec!(100);
        (charged - expected).abs() <= AMOUNT_TOLERANCE
    }
}

#[derive(Clone, Copy)]
enum Path {
    Taxed(Qualification),
    Exempt(ExemptionReason),
}

/// Builder for [`BreakdownDetail`]. Amounts are given as wire strings.
///
/// ```
/// use verifactu::core::*;
///
/// let line = BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, "264.46")
///     .regime_key(RegimeKey::GENERAL)
///     .tax_rate("21")
///     .charged_tax("55.54")
///     .build()
///     .unwrap();
/// assert!(line.tax_consistency_check());
/// ```
pub struct BreakdownBuilder {
    tax_code: TaxCode,
    path: Path,
    regime_key: Option<RegimeKey>,
    taxable_base: String,
    cost_basis: Option<String>,
    tax_rate: Option<String>,
    charged_tax: Option<String>,
    surcharge_rate: Option<String>,
    surcharge_amount: Option<String>,
}

impl BreakdownBuilder {
    /// A subject operation with the given qualification.
    pub fn taxed(
        tax_code: TaxCode,
        qualification: Qualification,
        taxable_base: impl Into<String>,
    ) -> Self {
        Self::with_path(tax_code, Path::Taxed(qualification), taxable_base.into())
    }

    /// An exempt operation.
    pub fn exempt(
        tax_code: TaxCode,
        reason: ExemptionReason,
        taxable_base: impl Into<String>,
    ) -> Self {
        Self::with_path(tax_code, Path::Exempt(reason), taxable_base.into())
    }

    fn with_path(tax_code: TaxCode, path: Path, taxable_base: String) -> Self {
        Self {
            tax_code,
            path,
            regime_key: None,
            taxable_base,
            cost_basis: None,
            tax_rate: None,
            charged_tax: None,
            surcharge_rate: None,
            surcharge_amount: None,
        }
    }

    pub fn regime_key(mut self, key: RegimeKey) -> Self {
        self.regime_key = Some(key);
        self
    }

    pub fn cost_basis(mut self, amount: impl Into<String>) -> Self {
        self.cost_basis = Some(amount.into());
        self
    }

    pub fn tax_rate(mut self, rate: impl Into<String>) -> Self {
        self.tax_rate = Some(rate.into());
        self
    }

    pub fn charged_tax(mut self, amount: impl Into<String>) -> Self {
        self.charged_tax = Some(amount.into());
        self
    }

    pub fn surcharge_rate(mut self, rate: impl Into<String>) -> Self {
        self.surcharge_rate = Some(rate.into());
        self
    }

    pub fn surcharge_amount(mut self, amount: impl Into<String>) -> Self {
        self.surcharge_amount = Some(amount.into());
        self
    }

    /// Validate the line, reporting every violation.
    pub fn build(self) -> Result<BreakdownDetail, RecordError> {
        let mut errors = Vec::new();
        let tax = self.tax_code;

        let taxable_base = check_amount("taxable_base", &self.taxable_base, MAX_AMOUNT_DIGITS, &mut errors);
        let cost_basis = optional_amount("cost_basis", self.cost_basis.as_deref(), MAX_AMOUNT_DIGITS, &mut errors);
        let tax_rate = optional_amount("tax_rate", self.tax_rate.as_deref(), MAX_RATE_DIGITS, &mut errors);
        let charged_tax = optional_amount("charged_tax", self.charged_tax.as_deref(), MAX_AMOUNT_DIGITS, &mut errors);
        let surcharge_rate = optional_amount("surcharge_rate", self.surcharge_rate.as_deref(), MAX_RATE_DIGITS, &mut errors);
        let surcharge_amount = optional_amount("surcharge_amount", self.surcharge_amount.as_deref(), MAX_AMOUNT_DIGITS, &mut errors);

        match self.regime_key {
            None if tax.has_regime_matrix() => {
                errors.push(ValidationError::field(
                    "regime_key",
                    format!("is required for tax {tax}"),
                ));
            }
            Some(key) if !key.is_valid_for(tax) => {
                errors.push(ValidationError::field(
                    "regime_key",
                    format!("'{key}' is not a regime key of tax {tax}"),
                ));
            }
            _ => {}
        }

        if self.cost_basis.is_some()
            && self.regime_key != Some(RegimeKey::ENTITY_GROUP)
            && !matches!(tax, TaxCode::Ipsi | TaxCode::Other)
        {
            errors.push(ValidationError::combination(
                "cost_basis",
                "only allowed with regime key 06 or tax 02 (IPSI) / 05 (other)",
            ));
        }

        let treatment = match self.path {
            Path::Taxed(qualification) => {
                check_qualification(
                    tax,
                    qualification,
                    &self,
                    tax_rate,
                    surcharge_rate,
                    charged_tax,
                    &mut errors,
                );
                LineTreatment::Taxed {
                    qualification,
                    tax_rate,
                    charged_tax,
                    surcharge_rate,
                    surcharge_amount,
                }
            }
            Path::Exempt(reason) => {
                if !reason.is_valid_for(tax) {
                    errors.push(ValidationError::field(
                        "exemption_reason",
                        format!("'{reason}' is not an exemption reason of tax {tax}"),
                    ));
                }
                for (field, value) in [
                    ("tax_rate", &self.tax_rate),
                    ("charged_tax", &self.charged_tax),
                    ("surcharge_rate", &self.surcharge_rate),
                    ("surcharge_amount", &self.surcharge_amount),
                ] {
                    if value.is_some() {
                        errors.push(ValidationError::combination(
                            field,
                            "must be absent on an exempt line",
                        ));
                    }
                }
                LineTreatment::Exempt { reason }
            }
        };

        if let Some(key) = self.regime_key.filter(|_| tax.has_regime_matrix()) {
            check_regime(tax, key, &treatment, tax_rate, self.cost_basis.is_some(), &mut errors);
        }

        let Some(taxable_base) = taxable_base else {
            return Err(reject(errors));
        };
        into_result(errors, || BreakdownDetail {
            tax_code: tax,
            regime_key: self.regime_key,
            treatment,
            taxable_base,
            cost_basis,
        })
    }
}

fn optional_amount(
    field: &str,
    raw: Option<&str>,
    max_int_digits: usize,
    errors: &mut Vec<ValidationError>,
) -> Option<Decimal> {
    raw.and_then(|raw| check_amount(field, raw, max_int_digits, errors))
}

fn check_qualification(
    tax: TaxCode,
    qualification: Qualification,
    raw: &BreakdownBuilder,
    tax_rate: Option<Decimal>,
    surcharge_rate: Option<Decimal>,
    charged_tax: Option<Decimal>,
    errors: &mut Vec<ValidationError>,
) {
    match qualification {
        Qualification::S2 => {
            if raw.tax_rate.is_none() || tax_rate.is_some_and(|r| !r.is_zero()) {
                errors.push(ValidationError::combination("tax_rate", "must be 0 for qualification S2"));
            }
            if raw.charged_tax.is_none() || charged_tax.is_some_and(|c| !c.is_zero()) {
                errors.push(ValidationError::combination("charged_tax", "must be 0 for qualification S2"));
            }
        }
        Qualification::S1 => {
            if raw.tax_rate.is_none() {
                errors.push(ValidationError::combination("tax_rate", "is required for qualification S1"));
            }
            if tax == TaxCode::Vat {
                check_vat_rates(tax_rate, surcharge_rate, errors);
            }
        }
        Qualification::N1 | Qualification::N2 => {
            for (field, value) in [
                ("tax_rate", &raw.tax_rate),
                ("charged_tax", &raw.charged_tax),
                ("surcharge_rate", &raw.surcharge_rate),
                ("surcharge_amount", &raw.surcharge_amount),
            ] {
                if value.is_some() {
                    errors.push(ValidationError::combination(
                        field,
                        format!("must be absent for qualification {qualification}"),
                    ));
                }
            }
        }
    }
}

fn check_vat_rates(
    tax_rate: Option<Decimal>,
    surcharge_rate: Option<Decimal>,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(rate) = tax_rate {
        if !VAT_RATES.contains(&rate) {
            errors.push(ValidationError::field(
                "tax_rate",
                format!("{rate} is not a VAT rate (0, 2, 4, 5, 7.5, 10, 21)"),
            ));
        }
    }
    let Some(surcharge) = surcharge_rate else {
        return;
    };
    if !SURCHARGE_RATES.contains(&surcharge) {
        errors.push(ValidationError::field(
            "surcharge_rate",
            format!("{surcharge} is not an equivalence surcharge rate"),
        ));
        return;
    }
    if surcharge.is_zero() {
        return;
    }
    if let Some(allowed) = tax_rate.and_then(surcharge_rates_for) {
        if !allowed.contains(&surcharge) {
            let listed: Vec<String> = allowed.iter().map(Decimal::to_string).collect();
            errors.push(ValidationError::combination(
                "surcharge_rate",
                format!(
                    "surcharge {surcharge} does not pair with VAT rate {}; expected {}",
                    tax_rate.unwrap_or_default(),
                    listed.join(" or ")
                ),
            ));
        }
    }
}

fn check_regime(
    tax: TaxCode,
    key: RegimeKey,
    treatment: &LineTreatment,
    tax_rate: Option<Decimal>,
    has_cost_basis: bool,
    errors: &mut Vec<ValidationError>,
) {
    let qualification = match treatment {
        LineTreatment::Taxed { qualification, .. } => Some(*qualification),
        LineTreatment::Exempt { .. } => None,
    };
    let mut fail = |message: &str| {
        errors.push(ValidationError::combination(
            "regime_key",
            format!("regime {key}: {message}"),
        ));
    };

    match key {
        RegimeKey::EXPORT if qualification.is_some() => fail("requires an exempt line"),
        RegimeKey::USED_GOODS if qualification.is_some_and(|q| q != Qualification::S1) => {
            fail("qualification must be S1")
        }
        RegimeKey::INVESTMENT_GOLD if qualification.is_some_and(|q| q != Qualification::S2) => {
            fail("qualification must be S2")
        }
        RegimeKey::ENTITY_GROUP if !has_cost_basis => fail("cost basis is required"),
        RegimeKey::CASH_ACCOUNTING => match treatment {
            LineTreatment::Taxed { qualification, .. } if *qualification != Qualification::S1 => {
                fail("qualification cannot be S2, N1 or N2")
            }
            LineTreatment::Exempt { reason }
                if matches!(
                    reason,
                    ExemptionReason::E2
                        | ExemptionReason::E3
                        | ExemptionReason::E4
                        | ExemptionReason::E5
                ) =>
            {
                fail("exemption reason cannot be E2, E3, E4 or E5")
            }
            _ => {}
        },
        RegimeKey::OTHER_INDIRECT_TAX if qualification != Some(Qualification::N2) => {
            fail("qualification must be N2")
        }
        RegimeKey::THIRD_PARTY_COLLECTION if qualification != Some(Qualification::N1) => {
            fail("qualification must be N1")
        }
        RegimeKey::PREMISES_LEASE if tax == TaxCode::Vat && tax_rate != Some(dec!(21)) => {
            fail("VAT rate must be 21")
        }
        _ => {}
    }
}

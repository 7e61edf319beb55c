//! Closed code lists of the registration protocol.
//!
//! Every list has a `code()` returning the wire value and a `from_code()`
//! parser. Parsers accept lower-case input and normalize it to upper case;
//! this is the only normalization applied to coded fields.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! code_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.code())
                }
            }
        )*
    };
}

/// L1 — Tax the breakdown line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxCode {
    /// 01 — Value added tax (IVA).
    Vat,
    /// 02 — Ceuta and Melilla production, services and import tax (IPSI).
    Ipsi,
    /// 03 — Canary Islands general indirect tax (IGIC).
    Igic,
    /// 05 — Other taxes.
    Other,
}

impl TaxCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Vat => "01",
            Self::Ipsi => "02",
            Self::Igic => "03",
            Self::Other => "05",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(Self::Vat),
            "02" => Some(Self::Ipsi),
            "03" => Some(Self::Igic),
            "05" => Some(Self::Other),
            _ => None,
        }
    }

    /// VAT and IGIC carry the regime-key matrix.
    pub fn has_regime_matrix(&self) -> bool {
        matches!(self, Self::Vat | Self::Igic)
    }
}

/// L2 — Invoice type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceType {
    /// F1 — Invoice.
    F1,
    /// F2 — Simplified invoice.
    F2,
    /// F3 — Invoice replacing previously declared simplified invoices.
    F3,
    /// R1 — Rectifying invoice (Art. 80.1, 80.2 and 80.6).
    R1,
    /// R2 — Rectifying invoice (Art. 80.3).
    R2,
    /// R3 — Rectifying invoice (Art. 80.4).
    R3,
    /// R4 — Rectifying invoice (other cases).
    R4,
    /// R5 — Rectifying simplified invoice.
    R5,
}

impl InvoiceType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::F1 => "F1",
            Self::F2 => "F2",
            Self::F3 => "F3",
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::R3 => "R3",
            Self::R4 => "R4",
            Self::R5 => "R5",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "F1" => Some(Self::F1),
            "F2" => Some(Self::F2),
            "F3" => Some(Self::F3),
            "R1" => Some(Self::R1),
            "R2" => Some(Self::R2),
            "R3" => Some(Self::R3),
            "R4" => Some(Self::R4),
            "R5" => Some(Self::R5),
            _ => None,
        }
    }

    /// R1 to R5.
    pub fn is_rectification(&self) -> bool {
        matches!(self, Self::R1 | Self::R2 | Self::R3 | Self::R4 | Self::R5)
    }

    /// F2 and R5 never identify a recipient.
    pub fn is_simplified(&self) -> bool {
        matches!(self, Self::F2 | Self::R5)
    }

    /// F1, F3 and R1 to R4 must identify at least one recipient.
    pub fn requires_recipients(&self) -> bool {
        !self.is_simplified()
    }
}

/// L3 — How a rectifying invoice corrects the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RectificationType {
    /// S — By substitution.
    Substitution,
    /// I — By difference.
    Difference,
}

impl RectificationType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Substitution => "S",
            Self::Difference => "I",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "S" => Some(Self::Substitution),
            "I" => Some(Self::Difference),
            _ => None,
        }
    }
}

/// L9 — Operation qualification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qualification {
    /// S1 — Subject and not exempt, no reverse charge.
    S1,
    /// S2 — Subject and not exempt, reverse charge.
    S2,
    /// N1 — Not subject (Art. 7, 14 and others).
    N1,
    /// N2 — Not subject by location rules.
    N2,
}

impl Qualification {
    pub fn code(&self) -> &'static str {
        match self {
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::N1 => "N1",
            Self::N2 => "N2",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "S1" => Some(Self::S1),
            "S2" => Some(Self::S2),
            "N1" => Some(Self::N1),
            "N2" => Some(Self::N2),
            _ => None,
        }
    }

    pub fn is_not_subject(&self) -> bool {
        matches!(self, Self::N1 | Self::N2)
    }
}

/// L10 / L10B — Exemption reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExemptionReason {
    E1,
    E2,
    E3,
    E4,
    E5,
    E6,
    /// IGIC only.
    E7,
    /// IGIC only.
    E8,
}

impl ExemptionReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::E1 => "E1",
            Self::E2 => "E2",
            Self::E3 => "E3",
            Self::E4 => "E4",
            Self::E5 => "E5",
            Self::E6 => "E6",
            Self::E7 => "E7",
            Self::E8 => "E8",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "E1" => Some(Self::E1),
            "E2" => Some(Self::E2),
            "E3" => Some(Self::E3),
            "E4" => Some(Self::E4),
            "E5" => Some(Self::E5),
            "E6" => Some(Self::E6),
            "E7" => Some(Self::E7),
            "E8" => Some(Self::E8),
            _ => None,
        }
    }

    /// Whether this reason exists in the list of the given tax.
    pub fn is_valid_for(&self, tax: TaxCode) -> bool {
        match tax {
            TaxCode::Vat => !matches!(self, Self::E7 | Self::E8),
            TaxCode::Igic | TaxCode::Ipsi | TaxCode::Other => true,
        }
    }
}

/// L8A / L8B — Regime key ("ClaveRegimen").
///
/// VAT accepts 01 to 20, IGIC 01 to 21. Values outside 01 to 21 cannot be
/// constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RegimeKey(u8);

/// A regime key number outside 01 to 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("regime key {0} is outside 01 to 21")]
pub struct InvalidRegimeKey(pub u8);

impl RegimeKey {
    /// Checked constructor for keys without a named constant.
    pub const fn new(value: u8) -> Option<Self> {
        if matches!(value, 1..=21) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The key number, e.g. 1 for "01".
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// 01 — General regime operation.
    pub const GENERAL: Self = Self(1);
    /// 02 — Export.
    pub const EXPORT: Self = Self(2);
    /// 03 — Used goods, works of art, antiques and collectors' items.
    pub const USED_GOODS: Self = Self(3);
    /// 04 — Investment gold.
    pub const INVESTMENT_GOLD: Self = Self(4);
    /// 05 — Travel agencies.
    pub const TRAVEL_AGENCY: Self = Self(5);
    /// 06 — Group of entities, advanced level (cost accounting).
    pub const ENTITY_GROUP: Self = Self(6);
    /// 07 — Cash accounting.
    pub const CASH_ACCOUNTING: Self = Self(7);
    /// 08 — Operations subject to another indirect tax (IPSI / IGIC / VAT).
    pub const OTHER_INDIRECT_TAX: Self = Self(8);
    /// 09 — Travel agency mediation services invoiced on behalf of others.
    pub const TRAVEL_AGENCY_MEDIATION: Self = Self(9);
    /// 10 — Collection on behalf of third parties.
    pub const THIRD_PARTY_COLLECTION: Self = Self(10);
    /// 11 — Business premises lease.
    pub const PREMISES_LEASE: Self = Self(11);
    /// 14 — Tax pending accrual in public works certifications.
    pub const PUBLIC_WORKS_PENDING: Self = Self(14);
    /// 15 — Tax pending accrual in successive tract operations.
    pub const SUCCESSIVE_TRACT_PENDING: Self = Self(15);

    /// Lines with these keys do not count towards the invoice total amount.
    pub const EXCLUDED_FROM_TOTAL: [Self; 5] = [
        Self::USED_GOODS,
        Self::TRAVEL_AGENCY,
        Self::ENTITY_GROUP,
        Self::OTHER_INDIRECT_TAX,
        Self::TRAVEL_AGENCY_MEDIATION,
    ];

    /// Two-digit wire code, e.g. "01".
    pub fn code(&self) -> String {
        format!("{:02}", self.0)
    }

    /// Parse a two-digit code in the 01 to 21 range.
    pub fn from_code(code: &str) -> Option<Self> {
        if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Self::new(code.parse().ok()?)
    }

    /// Whether this key exists in the list of the given tax.
    pub fn is_valid_for(&self, tax: TaxCode) -> bool {
        match tax {
            TaxCode::Vat => (1..=20).contains(&self.0),
            TaxCode::Igic | TaxCode::Ipsi | TaxCode::Other => (1..=21).contains(&self.0),
        }
    }

    pub fn counts_towards_total(&self) -> bool {
        !Self::EXCLUDED_FROM_TOTAL.contains(self)
    }

    /// Keys whose operation date may lie in the future.
    pub fn allows_future_operation(&self) -> bool {
        *self == Self::PUBLIC_WORKS_PENDING || *self == Self::SUCCESSIVE_TRACT_PENDING
    }
}

/// L7 — Kind of foreign identification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForeignIdType {
    /// 02 — VAT number of another member state.
    NifVat,
    /// 03 — Passport.
    Passport,
    /// 04 — Official identity document of the country of residence.
    IdentityDocument,
    /// 05 — Certificate of residence.
    ResidenceCertificate,
    /// 06 — Other supporting document.
    OtherDocument,
    /// 07 — Not registered.
    Unregistered,
}

impl ForeignIdType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NifVat => "02",
            Self::Passport => "03",
            Self::IdentityDocument => "04",
            Self::ResidenceCertificate => "05",
            Self::OtherDocument => "06",
            Self::Unregistered => "07",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "02" => Some(Self::NifVat),
            "03" => Some(Self::Passport),
            "04" => Some(Self::IdentityDocument),
            "05" => Some(Self::ResidenceCertificate),
            "06" => Some(Self::OtherDocument),
            "07" => Some(Self::Unregistered),
            _ => None,
        }
    }
}

/// L6 — Who issued the invoice on behalf of the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssuedBy {
    /// D — The recipient.
    Recipient,
    /// T — A third party.
    ThirdParty,
}

impl IssuedBy {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Recipient => "D",
            Self::ThirdParty => "T",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "D" => Some(Self::Recipient),
            "T" => Some(Self::ThirdParty),
            _ => None,
        }
    }
}

/// L16 — Who generated a cancellation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratedBy {
    /// E — The issuer.
    Issuer,
    /// D — The recipient.
    Recipient,
    /// T — A third party.
    ThirdParty,
}

impl GeneratedBy {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Issuer => "E",
            Self::Recipient => "D",
            Self::ThirdParty => "T",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "E" => Some(Self::Issuer),
            "D" => Some(Self::Recipient),
            "T" => Some(Self::ThirdParty),
            _ => None,
        }
    }
}

/// L17 — Previous rejection indicator for a correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreviousRejection {
    /// N — Correcting a record that was accepted.
    No,
    /// S — Correcting a record that was rejected.
    Yes,
    /// X — No previous record exists.
    NoPreviousRecord,
}

impl PreviousRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::No => "N",
            Self::Yes => "S",
            Self::NoPreviousRecord => "X",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "N" => Some(Self::No),
            "S" => Some(Self::Yes),
            "X" => Some(Self::NoPreviousRecord),
            _ => None,
        }
    }
}

/// L12 — Fingerprint algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FingerprintType {
    /// 01 — SHA-256.
    #[default]
    Sha256,
}

impl FingerprintType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sha256 => "01",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(Self::Sha256),
            _ => None,
        }
    }
}

impl TryFrom<u8> for RegimeKey {
    type Error = InvalidRegimeKey;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidRegimeKey(value))
    }
}

impl From<RegimeKey> for u8 {
    fn from(key: RegimeKey) -> Self {
        key.0
    }
}

code_display!(
    TaxCode,
    InvoiceType,
    RectificationType,
    Qualification,
    ExemptionReason,
    RegimeKey,
    ForeignIdType,
    IssuedBy,
    GeneratedBy,
    PreviousRejection,
    FingerprintType,
);

//! Parties: issuer, recipients, third parties, representatives.

use serde::Serialize;

use super::codes::ForeignIdType;
use super::config::TextPolicy;
use super::countries::is_allowed_country_code;
use super::error::{RecordError, ValidationError, into_result};
use super::primitives::{check_text, printable_message, validate_printable_ascii};
use super::tax_id::validate_tax_id;

const MAX_BUSINESS_NAME: usize = 120;
const MAX_FOREIGN_ID: usize = 20;

/// Identification of a party outside the Spanish NIF registry (`IDOtro`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ForeignId {
    country_code: Option<String>,
    id_type: ForeignIdType,
    id: String,
}

impl ForeignId {
    /// Build a foreign identification.
    ///
    /// The country code may only be omitted for [`ForeignIdType::NifVat`].
    /// A Spanish (`ES`) country code is only valid for passports and
    /// unregistered parties.
    pub fn new(
        country_code: Option<&str>,
        id_type: ForeignIdType,
        id: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let id = id.into();
        let mut errors = Vec::new();

        let country_code = country_code.map(str::to_ascii_uppercase);
        match &country_code {
            Some(code) if !is_allowed_country_code(code) => {
                errors.push(ValidationError::field(
                    "country_code",
                    format!("'{code}' is not an accepted country code"),
                ));
            }
            Some(code) if code == "ES" => {
                if !matches!(id_type, ForeignIdType::Passport | ForeignIdType::Unregistered) {
                    errors.push(ValidationError::combination(
                        "id_type",
                        format!(
                            "country ES only allows passport (03) or unregistered (07), got {}",
                            id_type.code()
                        ),
                    ));
                }
            }
            Some(_) => {}
            None if id_type != ForeignIdType::NifVat => {
                errors.push(ValidationError::combination(
                    "country_code",
                    format!("is required for id type {}", id_type.code()),
                ));
            }
            None => {}
        }

        let len = id.chars().count();
        if len == 0 || len > MAX_FOREIGN_ID {
            errors.push(ValidationError::field(
                "id",
                format!("must have 1 to {MAX_FOREIGN_ID} characters, got {len}"),
            ));
        }
        // The identifier is not free text; markup characters are never valid.
        if !validate_printable_ascii(&id, TextPolicy::STRICT) {
            errors.push(ValidationError::field("id", printable_message(TextPolicy::STRICT)));
        }

        into_result(errors, || Self {
            country_code,
            id_type,
            id,
        })
    }

    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    pub fn id_type(&self) -> ForeignIdType {
        self.id_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// How a party is identified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum PartyIdentity {
    /// Spanish NIF, stored upper-cased.
    TaxId(String),
    Foreign(ForeignId),
}

/// A natural or legal person (`PersonaFisicaJuridica`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LegalEntity {
    business_name: String,
    identity: PartyIdentity,
}

impl LegalEntity {
    /// A party identified by a Spanish tax ID.
    pub fn from_tax_id(
        business_name: impl Into<String>,
        tax_id: &str,
    ) -> Result<Self, RecordError> {
        Self::from_tax_id_with_policy(business_name, tax_id, TextPolicy::default())
    }

    pub fn from_tax_id_with_policy(
        business_name: impl Into<String>,
        tax_id: &str,
        policy: TextPolicy,
    ) -> Result<Self, RecordError> {
        let business_name = business_name.into();
        let mut errors = Vec::new();
        check_name(&business_name, policy, &mut errors);
        if let Err(e) = validate_tax_id(tax_id) {
            errors.push(ValidationError::field("tax_id", e.to_string()));
        }
        into_result(errors, || Self {
            business_name,
            identity: PartyIdentity::TaxId(tax_id.to_ascii_uppercase()),
        })
    }

    /// A party identified by a foreign document.
    pub fn from_foreign_id(
        business_name: impl Into<String>,
        foreign_id: ForeignId,
    ) -> Result<Self, RecordError> {
        Self::from_foreign_id_with_policy(business_name, foreign_id, TextPolicy::default())
    }

    pub fn from_foreign_id_with_policy(
        business_name: impl Into<String>,
        foreign_id: ForeignId,
        policy: TextPolicy,
    ) -> Result<Self, RecordError> {
        let business_name = business_name.into();
        let mut errors = Vec::new();
        check_name(&business_name, policy, &mut errors);
        into_result(errors, || Self {
            business_name,
            identity: PartyIdentity::Foreign(foreign_id),
        })
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    pub fn identity(&self) -> &PartyIdentity {
        &self.identity
    }

    /// The Spanish tax ID, if the party has one.
    pub fn tax_id(&self) -> Option<&str> {
        match &self.identity {
            PartyIdentity::TaxId(id) => Some(id),
            PartyIdentity::Foreign(_) => None,
        }
    }

    pub fn foreign_id(&self) -> Option<&ForeignId> {
        match &self.identity {
            PartyIdentity::TaxId(_) => None,
            PartyIdentity::Foreign(foreign) => Some(foreign),
        }
    }

    /// True for a foreign identification of type 07 (not registered).
    pub fn is_unregistered(&self) -> bool {
        self.foreign_id()
            .is_some_and(|f| f.id_type() == ForeignIdType::Unregistered)
    }
}

fn check_name(name: &str, policy: TextPolicy, errors: &mut Vec<ValidationError>) {
    check_text("business_name", name, 1, MAX_BUSINESS_NAME, policy, errors);
}

/// Require a party to be identified by a Spanish tax ID.
pub(crate) fn require_tax_id(
    party: &LegalEntity,
    field: &str,
    errors: &mut Vec<ValidationError>,
) {
    if party.tax_id().is_none() {
        errors.push(ValidationError::combination(
            field,
            "must be identified by a Spanish tax ID",
        ));
    }
}

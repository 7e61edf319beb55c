use serde::Serialize;

use super::config::TextPolicy;
use super::error::{RecordError, ValidationError, into_result};
use super::party::LegalEntity;
use super::primitives::check_text;

/// The billing software that produced a record (`SistemaInformatico`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InformationSystem {
    owner: LegalEntity,
    system_name: Option<String>,
    system_id: String,
    version: String,
    installation_number: String,
    verifactu_only: bool,
    multi_ot_usage: bool,
    multiple_ot: bool,
}

impl InformationSystem {
    /// The producer of the software.
    pub fn owner(&self) -> &LegalEntity {
        &self.owner
    }

    pub fn system_name(&self) -> Option<&str> {
        self.system_name.as_deref()
    }

    /// Two-character identifier, upper-cased.
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn installation_number(&self) -> &str {
        &self.installation_number
    }

    /// `TipoUsoPosibleSoloVerifactu`.
    pub fn verifactu_only(&self) -> bool {
        self.verifactu_only
    }

    /// `TipoUsoPosibleMultiOT`.
    pub fn multi_ot_usage(&self) -> bool {
        self.multi_ot_usage
    }

    /// `IndicadorMultiplesOT`.
    pub fn multiple_ot(&self) -> bool {
        self.multiple_ot
    }
}

/// Builder for [`InformationSystem`].
pub struct InformationSystemBuilder {
    owner: LegalEntity,
    system_name: Option<String>,
    system_id: String,
    version: String,
    installation_number: String,
    verifactu_only: bool,
    multi_ot_usage: bool,
    multiple_ot: bool,
    text_policy: TextPolicy,
}

impl InformationSystemBuilder {
    pub fn new(
        owner: LegalEntity,
        system_id: impl Into<String>,
        version: impl Into<String>,
        installation_number: impl Into<String>,
    ) -> Self {
        Self {
            owner,
            system_name: None,
            system_id: system_id.into(),
            version: version.into(),
            installation_number: installation_number.into(),
            verifactu_only: true,
            multi_ot_usage: false,
            multiple_ot: false,
            text_policy: TextPolicy::default(),
        }
    }

    pub fn system_name(mut self, name: impl Into<String>) -> Self {
        self.system_name = Some(name.into());
        self
    }

    pub fn verifactu_only(mut self, value: bool) -> Self {
        self.verifactu_only = value;
        self
    }

    pub fn multi_ot_usage(mut self, value: bool) -> Self {
        self.multi_ot_usage = value;
        self
    }

    pub fn multiple_ot(mut self, value: bool) -> Self {
        self.multiple_ot = value;
        self
    }

    pub fn text_policy(mut self, policy: TextPolicy) -> Self {
        self.text_policy = policy;
        self
    }

    pub fn build(self) -> Result<InformationSystem, RecordError> {
        let mut errors = Vec::new();
        let policy = self.text_policy;

        if self.owner.is_unregistered() {
            errors.push(ValidationError::combination(
                "owner",
                "the software producer must be registered (id type 07 is not allowed)",
            ));
        }
        if let Some(name) = &self.system_name {
            check_text("system_name", name, 1, 20, policy, &mut errors);
        }
        let system_id_len = self.system_id.chars().count();
        if system_id_len != 2 {
            errors.push(ValidationError::field(
                "system_id",
                format!("must have exactly 2 characters, got {system_id_len}"),
            ));
        } else {
            check_text("system_id", &self.system_id, 2, 2, policy, &mut errors);
        }
        check_text("version", &self.version, 1, 50, policy, &mut errors);
        check_text(
            "installation_number",
            &self.installation_number,
            1,
            100,
            policy,
            &mut errors,
        );

        into_result(errors, || InformationSystem {
            owner: self.owner,
            system_name: self.system_name,
            system_id: self.system_id.to_ascii_uppercase(),
            version: self.version,
            installation_number: self.installation_number,
            verifactu_only: self.verifactu_only,
            multi_ot_usage: self.multi_ot_usage,
            multiple_ot: self.multiple_ot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codes::ForeignIdType;
    use crate::core::party::ForeignId;

    fn owner() -> LegalEntity {
        LegalEntity::from_tax_id("Software SL", "A58818501").unwrap()
    }

    #[test]
    fn builds_and_upper_cases_system_id() {
        let system = InformationSystemBuilder::new(owner(), "ab", "1.0.3", "0001")
            .system_name("Facturador")
            .build()
            .unwrap();
        assert_eq!(system.system_id(), "AB");
        assert_eq!(system.system_name(), Some("Facturador"));
        assert!(system.verifactu_only());
        assert!(!system.multiple_ot());
    }

    #[test]
    fn length_limits() {
        let err = InformationSystemBuilder::new(owner(), "ABC", "", "x".repeat(101))
            .system_name("x".repeat(21))
            .build()
            .unwrap_err();
        for field in ["system_id", "version", "installation_number", "system_name"] {
            assert!(err.has_field(field), "missing {field}");
        }
    }

    #[test]
    fn unregistered_owner_rejected() {
        let id = ForeignId::new(Some("FR"), ForeignIdType::Unregistered, "X").unwrap();
        let owner = LegalEntity::from_foreign_id("Logiciel", id).unwrap();
        let err = InformationSystemBuilder::new(owner, "AB", "1", "1").build().unwrap_err();
        assert!(err.has_field("owner"));
    }
}

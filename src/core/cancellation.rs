//! Cancellation record (`RegistroAnulacion`) for a previously registered
//! invoice. Chained and fingerprinted like a high record.

use serde::Serialize;

use super::builder::check_generated_at;
use super::chaining::{
    CancellationFingerprintInput, Chaining, cancellation_canonical_string, check_fingerprint,
    compute_cancellation_fingerprint,
};
use super::codes::{FingerprintType, GeneratedBy};
use super::config::RecordConfig;
use super::error::{RecordError, ValidationError, reject};
use super::information_system::InformationSystem;
use super::invoice_id::InvoiceId;
use super::party::LegalEntity;
use super::primitives::check_text;

/// A validated cancellation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancellationRecord {
    id_version: String,
    cancelled_invoice: InvoiceId,
    external_reference: Option<String>,
    no_previous_record: bool,
    previous_rejection: bool,
    generated_by: Option<GeneratedBy>,
    generator: Option<LegalEntity>,
    chaining: Chaining,
    information_system: InformationSystem,
    generated_at: String,
    fingerprint_type: FingerprintType,
    fingerprint: String,
}

impl CancellationRecord {
    pub fn id_version(&self) -> &str {
        &self.id_version
    }

    /// Identity of the invoice being annulled.
    pub fn cancelled_invoice(&self) -> &InvoiceId {
        &self.cancelled_invoice
    }

    pub fn external_reference(&self) -> Option<&str> {
        self.external_reference.as_deref()
    }

    /// `SinRegistroPrevio`: the invoice was never registered.
    pub fn no_previous_record(&self) -> bool {
        self.no_previous_record
    }

    /// `RechazoPrevio`: an earlier cancellation was rejected.
    pub fn previous_rejection(&self) -> bool {
        self.previous_rejection
    }

    pub fn generated_by(&self) -> Option<GeneratedBy> {
        self.generated_by
    }

    pub fn generator(&self) -> Option<&LegalEntity> {
        self.generator.as_ref()
    }

    pub fn chaining(&self) -> &Chaining {
        &self.chaining
    }

    pub fn information_system(&self) -> &InformationSystem {
        &self.information_system
    }

    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }

    pub fn fingerprint_type(&self) -> FingerprintType {
        self.fingerprint_type
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn fingerprint_input(&self) -> CancellationFingerprintInput {
        cancellation_input(&self.cancelled_invoice, &self.generated_at)
    }

    pub fn canonical_string(&self) -> String {
        cancellation_canonical_string(&self.fingerprint_input(), &self.chaining)
    }

    pub fn recompute_fingerprint(&self) -> String {
        compute_cancellation_fingerprint(&self.fingerprint_input(), &self.chaining)
    }

    pub fn verify_fingerprint(&self) -> bool {
        self.recompute_fingerprint() == self.fingerprint
    }
}

fn cancellation_input(invoice: &InvoiceId, generated_at: &str) -> CancellationFingerprintInput {
    CancellationFingerprintInput {
        issuer_tax_id: invoice.issuer_tax_id().to_string(),
        series_number: invoice.series_number().to_string(),
        issue_date: invoice.issue_date_text(),
        generated_at: generated_at.to_string(),
    }
}

/// Builder for [`CancellationRecord`].
pub struct CancellationBuilder {
    cancelled_invoice: InvoiceId,
    config: RecordConfig,
    external_reference: Option<String>,
    no_previous_record: bool,
    previous_rejection: bool,
    generated_by: Option<GeneratedBy>,
    generator: Option<LegalEntity>,
    chaining: Option<Chaining>,
    information_system: Option<InformationSystem>,
    generated_at: Option<String>,
    fingerprint: Option<String>,
}

impl CancellationBuilder {
    pub fn new(cancelled_invoice: InvoiceId) -> Self {
        Self {
            cancelled_invoice,
            config: RecordConfig::default(),
            external_reference: None,
            no_previous_record: false,
            previous_rejection: false,
            generated_by: None,
            generator: None,
            chaining: None,
            information_system: None,
            generated_at: None,
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

    pub fn no_previous_record(mut self, value: bool) -> Self {
        self.no_previous_record = value;
        self
    }

    pub fn previous_rejection(mut self, value: bool) -> Self {
        self.previous_rejection = value;
        self
    }

    /// Who generated the cancellation, and their identity.
    pub fn generated_by(mut self, generated_by: GeneratedBy, generator: LegalEntity) -> Self {
        self.generated_by = Some(generated_by);
        self.generator = Some(generator);
        self
    }

    /// Set only the generated-by code; `build()` rejects it without a generator.
    pub fn generated_by_code(mut self, generated_by: GeneratedBy) -> Self {
        self.generated_by = Some(generated_by);
        self
    }

    /// Set only the generator; `build()` rejects it without a generated-by code.
    pub fn generator(mut self, generator: LegalEntity) -> Self {
        self.generator = Some(generator);
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

    pub fn generated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.generated_at = Some(timestamp.into());
        self
    }

    pub fn fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Validate and fingerprint the cancellation, reporting every violation.
    pub fn build(self) -> Result<CancellationRecord, RecordError> {
        self.config.check()?;
        let mut errors = Vec::new();
        let policy = self.config.text_policy;

        if let Some(reference) = &self.external_reference {
            check_text("external_reference", reference, 0, 60, policy, &mut errors);
        }
        check_generator(self.generated_by, self.generator.as_ref(), &mut errors);

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
        if let Some(Chaining::Linked(previous)) = &self.chaining {
            if previous.issuer_tax_id() != self.cancelled_invoice.issuer_tax_id() {
                errors.push(ValidationError::chaining(
                    "chaining",
                    format!(
                        "previous record belongs to issuer {} but the cancelled invoice to {}",
                        previous.issuer_tax_id(),
                        self.cancelled_invoice.issuer_tax_id()
                    ),
                ));
            }
        }

        let (Some(chaining), Some(information_system)) = (self.chaining, self.information_system)
        else {
            return Err(reject(errors));
        };
        if !errors.is_empty() {
            tracing::debug!(
                issuer = %self.cancelled_invoice.issuer_tax_id(),
                series = %self.cancelled_invoice.series_number(),
                errors = errors.len(),
                "cancellation record rejected"
            );
            return Err(reject(errors));
        }

        let fingerprint = match self.fingerprint {
            Some(supplied) => supplied.to_ascii_uppercase(),
            None => compute_cancellation_fingerprint(
                &cancellation_input(&self.cancelled_invoice, &generated_at),
                &chaining,
            ),
        };
        tracing::debug!(
            issuer = %self.cancelled_invoice.issuer_tax_id(),
            series = %self.cancelled_invoice.series_number(),
            fingerprint = %fingerprint,
            "cancellation record accepted"
        );

        Ok(CancellationRecord {
            id_version: self.config.id_version,
            cancelled_invoice: self.cancelled_invoice,
            external_reference: self.external_reference,
            no_previous_record: self.no_previous_record,
            previous_rejection: self.previous_rejection,
            generated_by: self.generated_by,
            generator: self.generator,
            chaining,
            information_system,
            generated_at,
            fingerprint_type: FingerprintType::Sha256,
            fingerprint,
        })
    }
}

fn check_generator(
    generated_by: Option<GeneratedBy>,
    generator: Option<&LegalEntity>,
    errors: &mut Vec<ValidationError>,
) {
    match (generated_by, generator) {
        (None, None) => {}
        (Some(_), None) => errors.push(ValidationError::combination(
            "generator",
            "is required when generated_by is set",
        )),
        (None, Some(_)) => errors.push(ValidationError::combination(
            "generated_by",
            "is required when a generator is given",
        )),
        (Some(GeneratedBy::Issuer), Some(party)) if party.tax_id().is_none() => {
            errors.push(ValidationError::combination(
                "generator",
                "an issuer-generated cancellation needs a domestic tax ID",
            ));
        }
        (Some(GeneratedBy::ThirdParty), Some(party)) if party.is_unregistered() => {
            errors.push(ValidationError::combination(
                "generator",
                "a third party must be registered (id type 07 is not allowed)",
            ));
        }
        (Some(_), Some(_)) => {}
    }
}

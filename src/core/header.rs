//! Submission header (`Cabecera`) sent with a batch of records.

use chrono::NaiveDate;
use serde::Serialize;

use super::config::{Clock, RecordConfig, SystemClock};
use super::error::{RecordError, into_result, nest_errors};
use super::party::{LegalEntity, require_tax_id};
use super::primitives::{DateInput, check_text, validate_year_end_date};

/// Submission answering an information requirement of the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementRemission {
    reference: String,
    end_of_requirement: bool,
}

impl RequirementRemission {
    /// `reference` has 1 to 18 characters; `end_of_requirement` marks the last
    /// submission for the requirement.
    pub fn new(reference: impl Into<String>, end_of_requirement: bool) -> Result<Self, RecordError> {
        let reference = reference.into();
        let mut errors = Vec::new();
        check_text("reference", &reference, 1, 18, Default::default(), &mut errors);
        into_result(errors, || Self {
            reference,
            end_of_requirement,
        })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn end_of_requirement(&self) -> bool {
        self.end_of_requirement
    }
}

/// Voluntary submission details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoluntaryRemission {
    end_date: Option<NaiveDate>,
    incident: Option<bool>,
}

impl VoluntaryRemission {
    /// `end_date`, when given, must be 31 December of the current or the
    /// previous year relative to `today`.
    pub fn new(
        end_date: Option<DateInput>,
        incident: Option<bool>,
        today: NaiveDate,
    ) -> Result<Self, RecordError> {
        let end_date = end_date
            .map(|input| validate_year_end_date(input, today))
            .transpose()
            .map_err(|e| RecordError::from(e.at("end_date")))?;
        Ok(Self { end_date, incident })
    }

    /// Last day the system keeps submitting voluntarily.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn incident(&self) -> Option<bool> {
        self.incident
    }
}

/// Header of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionHeader {
    id_version: String,
    obligor: LegalEntity,
    representative: Option<LegalEntity>,
    requirement: Option<RequirementRemission>,
    voluntary: Option<VoluntaryRemission>,
}

impl SubmissionHeader {
    pub fn id_version(&self) -> &str {
        &self.id_version
    }

    /// The taxpayer obliged to issue the records.
    pub fn obligor(&self) -> &LegalEntity {
        &self.obligor
    }

    pub fn representative(&self) -> Option<&LegalEntity> {
        self.representative.as_ref()
    }

    pub fn requirement(&self) -> Option<&RequirementRemission> {
        self.requirement.as_ref()
    }

    pub fn voluntary(&self) -> Option<&VoluntaryRemission> {
        self.voluntary.as_ref()
    }
}

/// Builder for [`SubmissionHeader`].
pub struct SubmissionHeaderBuilder {
    obligor: LegalEntity,
    representative: Option<LegalEntity>,
    requirement: Option<RequirementRemission>,
    voluntary: Option<VoluntaryRemission>,
    voluntary_fields: Option<(Option<DateInput>, Option<bool>)>,
    config: RecordConfig,
}

impl SubmissionHeaderBuilder {
    pub fn new(obligor: LegalEntity) -> Self {
        Self {
            obligor,
            representative: None,
            requirement: None,
            voluntary: None,
            voluntary_fields: None,
            config: RecordConfig::default(),
        }
    }

    pub fn representative(mut self, representative: LegalEntity) -> Self {
        self.representative = Some(representative);
        self
    }

    pub fn requirement(mut self, requirement: RequirementRemission) -> Self {
        self.requirement = Some(requirement);
        self
    }

    /// An already validated voluntary remission.
    pub fn voluntary(mut self, voluntary: VoluntaryRemission) -> Self {
        self.voluntary = Some(voluntary);
        self
    }

    /// Voluntary remission fields, validated against the clock at build time.
    pub fn voluntary_fields(mut self, end_date: Option<DateInput>, incident: Option<bool>) -> Self {
        self.voluntary_fields = Some((end_date, incident));
        self
    }

    pub fn config(mut self, config: RecordConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<SubmissionHeader, RecordError> {
        self.build_with_clock(&SystemClock)
    }

    pub fn build_with_clock(self, clock: &dyn Clock) -> Result<SubmissionHeader, RecordError> {
        self.config.check()?;
        let mut errors = Vec::new();

        require_tax_id(&self.obligor, "obligor", &mut errors);
        if let Some(representative) = &self.representative {
            require_tax_id(representative, "representative", &mut errors);
        }

        let voluntary = match self.voluntary_fields {
            Some((end_date, incident)) => {
                match VoluntaryRemission::new(end_date, incident, clock.today()) {
                    Ok(voluntary) => Some(voluntary),
                    Err(e) => {
                        nest_errors(e, "voluntary", &mut errors);
                        None
                    }
                }
            }
            None => self.voluntary,
        };

        into_result(errors, || SubmissionHeader {
            id_version: self.config.id_version,
            obligor: self.obligor,
            representative: self.representative,
            requirement: self.requirement,
            voluntary,
        })
    }
}

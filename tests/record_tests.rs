use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use verifactu::core::*;

const ORIGIN_FP: &str = "BAD9C5179F959D01102E57281686232CF6A0AB5EFE390F397C07BA63EE889815";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn clock() -> FixedClock {
    FixedClock(date(2025, 8, 1))
}

fn invoice_id(series: &str, issued: &str) -> InvoiceId {
    InvoiceId::new("B12345674", series, issued, clock().today()).unwrap()
}

fn system() -> InformationSystem {
    let owner = LegalEntity::from_tax_id("Software SL", "A58818501").unwrap();
    InformationSystemBuilder::new(owner, "AB", "1.0", "1")
        .system_name("Facturador")
        .build()
        .unwrap()
}

fn customer() -> LegalEntity {
    LegalEntity::from_tax_id("Cliente SA", "A58818501").unwrap()
}

fn foreign_customer() -> LegalEntity {
    let id = ForeignId::new(Some("FR"), ForeignIdType::NifVat, "FR12345678901").unwrap();
    LegalEntity::from_foreign_id("Client SARL", id).unwrap()
}

fn vat_line(regime: RegimeKey, base: &str, rate: &str, charged: &str) -> BreakdownDetail {
    BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, base)
        .regime_key(regime)
        .tax_rate(rate)
        .charged_tax(charged)
        .build()
        .unwrap()
}

fn general_line() -> BreakdownDetail {
    vat_line(RegimeKey::GENERAL, "264.46", "21", "55.54")
}

/// Builder with identity, chaining, system and timestamp; no lines or totals.
fn bare(invoice_type: InvoiceType) -> HighRecordBuilder {
    HighRecordBuilder::new(invoice_id("NC202500051", "22-07-2025"), "Mi Empresa SL", invoice_type)
        .chaining(Chaining::origin())
        .information_system(system())
        .generated_at("2025-07-22T10:00:00+02:00")
}

/// The reference F1 record: one general 21% line, totals 55.54 / 320.00.
fn reference() -> HighRecordBuilder {
    bare(InvoiceType::F1)
        .add_recipient(customer())
        .add_line(general_line())
        .total_tax("55.54")
        .total_amount("320.00")
}

// ---------------------------------------------------------------------------
// Reference record
// ---------------------------------------------------------------------------

#[test]
fn reference_record_fingerprint() {
    let record = reference().build_with_clock(&clock()).unwrap();

    assert_eq!(record.fingerprint(), ORIGIN_FP);
    assert!(record.verify_fingerprint());
    insta::assert_snapshot!(
        record.canonical_string(),
        @"IDEmisorFactura=B12345674&NumSerieFactura=NC202500051&FechaExpedicionFactura=22-07-2025&TipoFactura=F1&CuotaTotal=55.54&ImporteTotal=320.00&Huella=&FechaHoraHusoGenRegistro=2025-07-22T10:00:00+02:00"
    );
}

#[test]
fn fingerprint_hashes_totals_as_supplied() {
    let record = bare(InvoiceType::F1)
        .add_recipient(customer())
        .add_line(general_line())
        .total_tax("055.54")
        .total_amount("320.")
        .build_with_clock(&clock())
        .unwrap();

    assert_eq!(record.total_amount(), dec!(320));
    assert_eq!(record.total_tax_text(), "055.54");
    assert_eq!(record.total_amount_text(), "320.");
    assert!(record.canonical_string().contains("&CuotaTotal=055.54&ImporteTotal=320.&"));
    assert_ne!(record.fingerprint(), ORIGIN_FP);
    assert!(record.verify_fingerprint());
}

#[test]
fn reference_record_accessors() {
    let record = reference().build_with_clock(&clock()).unwrap();

    assert_eq!(record.id_version(), "1.0");
    assert_eq!(record.invoice_id().issue_date(), date(2025, 7, 22));
    assert_eq!(record.issuer_name(), "Mi Empresa SL");
    assert_eq!(record.invoice_type(), InvoiceType::F1);
    assert_eq!(record.operation_description(), "Factura Cliente");
    assert_eq!(record.total_tax(), dec!(55.54));
    assert_eq!(record.total_amount().to_string(), "320.00");
    assert_eq!(record.recipients().len(), 1);
    assert_eq!(record.breakdown().len(), 1);
    assert_eq!(record.fingerprint_type(), FingerprintType::Sha256);
    assert!(record.chaining().is_first_record());
    assert!(!record.macro_data());
    assert!(record.operation_date().is_none());
    assert_eq!(record.information_system().system_id(), "AB");
}

#[test]
fn reference_record_serializes() {
    let record = reference().build_with_clock(&clock()).unwrap();
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["invoice_id"]["issue_date"], "22-07-2025");
    assert_eq!(json["invoice_id"]["series_number"], "NC202500051");
    assert_eq!(json["total_amount"], "320.00");
    assert_eq!(json["fingerprint"], ORIGIN_FP);
}

#[test]
fn configured_description_is_used() {
    let config = RecordConfig {
        default_operation_description: "Servicios de consultoría".into(),
        ..RecordConfig::default()
    };
    // Non-ASCII text fails the printable check.
    let err = reference().config(config).build_with_clock(&clock()).unwrap_err();
    assert!(err.has_field("operation_description"));

    let record = reference()
        .operation_description("Servicios de consultoria")
        .build_with_clock(&clock())
        .unwrap();
    assert_eq!(record.operation_description(), "Servicios de consultoria");
}

#[test]
fn unsupported_version_is_a_config_error() {
    let config = RecordConfig {
        id_version: "0.9".into(),
        ..RecordConfig::default()
    };
    let err = reference().config(config).build_with_clock(&clock()).unwrap_err();
    assert!(matches!(err, RecordError::Config(_)));
}

#[test]
fn markup_follows_text_policy() {
    let err = reference()
        .external_reference("ref<1>")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("external_reference"));

    let config = RecordConfig {
        text_policy: TextPolicy::ALLOW_MARKUP,
        ..RecordConfig::default()
    };
    let record = reference()
        .config(config)
        .external_reference("ref<1>")
        .build_with_clock(&clock())
        .unwrap();
    assert_eq!(record.external_reference(), Some("ref<1>"));
}

// ---------------------------------------------------------------------------
// Required parts and error aggregation
// ---------------------------------------------------------------------------

#[test]
fn missing_parts_are_all_reported() {
    let err = HighRecordBuilder::new(invoice_id("NC1", "22-07-2025"), "Mi Empresa SL", InvoiceType::F1)
        .build_with_clock(&clock())
        .unwrap_err();

    for field in ["total_tax", "total_amount", "chaining", "information_system", "generated_at"] {
        assert!(err.has_field(field), "missing {field}");
    }
    assert!(err.has_kind(ErrorKind::InvalidChaining));
}

#[test]
fn cross_field_errors_are_aggregated() {
    let err = bare(InvoiceType::F1)
        .previous_rejection(PreviousRejection::Yes)
        .coupon(true)
        .total_tax("0")
        .total_amount("0")
        .build_with_clock(&clock())
        .unwrap_err();

    for field in ["previous_rejection", "coupon", "recipients", "breakdown"] {
        assert!(err.has_field(field), "missing {field}");
    }
}

#[test]
fn generated_at_must_be_offset_datetime() {
    for bad in ["2025-07-22 10:00:00", "2025-07-22T10:00:00", "2025-02-30T10:00:00+01:00"] {
        let err = reference()
            .generated_at(bad)
            .build_with_clock(&clock())
            .unwrap_err();
        assert!(err.has_field("generated_at"), "accepted {bad}");
    }
    assert!(
        reference()
            .generated_at("2025-07-22T08:00:00Z")
            .build_with_clock(&clock())
            .is_ok()
    );
}

// ---------------------------------------------------------------------------
// Fingerprint and chaining
// ---------------------------------------------------------------------------

#[test]
fn supplied_fingerprint_is_upper_cased() {
    let record = reference()
        .fingerprint(ORIGIN_FP.to_lowercase())
        .build_with_clock(&clock())
        .unwrap();
    assert_eq!(record.fingerprint(), ORIGIN_FP);
    assert!(record.verify_fingerprint());
}

#[test]
fn supplied_fingerprint_is_only_shape_checked() {
    let other = "A".repeat(64);
    let record = reference()
        .fingerprint(other.as_str())
        .build_with_clock(&clock())
        .unwrap();
    assert!(!record.verify_fingerprint());

    let err = reference()
        .fingerprint("ABC")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("fingerprint"));
    assert!(err.has_kind(ErrorKind::InvalidChaining));
}

#[test]
fn linked_chain_must_name_same_issuer() {
    let chaining =
        Chaining::link_to_parts("A58818501", "X-1", "01-07-2025", ORIGIN_FP).unwrap();
    let err = reference()
        .chaining(chaining)
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("chaining"));
    assert!(err.has_kind(ErrorKind::InvalidChaining));
}

// ---------------------------------------------------------------------------
// Rectification and substitution
// ---------------------------------------------------------------------------

#[test]
fn rectification_needs_type_and_references() {
    let err = bare(InvoiceType::R1)
        .add_recipient(customer())
        .add_line(general_line())
        .total_tax("55.54")
        .total_amount("320.00")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("rectification_type"));
    assert!(err.has_field("rectified_invoices"));
}

#[test]
fn substitution_needs_amount() {
    let rectify = || {
        bare(InvoiceType::R1)
            .rectification_type(RectificationType::Substitution)
            .add_rectified_invoice(invoice_id("NC202500040", "20-07-2025"))
            .add_recipient(customer())
            .add_line(general_line())
            .total_tax("55.54")
            .total_amount("320.00")
    };

    let err = rectify().build_with_clock(&clock()).unwrap_err();
    assert!(err.has_field("rectification_amount"));

    let amount = RectificationAmount::new("264.46", "55.54", None).unwrap();
    let record = rectify()
        .rectification_amount(amount)
        .build_with_clock(&clock())
        .unwrap();
    assert_eq!(record.rectification_amount().unwrap().tax(), dec!(55.54));
    assert_eq!(record.rectified_invoices().len(), 1);
}

#[test]
fn difference_rectification_skips_line_consistency() {
    // -100 at 21% expects -21; -10 is off by more than the tolerance.
    let line = vat_line(RegimeKey::GENERAL, "-100.00", "21", "-10.00");
    let rectify = |kind| {
        bare(InvoiceType::R1)
            .rectification_type(kind)
            .add_rectified_invoice(invoice_id("NC202500040", "20-07-2025"))
            .add_recipient(customer())
            .add_line(line.clone())
            .total_tax("-10.00")
            .total_amount("-110.00")
    };

    assert!(rectify(RectificationType::Difference).build_with_clock(&clock()).is_ok());

    let err = rectify(RectificationType::Substitution)
        .rectification_amount(RectificationAmount::new("-100", "-10", None).unwrap())
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("breakdown[0].charged_tax"));
    assert!(err.has_kind(ErrorKind::InvalidTotals));
}

#[test]
fn replaced_invoices_only_on_f3() {
    let err = bare(InvoiceType::F3)
        .add_recipient(customer())
        .add_line(general_line())
        .total_tax("55.54")
        .total_amount("320.00")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("replaced_invoices"));

    let err = reference()
        .add_replaced_invoice(invoice_id("S-1", "20-07-2025"))
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("replaced_invoices"));
}

#[test]
fn previous_rejection_requires_correction() {
    let err = reference()
        .previous_rejection(PreviousRejection::Yes)
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("previous_rejection"));

    let err = reference()
        .previous_rejection(PreviousRejection::NoPreviousRecord)
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("previous_rejection"));
    assert!(err.has_kind(ErrorKind::InvalidCombination));

    let record = reference()
        .correction(true)
        .previous_rejection(PreviousRejection::NoPreviousRecord)
        .build_with_clock(&clock())
        .unwrap();
    assert_eq!(record.previous_rejection(), Some(PreviousRejection::NoPreviousRecord));

    let record = reference()
        .correction(true)
        .previous_rejection(PreviousRejection::Yes)
        .build_with_clock(&clock())
        .unwrap();
    assert!(record.correction());
}

// ---------------------------------------------------------------------------
// Parties
// ---------------------------------------------------------------------------

#[test]
fn third_party_rules() {
    let err = reference()
        .issued_by(IssuedBy::ThirdParty)
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("third_party"));

    let issuer_again = LegalEntity::from_tax_id("Mi Empresa SL", "B12345674").unwrap();
    let err = reference()
        .issued_by(IssuedBy::ThirdParty)
        .third_party(issuer_again)
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("third_party"));

    let err = reference()
        .third_party(customer())
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("third_party"));

    let record = reference()
        .issued_by(IssuedBy::ThirdParty)
        .third_party(customer())
        .build_with_clock(&clock())
        .unwrap();
    assert_eq!(record.third_party().unwrap().tax_id(), Some("A58818501"));
}

#[test]
fn simplified_invoice_forbids_recipients() {
    let err = bare(InvoiceType::F2)
        .add_recipient(customer())
        .add_line(general_line())
        .total_tax("55.54")
        .total_amount("320.00")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("recipients"));
}

#[test]
fn unregistered_recipient_needs_spain() {
    let french = ForeignId::new(Some("FR"), ForeignIdType::Unregistered, "X1").unwrap();
    let err = bare(InvoiceType::F1)
        .add_recipient(LegalEntity::from_foreign_id("Client", french).unwrap())
        .add_line(general_line())
        .total_tax("55.54")
        .total_amount("320.00")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("recipients[0]"));

    let spanish = ForeignId::new(Some("ES"), ForeignIdType::Unregistered, "X1").unwrap();
    assert!(
        bare(InvoiceType::F1)
            .add_recipient(LegalEntity::from_foreign_id("Cliente", spanish).unwrap())
            .add_line(general_line())
            .total_tax("55.54")
            .total_amount("320.00")
            .build_with_clock(&clock())
            .is_ok()
    );
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

#[test]
fn macro_data_is_forced_above_threshold() {
    let record = bare(InvoiceType::F1)
        .add_recipient(customer())
        .add_line(vat_line(RegimeKey::GENERAL, "100000000.00", "21", "21000000.00"))
        .total_tax("21000000.00")
        .total_amount("121000000.00")
        .build_with_clock(&clock())
        .unwrap();
    assert!(record.macro_data());
}

#[test]
fn flags_depend_on_invoice_type() {
    let err = reference()
        .without_recipient_id(true)
        .coupon(true)
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("without_recipient_id"));
    assert!(err.has_field("coupon"));

    let record = reference().simplified_invoice(true).build_with_clock(&clock()).unwrap();
    assert!(record.simplified_invoice());
}

// ---------------------------------------------------------------------------
// Operation date
// ---------------------------------------------------------------------------

#[test]
fn future_operation_date_needs_pending_regime() {
    let err = reference()
        .operation_date("01-09-2025")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("operation_date"));

    let record = bare(InvoiceType::F1)
        .add_recipient(customer())
        .add_line(vat_line(RegimeKey::PUBLIC_WORKS_PENDING, "264.46", "21", "55.54"))
        .total_tax("55.54")
        .total_amount("320.00")
        .operation_date("01-09-2025")
        .build_with_clock(&clock())
        .unwrap();
    assert_eq!(record.operation_date(), Some(date(2025, 9, 1)));
}

#[test]
fn operation_date_window() {
    let err = reference()
        .operation_date("02-08-2026")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_kind(ErrorKind::InvalidField));
    assert!(err.has_field("operation_date"));

    let err = reference()
        .operation_date("31-07-2005")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("operation_date"));

    assert!(reference().operation_date("01-08-2005").build_with_clock(&clock()).is_ok());
}

#[test]
fn pending_public_works_needs_operation_date() {
    let pending = || {
        bare(InvoiceType::F1)
            .add_recipient(customer())
            .add_line(vat_line(RegimeKey::PUBLIC_WORKS_PENDING, "264.46", "21", "55.54"))
            .total_tax("55.54")
            .total_amount("320.00")
    };

    let err = pending().build_with_clock(&clock()).unwrap_err();
    assert!(err.has_field("operation_date"));

    let err = pending()
        .operation_date("21-07-2025")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("operation_date"));

    assert!(pending().operation_date("22-07-2025").build_with_clock(&clock()).is_ok());
}

// ---------------------------------------------------------------------------
// Dated VAT rates
// ---------------------------------------------------------------------------

/// F1 with one VAT line at `rate`, dated by its operation date.
fn dated(
    rate: &str,
    charged: &str,
    surcharge: Option<&str>,
    operation_date: &str,
) -> Result<HighRecord, RecordError> {
    let mut line = BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, "100.00")
        .regime_key(RegimeKey::GENERAL)
        .tax_rate(rate)
        .charged_tax(charged);
    let mut total_tax: Decimal = charged.parse().unwrap();
    if let Some(surcharge) = surcharge {
        line = line.surcharge_rate(surcharge).surcharge_amount(surcharge);
        total_tax += surcharge.parse::<Decimal>().unwrap();
    }
    bare(InvoiceType::F1)
        .add_recipient(customer())
        .add_line(line.build().unwrap())
        .total_tax(total_tax.to_string())
        .total_amount((total_tax + dec!(100)).to_string())
        .operation_date(operation_date)
        .build_with_clock(&clock())
}

#[test]
fn five_percent_vat_window() {
    assert!(dated("5", "5.00", None, "01-07-2022").is_ok());
    assert!(dated("5", "5.00", None, "30-09-2024").is_ok());

    let err = dated("5", "5.00", None, "01-10-2024").unwrap_err();
    assert!(err.has_field("breakdown[0].tax_rate"));
    let err = dated("5", "5.00", None, "30-06-2022").unwrap_err();
    assert!(err.has_field("breakdown[0].tax_rate"));
}

#[test]
fn surcharge_0_62_window() {
    assert!(dated("5", "5.00", Some("0.62"), "01-01-2023").is_ok());
    assert!(dated("5", "5.00", Some("0.62"), "30-09-2024").is_ok());

    let err = dated("5", "5.00", Some("0.62"), "31-12-2022").unwrap_err();
    assert!(err.has_field("breakdown[0].surcharge_rate"));
    assert!(!err.has_field("breakdown[0].tax_rate"));
}

#[test]
fn reduced_rates_of_late_2024() {
    for (rate, charged) in [("2", "2.00"), ("7.5", "7.50")] {
        assert!(dated(rate, charged, None, "01-10-2024").is_ok(), "rate {rate}");
        assert!(dated(rate, charged, None, "31-12-2024").is_ok(), "rate {rate}");

        let err = dated(rate, charged, None, "01-01-2025").unwrap_err();
        assert!(err.has_field("breakdown[0].tax_rate"), "rate {rate}");
        let err = dated(rate, charged, None, "30-09-2024").unwrap_err();
        assert!(err.has_field("breakdown[0].tax_rate"), "rate {rate}");
    }
}

#[test]
fn dated_rate_falls_back_to_issue_date() {
    // Issued 22-07-2025 with no operation date.
    let err = bare(InvoiceType::F1)
        .add_recipient(customer())
        .add_line(vat_line(RegimeKey::GENERAL, "100.00", "2", "2.00"))
        .total_tax("2.00")
        .total_amount("102.00")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("breakdown[0].tax_rate"));
}

// ---------------------------------------------------------------------------
// Simplified invoice limit
// ---------------------------------------------------------------------------

fn simplified(amount: &str) -> HighRecordBuilder {
    bare(InvoiceType::F2)
        .add_line(
            BreakdownBuilder::exempt(TaxCode::Vat, ExemptionReason::E1, amount)
                .regime_key(RegimeKey::GENERAL)
                .build()
                .unwrap(),
        )
        .total_tax("0")
        .total_amount(amount)
}

#[test]
fn simplified_invoice_limit_boundary() {
    assert!(simplified("3010.00").build_with_clock(&clock()).is_ok());

    let err = simplified("3010.01").build_with_clock(&clock()).unwrap_err();
    assert!(err.has_field("breakdown"));
    assert!(err.has_kind(ErrorKind::InvalidTotals));
}

#[test]
fn simplified_invoice_limit_exemptions() {
    assert!(
        simplified("3010.01")
            .billing_agreement("AC-2025-01")
            .build_with_clock(&clock())
            .is_ok()
    );
    assert!(
        simplified("3010.01")
            .without_recipient_id(true)
            .build_with_clock(&clock())
            .is_ok()
    );
}

// ---------------------------------------------------------------------------
// Breakdown size
// ---------------------------------------------------------------------------

fn with_lines(count: usize) -> HighRecordBuilder {
    let count_dec = Decimal::from(count);
    let mut builder = bare(InvoiceType::F1)
        .add_recipient(customer())
        .total_tax((dec!(55.54) * count_dec).to_string())
        .total_amount((dec!(320.00) * count_dec).to_string());
    for _ in 0..count {
        builder = builder.add_line(general_line());
    }
    builder
}

#[test]
fn breakdown_line_limit() {
    let record = with_lines(12).build_with_clock(&clock()).unwrap();
    assert_eq!(record.breakdown().len(), 12);

    let err = with_lines(13).build_with_clock(&clock()).unwrap_err();
    assert!(err.has_field("breakdown"));
}

// ---------------------------------------------------------------------------
// Line rules that depend on the record
// ---------------------------------------------------------------------------

fn collection_line() -> BreakdownDetail {
    BreakdownBuilder::taxed(TaxCode::Vat, Qualification::N1, "100.00")
        .regime_key(RegimeKey::THIRD_PARTY_COLLECTION)
        .build()
        .unwrap()
}

#[test]
fn third_party_collection_is_f1_with_spanish_recipients() {
    let record = bare(InvoiceType::F1)
        .add_recipient(customer())
        .add_line(collection_line())
        .total_tax("0")
        .total_amount("100.00")
        .build_with_clock(&clock())
        .unwrap();
    assert!(record.breakdown()[0].has_regime(RegimeKey::THIRD_PARTY_COLLECTION));

    let err = bare(InvoiceType::F1)
        .add_recipient(customer())
        .add_recipient(foreign_customer())
        .add_line(collection_line())
        .total_tax("0")
        .total_amount("100.00")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("breakdown[0].regime_key"));

    let err = bare(InvoiceType::F3)
        .add_recipient(customer())
        .add_replaced_invoice(invoice_id("S-1", "20-07-2025"))
        .add_line(collection_line())
        .total_tax("0")
        .total_amount("100.00")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("breakdown[0].regime_key"));
}

#[test]
fn e5_needs_foreign_recipients() {
    let e5 = || {
        BreakdownBuilder::exempt(TaxCode::Vat, ExemptionReason::E5, "100.00")
            .regime_key(RegimeKey::GENERAL)
            .build()
            .unwrap()
    };

    let err = bare(InvoiceType::F1)
        .add_recipient(foreign_customer())
        .add_recipient(customer())
        .add_line(e5())
        .total_tax("0")
        .total_amount("100.00")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("breakdown[0].exemption_reason"));

    assert!(
        bare(InvoiceType::F1)
            .add_recipient(foreign_customer())
            .add_line(e5())
            .total_tax("0")
            .total_amount("100.00")
            .build_with_clock(&clock())
            .is_ok()
    );
}

#[test]
fn reverse_charge_not_on_simplified_invoices() {
    let s2 = || {
        BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S2, "100.00")
            .regime_key(RegimeKey::GENERAL)
            .tax_rate("0")
            .charged_tax("0")
            .build()
            .unwrap()
    };

    let err = bare(InvoiceType::F2)
        .add_line(s2())
        .total_tax("0")
        .total_amount("100.00")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("breakdown[0].qualification"));

    assert!(
        bare(InvoiceType::F3)
            .add_recipient(customer())
            .add_replaced_invoice(invoice_id("S-1", "20-07-2025"))
            .add_line(s2())
            .total_tax("0")
            .total_amount("100.00")
            .build_with_clock(&clock())
            .is_ok()
    );
}

#[test]
fn entity_group_not_on_simplified_or_replacement_invoices() {
    let group = || {
        BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, "100.00")
            .regime_key(RegimeKey::ENTITY_GROUP)
            .tax_rate("21")
            .charged_tax("21.00")
            .cost_basis("80.00")
            .build()
            .unwrap()
    };

    // Regime 06 lines do not count towards the total amount.
    assert!(
        bare(InvoiceType::F1)
            .add_recipient(customer())
            .add_line(group())
            .total_tax("21.00")
            .total_amount("0")
            .build_with_clock(&clock())
            .is_ok()
    );

    let err = bare(InvoiceType::F2)
        .add_line(group())
        .total_tax("21.00")
        .total_amount("0")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("breakdown[0].regime_key"));

    let err = bare(InvoiceType::F3)
        .add_recipient(customer())
        .add_replaced_invoice(invoice_id("S-1", "20-07-2025"))
        .add_line(group())
        .total_tax("21.00")
        .total_amount("0")
        .build_with_clock(&clock())
        .unwrap_err();
    assert!(err.has_field("breakdown[0].regime_key"));
}

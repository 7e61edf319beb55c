use verifactu::core::*;

fn main() -> Result<(), RecordError> {
    let config = RecordConfig::from_env()?;
    let clock = SystemClock;

    let issuer = "B12345674";
    let id = InvoiceId::new(issuer, "NC202500051", clock.today(), clock.today())?;

    let system = InformationSystemBuilder::new(
        LegalEntity::from_tax_id("Software SL", "A58818501")?,
        "AB",
        "1.0",
        "0001",
    )
    .system_name("Facturador")
    .build()?;

    let record = HighRecordBuilder::new(id, "Mi Empresa SL", InvoiceType::F1)
        .config(config)
        .operation_description("Servicios de consultoria")
        .add_recipient(LegalEntity::from_tax_id("Cliente SA", "A58818501")?)
        .add_line(
            BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, "264.46")
                .regime_key(RegimeKey::GENERAL)
                .tax_rate("21")
                .charged_tax("55.54")
                .build()?,
        )
        .total_tax("55.54")
        .total_amount("320.00")
        .chaining(Chaining::origin())
        .information_system(system)
        .generated_at(chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string())
        .build_with_clock(&clock)?;

    println!("=== Record ===");
    println!("Issuer:      {}", record.invoice_id().issuer_tax_id());
    println!("Series:      {}", record.invoice_id().series_number());
    println!("Issued:      {}", record.invoice_id().issue_date_text());
    println!("Total tax:   {}", record.total_tax());
    println!("Total:       {}", record.total_amount());
    println!("Canonical:   {}", record.canonical_string());
    println!("Fingerprint: {}", record.fingerprint());
    Ok(())
}

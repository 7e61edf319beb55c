use chrono::NaiveDate;
use verifactu::core::*;

fn system() -> Result<InformationSystem, RecordError> {
    InformationSystemBuilder::new(
        LegalEntity::from_tax_id("Software SL", "A58818501")?,
        "AB",
        "1.0",
        "1",
    )
    .build()
}

fn record(
    series: &str,
    issued: &str,
    generated_at: &str,
    chaining: Chaining,
    clock: &FixedClock,
) -> Result<HighRecord, RecordError> {
    let id = InvoiceId::new("B12345674", series, issued, clock.today())?;
    HighRecordBuilder::new(id, "Mi Empresa SL", InvoiceType::F1)
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
        .chaining(chaining)
        .information_system(system()?)
        .generated_at(generated_at)
        .build_with_clock(clock)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());

    // ── 1. Build a chain of two records and a cancellation ────────────
    let first = record(
        "NC202500051",
        "22-07-2025",
        "2025-07-22T10:00:00+02:00",
        Chaining::origin(),
        &clock,
    )?;
    let second = record(
        "NC202500052",
        "23-07-2025",
        "2025-07-23T09:30:00+02:00",
        Chaining::link_to(first.invoice_id(), first.fingerprint())?,
        &clock,
    )?;
    let cancellation = CancellationBuilder::new(first.invoice_id().clone())
        .chaining(Chaining::link_to(second.invoice_id(), second.fingerprint())?)
        .information_system(system()?)
        .generated_at("2025-07-24T12:00:00+02:00")
        .build()?;

    println!("=== Chain ===");
    println!("1. {} {}", first.invoice_id().series_number(), first.fingerprint());
    println!("2. {} {}", second.invoice_id().series_number(), second.fingerprint());
    println!(
        "3. cancel {} {}",
        cancellation.cancelled_invoice().series_number(),
        cancellation.fingerprint()
    );

    let chain = [
        ChainEntry::from(&first),
        ChainEntry::from(&second),
        ChainEntry::from(&cancellation),
    ];
    match verify_chain(&chain) {
        Ok(()) => println!("Chain verified"),
        Err(e) => println!("Chain broken: {e}"),
    }

    // ── 2. Drop the middle record: the link no longer matches ─────────
    println!("\n=== Broken Chain ===");
    let gapped = [ChainEntry::from(&first), ChainEntry::from(&cancellation)];
    match verify_chain(&gapped) {
        Ok(()) => println!("Chain verified"),
        Err(e) => println!("Chain broken: {e}"),
    }
    Ok(())
}

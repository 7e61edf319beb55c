use chrono::NaiveDate;
use verifactu::core::*;

fn main() {
    let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());

    // ── 1. Field errors: every violation is reported at once ──────────
    println!("=== Invoice Identity ===");
    match InvoiceId::new("B98765432", "A'1", "27-10-2024", clock.today()) {
        Ok(id) => println!("  Unexpected: {id:?}"),
        Err(e) => {
            for error in e.errors() {
                println!("  {error}");
            }
        }
    }

    // ── 2. Breakdown matrix ───────────────────────────────────────────
    println!("\n=== Breakdown Line ===");
    let line = BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, "100.00")
        .regime_key(RegimeKey::PREMISES_LEASE)
        .tax_rate("10")
        .surcharge_rate("5.2")
        .build();
    if let Err(e) = line {
        for error in e.errors() {
            println!("  {error}");
        }
    }

    // ── 3. Cross-field rules and totals ───────────────────────────────
    println!("\n=== High Record ===");
    let Ok(id) = InvoiceId::new("B12345674", "NC1", "22-07-2025", clock.today()) else {
        return;
    };
    let Ok(line) = BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, "100.00")
        .regime_key(RegimeKey::GENERAL)
        .tax_rate("21")
        .charged_tax("21.00")
        .build()
    else {
        return;
    };
    let Ok(system) = LegalEntity::from_tax_id("Software SL", "A58818501")
        .and_then(|owner| InformationSystemBuilder::new(owner, "AB", "1.0", "1").build())
    else {
        return;
    };
    // Coupons are only for R1/R5, and the declared tax is off by 19.00.
    let result = HighRecordBuilder::new(id, "Mi Empresa SL", InvoiceType::F2)
        .coupon(true)
        .add_line(line)
        .total_tax("40.00")
        .total_amount("121.00")
        .chaining(Chaining::origin())
        .information_system(system)
        .generated_at("2025-07-22T10:00:00+02:00")
        .build_with_clock(&clock);

    match result {
        Ok(record) => println!("  Built: {}", record.fingerprint()),
        Err(e) => {
            for error in e.errors() {
                println!("  {error}");
            }
            println!("  totals errors: {}", e.has_kind(ErrorKind::InvalidTotals));
        }
    }

    // ── 4. Configuration ──────────────────────────────────────────────
    println!("\n=== Configuration ===");
    let config = RecordConfig {
        id_version: "2.0".into(),
        ..RecordConfig::default()
    };
    if let Err(e) = config.check() {
        println!("  {e}");
    }
}

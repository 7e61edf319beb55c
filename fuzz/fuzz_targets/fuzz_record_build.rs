#![no_main]

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use verifactu::core::*;

// Fields separated by '|': series, total tax, total amount, base, rate,
// charged tax, generation timestamp, operation date.
fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let fields: Vec<&str> = s.split('|').collect();
    let field = |i: usize| fields.get(i).copied().unwrap_or_default();

    let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
    let Ok(id) = InvoiceId::new("B12345674", field(0), "22-07-2025", clock.today()) else {
        return;
    };
    let Ok(line) = BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, field(3))
        .regime_key(RegimeKey::GENERAL)
        .tax_rate(field(4))
        .charged_tax(field(5))
        .build()
    else {
        return;
    };
    let Ok(owner) = LegalEntity::from_tax_id("Software SL", "A58818501") else {
        return;
    };
    let Ok(system) = InformationSystemBuilder::new(owner, "AB", "1.0", "1").build() else {
        return;
    };
    let Ok(recipient) = LegalEntity::from_tax_id("Cliente SA", "A58818501") else {
        return;
    };

    let mut builder = HighRecordBuilder::new(id, "Mi Empresa SL", InvoiceType::F1)
        .add_recipient(recipient)
        .add_line(line)
        .total_tax(field(1))
        .total_amount(field(2))
        .chaining(Chaining::origin())
        .information_system(system)
        .generated_at(field(6));
    if !field(7).is_empty() {
        builder = builder.operation_date(field(7));
    }

    // Accepted records always carry a fingerprint that recomputes.
    if let Ok(record) = builder.build_with_clock(&clock) {
        assert!(record.verify_fingerprint());
    }
});

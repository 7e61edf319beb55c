use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use verifactu::core::*;

fn clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap())
}

fn system() -> InformationSystem {
    let owner = LegalEntity::from_tax_id("Software SL", "A58818501").unwrap();
    InformationSystemBuilder::new(owner, "AB", "1.0", "1").build().unwrap()
}

fn line() -> BreakdownDetail {
    BreakdownBuilder::taxed(TaxCode::Vat, Qualification::S1, "100.00")
        .regime_key(RegimeKey::GENERAL)
        .tax_rate("21")
        .charged_tax("21.00")
        .build()
        .unwrap()
}

fn build_record(series: &str, lines: usize, chaining: Chaining) -> HighRecord {
    let id = InvoiceId::new("B12345674", series, "22-07-2025", clock().today()).unwrap();
    let mut builder = HighRecordBuilder::new(id, "Benchmark SL", InvoiceType::F1)
        .add_recipient(LegalEntity::from_tax_id("Cliente SA", "A58818501").unwrap())
        .chaining(chaining)
        .information_system(system())
        .generated_at("2025-07-22T10:00:00+02:00")
        .total_tax(format!("{}.00", 21 * lines))
        .total_amount(format!("{}.00", 121 * lines));
    for _ in 0..lines {
        builder = builder.add_line(line());
    }
    builder.build_with_clock(&clock()).unwrap()
}

fn build_chain(len: usize) -> Vec<HighRecord> {
    let mut records: Vec<HighRecord> = Vec::with_capacity(len);
    for n in 0..len {
        let chaining = match records.last() {
            Some(previous) => Chaining::link_to(previous.invoice_id(), previous.fingerprint()).unwrap(),
            None => Chaining::origin(),
        };
        records.push(build_record(&format!("NC{n:06}"), 1, chaining));
    }
    records
}

fn bench_build_record(c: &mut Criterion) {
    c.bench_function("build_record_1_line", |b| {
        b.iter(|| black_box(build_record("NC000001", 1, Chaining::origin())));
    });
    c.bench_function("build_record_12_lines", |b| {
        b.iter(|| black_box(build_record("NC000001", 12, Chaining::origin())));
    });
}

fn bench_fingerprint(c: &mut Criterion) {
    let record = build_record("NC000001", 1, Chaining::origin());
    let input = record.fingerprint_input();
    c.bench_function("compute_fingerprint", |b| {
        b.iter(|| black_box(compute_fingerprint(black_box(&input), record.chaining())));
    });
}

fn bench_verify_chain(c: &mut Criterion) {
    let records = build_chain(1000);
    let entries: Vec<ChainEntry<'_>> = records.iter().map(ChainEntry::from).collect();
    c.bench_function("verify_chain_1000", |b| {
        b.iter(|| black_box(verify_chain(black_box(&entries))));
    });
}

fn bench_validate_tax_id(c: &mut Criterion) {
    let ids = ["B12345674", "12345678Z", "X1234567L", "Q2826000H", "B98765432"];
    c.bench_function("validate_tax_id", |b| {
        b.iter(|| {
            for id in ids {
                let _ = black_box(validate_tax_id(black_box(id)));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_build_record,
    bench_fingerprint,
    bench_verify_chain,
    bench_validate_tax_id,
);
criterion_main!(benches);

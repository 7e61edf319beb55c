#![no_main]

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use verifactu::core::*;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Must not panic on arbitrary input.
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let _ = validate_tax_id(s);
        let _ = validate_date(s);
        let _ = validate_year_end_date(s, today);
        let _ = validate_offset_datetime(s);
        let _ = validate_printable_ascii(s, TextPolicy::STRICT);
        if let Some(value) = parse_bounded_decimal(s, 12) {
            assert!(validate_bounded_decimal(s, 12), "parsed {value} from rejected '{s}'");
        }
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use verifactu::core::*;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut parts = s.splitn(4, '|');
        let issuer = parts.next().unwrap_or_default();
        let series = parts.next().unwrap_or_default();
        let date = parts.next().unwrap_or_default();
        let fingerprint = parts.next().unwrap_or_default();

        if let Ok(chaining) = Chaining::link_to_parts(issuer, series, date, fingerprint) {
            let previous = chaining.previous().unwrap();
            assert_eq!(previous.fingerprint().len(), FINGERPRINT_LEN);
            assert_eq!(previous.fingerprint(), previous.fingerprint().to_ascii_uppercase());
        }
    }
});

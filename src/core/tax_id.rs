//! Spanish tax identification number (NIF) syntax validation.
//!
//! Covers the three shapes the authority issues:
//! - DNI: 8 digits + control letter
//! - NIE: `X`/`Y`/`Z` + 7 digits + control letter; `K`/`L`/`M` + 7 digits + control letter
//! - CIF (legal entities): organisation letter + 7 digits + control digit or letter
//!
//! This is a syntax check only; whether the number is registered is the
//! authority's concern.

use thiserror::Error;

/// Error returned when a tax ID fails syntax validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tax ID '{value}': {reason}")]
pub struct TaxIdError {
    /// The invalid input value.
    pub value: String,
    /// Why the value failed validation.
    pub reason: String,
}

impl TaxIdError {
    fn new(value: &str, reason: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

const DNI_LETTERS: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";
const CIF_LETTERS: &[u8; 10] = b"JABCDEFGHI";

/// Organisation letters whose control character must be a letter.
const CIF_LETTER_CONTROL: &[u8] = b"NPQRSW";
/// Organisation letters whose control character must be a digit.
const CIF_DIGIT_CONTROL: &[u8] = b"ABEH";
const CIF_ORGANISATIONS: &[u8] = b"ABCDEFGHJNPQRSUVW";

/// Validate a Spanish NIF (DNI, NIE or CIF) including its control character.
///
/// The check is case-insensitive; callers store the upper-cased form.
pub fn validate_tax_id(tax_id: &str) -> Result<(), TaxIdError> {
    if tax_id.is_empty() {
        return Err(TaxIdError::new(tax_id, "must not be empty"));
    }
    let upper = tax_id.to_ascii_uppercase();
    let b = upper.as_bytes();
    if b.len() != 9 || !b.iter().all(u8::is_ascii_alphanumeric) {
        return Err(TaxIdError::new(tax_id, "must be 9 alphanumeric characters"));
    }

    let control = b[8];
    match b[0] {
        b'0'..=b'9' => {
            let number = digits_value(&b[..8])
                .ok_or_else(|| TaxIdError::new(tax_id, "DNI must start with 8 digits"))?;
            check_letter(tax_id, number, control)
        }
        prefix @ (b'X' | b'Y' | b'Z') => {
            let body = digits_value(&b[1..8])
                .ok_or_else(|| TaxIdError::new(tax_id, "NIE must have 7 digits after the prefix"))?;
            let lead = u64::from(prefix - b'X');
            check_letter(tax_id, lead * 10_000_000 + body, control)
        }
        b'K' | b'L' | b'M' => {
            let body = digits_value(&b[1..8])
                .ok_or_else(|| TaxIdError::new(tax_id, "must have 7 digits after the prefix"))?;
            check_letter(tax_id, body, control)
        }
        org if CIF_ORGANISATIONS.contains(&org) => check_cif(tax_id, b),
        _ => Err(TaxIdError::new(tax_id, "unknown leading character")),
    }
}

fn digits_value(bytes: &[u8]) -> Option<u64> {
    bytes.iter().try_fold(0u64, |acc, b| {
        b.is_ascii_digit().then(|| acc * 10 + u64::from(b - b'0'))
    })
}

fn check_letter(tax_id: &str, number: u64, control: u8) -> Result<(), TaxIdError> {
    let expected = DNI_LETTERS[(number % 23) as usize];
    if control == expected {
        Ok(())
    } else {
        Err(TaxIdError::new(
            tax_id,
            format!("control letter should be '{}'", expected as char),
        ))
    }
}

fn check_cif(tax_id: &str, b: &[u8]) -> Result<(), TaxIdError> {
    if !b[1..8].iter().all(u8::is_ascii_digit) {
        return Err(TaxIdError::new(tax_id, "CIF must have 7 digits after the organisation letter"));
    }

    let mut sum = 0u32;
    for (i, d) in b[1..8].iter().map(|d| u32::from(d - b'0')).enumerate() {
        if i % 2 == 0 {
            let doubled = d * 2;
            sum += doubled / 10 + doubled % 10;
        } else {
            sum += d;
        }
    }
    let check = ((10 - sum % 10) % 10) as usize;
    let digit = b'0' + check as u8;
    let letter = CIF_LETTERS[check];

    let org = b[0];
    let control = b[8];
    let ok = if CIF_LETTER_CONTROL.contains(&org) {
        control == letter
    } else if CIF_DIGIT_CONTROL.contains(&org) {
        control == digit
    } else {
        control == digit || control == letter
    };

    if ok {
        Ok(())
    } else {
        Err(TaxIdError::new(tax_id, "CIF control character does not match"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_dni() {
        assert!(validate_tax_id("12345678Z").is_ok());
        assert!(validate_tax_id("55555555K").is_ok());
        assert!(validate_tax_id("00000000T").is_ok());
        assert!(validate_tax_id("12345678z").is_ok());
    }

    #[test]
    fn invalid_dni_letter() {
        let err = validate_tax_id("12345678A").unwrap_err();
        assert!(err.reason.contains("'Z'"));
    }

    #[test]
    fn valid_nie() {
        assert!(validate_tax_id("X1234567L").is_ok());
        assert!(validate_tax_id("Y1234567X").is_ok());
        assert!(validate_tax_id("Z1234567R").is_ok());
    }

    #[test]
    fn valid_cif() {
        assert!(validate_tax_id("B12345674").is_ok());
        assert!(validate_tax_id("A58818501").is_ok());
        assert!(validate_tax_id("Q2826000H").is_ok());
    }

    #[test]
    fn invalid_cif() {
        assert!(validate_tax_id("B12345675").is_err());
        assert!(validate_tax_id("B1234567D").is_err());
        assert!(validate_tax_id("Q28260008").is_err());
    }

    #[test]
    fn bad_shapes() {
        assert!(validate_tax_id("").is_err());
        assert!(validate_tax_id("B1234567").is_err());
        assert!(validate_tax_id("B123456745").is_err());
        assert!(validate_tax_id("B1234-674").is_err());
        assert!(validate_tax_id("I12345674").is_err());
    }
}

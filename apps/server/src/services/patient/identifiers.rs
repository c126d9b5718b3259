//! Identifier ordering, nationality rules and the national-id checksum.

use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use sijil_models::{
    Identifier, Patient, IDENT_BORDER_NUMBER, IDENT_CITIZENSHIP_CARD, IDENT_DISPLACED_PERSON,
    IDENT_GCC_NUMBER, IDENT_JURISDICTIONAL_HEALTH_NUMBER, IDENT_NATIONAL_ID, IDENT_PASSPORT,
    IDENT_PERMANENT_RESIDENT_CARD, IDENT_VISA, NATIONALITY_CODE_SA,
};

/// Duplicate searches probe documents in this order, strongest first.
pub(crate) const IDENT_PRIORITY: [&str; 9] = [
    IDENT_NATIONAL_ID,
    IDENT_PERMANENT_RESIDENT_CARD,
    IDENT_BORDER_NUMBER,
    IDENT_DISPLACED_PERSON,
    IDENT_GCC_NUMBER,
    IDENT_JURISDICTIONAL_HEALTH_NUMBER,
    IDENT_VISA,
    IDENT_PASSPORT,
    IDENT_CITIZENSHIP_CARD,
];

/// Document codes acceptable for a Saudi national.
pub(crate) const SA_NATIONALITY_CODES: [&str; 4] = [
    IDENT_NATIONAL_ID,
    IDENT_DISPLACED_PERSON,
    IDENT_CITIZENSHIP_CARD,
    IDENT_JURISDICTIONAL_HEALTH_NUMBER,
];

/// Document codes acceptable for any other nationality.
pub(crate) const OTHER_NATIONALITY_CODES: [&str; 7] = [
    IDENT_PERMANENT_RESIDENT_CARD,
    IDENT_BORDER_NUMBER,
    IDENT_DISPLACED_PERSON,
    IDENT_JURISDICTIONAL_HEALTH_NUMBER,
    IDENT_GCC_NUMBER,
    IDENT_VISA,
    IDENT_PASSPORT,
];

pub(crate) fn allowed_codes_for_nationality(nationality: &str) -> &'static [&'static str] {
    if nationality == NATIONALITY_CODE_SA {
        &SA_NATIONALITY_CODES
    } else {
        &OTHER_NATIONALITY_CODES
    }
}

/// Stable sort by the first coding code's position in [`IDENT_PRIORITY`];
/// unknown codes and identifiers without codings go last.
pub(crate) fn sort_identifiers(identifiers: &mut [Identifier]) {
    identifiers.sort_by_key(|ident| {
        ident
            .type_
            .first_code()
            .and_then(|code| IDENT_PRIORITY.iter().position(|c| *c == code))
            .unwrap_or(usize::MAX)
    });
}

/// The shared internal validation of a submitted patient document:
/// nationality must be present, no identifier may be expired, NI/PRC values
/// must pass the checksum, and at least one identifier must carry a code
/// allowed for the nationality. `param_index` locates the patient parameter
/// in error payloads.
pub(crate) fn validate_identity_rules(patient: &Patient, param_index: usize) -> Result<()> {
    let nationality = patient.nationality_code().ok_or_else(|| {
        Error::validation_fields([(
            format!("Parameters.parameter[{param_index}]"),
            "nationality is not passed",
        )])
    })?;
    let nationality = nationality.to_string();

    for (i, ident) in patient.identifier.iter().enumerate() {
        validate_expiration(ident, param_index, i)?;
        validate_value_format(ident, param_index, i)?;
    }

    validate_required_ident_type(&nationality, &patient.identifier)
}

/// An identifier whose `period.end` lies before today's UTC midnight is
/// expired; one ending today is still valid.
fn validate_expiration(ident: &Identifier, param_index: usize, ident_index: usize) -> Result<()> {
    let Some(end) = ident.period.as_ref().and_then(|p| p.end.as_deref()) else {
        return Ok(());
    };

    let field =
        format!("Parameters.parameter[{param_index}].resource.identifier[{ident_index}].period.end");

    let end_date = parse_fhir_date(end)
        .ok_or_else(|| Error::validation_fields([(field.clone(), "invalid date format")]))?;

    if end_date < Utc::now().date_naive() {
        return Err(Error::validation_fields([(field, "identifier is expired")]));
    }

    Ok(())
}

fn validate_value_format(ident: &Identifier, param_index: usize, ident_index: usize) -> Result<()> {
    for coding in &ident.type_.coding {
        let code = coding.code.as_deref().unwrap_or_default();
        if code != IDENT_NATIONAL_ID && code != IDENT_PERMANENT_RESIDENT_CARD {
            continue;
        }

        if !is_valid_national_id(&ident.value) {
            return Err(Error::validation_fields([(
                format!(
                    "Parameters.parameter[{param_index}].resource.identifier[{ident_index}].value"
                ),
                "invalid identifier value format",
            )]));
        }
    }

    Ok(())
}

fn validate_required_ident_type(nationality: &str, identifiers: &[Identifier]) -> Result<()> {
    let allowed = allowed_codes_for_nationality(nationality);

    for ident in identifiers {
        for coding in &ident.type_.coding {
            if let Some(code) = coding.code.as_deref() {
                if allowed.contains(&code) {
                    return Ok(());
                }
            }
        }
    }

    Err(Error::validation(format!(
        "identifier code should be one of {}",
        allowed.join(",")
    )))
}

/// FHIR dates may be a plain date or a full timestamp; the leading
/// `YYYY-MM-DD` is what the expiry rule compares.
fn parse_fhir_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// NI/PRC checksum: strip spaces, require 10 decimal digits, first digit 1
/// or 2, then a Luhn-style doubled-digit sum that must divide by 10.
pub(crate) fn is_valid_national_id(value: &str) -> bool {
    let value: String = value.chars().filter(|c| *c != ' ').collect();

    if value.len() != 10 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = value.bytes().map(|b| u32::from(b - b'0')).collect();

    if digits[0] != 1 && digits[0] != 2 {
        return false;
    }

    let mut sum = 0;
    for (i, d) in digits.iter().enumerate() {
        if i % 2 == 0 {
            let doubled = d * 2;
            sum += doubled / 10 + doubled % 10;
        } else {
            sum += d;
        }
    }

    sum % 10 == 0
}

use crate::error::MateriaError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a per-unit material quantity from a catalog cell.
///
/// Handles formats like:
/// - "4" -> 4
/// - "0.5" -> 0.5
/// - "0,5" -> 0.5 (decimal comma)
///
/// Empty cells are an error: a catalog row without a quantity cannot be
/// aggregated. Negative quantities are rejected.
pub fn parse_quantity(s: &str) -> Result<Decimal, MateriaError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(MateriaError::InvalidValue("empty quantity".into()));
    }
    let value = parse_decimal(s)?;
    if value < Decimal::ZERO {
        return Err(MateriaError::InvalidValue(format!(
            "negative quantity '{s}'"
        )));
    }
    Ok(value.normalize())
}

/// Parse a project-declared count: a positive whole number.
///
/// Spreadsheet cells often carry integers as floats, so "3.0" and "3,0"
/// are accepted as 3. "2.5", "0" and "-1" are rejected.
pub fn parse_count(s: &str) -> Result<u32, MateriaError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(MateriaError::InvalidValue("empty count".into()));
    }
    let value = parse_decimal(s)?;
    if !value.fract().is_zero() {
        return Err(MateriaError::InvalidValue(format!(
            "count '{s}' is not a whole number"
        )));
    }
    if value <= Decimal::ZERO {
        return Err(MateriaError::InvalidValue(format!(
            "count '{s}' must be positive"
        )));
    }
    value
        .to_u32()
        .ok_or_else(|| MateriaError::InvalidValue(format!("count '{s}' is too large")))
}

/// Parse a decimal value, accepting a decimal comma.
fn parse_decimal(s: &str) -> Result<Decimal, MateriaError> {
    let normalized = s.replace(',', ".");
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|e| MateriaError::InvalidValue(format!("invalid number '{s}': {e}")))
}

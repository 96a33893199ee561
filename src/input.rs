// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Input validation shared by the ledger and the reward catalogs.

use crate::LedgerError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a user-supplied coin amount.
///
/// Non-numeric text is rejected as [`LedgerError::InvalidInput`]; the sign is
/// checked separately by the operation that consumes the amount.
///
/// # Example
///
/// ```
/// use hopeless_coin::parse_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(parse_amount(" 20 ").unwrap(), dec!(20));
/// assert!(parse_amount("twenty").is_err());
/// ```
pub fn parse_amount(input: &str) -> Result<Decimal, LedgerError> {
    let trimmed = input.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| LedgerError::InvalidInput(format!("'{trimmed}' is not a number")))
}

pub(crate) fn description(input: &str) -> Result<String, LedgerError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidInput(
            "description must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn positive_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_plain_and_scientific_numbers() {
        assert_eq!(parse_amount("15").unwrap(), dec!(15));
        assert_eq!(parse_amount("2.5").unwrap(), dec!(2.5));
        assert_eq!(parse_amount("1e2").unwrap(), dec!(100));
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        assert!(matches!(parse_amount(""), Err(LedgerError::InvalidInput(_))));
        assert!(matches!(parse_amount("abc"), Err(LedgerError::InvalidInput(_))));
        assert!(matches!(parse_amount("NaN"), Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn description_is_trimmed_and_required() {
        assert_eq!(description("  Read 1h ").unwrap(), "Read 1h");
        assert!(matches!(description("   "), Err(LedgerError::InvalidInput(_))));
    }

    #[test]
    fn amount_must_be_strictly_positive() {
        assert_eq!(positive_amount(dec!(0.5)).unwrap(), dec!(0.5));
        assert!(positive_amount(Decimal::ZERO).is_err());
        assert!(positive_amount(dec!(-3)).is_err());
    }
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Raw integer to display decimal conversion

use ethers::types::{I256, U256};
use governance_schema::ScaledAmount;

pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

/// Largest exponent with `10^decimals` inside a U256
pub const MAX_TOKEN_DECIMALS: u32 = 77;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Token decimals {0} exceeds the maximum of {MAX_TOKEN_DECIMALS}")]
pub struct InvalidDecimals(pub u32);

/// Fixed-point divisor `10^decimals` applied to raw token amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalScale {
    decimals: u32,
    divisor: U256,
}

impl DecimalScale {
    pub fn new(decimals: u32) -> Result<Self, InvalidDecimals> {
        if decimals > MAX_TOKEN_DECIMALS {
            return Err(InvalidDecimals(decimals));
        }
        Ok(Self {
            decimals,
            divisor: U256::exp10(decimals as usize),
        })
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Scale a raw amount, e.g. `1500000000000000000` -> `"1.5"` at 18 decimals
    pub fn scale(&self, raw: I256) -> ScaledAmount {
        let sign = if raw.is_negative() { "-" } else { "" };
        let (whole, fraction) = raw.unsigned_abs().div_mod(self.divisor);
        if self.decimals == 0 {
            return ScaledAmount::new(format!("{}{}", sign, whole));
        }
        let formatted = format!(
            "{}{}.{:0>width$}",
            sign,
            whole,
            fraction.to_string(),
            width = self.decimals as usize
        );
        ScaledAmount::new(trim_fraction(&formatted))
    }
}

impl Default for DecimalScale {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_TOKEN_DECIMALS,
            divisor: U256::exp10(DEFAULT_TOKEN_DECIMALS as usize),
        }
    }
}

/// Drop trailing fractional zeros and a dangling decimal point
fn trim_fraction(formatted: &str) -> String {
    if !formatted.contains('.') {
        return formatted.to_string();
    }
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

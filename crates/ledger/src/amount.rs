use std::{fmt, str::FromStr};

use stellar_xdr::curr as xdr;

use crate::error::{LedgerError, Result};

pub const STROOPS_PER_UNIT: i64 = 10_000_000;
const MAX_DECIMALS: usize = 7;

/// Non-negative asset quantity in stroops (1e-7 of a unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(i64::MAX);

    pub fn stroops(self) -> i64 {
        self.0
    }

    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason| LedgerError::InvalidAmount {
            input: input.to_string(),
            reason,
        };
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty"));
        }
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid("only digits and a single decimal point are allowed"));
        }
        if fraction.len() > MAX_DECIMALS {
            return Err(invalid("more than 7 decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("too large"))?
        };
        let fraction: i64 = if fraction.is_empty() {
            0
        } else {
            let scale = 10i64.pow((MAX_DECIMALS - fraction.len()) as u32);
            fraction.parse::<i64>().map_err(|_| invalid("too large"))? * scale
        };

        whole
            .checked_mul(STROOPS_PER_UNIT)
            .and_then(|stroops| stroops.checked_add(fraction))
            .map(Self)
            .ok_or_else(|| invalid("too large"))
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / STROOPS_PER_UNIT;
        let fraction = self.0 % STROOPS_PER_UNIT;
        if fraction == 0 {
            return write!(f, "{whole}");
        }
        let fraction = format!("{fraction:07}");
        write!(f, "{whole}.{}", fraction.trim_end_matches('0'))
    }
}

/// Exchange-rate bound expressed as a positive fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Price {
    pub n: i32,
    pub d: i32,
}

impl Price {
    pub const ONE: Price = Price { n: 1, d: 1 };

    pub fn new(n: i32, d: i32) -> Result<Self> {
        if n <= 0 || d <= 0 {
            return Err(LedgerError::InvalidPrice(format!("{n}/{d}")));
        }
        Ok(Self { n, d })
    }
}

impl FromStr for Price {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LedgerError::InvalidPrice(s.to_string());
        let (n, d) = match s.trim().split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s.trim(), "1"),
        };
        let n = n.parse().map_err(|_| invalid())?;
        let d = d.parse().map_err(|_| invalid())?;
        Price::new(n, d).map_err(|_| invalid())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.n, self.d)
    }
}

impl From<Price> for xdr::Price {
    fn from(price: Price) -> Self {
        xdr::Price {
            n: price.n,
            d: price.d,
        }
    }
}

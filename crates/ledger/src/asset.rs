use std::{cmp::Ordering, fmt, str::FromStr};

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{self as xdr, Limits, WriteXdr};

use crate::{
    error::{LedgerError, Result},
    keypair::AccountId,
};

/// Fee of every constant-product pool since protocol 18, in basis points.
pub const LIQUIDITY_POOL_FEE_V18: i32 = 30;


#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetCode(String);

impl AssetCode {
    pub fn new(code: &str) -> Result<Self> {
        let valid =
            (1..=12).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_alphanumeric());
        if !valid {
            return Err(LedgerError::InvalidAssetCode(code.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    fn is_alphanum4(&self) -> bool {
        self.0.len() <= 4
    }

    /// Code bytes right-padded with zeros to `N`.
    fn padded<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        bytes[..self.0.len()].copy_from_slice(self.0.as_bytes());
        bytes
    }
}

impl fmt::Display for AssetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Asset {
    Native,
    Credit { code: AssetCode, issuer: AccountId },
}

impl Asset {
    pub fn native() -> Self {
        Asset::Native
    }

    pub fn credit(code: &str, issuer: AccountId) -> Result<Self> {
        Ok(Asset::Credit {
            code: AssetCode::new(code)?,
            issuer,
        })
    }

    // native < alphanum4 < alphanum12
    fn rank(&self) -> u8 {
        match self {
            Asset::Native => 0,
            Asset::Credit { code, .. } if code.is_alphanum4() => 1,
            Asset::Credit { .. } => 2,
        }
    }
}

impl Ord for Asset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank()).then_with(|| match (self, other) {
            (Asset::Credit { code: a, issuer: ia }, Asset::Credit { code: b, issuer: ib }) => {
                a.cmp(b).then_with(|| ia.cmp(ib))
            }
            _ => Ordering::Equal,
        })
    }
}

impl PartialOrd for Asset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Credit { code, issuer } => write!(f, "{code}:{issuer}"),
        }
    }
}

impl From<&Asset> for xdr::Asset {
    fn from(asset: &Asset) -> Self {
        match asset {
            Asset::Native => xdr::Asset::Native,
            Asset::Credit { code, issuer } if code.is_alphanum4() => {
                xdr::Asset::CreditAlphanum4(xdr::AlphaNum4 {
                    asset_code: xdr::AssetCode4(code.padded()),
                    issuer: (*issuer).into(),
                })
            }
            Asset::Credit { code, issuer } => xdr::Asset::CreditAlphanum12(xdr::AlphaNum12 {
                asset_code: xdr::AssetCode12(code.padded()),
                issuer: (*issuer).into(),
            }),
        }
    }
}

/// Pool share asset for a pair of assets; `asset_a` must sort before `asset_b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiquidityPoolAsset {
    asset_a: Asset,
    asset_b: Asset,
    fee: i32,
}

impl LiquidityPoolAsset {
    pub fn new(asset_a: Asset, asset_b: Asset, fee: i32) -> Result<Self> {
        if asset_a >= asset_b {
            return Err(LedgerError::InvalidPoolAsset(
                "assets must be distinct and in canonical order",
            ));
        }
        if fee != LIQUIDITY_POOL_FEE_V18 {
            return Err(LedgerError::InvalidPoolAsset("fee must be 30 basis points"));
        }
        Ok(Self {
            asset_a,
            asset_b,
            fee,
        })
    }

    fn parameters(&self, kind: PoolKind) -> xdr::LiquidityPoolParameters {
        match kind {
            PoolKind::ConstantProduct => xdr::LiquidityPoolParameters::LiquidityPoolConstantProduct(
                xdr::LiquidityPoolConstantProductParameters {
                    asset_a: (&self.asset_a).into(),
                    asset_b: (&self.asset_b).into(),
                    fee: self.fee,
                },
            ),
        }
    }
}

impl From<&LiquidityPoolAsset> for xdr::ChangeTrustAsset {
    fn from(asset: &LiquidityPoolAsset) -> Self {
        xdr::ChangeTrustAsset::PoolShare(asset.parameters(PoolKind::ConstantProduct))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    ConstantProduct,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId([u8; 32]);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolId({self})")
    }
}

impl FromStr for PoolId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| LedgerError::InvalidPoolId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<PoolId> for xdr::PoolId {
    fn from(id: PoolId) -> Self {
        xdr::PoolId(xdr::Hash(id.0))
    }
}

/// Deterministic pool identifier: SHA-256 over the XDR pool parameters.
pub fn pool_id(kind: PoolKind, asset: &LiquidityPoolAsset) -> Result<PoolId> {
    let parameters = asset.parameters(kind).to_xdr(Limits::none())?;
    Ok(PoolId(Sha256::digest(parameters).into()))
}

#[cfg(test)]
#[path = "tests/asset_tests.rs"]
mod tests;

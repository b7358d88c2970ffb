use std::{fmt, str::FromStr};

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use stellar_strkey::ed25519::{PrivateKey, PublicKey};
use stellar_xdr::curr as xdr;

use crate::error::{LedgerError, Result};

/// Public half of an ed25519 keypair, rendered as a `G...` strkey.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&PublicKey(self.0).to_string())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({self})")
    }
}

impl FromStr for AccountId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        PublicKey::from_string(s)
            .map(|key| Self::from_bytes(key.0))
            .map_err(|_| LedgerError::InvalidAccountId(s.to_string()))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl From<AccountId> for xdr::AccountId {
    fn from(id: AccountId) -> Self {
        xdr::AccountId(xdr::PublicKey::PublicKeyTypeEd25519(xdr::Uint256(id.0)))
    }
}

impl From<AccountId> for xdr::MuxedAccount {
    fn from(id: AccountId) -> Self {
        xdr::MuxedAccount::Ed25519(xdr::Uint256(id.0))
    }
}

#[derive(Clone)]
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    pub fn random() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_secret_seed(seed: &str) -> Result<Self> {
        let key = PrivateKey::from_string(seed).map_err(|_| LedgerError::InvalidSecretSeed)?;
        Ok(Self {
            signing: SigningKey::from_bytes(&key.0),
        })
    }

    pub fn public_key(&self) -> AccountId {
        AccountId::from_bytes(self.signing.verifying_key().to_bytes())
    }

    pub fn secret_seed(&self) -> String {
        PrivateKey(self.signing.to_bytes()).to_string()
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }

    pub fn signature_hint(&self) -> [u8; 4] {
        let public = self.public_key();
        let bytes = public.as_bytes();
        [bytes[28], bytes[29], bytes[30], bytes[31]]
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    use super::*;

    fn verifies(public_key: AccountId, message: &[u8], signature: &[u8; 64]) -> bool {
        VerifyingKey::from_bytes(public_key.as_bytes())
            .expect("public key")
            .verify(message, &Signature::from_bytes(signature))
            .is_ok()
    }

    #[test]
    fn account_ids_use_stellar_strkey_encoding() {
        let zero = AccountId::from_bytes([0; 32]);
        assert_eq!(
            zero.to_string(),
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"
        );
        // checksum mismatch
        assert!("GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHG"
            .parse::<AccountId>()
            .is_err());
        assert!("GAAAA".parse::<AccountId>().is_err());
    }

    #[test]
    fn random_keypairs_differ_and_render_as_account_ids() {
        let a = Keypair::random();
        let b = Keypair::random();
        assert_ne!(a.public_key(), b.public_key());

        let rendered = a.public_key().to_string();
        assert!(rendered.starts_with('G'));
        assert_eq!(rendered.len(), 56);
        assert_eq!(rendered.parse::<AccountId>().expect("parse"), a.public_key());
    }

    #[test]
    fn secret_seed_restores_the_same_keypair() {
        let keypair = Keypair::random();
        let seed = keypair.secret_seed();
        assert!(seed.starts_with('S'));

        let restored = Keypair::from_secret_seed(&seed).expect("seed");
        assert_eq!(restored.public_key(), keypair.public_key());
        assert!(Keypair::from_secret_seed(&keypair.public_key().to_string()).is_err());
    }

    #[test]
    fn signatures_verify_and_hint_is_key_suffix() {
        let keypair = Keypair::random();
        let signature = keypair.sign(b"payload");
        assert!(verifies(keypair.public_key(), b"payload", &signature));
        assert!(!verifies(keypair.public_key(), b"other", &signature));
        assert_eq!(
            &keypair.signature_hint()[..],
            &keypair.public_key().as_bytes()[28..]
        );
    }

    #[test]
    fn debug_output_hides_secret() {
        let keypair = Keypair::random();
        let debug = format!("{keypair:?}");
        assert!(!debug.contains(&keypair.secret_seed()));
        assert!(debug.contains(&keypair.public_key().to_string()));
    }
}

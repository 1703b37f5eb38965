//! Handles the creation and verification of ed25519 state signatures.
//!
//! The contract verifies signatures over the XDR encoding of a [State], so
//! that is what [Signer::sign_state] signs.

use core::fmt::Debug;

use ed25519_dalek::{Signer as _, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

use crate::{
    scval,
    wire::{PublicKey, ScType, Signature, State},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("cannot encode state: {0}")]
    Encoding(#[from] scval::Error),
    #[error("{0:?} is not a valid ed25519 public key")]
    InvalidPublicKey(PublicKey),
    #[error("signature verification failed")]
    InvalidSignature,
}

pub struct Signer {
    key: SigningKey,
}

impl Debug for Signer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signer")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new<R: rand::Rng + rand::CryptoRng>(rng: &mut R) -> Self {
        let mut secret = [0u8; 32];
        rng.fill_bytes(&mut secret);
        Self::from_bytes(&secret)
    }

    /// Signer for a known 32 byte secret key.
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(secret),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.key.verifying_key().to_bytes())
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        Signature(self.key.sign(msg).to_bytes())
    }

    pub fn sign_state(&self, state: &State) -> Result<Signature, Error> {
        Ok(self.sign(&state.marshal()?))
    }
}

/// Checks that `sig` is a signature of `pubkey` over `state`.
pub fn verify_state(pubkey: &PublicKey, state: &State, sig: &Signature) -> Result<(), Error> {
    let key = VerifyingKey::from_bytes(&pubkey.0).map_err(|_| Error::InvalidPublicKey(*pubkey))?;
    let sig = ed25519_dalek::Signature::from_bytes(&sig.0);
    key.verify(&state.marshal()?, &sig)
        .map_err(|_| Error::InvalidSignature)
}

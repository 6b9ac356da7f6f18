use chrono::Utc;
use ed25519_dalek::pkcs8::{EncodePrivateKey, KeypairBytes};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use super::error::KeyError;
use crate::config::{SigningAlgorithm, TokenConfig};

/// Asymmetric keypair used to sign and verify delegation tokens.
/// Built once at startup and only read afterwards.
#[derive(Clone)]
pub struct SigningKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ephemeral: bool,
}

impl fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeys")
            .field("algorithm", &self.algorithm)
            .field("ephemeral", &self.ephemeral)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize, Deserialize)]
struct ProbeClaims {
    sub: String,
    exp: i64,
}

impl SigningKeys {
    /// Pick the key source from configuration. Configured key files always
    /// win; the ephemeral pair is only used when explicitly allowed.
    pub fn from_config(config: &TokenConfig) -> Result<Self, KeyError> {
        match (&config.private_key_path, &config.public_key_path) {
            (Some(private_path), Some(public_path)) => {
                Self::from_pem_files(config.algorithm, private_path, public_path)
            }
            (Some(_), None) | (None, Some(_)) => Err(KeyError::NotConfigured(
                "both TOKEN_PRIVATE_KEY_PATH and TOKEN_PUBLIC_KEY_PATH must be set",
            )),
            (None, None) if config.allow_ephemeral_keys => Self::ephemeral_insecure(),
            (None, None) => Err(KeyError::NotConfigured(
                "no key files configured and ephemeral keys are not allowed",
            )),
        }
    }

    pub fn from_pem_files(
        algorithm: SigningAlgorithm,
        private_path: &Path,
        public_path: &Path,
    ) -> Result<Self, KeyError> {
        let private_pem = std::fs::read(private_path).map_err(|source| KeyError::Read {
            path: private_path.to_path_buf(),
            source,
        })?;
        let public_pem = std::fs::read(public_path).map_err(|source| KeyError::Read {
            path: public_path.to_path_buf(),
            source,
        })?;

        let keys = Self::from_pem(algorithm, &private_pem, &public_pem)?;
        info!("Loaded {:?} signing keys from {}", keys.algorithm, private_path.display());
        Ok(keys)
    }

    pub fn from_pem(algorithm: SigningAlgorithm, private_pem: &[u8], public_pem: &[u8]) -> Result<Self, KeyError> {
        let invalid = |e: jsonwebtoken::errors::Error| KeyError::Invalid(e.to_string());

        let (algorithm, encoding, decoding) = match algorithm {
            SigningAlgorithm::EdDsa => (
                Algorithm::EdDSA,
                EncodingKey::from_ed_pem(private_pem).map_err(invalid)?,
                DecodingKey::from_ed_pem(public_pem).map_err(invalid)?,
            ),
            SigningAlgorithm::Rs256 => (
                Algorithm::RS256,
                EncodingKey::from_rsa_pem(private_pem).map_err(invalid)?,
                DecodingKey::from_rsa_pem(public_pem).map_err(invalid)?,
            ),
        };

        let keys = Self {
            algorithm,
            encoding,
            decoding,
            ephemeral: false,
        };
        keys.probe()?;
        Ok(keys)
    }

    /// Generate a process-local Ed25519 pair. Tokens signed with it die
    /// with the process; never use outside development and tests.
    pub fn ephemeral_insecure() -> Result<Self, KeyError> {
        let signing = SigningKey::generate(&mut OsRng);

        let der = KeypairBytes {
            secret_key: signing.to_bytes(),
            public_key: None,
        }
        .to_pkcs8_der()
        .map_err(|e| KeyError::Generation(e.to_string()))?;

        let keys = Self {
            algorithm: Algorithm::EdDSA,
            encoding: EncodingKey::from_ed_der(der.as_bytes()),
            decoding: DecodingKey::from_ed_der(signing.verifying_key().as_bytes()),
            ephemeral: true,
        };
        keys.probe()?;

        warn!("Using an EPHEMERAL signing keypair: tokens will not survive a restart and offer no production security");
        Ok(keys)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    /// Sign and verify a throwaway claim so a mismatched or unusable pair
    /// fails at load time instead of on the first request
    fn probe(&self) -> Result<(), KeyError> {
        let claims = ProbeClaims {
            sub: "key-probe".to_string(),
            exp: Utc::now().timestamp() + 60,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| KeyError::Signing(e.to_string()))?;

        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        decode::<ProbeClaims>(&token, &self.decoding, &validation)
            .map(|_| ())
            .map_err(|_| KeyError::Mismatch)
    }
}

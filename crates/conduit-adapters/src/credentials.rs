//! Credential sealing.
//!
//! Connector instances store their provider credentials as an opaque blob:
//! `base64(nonce || ciphertext || tag)` under AES-256-GCM. The key is derived
//! per organization with HKDF-SHA256 from an externally supplied master key,
//! with the organization id as salt, so a blob copied to another tenant's
//! instance does not open.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use conduit_core::ConnectorInstance;
use hkdf::Hkdf;
use rand::RngCore;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AdapterError, CredentialError};

const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;
const HKDF_INFO: &[u8] = b"conduit-instance-credentials-v1";

/// Seals and opens instance credential blobs.
pub trait CredentialCodec: Send + Sync {
    /// Seal a credential document for an organization.
    fn encode(
        &self,
        organization_id: Uuid,
        credentials: &serde_json::Value,
    ) -> Result<String, CredentialError>;

    /// Open an instance's stored blob.
    fn decode(&self, instance: &ConnectorInstance) -> Result<ProviderCredentials, CredentialError>;
}

/// Decoded credentials, ready for an adapter to parse into its own shape.
#[derive(Clone)]
pub struct ProviderCredentials(serde_json::Value);

impl ProviderCredentials {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Deserialize into a provider-specific shape.
    pub fn parse<T: DeserializeOwned>(&self, provider: &str) -> Result<T, AdapterError> {
        serde_json::from_value(self.0.clone())
            .map_err(|_| AdapterError::invalid_configuration(provider))
    }
}

impl From<serde_json::Value> for ProviderCredentials {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProviderCredentials([REDACTED])")
    }
}

/// AES-256-GCM implementation of [`CredentialCodec`].
#[derive(Clone)]
pub struct CredentialCipher {
    master_key: [u8; KEY_LENGTH],
}

impl CredentialCipher {
    pub fn new(master_key: [u8; KEY_LENGTH]) -> Self {
        Self { master_key }
    }

    /// Build from a base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, CredentialError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CredentialError::InvalidKey(format!("invalid base64: {}", e)))?;

        let key: [u8; KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            CredentialError::InvalidKey(format!(
                "key must be {} bytes, got {}",
                KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self::new(key))
    }

    /// Generate a fresh random master key, base64-encoded.
    pub fn generate_master_key() -> String {
        let mut key = [0u8; KEY_LENGTH];
        rand::rng().fill_bytes(&mut key);
        STANDARD.encode(key)
    }

    fn cipher_for(&self, organization_id: Uuid) -> Result<Aes256Gcm, String> {
        let hkdf = Hkdf::<Sha256>::new(Some(organization_id.as_bytes()), &self.master_key);
        let mut derived = [0u8; KEY_LENGTH];
        hkdf.expand(HKDF_INFO, &mut derived)
            .map_err(|e| format!("key derivation failed: {}", e))?;
        Aes256Gcm::new_from_slice(&derived).map_err(|e| format!("failed to create cipher: {}", e))
    }

    pub fn seal(&self, organization_id: Uuid, plaintext: &[u8]) -> Result<String, CredentialError> {
        let cipher = self
            .cipher_for(organization_id)
            .map_err(CredentialError::SealFailed)?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| CredentialError::SealFailed(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(blob))
    }

    pub fn open(&self, organization_id: Uuid, sealed: &str) -> Result<Vec<u8>, CredentialError> {
        let blob = STANDARD
            .decode(sealed.trim())
            .map_err(|e| CredentialError::OpenFailed(format!("invalid base64: {}", e)))?;

        if blob.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CredentialError::OpenFailed("blob too short".to_string()));
        }

        let cipher = self
            .cipher_for(organization_id)
            .map_err(CredentialError::OpenFailed)?;
        let (nonce, ciphertext) = blob.split_at(NONCE_LENGTH);

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CredentialError::OpenFailed("authentication failed".to_string()))
    }
}

impl CredentialCodec for CredentialCipher {
    fn encode(
        &self,
        organization_id: Uuid,
        credentials: &serde_json::Value,
    ) -> Result<String, CredentialError> {
        if !credentials.is_object() {
            return Err(CredentialError::Malformed(
                "credentials must be a JSON object".to_string(),
            ));
        }
        let json = serde_json::to_vec(credentials)
            .map_err(|e| CredentialError::SealFailed(e.to_string()))?;
        self.seal(organization_id, &json)
    }

    fn decode(&self, instance: &ConnectorInstance) -> Result<ProviderCredentials, CredentialError> {
        let plaintext = self.open(instance.organization_id, &instance.config)?;
        let value: serde_json::Value = serde_json::from_slice(&plaintext)
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;

        if !value.is_object() {
            return Err(CredentialError::Malformed(
                "credentials must be a JSON object".to_string(),
            ));
        }
        Ok(ProviderCredentials(value))
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("master_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn cipher() -> CredentialCipher {
        CredentialCipher::from_base64(&CredentialCipher::generate_master_key()).unwrap()
    }

    #[test]
    fn test_decode_sealed_instance() {
        let cipher = cipher();
        let org = Uuid::new_v4();
        let blob = cipher.encode(org, &json!({ "apiKey": "sk_test_1" })).unwrap();
        let instance = ConnectorInstance::new(org, "Stripe", "Payments", blob);

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Shape {
            api_key: String,
        }

        let creds = cipher.decode(&instance).unwrap();
        assert_eq!(creds.parse::<Shape>("Stripe").unwrap().api_key, "sk_test_1");
    }

    #[test]
    fn test_blob_is_bound_to_organization() {
        let cipher = cipher();
        let blob = cipher.encode(Uuid::new_v4(), &json!({ "apiKey": "k" })).unwrap();
        let foreign = ConnectorInstance::new(Uuid::new_v4(), "Stripe", "Copied", blob);

        assert!(matches!(
            cipher.decode(&foreign),
            Err(CredentialError::OpenFailed(_))
        ));
    }

    #[test]
    fn test_nonce_is_fresh_per_seal() {
        let cipher = cipher();
        let org = Uuid::new_v4();
        let doc = json!({ "apiKey": "k" });
        assert_ne!(cipher.encode(org, &doc).unwrap(), cipher.encode(org, &doc).unwrap());
    }

    #[test]
    fn test_tampered_and_short_blobs_fail() {
        let cipher = cipher();
        let org = Uuid::new_v4();
        let blob = cipher.encode(org, &json!({ "apiKey": "k" })).unwrap();

        let mut bytes = STANDARD.decode(&blob).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(cipher.open(org, &STANDARD.encode(bytes)).is_err());
        assert!(cipher.open(org, &STANDARD.encode([0u8; 10])).is_err());
        assert!(cipher.open(org, "not base64!").is_err());
    }

    #[test]
    fn test_rejects_bad_master_key() {
        assert!(CredentialCipher::from_base64(&STANDARD.encode([1u8; 16])).is_err());
        assert!(CredentialCipher::from_base64("%%%").is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = ProviderCredentials::new(json!({ "apiKey": "sk_live_secret" }));
        assert!(!format!("{:?}", creds).contains("sk_live_secret"));
        assert!(format!("{:?}", cipher()).contains("REDACTED"));
    }

    #[test]
    fn test_parse_reports_provider() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            token: String,
        }
        let err = ProviderCredentials::new(json!({})).parse::<Needs>("Slack").unwrap_err();
        assert_eq!(err.to_string(), "Invalid Slack configuration");
    }
}

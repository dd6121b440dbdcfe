//! Contract registry
//!
//! Resolves, per chain role, the deployed bridge address, its ABI and the
//! signer credential from a `contract_info.json` document:
//!
//! ```json
//! {
//!   "signer": "0x...", "signer_key": "0x...",
//!   "source":      { "address": "0x...", "abi": [ ... ] },
//!   "destination": { "address": "0x...", "abi": [ ... ], "signer": "0x...", "signer_key": "0x..." }
//! }
//! ```
//!
//! Signer fields are resolved independently: top-level value first, then the
//! entry of the chain that submits the transaction, then the other entry.

use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::Address;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::RelayError;
use crate::redact::SecretKey;
use crate::submitter::RelaySigner;
use crate::types::{ChainRole, SignerCredential};

const SIGNER_FIELD: &str = "signer";
const SIGNER_KEY_FIELD: &str = "signer_key";

/// Contract deployment resolved for one chain role
#[derive(Clone)]
pub struct ContractEntry {
    pub role: ChainRole,
    pub address: Address,
    pub abi: JsonAbi,
    /// Per-chain signer address, if present and non-empty
    pub signer: Option<String>,
    /// Per-chain signer key, if present and non-empty
    pub signer_key: Option<SecretKey>,
}

/// Custom Debug that elides the ABI.
impl fmt::Debug for ContractEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractEntry")
            .field("role", &self.role)
            .field("address", &self.address)
            .field("abi_items", &self.abi.len())
            .field("signer", &self.signer)
            .field("signer_key", &self.signer_key)
            .finish()
    }
}

impl ContractEntry {
    /// The single ABI function named `name`; missing or overloaded is a config error
    pub fn function(&self, name: &str) -> Result<&Function, RelayError> {
        match self.abi.function(name).map(Vec::as_slice) {
            Some([function]) => Ok(function),
            Some(_) => Err(RelayError::config(format!(
                "'{}.abi' declares '{}' more than once",
                self.role, name
            ))),
            None => Err(RelayError::config(format!(
                "'{}.abi' has no '{}' function",
                self.role, name
            ))),
        }
    }
}

/// Parsed contract_info document
#[derive(Clone)]
pub struct ContractRegistry {
    document: Map<String, Value>,
    origin: String,
}

impl fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("origin", &self.origin)
            .field("keys", &self.document.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ContractRegistry {
    /// Read and parse a contract_info file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RelayError::config(format!(
                "Failed to read contract info {}: {}",
                path.display(),
                e
            ))
        })?;
        let registry = Self::parse(&raw, path.display().to_string())?;
        debug!(path = %path.display(), "Loaded contract info");
        Ok(registry)
    }

    /// Parse a contract_info document held in memory
    pub fn from_json_str(raw: &str) -> Result<Self, RelayError> {
        Self::parse(raw, "<inline>".to_string())
    }

    fn parse(raw: &str, origin: String) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            RelayError::config(format!("Malformed contract info {}: {}", origin, e))
        })?;
        match value {
            Value::Object(document) => Ok(Self { document, origin }),
            _ => Err(RelayError::config(format!(
                "Malformed contract info {}: top level must be a JSON object",
                origin
            ))),
        }
    }

    /// Resolve the bridge deployment for a chain role
    pub fn resolve(&self, role: ChainRole) -> Result<ContractEntry, RelayError> {
        let entry = self.chain_object(role).ok_or_else(|| {
            RelayError::config(format!(
                "Contract info {} has no '{}' entry",
                self.origin, role
            ))
        })?;

        let address = entry
            .get("address")
            .and_then(Value::as_str)
            .ok_or_else(|| RelayError::config(format!("'{}.address' missing or not a string", role)))?;
        let address = Address::from_str(address.trim()).map_err(|e| {
            RelayError::config(format!("'{}.address' is not a valid address: {}", role, e))
        })?;

        let abi = entry
            .get("abi")
            .ok_or_else(|| RelayError::config(format!("'{}.abi' missing", role)))?;
        let abi = parse_abi(abi)
            .map_err(|e| RelayError::config(format!("'{}.abi' is not a valid ABI: {}", role, e)))?;

        Ok(ContractEntry {
            role,
            address,
            abi,
            signer: non_empty_string(entry.get(SIGNER_FIELD)),
            signer_key: non_empty_string(entry.get(SIGNER_KEY_FIELD)).map(SecretKey::new),
        })
    }

    /// Shared top-level credential, when both fields are present and non-empty
    pub fn resolve_global_signer(&self) -> Option<SignerCredential> {
        Some(SignerCredential {
            wallet_address: non_empty_string(self.document.get(SIGNER_FIELD))?,
            private_key: SecretKey::new(non_empty_string(self.document.get(SIGNER_KEY_FIELD))?),
        })
    }

    /// Resolve the credential used on `submitting`, applying field precedence
    /// and non-empty validation.
    pub fn resolve_credential(&self, submitting: ChainRole) -> Result<SignerCredential, RelayError> {
        let wallet_address = self.lookup_signer_field(SIGNER_FIELD, submitting).ok_or_else(|| {
            RelayError::config(
                "'signer' missing or invalid in contract info (top-level or per-chain)",
            )
        })?;
        let private_key = self
            .lookup_signer_field(SIGNER_KEY_FIELD, submitting)
            .ok_or_else(|| {
                RelayError::config(
                    "'signer_key' missing or invalid in contract info (top-level or per-chain)",
                )
            })?;

        Ok(SignerCredential {
            wallet_address,
            private_key: SecretKey::new(private_key),
        })
    }

    /// Resolve the credential for `submitting` and turn it into a signer whose
    /// key matches the configured wallet address.
    pub fn resolve_signer(&self, submitting: ChainRole) -> Result<RelaySigner, RelayError> {
        let credential = self.resolve_credential(submitting)?;
        RelaySigner::from_credential(&credential)
    }

    fn chain_object(&self, role: ChainRole) -> Option<&Map<String, Value>> {
        self.document.get(role.as_str()).and_then(Value::as_object)
    }

    fn lookup_signer_field(&self, field: &str, submitting: ChainRole) -> Option<String> {
        non_empty_string(self.document.get(field)).or_else(|| {
            [submitting, submitting.counterpart()]
                .into_iter()
                .find_map(|role| non_empty_string(self.chain_object(role)?.get(field)))
        })
    }
}

/// Trimmed string value, or None if absent, not a string or blank
fn non_empty_string(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// ABI given either inline or as a JSON-encoded string
fn parse_abi(value: &Value) -> serde_json::Result<JsonAbi> {
    match value {
        Value::String(encoded) => serde_json::from_str(encoded),
        other => serde_json::from_value(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const KEY_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn abi() -> Value {
        json!([{
            "type": "function",
            "name": "wrap",
            "inputs": [
                {"name": "token", "type": "address"},
                {"name": "recipient", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        }])
    }

    fn document(extra: Value) -> ContractRegistry {
        let mut doc = json!({
            "source": {"address": "0x0000000000000000000000000000000000000001", "abi": abi()},
            "destination": {"address": "0x0000000000000000000000000000000000000002", "abi": abi()}
        });
        let extra = extra.as_object().cloned().unwrap_or_default();
        for (k, v) in extra {
            if let (Some(existing), Value::Object(fields)) = (doc.get_mut(&k), &v) {
                if let Some(obj) = existing.as_object_mut() {
                    obj.extend(fields.clone());
                    continue;
                }
            }
            doc[k] = v;
        }
        ContractRegistry::from_json_str(&doc.to_string()).unwrap()
    }

    #[test]
    fn test_resolve_entry() {
        let registry = document(json!({}));
        let entry = registry.resolve(ChainRole::Destination).unwrap();
        assert_eq!(entry.role, ChainRole::Destination);
        assert_eq!(
            entry.address,
            Address::from_str("0x0000000000000000000000000000000000000002").unwrap()
        );
        assert!(entry.abi.function("wrap").is_some());
        assert!(entry.signer.is_none());
    }

    #[test]
    fn test_resolve_abi_encoded_as_string() {
        let raw = json!({
            "source": {
                "address": "0x0000000000000000000000000000000000000001",
                "abi": abi().to_string()
            }
        });
        let registry = ContractRegistry::from_json_str(&raw.to_string()).unwrap();
        let entry = registry.resolve(ChainRole::Source).unwrap();
        assert!(entry.abi.function("wrap").is_some());
    }

    #[test]
    fn test_missing_role_entry() {
        let raw = json!({"source": {"address": "0x0000000000000000000000000000000000000001", "abi": []}});
        let registry = ContractRegistry::from_json_str(&raw.to_string()).unwrap();
        let err = registry.resolve(ChainRole::Destination).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
        assert!(err.to_string().contains("destination"));
    }

    #[test]
    fn test_invalid_address() {
        let raw = json!({"source": {"address": "not-an-address", "abi": []}});
        let registry = ContractRegistry::from_json_str(&raw.to_string()).unwrap();
        assert!(matches!(
            registry.resolve(ChainRole::Source),
            Err(RelayError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = ContractRegistry::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
        assert!(ContractRegistry::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_unreadable_file() {
        let err = ContractRegistry::load("/nonexistent/contract_info.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read contract info"));
    }

    #[test]
    fn test_top_level_signer_wins() {
        let registry = document(json!({
            "signer": "0xA",
            "signer_key": "0xkeyA",
            "destination": {"signer": "0xB", "signer_key": "0xkeyB"}
        }));
        let credential = registry.resolve_credential(ChainRole::Destination).unwrap();
        assert_eq!(credential.wallet_address, "0xA");
        assert_eq!(credential.private_key.expose(), "0xkeyA");
        assert_eq!(registry.resolve_global_signer(), Some(credential));
    }

    #[test]
    fn test_per_chain_signer_fallback() {
        let registry = document(json!({
            "destination": {"signer": "0xB", "signer_key": "0xkeyB"}
        }));
        assert!(registry.resolve_global_signer().is_none());
        let credential = registry.resolve_credential(ChainRole::Destination).unwrap();
        assert_eq!(credential.wallet_address, "0xB");
        assert_eq!(credential.private_key.expose(), "0xkeyB");
    }

    #[test]
    fn test_submitting_chain_preferred_over_scanned_chain() {
        let registry = document(json!({
            "source": {"signer": "0xS", "signer_key": "0xkeyS"},
            "destination": {"signer": "0xD", "signer_key": "0xkeyD"}
        }));
        assert_eq!(
            registry.resolve_credential(ChainRole::Source).unwrap().wallet_address,
            "0xS"
        );
        assert_eq!(
            registry.resolve_credential(ChainRole::Destination).unwrap().wallet_address,
            "0xD"
        );
    }

    #[test]
    fn test_fields_resolve_independently() {
        let registry = document(json!({
            "signer": "0xA",
            "source": {"signer_key": "0xkeyS"}
        }));
        let credential = registry.resolve_credential(ChainRole::Destination).unwrap();
        assert_eq!(credential.wallet_address, "0xA");
        assert_eq!(credential.private_key.expose(), "0xkeyS");
    }

    #[test]
    fn test_missing_signer_fails() {
        let registry = document(json!({}));
        let err = registry.resolve_credential(ChainRole::Source).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
        assert!(err.to_string().contains("'signer'"));
    }

    #[test]
    fn test_blank_or_non_string_signer_rejected() {
        let registry = document(json!({"signer": "   ", "signer_key": 42}));
        assert!(registry.resolve_credential(ChainRole::Source).is_err());

        let registry = document(json!({"signer": "0xA", "signer_key": ""}));
        let err = registry.resolve_credential(ChainRole::Source).unwrap_err();
        assert!(err.to_string().contains("'signer_key'"));
    }

    #[test]
    fn test_signer_values_are_trimmed() {
        let registry = document(json!({"signer": "  0xA ", "signer_key": "\t0xkey\n"}));
        let credential = registry.resolve_credential(ChainRole::Source).unwrap();
        assert_eq!(credential.wallet_address, "0xA");
        assert_eq!(credential.private_key.expose(), "0xkey");
    }

    #[test]
    fn test_resolve_signer_checks_address_matches_key() {
        let registry = document(json!({"signer": KEY_ADDRESS, "signer_key": KEY}));
        let signer = registry.resolve_signer(ChainRole::Destination).unwrap();
        assert_eq!(signer.address(), Address::from_str(KEY_ADDRESS).unwrap());

        let registry = document(json!({
            "signer": "0x0000000000000000000000000000000000000009",
            "signer_key": KEY
        }));
        let err = registry.resolve_signer(ChainRole::Destination).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn test_entry_function_lookup() {
        let registry = document(json!({}));
        let entry = registry.resolve(ChainRole::Destination).unwrap();
        assert_eq!(entry.function("wrap").unwrap().inputs.len(), 3);

        let err = entry.function("withdraw").unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
        assert!(err.to_string().contains("'destination.abi' has no 'withdraw'"));
    }

    #[test]
    fn test_entry_function_overload_rejected() {
        let mut overloaded = abi();
        overloaded.as_array_mut().unwrap().push(json!({
            "type": "function",
            "name": "wrap",
            "inputs": [{"name": "token", "type": "address"}],
            "outputs": [],
            "stateMutability": "nonpayable"
        }));
        let raw = json!({
            "source": {"address": "0x0000000000000000000000000000000000000001", "abi": overloaded}
        });
        let registry = ContractRegistry::from_json_str(&raw.to_string()).unwrap();
        let entry = registry.resolve(ChainRole::Source).unwrap();
        assert!(matches!(entry.function("wrap"), Err(RelayError::Config(_))));
    }

    #[test]
    fn test_entry_debug_redacts_key() {
        let registry = document(json!({"source": {"signer": "0xS", "signer_key": "0xsupersecret"}}));
        let entry = registry.resolve(ChainRole::Source).unwrap();
        let rendered = format!("{:?}", entry);
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("0xS"));
    }
}

//! Bundle verification
//!
//! Three independent checks over exported bytes. None of them judges whether
//! the recorded results are correct; they only establish that the bundle is
//! complete, well-typed and untampered.

use crate::bundle::{bundle_chain, BundleRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of verifying one exported bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// `hash_valid && structure_valid && integrity_valid`
    pub is_valid: bool,
    /// Bundle id, when readable
    pub bundle_id: Option<String>,
    /// Recomputed chain root equals the stored root
    pub hash_valid: bool,
    /// Required fields present and non-empty, exactly one outcome
    pub structure_valid: bool,
    /// Value has the typed bundle shape
    pub integrity_valid: bool,
    /// Problems found, in check order
    pub errors: Vec<String>,
}

impl VerificationResult {
    /// All-false result carrying one error
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            bundle_id: None,
            hash_valid: false,
            structure_valid: false,
            integrity_valid: false,
            errors: vec![error.into()],
        }
    }
}

fn non_empty_str(bundle: &Value, key: &str, errors: &mut Vec<String>) {
    match bundle.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(Value::String(_)) => errors.push(format!("{key} is empty")),
        Some(Value::Null) | None => errors.push(format!("{key} is missing")),
        Some(_) => errors.push(format!("{key} is not a string")),
    }
}

fn present_object(bundle: &Value, key: &str, errors: &mut Vec<String>) {
    match bundle.get(key) {
        Some(Value::Object(map)) if !map.is_empty() => {}
        Some(Value::Object(_)) => errors.push(format!("{key} is empty")),
        Some(Value::Null) | None => errors.push(format!("{key} is missing")),
        Some(_) => errors.push(format!("{key} is not an object")),
    }
}

fn is_present(bundle: &Value, key: &str) -> bool {
    bundle.get(key).is_some_and(|v| !v.is_null())
}

fn check_structure(bundle: &Value, errors: &mut Vec<String>) -> bool {
    let before = errors.len();

    non_empty_str(bundle, "bundle_id", errors);
    non_empty_str(bundle, "authority_version", errors);
    non_empty_str(bundle, "hash_chain_root", errors);

    match bundle.get("created_at").and_then(Value::as_i64) {
        Some(ts) if ts > 0 => {}
        _ => errors.push("created_at is missing or not a positive integer".to_string()),
    }

    present_object(bundle, "context_snapshot", errors);
    present_object(bundle, "intent_snapshot", errors);
    present_object(bundle, "principal_snapshot", errors);

    match bundle.get("execution_snapshots").and_then(Value::as_array) {
        Some(executions) if !executions.is_empty() => {}
        Some(_) => errors.push("execution_snapshots is empty".to_string()),
        None => errors.push("execution_snapshots is missing".to_string()),
    }

    match (
        is_present(bundle, "failure_composition"),
        is_present(bundle, "results"),
    ) {
        (true, true) => errors.push("both failure_composition and results are present".to_string()),
        (false, false) => errors.push("neither failure_composition nor results is present".to_string()),
        _ => {}
    }

    errors.len() == before
}

fn check_hash(bundle: &Value, errors: &mut Vec<String>) -> bool {
    let Some(stored) = bundle.get("hash_chain_root").and_then(Value::as_str) else {
        errors.push("hash_chain_root unavailable for comparison".to_string());
        return false;
    };
    let Some(computed) = bundle_chain(bundle).root() else {
        errors.push("hash chain is empty".to_string());
        return false;
    };
    if computed.to_hex() == stored {
        true
    } else {
        errors.push(format!(
            "hash_chain_root mismatch: stored {stored}, computed {computed}"
        ));
        false
    }
}

fn check_integrity(bundle: &Value, errors: &mut Vec<String>) -> bool {
    match serde_json::from_value::<BundleRecord>(bundle.clone()) {
        Ok(_) => true,
        Err(err) => {
            errors.push(format!("bundle shape invalid: {err}"));
            false
        }
    }
}

/// Verify exported bundle bytes
///
/// Never panics and never returns an error: unreadable input yields an
/// all-false result with the parse error.
#[must_use]
pub fn verify_bytes(bytes: &[u8]) -> VerificationResult {
    let bundle: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(err) => return VerificationResult::failed(format!("deserialization failed: {err}")),
    };
    if !bundle.is_object() {
        return VerificationResult::failed("deserialization failed: bundle is not a JSON object");
    }

    let mut errors = Vec::new();
    let structure_valid = check_structure(&bundle, &mut errors);
    let hash_valid = check_hash(&bundle, &mut errors);
    let integrity_valid = check_integrity(&bundle, &mut errors);

    VerificationResult {
        is_valid: hash_valid && structure_valid && integrity_valid,
        bundle_id: bundle
            .get("bundle_id")
            .and_then(Value::as_str)
            .map(str::to_string),
        hash_valid,
        structure_valid,
        integrity_valid,
        errors,
    }
}

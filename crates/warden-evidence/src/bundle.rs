//! Evidence bundles
//!
//! A bundle is sealed once, after execution has halted, and never changes.
//! Its `hash_chain_root` commits to every other field through the chain
//! built by [`bundle_chain`]:
//!
//! ```text
//! context, intent, principal, grant?, execution_0..n, failure?, results?,
//! authority_version, bundle {bundle_id, created_at}
//! ```
//!
//! The trailing `bundle` element is a Warden extension. A chain that stops at
//! `authority_version` leaves `bundle_id` and `created_at` unprotected, so
//! roots computed that way do not match Warden roots.

use crate::error::EvidenceError;
use crate::snapshot::{
    map_value, ContextSnapshot, ExecutionSnapshot, GrantSnapshot, IntentSnapshot,
    PrincipalSnapshot,
};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use warden_authority::{NonAction, Payload};
use warden_hash::{ContentHash, HashChain};

/// Data of a successful execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleResults {
    /// Capability result data
    pub data: Payload,
    /// Authority snapshot id
    pub snapshot_id: String,
}

impl BundleResults {
    /// Canonical schema
    #[must_use]
    pub fn canonical_value(&self) -> Value {
        json!({
            "data": map_value(&self.data),
            "snapshot_id": self.snapshot_id,
        })
    }
}

/// Everything a bundle holds except its root
#[derive(Debug, Clone, PartialEq)]
pub struct BundleParts {
    /// Unique bundle id
    pub bundle_id: String,
    /// Creation time (epoch ms)
    pub created_at: i64,
    /// Context before the call
    pub context_snapshot: ContextSnapshot,
    /// Declared capability
    pub intent_snapshot: IntentSnapshot,
    /// Principal identity
    pub principal_snapshot: PrincipalSnapshot,
    /// Grant used, if supplied
    pub grant_snapshot: Option<GrantSnapshot>,
    /// Execution attempts in order
    pub execution_snapshots: Vec<ExecutionSnapshot>,
    /// Authority version in effect
    pub authority_version: String,
    /// Refusal, when execution failed
    pub failure_composition: Option<NonAction>,
    /// Result, when execution succeeded
    pub results: Option<BundleResults>,
}

impl BundleParts {
    fn validate(&self) -> Result<(), EvidenceError> {
        if self.bundle_id.trim().is_empty() {
            return Err(EvidenceError::EmptyField("bundle_id"));
        }
        if self.created_at <= 0 {
            return Err(EvidenceError::InvalidTimestamp {
                field: "created_at",
                value: self.created_at,
            });
        }
        if self.authority_version.trim().is_empty() {
            return Err(EvidenceError::EmptyField("authority_version"));
        }
        self.context_snapshot.validate()?;
        self.intent_snapshot.validate()?;
        self.principal_snapshot.validate()?;
        if let Some(grant) = &self.grant_snapshot {
            grant.validate()?;
        }
        if self.execution_snapshots.is_empty() {
            return Err(EvidenceError::NoExecutionSnapshots);
        }
        for snapshot in &self.execution_snapshots {
            snapshot.validate()?;
        }
        match (&self.failure_composition, &self.results) {
            (Some(_), Some(_)) => Err(EvidenceError::BothOutcomes),
            (None, None) => Err(EvidenceError::NeitherOutcome),
            _ => Ok(()),
        }
    }

    /// Canonical schema without the root
    fn canonical_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("bundle_id".into(), json!(self.bundle_id));
        map.insert("created_at".into(), json!(self.created_at));
        map.insert("context_snapshot".into(), self.context_snapshot.canonical_value());
        map.insert("intent_snapshot".into(), self.intent_snapshot.canonical_value());
        map.insert("principal_snapshot".into(), self.principal_snapshot.canonical_value());
        map.insert(
            "grant_snapshot".into(),
            self.grant_snapshot
                .as_ref()
                .map_or(Value::Null, GrantSnapshot::canonical_value),
        );
        map.insert(
            "execution_snapshots".into(),
            Value::Array(
                self.execution_snapshots
                    .iter()
                    .map(ExecutionSnapshot::canonical_value)
                    .collect(),
            ),
        );
        map.insert("authority_version".into(), json!(self.authority_version));
        map.insert(
            "failure_composition".into(),
            self.failure_composition
                .as_ref()
                .map_or(Value::Null, NonAction::to_value),
        );
        map.insert(
            "results".into(),
            self.results
                .as_ref()
                .map_or(Value::Null, BundleResults::canonical_value),
        );
        map
    }
}

fn field(value: &Value, key: &str) -> Value {
    value.get(key).cloned().unwrap_or(Value::Null)
}

/// Hash chain over a bundle's canonical value
///
/// Works on the raw JSON form so verification can recompute the root from
/// exported bytes without trusting their shape.
#[must_use]
pub fn bundle_chain(bundle: &Value) -> HashChain {
    let mut elements: Vec<(String, Value)> = vec![
        ("context".into(), field(bundle, "context_snapshot")),
        ("intent".into(), field(bundle, "intent_snapshot")),
        ("principal".into(), field(bundle, "principal_snapshot")),
    ];

    let grant = field(bundle, "grant_snapshot");
    if !grant.is_null() {
        elements.push(("grant".into(), grant));
    }
    if let Some(executions) = bundle.get("execution_snapshots").and_then(Value::as_array) {
        for (i, execution) in executions.iter().enumerate() {
            elements.push((format!("execution_{i}"), execution.clone()));
        }
    }
    let failure = field(bundle, "failure_composition");
    if !failure.is_null() {
        elements.push(("failure".into(), failure));
    }
    let results = field(bundle, "results");
    if !results.is_null() {
        elements.push(("results".into(), results));
    }

    elements.push(("authority_version".into(), field(bundle, "authority_version")));
    elements.push((
        "bundle".into(),
        json!({
            "bundle_id": field(bundle, "bundle_id"),
            "created_at": field(bundle, "created_at"),
        }),
    ));

    HashChain::from_elements(elements.iter().map(|(key, value)| (key.as_str(), value)))
}

/// Sealed, immutable evidence of one guarded call
///
/// # Invariants
/// - required fields are non-empty and `execution_snapshots` is non-empty
/// - exactly one of `failure_composition` / `results` is present
/// - `hash_chain_root` is fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceBundle {
    parts: BundleParts,
    hash_chain_root: ContentHash,
}

impl EvidenceBundle {
    /// Create a bundle with a given root
    ///
    /// The root is stored as supplied; use [`Self::seal`] to compute it.
    ///
    /// # Errors
    /// Returns error if a required field is empty, there is no execution
    /// snapshot, or not exactly one of failure/results is present
    pub fn new(parts: BundleParts, hash_chain_root: ContentHash) -> Result<Self, EvidenceError> {
        parts.validate()?;
        Ok(Self {
            parts,
            hash_chain_root,
        })
    }

    /// Validate `parts`, compute the chain root and create the bundle
    ///
    /// # Errors
    /// Same as [`Self::new`]
    pub fn seal(parts: BundleParts) -> Result<Self, EvidenceError> {
        parts.validate()?;
        let chain = bundle_chain(&Value::Object(parts.canonical_map()));
        let root = chain
            .root()
            .ok_or(EvidenceError::EmptyField("hash_chain_root"))?;
        Ok(Self {
            parts,
            hash_chain_root: root,
        })
    }

    /// Bundle id
    #[inline]
    #[must_use]
    pub fn bundle_id(&self) -> &str {
        &self.parts.bundle_id
    }

    /// Creation time
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> i64 {
        self.parts.created_at
    }

    /// Context snapshot
    #[inline]
    #[must_use]
    pub fn context_snapshot(&self) -> &ContextSnapshot {
        &self.parts.context_snapshot
    }

    /// Intent snapshot
    #[inline]
    #[must_use]
    pub fn intent_snapshot(&self) -> &IntentSnapshot {
        &self.parts.intent_snapshot
    }

    /// Principal snapshot
    #[inline]
    #[must_use]
    pub fn principal_snapshot(&self) -> &PrincipalSnapshot {
        &self.parts.principal_snapshot
    }

    /// Grant snapshot
    #[inline]
    #[must_use]
    pub fn grant_snapshot(&self) -> Option<&GrantSnapshot> {
        self.parts.grant_snapshot.as_ref()
    }

    /// Execution snapshots in order
    #[inline]
    #[must_use]
    pub fn execution_snapshots(&self) -> &[ExecutionSnapshot] {
        &self.parts.execution_snapshots
    }

    /// Authority version
    #[inline]
    #[must_use]
    pub fn authority_version(&self) -> &str {
        &self.parts.authority_version
    }

    /// Stored chain root
    #[inline]
    #[must_use]
    pub fn hash_chain_root(&self) -> &ContentHash {
        &self.hash_chain_root
    }

    /// Refusal payload (failure only)
    #[inline]
    #[must_use]
    pub fn failure_composition(&self) -> Option<&NonAction> {
        self.parts.failure_composition.as_ref()
    }

    /// Results (success only)
    #[inline]
    #[must_use]
    pub fn results(&self) -> Option<&BundleResults> {
        self.parts.results.as_ref()
    }

    /// Whether the guarded call succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.parts.results.is_some()
    }

    /// Chain recomputed from this bundle's contents
    #[must_use]
    pub fn hash_chain(&self) -> HashChain {
        bundle_chain(&Value::Object(self.parts.canonical_map()))
    }

    /// Whether the stored root matches the contents
    #[must_use]
    pub fn verify_root(&self) -> bool {
        self.hash_chain().root() == Some(self.hash_chain_root)
    }

    /// Canonical schema, including the root
    #[must_use]
    pub fn canonical_value(&self) -> Value {
        let mut map = self.parts.canonical_map();
        map.insert(
            "hash_chain_root".into(),
            Value::String(self.hash_chain_root.to_hex()),
        );
        Value::Object(map)
    }
}

impl Serialize for EvidenceBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.canonical_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EvidenceBundle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = BundleRecord::deserialize(deserializer)?;
        Self::try_from(record).map_err(serde::de::Error::custom)
    }
}

/// Typed shape of an exported bundle, before invariant checks
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BundleRecord {
    bundle_id: String,
    created_at: i64,
    context_snapshot: ContextSnapshot,
    intent_snapshot: IntentSnapshot,
    principal_snapshot: PrincipalSnapshot,
    grant_snapshot: Option<GrantSnapshot>,
    execution_snapshots: Vec<ExecutionSnapshot>,
    authority_version: String,
    hash_chain_root: ContentHash,
    failure_composition: Option<NonAction>,
    results: Option<BundleResults>,
}

impl TryFrom<BundleRecord> for EvidenceBundle {
    type Error = EvidenceError;

    fn try_from(record: BundleRecord) -> Result<Self, Self::Error> {
        Self::new(
            BundleParts {
                bundle_id: record.bundle_id,
                created_at: record.created_at,
                context_snapshot: record.context_snapshot,
                intent_snapshot: record.intent_snapshot,
                principal_snapshot: record.principal_snapshot,
                grant_snapshot: record.grant_snapshot,
                execution_snapshots: record.execution_snapshots,
                authority_version: record.authority_version,
                failure_composition: record.failure_composition,
                results: record.results,
            },
            record.hash_chain_root,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::snapshot::context_hash;
    use pretty_assertions::assert_eq;
    use warden_authority::Context;

    pub(crate) fn success_parts() -> BundleParts {
        let mut context = Context::new();
        context.insert("principal_id".to_string(), json!("alice"));
        let hash = context_hash(&context);
        let mut data = Payload::new();
        data.insert("rows".to_string(), json!(3));

        BundleParts {
            bundle_id: "b-1".to_string(),
            created_at: 1_000,
            context_snapshot: ContextSnapshot::capture(&context, 1_000),
            intent_snapshot: IntentSnapshot::declare("db.query", None, 1_000),
            principal_snapshot: PrincipalSnapshot::capture(&context, "principal_id", 1_000),
            grant_snapshot: None,
            execution_snapshots: vec![ExecutionSnapshot::succeeded(
                "db.query",
                None,
                hash,
                1_001,
                data.clone(),
                "snap-1",
            )],
            authority_version: "1.0.0".to_string(),
            failure_composition: None,
            results: Some(BundleResults {
                data,
                snapshot_id: "snap-1".to_string(),
            }),
        }
    }

    #[test]
    fn seal_computes_matching_root() {
        let bundle = EvidenceBundle::seal(success_parts()).unwrap();
        assert!(bundle.verify_root());
        assert!(bundle.is_success());
        let keys: Vec<_> = bundle
            .hash_chain()
            .entries()
            .iter()
            .map(|e| e.key.clone())
            .collect();
        assert_eq!(
            keys,
            vec!["context", "intent", "principal", "execution_0", "results", "authority_version", "bundle"]
        );
    }

    #[test]
    fn bundle_identity_is_chained() {
        let sealed = EvidenceBundle::seal(success_parts()).unwrap();
        let mut renamed = sealed.canonical_value();
        renamed["bundle_id"] = json!("b-2");
        assert_ne!(bundle_chain(&renamed).root(), Some(*sealed.hash_chain_root()));

        let mut redated = sealed.canonical_value();
        redated["created_at"] = json!(sealed.created_at() + 1);
        assert_ne!(bundle_chain(&redated).root(), Some(*sealed.hash_chain_root()));
    }

    #[test]
    fn both_or_neither_outcome_rejected() {
        let mut both = success_parts();
        both.failure_composition = Some(NonAction::new("NO_GRANT", 5));
        assert!(matches!(EvidenceBundle::seal(both), Err(EvidenceError::BothOutcomes)));

        let mut neither = success_parts();
        neither.results = None;
        assert!(matches!(EvidenceBundle::seal(neither), Err(EvidenceError::NeitherOutcome)));
    }

    #[test]
    fn required_fields_checked() {
        let mut parts = success_parts();
        parts.bundle_id = String::new();
        assert!(matches!(EvidenceBundle::seal(parts), Err(EvidenceError::EmptyField("bundle_id"))));

        let mut parts = success_parts();
        parts.execution_snapshots.clear();
        assert!(matches!(EvidenceBundle::seal(parts), Err(EvidenceError::NoExecutionSnapshots)));

        let mut parts = success_parts();
        parts.authority_version = " ".to_string();
        assert!(matches!(
            EvidenceBundle::seal(parts),
            Err(EvidenceError::EmptyField("authority_version"))
        ));
    }

    #[test]
    fn every_field_is_committed() {
        let base = EvidenceBundle::seal(success_parts()).unwrap();

        let mut other_id = success_parts();
        other_id.bundle_id = "b-2".to_string();
        let mut other_time = success_parts();
        other_time.created_at = 1_002;
        let mut other_version = success_parts();
        other_version.authority_version = "1.0.1".to_string();

        for parts in [other_id, other_time, other_version] {
            let bundle = EvidenceBundle::seal(parts).unwrap();
            assert_ne!(bundle.hash_chain_root(), base.hash_chain_root());
        }
    }

    #[test]
    fn serde_round_trip_keeps_root() {
        let bundle = EvidenceBundle::seal(success_parts()).unwrap();
        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["failure_composition"], Value::Null);
        assert_eq!(value["grant_snapshot"], Value::Null);
        let parsed: EvidenceBundle = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, bundle);
    }
}

//! Functional tests for evidence capture, export and verification.
//!
//! Exercises the full path: guarded call → sealed bundle → canonical bytes →
//! independent verification, including tamper detection on exported bytes.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use warden_evidence::{
    EvidenceBundle, EvidenceConfig, EvidenceError, EvidenceExporter, EvidenceGuard,
    VerificationResult,
};
use warden_hash::canonical_bytes;
use warden_test_utils::{context, payload, principal_context, ScriptedAuthorityGuard};

fn setup(authority: ScriptedAuthorityGuard) -> (EvidenceGuard, Arc<EvidenceExporter>) {
    let exporter = Arc::new(EvidenceExporter::new());
    let guard = EvidenceGuard::new(Arc::new(authority), Arc::clone(&exporter));
    (guard, exporter)
}

/// Scenario: a successful call yields results, no failure, and verifies.
#[test]
fn successful_execution_exports_and_verifies() {
    let (guard, exporter) = setup(
        ScriptedAuthorityGuard::new().succeed_with("reports.generate", json!({"pages": 4})),
    );
    let ctx = principal_context("alice", "grant-1");

    let bundle = guard
        .execute_with_evidence("reports.generate", &ctx, None, None)
        .unwrap();

    assert!(bundle.results().is_some());
    assert!(bundle.failure_composition().is_none());
    assert_eq!(bundle.results().unwrap().data["pages"], json!(4));
    assert_eq!(bundle.principal_snapshot().principal_id(), "alice");
    assert_eq!(exporter.len(), 1);

    let bytes = exporter.export_bundle(bundle.bundle_id()).unwrap();
    let exported: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(exported["failure_composition"], Value::Null);

    let result = exporter.verify_bundle(&bytes);
    assert!(result.is_valid, "{:?}", result.errors);
    assert!(result.hash_valid && result.structure_valid && result.integrity_valid);
    assert_eq!(result.bundle_id.as_deref(), Some(bundle.bundle_id()));
}

#[test]
fn refused_execution_exports_and_verifies() {
    let (guard, exporter) = setup(ScriptedAuthorityGuard::new().refuse("payments.send", "NO_GRANT"));
    let grant = payload(json!({"grant_id": "g-9", "scope": "payments"}));

    let bundle = guard
        .execute_with_evidence("payments.send", &context(json!({"amount": 10})), Some(&grant), Some("step-1"))
        .unwrap();

    assert!(!bundle.is_success());
    assert_eq!(bundle.failure_composition().unwrap().reason, "NO_GRANT");
    assert_eq!(bundle.grant_snapshot().unwrap().grant_id(), "g-9");
    assert_eq!(bundle.execution_snapshots().len(), 1);
    assert!(!bundle.execution_snapshots()[0].is_success());

    let bytes = exporter.export_bundle(bundle.bundle_id()).unwrap();
    assert!(exporter.verify_bundle(&bytes).is_valid);
}

#[test]
fn raised_error_still_produces_bundle() {
    let (guard, _) = setup(ScriptedAuthorityGuard::new().raise("db.drop", "permission denied"));
    let bundle = guard
        .execute_with_evidence("db.drop", &context(json!({})), None, None)
        .unwrap();
    let failure = bundle.failure_composition().unwrap();
    assert_eq!(failure.reason, "EXECUTION_ERROR");
    assert_eq!(failure.details["error"], json!("capability raised: permission denied"));
}

#[test]
fn export_is_canonical_bytes() {
    let (guard, exporter) = setup(ScriptedAuthorityGuard::new());
    let bundle = guard
        .execute_with_evidence("noop", &context(json!({"b": 1, "a": 2})), None, None)
        .unwrap();

    let bytes = exporter.export_bundle(bundle.bundle_id()).unwrap();
    assert_eq!(bytes, canonical_bytes(&bundle.canonical_value()));
    let text = String::from_utf8(bytes).unwrap();
    assert!(!text.contains(' '));
    assert!(text.contains(r#""context":{"a":2,"b":1}"#));
}

#[test]
fn file_round_trip() {
    let (guard, exporter) = setup(ScriptedAuthorityGuard::new());
    let bundle = guard
        .execute_with_evidence("files.list", &context(json!({"dir": "/tmp"})), None, None)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.json");
    exporter.export_bundle_to_file(bundle.bundle_id(), &path).unwrap();

    let result = exporter.verify_bundle_from_file(&path);
    assert!(result.is_valid, "{:?}", result.errors);

    let parsed: EvidenceBundle = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(&parsed, bundle.as_ref());
}

#[test]
fn tampered_file_fails() {
    let (guard, exporter) = setup(ScriptedAuthorityGuard::new().succeed_with("x", json!({"amount": 5})));
    let bundle = guard.execute_with_evidence("x", &context(json!({})), None, None).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.json");
    exporter.export_bundle_to_file(bundle.bundle_id(), &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replace(r#""amount":5"#, r#""amount":6"#)).unwrap();

    let result: VerificationResult = exporter.verify_bundle_from_file(&path);
    assert!(!result.hash_valid);
    assert!(!result.is_valid);
}

#[test]
fn bundles_are_independent() {
    let (guard, exporter) = setup(ScriptedAuthorityGuard::new());
    let first = guard.execute_with_evidence("a", &context(json!({})), None, None).unwrap();
    let second = guard.execute_with_evidence("a", &context(json!({})), None, None).unwrap();

    assert_ne!(first.bundle_id(), second.bundle_id());
    assert_ne!(first.hash_chain_root(), second.hash_chain_root());
    assert_eq!(exporter.len(), 2);
}

#[test]
fn invalid_config_does_not_reach_authority() {
    let authority = Arc::new(ScriptedAuthorityGuard::new());
    let exporter = Arc::new(EvidenceExporter::new());
    let guard = EvidenceGuard::new(authority.clone(), Arc::clone(&exporter))
        .with_config(EvidenceConfig::new().with_authority_version(""));

    let result = guard.execute_with_evidence("payments.send", &context(json!({"amount": 1})), None, None);

    assert!(matches!(result, Err(EvidenceError::EmptyField("authority_version"))));
    assert_eq!(authority.call_count(), 0);
    assert!(exporter.is_empty());
}

#[test]
fn large_float_payload_verifies() {
    let (guard, exporter) = setup(
        ScriptedAuthorityGuard::new().succeed_with("metrics.read", json!({"v": 1.797_693_134_862_315_7e308})),
    );
    let bundle = guard
        .execute_with_evidence("metrics.read", &context(json!({"A": [-4.868_020_562_261_209e108]})), None, None)
        .unwrap();
    let bytes = exporter.export_bundle(bundle.bundle_id()).unwrap();
    let result = exporter.verify_bundle(&bytes);
    assert!(result.is_valid, "{:?}", result.errors);
}

fn leaf_pointers(value: &Value, prefix: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                leaf_pointers(child, &format!("{prefix}/{key}"), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                leaf_pointers(child, &format!("{prefix}/{i}"), out);
            }
        }
        _ => out.push(prefix.to_string()),
    }
}

fn flip(value: &mut Value) {
    *value = match value.take() {
        Value::Null => json!("tampered"),
        Value::Bool(b) => Value::Bool(!b),
        Value::Number(n) => json!(n.as_i64().map_or(0, |i| i.wrapping_add(1))),
        Value::String(s) => Value::String(format!("{s}x")),
        other => other,
    };
}

fn sample_export() -> Value {
    let (guard, exporter) = setup(
        ScriptedAuthorityGuard::new().succeed_with("orders.place", json!({"order": 77, "ok": true})),
    );
    let grant = payload(json!({"grant_id": "g-1", "limit": 3}));
    let bundle = guard
        .execute_with_evidence(
            "orders.place",
            &principal_context("bob", "g-1"),
            Some(&grant),
            Some("s0"),
        )
        .unwrap();
    serde_json::from_slice(&exporter.export_bundle(bundle.bundle_id()).unwrap()).unwrap()
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|i| json!(i)),
        (i64::MAX.unsigned_abs() + 1..=u64::MAX).prop_map(|u| json!(u)),
        any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(|f| json!(f)),
        "\\PC{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 12, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
            prop::collection::btree_map("\\PC{1,4}", inner, 0..3)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_object() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("\\PC{1,6}", arb_json(), 0..4)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn exported_bundles_verify(
        ctx in arb_object(),
        grant in prop::option::of(arb_object()),
        data in arb_object(),
    ) {
        let (guard, exporter) = setup(ScriptedAuthorityGuard::new().succeed_with("cap.run", data));
        let grant = grant.map(payload);
        let bundle = guard
            .execute_with_evidence("cap.run", &context(ctx), grant.as_ref(), Some("s0"))
            .unwrap();

        let bytes = exporter.export_bundle(bundle.bundle_id()).unwrap();
        let result = exporter.verify_bundle(&bytes);
        prop_assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn any_single_field_flip_is_detected(index in any::<prop::sample::Index>()) {
        let original = sample_export();
        let mut leaves = Vec::new();
        leaf_pointers(&original, "", &mut leaves);
        let pointer = &leaves[index.index(leaves.len())];

        let mut tampered = original.clone();
        if let Some(leaf) = tampered.pointer_mut(pointer) {
            flip(leaf);
        }
        prop_assume!(tampered != original);

        let result = warden_evidence::verify_bytes(&canonical_bytes(&tampered));
        prop_assert!(!result.is_valid, "flip at {} went undetected", pointer);
    }
}

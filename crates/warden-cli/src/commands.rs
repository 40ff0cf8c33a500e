//! Subcommand implementations
//!
//! Each command writes its report to `out` and returns whether the command
//! succeeded, so `main` only maps the result to an exit code.

use anyhow::Context as _;
use std::io::{Read, Write};
use std::path::Path;
use warden_evidence::{EvidenceBundle, EvidenceConfig, EvidenceExporter};
use warden_hash::{canonical_string, ContentHash};

fn format_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms).map_or_else(|| ms.to_string(), |t| t.to_rfc3339())
}

/// Verify an exported bundle file
///
/// # Errors
/// Returns error only if writing the report fails
pub fn verify(path: &Path, json: bool, out: &mut impl Write) -> anyhow::Result<bool> {
    let result = EvidenceExporter::new().verify_bundle_from_file(path);

    if json {
        serde_json::to_writer_pretty(&mut *out, &result)?;
        writeln!(out)?;
    } else {
        let mark = |ok: bool| if ok { "ok" } else { "FAILED" };
        writeln!(out, "bundle:    {}", result.bundle_id.as_deref().unwrap_or("<unknown>"))?;
        writeln!(out, "structure: {}", mark(result.structure_valid))?;
        writeln!(out, "hash:      {}", mark(result.hash_valid))?;
        writeln!(out, "integrity: {}", mark(result.integrity_valid))?;
        for error in &result.errors {
            writeln!(out, "  - {error}")?;
        }
        writeln!(out, "result:    {}", if result.is_valid { "VALID" } else { "INVALID" })?;
    }

    tracing::info!(path = %path.display(), valid = result.is_valid, "verified bundle");
    Ok(result.is_valid)
}

/// Print a readable summary of a bundle file
///
/// # Errors
/// Returns error if the file cannot be read or is not a valid bundle
pub fn inspect(path: &Path, config: &EvidenceConfig, out: &mut impl Write) -> anyhow::Result<bool> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let bundle: EvidenceBundle = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a valid evidence bundle", path.display()))?;

    let version_note = if bundle.authority_version() == config.authority_version {
        "matches configuration".to_string()
    } else {
        format!("configured {}", config.authority_version)
    };

    writeln!(out, "bundle:            {}", bundle.bundle_id())?;
    writeln!(out, "created_at:        {}", format_millis(bundle.created_at()))?;
    writeln!(out, "authority_version: {} ({version_note})", bundle.authority_version())?;
    writeln!(out, "principal:         {}", bundle.principal_snapshot().principal_id())?;
    writeln!(out, "capability:        {}", bundle.intent_snapshot().capability_name())?;
    if let Some(step_id) = bundle.intent_snapshot().step_id() {
        writeln!(out, "step:              {step_id}")?;
    }
    if let Some(grant) = bundle.grant_snapshot() {
        writeln!(out, "grant:             {}", grant.grant_id())?;
    }
    match (bundle.results(), bundle.failure_composition()) {
        (Some(results), _) => writeln!(out, "outcome:           success (snapshot {})", results.snapshot_id)?,
        (None, Some(non_action)) => writeln!(out, "outcome:           refused: {}", non_action.reason)?,
        (None, None) => writeln!(out, "outcome:           <none>")?,
    }
    writeln!(out, "executions:        {}", bundle.execution_snapshots().len())?;
    writeln!(out, "hash_chain_root:   {}", bundle.hash_chain_root())?;

    let chain = bundle.hash_chain();
    writeln!(out, "chain:")?;
    for (i, entry) in chain.entries().iter().enumerate() {
        writeln!(out, "  {i:>2} {:<18} {}", entry.key, entry.element_hash.short())?;
    }

    let root_ok = bundle.verify_root();
    writeln!(out, "root check:        {}", if root_ok { "ok" } else { "MISMATCH" })?;
    Ok(root_ok)
}

/// Print the canonical SHA-256 of a JSON document (`None` reads stdin)
///
/// # Errors
/// Returns error if the input cannot be read or is not JSON
pub fn hash(path: Option<&Path>, show_canonical: bool, out: &mut impl Write) -> anyhow::Result<bool> {
    let bytes = match path {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).context("input is not valid JSON")?;

    if show_canonical {
        writeln!(out, "{}", canonical_string(&value))?;
    }
    writeln!(out, "{}", ContentHash::of_canonical(&value))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warden_authority::Context;
    use warden_evidence::EvidenceGuard;
    use warden_test_utils::ScriptedAuthorityGuard;

    fn exported(dir: &Path) -> std::path::PathBuf {
        let exporter = Arc::new(EvidenceExporter::new());
        let guard = EvidenceGuard::new(
            Arc::new(ScriptedAuthorityGuard::new().refuse("files.delete", "NO_GRANT")),
            Arc::clone(&exporter),
        );
        let bundle = guard
            .execute_with_evidence("files.delete", &Context::new(), None, Some("s1"))
            .unwrap();
        let path = dir.join("bundle.json");
        exporter.export_bundle_to_file(bundle.bundle_id(), &path).unwrap();
        path
    }

    #[test]
    fn verify_reports_valid_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = exported(dir.path());
        let mut out = Vec::new();
        assert!(verify(&path, false, &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("result:    VALID"));
    }

    #[test]
    fn verify_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{}").unwrap();
        let mut out = Vec::new();
        assert!(!verify(&path, true, &mut out).unwrap());
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["is_valid"], serde_json::json!(false));
    }

    #[test]
    fn inspect_lists_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = exported(dir.path());
        let mut out = Vec::new();
        assert!(inspect(&path, &EvidenceConfig::default(), &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("outcome:           refused: NO_GRANT"));
        assert!(text.contains("step:              s1"));
        assert!(text.contains("failure"));
        assert!(text.contains("matches configuration"));
    }

    #[test]
    fn inspect_rejects_non_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        std::fs::write(&path, r#"{"a": 1}"#).unwrap();
        assert!(inspect(&path, &EvidenceConfig::default(), &mut Vec::new()).is_err());
    }

    #[test]
    fn hash_is_key_order_independent() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        std::fs::write(&a, r#"{"x": 1, "y": [true, null]}"#).unwrap();
        std::fs::write(&b, r#"{"y":[true,null],"x":1.0}"#).unwrap();

        let mut out_a = Vec::new();
        let mut out_b = Vec::new();
        hash(Some(&a), true, &mut out_a).unwrap();
        hash(Some(&b), true, &mut out_b).unwrap();
        assert_eq!(out_a, out_b);
        assert!(String::from_utf8(out_a).unwrap().starts_with(r#"{"x":1,"y":[true,null]}"#));
    }
}

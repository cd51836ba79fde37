//! Library-level command implementations, tested without spawning the binary.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use signoff_config::{ScopeOverlays, ScopedSettings, load_config, validate_config};
use signoff_core::{CollectionRef, JsonObject, Record};
use signoff_engine::Engine;
use signoff_policy::Caller;
use signoff_signer::LocalEcdsaSigner;
use signoff_storage::{InMemoryBackend, Storage};

/// Generate a fresh P-384 keypair and write it as `<stem>.private.pem` /
/// `<stem>.public.pem` under `dir`. Returns the two paths written.
pub fn keygen(dir: &Path, stem: &str) -> Result<(std::path::PathBuf, std::path::PathBuf)> {
    let (private_pem, public_pem) =
        LocalEcdsaSigner::generate_keypair().context("generate P-384 keypair")?;
    std::fs::create_dir_all(dir).with_context(|| format!("create directory '{}'", dir.display()))?;
    let private_path = dir.join(format!("{stem}.private.pem"));
    let public_path = dir.join(format!("{stem}.public.pem"));
    std::fs::write(&private_path, private_pem)
        .with_context(|| format!("write '{}'", private_path.display()))?;
    std::fs::write(&public_path, public_pem)
        .with_context(|| format!("write '{}'", public_path.display()))?;
    Ok((private_path, public_path))
}

/// Load and validate a TOML config file, returning human-readable
/// diagnostics (one line per warning, or a single "config: ok" line).
pub fn check_config(path: &Path) -> Result<Vec<String>> {
    let config = load_config(path).with_context(|| format!("load config '{}'", path.display()))?;
    let warnings = validate_config(&config).context("validate config")?;
    if warnings.is_empty() {
        Ok(vec!["config: ok".to_string()])
    } else {
        Ok(warnings.iter().map(ToString::to_string).collect())
    }
}

/// Parse a config file and print its capability descriptor as JSON.
pub fn capabilities_json(path: &Path, description: &str, url: &str, version: &str) -> Result<String> {
    let config = load_config(path).with_context(|| format!("load config '{}'", path.display()))?;
    let entries = config.resource_entries().context("parse resource map")?;
    let backend = Arc::new(InMemoryBackend::new());
    let engine = Engine::new(
        entries,
        config.global,
        config.overlays,
        backend.clone(),
        backend,
        Box::new(|path: &str| std::fs::read_to_string(path)),
    );
    let descriptor = engine.capability_descriptor(description, url, version);
    serde_json::to_string_pretty(&descriptor).context("serialize capability descriptor")
}

/// Summary of the in-memory demo review cycle, printed by the `demo`
/// subcommand.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DemoReport {
    /// Whether the destination collection carries a signature after the run.
    pub destination_signed: bool,
    /// Number of records mirrored to the destination.
    pub mirrored_records: u64,
    /// Review events emitted during the cycle, as their wire `type` tag.
    pub events: Vec<String>,
}

/// Run a full editor-request / reviewer-approve cycle against an in-memory
/// backend with a freshly generated signing key, returning a summary of
/// what happened. Exists to give operators something runnable without a
/// real deployment.
pub async fn run_demo() -> Result<DemoReport> {
    let (private_pem, _public_pem) =
        LocalEcdsaSigner::generate_keypair().context("generate demo signing key")?;

    let backend = Arc::new(InMemoryBackend::new());
    let source = CollectionRef::new("main-workspace", "blocklist");
    backend.create_collection(&source).await.context("create source collection")?;
    backend
        .upsert_record(&source, Record::new("1", 0, JsonObject::new()))
        .await
        .context("seed source record")?;

    let global = ScopedSettings {
        group_check_enabled: Some(true),
        to_review_enabled: Some(true),
        editors_group: Some("/buckets/main-workspace/groups/editors".to_string()),
        reviewers_group: Some("/buckets/main-workspace/groups/reviewers".to_string()),
        ..ScopedSettings::default()
    };
    let entries = signoff_config::parse_resource_map("main-workspace/blocklist -> main/blocklist")
        .context("parse demo resource map")?;

    let engine = Engine::new(
        entries,
        global,
        ScopeOverlays::default(),
        backend.clone(),
        backend.clone(),
        Box::new(move |_: &str| Ok(private_pem.clone())),
    );

    let editor = Caller::new("alice", ["/buckets/main-workspace/groups/editors".to_string()]);
    let reviewer = Caller::new("bob", ["/buckets/main-workspace/groups/reviewers".to_string()]);

    let mut ctx = signoff_engine::EngineContext::new();
    engine
        .on_collection_changed(&mut ctx, "main-workspace", "blocklist", &editor, signoff_core::Status::ToReview)
        .await
        .context("request review")?;
    engine
        .on_collection_changed(&mut ctx, "main-workspace", "blocklist", &reviewer, signoff_core::Status::ToSign)
        .await
        .context("approve review")?;

    let events: Vec<String> = ctx
        .drain_on_commit()
        .iter()
        .map(|e| serde_json::to_value(e).map(|v| v["type"].as_str().unwrap_or("?").to_string()).unwrap_or_default())
        .collect();

    let destination = CollectionRef::new("main", "blocklist");
    let dest_obj = backend.collection_metadata(&destination).await.context("read destination metadata")?;
    let mirrored = backend.all_records(&destination).await.context("read destination records")?.len() as u64;

    Ok(DemoReport {
        destination_signed: dest_obj.contains_key("signature"),
        mirrored_records: mirrored,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keygen_writes_both_pems() {
        let dir = tempfile::tempdir().unwrap();
        let (private, public) = keygen(dir.path(), "demo").unwrap();
        assert!(private.exists());
        assert!(public.exists());
        assert!(std::fs::read_to_string(private).unwrap().contains("PRIVATE KEY"));
    }

    #[test]
    fn check_config_reports_empty_resource_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signoff.toml");
        std::fs::write(&path, "resources = \"\"\n").unwrap();
        let diagnostics = check_config(&path).unwrap();
        assert!(diagnostics.iter().any(|d| d.contains("no entries")));
    }

    #[test]
    fn check_config_missing_file_errors() {
        let err = check_config(Path::new("/nonexistent/signoff.toml")).unwrap_err();
        assert!(err.to_string().contains("load config"));
    }

    #[tokio::test]
    async fn demo_produces_a_signed_destination() {
        let report = run_demo().await.unwrap();
        assert!(report.destination_signed);
        assert_eq!(report.mirrored_records, 1);
        assert_eq!(report.events, vec!["Requested".to_string(), "Approved".to_string()]);
    }

    #[tokio::test]
    async fn capabilities_json_lists_the_configured_resource() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signoff.toml");
        std::fs::write(&path, "resources = \"main-workspace/blocklist -> main/blocklist\"\n").unwrap();
        let json = capabilities_json(&path, "demo", "https://example.test", "0.1.0").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["resources"].as_array().unwrap().len(), 1);
    }
}

use crate::{
    models::CheckResult,
    services::{llm::LanguageModel, metadata::MetadataProvider, store::EntryStore},
};

/// Title searched for when checking the metadata API
pub const SAMPLE_QUERY: &str = "Squid Game";

const PING_PROMPT: &str = "Reply with the single word: pong";

/// Checks every external collaborator. Failures are reported, never raised.
pub async fn run_checks(
    store: &dyn EntryStore,
    metadata: &dyn MetadataProvider,
    model: &dyn LanguageModel,
) -> Vec<CheckResult> {
    let store_check = match store.check_access().await {
        Ok(a1) => ok(store.name(), format!("Read A1 cell value: {}", a1)),
        Err(e) => failed(store.name(), e.to_string()),
    };

    let metadata_check = match metadata.search(SAMPLE_QUERY).await {
        Ok(matches) => match matches.first() {
            Some(first) => ok(
                metadata.name(),
                format!(
                    "Found {} results; first: {} ({}){}",
                    matches.len(),
                    first.title,
                    first.kind,
                    if first.poster_path.is_some() { ", has poster" } else { "" }
                ),
            ),
            None => ok(metadata.name(), "Request succeeded but found no results".to_string()),
        },
        Err(e) => failed(metadata.name(), e.to_string()),
    };

    let model_check = match model.complete(PING_PROMPT).await {
        Ok(reply) => ok(model.name(), format!("Model replied: {}", reply.trim())),
        Err(e) => failed(model.name(), e.to_string()),
    };

    let checks = vec![store_check, metadata_check, model_check];
    for check in &checks {
        if check.ok {
            tracing::info!(check = %check.name, detail = %check.detail, "Diagnostic passed");
        } else {
            tracing::warn!(check = %check.name, detail = %check.detail, "Diagnostic failed");
        }
    }
    checks
}

fn ok(name: &str, detail: String) -> CheckResult {
    CheckResult {
        name: name.to_string(),
        ok: true,
        detail,
    }
}

fn failed(name: &str, detail: String) -> CheckResult {
    CheckResult {
        name: name.to_string(),
        ok: false,
        detail,
    }
}

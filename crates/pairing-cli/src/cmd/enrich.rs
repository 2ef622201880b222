use crate::cmd::{input_path, load_checked_config, load_enriched};
use crate::output::{print_fields, print_json};
use anyhow::Context;
use pairing_core::io::write_document;
use std::path::{Path, PathBuf};

/// Enrich the population without matching and write it out for review.
pub fn run(root: &Path, input: Option<PathBuf>, out: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_checked_config(root)?;
    let input = input_path(root, &config, input);

    let (people, report) = load_enriched(&config, &input)?;
    write_document(out, &people)
        .with_context(|| format!("failed to write {}", out.display()))?;

    if json {
        let value = serde_json::json!({
            "output": out.display().to_string(),
            "participants": people.len(),
            "enriched": report.enriched,
            "missing_skip_manager": report.missing_skip_manager,
            "missing_title": report.missing_title,
        });
        print_json(&value)?;
        return Ok(());
    }

    print_fields(&[
        ("Participants", people.len().to_string()),
        ("Enriched", report.enriched.to_string()),
        ("No skip manager", report.missing_skip_manager.len().to_string()),
        ("No title", report.missing_title.len().to_string()),
        ("Written", out.display().to_string()),
    ]);
    Ok(())
}

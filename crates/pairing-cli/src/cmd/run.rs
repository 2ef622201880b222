use crate::cmd::{input_path, load_checked_config, load_enriched};
use crate::oracle::AgentOracle;
use crate::output::{print_fields, print_json, print_table};
use anyhow::Context;
use pairing_core::catalog::ActorCatalog;
use pairing_core::matching::{MatchingLoop, RoundReport};
use pairing_core::sink::{FileSink, ResultSink, RunReport};
use std::path::{Path, PathBuf};

pub fn run(
    root: &Path,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_checked_config(root)?;
    let input = input_path(root, &config, input);
    let output = output.unwrap_or_else(|| config.output_path(root));

    let run_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("run", run_id = %run_id);
    let _guard = span.enter();

    let (people, _) = load_enriched(&config, &input)?;
    let (catalog, partition) = ActorCatalog::from_participants(&people);
    tracing::info!(
        mentors = catalog.supply.len(),
        mentees = catalog.demand.len(),
        unknown_role = partition.unknown_role.len(),
        duplicates = partition.duplicates.len(),
        without_capacity = partition.without_capacity.len(),
        input_rows = partition.input_rows,
        "population partitioned"
    );

    let mut oracle = AgentOracle::from_config(&config.oracle)?;
    let outcome = MatchingLoop::new(catalog, partition.input_rows, config.batch.target_capacity)
        .run(&mut oracle)
        .context("matching run failed")?;

    let report = RunReport::from_outcome(run_id.as_str(), &outcome);
    let mut sink = FileSink::new(&output);
    sink.emit(&report)
        .with_context(|| format!("failed to write results to {}", sink.path().display()))?;

    if json {
        let value = serde_json::json!({
            "run_id": report.run_id,
            "output": output.display().to_string(),
            "termination": report.termination,
            "summary": report.summary,
            "rounds": outcome.rounds,
        });
        print_json(&value)?;
        return Ok(());
    }

    print_table(
        &["ROUND", "MENTORS", "MENTEES", "ACCEPTED", "REJECTED", "LEFT"],
        &round_rows(&outcome.rounds),
    );
    println!();
    print_fields(&[
        ("Run", report.run_id.clone()),
        ("Stopped", report.termination.to_string()),
        ("Matched", report.summary.matched.to_string()),
        ("Unmatched", report.summary.unmatched.to_string()),
        (
            "Processed",
            format!("{}/{}", report.summary.total_processed, report.summary.total_input),
        ),
        ("Results", output.display().to_string()),
    ]);
    Ok(())
}

fn round_rows(rounds: &[RoundReport]) -> Vec<Vec<String>> {
    rounds
        .iter()
        .map(|r| {
            let round = if r.is_final_round {
                format!("{} (final)", r.round)
            } else {
                r.round.to_string()
            };
            vec![
                round,
                r.mentors.to_string(),
                r.mentees.to_string(),
                r.accepted.to_string(),
                r.rejected.to_string(),
                format!("{}/{}", r.remaining_mentors, r.remaining_mentees),
            ]
        })
        .collect()
}

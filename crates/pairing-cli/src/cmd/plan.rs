use crate::cmd::{input_path, load_checked_config};
use crate::output::{print_json, print_table};
use anyhow::Context;
use pairing_core::catalog::ActorCatalog;
use pairing_core::planner::{is_final_round, plan_batch};
use pairing_core::source::load_population;
use std::path::{Path, PathBuf};

/// Show what the first round would send to the oracle. No oracle or
/// directory calls are made.
pub fn run(root: &Path, input: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let config = load_checked_config(root)?;
    let input = input_path(root, &config, input);
    let people = load_population(&input)
        .with_context(|| format!("failed to load population from {}", input.display()))?;

    let (catalog, partition) = ActorCatalog::from_participants(&people);
    let target = config.batch.target_capacity;
    let is_final = is_final_round(partition.input_rows, target);
    let plan = plan_batch(&catalog.supply, target, is_final, catalog.demand.len());

    let mentors = catalog.supply.head(plan.num_supply);
    let mentees = catalog.demand.head(plan.num_demand);

    if json {
        let value = serde_json::json!({
            "target_capacity": target,
            "is_final_round": is_final,
            "plan": plan,
            "mentors": mentors.iter().map(|a| serde_json::json!({"email": a.id, "capacity": a.capacity})).collect::<Vec<_>>(),
            "mentees": mentees.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            "pool": {"mentors": catalog.supply.len(), "mentees": catalog.demand.len()},
            "input_rows": partition.input_rows,
            "dropped": {
                "unknown_role": partition.unknown_role,
                "duplicates": partition.duplicates,
            },
            "without_capacity": partition.without_capacity,
        });
        print_json(&value)?;
        return Ok(());
    }

    println!(
        "First batch: {} mentors, {} mentees (target {}, {} in input{})",
        plan.num_supply,
        plan.num_demand,
        target,
        partition.input_rows,
        if is_final { ", single round" } else { "" }
    );
    let rows = mentors
        .iter()
        .map(|a| vec![a.id.clone(), "Mentor".to_string(), a.capacity.to_string()])
        .chain(
            mentees
                .iter()
                .map(|a| vec![a.id.clone(), "Mentee".to_string(), String::new()]),
        )
        .collect::<Vec<_>>();
    print_table(&["EMAIL", "ROLE", "CAPACITY"], &rows);
    Ok(())
}

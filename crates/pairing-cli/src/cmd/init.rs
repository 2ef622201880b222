use anyhow::Context;
use pairing_core::{config::Config, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing pairing in: {}", root.display());

    let dir = paths::pairing_dir(root);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    let input = Config::load(root)?.input_path(root);
    if !input.exists() {
        println!(
            "\nNext: put the participant list at {} and run `pairing run`.",
            input.display()
        );
    }
    Ok(())
}

use crate::error::{PairingError, Result};
use crate::io::read_document;
use crate::types::Participant;
use std::path::Path;

/// Read the full source population from a JSON or YAML list of participant
/// records.
pub fn load_population(path: &Path) -> Result<Vec<Participant>> {
    if !path.exists() {
        return Err(PairingError::PopulationNotFound(path.display().to_string()));
    }
    let people: Vec<Participant> = read_document(path)?;
    tracing::info!(path = %path.display(), participants = people.len(), "population loaded");
    Ok(people)
}

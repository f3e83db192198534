//! Custom slot type definitions
//!
//! The definitions file is line oriented. Each record starts with the slot
//! type name, followed by one value per line, and ends at a terminator line
//! (`<<<<<`) or at the end of the file:
//!
//! ```text
//! CityName
//! Seattle
//! Portland
//! <<<<<
//! Color
//! red
//! ```

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::{Error, Result};

/// Line that closes a slot type record
pub const SLOT_TYPE_TERMINATOR: &str = "<<<<<";

/// A custom slot type and its sample values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTypeDefinition {
    pub name: String,

    /// Values joined with `\n`, in file order
    pub values: String,
}

impl SlotTypeDefinition {
    /// Number of values in the definition
    pub fn value_count(&self) -> usize {
        if self.values.is_empty() {
            0
        } else {
            self.values.lines().count()
        }
    }
}

/// Load slot type definitions from a file
///
/// The file handle never outlives this call, whether parsing succeeds or not.
pub fn load_slot_types(path: &Path) -> Result<Vec<SlotTypeDefinition>> {
    info!("Retrieving slot definitions from \"{}\" ...", path.display());
    let file = File::open(path).map_err(|e| Error::from_io(path, e))?;
    let slot_types = parse_slot_types(BufReader::new(file))?;
    info!("Loaded {} slot types", slot_types.len());
    Ok(slot_types)
}

/// Parse slot type definitions from a reader
pub fn parse_slot_types<R: BufRead>(reader: R) -> Result<Vec<SlotTypeDefinition>> {
    let mut slot_types = Vec::new();
    let mut lines = reader.lines();
    let mut current: Option<(String, Vec<String>)> = None;

    loop {
        let slot_name = current
            .as_ref()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "<unnamed>".to_string());

        let line = match lines.next() {
            Some(line) => line.map_err(|source| Error::SlotDefinition {
                slot: slot_name,
                source,
            })?,
            None => break,
        };
        let line = line.trim_end_matches('\r');

        match current.as_mut() {
            None => {
                // Blank lines and stray terminators between records are skipped
                if !line.is_empty() && line != SLOT_TYPE_TERMINATOR {
                    current = Some((line.to_string(), Vec::new()));
                }
            }
            Some((_, values)) => {
                if line.is_empty() || line == SLOT_TYPE_TERMINATOR {
                    if let Some((name, values)) = current.take() {
                        slot_types.push(finish(name, values));
                    }
                } else {
                    values.push(line.to_string());
                }
            }
        }
    }

    if let Some((name, values)) = current.take() {
        slot_types.push(finish(name, values));
    }

    Ok(slot_types)
}

fn finish(name: String, values: Vec<String>) -> SlotTypeDefinition {
    debug!("Loaded slot definition: {} with {} values", name, values.len());
    SlotTypeDefinition {
        name,
        values: values.join("\n"),
    }
}

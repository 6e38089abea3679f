//! CSV affordance manifest loader.
//!
//! # CSV format
//!
//! One row per affordance.  List-valued columns are `;`-separated and may be
//! empty.
//!
//! ```csv
//! affordance_id,name,object_type,duration,effects,preconditions,before,after,fail
//! 0,eat_meal,1,3,hunger:0.5;money:-2,agent.wallet >= 2,,log_meal,
//! 1,shower,2,2,hygiene:0.6,,check_water,,
//! ```
//!
//! Preconditions are compiled with [`Comparison::compile`]; a syntax error
//! fails the whole load.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tw_agent::EffectMap;
use tw_core::{AffordanceId, ObjectTypeId, TwError};

use crate::precondition::{Comparison, Precondition};
use crate::spec::{AffordanceRegistry, AffordanceSpec, StageHooks};
use crate::{AffordanceError, AffordanceResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ManifestRecord {
    affordance_id: u16,
    name:          String,
    object_type:   u16,
    duration:      u32,
    #[serde(default)]
    effects:       String,
    #[serde(default)]
    preconditions: String,
    #[serde(default)]
    before:        String,
    #[serde(default)]
    after:         String,
    #[serde(default)]
    fail:          String,
}

// ── Public API ────────────────────────────────────────────────────────────────

pub fn load_manifest_csv(path: &Path) -> AffordanceResult<AffordanceRegistry> {
    let file = std::fs::File::open(path).map_err(TwError::Io)?;
    load_manifest_reader(file)
}

/// Like [`load_manifest_csv`] but accepts any `Read` source.
pub fn load_manifest_reader<R: Read>(reader: R) -> AffordanceResult<AffordanceRegistry> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut registry = AffordanceRegistry::new();

    for result in csv_reader.deserialize::<ManifestRecord>() {
        let row = result.map_err(|e| AffordanceError::Parse(e.to_string()))?;
        registry.insert(build_spec(row)?)?;
    }

    Ok(registry)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn build_spec(row: ManifestRecord) -> AffordanceResult<AffordanceSpec> {
    let preconditions = split_list(&row.preconditions)
        .map(|src| Comparison::compile(src).map(|c| Arc::new(c) as Arc<dyn Precondition>))
        .collect::<AffordanceResult<Vec<_>>>()?;

    Ok(AffordanceSpec {
        id:          AffordanceId(row.affordance_id),
        name:        row.name.trim().to_string(),
        object_type: ObjectTypeId(row.object_type),
        duration:    row.duration,
        effects:     EffectMap::parse(&row.effects)?,
        preconditions,
        hooks: StageHooks {
            before: split_list(&row.before).map(str::to_string).collect(),
            after:  split_list(&row.after).map(str::to_string).collect(),
            fail:   split_list(&row.fail).map(str::to_string).collect(),
        },
    })
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(';').map(str::trim).filter(|p| !p.is_empty())
}

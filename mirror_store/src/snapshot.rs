use crate::contracts::{MirrorWriteError, ReplicationSink};
use crate::entities::{Area, County, EntityKind, Group, MirrorEntity, Precinct};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full export of the reference collections, as produced by the replication feed's
/// initial sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorSnapshot {
    pub counties: Vec<County>,
    pub areas: Vec<Area>,
    pub precincts: Vec<Precinct>,
    pub groups: Vec<Group>,
}

impl MirrorSnapshot {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mirror snapshot {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid mirror snapshot {}", path.display()))
    }

    /// Replaces every collection in `sink` with the contents of this snapshot.
    #[tracing::instrument(skip_all, level = "info", fields(
        counties = self.counties.len(),
        areas = self.areas.len(),
        precincts = self.precincts.len(),
        groups = self.groups.len(),
    ))]
    pub fn apply_to(self, sink: &dyn ReplicationSink) -> Result<(), MirrorWriteError> {
        let MirrorSnapshot {
            counties,
            areas,
            precincts,
            groups,
        } = self;
        sink.replace_all(EntityKind::County, into_entities(counties))?;
        sink.replace_all(EntityKind::Area, into_entities(areas))?;
        sink.replace_all(EntityKind::Precinct, into_entities(precincts))?;
        sink.replace_all(EntityKind::Group, into_entities(groups))
    }
}

fn into_entities<T: Into<MirrorEntity>>(values: Vec<T>) -> Vec<MirrorEntity> {
    values.into_iter().map(Into::into).collect()
}

use crate::normalization::{normalize_area_id, normalize_precinct_code};
use crate::options::{OptionSource, SelectorOption};
use mirror_store::{AreaId, CountyId, GroupId, PrecinctId};
use serde::Serialize;
use std::fmt::Debug;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    County,
    Area,
    Precinct,
}

/// State of one dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum Slot<Id> {
    Empty,
    /// Chosen by the user.
    Populated(Id),
    /// Picked because it was the only option.
    AutoResolved(Id),
}

impl<Id> Default for Slot<Id> {
    fn default() -> Self {
        Slot::Empty
    }
}

impl<Id: Clone + PartialEq + Debug> Slot<Id> {
    pub fn id(&self) -> Option<&Id> {
        match self {
            Slot::Empty => None,
            Slot::Populated(id) | Slot::AutoResolved(id) => Some(id),
        }
    }

    fn from_choice(choice: Option<Id>) -> Self {
        choice.map(Slot::Populated).unwrap_or_default()
    }

    /// Drops a value missing from `options` and fills an empty slot from a single option.
    fn reconcile(self, options: &[SelectorOption<Id>], held_empty: bool) -> Self {
        let offered = |id: &Id| options.iter().any(|option| &option.id == id);
        match self {
            Slot::Populated(id) if offered(&id) => Slot::Populated(id),
            Slot::AutoResolved(id) if offered(&id) => Slot::AutoResolved(id),
            Slot::Populated(id) | Slot::AutoResolved(id) => {
                tracing::debug!(stale = ?id, "clearing selection missing from its options");
                Self::auto_resolve(options)
            }
            Slot::Empty if held_empty => Slot::Empty,
            Slot::Empty => Self::auto_resolve(options),
        }
    }

    fn auto_resolve(options: &[SelectorOption<Id>]) -> Self {
        match options {
            [only] => Slot::AutoResolved(only.id.clone()),
            _ => Slot::Empty,
        }
    }
}

/// The three slots plus the level, if any, the user explicitly cleared. A cleared level is
/// not auto-resolved again until the user picks at it or the level above it changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub county: Slot<CountyId>,
    pub area: Slot<AreaId>,
    pub precinct: Slot<PrecinctId>,
    cleared: Option<Level>,
}

impl SelectionState {
    pub fn with_county(&self, county: Option<CountyId>) -> Self {
        Self {
            cleared: county.is_none().then_some(Level::County),
            county: Slot::from_choice(county),
            area: Slot::Empty,
            precinct: Slot::Empty,
        }
    }

    pub fn with_area(&self, area: Option<AreaId>) -> Self {
        Self {
            cleared: area.is_none().then_some(Level::Area),
            county: self.county.clone(),
            area: Slot::from_choice(area),
            precinct: Slot::Empty,
        }
    }

    pub fn with_precinct(&self, precinct: Option<PrecinctId>) -> Self {
        Self {
            cleared: precinct.is_none().then_some(Level::Precinct),
            county: self.county.clone(),
            area: self.area.clone(),
            precinct: Slot::from_choice(precinct),
        }
    }

    fn is_held_empty(&self, level: Level) -> bool {
        self.cleared == Some(level)
    }
}

/// Values handed to reporting queries, already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportFilter {
    pub county: Option<CountyId>,
    pub area: Option<String>,
    pub precinct: Option<String>,
}

/// Everything a view needs to render the selector, computed in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionSnapshot {
    pub revision: u64,
    pub counties: Vec<SelectorOption<CountyId>>,
    pub areas: Vec<SelectorOption<AreaId>>,
    pub precincts: Vec<SelectorOption<PrecinctId>>,
    pub groups: Vec<SelectorOption<GroupId>>,
    pub county: Slot<CountyId>,
    pub area: Slot<AreaId>,
    pub precinct: Slot<PrecinctId>,
    pub report_filter: ReportFilter,
}

/// Recomputes every level top-down from `state`. Lower slots are reset whenever the slot
/// above them ends up holding a different value, and single options are auto-resolved in
/// the same pass.
pub fn resolve(
    state: &SelectionState,
    source: &dyn OptionSource,
    revision: u64,
) -> (SelectionState, SelectionSnapshot) {
    let counties = source.counties();
    let county = state
        .county
        .clone()
        .reconcile(&counties, state.is_held_empty(Level::County));
    let county_changed = county.id() != state.county.id();

    let areas = county
        .id()
        .map(|county| source.areas(county))
        .unwrap_or_default();
    let area_slot = if county_changed {
        Slot::Empty
    } else {
        state.area.clone()
    };
    let area = area_slot.reconcile(&areas, state.is_held_empty(Level::Area) && !county_changed);
    let area_changed = county_changed || area.id() != state.area.id();

    let precincts = area
        .id()
        .map(|area| source.precincts(area))
        .unwrap_or_default();
    let precinct_slot = if area_changed {
        Slot::Empty
    } else {
        state.precinct.clone()
    };
    let precinct = precinct_slot.reconcile(
        &precincts,
        state.is_held_empty(Level::Precinct) && !area_changed,
    );

    let groups = county
        .id()
        .map(|county| source.groups(county))
        .unwrap_or_default();

    let report_filter = ReportFilter {
        county: county.id().cloned(),
        area: area.id().map(|id| normalize_area_id(id.as_str())),
        precinct: precinct.id().map(|id| {
            precincts
                .iter()
                .find(|option| &option.id == id)
                .and_then(|option| option.code.as_deref())
                .map(normalize_precinct_code)
                .unwrap_or_else(|| id.inner())
        }),
    };

    let next = SelectionState {
        county: county.clone(),
        area: area.clone(),
        precinct: precinct.clone(),
        cleared: match state.cleared {
            Some(Level::Area) if county_changed => None,
            Some(Level::Precinct) if area_changed => None,
            held => held,
        },
    };
    let snapshot = SelectionSnapshot {
        revision,
        counties,
        areas,
        precincts,
        groups,
        county,
        area,
        precinct,
        report_filter,
    };
    (next, snapshot)
}

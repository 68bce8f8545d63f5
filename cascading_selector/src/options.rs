use crate::access::RoleContext;
use itertools::Itertools;
use mirror_store::typed::{all_of, children_of, MirrorRecord};
use mirror_store::{
    Area, AreaId, County, CountyId, Group, GroupId, MirrorLookupError, MirrorStore, Precinct,
    PrecinctId,
};
use serde::Serialize;

/// One entry of a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorOption<Id> {
    pub id: Id,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Supplies the allowed, sorted options of each level.
pub trait OptionSource {
    fn counties(&self) -> Vec<SelectorOption<CountyId>>;

    fn areas(&self, county: &CountyId) -> Vec<SelectorOption<AreaId>>;

    fn precincts(&self, area: &AreaId) -> Vec<SelectorOption<PrecinctId>>;

    fn groups(&self, county: &CountyId) -> Vec<SelectorOption<GroupId>>;
}

/// Options read from the local mirror and scoped by the active role.
///
/// Lookup failures never reach the caller: they are logged and read as an empty level.
pub struct MirrorOptions<'a> {
    store: &'a dyn MirrorStore,
    context: &'a RoleContext,
}

impl<'a> MirrorOptions<'a> {
    pub fn new(store: &'a dyn MirrorStore, context: &'a RoleContext) -> Self {
        Self { store, context }
    }
}

fn or_empty<R: MirrorRecord>(result: Result<Vec<R>, MirrorLookupError>) -> Vec<R> {
    result.unwrap_or_else(|err| {
        let kind = R::KIND;
        tracing::warn!(%kind, "mirror lookup failed, showing no options: {err}");
        Vec::new()
    })
}

fn sorted<Id: Ord>(options: impl Iterator<Item = SelectorOption<Id>>) -> Vec<SelectorOption<Id>> {
    options
        .sorted_by(|left, right| {
            left.label
                .cmp(&right.label)
                .then_with(|| left.id.cmp(&right.id))
        })
        .collect()
}

impl OptionSource for MirrorOptions<'_> {
    fn counties(&self) -> Vec<SelectorOption<CountyId>> {
        let counties = or_empty(all_of::<County>(self.store));
        sorted(
            counties
                .into_iter()
                .filter(|county| county.active && self.context.can_see_county(county.id.as_str()))
                .map(|county| SelectorOption {
                    id: county.id,
                    label: county.name,
                    code: Some(county.code),
                }),
        )
    }

    fn areas(&self, county: &CountyId) -> Vec<SelectorOption<AreaId>> {
        let areas = or_empty(children_of::<Area>(self.store, county.as_str()));
        sorted(
            areas
                .into_iter()
                .filter(|area| area.active && self.context.can_see_area(area.id.as_str()))
                .map(|area| SelectorOption {
                    id: area.id,
                    label: area.name,
                    code: None,
                }),
        )
    }

    fn precincts(&self, area: &AreaId) -> Vec<SelectorOption<PrecinctId>> {
        let precincts = or_empty(children_of::<Precinct>(self.store, area.as_str()));
        sorted(
            precincts
                .into_iter()
                .filter(|precinct| {
                    precinct.active && self.context.can_see_precinct(precinct.id.as_str())
                })
                .map(|precinct| SelectorOption {
                    id: precinct.id,
                    label: precinct.name,
                    code: Some(precinct.code),
                }),
        )
    }

    fn groups(&self, county: &CountyId) -> Vec<SelectorOption<GroupId>> {
        let groups = or_empty(children_of::<Group>(self.store, county.as_str()));
        sorted(groups.into_iter().map(|group| SelectorOption {
            id: group.id,
            label: group.name,
            code: None,
        }))
    }
}

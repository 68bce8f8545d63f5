use serde::{Deserialize, Serialize};
use shared_kernel::string_key;
use std::fmt::{Display, Formatter};

string_key!(CountyId);
string_key!(AreaId);
string_key!(PrecinctId);
string_key!(GroupId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct County {
    pub id: CountyId,
    pub name: String,
    pub code: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    pub county_id: CountyId,
    pub active: bool,
}

/// `code` is kept verbatim; it may carry leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precinct {
    pub id: PrecinctId,
    pub name: String,
    pub code: String,
    pub area_id: AreaId,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub county_id: CountyId,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    County,
    Area,
    Precinct,
    Group,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::County,
        EntityKind::Area,
        EntityKind::Precinct,
        EntityKind::Group,
    ];

    /// Kind of the owning entity, `None` for the root of the tree.
    pub fn parent_kind(&self) -> Option<EntityKind> {
        match self {
            EntityKind::County => None,
            EntityKind::Area | EntityKind::Group => Some(EntityKind::County),
            EntityKind::Precinct => Some(EntityKind::Area),
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::County => "county",
            EntityKind::Area => "area",
            EntityKind::Precinct => "precinct",
            EntityKind::Group => "group",
        };
        write!(f, "{name}")
    }
}

/// A replicated document of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MirrorEntity {
    County(County),
    Area(Area),
    Precinct(Precinct),
    Group(Group),
}

impl MirrorEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            MirrorEntity::County(_) => EntityKind::County,
            MirrorEntity::Area(_) => EntityKind::Area,
            MirrorEntity::Precinct(_) => EntityKind::Precinct,
            MirrorEntity::Group(_) => EntityKind::Group,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            MirrorEntity::County(county) => county.id.as_str(),
            MirrorEntity::Area(area) => area.id.as_str(),
            MirrorEntity::Precinct(precinct) => precinct.id.as_str(),
            MirrorEntity::Group(group) => group.id.as_str(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MirrorEntity::County(county) => &county.name,
            MirrorEntity::Area(area) => &area.name,
            MirrorEntity::Precinct(precinct) => &precinct.name,
            MirrorEntity::Group(group) => &group.name,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        match self {
            MirrorEntity::County(_) => None,
            MirrorEntity::Area(area) => Some(area.county_id.as_str()),
            MirrorEntity::Precinct(precinct) => Some(precinct.area_id.as_str()),
            MirrorEntity::Group(group) => Some(group.county_id.as_str()),
        }
    }
}

impl From<County> for MirrorEntity {
    fn from(value: County) -> Self {
        MirrorEntity::County(value)
    }
}

impl From<Area> for MirrorEntity {
    fn from(value: Area) -> Self {
        MirrorEntity::Area(value)
    }
}

impl From<Precinct> for MirrorEntity {
    fn from(value: Precinct) -> Self {
        MirrorEntity::Precinct(value)
    }
}

impl From<Group> for MirrorEntity {
    fn from(value: Group) -> Self {
        MirrorEntity::Group(value)
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sentinel granting access to every entity at a level.
pub const ALL_ACCESS: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    StateAdmin,
    CountyChair,
    AreaChair,
    CommitteePerson,
    Candidate,
    Volunteer,
    Other(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Capability {
    /// May browse the geography of the whole state through the county selector.
    StatewideGeography,
}

impl Role {
    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::StatewideGeography => matches!(self, Role::StateAdmin),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "state_admin" => Role::StateAdmin,
            "county_chair" => Role::CountyChair,
            "area_chair" => Role::AreaChair,
            "committee_person" => Role::CommitteePerson,
            "candidate" => Role::Candidate,
            "volunteer" => Role::Volunteer,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::StateAdmin => "state_admin".to_string(),
            Role::CountyChair => "county_chair".to_string(),
            Role::AreaChair => "area_chair".to_string(),
            Role::CommitteePerson => "committee_person".to_string(),
            Role::Candidate => "candidate".to_string(),
            Role::Volunteer => "volunteer".to_string(),
            Role::Other(other) => other,
        }
    }
}

/// Identifiers a role may see at one level of the geography.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<String>")]
pub enum AccessScope {
    All,
    Only(HashSet<String>),
}

impl Default for AccessScope {
    fn default() -> Self {
        AccessScope::Only(HashSet::new())
    }
}

impl From<Vec<String>> for AccessScope {
    fn from(value: Vec<String>) -> Self {
        if value.iter().any(|id| id == ALL_ACCESS) {
            return AccessScope::All;
        }
        AccessScope::Only(value.into_iter().collect())
    }
}

impl AccessScope {
    /// Strict membership: an empty list grants nothing.
    pub fn contains(&self, id: &str) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::Only(ids) => ids.contains(id),
        }
    }

    /// Like [`AccessScope::contains`], except that an empty list means "not restricted".
    pub fn permits(&self, id: &str) -> bool {
        match self {
            AccessScope::Only(ids) if ids.is_empty() => true,
            scope => scope.contains(id),
        }
    }
}

/// The active role and its geography access lists, as issued by the claims provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleContext {
    pub role: Role,
    #[serde(default)]
    pub counties: AccessScope,
    #[serde(default)]
    pub areas: AccessScope,
    #[serde(default)]
    pub precincts: AccessScope,
}

impl RoleContext {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            counties: AccessScope::default(),
            areas: AccessScope::default(),
            precincts: AccessScope::default(),
        }
    }

    pub fn with_counties<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.counties = collect_scope(ids);
        self
    }

    pub fn with_areas<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.areas = collect_scope(ids);
        self
    }

    pub fn with_precincts<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.precincts = collect_scope(ids);
        self
    }

    pub fn from_claims(claims: serde_json::Value) -> anyhow::Result<Self> {
        serde_json::from_value(claims).map_err(|err| anyhow::anyhow!("Invalid role claims: {err}"))
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.role.has_capability(capability)
    }

    pub fn can_see_county(&self, id: &str) -> bool {
        self.counties.contains(id)
    }

    pub fn can_see_area(&self, id: &str) -> bool {
        self.areas.permits(id)
    }

    pub fn can_see_precinct(&self, id: &str) -> bool {
        self.precincts.permits(id)
    }
}

fn collect_scope<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> AccessScope {
    AccessScope::from(ids.into_iter().map(Into::into).collect::<Vec<String>>())
}

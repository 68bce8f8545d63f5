use crate::entities::{EntityKind, MirrorEntity};
use crate::subscriptions::SubscriptionHandle;
#[cfg(any(test, feature = "testing"))]
use mockall::automock;
use thiserror::Error;

pub type EntityPredicate = Box<dyn Fn(&MirrorEntity) -> bool + Send + Sync>;
pub type ChangeCallback = Box<dyn Fn(Vec<MirrorEntity>) + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorLookupError {
    #[error("no parent index exists for {kind} entities")]
    Unindexed { kind: EntityKind },
    #[error("the {kind} snapshot is unavailable: {reason}")]
    SnapshotUnavailable { kind: EntityKind, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorWriteError {
    #[error("expected a {expected} entity but received a {found} entity")]
    KindMismatch {
        expected: EntityKind,
        found: EntityKind,
    },
    #[error("the mirror cannot accept writes: {0}")]
    Unavailable(String),
}

/// Read side of the local mirror. Reads never touch the network.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait MirrorStore: Send + Sync {
    /// Every entity of `kind`, in no particular order.
    fn get_all(&self, kind: EntityKind) -> Result<Vec<MirrorEntity>, MirrorLookupError>;

    /// Entities of `kind` whose owning entity is `parent_id`.
    fn get_by_parent(
        &self,
        kind: EntityKind,
        parent_id: &str,
    ) -> Result<Vec<MirrorEntity>, MirrorLookupError>;

    /// Calls `on_change` with the matching entities of `kind` whenever a replicated change
    /// touches one of them. The subscription lives as long as the returned handle.
    fn subscribe(
        &self,
        kind: EntityKind,
        predicate: EntityPredicate,
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, MirrorLookupError>;
}

/// Write side, reserved for the replication feed.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait ReplicationSink: Send + Sync {
    fn replace_all(
        &self,
        kind: EntityKind,
        entities: Vec<MirrorEntity>,
    ) -> Result<(), MirrorWriteError>;

    fn upsert(&self, entity: MirrorEntity) -> Result<(), MirrorWriteError>;

    fn remove(&self, kind: EntityKind, id: &str) -> Result<(), MirrorWriteError>;
}

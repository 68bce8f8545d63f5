pub mod contracts;
pub mod entities;
pub mod in_memory;
pub mod snapshot;
pub mod subscriptions;
pub mod typed;

pub use contracts::{
    ChangeCallback, EntityPredicate, MirrorLookupError, MirrorStore, MirrorWriteError,
    ReplicationSink,
};
pub use entities::{
    Area, AreaId, County, CountyId, EntityKind, Group, GroupId, MirrorEntity, Precinct, PrecinctId,
};
pub use in_memory::InMemoryMirrorStore;
pub use snapshot::MirrorSnapshot;
pub use subscriptions::SubscriptionHandle;

use crate::contracts::{
    ChangeCallback, EntityPredicate, MirrorLookupError, MirrorStore, MirrorWriteError,
    ReplicationSink,
};
use crate::entities::{EntityKind, MirrorEntity};
use crate::subscriptions::{SubscriptionHandle, SubscriptionRegistry};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

type Table = BTreeMap<String, MirrorEntity>;

/// Process-local replica of the reference entities.
///
/// Shared read-many, single-writer: consumers read through [`MirrorStore`] while the
/// replication feed is the only caller of [`ReplicationSink`]. Change callbacks run on the
/// writer's thread after the snapshot lock has been released, so they may read the store.
#[derive(Default)]
pub struct InMemoryMirrorStore {
    tables: RwLock<HashMap<EntityKind, Table>>,
    subscriptions: Arc<Mutex<SubscriptionRegistry>>,
}

impl InMemoryMirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .lock()
            .map(|registry| registry.len())
            .unwrap_or_default()
    }

    fn read_table<T>(
        &self,
        kind: EntityKind,
        read: impl FnOnce(Option<&Table>) -> T,
    ) -> Result<T, MirrorLookupError> {
        let tables = self
            .tables
            .read()
            .map_err(|err| MirrorLookupError::SnapshotUnavailable {
                kind,
                reason: err.to_string(),
            })?;
        Ok(read(tables.get(&kind)))
    }

    fn write_table(
        &self,
        kind: EntityKind,
        write: impl FnOnce(&mut Table) -> Vec<MirrorEntity>,
    ) -> Result<(), MirrorWriteError> {
        let touched = {
            let mut tables = self
                .tables
                .write()
                .map_err(|err| MirrorWriteError::Unavailable(err.to_string()))?;
            write(tables.entry(kind).or_default())
        };
        self.notify(kind, &touched);
        Ok(())
    }

    fn notify(&self, kind: EntityKind, touched: &[MirrorEntity]) {
        if touched.is_empty() {
            return;
        }
        let subscriptions = match self.subscriptions.lock() {
            Ok(registry) => registry.for_kind(kind),
            Err(err) => {
                tracing::warn!(%kind, "skipping change notifications: {err}");
                return;
            }
        };
        let subscriptions = subscriptions
            .into_iter()
            .filter(|subscription| subscription.is_touched_by(touched.iter()))
            .collect::<Vec<_>>();
        if subscriptions.is_empty() {
            return;
        }

        let current = match self.get_all(kind) {
            Ok(current) => current,
            Err(err) => {
                tracing::warn!(%kind, "skipping change notifications: {err}");
                return;
            }
        };
        tracing::debug!(%kind, subscribers = subscriptions.len(), "notifying mirror subscribers");
        for subscription in subscriptions {
            let matching = current
                .iter()
                .filter(|entity| (subscription.predicate)(*entity))
                .cloned()
                .collect();
            (subscription.on_change)(matching);
        }
    }
}

fn ensure_kind(expected: EntityKind, entity: &MirrorEntity) -> Result<(), MirrorWriteError> {
    if entity.kind() == expected {
        Ok(())
    } else {
        Err(MirrorWriteError::KindMismatch {
            expected,
            found: entity.kind(),
        })
    }
}

impl MirrorStore for InMemoryMirrorStore {
    fn get_all(&self, kind: EntityKind) -> Result<Vec<MirrorEntity>, MirrorLookupError> {
        self.read_table(kind, |table| {
            table
                .map(|table| table.values().cloned().collect())
                .unwrap_or_default()
        })
    }

    fn get_by_parent(
        &self,
        kind: EntityKind,
        parent_id: &str,
    ) -> Result<Vec<MirrorEntity>, MirrorLookupError> {
        if kind.parent_kind().is_none() {
            return Err(MirrorLookupError::Unindexed { kind });
        }
        self.read_table(kind, |table| {
            table
                .map(|table| {
                    table
                        .values()
                        .filter(|entity| entity.parent_id() == Some(parent_id))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    fn subscribe(
        &self,
        kind: EntityKind,
        predicate: EntityPredicate,
        on_change: ChangeCallback,
    ) -> Result<SubscriptionHandle, MirrorLookupError> {
        SubscriptionRegistry::insert(&self.subscriptions, kind, predicate, on_change)
            .map_err(|reason| MirrorLookupError::SnapshotUnavailable { kind, reason })
    }
}

impl ReplicationSink for InMemoryMirrorStore {
    #[tracing::instrument(skip(self, entities), fields(count = entities.len()), level = "debug")]
    fn replace_all(
        &self,
        kind: EntityKind,
        entities: Vec<MirrorEntity>,
    ) -> Result<(), MirrorWriteError> {
        for entity in &entities {
            ensure_kind(kind, entity)?;
        }
        self.write_table(kind, |table| {
            let previous = std::mem::take(table);
            for entity in entities {
                table.insert(entity.id().to_owned(), entity);
            }
            previous.into_values().chain(table.values().cloned()).collect()
        })
    }

    #[tracing::instrument(skip(self), fields(kind = %entity.kind(), id = entity.id()), level = "debug")]
    fn upsert(&self, entity: MirrorEntity) -> Result<(), MirrorWriteError> {
        let kind = entity.kind();
        self.write_table(kind, |table| {
            let mut touched = vec![entity.clone()];
            touched.extend(table.insert(entity.id().to_owned(), entity));
            touched
        })
    }

    #[tracing::instrument(skip(self), level = "debug")]
    fn remove(&self, kind: EntityKind, id: &str) -> Result<(), MirrorWriteError> {
        self.write_table(kind, |table| table.remove(id).into_iter().collect())
    }
}

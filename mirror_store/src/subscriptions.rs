use crate::entities::{EntityKind, MirrorEntity};
use shared_kernel::uuid_key;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

uuid_key!(SubscriptionId);

type SharedPredicate = Arc<dyn Fn(&MirrorEntity) -> bool + Send + Sync>;
type SharedCallback = Arc<dyn Fn(Vec<MirrorEntity>) + Send + Sync>;

#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) predicate: SharedPredicate,
    pub(crate) on_change: SharedCallback,
}

impl Subscription {
    /// True when any of the entities before or after a change is watched.
    pub(crate) fn is_touched_by<'a>(
        &self,
        mut changed: impl Iterator<Item = &'a MirrorEntity>,
    ) -> bool {
        changed.any(|entity| (self.predicate)(entity))
    }
}

#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    entries: HashMap<SubscriptionId, (EntityKind, Subscription)>,
}

impl SubscriptionRegistry {
    pub(crate) fn insert(
        registry: &Arc<Mutex<SubscriptionRegistry>>,
        kind: EntityKind,
        predicate: Box<dyn Fn(&MirrorEntity) -> bool + Send + Sync>,
        on_change: Box<dyn Fn(Vec<MirrorEntity>) + Send + Sync>,
    ) -> Result<SubscriptionHandle, String> {
        let id = SubscriptionId::new();
        let subscription = Subscription {
            predicate: Arc::from(predicate),
            on_change: Arc::from(on_change),
        };
        registry
            .lock()
            .map_err(|err| err.to_string())?
            .entries
            .insert(id, (kind, subscription));
        Ok(SubscriptionHandle {
            id,
            registry: Arc::downgrade(registry),
        })
    }

    pub(crate) fn for_kind(&self, kind: EntityKind) -> Vec<Subscription> {
        self.entries
            .values()
            .filter(|(subscribed_kind, _)| *subscribed_kind == kind)
            .map(|(_, subscription)| subscription.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Keeps a mirror subscription alive. Dropping it unsubscribes.
#[must_use = "the subscription is released as soon as the handle is dropped"]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    registry: Weak<Mutex<SubscriptionRegistry>>,
}

impl SubscriptionHandle {
    /// A handle bound to nothing, for stores without change notifications.
    pub fn detached() -> Self {
        Self {
            id: SubscriptionId::new(),
            registry: Weak::new(),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn release(self) {}
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        match registry.lock() {
            Ok(mut registry) => {
                registry.entries.remove(&self.id);
            }
            Err(err) => {
                tracing::warn!(subscription = %self.id, "failed to release subscription: {err}");
            }
        };
    }
}

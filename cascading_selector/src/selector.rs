use crate::access::{Capability, RoleContext};
use crate::lookup::precinct_by_code;
use crate::options::MirrorOptions;
use crate::selection::{resolve, SelectionSnapshot, SelectionState};
use mirror_store::{
    AreaId, CountyId, EntityKind, MirrorEntity, MirrorStore, PrecinctId, SubscriptionHandle,
};
use std::sync::{Arc, Mutex, PoisonError};

type Listener = Arc<dyn Fn(&SelectionSnapshot) + Send + Sync>;

const WATCHED_KINDS: [EntityKind; 4] = [
    EntityKind::County,
    EntityKind::Area,
    EntityKind::Precinct,
    EntityKind::Group,
];

struct SelectorState {
    selection: SelectionState,
    snapshot: SelectionSnapshot,
    listener: Option<Listener>,
    mounted: bool,
}

struct Shared {
    store: Arc<dyn MirrorStore>,
    context: RoleContext,
    state: Mutex<SelectorState>,
}

impl Shared {
    /// Applies `change` and recomputes every level under one lock, then publishes the
    /// resulting snapshot. Returns `None` once the selector has been unmounted.
    fn update(
        &self,
        change: impl FnOnce(&SelectionState) -> SelectionState,
    ) -> Option<SelectionSnapshot> {
        let (snapshot, listener) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if !state.mounted {
                tracing::debug!("discarding update for an unmounted selector");
                return None;
            }
            let requested = change(&state.selection);
            let options = MirrorOptions::new(self.store.as_ref(), &self.context);
            let (selection, snapshot) = resolve(&requested, &options, state.snapshot.revision + 1);
            state.selection = selection;
            state.snapshot = snapshot.clone();
            (snapshot, state.listener.clone())
        };
        if let Some(listener) = listener {
            listener(&snapshot);
        }
        Some(snapshot)
    }

    fn current(&self) -> SelectionSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }
}

/// County → area → precinct selector bound to the local mirror.
///
/// Mounting subscribes to mirror changes so the selection is recomputed whenever the
/// replicated data moves. Dropping the selector unmounts it: subscriptions are released and
/// any change already in flight is discarded instead of being applied.
///
/// Listeners receive one snapshot per logical update. Snapshots carry an increasing
/// `revision`; a listener fed from several threads should ignore older revisions.
pub struct CascadingSelector {
    shared: Arc<Shared>,
    _subscriptions: Vec<SubscriptionHandle>,
}

impl CascadingSelector {
    pub fn is_visible_to(context: &RoleContext) -> bool {
        context.has_capability(Capability::StatewideGeography)
    }

    /// Returns `None` when the role may not see the selector at all.
    #[tracing::instrument(skip(store), fields(role = ?context.role), level = "debug")]
    pub fn mount(store: Arc<dyn MirrorStore>, context: RoleContext) -> Option<Self> {
        if !Self::is_visible_to(&context) {
            tracing::debug!("selector suppressed for role");
            return None;
        }

        let shared = Arc::new(Shared {
            store,
            context,
            state: Mutex::new(SelectorState {
                selection: SelectionState::default(),
                snapshot: SelectionSnapshot::default(),
                listener: None,
                mounted: true,
            }),
        });
        let subscriptions = WATCHED_KINDS
            .into_iter()
            .filter_map(|kind| watch(&shared, kind))
            .collect();
        shared.update(SelectionState::clone);

        Some(Self {
            shared,
            _subscriptions: subscriptions,
        })
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.shared.current()
    }

    /// Replaces the listener notified after every update.
    pub fn on_update(&self, listener: impl Fn(&SelectionSnapshot) + Send + Sync + 'static) {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listener = Some(Arc::new(listener));
    }

    pub fn select_county(&self, county: Option<CountyId>) -> SelectionSnapshot {
        self.apply(|selection| selection.with_county(county))
    }

    pub fn clear_county(&self) -> SelectionSnapshot {
        self.select_county(None)
    }

    pub fn select_area(&self, area: Option<AreaId>) -> SelectionSnapshot {
        self.apply(|selection| selection.with_area(area))
    }

    pub fn select_precinct(&self, precinct: Option<PrecinctId>) -> SelectionSnapshot {
        self.apply(|selection| selection.with_precinct(precinct))
    }

    /// Selects the precinct of the current area whose code matches `code`. Returns `None`
    /// and leaves the selection untouched when no offered precinct has that code.
    pub fn select_precinct_by_code(&self, code: &str) -> Option<SelectionSnapshot> {
        let current = self.snapshot();
        let precinct = precinct_by_code(&current.precincts, code)?;
        Some(self.select_precinct(Some(precinct.id.clone())))
    }

    /// Recomputes against the current mirror contents without changing any choice.
    pub fn refresh(&self) -> SelectionSnapshot {
        self.apply(SelectionState::clone)
    }

    fn apply(&self, change: impl FnOnce(&SelectionState) -> SelectionState) -> SelectionSnapshot {
        self.shared
            .update(change)
            .unwrap_or_else(|| self.shared.current())
    }
}

impl Drop for CascadingSelector {
    fn drop(&mut self) {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mounted = false;
    }
}

fn watch(shared: &Arc<Shared>, kind: EntityKind) -> Option<SubscriptionHandle> {
    let selector = Arc::downgrade(shared);
    let subscription = shared.store.subscribe(
        kind,
        Box::new(|_: &MirrorEntity| true),
        Box::new(move |_: Vec<MirrorEntity>| {
            if let Some(shared) = selector.upgrade() {
                shared.update(SelectionState::clone);
            }
        }),
    );
    match subscription {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(%kind, "selector will not follow mirror changes: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CascadingSelector;
    use crate::access::{Role, RoleContext};
    use crate::selection::{SelectionSnapshot, Slot};
    use mirror_store::contracts::{ChangeCallback, MockMirrorStore};
    use mirror_store::{
        Area, County, EntityKind, InMemoryMirrorStore, MirrorEntity, MirrorLookupError,
        MirrorStore, Precinct, ReplicationSink, SubscriptionHandle,
    };
    use std::sync::{Arc, Mutex};

    fn county(id: &str, name: &str) -> MirrorEntity {
        County {
            id: id.into(),
            name: name.to_string(),
            code: id.to_string(),
            active: true,
        }
        .into()
    }

    fn area(id: &str, name: &str, county_id: &str) -> MirrorEntity {
        Area {
            id: id.into(),
            name: name.to_string(),
            county_id: county_id.into(),
            active: true,
        }
        .into()
    }

    fn precinct(id: &str, code: &str, area_id: &str) -> MirrorEntity {
        Precinct {
            id: id.into(),
            name: format!("Precinct {code}"),
            code: code.to_string(),
            area_id: area_id.into(),
            active: true,
        }
        .into()
    }

    fn state_admin() -> RoleContext {
        RoleContext::new(Role::StateAdmin).with_counties(["ALL"])
    }

    fn recorded(selector: &CascadingSelector) -> Arc<Mutex<Vec<SelectionSnapshot>>> {
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let sink = snapshots.clone();
        selector.on_update(move |snapshot| sink.lock().unwrap().push(snapshot.clone()));
        snapshots
    }

    #[test]
    fn test_single_county_is_auto_selected_and_its_areas_listed() {
        let store = Arc::new(InMemoryMirrorStore::new());
        store.upsert(county("A", "Adams")).unwrap();
        store
            .replace_all(
                EntityKind::Area,
                vec![area("A-1", "East", "A"), area("A-2", "West", "A")],
            )
            .unwrap();

        let selector = CascadingSelector::mount(store, state_admin()).unwrap();
        let snapshot = selector.snapshot();

        assert_eq!(snapshot.county, Slot::AutoResolved("A".into()));
        let areas = snapshot
            .areas
            .iter()
            .map(|option| option.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(areas, vec!["A-1", "A-2"]);
        assert_eq!(snapshot.area, Slot::Empty);
    }

    #[test]
    fn test_roles_without_statewide_access_get_no_selector() {
        let store: Arc<dyn MirrorStore> = Arc::new(InMemoryMirrorStore::new());
        let context = RoleContext::new(Role::CountyChair).with_counties(["ALL"]);

        assert!(!CascadingSelector::is_visible_to(&context));
        assert!(CascadingSelector::mount(store, context).is_none());
    }

    #[test]
    fn test_mirror_changes_publish_one_consistent_snapshot() {
        let store = Arc::new(InMemoryMirrorStore::new());
        store.upsert(area("PA15-A-15", "Area 15", "A")).unwrap();
        store.upsert(precinct("P-1", "0240", "PA15-A-15")).unwrap();
        let selector = CascadingSelector::mount(store.clone(), state_admin()).unwrap();
        let snapshots = recorded(&selector);

        store.upsert(county("A", "Adams")).unwrap();

        let snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 1);
        let snapshot = &snapshots[0];
        assert_eq!(snapshot.county, Slot::AutoResolved("A".into()));
        assert_eq!(snapshot.area, Slot::AutoResolved("PA15-A-15".into()));
        assert_eq!(snapshot.precinct, Slot::AutoResolved("P-1".into()));
        assert_eq!(snapshot.report_filter.area.as_deref(), Some("15"));
        assert_eq!(snapshot.report_filter.precinct.as_deref(), Some("240"));
    }

    #[test]
    fn test_clearing_the_county_clears_everything_below_in_one_update() {
        let store = Arc::new(InMemoryMirrorStore::new());
        store
            .replace_all(EntityKind::County, vec![county("A", "Adams"), county("B", "Berks")])
            .unwrap();
        store.upsert(area("PA15-A-15", "Area 15", "A")).unwrap();
        store.upsert(precinct("P-1", "005", "PA15-A-15")).unwrap();
        let selector = CascadingSelector::mount(store, state_admin()).unwrap();

        let selected = selector.select_county(Some("A".into()));
        assert_eq!(selected.report_filter.precinct.as_deref(), Some("5"));

        let snapshots = recorded(&selector);
        let cleared = selector.clear_county();

        assert_eq!(cleared.county, Slot::Empty);
        assert_eq!(cleared.area, Slot::Empty);
        assert_eq!(cleared.precinct, Slot::Empty);
        assert_eq!(cleared.report_filter.area, None);
        assert_eq!(cleared.report_filter.precinct, None);
        assert_eq!(snapshots.lock().unwrap().len(), 1);
        assert!(cleared.revision > selected.revision);
    }

    #[test]
    fn test_explicitly_cleared_single_county_is_not_reselected() {
        let store = Arc::new(InMemoryMirrorStore::new());
        store.upsert(county("A", "Adams")).unwrap();
        let selector = CascadingSelector::mount(store.clone(), state_admin()).unwrap();
        assert_eq!(selector.snapshot().county, Slot::AutoResolved("A".into()));

        selector.clear_county();
        store.upsert(area("A-1", "East", "A")).unwrap();

        assert_eq!(selector.snapshot().county, Slot::Empty);
    }

    #[test]
    fn test_precinct_codes_resolve_within_the_selected_area() {
        let store = Arc::new(InMemoryMirrorStore::new());
        store.upsert(county("C", "Centre")).unwrap();
        store
            .replace_all(
                EntityKind::Area,
                vec![area("PA-C-1", "East", "C"), area("PA-C-2", "West", "C")],
            )
            .unwrap();
        store
            .replace_all(
                EntityKind::Precinct,
                vec![
                    precinct("P-A", "0001", "PA-C-1"),
                    precinct("P-B", "0001", "PA-C-2"),
                    precinct("P-C", "0002", "PA-C-2"),
                ],
            )
            .unwrap();
        let selector = CascadingSelector::mount(store, state_admin()).unwrap();
        selector.select_area(Some("PA-C-2".into()));

        let snapshot = selector.select_precinct_by_code("1").unwrap();

        assert_eq!(snapshot.precinct, Slot::Populated("P-B".into()));
        assert_eq!(snapshot.report_filter.area.as_deref(), Some("2"));
        assert_eq!(snapshot.report_filter.precinct.as_deref(), Some("1"));
    }

    #[test]
    fn test_unknown_precinct_code_leaves_the_selection_alone() {
        let store = Arc::new(InMemoryMirrorStore::new());
        store.upsert(county("C", "Centre")).unwrap();
        store.upsert(area("PA-C-1", "East", "C")).unwrap();
        store
            .replace_all(
                EntityKind::Precinct,
                vec![precinct("P-A", "0001", "PA-C-1"), precinct("P-B", "0002", "PA-C-1")],
            )
            .unwrap();
        let selector = CascadingSelector::mount(store, state_admin()).unwrap();
        let before = selector.snapshot();

        assert!(selector.select_precinct_by_code("0003").is_none());
        assert_eq!(selector.snapshot(), before);
    }

    #[test]
    fn test_failed_area_lookup_yields_no_area_options() {
        let mut store = MockMirrorStore::new();
        store.expect_get_all().returning(|kind| match kind {
            EntityKind::County => Ok(vec![county("X", "Xenia")]),
            _ => Ok(vec![]),
        });
        store.expect_get_by_parent().returning(|kind, _| {
            Err(MirrorLookupError::SnapshotUnavailable {
                kind,
                reason: "missing index".to_string(),
            })
        });
        store
            .expect_subscribe()
            .returning(|_, _, _| Ok(SubscriptionHandle::detached()));

        let selector = CascadingSelector::mount(Arc::new(store), state_admin()).unwrap();
        let snapshot = selector.snapshot();

        assert_eq!(snapshot.county, Slot::AutoResolved("X".into()));
        assert!(snapshot.areas.is_empty());
        assert!(snapshot.groups.is_empty());
    }

    #[test]
    fn test_changes_delivered_after_unmount_are_discarded() {
        let callbacks: Arc<Mutex<Vec<ChangeCallback>>> = Arc::new(Mutex::new(Vec::new()));
        let captured = callbacks.clone();
        let mut store = MockMirrorStore::new();
        store.expect_get_all().returning(|_| Ok(vec![]));
        store.expect_get_by_parent().returning(|_, _| Ok(vec![]));
        store.expect_subscribe().returning(move |_, _, on_change| {
            captured.lock().unwrap().push(on_change);
            Ok(SubscriptionHandle::detached())
        });

        let selector = CascadingSelector::mount(Arc::new(store), state_admin()).unwrap();
        let snapshots = recorded(&selector);
        drop(selector);

        for callback in callbacks.lock().unwrap().iter() {
            callback(vec![]);
        }

        assert!(snapshots.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unmounting_releases_mirror_subscriptions() {
        let store = Arc::new(InMemoryMirrorStore::new());
        let selector = CascadingSelector::mount(store.clone(), state_admin()).unwrap();
        assert_eq!(store.subscription_count(), 4);

        drop(selector);

        assert_eq!(store.subscription_count(), 0);
        store.upsert(county("A", "Adams")).unwrap();
    }
}

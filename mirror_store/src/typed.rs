//! Typed views over [`MirrorStore`] reads.

use crate::contracts::{MirrorLookupError, MirrorStore};
use crate::entities::{Area, County, EntityKind, Group, MirrorEntity, Precinct};

pub trait MirrorRecord: Sized {
    const KIND: EntityKind;

    fn from_entity(entity: MirrorEntity) -> Option<Self>;
}

macro_rules! mirror_record {
    ($Record: ident, $Kind: ident) => {
        impl MirrorRecord for $Record {
            const KIND: EntityKind = EntityKind::$Kind;

            fn from_entity(entity: MirrorEntity) -> Option<Self> {
                match entity {
                    MirrorEntity::$Kind(record) => Some(record),
                    _ => None,
                }
            }
        }
    };
}

mirror_record!(County, County);
mirror_record!(Area, Area);
mirror_record!(Precinct, Precinct);
mirror_record!(Group, Group);

fn into_records<R: MirrorRecord>(entities: Vec<MirrorEntity>) -> Vec<R> {
    entities.into_iter().filter_map(R::from_entity).collect()
}

pub fn all_of<R: MirrorRecord>(store: &dyn MirrorStore) -> Result<Vec<R>, MirrorLookupError> {
    store.get_all(R::KIND).map(into_records)
}

pub fn children_of<R: MirrorRecord>(
    store: &dyn MirrorStore,
    parent_id: &str,
) -> Result<Vec<R>, MirrorLookupError> {
    store.get_by_parent(R::KIND, parent_id).map(into_records)
}

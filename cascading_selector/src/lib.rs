pub mod access;
pub mod lookup;
pub mod normalization;
pub mod options;
pub mod selection;
pub mod selector;

pub use access::{AccessScope, Capability, Role, RoleContext};
pub use normalization::{normalize_area_id, normalize_precinct_code};
pub use options::{MirrorOptions, OptionSource, SelectorOption};
pub use selection::{Level, ReportFilter, SelectionSnapshot, SelectionState, Slot};
pub use selector::CascadingSelector;

//! # Object Marker
//!
//! Capability interface for recording ownership of an object in its metadata.
//!
//! Any number of owners may *reference* an object; at most one of them *manages*
//! it, and managing implies referencing. Implementations differ in the tag names
//! they use (e.g. local namespace vs. remote cluster targets) but must satisfy the
//! same contract. All mutating operations return whether the metadata changed.

use super::{ListFilter, MarkerError, ObjectKey};
use kube::api::ObjectMeta;

pub trait ObjectMarker: Send + Sync {
    /// Whether `owner` is referencing and managing the object
    fn is_managed_by(&self, owner: &ObjectKey, obj: &ObjectMeta) -> Result<bool, MarkerError>;

    /// Whether `owner` is among the owners referencing the object
    fn is_referenced_by(&self, owner: &ObjectKey, obj: &ObjectMeta) -> Result<bool, MarkerError>;

    /// Coarse store filter preselecting candidates managed by `owner`.
    /// The result must still be checked with [`ObjectMarker::is_managed_by`].
    fn list_managed_options(&self, owner: &ObjectKey) -> Result<ListFilter, MarkerError>;

    /// Coarse store filter preselecting candidates referenced by `owner`.
    /// The result must still be checked with [`ObjectMarker::is_referenced_by`].
    fn list_referenced_options(&self, owner: &ObjectKey) -> Result<ListFilter, MarkerError>;

    /// Mark the object as referenced and managed by `owner`
    fn mark_managed(&self, owner: &ObjectKey, obj: &mut ObjectMeta) -> Result<bool, MarkerError>;

    /// Mark the object as referenced by `owner`
    fn mark_referenced(&self, owner: &ObjectKey, obj: &mut ObjectMeta)
        -> Result<bool, MarkerError>;

    /// Stop `owner` from managing the object. No-op if another owner manages it.
    fn unmark_managed(&self, owner: &ObjectKey, obj: &mut ObjectMeta) -> Result<bool, MarkerError>;

    /// Stop `owner` from referencing (and therefore managing) the object
    fn unmark_referenced(
        &self,
        owner: &ObjectKey,
        obj: &mut ObjectMeta,
    ) -> Result<bool, MarkerError>;

    /// All owners currently referencing the object
    fn get_referencing_targets(&self, obj: &ObjectMeta) -> Result<Vec<ObjectKey>, MarkerError>;
}

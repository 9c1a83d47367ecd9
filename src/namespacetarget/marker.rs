//! # Namespace Object Marker
//!
//! Ownership tags of objects in local namespaces:
//!
//! - label [`LINKED_BY_REMOTE_SECRET_LABEL`] set to `"true"` while any owner references the object
//! - annotation [`LINKED_REMOTE_SECRETS_ANNOTATION`] holding the referencing owner keys
//! - annotation [`MANAGING_REMOTE_SECRET_ANNOTATION`] holding the managing owner key

use crate::binding::{ListFilter, MarkerError, ObjectKey, ObjectMarker, ReferencedSet};
use crate::constants::{
    LINKED_BY_REMOTE_SECRET_LABEL, LINKED_LABEL_VALUE, LINKED_REMOTE_SECRETS_ANNOTATION,
    MANAGING_REMOTE_SECRET_ANNOTATION, MAX_TOTAL_ANNOTATIONS_BYTES, REFERENCED_SET_DELIMITER,
};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceObjectMarker;

/// Working copy of the tags, written back only after all checks pass
#[derive(Default)]
struct Tags {
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
}

impl Tags {
    fn is_linked(&self) -> bool {
        self.labels
            .get(LINKED_BY_REMOTE_SECRET_LABEL)
            .is_some_and(|v| v == LINKED_LABEL_VALUE)
    }

    fn referenced(&self) -> ReferencedSet {
        self.annotations
            .get(LINKED_REMOTE_SECRETS_ANNOTATION)
            .map(|v| ReferencedSet::parse(v.as_str()))
            .unwrap_or_default()
    }

    fn add_reference(&mut self, key: &str) -> bool {
        let mut changed = false;

        let mut set = self.referenced();
        if set.add(key) {
            self.annotations
                .insert(LINKED_REMOTE_SECRETS_ANNOTATION.to_string(), set.to_string());
            changed = true;
        }

        if !self.is_linked() {
            self.labels.insert(
                LINKED_BY_REMOTE_SECRET_LABEL.to_string(),
                LINKED_LABEL_VALUE.to_string(),
            );
            changed = true;
        }

        changed
    }

    fn set_manager(&mut self, key: &str) -> bool {
        if self.annotations.get(MANAGING_REMOTE_SECRET_ANNOTATION).map(String::as_str) == Some(key)
        {
            return false;
        }
        self.annotations
            .insert(MANAGING_REMOTE_SECRET_ANNOTATION.to_string(), key.to_string());
        true
    }

    fn remove_manager(&mut self, key: &str) -> bool {
        if self.annotations.get(MANAGING_REMOTE_SECRET_ANNOTATION).map(String::as_str) != Some(key)
        {
            return false;
        }
        self.annotations.remove(MANAGING_REMOTE_SECRET_ANNOTATION);
        true
    }

    fn remove_reference(&mut self, key: &str) -> bool {
        let mut changed = self.remove_manager(key);

        let mut set = self.referenced();
        let removed = set.remove(key);

        if set.is_empty() {
            changed |= self
                .annotations
                .remove(LINKED_REMOTE_SECRETS_ANNOTATION)
                .is_some();
            changed |= self.labels.remove(LINKED_BY_REMOTE_SECRET_LABEL).is_some();
        } else if removed {
            self.annotations
                .insert(LINKED_REMOTE_SECRETS_ANNOTATION.to_string(), set.to_string());
            changed = true;
        }

        changed
    }

    fn annotations_size(&self) -> usize {
        self.annotations
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl NamespaceObjectMarker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// String form of the owner key as stored in the referenced set
    fn owner_key(owner: &ObjectKey) -> Result<String, MarkerError> {
        let key = owner.to_string();
        if key.contains(REFERENCED_SET_DELIMITER) {
            return Err(MarkerError::InvalidOwnerKey(key));
        }
        Ok(key)
    }

    fn read(obj: &ObjectMeta) -> Tags {
        Tags {
            labels: obj.labels.clone().unwrap_or_default(),
            annotations: obj.annotations.clone().unwrap_or_default(),
        }
    }

    /// Apply `mutate` to a copy of the tags and write it back if it changed
    /// anything. A mutation growing the annotations past the size limit is
    /// refused and leaves `obj` untouched.
    fn update<F>(obj: &mut ObjectMeta, mutate: F) -> Result<bool, MarkerError>
    where
        F: FnOnce(&mut Tags) -> bool,
    {
        let mut tags = Self::read(obj);
        if !mutate(&mut tags) {
            return Ok(false);
        }

        let size = tags.annotations_size();
        if size > MAX_TOTAL_ANNOTATIONS_BYTES {
            return Err(MarkerError::AnnotationsTooLarge {
                size,
                limit: MAX_TOTAL_ANNOTATIONS_BYTES,
            });
        }

        obj.labels = Some(tags.labels);
        obj.annotations = Some(tags.annotations);
        Ok(true)
    }

    fn linked_filter() -> ListFilter {
        ListFilter::default().with_label(LINKED_BY_REMOTE_SECRET_LABEL, LINKED_LABEL_VALUE)
    }
}

impl ObjectMarker for NamespaceObjectMarker {
    fn is_managed_by(&self, owner: &ObjectKey, obj: &ObjectMeta) -> Result<bool, MarkerError> {
        if !self.is_referenced_by(owner, obj)? {
            return Ok(false);
        }
        let key = Self::owner_key(owner)?;
        Ok(obj
            .annotations
            .as_ref()
            .and_then(|a| a.get(MANAGING_REMOTE_SECRET_ANNOTATION))
            .is_some_and(|manager| *manager == key))
    }

    fn is_referenced_by(&self, owner: &ObjectKey, obj: &ObjectMeta) -> Result<bool, MarkerError> {
        let key = Self::owner_key(owner)?;
        let tags = Self::read(obj);
        Ok(tags.is_linked() && tags.referenced().contains(&key))
    }

    fn list_managed_options(&self, owner: &ObjectKey) -> Result<ListFilter, MarkerError> {
        Self::owner_key(owner)?;
        Ok(Self::linked_filter())
    }

    fn list_referenced_options(&self, owner: &ObjectKey) -> Result<ListFilter, MarkerError> {
        Self::owner_key(owner)?;
        Ok(Self::linked_filter())
    }

    fn mark_managed(&self, owner: &ObjectKey, obj: &mut ObjectMeta) -> Result<bool, MarkerError> {
        let key = Self::owner_key(owner)?;
        Self::update(obj, |tags| {
            let referenced = tags.add_reference(&key);
            let managed = tags.set_manager(&key);
            referenced || managed
        })
    }

    fn mark_referenced(
        &self,
        owner: &ObjectKey,
        obj: &mut ObjectMeta,
    ) -> Result<bool, MarkerError> {
        let key = Self::owner_key(owner)?;
        Self::update(obj, |tags| tags.add_reference(&key))
    }

    fn unmark_managed(&self, owner: &ObjectKey, obj: &mut ObjectMeta) -> Result<bool, MarkerError> {
        let key = Self::owner_key(owner)?;
        Self::update(obj, |tags| tags.remove_manager(&key))
    }

    fn unmark_referenced(
        &self,
        owner: &ObjectKey,
        obj: &mut ObjectMeta,
    ) -> Result<bool, MarkerError> {
        let key = Self::owner_key(owner)?;
        Self::update(obj, |tags| tags.remove_reference(&key))
    }

    fn get_referencing_targets(&self, obj: &ObjectMeta) -> Result<Vec<ObjectKey>, MarkerError> {
        let set = Self::read(obj).referenced();
        let mut owners = Vec::with_capacity(set.len());
        for entry in set.values() {
            match ObjectKey::parse(entry) {
                Some(key) => owners.push(key),
                None => warn!(
                    object = obj.name.as_deref().unwrap_or_default(),
                    namespace = obj.namespace.as_deref().unwrap_or_default(),
                    entry = %entry,
                    "skipping malformed owner key in {}",
                    LINKED_REMOTE_SECRETS_ANNOTATION
                ),
            }
        }
        Ok(owners)
    }
}

//! # Name Correspondence
//!
//! Decides whether a previously materialized secret still matches the desired name.

/// Whether `existing_name` corresponds to the desired fixed `name` or, when no
/// fixed name is set, to the `generate_name` prefix.
///
/// An empty `generate_name` together with an empty `name` accepts any existing
/// name: the store was free to pick one.
#[must_use]
pub fn name_corresponds(existing_name: &str, name: &str, generate_name: &str) -> bool {
    if name.is_empty() {
        existing_name.starts_with(generate_name)
    } else {
        existing_name == name
    }
}

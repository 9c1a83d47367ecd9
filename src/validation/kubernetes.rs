//! # Kubernetes Validation
//!
//! Validates Kubernetes resource names and namespaces per RFC 1123.

use super::ValidationError;
use regex::Regex;

fn invalid(field: &str, value: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidName {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Validate Kubernetes resource name (RFC 1123 subdomain)
/// Format: lowercase alphanumeric, hyphens, dots
/// Length: 1-253 characters
/// Cannot start or end with hyphen or dot
pub fn validate_kubernetes_name(name: &str, field_name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(invalid(field_name, name, "cannot be empty"));
    }

    if name.len() > 253 {
        return Err(invalid(
            field_name,
            name,
            format!(
                "exceeds maximum length of 253 characters (got {})",
                name.len()
            ),
        ));
    }

    // RFC 1123 subdomain: [a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*
    let name_regex =
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")?;

    if !name_regex.is_match(name) {
        return Err(invalid(
            field_name,
            name,
            "must be lowercase alphanumeric, hyphens, dots; cannot start/end with hyphen or dot",
        ));
    }

    Ok(())
}

/// Validate a `generateName` prefix
///
/// The server appends a random suffix, so a trailing hyphen is allowed.
pub fn validate_generate_name(prefix: &str, field_name: &str) -> Result<(), ValidationError> {
    let masked = match prefix.strip_suffix('-') {
        Some(stripped) => format!("{stripped}a"),
        None => prefix.to_string(),
    };
    validate_kubernetes_name(&masked, field_name).map_err(|e| match e {
        ValidationError::InvalidName { field, reason, .. } => ValidationError::InvalidName {
            field,
            value: prefix.to_string(),
            reason,
        },
        other => other,
    })
}

/// Validate Kubernetes namespace (RFC 1123 label)
/// Format: lowercase alphanumeric, hyphens
/// Length: 1-63 characters
/// Cannot start or end with hyphen
pub fn validate_kubernetes_namespace(
    namespace: &str,
    field_name: &str,
) -> Result<(), ValidationError> {
    if namespace.is_empty() {
        return Err(invalid(field_name, namespace, "cannot be empty"));
    }

    if namespace.len() > 63 {
        return Err(invalid(
            field_name,
            namespace,
            format!(
                "exceeds maximum length of 63 characters (got {})",
                namespace.len()
            ),
        ));
    }

    // RFC 1123 label: [a-z0-9]([-a-z0-9]*[a-z0-9])?
    let namespace_regex = Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$")?;

    if !namespace_regex.is_match(namespace) {
        return Err(invalid(
            field_name,
            namespace,
            "must be lowercase alphanumeric, hyphens; cannot start/end with hyphen",
        ));
    }

    Ok(())
}

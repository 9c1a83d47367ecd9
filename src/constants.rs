//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! The metadata tag names below are an external contract: tooling may
//! query them directly, so they must never change between releases.

/// Label set to `"true"` on every object referenced by at least one RemoteSecret.
/// Used as the coarse server-side list filter.
pub const LINKED_BY_REMOTE_SECRET_LABEL: &str = "remotesecret.dev/linked-by-remote-secret";

/// Annotation holding the key of the single RemoteSecret managing the object.
pub const MANAGING_REMOTE_SECRET_ANNOTATION: &str = "remotesecret.dev/managing-remote-secret";

/// Annotation holding the comma-separated keys of all referencing RemoteSecrets.
pub const LINKED_REMOTE_SECRETS_ANNOTATION: &str = "remotesecret.dev/linked-remote-secrets";

/// Value of [`LINKED_BY_REMOTE_SECRET_LABEL`] on marked objects
pub const LINKED_LABEL_VALUE: &str = "true";

/// Separator between the namespace and the name of an owner key
pub const OWNER_KEY_SEPARATOR: char = '/';

/// Delimiter of the entries in [`LINKED_REMOTE_SECRETS_ANNOTATION`].
/// Must differ from [`OWNER_KEY_SEPARATOR`].
pub const REFERENCED_SET_DELIMITER: char = ',';

/// Suffix appended to the owner name to form the default generated-name prefix
pub const DEFAULT_GENERATE_NAME_SUFFIX: &str = "-secret-";

/// Maximum total size of all annotations on a Kubernetes object (keys + values)
pub const MAX_TOTAL_ANNOTATIONS_BYTES: usize = 256 * 1024;

/// Diagnostic type string of deployment targets in the local cluster
pub const NAMESPACE_TARGET_TYPE: &str = "namespace";

/// Condition type reported once the data of a RemoteSecret has been obtained
pub const DATA_OBTAINED_CONDITION: &str = "DataObtained";

/// Default timeout for a single object store request (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default log level when `LOG_LEVEL` is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log format when `LOG_FORMAT` is not set
pub const DEFAULT_LOG_FORMAT: &str = "text";

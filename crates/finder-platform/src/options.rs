use serde::{Deserialize, Serialize};

/// What `list_file` does when a child cannot be stat'ed, typically because
/// it was removed between enumeration and the metadata call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListErrorPolicy {
    /// Fail the whole listing with the child's error
    #[default]
    Abort,
    /// Log and omit the child
    Skip,
}

/// Behavioral knobs shared by provider implementations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    #[serde(default)]
    pub list_errors: ListErrorPolicy,

    /// Sort directories ahead of files in listings
    #[serde(default)]
    pub directories_first: bool,

    /// Create missing parent directories before `write_file`
    #[serde(default)]
    pub create_parent_dirs: bool,
}

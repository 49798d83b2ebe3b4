//! Change-set origin labels
//!
//! Every document transaction is tagged with an origin so downstream
//! consumers (undo stacks, sync, audit) can tell a human edit apart from an
//! automated install.

use serde::{Deserialize, Serialize};

/// Origin used by the package applier for bundled installs
pub const ORIGIN_PACKAGE_APPLY: &str = "package-apply";
/// Origin used when installing a library version
pub const ORIGIN_LIBRARY_APPLY: &str = "library-apply";
/// Origin used when tearing a package down
pub const ORIGIN_PACKAGE_UNINSTALL: &str = "package-uninstall";
/// Origin for direct user edits
pub const ORIGIN_USER: &str = "user";

/// Label tagging a committed change-set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn package_apply() -> Self {
        Self::new(ORIGIN_PACKAGE_APPLY)
    }

    pub fn library_apply() -> Self {
        Self::new(ORIGIN_LIBRARY_APPLY)
    }

    pub fn user() -> Self {
        Self::new(ORIGIN_USER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Origin {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

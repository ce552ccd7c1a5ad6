use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Dotted location inside a policy or claim document.
///
/// Paths always start at `ROOT`; map keys and array indexes are appended with
/// a `.` separator, e.g. `ROOT.TaskGroups.0.Tasks.0.Config.volumes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyPath(String);

impl PolicyPath {
    /// Label of the document root.
    pub const ROOT: &'static str = "ROOT";

    /// Returns the root path.
    #[must_use]
    pub fn root() -> Self {
        Self(Self::ROOT.to_owned())
    }

    /// Returns the path of a map key below this path.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}.{key}", self.0))
    }

    /// Returns the path of an array element below this path.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}.{index}", self.0))
    }

    /// Returns the dotted string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for PolicyPath {
    fn default() -> Self {
        Self::root()
    }
}

impl Display for PolicyPath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::PolicyPath;

    #[test]
    fn nested_path_joins_keys_and_indexes() {
        let path = PolicyPath::root()
            .key("TaskGroups")
            .index(0)
            .key("Tasks")
            .index(2);

        assert_eq!(path.as_str(), "ROOT.TaskGroups.0.Tasks.2");
    }

    #[test]
    fn root_displays_as_root_label() {
        assert_eq!(PolicyPath::default().to_string(), "ROOT");
    }
}

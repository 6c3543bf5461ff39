//! Where plugins live and which names may address them.

use std::path::{Component, Path, PathBuf};

use crate::error::NameError;

/// Directory names that never hold a plugin, regardless of configuration.
pub const BUILT_IN_RESERVED: &[&str] = &["node_modules"];

/// The plugins directory together with the names the engine must not touch.
///
/// # Example
///
/// ```
/// use trellis_plugins::PluginLayout;
///
/// let layout = PluginLayout::new("/srv/plugins", "plugin-manager");
/// assert!(layout.is_excluded("plugin-manager"));
/// assert!(layout.is_excluded("node_modules"));
/// assert!(!layout.is_excluded("sample-plugin"));
/// assert!(layout.plugin_dir("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLayout {
    root: PathBuf,
    manager_id: String,
    reserved: Vec<String>,
}

impl PluginLayout {
    /// Creates a layout rooted at `root` for a manager called `manager_id`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, manager_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            manager_id: manager_id.into(),
            reserved: BUILT_IN_RESERVED
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
        }
    }

    /// Adds further reserved directory names.
    #[must_use]
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.reserved.contains(&name) {
                self.reserved.push(name);
            }
        }
        self
    }

    /// The plugins directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Directory name of the manager itself.
    #[must_use]
    pub fn manager_id(&self) -> &str {
        self.manager_id.as_str()
    }

    /// Reserved directory names, excluding the manager.
    #[must_use]
    pub fn reserved(&self) -> &[String] {
        &self.reserved
    }

    /// Returns `true` for names that never appear in the catalog.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        name == self.manager_id || self.reserved.iter().any(|reserved| reserved == name)
    }

    /// Resolves a caller-supplied directory name to its path.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] unless `name` is a single plain path component.
    pub fn plugin_dir(&self, name: &str) -> Result<PathBuf, NameError> {
        validate_directory_name(name)?;
        Ok(self.root.join(name))
    }
}

/// Checks that `name` is one plain path component.
///
/// Separators, `.`, `..`, and empty names are rejected so a directory name
/// can never address anything outside the plugins directory.
///
/// # Errors
///
/// Returns [`NameError::Empty`] for blank input and
/// [`NameError::NotAComponent`] otherwise.
pub fn validate_directory_name(name: &str) -> Result<(), NameError> {
    if name.trim().is_empty() {
        return Err(NameError::Empty);
    }
    let not_a_component = || NameError::NotAComponent {
        name: name.to_owned(),
    };
    if name.contains(['/', '\\', '\0']) {
        return Err(not_a_component());
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(single)), None) if single == name => Ok(()),
        _ => Err(not_a_component()),
    }
}

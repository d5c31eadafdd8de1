//! Runtime workspace configuration.

use std::path::PathBuf;
use std::time::Duration;

use smol_str::SmolStr;

use crate::base::constants::{DEFAULT_ACTIVATION_DEBOUNCE_MS, DEFAULT_IMPLICIT_UNITS};

/// Settings applied through [`AnalysisHost::set_config`].
///
/// Changing aliases or implicit units rebuilds the unit resolver's alias
/// logic in place; changing source paths rescans candidates. Either way the
/// activation closure is recomputed.
///
/// [`AnalysisHost::set_config`]: crate::ide::AnalysisHost::set_config
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkspaceConfig {
    /// Unit scope names such as `System` or `Vcl`: `SysUtils` in a uses
    /// clause also matches `System.SysUtils`.
    pub scope_name_aliases: Vec<SmolStr>,
    /// Directories searched recursively for candidate units.
    pub extra_source_paths: Vec<PathBuf>,
    /// Units visible everywhere without a uses entry.
    pub implicit_units: Vec<SmolStr>,
    /// Quiet period before a triggered activation run starts.
    pub debounce: Duration,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            scope_name_aliases: Vec::new(),
            extra_source_paths: Vec::new(),
            implicit_units: DEFAULT_IMPLICIT_UNITS.iter().map(|u| SmolStr::new(u)).collect(),
            debounce: Duration::from_millis(DEFAULT_ACTIVATION_DEBOUNCE_MS),
        }
    }
}

impl WorkspaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope_name_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scope_name_aliases = aliases.into_iter().map(|a| SmolStr::new(a.as_ref())).collect();
        self
    }

    pub fn with_extra_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_source_paths.push(path.into());
        self
    }

    /// Replace the implicit units. An empty list makes every unit need a
    /// uses entry.
    pub fn with_implicit_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.implicit_units = units.into_iter().map(|u| SmolStr::new(u.as_ref())).collect();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

//! Driver configuration.

use serde::{Deserialize, Serialize};

/// Settings of a [`CommandLine`](crate::CommandLine) run.
///
/// # Examples
///
/// ```
/// use declopt_driver::DriverConfig;
///
/// let config: DriverConfig =
///     serde_json::from_str(r#"{"application_name": "loader", "help_max_width": 60}"#).unwrap();
/// assert_eq!(config.usage_line(), "USAGE: loader [OPTIONS]");
/// assert_eq!(config.version_line(), "loader: unknown application version");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Name used in the usage line and the version fallback.
    pub application_name: String,
    /// Replaces the default usage line.
    pub usage: Option<String>,
    pub application_version: Option<String>,
    /// Column width cap of the help table.
    pub help_max_width: Option<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            application_name: "application".to_string(),
            usage: None,
            application_version: None,
            help_max_width: None,
        }
    }
}

impl DriverConfig {
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.application_version = Some(version.into());
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_help_max_width(mut self, width: usize) -> Self {
        self.help_max_width = Some(width);
        self
    }

    pub fn usage_line(&self) -> String {
        self.usage
            .clone()
            .unwrap_or_else(|| format!("USAGE: {} [OPTIONS]", self.application_name))
    }

    pub fn version_line(&self) -> String {
        self.application_version.clone().unwrap_or_else(|| {
            format!("{}: unknown application version", self.application_name)
        })
    }
}

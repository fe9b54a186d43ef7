//! Tool configuration parsing and validation
use std::path::PathBuf;

use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format as _, Toml},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};

use crate::diagnostic::Severity;

/// The default name of the config file
pub const CONFIG_FILE_NAME: &str = ".kphptags.toml";

/// The prefix of the environment variables which override the config file
pub const ENV_PREFIX: &str = "KT_";

/// General config for the tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[non_exhaustive]
pub struct BaseConfig {
    /// Paths to files and folders to analyze
    #[builder(default)]
    pub paths: Vec<PathBuf>,

    /// Paths to files and folders to exclude
    #[builder(default)]
    pub exclude: Vec<PathBuf>,

    /// Report tags placed on declarations they don't apply to
    #[builder(default = true)]
    pub applicability: bool,

    /// Only report diagnostics with this severity or higher
    #[builder(default)]
    pub min_severity: Severity,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            paths: Vec::default(),
            exclude: Vec::default(),
            applicability: true,
            min_severity: Severity::default(),
        }
    }
}

/// Output config for the tool
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, bon::Builder)]
#[non_exhaustive]
pub struct OutputConfig {
    /// Path to a file to write the output to (instead of stderr)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,

    /// Output diagnostics in JSON format
    #[builder(default)]
    pub json: bool,

    /// Compact output (minified JSON or compact text representation)
    #[builder(default)]
    pub compact: bool,

    /// Sort the results by file path
    #[builder(default)]
    pub sort: bool,
}

/// The parsed and validated config for the tool
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, bon::Builder)]
#[non_exhaustive]
pub struct Config {
    /// General config for the tool
    #[builder(default)]
    pub kphptags: BaseConfig,

    /// Output config for the tool
    #[builder(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn from(provider: impl Provider) -> Result<Config, Box<figment::Error>> {
        Ok(Figment::from(provider).extract()?)
    }

    /// Create a Figment which reads the config from the default file and environment variables
    ///
    /// Environment variables are prefixed with `KT_` and use `_` as the separator between a section and a key, e.g.
    /// `KT_OUTPUT_JSON=true` or `KT_KPHPTAGS_MIN_SEVERITY=error`.
    #[must_use]
    pub fn figment(config_path: Option<PathBuf>) -> Figment {
        Figment::from(Config::default())
            .admerge(Toml::file(
                config_path.unwrap_or_else(|| CONFIG_FILE_NAME.into()),
            ))
            .admerge(Env::prefixed(ENV_PREFIX).split("_").map(|k| {
                // special case for parameters with an underscore in the name
                match k.as_str() {
                    "KPHPTAGS.MIN.SEVERITY" => "KPHPTAGS.MIN_SEVERITY".into(),
                    _ => k.into(),
                }
            }))
    }
}

/// Implement [`Provider`] for composability
impl Provider for Config {
    fn metadata(&self) -> figment::Metadata {
        Metadata::named("kphptags Config")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        figment::providers::Serialized::defaults(self).data()
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_default_builder() {
        assert_eq!(BaseConfig::default(), BaseConfig::builder().build());
        assert_eq!(OutputConfig::default(), OutputConfig::builder().build());
        assert_eq!(Config::default(), Config::builder().build());
    }

    #[test]
    fn test_figment() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                r#"
[kphptags]
paths = ["src"]
min_severity = "warning"

[output]
compact = true
"#,
            )?;
            jail.set_env("KT_KPHPTAGS_APPLICABILITY", "false");
            jail.set_env("KT_OUTPUT_SORT", "true");
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config.kphptags.paths, vec![PathBuf::from("src")]);
            assert_eq!(config.kphptags.min_severity, Severity::Warning);
            assert!(!config.kphptags.applicability);
            assert!(config.output.compact);
            assert!(config.output.sort);
            assert!(!config.output.json);
            Ok(())
        });
    }

    #[test]
    fn test_env_underscore_key() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("KT_KPHPTAGS_MIN_SEVERITY", "error");
            let config: Config = Config::figment(None).extract()?;
            assert_eq!(config.kphptags.min_severity, Severity::Error);
            Ok(())
        });
    }

    #[test]
    fn test_provider() {
        let config = Config::builder()
            .output(OutputConfig::builder().json(true).build())
            .build();
        let extracted = Config::from(config.clone()).unwrap();
        assert_eq!(extracted, config);
    }
}

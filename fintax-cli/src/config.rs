//! `fintax.toml` configuration.
//!
//! ```toml
//! tax_year = 2025
//!
//! [database]
//! backend = "sqlite"
//! connection_string = "fintax.db"
//!
//! [logging]
//! level = "info"
//! file = "fintax.log"
//! console = true
//!
//! [policy]
//! threshold = "20000000"
//! flat_withholding_rate = "0.154"
//!
//! [[policy.brackets]]
//! upper_bound = "14000000"
//! rate = "0.06"
//! cumulative_deduction = "0"
//!
//! [[policy.brackets]]
//! rate = "0.15"
//! cumulative_deduction = "1260000"
//! ```
//!
//! Every key is optional. Command-line flags win over the file, and the
//! file wins over the built-in defaults.

use std::path::{Path, PathBuf};

use fintax_core::db::DbConfig;
use fintax_core::{DEFAULT_TAX_YEAR, ProgressiveBracket, TaxPolicy};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "fintax.toml";

pub const DEFAULT_DATABASE: &str = "fintax.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub tax_year: Option<i32>,
    pub database: DatabaseSection,
    pub logging: LoggingSection,
    pub policy: PolicyOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
    pub console: Option<bool>,
}

/// Replacements applied on top of the stored (or built-in) policy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyOverrides {
    pub flat_withholding_rate: Option<Decimal>,
    pub comprehensive_surcharge_rate: Option<Decimal>,
    pub threshold: Option<Decimal>,
    pub brackets: Option<Vec<ProgressiveBracket>>,
}

impl PolicyOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(
        &self,
        mut policy: TaxPolicy,
    ) -> TaxPolicy {
        if let Some(rate) = self.flat_withholding_rate {
            policy.flat_withholding_rate = rate;
        }
        if let Some(rate) = self.comprehensive_surcharge_rate {
            policy.comprehensive_surcharge_rate = rate;
        }
        if let Some(threshold) = self.threshold {
            policy.threshold = threshold;
        }
        if let Some(brackets) = &self.brackets {
            policy.brackets = brackets.clone();
        }
        policy
    }
}

/// Values given on the command line. `None` defers to the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub backend: Option<String>,
    pub database: Option<String>,
    pub tax_year: Option<i32>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub quiet: bool,
}

/// Effective settings after merging flags, file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db: DbConfig,
    pub tax_year: i32,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_console: bool,
    pub policy: PolicyOverrides,
}

impl AppConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` if given (it must exist), otherwise
    /// [`DEFAULT_CONFIG_FILE`] when present, otherwise the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            tracing::debug!(path = %fallback.display(), "using config file");
            return Self::load(fallback);
        }
        Ok(Self::default())
    }

    pub fn resolve(
        &self,
        cli: &CliOverrides,
    ) -> Settings {
        let db = DbConfig {
            backend: cli
                .backend
                .clone()
                .or_else(|| self.database.backend.clone())
                .unwrap_or_else(|| DbConfig::default().backend),
            connection_string: cli
                .database
                .clone()
                .or_else(|| self.database.connection_string.clone())
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        };

        Settings {
            db,
            tax_year: cli.tax_year.or(self.tax_year).unwrap_or(DEFAULT_TAX_YEAR),
            log_level: cli.log_level.clone().or_else(|| self.logging.level.clone()),
            log_file: cli.log_file.clone().or_else(|| self.logging.file.clone()),
            log_console: !cli.quiet && self.logging.console.unwrap_or(true),
            policy: self.policy.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const FULL: &str = r#"
tax_year = 2026

[database]
backend = "sqlite"
connection_string = "from-file.db"

[logging]
level = "debug"
file = "fintax.log"
console = false

[policy]
threshold = "30000000"
comprehensive_surcharge_rate = "1.1"

[[policy.brackets]]
upper_bound = "10000000"
rate = "0.1"
cumulative_deduction = "0"

[[policy.brackets]]
rate = "0.2"
cumulative_deduction = "1000000"
"#;

    // ===== parsing =====

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn full_file_parses_every_section() {
        let config = AppConfig::from_toml_str(FULL).unwrap();

        assert_eq!(config.tax_year, Some(2026));
        assert_eq!(config.database.connection_string.as_deref(), Some("from-file.db"));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.console, Some(false));
        assert_eq!(config.policy.threshold, Some(dec!(30000000)));
        assert_eq!(config.policy.flat_withholding_rate, None);
        assert_eq!(
            config.policy.brackets,
            Some(vec![
                ProgressiveBracket::new(Some(dec!(10000000)), dec!(0.1), dec!(0)),
                ProgressiveBracket::new(None, dec!(0.2), dec!(1000000)),
            ])
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml_str("[database]\nurl = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("url"), "got: {err}");
    }

    #[test]
    fn load_reports_missing_file() {
        let path = Path::new("/nonexistent/fintax.toml");

        match AppConfig::load(path) {
            Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected Read error, got {other:?}"),
        }
    }

    #[test]
    fn load_reports_parse_error_with_path() {
        let path = std::env::temp_dir().join(format!("fintax-config-{}.toml", std::process::id()));
        std::fs::write(&path, "tax_year = \"soon\"\n").unwrap();

        let result = AppConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        match result {
            Err(err @ ConfigError::Parse { .. }) => {
                assert!(err.to_string().contains(&path.display().to_string()));
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn discover_with_explicit_missing_path_fails() {
        assert!(AppConfig::discover(Some(Path::new("/nonexistent/fintax.toml"))).is_err());
    }

    // ===== precedence =====

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let settings = AppConfig::default().resolve(&CliOverrides::default());

        assert_eq!(
            settings,
            Settings {
                db: DbConfig {
                    backend: "sqlite".to_string(),
                    connection_string: DEFAULT_DATABASE.to_string(),
                },
                tax_year: DEFAULT_TAX_YEAR,
                log_level: None,
                log_file: None,
                log_console: true,
                policy: PolicyOverrides::default(),
            }
        );
    }

    #[test]
    fn file_overrides_defaults() {
        let settings = AppConfig::from_toml_str(FULL)
            .unwrap()
            .resolve(&CliOverrides::default());

        assert_eq!(settings.db.connection_string, "from-file.db");
        assert_eq!(settings.tax_year, 2026);
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert_eq!(settings.log_file, Some(PathBuf::from("fintax.log")));
        assert!(!settings.log_console);
    }

    #[test]
    fn flags_override_file() {
        let cli = CliOverrides {
            backend: None,
            database: Some(":memory:".to_string()),
            tax_year: Some(2024),
            log_level: Some("warn".to_string()),
            log_file: None,
            quiet: false,
        };

        let settings = AppConfig::from_toml_str(FULL).unwrap().resolve(&cli);

        assert_eq!(settings.db.connection_string, ":memory:");
        assert_eq!(settings.db.backend, "sqlite");
        assert_eq!(settings.tax_year, 2024);
        assert_eq!(settings.log_level.as_deref(), Some("warn"));
        assert_eq!(settings.log_file, Some(PathBuf::from("fintax.log")));
    }

    #[test]
    fn quiet_flag_silences_console_even_if_file_enables_it() {
        let config = AppConfig::from_toml_str("[logging]\nconsole = true\n").unwrap();
        let cli = CliOverrides {
            quiet: true,
            ..CliOverrides::default()
        };

        assert!(!config.resolve(&cli).log_console);
    }

    // ===== policy overrides =====

    #[test]
    fn empty_overrides_leave_policy_untouched() {
        let overrides = PolicyOverrides::default();

        assert!(overrides.is_empty());
        assert_eq!(overrides.apply(TaxPolicy::default()), TaxPolicy::default());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let overrides = AppConfig::from_toml_str(FULL).unwrap().policy;

        let policy = overrides.apply(TaxPolicy::default_for_year(2026));

        assert_eq!(policy.tax_year, 2026);
        assert_eq!(policy.threshold, dec!(30000000));
        assert_eq!(policy.flat_withholding_rate, dec!(0.154));
        assert_eq!(policy.brackets.len(), 2);
        assert_eq!(policy.validate(), Ok(()));
    }
}

//! Task runner configuration.
//!
//! Settings are read from `.fixcap/xtask.yaml` under the workspace root. The
//! file is optional and every field has a default, so a fresh checkout works
//! without one. Values may reference environment variables as `${VAR}` or
//! `${VAR:-default}`, and a few `FIXCAP_*` variables override the file.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Location of the config file relative to the workspace root.
pub const CONFIG_FILE: &str = ".fixcap/xtask.yaml";

/// Environment variable names.
pub mod vars {
    pub const FIXCAP_TARGET: &str = "FIXCAP_TARGET";
    pub const FIXCAP_RUNNER: &str = "FIXCAP_RUNNER";
    pub const FIXCAP_NIGHTLY: &str = "FIXCAP_NIGHTLY";
}

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    Parse { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Settings shared by every recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XtaskConfig {
    /// Cross-compilation target the tests and lints run against.
    pub target: String,
    /// Emulator used as the cargo runner for `target`.
    pub runner: String,
    /// Linker for `target`, when the default one cannot link it.
    pub linker: Option<String>,
    /// Pinned nightly toolchain providing rustfmt.
    pub nightly: String,
    /// Packages tested for `target`. Linting always covers the workspace.
    pub packages: Vec<String>,
    /// Script installed as the git pre-commit hook, relative to the root.
    pub hook_source: PathBuf,
}

impl Default for XtaskConfig {
    fn default() -> Self {
        Self {
            target: "armv7-unknown-linux-musleabihf".to_string(),
            runner: "qemu-arm".to_string(),
            linker: None,
            nightly: "nightly-2024-11-28".to_string(),
            packages: vec!["fixcap".to_string()],
            hook_source: PathBuf::from("scripts/pre-commit"),
        }
    }
}

impl XtaskConfig {
    /// Cargo's environment variable prefix for `target`, e.g.
    /// `CARGO_TARGET_ARMV7_UNKNOWN_LINUX_MUSLEABIHF`.
    pub fn cargo_target_prefix(&self) -> String {
        format!(
            "CARGO_TARGET_{}",
            self.target.to_uppercase().replace(['-', '.'], "_")
        )
    }

    /// Apply `FIXCAP_*` overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(target) = lookup(vars::FIXCAP_TARGET) {
            self.target = target;
        }
        if let Some(runner) = lookup(vars::FIXCAP_RUNNER) {
            self.runner = runner;
        }
        if let Some(nightly) = lookup(vars::FIXCAP_NIGHTLY) {
            self.nightly = nightly;
        }
    }

    /// Check that the values can produce valid command lines.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let components = self.target.split('-').collect::<Vec<_>>();
        if components.len() < 3 || components.iter().any(|c| c.is_empty()) {
            return Err(ConfigError::Validation {
                message: format!("target `{}` is not a target triple", self.target),
            });
        }

        if self.runner.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "runner must not be empty".to_string(),
            });
        }

        if !self.nightly.starts_with("nightly") {
            return Err(ConfigError::Validation {
                message: format!("`{}` is not a nightly toolchain", self.nightly),
            });
        }

        if self.packages.is_empty() {
            return Err(ConfigError::Validation {
                message: "at least one package is required".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration loader.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Loader for the default config file of the workspace at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join(CONFIG_FILE),
        }
    }

    /// Loader for an explicit config file.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the loader reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, apply environment overrides and validate.
    pub fn load(&self) -> Result<XtaskConfig, ConfigError> {
        let mut config = if self.path.exists() {
            debug!(path = %self.path.display(), "loading config");
            let contents =
                std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })?;
            Self::parse(&contents)?
        } else {
            debug!(path = %self.path.display(), "no config file, using defaults");
            XtaskConfig::default()
        };

        config.apply_overrides(|var| std::env::var(var).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parse YAML after expanding environment variables.
    pub fn parse(contents: &str) -> Result<XtaskConfig, ConfigError> {
        let expanded = expand_env_vars(contents, |var| std::env::var(var).ok())?;

        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::Parse {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }
}

/// Expand `${VAR}` and `${VAR:-default}` using `lookup`.
///
/// Comment lines are left untouched.
pub fn expand_env_vars(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").map_err(|e| ConfigError::Validation {
        message: e.to_string(),
    })?;

    let mut result = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            continue;
        }

        let mut last = 0;
        for cap in re.captures_iter(line) {
            let Some(full_match) = cap.get(0) else {
                continue;
            };
            let var_name = &cap[1];

            let value = match (lookup(var_name), cap.get(2)) {
                (Some(value), _) => value,
                (None, Some(default)) => default.as_str().to_string(),
                (None, None) => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var_name.to_string(),
                    })
                }
            };

            result.push_str(&line[last..full_match.start()]);
            result.push_str(&value);
            last = full_match.end();
        }
        result.push_str(&line[last..]);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::tempdir;
    use test_case::test_case;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = XtaskConfig::default();

        assert_eq!("armv7-unknown-linux-musleabihf", config.target);
        assert_eq!("qemu-arm", config.runner);
        assert_eq!(vec!["fixcap".to_string()], config.packages);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::new(dir.path()).load().unwrap();

        assert_eq!(PathBuf::from("scripts/pre-commit"), config.hook_source);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".fixcap")).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "linker: arm-linux-musleabihf-gcc\npackages: [fixcap, other]\n",
        )
        .unwrap();

        let config = ConfigLoader::new(dir.path()).load().unwrap();

        assert_eq!(Some("arm-linux-musleabihf-gcc"), config.linker.as_deref());
        assert_eq!(2, config.packages.len());
        assert_eq!("qemu-arm", config.runner);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = ConfigLoader::parse("target: ok\npackages: {\n").unwrap_err();

        assert!(matches!(err, ConfigError::Parse { line: Some(_), .. }));
    }

    #[test]
    fn test_cargo_target_prefix() {
        let config = XtaskConfig::default();

        assert_eq!(
            "CARGO_TARGET_ARMV7_UNKNOWN_LINUX_MUSLEABIHF",
            config.cargo_target_prefix()
        );
    }

    #[test]
    fn test_overrides() {
        let mut config = XtaskConfig::default();
        config.apply_overrides(env(&[
            (vars::FIXCAP_TARGET, "thumbv7em-none-eabihf"),
            (vars::FIXCAP_NIGHTLY, "nightly-2025-01-01"),
        ]));

        assert_eq!("thumbv7em-none-eabihf", config.target);
        assert_eq!("nightly-2025-01-01", config.nightly);
        assert_eq!("qemu-arm", config.runner);
    }

    #[test_case("armv7", "qemu-arm", "nightly" ; "short target")]
    #[test_case("armv7--musl", "qemu-arm", "nightly" ; "empty target component")]
    #[test_case("armv7-unknown-linux-musleabihf", "  ", "nightly" ; "blank runner")]
    #[test_case("armv7-unknown-linux-musleabihf", "qemu-arm", "stable" ; "stable toolchain")]
    fn test_validation_rejects(target: &str, runner: &str, nightly: &str) {
        let config = XtaskConfig {
            target: target.to_string(),
            runner: runner.to_string(),
            nightly: nightly.to_string(),
            ..XtaskConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_env_var_expansion() {
        let lookup = env(&[("QEMU", "qemu-arm-static")]);

        let expanded = expand_env_vars("runner: ${QEMU}\nlinker: ${CC:-cc}\n", lookup).unwrap();

        assert_eq!("runner: qemu-arm-static\nlinker: cc\n", expanded);
    }

    #[test]
    fn test_env_var_expansion_skips_comments() {
        let content = "# runner: ${UNSET_IN_COMMENT}\n  # ${ALSO_UNSET}\nrunner: ${QEMU:-qemu-arm}\n";

        let expanded = expand_env_vars(content, env(&[])).unwrap();

        assert_eq!(
            "# runner: ${UNSET_IN_COMMENT}\n  # ${ALSO_UNSET}\nrunner: qemu-arm\n",
            expanded
        );
    }

    #[test]
    fn test_shipped_config_loads() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"))
            .ancestors()
            .nth(2)
            .unwrap();
        let loader = ConfigLoader::new(root);
        assert!(loader.path().is_file(), "{} is missing", loader.path().display());

        let config = loader.load().unwrap();

        assert_eq!(vec!["fixcap".to_string()], config.packages);
    }

    #[test]
    fn test_env_var_expansion_missing_var() {
        let err = expand_env_vars("runner: ${FIXCAP_UNSET_VAR}", env(&[])).unwrap_err();

        assert!(matches!(err, ConfigError::EnvVarNotFound { var } if var == "FIXCAP_UNSET_VAR"));
    }
}

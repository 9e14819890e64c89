use crate::defines::DefineValue;
use eyre::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the build's object directory
pub const TOPOBJDIR_VAR: &str = "TOPOBJDIR";

/// File looked up under `$TOPOBJDIR` when no config path is given
pub const TOPOBJDIR_CONFIG_FILE: &str = "config.defines.yaml";

/// A define value as written in the configuration file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Defines resolved at build-configuration time
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigEnvironment {
    /// Define name to value; `null` means defined with no value
    #[serde(default)]
    defines: BTreeMap<String, Option<ConfigValue>>,
}

impl ConfigEnvironment {
    /// Load the configuration environment.
    ///
    /// An explicit path must exist. Without one, `$TOPOBJDIR` is consulted,
    /// then a few well-known files in the current directory; finding none
    /// is an error. An empty file is a valid, empty environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path().ok_or_else(|| {
                eyre::eyre!(
                    "No configuration environment found: set ${} or pass --config",
                    TOPOBJDIR_VAR
                )
            })?,
        };

        let content = fs::read_to_string(&config_file).with_context(|| {
            format!("Failed to read configuration environment: {}", config_file.display())
        })?;

        let config = Self::parse(&content, &config_file).with_context(|| {
            format!("Failed to parse configuration environment: {}", config_file.display())
        })?;

        tracing::debug!(
            path = %config_file.display(),
            defines = config.defines.len(),
            "loaded configuration environment"
        );
        Ok(config)
    }

    /// Parse configuration content, picking the format from the file extension
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(content)?)
        } else {
            Ok(serde_yaml::from_str(content)?)
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        if let Some(topobjdir) = env::var_os(TOPOBJDIR_VAR) {
            return Some(PathBuf::from(topobjdir).join(TOPOBJDIR_CONFIG_FILE));
        }

        let candidates = [
            PathBuf::from("defines.yaml"),
            PathBuf::from("defines.yml"),
            PathBuf::from("defines.json"),
        ];

        candidates.into_iter().find(|candidate| candidate.exists())
    }

    /// Resolved defines as name/value pairs. `false` entries are omitted.
    pub fn defines(&self) -> impl Iterator<Item = (String, DefineValue)> + '_ {
        self.defines.iter().filter_map(|(name, value)| {
            let value = match value {
                None | Some(ConfigValue::Bool(true)) => DefineValue::Flag,
                Some(ConfigValue::Bool(false)) => return None,
                Some(ConfigValue::Int(int_val)) => DefineValue::Int(*int_val),
                Some(ConfigValue::Str(str_val)) => DefineValue::Str(str_val.clone()),
            };
            Some((name.clone(), value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_yaml_defines() {
        let content = r#"
defines:
  VERSION: 42
  NAME: '"cmake-define"'
  HAVE_FOO: true
  HAVE_BAR: false
  EMPTY:
"#;
        let config = ConfigEnvironment::parse(content, Path::new("defines.yaml")).unwrap();
        let defines: Vec<_> = config.defines().collect();

        assert_eq!(
            defines,
            vec![
                ("EMPTY".to_string(), DefineValue::Flag),
                ("HAVE_FOO".to_string(), DefineValue::Flag),
                ("NAME".to_string(), DefineValue::Str("\"cmake-define\"".to_string())),
                ("VERSION".to_string(), DefineValue::Int(42)),
            ]
        );
    }

    #[test]
    fn test_parse_json_defines() {
        let content = r#"{"defines": {"VERSION": 7, "PREFIX": "/usr", "DEBUG": null}}"#;
        let config = ConfigEnvironment::parse(content, Path::new("env.JSON")).unwrap();
        let defines: Vec<_> = config.defines().collect();

        assert_eq!(
            defines,
            vec![
                ("DEBUG".to_string(), DefineValue::Flag),
                ("PREFIX".to_string(), DefineValue::Str("/usr".to_string())),
                ("VERSION".to_string(), DefineValue::Int(7)),
            ]
        );
    }

    #[test]
    fn test_unknown_keys_are_tolerated() {
        let content = "substs:\n  CC: gcc\ndefines:\n  A: 1\n";
        let config = ConfigEnvironment::parse(content, Path::new("defines.yml")).unwrap();
        assert_eq!(config.defines().count(), 1);
    }

    #[test]
    fn test_missing_defines_section_is_empty() {
        let config = ConfigEnvironment::parse("{}", Path::new("defines.json")).unwrap();
        assert_eq!(config, ConfigEnvironment::default());
    }

    #[test]
    fn test_empty_content_is_empty_environment() {
        for name in ["empty.yaml", "empty.json"] {
            let config = ConfigEnvironment::parse(" \n", Path::new(name)).unwrap();
            assert_eq!(config, ConfigEnvironment::default());
        }
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::with_suffix(".yaml").unwrap();

        let config = ConfigEnvironment::load(Some(file.path())).unwrap();
        assert_eq!(config.defines().count(), 0);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "defines:\n  VERSION: 3").unwrap();

        let config = ConfigEnvironment::load(Some(file.path())).unwrap();
        let defines: Vec<_> = config.defines().collect();
        assert_eq!(defines, vec![("VERSION".to_string(), DefineValue::Int(3))]);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");

        let err = ConfigEnvironment::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("nope.yaml"));
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, "{{ not json").unwrap();

        assert!(ConfigEnvironment::load(Some(file.path())).is_err());
    }
}

//! User configuration (`config.toml`).
//!
//! Problems reading the file never stop the program: they are returned as
//! warnings and the defaults are used instead.

use cellgrid_engine::engine::{EvalOptions, RootArgument};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub formula: FormulaConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct FormulaConfig {
    pub root_argument: RootArgument,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct StorageConfig {
    /// Grid file used when `--file` is not given.
    pub file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            file: PathBuf::from("grid.grd"),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct LogConfig {
    /// Default `env_logger` filter; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            root_argument: self.formula.root_argument,
        }
    }
}

/// Load configuration from `config_file`, or the user config dir when none is
/// given. Returns the config and any warnings to show the user.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = config_file.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        // Only an explicitly requested file is expected to exist.
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match parse_config(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    (config.unwrap_or_default(), warnings)
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "cellgrid")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "cellgrid-config-{}-{}.toml",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.storage.file, PathBuf::from("grid.grd"));
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.eval_options(), EvalOptions::default());
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
[formula]
root_argument = "apply"

[storage]
file = "/tmp/sheet.grd"

[log]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.formula.root_argument, RootArgument::Apply);
        assert_eq!(config.storage.file, PathBuf::from("/tmp/sheet.grd"));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(parse_config("[formula]\nprecision = 2\n").is_err());
        assert!(parse_config("[server]\nport = 80\n").is_err());
        assert!(parse_config("[formula]\nroot_argument = \"cube\"\n").is_err());
    }

    #[test]
    fn test_bad_file_falls_back_with_warning() {
        let path = temp_config("bad", "[formula\n");
        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Failed to parse"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_explicit_file_warns() {
        let path = std::env::temp_dir().join("cellgrid-config-does-not-exist.toml");
        let (config, warnings) = load_config(Some(&path));
        assert_eq!(config, Config::default());
        assert!(warnings[0].starts_with("Config file not found"));
    }

    #[test]
    fn test_oversized_file_is_refused() {
        let big = format!("# {}\n", "x".repeat(MAX_CONFIG_FILE_BYTES as usize));
        let path = temp_config("big", &big);
        let (_, warnings) = load_config(Some(&path));
        assert!(warnings[0].starts_with("Refusing to read"));
        std::fs::remove_file(&path).unwrap();
    }
}

//! CLI configuration file for `mirath --config`.
//!
//! # Example
//!
//! ```toml
//! default_madhab = "shafii"
//!
//! [engine]
//! trigger_epsilon = "0.0001"
//! amount_scale = 3
//!
//! [cache]
//! capacity = 64
//! ```

use std::path::Path;

use mirath_eval::{CacheConfig, EngineConfig};
use serde::{Deserialize, Serialize};

/// Top-level configuration; every field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// School used when `--madhab` is not given.
    pub default_madhab: Option<String>,
    pub engine: EngineConfig,
    pub cache: CacheConfig,
}

impl CliConfig {
    /// Madhab from the flag, then the file, then Hanafi.
    pub fn madhab_or_default(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.default_madhab.clone())
            .unwrap_or_else(|| "hanafi".to_string())
    }
}

/// Read and parse the configuration, or defaults when no path is given.
///
/// Returns a human-readable error string on failure.
pub fn load(path: Option<&Path>) -> Result<CliConfig, String> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    parse(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

fn parse(content: &str) -> Result<CliConfig, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(parse("").unwrap(), CliConfig::default());
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let cfg = parse(
            r#"
default_madhab = "maliki"

[engine]
amount_scale = 3

[cache]
capacity = 0
"#,
        )
        .unwrap();
        assert_eq!(cfg.default_madhab.as_deref(), Some("maliki"));
        assert_eq!(cfg.engine.amount_scale, 3);
        assert_eq!(cfg.engine.trigger_epsilon, Decimal::new(1, 4));
        assert_eq!(cfg.cache.capacity, 0);
    }

    #[test]
    fn flag_wins_over_file_default() {
        let cfg = CliConfig {
            default_madhab: Some("hanbali".to_string()),
            ..CliConfig::default()
        };
        assert_eq!(cfg.madhab_or_default(Some("shafii")), "shafii");
        assert_eq!(cfg.madhab_or_default(None), "hanbali");
        assert_eq!(CliConfig::default().madhab_or_default(None), "hanafi");
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = load(Some(Path::new("/nonexistent/mirath.toml"))).unwrap_err();
        assert!(err.contains("/nonexistent/mirath.toml"));
    }
}

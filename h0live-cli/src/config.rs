/// Config file loading and creation for the h0live CLI.
///
/// Config lives at ~/.config/h0live/config.toml.
/// All fields are optional. CLI args override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Deserialize, Default, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct H0liveConfig {
    pub table: Option<PathBuf>,
    pub prior: Option<String>,
    pub level: Option<f64>,
    pub planck: Option<bool>,
    pub shoes: Option<bool>,
    pub individual: Option<bool>,
    pub clamp_zeros: Option<bool>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# h0live configuration
# All values here can be overridden by CLI flags.

# Likelihood table (CSV with an H0 column and one <Event>_<Counterpart> column each)
# table = \"/path/to/likelihoods.csv\"

# Prior on H0: \"uniform\" or \"log\"
# prior = \"uniform\"

# Credible level for the highest-density interval, strictly between 0 and 1
# level = 0.9

# Report the Planck (67.74 ± 0.62) and SH0ES (73.24 ± 1.74) reference bands
# planck = false
# shoes = false

# Also output each selected event's own normalized likelihood
# individual = false

# Raise zero likelihood values to a tiny floor instead of failing
# clamp_zeros = false
";

/// Returns the default config path: ~/.config/h0live/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("h0live").join("config.toml")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> H0liveConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => H0liveConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<H0liveConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config(path: &Path) {
    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap_or_else(|e| {
            bail(format!("Failed to create directory {}: {e}", parent.display()))
        });
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));
}

use crate::constants::{DEFAULT_OUTPUT_DIR, MAX_COORDINATE_PRECISION};
use crate::error::{Result, RouteError};
use serde::Deserialize;
use std::{
    env,
    path::{Path, PathBuf},
};

const ENV_OUTPUT_DIR: &str = "RUTEADOR_OUTPUT_DIR";
const ENV_COORD_PRECISION: &str = "RUTEADOR_COORD_PRECISION";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where saved routes are written and listed from
    pub output_dir: PathBuf,
    /// Decimal places coordinates are rounded to; `None` means exact matching
    pub coordinate_precision: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            coordinate_precision: None,
        }
    }
}

/// On-disk form: every key optional, missing keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    output_dir: Option<PathBuf>,
    coordinate_precision: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(output_dir) = env::var(ENV_OUTPUT_DIR)
            && !output_dir.trim().is_empty()
        {
            config.output_dir = PathBuf::from(output_dir.trim());
        }

        if let Ok(precision) = env::var(ENV_COORD_PRECISION)
            && !precision.trim().is_empty()
        {
            let decimals = precision.trim().parse().map_err(|_| {
                RouteError::InvalidConfiguration(format!(
                    "{ENV_COORD_PRECISION} must be a whole number, got '{precision}'"
                ))
            })?;
            config.coordinate_precision = Some(decimals);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file on top of the defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RouteError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let file: ConfigFile = toml::from_str(&content)?;
        let mut config = Self::default();
        if let Some(dir) = file.output_dir {
            config.output_dir = dir;
        }
        config.coordinate_precision = file.coordinate_precision;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // If the path already exists but is not a directory, reject early.
        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(RouteError::InvalidConfiguration(format!(
                "Output path is not a directory: {}",
                self.output_dir.display()
            )));
        }

        if let Some(decimals) = self.coordinate_precision
            && decimals > MAX_COORDINATE_PRECISION
        {
            return Err(RouteError::InvalidConfiguration(format!(
                "coordinate precision must be at most {MAX_COORDINATE_PRECISION}, got {decimals}"
            )));
        }

        Ok(())
    }
}

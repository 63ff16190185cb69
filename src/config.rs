use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::stats::EmptyRecordPolicy;

pub const DEFAULT_MAX_ABSENCE_RATIO: f64 = 0.25;
pub const DEFAULT_SESSION_PATH: &str = ".easeattend_session.json";

/// Engine configuration. Every field has a default, so a partial TOML file
/// (or none at all) is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub empty_records: EmptyRecordPolicy,
    /// Share of held classes a student may miss.
    pub max_absence_ratio: f64,
    pub session_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            empty_records: EmptyRecordPolicy::default(),
            max_absence_ratio: DEFAULT_MAX_ABSENCE_RATIO,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.max_absence_ratio) {
            return Err(ConfigError::AbsenceRatio(self.max_absence_ratio));
        }

        if let EmptyRecordPolicy::Fallback {
            theoretical,
            practical,
        } = self.empty_records
        {
            for (session, tally) in [("theoretical", theoretical), ("practical", practical)] {
                if tally.attended > tally.total {
                    return Err(ConfigError::Fallback {
                        session,
                        attended: tally.attended,
                        total: tally.total,
                    });
                }
            }

            if theoretical.total.checked_add(practical.total).is_none() {
                return Err(ConfigError::FallbackOverflow {
                    theoretical: theoretical.total,
                    practical: practical.total,
                });
            }
        }

        Ok(())
    }
}

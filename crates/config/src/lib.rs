#![forbid(unsafe_code)]

mod confidence;
mod error;
mod history;
mod recommendation;
mod stall;
mod trend;

pub use confidence::Confidence;
pub use error::Error;
pub use history::History;
pub use recommendation::Recommendation;
pub use stall::Stall;
pub use trend::Trend;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables with this prefix override file values, e.g.
/// `ENROLLMENT_HISTORY__RETENTION_CAP=365`.
pub const ENV_PREFIX: &str = "ENROLLMENT_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub history: History,
    pub trend: Trend,
    pub confidence: Confidence,
    pub stall: Stall,
    pub recommendation: Recommendation,
}

impl Config {
    /// Defaults overlaid with environment overrides.
    pub fn new() -> Self {
        Self::figment()
            .extract::<Self>()
            .map(Self::clamp)
            .unwrap_or_default()
    }

    /// Load a TOML config file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_path_buf()));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        Ok(config.clamp())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, Error> {
        Ok(toml_edit::ser::to_string_pretty(self)?)
    }

    pub fn clamp(self) -> Self {
        Self {
            history: self.history.clamp(),
            trend: self.trend.clamp(),
            confidence: self.confidence.clamp(),
            stall: self.stall.clamp(),
            recommendation: self.recommendation,
        }
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

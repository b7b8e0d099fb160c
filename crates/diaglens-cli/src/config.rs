use diaglens_types::{RecommendationLibrary, ThresholdConfig};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Fatal configuration failure. Thresholds are load-bearing for every
/// later decision, so this aborts before any extraction happens.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "cannot read config file: {}", err),
            ConfigError::Yaml(err) => write!(f, "malformed config file: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Yaml(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

/// On-disk override file: either section may be omitted.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    thresholds: ThresholdConfig,
    #[serde(default)]
    recommendations: RecommendationLibrary,
}

/// Load thresholds and the recommendation library.
///
/// With no path, both come from the built-in defaults. With a path, the
/// file's threshold metrics override the defaults per metric (absent
/// metrics keep their defaults) and its recommendation entries are laid
/// over the built-in library.
pub fn load(
    path: Option<&Path>,
) -> Result<(ThresholdConfig, RecommendationLibrary), ConfigError> {
    let Some(path) = path else {
        return Ok((ThresholdConfig::default(), RecommendationLibrary::defaults()));
    };

    let text = std::fs::read_to_string(path)?;
    let file: ConfigFile = serde_yaml::from_str(&text)?;

    let mut recommendations = RecommendationLibrary::defaults();
    recommendations
        .entries
        .extend(file.recommendations.entries);

    Ok((file.thresholds, recommendations))
}

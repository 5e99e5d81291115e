//! Session configuration loaded from YAML with environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cassette::DirectoryLocator;
use crate::error::{DeckError, Result};
use crate::matcher::{MatchField, MatcherSpec};
use crate::sequencer::{Consumption, Playback};
use crate::session::{NoMatchMode, Session, SessionBuilder};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TAPEDECK_CONFIG";
/// Environment variable overriding the fixture directory.
pub const FIXTURES_ENV: &str = "TAPEDECK_FIXTURES";
/// Configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tapedeck.yaml";

/// Serialized form of [`Order`](crate::sequencer::Order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSetting {
    /// Recorded order, ignoring requests.
    #[default]
    Recorded,
    /// First interaction accepted by the configured matchers.
    Matching,
}

/// Serialized form of [`Consumption`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumptionSetting {
    /// Single use.
    #[default]
    Ephemeral,
    /// Reusable.
    Looping,
}

impl From<ConsumptionSetting> for Consumption {
    fn from(setting: ConsumptionSetting) -> Self {
        match setting {
            ConsumptionSetting::Ephemeral => Self::Ephemeral,
            ConsumptionSetting::Looping => Self::Looping,
        }
    }
}

/// Playback defaults for sessions created from fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Directory holding `<name>.json` fixtures.
    pub fixtures: PathBuf,
    /// Selection order.
    pub order: OrderSetting,
    /// Matchers applied when `order` is `matching`.
    pub matchers: Vec<MatchField>,
    /// Consumption policy.
    pub consumption: ConsumptionSetting,
    /// Miss behavior.
    pub no_match: NoMatchMode,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            fixtures: PathBuf::from("fixtures"),
            order: OrderSetting::default(),
            matchers: vec![MatchField::Method, MatchField::Url],
            consumption: ConsumptionSetting::default(),
            no_match: NoMatchMode::default(),
        }
    }
}

impl DeckConfig {
    /// Loads a YAML configuration file and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeckError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            DeckError::Config(format!("Failed to parse config file {}: {e}", path.display()))
        })?;
        Ok(config.with_env_overrides())
    }

    /// Loads the file named by `TAPEDECK_CONFIG`, else `./tapedeck.yaml` if it
    /// exists, else the defaults. Environment overrides apply in every case.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::Config`] if a configuration file exists but is invalid.
    pub fn discover() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load(local);
        }
        Ok(Self::default().with_env_overrides())
    }

    /// Applies `TAPEDECK_FIXTURES` when set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(FIXTURES_ENV) {
            tracing::debug!(fixtures = %dir, "fixture directory overridden by environment");
            self.fixtures = PathBuf::from(dir);
        }
        self
    }

    /// The playback policy described by this configuration.
    #[must_use]
    pub fn playback(&self) -> Playback {
        let consumption = self.consumption.into();
        match self.order {
            OrderSetting::Recorded => Playback::recorded(consumption),
            OrderSetting::Matching => {
                let spec: MatcherSpec = self.matchers.iter().copied().collect();
                Playback::matching(spec, consumption)
            }
        }
    }

    /// Locator over the fixture directory.
    #[must_use]
    pub fn locator(&self) -> DirectoryLocator {
        DirectoryLocator::new(&self.fixtures)
    }

    /// Loads the named fixture and configures a session with this playback policy.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::MissingFixture`] or [`DeckError::MalformedFixture`].
    pub fn session(&self, name: &str) -> Result<SessionBuilder> {
        Ok(Session::from_fixture(&self.locator(), name)?
            .playback(self.playback())
            .no_match(self.no_match))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchKind;
    use crate::sequencer::Order;

    #[test]
    fn defaults_play_in_recorded_order_once() {
        let config = DeckConfig::default();
        let playback = config.playback();
        assert!(matches!(playback.order, Order::Recorded));
        assert_eq!(playback.consumption, Consumption::Ephemeral);
        assert_eq!(config.no_match, NoMatchMode::Handler);
    }

    #[test]
    fn load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tapedeck.yaml");
        let yaml = "fixtures: cassettes\n\
                    order: matching\n\
                    matchers: [url, query]\n\
                    consumption: looping\n\
                    no_match: deliver\n";
        std::fs::write(&path, yaml).unwrap();

        let config = DeckConfig::load(&path).unwrap();
        assert_eq!(config.matchers, vec![MatchField::Url, MatchField::Query]);
        assert_eq!(config.no_match, NoMatchMode::Deliver);

        let playback = config.playback();
        assert_eq!(playback.consumption, Consumption::Looping);
        let Order::Matching(spec) = playback.order else {
            panic!("expected matching order");
        };
        assert!(matches!(spec.kinds(), [MatchKind::Url, MatchKind::Query]));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.yaml");
        std::fs::write(&path, "consumption: looping\n").unwrap();

        let config = DeckConfig::load(&path).unwrap();
        assert_eq!(config.consumption, ConsumptionSetting::Looping);
        assert_eq!(config.matchers, vec![MatchField::Method, MatchField::Url]);
    }

    #[test]
    fn invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "order: sideways\n").unwrap();
        assert!(matches!(DeckConfig::load(&path), Err(DeckError::Config(_))));
        assert!(matches!(
            DeckConfig::load(&dir.path().join("absent.yaml")),
            Err(DeckError::Config(_))
        ));
    }

    #[test]
    fn session_uses_fixture_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("one.json"),
            r#"[{"request": {"url": "http://a"}, "response": {"url": "http://a", "status": 200}}]"#,
        )
        .unwrap();
        let config = DeckConfig {
            fixtures: dir.path().to_path_buf(),
            ..DeckConfig::default()
        };

        let session = config.session("one").unwrap().build();
        assert_eq!(session.remaining(), 1);
        assert!(matches!(config.session("two"), Err(DeckError::MissingFixture(_))));
    }
}

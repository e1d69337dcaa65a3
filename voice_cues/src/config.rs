//! Engine configuration.
//!
//! Classification sets, member names and cadences are data, loaded from
//! TOML, so they can be edited without rebuilding. `VoiceConfig::default()`
//! reproduces the shipped values.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Deepest traversal the locator accepts.
pub const MAX_LOCATOR_DEPTH: u32 = 16;

/// Which entry point policy drives the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Track every live item holder independently.
    #[default]
    Population,
    /// Lock onto the action object of the locally controlled actor.
    SingleTarget,
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub mode: TrackingMode,
    pub classes: ClassSets,
    pub polling: PollingConfig,
    pub locator: LocatorConfig,
    pub population: PopulationConfig,
    pub single_target: SingleTargetConfig,
    pub audio: AudioConfig,
}

/// Item type ids per voice class.
///
/// The sets are expected to be disjoint; if they are not, the classifier
/// resolves the overlap by class precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassSets {
    pub ar: HashSet<i64>,
    pub shotgun: HashSet<i64>,
    pub sniper: HashSet<i64>,
    /// Empty by default; the grenade cue comes from the quick-slot shortcut instead.
    pub grenade: HashSet<i64>,
}

impl Default for ClassSets {
    fn default() -> Self {
        Self {
            ar: HashSet::from([238, 240, 242, 244, 256, 654, 659, 681, 682, 862, 1238, 1362]),
            shotgun: HashSet::from([248, 250, 657, 658, 876, 1089]),
            sniper: HashSet::from([246, 407, 437, 780, 781, 782]),
            grenade: HashSet::new(),
        }
    }
}

/// Cadences, in seconds of unscaled host time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Re-scan of every holder's held item.
    pub holder_scan_interval: f64,

    /// Search for the local player while none is locked.
    pub player_search_interval: f64,

    /// Search for the main action object while none is locked.
    pub action_search_interval: f64,

    /// Re-check of the locked actor's held item.
    pub held_check_interval: f64,

    /// Delay before searching again after a locked action was destroyed.
    ///
    /// Keeps a scene teardown from triggering a search on every tick.
    pub rediscovery_cooldown: f64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            holder_scan_interval: 0.2,
            player_search_interval: 1.0,
            action_search_interval: 1.0,
            held_check_interval: 0.15,
            rediscovery_cooldown: 1.0,
        }
    }
}

/// How the locator recognises items and reads their identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Maximum descent from the traversal root.
    pub max_depth: u32,

    /// Marker type every item derives from.
    pub item_type: String,

    /// Namespaces whose types are worth descending into.
    pub item_namespaces: Vec<String>,

    /// Type name fragments that are worth descending into.
    pub item_name_hints: Vec<String>,

    /// Candidate names of the integer type id on an item.
    pub identity_members: Vec<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            item_type: "Item".to_string(),
            item_namespaces: vec!["ItemStatsSystem".to_string()],
            item_name_hints: strings(&["Item", "ItemEntry", "ItemSetting", "Inventory"]),
            identity_members: strings(&["TypeID", "typeID"]),
        }
    }
}

/// Holder discovery for `TrackingMode::Population`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Holder types are loaded types whose name starts with this prefix.
    pub holder_type_prefix: String,

    /// Holder types must derive from this type.
    pub holder_base_type: String,

    /// Wait for the local player before scanning holders.
    pub require_local_player: bool,

    /// Scene name fragments of player candidates.
    pub player_name_hints: Vec<String>,

    /// Candidate names of the "is the local player" flag.
    pub player_flag_members: Vec<String>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            holder_type_prefix: "ItemAgent_".to_string(),
            holder_base_type: "MonoBehaviour".to_string(),
            require_local_player: true,
            player_name_hints: strings(&["Character", "Player"]),
            player_flag_members: strings(&["IsLocalPlayer", "isLocalPlayer", "IsMine"]),
        }
    }
}

/// Attribute chain for `TrackingMode::SingleTarget`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleTargetConfig {
    /// Action objects are instances of (or derive from) this type.
    pub action_type: String,

    /// action -> controlling actor
    pub controller_members: Vec<String>,

    /// controlling actor -> item holder
    pub holder_members: Vec<String>,

    /// item holder -> currently held item
    pub held_item_members: Vec<String>,

    /// Candidate names of the "is the main character" flag on the actor.
    pub main_flag_members: Vec<String>,
}

impl Default for SingleTargetConfig {
    fn default() -> Self {
        Self {
            action_type: "CA_Reload".to_string(),
            controller_members: strings(&["characterController", "CharacterController"]),
            holder_members: strings(&["agentHolder", "AgentHolder"]),
            held_item_members: strings(&["CurrentHoldGun", "currentHoldGun"]),
            main_flag_members: strings(&[
                "IsMainCharacter",
                "isMainCharacter",
                "IsLocalPlayer",
                "isLocalPlayer",
                "IsMine",
            ]),
        }
    }
}

/// Sound files per voice class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub directory: PathBuf,
    pub ar: String,
    pub shotgun: String,
    pub sniper: String,
    pub grenade: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("Audio"),
            ar: "heavy_machine_gun.wav".to_string(),
            shotgun: "shotgun.wav".to_string(),
            sniper: "armor_piercer.wav".to_string(),
            grenade: "grenade.wav".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl VoiceConfig {
    /// Parse and validate a TOML document. Missing sections keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: VoiceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let polling = &self.polling;
        check_interval("polling.holder_scan_interval", polling.holder_scan_interval)?;
        check_interval("polling.player_search_interval", polling.player_search_interval)?;
        check_interval("polling.action_search_interval", polling.action_search_interval)?;
        check_interval("polling.held_check_interval", polling.held_check_interval)?;
        check_interval("polling.rediscovery_cooldown", polling.rediscovery_cooldown)?;

        if self.locator.max_depth == 0 || self.locator.max_depth > MAX_LOCATOR_DEPTH {
            return Err(ConfigError::Invalid {
                field: "locator.max_depth",
                reason: format!(
                    "{} is outside 1..={}",
                    self.locator.max_depth, MAX_LOCATOR_DEPTH
                ),
            });
        }

        check_text("locator.item_type", &self.locator.item_type)?;
        check_names("locator.identity_members", &self.locator.identity_members)?;

        match self.mode {
            TrackingMode::Population => {
                check_text("population.holder_type_prefix", &self.population.holder_type_prefix)?;
                if self.population.require_local_player {
                    check_names("population.player_name_hints", &self.population.player_name_hints)?;
                    check_names(
                        "population.player_flag_members",
                        &self.population.player_flag_members,
                    )?;
                }
            }
            TrackingMode::SingleTarget => {
                let single = &self.single_target;
                check_text("single_target.action_type", &single.action_type)?;
                check_names("single_target.controller_members", &single.controller_members)?;
                check_names("single_target.holder_members", &single.holder_members)?;
                check_names("single_target.held_item_members", &single.held_item_members)?;
                check_names("single_target.main_flag_members", &single.main_flag_members)?;
            }
        }

        Ok(())
    }
}

fn check_interval(field: &'static str, seconds: f64) -> Result<(), ConfigError> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{} is not a non-negative number of seconds", seconds),
        })
    }
}

fn check_text(field: &'static str, text: &str) -> Result<(), ConfigError> {
    if text.trim().is_empty() {
        Err(ConfigError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        })
    } else {
        Ok(())
    }
}

fn check_names(field: &'static str, names: &[String]) -> Result<(), ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::Invalid {
            field,
            reason: "needs at least one name".to_string(),
        });
    }
    names.iter().try_for_each(|name| check_text(field, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = VoiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, TrackingMode::Population);
        assert_eq!(config.locator.max_depth, 3);
        assert!(config.classes.ar.contains(&238));
        assert!(config.classes.shotgun.contains(&248));
        assert!(config.classes.grenade.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = VoiceConfig::from_toml_str(
            r#"
            mode = "single_target"

            [classes]
            grenade = [500, 501]

            [polling]
            held_check_interval = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, TrackingMode::SingleTarget);
        assert_eq!(config.classes.grenade, HashSet::from([500, 501]));
        // Unlisted sets in a given section fall back to their defaults
        assert!(config.classes.ar.contains(&1362));
        assert!((config.polling.held_check_interval - 0.5).abs() < 1e-9);
        assert!((config.polling.holder_scan_interval - 0.2).abs() < 1e-9);
        assert_eq!(config.single_target.action_type, "CA_Reload");
    }

    #[test]
    fn test_invalid_depth_rejected() {
        let err = VoiceConfig::from_toml_str("[locator]\nmax_depth = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "locator.max_depth",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_interval_rejected() {
        let err =
            VoiceConfig::from_toml_str("[polling]\nholder_scan_interval = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_empty_member_names_rejected() {
        let err = VoiceConfig::from_toml_str(
            "mode = \"single_target\"\n[single_target]\nheld_item_members = []\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "single_target.held_item_members",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let err = VoiceConfig::from_toml_str("mode = \"everything\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = VoiceConfig::load(Path::new("/nonexistent/voice_cues.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

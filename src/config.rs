//! Configuration for script compilation, presentation, and playback.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SubtitleError, SubtitleResult};
use crate::flags::FeatureFlags;
use crate::names::{NameStyle, NameStyleRegistry};
use crate::paginate::BreakPolicy;

/// Top-level configuration, usually loaded from TOML.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SubtitleConfig {
    pub features: FeatureFlags,
    pub script: ScriptConfig,
    pub presentation: PresentationConfig,
    pub playback: PlaybackConfig,
    /// Preset name styles, applied before compilation registers new names.
    pub names: Vec<NameStyle>,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            features: FeatureFlags::SUBTITLE,
            script: ScriptConfig::default(),
            presentation: PresentationConfig::default(),
            playback: PlaybackConfig::default(),
            names: Vec::new(),
        }
    }
}

/// How script rows are read and paginated.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScriptConfig {
    pub delimiter: char,
    pub name_index: usize,
    pub text_index: usize,
    /// Longest text per speech unit, in chars. Zero disables pagination.
    pub max_characters: usize,
    /// Separates the display name from the pose id in a speaker field.
    pub split_character: char,
    pub break_policy: BreakPolicy,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            name_index: 0,
            text_index: 1,
            max_characters: 100,
            split_character: '.',
            break_policy: BreakPolicy::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    #[default]
    None,
    Multiply,
    Divide,
}

/// Native-size handling for one image slot.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ImageSlotConfig {
    pub native_size: bool,
    pub scale: ScaleMode,
    pub factor: f32,
}

impl Default for ImageSlotConfig {
    fn default() -> Self {
        Self {
            native_size: false,
            scale: ScaleMode::None,
            factor: 1.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PresentationConfig {
    /// Seconds between letters when the typewriter feature is on.
    pub typewriter_delay: f32,
    /// When false the speaker name is prefixed to the subtitle text.
    pub has_text_box: bool,
    pub portrait: ImageSlotConfig,
    pub pose: ImageSlotConfig,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            typewriter_delay: 0.05,
            has_text_box: true,
            portrait: ImageSlotConfig::default(),
            pose: ImageSlotConfig::default(),
        }
    }
}

/// What to do when a unit has neither an explicit duration nor audio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellFallback {
    /// Report `MissingDwellInput` and leave the unit on screen.
    #[default]
    Halt,
    /// Dwell for a fixed number of seconds.
    Fixed(f32),
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub play_on_awake: bool,
    /// Seconds between activation and autoplay.
    pub delay_to_play: f32,
    pub dwell_fallback: DwellFallback,
}

impl SubtitleConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(input: &str) -> SubtitleResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|err| SubtitleError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> SubtitleResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|err| {
            SubtitleError::InvalidConfig(format!("{}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> SubtitleResult<String> {
        toml::to_string_pretty(self).map_err(|err| SubtitleError::InvalidConfig(err.to_string()))
    }

    pub fn validate(&self) -> SubtitleResult<()> {
        let script = &self.script;
        if script.delimiter == '\n' || script.delimiter == '\r' {
            return Err(SubtitleError::InvalidConfig(
                "delimiter cannot be a line break".to_string(),
            ));
        }
        if script.name_index == script.text_index {
            return Err(SubtitleError::InvalidConfig(format!(
                "name and text share field index {}",
                script.name_index
            )));
        }
        let delay = self.presentation.typewriter_delay;
        if !delay.is_finite() || delay < 0.0 {
            return Err(SubtitleError::InvalidConfig(format!(
                "typewriter delay must be non-negative, got {delay}"
            )));
        }
        for (slot, label) in [
            (&self.presentation.portrait, "portrait"),
            (&self.presentation.pose, "pose"),
        ] {
            if slot.scale != ScaleMode::None && !(slot.factor.is_finite() && slot.factor > 0.0) {
                return Err(SubtitleError::InvalidConfig(format!(
                    "{label} scale factor must be positive, got {}",
                    slot.factor
                )));
            }
        }
        let delay = self.playback.delay_to_play;
        if !delay.is_finite() || delay < 0.0 {
            return Err(SubtitleError::InvalidConfig(format!(
                "delay to play must be non-negative, got {delay}"
            )));
        }
        if let DwellFallback::Fixed(seconds) = self.playback.dwell_fallback {
            if !(seconds.is_finite() && seconds > 0.0) {
                return Err(SubtitleError::InvalidConfig(format!(
                    "fixed dwell must be positive, got {seconds}"
                )));
            }
        }
        Ok(())
    }

    /// Registry seeded with the preset name styles.
    pub fn name_registry(&self) -> NameStyleRegistry {
        self.names.iter().cloned().collect()
    }
}

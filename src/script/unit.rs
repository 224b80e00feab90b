use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SubtitleError, SubtitleResult};

pub const DEFAULT_LIST_NAME: &str = "List of Character Speech";

/// Reference to an external audio asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub id: String,
    /// Clip length in seconds.
    pub length: f32,
}

impl AudioClip {
    pub fn new(id: impl Into<String>, length: f32) -> Self {
        Self {
            id: id.into(),
            length,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    #[default]
    Advance,
    Stop,
}

type Handler = Rc<dyn Fn(&SpeechUnit)>;

/// Multi-subscriber callback list, invoked synchronously in registration order.
#[derive(Clone, Default)]
pub struct EventSink {
    handlers: Vec<Handler>,
}

impl EventSink {
    pub fn subscribe(&mut self, handler: impl Fn(&SpeechUnit) + 'static) {
        self.handlers.push(Rc::new(handler));
    }

    pub fn emit(&self, unit: &SpeechUnit) {
        for handler in &self.handlers {
            handler(unit);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// One displayable and audible dialogue beat.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpeechUnit {
    /// Raw speaker field, possibly `name<split>pose`.
    pub speaker_name: String,
    pub text: String,
    pub audio: Option<AudioClip>,
    /// Seconds until the next unit; only positive values count.
    pub explicit_duration: Option<f32>,
    pub next_action: NextAction,
    pub has_name: bool,
    pub has_text: bool,
    pub has_audio: bool,
    #[serde(skip)]
    pub on_start: EventSink,
    #[serde(skip)]
    pub on_end: EventSink,
}

impl SpeechUnit {
    pub fn new(speaker_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker_name: speaker_name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Text-only unit from a plain script line.
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            has_text: true,
            ..Self::default()
        }
    }

    /// Name shown to the player: the part before `split`, or the whole field.
    pub fn display_name(&self, split: Option<char>) -> &str {
        match split {
            Some(split) => self
                .speaker_name
                .split(split)
                .next()
                .unwrap_or(&self.speaker_name),
            None => &self.speaker_name,
        }
    }

    /// Pose id following the first `split` character, if any.
    pub fn pose(&self, split: char) -> Option<&str> {
        self.speaker_name
            .split_once(split)
            .map(|(_, pose)| pose)
            .filter(|pose| !pose.is_empty())
    }

    /// Time this unit stays active: explicit duration first, then clip length.
    pub fn dwell(&self) -> Option<Duration> {
        let explicit = self.explicit_duration.filter(|secs| *secs > 0.0);
        let clip = self
            .audio
            .as_ref()
            .map(|clip| clip.length)
            .filter(|secs| *secs > 0.0);
        explicit
            .or(clip)
            .and_then(|secs| Duration::try_from_secs_f32(secs).ok())
    }
}

/// Units produced from one script row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineGroup {
    pub label: String,
    pub audio: Option<AudioClip>,
    pub first: usize,
    pub len: usize,
}

impl LineGroup {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.first..self.first + self.len
    }
}

/// Ordered speech units plus their line grouping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Timeline {
    pub list_name: String,
    pub groups: Vec<LineGroup>,
    pub units: Vec<SpeechUnit>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            list_name: DEFAULT_LIST_NAME.to_string(),
            groups: Vec::new(),
            units: Vec::new(),
        }
    }
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SpeechUnit> {
        self.units.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SpeechUnit> {
        self.units.get_mut(index)
    }

    /// Empties the timeline and restores the default list name.
    pub fn clear(&mut self) {
        self.list_name = DEFAULT_LIST_NAME.to_string();
        self.groups.clear();
        self.units.clear();
    }

    pub fn group_units(&self, group: &LineGroup) -> &[SpeechUnit] {
        &self.units[group.range()]
    }

    /// Attaches `clip` to the 1-based `line`. Only the first unit of the
    /// group carries it.
    pub fn attach_audio(&mut self, line: usize, clip: AudioClip) -> SubtitleResult<()> {
        let group = line
            .checked_sub(1)
            .and_then(|idx| self.groups.get_mut(idx))
            .ok_or(SubtitleError::UnknownLine { line })?;
        group.audio = Some(clip.clone());
        let range = group.range();
        for (offset, unit) in self.units[range].iter_mut().enumerate() {
            unit.audio = (offset == 0).then(|| clip.clone());
        }
        Ok(())
    }

    /// Splits each line's clip length across its units in proportion to
    /// their text length. Returns how many lines were filled.
    pub fn estimate_durations(&mut self) -> usize {
        let mut filled = 0;
        for group in &self.groups {
            let Some(length) = group.audio.as_ref().map(|clip| clip.length) else {
                continue;
            };
            if length <= 0.0 {
                continue;
            }
            let units = &mut self.units[group.range()];
            let total: usize = units.iter().map(|unit| unit.text.chars().count()).sum();
            if total == 0 {
                continue;
            }
            for unit in units.iter_mut() {
                let chars = unit.text.chars().count().max(1);
                unit.explicit_duration = Some(chars as f32 / total as f32 * length);
            }
            filled += 1;
        }
        filled
    }

    pub fn to_json(&self) -> SubtitleResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| SubtitleError::Serialization(err.to_string()))
    }
}

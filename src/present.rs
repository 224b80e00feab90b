//! Presentation collaborators and the per-feature presentation steps.

use crate::config::{ImageSlotConfig, PresentationConfig, ScaleMode};
use crate::flags::FeatureFlags;
use crate::names::NameStyleRegistry;
use crate::script::{AudioClip, SpeechUnit};

/// Opaque sprite reference handed out by a [`SpriteResolver`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub String);

/// Container that shows or hides the whole dialogue presentation.
pub trait Surface {
    fn set_visible(&mut self, visible: bool);
}

/// Typewriter collaborator: receives the full string and a per-letter delay.
pub trait TextPresenter {
    fn type_text(&mut self, text: &str, letter_delay: f32);
}

pub trait NameDisplay {
    fn set_text(&mut self, text: &str);
}

pub trait ImageSlot {
    fn set_sprite(&mut self, sprite: Option<&SpriteHandle>);
    fn set_active(&mut self, active: bool);
    fn apply_native_size(&mut self, mode: ScaleMode, factor: f32);
}

pub trait AudioPlayer {
    fn play_one_shot(&mut self, clip: &AudioClip);
    fn stop(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
}

/// Looks up portrait and pose sprites by name.
pub trait SpriteResolver {
    fn resolve(&self, name: &str) -> Option<SpriteHandle>;
}

/// No-op collaborator used for headless playback.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Surface for Silent {
    fn set_visible(&mut self, _visible: bool) {}
}

impl TextPresenter for Silent {
    fn type_text(&mut self, _text: &str, _letter_delay: f32) {}
}

impl NameDisplay for Silent {
    fn set_text(&mut self, _text: &str) {}
}

impl ImageSlot for Silent {
    fn set_sprite(&mut self, _sprite: Option<&SpriteHandle>) {}
    fn set_active(&mut self, _active: bool) {}
    fn apply_native_size(&mut self, _mode: ScaleMode, _factor: f32) {}
}

impl AudioPlayer for Silent {
    fn play_one_shot(&mut self, _clip: &AudioClip) {}
    fn stop(&mut self) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
}

impl SpriteResolver for Silent {
    fn resolve(&self, _name: &str) -> Option<SpriteHandle> {
        None
    }
}

/// Every collaborator a session presents through.
pub struct Stage {
    pub surface: Box<dyn Surface>,
    pub text: Box<dyn TextPresenter>,
    pub name: Box<dyn NameDisplay>,
    pub portrait: Box<dyn ImageSlot>,
    pub pose: Box<dyn ImageSlot>,
    pub audio: Box<dyn AudioPlayer>,
    pub sprites: Box<dyn SpriteResolver>,
}

impl Stage {
    /// Stage whose collaborators all discard their input.
    pub fn headless() -> Self {
        Self {
            surface: Box::new(Silent),
            text: Box::new(Silent),
            name: Box::new(Silent),
            portrait: Box::new(Silent),
            pose: Box::new(Silent),
            audio: Box::new(Silent),
            sprites: Box::new(Silent),
        }
    }

    pub fn with_surface(mut self, surface: impl Surface + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    pub fn with_text(mut self, text: impl TextPresenter + 'static) -> Self {
        self.text = Box::new(text);
        self
    }

    pub fn with_name(mut self, name: impl NameDisplay + 'static) -> Self {
        self.name = Box::new(name);
        self
    }

    pub fn with_portrait(mut self, portrait: impl ImageSlot + 'static) -> Self {
        self.portrait = Box::new(portrait);
        self
    }

    pub fn with_pose(mut self, pose: impl ImageSlot + 'static) -> Self {
        self.pose = Box::new(pose);
        self
    }

    pub fn with_audio(mut self, audio: impl AudioPlayer + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn with_sprites(mut self, sprites: impl SpriteResolver + 'static) -> Self {
        self.sprites = Box::new(sprites);
        self
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::headless()
    }
}

/// Read-only inputs shared by every presentation step.
pub(crate) struct PresentContext<'a> {
    pub features: FeatureFlags,
    pub config: &'a PresentationConfig,
    pub split_character: char,
    pub names: &'a NameStyleRegistry,
}

impl PresentContext<'_> {
    fn pose_split(&self) -> Option<char> {
        self.features
            .contains(FeatureFlags::CHARACTER_POSE)
            .then_some(self.split_character)
    }

    fn styled_name(&self, unit: &SpeechUnit) -> String {
        self.names.resolve(unit.display_name(self.pose_split()))
    }
}

type Step = fn(&mut Stage, &PresentContext<'_>, &SpeechUnit);

/// Presentation steps in the order they run, keyed by the feature that
/// enables them.
const PRESENTATION_STEPS: [(FeatureFlags, Step); 5] = [
    (FeatureFlags::SUBTITLE, present_text),
    (FeatureFlags::NAME, present_name),
    (FeatureFlags::PORTRAIT, present_portrait),
    (FeatureFlags::CHARACTER_POSE, present_pose),
    (FeatureFlags::AUDIO, present_audio),
];

/// Runs every enabled presentation step for `unit`.
pub(crate) fn present(stage: &mut Stage, ctx: &PresentContext<'_>, unit: &SpeechUnit) {
    for (feature, step) in PRESENTATION_STEPS {
        if ctx.features.contains(feature) {
            step(stage, ctx, unit);
        }
    }
}

fn present_text(stage: &mut Stage, ctx: &PresentContext<'_>, unit: &SpeechUnit) {
    let delay = if ctx.features.contains(FeatureFlags::TYPEWRITER) {
        ctx.config.typewriter_delay
    } else {
        0.0
    };
    if ctx.config.has_text_box || unit.speaker_name.is_empty() {
        stage.text.type_text(&unit.text, delay);
    } else {
        let line = format!("{}: {}", ctx.styled_name(unit), unit.text);
        stage.text.type_text(&line, delay);
    }
}

fn present_name(stage: &mut Stage, ctx: &PresentContext<'_>, unit: &SpeechUnit) {
    if !ctx.config.has_text_box {
        return;
    }
    if unit.speaker_name.is_empty() {
        stage.name.set_text("");
    } else {
        stage.name.set_text(&ctx.styled_name(unit));
    }
}

fn present_portrait(stage: &mut Stage, ctx: &PresentContext<'_>, unit: &SpeechUnit) {
    let sprite = stage.sprites.resolve(unit.display_name(ctx.pose_split()));
    show_sprite(stage.portrait.as_mut(), sprite, &ctx.config.portrait);
}

fn present_pose(stage: &mut Stage, ctx: &PresentContext<'_>, unit: &SpeechUnit) {
    let sprite = stage.sprites.resolve(&unit.speaker_name);
    show_sprite(stage.pose.as_mut(), sprite, &ctx.config.pose);
}

fn present_audio(stage: &mut Stage, _ctx: &PresentContext<'_>, unit: &SpeechUnit) {
    if let Some(clip) = &unit.audio {
        stage.audio.play_one_shot(clip);
    }
}

fn show_sprite(slot: &mut dyn ImageSlot, sprite: Option<SpriteHandle>, config: &ImageSlotConfig) {
    slot.set_sprite(sprite.as_ref());
    slot.set_active(sprite.is_some());
    if config.native_size {
        slot.apply_native_size(config.scale, config.factor);
    }
}

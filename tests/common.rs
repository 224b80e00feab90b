use std::cell::RefCell;
use std::rc::Rc;

use subtitle_engine::{
    AudioClip, AudioPlayer, ImageSlot, NameDisplay, ScaleMode, SpriteHandle, SpriteResolver,
    Stage, Surface, TextPresenter,
};

/// One observed collaborator call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Visible(bool),
    Typed { text: String, delay: f32 },
    Name(String),
    Sprite { slot: &'static str, sprite: Option<String> },
    Active { slot: &'static str, active: bool },
    NativeSize { slot: &'static str, mode: ScaleMode, factor: f32 },
    Play(String),
    AudioStop,
    AudioPause,
    AudioResume,
}

type CallLog = Rc<RefCell<Vec<Call>>>;

/// Shared call log behind every recording collaborator.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: CallLog,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    /// Stage recording every call; `sprites` lists the names that resolve.
    pub fn stage(&self, sprites: &[&str]) -> Stage {
        Stage::headless()
            .with_surface(self.clone())
            .with_text(self.clone())
            .with_name(self.clone())
            .with_audio(self.clone())
            .with_portrait(SlotRecorder {
                slot: "portrait",
                log: self.clone(),
            })
            .with_pose(SlotRecorder {
                slot: "pose",
                log: self.clone(),
            })
            .with_sprites(KnownSprites(
                sprites.iter().map(|name| name.to_string()).collect(),
            ))
    }
}

impl Surface for Recorder {
    fn set_visible(&mut self, visible: bool) {
        self.push(Call::Visible(visible));
    }
}

impl TextPresenter for Recorder {
    fn type_text(&mut self, text: &str, letter_delay: f32) {
        self.push(Call::Typed {
            text: text.to_string(),
            delay: letter_delay,
        });
    }
}

impl NameDisplay for Recorder {
    fn set_text(&mut self, text: &str) {
        self.push(Call::Name(text.to_string()));
    }
}

impl AudioPlayer for Recorder {
    fn play_one_shot(&mut self, clip: &AudioClip) {
        self.push(Call::Play(clip.id.clone()));
    }

    fn stop(&mut self) {
        self.push(Call::AudioStop);
    }

    fn pause(&mut self) {
        self.push(Call::AudioPause);
    }

    fn resume(&mut self) {
        self.push(Call::AudioResume);
    }
}

pub struct SlotRecorder {
    slot: &'static str,
    log: Recorder,
}

impl ImageSlot for SlotRecorder {
    fn set_sprite(&mut self, sprite: Option<&SpriteHandle>) {
        self.log.push(Call::Sprite {
            slot: self.slot,
            sprite: sprite.map(|handle| handle.0.clone()),
        });
    }

    fn set_active(&mut self, active: bool) {
        self.log.push(Call::Active {
            slot: self.slot,
            active,
        });
    }

    fn apply_native_size(&mut self, mode: ScaleMode, factor: f32) {
        self.log.push(Call::NativeSize {
            slot: self.slot,
            mode,
            factor,
        });
    }
}

pub struct KnownSprites(Vec<String>);

impl SpriteResolver for KnownSprites {
    fn resolve(&self, name: &str) -> Option<SpriteHandle> {
        self.0
            .iter()
            .find(|known| known.as_str() == name)
            .map(|known| SpriteHandle(known.clone()))
    }
}

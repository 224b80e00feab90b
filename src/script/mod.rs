//! Script sources and their compilation into speech timelines.

mod compile;
mod unit;

use std::fs;
use std::path::Path;

use crate::config::SubtitleConfig;
use crate::error::{SubtitleError, SubtitleResult};
use crate::names::NameStyleRegistry;
use crate::parser::parse_rows;

pub use compile::compile;
pub use unit::{
    AudioClip, EventSink, LineGroup, NextAction, SpeechUnit, Timeline, DEFAULT_LIST_NAME,
};

/// A named blob of script text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptSource {
    pub name: String,
    pub text: String,
}

impl ScriptSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Reads a script file, naming the source after the file stem.
    pub fn from_path(path: &Path) -> SubtitleResult<Self> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let text = fs::read_to_string(path).map_err(|err| SubtitleError::SourceUnreadable {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        Ok(Self { name, text })
    }

    /// Parses and compiles the source with `config`.
    pub fn compile(
        &self,
        config: &SubtitleConfig,
        registry: &mut NameStyleRegistry,
    ) -> Timeline {
        let rows = parse_rows(&self.text, config.script.delimiter);
        compile(&self.name, &rows, &config.script, config.features, registry)
    }
}

#[cfg(test)]
#[path = "tests/compile_tests.rs"]
mod tests;

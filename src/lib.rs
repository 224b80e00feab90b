mod config;
mod error;
mod flags;
mod names;
mod paginate;
mod parser;
mod present;
mod schedule;
mod script;
mod session;

pub use config::{
    DwellFallback, ImageSlotConfig, PlaybackConfig, PresentationConfig, ScaleMode, ScriptConfig,
    SubtitleConfig,
};
pub use error::{SubtitleError, SubtitleResult};
pub use flags::FeatureFlags;
pub use names::{Emphasis, NameStyle, NameStyleRegistry, Rgba};
pub use paginate::{paginate, BreakPolicy, Pages};
pub use parser::{parse_rows, Row};
pub use present::{
    AudioPlayer, ImageSlot, NameDisplay, Silent, SpriteHandle, SpriteResolver, Stage, Surface,
    TextPresenter,
};
pub use schedule::{FiredTimer, Scheduler, TimerAction, TimerHandle};
pub use script::{
    compile, AudioClip, EventSink, LineGroup, NextAction, ScriptSource, SpeechUnit, Timeline,
    DEFAULT_LIST_NAME,
};
pub use session::{Cursor, PlaybackState, Session, FINAL_DELAY};

#[cfg(any(feature = "python", feature = "python-embed"))]
use pyo3::prelude::*;

#[cfg(any(feature = "python", feature = "python-embed"))]
fn subtitle_error_to_py(err: SubtitleError) -> pyo3::PyErr {
    let report = miette::Report::new(err);
    pyo3::exceptions::PyValueError::new_err(report.to_string())
}

/// Compiles script text into a JSON timeline.
#[cfg(any(feature = "python", feature = "python-embed"))]
#[pyfunction]
#[pyo3(signature = (text, name = "script", config_toml = None))]
fn compile_to_json(text: &str, name: &str, config_toml: Option<&str>) -> PyResult<String> {
    let config = match config_toml {
        Some(raw) => SubtitleConfig::from_toml_str(raw).map_err(subtitle_error_to_py)?,
        None => SubtitleConfig::default(),
    };
    let mut names = config.name_registry();
    let timeline = ScriptSource::new(name, text).compile(&config, &mut names);
    timeline.to_json().map_err(subtitle_error_to_py)
}

#[cfg(any(feature = "python", feature = "python-embed"))]
#[pymodule]
fn subtitle_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compile_to_json, m)?)?;
    Ok(())
}

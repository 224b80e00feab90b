use tracing::{debug, info, instrument};

use crate::config::ScriptConfig;
use crate::flags::FeatureFlags;
use crate::names::NameStyleRegistry;
use crate::paginate::paginate;
use crate::parser::Row;

use super::unit::{LineGroup, NextAction, SpeechUnit, Timeline};

/// Compiles parsed rows into a timeline, registering new speaker names.
///
/// Rows with a single field are plain narration lines. Every other row is
/// read through the configured name and text indices; missing fields read as
/// empty. Text is trimmed on both kinds of row. The last produced unit always
/// stops playback.
#[instrument(skip(rows, config, registry), fields(rows = rows.len()))]
pub fn compile(
    list_name: &str,
    rows: &[Row],
    config: &ScriptConfig,
    features: FeatureFlags,
    registry: &mut NameStyleRegistry,
) -> Timeline {
    let mut timeline = Timeline {
        list_name: list_name.to_string(),
        ..Timeline::default()
    };
    let pose_split = features
        .contains(FeatureFlags::CHARACTER_POSE)
        .then_some(config.split_character);

    for row in rows {
        let first = timeline.units.len();
        if row.len() <= 1 {
            let text = row.first().map(String::as_str).unwrap_or_default();
            push_pages(&mut timeline.units, text, config, |page| {
                SpeechUnit::narration(page)
            });
        } else {
            let speaker = field(row, config.name_index);
            let text = field(row, config.text_index).trim();
            let unit = SpeechUnit::new(speaker, text);
            let display_name = unit.display_name(pose_split);
            if !display_name.is_empty() && registry.register(display_name) {
                debug!(speaker = display_name, "registered speaker");
            }
            if exceeds_limit(text, config.max_characters) {
                push_pages(&mut timeline.units, text, config, |page| {
                    SpeechUnit::new(speaker, page)
                });
            } else {
                timeline.units.push(unit);
            }
            for unit in &mut timeline.units[first..] {
                apply_features(unit, features);
            }
        }

        let len = timeline.units.len() - first;
        if len > 0 {
            let label = format!("Line {}", timeline.groups.len() + 1);
            debug!(line = %label, units = len, "compiled line");
            timeline.groups.push(LineGroup {
                label,
                audio: None,
                first,
                len,
            });
        }
    }

    if let Some(last) = timeline.units.last_mut() {
        last.next_action = NextAction::Stop;
    }
    info!(
        list = %timeline.list_name,
        units = timeline.units.len(),
        lines = timeline.groups.len(),
        "script compiled"
    );
    timeline
}

fn field(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or_default()
}

fn exceeds_limit(text: &str, max_characters: usize) -> bool {
    max_characters > 0 && text.chars().count() > max_characters
}

fn push_pages(
    units: &mut Vec<SpeechUnit>,
    text: &str,
    config: &ScriptConfig,
    make: impl Fn(&str) -> SpeechUnit,
) {
    let limit = if exceeds_limit(text, config.max_characters) {
        config.max_characters
    } else {
        0
    };
    units.extend(paginate(text, limit, config.break_policy).map(make));
}

fn apply_features(unit: &mut SpeechUnit, features: FeatureFlags) {
    unit.has_text = features.contains(FeatureFlags::SUBTITLE);
    unit.has_name = features
        .intersects(FeatureFlags::NAME | FeatureFlags::PORTRAIT | FeatureFlags::CHARACTER_POSE);
    unit.has_audio = features.contains(FeatureFlags::AUDIO);
}

use super::*;
use crate::config::ScriptConfig;
use crate::flags::FeatureFlags;

fn script_config(max_characters: usize) -> ScriptConfig {
    ScriptConfig {
        max_characters,
        ..ScriptConfig::default()
    }
}

fn compile_text(text: &str, max_characters: usize, features: FeatureFlags) -> Timeline {
    let rows = parse_rows(text, ';');
    let mut registry = NameStyleRegistry::new();
    compile("test", &rows, &script_config(max_characters), features, &mut registry)
}

#[test]
fn single_row_becomes_single_stopping_unit() {
    let timeline = compile_text("Alice;Hello world", 100, FeatureFlags::SUBTITLE);
    assert_eq!(timeline.len(), 1);
    let unit = &timeline.units[0];
    assert_eq!(unit.speaker_name, "Alice");
    assert_eq!(unit.text, "Hello world");
    assert_eq!(unit.next_action, NextAction::Stop);
    assert_eq!(timeline.groups[0].label, "Line 1");
    assert_eq!(timeline.list_name, "test");
}

#[test]
fn overlong_row_is_paginated_into_one_group() {
    let script = format!("Bob;{}\nAlice;Short", "x".repeat(250));
    let timeline = compile_text(&script, 100, FeatureFlags::SUBTITLE);
    assert_eq!(timeline.len(), 4);
    assert_eq!(timeline.groups.len(), 2);
    assert_eq!(timeline.groups[0].range(), 0..3);
    for unit in timeline.group_units(&timeline.groups[0]) {
        assert_eq!(unit.speaker_name, "Bob");
        assert!(unit.text.chars().count() <= 100);
        assert_eq!(unit.next_action, NextAction::Advance);
    }
    assert_eq!(timeline.units[3].next_action, NextAction::Stop);
}

#[test]
fn only_first_page_keeps_line_audio() {
    let script = format!("Bob;{}", "word ".repeat(60));
    let mut timeline = compile_text(&script, 100, FeatureFlags::SUBTITLE | FeatureFlags::AUDIO);
    assert!(timeline.len() > 1);

    timeline
        .attach_audio(1, AudioClip::new("bob_01", 12.0))
        .unwrap();

    let carrying: Vec<_> = timeline
        .units
        .iter()
        .enumerate()
        .filter(|(_, unit)| unit.audio.is_some())
        .map(|(idx, _)| idx)
        .collect();
    assert_eq!(carrying, vec![0]);
    assert_eq!(timeline.groups[0].audio.as_ref().unwrap().id, "bob_01");
}

#[test]
fn attach_audio_rejects_unknown_line() {
    let mut timeline = compile_text("Alice;Hi", 100, FeatureFlags::SUBTITLE);
    assert_eq!(
        timeline.attach_audio(2, AudioClip::new("missing", 1.0)),
        Err(SubtitleError::UnknownLine { line: 2 })
    );
    assert_eq!(
        timeline.attach_audio(0, AudioClip::new("missing", 1.0)),
        Err(SubtitleError::UnknownLine { line: 0 })
    );
}

#[test]
fn derived_flags_follow_features_not_content() {
    let timeline = compile_text(";", 100, FeatureFlags::PORTRAIT | FeatureFlags::AUDIO);
    let unit = &timeline.units[0];
    assert!(unit.has_name);
    assert!(unit.has_audio);
    assert!(!unit.has_text);
    assert!(unit.text.is_empty());
}

#[test]
fn pose_suffix_is_not_registered_as_a_name() {
    let rows = parse_rows("Alice.happy;Hi\nAlice.sad;Oh\nBob;Hey", ';');
    let mut registry = NameStyleRegistry::new();
    compile(
        "poses",
        &rows,
        &script_config(100),
        FeatureFlags::NAME | FeatureFlags::CHARACTER_POSE,
        &mut registry,
    );
    let names: Vec<_> = registry.iter().map(|style| style.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
}

#[test]
fn without_pose_feature_full_speaker_is_registered() {
    let rows = parse_rows("Alice.happy;Hi", ';');
    let mut registry = NameStyleRegistry::new();
    compile("poses", &rows, &script_config(100), FeatureFlags::NAME, &mut registry);
    assert!(registry.get("Alice.happy").is_some());
}

#[test]
fn plain_lines_become_text_only_units() {
    let script = format!("Once upon a time.\n\n   \n{}", "long ".repeat(30));
    let timeline = compile_text(&script, 40, FeatureFlags::SUBTITLE | FeatureFlags::NAME);
    assert_eq!(timeline.units[0].text, "Once upon a time.");
    assert!(timeline.units.iter().all(|unit| unit.has_text && !unit.has_name));
    assert!(timeline.units.iter().all(|unit| unit.speaker_name.is_empty()));
    assert_eq!(timeline.groups.len(), 2);
    assert_eq!(timeline.groups[1].len, timeline.len() - 1);
    assert_eq!(timeline.units.last().unwrap().next_action, NextAction::Stop);
}

#[test]
fn custom_field_indices_are_honoured() {
    let rows = parse_rows("42|Hello there|Carol", '|');
    let config = ScriptConfig {
        delimiter: '|',
        name_index: 2,
        text_index: 1,
        ..script_config(100)
    };
    let mut registry = NameStyleRegistry::new();
    let timeline = compile("fields", &rows, &config, FeatureFlags::SUBTITLE, &mut registry);
    assert_eq!(timeline.units[0].speaker_name, "Carol");
    assert_eq!(timeline.units[0].text, "Hello there");
}

#[test]
fn empty_script_produces_empty_timeline() {
    let timeline = compile_text("", 100, FeatureFlags::SUBTITLE);
    assert!(timeline.is_empty());
    assert!(timeline.groups.is_empty());
}

#[test]
fn estimate_durations_splits_clip_by_text_length() {
    let script = "Ann;aaaa bbbb cccc dddd\nBen;No audio here";
    let rows = parse_rows(script, ';');
    let mut registry = NameStyleRegistry::new();
    let mut timeline = compile("estimate", &rows, &script_config(10), FeatureFlags::SUBTITLE, &mut registry);
    assert_eq!(timeline.groups[0].len, 2);
    timeline.attach_audio(1, AudioClip::new("ann", 8.0)).unwrap();

    assert_eq!(timeline.estimate_durations(), 1);

    let first = timeline.units[0].explicit_duration.unwrap();
    let second = timeline.units[1].explicit_duration.unwrap();
    assert!((first - 4.0).abs() < 1e-4);
    assert!((second - 4.0).abs() < 1e-4);
    assert!(timeline.units[2].explicit_duration.is_none());
}

#[test]
fn clear_restores_default_list_name() {
    let mut timeline = compile_text("Alice;Hi", 100, FeatureFlags::SUBTITLE);
    timeline.clear();
    assert!(timeline.is_empty());
    assert_eq!(timeline.list_name, DEFAULT_LIST_NAME);
}

#[test]
fn source_from_missing_path_is_unreadable() {
    let err = ScriptSource::from_path(Path::new("/definitely/not/here.csv")).unwrap_err();
    assert!(matches!(err, SubtitleError::SourceUnreadable { ref name, .. } if name == "here"));
}

#[test]
fn dwell_prefers_explicit_duration_then_audio() {
    let mut unit = SpeechUnit::new("A", "B");
    assert_eq!(unit.dwell(), None);
    unit.audio = Some(AudioClip::new("clip", 2.0));
    assert_eq!(unit.dwell(), Some(std::time::Duration::from_secs(2)));
    unit.explicit_duration = Some(0.0);
    assert_eq!(unit.dwell(), Some(std::time::Duration::from_secs(2)));
    unit.explicit_duration = Some(0.5);
    assert_eq!(unit.dwell(), Some(std::time::Duration::from_millis(500)));
}

#[test]
fn event_sinks_fire_in_registration_order() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut unit = SpeechUnit::new("A", "B");
    for tag in ["first", "second"] {
        let calls = Rc::clone(&calls);
        unit.on_start.subscribe(move |_| calls.borrow_mut().push(tag));
    }
    unit.on_start.emit(&unit);
    assert_eq!(*calls.borrow(), vec!["first", "second"]);
}

#[test]
fn named_and_plain_rows_are_trimmed_alike() {
    let timeline = compile_text("Alice;  Hello there  \n  Quiet night.  ", 100, FeatureFlags::SUBTITLE);
    assert_eq!(timeline.units[0].text, "Hello there");
    assert_eq!(timeline.units[1].text, "Quiet night.");
}

#[test]
fn speaker_registration_with_pose_compiles_and_logs() {
    let rows = parse_rows("Mira.sad;Late again", ';');
    let mut registry = NameStyleRegistry::new();
    let timeline = compile(
        "log",
        &rows,
        &script_config(100),
        FeatureFlags::NAME | FeatureFlags::CHARACTER_POSE,
        &mut registry,
    );
    assert_eq!(timeline.len(), 1);
    assert!(registry.get("Mira").is_some());
    assert!(registry.get("Mira.sad").is_none());
}

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use subtitle_engine::{
    paginate, BreakPolicy, DwellFallback, FeatureFlags, ScriptSource, Session, Stage,
    SubtitleConfig,
};

fn long_line(words: usize) -> String {
    (0..words)
        .map(|idx| format!("word{idx}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn long_script(lines: usize) -> String {
    (0..lines)
        .map(|idx| format!("Speaker{}.pose;{}", idx % 7, long_line(40)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_paginate(c: &mut Criterion) {
    let text = long_line(2_000);
    let mut group = c.benchmark_group("paginate");
    for policy in [BreakPolicy::Whitespace, BreakPolicy::Sentence] {
        group.bench_function(format!("{policy:?}"), |b| {
            b.iter(|| paginate(&text, 100, policy).count())
        });
    }
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let source = ScriptSource::new("bench", long_script(500));
    let config = SubtitleConfig {
        features: FeatureFlags::SUBTITLE | FeatureFlags::NAME | FeatureFlags::CHARACTER_POSE,
        ..SubtitleConfig::default()
    };
    c.bench_function("compile_script", |b| {
        b.iter(|| {
            let mut names = config.name_registry();
            source.compile(&config, &mut names)
        })
    });
}

fn bench_playback(c: &mut Criterion) {
    let mut config = SubtitleConfig::default();
    config.playback.dwell_fallback = DwellFallback::Fixed(0.5);
    let source = ScriptSource::new("bench", long_script(100));
    c.bench_function("play_to_end", |b| {
        b.iter_batched(
            || {
                let mut session = Session::new(config.clone(), Stage::headless())
                    .with_source(source.clone());
                session.compile_script().expect("compile");
                session
            },
            |mut session| {
                session.start().expect("start");
                while session.pending_delay().is_some() {
                    session
                        .update(std::time::Duration::from_millis(500))
                        .expect("update");
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(pagination_benches, bench_paginate, bench_compile, bench_playback);
criterion_main!(pagination_benches);

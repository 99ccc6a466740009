use super::*;

/// Amplitude source returning a fixed level until `end`.
#[derive(Default)]
struct ScriptedAmp {
    level: f64,
    end: Option<f64>,
    starts: usize,
}

impl AmplitudeSource for ScriptedAmp {
    fn start(&mut self, clip: SpeechClip, now: f64) {
        self.starts += 1;
        self.end = Some(now + clip.duration_sec());
    }

    fn stop(&mut self) {
        self.end = None;
    }

    fn has_ended(&self, now: f64) -> bool {
        self.end.is_none_or(|e| now >= e)
    }

    fn band_level(&mut self, _now: f64, _bins: Range<usize>) -> f64 {
        self.level
    }
}

fn refs(prefix: &str, n: usize) -> Vec<ImageRef> {
    (0..n).map(|i| ImageRef::new(format!("{prefix}{i}"))).collect()
}

fn engine() -> LipSyncEngine<ScriptedAmp, StdRng> {
    LipSyncEngine::with_rng(
        PlaybackOpts::default(),
        ScriptedAmp::default(),
        StdRng::seed_from_u64(7),
    )
    .unwrap()
}

fn actions() -> ActionFrames {
    ActionFrames {
        idle: refs("idle", 3),
        blink: refs("blink", 3),
        talking: refs("talk", 5),
    }
}

fn clip(secs: f64) -> SpeechClip {
    SpeechClip::new(1000, vec![0.0; (secs * 1000.0) as usize]).unwrap()
}

#[test]
fn first_blink_is_armed_within_jitter_window() {
    let mut e = engine();
    e.set_actions(actions(), 10.0);
    let d = e.state().blink_deadline;
    assert!((13.0..18.0).contains(&d), "deadline {d}");
    assert_eq!(e.mode(), PlaybackMode::Idle);
}

#[test]
fn idle_loops_at_idle_cadence() {
    let mut e = engine();
    e.set_actions(
        ActionFrames {
            blink: Vec::new(),
            ..actions()
        },
        0.0,
    );
    e.tick(0.1);
    assert_eq!(e.state().frame_index, 0);
    e.tick(0.25);
    assert_eq!(e.state().frame_index, 1);
    e.tick(0.5);
    e.tick(0.75);
    assert_eq!(e.state().frame_index, 0);
    assert_eq!(e.current_frame().map(|f| f.as_str()), Some("idle0"));
}

#[test]
fn blink_triggers_at_deadline_never_before() {
    let mut e = engine();
    e.set_actions(actions(), 0.0);
    let t = e.state().blink_deadline;
    assert_eq!(e.tick(t - 1e-6), PlaybackMode::Idle);
    assert_eq!(e.tick(t), PlaybackMode::Blinking);
    assert_eq!(e.state().frame_index, 0);
    assert_eq!(e.current_frame().map(|f| f.as_str()), Some("blink0"));
}

#[test]
fn blink_plays_once_then_rearms() {
    let mut e = engine();
    e.set_actions(actions(), 0.0);
    let t = e.state().blink_deadline;
    e.tick(t);
    let step = 1.0 / 12.0 + 1e-6;
    e.tick(t + step);
    assert_eq!(e.state().frame_index, 1);
    e.tick(t + 2.0 * step);
    assert_eq!(e.state().frame_index, 2);
    assert_eq!(e.mode(), PlaybackMode::Blinking);
    // Last frame held for one cadence, then back to idle.
    let end = t + 3.0 * step;
    e.tick(end);
    assert_eq!(e.mode(), PlaybackMode::Idle);
    assert_eq!(e.state().frame_index, 0);
    let next = e.state().blink_deadline - end;
    assert!((2.0 - 1e-9..6.0).contains(&next), "re-arm {next}");
}

#[test]
fn speech_preempts_blink_within_one_tick() {
    let mut e = engine();
    e.set_actions(actions(), 0.0);
    let t = e.state().blink_deadline;
    e.tick(t);
    assert_eq!(e.mode(), PlaybackMode::Blinking);

    e.speak(clip(1.0), t + 0.01);
    assert_eq!(e.tick(t + 0.02), PlaybackMode::Talking);
    assert_eq!(e.state().frame_index, 0);
}

#[test]
fn talking_smooths_with_asymmetric_attack_and_decay() {
    let mut e = engine();
    e.set_actions(actions(), 0.0);
    e.speak(clip(5.0), 0.0);

    e.amp.level = 100.0;
    e.tick(0.016);
    assert!((e.state().volume - 60.0).abs() < 1e-9);
    e.tick(0.032);
    assert!((e.state().volume - 84.0).abs() < 1e-9);

    e.amp.level = 0.0;
    e.tick(0.048);
    assert!((e.state().volume - 67.2).abs() < 1e-9);
}

#[test]
fn mouth_index_maps_dead_zone_and_full_scale() {
    let e = engine();
    assert_eq!(e.mouth_index(5.0, 5), 0);
    assert_eq!(e.mouth_index(10.0, 5), 1);
    assert_eq!(e.mouth_index(38.0, 5), 2);
    assert_eq!(e.mouth_index(120.0, 5), 4);
    assert_eq!(e.mouth_index(250.0, 5), 4);
    assert_eq!(e.mouth_index(250.0, 1), 0);
}

#[test]
fn completion_returns_to_idle_and_resets() {
    let mut e = engine();
    e.set_actions(actions(), 0.0);
    e.speak(clip(0.5), 1.0);
    e.amp.level = 200.0;
    e.tick(1.1);
    assert!(e.state().frame_index > 0);

    assert_eq!(e.tick(1.5), PlaybackMode::Idle);
    assert_eq!(e.state().frame_index, 0);
    assert_eq!(e.state().volume, 0.0);
    assert_eq!(e.amp.starts, 1);
}

#[test]
fn stop_speaking_ends_talking_on_next_tick() {
    let mut e = engine();
    e.set_actions(actions(), 0.0);
    e.speak(clip(10.0), 0.0);
    e.tick(0.1);
    e.stop_speaking();
    assert_eq!(e.tick(0.2), PlaybackMode::Idle);
}

#[test]
fn set_actions_resets_talking_state() {
    let mut e = engine();
    e.set_actions(actions(), 0.0);
    e.speak(clip(10.0), 0.0);
    e.amp.level = 200.0;
    e.tick(0.1);
    e.set_actions(actions(), 0.2);
    assert_eq!(e.mode(), PlaybackMode::Idle);
    assert_eq!(e.state().volume, 0.0);
    assert!(e.amp.has_ended(0.3));
}

#[test]
fn actions_resolve_from_character_defaults() {
    let c = Character::from_json(
        r#"{"actions":[{"name":"Idle","frames":["i"]},{"name":"Talk","frames":["t0","t1"]},
            {"name":"Blink","frames":["b"]}]}"#,
    )
    .unwrap();
    let a = ActionFrames::from_character(&c, None, None, Some("Blink")).unwrap();
    assert_eq!(a.idle.len(), 1);
    assert_eq!(a.talking.len(), 2);
    assert_eq!(a.blink.len(), 1);
    assert!(ActionFrames::from_character(&c, Some("Nope"), None, None).is_err());
}

#[test]
fn invalid_options_are_rejected() {
    let opts = PlaybackOpts {
        blink_min_interval_sec: 5.0,
        blink_max_interval_sec: 1.0,
        ..PlaybackOpts::default()
    };
    assert!(LipSyncEngine::with_rng(opts, ScriptedAmp::default(), StdRng::seed_from_u64(1)).is_err());
}

use super::*;

fn sine(freq: f64, amp: f32, secs: f64) -> SpeechClip {
    let rate = 24_000;
    let n = (secs * f64::from(rate)) as usize;
    let samples = (0..n)
        .map(|i| amp * (2.0 * PI * freq * i as f64 / f64::from(rate)).sin() as f32)
        .collect();
    SpeechClip::new(rate, samples).unwrap()
}

#[test]
fn blackman_window_matches_web_audio_coefficients() {
    let w = blackman(256);
    assert!(w[0].abs() < 1e-12);
    assert!((w[128] - 1.0).abs() < 1e-12);
}

#[test]
fn silence_reads_zero() {
    let mut a = SpectrumAnalyser::default();
    a.start(SpeechClip::new(24_000, vec![0.0; 24_000]).unwrap(), 10.0);
    assert_eq!(a.band_level(10.5, 2..32), 0.0);
}

#[test]
fn tone_on_bin_reads_loud_after_smoothing_settles() {
    // 750 Hz at 24 kHz with N = 256 lands exactly on bin 8.
    let mut a = SpectrumAnalyser::default();
    a.start(sine(750.0, 0.5, 1.0), 0.0);
    let mut level = 0.0;
    for i in 0..20 {
        level = a.band_level(0.1 + f64::from(i) * 0.016, 8..9);
    }
    assert!(level > 200.0, "level {level}");
    let far = a.byte_frequency_data(0.5, 60..61);
    assert_eq!(far, vec![0]);
}

#[test]
fn completion_tracks_clip_duration() {
    let mut a = SpectrumAnalyser::default();
    assert!(a.has_ended(0.0));
    a.start(sine(300.0, 0.1, 0.5), 2.0);
    assert!(!a.has_ended(2.0));
    assert!(!a.has_ended(2.49));
    assert!(a.has_ended(2.5));
    a.stop();
    assert!(a.has_ended(2.1));
}

#[test]
fn restart_clears_smoothing_state() {
    let mut a = SpectrumAnalyser::default();
    a.start(sine(750.0, 0.5, 1.0), 0.0);
    for i in 0..10 {
        a.band_level(0.1 + f64::from(i) * 0.02, 8..9);
    }
    a.start(SpeechClip::new(24_000, vec![0.0; 24_000]).unwrap(), 5.0);
    assert_eq!(a.band_level(5.5, 8..9), 0.0);
}

#[test]
fn out_of_range_bins_are_clamped() {
    let mut a = SpectrumAnalyser::default();
    assert_eq!(a.bin_count(), 128);
    assert!(a.byte_frequency_data(0.0, 120..400).len() == 8);
    assert_eq!(a.band_level(0.0, 200..300), 0.0);
}

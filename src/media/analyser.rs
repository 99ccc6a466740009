//! Frequency-domain loudness of a playing speech clip.
//!
//! [`SpectrumAnalyser`] mirrors the Web Audio `AnalyserNode` byte spectrum: the most recent
//! `fft_size` samples are Blackman-windowed, transformed, scaled by `1/N`, smoothed over time,
//! converted to decibels and mapped linearly from `[min_db, max_db]` onto `0..=255`.

use std::f64::consts::PI;
use std::ops::Range;

use crate::media::audio::SpeechClip;

/// Source of per-tick amplitude readings for the lip-sync engine.
///
/// A source is owned by one engine and reused across utterances; [`AmplitudeSource::start`]
/// clears any state left from the previous clip.
pub trait AmplitudeSource {
    /// Begin playing `clip` at clock time `now` (seconds), resetting internal buffers.
    fn start(&mut self, clip: SpeechClip, now: f64);

    /// Stop playback immediately.
    fn stop(&mut self);

    /// `true` once the clip started by the last `start` has fully played at time `now`, or when
    /// nothing is playing.
    fn has_ended(&self, now: f64) -> bool;

    /// Mean byte-scaled magnitude (`0.0..=255.0`) over `bins` at time `now`.
    fn band_level(&mut self, now: f64, bins: Range<usize>) -> f64;
}

/// Analyser parameters; defaults match the Web Audio analyser node.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalyserOpts {
    /// Transform size in samples (power of two).
    pub fft_size: usize,
    /// Temporal smoothing factor in `[0, 1)`.
    pub smoothing: f64,
    /// Decibel value mapped to byte 0.
    pub min_db: f64,
    /// Decibel value mapped to byte 255.
    pub max_db: f64,
}

impl Default for AnalyserOpts {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

/// Web Audio style analyser over an in-memory speech clip.
#[derive(Clone, Debug)]
pub struct SpectrumAnalyser {
    opts: AnalyserOpts,
    window: Vec<f64>,
    smoothed: Vec<f64>,
    clip: Option<SpeechClip>,
    started_at: f64,
}

impl SpectrumAnalyser {
    /// Idle analyser; call [`AmplitudeSource::start`] to feed it a clip.
    pub fn new(opts: AnalyserOpts) -> Self {
        let n = opts.fft_size.max(2);
        Self {
            opts,
            window: blackman(n),
            smoothed: vec![0.0; n / 2],
            clip: None,
            started_at: 0.0,
        }
    }

    /// Number of frequency bins (`fft_size / 2`).
    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Byte spectrum for `bins` at time `now`, updating the smoothing state of those bins.
    pub fn byte_frequency_data(&mut self, now: f64, bins: Range<usize>) -> Vec<u8> {
        let bins = bins.start.min(self.bin_count())..bins.end.min(self.bin_count());
        let block = self.time_block(now);
        let n = self.window.len();
        let tau = self.opts.smoothing.clamp(0.0, 0.999);
        let range = self.opts.max_db - self.opts.min_db;

        bins.map(|k| {
            let mag = dft_magnitude(&block, &self.window, k) / n as f64;
            let s = tau * self.smoothed[k] + (1.0 - tau) * mag;
            self.smoothed[k] = s;
            let db = if s > 0.0 { 20.0 * s.log10() } else { f64::NEG_INFINITY };
            let scaled = (255.0 / range) * (db - self.opts.min_db);
            scaled.clamp(0.0, 255.0).floor() as u8
        })
        .collect()
    }

    /// The `fft_size` samples ending at the playback position, zero-padded before the clip.
    fn time_block(&self, now: f64) -> Vec<f64> {
        let n = self.window.len();
        let mut block = vec![0.0; n];
        let Some(clip) = &self.clip else {
            return block;
        };
        let end = clip.sample_index_at(now - self.started_at).min(clip.samples.len());
        let begin = end.saturating_sub(n);
        let src = &clip.samples[begin..end];
        let pad = n - src.len();
        for (dst, s) in block[pad..].iter_mut().zip(src) {
            *dst = f64::from(*s);
        }
        block
    }
}

impl Default for SpectrumAnalyser {
    fn default() -> Self {
        Self::new(AnalyserOpts::default())
    }
}

impl AmplitudeSource for SpectrumAnalyser {
    fn start(&mut self, clip: SpeechClip, now: f64) {
        self.smoothed.fill(0.0);
        tracing::debug!(duration_sec = clip.duration_sec(), "analyser started");
        self.clip = Some(clip);
        self.started_at = now;
    }

    fn stop(&mut self) {
        self.clip = None;
        self.smoothed.fill(0.0);
    }

    fn has_ended(&self, now: f64) -> bool {
        match &self.clip {
            Some(clip) => now - self.started_at >= clip.duration_sec(),
            None => true,
        }
    }

    fn band_level(&mut self, now: f64, bins: Range<usize>) -> f64 {
        let data = self.byte_frequency_data(now, bins);
        if data.is_empty() {
            return 0.0;
        }
        data.iter().map(|b| f64::from(*b)).sum::<f64>() / data.len() as f64
    }
}

fn blackman(n: usize) -> Vec<f64> {
    let alpha = 0.16;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    (0..n)
        .map(|i| {
            let x = i as f64 / n as f64;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

fn dft_magnitude(block: &[f64], window: &[f64], k: usize) -> f64 {
    let n = block.len() as f64;
    let (mut re, mut im) = (0.0, 0.0);
    for (i, (x, w)) in block.iter().zip(window).enumerate() {
        let phase = -2.0 * PI * (k as f64) * (i as f64) / n;
        let v = x * w;
        re += v * phase.cos();
        im += v * phase.sin();
    }
    (re * re + im * im).sqrt()
}

#[cfg(test)]
#[path = "../../tests/unit/media/analyser.rs"]
mod tests;

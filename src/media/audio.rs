use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{StudioError, StudioResult};

/// Sample rate of raw speech PCM returned by the synthesis service.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Decoded mono speech audio.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechClip {
    /// Samples per second.
    pub sample_rate: u32,
    /// Mono samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
}

impl SpeechClip {
    /// Clip from mono samples; a zero sample rate is rejected.
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> StudioResult<Self> {
        if sample_rate == 0 {
            return Err(StudioError::validation("sample rate must be > 0"));
        }
        Ok(Self {
            sample_rate,
            samples,
        })
    }

    /// Length in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Index of the sample playing `t` seconds after the clip starts.
    pub fn sample_index_at(&self, t: f64) -> usize {
        if t <= 0.0 {
            0
        } else {
            (t * f64::from(self.sample_rate)).floor() as usize
        }
    }

    /// Copy of the clip delayed by `secs` of silence.
    pub fn with_leading_silence(&self, secs: f64) -> Self {
        let pad = (secs.max(0.0) * f64::from(self.sample_rate)).round() as usize;
        let mut samples = vec![0.0; pad];
        samples.extend_from_slice(&self.samples);
        Self {
            sample_rate: self.sample_rate,
            samples,
        }
    }

    /// Encode as a 16-bit mono WAV file in memory.
    pub fn to_wav_bytes(&self) -> StudioResult<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).context("create wav writer")?;
            for s in &self.samples {
                writer
                    .write_sample(f32_to_i16(*s))
                    .context("write wav sample")?;
            }
            writer.finalize().context("finalize wav")?;
        }
        Ok(cursor.into_inner())
    }

    /// Write as a 16-bit mono WAV file.
    pub fn write_wav(&self, path: &Path) -> StudioResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(path, self.to_wav_bytes()?)
            .with_context(|| format!("write wav '{}'", path.display()))?;
        Ok(())
    }

    /// Write interleaved little-endian f32 samples, the layout ffmpeg reads as `-f f32le`.
    pub fn write_f32le(&self, path: &Path) -> StudioResult<()> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 4);
        for s in &self.samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        std::fs::write(path, bytes)
            .with_context(|| format!("write f32le '{}'", path.display()))?;
        Ok(())
    }
}

/// Decode speech bytes: a RIFF/WAV container, or headerless 16-bit little-endian mono PCM at
/// [`SPEECH_SAMPLE_RATE`].
pub fn decode_speech(bytes: &[u8]) -> StudioResult<SpeechClip> {
    if bytes.starts_with(b"RIFF") {
        decode_wav(bytes)
    } else {
        decode_pcm_s16le(bytes, SPEECH_SAMPLE_RATE)
    }
}

/// Decode headerless 16-bit little-endian mono PCM.
pub fn decode_pcm_s16le(bytes: &[u8], sample_rate: u32) -> StudioResult<SpeechClip> {
    if !bytes.len().is_multiple_of(2) {
        return Err(StudioError::decode(
            "PCM byte length is not aligned to 16-bit samples",
        ));
    }
    let samples = bytes
        .chunks_exact(2)
        .map(|c| f32::from(i16::from_le_bytes([c[0], c[1]])) / 32768.0)
        .collect();
    SpeechClip::new(sample_rate, samples)
}

/// Decode a WAV container, downmixing to mono.
pub fn decode_wav(bytes: &[u8]) -> StudioResult<SpeechClip> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| StudioError::decode(format!("invalid wav: {e}")))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| StudioError::decode(format!("wav samples: {e}")))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| StudioError::decode(format!("wav samples: {e}")))?
        }
    };

    let samples = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    SpeechClip::new(spec.sample_rate, samples)
}

/// Read and decode a speech file.
pub fn load_speech(path: &Path) -> StudioResult<SpeechClip> {
    let bytes = std::fs::read(path)
        .map_err(|e| StudioError::decode(format!("failed to read '{}': {e}", path.display())))?;
    decode_speech(&bytes)
}

fn f32_to_i16(s: f32) -> i16 {
    (s.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

#[cfg(test)]
#[path = "../../tests/unit/media/audio.rs"]
mod tests;

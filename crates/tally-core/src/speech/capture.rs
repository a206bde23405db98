use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::{SampleFormat, WavSpec, WavWriter};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use tracing::info;

/// A fixed-duration recording from the default input device, already
/// encoded as 16-bit PCM WAV for the transcription endpoint.
pub struct RecordedClip {
    pub wav_bytes: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Sample rates the transcription endpoint handles well; 16 kHz preferred.
const TARGET_RATES: [u32; 4] = [16000, 32000, 48000, 8000];

/// Record from the default input device for `duration`, blocking the
/// calling thread. Run it under `spawn_blocking` from async code.
pub fn record_clip(duration: Duration) -> Result<RecordedClip> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("Audio input device: {}", device.name().unwrap_or_default());

    // Prefer a standard rate; fall back to whatever the device defaults to.
    let mut selected_config = None;
    let mut selected_rate = 0;
    for &rate in &TARGET_RATES {
        let configs = device.supported_input_configs()?;
        for config_range in configs {
            if config_range.min_sample_rate().0 <= rate && config_range.max_sample_rate().0 >= rate
            {
                selected_config = Some(config_range.with_sample_rate(cpal::SampleRate(rate)));
                selected_rate = rate;
                break;
            }
        }
        if selected_config.is_some() {
            break;
        }
    }
    let config = match selected_config {
        Some(c) => c,
        None => {
            let def = device.default_input_config()?;
            selected_rate = def.sample_rate().0;
            def
        }
    };
    let channels = config.channels();

    info!(
        "Audio config selected: rate={}Hz channels={}",
        selected_rate, channels
    );

    let capacity = selected_rate as usize * channels as usize * duration.as_secs() as usize + 4096;
    let rb = HeapRb::<f32>::new(capacity);
    let (mut producer, mut consumer) = rb.split();

    let err_fn = |err| tracing::error!("input stream error: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config.into(),
            move |data: &[f32], _: &_| {
                // Lossy on overflow; push_slice drops whatever doesn't fit.
                producer.push_slice(data);
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config.into(),
            move |data: &[i16], _: &_| {
                for &sample in data {
                    let _ = producer.try_push(sample as f32 / i16::MAX as f32);
                }
            },
            err_fn,
            None,
        )?,
        other => return Err(anyhow!("Unsupported sample format: {:?}", other)),
    };

    stream.play()?;

    let mut samples: Vec<f32> = Vec::with_capacity(capacity);
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
        samples.extend(consumer.pop_iter());
    }
    drop(stream);
    samples.extend(consumer.pop_iter());

    if samples.is_empty() {
        return Err(anyhow!("Recording produced no audio"));
    }

    let wav_bytes = encode_wav(&samples, selected_rate, channels)?;
    Ok(RecordedClip {
        wav_bytes,
        sample_rate: selected_rate,
        channels,
    })
}

fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(clamped)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wav_header_and_length() {
        let samples = vec![0.0f32; 1600];
        let bytes = encode_wav(&samples, 16000, 1).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte header + 2 bytes per sample.
        assert_eq!(bytes.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn test_encode_wav_clamps_out_of_range() {
        let samples = vec![2.0f32, -2.0];
        let bytes = encode_wav(&samples, 16000, 1).unwrap();
        let first = i16::from_le_bytes([bytes[44], bytes[45]]);
        let second = i16::from_le_bytes([bytes[46], bytes[47]]);
        assert_eq!(first, i16::MAX);
        assert_eq!(second, -i16::MAX);
    }
}

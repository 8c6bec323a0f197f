//! Advisory audio readability probe
//!
//! Opens a staged file with symphonia and reads the container headers. The
//! result is diagnostic only: the pipeline logs it and carries on whether or
//! not the probe succeeds.

use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Container-level facts about a staged file
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    /// Codec short name (e.g. "pcm_s16le", "mp3")
    pub codec: Option<&'static str>,
    /// Sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Channel count
    pub channels: Option<usize>,
    /// Frame count, when the container declares it
    pub frames: Option<u64>,
    /// Duration in seconds (frames / sample rate)
    pub duration_seconds: Option<f64>,
}

/// Probe an audio file's container and default track
///
/// # Errors
/// * File cannot be opened
/// * Format not recognised
/// * No decodable audio track
pub fn probe_audio_file(file_path: &Path) -> Result<AudioInfo> {
    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open audio file: {}", file_path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio file: {}", file_path.display()))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let params = &track.codec_params;
    let codec = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|descriptor| descriptor.short_name);
    let duration_seconds = match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / rate as f64),
        _ => None,
    };

    Ok(AudioInfo {
        codec,
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count()),
        frames: params.n_frames,
        duration_seconds,
    })
}

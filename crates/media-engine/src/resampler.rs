// crates/media-engine/src/resampler.rs
// Converts decoded verses to the shape the output device accepts

use crate::decoder::DecodedTrack;
use crate::error::{PlaybackError, PlaybackResult};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Rates tried, in order, when the device cannot play the track's own rate
const PREFERRED_RATES: [u32; 2] = [48_000, 44_100];

/// One entry of a device's supported output configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConfigRange {
    pub channels: u16,
    pub min_rate: u32,
    pub max_rate: u32,
}

impl ConfigRange {
    fn supports(&self, rate: u32) -> bool {
        (self.min_rate..=self.max_rate).contains(&rate)
    }

    fn best_rate(&self, wanted: u32) -> u32 {
        if self.supports(wanted) {
            return wanted;
        }
        PREFERRED_RATES
            .into_iter()
            .find(|rate| self.supports(*rate))
            .unwrap_or_else(|| wanted.clamp(self.min_rate, self.max_rate))
    }
}

/// Channel count and sample rate a stream is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StreamShape {
    pub channels: u16,
    pub sample_rate: u32,
}

/// Picks the configuration needing the least conversion of `track`
///
/// A range that plays the track's rate wins over one that matches its
/// channel count; resampling costs more than remixing.
pub(crate) fn choose_output(ranges: &[ConfigRange], track: StreamShape) -> Option<StreamShape> {
    let cost = |range: &ConfigRange| {
        (
            !range.supports(track.sample_rate),
            range.channels != track.channels,
            // Fewer surplus channels first, then the narrowest down-mix
            range.channels < track.channels,
            range.channels.abs_diff(track.channels),
        )
    };

    ranges
        .iter()
        .filter(|range| range.channels > 0 && range.min_rate <= range.max_rate)
        .min_by_key(|range| cost(*range))
        .map(|range| StreamShape {
            channels: range.channels,
            sample_rate: range.best_rate(track.sample_rate),
        })
}

/// Rewrites interleaved samples from `from` channels to `to` channels
///
/// Mono is copied to every output channel, anything down-mixed to mono is
/// averaged, and otherwise channels map one-to-one with silence in the extras.
pub(crate) fn remix(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let from = usize::from(from);
    let to = usize::from(to);
    let mut out = Vec::with_capacity(samples.len() / from * to);

    for frame in samples.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            out.extend((0..to).map(|c| frame.get(c).copied().unwrap_or(0.0)));
        }
    }
    out
}

fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (plane, sample) in planar.iter_mut().zip(frame) {
            plane.push(*sample);
        }
    }
    planar
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.first().map(Vec::len).unwrap_or(0);
    let mut out = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        out.extend(planar.iter().map(|plane| plane[i]));
    }
    out
}

/// Sinc resampling of a whole verse in one pass
fn resample(samples: &[f32], channels: u16, from_rate: u32, to_rate: u32) -> PlaybackResult<Vec<f32>> {
    let channels = usize::from(channels);
    let frames = samples.len() / channels;
    if from_rate == to_rate || from_rate == 0 || frames == 0 {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        oversampling_factor: 256,
        interpolation: SincInterpolationType::Cubic,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(to_rate) / f64::from(from_rate),
        2.0,
        params,
        frames,
        channels,
    )
    .map_err(|e| runtime(format!("Failed to create resampler: {}", e)))?;

    let planar = resampler
        .process(&deinterleave(samples, channels), None)
        .map_err(|e| runtime(format!("Resampling failed: {}", e)))?;

    log::debug!(
        "Resampled {} frames ({} Hz) to {} frames ({} Hz)",
        frames,
        from_rate,
        planar.first().map(Vec::len).unwrap_or(0),
        to_rate
    );
    Ok(interleave(&planar))
}

/// `track` converted to `shape`, untouched when it already matches
pub(crate) fn conform(track: DecodedTrack, shape: StreamShape) -> PlaybackResult<DecodedTrack> {
    if track.channels == shape.channels && track.sample_rate == shape.sample_rate {
        return Ok(track);
    }

    let samples = remix(&track.samples, track.channels, shape.channels);
    let samples = resample(&samples, shape.channels, track.sample_rate, shape.sample_rate)?;
    Ok(DecodedTrack {
        samples,
        sample_rate: shape.sample_rate,
        channels: shape.channels,
    })
}

fn runtime(message: String) -> PlaybackError {
    PlaybackError::PlaybackRuntimeError(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(channels: u16, min_rate: u32, max_rate: u32) -> ConfigRange {
        ConfigRange {
            channels,
            min_rate,
            max_rate,
        }
    }

    fn shape(channels: u16, sample_rate: u32) -> StreamShape {
        StreamShape {
            channels,
            sample_rate,
        }
    }

    #[test]
    fn test_exact_match_is_kept() {
        let ranges = [range(2, 44_100, 48_000), range(1, 8_000, 192_000)];
        assert_eq!(choose_output(&ranges, shape(1, 22_050)), Some(shape(1, 22_050)));
    }

    #[test]
    fn test_mono_track_on_stereo_only_device() {
        let ranges = [range(2, 8_000, 192_000)];
        assert_eq!(choose_output(&ranges, shape(1, 44_100)), Some(shape(2, 44_100)));
    }

    #[test]
    fn test_fixed_rate_device_prefers_48k() {
        let ranges = [range(2, 48_000, 48_000)];
        assert_eq!(choose_output(&ranges, shape(2, 22_050)), Some(shape(2, 48_000)));
    }

    #[test]
    fn test_supported_rate_beats_matching_channels() {
        let ranges = [range(1, 48_000, 48_000), range(2, 8_000, 96_000)];
        assert_eq!(choose_output(&ranges, shape(1, 44_100)), Some(shape(2, 44_100)));
    }

    #[test]
    fn test_up_mix_preferred_over_down_mix() {
        let ranges = [range(1, 44_100, 44_100), range(6, 44_100, 44_100)];
        assert_eq!(choose_output(&ranges, shape(2, 44_100)), Some(shape(6, 44_100)));
    }

    #[test]
    fn test_odd_rate_range_is_clamped() {
        let ranges = [range(2, 8_000, 16_000)];
        assert_eq!(choose_output(&ranges, shape(2, 44_100)), Some(shape(2, 16_000)));
    }

    #[test]
    fn test_no_usable_range() {
        assert_eq!(choose_output(&[], shape(2, 44_100)), None);
        assert_eq!(choose_output(&[range(0, 8_000, 48_000)], shape(2, 44_100)), None);
    }

    #[test]
    fn test_remix_mono_to_stereo_duplicates() {
        assert_eq!(remix(&[0.1, 0.2], 1, 2), vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_remix_stereo_to_mono_averages() {
        assert_eq!(remix(&[0.25, 0.75, -1.0, 1.0], 2, 1), vec![0.5, 0.0]);
    }

    #[test]
    fn test_remix_stereo_to_quad_silences_extras() {
        assert_eq!(remix(&[0.1, 0.2], 2, 4), vec![0.1, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn test_conform_resamples_to_device_rate() {
        let track = DecodedTrack {
            samples: vec![0.0; 22_050],
            sample_rate: 22_050,
            channels: 1,
        };
        let out = conform(track, shape(2, 44_100)).unwrap();
        assert_eq!(out.channels, 2);
        assert_eq!(out.sample_rate, 44_100);
        let frames = out.frames() as i64;
        assert!((frames - 44_100).abs() < 1_000, "got {} frames", frames);
    }

    #[test]
    fn test_conform_leaves_matching_track_alone() {
        let track = DecodedTrack {
            samples: vec![0.5; 4],
            sample_rate: 48_000,
            channels: 2,
        };
        let out = conform(track.clone(), shape(2, 48_000)).unwrap();
        assert_eq!(out, track);
    }
}

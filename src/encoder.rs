// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Encoder configuration derived from a single quality level.
//!
//! [`VideoQuality`] selects one row of a fixed parameter table and
//! [`VideoEncoderConfig`] holds the resulting bundle. Every derived field is
//! overwritten together when a quality level is applied, so readers never
//! observe a mix of two presets. The configuration always reflects the
//! *requested* settings; if the capture device cannot honor a preset, the
//! capture collaborator degrades on its own and never writes back here.

use std::fmt;
use std::str::FromStr;

use enumn::N;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::Orientation;
use crate::Resolution;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("quality level {0} is out of range")]
    InvalidQualityLevel(u32),
    #[error("target bitrate must be positive")]
    InvalidBitRate,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Capture-resolution bucket requested from the capture session.
///
/// All buckets are 16:9, expressed in portrait terms. A device that does not
/// support the requested bucket is expected to fall back to a lower one on
/// the capture side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPreset {
    /// 360x640
    Low,
    /// 540x960
    Medium,
    /// 720x1280
    High,
}

impl SessionPreset {
    /// The portrait capture dimensions of this bucket.
    pub fn dimensions(self) -> Resolution {
        match self {
            SessionPreset::Low => Resolution {
                width: 360,
                height: 640,
            },
            SessionPreset::Medium => Resolution {
                width: 540,
                height: 960,
            },
            SessionPreset::High => Resolution {
                width: 720,
                height: 1280,
            },
        }
    }
}

impl fmt::Display for SessionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dimensions())
    }
}

impl FromStr for SessionPreset {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "360x640" => Ok(SessionPreset::Low),
            "540x960" => Ok(SessionPreset::Medium),
            "720x1280" => Ok(SessionPreset::High),
            _ => Err("unrecognized session preset. Valid values: 360x640, 540x960, 720x1280"),
        }
    }
}

/// Video quality level. Applying a level fixes the capture size, frame rate,
/// bitrate band, keyframe interval and session preset all at once.
#[repr(u32)]
#[derive(N, Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoQuality {
    /// 360x640, 15fps, 500kbps
    Low1 = 0,
    /// 360x640, 24fps, 800kbps
    #[default]
    Low2 = 1,
    /// 360x640, 30fps, 800kbps
    Low3 = 2,
    /// 540x960, 15fps, 800kbps
    Medium1 = 3,
    /// 540x960, 24fps, 800kbps
    Medium2 = 4,
    /// 540x960, 30fps, 800kbps
    Medium3 = 5,
    /// 720x1280, 15fps, 1000kbps
    High1 = 6,
    /// 720x1280, 24fps, 1200kbps
    High2 = 7,
    /// 720x1280, 30fps, 1200kbps
    High3 = 8,
}

impl TryFrom<u32> for VideoQuality {
    type Error = ConfigError;

    fn try_from(value: u32) -> ConfigResult<Self> {
        VideoQuality::n(value).ok_or(ConfigError::InvalidQualityLevel(value))
    }
}

impl FromStr for VideoQuality {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low1" => Ok(VideoQuality::Low1),
            "low2" => Ok(VideoQuality::Low2),
            "low3" => Ok(VideoQuality::Low3),
            "medium1" => Ok(VideoQuality::Medium1),
            "medium2" => Ok(VideoQuality::Medium2),
            "medium3" => Ok(VideoQuality::Medium3),
            "high1" => Ok(VideoQuality::High1),
            "high2" => Ok(VideoQuality::High2),
            "high3" => Ok(VideoQuality::High3),
            _ => Err("unrecognized quality level. Valid values: low1..3, medium1..3, high1..3"),
        }
    }
}

/// One row of the quality table. Sizes are portrait-defined; landscape
/// output presents them transposed.
struct Tier {
    size: Resolution,
    frame_rate: u32,
    bit_rate: u32,
    preset: SessionPreset,
}

const fn tier(
    width: u32,
    height: u32,
    frame_rate: u32,
    bit_rate: u32,
    preset: SessionPreset,
) -> Tier {
    Tier {
        size: Resolution { width, height },
        frame_rate,
        bit_rate,
        preset,
    }
}

/// Quality table, indexed by `VideoQuality` ordinal. All dimensions are
/// multiples of 2 (codec requirement).
const QUALITY_TABLE: [Tier; 9] = [
    tier(360, 640, 15, 500_000, SessionPreset::Low),
    tier(360, 640, 24, 800_000, SessionPreset::Low),
    tier(360, 640, 30, 800_000, SessionPreset::Low),
    tier(540, 960, 15, 800_000, SessionPreset::Medium),
    tier(540, 960, 24, 800_000, SessionPreset::Medium),
    tier(540, 960, 30, 800_000, SessionPreset::Medium),
    tier(720, 1280, 15, 1_000_000, SessionPreset::High),
    tier(720, 1280, 24, 1_200_000, SessionPreset::High),
    tier(720, 1280, 30, 1_200_000, SessionPreset::High),
];

impl VideoQuality {
    fn tier(self) -> &'static Tier {
        &QUALITY_TABLE[self as usize]
    }
}

/// Derived parameters the encoder consumes, captured as one immutable
/// snapshot so a multi-field update is observed atomically.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Presented capture size, already transposed for landscape output.
    pub video_size: Resolution,
    /// Frames per second.
    pub frame_rate: u32,
    /// Target bitrate in bps.
    pub bit_rate: u32,
    /// Upper edge of the rate-control band in bps.
    pub max_bit_rate: u32,
    /// Lower edge of the rate-control band in bps.
    pub min_bit_rate: u32,
    /// Maximum number of frames between two keyframes.
    pub max_keyframe_interval: u32,
    /// Maximum duration between two keyframes; 0 leaves the choice to the
    /// encoder.
    pub max_keyframe_interval_duration: u32,
}

/// Value object bundling the encoder parameters derived from the last
/// applied [`VideoQuality`] with the orientation state of the pipeline.
///
/// Derived fields only change as a side effect of [`apply_quality`]; the
/// target bitrate may additionally be overridden through [`set_bit_rate`]
/// without re-deriving the rest of the preset. Base dimensions are always
/// stored portrait-relative, the presented size is a pure function of (base
/// dimensions, landscape flag).
///
/// The object is plain data with no interior mutability. When shared between
/// a capture thread and a control thread, wrap it in a single lock so that
/// multi-field updates stay atomic for readers.
///
/// [`apply_quality`]: VideoEncoderConfig::apply_quality
/// [`set_bit_rate`]: VideoEncoderConfig::set_bit_rate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEncoderConfig {
    base: Resolution,
    size: Resolution,
    output_orientation: Orientation,
    quality: VideoQuality,
    frame_rate: u32,
    max_keyframe_interval: u32,
    max_keyframe_interval_duration: u32,
    bit_rate: u32,
    max_bit_rate: u32,
    min_bit_rate: u32,
    session_preset: SessionPreset,
    /// Allow downstream consumers to recompute the capture size from the
    /// camera's native aspect ratio instead of using it verbatim.
    pub size_respecting_aspect_ratio: bool,
    /// Restrict orientation updates to flips within the current orientation
    /// family, mirroring physical device rotation.
    pub autorotate: bool,
}

impl Default for VideoEncoderConfig {
    fn default() -> Self {
        Self::new(VideoQuality::default())
    }
}

impl VideoEncoderConfig {
    /// Creates a configuration for `quality` with portrait output.
    pub fn new(quality: VideoQuality) -> Self {
        Self::with_orientation(quality, Orientation::Portrait)
    }

    /// Creates a configuration for `quality` with the given output
    /// orientation. With a landscape orientation the presented size is the
    /// transposed table size right away.
    pub fn with_orientation(quality: VideoQuality, orientation: Orientation) -> Self {
        let tier = quality.tier();
        let mut config = VideoEncoderConfig {
            base: tier.size,
            size: tier.size,
            output_orientation: orientation,
            quality,
            frame_rate: tier.frame_rate,
            max_keyframe_interval: 2 * tier.frame_rate,
            max_keyframe_interval_duration: 0,
            bit_rate: tier.bit_rate,
            max_bit_rate: band_upper(tier.bit_rate),
            min_bit_rate: band_lower(tier.bit_rate),
            session_preset: tier.preset,
            size_respecting_aspect_ratio: false,
            autorotate: false,
        };
        config.refresh_video_size();
        config
    }

    /// Applies `quality`: overwrites base size, frame rate, bitrate band,
    /// keyframe interval and session preset from the quality table, then
    /// refreshes the presented size for the current orientation.
    pub fn apply_quality(&mut self, quality: VideoQuality) {
        let tier = quality.tier();
        self.quality = quality;
        self.base = tier.size;
        self.frame_rate = tier.frame_rate;
        self.max_keyframe_interval = 2 * tier.frame_rate;
        self.max_keyframe_interval_duration = 0;
        self.bit_rate = tier.bit_rate;
        self.max_bit_rate = band_upper(tier.bit_rate);
        self.min_bit_rate = band_lower(tier.bit_rate);
        self.session_preset = tier.preset;
        self.refresh_video_size();
        log::debug!(
            "applied quality {:?}: {} @{}fps, {}bps, preset {}",
            quality,
            self.size,
            self.frame_rate,
            self.bit_rate,
            self.session_preset,
        );
    }

    /// Overrides the target bitrate without re-deriving the rest of the
    /// preset. The ±20% rate-control band follows the new target. Fails on a
    /// zero target, leaving the configuration untouched.
    pub fn set_bit_rate(&mut self, bit_rate: u32) -> ConfigResult<()> {
        if bit_rate == 0 {
            return Err(ConfigError::InvalidBitRate);
        }
        self.bit_rate = bit_rate;
        self.max_bit_rate = band_upper(bit_rate);
        self.min_bit_rate = band_lower(bit_rate);
        Ok(())
    }

    /// Sets the output orientation. With [`autorotate`] enabled only flips
    /// within the current orientation family are applied and a cross-family
    /// request is a no-op; with it disabled the orientation is set
    /// unconditionally. Never swaps the stored base dimensions; the
    /// presented size follows on the next [`refresh_video_size`].
    ///
    /// [`autorotate`]: VideoEncoderConfig::autorotate
    /// [`refresh_video_size`]: VideoEncoderConfig::refresh_video_size
    pub fn set_output_orientation(&mut self, orientation: Orientation) {
        if self.autorotate && !self.output_orientation.same_family(orientation) {
            log::debug!(
                "autorotate on, ignoring cross-family rotation {:?} -> {:?}",
                self.output_orientation,
                orientation,
            );
            return;
        }
        self.output_orientation = orientation;
    }

    /// Recomputes the presented capture size from the portrait-relative base
    /// dimensions and the current orientation. Idempotent: the base never
    /// changes here, so repeated calls cannot cumulatively swap.
    pub fn refresh_video_size(&mut self) {
        let size = if self.landscape() {
            self.base.transposed()
        } else {
            self.base
        };
        self.size = size.aligned_to_2();
    }

    /// The quality level last applied.
    pub fn quality(&self) -> VideoQuality {
        self.quality
    }

    /// The presented capture size, transposed for landscape output.
    pub fn video_size(&self) -> Resolution {
        self.size
    }

    /// The portrait-relative capture dimensions before any orientation swap.
    pub fn base_size(&self) -> Resolution {
        self.base
    }

    pub fn output_orientation(&self) -> Orientation {
        self.output_orientation
    }

    /// Whether the output orientation is in the landscape family.
    pub fn landscape(&self) -> bool {
        self.output_orientation.is_landscape()
    }

    /// Frames per second. Fixed per quality level.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Maximum number of frames between two keyframes (2x the frame rate).
    pub fn max_keyframe_interval(&self) -> u32 {
        self.max_keyframe_interval
    }

    /// Maximum duration between two keyframes; 0 leaves the choice to the
    /// encoder.
    pub fn max_keyframe_interval_duration(&self) -> u32 {
        self.max_keyframe_interval_duration
    }

    /// Target bitrate in bps.
    pub fn bit_rate(&self) -> u32 {
        self.bit_rate
    }

    /// Upper edge of the rate-control band, 120% of the target bitrate.
    pub fn max_bit_rate(&self) -> u32 {
        self.max_bit_rate
    }

    /// Lower edge of the rate-control band, 80% of the target bitrate.
    pub fn min_bit_rate(&self) -> u32 {
        self.min_bit_rate
    }

    /// The capture-resolution bucket to request from the capture session.
    pub fn session_preset(&self) -> SessionPreset {
        self.session_preset
    }

    /// Snapshot of the parameters the encoder consumes.
    pub fn settings(&self) -> EncoderSettings {
        EncoderSettings {
            video_size: self.size,
            frame_rate: self.frame_rate,
            bit_rate: self.bit_rate,
            max_bit_rate: self.max_bit_rate,
            min_bit_rate: self.min_bit_rate,
            max_keyframe_interval: self.max_keyframe_interval,
            max_keyframe_interval_duration: self.max_keyframe_interval_duration,
        }
    }
}

fn band_upper(bit_rate: u32) -> u32 {
    (bit_rate as f64 * 1.2).round() as u32
}

fn band_lower(bit_rate: u32) -> u32 {
    (bit_rate as f64 * 0.8).round() as u32
}

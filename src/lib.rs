// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Configuration presets for live-video capture pipelines.
//!
//! The crate derives a complete, internally-consistent bundle of encoder
//! parameters (capture size, frame rate, bitrate band, keyframe interval,
//! capture session preset) from a single [`encoder::VideoQuality`] level.
//! [`encoder::VideoEncoderConfig`] holds the derived bundle together with the
//! orientation state used to present the portrait-defined preset sizes in
//! landscape.

pub mod encoder;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Returns the resolution with width and height swapped, i.e. the
    /// landscape presentation of a portrait-defined size (or vice versa).
    pub fn transposed(self) -> Resolution {
        Resolution {
            width: self.height,
            height: self.width,
        }
    }

    /// Rounds both dimensions down to a multiple of 2. Odd dimensions risk
    /// green-edge artifacts when the encoded stream is decoded.
    pub fn aligned_to_2(self) -> Resolution {
        Resolution {
            width: self.width & !1,
            height: self.height & !1,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s.split_once('x').ok_or("expected <width>x<height>")?;
        Ok(Resolution {
            width: width.parse().map_err(|_| "invalid width")?,
            height: height.parse().map_err(|_| "invalid height")?,
        })
    }
}

/// Orientation of the images the pipeline outputs.
///
/// `LandscapeLeft` and `LandscapeRight` form the landscape family,
/// `Portrait` and `PortraitUpsideDown` the portrait family. Physical device
/// rotation only flips within one family.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl Orientation {
    /// Whether this orientation belongs to the landscape family.
    pub fn is_landscape(self) -> bool {
        matches!(self, Orientation::LandscapeLeft | Orientation::LandscapeRight)
    }

    pub(crate) fn same_family(self, other: Orientation) -> bool {
        self.is_landscape() == other.is_landscape()
    }
}

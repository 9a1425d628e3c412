//! Forward preprocessing: prediction and error mapping.
//!
//! The unit-delay predictor estimates every sample by its predecessor. The
//! signed prediction error is folded into a non-negative value that never
//! exceeds the sample's dynamic range:
//!
//! ```text
//! theta = min(x_prev, max - x_prev)
//! delta = x - x_prev
//!
//! mapped = 2 * delta             if 0 <= delta <= theta
//!        = 2 * |delta| - 1       if -theta <= delta < 0
//!        = theta + |delta|       otherwise
//! ```

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::error::CodecResult;
use crate::params::{check_resolution, max_value};

/// A stateful sample-to-mapped-value transform.
///
/// Implementations hold the prediction state of one stream and must be fed
/// samples strictly in stream order.
pub trait Preprocessor {
    /// Map the next sample and advance the prediction state.
    fn preprocess(&mut self, sample: u32) -> u32;

    /// The raw value the next prediction is based on.
    fn reference(&self) -> u32;
}

/// Unit-delay predictor with the standard prediction error mapping.
#[derive(Clone, Debug)]
pub struct UnitDelayPredictor {
    max_value: u32,
    preceding: u32,
}

impl UnitDelayPredictor {
    /// Create a predictor for `resolution`-bit samples.
    pub fn new(resolution: u32) -> CodecResult<Self> {
        check_resolution(resolution)?;
        Ok(Self {
            max_value: max_value(resolution),
            preceding: 0,
        })
    }

    fn map(&self, sample: u32) -> u32 {
        let predicted = i64::from(self.preceding);
        let error = i64::from(sample) - predicted;
        let theta = predicted.min(i64::from(self.max_value) - predicted);

        let mapped = if (0..=theta).contains(&error) {
            2 * error
        } else if (-theta..0).contains(&error) {
            2 * error.abs() - 1
        } else {
            theta + error.abs()
        };
        mapped as u32
    }
}

impl Preprocessor for UnitDelayPredictor {
    fn preprocess(&mut self, sample: u32) -> u32 {
        let mapped = self.map(sample);
        self.preceding = sample;
        mapped
    }

    #[inline]
    fn reference(&self) -> u32 {
        self.preceding
    }
}

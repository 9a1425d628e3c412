//! Inverse preprocessing: sample reconstruction from mapped values.
//!
//! Undoes the folding of [`UnitDelayPredictor`](crate::UnitDelayPredictor)
//! given the previously reconstructed sample.

#![allow(clippy::cast_possible_truncation)]

use crate::error::CodecResult;
use crate::params::{check_resolution, max_value};

/// A stateful mapped-value-to-sample transform.
pub trait Postprocessor {
    /// Reconstruct the next sample and advance the state.
    ///
    /// `mapped` must not exceed the dynamic range of the stream.
    fn reconstruct(&mut self, mapped: u32) -> u32;

    /// Force the state to a raw reference sample read from the stream.
    fn set_reference(&mut self, raw: u32);
}

/// Inverse of the unit-delay predictor.
#[derive(Clone, Debug)]
pub struct UnitDelayReconstructor {
    max_value: u32,
    reference: u32,
}

impl UnitDelayReconstructor {
    /// Create a reconstructor for `resolution`-bit samples.
    pub fn new(resolution: u32) -> CodecResult<Self> {
        check_resolution(resolution)?;
        Ok(Self {
            max_value: max_value(resolution),
            reference: 0,
        })
    }

    /// Current reference (last reconstructed) sample.
    #[inline]
    pub fn reference(&self) -> u32 {
        self.reference
    }

    fn unmap(&self, mapped: u32) -> u32 {
        let reference = u64::from(self.reference);
        let max = u64::from(self.max_value);
        let mapped = u64::from(mapped);
        let theta = reference.min(max - reference);

        let sample = if mapped > 2 * theta {
            if reference > max / 2 {
                reference - (mapped - theta)
            } else {
                reference + (mapped - theta)
            }
        } else if mapped % 2 == 0 {
            reference + mapped / 2
        } else {
            reference - (mapped + 1) / 2
        };
        sample as u32
    }
}

impl Postprocessor for UnitDelayReconstructor {
    fn reconstruct(&mut self, mapped: u32) -> u32 {
        debug_assert!(mapped <= self.max_value);
        self.reference = self.unmap(mapped);
        self.reference
    }

    #[inline]
    fn set_reference(&mut self, raw: u32) {
        self.reference = raw;
    }
}

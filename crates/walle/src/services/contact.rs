//! Dual-threshold classification shared by the bumper and track-wire services.

use crate::config::{ContactConfig, Polarity};

/// High/low threshold pair with a hold band in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualThreshold {
    pub high: u16,
    pub low: u16,
    pub polarity: Polarity,
}

impl DualThreshold {
    pub fn from_config(config: &ContactConfig) -> Self {
        Self {
            high: config.high,
            low: config.low,
            polarity: config.polarity,
        }
    }

    /// `true` for ENGAGED. Readings inside `low..=high` keep `previous`.
    pub fn classify(&self, reading: u16, previous: bool) -> bool {
        match self.polarity {
            Polarity::ActiveLow if reading < self.low => true,
            Polarity::ActiveLow if reading > self.high => false,
            Polarity::ActiveHigh if reading > self.high => true,
            Polarity::ActiveHigh if reading < self.low => false,
            _ => previous,
        }
    }
}

/// Two channels packed nibble-per-channel into one mask, with the last
/// reported mask for change detection.
#[derive(Debug, Clone)]
pub struct ContactPair {
    threshold: DualThreshold,
    shifts: [u8; 2],
    engaged: [bool; 2],
    reported: u16,
}

impl ContactPair {
    /// `shifts[i]` is the bit position of channel `i` in the mask.
    pub fn new(threshold: DualThreshold, shifts: [u8; 2]) -> Self {
        Self {
            threshold,
            shifts,
            engaged: [false; 2],
            reported: 0,
        }
    }

    /// Classifies a pair of readings and returns the new mask when it differs
    /// from the last one reported.
    pub fn update(&mut self, readings: [u16; 2]) -> Option<u16> {
        for (engaged, reading) in self.engaged.iter_mut().zip(readings) {
            *engaged = self.threshold.classify(reading, *engaged);
        }
        let mask = self.mask();
        if mask == self.reported {
            return None;
        }
        self.reported = mask;
        Some(mask)
    }

    pub fn mask(&self) -> u16 {
        self.engaged
            .iter()
            .zip(self.shifts)
            .filter(|(engaged, _)| **engaged)
            .fold(0, |mask, (_, shift)| mask | (1u16 << shift))
    }

    pub fn reported(&self) -> u16 {
        self.reported
    }
}

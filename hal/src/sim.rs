//! In-memory board that records every output call.
//!
//! Analog channels return a steady level unless a script of readings is
//! queued for them; scripted values are consumed first, one per read.

use std::boxed::Box;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::vec::Vec;

use crate::adc::{AdcPin, AnalogInputs, ADC_MAX};
use crate::error::{HalError, HalResult};
use crate::gpio::{DigitalOutputs, PortPin};
use crate::pwm::{PwmOutputs, PwmPin, MAX_DUTY};
use crate::servo::{ServoOutputs, ServoPin};

/// One output operation, in the order it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalCall {
    Duty(PwmPin, u16),
    Set(PortPin),
    Clear(PortPin),
    Pulse(ServoPin, u16),
}

type Noise = Box<dyn FnMut(AdcPin, u16) -> u16 + Send>;

#[derive(Default)]
pub struct SimBoard {
    levels: BTreeMap<AdcPin, u16>,
    scripts: BTreeMap<AdcPin, VecDeque<u16>>,
    reads: BTreeMap<AdcPin, usize>,
    not_ready: bool,
    calls: Vec<HalCall>,
    duties: BTreeMap<PwmPin, u16>,
    high: BTreeSet<(u8, u8)>,
    pulses: BTreeMap<ServoPin, u16>,
    noise: Option<Noise>,
}

impl SimBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steady reading returned once any script for `pin` is exhausted.
    pub fn set_analog(&mut self, pin: AdcPin, level: u16) {
        self.levels.insert(pin, level.min(ADC_MAX));
    }

    /// Queues readings for `pin`, returned one per read before the steady level.
    pub fn script_analog<I: IntoIterator<Item = u16>>(&mut self, pin: AdcPin, values: I) {
        self.scripts
            .entry(pin)
            .or_default()
            .extend(values.into_iter().map(|v| v.min(ADC_MAX)));
    }

    pub fn set_sample_ready(&mut self, ready: bool) {
        self.not_ready = !ready;
    }

    /// Perturbs every analog read, e.g. with random noise.
    pub fn set_noise<F>(&mut self, noise: F)
    where
        F: FnMut(AdcPin, u16) -> u16 + Send + 'static,
    {
        self.noise = Some(Box::new(noise));
    }

    pub fn calls(&self) -> &[HalCall] {
        &self.calls
    }

    /// Returns and forgets the recorded calls.
    pub fn take_calls(&mut self) -> Vec<HalCall> {
        core::mem::take(&mut self.calls)
    }

    pub fn duty(&self, channel: PwmPin) -> Option<u16> {
        self.duties.get(&channel).copied()
    }

    pub fn is_high(&self, pin: PortPin) -> bool {
        self.high.contains(&key(pin))
    }

    pub fn pulse(&self, channel: ServoPin) -> Option<u16> {
        self.pulses.get(&channel).copied()
    }

    /// How many times `pin` has been sampled.
    pub fn reads(&self, pin: AdcPin) -> usize {
        self.reads.get(&pin).copied().unwrap_or(0)
    }
}

fn key(pin: PortPin) -> (u8, u8) {
    (pin.port as u8, pin.pin)
}

impl fmt::Debug for SimBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimBoard")
            .field("levels", &self.levels)
            .field("duties", &self.duties)
            .field("pulses", &self.pulses)
            .field("calls", &self.calls.len())
            .finish()
    }
}

impl AnalogInputs for SimBoard {
    fn read_channel(&mut self, pin: AdcPin) -> HalResult<u16> {
        *self.reads.entry(pin).or_default() += 1;
        let raw = self
            .scripts
            .get_mut(&pin)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.levels.get(&pin).copied())
            .unwrap_or(0);
        let value = match self.noise.as_mut() {
            Some(noise) => noise(pin, raw).min(ADC_MAX),
            None => raw,
        };
        Ok(value)
    }

    fn is_sample_ready(&self) -> bool {
        !self.not_ready
    }
}

impl PwmOutputs for SimBoard {
    fn set_duty_cycle(&mut self, channel: PwmPin, duty: u16) -> HalResult<()> {
        if duty > MAX_DUTY {
            return Err(HalError::OutOfRange(duty));
        }
        self.duties.insert(channel, duty);
        self.calls.push(HalCall::Duty(channel, duty));
        Ok(())
    }
}

impl DigitalOutputs for SimBoard {
    fn set_port_bits(&mut self, pin: PortPin) -> HalResult<()> {
        self.high.insert(key(pin));
        self.calls.push(HalCall::Set(pin));
        Ok(())
    }

    fn clear_port_bits(&mut self, pin: PortPin) -> HalResult<()> {
        self.high.remove(&key(pin));
        self.calls.push(HalCall::Clear(pin));
        Ok(())
    }
}

impl ServoOutputs for SimBoard {
    fn set_pulse_time(&mut self, channel: ServoPin, micros: u16) -> HalResult<()> {
        self.pulses.insert(channel, micros);
        self.calls.push(HalCall::Pulse(channel, micros));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::Port;

    #[test]
    fn scripted_readings_come_before_the_steady_level() {
        let mut board = SimBoard::new();
        board.set_analog(AdcPin(2), 500);
        board.script_analog(AdcPin(2), [10, 20]);

        let reads: Vec<u16> = (0..3)
            .map(|_| board.read_channel(AdcPin(2)).unwrap())
            .collect();
        assert_eq!(reads, vec![10, 20, 500]);
        assert_eq!(board.reads(AdcPin(2)), 3);
    }

    #[test]
    fn outputs_are_recorded_in_order() {
        let mut board = SimBoard::new();
        let dir = PortPin::new(Port::Z, 4);
        board.set_duty_cycle(PwmPin(1), 300).unwrap();
        board.set_port_bits(dir).unwrap();
        board.clear_port_bits(dir).unwrap();

        assert_eq!(
            board.calls(),
            &[
                HalCall::Duty(PwmPin(1), 300),
                HalCall::Set(dir),
                HalCall::Clear(dir)
            ]
        );
        assert!(!board.is_high(dir));
    }

    #[test]
    fn duty_above_full_scale_is_rejected() {
        let mut board = SimBoard::new();
        assert_eq!(
            board.set_duty_cycle(PwmPin(0), 1001),
            Err(HalError::OutOfRange(1001))
        );
        assert!(board.calls().is_empty());
    }
}

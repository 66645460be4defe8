//! Two-phase thermistor bridge sampling.
//!
//! This module provides [`Sampler`], the interrupt-driven state machine that takes
//! one reference-resistor sample followed by one thermistor sample on the SD14 ADC.
//!
//! A cycle looks like this:
//!
//! ```text
//!   begin_cycle()          ADC irq (result)              ADC irq (result)
//! Idle ──────────▶ AwaitingReference ──────────▶ AwaitingThermistor ──────────▶ Idle
//!      arm(Reference)      store slot 0,                 store slot 1,
//!                          arm(Thermistor)               disable ADC, wake
//! ```
//!
//! The thermistor conversion is armed from inside the interrupt that delivered the
//! reference result. Both samples are therefore taken back to back under the same
//! excitation current, and the foreground is only woken once the pair is complete.
//!
//! ## Shared state
//!
//! [`SamplingState`] and [`SampleBuffer`] are written only by [`Sampler::on_event`]
//! (the interrupt path) and [`Sampler::begin_cycle`]. The buffer is not double
//! buffered; [`Sampler::samples`] only hands it out while the machine is idle.

use crate::registers::{AdcConfig, AdcEvent, AdcRegisters, Channel};

/// Phase of the sampling cycle.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SamplingState {
    /// No conversion in flight. The sample buffer may be read.
    #[default]
    Idle,
    /// The reference resistor conversion is running.
    AwaitingReferenceSample,
    /// The thermistor conversion is running.
    AwaitingThermistorSample,
}

/// The most recent pair of raw SD14 codes.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct SampleBuffer {
    slots: [u16; 2],
}

impl SampleBuffer {
    /// Slot holding the reference resistor code.
    pub const REFERENCE_SLOT: usize = 0;
    /// Slot holding the thermistor code.
    pub const THERMISTOR_SLOT: usize = 1;

    /// Raw code of the reference resistor conversion.
    pub const fn reference(&self) -> u16 {
        self.slots[Self::REFERENCE_SLOT]
    }

    /// Raw code of the thermistor conversion.
    pub const fn thermistor(&self) -> u16 {
        self.slots[Self::THERMISTOR_SLOT]
    }

    /// Both slots in order: reference, thermistor.
    pub const fn as_array(&self) -> [u16; 2] {
        self.slots
    }
}

/// What the interrupt handler must do on return.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum IsrAction {
    /// Return to whatever was interrupted; a sleeping foreground stays asleep.
    Return,
    /// End the low-power wait of the interrupted foreground when this handler
    /// returns. Applies to this invocation only.
    WakeOnExit,
}

impl IsrAction {
    /// Whether the foreground must be woken.
    pub const fn wakes(self) -> bool {
        matches!(self, IsrAction::WakeOnExit)
    }
}

/// The reference/thermistor sampling state machine.
///
/// Owns the ADC capability, the [`SamplingState`] and the [`SampleBuffer`].
#[derive(Debug)]
pub struct Sampler<A: AdcRegisters> {
    adc: A,
    state: SamplingState,
    buffer: SampleBuffer,
    cycles: u16,
    overflows: u16,
}

impl<A: AdcRegisters> Sampler<A> {
    /// Creates an idle sampler with a zeroed buffer.
    pub fn new(adc: A) -> Self {
        Self {
            adc,
            state: SamplingState::Idle,
            buffer: SampleBuffer::default(),
            cycles: 0,
            overflows: 0,
        }
    }

    /// Current phase.
    pub fn state(&self) -> SamplingState {
        self.state
    }

    /// Completed sample pairs since construction. Wraps.
    pub fn cycles(&self) -> u16 {
        self.cycles
    }

    /// Overflow events discarded since construction. Wraps.
    pub fn overflows(&self) -> u16 {
        self.overflows
    }

    /// The last complete pair, or `None` while a cycle is in flight.
    pub fn samples(&self) -> Option<SampleBuffer> {
        match self.state {
            SamplingState::Idle => Some(self.buffer),
            _ => None,
        }
    }

    /// Borrows the ADC capability.
    pub fn adc(&self) -> &A {
        &self.adc
    }

    /// Mutably borrows the ADC capability.
    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    /// Releases the ADC capability.
    pub fn free(self) -> A {
        self.adc
    }

    /// Configures a single conversion on `channel` and starts it.
    ///
    /// The completion interrupt fires later. Which channel belongs to which phase is
    /// the caller's business.
    ///
    /// # Notes
    /// Must not be called while a cycle is in flight. This is not checked.
    pub fn arm_conversion(&mut self, channel: Channel) {
        self.adc.configure(AdcConfig::single_shot(channel));
        self.adc.enable();
        self.adc.start_conversion();
    }

    /// Starts a new cycle with the reference conversion.
    ///
    /// # Notes
    /// Must only be called while [`SamplingState::Idle`]. This is not checked.
    pub fn begin_cycle(&mut self) {
        self.state = SamplingState::AwaitingReferenceSample;
        self.arm_conversion(Channel::Reference);
    }

    /// Advances the machine by one ADC event.
    ///
    /// # Behavior
    /// - `Overflow`: clears the overflow flag, nothing else
    /// - `ResultAvailable` awaiting the reference: stores slot 0 and chains the
    ///   thermistor conversion before returning
    /// - `ResultAvailable` awaiting the thermistor: stores slot 1, disables the ADC,
    ///   returns to idle and asks for wake
    /// - `ResultAvailable` while idle: clears the flag and is otherwise ignored
    /// - anything else is a no-op
    pub fn on_event(&mut self, event: AdcEvent) -> IsrAction {
        match event {
            AdcEvent::Overflow => {
                self.adc.clear_overflow();
                self.overflows = self.overflows.wrapping_add(1);
                warn!("sd14 overflow discarded in {:?}", self.state);
                IsrAction::Return
            }
            AdcEvent::ResultAvailable(code) => {
                self.adc.clear_data_ready();
                self.on_result(code)
            }
            AdcEvent::None | AdcEvent::Other(_) => IsrAction::Return,
        }
    }

    fn on_result(&mut self, code: u16) -> IsrAction {
        match self.state {
            SamplingState::AwaitingReferenceSample => {
                self.buffer.slots[SampleBuffer::REFERENCE_SLOT] = code;
                self.state = SamplingState::AwaitingThermistorSample;
                // Both samples must fall in one excitation window.
                self.arm_conversion(Channel::Thermistor);
                IsrAction::Return
            }
            SamplingState::AwaitingThermistorSample => {
                self.buffer.slots[SampleBuffer::THERMISTOR_SLOT] = code;
                self.adc.disable();
                self.state = SamplingState::Idle;
                self.cycles = self.cycles.wrapping_add(1);
                debug!(
                    "sample pair ready: reference={} thermistor={}",
                    self.buffer.reference(),
                    self.buffer.thermistor()
                );
                IsrAction::WakeOnExit
            }
            SamplingState::Idle => {
                trace!("spurious sd14 result {} while idle", code);
                IsrAction::Return
            }
        }
    }

    /// Reads and dispatches the pending ADC interrupt. Call from the SD14 vector.
    pub fn service_interrupt(&mut self) -> IsrAction {
        let vector = self.adc.interrupt_vector();
        let adc = &mut self.adc;
        let event = AdcEvent::from_vector(vector, || adc.read_result());
        self.on_event(event)
    }
}

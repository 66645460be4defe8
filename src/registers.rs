//! Register-level capability interface for the tag peripherals.
//!
//! The state machines in this crate never poke registers directly. They drive the
//! SD14 ADC, the RF13M radio, Timer_A and the FRAM lock bits through the small
//! traits defined here, which keeps them hardware-agnostic and lets tests inject
//! synthetic interrupts. [`crate::mmio`] provides the volatile implementations used
//! on the tag itself.
//!
//! Control registers are `bilge` bitfields laid out after the RF430FRL15xH register
//! map, least significant bit first. Only the fields this crate touches carry
//! meaning; the rest is `reserved`.

use bilge::prelude::*;

/// SD14IV: no interrupt pending.
pub const SD14IV_NONE: u16 = 0x0000;
/// SD14IV: result register overflow.
pub const SD14IV_OV: u16 = 0x0002;
/// SD14IV: conversion result available.
pub const SD14IV_RES: u16 = 0x0004;

/// SD14 clock divider selecting ACLK / 32.
pub const SD14_ACLK_DIV_32: u2 = u2::new(0b10);
/// SD14 gain code for x2.
pub const SD14_GAIN_X2: u3 = u3::new(0b001);

/// Physical ADC input routed to the SD14 for a conversion phase.
#[bitsize(2)]
#[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Channel {
    /// External ADC0 input.
    #[default]
    Adc0 = 0b00,
    /// On-die temperature sensor.
    InternalTemperature = 0b01,
    /// Thermistor leg of the bridge (ADC2).
    Thermistor = 0b10,
    /// Reference resistor leg of the bridge (ADC1).
    Reference = 0b11,
}

/// SD14CTL0
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Sd14Control0 {
    /// Module enable (SD14EN)
    pub enable: bool,
    /// Start conversion (SD14SC)
    pub start_conversion: bool,
    /// Result interrupt enable (SD14IE)
    pub interrupt_enable: bool,
    /// Result available, the data-ready flag (SD14IFG)
    pub data_ready: bool,
    reserved: u1,
    /// Result overwritten before it was read (SD14OVIFG)
    pub overflow: bool,
    /// Single conversion mode (SD14SGL)
    pub single_conversion: bool,
    reserved: u1,
    /// ACLK divider (SD14DIVx)
    pub clock_divider: u2,
    reserved: u6,
}

/// SD14CTL1
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Sd14Control1 {
    /// Input channel (SD14INCHx)
    pub channel: Channel,
    reserved: u2,
    /// Discard the first CIC filter output (SD14INTDLY0)
    pub interrupt_delay: bool,
    reserved: u3,
    /// Programmable gain (SD14GAINx)
    pub gain: u3,
    /// Unipolar conversion (SD14UNI)
    pub unipolar: bool,
    /// Reference bias current source 0 (SD14RBEN0)
    pub reference_bias_0: bool,
    /// Reference bias current source 1 (SD14RBEN1)
    pub reference_bias_1: bool,
    reserved: u2,
}

/// Control words for a single SD14 conversion.
///
/// Built once per phase by [`AdcConfig::single_shot`]; the gain, excitation current
/// and clocking are fixed, only the channel changes between phases.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct AdcConfig {
    /// SD14CTL0, without the enable and start bits.
    pub ctl0: Sd14Control0,
    /// SD14CTL1.
    pub ctl1: Sd14Control1,
}

impl AdcConfig {
    /// Gain x2, unipolar, both excitation current sources on, one-sample interrupt
    /// delay for the CIC filter, single conversion clocked from ACLK / 32 with the
    /// result interrupt enabled.
    pub fn single_shot(channel: Channel) -> Self {
        let mut ctl0 = Sd14Control0::from(0);
        ctl0.set_interrupt_enable(true);
        ctl0.set_single_conversion(true);
        ctl0.set_clock_divider(SD14_ACLK_DIV_32);

        let mut ctl1 = Sd14Control1::from(0);
        ctl1.set_channel(channel);
        ctl1.set_interrupt_delay(true);
        ctl1.set_gain(SD14_GAIN_X2);
        ctl1.set_unipolar(true);
        ctl1.set_reference_bias_0(true);
        ctl1.set_reference_bias_1(true);

        Self { ctl0, ctl1 }
    }

    /// The channel selected by this configuration.
    pub fn channel(&self) -> Channel {
        self.ctl1.channel()
    }

    /// Whether the bridge excitation current is switched on.
    pub fn excitation_enabled(&self) -> bool {
        self.ctl1.reference_bias_0() && self.ctl1.reference_bias_1()
    }
}

/// A decoded SD14 interrupt.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum AdcEvent {
    /// Nothing pending.
    None,
    /// A result was produced before the previous one was read.
    Overflow,
    /// A conversion finished with the given raw code.
    ResultAvailable(u16),
    /// A vector code this crate does not handle.
    Other(u16),
}

impl AdcEvent {
    /// Decodes an SD14IV value. `result` is only read for a result vector.
    pub fn from_vector(vector: u16, result: impl FnOnce() -> u16) -> Self {
        match vector {
            SD14IV_NONE => AdcEvent::None,
            SD14IV_OV => AdcEvent::Overflow,
            SD14IV_RES => AdcEvent::ResultAvailable(result()),
            other => AdcEvent::Other(other),
        }
    }
}

/// Capability interface to the SD14 delta-sigma ADC.
pub trait AdcRegisters {
    /// Writes both control words. Leaves the enable bit as it was.
    fn configure(&mut self, config: AdcConfig);
    /// Powers the module up.
    fn enable(&mut self);
    /// Triggers a conversion with the current configuration.
    fn start_conversion(&mut self);
    /// Powers the module down, removing its standby current.
    fn disable(&mut self);
    /// Reads the interrupt vector register.
    fn interrupt_vector(&mut self) -> u16;
    /// Reads the conversion result register.
    fn read_result(&mut self) -> u16;
    /// Clears the overflow flag.
    fn clear_overflow(&mut self);
    /// Clears the data-ready flag.
    fn clear_data_ready(&mut self);
}

/// RF13MCTL
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RadioControl {
    /// Transmit enable, uplink (RF13MTXEN)
    pub tx_enable: bool,
    /// Receive enable, downlink (RF13MRXEN)
    pub rx_enable: bool,
    /// RF timeout detection (RF13MRFTOEN)
    pub rf_timeout_enable: bool,
    /// Big-endian FIFO byte order (RF13MBE)
    pub big_endian: bool,
    reserved: u1,
    /// Manual ISO 15693 configuration (RF13MMCFG)
    pub manual_config: bool,
    /// Inventory response mode
    pub inventory: bool,
    /// High data rate (RF13MDR)
    pub high_data_rate: bool,
    /// Two-subcarrier response (RF13MSC)
    pub two_subcarriers: bool,
    reserved: u7,
}

/// RF13MINT: flags in the low byte, enables in the high byte.
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RadioInterrupts {
    /// Receive done flag (RF13MRXIFG)
    pub rx_done_flag: bool,
    /// Transmit done flag (RF13MTXIFG)
    pub tx_done_flag: bool,
    reserved: u1,
    /// RF timeout flag (RF13MRFTOIFG)
    pub rf_timeout_flag: bool,
    reserved: u4,
    /// Receive done interrupt enable (RF13MRXIE)
    pub rx_done_enable: bool,
    /// Transmit done interrupt enable (RF13MTXIE)
    pub tx_done_enable: bool,
    reserved: u1,
    /// RF timeout interrupt enable (RF13MRFTOIE)
    pub rf_timeout_enable: bool,
    reserved: u4,
}

/// Capability interface to the RF13M contactless front end.
///
/// The protocol engine itself lives in ROM; this crate only flips its enable bits
/// and feeds its transmit FIFO.
pub trait RadioRegisters {
    /// Reads RF13MCTL.
    fn control(&mut self) -> RadioControl;
    /// Writes RF13MCTL.
    fn write_control(&mut self, control: RadioControl);
    /// Reads RF13MINT.
    fn interrupts(&mut self) -> RadioInterrupts;
    /// Writes RF13MINT.
    fn write_interrupts(&mut self, interrupts: RadioInterrupts);
    /// Pushes one byte into the transmit FIFO.
    fn push_tx_fifo(&mut self, byte: u8);

    /// Read-modify-write of RF13MCTL.
    fn modify_control(&mut self, f: impl FnOnce(&mut RadioControl)) {
        let mut control = self.control();
        f(&mut control);
        self.write_control(control);
    }

    /// Read-modify-write of RF13MINT.
    fn modify_interrupts(&mut self, f: impl FnOnce(&mut RadioInterrupts)) {
        let mut interrupts = self.interrupts();
        f(&mut interrupts);
        self.write_interrupts(interrupts);
    }
}

/// Timer_A counting mode (MCx).
#[bitsize(2)]
#[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TimerMode {
    /// Halted.
    #[default]
    Stop = 0b00,
    /// Count up to TA0CCR0.
    Up = 0b01,
    /// Count up to 0xFFFF.
    Continuous = 0b10,
    /// Count up to TA0CCR0 and back down.
    UpDown = 0b11,
}

/// Timer_A input clock (TASSELx).
#[bitsize(2)]
#[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ClockSource {
    /// External TACLK pin.
    #[default]
    Taclk = 0b00,
    /// ACLK.
    Aclk = 0b01,
    /// SMCLK.
    Smclk = 0b10,
    /// Inverted external clock.
    Inclk = 0b11,
}

/// Timer_A input divider (IDx).
#[bitsize(2)]
#[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum InputDivider {
    /// /1
    #[default]
    Div1 = 0b00,
    /// /2
    Div2 = 0b01,
    /// /4
    Div4 = 0b10,
    /// /8
    Div8 = 0b11,
}

impl InputDivider {
    /// The division factor.
    pub const fn factor(self) -> u32 {
        match self {
            InputDivider::Div1 => 1,
            InputDivider::Div2 => 2,
            InputDivider::Div4 => 4,
            InputDivider::Div8 => 8,
        }
    }
}

/// TA0CTL
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TimerControl {
    /// Counter overflow flag (TAIFG)
    pub overflow_flag: bool,
    /// Counter overflow interrupt enable (TAIE)
    pub overflow_interrupt_enable: bool,
    /// Reset the counter and divider (TACLR)
    pub clear: bool,
    reserved: u1,
    /// Counting mode (MCx)
    pub mode: TimerMode,
    /// Input divider (IDx)
    pub input_divider: InputDivider,
    /// Clock source (TASSELx)
    pub clock_source: ClockSource,
    reserved: u6,
}

/// TA0CCTL0
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct CompareControl {
    /// Compare interrupt flag (CCIFG)
    pub interrupt_flag: bool,
    /// Capture overflow (COV)
    pub capture_overflow: bool,
    /// Output level in output mode 0 (OUT)
    pub output: bool,
    /// Capture/compare input level (CCI)
    pub input: bool,
    /// Compare interrupt enable (CCIE)
    pub interrupt_enable: bool,
    /// Output mode (OUTMODx)
    pub output_mode: u3,
    /// Capture mode instead of compare (CAP)
    pub capture_mode: bool,
    reserved: u7,
}

/// Capability interface to the Timer_A block that raises the timeout event.
pub trait TimerRegisters {
    /// Writes the compare register (TA0CCR0).
    fn set_compare(&mut self, value: u16);
    /// Writes the timer control register (TA0CTL).
    fn set_control(&mut self, control: TimerControl);
    /// Enables the compare interrupt.
    fn enable_compare_interrupt(&mut self);
    /// Clears the compare interrupt flag.
    fn clear_compare_flag(&mut self);
}

/// Write access to the FRAM block lock bits.
pub trait LockMemory {
    /// Overwrites the whole lock region.
    fn write_locks(&mut self, bytes: &[u8; crate::consts::LOCK_REGION_LEN]);
}

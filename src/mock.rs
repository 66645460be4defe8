//! Test doubles for the register capability traits.
//!
//! `MockAdc`, `MockRadio`, `MockTimer` and `MockLocks` replay an expected
//! transaction list through `embedded_hal_mock`'s generic queue and panic on the
//! first mismatch; call `done()` at the end of each test. `SimAdc` is a small
//! behavioural model of the SD14 for end-to-end runs.

use std::collections::VecDeque;

use embedded_hal_mock::common::Generic;

use crate::consts::LOCK_REGION_LEN;
use crate::registers::{
    AdcConfig, AdcRegisters, Channel, LockMemory, RadioControl, RadioInterrupts, RadioRegisters,
    SD14IV_NONE, SD14IV_OV, SD14IV_RES, Sd14Control0, Sd14Control1, TimerControl, TimerRegisters,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AdcTransaction {
    Configure(AdcConfig),
    Enable,
    StartConversion,
    Disable,
    InterruptVector(u16),
    ReadResult(u16),
    ClearOverflow,
    ClearDataReady,
}

pub(crate) struct MockAdc {
    expectations: Generic<AdcTransaction>,
}

impl MockAdc {
    pub(crate) fn new(expectations: &[AdcTransaction]) -> Self {
        Self {
            expectations: Generic::new(expectations),
        }
    }

    pub(crate) fn done(&mut self) {
        self.expectations.done();
    }

    fn expect(&mut self, actual: AdcTransaction) {
        let expected = self
            .expectations
            .next()
            .unwrap_or_else(|| panic!("no expectation left for {:?}", actual));
        assert_eq!(expected, actual);
    }
}

impl AdcRegisters for MockAdc {
    fn configure(&mut self, config: AdcConfig) {
        self.expect(AdcTransaction::Configure(config));
    }

    fn enable(&mut self) {
        self.expect(AdcTransaction::Enable);
    }

    fn start_conversion(&mut self) {
        self.expect(AdcTransaction::StartConversion);
    }

    fn disable(&mut self) {
        self.expect(AdcTransaction::Disable);
    }

    fn interrupt_vector(&mut self) -> u16 {
        match self.expectations.next() {
            Some(AdcTransaction::InterruptVector(vector)) => vector,
            other => panic!("expected {:?}, got interrupt vector read", other),
        }
    }

    fn read_result(&mut self) -> u16 {
        match self.expectations.next() {
            Some(AdcTransaction::ReadResult(code)) => code,
            other => panic!("expected {:?}, got result read", other),
        }
    }

    fn clear_overflow(&mut self) {
        self.expect(AdcTransaction::ClearOverflow);
    }

    fn clear_data_ready(&mut self) {
        self.expect(AdcTransaction::ClearDataReady);
    }
}

/// Behavioural SD14: a started conversion completes immediately with the next
/// queued code and raises the data-ready flag.
#[derive(Debug, Default)]
pub(crate) struct SimAdc {
    pub(crate) ctl0: Sd14Control0,
    pub(crate) ctl1: Sd14Control1,
    pub(crate) result: u16,
    pub(crate) codes: VecDeque<u16>,
    pub(crate) conversions: Vec<Channel>,
    pub(crate) disables: usize,
}

impl SimAdc {
    pub(crate) fn with_codes(codes: &[u16]) -> Self {
        Self {
            codes: codes.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn raise_overflow(&mut self) {
        self.ctl0.set_overflow(true);
    }

    pub(crate) fn interrupt_pending(&self) -> bool {
        self.ctl0.interrupt_enable() && (self.ctl0.data_ready() || self.ctl0.overflow())
    }

    pub(crate) fn enabled(&self) -> bool {
        self.ctl0.enable()
    }
}

impl AdcRegisters for SimAdc {
    fn configure(&mut self, config: AdcConfig) {
        let enabled = self.ctl0.enable();
        self.ctl0 = config.ctl0;
        self.ctl0.set_enable(enabled);
        self.ctl1 = config.ctl1;
    }

    fn enable(&mut self) {
        self.ctl0.set_enable(true);
    }

    fn start_conversion(&mut self) {
        assert!(self.enabled(), "conversion started with the SD14 disabled");
        self.conversions.push(self.ctl1.channel());
        self.result = self.codes.pop_front().unwrap_or(0);
        self.ctl0.set_data_ready(true);
    }

    fn disable(&mut self) {
        self.ctl0.set_enable(false);
        self.disables += 1;
    }

    fn interrupt_vector(&mut self) -> u16 {
        if self.ctl0.overflow() {
            SD14IV_OV
        } else if self.ctl0.data_ready() {
            SD14IV_RES
        } else {
            SD14IV_NONE
        }
    }

    fn read_result(&mut self) -> u16 {
        self.result
    }

    fn clear_overflow(&mut self) {
        self.ctl0.set_overflow(false);
    }

    fn clear_data_ready(&mut self) {
        self.ctl0.set_data_ready(false);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RadioTransaction {
    WriteControl(RadioControl),
    WriteInterrupts(RadioInterrupts),
    PushTxFifo(u8),
}

/// Radio double that both checks the transaction order (when built with
/// expectations) and models RF13MCTL / RF13MINT so properties can be asserted on
/// the register state seen at each write.
pub(crate) struct MockRadio {
    expectations: Option<Generic<RadioTransaction>>,
    pub(crate) control: RadioControl,
    pub(crate) interrupts: RadioInterrupts,
    pub(crate) fifo: Vec<u8>,
    /// RF13MCTL as observed at each FIFO push.
    pub(crate) control_at_push: Vec<RadioControl>,
}

impl MockRadio {
    pub(crate) fn new(expectations: &[RadioTransaction]) -> Self {
        Self {
            expectations: Some(Generic::new(expectations)),
            ..Self::model()
        }
    }

    pub(crate) fn model() -> Self {
        Self {
            expectations: None,
            control: RadioControl::from(0),
            interrupts: RadioInterrupts::from(0),
            fifo: Vec::new(),
            control_at_push: Vec::new(),
        }
    }

    pub(crate) fn done(&mut self) {
        if let Some(expectations) = self.expectations.as_mut() {
            expectations.done();
        }
    }

    fn expect(&mut self, actual: RadioTransaction) {
        if let Some(expectations) = self.expectations.as_mut() {
            let expected = expectations
                .next()
                .unwrap_or_else(|| panic!("no expectation left for {:?}", actual));
            assert_eq!(expected, actual);
        }
    }
}

impl RadioRegisters for MockRadio {
    fn control(&mut self) -> RadioControl {
        self.control
    }

    fn write_control(&mut self, control: RadioControl) {
        self.expect(RadioTransaction::WriteControl(control));
        self.control = control;
    }

    fn interrupts(&mut self) -> RadioInterrupts {
        self.interrupts
    }

    fn write_interrupts(&mut self, interrupts: RadioInterrupts) {
        self.expect(RadioTransaction::WriteInterrupts(interrupts));
        self.interrupts = interrupts;
    }

    fn push_tx_fifo(&mut self, byte: u8) {
        self.expect(RadioTransaction::PushTxFifo(byte));
        self.fifo.push(byte);
        self.control_at_push.push(self.control);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TimerTransaction {
    SetCompare(u16),
    SetControl(TimerControl),
    EnableCompareInterrupt,
    ClearCompareFlag,
}

pub(crate) struct MockTimer {
    expectations: Generic<TimerTransaction>,
}

impl MockTimer {
    pub(crate) fn new(expectations: &[TimerTransaction]) -> Self {
        Self {
            expectations: Generic::new(expectations),
        }
    }

    pub(crate) fn done(&mut self) {
        self.expectations.done();
    }

    fn expect(&mut self, actual: TimerTransaction) {
        let expected = self
            .expectations
            .next()
            .unwrap_or_else(|| panic!("no expectation left for {:?}", actual));
        assert_eq!(expected, actual);
    }
}

impl TimerRegisters for MockTimer {
    fn set_compare(&mut self, value: u16) {
        self.expect(TimerTransaction::SetCompare(value));
    }

    fn set_control(&mut self, control: TimerControl) {
        self.expect(TimerTransaction::SetControl(control));
    }

    fn enable_compare_interrupt(&mut self) {
        self.expect(TimerTransaction::EnableCompareInterrupt);
    }

    fn clear_compare_flag(&mut self) {
        self.expect(TimerTransaction::ClearCompareFlag);
    }
}

pub(crate) struct MockLocks {
    expectations: Generic<[u8; LOCK_REGION_LEN]>,
}

impl MockLocks {
    pub(crate) fn new(expectations: &[[u8; LOCK_REGION_LEN]]) -> Self {
        Self {
            expectations: Generic::new(expectations),
        }
    }

    pub(crate) fn done(&mut self) {
        self.expectations.done();
    }
}

impl LockMemory for MockLocks {
    fn write_locks(&mut self, bytes: &[u8; LOCK_REGION_LEN]) {
        let expected = self
            .expectations
            .next()
            .unwrap_or_else(|| panic!("unexpected lock region write {:?}", bytes));
        assert_eq!(&expected, bytes);
    }
}

//! The foreground sampling loop.
//!
//! [`Scheduler`] is the top-level control flow of the tag. Each iteration it starts
//! a sampling cycle, puts the CPU into a low-power state and only continues once the
//! ADC interrupt has completed both conversions and asked for wake. The loop never
//! ends; the tag simply loses power when the reader field goes away.
//!
//! The low-power instruction itself is supplied by the board through [`LowPower`],
//! which keeps this loop testable on a host.

use core::convert::Infallible;
use nb::block;

use crate::isr::{SharedSampler, global_sampler_setup, with_sampler};
use crate::registers::AdcRegisters;
use crate::sampler::SampleBuffer;

/// Entry into the processor's low-power state.
pub trait LowPower {
    /// Masks interrupts, evaluates `ready` and, only if it returned `false`, enables
    /// interrupts and enters low-power mode (LPM3 on the RF430) in one step. Returns
    /// at once when `ready` held, otherwise once an interrupt handler requested wake
    /// on exit.
    ///
    /// The check and the sleep entry must not be separable by an interrupt: a wake
    /// request raised between them would be lost and the CPU would sleep with the
    /// pair already complete. On the MSP430 core this is `DINT`, the check, then a
    /// single `BIS #GIE+LPM3, SR`.
    fn sleep_unless(&mut self, ready: impl FnOnce() -> bool);
}

fn poll<A: AdcRegisters>(sampler: &'static SharedSampler<A>) -> nb::Result<SampleBuffer, Infallible> {
    with_sampler(sampler, |sampler| sampler.samples())
        .flatten()
        .ok_or(nb::Error::WouldBlock)
}

/// The perpetual sample-and-sleep loop.
#[derive(Debug)]
pub struct Scheduler<A, P>
where
    A: AdcRegisters + 'static,
    P: LowPower,
{
    sampler: &'static SharedSampler<A>,
    power: P,
    cycles: u32,
}

impl<A, P> Scheduler<A, P>
where
    A: AdcRegisters + 'static,
    P: LowPower,
{
    /// Installs a fresh sampler around `adc` into `sampler` and takes over the
    /// low-power capability.
    ///
    /// Run [`crate::link::initialize_link`] before this.
    pub fn new(sampler: &'static SharedSampler<A>, adc: A, power: P) -> Self {
        global_sampler_setup(sampler, adc);
        Self {
            sampler,
            power,
            cycles: 0,
        }
    }

    /// Borrows the low-power capability.
    pub fn power(&self) -> &P {
        &self.power
    }

    /// Sample pairs handed out since construction. Wraps.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Starts the reference conversion of a new cycle.
    pub fn start_cycle(&mut self) {
        let _ = with_sampler(self.sampler, |sampler| sampler.begin_cycle());
    }

    /// Returns the sample pair once the cycle has completed.
    ///
    /// # Returns
    /// - `Ok(SampleBuffer)` while the sampler is idle
    /// - `Err(nb::Error::WouldBlock)` while a conversion is in flight
    pub fn poll_samples(&self) -> nb::Result<SampleBuffer, Infallible> {
        poll(self.sampler)
    }

    fn sleep_then_poll(&mut self) -> nb::Result<SampleBuffer, Infallible> {
        let sampler = self.sampler;
        self.power.sleep_unless(|| poll(sampler).is_ok());
        let polled = self.poll_samples();
        if polled.is_err() {
            trace!("woken mid-cycle, back to sleep");
        }
        polled
    }

    /// Runs one cycle: arm the reference conversion, sleep until the pair is
    /// complete, return it.
    ///
    /// The pair is checked before every sleep, so a cycle that completes before the
    /// CPU gets to sleep returns without sleeping. A wake that arrives before the
    /// pair is complete (for instance from another interrupt source) puts the CPU
    /// straight back to sleep.
    pub fn run_cycle(&mut self) -> SampleBuffer {
        self.start_cycle();
        let Ok(samples) = block!(self.sleep_then_poll());
        self.cycles = self.cycles.wrapping_add(1);
        samples
    }

    /// Runs cycles forever, handing every completed pair to `consume`.
    ///
    /// `consume` runs in the foreground while the sampler is idle; it is where the
    /// application publishes or post-processes the raw codes.
    pub fn run<F>(&mut self, mut consume: F) -> !
    where
        F: FnMut(SampleBuffer),
    {
        info!("sampling loop started");
        loop {
            let samples = self.run_cycle();
            consume(samples);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isr::{
        SharedTimeout, global_adc_interrupt, global_sampler_init, global_timeout_init,
        global_timeout_interrupt, global_timeout_setup,
    };
    use crate::mock::{MockRadio, MockTimer, SimAdc, TimerTransaction};
    use crate::registers::Channel;
    use crate::sampler::SamplingState;

    /// Services pending interrupts the way LPM3 would until one asks for wake.
    struct SimulatedSleep {
        sampler: &'static SharedSampler<SimAdc>,
        timeout: Option<&'static SharedTimeout<MockTimer, MockRadio>>,
        overflow_on_sleep: bool,
        /// The ADC interrupts run to completion after arming but before the
        /// foreground reaches the sleep entry.
        complete_before_sleep: bool,
        spurious_wakes: usize,
        sleeps: usize,
    }

    impl SimulatedSleep {
        fn new(sampler: &'static SharedSampler<SimAdc>) -> Self {
            Self {
                sampler,
                timeout: None,
                overflow_on_sleep: false,
                complete_before_sleep: false,
                spurious_wakes: 0,
                sleeps: 0,
            }
        }

        fn service_adc_until_wake(&mut self) {
            for _ in 0..8 {
                let pending =
                    with_sampler(self.sampler, |s| s.adc().interrupt_pending()).unwrap_or(false);
                assert!(pending, "asleep with no wake source pending");
                if global_adc_interrupt(self.sampler).wakes() {
                    return;
                }
            }
            panic!("sampler never requested wake");
        }
    }

    impl LowPower for SimulatedSleep {
        fn sleep_unless(&mut self, ready: impl FnOnce() -> bool) {
            if self.complete_before_sleep {
                self.service_adc_until_wake();
            }
            if ready() {
                return;
            }
            self.sleeps += 1;
            if self.spurious_wakes > 0 {
                self.spurious_wakes -= 1;
                return;
            }
            if let Some(timeout) = self.timeout {
                global_timeout_interrupt(timeout);
            }
            if self.overflow_on_sleep {
                let _ = with_sampler(self.sampler, |s| s.adc_mut().raise_overflow());
            }
            self.service_adc_until_wake();
        }
    }

    fn adc_snapshot(sampler: &'static SharedSampler<SimAdc>) -> (Vec<Channel>, usize, bool) {
        with_sampler(sampler, |s| {
            let adc = s.adc();
            (adc.conversions.clone(), adc.disables, adc.enabled())
        })
        .unwrap()
    }

    #[test]
    fn test_run_cycle_returns_same_cycle_pair() {
        static SAMPLER: SharedSampler<SimAdc> = global_sampler_init();
        let adc = SimAdc::with_codes(&[0x1234, 0x0ABC, 0x1235, 0x0ABD]);
        let mut scheduler = Scheduler::new(&SAMPLER, adc, SimulatedSleep::new(&SAMPLER));

        assert_eq!(scheduler.run_cycle().as_array(), [0x1234, 0x0ABC]);
        assert_eq!(scheduler.run_cycle().as_array(), [0x1235, 0x0ABD]);

        assert_eq!(scheduler.cycles(), 2);
        assert_eq!(scheduler.power().sleeps, 2);
        let (conversions, disables, enabled) = adc_snapshot(&SAMPLER);
        assert_eq!(
            conversions,
            [
                Channel::Reference,
                Channel::Thermistor,
                Channel::Reference,
                Channel::Thermistor
            ]
        );
        assert_eq!(disables, 2);
        assert!(!enabled);
    }

    #[test]
    fn test_poll_blocks_while_cycle_in_flight() {
        static SAMPLER: SharedSampler<SimAdc> = global_sampler_init();
        let adc = SimAdc::with_codes(&[1, 2]);
        let mut scheduler = Scheduler::new(&SAMPLER, adc, SimulatedSleep::new(&SAMPLER));

        assert_eq!(scheduler.poll_samples(), Ok(SampleBuffer::default()));
        scheduler.start_cycle();
        assert_eq!(scheduler.poll_samples(), Err(nb::Error::WouldBlock));

        assert!(!global_adc_interrupt(&SAMPLER).wakes());
        assert_eq!(scheduler.poll_samples(), Err(nb::Error::WouldBlock));
        assert!(global_adc_interrupt(&SAMPLER).wakes());
        assert_eq!(scheduler.poll_samples().map(|s| s.as_array()), Ok([1, 2]));
    }

    #[test]
    fn test_pair_completed_before_sleep_returns_without_sleeping() {
        static SAMPLER: SharedSampler<SimAdc> = global_sampler_init();
        let mut power = SimulatedSleep::new(&SAMPLER);
        power.complete_before_sleep = true;
        let adc = SimAdc::with_codes(&[0x0111, 0x0222, 0x0333, 0x0444]);
        let mut scheduler = Scheduler::new(&SAMPLER, adc, power);

        assert_eq!(scheduler.run_cycle().as_array(), [0x0111, 0x0222]);
        assert_eq!(scheduler.run_cycle().as_array(), [0x0333, 0x0444]);

        assert_eq!(scheduler.power().sleeps, 0);
        assert_eq!(scheduler.cycles(), 2);
        let (_, disables, enabled) = adc_snapshot(&SAMPLER);
        assert_eq!(disables, 2);
        assert!(!enabled);
    }

    #[test]
    fn test_early_wake_goes_back_to_sleep() {
        static SAMPLER: SharedSampler<SimAdc> = global_sampler_init();
        let mut power = SimulatedSleep::new(&SAMPLER);
        power.spurious_wakes = 2;
        let adc = SimAdc::with_codes(&[0x0100, 0x0200]);
        let mut scheduler = Scheduler::new(&SAMPLER, adc, power);

        assert_eq!(scheduler.run_cycle().as_array(), [0x0100, 0x0200]);
        assert_eq!(scheduler.power().sleeps, 3);
    }

    #[test]
    fn test_overflow_during_cycle_is_discarded() {
        static SAMPLER: SharedSampler<SimAdc> = global_sampler_init();
        let mut power = SimulatedSleep::new(&SAMPLER);
        power.overflow_on_sleep = true;
        let adc = SimAdc::with_codes(&[0x0300, 0x0400]);
        let mut scheduler = Scheduler::new(&SAMPLER, adc, power);

        assert_eq!(scheduler.run_cycle().as_array(), [0x0300, 0x0400]);
        assert_eq!(with_sampler(&SAMPLER, |s| s.overflows()), Some(1));
        assert_eq!(
            with_sampler(&SAMPLER, |s| s.state()),
            Some(SamplingState::Idle)
        );
    }

    #[test]
    fn test_timer_event_mid_cycle_does_not_disturb_sampling() {
        static SAMPLER: SharedSampler<SimAdc> = global_sampler_init();
        static TIMEOUT: SharedTimeout<MockTimer, MockRadio> = global_timeout_init();

        let mut radio = MockRadio::model();
        radio.control.set_rx_enable(true);
        global_timeout_setup(
            &TIMEOUT,
            MockTimer::new(&[TimerTransaction::ClearCompareFlag]),
            radio,
        );
        let mut power = SimulatedSleep::new(&SAMPLER);
        power.timeout = Some(&TIMEOUT);
        let adc = SimAdc::with_codes(&[0x0AAA, 0x0BBB]);
        let mut scheduler = Scheduler::new(&SAMPLER, adc, power);

        assert_eq!(scheduler.run_cycle().as_array(), [0x0AAA, 0x0BBB]);
        assert_eq!(scheduler.power().sleeps, 1);

        let res = critical_section::with(|cs| TIMEOUT.borrow(cs).take()).unwrap();
        let (mut timer, mut radio) = (res.timer, res.radio);
        assert_eq!(radio.fifo, [0xFF, 0x00, 0xFF, 0x00, 0x00, 0x00, 0xFF, 0xFF]);
        timer.done();
        radio.done();
    }

    #[test]
    #[should_panic(expected = "three pairs consumed")]
    fn test_run_hands_every_pair_to_consumer() {
        static SAMPLER: SharedSampler<SimAdc> = global_sampler_init();
        let adc = SimAdc::with_codes(&[10, 20, 11, 21, 12, 22]);
        let mut scheduler = Scheduler::new(&SAMPLER, adc, SimulatedSleep::new(&SAMPLER));

        let mut seen = Vec::new();
        scheduler.run(|samples| {
            seen.push(samples.as_array());
            if seen.len() == 3 {
                assert_eq!(seen, [[10, 20], [11, 21], [12, 22]]);
                panic!("three pairs consumed");
            }
        });
    }
}

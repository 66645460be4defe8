//! Interrupt glue.
//!
//! The sampler is shared between the foreground scheduler and the SD14 interrupt,
//! and the radio between the bootstrap and the timer interrupt. Both live in
//! `critical_section` mutexes so either side can reach them safely.
//!
//! ```rust,ignore
//! static SAMPLER: SharedSampler<Sd14> = global_sampler_init();
//! static TIMEOUT: SharedTimeout<TimerA0, Rf13m> = global_timeout_init();
//!
//! #[interrupt]
//! fn SD_ADC() {
//!     if global_adc_interrupt(&SAMPLER).wakes() {
//!         exit_lpm_on_return();
//!     }
//! }
//!
//! #[interrupt]
//! fn TIMER0_A0() {
//!     global_timeout_interrupt(&TIMEOUT);
//! }
//! ```

use core::cell::RefCell;
use critical_section::Mutex;

use crate::registers::{AdcRegisters, RadioRegisters, TimerRegisters};
use crate::sampler::{IsrAction, Sampler};
use crate::transmit::service_timeout;

/// A sampler shared between foreground and the ADC interrupt.
pub type SharedSampler<A> = Mutex<RefCell<Option<Sampler<A>>>>;

/// The timer and radio handed to the timeout interrupt.
#[derive(Debug)]
pub struct TimeoutResources<T, R> {
    /// Timer raising the compare event.
    pub timer: T,
    /// Radio the demo key is sent through.
    pub radio: R,
}

/// Timeout resources shared with the timer interrupt.
pub type SharedTimeout<T, R> = Mutex<RefCell<Option<TimeoutResources<T, R>>>>;

/// Used to initialize a global static [`SharedSampler`].
///
/// # Returns
/// * An empty mutex, filled later by [`global_sampler_setup`]
pub const fn global_sampler_init<A: AdcRegisters>() -> SharedSampler<A> {
    Mutex::new(RefCell::new(None))
}

/// Installs a fresh idle sampler around `adc`, replacing any previous one.
pub fn global_sampler_setup<A: AdcRegisters>(global: &'static SharedSampler<A>, adc: A) {
    critical_section::with(|cs| {
        let _ = global.borrow(cs).replace(Some(Sampler::new(adc)));
    });
}

/// Runs `f` against the installed sampler inside a critical section.
///
/// # Returns
/// * `None` if no sampler has been installed
pub fn with_sampler<A, F, T>(global: &'static SharedSampler<A>, f: F) -> Option<T>
where
    A: AdcRegisters,
    F: FnOnce(&mut Sampler<A>) -> T,
{
    critical_section::with(|cs| global.borrow_ref_mut(cs).as_mut().map(f))
}

/// Services the SD14 interrupt.
///
/// # Returns
/// * [`IsrAction::WakeOnExit`] once a sample pair has completed; the caller must
///   then clear the low-power bits of the stacked status register
/// * [`IsrAction::Return`] otherwise, including when no sampler is installed
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn SD_ADC() {
///     if global_adc_interrupt(&SAMPLER).wakes() {
///         exit_lpm_on_return();
///     }
/// }
/// ```
pub fn global_adc_interrupt<A: AdcRegisters>(global: &'static SharedSampler<A>) -> IsrAction {
    with_sampler(global, |sampler| sampler.service_interrupt()).unwrap_or(IsrAction::Return)
}

/// Used to initialize a global static [`SharedTimeout`].
pub const fn global_timeout_init<T, R>() -> SharedTimeout<T, R>
where
    T: TimerRegisters,
    R: RadioRegisters,
{
    Mutex::new(RefCell::new(None))
}

/// Hands the timer and radio over to the timeout interrupt.
///
/// Call after [`crate::link::initialize_link`] and after starting the timer.
pub fn global_timeout_setup<T, R>(global: &'static SharedTimeout<T, R>, timer: T, radio: R)
where
    T: TimerRegisters,
    R: RadioRegisters,
{
    critical_section::with(|cs| {
        let _ = global
            .borrow(cs)
            .replace(Some(TimeoutResources { timer, radio }));
    });
}

/// Services the Timer_A compare interrupt. Does nothing if the resources have not
/// been handed over yet.
pub fn global_timeout_interrupt<T, R>(global: &'static SharedTimeout<T, R>)
where
    T: TimerRegisters,
    R: RadioRegisters,
{
    critical_section::with(|cs| {
        if let Some(res) = global.borrow_ref_mut(cs).as_mut() {
            service_timeout(&mut res.timer, &mut res.radio);
        }
    });
}

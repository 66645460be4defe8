//! Timer_A setup for the timeout transmit event.
//!
//! The timeout event is a Timer_A CCR0 compare in up mode, clocked from ACLK.
//! This module turns a period in milliseconds into a compare value and programs
//! the timer through [`TimerRegisters`].
//!
//! Common periods at the default 64 kHz ACLK, divider 1:
//!
//! | Period  | Counts | TA0CCR0 |
//! |---------|--------|---------|
//! | 10 ms   | 640    | 639     |
//! | 250 ms  | 16000  | 15999   |
//! | 1000 ms | 64000  | 63999   |

use libm::round;
use thiserror::Error;

use crate::consts::ACLK_HZ;
use crate::registers::{ClockSource, InputDivider, TimerControl, TimerMode, TimerRegisters};

/// Errors raised while computing a timer compare value.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TimerError {
    /// The clock divider was zero.
    #[error("clock divider must be non-zero")]
    ZeroDivider,
    /// The period is shorter than one timer count.
    #[error("period shorter than one timer count")]
    PeriodTooShort,
    /// The period needs more than 65536 counts.
    #[error("period needs {0} counts, more than the 16-bit compare register holds")]
    CompareOverflow(u32),
}

/// Computes the TA0CCR0 value for a compare event every `period_ms`.
///
/// # Arguments
/// - `clock_hz`: timer input clock in Hz
/// - `divider`: input divider (1, 2, 4, 8)
/// - `period_ms`: desired period in milliseconds
///
/// # Returns
/// - The compare value; the timer counts `value + 1` ticks per period in up mode
pub fn compare_value(clock_hz: u32, divider: u32, period_ms: u32) -> Result<u16, TimerError> {
    if divider == 0 {
        return Err(TimerError::ZeroDivider);
    }
    let ticks_per_ms = clock_hz as f64 / divider as f64 / 1_000.0;
    let counts = round(ticks_per_ms * period_ms as f64);
    if counts < 1.0 {
        return Err(TimerError::PeriodTooShort);
    }
    if counts > (u16::MAX as f64) + 1.0 {
        return Err(TimerError::CompareOverflow(counts as u32));
    }
    Ok((counts as u32 - 1) as u16)
}

/// Programs Timer_A for a compare interrupt every `period_ms` from ACLK.
///
/// The timer is stopped and cleared before the compare value is written, then
/// started in up mode.
///
/// # Returns
/// - The compare value written to TA0CCR0
pub fn start_timeout_timer<T: TimerRegisters>(
    timer: &mut T,
    period_ms: u32,
) -> Result<u16, TimerError> {
    let divider = InputDivider::Div1;
    let compare = compare_value(ACLK_HZ, divider.factor(), period_ms)?;

    let mut control = TimerControl::from(0);
    control.set_clock_source(ClockSource::Aclk);
    control.set_input_divider(divider);
    control.set_clear(true);
    timer.set_control(control);
    timer.set_compare(compare);
    timer.enable_compare_interrupt();

    control.set_clear(false);
    control.set_mode(TimerMode::Up);
    timer.set_control(control);
    debug!("timeout timer armed: period={}ms ccr0={}", period_ms, compare);
    Ok(compare)
}

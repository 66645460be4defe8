//! Timeout transmit handler.
//!
//! On each Timer_A compare event the tag stops listening to the reader, loads the
//! demo key into the RF13M transmit FIFO and triggers transmission.
//!
//! This handler shares RF13MCTL with [`crate::link::initialize_link`] but never runs
//! concurrently with it: the bootstrap finishes before the timer is started.
//!
//! Downlink reception stays disabled after the handler returns; re-enabling it is
//! left to whoever owns the protocol session.

use crate::consts::DEMO_KEY;
use crate::registers::{RadioRegisters, TimerRegisters};

/// The demo key as it lands in the transmit FIFO: each word high byte first,
/// words in array order.
pub const fn demo_key_fifo_bytes() -> [u8; crate::consts::DEMO_KEY_FIFO_LEN] {
    let mut bytes = [0u8; crate::consts::DEMO_KEY_FIFO_LEN];
    let mut i = 0;
    while i < DEMO_KEY.len() {
        let [high, low] = DEMO_KEY[i].to_be_bytes();
        bytes[2 * i] = high;
        bytes[2 * i + 1] = low;
        i += 1;
    }
    bytes
}

/// Sends the demo key.
///
/// # Behavior
/// Strictly in this order:
/// 1. clear the receive-enable bit, so no reader command is taken mid-setup
/// 2. push [`demo_key_fifo_bytes`] into the transmit FIFO
/// 3. set the transmit-enable bit
///
/// Does not touch the sampler.
pub fn on_timeout<R: RadioRegisters>(radio: &mut R) {
    radio.modify_control(|control| control.set_rx_enable(false));
    for byte in demo_key_fifo_bytes() {
        radio.push_tx_fifo(byte);
    }
    radio.modify_control(|control| control.set_tx_enable(true));
    trace!("demo key queued");
}

/// Acknowledges the Timer_A compare event and runs [`on_timeout`]. Call from the
/// timer vector.
pub fn service_timeout<T, R>(timer: &mut T, radio: &mut R)
where
    T: TimerRegisters,
    R: RadioRegisters,
{
    timer.clear_compare_flag();
    on_timeout(radio);
}

//! One-time contactless link bootstrap.
//!
//! Puts the RF13M front end into the mode the ROM ISO 15693 stack expects and,
//! on request, clears the persisted block locks. Runs once from `main` before the
//! scheduler starts and before any timer interrupt is enabled.

use bilge::prelude::*;

use crate::layout::LockRegion;
use crate::registers::{LockMemory, RadioRegisters};

/// Bootstrap options.
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LinkOptions {
    reserved: u3,
    /// Overwrite the whole lock region with the unlocked pattern
    pub clear_block_locks: bool,
    reserved: u12,
}

impl LinkOptions {
    /// Options with only [`LinkOptions::clear_block_locks`] set.
    pub fn clearing_block_locks() -> Self {
        let mut options = Self::default();
        options.set_clear_block_locks(true);
        options
    }
}

/// Configures the contactless front end and optionally clears the block locks.
///
/// # Behavior
/// Sets, in order and without clearing anything:
/// 1. big-endian FIFO byte order
/// 2. receive enable
/// 3. transmit enable
/// 4. RF timeout detection
/// 5. manual ISO 15693 configuration
/// 6. inventory mode, high data rate and two subcarriers
///
/// then enables the receive-done, RF timeout and transmit-done interrupts. With
/// [`LinkOptions::clear_block_locks`] set the full lock region is overwritten with
/// `0xFF`; without it `locks` is never written, so previously locked blocks survive
/// a reset.
///
/// Calling it again with the same options yields the same radio and lock state.
pub fn initialize_link<R, L>(radio: &mut R, locks: &mut L, options: LinkOptions)
where
    R: RadioRegisters,
    L: LockMemory,
{
    radio.modify_control(|ctl| ctl.set_big_endian(true));
    radio.modify_control(|ctl| ctl.set_rx_enable(true));
    radio.modify_control(|ctl| ctl.set_tx_enable(true));
    radio.modify_control(|ctl| ctl.set_rf_timeout_enable(true));
    radio.modify_control(|ctl| ctl.set_manual_config(true));
    radio.modify_control(|ctl| {
        ctl.set_inventory(true);
        ctl.set_high_data_rate(true);
        ctl.set_two_subcarriers(true);
    });

    radio.modify_interrupts(|int| {
        int.set_rx_done_enable(true);
        int.set_rf_timeout_enable(true);
        int.set_tx_done_enable(true);
    });

    if options.clear_block_locks() {
        clear_block_locks(locks);
    }
    info!(
        "rf13m configured: ctl={} options={}",
        u16::from(radio.control()),
        u16::from(options)
    );
}

/// Marks every block writable.
pub fn clear_block_locks<L: LockMemory>(locks: &mut L) {
    locks.write_locks(LockRegion::unlocked().as_bytes());
}

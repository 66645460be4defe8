//! Constants shared across the tag core.
//!
//! This module pins down the fixed memory map of the persisted layouts, the
//! clocking assumptions behind the ADC and timer setup, and the demo key that the
//! timeout handler transmits.
//!
//! ## Memory map (FRAM)
//!
//! | Address  | Length | Content                                   |
//! |----------|--------|-------------------------------------------|
//! | `0xF840` | 38     | ISO 15693 block lock bits                 |
//! | `0xF867` | 1      | Firmware system control byte              |
//! | `0xF868` | 21     | Discoverable (NDEF) message               |
//!
//! These values are read by the ROM bootstrap and by external readers, so they
//! must never move.

/// Address of the ISO 15693 block lock bits in FRAM.
pub const LOCK_REGION_ADDRESS: usize = 0xF840;

/// Length (in bytes) of the lock bit region.
///
/// One bit per storage block; a cleared bit marks the block as locked.
pub const LOCK_REGION_LEN: usize = 38;

/// Byte pattern for a fully unlocked lock region.
pub const UNLOCKED_PATTERN: u8 = 0xFF;

/// Address of the firmware system control byte read by the ROM bootstrap.
pub const SYSTEM_CONTROL_ADDRESS: usize = 0xF867;

/// Address of the discoverable (NDEF) message.
pub const NDEF_MESSAGE_ADDRESS: usize = 0xF868;

/// Length (in bytes) of the discoverable message region.
pub const NDEF_MESSAGE_LEN: usize = 21;

/// Auxiliary clock frequency: the VLO routed to ACLK.
pub const ACLK_HZ: u32 = 64_000;

/// ACLK divider used by the SD14 so the modulator runs at 2 kHz.
pub const SD14_CLOCK_DIVIDER: u32 = 32;

/// Default interval between timeout transmissions, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u32 = 1_000;

/// Words pushed into the transmit FIFO by the timeout handler, high byte first.
pub const DEMO_KEY: [u16; 4] = [0xFF00, 0xFF00, 0x0000, 0xFFFF];

/// Number of bytes the demo key occupies in the transmit FIFO.
pub const DEMO_KEY_FIFO_LEN: usize = DEMO_KEY.len() * 2;

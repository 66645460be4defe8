//! # thermotag
//!
//! A portable, no_std control core for battery-less, RF-powered sensor tags built around
//! the RF430FRL15xH family: an ISO 15693 (NFC-V) transponder with an on-chip SD14
//! delta-sigma ADC, powered entirely from the reader's field.
//!
//! The crate implements:
//! - an interrupt-driven two-phase sampling state machine for a resistive temperature
//!   bridge (reference resistor, then thermistor) that chains both conversions inside
//!   the ADC interrupt and only wakes the foreground once the pair is complete
//! - a low-power scheduler loop that sleeps while a conversion is in flight
//! - the one-time contactless link bootstrap (RF13M mode bits and block-lock clearing)
//! - the timeout transmit handler that freezes downlink reception and queues a fixed
//!   key payload into the transmit FIFO
//! - typed views of the persisted layouts (system control byte, NDEF message, lock bits)
//!
//! Hardware access goes through small capability traits in [`registers`], so the state
//! machines run unchanged against the volatile register blocks in [`mmio`] on the tag and
//! against mocks on a host.
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` and enables the `critical-section` std implementation |
//! | `defmt-0-3` | Uses `defmt` logging |
//! | `log`       | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use thermotag::isr::{SharedSampler, global_sampler_init, global_adc_interrupt};
//! use thermotag::link::{LinkOptions, initialize_link};
//! use thermotag::mmio::{FramLocks, Rf13m, Sd14};
//! use thermotag::scheduler::Scheduler;
//!
//! static SAMPLER: SharedSampler<Sd14> = global_sampler_init();
//!
//! fn main() -> ! {
//!     let (mut radio, mut locks, adc) = unsafe { (Rf13m::take(), FramLocks::take(), Sd14::take()) };
//!     initialize_link(&mut radio, &mut locks, LinkOptions::clearing_block_locks());
//!     let mut scheduler = Scheduler::new(&SAMPLER, adc, Lpm3);
//!     scheduler.run(|samples| publish(samples))
//! }
//!
//! #[interrupt]
//! fn SD_ADC() {
//!     if global_adc_interrupt(&SAMPLER).wakes() {
//!         exit_lpm_on_return();
//!     }
//! }
//! ```
//!
//! --
//! Designed for `#![no_std]` use on energy-harvesting tags where every cycle counts.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
// bilge's #[bitsize] emits an undocumented `pub fn new`, so this cannot be deny.
#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

pub use critical_section;
pub use heapless;

#[macro_use]
mod fmt;

pub mod consts;
pub mod isr;
pub mod layout;
pub mod link;
pub mod mmio;
pub mod registers;
pub mod sampler;
pub mod scheduler;
pub mod timer;
pub mod transmit;

#[cfg(test)]
pub(crate) mod mock;

//! Volatile register blocks for the RF430FRL15xH.
//!
//! Each block is a base pointer plus fixed word offsets. [`Sd14::take`] and friends
//! use the device addresses; [`Sd14::new`] and friends accept any base, which is how
//! the host tests run these blocks against plain memory.
//!
//! | Block      | Base     | Registers (word offset)                                |
//! |------------|----------|--------------------------------------------------------|
//! | [`Sd14`]   | `0x0700` | CTL0 (0), CTL1 (1), MEM0 (2), IV (5)                   |
//! | [`Rf13m`]  | `0x0800` | CTL (0), INT (1), TXF (4)                              |
//! | [`TimerA0`]| `0x0340` | TA0CTL (0), TA0CCTL0 (1), TA0CCR0 (9)                  |
//! | [`FramLocks`] | [`LOCK_REGION_ADDRESS`] | 38 lock bytes                          |

use core::ptr;

use crate::consts::{LOCK_REGION_ADDRESS, LOCK_REGION_LEN};
use crate::registers::{
    AdcConfig, AdcRegisters, CompareControl, LockMemory, RadioControl, RadioInterrupts,
    RadioRegisters, Sd14Control0, TimerControl, TimerRegisters,
};

/// SD14 register block base address.
pub const SD14_BASE: usize = 0x0700;
/// RF13M register block base address.
pub const RF13M_BASE: usize = 0x0800;
/// Timer0_A3 register block base address.
pub const TIMER_A0_BASE: usize = 0x0340;

/// A 16-bit register block.
#[derive(Debug)]
struct Block(*mut u16);

impl Block {
    fn read(&self, word: usize) -> u16 {
        // Safety: the owner's constructor guarantees the block is valid.
        unsafe { ptr::read_volatile(self.0.add(word)) }
    }

    fn write(&mut self, word: usize, value: u16) {
        // Safety: the owner's constructor guarantees the block is valid.
        unsafe { ptr::write_volatile(self.0.add(word), value) }
    }

    fn modify(&mut self, word: usize, f: impl FnOnce(u16) -> u16) {
        let value = f(self.read(word));
        self.write(word, value);
    }
}

/// The SD14 delta-sigma ADC.
#[derive(Debug)]
pub struct Sd14 {
    regs: Block,
}

impl Sd14 {
    const CTL0: usize = 0;
    const CTL1: usize = 1;
    const MEM0: usize = 2;
    const IV: usize = 5;

    /// Wraps the SD14 block at `base`.
    ///
    /// # Safety
    /// `base` must point to six readable and writable words that nothing else
    /// accesses while this value lives.
    pub unsafe fn new(base: *mut u16) -> Self {
        Self { regs: Block(base) }
    }

    /// Takes the on-chip SD14.
    ///
    /// # Safety
    /// Only one `Sd14` may exist at a time.
    pub unsafe fn take() -> Self {
        // Safety: forwarded to the caller.
        unsafe { Self::new(SD14_BASE as *mut u16) }
    }

    fn modify_ctl0(&mut self, f: impl FnOnce(&mut Sd14Control0)) {
        self.regs.modify(Self::CTL0, |bits| {
            let mut ctl0 = Sd14Control0::from(bits);
            f(&mut ctl0);
            u16::from(ctl0)
        });
    }
}

// Safety: the block is owned exclusively.
unsafe impl Send for Sd14 {}

impl AdcRegisters for Sd14 {
    fn configure(&mut self, config: AdcConfig) {
        self.modify_ctl0(|ctl0| {
            let enabled = ctl0.enable();
            *ctl0 = config.ctl0;
            ctl0.set_enable(enabled);
        });
        self.regs.write(Self::CTL1, u16::from(config.ctl1));
    }

    fn enable(&mut self) {
        self.modify_ctl0(|ctl0| ctl0.set_enable(true));
    }

    fn start_conversion(&mut self) {
        self.modify_ctl0(|ctl0| ctl0.set_start_conversion(true));
    }

    fn disable(&mut self) {
        self.modify_ctl0(|ctl0| ctl0.set_enable(false));
    }

    fn interrupt_vector(&mut self) -> u16 {
        self.regs.read(Self::IV)
    }

    fn read_result(&mut self) -> u16 {
        self.regs.read(Self::MEM0)
    }

    fn clear_overflow(&mut self) {
        self.modify_ctl0(|ctl0| ctl0.set_overflow(false));
    }

    fn clear_data_ready(&mut self) {
        self.modify_ctl0(|ctl0| ctl0.set_data_ready(false));
    }
}

/// The RF13M ISO 15693 front end.
#[derive(Debug)]
pub struct Rf13m {
    regs: Block,
}

impl Rf13m {
    const CTL: usize = 0;
    const INT: usize = 1;
    const TXF: usize = 4;

    /// Wraps the RF13M block at `base`.
    ///
    /// # Safety
    /// `base` must point to five readable and writable words that nothing else
    /// accesses while this value lives.
    pub unsafe fn new(base: *mut u16) -> Self {
        Self { regs: Block(base) }
    }

    /// Takes the on-chip RF13M.
    ///
    /// # Safety
    /// Only one `Rf13m` may exist at a time, and the ROM stack must not be
    /// reconfiguring it concurrently.
    pub unsafe fn take() -> Self {
        // Safety: forwarded to the caller.
        unsafe { Self::new(RF13M_BASE as *mut u16) }
    }
}

// Safety: the block is owned exclusively.
unsafe impl Send for Rf13m {}

impl RadioRegisters for Rf13m {
    fn control(&mut self) -> RadioControl {
        RadioControl::from(self.regs.read(Self::CTL))
    }

    fn write_control(&mut self, control: RadioControl) {
        self.regs.write(Self::CTL, u16::from(control));
    }

    fn interrupts(&mut self) -> RadioInterrupts {
        RadioInterrupts::from(self.regs.read(Self::INT))
    }

    fn write_interrupts(&mut self, interrupts: RadioInterrupts) {
        self.regs.write(Self::INT, u16::from(interrupts));
    }

    fn push_tx_fifo(&mut self, byte: u8) {
        // Byte access to the low half of RF13MTXF.
        // Safety: the owner's constructor guarantees the block is valid.
        unsafe { ptr::write_volatile(self.regs.0.add(Self::TXF).cast::<u8>(), byte) }
    }
}

/// Timer0_A3, used for the periodic timeout event.
#[derive(Debug)]
pub struct TimerA0 {
    regs: Block,
}

impl TimerA0 {
    const CTL: usize = 0;
    const CCTL0: usize = 1;
    const CCR0: usize = 9;

    /// Wraps the timer block at `base`.
    ///
    /// # Safety
    /// `base` must point to ten readable and writable words that nothing else
    /// accesses while this value lives.
    pub unsafe fn new(base: *mut u16) -> Self {
        Self { regs: Block(base) }
    }

    /// Takes the on-chip Timer0_A3.
    ///
    /// # Safety
    /// Only one `TimerA0` may exist at a time.
    pub unsafe fn take() -> Self {
        // Safety: forwarded to the caller.
        unsafe { Self::new(TIMER_A0_BASE as *mut u16) }
    }

    fn modify_compare_control(&mut self, f: impl FnOnce(&mut CompareControl)) {
        self.regs.modify(Self::CCTL0, |bits| {
            let mut cctl = CompareControl::from(bits);
            f(&mut cctl);
            u16::from(cctl)
        });
    }
}

// Safety: the block is owned exclusively.
unsafe impl Send for TimerA0 {}

impl TimerRegisters for TimerA0 {
    fn set_compare(&mut self, value: u16) {
        self.regs.write(Self::CCR0, value);
    }

    fn set_control(&mut self, control: TimerControl) {
        self.regs.write(Self::CTL, u16::from(control));
    }

    fn enable_compare_interrupt(&mut self) {
        self.modify_compare_control(|cctl| cctl.set_interrupt_enable(true));
    }

    fn clear_compare_flag(&mut self) {
        self.modify_compare_control(|cctl| cctl.set_interrupt_flag(false));
    }
}

/// The persisted block-lock bytes in FRAM.
#[derive(Debug)]
pub struct FramLocks {
    base: *mut u8,
}

impl FramLocks {
    /// Wraps a lock region at `base`.
    ///
    /// # Safety
    /// `base` must point to [`LOCK_REGION_LEN`] writable bytes that nothing else
    /// accesses while this value lives.
    pub unsafe fn new(base: *mut u8) -> Self {
        Self { base }
    }

    /// Takes the lock region at [`LOCK_REGION_ADDRESS`].
    ///
    /// # Safety
    /// Only one `FramLocks` may exist at a time, and FRAM writes must be enabled.
    pub unsafe fn take() -> Self {
        // Safety: forwarded to the caller.
        unsafe { Self::new(LOCK_REGION_ADDRESS as *mut u8) }
    }
}

// Safety: the region is owned exclusively.
unsafe impl Send for FramLocks {}

impl LockMemory for FramLocks {
    fn write_locks(&mut self, bytes: &[u8; LOCK_REGION_LEN]) {
        for (i, &byte) in bytes.iter().enumerate() {
            // Safety: `i < LOCK_REGION_LEN`, covered by the constructor contract.
            unsafe { ptr::write_volatile(self.base.add(i), byte) }
        }
    }
}

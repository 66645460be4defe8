//! Persisted FRAM layouts.
//!
//! Three fixed regions are read by parties other than this crate: the ROM
//! bootstrap reads the [`SystemControlByte`], contactless readers parse the
//! [`DiscoverableMessage`] and the ROM RF stack honours the [`LockRegion`]. Each is
//! modelled as a typed structure with explicit offsets and serialised to the exact
//! byte image expected at its address (see [`crate::consts`]).
//!
//! ## Discoverable message image
//!
//! ```text
//! block 0: E1 40 F2 00   capability container: magic, version/access, size, features
//! block 1: 03 0B D1 01   NDEF TLV tag, TLV length, record header, type length
//! block 2: 07 55 01 74   payload length, type 'U', URI prefix, 't'
//! block 3: 69 2E 63 6F   'i' '.' 'c' 'o'
//! block 4: 6D FE 00 00   'm', TLV terminator, padding
//! (+1 trailing pad byte)
//! ```

use bilge::prelude::*;
use heapless::Vec;
use thiserror::Error;

use crate::consts::{LOCK_REGION_LEN, NDEF_MESSAGE_LEN, UNLOCKED_PATTERN};
use crate::registers::LockMemory;

/// Errors raised while building or parsing a persisted layout.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LayoutError {
    /// Bits 3-5 of the system control byte are reserved and must be zero.
    #[error("reserved system control bits set: {0:#04x}")]
    ReservedBits(u8),
    /// A capability container, TLV or record byte did not hold the expected value.
    #[error("unexpected byte {found:#04x} at offset {offset}")]
    UnexpectedByte {
        /// Offset into the image.
        offset: usize,
        /// The value found there.
        found: u8,
    },
    /// The image is shorter than the fixed region.
    #[error("image too short: {0} bytes")]
    Truncated(usize),
    /// The URI does not fit the fixed region.
    #[error("uri of {0} bytes does not fit the message region")]
    UriTooLong(usize),
    /// A lock bit index past the end of the region.
    #[error("block {0} is outside the lock region")]
    BlockOutOfRange(usize),
}

/// ISO 15693 block size exposed by the ROM stack.
#[bitsize(1)]
#[derive(FromBits, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum BlockSize {
    /// 4-byte blocks.
    FourBytes = 0,
    /// 8-byte blocks.
    EightBytes = 1,
}

/// Which ISO page is active. Only meaningful with 4-byte blocks.
#[bitsize(1)]
#[derive(FromBits, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum IsoPage {
    /// Page 1.
    Second = 0,
    /// Page 0.
    First = 1,
}

/// RF (NFC) bridge mode. The control bit is a *disable* bit.
#[bitsize(1)]
#[derive(FromBits, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RfBridge {
    /// Bridge mode on.
    Enabled = 0,
    /// Bridge mode off.
    Disabled = 1,
}

/// The firmware system control byte at [`crate::consts::SYSTEM_CONTROL_ADDRESS`].
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct SystemControlByte {
    /// Block size
    pub block_size: BlockSize,
    /// Active page
    pub page: IsoPage,
    /// eUSCI host controller support in ROM
    pub host_interface: bool,
    reserved: u3,
    /// RF (NFC) bridge mode
    pub rf_bridge: RfBridge,
    /// ROM sensor support
    pub sensor_rom: bool,
}

impl SystemControlByte {
    /// The encoded [`Default`]: 4-byte blocks on the first page, host interface off,
    /// RF bridge disabled, sensor ROM off.
    pub const DEFAULT_BITS: u8 = 0x42;

    /// Encodes the byte burned into FRAM.
    pub fn bits(self) -> u8 {
        u8::from(self)
    }

    /// Decodes a control byte, rejecting reserved bits.
    pub fn from_bits(bits: u8) -> Result<Self, LayoutError> {
        let parsed = Self::from(bits);
        let mut known = Self::from(0);
        known.set_block_size(parsed.block_size());
        known.set_page(parsed.page());
        known.set_host_interface(parsed.host_interface());
        known.set_rf_bridge(parsed.rf_bridge());
        known.set_sensor_rom(parsed.sensor_rom());

        let reserved = bits ^ known.bits();
        if reserved != 0 {
            return Err(LayoutError::ReservedBits(reserved));
        }
        Ok(parsed)
    }
}

impl Default for SystemControlByte {
    fn default() -> Self {
        let mut byte = Self::from(0);
        byte.set_block_size(BlockSize::FourBytes);
        byte.set_page(IsoPage::First);
        byte.set_host_interface(false);
        byte.set_rf_bridge(RfBridge::Disabled);
        byte.set_sensor_rom(false);
        byte
    }
}

/// Largest URI (after the prefix byte) that fits the message region.
pub const MAX_URI_LEN: usize = NDEF_MESSAGE_LEN - 12;

/// Byte image of the default discoverable message.
pub const DEFAULT_NDEF_MESSAGE: [u8; NDEF_MESSAGE_LEN] = [
    0xE1, 0x40, 0xF2, 0x00, // capability container
    0x03, 0x0B, 0xD1, 0x01, // TLV, record header, type length
    0x07, 0x55, 0x01, b't', // payload length, 'U', prefix, uri...
    b'i', b'.', b'c', b'o', //
    b'm', 0xFE, 0x00, 0x00, // terminator
    0x00,
];

/// Byte offsets into the discoverable message image.
mod offset {
    pub(super) const MAGIC: usize = 0;
    pub(super) const VERSION_ACCESS: usize = 1;
    pub(super) const MEMORY_SIZE: usize = 2;
    pub(super) const FEATURES: usize = 3;
    pub(super) const TLV_TAG: usize = 4;
    pub(super) const TLV_LEN: usize = 5;
    pub(super) const RECORD_HEADER: usize = 6;
    pub(super) const TYPE_LEN: usize = 7;
    pub(super) const PAYLOAD_LEN: usize = 8;
    pub(super) const RECORD_TYPE: usize = 9;
    pub(super) const URI_PREFIX: usize = 10;
    pub(super) const URI: usize = 11;
}

const CC_MAGIC: u8 = 0xE1;
const NDEF_TLV: u8 = 0x03;
const TERMINATOR_TLV: u8 = 0xFE;
/// MB | ME | SR, well-known TNF.
const SHORT_WELL_KNOWN_RECORD: u8 = 0xD1;
const URI_RECORD_TYPE: u8 = b'U';

/// The NDEF message at [`crate::consts::NDEF_MESSAGE_ADDRESS`]: a capability
/// container followed by a single short URI record.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct DiscoverableMessage {
    /// Mapping version and read/write access conditions.
    pub version_access: u8,
    /// Data area size in units of 8 bytes.
    pub memory_size: u8,
    /// Feature flags (multi-block read support).
    pub features: u8,
    /// URI identifier code, e.g. `0x01` for `http://www.`.
    pub uri_prefix: u8,
    /// URI body following the prefix.
    pub uri: Vec<u8, MAX_URI_LEN>,
}

impl Default for DiscoverableMessage {
    fn default() -> Self {
        let mut uri = Vec::new();
        // "ti.com" always fits
        let _ = uri.extend_from_slice(b"ti.com");
        Self {
            version_access: 0x40,
            memory_size: 0xF2,
            features: 0x00,
            uri_prefix: 0x01,
            uri,
        }
    }
}

impl DiscoverableMessage {
    /// Serialises the message into its fixed region image, zero padded.
    pub fn to_bytes(&self) -> [u8; NDEF_MESSAGE_LEN] {
        let uri_len = self.uri.len();
        let payload_len = 1 + uri_len as u8;
        let mut image = [0u8; NDEF_MESSAGE_LEN];
        image[offset::MAGIC] = CC_MAGIC;
        image[offset::VERSION_ACCESS] = self.version_access;
        image[offset::MEMORY_SIZE] = self.memory_size;
        image[offset::FEATURES] = self.features;
        image[offset::TLV_TAG] = NDEF_TLV;
        // record header, type length, payload length and type precede the payload
        image[offset::TLV_LEN] = 4 + payload_len;
        image[offset::RECORD_HEADER] = SHORT_WELL_KNOWN_RECORD;
        image[offset::TYPE_LEN] = 1;
        image[offset::PAYLOAD_LEN] = payload_len;
        image[offset::RECORD_TYPE] = URI_RECORD_TYPE;
        image[offset::URI_PREFIX] = self.uri_prefix;
        image[offset::URI..offset::URI + uri_len].copy_from_slice(&self.uri);
        image[offset::URI + uri_len] = TERMINATOR_TLV;
        image
    }

    /// Parses a region image produced by [`DiscoverableMessage::to_bytes`] or read
    /// back from the tag.
    pub fn parse(image: &[u8]) -> Result<Self, LayoutError> {
        if image.len() < NDEF_MESSAGE_LEN {
            return Err(LayoutError::Truncated(image.len()));
        }
        let expect = |offset: usize, value: u8| {
            if image[offset] == value {
                Ok(())
            } else {
                Err(LayoutError::UnexpectedByte {
                    offset,
                    found: image[offset],
                })
            }
        };
        expect(offset::MAGIC, CC_MAGIC)?;
        expect(offset::TLV_TAG, NDEF_TLV)?;
        expect(offset::RECORD_HEADER, SHORT_WELL_KNOWN_RECORD)?;
        expect(offset::TYPE_LEN, 1)?;
        expect(offset::RECORD_TYPE, URI_RECORD_TYPE)?;

        let payload_len = image[offset::PAYLOAD_LEN] as usize;
        if payload_len == 0 {
            return Err(LayoutError::UnexpectedByte {
                offset: offset::PAYLOAD_LEN,
                found: 0,
            });
        }
        let uri_len = payload_len - 1;
        if uri_len > MAX_URI_LEN {
            return Err(LayoutError::UriTooLong(uri_len));
        }
        expect(offset::TLV_LEN, (4 + payload_len) as u8)?;
        expect(offset::URI + uri_len, TERMINATOR_TLV)?;

        let mut uri = Vec::new();
        uri.extend_from_slice(&image[offset::URI..offset::URI + uri_len])
            .map_err(|_| LayoutError::UriTooLong(uri_len))?;
        Ok(Self {
            version_access: image[offset::VERSION_ACCESS],
            memory_size: image[offset::MEMORY_SIZE],
            features: image[offset::FEATURES],
            uri_prefix: image[offset::URI_PREFIX],
            uri,
        })
    }

    /// Builds a message for `uri` with the default container fields.
    pub fn with_uri(uri_prefix: u8, uri: &[u8]) -> Result<Self, LayoutError> {
        let mut body = Vec::new();
        body.extend_from_slice(uri)
            .map_err(|_| LayoutError::UriTooLong(uri.len()))?;
        Ok(Self {
            uri_prefix,
            uri: body,
            ..Self::default()
        })
    }
}

/// The ISO 15693 block lock bits at [`crate::consts::LOCK_REGION_ADDRESS`].
///
/// One bit per block, least significant bit first within each byte. A cleared
/// bit marks the block write-protected; a set bit leaves it writable.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct LockRegion {
    bytes: [u8; LOCK_REGION_LEN],
}

impl LockRegion {
    /// Number of blocks covered by the region.
    pub const BLOCKS: usize = LOCK_REGION_LEN * 8;

    /// A region with every block unlocked.
    pub const fn unlocked() -> Self {
        Self {
            bytes: [UNLOCKED_PATTERN; LOCK_REGION_LEN],
        }
    }

    /// Wraps a region image read back from FRAM.
    pub const fn from_bytes(bytes: [u8; LOCK_REGION_LEN]) -> Self {
        Self { bytes }
    }

    /// The raw region image.
    pub const fn as_bytes(&self) -> &[u8; LOCK_REGION_LEN] {
        &self.bytes
    }

    fn position(block: usize) -> Result<(usize, u8), LayoutError> {
        if block >= Self::BLOCKS {
            return Err(LayoutError::BlockOutOfRange(block));
        }
        Ok((block / 8, 1 << (block % 8)))
    }

    /// Whether `block` is write-protected.
    pub fn is_locked(&self, block: usize) -> Result<bool, LayoutError> {
        let (byte, mask) = Self::position(block)?;
        Ok(self.bytes[byte] & mask == 0)
    }

    /// Write-protects `block`.
    pub fn lock(&mut self, block: usize) -> Result<(), LayoutError> {
        let (byte, mask) = Self::position(block)?;
        self.bytes[byte] &= !mask;
        Ok(())
    }

    /// Whether no block is write-protected.
    pub fn all_unlocked(&self) -> bool {
        self.bytes.iter().all(|&b| b == UNLOCKED_PATTERN)
    }
}

impl Default for LockRegion {
    fn default() -> Self {
        Self::unlocked()
    }
}

impl LockMemory for LockRegion {
    fn write_locks(&mut self, bytes: &[u8; LOCK_REGION_LEN]) {
        self.bytes = *bytes;
    }
}

/// Places the system control byte and the default discoverable message into the
/// `.firmware_control` and `.ndef` linker sections.
///
/// The board's linker script must map those sections to
/// [`crate::consts::SYSTEM_CONTROL_ADDRESS`] and
/// [`crate::consts::NDEF_MESSAGE_ADDRESS`].
///
/// # Example
/// ```rust,ignore
/// thermotag::place_tag_layout!();
/// ```
#[macro_export]
macro_rules! place_tag_layout {
    () => {
        #[unsafe(link_section = ".firmware_control")]
        #[used]
        static FIRMWARE_SYSTEM_CONTROL_BYTE: u8 = $crate::layout::SystemControlByte::DEFAULT_BITS;

        #[unsafe(link_section = ".ndef")]
        #[used]
        static NFC_NDEF_MESSAGE: [u8; $crate::consts::NDEF_MESSAGE_LEN] =
            $crate::layout::DEFAULT_NDEF_MESSAGE;
    };
}

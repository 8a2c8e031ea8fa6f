//! Wire format primitives.
//!
//! Every out-of-line block (struct, array, map, boxed union) starts on an
//! 8-byte boundary. Pointers are 64-bit offsets relative to the pointer slot
//! itself; zero means null.

mod header;

#[cfg(test)]
mod header_tests;

pub use header::DataHeader;

use crate::error::{ValidationError, ValidationErrorKind};

/// Struct, array and map header size in bytes.
pub const HEADER_SIZE: usize = 8;

/// Pointer slot width in bits.
pub const POINTER_BITS: u32 = 64;

/// Handle slot width in bits.
pub const HANDLE_BITS: u32 = 32;

/// Enum slot width in bits (the 32-bit ordinal).
pub const ENUM_BITS: u32 = 32;

/// Inline union slot width in bits (size + tag + value).
pub const UNION_BITS: u32 = 128;

/// Union slot size in bytes.
pub const UNION_SIZE: u32 = 16;

/// Size of the implicit struct carrying a map's key and value arrays.
pub const MAP_NUM_BYTES: u32 = 24;

/// Byte offset of the key array pointer inside a map struct.
pub const MAP_KEYS_OFFSET: u32 = 0;

/// Byte offset of the value array pointer inside a map struct.
pub const MAP_VALUES_OFFSET: u32 = 8;

/// Encoded form of an absent handle.
pub const ENCODED_INVALID_HANDLE: u32 = u32::MAX;

/// Round `n` up to a multiple of 8.
#[inline]
pub fn align8(n: usize) -> usize {
    (n + 7) & !7
}

/// Round a bit cursor up to the natural alignment of a `bits`-wide value.
///
/// Values wider than 64 bits (union slots) align to 64.
#[inline]
pub fn align_bits(cursor: u64, bits: u32) -> u64 {
    let align = u64::from(bits.clamp(1, 64));
    cursor.div_ceil(align) * align
}

/// Bytes needed for an array of `len` elements of `element_bits` each,
/// header included.
pub fn array_num_bytes(len: u32, element_bits: u32) -> Option<u32> {
    let payload_bits = u64::from(len) * u64::from(element_bits);
    let total = HEADER_SIZE as u64 + payload_bits.div_ceil(8);
    u32::try_from(total).ok()
}

/// Write position inside one open block.
///
/// Each value is placed at the next offset aligned to its own width, which
/// reproduces the packed layout as long as fields are visited in
/// (offset, bit) order.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BlockCursor {
    /// Absolute byte offset of the first payload byte.
    base: usize,
    /// Bits consumed so far.
    cursor: u64,
    /// Payload capacity in bits.
    limit: u64,
}

impl BlockCursor {
    pub(crate) fn new(base: usize, limit_bits: u64) -> Self {
        Self {
            base,
            cursor: 0,
            limit: limit_bits,
        }
    }

    /// Reserve the next `bits`-wide slot. Returns its absolute byte position
    /// and the bit index within that byte.
    pub(crate) fn claim(&mut self, bits: u32) -> Result<(usize, u8), ValidationError> {
        let start = align_bits(self.cursor, bits);
        let end = start + u64::from(bits);
        if end > self.limit {
            return Err(ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                format!("{bits}-bit slot at bit {start} exceeds block of {} bits", self.limit),
            ));
        }
        self.cursor = end;
        Ok((self.base + (start / 8) as usize, (start % 8) as u8))
    }
}

/// Raw transferable handle (pipe, buffer, interface endpoint).
///
/// Raw value 0 is the invalid handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u32);

impl Handle {
    pub const INVALID: Self = Self(0);

    pub fn is_valid(&self) -> bool {
        self.0 != Self::INVALID.0
    }
}

/// Encoded message: the byte payload plus the handles moved alongside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub data: Vec<u8>,
    pub handles: Vec<Handle>,
}

impl Message {
    pub fn new(data: Vec<u8>, handles: Vec<Handle>) -> Self {
        Self { data, handles }
    }
}

/// One known version of a struct: version number and its full byte size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructVersion {
    pub version: u32,
    pub num_bytes: u32,
}

/// Check a decoded struct header against the struct's version history.
///
/// `versions` must be sorted by version number. A header naming a known
/// version must match its size exactly; a header naming an unknown version
/// must be at least as large as the closest older known version.
pub fn check_struct_version(
    header: DataHeader,
    versions: &[StructVersion],
) -> Result<(), ValidationError> {
    let version = header.elements_or_version;
    let Some(known) = versions.iter().rev().find(|v| v.version <= version) else {
        return Err(ValidationError::new(
            ValidationErrorKind::UnexpectedStructHeader,
            format!("unknown struct version {version}"),
        ));
    };

    let size_ok = if known.version == version {
        header.num_bytes == known.num_bytes
    } else {
        header.num_bytes >= known.num_bytes
    };
    if !size_ok {
        return Err(ValidationError::new(
            ValidationErrorKind::UnexpectedStructHeader,
            format!(
                "struct version {version} has size {}, expected {}",
                header.num_bytes, known.num_bytes
            ),
        ));
    }
    Ok(())
}

//! Data header shared by structs, arrays and maps (8 bytes).
//!
//! Layout:
//! - 0-3: total block size in bytes, header included
//! - 4-7: element count (arrays) or version number (structs, maps)

use super::{HEADER_SIZE, MAP_NUM_BYTES};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct DataHeader {
    pub num_bytes: u32,
    pub elements_or_version: u32,
}

const _: () = assert!(std::mem::size_of::<DataHeader>() == HEADER_SIZE);

impl DataHeader {
    pub fn new(num_bytes: u32, elements_or_version: u32) -> Self {
        Self {
            num_bytes,
            elements_or_version,
        }
    }

    /// Header of the implicit two-field struct that carries a map.
    pub fn map() -> Self {
        Self::new(MAP_NUM_BYTES, 0)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= HEADER_SIZE, "header too short");
        Self {
            num_bytes: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            elements_or_version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.num_bytes.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.elements_or_version.to_le_bytes());
        bytes
    }
}

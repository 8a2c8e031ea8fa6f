//! Message encoder.
//!
//! Blocks are appended to the end of the buffer in the order they are
//! started, so a pointer written with [`Encoder::write_pointer`] always
//! targets the next block started after it.

use crate::error::{Result, ValidationError, ValidationErrorKind};
use crate::wire::{
    BlockCursor, DataHeader, ENCODED_INVALID_HANDLE, HANDLE_BITS, HEADER_SIZE, Handle, Message,
    POINTER_BITS, UNION_BITS, UNION_SIZE, align8, array_num_bytes,
};

#[derive(Debug, Default)]
pub struct Encoder {
    data: Vec<u8>,
    handles: Vec<Handle>,
    blocks: Vec<BlockCursor>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open blocks.
    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    pub fn into_message(self) -> Message {
        Message::new(self.data, self.handles)
    }

    fn allocate(&mut self, num_bytes: usize) -> usize {
        let start = align8(self.data.len());
        self.data.resize(start + align8(num_bytes), 0);
        start
    }

    fn claim(&mut self, bits: u32) -> Result<(usize, u8)> {
        match self.blocks.last_mut() {
            Some(block) => block.claim(bits),
            None => Err(ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                "write outside of any block",
            )),
        }
    }

    fn put(&mut self, bits: u32, bytes: &[u8]) -> Result<()> {
        let (pos, _) = self.claim(bits)?;
        self.data[pos..pos + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn start_block(&mut self, header: DataHeader, payload_bits: u64) -> Result<()> {
        let num_bytes = header.num_bytes as usize;
        if num_bytes < HEADER_SIZE {
            return Err(ValidationError::new(
                ValidationErrorKind::UnexpectedStructHeader,
                format!("block of {num_bytes} bytes cannot hold a header"),
            ));
        }
        let start = self.allocate(num_bytes);
        self.data[start..start + HEADER_SIZE].copy_from_slice(&header.to_bytes());
        self.blocks.push(BlockCursor::new(start + HEADER_SIZE, payload_bits));
        Ok(())
    }

    /// Open a struct block of `num_bytes` (header included).
    pub fn start_struct(&mut self, num_bytes: u32, version: u32) -> Result<()> {
        let payload_bits = u64::from(num_bytes.saturating_sub(HEADER_SIZE as u32)) * 8;
        self.start_block(DataHeader::new(num_bytes, version), payload_bits)
    }

    pub fn start_array(&mut self, len: usize, element_bits: u32) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| {
            ValidationError::new(ValidationErrorKind::UnexpectedArrayHeader, "array too long")
        })?;
        let num_bytes = array_num_bytes(len, element_bits).ok_or_else(|| {
            ValidationError::new(ValidationErrorKind::UnexpectedArrayHeader, "array too large")
        })?;
        let payload_bits = u64::from(len) * u64::from(element_bits);
        self.start_block(DataHeader::new(num_bytes, len), payload_bits)
    }

    /// Open the implicit struct holding a map's key and value arrays.
    pub fn start_map(&mut self) -> Result<()> {
        let header = DataHeader::map();
        self.start_block(header, u64::from(header.num_bytes - HEADER_SIZE as u32) * 8)
    }

    /// Open a boxed union slot. The pointer to it must already be written.
    pub fn start_nested_union(&mut self) -> Result<()> {
        let start = self.allocate(UNION_SIZE as usize);
        self.blocks.push(BlockCursor::new(start, u64::from(UNION_BITS)));
        Ok(())
    }

    /// Write a union header into the next 128-bit slot and open its value
    /// slot. Close it with [`Encoder::finish`].
    pub fn start_union(&mut self, tag: u32) -> Result<()> {
        let (pos, _) = self.claim(UNION_BITS)?;
        self.data[pos..pos + 4].copy_from_slice(&UNION_SIZE.to_le_bytes());
        self.data[pos + 4..pos + 8].copy_from_slice(&tag.to_le_bytes());
        self.blocks.push(BlockCursor::new(pos + 8, 64));
        Ok(())
    }

    /// Leave the next 128-bit union slot zeroed.
    pub fn write_null_union(&mut self) -> Result<()> {
        self.claim(UNION_BITS).map(|_| ())
    }

    /// Close the innermost open block.
    pub fn finish(&mut self) -> Result<()> {
        self.blocks.pop().map(|_| ()).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                "finish without open block",
            )
        })
    }

    /// Write a relative offset to the block that will be started next.
    pub fn write_pointer(&mut self) -> Result<()> {
        let (pos, _) = self.claim(POINTER_BITS)?;
        let offset = (align8(self.data.len()) - pos) as u64;
        self.data[pos..pos + 8].copy_from_slice(&offset.to_le_bytes());
        Ok(())
    }

    pub fn write_null_pointer(&mut self) -> Result<()> {
        self.claim(POINTER_BITS).map(|_| ())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        let (pos, bit) = self.claim(1)?;
        if value {
            self.data[pos] |= 1 << bit;
        }
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.put(8, &value.to_le_bytes())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.put(16, &value.to_le_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.put(32, &value.to_le_bytes())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.put(64, &value.to_le_bytes())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.put(8, &[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.put(16, &value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.put(32, &value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.put(64, &value.to_le_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.put(32, &value.to_le_bytes())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.put(64, &value.to_le_bytes())
    }

    /// Write a string as a byte array. The pointer must already be written.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.start_array(value.len(), 8)?;
        for byte in value.bytes() {
            self.write_u8(byte)?;
        }
        self.finish()
    }

    /// Move `handle` into the message and write its index.
    pub fn write_handle(&mut self, handle: Handle) -> Result<()> {
        if !handle.is_valid() {
            return Err(ValidationErrorKind::UnexpectedInvalidHandle.into());
        }
        let index = self.handles.len() as u32;
        self.put(HANDLE_BITS, &index.to_le_bytes())?;
        self.handles.push(handle);
        Ok(())
    }

    pub fn write_invalid_handle(&mut self) -> Result<()> {
        self.put(HANDLE_BITS, &ENCODED_INVALID_HANDLE.to_le_bytes())
    }
}

//! Message decoder.
//!
//! Blocks must appear in the buffer in the order they are visited: each new
//! block starts at or after the end of the previously claimed one. Decoding
//! borrows the message; handles are only recorded as claimed, never removed.

use crate::error::{Result, ValidationError, ValidationErrorKind};
use crate::wire::{
    BlockCursor, DataHeader, ENCODED_INVALID_HANDLE, HANDLE_BITS, HEADER_SIZE, Handle, Message,
    POINTER_BITS, UNION_BITS, UNION_SIZE, align8, array_num_bytes,
};

#[derive(Debug)]
pub struct Decoder<'m> {
    data: &'m [u8],
    handles: &'m [Handle],
    blocks: Vec<BlockCursor>,
    /// End of the last claimed block.
    claimed_end: usize,
    /// Target of the last non-null pointer, consumed by the next block start.
    pending: Option<usize>,
    /// Lowest handle index that may still be claimed.
    next_handle: usize,
    claimed_handles: Vec<Handle>,
}

impl<'m> Decoder<'m> {
    pub fn new(message: &'m Message) -> Self {
        Self {
            data: &message.data,
            handles: &message.handles,
            blocks: Vec::new(),
            claimed_end: 0,
            pending: None,
            next_handle: 0,
            claimed_handles: Vec::new(),
        }
    }

    /// Number of open blocks.
    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// Handles referenced by the slots read so far, in message order.
    pub fn claimed_handles(&self) -> &[Handle] {
        &self.claimed_handles
    }

    fn claim(&mut self, bits: u32) -> Result<(usize, u8)> {
        match self.blocks.last_mut() {
            Some(block) => block.claim(bits),
            None => Err(ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                "read outside of any block",
            )),
        }
    }

    fn take<const N: usize>(&mut self, bits: u32) -> Result<[u8; N]> {
        let (pos, _) = self.claim(bits)?;
        let bytes = self.data.get(pos..pos + N).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                "read past end of message",
            )
        })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Locate the next block: the root at offset 0, or the target of the
    /// last pointer read.
    fn claim_block(&mut self, min_bytes: usize) -> Result<usize> {
        let start = match self.pending.take() {
            Some(start) => start,
            None if self.claimed_end == 0 && self.blocks.is_empty() => 0,
            None => {
                return Err(ValidationError::new(
                    ValidationErrorKind::IllegalPointer,
                    "block start without a preceding pointer",
                ));
            }
        };

        if start % 8 != 0 {
            return Err(ValidationError::new(
                ValidationErrorKind::MisalignedObject,
                format!("block at offset {start} is not 8-byte aligned"),
            ));
        }
        if start < self.claimed_end {
            return Err(ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                format!(
                    "block at offset {start} overlaps claimed memory ending at {}",
                    self.claimed_end
                ),
            ));
        }
        if start + min_bytes > self.data.len() {
            return Err(ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                format!("block at offset {start} runs past end of message"),
            ));
        }
        Ok(start)
    }

    fn start_block(&mut self) -> Result<(usize, DataHeader)> {
        let start = self.claim_block(HEADER_SIZE)?;
        let header = DataHeader::from_bytes(&self.data[start..start + HEADER_SIZE]);
        let num_bytes = header.num_bytes as usize;
        if num_bytes < HEADER_SIZE || start + num_bytes > self.data.len() {
            return Err(ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                format!("block at offset {start} declares {num_bytes} bytes"),
            ));
        }
        self.claimed_end = align8(start + num_bytes);
        Ok((start, header))
    }

    /// Open a struct block and return its header.
    pub fn start_struct(&mut self) -> Result<DataHeader> {
        let (start, header) = self.start_block()?;
        let payload_bits = (header.num_bytes as usize - HEADER_SIZE) as u64 * 8;
        self.blocks.push(BlockCursor::new(start + HEADER_SIZE, payload_bits));
        Ok(header)
    }

    pub fn start_map(&mut self) -> Result<()> {
        let header = self.start_struct()?;
        if header != DataHeader::map() {
            return Err(ValidationError::new(
                ValidationErrorKind::UnexpectedStructHeader,
                format!(
                    "map header {{{}, {}}} is not {{24, 0}}",
                    header.num_bytes, header.elements_or_version
                ),
            ));
        }
        Ok(())
    }

    /// Open an array block and return its element count.
    pub fn start_array(&mut self, element_bits: u32) -> Result<u32> {
        let (start, header) = self.start_block()?;
        let len = header.elements_or_version;
        let fits = array_num_bytes(len, element_bits).is_some_and(|n| header.num_bytes >= n);
        if !fits {
            return Err(ValidationError::new(
                ValidationErrorKind::UnexpectedArrayHeader,
                format!(
                    "{len} elements of {element_bits} bits do not fit in {} bytes",
                    header.num_bytes
                ),
            ));
        }
        let payload_bits = u64::from(len) * u64::from(element_bits);
        self.blocks.push(BlockCursor::new(start + HEADER_SIZE, payload_bits));
        Ok(len)
    }

    /// Open the boxed union slot targeted by the last pointer.
    pub fn start_nested_union(&mut self) -> Result<()> {
        let start = self.claim_block(UNION_SIZE as usize)?;
        self.claimed_end = start + UNION_SIZE as usize;
        self.blocks.push(BlockCursor::new(start, u64::from(UNION_BITS)));
        Ok(())
    }

    /// Read the next 128-bit union slot (size and tag, then the value).
    ///
    /// Returns `None` for a null union. Otherwise opens the value slot, which
    /// must be closed with [`Decoder::finish`].
    pub fn read_union_header(&mut self) -> Result<Option<u32>> {
        let (pos, _) = self.claim(UNION_BITS)?;
        let header = self
            .data
            .get(pos..pos + HEADER_SIZE)
            .map(DataHeader::from_bytes)
            .ok_or_else(|| ValidationError::from(ValidationErrorKind::IllegalMemoryRange))?;
        let (size, tag) = (header.num_bytes, header.elements_or_version);
        if size == 0 {
            return Ok(None);
        }
        if size != UNION_SIZE {
            return Err(ValidationError::new(
                ValidationErrorKind::UnexpectedStructHeader,
                format!("union size {size} is not {UNION_SIZE}"),
            ));
        }
        self.blocks.push(BlockCursor::new(pos + HEADER_SIZE, 64));
        Ok(Some(tag))
    }

    pub fn finish(&mut self) -> Result<()> {
        self.blocks.pop().map(|_| ()).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                "finish without open block",
            )
        })
    }

    /// Read a pointer slot. A non-zero value arms the next block start.
    pub fn read_pointer(&mut self) -> Result<u64> {
        self.pending = None;
        let (pos, _) = self.claim(POINTER_BITS)?;
        let bytes: [u8; 8] = self
            .data
            .get(pos..pos + 8)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| ValidationError::from(ValidationErrorKind::IllegalMemoryRange))?;
        let offset = u64::from_le_bytes(bytes);
        if offset != 0 {
            let target = (pos as u64)
                .checked_add(offset)
                .filter(|t| *t <= self.data.len() as u64)
                .ok_or_else(|| {
                    ValidationError::new(
                        ValidationErrorKind::IllegalPointer,
                        format!("pointer at {pos} with offset {offset} leaves the message"),
                    )
                })?;
            self.pending = Some(target as usize);
        }
        Ok(offset)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let (pos, bit) = self.claim(1)?;
        let byte = self
            .data
            .get(pos)
            .ok_or_else(|| ValidationError::from(ValidationErrorKind::IllegalMemoryRange))?;
        Ok(byte & (1 << bit) != 0)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.take(8).map(i8::from_le_bytes)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.take(16).map(i16::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.take(32).map(i32::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.take(64).map(i64::from_le_bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.take(8).map(u8::from_le_bytes)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.take(16).map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.take(32).map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.take(64).map(u64::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.take(32).map(f32::from_le_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.take(64).map(f64::from_le_bytes)
    }

    /// Read the byte array targeted by the last pointer as a string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.start_array(8)?;
        let mut bytes = Vec::with_capacity(len as usize);
        for _ in 0..len {
            bytes.push(self.read_u8()?);
        }
        self.finish()?;
        String::from_utf8(bytes).map_err(|_| ValidationErrorKind::InvalidUtf8.into())
    }

    /// Read a handle slot. The encoded invalid handle yields
    /// [`Handle::INVALID`]; the caller decides whether that is allowed.
    pub fn read_handle(&mut self) -> Result<Handle> {
        let raw = u32::from_le_bytes(self.take(HANDLE_BITS)?);
        if raw == ENCODED_INVALID_HANDLE {
            return Ok(Handle::INVALID);
        }
        let index = raw as usize;
        if index < self.next_handle || index >= self.handles.len() {
            return Err(ValidationError::new(
                ValidationErrorKind::IllegalHandle,
                format!(
                    "handle index {index} is out of order or beyond {} handles",
                    self.handles.len()
                ),
            ));
        }
        self.next_handle = index + 1;
        let handle = self.handles[index];
        self.claimed_handles.push(handle);
        Ok(handle)
    }
}

//! Table-driven message validation.
//!
//! Walks a message using only the pointer tables: no codec programs, no
//! values. Slots are located by their byte offsets. Every pointer is followed,
//! so each reachable block is checked for alignment, bounds and the nullness
//! rules recorded in its entry.
//!
//! Like the decoder, the walk claims memory as it goes: each block must start
//! at or past the end of the last claimed one, and handle indices must
//! increase. A block is therefore visited at most once.

use wirebind_format::tables::{
    ArrayEntry, ElementKind, StructEntry, StructTable, TableRef, UnionTable,
};
use wirebind_format::wire::{ENCODED_INVALID_HANDLE, HEADER_SIZE, UNION_SIZE, align8};
use wirebind_format::{
    DataHeader, Message, Result, TypeTables, ValidationError, ValidationErrorKind,
};

use super::interpreter::DEFAULT_MAX_DEPTH;

/// Counts of the slots visited by a successful walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Non-null pointers followed.
    pub pointers: usize,
    /// Valid handles seen.
    pub handles: usize,
}

pub struct TableWalker<'t> {
    tables: &'t TypeTables,
    max_depth: usize,
}

impl<'t> TableWalker<'t> {
    pub fn new(tables: &'t TypeTables) -> Self {
        Self {
            tables,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Validate `message` as the root struct described by `table_name`.
    pub fn validate(&self, table_name: &str, message: &Message) -> Result<WalkStats> {
        let _span = tracing::debug_span!("walk", table = table_name).entered();
        let mut walk = Walk {
            tables: self.tables,
            data: &message.data,
            num_handles: message.handles.len(),
            max_depth: self.max_depth,
            claimed_end: 0,
            next_handle: 0,
            stats: WalkStats::default(),
        };
        walk.struct_table(0, table_name, 0)?;
        tracing::debug!(
            pointers = walk.stats.pointers,
            handles = walk.stats.handles,
            "walk complete"
        );
        Ok(walk.stats)
    }
}

struct Walk<'t, 'm> {
    tables: &'t TypeTables,
    data: &'m [u8],
    num_handles: usize,
    max_depth: usize,
    /// End of the last claimed block.
    claimed_end: usize,
    /// Lowest handle index that may still appear.
    next_handle: usize,
    stats: WalkStats,
}

impl Walk<'_, '_> {
    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(ValidationErrorKind::MaxDepthExceeded.into());
        }
        Ok(())
    }

    fn read_u32(&self, pos: usize) -> Result<u32> {
        self.data
            .get(pos..pos + 4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or_else(|| out_of_range(pos))
    }

    fn read_u64(&self, pos: usize) -> Result<u64> {
        self.data
            .get(pos..pos + 8)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or_else(|| out_of_range(pos))
    }

    /// Check that a block of at least `min_bytes` may start at `start`.
    fn claim(&self, start: usize, min_bytes: usize) -> Result<()> {
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
            return Err(out_of_range(start));
        }
        Ok(())
    }

    /// Claim the block at `start` and return its header.
    fn header(&mut self, start: usize) -> Result<DataHeader> {
        self.claim(start, HEADER_SIZE)?;
        let header = DataHeader::from_bytes(&self.data[start..start + HEADER_SIZE]);
        let num_bytes = header.num_bytes as usize;
        if num_bytes < HEADER_SIZE || start + num_bytes > self.data.len() {
            return Err(ValidationError::new(
                ValidationErrorKind::IllegalMemoryRange,
                format!("block at offset {start} declares {num_bytes} bytes"),
            ));
        }
        self.claimed_end = align8(start + num_bytes);
        Ok(header)
    }

    /// Follow the pointer at `pos`. Returns the target, or `None` for null.
    fn pointer(
        &mut self,
        pos: usize,
        nullable: bool,
        null_error: ValidationErrorKind,
    ) -> Result<Option<usize>> {
        let offset = self.read_u64(pos)?;
        if offset == 0 {
            return if nullable {
                Ok(None)
            } else {
                Err(ValidationError::new(
                    null_error,
                    format!("null pointer at offset {pos}"),
                ))
            };
        }
        let target = (pos as u64)
            .checked_add(offset)
            .filter(|t| *t < self.data.len() as u64)
            .ok_or_else(|| {
                ValidationError::new(
                    ValidationErrorKind::IllegalPointer,
                    format!("pointer at {pos} with offset {offset} leaves the message"),
                )
            })?;
        self.stats.pointers += 1;
        Ok(Some(target as usize))
    }

    fn handle(&mut self, pos: usize, nullable: bool) -> Result<()> {
        let index = self.read_u32(pos)?;
        if index == ENCODED_INVALID_HANDLE {
            if nullable {
                return Ok(());
            }
            return Err(ValidationError::new(
                ValidationErrorKind::UnexpectedInvalidHandle,
                format!("invalid handle at offset {pos}"),
            ));
        }
        let index = index as usize;
        if index < self.next_handle || index >= self.num_handles {
            return Err(ValidationError::new(
                ValidationErrorKind::IllegalHandle,
                format!(
                    "handle index {index} is out of order or beyond {} handles",
                    self.num_handles
                ),
            ));
        }
        self.next_handle = index + 1;
        self.stats.handles += 1;
        Ok(())
    }

    fn struct_table(&mut self, start: usize, name: &str, depth: usize) -> Result<()> {
        self.check_depth(depth)?;
        let table = self.tables.struct_table(name).ok_or_else(|| missing(name))?;
        let header = self.header(start)?;
        self.struct_entries(start, header, table, depth)
    }

    /// A map block: a struct with the fixed `{24, 0}` header.
    fn map_table(&mut self, start: usize, name: &str, depth: usize) -> Result<()> {
        self.check_depth(depth)?;
        let table = self.tables.struct_table(name).ok_or_else(|| missing(name))?;
        let header = self.header(start)?;
        if header != DataHeader::map() {
            return Err(ValidationError::new(
                ValidationErrorKind::UnexpectedStructHeader,
                format!(
                    "map header {{{}, {}}} is not {{24, 0}}",
                    header.num_bytes, header.elements_or_version
                ),
            ));
        }
        self.struct_entries(start, header, table, depth)
    }

    fn struct_entries(
        &mut self,
        start: usize,
        header: DataHeader,
        table: &StructTable,
        depth: usize,
    ) -> Result<()> {
        let name = table.name.as_str();
        let payload = start + HEADER_SIZE;
        let payload_end = start + header.num_bytes as usize;

        for entry in &table.entries {
            if entry.min_version <= header.elements_or_version {
                let pos = payload + entry.offset as usize;
                if pos + slot_bytes(entry) > payload_end {
                    return Err(ValidationError::new(
                        ValidationErrorKind::UnexpectedStructHeader,
                        format!("slot at offset {} lies past the end of `{name}`", entry.offset),
                    ));
                }
                self.struct_slot(pos, entry, depth)?;
            }
            if !entry.keep_going {
                break;
            }
        }
        Ok(())
    }

    fn struct_slot(&mut self, pos: usize, entry: &StructEntry, depth: usize) -> Result<()> {
        match entry.elem_kind {
            ElementKind::Pod => Ok(()),
            ElementKind::Handle | ElementKind::Interface => self.handle(pos, entry.nullable),
            ElementKind::Union => {
                let table = union_table_name(&entry.elem_table)?;
                self.union_slot(pos, table, entry.nullable, depth)
            }
            ElementKind::Array | ElementKind::Struct => {
                let target =
                    self.pointer(pos, entry.nullable, ValidationErrorKind::UnexpectedNullPointer)?;
                match target {
                    Some(target) => self.block(target, &entry.elem_table, depth + 1),
                    None => Ok(()),
                }
            }
        }
    }

    /// The 16-byte union slot at `pos`.
    fn union_slot(&mut self, pos: usize, name: &str, nullable: bool, depth: usize) -> Result<()> {
        self.check_depth(depth)?;
        let table: &UnionTable = self.tables.union_table(name).ok_or_else(|| missing(name))?;
        let size = self.read_u32(pos)?;
        let tag = self.read_u32(pos + 4)?;
        if size == 0 {
            if nullable {
                return Ok(());
            }
            return Err(ValidationError::new(
                ValidationErrorKind::UnexpectedNullUnion,
                format!("null union at offset {pos}"),
            ));
        }
        if size != UNION_SIZE {
            return Err(ValidationError::new(
                ValidationErrorKind::UnexpectedStructHeader,
                format!("union size {size} is not {UNION_SIZE}"),
            ));
        }

        let mut found = None;
        for entry in &table.entries {
            if entry.tag == tag {
                found = Some(entry);
                break;
            }
            if !entry.keep_going {
                break;
            }
        }
        // Members without pointers or handles have no entry.
        let Some(entry) = found else {
            return Ok(());
        };

        let value = pos + HEADER_SIZE;
        match entry.elem_kind {
            ElementKind::Pod => Ok(()),
            ElementKind::Handle | ElementKind::Interface => self.handle(value, entry.nullable),
            ElementKind::Union => {
                let inner = union_table_name(&entry.elem_table)?;
                let target = self.pointer(
                    value,
                    entry.nullable,
                    ValidationErrorKind::UnexpectedNullUnion,
                )?;
                match target {
                    Some(target) => self.boxed_union(target, inner, entry.nullable, depth + 1),
                    None => Ok(()),
                }
            }
            ElementKind::Array | ElementKind::Struct => {
                let target = self.pointer(
                    value,
                    entry.nullable,
                    ValidationErrorKind::UnexpectedNullPointer,
                )?;
                match target {
                    Some(target) => self.block(target, &entry.elem_table, depth + 1),
                    None => Ok(()),
                }
            }
        }
    }

    fn boxed_union(
        &mut self,
        start: usize,
        name: &str,
        nullable: bool,
        depth: usize,
    ) -> Result<()> {
        self.claim(start, UNION_SIZE as usize)?;
        self.claimed_end = start + UNION_SIZE as usize;
        self.union_slot(start, name, nullable, depth)
    }

    /// The block a non-null pointer leads to.
    fn block(&mut self, start: usize, table: &TableRef, depth: usize) -> Result<()> {
        match table {
            TableRef::Struct(name) => self.struct_table(start, name, depth),
            TableRef::Map(name) => self.map_table(start, name, depth),
            TableRef::Array(name) => {
                let entry = self.tables.array_entry(name).ok_or_else(|| missing(name))?;
                self.array(start, entry, depth)
            }
            TableRef::String => {
                let header = self.header(start)?;
                check_array_fits(header, 8)
            }
            TableRef::None => self.header(start).map(|_| ()),
            TableRef::Union(name) => Err(ValidationError::new(
                ValidationErrorKind::UnexpectedStructHeader,
                format!("union table `{name}` used for a pointer slot"),
            )),
        }
    }

    fn array(&mut self, start: usize, entry: &ArrayEntry, depth: usize) -> Result<()> {
        self.check_depth(depth)?;
        let header = self.header(start)?;
        let len = header.elements_or_version;
        if entry.num_elements > 0 && len != entry.num_elements {
            return Err(ValidationError::new(
                ValidationErrorKind::UnexpectedArrayHeader,
                format!("expected {} elements, found {len}", entry.num_elements),
            ));
        }

        let stride = match entry.elem_kind {
            ElementKind::Pod => return check_array_fits(header, entry.elem_bits),
            ElementKind::Array | ElementKind::Struct => 8,
            ElementKind::Handle | ElementKind::Interface => 4,
            ElementKind::Union => UNION_SIZE as usize,
        };
        check_array_fits(header, stride as u32 * 8)?;

        let items = start + HEADER_SIZE;
        for i in 0..len as usize {
            let pos = items + i * stride;
            match entry.elem_kind {
                ElementKind::Pod => {}
                ElementKind::Handle | ElementKind::Interface => self.handle(pos, entry.nullable)?,
                ElementKind::Union => {
                    let name = union_table_name(&entry.elem_table)?;
                    self.union_slot(pos, name, entry.nullable, depth)?;
                }
                ElementKind::Array | ElementKind::Struct => {
                    let target = self.pointer(
                        pos,
                        entry.nullable,
                        ValidationErrorKind::UnexpectedNullPointer,
                    )?;
                    if let Some(target) = target {
                        self.block(target, &entry.elem_table, depth + 1)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Bytes a struct slot occupies, given its kind.
fn slot_bytes(entry: &StructEntry) -> usize {
    match entry.elem_kind {
        ElementKind::Pod => 0,
        ElementKind::Handle | ElementKind::Interface => 4,
        ElementKind::Array | ElementKind::Struct => 8,
        ElementKind::Union => UNION_SIZE as usize,
    }
}

fn check_array_fits(header: DataHeader, element_bits: u32) -> Result<()> {
    let needed = u64::from(header.elements_or_version) * u64::from(element_bits);
    let available = u64::from(header.num_bytes - HEADER_SIZE as u32) * 8;
    if needed > available {
        return Err(ValidationError::new(
            ValidationErrorKind::UnexpectedArrayHeader,
            format!(
                "{} elements of {element_bits} bits do not fit in {} bytes",
                header.elements_or_version, header.num_bytes
            ),
        ));
    }
    Ok(())
}

fn union_table_name(table: &TableRef) -> Result<&str> {
    match table {
        TableRef::Union(name) => Ok(name),
        other => Err(ValidationError::new(
            ValidationErrorKind::UnexpectedStructHeader,
            format!("union slot described by `{}`", other.name()),
        )),
    }
}

fn out_of_range(pos: usize) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::IllegalMemoryRange,
        format!("read at offset {pos} runs past end of message"),
    )
}

fn missing(name: &str) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::UnknownCodec,
        format!("no pointer table named `{name}`"),
    )
}

//! Pointer tables for table-driven encoders and decoders.
//!
//! A struct or union table lists only the slots a generic walker has to visit
//! (pointers, handles, unions). Arrays get a standalone entry describing their
//! elements. Entries form a linked scan: `keep_going` is false on the last one.

/// Name of the shared entry describing string payloads.
pub const STRING_POINTER_ENTRY: &str = "StringPointerEntry";

/// Suffix of struct, union and map tables.
pub const TABLE_SUFFIX: &str = "__PointerTable";

/// Suffix of synthesized array entries.
pub const ENTRY_SUFFIX: &str = "__PointerEntry";

/// Element kind of a table entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum ElementKind {
    /// Inline data with nothing to visit.
    Pod = 0,
    Array = 1,
    /// Struct, including the implicit struct of a map.
    Struct = 2,
    Union = 3,
    Handle = 4,
    Interface = 5,
}

impl ElementKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Pod),
            1 => Some(Self::Array),
            2 => Some(Self::Struct),
            3 => Some(Self::Union),
            4 => Some(Self::Handle),
            5 => Some(Self::Interface),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pod => "POD",
            Self::Array => "ARRAY",
            Self::Struct => "STRUCT",
            Self::Union => "UNION",
            Self::Handle => "HANDLE",
            Self::Interface => "INTERFACE",
        }
    }

    /// Whether the slot holds a 64-bit pointer when it appears in a struct.
    pub fn is_pointer(self) -> bool {
        matches!(self, Self::Array | Self::Struct)
    }

    /// Whether the slot holds a 32-bit handle.
    pub fn is_handle(self) -> bool {
        matches!(self, Self::Handle | Self::Interface)
    }
}

/// Sub-table governing the contents of a slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TableRef {
    /// Nothing to visit below this slot.
    None,
    /// The shared string entry.
    String,
    /// A synthesized array entry.
    Array(String),
    Struct(String),
    /// A synthesized map table. The block it governs has a `{24, 0}` header.
    Map(String),
    Union(String),
}

impl TableRef {
    /// Name as rendered in dumps.
    pub fn name(&self) -> &str {
        match self {
            Self::None => "NULL",
            Self::String => STRING_POINTER_ENTRY,
            Self::Array(name) | Self::Struct(name) | Self::Map(name) | Self::Union(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructEntry {
    pub elem_table: TableRef,
    /// Byte offset of the slot, relative to the end of the struct header.
    pub offset: u32,
    pub min_version: u32,
    pub elem_kind: ElementKind,
    pub nullable: bool,
    pub keep_going: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnionEntry {
    pub elem_table: TableRef,
    pub tag: u32,
    pub nullable: bool,
    pub elem_kind: ElementKind,
    pub keep_going: bool,
}

/// Describes one array type. `nullable` applies to the elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayEntry {
    pub name: String,
    pub elem_table: TableRef,
    /// Declared length; 0 for unbounded arrays.
    pub num_elements: u32,
    /// Element width in bits. Not rendered in dumps; bounds POD arrays.
    pub elem_bits: u32,
    pub nullable: bool,
    pub elem_kind: ElementKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructTable {
    pub name: String,
    pub entries: Vec<StructEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnionTable {
    pub name: String,
    pub entries: Vec<UnionEntry>,
}

/// All tables generated for one source file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeTables {
    /// Struct tables, including synthesized map tables.
    pub structs: Vec<StructTable>,
    pub unions: Vec<UnionTable>,
    pub arrays: Vec<ArrayEntry>,
    /// Tables of user-declared structs, in declaration order.
    pub public_struct_names: Vec<String>,
    pub public_union_names: Vec<String>,
}

impl TypeTables {
    pub fn struct_table(&self, name: &str) -> Option<&StructTable> {
        self.structs.iter().find(|t| t.name == name)
    }

    pub fn union_table(&self, name: &str) -> Option<&UnionTable> {
        self.unions.iter().find(|t| t.name == name)
    }

    pub fn array_entry(&self, name: &str) -> Option<&ArrayEntry> {
        self.arrays.iter().find(|a| a.name == name)
    }
}

/// Set `keep_going` on every entry but the last.
pub fn link_entries<T>(entries: &mut [T], keep_going: impl Fn(&mut T) -> &mut bool) {
    let count = entries.len();
    for (i, entry) in entries.iter_mut().enumerate() {
        *keep_going(entry) = i + 1 < count;
    }
}

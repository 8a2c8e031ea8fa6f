//! Validation errors raised while encoding or decoding messages.

/// Category of a wire validation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// Null pointer in a non-nullable slot.
    UnexpectedNullPointer,
    /// Absent union in a non-nullable slot.
    UnexpectedNullUnion,
    /// Invalid handle in a non-nullable slot.
    UnexpectedInvalidHandle,
    /// Map whose key and value arrays disagree in length.
    DifferentSizedArraysInMap,
    /// Block not aligned to 8 bytes.
    MisalignedObject,
    /// Block overlapping already claimed memory or running past the buffer.
    IllegalMemoryRange,
    /// Pointer whose target lies outside the message.
    IllegalPointer,
    /// Handle index out of range or out of order.
    IllegalHandle,
    /// Array header inconsistent with its element count or declared length.
    UnexpectedArrayHeader,
    /// Struct, map or union header inconsistent with the known layout.
    UnexpectedStructHeader,
    /// Union tag with no matching member.
    UnknownUnionTag,
    /// String payload that is not UTF-8.
    InvalidUtf8,
    /// Program references a struct or union with no codec.
    UnknownCodec,
    /// Value shape does not match the codec operation.
    TypeMismatch,
    /// Nesting deeper than the configured limit.
    MaxDepthExceeded,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnexpectedNullPointer => "UnexpectedNullPointer",
            Self::UnexpectedNullUnion => "UnexpectedNullUnion",
            Self::UnexpectedInvalidHandle => "UnexpectedInvalidHandle",
            Self::DifferentSizedArraysInMap => "DifferentSizedArraysInMap",
            Self::MisalignedObject => "MisalignedObject",
            Self::IllegalMemoryRange => "IllegalMemoryRange",
            Self::IllegalPointer => "IllegalPointer",
            Self::IllegalHandle => "IllegalHandle",
            Self::UnexpectedArrayHeader => "UnexpectedArrayHeader",
            Self::UnexpectedStructHeader => "UnexpectedStructHeader",
            Self::UnknownUnionTag => "UnknownUnionTag",
            Self::InvalidUtf8 => "InvalidUtf8",
            Self::UnknownCodec => "UnknownCodec",
            Self::TypeMismatch => "TypeMismatch",
            Self::MaxDepthExceeded => "MaxDepthExceeded",
        }
    }

    /// Default message used when a generated program fails with this kind.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::UnexpectedNullPointer => "unexpected null pointer",
            Self::UnexpectedNullUnion => "unexpected null union",
            Self::UnexpectedInvalidHandle => "unexpected invalid handle",
            Self::DifferentSizedArraysInMap => "number of keys is different from number of values",
            Self::MisalignedObject => "misaligned object",
            Self::IllegalMemoryRange => "illegal memory range",
            Self::IllegalPointer => "illegal pointer",
            Self::IllegalHandle => "illegal handle",
            Self::UnexpectedArrayHeader => "unexpected array header",
            Self::UnexpectedStructHeader => "unexpected struct header",
            Self::UnknownUnionTag => "unknown union tag",
            Self::InvalidUtf8 => "string is not valid UTF-8",
            Self::UnknownCodec => "unknown codec",
            Self::TypeMismatch => "value does not match codec",
            Self::MaxDepthExceeded => "nesting limit exceeded",
        }
    }
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed validation failure with a human-readable detail.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<ValidationErrorKind> for ValidationError {
    fn from(kind: ValidationErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

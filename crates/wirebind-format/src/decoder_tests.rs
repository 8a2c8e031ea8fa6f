use super::*;
use crate::encoder::Encoder;

fn encode(build: impl FnOnce(&mut Encoder)) -> Message {
    let mut encoder = Encoder::new();
    build(&mut encoder);
    encoder.into_message()
}

fn string_struct() -> Message {
    encode(|e| {
        e.start_struct(24, 0).unwrap();
        e.write_i32(7).unwrap();
        e.write_pointer().unwrap();
        e.write_string("hi").unwrap();
        e.finish().unwrap();
    })
}

#[test]
fn reads_back_struct() {
    let message = string_struct();
    let mut decoder = Decoder::new(&message);

    let header = decoder.start_struct().unwrap();
    assert_eq!(header, DataHeader::new(24, 0));
    assert_eq!(decoder.read_i32().unwrap(), 7);
    assert_ne!(decoder.read_pointer().unwrap(), 0);
    assert_eq!(decoder.read_string().unwrap(), "hi");
    decoder.finish().unwrap();
    assert_eq!(decoder.depth(), 0);
}

#[test]
fn null_pointer_reads_zero() {
    let message = encode(|e| {
        e.start_struct(16, 0).unwrap();
        e.write_null_pointer().unwrap();
        e.finish().unwrap();
    });
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();

    assert_eq!(decoder.read_pointer().unwrap(), 0);
    let err = decoder.start_array(8).unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::IllegalPointer);
}

#[test]
fn misaligned_block_is_rejected() {
    let mut message = string_struct();
    message.data[16] = 9;
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();
    decoder.read_i32().unwrap();
    decoder.read_pointer().unwrap();

    let err = decoder.read_string().unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::MisalignedObject);
}

#[test]
fn pointer_back_into_claimed_memory_is_rejected() {
    let mut message = string_struct();
    // Point the string slot back at the struct itself.
    message.data[16..24].copy_from_slice(&(-16i64).to_le_bytes());
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();
    decoder.read_i32().unwrap();

    let err = decoder.read_pointer().unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::IllegalPointer);
}

#[test]
fn overlapping_block_is_rejected() {
    let mut message = string_struct();
    message.data[16..24].copy_from_slice(&0u64.to_le_bytes());
    message.data[16] = 8;
    message.data[0] = 32;
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();
    decoder.read_i32().unwrap();
    decoder.read_pointer().unwrap();

    let err = decoder.read_string().unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::IllegalMemoryRange);
}

#[test]
fn short_array_header_is_rejected() {
    let mut message = string_struct();
    message.data[28] = 9;
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();
    decoder.read_i32().unwrap();
    decoder.read_pointer().unwrap();

    let err = decoder.read_string().unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::UnexpectedArrayHeader);
}

#[test]
fn invalid_utf8_is_rejected() {
    let mut message = string_struct();
    message.data[32] = 0xff;
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();
    decoder.read_i32().unwrap();
    decoder.read_pointer().unwrap();

    let err = decoder.read_string().unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::InvalidUtf8);
}

#[test]
fn handles_are_claimed_in_order() {
    let message = encode(|e| {
        e.start_struct(24, 0).unwrap();
        e.write_handle(Handle(40)).unwrap();
        e.write_invalid_handle().unwrap();
        e.write_handle(Handle(41)).unwrap();
        e.finish().unwrap();
    });
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();

    assert_eq!(decoder.read_handle().unwrap(), Handle(40));
    assert_eq!(decoder.read_handle().unwrap(), Handle::INVALID);
    assert_eq!(decoder.read_handle().unwrap(), Handle(41));
    assert_eq!(decoder.claimed_handles(), [Handle(40), Handle(41)]);
}

#[test]
fn repeated_handle_index_is_rejected() {
    let mut message = encode(|e| {
        e.start_struct(16, 0).unwrap();
        e.write_handle(Handle(40)).unwrap();
        e.write_handle(Handle(41)).unwrap();
        e.finish().unwrap();
    });
    message.data[12] = 0;
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();
    decoder.read_handle().unwrap();

    let err = decoder.read_handle().unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::IllegalHandle);
}

#[test]
fn failed_decode_leaves_message_untouched() {
    let message = encode(|e| {
        e.start_struct(16, 0).unwrap();
        e.write_handle(Handle(40)).unwrap();
        e.finish().unwrap();
    });
    let before = message.clone();
    {
        let mut decoder = Decoder::new(&message);
        decoder.start_struct().unwrap();
        decoder.read_handle().unwrap();
        assert!(decoder.read_u64().is_err());
    }

    assert_eq!(message, before);
}

#[test]
fn map_header_is_checked() {
    let mut message = encode(|e| {
        e.start_struct(16, 0).unwrap();
        e.write_pointer().unwrap();
        e.start_map().unwrap();
        e.write_null_pointer().unwrap();
        e.write_null_pointer().unwrap();
        e.finish().unwrap();
        e.finish().unwrap();
    });
    message.data[20] = 1;
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();
    decoder.read_pointer().unwrap();

    let err = decoder.start_map().unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::UnexpectedStructHeader);
}

#[test]
fn unions_read_back() {
    let message = encode(|e| {
        e.start_struct(40, 0).unwrap();
        e.start_union(2).unwrap();
        e.write_u16(77).unwrap();
        e.finish().unwrap();
        e.write_null_union().unwrap();
        e.finish().unwrap();
    });
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();

    assert_eq!(decoder.read_union_header().unwrap(), Some(2));
    assert_eq!(decoder.read_u16().unwrap(), 77);
    decoder.finish().unwrap();
    assert_eq!(decoder.read_union_header().unwrap(), None);
}

#[test]
fn bad_union_size_is_rejected() {
    let mut message = encode(|e| {
        e.start_struct(24, 0).unwrap();
        e.start_union(0).unwrap();
        e.finish().unwrap();
        e.finish().unwrap();
    });
    message.data[8] = 12;
    let mut decoder = Decoder::new(&message);
    decoder.start_struct().unwrap();

    let err = decoder.read_union_header().unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::UnexpectedStructHeader);
}

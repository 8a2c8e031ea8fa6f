use super::*;

#[test]
fn header_bytes_are_little_endian() {
    let header = DataHeader::new(24, 3);

    assert_eq!(header.to_bytes(), [24, 0, 0, 0, 3, 0, 0, 0]);
    assert_eq!(DataHeader::from_bytes(&header.to_bytes()), header);
}

#[test]
fn map_header() {
    assert_eq!(DataHeader::map(), DataHeader::new(24, 0));
}

#[test]
fn alignment_helpers() {
    assert_eq!(align8(0), 0);
    assert_eq!(align8(1), 8);
    assert_eq!(align8(16), 16);

    assert_eq!(align_bits(3, 1), 3);
    assert_eq!(align_bits(3, 8), 8);
    assert_eq!(align_bits(40, 32), 64);
    assert_eq!(align_bits(72, 128), 128);
}

#[test]
fn array_sizes() {
    assert_eq!(array_num_bytes(0, 64), Some(8));
    assert_eq!(array_num_bytes(3, 16), Some(14));
    assert_eq!(array_num_bytes(9, 1), Some(10));
    assert_eq!(array_num_bytes(u32::MAX, 128), None);
}

#[test]
fn invalid_handle() {
    assert!(!Handle::INVALID.is_valid());
    assert!(Handle(7).is_valid());
}

const VERSIONS: &[StructVersion] = &[
    StructVersion { version: 0, num_bytes: 16 },
    StructVersion { version: 2, num_bytes: 24 },
];

#[test]
fn known_version_must_match_size() {
    assert!(check_struct_version(DataHeader::new(16, 0), VERSIONS).is_ok());
    assert!(check_struct_version(DataHeader::new(24, 2), VERSIONS).is_ok());

    let err = check_struct_version(DataHeader::new(24, 0), VERSIONS).unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::UnexpectedStructHeader);
}

#[test]
fn newer_version_may_grow() {
    assert!(check_struct_version(DataHeader::new(32, 5), VERSIONS).is_ok());
    assert!(check_struct_version(DataHeader::new(16, 5), VERSIONS).is_err());
    assert!(check_struct_version(DataHeader::new(16, 1), VERSIONS).is_ok());
}

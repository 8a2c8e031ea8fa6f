use crate::utils::{format_name, private_name, to_c_name};

#[test]
fn format_name_from_snake() {
    assert_eq!(format_name("foo_bar"), "FooBar");
    assert_eq!(format_name("array_of_array_of_int"), "ArrayOfArrayOfInt");
    assert_eq!(format_name("_foo"), "Foo");
    assert_eq!(format_name("foo_"), "Foo");
}

#[test]
fn format_name_splits_camel() {
    assert_eq!(format_name("fooBar"), "FooBar");
    assert_eq!(format_name("SomeHandle"), "SomeHandle");
    assert_eq!(format_name("HTTPServer"), "HttpServer");
}

#[test]
fn format_name_normalizes_caps() {
    assert_eq!(format_name("RED"), "Red");
    assert_eq!(format_name("LIGHT_BLUE"), "LightBlue");
}

#[test]
fn format_name_keeps_digits() {
    assert_eq!(format_name("f_uint8"), "FUint8");
    assert_eq!(format_name("map_uint16_to_int32"), "MapUint16ToInt32");
}

#[test]
fn format_name_idempotent() {
    for name in ["FooBar", "MapUint16ToInt32", "Point"] {
        assert_eq!(format_name(&format_name(name)), format_name(name));
    }
}

#[test]
fn private_name_lowercases_first() {
    assert_eq!(private_name("FooBar"), "fooBar");
    assert_eq!(private_name("x"), "x");
    assert_eq!(private_name(""), "");
}

#[test]
fn c_name_flattens_dots() {
    assert_eq!(to_c_name("geo.shapes.Point"), "geo_shapes_Point");
    assert_eq!(to_c_name("Point"), "Point");
}

/// Normalize a schema name to PascalCase.
///
/// Words are split on `_`, on lower-to-upper transitions, and before the last
/// capital of an uppercase run followed by lowercase (`HTTPServer` is two
/// words). Each word is then lowercased and capitalized.
///
/// # Examples
/// ```
/// use wirebind_core::utils::format_name;
/// assert_eq!(format_name("f_uint8"), "FUint8");
/// assert_eq!(format_name("HTTPServer"), "HttpServer");
/// assert_eq!(format_name("SomeHandle"), "SomeHandle");
/// ```
pub fn format_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for part in name.split('_') {
        for word in split_words(part) {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                result.extend(first.to_uppercase());
                result.push_str(chars.as_str());
            }
        }
    }
    result
}

fn split_words(part: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut prev: Option<(usize, char)> = None;

    for (i, c) in part.char_indices() {
        if let Some((prev_start, p)) = prev {
            if c.is_uppercase() && !p.is_uppercase() {
                words.push(&part[start..i]);
                start = i;
            } else if !c.is_uppercase() && p.is_uppercase() && start != prev_start {
                words.push(&part[start..prev_start]);
                start = prev_start;
            }
        }
        prev = Some((i, c));
    }

    if start < part.len() {
        words.push(&part[start..]);
    }
    words
}

/// Lowercase the first character.
///
/// # Examples
/// ```
/// use wirebind_core::utils::private_name;
/// assert_eq!(private_name("FooBar"), "fooBar");
/// ```
pub fn private_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn a dotted identifier into a flat symbol name (`a.b.Foo` → `a_b_Foo`).
pub fn to_c_name(identifier: &str) -> String {
    identifier.replace('.', "_")
}

//! Identifier normalization for derived-finder field names.

/// Convert a mixed-case token into a lowercase, underscore-delimited
/// identifier.
///
/// A run of two or more uppercase letters followed by a lowercase letter
/// is treated as an acronym ending one word before the run ends:
/// `XMLHttpRequest` becomes `xml_http_request`, `APIKey` becomes
/// `api_key`. Already-snake_case input comes back unchanged.
pub fn normalize(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let mut out = String::with_capacity(token.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_uppercase() {
            out.push(c);
            continue;
        }

        let prev = i.checked_sub(1).and_then(|p| chars.get(p));
        let starts_word = match prev {
            // A single uppercase after a lowercase letter or digit.
            Some(prev) if prev.is_lowercase() || prev.is_ascii_digit() => true,
            // The last letter of an acronym run, when the next letter is
            // lowercase, begins the following word: the `R` in `XMLRequest`.
            Some(prev) if prev.is_uppercase() => {
                chars.get(i + 1).is_some_and(|next| next.is_lowercase())
            }
            _ => false,
        };
        if starts_word && !out.ends_with('_') {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }

    out
}

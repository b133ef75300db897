//! `@name@` placeholder substitution for fallback locations.
//!
//! Tag values cannot contain `$` or `{}`, so placeholders are delimited by `@`:
//! - `@@` renders a literal `@`
//! - `@name@` renders the binding for `name`, or nothing if unbound
//! - anything else, including an unterminated `@name`, is copied verbatim
//!
//! Names are zero or more ASCII lowercase letters. Tokens are matched left to
//! right and never overlap.

use std::collections::HashMap;

use super::types::RequestContext;

/// Placeholder name → substituted value.
pub type Bindings<'a> = HashMap<&'a str, &'a str>;

/// Bindings recognized in fallback locations: `host`, `path`, `query`.
pub fn request_bindings(request: &RequestContext) -> Bindings<'_> {
    HashMap::from([
        ("host", request.host.as_str()),
        ("path", request.path.as_str()),
        ("query", request.query_string.as_str()),
    ])
}

/// Render `template`, substituting every placeholder from `bindings`.
///
/// Never fails: unknown names render as the empty string.
pub fn render(template: &str, bindings: &Bindings<'_>) -> String {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    // Start of the text not yet copied to `out`.
    let mut copied = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'@' {
            pos += 1;
            continue;
        }

        let name_start = pos + 1;
        let name_end = name_start
            + bytes[name_start..]
                .iter()
                .take_while(|b| b.is_ascii_lowercase())
                .count();

        if bytes.get(name_end) != Some(&b'@') {
            // Not a token; the `@` is literal and scanning resumes after it.
            pos += 1;
            continue;
        }

        out.push_str(&template[copied..pos]);
        let name = &template[name_start..name_end];
        if name.is_empty() {
            out.push('@');
        } else if let Some(value) = bindings.get(name) {
            out.push_str(value);
        }

        pos = name_end + 1;
        copied = pos;
    }

    out.push_str(&template[copied..]);
    out
}

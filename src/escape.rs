//! Escaping helpers shared by parameter conversion and actions.

/// Characters left untouched by [`quote_url`] besides ASCII alphanumerics.
const URL_SAFE: &[u8] = b"-_.~:/@?=&#%+";

/// Escapes text for use in HTML content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Minimal attribute escape for scripts placed in `onclick="..."`.
pub fn escape_attribute_quotes(s: &str) -> String {
    s.replace('"', "&quot;")
}

/// Percent-encodes everything outside the URL-safe set, byte by byte.
pub fn quote_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for &byte in url.as_bytes() {
        if byte.is_ascii_alphanumeric() || URL_SAFE.contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

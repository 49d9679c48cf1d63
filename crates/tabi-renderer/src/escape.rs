//! HTML entity escaping.
//!
//! [`escape`] and [`unescape`] are exact inverses for the five characters
//! `& < > " '`. Marker payloads and text nodes go through [`escape`]; the
//! post-processors recover the original text with [`unescape`].

/// Escape HTML special characters.
///
/// Maps `&`, `<`, `>`, `"` and `'` to `&amp;`, `&lt;`, `&gt;`, `&quot;` and
/// `&#39;`. A single pass over the input means entities produced for one
/// character are never escaped again.
///
/// # Examples
///
/// ```
/// use tabi_renderer::escape;
///
/// assert_eq!(escape("<a href=\"x\">Tom & Jerry's</a>"),
///     "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;");
/// ```
pub fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Reverse [`escape`].
///
/// `&amp;` is decoded last. Decoding it first would turn an escaped `&lt;`
/// (`&amp;lt;`) into `<` instead of the literal text `&lt;`.
///
/// # Examples
///
/// ```
/// use tabi_renderer::{escape, unescape};
///
/// assert_eq!(unescape("&amp;lt;"), "&lt;");
/// assert_eq!(unescape(&escape("a < b && c")), "a < b && c");
/// ```
pub fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }

    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

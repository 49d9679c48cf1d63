//! Collection of deferred-head fragments.

use crate::marker::MarkerKind;

/// Output of [`extract_head`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedHead {
    /// Input with every head marker removed.
    pub body: String,
    /// Head fragments in document order, joined with newlines.
    pub head: String,
}

/// Remove every deferred-head marker from `html` and collect its fragment.
///
/// Fragments keep document order in `head`; removal runs from the last
/// marker to the first so byte ranges stay valid.
pub fn extract_head(html: &str) -> ExtractedHead {
    let markers = MarkerKind::Head.scan(html);
    if markers.is_empty() {
        return ExtractedHead {
            body: html.to_owned(),
            head: String::new(),
        };
    }

    let head = markers
        .iter()
        .map(crate::marker::Marker::decode_payload)
        .collect::<Vec<_>>()
        .join("\n");

    let mut body = html.to_owned();
    for marker in markers.iter().rev() {
        body.replace_range(marker.range.clone(), "");
    }

    ExtractedHead { body, head }
}

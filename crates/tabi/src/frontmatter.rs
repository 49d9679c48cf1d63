//! YAML frontmatter splitting for markdown sources.

use tabi_ssr::Frontmatter;

/// Split a leading `---` delimited YAML block from `source`.
///
/// Returns the parsed frontmatter and the remaining markdown body. A source
/// without a frontmatter block yields empty frontmatter and the whole source.
///
/// # Errors
///
/// Returns an error if the block is not a valid YAML mapping.
pub(crate) fn split_frontmatter(source: &str) -> Result<(Frontmatter, &str), serde_yaml::Error> {
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return Ok((Frontmatter::new(), source));
    };

    let Some((yaml, body)) = find_closing_fence(rest) else {
        return Ok((Frontmatter::new(), source));
    };

    let trimmed = yaml.trim();
    if trimmed.is_empty() {
        return Ok((Frontmatter::new(), body));
    }
    let frontmatter: Frontmatter = serde_yaml::from_str(trimmed)?;
    Ok((frontmatter, body))
}

/// Find the closing `---` line. Returns the YAML before it and the body after.
fn find_closing_fence(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

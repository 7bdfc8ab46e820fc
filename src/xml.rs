//! Minimal XML helpers for the SOAP exchange.
//!
//! The authentication endpoint wraps its payloads in namespace-prefixed
//! envelopes whose prefixes and tag casing vary between deployments, so
//! element lookup here matches local names case-insensitively after
//! stripping any namespace prefix. This is extraction, not validation:
//! the endpoint is untrusted input and absent elements are reported as
//! `None`, never panics.

/// Find the text content of the first element whose local name matches
/// `local_name` (case-insensitive, namespace prefix ignored).
///
/// Returns the raw inner slice, which may itself contain child elements.
/// Self-closing elements yield an empty string.
pub(crate) fn element_text<'a>(xml: &'a str, local_name: &str) -> Option<&'a str> {
    let mut pos = 0;
    while let Some(rel) = xml[pos..].find('<') {
        let open = pos + rel;
        let rest = &xml[open + 1..];

        // Skip closing tags, comments, and processing instructions.
        if rest.starts_with('/') || rest.starts_with('!') || rest.starts_with('?') {
            pos = open + 1;
            continue;
        }

        let name_end = rest.find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')?;
        if !local_name_matches(&rest[..name_end], local_name) {
            pos = open + 1;
            continue;
        }

        let tag_close = open + 1 + rest.find('>')?;
        if xml.as_bytes()[tag_close - 1] == b'/' {
            return Some("");
        }

        let content_start = tag_close + 1;
        let content_len = find_closing_tag(&xml[content_start..], local_name)?;
        return Some(&xml[content_start..content_start + content_len]);
    }
    None
}

/// Like [`element_text`], but trims surrounding whitespace and rejects
/// empty content.
pub(crate) fn element_value<'a>(xml: &'a str, local_name: &str) -> Option<&'a str> {
    let text = element_text(xml, local_name)?.trim();
    if text.is_empty() { None } else { Some(text) }
}

/// Offset of the matching closing tag, relative to `xml`.
fn find_closing_tag(xml: &str, local_name: &str) -> Option<usize> {
    let mut pos = 0;
    while let Some(rel) = xml[pos..].find("</") {
        let start = pos + rel;
        let rest = &xml[start + 2..];
        let name_end = rest.find(|c: char| c.is_ascii_whitespace() || c == '>')?;
        if local_name_matches(&rest[..name_end], local_name) {
            return Some(start);
        }
        pos = start + 2;
    }
    None
}

fn local_name_matches(qualified: &str, local_name: &str) -> bool {
    let local = qualified.rsplit(':').next().unwrap_or(qualified);
    local.eq_ignore_ascii_case(local_name)
}

/// Decode the XML character entities the endpoint uses when embedding the
/// ticket document inside the SOAP envelope.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            // Dangling ampersand, keep literally.
            out.push_str(tail);
            return out;
        };

        let entity = &tail[1..semi];
        match entity {
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "amp" => out.push('&'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let decoded = if let Some(hex) =
                    entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok().and_then(char::from_u32)
                } else {
                    None
                };
                match decoded {
                    Some(c) => out.push(c),
                    // Unknown entity, keep literally.
                    None => out.push_str(&tail[..=semi]),
                }
            }
        }
        rest = &tail[semi + 1..];
    }

    out.push_str(rest);
    out
}

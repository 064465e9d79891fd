//! Filenames for completed transfers

use mime::Mime;

use crate::fetch::Transfer;
use crate::resolvers::extract;

const FALLBACK_NAME: &str = "download";
const NAME_MAX: usize = 255;

/// Filename from a Content-Disposition value; `filename*` (RFC 5987) takes
/// precedence over `filename`
pub fn content_disposition_filename(value: &str) -> Option<String> {
    let mut plain = None;

    for param in value.split(';') {
        let Some((name, raw)) = param.trim().split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let raw = raw.trim();

        match name.as_str() {
            "filename*" => {
                let encoded = raw
                    .split_once("''")
                    .map(|(_charset, encoded)| encoded)
                    .unwrap_or(raw);
                let decoded = unquote(&percent_decode(encoded));
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
            "filename" => {
                let unquoted = unquote(raw);
                if !unquoted.is_empty() {
                    plain = Some(unquoted);
                }
            }
            _ => {}
        }
    }

    plain
}

/// Strip surrounding quotes and undo `\"` / `\\` escapes
fn unquote(value: &str) -> String {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&next)) if next == '"' || next == '\\' => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Percent-decode, leaving malformed escapes as they are and replacing
/// invalid UTF-8
pub fn percent_decode(input: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(input.as_bytes())).into_owned()
}

/// Last path segment of `url`, percent-decoded
pub fn filename_from_url(url: &str) -> String {
    percent_decode(extract::last_segment(url))
}

/// Replace path separators and control characters, trim surrounding dots
/// and whitespace, cap the length
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');

    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

/// Extension for a body whose name has none, from the Content-Type essence
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type.parse::<Mime>() {
        Ok(mime) => match mime.essence_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            _ => "unknown",
        },
        Err(_) => "unknown",
    }
}

pub fn has_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .unwrap_or(false)
}

/// Name a completed transfer: header filename, else URL basename, with an
/// inferred extension when the name has none
pub fn transfer_filename(transfer: &Transfer) -> String {
    let name = transfer
        .content_disposition
        .as_deref()
        .and_then(content_disposition_filename)
        .unwrap_or_else(|| filename_from_url(&transfer.url));

    let mut name = sanitize(&name);
    if name.is_empty() {
        name = FALLBACK_NAME.to_string();
    }

    if !has_extension(&name) {
        if let Some(content_type) = transfer.content_type.as_deref() {
            name = format!("{}.{}", name, extension_for_content_type(content_type));
        }
    }

    name
}

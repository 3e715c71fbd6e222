//! Content-type sniffing for responses that do not declare one.
//!
//! Implements the WHATWG mime sniffing table over the first 512 bytes of
//! the body. The result only depends on the body bytes.

/// Maximum number of leading bytes inspected.
pub const SNIFF_LEN: usize = 512;

/// Fallback when nothing in the table matches.
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_UTF8: &str = "text/plain; charset=utf-8";

enum Signature {
    /// Case-insensitive HTML tag, leading whitespace skipped, followed by a space or `>`.
    Html(&'static [u8]),
    Masked {
        pattern: &'static [u8],
        mask: &'static [u8],
        skip_ws: bool,
        ct: &'static str,
    },
    Exact(&'static [u8], &'static str),
    Mp4,
    Text,
}

const fn exact(sig: &'static [u8], ct: &'static str) -> Signature {
    Signature::Exact(sig, ct)
}

const fn masked(pattern: &'static [u8], mask: &'static [u8], ct: &'static str) -> Signature {
    Signature::Masked { pattern, mask, skip_ws: false, ct }
}

const FONT_OBJECT_PATTERN: &[u8] = b"\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00LP";
const FONT_OBJECT_MASK: &[u8] = b"\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\xFF\xFF";

static SIGNATURES: &[Signature] = &[
    Signature::Html(b"<!DOCTYPE HTML"),
    Signature::Html(b"<HTML"),
    Signature::Html(b"<HEAD"),
    Signature::Html(b"<SCRIPT"),
    Signature::Html(b"<IFRAME"),
    Signature::Html(b"<H1"),
    Signature::Html(b"<DIV"),
    Signature::Html(b"<FONT"),
    Signature::Html(b"<TABLE"),
    Signature::Html(b"<A"),
    Signature::Html(b"<STYLE"),
    Signature::Html(b"<TITLE"),
    Signature::Html(b"<B"),
    Signature::Html(b"<BODY"),
    Signature::Html(b"<BR"),
    Signature::Html(b"<P"),
    Signature::Html(b"<!--"),
    Signature::Masked {
        pattern: b"<?xml",
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        skip_ws: true,
        ct: "text/xml; charset=utf-8",
    },
    exact(b"%PDF-", "application/pdf"),
    exact(b"%!PS-Adobe-", "application/postscript"),
    // Byte order marks
    masked(b"\xFE\xFF\x00\x00", b"\xFF\xFF\x00\x00", "text/plain; charset=utf-16be"),
    masked(b"\xFF\xFE\x00\x00", b"\xFF\xFF\x00\x00", "text/plain; charset=utf-16le"),
    masked(b"\xEF\xBB\xBF\x00", b"\xFF\xFF\xFF\x00", TEXT_UTF8),
    // Images
    exact(b"\x00\x00\x01\x00", "image/x-icon"),
    exact(b"\x00\x00\x02\x00", "image/x-icon"),
    exact(b"BM", "image/bmp"),
    exact(b"GIF87a", "image/gif"),
    exact(b"GIF89a", "image/gif"),
    masked(
        b"RIFF\x00\x00\x00\x00WEBPVP",
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        "image/webp",
    ),
    exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    exact(b"\xFF\xD8\xFF", "image/jpeg"),
    // Audio and video
    masked(b".snd", b"\xFF\xFF\xFF\xFF", "audio/basic"),
    masked(
        b"FORM\x00\x00\x00\x00AIFF",
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        "audio/aiff",
    ),
    masked(b"ID3", b"\xFF\xFF\xFF", "audio/mpeg"),
    masked(b"OggS\x00", b"\xFF\xFF\xFF\xFF\xFF", "application/ogg"),
    masked(
        b"MThd\x00\x00\x00\x06",
        b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF",
        "audio/midi",
    ),
    masked(
        b"RIFF\x00\x00\x00\x00AVI ",
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        "video/avi",
    ),
    masked(
        b"RIFF\x00\x00\x00\x00WAVE",
        b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        "audio/wave",
    ),
    Signature::Mp4,
    exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    // Fonts
    masked(FONT_OBJECT_PATTERN, FONT_OBJECT_MASK, "application/vnd.ms-fontobject"),
    exact(b"\x00\x01\x00\x00", "font/ttf"),
    exact(b"OTTO", "font/otf"),
    exact(b"ttcf", "font/collection"),
    exact(b"wOFF", "font/woff"),
    exact(b"wOF2", "font/woff2"),
    // Archives
    exact(b"\x1F\x8B\x08", "application/x-gzip"),
    exact(b"PK\x03\x04", "application/zip"),
    exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    exact(b"\x00\x61\x73\x6D", "application/wasm"),
    Signature::Text,
];

/// Detect the content type of `body`.
///
/// Always returns a valid MIME type, `application/octet-stream` when nothing
/// more specific is recognized.
pub fn detect_content_type(body: &[u8]) -> &'static str {
    let data = &body[..body.len().min(SNIFF_LEN)];
    let first_non_ws = data
        .iter()
        .position(|b| !is_ws(*b))
        .unwrap_or(data.len());

    SIGNATURES
        .iter()
        .find_map(|sig| sig.matches(data, first_non_ws))
        .unwrap_or(OCTET_STREAM)
}

impl Signature {
    fn matches(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        match self {
            Signature::Html(tag) => {
                let data = &data[first_non_ws..];
                if data.len() < tag.len() + 1 {
                    return None;
                }
                for (i, &b) in tag.iter().enumerate() {
                    let mut db = data[i];
                    if b.is_ascii_uppercase() {
                        db &= 0xDF;
                    }
                    if b != db {
                        return None;
                    }
                }
                is_tag_terminator(data[tag.len()]).then_some("text/html; charset=utf-8")
            }
            Signature::Masked { pattern, mask, skip_ws, ct } => {
                let data = if *skip_ws { &data[first_non_ws..] } else { data };
                if pattern.len() != mask.len() || data.len() < pattern.len() {
                    return None;
                }
                pattern
                    .iter()
                    .zip(mask.iter())
                    .zip(data)
                    .all(|((p, m), d)| d & m == *p)
                    .then_some(*ct)
            }
            Signature::Exact(sig, ct) => data.starts_with(sig).then_some(*ct),
            Signature::Mp4 => is_mp4(data).then_some("video/mp4"),
            Signature::Text => {
                let binary = data[first_non_ws..].iter().any(|b| is_binary_byte(*b));
                (!binary).then_some(TEXT_UTF8)
            }
        }
    }
}

fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 {
        return false;
    }
    if &data[4..8] != b"ftyp" {
        return false;
    }
    // Offset 12 holds the minor version, every other word is a brand.
    (8..box_size)
        .step_by(4)
        .filter(|st| *st != 12)
        .any(|st| &data[st..st + 3] == b"mp4")
}

fn is_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

fn is_tag_terminator(b: u8) -> bool {
    b == b' ' || b == b'>'
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images() {
        assert_eq!(
            detect_content_type(b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR"),
            "image/png"
        );
        assert_eq!(detect_content_type(b"\xFF\xD8\xFF\xE0\x00\x10JFIF"), "image/jpeg");
        assert_eq!(detect_content_type(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(detect_content_type(b"RIFF\x10\x00\x00\x00WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_html_and_xml() {
        assert_eq!(detect_content_type(b"  <!doctype html><html>"), "text/html; charset=utf-8");
        assert_eq!(detect_content_type(b"<p>hello</p>"), "text/html; charset=utf-8");
        assert_eq!(detect_content_type(b"\n<?xml version=\"1.0\"?>"), "text/xml; charset=utf-8");
        // "<PRE" is not a recognized tag, and "<P" must be followed by a terminator
        assert_eq!(detect_content_type(b"<PRE>x</PRE>"), TEXT_UTF8);
    }

    #[test]
    fn test_documents_and_archives() {
        assert_eq!(detect_content_type(b"%PDF-1.7"), "application/pdf");
        assert_eq!(detect_content_type(b"PK\x03\x04rest"), "application/zip");
        assert_eq!(detect_content_type(b"\x1F\x8B\x08\x00"), "application/x-gzip");
        assert_eq!(detect_content_type(b"\x00asm\x01\x00\x00\x00"), "application/wasm");
    }

    #[test]
    fn test_mp4() {
        let mut data = vec![0x00, 0x00, 0x00, 0x18];
        data.extend_from_slice(b"ftypmp42");
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"mp41isom");
        assert_eq!(detect_content_type(&data), "video/mp4");
    }

    #[test]
    fn test_text_and_fallback() {
        assert_eq!(detect_content_type(b""), TEXT_UTF8);
        assert_eq!(detect_content_type(b"{\"ok\":true}"), TEXT_UTF8);
        assert_eq!(detect_content_type(b"\xEF\xBB\xBFhello"), TEXT_UTF8);
        assert_eq!(detect_content_type(b"\x01\x02\x03\x04"), OCTET_STREAM);
    }

    #[test]
    fn test_only_leading_window_inspected() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(detect_content_type(&data), TEXT_UTF8);
    }
}

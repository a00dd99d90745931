//! Content type detection from the leading bytes of a body.
//!
//! Implements the signature tables of the WHATWG MIME sniffing standard that matter for a
//! response body written without an explicit `Content-Type`: HTML and XML markup, common
//! image, font, archive and media formats, and the text-vs-binary fallback.

/// At most this many leading bytes are inspected.
pub const SNIFF_LEN: usize = 512;

const TEXT_HTML: &str = "text/html; charset=utf-8";
const TEXT_XML: &str = "text/xml; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// `(pattern, mask, content type)`; a byte matches when `data & mask == pattern`.
const MASKED: &[(&[u8], &[u8], &str)] = &[
    (b"RIFF\0\0\0\0WEBPVP", b"\xFF\xFF\xFF\xFF\0\0\0\0\xFF\xFF\xFF\xFF\xFF\xFF", "image/webp"),
    (b"RIFF\0\0\0\0WAVE", b"\xFF\xFF\xFF\xFF\0\0\0\0\xFF\xFF\xFF\xFF", "audio/wave"),
    (b"FORM\0\0\0\0AIFF", b"\xFF\xFF\xFF\xFF\0\0\0\0\xFF\xFF\xFF\xFF", "audio/aiff"),
    (b"RIFF\0\0\0\0AVI ", b"\xFF\xFF\xFF\xFF\0\0\0\0\xFF\xFF\xFF\xFF", "video/avi"),
];

const EXACT: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_PLAIN),
    (b"\0\0\x01\0", "image/x-icon"),
    (b"\0\0\x02\0", "image/x-icon"),
    (b"BM", "image/bmp"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"ID3", "audio/mpeg"),
    (b"OggS\0", "application/ogg"),
    (b"MThd\0\0\0\x06", "audio/midi"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"Rar!\x1A\x07\0", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\0", "application/x-rar-compressed"),
    (b"\0asm", "application/wasm"),
];

/// Returns the content type of `data`, never failing: unknown binary data is
/// `application/octet-stream`, unknown text is `text/plain; charset=utf-8`.
pub fn sniff(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let first_non_ws = data.iter().position(|b| !is_ws(*b)).unwrap_or(data.len());
    let markup = &data[first_non_ws..];

    if HTML_TAGS.iter().any(|tag| is_html_tag(markup, tag)) {
        return TEXT_HTML;
    }
    if markup.starts_with(b"<?xml") {
        return TEXT_XML;
    }

    for &(pattern, mask, content_type) in MASKED {
        if masked_match(data, pattern, mask) {
            return content_type;
        }
    }

    for &(signature, content_type) in EXACT {
        if data.starts_with(signature) {
            return content_type;
        }
    }

    if is_mp4(data) {
        return "video/mp4";
    }

    if data.iter().any(|b| is_binary(*b)) { OCTET_STREAM } else { TEXT_PLAIN }
}

/// Case-insensitive tag match that also requires a tag-terminating byte after the tag.
fn is_html_tag(data: &[u8], tag: &[u8]) -> bool {
    if data.len() < tag.len() + 1 {
        return false;
    }
    let (head, rest) = data.split_at(tag.len());
    head.eq_ignore_ascii_case(tag) && matches!(rest[0], b' ' | b'>')
}

fn masked_match(data: &[u8], pattern: &[u8], mask: &[u8]) -> bool {
    data.len() >= pattern.len() && data.iter().zip(pattern).zip(mask).all(|((d, p), m)| d & m == *p)
}

/// ISO base media file with an `mp4` major or compatible brand.
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }
    (8..box_size).step_by(4).filter(|&i| i != 12).any(|i| data.get(i..i + 3) == Some(&b"mp4"[..]))
}

#[inline]
fn is_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

#[inline]
fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(sniff(b"Hello World!\r\n"), "text/plain; charset=utf-8");
        assert_eq!(sniff(b"{\"hello\": \"world\"}"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_html() {
        assert_eq!(sniff(b"<html><body>hi</body></html>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"\r\n  <!doctype html>\n<p>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<p class=\"x\">"), "text/html; charset=utf-8");
        // a tag needs a terminating byte
        assert_eq!(sniff(b"<paragraph>"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_xml() {
        assert_eq!(sniff(b"<?xml version=\"1.0\"?><a/>"), "text/xml; charset=utf-8");
    }

    #[test]
    fn test_binary_signatures() {
        assert_eq!(sniff(b"\x89PNG\x0D\x0A\x1A\x0A\0\0\0\x0DIHDR"), "image/png");
        assert_eq!(sniff(b"GIF89a\x01\0\x01\0"), "image/gif");
        assert_eq!(sniff(b"\xFF\xD8\xFF\xE0\0\x10JFIF"), "image/jpeg");
        assert_eq!(sniff(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff(b"RIFF\x24\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff(b"\x1F\x8B\x08\0\0\0\0\0"), "application/x-gzip");
        assert_eq!(sniff(b"\0asm\x01\0\0\0"), "application/wasm");
    }

    #[test]
    fn test_mp4() {
        let data = b"\0\0\0\x18ftypmp42\0\0\0\0mp42isom";
        assert_eq!(sniff(data), "video/mp4");
    }

    #[test]
    fn test_octet_stream() {
        assert_eq!(sniff(&[0x01, 0x02, 0x03, 0x04]), "application/octet-stream");
    }

    #[test]
    fn test_only_leading_bytes_are_inspected() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(sniff(&data), "text/plain; charset=utf-8");
    }
}

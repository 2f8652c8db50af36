//! Byte scanning helpers
//!
//! Chunked byte search, whitespace skipping and character-class lookup
//! tables used by the template parser.

/// Chunk size for batched scanning
pub const CHUNK_SIZE: usize = 16;

/// Find a byte, scanning in fixed-size chunks
pub fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    let chunks = haystack.chunks_exact(CHUNK_SIZE);
    let remainder = chunks.remainder();

    let mut offset = 0;

    for chunk in chunks {
        if let Some(i) = chunk.iter().position(|&b| b == needle) {
            return Some(offset + i);
        }
        offset += CHUNK_SIZE;
    }

    remainder.iter().position(|&b| b == needle).map(|i| offset + i)
}

/// Find a byte sequence
pub fn find_seq(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let first = *needle.first()?;
    let mut pos = 0;
    while let Some(offset) = find_byte(&haystack[pos..], first) {
        let at = pos + offset;
        if haystack[at..].starts_with(needle) {
            return Some(at);
        }
        pos = at + 1;
    }
    None
}

#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C)
}

/// Skip whitespace starting at `start`; returns the first non-whitespace offset
pub fn skip_whitespace(input: &[u8], start: usize) -> usize {
    let mut pos = start;

    // Whole chunks of indentation are common in templates
    while pos + CHUNK_SIZE <= input.len() && input[pos..pos + CHUNK_SIZE].iter().all(|&b| is_whitespace(b)) {
        pos += CHUNK_SIZE;
    }

    while pos < input.len() && is_whitespace(input[pos]) {
        pos += 1;
    }

    pos
}

/// Whether a text run contains only whitespace
pub fn is_blank(text: &str) -> bool {
    skip_whitespace(text.as_bytes(), 0) == text.len()
}

/// 1-based line and column of a byte offset
pub fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let before = &source[..offset.min(source.len())];
    let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line as u32, column as u32)
}

/// Character classes for tag and attribute names
pub struct NameScanner {
    tag_start: [bool; 256],
    tag_name: [bool; 256],
    attr_stop: [bool; 256],
}

impl Default for NameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl NameScanner {
    pub fn new() -> Self {
        let mut tag_start = [false; 256];
        let mut tag_name = [false; 256];
        let mut attr_stop = [false; 256];

        for c in (b'a'..=b'z').chain(b'A'..=b'Z').chain([b'_']) {
            tag_start[c as usize] = true;
            tag_name[c as usize] = true;
        }
        for c in (b'0'..=b'9').chain([b'.', b'-']) {
            tag_name[c as usize] = true;
        }

        for c in [b' ', b'\t', b'\n', b'\r', 0x0C, b'=', b'>', b'/', b'"', b'\''] {
            attr_stop[c as usize] = true;
        }

        Self {
            tag_start,
            tag_name,
            attr_stop,
        }
    }

    #[inline]
    pub fn is_tag_start(&self, b: u8) -> bool {
        self.tag_start[b as usize]
    }

    /// End offset of a tag name beginning at `start`
    pub fn scan_tag_name(&self, input: &[u8], start: usize) -> usize {
        let mut pos = start;
        while pos < input.len() && self.tag_name[input[pos] as usize] {
            pos += 1;
        }
        pos
    }

    /// End offset of an attribute name beginning at `start`
    pub fn scan_attr_name(&self, input: &[u8], start: usize) -> usize {
        let mut pos = start;
        while pos < input.len() && !self.attr_stop[input[pos] as usize] {
            pos += 1;
        }
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_byte_across_chunks() {
        let mut input = vec![b'a'; 40];
        input[35] = b'<';
        assert_eq!(find_byte(&input, b'<'), Some(35));
        assert_eq!(find_byte(b"abc", b'<'), None);
    }

    #[test]
    fn test_find_seq() {
        assert_eq!(find_seq(b"a - -- -->x", b"-->"), Some(7));
        assert_eq!(find_seq(b"--", b"-->"), None);
    }

    #[test]
    fn test_skip_whitespace() {
        let input = b"                    \n\t x";
        assert_eq!(skip_whitespace(input, 0), input.len() - 1);
        assert!(is_blank("  \n "));
        assert!(!is_blank(" a "));
    }

    #[test]
    fn test_line_col() {
        let src = "ab\ncd\nef";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 4), (2, 2));
        assert_eq!(line_col(src, 6), (3, 1));
    }

    #[test]
    fn test_names() {
        let scanner = NameScanner::new();
        let input = b"my-el.x_1 rest";
        assert!(scanner.is_tag_start(b'm'));
        assert!(!scanner.is_tag_start(b'1'));
        assert_eq!(scanner.scan_tag_name(input, 0), 9);

        let attrs = b"[title]=\"x\"";
        assert_eq!(scanner.scan_attr_name(attrs, 0), 7);
        let attrs = b"*if>";
        assert_eq!(scanner.scan_attr_name(attrs, 0), 3);
    }
}

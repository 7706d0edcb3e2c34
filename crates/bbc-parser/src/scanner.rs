use memchr::{memchr, memmem};
use tracing::warn;

/// Scanner on the message being rewritten.
///
/// Owns the buffer and every offset into it. All offsets are byte offsets into the current
/// buffer, mutations report how many bytes they inserted so the caller can move its offsets.
#[derive(Debug, Default)]
pub(crate) struct Scanner {
    /// The message, rewritten in place.
    text: String,

    /// Position of the `[` being looked at.
    pub(crate) pos: usize,

    /// Start of the tag value or content.
    pub(crate) pos1: usize,

    /// End of the tag value.
    pub(crate) pos2: usize,

    /// Start of the closing tag of unparsed content.
    pub(crate) pos3: usize,

    /// Start of text not yet passed through the between tags pass.
    pub(crate) last_pos: usize,
}

impl Scanner {
    pub(crate) fn new(text: String) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.text.len()
    }

    #[cfg(test)]
    pub(crate) fn as_str(&self) -> &str {
        &self.text
    }

    /// Byte at `at`, `None` past the end.
    pub(crate) fn byte(&self, at: usize) -> Option<u8> {
        self.text.as_bytes().get(at).copied()
    }

    /// First `needle` byte at or after `from`.
    pub(crate) fn find_byte(&self, needle: u8, from: usize) -> Option<usize> {
        let haystack = self.text.as_bytes().get(from..)?;
        memchr(needle, haystack).map(|x| x + from)
    }

    /// First occurrence of `needle` at or after `from`.
    pub(crate) fn find(&self, needle: &str, from: usize) -> Option<usize> {
        let haystack = self.text.as_bytes().get(from..)?;
        memmem::find(haystack, needle.as_bytes()).map(|x| x + from)
    }

    /// First ascii case insensitive occurrence of `needle` at or after `from`.
    ///
    /// `needle` must start with `[`.
    pub(crate) fn find_ignore_case(&self, needle: &str, from: usize) -> Option<usize> {
        let needle = needle.as_bytes();
        let first = *needle.first()?;
        let mut at = from;
        while let Some(found) = self.find_byte(first, at) {
            if self.matches_ignore_case_at(found, needle) {
                return Some(found);
            }
            at = found + 1;
        }
        None
    }

    /// Text at `at` is exactly `needle`.
    pub(crate) fn starts_with_at(&self, at: usize, needle: &str) -> bool {
        self.text
            .as_bytes()
            .get(at..)
            .map_or(false, |x| x.starts_with(needle.as_bytes()))
    }

    /// Text at `at` is `needle`, ignoring ascii case.
    pub(crate) fn matches_ignore_case_at(&self, at: usize, needle: &[u8]) -> bool {
        self.text
            .as_bytes()
            .get(at..at + needle.len())
            .map_or(false, |x| x.eq_ignore_ascii_case(needle))
    }

    /// Text in `start..end`, empty when the range is out of bounds or inverted.
    pub(crate) fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.text.len());
        self.text.get(start..end).unwrap_or_default()
    }

    pub(crate) fn slice_from(&self, start: usize) -> &str {
        self.text.get(start..).unwrap_or_default()
    }

    /// Replace `len` bytes at `start` with `with`. Returns the inserted length.
    ///
    /// Ranges are clamped to the buffer. A range not on char boundaries leaves the buffer as is.
    pub(crate) fn splice(&mut self, start: usize, len: usize, with: &str) -> usize {
        let start = start.min(self.text.len());
        let end = start.saturating_add(len).min(self.text.len());
        if !self.text.is_char_boundary(start) || !self.text.is_char_boundary(end) {
            warn!("refusing to splice inside a character at {start}..{end}");
            return 0;
        }
        self.text.replace_range(start..end, with);
        with.len()
    }

    pub(crate) fn insert(&mut self, at: usize, with: &str) -> usize {
        self.splice(at, 0, with)
    }

    pub(crate) fn remove(&mut self, at: usize, len: usize) {
        self.splice(at, len, "");
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    /// Take the buffer out, leaving the scanner empty.
    pub(crate) fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

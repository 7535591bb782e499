// The Buffer collaborator (spec §2 "Input Buffer", §6 "Buffer collaborator").
//
// The core treats the input buffer as an external, positioned character
// stream; this module specifies the trait and supplies the one concrete
// implementation a host needs for in-memory input (§1 scopes out streaming
// input larger than addressable memory, so an in-memory buffer is a complete
// collaborator rather than a placeholder). This plays the role the teacher's
// `Input`/`InputAt` traits and `CharInput` played for a single regex program,
// generalized to the character-at-a-time protocol the match engine drives.

/// A positioned character stream.
///
/// Characters are Unicode scalar values as produced by the host; the engine
/// makes no normalization assumption beyond "same scalar value → same
/// transition" (§6).
pub trait Buffer {
    /// Returns true iff a character remains at the current position.
    fn has_next(&self) -> bool;

    /// Returns the character at the current position and advances past it.
    ///
    /// Panics if `has_next` would have returned false.
    fn next(&mut self) -> char;

    /// The character position the next call to `next` will read, counted in
    /// Unicode scalar values (not bytes) from the start of the buffer.
    fn current_pos(&self) -> usize;

    /// Extracts the substring spanning character positions `[start, stop]`
    /// inclusive, for reporting a committed match (§4.2 `perform_actions`).
    fn string(&self, start: usize, stop: usize) -> String;

    /// Returns up to `max_chars` characters of lookahead starting at
    /// character position `start`, for the prefilter's scan (§4.3
    /// "Prefilter"). Returns `None` if this buffer cannot look ahead of
    /// positions not yet consumed by `next` — true streaming sources are
    /// entitled to say so. `None` is always a safe answer: the prefilter
    /// treats it as "cannot rule this position out" (§4.3: the prefilter
    /// "may only tell the engine 'no pattern can begin here'; it must never
    /// inhibit a match that would otherwise occur").
    fn peek_str(&self, start: usize, max_chars: usize) -> Option<String> {
        let _ = (start, max_chars);
        None
    }
}

/// A [`Buffer`] over an in-memory string, addressed by character position.
///
/// Byte offsets are precomputed once at construction so that `string` and
/// `current_pos` remain O(1)/O(slice length) rather than re-scanning UTF-8
/// from the start on every call.
pub struct StrBuffer<'t> {
    text: &'t str,
    // Byte offset of each character position, plus a trailing sentinel equal
    // to `text.len()`, so `char_at(i)` is always a valid slice start and
    // `char_offsets[i+1]` is always a valid slice end.
    char_offsets: Vec<usize>,
    pos: usize,
}

impl<'t> StrBuffer<'t> {
    pub fn new(text: &'t str) -> Self {
        let mut char_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        char_offsets.push(text.len());
        StrBuffer {
            text,
            char_offsets,
            pos: 0,
        }
    }

    /// Number of characters in the buffer.
    pub fn len_chars(&self) -> usize {
        self.char_offsets.len().saturating_sub(1)
    }
}

impl<'t> Buffer for StrBuffer<'t> {
    fn has_next(&self) -> bool {
        self.pos < self.len_chars()
    }

    fn next(&mut self) -> char {
        let start = self.char_offsets[self.pos];
        let end = self.char_offsets[self.pos + 1];
        self.pos += 1;
        self.text[start..end].chars().next().expect("non-empty char slice")
    }

    fn current_pos(&self) -> usize {
        self.pos
    }

    fn string(&self, start: usize, stop: usize) -> String {
        let byte_start = self.char_offsets[start];
        let byte_stop = self.char_offsets[stop + 1];
        self.text[byte_start..byte_stop].to_string()
    }

    fn peek_str(&self, start: usize, max_chars: usize) -> Option<String> {
        if start >= self.len_chars() {
            return Some(String::new());
        }
        let stop = (start + max_chars).min(self.len_chars());
        let byte_start = self.char_offsets[start];
        let byte_stop = self.char_offsets[stop];
        Some(self.text[byte_start..byte_stop].to_string())
    }
}

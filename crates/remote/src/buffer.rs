//! Accumulated output of one stream with carriage-return line overwrite.
//!
//! Rules, applied as bytes arrive:
//!
//! - a `\r` followed by anything other than `\n` discards the current line,
//!   so only the text after the last `\r` of a line survives;
//! - `\r\n` is a line ending and is kept verbatim;
//! - a `\r` at the very end of the received bytes is held back until the next
//!   byte shows which case applies. At end of stream it is dropped.
//!
//! Bytes are decoded as UTF-8; a multi-byte sequence split across reads is
//! completed by the next read, invalid sequences become U+FFFD.

const REPLACEMENT: char = '\u{FFFD}';

#[derive(Debug, Default, Clone)]
pub struct StreamBuffer {
    text: String,
    line_start: usize,
    carriage_return: bool,
    partial: Vec<u8>,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapsed text received so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Feed the next bytes read from the stream.
    pub fn push(&mut self, bytes: &[u8]) {
        let mut input = std::mem::take(&mut self.partial);
        input.extend_from_slice(bytes);

        let mut remaining = input.as_slice();
        loop {
            match std::str::from_utf8(remaining) {
                Ok(valid) => {
                    self.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, rest) = remaining.split_at(error.valid_up_to());
                    // the prefix was just validated
                    self.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match error.error_len() {
                        Some(invalid) => {
                            self.push_char(REPLACEMENT);
                            remaining = &rest[invalid..];
                        }
                        None => {
                            self.partial = rest.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Flush state at end of stream. Returns true if the text changed.
    pub fn finish(&mut self) -> bool {
        self.carriage_return = false;
        if self.partial.is_empty() {
            return false;
        }
        self.partial.clear();
        self.push_char(REPLACEMENT);
        true
    }

    fn push_str(&mut self, text: &str) {
        for character in text.chars() {
            self.push_char(character);
        }
    }

    fn push_char(&mut self, character: char) {
        if self.carriage_return {
            self.carriage_return = false;
            if character == '\n' {
                self.text.push_str("\r\n");
                self.line_start = self.text.len();
                return;
            }
            self.text.truncate(self.line_start);
        }

        match character {
            '\r' => self.carriage_return = true,
            '\n' => {
                self.text.push('\n');
                self.line_start = self.text.len();
            }
            other => self.text.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collapse(chunks: &[&[u8]]) -> String {
        let mut buffer = StreamBuffer::new();
        for chunk in chunks {
            buffer.push(chunk);
        }
        buffer.finish();
        buffer.text().to_string()
    }

    #[test]
    fn keeps_text_after_last_carriage_return() {
        assert_eq!(collapse(&[b"progress: 10%\rprogress: 50%\rprogress: 100%"]), "progress: 100%");
    }

    #[test]
    fn only_the_current_line_is_overwritten() {
        assert_eq!(collapse(&[b"header\n10%\r20%\nfooter"]), "header\n20%\nfooter");
    }

    #[test]
    fn crlf_is_a_line_ending() {
        assert_eq!(collapse(&[b"one\r\ntwo\r\n"]), "one\r\ntwo\r\n");
    }

    #[test]
    fn trailing_carriage_return_waits_for_next_read() {
        let mut buffer = StreamBuffer::new();
        buffer.push(b"line\r");
        assert_eq!(buffer.text(), "line");
        buffer.push(b"\nnext");
        assert_eq!(buffer.text(), "line\r\nnext");

        let mut buffer = StreamBuffer::new();
        buffer.push(b"50%\r");
        buffer.push(b"75%");
        assert_eq!(buffer.text(), "75%");
    }

    #[test]
    fn carriage_return_at_end_of_stream_is_dropped() {
        assert_eq!(collapse(&[b"done\r"]), "done");
    }

    #[test]
    fn utf8_split_across_reads_is_reassembled() {
        let bytes = "größe".as_bytes();
        let (first, second) = bytes.split_at(3);
        assert_eq!(collapse(&[first, second]), "größe");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(collapse(&[b"ok \xff end"]), "ok \u{FFFD} end");
        assert_eq!(collapse(&[b"cut \xc3"]), "cut \u{FFFD}");
    }
}

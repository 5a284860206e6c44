//! Line protocol shared by the relay and its clients.
//!
//! Client -> server: `<username> <message>\n`, at most 299 characters.
//! Server -> client: exactly one line per request. History replies pack every
//! record into that line, each terminated by `#`; clients turn `#` back into
//! line breaks for display.

use thiserror::Error;

use crate::models::ChatMessage;

/// Lines of this many characters or more are rejected.
pub const MAX_LINE_LEN: usize = 300;

/// Raw bytes buffered while looking for a line terminator. Anything longer
/// necessarily holds at least [`MAX_LINE_LEN`] characters.
pub const MAX_LINE_BYTES: usize = MAX_LINE_LEN * 4;

/// Separates the username token from the message.
pub const FIELD_SEPARATOR: char = ' ';

/// Terminates each record of a history reply.
pub const RECORD_SEPARATOR: char = '#';

/// Requests the sender's history.
pub const UPDATE_COMMAND: &str = "!update";

/// Marks a private message: `@<recipient> <text>`.
pub const PRIVATE_PREFIX: char = '@';

/// Client-side only; never sent over the wire.
pub const EXIT_COMMAND: &str = "!exit";

/// Body stored in place of the payload when a private recipient is unknown.
pub const NO_SUCH_USER: &str = "No such user!";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("line is {len} characters, limit is {} exclusive", MAX_LINE_LEN)]
    TooLong { len: usize },

    #[error("line exceeds {limit} bytes without a terminator")]
    Oversized { limit: usize },

    #[error("line has no space after the username")]
    MissingSeparator,

    #[error("line has an empty username")]
    EmptyUsername,

    #[error("message contains a line break")]
    LineBreak,
}

/// A validated inbound line, borrowed from the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedLine<'a> {
    pub username: &'a str,
    pub message: &'a str,
}

/// Splits a raw line into username and trimmed message.
pub fn decode_line(line: &str) -> Result<DecodedLine<'_>, LineError> {
    let len = line.chars().count();
    if len >= MAX_LINE_LEN {
        return Err(LineError::TooLong { len });
    }

    let (username, rest) = line
        .split_once(FIELD_SEPARATOR)
        .ok_or(LineError::MissingSeparator)?;

    if username.is_empty() {
        return Err(LineError::EmptyUsername);
    }

    Ok(DecodedLine {
        username,
        message: rest.trim(),
    })
}

/// Builds the line a client sends for `message`.
pub fn encode_request(username: &str, message: &str) -> String {
    format!("{username}{FIELD_SEPARATOR}{message}")
}

/// Checks an outgoing request line. Beyond [`decode_line`], a request must
/// not contain `\n` or `\r`: the transport would split it into several lines.
pub fn validate_request(line: &str) -> Result<(), LineError> {
    if line.contains(['\n', '\r']) {
        return Err(LineError::LineBreak);
    }
    decode_line(line).map(|_| ())
}

/// Formats one history record, including its trailing separator.
pub fn encode_record(msg: &ChatMessage) -> String {
    format!(
        "sender: {} recipient: {} {}{}",
        msg.sender, msg.recipient, msg.body, RECORD_SEPARATOR
    )
}

/// Packs history records into a single reply line. No records -> empty line.
pub fn encode_history(records: &[ChatMessage]) -> String {
    records.iter().map(encode_record).collect()
}

/// Turns a reply line into display text, one record per line.
pub fn expand_response(line: &str) -> String {
    line.replace(RECORD_SEPARATOR, "\n")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn decode_splits_on_first_space() {
        let decoded = decode_line("alice hello there  ").unwrap();
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.message, "hello there");
    }

    #[test]
    fn decode_keeps_private_marker() {
        let decoded = decode_line("alice   @bob hi").unwrap();
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.message, "@bob hi");
    }

    #[test]
    fn decode_allows_empty_message() {
        let decoded = decode_line("alice ").unwrap();
        assert_eq!(decoded.message, "");
    }

    #[test]
    fn length_boundary() {
        let ok = format!("alice {}", "x".repeat(MAX_LINE_LEN - 1 - 6));
        assert_eq!(ok.chars().count(), 299);
        assert!(decode_line(&ok).is_ok());

        let too_long = format!("alice {}", "x".repeat(MAX_LINE_LEN - 6));
        assert_eq!(too_long.chars().count(), 300);
        assert_eq!(
            decode_line(&too_long),
            Err(LineError::TooLong { len: 300 })
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let line = format!("alice {}", "é".repeat(200));
        assert!(line.len() > MAX_LINE_LEN);
        assert!(decode_line(&line).is_ok());
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert_eq!(decode_line("alice"), Err(LineError::MissingSeparator));
        assert_eq!(decode_line(""), Err(LineError::MissingSeparator));
    }

    #[test]
    fn leading_space_is_rejected() {
        assert_eq!(decode_line(" hello"), Err(LineError::EmptyUsername));
    }

    #[test]
    fn history_encoding() {
        let records = vec![
            ChatMessage::new("alice", "bob", "hello"),
            ChatMessage::new("bob", "alice", "hi back"),
        ];
        assert_eq!(
            encode_history(&records),
            "sender: alice recipient: bob hello#sender: bob recipient: alice hi back#"
        );
        assert_eq!(encode_history(&[]), "");
    }

    #[test]
    fn expanded_history_reproduces_records() {
        let records = vec![
            ChatMessage::new("alice", "bob", "one"),
            ChatMessage::new("carol", "alice", "two words"),
        ];
        let expanded = expand_response(&encode_history(&records));
        let lines: Vec<&str> = expanded.split('\n').collect();

        assert_eq!(lines.len(), records.len() + 1);
        assert_eq!(lines[0], "sender: alice recipient: bob one");
        assert_eq!(lines[1], "sender: carol recipient: alice two words");
        assert_eq!(lines[2], "");
    }

    #[test]
    fn request_decodes_back() {
        let line = encode_request("alice", "@bob see you");
        let decoded = decode_line(&line).unwrap();
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.message, "@bob see you");
    }

    #[rstest]
    #[case::newline("hi\nthere")]
    #[case::carriage_return("hi\rthere")]
    #[case::crlf_at_end("hi\r\n")]
    fn request_with_line_break_is_refused(#[case] message: &str) {
        let line = encode_request("alice", message);
        assert_eq!(validate_request(&line), Err(LineError::LineBreak));
    }

    #[rstest]
    #[case::plain("hello", Ok(()))]
    #[case::empty("", Ok(()))]
    #[case::private("@bob hi", Ok(()))]
    #[case::spaces_only("   ", Ok(()))]
    fn request_validation(#[case] message: &str, #[case] expected: Result<(), LineError>) {
        assert_eq!(validate_request(&encode_request("alice", message)), expected);
    }
}

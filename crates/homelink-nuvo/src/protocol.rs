//! Nuvo Essentia ASCII protocol framing and response tokenizer.
//!
//! Every command is a `*` prefix, a `Z` plus zone number, a command body,
//! and a carriage return:
//!
//! ```text
//! *Z<zone><body>\r
//! ```
//!
//! The iTach bridge is driven with the command bytes as lowercase hex, so
//! the bytes produced here go through [`to_hex`] before they reach a
//! [`Bridge`](homelink_core::Bridge).
//!
//! # Responses
//!
//! Status replies look like `#Z3,ON,SRC2,VOL42,DND0,LOCK0\r\n`, but the
//! bridge hands back whatever arrived on the line, sometimes with echo or
//! noise around it. [`tokenize`] splits such text into words, numbers and
//! single punctuation characters so the status parser can match on tokens
//! instead of raw substrings.

use bytes::{BufMut, BytesMut};

use crate::ids::ZoneId;

/// Command prefix byte.
pub const PREFIX: u8 = b'*';

/// Command terminator byte.
pub const TERMINATOR: u8 = b'\r';

/// Encode a zone command into raw bytes ready for the bridge.
///
/// # Example
///
/// ```
/// use homelink_nuvo::ids::ZoneId;
/// use homelink_nuvo::protocol::encode_command;
///
/// let zone = ZoneId::new(3).unwrap();
/// assert_eq!(encode_command(zone, "STATUS?"), b"*Z3STATUS?\r");
/// ```
pub fn encode_command(zone: ZoneId, body: &str) -> Vec<u8> {
    let zone = zone.to_string();
    let mut buf = BytesMut::with_capacity(2 + zone.len() + body.len() + 1);
    buf.put_u8(PREFIX);
    buf.put_u8(b'Z');
    buf.put_slice(zone.as_bytes());
    buf.put_slice(body.as_bytes());
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Lowercase hex encoding of a command, as the bridge expects it.
pub fn to_hex(command: &[u8]) -> String {
    hex::encode(command)
}

/// One lexical unit of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A run of ASCII letters.
    Word(&'a str),
    /// A run of ASCII digits.
    Number(&'a str),
    /// Any other single character, including whitespace.
    Punct(char),
}

/// Split a response into [`Token`]s.
///
/// Letters and digits never share a token, so `VOL42` becomes
/// `Word("VOL"), Number("42")`.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_ascii_alphabetic() || c.is_ascii_digit() {
            let alpha = c.is_ascii_alphabetic();
            let mut end = start + c.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                let same = if alpha {
                    next.is_ascii_alphabetic()
                } else {
                    next.is_ascii_digit()
                };
                if !same {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            let run = &text[start..end];
            tokens.push(if alpha {
                Token::Word(run)
            } else {
                Token::Number(run)
            });
        } else {
            tokens.push(Token::Punct(c));
        }
    }

    tokens
}

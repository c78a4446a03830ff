//! BenQ projector RS-232 protocol.
//!
//! Commands are ASCII, wrapped in a carriage return, `*`, the command body
//! and `#` plus a final carriage return:
//!
//! ```text
//! \r*<key>=<value>#\r        e.g. \r*pow=?#\r, \r*pow=on#\r
//! ```
//!
//! The projector echoes the command and answers on a new line:
//!
//! ```text
//! >*pow=?#\r\r\n*POW=ON#\r\n
//! ```
//!
//! [`parse_answer`] pulls the value (`ON` above) out of such a reply.

use bytes::{BufMut, BytesMut};

/// Value reported for any attribute the projector did not answer.
pub const UNKNOWN: &str = "unknown";

/// Marker in front of the answer line.
const ANSWER_MARKER: &str = "\r\r\n";

/// Read-only projector queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Power,
    LampHours,
    InputSource,
    LampMode,
    ModelName,
}

impl Query {
    /// Command body between `*` and `#`.
    pub fn body(self) -> &'static str {
        match self {
            Query::Power => "pow=?",
            Query::LampHours => "ltim=?",
            Query::InputSource => "sour=?",
            Query::LampMode => "lampm=?",
            Query::ModelName => "modelname=?",
        }
    }

    /// Human-readable attribute label.
    pub fn label(self) -> &'static str {
        match self {
            Query::Power => "Lamp",
            Query::LampHours => "Lamp Hours",
            Query::InputSource => "Input Source",
            Query::LampMode => "Lamp Mode",
            Query::ModelName => "Model",
        }
    }
}

/// Frame a command body: `\r*{body}#\r`.
pub fn encode_command(body: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(body.len() + 4);
    buf.put_slice(b"\r*");
    buf.put_slice(body.as_bytes());
    buf.put_slice(b"#\r");
    buf.to_vec()
}

pub fn cmd_query(query: Query) -> Vec<u8> {
    encode_command(query.body())
}

pub fn cmd_power_on() -> Vec<u8> {
    encode_command("pow=on")
}

pub fn cmd_power_off() -> Vec<u8> {
    encode_command("pow=off")
}

/// Extract the value from a projector reply.
///
/// The answer is the first line following a `\r\r\n` marker that has the
/// form `<key>=<value>#`. The value runs from the last `=` to the last `#`
/// on that line, and both key and value must be non-empty.
pub fn parse_answer(reply: &str) -> Option<&str> {
    reply.match_indices(ANSWER_MARKER).find_map(|(pos, _)| {
        let rest = &reply[pos + ANSWER_MARKER.len()..];
        let line = rest.split('\n').next().unwrap_or(rest);
        answer_value(line)
    })
}

fn answer_value(line: &str) -> Option<&str> {
    let hash = line.rfind('#')?;
    let head = &line[..hash];
    // The value needs at least one character, so the last one can't be `=`.
    let (last, _) = head.char_indices().next_back()?;
    let eq = head[..last].rfind('=')?;
    if eq == 0 {
        return None;
    }
    Some(&line[eq + 1..hash])
}

/// [`parse_answer`] with a missing answer reported as [`UNKNOWN`].
pub fn answer_or_unknown(reply: &str) -> String {
    parse_answer(reply).unwrap_or(UNKNOWN).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_framing() {
        assert_eq!(cmd_query(Query::Power), b"\r*pow=?#\r");
        assert_eq!(cmd_query(Query::LampHours), b"\r*ltim=?#\r");
        assert_eq!(cmd_query(Query::InputSource), b"\r*sour=?#\r");
        assert_eq!(cmd_query(Query::LampMode), b"\r*lampm=?#\r");
        assert_eq!(cmd_query(Query::ModelName), b"\r*modelname=?#\r");
        assert_eq!(cmd_power_on(), b"\r*pow=on#\r");
        assert_eq!(cmd_power_off(), b"\r*pow=off#\r");
    }

    #[test]
    fn parses_typical_reply() {
        assert_eq!(parse_answer(">*pow=?#\r\r\n*POW=ON#\r\n"), Some("ON"));
        assert_eq!(parse_answer("\r\r\n*LTIM=1234#"), Some("1234"));
    }

    #[test]
    fn value_runs_between_last_equals_and_last_hash() {
        assert_eq!(parse_answer("\r\r\n*A=B=C#x#\r\n"), Some("C#x"));
    }

    #[test]
    fn trailing_equals_belongs_to_value() {
        assert_eq!(parse_answer("\r\r\n*A=B=#"), Some("B="));
    }

    #[test]
    fn skips_marker_lines_without_answer() {
        assert_eq!(
            parse_answer("\r\r\nIllegal format\r\r\n*SOUR=HDMI#\r\n"),
            Some("HDMI")
        );
    }

    #[test]
    fn answer_must_be_on_marker_line() {
        assert_eq!(parse_answer("\r\r\nfoo\n*POW=ON#"), None);
    }

    #[test]
    fn empty_key_or_value_rejected() {
        assert_eq!(parse_answer("\r\r\n=ON#"), None);
        assert_eq!(parse_answer("\r\r\n*POW=#"), None);
    }

    #[test]
    fn no_marker_is_unknown() {
        assert_eq!(parse_answer("*POW=ON#"), None);
        assert_eq!(answer_or_unknown(""), "unknown");
        assert_eq!(answer_or_unknown("\r\r\n*LAMPM=ECO#"), "ECO");
    }
}

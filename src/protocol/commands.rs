//! Module `commands`
//!
//! Turns one input line into a `Command` the connection handler can act on.
//! Lines stay raw bytes so chat text in any encoding is relayed untouched.

/// Represents one line received from a chat client.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Blank line, ignored
    Empty,
    /// `/nick <name>`, the name being everything after the first space
    Nick(Vec<u8>),
    /// `/quit`
    Quit,
    /// Any other line starting with `/`, or `/nick` without a space
    Unsupported(Vec<u8>),
    /// Plain chat text to relay to everyone else
    Message(Vec<u8>),
}

/// Strips trailing `\r` and `\n` bytes from a raw line.
pub fn trim_line_ending(raw: &[u8]) -> &[u8] {
    let end = raw
        .iter()
        .rposition(|b| *b != b'\r' && *b != b'\n')
        .map_or(0, |last| last + 1);
    &raw[..end]
}

/// Parses a raw input line into the `Command` enum.
///
/// Command words are case-sensitive and split from their argument on the
/// first space only, so a nick keeps any further spaces verbatim.
pub fn parse_command(raw: &[u8]) -> Command {
    let line = trim_line_ending(raw);

    if line.is_empty() {
        return Command::Empty;
    }

    if line[0] != b'/' {
        return Command::Message(line.to_vec());
    }

    let (cmd, arg) = match line.iter().position(|b| *b == b' ') {
        Some(space) => (&line[..space], Some(&line[space + 1..])),
        None => (line, None),
    };

    match (cmd, arg) {
        (b"/nick", Some(name)) => Command::Nick(name.to_vec()),
        (b"/quit", _) => Command::Quit,
        _ => Command::Unsupported(line.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        assert_eq!(parse_command(b"hi\n"), Command::Message(b"hi".to_vec()));
        assert_eq!(
            parse_command(b"hello there\r\n"),
            Command::Message(b"hello there".to_vec())
        );
        assert_eq!(
            parse_command(b"  leading space kept"),
            Command::Message(b"  leading space kept".to_vec())
        );
    }

    #[test]
    fn test_parse_keeps_non_utf8_bytes() {
        assert_eq!(
            parse_command(b"caf\xe9\n"),
            Command::Message(b"caf\xe9".to_vec())
        );
        assert_eq!(
            parse_command(b"/nick Jos\xe9\r\n"),
            Command::Nick(b"Jos\xe9".to_vec())
        );
    }

    #[test]
    fn test_parse_empty_lines() {
        assert_eq!(parse_command(b""), Command::Empty);
        assert_eq!(parse_command(b"\n"), Command::Empty);
        assert_eq!(parse_command(b"\r\n"), Command::Empty);
        assert_eq!(parse_command(b"\r\r\n\n"), Command::Empty);
    }

    #[test]
    fn test_parse_nick() {
        assert_eq!(
            parse_command(b"/nick alice\r\n"),
            Command::Nick(b"alice".to_vec())
        );
        assert_eq!(
            parse_command(b"/nick Mary Jane"),
            Command::Nick(b"Mary Jane".to_vec())
        );
        assert_eq!(
            parse_command(b"/nick  padded"),
            Command::Nick(b" padded".to_vec())
        );
    }

    #[test]
    fn test_parse_nick_with_empty_remainder() {
        assert_eq!(parse_command(b"/nick \n"), Command::Nick(Vec::new()));
    }

    #[test]
    fn test_parse_nick_without_argument() {
        assert_eq!(
            parse_command(b"/nick"),
            Command::Unsupported(b"/nick".to_vec())
        );
        assert_eq!(
            parse_command(b"/nick\r\n"),
            Command::Unsupported(b"/nick".to_vec())
        );
    }

    #[test]
    fn test_parse_quit() {
        assert_eq!(parse_command(b"/quit\n"), Command::Quit);
        assert_eq!(parse_command(b"/quit now"), Command::Quit);
    }

    #[test]
    fn test_unknown_and_case_sensitive_commands() {
        assert_eq!(parse_command(b"/foo"), Command::Unsupported(b"/foo".to_vec()));
        assert_eq!(
            parse_command(b"/NICK bob"),
            Command::Unsupported(b"/NICK bob".to_vec())
        );
        assert_eq!(parse_command(b"/QUIT"), Command::Unsupported(b"/QUIT".to_vec()));
        assert_eq!(parse_command(b"/"), Command::Unsupported(b"/".to_vec()));
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc"), b"abc");
        assert_eq!(trim_line_ending(b"\n\r"), b"");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `ParsedCommand` produced from a `/name args` comment.
pub struct ParsedCommand<'a> {
    /// Token after the slash, case preserved.
    pub command: &'a str,
    /// Remainder trimmed at both ends; internal whitespace and newlines are kept.
    pub args: Option<&'a str>,
}

fn is_command_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Unicode whitespace plus the byte-order mark.
fn is_blank(ch: char) -> bool {
    ch.is_whitespace() || ch == '\u{feff}'
}

/// Parses `/<token>` optionally followed by whitespace and free text.
///
/// Returns `None` when the trimmed body does not start with a slash, the
/// token is empty, or the token is directly followed by anything other than
/// whitespace (`/test-command`, `/test/command`, `/test.command`).
pub fn parse_command(body: &str) -> Option<ParsedCommand<'_>> {
    let trimmed = body.trim_matches(is_blank);
    let after_slash = trimmed.strip_prefix('/')?;
    let token_len = after_slash
        .char_indices()
        .find(|(_, ch)| !is_command_char(*ch))
        .map(|(index, _)| index)
        .unwrap_or(after_slash.len());
    if token_len == 0 {
        return None;
    }

    let (command, rest) = after_slash.split_at(token_len);
    if rest.is_empty() {
        return Some(ParsedCommand {
            command,
            args: None,
        });
    }
    if !rest.starts_with(is_blank) {
        return None;
    }
    let args = rest.trim_matches(is_blank);
    Some(ParsedCommand {
        command,
        args: (!args.is_empty()).then_some(args),
    })
}

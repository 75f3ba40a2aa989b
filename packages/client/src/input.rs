//! Interpretation of one line of terminal input.

/// Command that leaves the room
pub const EXIT_COMMAND: &str = "/exit";

/// What a typed line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Send `disconnect` and close the connection
    Exit,
    /// Broadcast the (trimmed) text
    Broadcast(String),
    /// Blank line; nothing to send
    Empty,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case(EXIT_COMMAND) {
            Self::Exit
        } else if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Broadcast(trimmed.to_string())
        }
    }
}

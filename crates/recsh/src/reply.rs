//! Shell replies and their one-line text rendering

use std::fmt;

/// Reply to a single shell command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Status line, e.g. `OK` or `PONG`
    Status(String),
    /// A stored value
    Value(String),
    /// Missing value
    Nil,
    /// Counter or boolean result
    Integer(usize),
    /// Command failed; the session continues
    Error(String),
    /// End of session
    Quit,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    pub fn wrong_arity(command: &str) -> Self {
        Reply::Error(format!(
            "ERR wrong number of arguments for '{}' command",
            command.to_lowercase()
        ))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) | Reply::Value(s) | Reply::Error(s) => write!(f, "{}", s),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Quit => write!(f, "bye"),
        }
    }
}

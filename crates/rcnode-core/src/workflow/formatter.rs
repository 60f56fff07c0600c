//! Command formatting.

use std::fmt;

use super::schema::Command;

/// Join a command's name and parameters with single spaces.
///
/// Parameters are passed through verbatim; no quoting or escaping.
pub fn format_command(command: &Command) -> String {
    command.to_string()
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        Ok(())
    }
}

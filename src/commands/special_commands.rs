//! Special commands parser for interactive chat mode
//!
//! Special commands manage the session instead of being sent to the
//! assistant:
//! - Show help
//! - Print the transcript
//! - Reset the session (new thread, empty transcript)
//! - Show session status
//! - Exit
//!
//! Commands are prefixed with `/` and are case-insensitive. `exit` and
//! `quit` are also accepted without the prefix.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command does not take arguments
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Display help information
    Help,

    /// Print the transcript of the current session
    History,

    /// Clear the transcript and start a new thread on the next prompt
    Reset,

    /// Display the thread id and message count
    ShowStatus,

    /// End the session
    Exit,

    /// Not a special command; send the input to the assistant
    None,
}

/// Parse user input into a special command
///
/// # Examples
///
/// ```
/// use cite_chat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/reset").unwrap(), SpecialCommand::Reset);
/// assert_eq!(parse_special_command("QUIT").unwrap(), SpecialCommand::Exit);
/// assert_eq!(
///     parse_special_command("What does the manual say?").unwrap(),
///     SpecialCommand::None
/// );
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let mut parts = lower.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    let parsed = match command {
        "/help" | "/?" => SpecialCommand::Help,
        "/history" => SpecialCommand::History,
        "/reset" | "/new" => SpecialCommand::Reset,
        "/status" => SpecialCommand::ShowStatus,
        "/exit" | "/quit" | "exit" | "quit" => SpecialCommand::Exit,
        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };

    if !arg.is_empty() {
        return Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        });
    }

    Ok(parsed)
}

/// Print help for the interactive chat mode
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
==========================================

  /help, /?       - Show this help
  /history        - Print the conversation so far
  /reset, /new    - Forget the conversation and start a new thread
  /status         - Show the active thread and message count
  /exit, /quit    - End the session (also: exit, quit, Ctrl-D)

Anything else is sent to the assistant. Press Ctrl-C while waiting for a
reply to cancel that request.
"#
    );
}

//! Operator command parsing

use thiserror::Error;

/// A console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Select(String),
    Request(Option<String>),
    Add { ip: String, username: String },
    Delete(String),
    Show,
    Copy,
    Download,
    Dismiss,
    Status,
    Logout,
}

/// Command line that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0} (type 'help')")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (name.to_lowercase().as_str(), args.as_slice()) {
        ("help" | "?", _) => Command::Help,
        ("list" | "ls", []) => Command::List,
        ("select", [target]) => Command::Select(target.to_string()),
        ("select", _) => return Err(CommandError::Usage("select <n|ip>")),
        ("request" | "generate", []) => Command::Request(None),
        ("request" | "generate", [ip]) => Command::Request(Some(ip.to_string())),
        ("request" | "generate", _) => return Err(CommandError::Usage("request [ip]")),
        ("add", [ip, username]) => Command::Add {
            ip: ip.to_string(),
            username: username.to_string(),
        },
        ("add", _) => return Err(CommandError::Usage("add <ip> <username>")),
        ("delete" | "rm", [ip]) => Command::Delete(ip.to_string()),
        ("delete" | "rm", _) => return Err(CommandError::Usage("delete <ip>")),
        ("show", []) => Command::Show,
        ("copy", []) => Command::Copy,
        ("download", []) => Command::Download,
        ("dismiss" | "close", []) => Command::Dismiss,
        ("status", []) => Command::Status,
        ("logout" | "quit" | "exit", []) => Command::Logout,
        _ => return Err(CommandError::Unknown(line.trim().to_string())),
    };
    Ok(Some(command))
}

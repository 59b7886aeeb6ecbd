pub mod client;
pub mod decr;
pub mod del;
pub mod echo;
pub mod executable;
pub mod exists;
pub mod get;
pub mod incr;
pub mod lpush;
pub mod lrange;
pub mod ping;
pub mod rpush;
pub mod set;

use std::{str, vec};

use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::persistence::Aof;
use crate::store::Store;
use crate::Error;

use client::Client;
use decr::Decr;
use del::Del;
use echo::Echo;
use exists::Exists;
use get::Get;
use incr::Incr;
use lpush::Lpush;
use lrange::Lrange;
use ping::Ping;
use rpush::Rpush;
use set::Set;

#[derive(Debug, PartialEq)]
pub enum Command {
    Client(Client),
    Decr(Decr),
    Del(Del),
    Echo(Echo),
    Exists(Exists),
    Get(Get),
    Incr(Incr),
    Lpush(Lpush),
    Lrange(Lrange),
    Ping(Ping),
    Rpush(Rpush),
    Set(Set),
}

impl Command {
    /// Whether executing this command can change store state. Mutating
    /// commands are the ones forwarded to the append-only log.
    pub fn mutates(&self) -> bool {
        match self {
            Command::Decr(_)
            | Command::Del(_)
            | Command::Incr(_)
            | Command::Lpush(_)
            | Command::Rpush(_)
            | Command::Set(_) => true,
            Command::Client(_)
            | Command::Echo(_)
            | Command::Exists(_)
            | Command::Get(_)
            | Command::Lrange(_)
            | Command::Ping(_) => false,
        }
    }
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Client(cmd) => cmd.exec(store),
            Command::Decr(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Echo(cmd) => cmd.exec(store),
            Command::Exists(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Incr(cmd) => cmd.exec(store),
            Command::Lpush(cmd) => cmd.exec(store),
            Command::Lrange(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Rpush(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = CommandError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        match &command_name[..] {
            "client" => Client::try_from(parser).map(Command::Client),
            "decr" => Decr::try_from(parser).map(Command::Decr),
            "del" => Del::try_from(parser).map(Command::Del),
            "echo" => Echo::try_from(parser).map(Command::Echo),
            "exists" => Exists::try_from(parser).map(Command::Exists),
            "get" => Get::try_from(parser).map(Command::Get),
            "incr" => Incr::try_from(parser).map(Command::Incr),
            "lpush" => Lpush::try_from(parser).map(Command::Lpush),
            "lrange" => Lrange::try_from(parser).map(Command::Lrange),
            "ping" => Ping::try_from(parser).map(Command::Ping),
            "rpush" => Rpush::try_from(parser).map(Command::Rpush),
            "set" => Set::try_from(parser).map(Command::Set),
            _ => Err(CommandError::Unknown {
                command: command_name,
                args: parser.preview_remaining(),
            }),
        }
    }
}

/// Runs one decoded request against the store and produces the reply frame.
///
/// Parse and execution failures always degrade to an `Error` reply; they never
/// escape to the connection layer. When the command mutates state, the reply
/// is not an error, and a log is configured, the original request frame is
/// appended to the log after the mutation commits and before the reply is
/// returned. The only fallible path out is the log append itself.
pub fn execute(request: Frame, store: &Store, log: Option<&Aof>) -> crate::Result<Frame> {
    let command = match Command::try_from(request.clone()) {
        Ok(command) => command,
        Err(err) => return Ok(Frame::Error(err.to_string())),
    };

    let mutates = command.mutates();
    let reply = command.exec(store.clone())?;

    if mutates && !matches!(reply, Frame::Error(_)) {
        if let Some(log) = log {
            log.append(&request)?;
        }
    }

    Ok(reply)
}

pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Arguments left to consume. Commands with a fixed arity check this
    /// before parsing so surplus arguments surface as an arity error.
    fn remaining(&self) -> usize {
        self.parts.len()
    }

    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representations may carry command
            // arguments. Arguments are parsed to UTF-8.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => string
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotInteger),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map_err(CommandParserError::InvalidUTF8String)?
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotInteger),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    /// A quoted preview of the remaining arguments, used by the
    /// unknown-command reply.
    fn preview_remaining(&mut self) -> String {
        let mut preview = Vec::new();
        loop {
            match self.next_string() {
                Ok(arg) => preview.push(format!("'{arg}'")),
                Err(CommandParserError::EndOfStream) => break,
                Err(_) => continue,
            }
        }
        preview.join(" ")
    }
}

/// Reply-level command failures. The `Display` output is the exact message
/// sent back on the wire inside an error frame.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandError {
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),
    #[error("ERR syntax error")]
    Syntax,
    #[error("ERR value is not an integer or out of range")]
    NotInteger,
    #[error("ERR unknown command '{command}', with args beginning with: {args}")]
    Unknown { command: String, args: String },
    #[error("ERR protocol error; {0}")]
    Protocol(CommandParserError),
}

impl From<CommandParserError> for CommandError {
    fn from(err: CommandParserError) -> Self {
        match err {
            CommandParserError::NotInteger => CommandError::NotInteger,
            err => CommandError::Protocol(err),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("value is not an integer or out of range")]
    NotInteger,
    #[error("invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}

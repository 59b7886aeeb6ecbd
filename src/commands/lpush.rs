use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Prepends the given elements, one at a time in the order given, to the list
/// stored at `key`, creating the list first if the key is absent. Returns the
/// final list length.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub elements: Vec<String>,
}

impl Executable for Lpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut store = store.lock();
        let mut length = 0;

        for element in self.elements {
            length = match store.push_front(&self.key, element) {
                Ok(length) => length,
                Err(_) => {
                    return Ok(Frame::Error(
                        "WRONGTYPE Operation against a key holding the wrong kind of value"
                            .to_string(),
                    ))
                }
            };
        }

        Ok(Frame::Integer(length as i64))
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parse_push_args(parser, "lpush").map(|(key, elements)| Self { key, elements })
    }
}

/// Shared LPUSH/RPUSH argument shape: a key followed by one or more elements.
pub(super) fn parse_push_args(
    parser: &mut CommandParser,
    command: &'static str,
) -> Result<(String, Vec<String>), CommandError> {
    if parser.remaining() < 2 {
        return Err(CommandError::WrongArity(command));
    }

    let key = parser.next_string()?;
    let mut elements = vec![];

    loop {
        match parser.next_string() {
            Ok(element) => elements.push(element),
            Err(CommandParserError::EndOfStream) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok((key, elements))
}

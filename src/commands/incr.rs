use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Increments the number stored at `key` by one, treating an absent key as
/// zero. The write-back replaces the entry, so any expiry is cleared.
///
/// Ref: <https://redis.io/docs/latest/commands/incr/>
#[derive(Debug, PartialEq)]
pub struct Incr {
    pub key: String,
}

impl Executable for Incr {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let res = match store.lock().incr_by(&self.key, 1) {
            Ok(value) => Frame::Integer(value),
            Err(_) => Frame::Error("ERR value is not an integer or out of range".to_string()),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Incr {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 1 {
            return Err(CommandError::WrongArity("incr"));
        }

        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

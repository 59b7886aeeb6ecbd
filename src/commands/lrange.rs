use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns a slice of the list stored at `key`. Negative indices count from
/// the end of the list, `-1` being the last element. An absent key behaves as
/// an empty list.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange/>
#[derive(Debug, PartialEq)]
pub struct Lrange {
    pub key: String,
    pub start: i64,
    pub end: i64,
}

impl Executable for Lrange {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let res = match store.lock().range(&self.key, self.start, self.end) {
            Ok(elements) => Frame::Array(
                elements
                    .into_iter()
                    .map(|element| Frame::Bulk(Bytes::from(element)))
                    .collect(),
            ),
            Err(_) => Frame::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            ),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Lrange {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() != 3 {
            return Err(CommandError::WrongArity("lrange"));
        }

        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let end = parser.next_integer()?;

        Ok(Self { key, start, end })
    }
}

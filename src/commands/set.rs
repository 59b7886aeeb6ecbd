use tokio::time::Duration;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Sets `key` to hold a string value, replacing whatever was there, with an
/// optional expiry given in seconds (`EX`) or milliseconds (`PX`).
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: String,
    pub ttl: Option<Ttl>,
}

#[derive(Debug, PartialEq)]
pub enum Ttl {
    Ex(i64),
    Px(i64),
}

impl Ttl {
    pub fn duration(&self) -> Duration {
        // A non-positive ttl means the key is already expired.
        match *self {
            Ttl::Ex(seconds) => Duration::from_secs(seconds.max(0) as u64),
            Ttl::Px(millis) => Duration::from_millis(millis.max(0) as u64),
        }
    }
}

impl Executable for Set {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut store = store.lock();

        match self.ttl {
            Some(ttl) => store.set_with_ttl(self.key, self.value, ttl.duration()),
            None => store.set(self.key, self.value),
        }

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() < 2 {
            return Err(CommandError::WrongArity("set"));
        }

        let key = parser.next_string()?;
        let value = parser.next_string()?;

        let ttl = match parser.remaining() {
            0 => None,
            2 => {
                let mode = parser.next_string()?;
                let ttl = parser.next_integer()?;
                match mode.to_uppercase().as_str() {
                    "EX" => Some(Ttl::Ex(ttl)),
                    "PX" => Some(Ttl::Px(ttl)),
                    _ => return Err(CommandError::Syntax),
                }
            }
            _ => return Err(CommandError::Syntax),
        };

        Ok(Self { key, value, ttl })
    }
}

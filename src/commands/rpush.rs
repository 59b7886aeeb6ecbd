use crate::commands::executable::Executable;
use crate::commands::lpush::parse_push_args;
use crate::commands::{CommandError, CommandParser};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Appends the given elements, one at a time in the order given, to the list
/// stored at `key`, creating the list first if the key is absent. Returns the
/// final list length.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush/>
#[derive(Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub elements: Vec<String>,
}

impl Executable for Rpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut store = store.lock();
        let mut length = 0;

        for element in self.elements {
            length = match store.push_back(&self.key, element) {
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

impl TryFrom<&mut CommandParser> for Rpush {
    type Error = CommandError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parse_push_args(parser, "rpush").map(|(key, elements)| Self { key, elements })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use bytes::Bytes;

    fn frame_of(parts: &[&str]) -> Frame {
        Frame::Array(
            parts
                .iter()
                .map(|p| Frame::Bulk(Bytes::from(p.to_string())))
                .collect(),
        )
    }

    #[test]
    fn pushes_elements_to_the_right() {
        let cmd = Command::try_from(frame_of(&["RPUSH", "list1", "a", "b"])).unwrap();

        assert_eq!(
            cmd,
            Command::Rpush(Rpush {
                key: "list1".to_string(),
                elements: vec!["a".to_string(), "b".to_string()],
            })
        );

        let store = Store::new();
        let result = cmd.exec(store.clone()).unwrap();

        assert_eq!(result, Frame::Integer(2));
        assert_eq!(
            store.lock().range("list1", 0, -1),
            Ok(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn extends_an_existing_list() {
        let store = Store::new();
        store.lock().push_back("list1", "a".to_string()).unwrap();

        let cmd = Command::try_from(frame_of(&["RPUSH", "list1", "b"])).unwrap();
        let result = cmd.exec(store.clone()).unwrap();

        assert_eq!(result, Frame::Integer(2));
    }

    #[test]
    fn string_key() {
        let cmd = Command::try_from(frame_of(&["RPUSH", "key1", "a"])).unwrap();

        let store = Store::new();
        store.lock().set("key1".to_string(), "value".to_string());

        let result = cmd.exec(store.clone()).unwrap();

        assert_eq!(
            result,
            Frame::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string()
            )
        );
    }

    #[test]
    fn wrong_arity() {
        let err = Command::try_from(frame_of(&["RPUSH"])).unwrap_err();

        assert_eq!(err, CommandError::WrongArity("rpush"));
    }
}

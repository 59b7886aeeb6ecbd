use std::fs::{File, OpenOptions};
use std::io::{Cursor, ErrorKind, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::{Buf, BytesMut};
use tracing::info;

use crate::commands::execute;
use crate::frame::{self, Frame};
use crate::store::Store;

const REPLAY_CHUNK_SIZE: usize = 4096;

/// The append-only durability log. Every mutating command that executed
/// successfully is appended in wire format, one array frame per command, so
/// replaying the file through the codec and executor rebuilds store state.
///
/// Writes go straight to the file descriptor with no userspace buffering, and
/// the single shared handle serializes concurrent appenders.
#[derive(Clone)]
pub struct Aof {
    file: Arc<Mutex<File>>,
}

impl Aof {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Aof> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Aof {
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn append(&self, frame: &Frame) -> std::io::Result<()> {
        let mut file = self.file.lock().unwrap();
        file.write_all(&frame.serialize())
    }
}

/// Rebuilds store state by replaying the log at `path` through the regular
/// command path, with logging disabled so replay does not re-append itself. A
/// missing file is created empty. A replayed command that produces an error
/// reply means the file is corrupt and startup must abort; a trailing partial
/// frame is left unconsumed, so a torn final write loses only that command.
pub fn restore(path: impl AsRef<Path>, store: &Store) -> crate::Result<()> {
    let mut file = match File::open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            File::create(&path)?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let mut buffer = BytesMut::new();
    let mut chunk = [0u8; REPLAY_CHUNK_SIZE];
    let mut replayed = 0u64;

    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        loop {
            let mut cursor = Cursor::new(&buffer[..]);
            let frame = match Frame::parse(&mut cursor) {
                Ok(frame) => frame,
                Err(frame::Error::Incomplete) => break,
                Err(err) => return Err(format!("corrupt append-only file: {err}").into()),
            };

            let position = cursor.position() as usize;
            buffer.advance(position);

            let reply = execute(frame, store, None)?;
            if let Frame::Error(message) = reply {
                return Err(format!("corrupt append-only file: {message}").into());
            }
            replayed += 1;
        }
    }

    info!("Restored {} commands from the append-only file", replayed);

    Ok(())
}

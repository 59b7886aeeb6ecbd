use std::net::SocketAddr;
use std::path::Path;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, instrument};

use crate::commands::execute;
use crate::connection::Connection;
use crate::persistence::{self, Aof};
use crate::store::Store;
use crate::Error;

/// Cadence of the active-expiration sweep.
const SWEEP_INTERVAL: Duration = Duration::from_millis(100);

pub async fn run(port: u16, aof_path: impl AsRef<Path>) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let store = Store::new();
    persistence::restore(&aof_path, &store)?;
    let log = Aof::open(&aof_path)?;

    tokio::spawn({
        let store = store.clone();
        async move {
            let mut ticker = interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                store.sweep_expired();
            }
        }
    });

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    info!(
        "Server listening on {}, append-only file at {}",
        listener.local_addr()?,
        aof_path.as_ref().display(),
    );

    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        let log = log.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store, log).await {
                error!("connection error: {}", e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, store, log),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
    log: Aof,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    while let Some(frame) = conn.read_frame().await? {
        debug!("Received frame from client: {:?}", frame);
        let reply = execute(frame, &store, Some(&log))?;
        debug!("Sending response to client: {:?}", reply);

        conn.write_frame(reply).await?;
    }

    info!("Connection closed");
    Ok(())
}

use std::path::PathBuf;

use clap::Parser;
use rudis::{server, Error};

const PORT: u16 = 6380;

#[derive(Parser, Debug)]
struct Args {
    /// The port to listen on
    #[arg(short, long, env = "RUDIS_PORT", default_value_t = PORT)]
    port: u16,

    /// The append-only durability file
    #[arg(short, long, env = "RUDIS_AOF_PATH", default_value = "rudis.aof")]
    aof_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    server::run(args.port, args.aof_path).await
}

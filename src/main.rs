use clap::Parser;
use eyre::Result;
use log::{info, LevelFilter};

use crate::client::Config;

mod channel;
mod client;
mod ext;
mod handlers;
mod irc;
mod logging;
mod net;
mod state;
mod triggers;

#[derive(Debug, Parser)]
struct Args {
    /// server address as host:port
    #[arg(long, default_value = "localhost:6667")]
    addr: String,

    #[arg(long, default_value = "[bot]Gral-irc")]
    nick: String,

    #[arg(long, default_value = "gral.irc bot")]
    realname: String,

    /// server password, sent even when empty
    #[arg(long, default_value = "")]
    password: String,

    /// channel to join after the MOTD
    #[arg(long, default_value = "#gral.irc")]
    channel: String,

    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let max_level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let host = args.addr.split(':').next().unwrap_or("server");
    logging::init(host, max_level)?;

    info!("connecting to server {}", args.addr);

    let config = Config {
        addr: args.addr,
        nick: args.nick,
        realname: args.realname,
        password: args.password,
        channel: args.channel,
    };

    client::start(&config)?;
    Ok(())
}

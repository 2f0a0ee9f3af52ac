use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "x402-scout")]
#[command(about = "x402 resource discovery service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server with the background crawler
    Server(ServerArgs),
    /// Run one crawl cycle and exit
    Crawl,
    /// Sync all known facilitators and exit
    Sync,
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides configuration)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

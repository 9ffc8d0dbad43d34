#![forbid(unsafe_code)]

mod cli;
mod startup;

use anyhow::Result;

use cli::Command;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    match cli.command {
        Some(Command::Version) => {
            println!("udpguard-agent {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Command::Check) => startup::check(&cli),
        None => startup::run(&cli).await,
    }
}

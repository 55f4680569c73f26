//! Manual RCON probe for operating the game server from a terminal
//!
//! Sends a single console command and prints the assembled response,
//! or a parsed player summary for `status`.

use anyhow::Result;
use clap::Parser;
use pickup_hub::rcon::{RconClient, RconEndpoint};
use std::time::Duration;

/// Send one RCON command to a game server and print the response
#[derive(Parser)]
#[command(name = "rcon-probe", version, about)]
struct Args {
    /// Game server host
    #[arg(long, env = "RCON_HOST")]
    host: String,

    /// Game server port
    #[arg(long, env = "RCON_PORT", default_value_t = 27960)]
    port: u16,

    /// Console password
    #[arg(long, env = "RCON_PASSWORD")]
    password: String,

    /// Wait for the first response datagram, in milliseconds
    #[arg(long, default_value_t = 1500)]
    timeout_ms: u64,

    /// Print the parsed `status` result as JSON
    #[arg(long)]
    json: bool,

    /// Do not wait for a response
    #[arg(long)]
    no_reply: bool,

    /// The console command, e.g. `status` or `say "hello"`
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.join(" ");

    let client = RconClient::with_timeouts(
        RconEndpoint {
            host: args.host,
            port: args.port,
            password: args.password,
        },
        Duration::from_millis(args.timeout_ms),
        Duration::from_millis(300),
    );

    if args.no_reply {
        client.execute_fire_and_forget(&command).await?;
        return Ok(());
    }

    if command.trim() == "status" {
        let status = client.status().await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("{} player(s) connected", status.player_count());
            for player in &status.players {
                println!(
                    "  #{:<3} {:<24} score {:<5} ping {}",
                    player.id, player.name, player.score, player.ping
                );
            }
        }
        return Ok(());
    }

    let response = client.execute(&command).await?;
    print!("{}", response);
    Ok(())
}

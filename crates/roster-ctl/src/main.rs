//! roster-ctl — command-line client for the auditor's roster endpoint.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use roster_core::wire::{decode_roster, RosterRecord};
use roster_core::RosterConfig;

const TIMEOUT: Duration = Duration::from_secs(5);

// ── Query helper ──────────────────────────────────────────────────────────────

/// Connect, read the whole response frame, return it untouched.
async fn fetch_frame(addr: SocketAddr) -> Result<Vec<u8>> {
    let mut stream = tokio::time::timeout(TIMEOUT, TcpStream::connect(addr))
        .await
        .with_context(|| format!("timed out connecting to auditor at {}", addr))?
        .with_context(|| format!("failed to connect to auditor at {} — is it running?", addr))?;

    let mut frame = Vec::new();
    tokio::time::timeout(TIMEOUT, stream.read_to_end(&mut frame))
        .await
        .context("timed out reading roster")?
        .context("failed to read roster")?;
    Ok(frame)
}

async fn fetch_roster(addr: SocketAddr) -> Result<Vec<RosterRecord>> {
    let frame = fetch_frame(addr).await?;
    decode_roster(&frame).context("failed to parse roster")
}

// ── Subcommand handlers ───────────────────────────────────────────────────────

async fn cmd_list(addr: SocketAddr) -> Result<()> {
    let roster = fetch_roster(addr).await?;

    if roster.is_empty() {
        println!("No musicians playing.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Active Musicians ({})", roster.len());
    println!("═══════════════════════════════════════");

    for m in &roster {
        println!("  ┌─ {}", m.uuid);
        println!("  │  instrument   : {}", m.instrument.as_deref().unwrap_or("?"));
        println!("  └─ active since : {}", m.active_since.as_deref().unwrap_or("?"));
    }

    Ok(())
}

async fn cmd_raw(addr: SocketAddr) -> Result<()> {
    let frame = fetch_frame(addr).await?;
    print!("{}", String::from_utf8_lossy(&frame));
    Ok(())
}

async fn cmd_count(addr: SocketAddr) -> Result<()> {
    println!("{}", fetch_roster(addr).await?.len());
    Ok(())
}

fn print_usage(default: SocketAddr) {
    println!("Usage: roster-ctl [--host <ip>] [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  list    List active musicians (default)");
    println!("  raw     Print the auditor's response as received");
    println!("  count   Print the number of active musicians");
    println!();
    println!("Options:");
    println!("  --host <ip>     Auditor address (default: {})", default.ip());
    println!("  --port <port>   Auditor query port (default: {})", default.port());
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let default_addr = RosterConfig::load()
        .unwrap_or_default()
        .network
        .query_addr();

    // Parse --host / --port options
    let mut addr = default_addr;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                let port: u16 = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
                addr.set_port(port);
            }
            "--host" => {
                i += 1;
                let host: IpAddr = args
                    .get(i)
                    .context("--host requires a value")?
                    .parse()
                    .context("--host must be an IP address")?;
                addr.set_ip(host);
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["list"] | []                  => cmd_list(addr).await,
        ["raw"]                        => cmd_raw(addr).await,
        ["count"]                      => cmd_count(addr).await,
        ["help"] | ["--help"] | ["-h"] => { print_usage(default_addr); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage(default_addr);
            std::process::exit(1);
        }
    }
}

use std::time::Duration;

use clap::{Parser, Subcommand};
use sync::room::{party_room_key, passphrase_room_key};
use sync::{SyncClient, SyncEvent};
use tokio::sync::mpsc;
use wire::{Action, Envelope};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ACK_DRAIN: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing room key; pass --passphrase or --party")]
    MissingRoomKey,
    #[error("pass either --passphrase or --party, not both")]
    AmbiguousRoomKey,
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("timed out waiting for connect")]
    ConnectTimeout,
    #[error("session ended by the server: {0}")]
    SessionEnded(String),
}

#[derive(Parser, Debug)]
#[command(name = "board-sync", about = "Shared-canvas room diagnostics over websocket")]
struct Cli {
    #[arg(long, env = "BOARD_SYNC_SERVER", default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Shared passphrase naming the room, used verbatim after trimming.
    #[arg(long, env = "BOARD_SYNC_PASSPHRASE")]
    passphrase: Option<String>,

    /// Party member identifiers; the room key is derived from the roster.
    #[arg(long, value_delimiter = ',')]
    party: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect and print every event the room delivers until interrupted.
    Watch,
    /// Derive and print the room key without connecting.
    RoomKey,
    /// Clear all objects from a page.
    Clear { page: u32 },
    /// Set a page's grid spacing.
    Grid { page: u32, spacing: f32 },
    /// Show or hide a page's grid.
    GridVisibility { page: u32, visible: bool },
    /// Insert a new page at the given index.
    NewPage { page: u32 },
    /// Delete the page at the given index.
    DeletePage { page: u32 },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let room_key = room_key(cli.passphrase.as_deref(), &cli.party)?;

    match cli.command {
        Command::Watch => run_watch(&cli.server, &room_key).await,
        Command::RoomKey => {
            println!("{room_key}");
            Ok(())
        }
        Command::Clear { page } => send_one(&cli.server, &room_key, Envelope::clear_page(page)).await,
        Command::Grid { page, spacing } => {
            send_one(&cli.server, &room_key, Envelope::update_grid(page, spacing)).await
        }
        Command::GridVisibility { page, visible } => {
            send_one(
                &cli.server,
                &room_key,
                Envelope::update_grid_visibility(page, visible),
            )
            .await
        }
        Command::NewPage { page } => {
            send_one(&cli.server, &room_key, Envelope::add_new_page(page)).await
        }
        Command::DeletePage { page } => {
            send_one(&cli.server, &room_key, Envelope::delete_page(page)).await
        }
    }
}

fn room_key(passphrase: Option<&str>, party: &[String]) -> Result<String, CliError> {
    match (passphrase, party.is_empty()) {
        (Some(_), false) => Err(CliError::AmbiguousRoomKey),
        (Some(passphrase), true) => Ok(passphrase_room_key(passphrase)),
        (None, false) => Ok(party_room_key(party)),
        (None, true) => Err(CliError::MissingRoomKey),
    }
}

async fn connect(server: &str, room_key: &str) -> Result<(SyncClient, mpsc::Receiver<SyncEvent>), CliError> {
    let (events, mut rx) = mpsc::channel(64);
    let client = SyncClient::new(events);
    client.connect(server, room_key).await;

    loop {
        let event = tokio::time::timeout(CONNECT_TIMEOUT, rx.recv())
            .await
            .map_err(|_| CliError::ConnectTimeout)?;
        match event {
            Some(SyncEvent::Connected) => return Ok((client, rx)),
            Some(SyncEvent::Error(message)) => return Err(CliError::Connect(message)),
            Some(SyncEvent::Disconnected) | None => {
                return Err(CliError::Connect("connection closed".to_owned()));
            }
            Some(_) => {}
        }
    }
}

async fn run_watch(server: &str, room_key: &str) -> Result<(), CliError> {
    let (client, mut rx) = connect(server, room_key).await?;
    eprintln!("connected; press Ctrl-C to stop");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(SyncEvent::Update(envelope)) => print_update(&envelope),
                Some(SyncEvent::HostStatus { is_host }) => println!("host-status is_host={is_host}"),
                Some(SyncEvent::RoomClosing) => println!("room-closing"),
                Some(SyncEvent::Error(message)) => println!("error {message}"),
                Some(SyncEvent::Disconnected) | None => {
                    println!("disconnected");
                    return Ok(());
                }
                Some(SyncEvent::Connected) => {}
            },
            _ = tokio::signal::ctrl_c() => {
                client.disconnect().await;
                return Ok(());
            }
        }
    }
}

async fn send_one(server: &str, room_key: &str, envelope: Envelope) -> Result<(), CliError> {
    let (client, mut rx) = connect(server, room_key).await?;
    client.send(envelope).await;

    // Sends are queued; give the receive loop a moment to flush and to
    // surface an immediate server rejection before closing.
    let drained = tokio::time::timeout(ACK_DRAIN, async {
        while let Some(event) = rx.recv().await {
            if let SyncEvent::Error(message) = event {
                return Err(CliError::SessionEnded(message));
            }
        }
        Ok(())
    })
    .await;
    if let Ok(Err(error)) = drained {
        return Err(error);
    }

    client.disconnect().await;
    println!("sent");
    Ok(())
}

fn print_update(envelope: &Envelope) {
    match envelope.action {
        Action::UpdateGrid => match envelope.grid_spacing() {
            Ok(spacing) => println!("update page={} grid spacing={spacing}", envelope.page_index),
            Err(error) => println!("update page={} grid <{error}>", envelope.page_index),
        },
        Action::UpdateGridVisibility => match envelope.grid_visible() {
            Ok(visible) => {
                println!("update page={} grid visible={visible}", envelope.page_index);
            }
            Err(error) => println!("update page={} grid <{error}>", envelope.page_index),
        },
        action => println!(
            "update page={} action={action:?} data_len={}",
            envelope.page_index,
            envelope.data.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_key_requires_exactly_one_source() {
        assert!(matches!(room_key(None, &[]), Err(CliError::MissingRoomKey)));
        assert!(matches!(
            room_key(Some("p"), &["a".to_owned()]),
            Err(CliError::AmbiguousRoomKey)
        ));
    }

    #[test]
    fn room_key_prefers_the_given_passphrase_verbatim() {
        assert_eq!(room_key(Some("  quiet owl  "), &[]).ok(), Some("quiet owl".to_owned()));
    }

    #[test]
    fn room_key_from_party_is_order_insensitive() {
        let ab = room_key(None, &["a".to_owned(), "b".to_owned()]).ok();
        let ba = room_key(None, &["b".to_owned(), "a".to_owned()]).ok();
        assert_eq!(ab, ba);
    }
}

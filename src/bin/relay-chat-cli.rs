use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use relay_chat::client::{ChatClient, ChatSession, ClientError, ViewChange, diff_view};
use relay_chat::message::Message;

#[derive(Parser)]
#[command(name = "relay-chat-cli", version, about = "Terminal client for the relay chat server")]
struct Cli {
    /// Base URL of the relay server
    #[arg(long, default_value = "http://localhost:5001", value_name = "URL")]
    server: String,
    /// Nickname to chat as
    #[arg(long)]
    nickname: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let nickname = cli.nickname.trim().to_string();
    anyhow::ensure!(!nickname.is_empty(), "nickname must not be empty");

    let client = ChatClient::new(cli.server);
    match client.join(&nickname).await {
        Ok(_) => {}
        // Rejoining with a known nickname is fine.
        Err(ClientError::Status { status: 400, message }) => warn!(%message, "join rejected"),
        Err(err) => return Err(err.into()),
    }

    let session = ChatSession::open(client, nickname).await;
    let mut updates = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown: Vec<Message> = Vec::new();

    println!("Chatting as {} (Ctrl-D to quit)", session.nickname());
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                let fresh = match diff_view(&shown, &view.messages) {
                    ViewChange::Appended(fresh) => fresh,
                    ViewChange::Reset(all) => {
                        println!("--- conversation cleared ---");
                        all
                    }
                };
                for msg in fresh {
                    print_message(msg, session.is_own(msg));
                }
                shown = view.messages.clone();
                if let Some(err) = &view.last_error {
                    eprintln!("! {err}");
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(text) => {
                        if let Err(err) = session.send(&text).await {
                            eprintln!("! could not send: {err}");
                        }
                    }
                    None => break,
                }
            }
        }
    }

    session.poller().stop();
    Ok(())
}

fn print_message(msg: &Message, own: bool) {
    let when = msg
        .parsed_timestamp()
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Invalid date".to_string());
    let marker = if own {
        ">"
    } else if msg.is_from_bot() {
        "*"
    } else {
        "<"
    };
    println!("{marker} [{when}] {}: {}", msg.sender, msg.text);
}

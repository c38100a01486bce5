use std::time::Duration;

use messenger_realtime_rs::{EventKind, EventPayload, RealtimeTransport, RealtimeTransportOptions};

/// Connect, subscribe to chat events, and send a few envelopes
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing to see logs
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let url = std::env::var("MESSENGER_WS_URL")
        .unwrap_or_else(|_| "ws://localhost:3001/ws".to_string());

    println!("📡 Connecting to: {url}\n");

    let transport = RealtimeTransport::new(&url, RealtimeTransportOptions::default())?;

    // Register listeners before connecting so nothing inbound is missed
    let _messages = transport
        .subscribe(EventKind::Message, |envelope| {
            if let EventPayload::Message(body) = envelope.payload() {
                println!(
                    "💬 [{}] {}: {}",
                    envelope.chat_id().unwrap_or("?"),
                    envelope.actor_id().unwrap_or("?"),
                    body.content
                );
            }
            Ok(())
        })
        .await;

    let _typing = transport
        .subscribe(EventKind::Typing, |envelope| {
            println!(
                "✏️  typing update in {}",
                envelope.chat_id().unwrap_or("?")
            );
            Ok(())
        })
        .await;

    transport.connect().await?;
    println!("✅ Connected, status: {:?}\n", transport.status().await);

    transport
        .send_chat_message("room:lobby", "hello from rust", "demo-user")
        .await?;
    transport.send_typing("room:lobby", "demo-user", false).await?;
    transport.update_presence("demo-user", true).await?;

    println!("⏳ Listening for 30 seconds...");
    tokio::time::sleep(Duration::from_secs(30)).await;

    transport.update_presence("demo-user", false).await?;
    transport.disconnect().await?;
    println!("👋 Disconnected");

    Ok(())
}

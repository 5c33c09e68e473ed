use std::sync::Arc;

use sala_core::{
    NullMediaBackend, RoomSession, SalaConfig, SalaEvent, SalaEventListener, ScreenState,
    WebSocketConnector,
};

/// Prints session events to the terminal.
struct PrintListener;

impl SalaEventListener for PrintListener {
    fn on_event(&self, event: SalaEvent) {
        match event {
            SalaEvent::ParticipantsUpdated(list) => {
                println!("participants ({}):", list.len());
                for p in &list {
                    println!("  {} [{}]", p.name, p.user_id);
                }
            }
            SalaEvent::ScreenChanged(ScreenState::InMeeting) => {
                println!("in meeting");
            }
            SalaEvent::ScreenChanged(ScreenState::Exited) => {
                println!("thanks for joining, see you next time");
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: sala <room-id> <name> [service-url]");
        eprintln!("       service url defaults to SALA_SERVICE_URL or ws://localhost:3001");
        return;
    }
    let room_id = args[1].clone();
    let name = args[2].clone();

    let mut config = SalaConfig::from_env();
    if let Some(url) = args.get(3) {
        config.service_url = url.clone();
    }
    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        return;
    }

    // No terminal capture layer; the preview degrades to its disabled
    // state and the participant list is the interesting part.
    let session = RoomSession::new(
        config,
        room_id.clone(),
        Arc::new(NullMediaBackend),
        Arc::new(WebSocketConnector),
    );
    session.add_listener(Arc::new(PrintListener));

    session.activate().await;
    if let Err(e) = session.join(&name).await {
        eprintln!("error: {e}");
        return;
    }
    println!("joined room {room_id} as {name}; press Ctrl-C to leave");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to wait for Ctrl-C: {e}");
    }
    session.leave().await;
}

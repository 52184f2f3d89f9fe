mod app;
mod config;
mod fragment;
mod protocol;
mod session;
mod slider;
mod theme;
mod ui;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use config::AppConfig;
use protocol::ControlMessage;
use session::{SendOutcome, SessionEvent};
use theme::Theme;

#[derive(Parser, Debug)]
#[command(name = "fader")]
#[command(version = "0.1.0")]
#[command(about = "A terminal slider panel for ad-hoc WebSocket control channels")]
struct Args {
    /// Control server URL (overrides the config file)
    #[arg(short, long)]
    url: Option<String>,

    /// Send a single slider value and exit
    #[arg(short, long, value_name = "VALUE")]
    send: Option<String>,

    /// Connect and print incoming messages as JSON lines
    #[arg(short, long)]
    listen: bool,

    /// Start the TUI without connecting (connect later with 'c')
    #[arg(long)]
    no_connect: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = AppConfig::load().unwrap_or_default();
    let url = args
        .url
        .clone()
        .unwrap_or_else(|| config.server_url.clone());

    // Handle CLI-only commands
    if let Some(value) = args.send {
        return send_once(&url, &value).await;
    }

    if args.listen {
        return listen(&url).await;
    }

    // Run TUI
    let connect_now = config.connect_on_start && !args.no_connect;
    run_tui(config, url, connect_now).await
}

/// Connect, emit one sliderMoved frame, close cleanly
async fn send_once(url: &str, value: &str) -> Result<()> {
    let _: f64 = value
        .parse()
        .context("slider value must be numeric")?;

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let session = session::connect(url.to_string(), events_tx);

    // Wait for the connection to open before sending
    loop {
        match events.recv().await {
            Some(SessionEvent::Opened) => break,
            Some(SessionEvent::Errored(e)) => bail!("connect to {} failed: {}", url, e),
            Some(SessionEvent::Closed) | None => bail!("connection closed before open"),
            Some(_) => {}
        }
    }

    let frame = ControlMessage::slider_moved(value).to_json()?;
    if session.send_text(frame) == SendOutcome::NotReady {
        bail!("connection dropped before the value was sent");
    }
    session.close().await;

    println!("sent sliderMoved {}", value);
    Ok(())
}

/// Connect and mirror every inbound message to stdout, one JSON line each
async fn listen(url: &str) -> Result<()> {
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let _session = session::connect(url.to_string(), events_tx);

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Opened => tracing::info!("listening on {}", url),
            SessionEvent::Message(inbound) => {
                // Re-serialize compactly so each message is one line
                println!("{}", serde_json::to_string(&inbound.value)?);
            }
            SessionEvent::Malformed { raw, error } => {
                tracing::warn!("unparseable message ({}): {}", error, raw);
            }
            SessionEvent::Binary { len } => {
                tracing::debug!("ignoring binary frame ({} bytes)", len);
            }
            SessionEvent::Closed => break,
            SessionEvent::Errored(e) => bail!("connection error: {}", e),
        }
    }

    Ok(())
}

async fn run_tui(config: AppConfig, url: String, connect_now: bool) -> Result<()> {
    ui::init_theme(Theme::from_overrides(&config.colors));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(config, url, connect_now);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        // Periodic refresh
        let _ = app.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    #[tokio::test]
    async fn send_once_emits_the_exact_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let mut frames = Vec::new();
            while let Some(Ok(msg)) = ws.next().await {
                match msg {
                    Message::Text(text) => frames.push(text),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            frames
        });

        send_once(&url, "42").await.unwrap();

        let frames = server.await.unwrap();
        assert_eq!(
            frames,
            vec![r#"{"type":"sliderMoved","value":"42"}"#.to_string()]
        );
    }

    #[tokio::test]
    async fn send_once_rejects_non_numeric_values() {
        // Fails validation before any connection is attempted
        assert!(send_once("ws://localhost:9", "fast").await.is_err());
    }

    #[tokio::test]
    async fn send_once_fails_cleanly_when_the_server_is_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        drop(listener);

        assert!(send_once(&url, "1").await.is_err());
    }
}

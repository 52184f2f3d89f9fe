use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::collections::VecDeque;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::fragment;
use crate::protocol::ControlMessage;
use crate::session::{self, SendOutcome, SessionEvent, SessionHandle, SessionState};
use crate::slider::Slider;

/// Most recent entries kept in the message log
const LOG_CAPACITY: usize = 200;

/// Seconds before a transient status message clears
const STATUS_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Slider,
    Messages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    Fragment,
}

/// One line of the in-TUI message log
#[derive(Debug, Clone)]
pub enum LogEntry {
    /// Summary of a parsed inbound message
    Inbound(String),
    /// An inbound text frame that was not valid JSON
    Malformed { raw: String, error: String },
    /// An inbound binary frame
    Binary { len: usize },
    /// A connection lifecycle note
    Lifecycle(String),
}

pub struct App {
    pub section: Section,
    pub popup: Popup,

    pub config: AppConfig,
    pub server_url: String,

    // The slider control and its paired display value
    pub slider: Slider,

    // Session state (the widget's view of the connection)
    session: Option<SessionHandle>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    session_events: mpsc::UnboundedReceiver<SessionEvent>,
    pub session_state: SessionState,
    pub last_error: Option<String>,
    pub sent_count: u64,
    pub received_count: u64,

    // Message log (newest at the back)
    pub log: VecDeque<LogEntry>,
    pub log_scroll: usize, // entries scrolled up from the bottom

    // Fragment viewer
    pub fragment_content: String,
    pub fragment_scroll: usize,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(config: AppConfig, server_url: String, connect_now: bool) -> Self {
        let slider_cfg = config.slider.validated();
        let (events_tx, session_events) = mpsc::unbounded_channel();

        let mut app = Self {
            section: Section::Slider,
            popup: Popup::None,

            slider: Slider::new(
                slider_cfg.min,
                slider_cfg.max,
                slider_cfg.step,
                slider_cfg.initial,
            ),

            config,
            server_url,

            session: None,
            events_tx,
            session_events,
            session_state: SessionState::Idle,
            last_error: None,
            sent_count: 0,
            received_count: 0,

            log: VecDeque::new(),
            log_scroll: 0,

            fragment_content: String::new(),
            fragment_scroll: 0,

            status_message: None,
            status_message_time: None,
        };

        if connect_now {
            app.connect_session();
        }

        app
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    fn push_log(&mut self, entry: LogEntry) {
        if self.log.len() >= LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(entry);
    }

    /// Open a connection to the configured server. Refused while a
    /// connection is already live: one connection per session.
    pub fn connect_session(&mut self) {
        if !self.session_state.can_connect() {
            self.set_status("Already connected");
            return;
        }

        tracing::info!("connecting to {}", self.server_url);
        self.session_state = SessionState::Connecting;
        self.last_error = None;
        self.push_log(LogEntry::Lifecycle(format!(
            "connecting to {}",
            self.server_url
        )));
        self.session = Some(session::connect(
            self.server_url.clone(),
            self.events_tx.clone(),
        ));
    }

    /// Send a control message if the connection is open. The open check is
    /// the explicit gate in front of every send: when the session is not
    /// ready the frame is dropped and `NotReady` is returned, it never
    /// surfaces as a transport fault.
    pub fn send_control(&mut self, msg: &ControlMessage) -> Result<SendOutcome> {
        if !self.session_state.is_open() {
            return Ok(SendOutcome::NotReady);
        }
        let Some(session) = &self.session else {
            return Ok(SendOutcome::NotReady);
        };

        let frame = msg.to_json()?;
        let outcome = session.send_text(frame);
        if outcome == SendOutcome::Sent {
            self.sent_count += 1;
        }
        Ok(outcome)
    }

    /// One slider input event: the display already mirrors the new value
    /// (the slider holds it); forward it over the channel.
    pub fn slider_input(&mut self) -> Result<()> {
        let msg = ControlMessage::slider_moved(self.slider.wire_value());
        match self.send_control(&msg)? {
            SendOutcome::Sent => {}
            SendOutcome::NotReady => self.set_status("Not connected - slider value not sent"),
        }
        Ok(())
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }
        self.handle_normal_key(key).await
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.section = match self.section {
                    Section::Slider => Section::Messages,
                    Section::Messages => Section::Slider,
                };
            }

            // Slider input (only while the slider section is active)
            KeyCode::Left | KeyCode::Char('h') if self.section == Section::Slider => {
                if self.slider.decrease() {
                    self.slider_input()?;
                }
            }
            KeyCode::Right | KeyCode::Char('l') if self.section == Section::Slider => {
                if self.slider.increase() {
                    self.slider_input()?;
                }
            }
            KeyCode::Home if self.section == Section::Slider => {
                if self.slider.jump_min() {
                    self.slider_input()?;
                }
            }
            KeyCode::End if self.section == Section::Slider => {
                if self.slider.jump_max() {
                    self.slider_input()?;
                }
            }

            // Message log scrolling
            KeyCode::Up | KeyCode::Char('k') if self.section == Section::Messages => {
                self.scroll_log_up();
            }
            KeyCode::Down | KeyCode::Char('j') if self.section == Section::Messages => {
                self.log_scroll = self.log_scroll.saturating_sub(1);
            }

            // Connect (a fresh initialize; no-op while a connection is live)
            KeyCode::Char('c') => self.connect_session(),

            // Load the static fragment into the viewer
            KeyCode::Char('o') => self.load_fragment().await?,

            KeyCode::Char('?') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')
                ) {
                    self.popup = Popup::None;
                }
            }
            Popup::Fragment => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => self.popup = Popup::None,
                KeyCode::Up | KeyCode::Char('k') => {
                    self.fragment_scroll = self.fragment_scroll.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let lines = self.fragment_content.lines().count();
                    self.fragment_scroll = (self.fragment_scroll + 1).min(lines.saturating_sub(1));
                }
                _ => {}
            },
            Popup::None => {}
        }
        Ok(())
    }

    fn scroll_log_up(&mut self) {
        self.log_scroll = (self.log_scroll + 1).min(self.log.len().saturating_sub(1));
    }

    /// Fetch the static fragment and show it in the viewer popup
    async fn load_fragment(&mut self) -> Result<()> {
        match fragment::fetch(&self.config.fragment_url).await {
            Ok(body) => {
                self.fragment_content = body;
                self.fragment_scroll = 0;
                self.popup = Popup::Fragment;
            }
            Err(e) => self.set_status(format!("Fragment load failed: {}", e)),
        }
        Ok(())
    }

    /// Periodic work: drain session events, expire the status message
    pub async fn tick(&mut self) -> Result<()> {
        while let Ok(event) = self.session_events.try_recv() {
            self.apply_session_event(event);
        }

        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_TIMEOUT_SECS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        Ok(())
    }

    fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Opened => {
                self.session_state = SessionState::Open;
                self.push_log(LogEntry::Lifecycle("connection open".to_string()));
            }
            SessionEvent::Closed => {
                self.session_state = SessionState::Closed;
                self.session = None;
                self.push_log(LogEntry::Lifecycle("connection closed".to_string()));
            }
            SessionEvent::Errored(detail) => {
                tracing::error!("session error: {}", detail);
                self.session_state = SessionState::Errored;
                self.session = None;
                self.push_log(LogEntry::Lifecycle(format!("error: {}", detail)));
                self.last_error = Some(detail);
            }
            SessionEvent::Message(inbound) => {
                self.received_count += 1;
                tracing::info!("message: {}", inbound.raw);
                self.push_log(LogEntry::Inbound(inbound.summary()));
            }
            SessionEvent::Malformed { raw, error } => {
                self.push_log(LogEntry::Malformed { raw, error });
            }
            SessionEvent::Binary { len } => {
                self.push_log(LogEntry::Binary { len });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::{sleep, timeout};
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn test_app(url: &str, connect_now: bool) -> App {
        App::new(AppConfig::default(), url.to_string(), connect_now)
    }

    async fn wait_for_state(app: &mut App, state: SessionState) {
        timeout(TIMEOUT, async {
            while app.session_state != state {
                app.tick().await.unwrap();
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("never reached {:?}", state));
    }

    #[test]
    fn send_before_connect_is_an_explicit_not_ready() {
        let mut app = test_app("ws://localhost:9", false);
        assert_eq!(app.session_state, SessionState::Idle);
        assert_eq!(app.session_state.label(), "Not connected");

        app.slider_input().unwrap();
        assert_eq!(app.sent_count, 0);
        assert!(app
            .status_message
            .as_deref()
            .unwrap()
            .contains("Not connected"));
    }

    #[tokio::test]
    async fn open_session_sends_exactly_one_frame_per_input() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let mut app = test_app(&url, true);

        let (stream, _) = listener.accept().await.unwrap();
        let mut server = accept_async(stream).await.unwrap();

        wait_for_state(&mut app, SessionState::Open).await;
        assert_eq!(app.session_state.label(), "Open");

        // Default slider sits at 50; one nudge up is one input event
        assert!(app.slider.increase());
        app.slider_input().unwrap();

        let received = timeout(TIMEOUT, server.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(
            received,
            Message::Text(r#"{"type":"sliderMoved","value":"51"}"#.to_string())
        );
        assert_eq!(app.sent_count, 1);
    }

    #[tokio::test]
    async fn closed_session_reports_closed_and_refuses_sends() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let mut app = test_app(&url, true);

        let (stream, _) = listener.accept().await.unwrap();
        let mut server = accept_async(stream).await.unwrap();

        wait_for_state(&mut app, SessionState::Open).await;

        server.close(None).await.unwrap();
        wait_for_state(&mut app, SessionState::Closed).await;
        assert_eq!(app.session_state.label(), "Closed");

        app.slider.increase();
        app.slider_input().unwrap();
        assert_eq!(app.sent_count, 0);
        assert!(app.status_message.is_some());
    }

    #[tokio::test]
    async fn failed_connect_reports_the_fixed_error_label() {
        // Bind then drop so the port refuses connections
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        drop(listener);

        let mut app = test_app(&url, true);
        wait_for_state(&mut app, SessionState::Errored).await;

        assert_eq!(app.session_state.label(), "Error - see console log");
        assert!(app.last_error.is_some());
    }

    #[tokio::test]
    async fn connect_while_open_is_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let mut app = test_app(&url, true);

        let (stream, _) = listener.accept().await.unwrap();
        let _server = accept_async(stream).await.unwrap();

        wait_for_state(&mut app, SessionState::Open).await;

        app.connect_session();
        assert_eq!(app.session_state, SessionState::Open);
        assert_eq!(app.status_message.as_deref(), Some("Already connected"));
    }
}

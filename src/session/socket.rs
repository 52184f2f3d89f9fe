//! The socket task: owns the WebSocket stream for a single connection.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::SessionEvent;
use crate::protocol::Inbound;

/// Connect to `url` and pump frames until the connection ends.
///
/// Lifecycle transitions and inbound frames are forwarded on `events`. The
/// task finishes when the server closes, the socket errors, or the handle's
/// outbound channel is dropped.
pub async fn run(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let (ws_stream, _response) = match connect_async(&url).await {
        Ok(connected) => connected,
        Err(e) => {
            warn!("connect to {} failed: {}", url, e);
            let _ = events.send(SessionEvent::Errored(e.to_string()));
            return;
        }
    };
    info!("connected to {}", url);
    let _ = events.send(SessionEvent::Opened);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                match frame {
                    Some(text) => {
                        if let Err(e) = ws_sender.send(Message::Text(text)).await {
                            warn!("send failed: {}", e);
                            let _ = events.send(SessionEvent::Errored(e.to_string()));
                            break;
                        }
                    }
                    None => {
                        // Handle dropped: close politely and stop
                        let _ = ws_sender.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("received: {}", text);
                        match Inbound::parse(&text) {
                            Ok(inbound) => {
                                let _ = events.send(SessionEvent::Message(inbound));
                            }
                            Err(e) => {
                                warn!("unparseable inbound frame: {}", e);
                                let _ = events.send(SessionEvent::Malformed {
                                    raw: text,
                                    error: e.to_string(),
                                });
                            }
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!("binary frame ({} bytes)", data.len());
                        let _ = events.send(SessionEvent::Binary { len: data.len() });
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if ws_sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!("server closed the connection");
                        let _ = events.send(SessionEvent::Closed);
                        break;
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        warn!("socket error: {}", e);
                        let _ = events.send(SessionEvent::Errored(e.to_string()));
                        break;
                    }
                    None => {
                        info!("connection ended");
                        let _ = events.send(SessionEvent::Closed);
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{self, SendOutcome, SessionEvent};
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::WebSocketStream;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Bind an ephemeral port and return the ws URL plus the listener.
    async fn boot_listener() -> (String, TcpListener) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        (url, listener)
    }

    async fn accept_one(listener: &TcpListener) -> WebSocketStream<TcpStream> {
        let (stream, _) = listener.accept().await.unwrap();
        accept_async(stream).await.unwrap()
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        timeout(TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for session event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn open_then_server_close() {
        let (url, listener) = boot_listener().await;
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let _session = session::connect(url, events_tx);

        let mut server = accept_one(&listener).await;
        assert!(matches!(next_event(&mut events).await, SessionEvent::Opened));

        server.close(None).await.unwrap();
        assert!(matches!(next_event(&mut events).await, SessionEvent::Closed));
    }

    #[tokio::test]
    async fn outbound_frame_reaches_the_server_verbatim() {
        let (url, listener) = boot_listener().await;
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let session = session::connect(url, events_tx);

        let mut server = accept_one(&listener).await;
        assert!(matches!(next_event(&mut events).await, SessionEvent::Opened));

        let frame = r#"{"type":"sliderMoved","value":"42"}"#.to_string();
        assert_eq!(session.send_text(frame.clone()), SendOutcome::Sent);

        let received = timeout(TIMEOUT, server.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(received, Message::Text(frame));
    }

    #[tokio::test]
    async fn inbound_json_is_parsed_and_delivered() {
        let (url, listener) = boot_listener().await;
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let _session = session::connect(url, events_tx);

        let mut server = accept_one(&listener).await;
        assert!(matches!(next_event(&mut events).await, SessionEvent::Opened));

        server
            .send(Message::Text(r#"{"type":"hello","n":1}"#.to_string()))
            .await
            .unwrap();

        match next_event(&mut events).await {
            SessionEvent::Message(inbound) => {
                assert_eq!(inbound.value["type"], "hello");
                assert_eq!(inbound.value["n"], 1);
            }
            other => panic!("expected Message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_inbound_does_not_end_the_session() {
        let (url, listener) = boot_listener().await;
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let _session = session::connect(url, events_tx);

        let mut server = accept_one(&listener).await;
        assert!(matches!(next_event(&mut events).await, SessionEvent::Opened));

        server
            .send(Message::Text("this is not json".to_string()))
            .await
            .unwrap();
        match next_event(&mut events).await {
            SessionEvent::Malformed { raw, .. } => assert_eq!(raw, "this is not json"),
            other => panic!("expected Malformed, got {:?}", other),
        }

        // The connection keeps working afterwards
        server
            .send(Message::Text("{\"ok\":true}".to_string()))
            .await
            .unwrap();
        assert!(matches!(
            next_event(&mut events).await,
            SessionEvent::Message(_)
        ));
    }

    #[tokio::test]
    async fn binary_frames_are_reported_and_ignored() {
        let (url, listener) = boot_listener().await;
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let _session = session::connect(url, events_tx);

        let mut server = accept_one(&listener).await;
        assert!(matches!(next_event(&mut events).await, SessionEvent::Opened));

        server
            .send(Message::Binary(vec![1, 2, 3, 4]))
            .await
            .unwrap();
        match next_event(&mut events).await {
            SessionEvent::Binary { len } => assert_eq!(len, 4),
            other => panic!("expected Binary, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn refused_connection_surfaces_as_errored() {
        // Bind then drop the listener so the port is known-dead
        let (url, listener) = boot_listener().await;
        drop(listener);

        let (events_tx, mut events) = mpsc::unbounded_channel();
        let _session = session::connect(url, events_tx);

        assert!(matches!(
            next_event(&mut events).await,
            SessionEvent::Errored(_)
        ));
    }

    #[tokio::test]
    async fn close_drains_queued_frames() {
        let (url, listener) = boot_listener().await;
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let session = session::connect(url, events_tx);

        let mut server = accept_one(&listener).await;
        assert!(matches!(next_event(&mut events).await, SessionEvent::Opened));

        session.send_text(r#"{"type":"sliderMoved","value":"7"}"#.to_string());
        session.close().await;

        let received = timeout(TIMEOUT, server.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(
            received,
            Message::Text(r#"{"type":"sliderMoved","value":"7"}"#.to_string())
        );
    }
}

//! Websocket session with the backend.
//!
//! Connects to the Socket.IO endpoint, joins the default namespace, feeds
//! every backend event into the [`Panel`] and forwards queued
//! [`ClientEvent`]s. Reconnects with a fixed delay when the session drops.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::config::BackendConfig;
use crate::panel::Panel;
use crate::protocol::wire::{self, Packet};
use crate::protocol::{ClientEvent, ServerEvent};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Run the backend session loop indefinitely.
pub async fn run(
    backend: BackendConfig,
    panel: Arc<Mutex<Panel>>,
    mut outbound: mpsc::UnboundedReceiver<ClientEvent>,
) {
    let delay = Duration::from_millis(backend.reconnect_delay_ms);

    loop {
        tracing::info!("Connecting to backend at {}", backend.url);

        match connect_async(backend.url.as_str()).await {
            Ok((ws_stream, _response)) => {
                let joined = run_session(ws_stream, &panel, &mut outbound).await;
                if joined {
                    panel
                        .lock()
                        .await
                        .apply_server_event(Instant::now(), ServerEvent::Disconnect);
                    drop_stale(&mut outbound);
                }
                tracing::warn!("Backend session ended, reconnecting");
            }
            Err(e) => {
                tracing::error!("Backend connection failed: {}", e);
            }
        }

        tokio::time::sleep(delay).await;
    }
}

/// Events still queued when a joined session drops are not replayed on
/// reconnect. Anything queued before the first join stays buffered.
fn drop_stale(outbound: &mut mpsc::UnboundedReceiver<ClientEvent>) {
    while let Ok(event) = outbound.try_recv() {
        tracing::warn!("Dropping {} queued while offline", event.name());
    }
}

/// Drive one websocket session. Returns whether the namespace was joined,
/// i.e. whether the panel saw a `connect` that now needs a `disconnect`.
async fn run_session(
    ws_stream: WsStream,
    panel: &Arc<Mutex<Panel>>,
    outbound: &mut mpsc::UnboundedReceiver<ClientEvent>,
) -> bool {
    let (mut sink, mut stream) = ws_stream.split();
    let mut joined = false;

    loop {
        tokio::select! {
            msg = stream.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!("Backend closed websocket: {:?}", frame);
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::error!("Websocket receive error: {}", e);
                        break;
                    }
                    None => break,
                };

                let reply = match wire::decode(&text) {
                    Ok(packet) => handle_packet(packet, panel, &mut joined).await,
                    Err(e) => {
                        tracing::warn!("Dropping frame {:?}: {}", text, e);
                        Step::Continue
                    }
                };

                match reply {
                    Step::Continue => {}
                    Step::Reply(frame) => {
                        if let Err(e) = sink.send(Message::Text(frame.into())).await {
                            tracing::error!("Websocket send error: {}", e);
                            break;
                        }
                    }
                    Step::Stop => break,
                }
            }
            event = outbound.recv(), if joined => {
                let Some(event) = event else {
                    tracing::info!("Outbound channel closed");
                    break;
                };
                let frame = wire::encode_event(event.name(), &event.payload());
                tracing::debug!("Sending {}", frame);
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    tracing::error!("Websocket send error: {}", e);
                    break;
                }
            }
        }
    }

    joined
}

enum Step {
    Continue,
    Reply(String),
    Stop,
}

async fn handle_packet(packet: Packet, panel: &Arc<Mutex<Panel>>, joined: &mut bool) -> Step {
    match packet {
        Packet::Open(handshake) => {
            tracing::debug!(
                "Engine.IO session {} (ping every {}ms)",
                handshake.sid,
                handshake.ping_interval
            );
            Step::Reply(wire::CONNECT.to_string())
        }
        Packet::Ping => Step::Reply(wire::PONG.to_string()),
        Packet::Connect => {
            *joined = true;
            panel
                .lock()
                .await
                .apply_server_event(Instant::now(), ServerEvent::Connect);
            Step::Continue
        }
        Packet::Event { name, payload } => {
            match ServerEvent::decode(&name, payload) {
                Ok(Some(event)) => panel.lock().await.apply_server_event(Instant::now(), event),
                Ok(None) => tracing::debug!("Ignoring unknown event {}", name),
                Err(e) => tracing::warn!("{}", e),
            }
            Step::Continue
        }
        Packet::ConnectError(reason) => {
            tracing::error!("Backend refused namespace: {}", reason);
            Step::Stop
        }
        Packet::Close | Packet::Disconnect => Step::Stop,
        Packet::Pong | Packet::Noop | Packet::Ack => Step::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::{accept_async, WebSocketStream};

    const OPEN: &str = r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

    type Backend = WebSocketStream<TcpStream>;

    fn panel() -> Arc<Mutex<Panel>> {
        Arc::new(Mutex::new(Panel::new(&Config::default())))
    }

    async fn within<F: std::future::Future>(future: F) -> F::Output {
        tokio::time::timeout(Duration::from_secs(2), future)
            .await
            .expect("timed out")
    }

    /// Bind a local backend and start the session loop against it.
    async fn start(
        panel: &Arc<Mutex<Panel>>,
        outbound: mpsc::UnboundedReceiver<ClientEvent>,
    ) -> TcpListener {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let backend = BackendConfig {
            url: format!(
                "ws://{}/socket.io/?EIO=4&transport=websocket",
                listener.local_addr().unwrap()
            ),
            reconnect_delay_ms: 20,
        };
        tokio::spawn(run(backend, Arc::clone(panel), outbound));
        listener
    }

    async fn accept(listener: &TcpListener) -> Backend {
        let (stream, _) = within(listener.accept()).await.unwrap();
        accept_async(stream).await.unwrap()
    }

    async fn send(ws: &mut Backend, frame: &str) {
        ws.send(Message::Text(frame.to_string())).await.unwrap();
    }

    async fn recv(ws: &mut Backend) -> String {
        loop {
            match within(ws.next()).await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("client went away: {:?}", other),
            }
        }
    }

    async fn join(ws: &mut Backend) {
        send(ws, OPEN).await;
        assert_eq!(recv(ws).await, "40");
        send(ws, r#"40{"sid":"n1"}"#).await;
    }

    async fn wait_until(panel: &Arc<Mutex<Panel>>, check: impl Fn(&Panel) -> bool) {
        within(async {
            while !check(&*panel.lock().await) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
    }

    #[tokio::test]
    async fn open_ping_and_connect_packets() {
        let panel = panel();
        let mut joined = false;

        let open = wire::decode(OPEN).unwrap();
        let step = handle_packet(open, &panel, &mut joined).await;
        assert!(matches!(step, Step::Reply(frame) if frame == "40"));

        let step = handle_packet(Packet::Ping, &panel, &mut joined).await;
        assert!(matches!(step, Step::Reply(frame) if frame == "3"));
        assert!(!joined);

        let step = handle_packet(Packet::Connect, &panel, &mut joined).await;
        assert!(matches!(step, Step::Continue));
        assert!(joined);
        assert!(panel.lock().await.is_connected());
    }

    #[tokio::test]
    async fn events_reach_the_panel() {
        let panel = panel();
        let mut joined = true;

        let packet = wire::decode(r#"42["update_relays",{"water":true}]"#).unwrap();
        handle_packet(packet, &panel, &mut joined).await;
        assert!(panel.lock().await.relay("water").unwrap().on);

        let packet = wire::decode(r#"42["update_weather_radar",{}]"#).unwrap();
        let step = handle_packet(packet, &panel, &mut joined).await;
        assert!(matches!(step, Step::Continue));
    }

    #[tokio::test]
    async fn close_disconnect_and_refusal_end_the_session() {
        let panel = panel();
        let mut joined = false;

        for frame in ["1", "41", r#"44{"message":"not authorized"}"#] {
            let packet = wire::decode(frame).unwrap();
            let step = handle_packet(packet, &panel, &mut joined).await;
            assert!(matches!(step, Step::Stop), "{} should end the session", frame);
        }
    }

    #[tokio::test]
    async fn outbound_events_wait_for_the_namespace_join() {
        let panel = panel();
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = start(&panel, rx).await;
        let mut ws = accept(&listener).await;

        tx.send(ClientEvent::SetRelay {
            name: "water".to_string(),
            state: true,
        })
        .unwrap();
        send(&mut ws, OPEN).await;
        assert_eq!(recv(&mut ws).await, "40");

        let early = tokio::time::timeout(Duration::from_millis(100), ws.next()).await;
        assert!(early.is_err());

        send(&mut ws, r#"40{"sid":"n1"}"#).await;
        assert_eq!(
            recv(&mut ws).await,
            r#"42["set_relay",{"name":"water","state":true}]"#
        );

        send(&mut ws, "2").await;
        assert_eq!(recv(&mut ws).await, "3");
        wait_until(&panel, |panel| panel.is_connected()).await;
    }

    #[tokio::test]
    async fn events_queued_before_first_join_survive_a_failed_session() {
        let panel = panel();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ClientEvent::SetBrightness {
            light_id: 1,
            value: 40,
        })
        .unwrap();
        let listener = start(&panel, rx).await;

        // Engine.IO close before the namespace was joined.
        let mut first = accept(&listener).await;
        send(&mut first, OPEN).await;
        assert_eq!(recv(&mut first).await, "40");
        send(&mut first, "1").await;

        let mut second = accept(&listener).await;
        join(&mut second).await;
        assert_eq!(
            recv(&mut second).await,
            r#"42["set_brightness",{"light_id":1,"value":40}]"#
        );
        assert!(panel.lock().await.toasts().visible().is_empty());
    }

    #[tokio::test]
    async fn refused_namespace_never_reaches_the_panel() {
        let panel = panel();
        let (_tx, rx) = mpsc::unbounded_channel();
        let listener = start(&panel, rx).await;

        let mut ws = accept(&listener).await;
        send(&mut ws, OPEN).await;
        assert_eq!(recv(&mut ws).await, "40");
        send(&mut ws, r#"44{"message":"not authorized"}"#).await;

        // The client retries; nothing was applied in between.
        let _retry = accept(&listener).await;
        let panel = panel.lock().await;
        assert!(!panel.is_connected());
        assert!(panel.is_interface_enabled());
        assert!(panel.toasts().visible().is_empty());
    }

    #[tokio::test]
    async fn namespace_disconnect_takes_the_panel_offline_until_rejoin() {
        let panel = panel();
        let (_tx, rx) = mpsc::unbounded_channel();
        let listener = start(&panel, rx).await;

        let mut ws = accept(&listener).await;
        join(&mut ws).await;
        wait_until(&panel, |panel| panel.is_connected()).await;

        send(&mut ws, "41").await;
        wait_until(&panel, |panel| !panel.is_interface_enabled()).await;
        let views = panel.lock().await.toasts().views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].message, "System Offline");

        let mut ws = accept(&listener).await;
        join(&mut ws).await;
        wait_until(&panel, |panel| panel.is_interface_enabled()).await;
        let messages: Vec<String> = panel
            .lock()
            .await
            .toasts()
            .views()
            .into_iter()
            .map(|toast| toast.message)
            .collect();
        assert!(messages.iter().any(|message| message == "System Online"));
    }
}

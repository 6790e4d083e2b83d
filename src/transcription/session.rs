//! # Session Transport
//!
//! Owns the WebSocket for one transcription session and runs the two halves of
//! the duplex protocol against it.
//!
//! ## Session Lifecycle:
//! 1. **Connecting**: TCP (and TLS, if enabled) handshake, WebSocket upgrade
//! 2. **Initializing**: sending the initialization control message
//! 3. **Streaming**: sending audio frames in byte-offset order
//! 4. **AwaitingFinal**: end-of-speech sent, waiting for the final result
//! 5. **Closed**: final result recorded (or server closed), socket closed by us
//! 6. **Errored**: absorbing failure state, reachable from 1-4
//!
//! ## Concurrency:
//! The send duty and the receive duty are two futures polled side by side on the
//! same task over the split halves of the socket. Neither waits for the other.
//! The first error from either one ends the session and drops the other future,
//! which cancels it at its current suspension point (frame sleep or inbound read).

use crate::audio::AudioBuffer;
use crate::config::SessionConfig;
use crate::error::{ClientError, ClientResult};
use crate::transcription::collector::{TranscriptCollector, TranscriptionResult};
use crate::transcription::planner::{ChunkPlanner, FramePlan};
use crate::transcription::protocol::{decode_result, EndOfSpeech, InitMessage};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::SEC_WEBSOCKET_PROTOCOL, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

/// WebSocket subprotocol requested during the handshake.
const SUBPROTOCOL: &str = "binary";

/// Upper bound on the closing handshake write; a server that stopped reading
/// must not keep a finished session open.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Where a session is in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Initializing,
    Streaming,
    AwaitingFinal,
    Closed,
    Errored,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Initializing => "initializing",
            SessionState::Streaming => "streaming",
            SessionState::AwaitingFinal => "awaiting_final",
            SessionState::Closed => "closed",
            SessionState::Errored => "errored",
        }
    }

    /// `Closed` and `Errored` are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Errored)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transcription session over one connection.
///
/// Construction plans the frames, so an invalid chunk configuration fails here,
/// before any socket is opened.
pub struct SessionTransport {
    id: Uuid,
    config: SessionConfig,
    audio: AudioBuffer,
    wav_name: String,
    plan: FramePlan,
    state: watch::Sender<SessionState>,
}

impl SessionTransport {
    pub fn new(config: SessionConfig, audio: AudioBuffer, wav_name: impl Into<String>) -> ClientResult<Self> {
        let plan = ChunkPlanner::plan(&config.chunk, audio.sample_rate(), audio.len())?;
        let (state, _) = watch::channel(SessionState::Connecting);

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            audio,
            wav_name: wav_name.into(),
            plan,
            state,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state transitions (e.g. to drive a progress display).
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Connect and run the session to completion.
    pub async fn run(&self) -> ClientResult<Vec<TranscriptionResult>> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Connect and run the session, stopping early with `Cancelled` if `shutdown`
    /// completes first. On cancellation a normal-closure frame is sent if the
    /// socket is open, and the socket is dropped.
    pub async fn run_until<F>(&self, shutdown: F) -> ClientResult<Vec<TranscriptionResult>>
    where
        F: Future<Output = ()>,
    {
        let span = info_span!("asr_session", session_id = %self.id, mode = %self.config.mode);
        async move {
            tokio::pin!(shutdown);

            let connected = tokio::select! {
                ws = self.connect() => ws,
                _ = &mut shutdown => Err(ClientError::Cancelled),
            };
            let ws = match connected {
                Ok(ws) => ws,
                Err(err) => return Err(self.fail(err)),
            };

            self.run_on(ws, &mut shutdown).await
        }
        .instrument(span)
        .await
    }

    /// Run the protocol over an already-upgraded WebSocket.
    pub async fn run_on<S, F>(&self, ws: WebSocketStream<S>, shutdown: F) -> ClientResult<Vec<TranscriptionResult>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        F: Future<Output = ()> + Unpin,
    {
        self.transition(SessionState::Initializing);
        let (mut sink, mut stream) = ws.split();
        let mut state_rx = self.subscribe();

        let outcome = {
            let send = self.send_duty(&mut sink);
            let receive = self.receive_duty(&mut stream, &mut state_rx);
            tokio::pin!(send, receive, shutdown);

            let mut send_done = false;
            loop {
                tokio::select! {
                    sent = &mut send, if !send_done => match sent {
                        Ok(()) => send_done = true,
                        Err(err) => break Err(err),
                    },
                    received = &mut receive => {
                        if received.is_ok() && !send_done {
                            warn!("Session ended before all audio was sent");
                        }
                        break received;
                    }
                    _ = &mut shutdown => break Err(ClientError::Cancelled),
                }
            }
        };

        // Both duties are dropped at this point; the sink is ours again.
        let close = Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }));
        match tokio::time::timeout(CLOSE_GRACE, sink.send(close)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Close frame not sent: {}", e),
            Err(_) => debug!("Close frame not sent within {}ms", CLOSE_GRACE.as_millis()),
        }

        match outcome {
            Ok(collector) => {
                self.transition(SessionState::Closed);
                info!(results = collector.len(), final_seen = collector.has_final(), "Session closed");
                Ok(collector.into_results())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn connect(&self) -> ClientResult<WebSocketStream<MaybeTlsStream<TcpStream>>> {
        let url = self.config.endpoint.url();
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ClientError::ConnectionFailure(format!("Invalid server URL {}: {}", url, e)))?;
        request
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));

        let connector = if self.config.endpoint.tls.enabled {
            Some(build_tls_connector(self.config.endpoint.tls.verify)?)
        } else {
            None
        };

        info!("Connecting to {}", url);
        let handshake = connect_async_tls_with_config(request, None, false, connector);
        let connected = match self.config.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, handshake)
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => handshake.await,
        };

        let (ws, response) = connected
            .map_err(|e| ClientError::ConnectionFailure(format!("Failed to connect to {}: {}", url, e)))?;
        debug!(status = %response.status(), "WebSocket handshake complete");
        Ok(ws)
    }

    /// Init message, every planned frame in order, then end-of-speech.
    async fn send_duty<K>(&self, sink: &mut K) -> ClientResult<()>
    where
        K: Sink<Message, Error = WsError> + Unpin,
    {
        let init = InitMessage::new(&self.config, self.audio.sample_rate(), self.wav_name.clone());
        self.send_bounded(sink, Message::Text(init.to_json()?), "init message")
            .await?;
        self.transition(SessionState::Streaming);

        info!(
            frames = self.plan.frame_count,
            stride_bytes = self.plan.stride_bytes,
            pacing = self.config.pacing,
            "Streaming audio"
        );

        let pause = self.plan.frame_duration();
        for (index, frame) in self.plan.frames(self.audio.as_bytes()).enumerate() {
            self.send_bounded(sink, Message::Binary(frame.to_vec()), &format!("frame {}", index))
                .await?;
            trace!(frame = index, bytes = frame.len(), "Sent audio frame");

            if self.config.pacing {
                tokio::time::sleep(pause).await;
            }
        }

        self.send_bounded(sink, Message::Text(EndOfSpeech::new().to_json()?), "end-of-speech")
            .await?;
        self.transition(SessionState::AwaitingFinal);

        Ok(())
    }

    /// Send one message. With an idle timeout set, a write the server never
    /// drains (it stopped reading) fails with `Timeout`.
    async fn send_bounded<K>(&self, sink: &mut K, message: Message, what: &str) -> ClientResult<()>
    where
        K: Sink<Message, Error = WsError> + Unpin,
    {
        let sent = match self.config.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, sink.send(message))
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => sink.send(message).await,
        };
        sent.map_err(|e| ClientError::SendFailure(format!("Failed to send {}: {}", what, e)))
    }

    /// Decode inbound frames until a final result or the server closes.
    async fn receive_duty<R>(
        &self,
        stream: &mut R,
        state_rx: &mut watch::Receiver<SessionState>,
    ) -> ClientResult<TranscriptCollector>
    where
        R: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        let mut collector = TranscriptCollector::new();

        loop {
            let message = match self.next_inbound(stream, state_rx).await? {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(ClientError::ReceiveFailure(e.to_string())),
                None => {
                    info!("Server ended the stream");
                    break;
                }
            };

            match message {
                Message::Text(text) => {
                    let result = decode_result(&text)?;
                    debug!(
                        mode = %result.mode,
                        is_final = result.is_final,
                        text = %result.text,
                        "Result received"
                    );

                    let is_final = result.is_final;
                    collector.push(result);
                    if is_final {
                        break;
                    }
                }
                Message::Close(frame) => {
                    match frame {
                        Some(frame) => info!(code = %frame.code, reason = %frame.reason, "Server closed the connection"),
                        None => info!("Server closed the connection"),
                    }
                    break;
                }
                // Binary results are not part of the protocol; pings are answered by tungstenite.
                _ => {}
            }
        }

        Ok(collector)
    }

    /// Wait for the next inbound frame.
    ///
    /// With an idle timeout configured, the timer only runs once end-of-speech
    /// has been sent: while audio is still streaming, a silent server is normal
    /// (offline mode answers only at the end).
    async fn next_inbound<R>(
        &self,
        stream: &mut R,
        state_rx: &mut watch::Receiver<SessionState>,
    ) -> ClientResult<Option<Result<Message, WsError>>>
    where
        R: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        let Some(limit) = self.config.idle_timeout else {
            return Ok(stream.next().await);
        };

        loop {
            let armed = *state_rx.borrow_and_update() == SessionState::AwaitingFinal;
            tokio::select! {
                next = stream.next() => return Ok(next),
                _ = state_rx.changed(), if !armed => {}
                _ = tokio::time::sleep(limit), if armed => return Err(ClientError::Timeout(limit)),
            }
        }
    }

    /// Move to `next`. Terminal states are absorbing.
    fn transition(&self, next: SessionState) {
        let previous = self.state();
        if previous == next || previous.is_terminal() {
            return;
        }
        self.state.send_replace(next);
        debug!(from = %previous, to = %next, "Session state changed");
    }

    fn fail(&self, err: ClientError) -> ClientError {
        if err.is_cancelled() {
            info!("Session cancelled in state {}", self.state());
        } else {
            error!(state = %self.state(), "Session failed: {}", err);
        }
        self.transition(SessionState::Errored);
        err
    }
}

/// TLS connector for `wss://`; with `verify` off, self-signed certificates and
/// mismatched host names are accepted.
fn build_tls_connector(verify: bool) -> ClientResult<Connector> {
    let mut builder = native_tls::TlsConnector::builder();
    if !verify {
        builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }
    let connector = builder
        .build()
        .map_err(|e| ClientError::ConnectionFailure(format!("Failed to set up TLS: {}", e)))?;
    Ok(Connector::NativeTls(connector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkConfig, RecognitionMode, ServerEndpoint, TlsOptions};
    use crate::hotwords::HotwordTable;
    use std::net::SocketAddr;
    use std::time::Instant;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::tungstenite::protocol::Role;

    type ServerSocket = WebSocketStream<TcpStream>;

    /// Accept one connection, echo the subprotocol, and hand the socket to `handler`.
    async fn serve_once<F, Fut>(handler: F) -> SocketAddr
    where
        F: FnOnce(ServerSocket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let callback = |_req: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
                response
                    .headers_mut()
                    .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));
                Ok(response)
            };
            let ws = accept_hdr_async(tcp, callback).await.unwrap();
            handler(ws).await;
        });

        addr
    }

    /// Read client messages up to and including `{"is_speaking":false}`.
    async fn read_until_end_of_speech(ws: &mut ServerSocket) -> Vec<Message> {
        let mut received = Vec::new();
        while let Some(Ok(message)) = ws.next().await {
            let done = matches!(&message, Message::Text(t) if t.contains(r#""is_speaking":false"#));
            received.push(message);
            if done {
                break;
            }
        }
        received
    }

    fn result_json(text: &str, is_final: bool) -> Message {
        Message::Text(serde_json::json!({"text": text, "mode": "2pass-online", "is_final": is_final}).to_string())
    }

    fn session_config(addr: SocketAddr, pacing: bool, idle_timeout: Option<Duration>) -> SessionConfig {
        SessionConfig {
            endpoint: ServerEndpoint {
                host: addr.ip().to_string(),
                port: addr.port(),
                tls: TlsOptions::default(),
            },
            mode: RecognitionMode::TwoPass,
            chunk: ChunkConfig::new([2, 8, 3], 8),
            hotwords: HotwordTable::default(),
            use_itn: true,
            pacing,
            idle_timeout,
        }
    }

    fn audio(len: usize) -> AudioBuffer {
        AudioBuffer::from_canonical_bytes((0..len).map(|i| (i % 256) as u8).collect())
    }

    #[tokio::test]
    async fn test_results_kept_in_arrival_order_and_session_closed() {
        let (tx, rx) = oneshot::channel();
        let addr = serve_once(|mut ws| async move {
            let received = read_until_end_of_speech(&mut ws).await;
            ws.send(result_json("hel", false)).await.unwrap();
            ws.send(result_json("hello", false)).await.unwrap();
            ws.send(result_json("hello.", true)).await.unwrap();
            let close = ws.next().await;
            let _ = tx.send((received, close));
        })
        .await;

        let session = SessionTransport::new(session_config(addr, false, None), audio(4000), "sample.wav").unwrap();
        let results = session.run().await.unwrap();

        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["hel", "hello", "hello."]);
        let finals: Vec<bool> = results.iter().map(|r| r.is_final).collect();
        assert_eq!(finals, vec![false, false, true]);
        assert_eq!(session.state(), SessionState::Closed);

        let (received, close) = rx.await.unwrap();

        // init + 3 frames (1920, 1920, 160) + end-of-speech
        assert_eq!(received.len(), 5);
        let init: serde_json::Value = match &received[0] {
            Message::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("expected init text frame, got {:?}", other),
        };
        assert_eq!(init["wav_name"], "sample.wav");
        assert_eq!(init["hotwords"], "{}");
        assert_eq!(init["audio_fs"], 16000);
        let sizes: Vec<usize> = received[1..4]
            .iter()
            .map(|m| match m {
                Message::Binary(data) => data.len(),
                other => panic!("expected binary frame, got {:?}", other),
            })
            .collect();
        assert_eq!(sizes, vec![1920, 1920, 160]);

        match close {
            Some(Ok(Message::Close(Some(frame)))) => assert_eq!(frame.code, CloseCode::Normal),
            other => panic!("expected a normal close frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_message_discards_results() {
        let addr = serve_once(|mut ws| async move {
            read_until_end_of_speech(&mut ws).await;
            ws.send(result_json("partial", false)).await.unwrap();
            ws.send(Message::Text("not json".to_string())).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        let session = SessionTransport::new(session_config(addr, false, None), audio(2000), "a.pcm").unwrap();
        let err = session.run().await.unwrap_err();

        assert!(matches!(err, ClientError::MalformedMessage(_)), "got {:?}", err);
        assert_eq!(session.state(), SessionState::Errored);
    }

    #[tokio::test]
    async fn test_partial_results_arrive_while_streaming() {
        let (tx, rx) = oneshot::channel();
        let addr = serve_once(|mut ws| async move {
            // Answer right after the init message, before any audio is read.
            let init = ws.next().await;
            ws.send(result_json("early", false)).await.unwrap();
            let rest = read_until_end_of_speech(&mut ws).await;
            ws.send(result_json("early done", true)).await.unwrap();
            let _ = tx.send((init.is_some(), rest.len()));
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        // Paced: 5 frames of 60ms each
        let session = SessionTransport::new(session_config(addr, true, None), audio(1920 * 5), "a.pcm").unwrap();
        let started = Instant::now();
        let results = session.run().await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "early");
        assert!(results[1].is_final);

        let (saw_init, rest) = rx.await.unwrap();
        assert!(saw_init);
        assert_eq!(rest, 6); // 5 frames + end-of-speech
    }

    #[tokio::test]
    async fn test_server_close_without_final_returns_collected() {
        let addr = serve_once(|mut ws| async move {
            read_until_end_of_speech(&mut ws).await;
            ws.send(result_json("only partial", false)).await.unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let session = SessionTransport::new(session_config(addr, false, None), audio(100), "a.pcm").unwrap();
        let results = session.run().await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(!results[0].is_final);
    }

    #[tokio::test]
    async fn test_empty_audio_sends_init_and_end_only() {
        let (tx, rx) = oneshot::channel();
        let addr = serve_once(|mut ws| async move {
            let received = read_until_end_of_speech(&mut ws).await;
            ws.send(result_json("", true)).await.unwrap();
            let _ = tx.send(received.len());
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        let session = SessionTransport::new(session_config(addr, true, None), audio(0), "a.pcm").unwrap();
        assert_eq!(session.plan().frame_count, 0);

        let results = session.run().await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(rx.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_idle_timeout_after_end_of_speech() {
        let addr = serve_once(|mut ws| async move {
            read_until_end_of_speech(&mut ws).await;
            // Never answer.
            tokio::time::sleep(Duration::from_secs(5)).await;
        })
        .await;

        let limit = Duration::from_millis(200);
        let session = SessionTransport::new(session_config(addr, false, Some(limit)), audio(4000), "a.pcm").unwrap();
        let err = session.run().await.unwrap_err();

        assert!(matches!(err, ClientError::Timeout(d) if d == limit), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_stalled_write_times_out() {
        // The peer end is kept alive but never read, so the pipe fills up.
        let (client_io, _server_io) = tokio::io::duplex(512);
        let ws = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;

        let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let limit = Duration::from_millis(200);
        let session = SessionTransport::new(session_config(addr, false, Some(limit)), audio(1920 * 10), "a.pcm").unwrap();

        let started = Instant::now();
        let err = session.run_on(ws, std::future::pending::<()>()).await.unwrap_err();

        assert!(matches!(err, ClientError::Timeout(d) if d == limit), "got {:?}", err);
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(session.state(), SessionState::Errored);
    }

    #[tokio::test]
    async fn test_send_fails_when_peer_is_gone() {
        let (client_io, server_io) = tokio::io::duplex(4096);
        drop(server_io);
        let ws = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
        let (mut sink, _stream) = ws.split();

        let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let session = SessionTransport::new(session_config(addr, false, None), audio(4000), "a.pcm").unwrap();
        let err = session.send_duty(&mut sink).await.unwrap_err();

        assert!(matches!(err, ClientError::SendFailure(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_connection_dropped_mid_stream() {
        let addr = serve_once(|mut ws| async move {
            // Take the init message and two frames, then vanish without a close frame.
            for _ in 0..3 {
                ws.next().await;
            }
            drop(ws);
        })
        .await;

        // Paced: 20 frames would take 1.2s.
        let session = SessionTransport::new(session_config(addr, true, None), audio(1920 * 20), "a.pcm").unwrap();
        let err = session.run().await.unwrap_err();

        assert!(
            matches!(err, ClientError::ReceiveFailure(_) | ClientError::SendFailure(_)),
            "got {:?}",
            err
        );
        assert_eq!(session.state(), SessionState::Errored);
    }

    #[tokio::test]
    async fn test_cancellation_stops_session() {
        let addr = serve_once(|mut ws| async move {
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;

        // Paced streaming of 50 frames would take 3s.
        let session = SessionTransport::new(session_config(addr, true, None), audio(1920 * 50), "a.pcm").unwrap();
        let started = Instant::now();
        let err = session
            .run_until(tokio::time::sleep(Duration::from_millis(150)))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(session.state(), SessionState::Errored);
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let session = SessionTransport::new(session_config(addr, false, None), audio(100), "a.pcm").unwrap();
        let err = session.run().await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionFailure(_)), "got {:?}", err);
    }

    #[test]
    fn test_invalid_chunk_config_fails_before_connecting() {
        let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let mut config = session_config(addr, false, None);
        config.chunk = ChunkConfig::new([5, 0, 5], 10);

        let err = SessionTransport::new(config, audio(4000), "a.pcm").err().unwrap();
        assert!(matches!(err, ClientError::InvalidChunkConfig(_)));
    }

    #[test]
    fn test_terminal_state_is_absorbing() {
        let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let session = SessionTransport::new(session_config(addr, false, None), audio(100), "a.pcm").unwrap();
        let watcher = session.subscribe();

        session.transition(SessionState::Streaming);
        session.transition(SessionState::Errored);
        session.transition(SessionState::AwaitingFinal);

        assert_eq!(*watcher.borrow(), SessionState::Errored);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SessionState::AwaitingFinal.to_string(), "awaiting_final");
        assert!(SessionState::Closed.is_terminal());
        assert!(!SessionState::Streaming.is_terminal());
    }
}

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use gitbattle_protocol::{RelayFrame, RoomEvent, parse_relay_frame};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use super::{ROOM_BUFFER, RoomChannel, Subscription};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type RoomSenders = Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>;

/// How hard to try getting a dropped relay link back
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// `None` retries forever
    pub max_attempts: Option<usize>,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(5),
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the attempt following one that waited `delay`
    pub fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_secs_f64(delay.as_secs_f64() * self.backoff_multiplier).min(self.max_delay)
    }

    /// The wait before each reconnect attempt, one item per attempt
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay), |delay| Some(self.next_delay(*delay)))
            .take(self.max_attempts.unwrap_or(usize::MAX))
    }
}

/// Room channel backed by a WebSocket pub/sub relay
///
/// The relay speaks [`RelayFrame`] JSON and echoes every published message
/// to all subscribers of its channel. Clones share one connection.
#[derive(Debug, Clone)]
pub struct RelayChannel {
    outgoing: mpsc::UnboundedSender<RelayFrame>,
    rooms: RoomSenders,
}

impl RelayChannel {
    /// Connect and hand the socket to a background supervisor
    pub async fn connect(url: impl Into<String>, policy: ReconnectPolicy) -> Result<Self> {
        let url = url.into();
        let socket = dial(&url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        let (outgoing, rx) = mpsc::unbounded_channel();
        let rooms = RoomSenders::default();

        tokio::spawn(supervise(url, policy, socket, rx, rooms.clone()));

        Ok(Self { outgoing, rooms })
    }

    fn send(&self, frame: RelayFrame) -> Result<()> {
        self.outgoing
            .send(frame)
            .map_err(|_| anyhow!("Relay connection closed"))
    }
}

impl RoomChannel for RelayChannel {
    async fn subscribe(&self, room: &str) -> Result<Subscription> {
        let (rx, first) = {
            let mut rooms = self
                .rooms
                .lock()
                .map_err(|_| anyhow!("Relay room table lock poisoned"))?;
            match rooms.get(room) {
                Some(sender) => (sender.subscribe(), false),
                None => {
                    let (sender, rx) = broadcast::channel(ROOM_BUFFER);
                    rooms.insert(room.to_string(), sender);
                    (rx, true)
                }
            }
        };

        if first {
            self.send(RelayFrame::Subscribe {
                channel: room.to_string(),
            })?;
        }

        let outgoing = self.outgoing.clone();
        let rooms = self.rooms.clone();
        let channel = room.to_string();

        Ok(Subscription::new(room, rx).on_release(move || {
            let Ok(mut rooms) = rooms.lock() else {
                return;
            };
            // the releasing receiver is still alive here
            let last = rooms
                .get(&channel)
                .is_some_and(|sender| sender.receiver_count() <= 1);
            if last {
                rooms.remove(&channel);
                let _ = outgoing.send(RelayFrame::Unsubscribe { channel });
            }
        }))
    }

    async fn publish(&self, room: &str, event: &RoomEvent) -> Result<()> {
        self.send(RelayFrame::Message {
            channel: room.to_string(),
            payload: event.clone(),
        })
    }
}

/// Frames waiting for a live socket, plus the rooms to restore on a new one
#[derive(Debug, Default)]
struct Outbox {
    channels: BTreeSet<String>,
    pending: VecDeque<RelayFrame>,
}

impl Outbox {
    fn push(&mut self, frame: RelayFrame) {
        match &frame {
            RelayFrame::Subscribe { channel } => {
                self.channels.insert(channel.clone());
            }
            RelayFrame::Unsubscribe { channel } => {
                self.channels.remove(channel);
            }
            RelayFrame::Message { .. } => {}
        }
        self.pending.push_back(frame);
    }

    /// Reorder for a fresh socket: current subscriptions, then unsent messages
    fn restart(&mut self) {
        let messages: Vec<RelayFrame> = self
            .pending
            .drain(..)
            .filter(|frame| matches!(frame, RelayFrame::Message { .. }))
            .collect();

        self.pending = self
            .channels
            .iter()
            .map(|channel| RelayFrame::Subscribe {
                channel: channel.clone(),
            })
            .chain(messages)
            .collect();
    }
}

/// How a live link ended
enum Link {
    Lost,
    /// Every `RelayChannel` clone is gone
    Dropped,
}

/// Own the relay link for as long as any `RelayChannel` clone exists
///
/// Frames published while the link is down are queued and go out, after
/// the room subscriptions, once a new socket is up. When the policy gives
/// up, every subscription ends and further publishes fail.
async fn supervise(
    url: String,
    policy: ReconnectPolicy,
    mut socket: WsStream,
    mut outgoing: mpsc::UnboundedReceiver<RelayFrame>,
    rooms: RoomSenders,
) {
    let mut outbox = Outbox::default();

    loop {
        if let Link::Dropped = serve(socket, &mut outgoing, &rooms, &mut outbox).await {
            tracing::debug!(url = %url, "Relay channel dropped, closing");
            break;
        }

        tracing::warn!(url = %url, queued = outbox.pending.len(), "Relay link lost");
        match redial(&url, &policy, &mut outgoing, &mut outbox).await {
            Some(next) => socket = next,
            None => break,
        }
    }

    drop(outgoing);
    // closing every room ends the subscriptions' recv loops
    if let Ok(mut rooms) = rooms.lock() {
        rooms.clear();
    }
}

/// Drive one socket until it fails or the channel is dropped
async fn serve(
    socket: WsStream,
    outgoing: &mut mpsc::UnboundedReceiver<RelayFrame>,
    rooms: &RoomSenders,
    outbox: &mut Outbox,
) -> Link {
    let (mut sink, stream) = socket.split();
    let (pong_tx, mut pings) = mpsc::unbounded_channel();
    let mut reader = tokio::spawn(read_frames(stream, rooms.clone(), pong_tx));

    outbox.restart();
    let link = match flush(&mut sink, outbox).await {
        Err(e) => {
            tracing::warn!(error = %e, "Relay replay failed");
            Link::Lost
        }
        Ok(()) => loop {
            tokio::select! {
                frame = outgoing.recv() => {
                    let Some(frame) = frame else {
                        break Link::Dropped;
                    };
                    outbox.push(frame);
                    if let Err(e) = flush(&mut sink, outbox).await {
                        tracing::warn!(error = %e, "Relay send failed");
                        break Link::Lost;
                    }
                }
                Some(data) = pings.recv() => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break Link::Lost;
                    }
                }
                _ = &mut reader => break Link::Lost,
            }
        },
    };

    reader.abort();
    link
}

/// Write queued frames in order; a frame leaves the queue only once written
async fn flush(sink: &mut SplitSink<WsStream, Message>, outbox: &mut Outbox) -> Result<()> {
    loop {
        let text = match outbox.pending.front().map(RelayFrame::to_wire) {
            None => return Ok(()),
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Dropping unencodable relay frame");
                outbox.pending.pop_front();
                continue;
            }
        };

        sink.send(Message::Text(text))
            .await
            .context("Failed to write relay frame")?;
        outbox.pending.pop_front();
    }
}

async fn read_frames(
    mut stream: SplitStream<WsStream>,
    rooms: RoomSenders,
    pongs: mpsc::UnboundedSender<Vec<u8>>,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match parse_relay_frame(&text) {
                Ok(RelayFrame::Message { channel, payload }) => deliver(&rooms, &channel, &payload),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Dropping malformed relay frame"),
            },
            Ok(Message::Ping(data)) => {
                let _ = pongs.send(data);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Relay read failed");
                break;
            }
        }
    }
}

/// Back off and dial until the policy runs out, queueing frames meanwhile
async fn redial(
    url: &str,
    policy: &ReconnectPolicy,
    outgoing: &mut mpsc::UnboundedReceiver<RelayFrame>,
    outbox: &mut Outbox,
) -> Option<WsStream> {
    for (attempt, delay) in policy.delays().enumerate() {
        let backoff = tokio::time::sleep(delay);
        tokio::pin!(backoff);

        loop {
            tokio::select! {
                _ = &mut backoff => break,
                frame = outgoing.recv() => match frame {
                    Some(frame) => outbox.push(frame),
                    None => return None,
                },
            }
        }

        match dial(url).await {
            Ok(socket) => {
                tracing::info!(url, attempt = attempt + 1, "Reconnected to relay");
                return Some(socket);
            }
            Err(e) => {
                tracing::warn!(url, attempt = attempt + 1, error = %e, "Reconnection attempt failed");
            }
        }
    }

    tracing::error!(
        url,
        dropped = outbox.pending.len(),
        "Giving up on relay after {:?} attempts",
        policy.max_attempts
    );
    None
}

async fn dial(url: &str) -> Result<WsStream> {
    let (socket, _) = connect_async(url)
        .await
        .context("WebSocket handshake failed")?;
    Ok(socket)
}

fn deliver(rooms: &RoomSenders, channel: &str, payload: &RoomEvent) {
    let text = match payload.to_wire() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(channel, error = %e, "Failed to re-encode relay payload");
            return;
        }
    };

    if let Ok(rooms) = rooms.lock()
        && let Some(sender) = rooms.get(channel)
    {
        let _ = sender.send(text);
    }
}

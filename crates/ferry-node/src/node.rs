//! The node driver
//!
//! Owns one [`SessionEngine`] and everything the engine deliberately
//! does not know about: the jittered beacon timer, the set of transport
//! bindings, and the run loop that moves frames between the two. The
//! engine stays a synchronous message-in, actions-out function; this
//! module is the only place where time and sockets live.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use ferry_core::{
    BroadcastTransport, Clock, DeliveryHandle, ErrorHandle, FerryConfig, ForwardHandle,
    NodeAddress, SystemClock, TransportError,
};
use ferry_routing::{Outbound, SessionEngine};

use crate::error::{FerryError, FerryResult};

/// Identifier of one attached binding, unique within a node.
///
/// Assigned sequentially starting at zero, in attach order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

enum Command {
    Send {
        payload: Bytes,
        destination: NodeAddress,
    },
    Attach(Arc<dyn BroadcastTransport>),
    Detach(BindingId),
}

/// Control surface of a running node.
///
/// Dropping the handle tears the node down, same as calling
/// [`NodeHandle::shutdown`].
pub struct NodeHandle {
    commands: mpsc::UnboundedSender<Command>,
    shutdown: watch::Sender<bool>,
}

impl NodeHandle {
    /// Originate a packet at this node.
    pub fn send(&self, payload: Bytes, destination: NodeAddress) -> FerryResult<()> {
        self.commands
            .send(Command::Send {
                payload,
                destination,
            })
            .map_err(|_| FerryError::NodeStopped)
    }

    /// Attach another transport binding to the running node.
    pub fn attach(&self, transport: Arc<dyn BroadcastTransport>) -> FerryResult<()> {
        self.commands
            .send(Command::Attach(transport))
            .map_err(|_| FerryError::NodeStopped)
    }

    /// Detach a binding; pending sends over it fail at the transport.
    pub fn detach(&self, id: BindingId) -> FerryResult<()> {
        self.commands
            .send(Command::Detach(id))
            .map_err(|_| FerryError::NodeStopped)
    }

    /// Ask the node to stop. The run loop exits on its next turn.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// A ferrymesh node: engine, bindings, beacon timer.
pub struct FerryNode<C: Clock = SystemClock> {
    engine: SessionEngine<C>,
    bindings: BindingSet,
    inbound: mpsc::UnboundedReceiver<(NodeAddress, Bytes)>,
    forwards: mpsc::UnboundedReceiver<(NodeAddress, Bytes)>,
    commands: mpsc::UnboundedReceiver<Command>,
    shutdown: watch::Receiver<bool>,
    errors: ErrorHandle,
    beacon_interval: Duration,
    beacon_jitter_max: Duration,
}

impl FerryNode<SystemClock> {
    /// Create a node on the system clock.
    pub fn new(
        local: NodeAddress,
        config: FerryConfig,
        delivery: DeliveryHandle,
    ) -> (Self, NodeHandle) {
        Self::with_clock(local, config, SystemClock, delivery)
    }
}

impl<C: Clock> FerryNode<C> {
    /// Create a node on an explicit clock.
    pub fn with_clock(
        local: NodeAddress,
        config: FerryConfig,
        clock: C,
        delivery: DeliveryHandle,
    ) -> (Self, NodeHandle) {
        for warning in config.validate() {
            warn!(node = %local, %warning, "configuration warning");
        }

        // Reconciliation sends are queued here by the engine's forward
        // capability and drained by the run loop, preserving the order
        // the engine generated them in.
        let (forward_tx, forwards) = mpsc::unbounded_channel();
        let forward = ForwardHandle::new(move |peer, frame| {
            let _ = forward_tx.send((peer, frame));
        });
        let errors = ErrorHandle::new(move |err| {
            warn!(node = %local, error = %err, "send failed, awaiting next beacon cycle");
        });

        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown) = watch::channel(false);

        let beacon_interval = config.beacon_interval;
        let beacon_jitter_max = config.beacon_jitter_max;
        let engine =
            SessionEngine::new(local, config, clock, forward, delivery, errors.clone());

        let node = Self {
            engine,
            bindings: BindingSet::new(inbound_tx),
            inbound,
            forwards,
            commands,
            shutdown,
            errors,
            beacon_interval,
            beacon_jitter_max,
        };
        let handle = NodeHandle {
            commands: command_tx,
            shutdown: shutdown_tx,
        };
        (node, handle)
    }

    /// Attach a transport binding before the node starts running.
    pub fn attach(&mut self, transport: Arc<dyn BroadcastTransport>) -> BindingId {
        self.bindings.attach(transport)
    }

    /// The engine this node drives, for inspection.
    pub fn engine(&self) -> &SessionEngine<C> {
        &self.engine
    }

    /// Drive the node until shutdown.
    pub async fn run(mut self) -> FerryResult<()> {
        info!(node = %self.engine.local_address(), "node running");

        let beacon = sleep(jittered(self.beacon_interval, self.beacon_jitter_max));
        tokio::pin!(beacon);

        loop {
            tokio::select! {
                () = &mut beacon => {
                    let action = self.engine.on_beacon_tick();
                    self.execute(action).await;
                    beacon
                        .as_mut()
                        .reset(Instant::now() + jittered(self.beacon_interval, self.beacon_jitter_max));
                }
                inbound = self.inbound.recv() => {
                    let Some((from, frame)) = inbound else { break };
                    let actions = self.engine.on_datagram(from, frame);
                    // Data transfers precede the control answer on the wire.
                    self.flush_forwards().await;
                    for action in actions {
                        self.execute(action).await;
                    }
                }
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Send { payload, destination }) => {
                            self.engine.send(payload, destination);
                        }
                        Some(Command::Attach(transport)) => {
                            self.bindings.attach(transport);
                        }
                        Some(Command::Detach(id)) => {
                            self.bindings.detach(id);
                        }
                        None => break,
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(node = %self.engine.local_address(), "node stopped");
        Ok(())
    }

    async fn execute(&mut self, action: Outbound) {
        let result = match action {
            Outbound::Unicast { to, frame } => self.bindings.send(to, frame).await,
            Outbound::Broadcast { frame } => self.bindings.broadcast(frame).await,
        };
        if let Err(err) = result {
            self.errors.report(err);
        }
    }

    async fn flush_forwards(&mut self) {
        while let Ok((peer, frame)) = self.forwards.try_recv() {
            if let Err(err) = self.bindings.send(peer, frame).await {
                self.errors.report(err);
            }
        }
    }
}

/// A beacon interval with its collision-avoidance jitter applied.
fn jittered(interval: Duration, jitter_max: Duration) -> Duration {
    let max_ms = jitter_max.as_millis() as u64;
    if max_ms == 0 {
        return interval;
    }
    interval + Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

struct ActiveBinding {
    id: BindingId,
    transport: Arc<dyn BroadcastTransport>,
    reader: JoinHandle<()>,
}

/// The node-owned set of transport attachments.
///
/// Each binding gets a reader task funneling inbound frames into one
/// channel. Unicast tries bindings in attach order until one accepts;
/// broadcast goes out over all of them, best effort.
struct BindingSet {
    inbound_tx: mpsc::UnboundedSender<(NodeAddress, Bytes)>,
    bindings: Vec<ActiveBinding>,
    next_id: u64,
}

impl BindingSet {
    fn new(inbound_tx: mpsc::UnboundedSender<(NodeAddress, Bytes)>) -> Self {
        Self {
            inbound_tx,
            bindings: Vec::new(),
            next_id: 0,
        }
    }

    fn attach(&mut self, transport: Arc<dyn BroadcastTransport>) -> BindingId {
        let id = BindingId(self.next_id);
        self.next_id += 1;

        let tx = self.inbound_tx.clone();
        let reading = transport.clone();
        let reader = tokio::spawn(async move {
            loop {
                match reading.recv().await {
                    Ok(frame) => {
                        if tx.send(frame).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        debug!(error = %err, "binding reader stopped");
                        break;
                    }
                }
            }
        });

        self.bindings.push(ActiveBinding {
            id,
            transport,
            reader,
        });
        id
    }

    fn detach(&mut self, id: BindingId) -> bool {
        let Some(index) = self.bindings.iter().position(|b| b.id == id) else {
            return false;
        };
        let binding = self.bindings.remove(index);
        binding.reader.abort();
        true
    }

    async fn send(&self, peer: NodeAddress, frame: Bytes) -> Result<(), TransportError> {
        let mut last = TransportError::PeerNotConnected(peer.to_string());
        for binding in &self.bindings {
            match binding.transport.send(peer, frame.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) => last = err,
            }
        }
        Err(last)
    }

    async fn broadcast(&self, frame: Bytes) -> Result<(), TransportError> {
        for binding in &self.bindings {
            if let Err(err) = binding.transport.broadcast(frame.clone()).await {
                debug!(error = %err, "broadcast over binding failed");
            }
        }
        Ok(())
    }
}

impl Drop for BindingSet {
    fn drop(&mut self) {
        for binding in &self.bindings {
            binding.reader.abort();
        }
    }
}

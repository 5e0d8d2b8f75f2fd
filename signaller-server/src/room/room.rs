use crate::room::{LeaveOutcome, RoomCommand, RoomError};
use crate::signaling::SignalingOutput;
use signaller_core::{ConnectionId, EnvelopeCodec, MessageType, Role};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The room's single-flight negotiation gate.
///
/// `peer` outlives the lock: answers and trickled candidates keep flowing between the source
/// and that client after the source's first candidate releases the lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Negotiation {
    /// Held from a client's offer until the source's first candidate for it.
    pub locked: bool,
    /// Client the source was last primed for.
    pub peer: Option<ConnectionId>,
}

/// One named room: a source slot, its clients in join order and the negotiation gate.
///
/// Runs as its own task; every command for the room is applied in arrival order, which
/// makes check-then-act on the negotiation gate atomic.
pub struct Room {
    name: String,
    source: Option<ConnectionId>,
    clients: Vec<ConnectionId>,
    negotiation: Negotiation,
    command_rx: mpsc::Receiver<RoomCommand>,
    output: Arc<dyn SignalingOutput>,
    codec: Arc<EnvelopeCodec>,
}

impl Room {
    pub fn new(
        name: String,
        command_rx: mpsc::Receiver<RoomCommand>,
        output: Arc<dyn SignalingOutput>,
        codec: Arc<EnvelopeCodec>,
    ) -> Self {
        Self {
            name,
            source: None,
            clients: Vec::new(),
            negotiation: Negotiation::default(),
            command_rx,
            output,
            codec,
        }
    }

    pub async fn run(mut self) {
        info!(room = %self.name, "Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            if self.handle_command(cmd).is_break() {
                break;
            }
        }

        info!(room = %self.name, "Room event loop finished");
    }

    fn handle_command(&mut self, cmd: RoomCommand) -> ControlFlow<()> {
        match cmd {
            RoomCommand::Join { peer, role, reply } => {
                let result = self.join(peer, role);
                if reply.send(result).is_err() {
                    debug!(room = %self.name, "Join requester for {} went away", peer);
                }
            }
            RoomCommand::Plain { sender, frame } => self.relay_plain(sender, frame),
            RoomCommand::CursorUpdate { sender, frame } => self.relay_cursor(sender, frame),
            RoomCommand::Offer { sender, frame } => self.relay_offer(sender, frame),
            RoomCommand::Answer { sender, frame } => self.relay_answer(sender, frame),
            RoomCommand::IceCandidate { sender, frame } => self.relay_ice(sender, frame),
            RoomCommand::Leave { peer, reply } => {
                let outcome = self.leave(peer);
                let _ = reply.send(outcome);
                if outcome == LeaveOutcome::Closed {
                    return ControlFlow::Break(());
                }
            }
            RoomCommand::Abandon { reply } => {
                let close = self.source.is_none();
                let _ = reply.send(close);
                if close {
                    info!(room = %self.name, "Closing room abandoned by its creator");
                    return ControlFlow::Break(());
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn join(&mut self, peer: ConnectionId, role: Role) -> Result<(), RoomError> {
        match role {
            Role::Source => {
                if self.source.is_some() {
                    return Err(RoomError::RoomHasSource(self.name.clone()));
                }
                if !self.output.bind_room(peer, &self.name) {
                    return Err(RoomError::ConnectionClosed(self.name.clone()));
                }
                self.source = Some(peer);
                info!(room = %self.name, "Source {} joined", peer);
            }
            Role::Client => {
                let Some(source) = self.source else {
                    return Err(RoomError::RoomHasNoSource(self.name.clone()));
                };
                if self.clients.contains(&peer) {
                    return Err(RoomError::AlreadyInRoom(self.name.clone()));
                }
                // The join may have been queued just before its connection went away.
                if !self.output.bind_room(peer, &self.name) {
                    return Err(RoomError::ConnectionClosed(self.name.clone()));
                }

                let notice = self.notice(&format!(
                    "client with uid {} joined room {}",
                    peer, self.name
                ));
                self.output.send(source, notice.clone());
                for client in &self.clients {
                    self.output.send(*client, notice.clone());
                }

                self.clients.push(peer);
                info!(
                    room = %self.name,
                    clients = self.clients.len(),
                    "Client {} joined",
                    peer
                );
            }
        }
        Ok(())
    }

    fn relay_plain(&self, sender: ConnectionId, frame: String) {
        if self.is_source(sender) {
            self.send_to_clients(&frame, None);
        } else if self.is_client(sender) {
            self.send_to_source(frame);
        } else {
            debug!(room = %self.name, "Plain from non-member {} dropped", sender);
        }
    }

    fn relay_cursor(&self, sender: ConnectionId, frame: String) {
        if !self.is_member(sender) {
            return;
        }
        self.send_to_clients(&frame, Some(sender));
    }

    fn relay_offer(&mut self, sender: ConnectionId, frame: String) {
        if !self.is_client(sender) {
            debug!(room = %self.name, "Offer from non-client {} dropped", sender);
            return;
        }
        if self.negotiation.locked {
            debug!(
                room = %self.name,
                "Offer from {} dropped, negotiation with {:?} in flight",
                sender,
                self.negotiation.peer
            );
            return;
        }
        let Some(source) = self.source else {
            return;
        };

        self.negotiation = Negotiation {
            locked: true,
            peer: Some(sender),
        };
        info!(room = %self.name, "Negotiation lock taken by {}", sender);

        let priming = self
            .codec
            .encode(MessageType::Register, &sender.to_string());
        self.output.send(source, priming);
        self.output.send(source, frame);
    }

    fn relay_answer(&self, sender: ConnectionId, frame: String) {
        if !self.is_source(sender) {
            debug!(room = %self.name, "Answer from non-source {} dropped", sender);
            return;
        }
        match self.negotiation.peer {
            Some(client) => {
                self.output.send(client, frame);
            }
            None => debug!(room = %self.name, "Answer with no primed client dropped"),
        }
    }

    fn relay_ice(&mut self, sender: ConnectionId, frame: String) {
        let Some(client) = self.negotiation.peer else {
            debug!(room = %self.name, "ICE candidate from {} with no primed client dropped", sender);
            return;
        };

        if self.is_source(sender) {
            self.output.send(client, frame);
            if self.negotiation.locked {
                self.negotiation.locked = false;
                info!(room = %self.name, "Negotiation lock released by source candidate");
            }
        } else if sender == client {
            self.send_to_source(frame);
        } else {
            debug!(room = %self.name, "Stale ICE candidate from {} dropped", sender);
        }
    }

    fn leave(&mut self, peer: ConnectionId) -> LeaveOutcome {
        if self.is_source(peer) {
            info!(
                room = %self.name,
                "Source {} left, sending shutdown to {} clients",
                peer,
                self.clients.len()
            );
            let shutdown = self.codec.encode(MessageType::Shutdown, "");
            for client in self.clients.drain(..) {
                self.output.send(client, shutdown.clone());
                self.output.unbind_room(client, &self.name);
            }
            self.source = None;
            self.negotiation = Negotiation::default();
            return LeaveOutcome::Closed;
        }

        let Some(position) = self.clients.iter().position(|c| *c == peer) else {
            return LeaveOutcome::NotMember;
        };
        self.clients.remove(position);
        self.output.unbind_room(peer, &self.name);

        if self.negotiation.peer == Some(peer) {
            if self.negotiation.locked {
                info!(room = %self.name, "Negotiation lock released, holder {} left", peer);
            }
            self.negotiation = Negotiation::default();
        }

        if let Some(source) = self.source {
            let shutdown = self.codec.encode(MessageType::Shutdown, &peer.to_string());
            self.output.send(source, shutdown);
            let notice = self.notice(&format!("client with uid {} left room {}", peer, self.name));
            self.output.send(source, notice);
        }
        info!(room = %self.name, clients = self.clients.len(), "Client {} left", peer);
        LeaveOutcome::Remained
    }

    fn send_to_source(&self, frame: String) {
        match self.source {
            Some(source) => {
                self.output.send(source, frame);
            }
            None => warn!(room = %self.name, "Room has clients but no source"),
        }
    }

    fn send_to_clients(&self, frame: &str, except: Option<ConnectionId>) {
        for client in self.clients.iter().filter(|c| Some(**c) != except) {
            self.output.send(*client, frame.to_owned());
        }
    }

    fn notice(&self, text: &str) -> String {
        self.codec.encode(MessageType::Plain, text)
    }

    fn is_source(&self, peer: ConnectionId) -> bool {
        self.source == Some(peer)
    }

    fn is_client(&self, peer: ConnectionId) -> bool {
        self.clients.contains(&peer)
    }

    fn is_member(&self, peer: ConnectionId) -> bool {
        self.is_source(peer) || self.is_client(peer)
    }
}

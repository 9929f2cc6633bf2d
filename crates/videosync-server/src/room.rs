//! Room actor.
//!
//! Each room runs as one tokio task that owns a [`RoomState`] and the
//! [`Link`]s of its members. Every operation arrives as a [`RoomCommand`]
//! through a bounded mailbox and is applied to completion (including its
//! broadcasts and any settle delay) before the next command is read, so
//! operations on one room never interleave.
//!
//! # Backpressure
//!
//! The mailbox holds `mailbox_capacity` commands. When it is full, submitters
//! wait for space; commands are never dropped or rejected while the room is
//! alive.
//!
//! # Video lookups
//!
//! A `queueurl` takes a ticket when the actor reads it, and the lookup runs on
//! a separate task that reports back through the mailbox. Resolved videos are
//! appended strictly in ticket order, so the queue follows submission order
//! even when a later lookup finishes first, and a slow metadata service never
//! holds the room.
//!
//! # Drift monitor
//!
//! A companion task submits a drift check every `drift_interval`, from room
//! creation on. The monitor is aborted when the last member leaves and started
//! again by the next join. Each check carries the generation of the monitor
//! that sent it, so a check that was already queued at stop time is discarded.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
};

use futures_util::future::join_all;
use tokio::{
    sync::{mpsc, oneshot},
    task::AbortHandle,
};
use tracing::{Instrument, debug, info, info_span, warn};
use videosync_core::{Environment, RoomAction, RoomSnapshot, RoomState, VideoInfoProvider};
use videosync_proto::{QueuedVideo, ServerMessage, Video};

use crate::{
    config::RoomConfig,
    error::RoomError,
    member::{Link, MemberId},
};

/// Operations a room applies one at a time.
#[derive(Debug)]
enum RoomCommand {
    Join { member: MemberId, name: String, link: Link },
    Leave { member: MemberId },
    Kick { member: MemberId },
    Play { member: MemberId, position: f64 },
    Pause { member: MemberId, position: f64 },
    QueueUrl { member: MemberId, url: String, done: oneshot::Sender<()> },
    Resolved { ticket: u64, lookup: Lookup },
    Reorder { from: i64, to: i64 },
    Remove { index: i64 },
    Skip,
    DriftCheck { generation: u64 },
    Snapshot { reply: oneshot::Sender<RoomSnapshot> },
}

/// Outcome of one video lookup.
#[derive(Debug)]
enum Lookup {
    InFlight,
    Found(Video),
    Failed,
}

/// A `queueurl` waiting for its turn to be appended.
#[derive(Debug)]
struct PendingLookup {
    queued_by: String,
    lookup: Lookup,
    done: oneshot::Sender<()>,
}

/// Cheap, cloneable handle for submitting operations to one room.
#[derive(Clone)]
pub struct RoomHandle {
    id: Arc<str>,
    tx: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle").field("id", &self.id).finish_non_exhaustive()
    }
}

impl RoomHandle {
    /// Spawn the actor for room `id` and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<E: Environment>(
        id: impl Into<String>,
        env: E,
        config: RoomConfig,
        provider: Arc<dyn VideoInfoProvider>,
    ) -> Self {
        let id: String = id.into();
        let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
        let mut actor = RoomActor {
            state: RoomState::new(id.clone()),
            links: HashMap::new(),
            env,
            config,
            provider,
            mailbox: rx,
            loopback: tx.downgrade(),
            monitor: None,
            generation: 0,
            lookups: BTreeMap::new(),
            next_ticket: 0,
        };

        let span = info_span!("room", room = %id);
        span.in_scope(|| actor.start_monitor());
        tokio::spawn(actor.run().instrument(span));

        Self { id: id.into(), tx }
    }

    /// Room id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether both handles address the same room instance.
    pub fn same_room(&self, other: &Self) -> bool {
        self.tx.same_channel(&other.tx)
    }

    /// Add a member. The member receives `init` through `link`.
    pub async fn join(
        &self,
        member: MemberId,
        name: impl Into<String>,
        link: Link,
    ) -> Result<(), RoomError> {
        self.submit(RoomCommand::Join { member, name: name.into(), link }).await
    }

    /// Remove a member. Unknown members are ignored.
    pub async fn leave(&self, member: MemberId) -> Result<(), RoomError> {
        self.submit(RoomCommand::Leave { member }).await
    }

    /// Close a member's connection and remove it from the room.
    pub async fn kick(&self, member: MemberId) -> Result<(), RoomError> {
        self.submit(RoomCommand::Kick { member }).await
    }

    /// A member resumed playback at `position`.
    pub async fn play(&self, member: MemberId, position: f64) -> Result<(), RoomError> {
        self.submit(RoomCommand::Play { member, position }).await
    }

    /// A member paused playback at `position`.
    pub async fn pause(&self, member: MemberId, position: f64) -> Result<(), RoomError> {
        self.submit(RoomCommand::Pause { member, position }).await
    }

    /// Resolve `url` and append the video to the queue.
    ///
    /// Returns once the video has been appended (and any resulting load has
    /// settled), or once a failed lookup has been dropped. A failed lookup is
    /// logged and otherwise ignored; the requester is told nothing. Other
    /// operations on the room proceed while the lookup is in flight.
    pub async fn queue_url(&self, member: MemberId, url: &str) -> Result<(), RoomError> {
        let (done, rx) = oneshot::channel();
        self.submit(RoomCommand::QueueUrl { member, url: url.to_string(), done }).await?;
        rx.await.map_err(|_| self.closed())
    }

    /// Move the queue entry at `from` to `to`.
    pub async fn reorder(&self, from: i64, to: i64) -> Result<(), RoomError> {
        self.submit(RoomCommand::Reorder { from, to }).await
    }

    /// Remove the queue entry at `index`.
    pub async fn remove(&self, index: i64) -> Result<(), RoomError> {
        self.submit(RoomCommand::Remove { index }).await
    }

    /// Skip to the next queued video.
    pub async fn skip(&self) -> Result<(), RoomError> {
        self.submit(RoomCommand::Skip).await
    }

    /// Read-only view of the room.
    ///
    /// Answered in mailbox order, so every operation submitted before this
    /// call has been applied (and broadcast) by the time it returns. Videos
    /// whose lookup is still in flight are not in the queue yet.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.submit(RoomCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| self.closed())
    }

    async fn submit(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.tx.send(command).await.map_err(|_| self.closed())
    }

    fn closed(&self) -> RoomError {
        RoomError::Closed(self.id.to_string())
    }
}

struct RoomActor<E: Environment> {
    state: RoomState<E::Instant>,
    links: HashMap<MemberId, Link>,
    env: E,
    config: RoomConfig,
    provider: Arc<dyn VideoInfoProvider>,
    mailbox: mpsc::Receiver<RoomCommand>,
    loopback: mpsc::WeakSender<RoomCommand>,
    monitor: Option<AbortHandle>,
    generation: u64,
    lookups: BTreeMap<u64, PendingLookup>,
    next_ticket: u64,
}

impl<E: Environment> RoomActor<E> {
    async fn run(mut self) {
        debug!("room started");
        while let Some(command) = self.mailbox.recv().await {
            self.handle(command).await;
        }
        self.stop_monitor();
        debug!("room stopped");
    }

    async fn handle(&mut self, command: RoomCommand) {
        let now = self.env.now();
        let actions = match command {
            RoomCommand::Join { member, name, link } => {
                if self.state.is_member(member) {
                    return;
                }
                self.links.insert(member, link);
                info!(client = %member, name = %name, "member joined");
                self.state.join(member, &name, now)
            },
            RoomCommand::Leave { member } => self.remove_member(member),
            RoomCommand::Kick { member } => {
                if let Some(link) = self.links.get(&member) {
                    info!(client = %member, "kicking member");
                    link.close();
                }
                self.remove_member(member)
            },
            RoomCommand::Play { member, position } => self.state.play(member, position, now),
            RoomCommand::Pause { member, position } => self.state.pause(member, position, now),
            RoomCommand::QueueUrl { member, url, done } => {
                self.start_lookup(member, url, done);
                return;
            },
            RoomCommand::Resolved { ticket, lookup } => {
                if let Some(pending) = self.lookups.get_mut(&ticket) {
                    pending.lookup = lookup;
                }
                self.append_resolved().await;
                return;
            },
            RoomCommand::Reorder { from, to } => self.state.reorder_queue(from, to),
            RoomCommand::Remove { index } => self.state.remove_from_queue(index),
            RoomCommand::Skip => {
                debug!("skipping video");
                self.state.load_next(now)
            },
            RoomCommand::DriftCheck { generation } => {
                if self.monitor.is_none() || generation != self.generation {
                    return;
                }
                let actions = self.state.check_drift(now);
                if !actions.is_empty() {
                    info!(video = self.state.playback().video_id(), "playback overran, advancing");
                }
                actions
            },
            RoomCommand::Snapshot { reply } => {
                // Requester may have gone away; nothing to do then.
                let _ = reply.send(self.state.snapshot(now));
                return;
            },
        };

        self.execute(actions).await;
    }

    fn start_lookup(&mut self, member: MemberId, url: String, done: oneshot::Sender<()>) {
        // Dropping `done` tells the requester the room is closing.
        let Some(tx) = self.loopback.upgrade() else {
            return;
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let queued_by = self.state.member_name(member).unwrap_or_default().to_string();
        self.lookups.insert(ticket, PendingLookup { queued_by, lookup: Lookup::InFlight, done });

        let provider = Arc::clone(&self.provider);
        tokio::spawn(
            async move {
                let lookup = match provider.resolve(&url).await {
                    Ok(video) => Lookup::Found(video),
                    Err(err) => {
                        warn!(client = %member, url = %url, error = %err, "video lookup failed");
                        Lookup::Failed
                    },
                };
                // Room gone; nothing left to append to.
                let _ = tx.send(RoomCommand::Resolved { ticket, lookup }).await;
            }
            .in_current_span(),
        );
    }

    /// Append finished lookups in ticket order, stopping at the first one
    /// still in flight.
    async fn append_resolved(&mut self) {
        while let Some(entry) = self.lookups.first_entry() {
            if matches!(entry.get().lookup, Lookup::InFlight) {
                break;
            }
            let PendingLookup { queued_by, lookup, done } = entry.remove();
            if let Lookup::Found(video) = lookup {
                debug!(video = %video.id, queued_by = %queued_by, "queueing video");
                let entry = QueuedVideo::new(video, queued_by);
                let actions = self.state.enqueue(entry, self.env.now());
                self.execute(actions).await;
            }
            // Requester may have gone away.
            let _ = done.send(());
        }
    }

    fn remove_member(&mut self, member: MemberId) -> Vec<RoomAction> {
        self.links.remove(&member);
        let name = self.state.member_name(member).map(str::to_string);
        let actions = self.state.leave(member);
        if let Some(name) = name {
            info!(client = %member, name = %name, "member left");
        }
        actions
    }

    /// Run actions in order. A settle step runs inline and its follow-up
    /// actions execute before anything queued after it.
    async fn execute(&mut self, actions: Vec<RoomAction>) {
        let mut pending = VecDeque::from(actions);
        while let Some(action) = pending.pop_front() {
            match action {
                RoomAction::SendTo { member, message } => self.send_to(member, message).await,
                RoomAction::Broadcast { exclude, message } => {
                    self.broadcast(exclude, &message).await;
                },
                RoomAction::Settle { video_id } => {
                    info!(video = %video_id, "loaded video, settling");
                    self.env.sleep(self.config.settle_delay).await;
                    let follow_up = self.state.start_loaded(&video_id, self.env.now());
                    for action in follow_up.into_iter().rev() {
                        pending.push_front(action);
                    }
                },
                RoomAction::StartMonitor => self.start_monitor(),
                RoomAction::StopMonitor => self.stop_monitor(),
            }
        }
    }

    async fn send_to(&self, member: MemberId, message: ServerMessage) {
        let Some(link) = self.links.get(&member) else {
            return;
        };
        let kind = message.kind();
        if let Err(err) = link.send(message, self.config.send_timeout).await {
            warn!(error = %err, %kind, "failed to deliver message");
        }
    }

    async fn broadcast(&self, exclude: Option<MemberId>, message: &ServerMessage) {
        let timeout = self.config.send_timeout;
        let sends = self
            .links
            .values()
            .filter(|link| Some(link.member()) != exclude)
            .map(|link| link.send(message.clone(), timeout));

        for result in join_all(sends).await {
            if let Err(err) = result {
                warn!(error = %err, kind = %message.kind(), "failed to deliver broadcast");
            }
        }
    }

    fn start_monitor(&mut self) {
        if self.monitor.is_some() {
            return;
        }
        let Some(tx) = self.loopback.upgrade() else {
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        let env = self.env.clone();
        let interval = self.config.drift_interval;

        let task = tokio::spawn(
            async move {
                loop {
                    env.sleep(interval).await;
                    if tx.send(RoomCommand::DriftCheck { generation }).await.is_err() {
                        break;
                    }
                }
            }
            .in_current_span(),
        );
        self.monitor = Some(task.abort_handle());
        debug!(generation, "drift monitor started");
    }

    fn stop_monitor(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
            debug!(generation = self.generation, "drift monitor stopped");
        }
    }
}

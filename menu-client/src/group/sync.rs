use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use shared::cart::{CartLine, LineHandle, NewLine};
use shared::message::{CartAction, GroupMessage};

use super::session::{DEFAULT_PARTICIPANT_NAME, GroupPhase, GroupSession, normalize_name};
use crate::cart::SharedCart;
use crate::channel::{ChannelHandle, ChannelState, JsonCodec, Transport};
use crate::storage::{SharedStore, keys, load_json, save_json};
use crate::ClientConfig;

pub type GroupCodec = JsonCodec<GroupMessage, GroupMessage>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("No group to join")]
    NoGroup,

    #[error("Participant name must not be empty")]
    EmptyName,

    #[error("Not in a group")]
    NotJoined,
}

/// Group order sync for one client session
pub struct GroupSync {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    cart: SharedCart,
    store: SharedStore,
    session: Option<GroupSession>,
    channel: Option<ChannelHandle<GroupCodec>>,
    applier: Option<JoinHandle<()>>,
    phase: Arc<watch::Sender<GroupPhase>>,
}

impl GroupSync {
    /// Idle sync bound to a cart
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        cart: SharedCart,
        store: SharedStore,
    ) -> Self {
        let (phase, _) = watch::channel(GroupPhase::Idle);
        Self {
            config,
            transport,
            cart,
            store,
            session: None,
            channel: None,
            applier: None,
            phase: Arc::new(phase),
        }
    }

    /// Pick up the group id from the page URL. Idle → Joining when one is
    /// present; the participant still has to [`join`](Self::join).
    pub fn detect(&mut self, page_url: &str) -> GroupPhase {
        if let Some(found) = GroupSession::from_url(page_url) {
            let same_group = self
                .session
                .as_ref()
                .is_some_and(|s| s.group_id == found.group_id);
            if !same_group {
                self.leave();
                tracing::info!(group_id = %found.group_id, "Group order detected");
                self.session = Some(found);
                self.phase.send_replace(GroupPhase::Joining);
            }
        }
        self.phase()
    }

    /// Start a new group as host; returns its id
    pub fn start(&mut self) -> String {
        self.leave();
        let session = GroupSession::create();
        let group_id = session.group_id.clone();
        tracing::info!(group_id = %group_id, "Group order started");
        self.session = Some(session);
        self.phase.send_replace(GroupPhase::Joining);
        group_id
    }

    /// Name to pre-fill: the one used last time, or a placeholder
    pub fn suggested_name(&self) -> String {
        load_json::<String>(self.store.as_ref(), keys::GROUP_PARTICIPANT)
            .and_then(|n| normalize_name(&n))
            .unwrap_or_else(|| DEFAULT_PARTICIPANT_NAME.to_string())
    }

    /// Join the detected group under `name` and open the channel
    pub fn join(&mut self, name: &str) -> Result<(), GroupError> {
        let name = normalize_name(name).ok_or(GroupError::EmptyName)?;
        let session = self.session.as_mut().ok_or(GroupError::NoGroup)?;
        session.participant_name = Some(name.clone());
        session.is_active = true;
        let group_id = session.group_id.clone();
        self.persist_name(&name);

        if self.channel.is_none() {
            self.connect(&group_id);
        }
        tracing::info!(group_id = %group_id, participant = %name, "Joined group order");
        Ok(())
    }

    /// Change the display name; lines already added keep their orderer
    pub fn rename(&mut self, name: &str) -> Result<(), GroupError> {
        let name = normalize_name(name).ok_or(GroupError::EmptyName)?;
        let session = self
            .session
            .as_mut()
            .filter(|s| s.is_active)
            .ok_or(GroupError::NotJoined)?;
        session.participant_name = Some(name.clone());
        self.persist_name(&name);
        Ok(())
    }

    /// Leave the group: close the channel, back to Idle. The cart is kept.
    pub fn leave(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.shutdown();
        }
        if let Some(applier) = self.applier.take() {
            applier.abort();
        }
        if let Some(session) = self.session.take() {
            tracing::info!(group_id = %session.group_id, "Left group order");
        }
        self.phase.send_replace(GroupPhase::Idle);
    }

    /// Add a line locally and mirror it to the group.
    ///
    /// While joined, the line is stamped with the participant name. A
    /// mirror that cannot be sent is logged and dropped; the local add
    /// always stands.
    pub fn add_line(&self, mut candidate: NewLine) -> Option<LineHandle> {
        let participant = self.participant_name().map(str::to_string);
        if let Some(name) = &participant {
            candidate.ordered_by = Some(name.clone());
        }
        let quantity = u32::try_from(candidate.quantity).unwrap_or(u32::MAX);
        let handle = self.cart.lock().add_line(candidate.clone())?;

        if let (Some(name), Some(channel)) = (participant, &self.channel) {
            // mirror the added quantity, not the merged total
            let mirror = CartLine::from_new(handle, candidate, quantity);
            match channel.send(&GroupMessage::add(mirror, name)) {
                Ok(()) => tracing::debug!(line = %handle, "Line mirrored to group"),
                Err(e) => tracing::warn!(line = %handle, "Line not mirrored to group: {e}"),
            }
        }
        Some(handle)
    }

    pub fn phase(&self) -> GroupPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<GroupPhase> {
        self.phase.subscribe()
    }

    pub fn session(&self) -> Option<&GroupSession> {
        self.session.as_ref()
    }

    /// Participant name while joined
    pub fn participant_name(&self) -> Option<&str> {
        self.session
            .as_ref()
            .filter(|s| s.is_active)
            .and_then(|s| s.participant_name.as_deref())
    }

    fn connect(&mut self, group_id: &str) {
        let (channel, inbound) = ChannelHandle::spawn(
            self.config.group_channel(group_id),
            self.transport.clone(),
            GroupCodec::new(),
        );
        let applier = tokio::spawn(apply_inbound(
            inbound,
            channel.subscribe_state(),
            self.cart.clone(),
            self.phase.clone(),
        ));
        self.channel = Some(channel);
        self.applier = Some(applier);
    }

    fn persist_name(&self, name: &str) {
        if let Err(e) = save_json(self.store.as_ref(), keys::GROUP_PARTICIPANT, name) {
            tracing::warn!("Failed to persist participant name: {e}");
        }
    }
}

impl Drop for GroupSync {
    fn drop(&mut self) {
        if let Some(applier) = self.applier.take() {
            applier.abort();
        }
    }
}

impl std::fmt::Debug for GroupSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupSync")
            .field("session", &self.session)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

/// Apply remote additions in receipt order and track the channel state
async fn apply_inbound(
    mut inbound: mpsc::Receiver<GroupMessage>,
    mut state: watch::Receiver<ChannelState>,
    cart: SharedCart,
    phase: Arc<watch::Sender<GroupPhase>>,
) {
    let initial = *state.borrow_and_update();
    update_phase(&phase, initial);

    loop {
        tokio::select! {
            message = inbound.recv() => {
                let Some(message) = message else { break };
                apply_remote(&cart, message);
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                update_phase(&phase, current);
            }
        }
    }
}

fn update_phase(phase: &watch::Sender<GroupPhase>, state: ChannelState) {
    match state {
        ChannelState::Online => {
            phase.send_replace(GroupPhase::Connected);
        }
        ChannelState::Offline => {
            phase.send_replace(GroupPhase::Disconnected);
        }
        // first attempt stays Joining, later attempts stay Disconnected
        ChannelState::Connecting => {}
    }
}

fn apply_remote(cart: &SharedCart, message: GroupMessage) {
    let GroupMessage::UpdateCart {
        action,
        item,
        participant,
    } = message;
    match action {
        CartAction::Add => {
            let mut candidate = item.to_new_line();
            if candidate.ordered_by.is_none() {
                candidate.ordered_by = normalize_name(&participant);
            }
            let handle = cart.lock().add_line(candidate);
            tracing::debug!(
                participant = %participant,
                product_id = item.product_id,
                applied = handle.is_some(),
                "Remote line applied"
            );
        }
        CartAction::Unknown => {
            tracing::debug!(participant = %participant, "Ignoring unsupported group action");
        }
    }
}

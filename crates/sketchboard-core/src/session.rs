//! One client's drawing session on one board.
//!
//! Glues pointer input, the interaction router, the drawing engine, the
//! coordinator and the presence relay together. The host feeds it pointer
//! events and calls [`WhiteboardSession::pump`] regularly to process network
//! events.

use crate::canvas::{CanvasState, ToolSettings};
use crate::config::SessionConfig;
use crate::draw::{self, Surface};
use crate::fabric::{FabricEvent, RealtimeFabric};
use crate::gateway::PersistenceGateway;
use crate::input::{PointerEvent, ViewportTransform};
use crate::presence::PresenceRelay;
use crate::sync::{Operation, PendingCommit, SyncCoordinator, SyncResult};
use crate::tools::{CommitRequest, InteractionRouter, TextPrompt, ToolContext, ToolKind};
use kurbo::{Point, Size};
use std::collections::HashSet;
use std::rc::Rc;

pub struct WhiteboardSession<S: Surface> {
    config: SessionConfig,
    coordinator: SyncCoordinator,
    presence: PresenceRelay,
    router: InteractionRouter,
    fabric: Rc<dyn RealtimeFabric>,
    surface: S,
    prompt: Box<dyn TextPrompt>,
    /// Remote changes arrived mid-gesture; redraw once it ends.
    deferred_redraw: bool,
}

impl<S: Surface> WhiteboardSession<S> {
    pub fn new(
        config: SessionConfig,
        gateway: Rc<dyn PersistenceGateway>,
        fabric: Rc<dyn RealtimeFabric>,
        surface: S,
    ) -> Self {
        let coordinator = SyncCoordinator::new(
            config.board_id.clone(),
            config.user_id.clone(),
            CanvasState::with_undo_limit(config.undo_limit),
            Rc::clone(&gateway),
            Rc::clone(&fabric),
        );
        let presence = PresenceRelay::new(
            config.board_id.clone(),
            config.user_id.clone(),
            config.profile.clone(),
            config.resolution,
            Rc::clone(&fabric),
            gateway,
        );
        let router =
            InteractionRouter::new(ViewportTransform::new(config.resolution, config.resolution));
        Self {
            config,
            coordinator,
            presence,
            router,
            fabric,
            surface,
            prompt: Box::new(|_: Point| None::<String>),
            deferred_redraw: false,
        }
    }

    /// Install the text prompt used by the text tool.
    pub fn with_prompt(mut self, prompt: impl TextPrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    pub fn presence(&self) -> &PresenceRelay {
        &self.presence
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn settings(&self) -> &ToolSettings {
        self.coordinator.settings()
    }

    /// Change color, stroke width or fill. Use [`Self::set_tool`] for the tool.
    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        self.coordinator.settings_mut()
    }

    /// Subscribe to the board and load its elements.
    ///
    /// A failed load is logged and leaves the canvas empty.
    pub async fn join(&mut self) -> SyncResult<()> {
        self.fabric.join(&self.config.board_id)?;
        if let Err(e) = self.coordinator.load().await {
            log::error!(
                "Failed to load board {}, starting empty: {}",
                self.config.board_id,
                e
            );
        }
        self.redraw();
        Ok(())
    }

    /// Unsubscribe and clean up presence. Never fails.
    pub async fn leave(&mut self) {
        self.router.cancel();
        self.presence.teardown().await;
        if let Err(e) = self.fabric.leave() {
            log::warn!("Failed to leave board {}: {}", self.config.board_id, e);
        }
    }

    /// The canvas is now displayed at `size` (CSS pixels).
    pub fn set_display_size(&mut self, size: Size) {
        let mut transform = *self.router.transform();
        transform.set_display_size(size);
        self.router.set_transform(transform);
    }

    /// Switch tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.router.cancel() {
            self.redraw();
        }
        self.coordinator.settings_mut().tool = tool;
    }

    /// Handle a pointer event in display coordinates.
    ///
    /// A gesture that completes is applied and redrawn immediately, then
    /// persisted. Persistence failures are returned after the rollback has
    /// been redrawn.
    pub async fn pointer(&mut self, event: PointerEvent) -> SyncResult<()> {
        if let PointerEvent::Move { position } = event {
            self.presence.track(self.router.transform().to_canvas(position));
        }

        let style = self.coordinator.settings().style();
        let tool = self.coordinator.settings().tool;
        let mut ctx = ToolContext {
            elements: self.coordinator.elements(),
            style: &style,
            surface: &mut self.surface,
            prompt: self.prompt.as_mut(),
            min_hit_threshold: self.config.min_hit_threshold,
            cursors: self.presence.cursors(),
            resolution: self.config.resolution,
        };
        let commit = self.router.handle(tool, event, &mut ctx);

        let result = match commit {
            Some(CommitRequest::Save(shape)) => {
                let element = self.coordinator.element_for(shape);
                let pending = self.coordinator.stage(Operation::Add(element));
                self.confirm(pending).await
            }
            Some(CommitRequest::Delete(ids)) => {
                let pending = self.coordinator.stage(Operation::Delete(ids));
                self.confirm(pending).await
            }
            None => Ok(()),
        };

        if self.deferred_redraw && !self.router.is_active() {
            self.redraw();
        }
        result
    }

    pub async fn clear_all(&mut self) -> SyncResult<()> {
        let pending = self.coordinator.stage(Operation::Clear);
        self.confirm(pending).await
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.coordinator.undo();
        if changed {
            self.redraw();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.coordinator.redo();
        if changed {
            self.redraw();
        }
        changed
    }

    /// Process pending fabric events. Returns whether the surface was redrawn.
    pub fn pump(&mut self) -> bool {
        let mut dirty = false;
        for event in self.fabric.poll_events() {
            match event {
                FabricEvent::StateReplace(payload) => {
                    dirty |= self.coordinator.apply_remote(payload);
                }
                FabricEvent::PresenceSync { entries } => {
                    self.presence.apply_roster(&entries);
                    dirty = true;
                }
                FabricEvent::Joined {
                    board_id,
                    peer_count,
                } => {
                    log::info!("Joined board {} with {} peers", board_id, peer_count);
                }
                FabricEvent::PeerJoined { peer_id } => log::debug!("Peer joined: {}", peer_id),
                FabricEvent::PeerLeft { peer_id } => log::debug!("Peer left: {}", peer_id),
                FabricEvent::Connected => log::info!("Realtime fabric connected"),
                FabricEvent::Disconnected => log::warn!("Realtime fabric disconnected"),
                FabricEvent::Error { message } => log::warn!("Realtime fabric error: {}", message),
            }
        }

        if !dirty {
            return false;
        }
        if self.router.is_active() {
            self.deferred_redraw = true;
            return false;
        }
        self.redraw();
        true
    }

    /// Clear and draw committed elements plus remote cursors.
    pub fn redraw(&mut self) {
        draw::redraw_all(&mut self.surface, self.coordinator.elements(), &HashSet::new());
        draw::draw_cursors(&mut self.surface, self.presence.cursors(), self.config.resolution);
        self.deferred_redraw = false;
    }

    /// Redraw the optimistic state, persist, and redraw again if it was
    /// rolled back.
    async fn confirm(&mut self, pending: PendingCommit) -> SyncResult<()> {
        self.redraw();
        let result = self.coordinator.persist(pending).await;
        if result.is_err() {
            self.redraw();
        }
        result
    }
}

//! Game sessions: one room's authoritative simulation.
//!
//! A session owns its own [`EntityStore`], the mapping from player IDs to
//! their entities, and two long-lived tasks started together:
//!
//! * the **message loop**, consuming the session's inbound channel in
//!   arrival order and dispatching per-action handlers;
//! * the **tick loop**, advancing the world on a fixed interval by running
//!   the systems over a single snapshot per tick.
//!
//! The two loops interleave arbitrarily; per-entity locking inside the ECS
//! is what keeps concurrent component access sound. Handler failures are
//! reported to the originating connection and never stop either loop.

pub mod factory;
pub mod registry;

pub use registry::SessionRegistry;

use crate::config::ServerConfig;
use crate::ecs::{Component, ComponentKind, EntityId, EntityStore, TransformComponent};
use crate::error::GameError;
use crate::messaging::{
    Action, ClientPackage, InteractPayload, MessageSender, MovePayload, Player, ServerResponse,
};
use crate::serializer::StateSerializer;
use factory::PlayerSpawn;
use crate::systems::{CombatSystem, InteractionSystem, MovementSystem, SkillSystem, System};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One game room with its own ECS world.
pub struct Session {
    id: Uuid,
    config: ServerConfig,
    store: Arc<EntityStore>,
    serializer: StateSerializer,
    sender: MessageSender,

    /// Inbound end handed out to the hub; the receiver is consumed by the
    /// message loop on start.
    message_tx: mpsc::Sender<ClientPackage>,
    message_rx: Mutex<Option<mpsc::Receiver<ClientPackage>>>,

    /// Player ID to entity ID, 1:1, mutated only under this lock.
    player_entities: RwLock<HashMap<Uuid, EntityId>>,

    movement_system: MovementSystem,
    interaction_system: InteractionSystem,
    combat_system: CombatSystem,
    skill_system: SkillSystem,

    running: AtomicBool,
    shutdown_tx: watch::Sender<bool>,

    /// Recently interacted targets, evicted by a delayed task per entry.
    target_cooldowns: Arc<Mutex<HashSet<EntityId>>>,
    /// Recently acting player entities, same eviction scheme, longer TTL.
    player_cooldowns: Arc<Mutex<HashSet<EntityId>>>,
}

impl Session {
    /// Creates a session in the *constructed* state. The creator is
    /// expected to call [`Session::start`] right away.
    pub fn new(config: ServerConfig, sender: MessageSender) -> Self {
        let (message_tx, message_rx) =
            mpsc::channel(config.gameplay.session_channel_capacity.max(1));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            id: Uuid::new_v4(),
            config,
            store: Arc::new(EntityStore::new()),
            serializer: StateSerializer::new(),
            sender,
            message_tx,
            message_rx: Mutex::new(Some(message_rx)),
            player_entities: RwLock::new(HashMap::new()),
            movement_system: MovementSystem::new(),
            interaction_system: InteractionSystem::new(),
            combat_system: CombatSystem::new(),
            skill_system: SkillSystem::new(),
            running: AtomicBool::new(false),
            shutdown_tx,
            target_cooldowns: Arc::new(Mutex::new(HashSet::new())),
            player_cooldowns: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Sender half of the session's inbound channel, used by the hub to
    /// forward game actions. The channel is buffered; a full buffer makes
    /// the hub's forward await, which is the intended backpressure point.
    pub fn message_channel(&self) -> mpsc::Sender<ClientPackage> {
        self.message_tx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Constructs a session and immediately starts its loops.
    pub fn spawn(config: ServerConfig, sender: MessageSender) -> Arc<Self> {
        let session = Arc::new(Session::new(config, sender));
        Arc::clone(&session).start();
        session
    }

    /// Starts the message loop and the tick loop. Idempotent: a second call
    /// is a no-op.
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let receiver = self.message_rx.lock().unwrap().take();
        let Some(receiver) = receiver else {
            self.running.store(false, Ordering::SeqCst);
            warn!("Session {} restarted after shutdown; ignoring", self.id);
            return;
        };

        info!(
            "🎮 Session {} running at {}ms per tick",
            self.id, self.config.tick_interval_ms
        );

        let session = Arc::clone(&self);
        let shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            session.run_message_loop(receiver, shutdown_rx).await;
        });

        let shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            self.run_tick_loop(shutdown_rx).await;
        });
    }

    /// Signals both loops to stop. Safe to call more than once; only the
    /// first call has an effect.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("🛑 Shutting down session {}", self.id);
        let _ = self.shutdown_tx.send(true);
    }

    /// Spawns a player entity with the standard loadout and records the
    /// player→entity mapping.
    ///
    /// Safe to call while the loops are running; the new entity becomes
    /// visible to systems on the next snapshot.
    pub fn add_player(&self, player_id: Uuid, username: &str) -> EntityId {
        let spawn = PlayerSpawn::new(player_id, username, self.config.gameplay.default_speed);
        let entity = factory::create_player_entity(&self.store, spawn);

        let mut players = self.player_entities.write().unwrap();
        players.insert(player_id, entity.id());
        debug!(
            "Player {} ({}) joined session {} as entity {}",
            player_id,
            username,
            self.id,
            entity.id()
        );
        entity.id()
    }

    /// Removes a player and tears their entity down immediately.
    ///
    /// Returns `false` if the player was not part of this session.
    pub fn remove_player(&self, player_id: Uuid) -> bool {
        let entity_id = {
            let mut players = self.player_entities.write().unwrap();
            players.remove(&player_id)
        };
        match entity_id {
            Some(entity_id) => {
                self.store.remove_entity(entity_id);
                debug!("Player {} left session {}", player_id, self.id);
                true
            }
            None => false,
        }
    }

    /// Places a closed door at `(x, y)`.
    pub fn add_door(&self, x: f64, y: f64) -> EntityId {
        factory::create_door_entity(&self.store, x, y).id()
    }

    pub fn player_count(&self) -> usize {
        self.player_entities.read().unwrap().len()
    }

    pub(crate) fn player_entity_id(&self, player_id: Uuid) -> Option<EntityId> {
        self.player_entities.read().unwrap().get(&player_id).copied()
    }

    /// The players currently in this session, for broadcasts.
    pub fn session_players(&self) -> Vec<Player> {
        let mapping: Vec<(Uuid, EntityId)> = {
            let players = self.player_entities.read().unwrap();
            players.iter().map(|(p, e)| (*p, *e)).collect()
        };

        let mut players = Vec::with_capacity(mapping.len());
        for (player_id, entity_id) in mapping {
            let Some(entity) = self.store.get_entity(entity_id) else {
                continue;
            };
            if let Some(Component::Player(p)) = entity.get_component(ComponentKind::Player) {
                players.push(Player {
                    id: player_id,
                    username: p.username,
                });
            }
        }
        players
    }

    async fn run_message_loop(
        self: Arc<Self>,
        mut receiver: mpsc::Receiver<ClientPackage>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                package = receiver.recv() => match package {
                    Some(package) => self.dispatch_package(package).await,
                    None => break,
                },
                _ = shutdown_rx.changed() => break,
            }
        }
        debug!("Session {} message loop exited", self.id);
    }

    async fn run_tick_loop(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        // First tick after one full period, like a wall-clock ticker.
        let period = Duration::from_millis(self.config.tick_interval_ms.max(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        let delta_time = self.config.tick_delta_seconds();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let entities = self.store.all_entities();
                    self.movement_system.update(delta_time, &entities);
                    self.interaction_system.update(delta_time, &entities);
                    self.combat_system.update(delta_time, &entities);
                    self.skill_system.update(delta_time, &entities);
                }
                _ = shutdown_rx.changed() => break,
            }
        }
        debug!("Session {} tick loop exited", self.id);
    }

    /// Classifies one inbound package and runs its handler. Errors are
    /// reported to the originating connection; the loop always continues.
    async fn dispatch_package(&self, package: ClientPackage) {
        let ClientPackage {
            message,
            connection_id,
        } = package;

        let Some(action) = Action::parse(&message.action) else {
            self.sender
                .respond_error(
                    connection_id,
                    &message.action,
                    &GameError::InvalidPayload(format!("unknown action '{}'", message.action)),
                )
                .await;
            return;
        };

        match action {
            Action::Move => {
                let payload = match message.parse_payload::<MovePayload>() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("Session {}: bad move payload: {}", self.id, e);
                        self.sender
                            .respond_error(connection_id, message.action.as_str(), &e)
                            .await;
                        return;
                    }
                };
                if let Err(e) = self.handle_move(payload.player_id, payload.vx, payload.vy) {
                    warn!("Session {}: move rejected: {}", self.id, e);
                    self.sender
                        .respond_error(connection_id, message.action.as_str(), &e)
                        .await;
                }
            }
            Action::Interact => {
                let payload = match message.parse_payload::<InteractPayload>() {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("Session {}: bad interact payload: {}", self.id, e);
                        self.sender
                            .respond_error(connection_id, message.action.as_str(), &e)
                            .await;
                        return;
                    }
                };
                match self.handle_interact(payload.player_id, payload.entity_id) {
                    Ok(is_open) => {
                        self.sender
                            .respond_success(
                                connection_id,
                                message.action.as_str(),
                                json!({
                                    "entity_id": payload.entity_id,
                                    "is_open": is_open,
                                }),
                            )
                            .await;
                        self.broadcast_state().await;
                    }
                    Err(e) => {
                        debug!("Session {}: interact rejected: {}", self.id, e);
                        self.sender
                            .respond_error(connection_id, message.action.as_str(), &e)
                            .await;
                    }
                }
            }
            other if other.is_game_action() => {
                // Declared on the wire but with no session handler yet.
                debug!(
                    "Session {}: ignoring unhandled game action '{}'",
                    self.id,
                    other.as_str()
                );
            }
            other => {
                self.sender
                    .respond_error(
                        connection_id,
                        other.as_str(),
                        &GameError::InvalidPayload(format!(
                            "action '{}' is not valid inside a session",
                            other.as_str()
                        )),
                    )
                    .await;
            }
        }
    }

    /// Applies a client move input to the player's Velocity component.
    ///
    /// Only the direction changes; speed is untouched. The new direction
    /// takes effect on the next tick, when the movement system reads it.
    pub(crate) fn handle_move(&self, player_id: Uuid, vx: f64, vy: f64) -> Result<(), GameError> {
        let entity_id = self
            .player_entity_id(player_id)
            .ok_or(GameError::PlayerNotFound(player_id))?;
        let entity = self
            .store
            .get_entity(entity_id)
            .ok_or(GameError::EntityNotFound(entity_id))?;

        let updated = entity.update_component(ComponentKind::Velocity, |c| {
            if let Component::Velocity(v) = c {
                v.vx = vx;
                v.vy = vy;
            }
        });
        if !updated {
            return Err(GameError::MissingComponent(
                entity_id,
                ComponentKind::Velocity,
            ));
        }
        Ok(())
    }

    /// Handles a player interacting with a target entity.
    ///
    /// All checks happen before any write: target classification, the
    /// cooldown caches, then the range check. On success a door's open
    /// state is toggled and both parties enter their cooldown caches.
    /// Returns the door's new open state, or `None` when the target is
    /// interactable but not a door.
    pub(crate) fn handle_interact(
        &self,
        player_id: Uuid,
        target_entity_id: EntityId,
    ) -> Result<Option<bool>, GameError> {
        let target = self
            .store
            .get_entity(target_entity_id)
            .ok_or(GameError::EntityNotFound(target_entity_id))?;

        let is_door = target.has_component(ComponentKind::Door);
        if !is_door && !target.has_component(ComponentKind::Interactable) {
            return Err(GameError::NotInteractable(target_entity_id));
        }

        let player_entity_id = self
            .player_entity_id(player_id)
            .ok_or(GameError::PlayerNotFound(player_id))?;

        {
            let targets = self.target_cooldowns.lock().unwrap();
            let players = self.player_cooldowns.lock().unwrap();
            if targets.contains(&target_entity_id) || players.contains(&player_entity_id) {
                return Err(GameError::RateLimited);
            }
        }

        let player_entity = self
            .store
            .get_entity(player_entity_id)
            .ok_or(GameError::EntityNotFound(player_entity_id))?;
        let player_transform = match player_entity.get_component(ComponentKind::Transform) {
            Some(Component::Transform(t)) => t,
            _ => {
                return Err(GameError::MissingComponent(
                    player_entity_id,
                    ComponentKind::Transform,
                ))
            }
        };
        let target_transform = match target.get_component(ComponentKind::Transform) {
            Some(Component::Transform(t)) => t,
            _ => {
                return Err(GameError::MissingComponent(
                    target_entity_id,
                    ComponentKind::Transform,
                ))
            }
        };

        if !within_distance(
            &player_transform,
            &target_transform,
            self.config.gameplay.interact_range,
        ) {
            return Err(GameError::OutOfRange);
        }

        let mut is_open = None;
        if is_door {
            let mut toggled_state = false;
            let toggled = target.update_component(ComponentKind::Openable, |c| {
                if let Component::Openable(o) = c {
                    o.is_open = !o.is_open;
                    toggled_state = o.is_open;
                }
            });
            if !toggled {
                return Err(GameError::MissingComponent(
                    target_entity_id,
                    ComponentKind::Openable,
                ));
            }
            is_open = Some(toggled_state);
        }

        self.cache_interaction(target_entity_id, player_entity_id);
        Ok(is_open)
    }

    /// Marks both parties of an interaction as recently used and schedules
    /// their delayed eviction. The target TTL is short; the player TTL is
    /// longer so one player cannot hop between doors faster than the
    /// cooldown.
    fn cache_interaction(&self, target_entity_id: EntityId, player_entity_id: EntityId) {
        self.target_cooldowns
            .lock()
            .unwrap()
            .insert(target_entity_id);
        self.player_cooldowns
            .lock()
            .unwrap()
            .insert(player_entity_id);

        let targets = Arc::clone(&self.target_cooldowns);
        let ttl = Duration::from_millis(self.config.gameplay.target_cooldown_ms);
        tokio::spawn(async move {
            sleep(ttl).await;
            targets.lock().unwrap().remove(&target_entity_id);
        });

        let players = Arc::clone(&self.player_cooldowns);
        let ttl = Duration::from_millis(self.config.gameplay.player_cooldown_ms);
        tokio::spawn(async move {
            sleep(ttl).await;
            players.lock().unwrap().remove(&player_entity_id);
        });
    }

    /// Serializes the current world and pushes it to every player in the
    /// room.
    pub(crate) async fn broadcast_state(&self) {
        let state = self
            .serializer
            .serialize(self.id, &self.store.all_entities());
        let payload = match serde_json::to_value(&state) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Session {}: failed to encode game state: {}", self.id, e);
                return;
            }
        };

        let players = self.session_players();
        let response = ServerResponse::success(Action::GameState.as_str(), payload);
        let failed = self.sender.broadcast_to_players(&players, &response).await;
        if failed > 0 {
            warn!(
                "Session {}: game state missed {} of {} players",
                self.id,
                failed,
                players.len()
            );
        }
    }
}

fn within_distance(a: &TransformComponent, b: &TransformComponent, range: f64) -> bool {
    let distance = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
    distance <= range
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("players", &self.player_count())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

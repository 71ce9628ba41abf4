//! The game session: owns all simulation state and drives the tick loop.
//!
//! One session is one match. All state is owned by the [`Session`] object
//! (never module globals), so any number of sessions run in parallel
//! sharing nothing but the read-only catalog. A session advances on a
//! single logical executor: one call to [`Session::tick`] runs the whole
//! pipeline below to completion, and the only suspension point is between
//! ticks.
//!
//! # Tick order
//!
//! 1. Drain client inputs (bounded per tick, oldest dropped first).
//! 2. Advance cooldowns, regen, effects, shields, combat timers; detect
//!    cast interruption.
//! 3. Fire due scheduled actions in trigger-time order.
//! 4. Champion commanded movement and attack targeting.
//! 5. Integrate motion, projectiles; zones tick.
//! 6. Rebuild the grid and resolve collisions.
//! 7. Death transitions, reward settlement, respawns, game-end check.
//! 8. Publish buffered events to sinks.
//! 9. Vision -> priority -> delta per client; enqueue outbound messages.
//! 10. Commit end-of-tick removals.
//!
//! # Failure model
//!
//! A panic inside one entity's input application or action execution is
//! caught; the entity is marked dead at end of tick and the loop
//! continues. Budget overruns are counted, never compensated by multi-step
//! catch-up.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use riftline_world::champion::{AbilitySlot, ChampionState, ModSource, StatModifier};
use riftline_world::entity::EntityId;
use riftline_world::ids::{ChampionId, ItemId, PlayerId};
use riftline_world::math::Vec2;
use riftline_world::motion::{MotionState, MovementIntent};
use riftline_world::records::{Damageable, EntityKind, EntityRecord, Team, WardState};
use riftline_world::rng::SessionRng;
use riftline_world::store::World;

use riftline_catalog::config::SessionConfig;
use riftline_catalog::map::BushLayout;
use riftline_catalog::Catalog;

use riftline_sim::ability;
use riftline_sim::collision;
use riftline_sim::damage;
use riftline_sim::death;
use riftline_sim::events::{EventBus, EventSink};
use riftline_sim::grid::SpatialGrid;
use riftline_sim::motion::{DirectPath, PathProvider};
use riftline_sim::projectile;
use riftline_sim::reward;
use riftline_sim::scheduler::{ActionScheduler, ScheduledAction, TargetSelection};
use riftline_sim::stats::StatSheet;
use riftline_sim::upkeep;

use riftline_net::delta::{build_update, ClientView};
use riftline_net::protocol::{ClientMessage, ClientPayload, ErrorCode, ServerMessage};
use riftline_net::vision::VisionSnapshot;

use crate::metrics::{SessionMetrics, TickTimings};
use crate::queues::{InputReceiver, OutboundEnvelope, OutboundSender};
use crate::SessionError;

/// Structure health pools by kind.
const TOWER_HEALTH: f64 = 2500.0;
const INHIBITOR_HEALTH: f64 = 2000.0;
const NEXUS_HEALTH: f64 = 3200.0;
const STRUCTURE_ARMOR: f64 = 60.0;

// ---------------------------------------------------------------------------
// Session phases and client slots
// ---------------------------------------------------------------------------

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionPhase {
    /// Players may join; the clock is not running.
    Lobby,
    /// The match is live.
    Running,
    /// The match is over; ticks are no-ops.
    Ended {
        /// The winning team, `None` on abandonment.
        winner: Option<Team>,
    },
}

/// Connection state for one player slot.
#[derive(Debug)]
struct ClientSlot {
    view: ClientView,
    connected: bool,
    /// Seconds left before a disconnected player is removed from the
    /// simulation.
    grace_remaining: f64,
    /// Seconds of input silence before the player counts as AFK.
    afk_remaining: f64,
    afk: bool,
}

// ---------------------------------------------------------------------------
// SessionSetup
// ---------------------------------------------------------------------------

/// Everything a session needs at construction. Event sinks register here;
/// they cannot be added later.
pub struct SessionSetup {
    /// The shared read-only catalog.
    pub catalog: Arc<Catalog>,
    /// Configuration overrides, fixed for the session's lifetime.
    pub config: SessionConfig,
    /// The match seed; all randomness derives from it.
    pub seed: u64,
    /// Receiver half of the transport input queue.
    pub inputs: InputReceiver,
    /// Sender half of the outbound queue.
    pub outbound: OutboundSender,
    /// Event subscribers.
    pub sinks: Vec<Box<dyn EventSink>>,
    /// The pathing provider. `None` uses straight-line paths.
    pub path_provider: Option<Box<dyn PathProvider + Send>>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One running match.
pub struct Session {
    catalog: Arc<Catalog>,
    config: SessionConfig,
    world: World,
    grid: SpatialGrid,
    scheduler: ActionScheduler,
    events: EventBus,
    rng: SessionRng,
    bushes: BushLayout,
    clients: BTreeMap<PlayerId, ClientSlot>,
    path_provider: Box<dyn PathProvider + Send>,
    inputs: InputReceiver,
    outbound: OutboundSender,
    phase: SessionPhase,
    tick: u64,
    metrics: SessionMetrics,
    /// Entities whose step panicked this tick; marked dead in step 7.
    poisoned: Vec<EntityId>,
}

impl Session {
    /// Build a session. Catalog or configuration problems fail session
    /// start; they can never surface mid-tick.
    pub fn new(setup: SessionSetup) -> Result<Self, SessionError> {
        setup.config.validate()?;
        setup.catalog.validate()?;
        let bushes = setup.catalog.map.bush_layout(setup.seed);
        let grid = SpatialGrid::new(setup.config.grid_cell_size);
        Ok(Self {
            rng: SessionRng::new(setup.seed),
            bushes,
            grid,
            world: World::new(),
            scheduler: ActionScheduler::new(),
            events: EventBus::new(setup.sinks),
            clients: BTreeMap::new(),
            path_provider: setup
                .path_provider
                .unwrap_or_else(|| Box::new(DirectPath)),
            inputs: setup.inputs,
            outbound: setup.outbound,
            phase: SessionPhase::Lobby,
            tick: 0,
            metrics: SessionMetrics::default(),
            poisoned: Vec::new(),
            config: setup.config,
            catalog: setup.catalog,
        })
    }

    // -- accessors ----------------------------------------------------------

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulation time in seconds, computed (not accumulated) to avoid
    /// floating-point drift.
    pub fn sim_time(&self) -> f64 {
        self.tick as f64 * self.config.tick_dt()
    }

    /// Read-only world access.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Session metrics.
    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The derived bush layout (shared with rendering-side consumers).
    pub fn bushes(&self) -> &BushLayout {
        &self.bushes
    }

    /// The champion entity controlled by a player.
    pub fn champion_of(&self, player: PlayerId) -> Option<EntityId> {
        self.clients.get(&player).and_then(|slot| slot.view.champion)
    }

    pub(crate) fn parts_for_snapshot(
        &self,
    ) -> (&World, &ActionScheduler, u64, u64) {
        (&self.world, &self.scheduler, self.tick, self.rng.seed())
    }

    pub(crate) fn restore_parts(
        &mut self,
        world: World,
        scheduler: ActionScheduler,
        tick: u64,
    ) {
        self.world = world;
        self.scheduler = scheduler;
        self.tick = tick;
        self.grid.rebuild(&self.world);
    }

    // -- setup --------------------------------------------------------------

    /// Spawn points derive from the first lane's endpoints, falling back to
    /// the bounds corners on pathless maps.
    fn spawn_point(&self, team: Team) -> Vec2 {
        let bounds = &self.catalog.map.bounds;
        let lane = self.catalog.map.lanes.first();
        match team {
            Team::Blue => lane
                .and_then(|l| l.waypoints.first().copied())
                .unwrap_or(bounds.min),
            Team::Red => lane
                .and_then(|l| l.waypoints.last().copied())
                .unwrap_or(bounds.max),
            Team::Neutral => Vec2::ZERO,
        }
    }

    /// Add a player and spawn their champion at the team spawn.
    pub fn add_player(
        &mut self,
        player: PlayerId,
        team: Team,
        champion: ChampionId,
    ) -> Result<EntityId, SessionError> {
        let def = self.catalog.champion(champion)?;
        let mut state = ChampionState::new(champion, def.abilities, def.passive);
        let sheet = StatSheet::derive(&state, def);
        state.resource = sheet.max_resource;

        let mut record = EntityRecord::new(
            EntityKind::Champion,
            team,
            self.spawn_point(team),
            def.collider,
        );
        record.mass = 60.0;
        record.sight_range = self.config.sight_champion;
        record.damageable = Some(Damageable::new(
            sheet.max_health,
            sheet.armor,
            sheet.magic_resist,
        ));
        record.champion = Some(Box::new(state));
        record.motion = Some(MotionState::default());
        let entity = self.world.insert(record);

        let mut view = ClientView::new(player, team);
        view.champion = Some(entity);
        self.clients.insert(
            player,
            ClientSlot {
                view,
                connected: true,
                grace_remaining: self.config.reconnect_grace_s,
                afk_remaining: self.config.afk_timeout_s,
                afk: false,
            },
        );
        self.grid.rebuild(&self.world);
        Ok(entity)
    }

    /// Spawn a structure. Infinite mass; destroying a nexus ends the game.
    pub fn spawn_structure(&mut self, kind: EntityKind, team: Team, position: Vec2) -> EntityId {
        debug_assert!(kind.is_structure());
        let health = match kind {
            EntityKind::Nexus => NEXUS_HEALTH,
            EntityKind::Inhibitor => INHIBITOR_HEALTH,
            _ => TOWER_HEALTH,
        };
        let mut record = EntityRecord::new(
            kind,
            team,
            position,
            riftline_world::shape::Collider::rect(80.0, 80.0),
        );
        record.sight_range = self.config.sight_champion;
        record.damageable = Some(Damageable::new(health, STRUCTURE_ARMOR, STRUCTURE_ARMOR));
        let id = self.world.insert(record);
        self.grid.rebuild(&self.world);
        id
    }

    /// Spawn a lane minion walking the first lane.
    pub fn spawn_minion(&mut self, team: Team, position: Vec2) -> EntityId {
        let mut record = EntityRecord::new(
            EntityKind::Minion,
            team,
            position,
            riftline_world::shape::Collider::circle(20.0),
        );
        record.mass = 20.0;
        record.sight_range = self.config.sight_champion;
        record.damageable = Some(Damageable::new(480.0, 10.0, 10.0));
        let mut motion = MotionState {
            base_speed: 240.0,
            ..Default::default()
        };
        let goal = match team {
            Team::Blue => self.spawn_point(Team::Red),
            _ => self.spawn_point(Team::Blue),
        };
        motion.intent = MovementIntent::AttackMoveTo(goal);
        record.motion = Some(motion);
        let id = self.world.insert(record);
        self.grid.rebuild(&self.world);
        id
    }

    /// Start the match: announce and send every client a full resync.
    pub fn start(&mut self) {
        if self.phase != SessionPhase::Lobby {
            return;
        }
        self.phase = SessionPhase::Running;
        info!(seed = self.rng.seed(), "session started");
        self.broadcast(ServerMessage::GameStart { tick: self.tick });
        let players: Vec<PlayerId> = self.clients.keys().copied().collect();
        for player in players {
            self.send_full_state(player);
        }
    }

    // -- messaging ----------------------------------------------------------

    fn send_to(&mut self, player: PlayerId, message: ServerMessage) {
        self.metrics.messages_sent += 1;
        if self
            .outbound
            .send(OutboundEnvelope { player, message })
            .is_err()
        {
            warn!(player = %player, "outbound queue closed; dropping message");
        }
    }

    fn broadcast(&mut self, message: ServerMessage) {
        let players: Vec<PlayerId> = self.clients.keys().copied().collect();
        for player in players {
            self.send_to(player, message.clone());
        }
    }

    fn send_full_state(&mut self, player: PlayerId) {
        let vision = VisionSnapshot::compute(&self.world, &self.grid, &self.bushes, &self.config);
        let Some(slot) = self.clients.get_mut(&player) else {
            return;
        };
        slot.view.reset_baselines();
        let visible = vision.for_team(slot.view.team).clone();
        let update = build_update(
            &self.world,
            &visible,
            &[],
            &mut slot.view,
            &self.config,
            self.tick,
        );
        let config_json = serde_json::to_value(&self.config).unwrap_or_default();
        self.send_to(
            player,
            ServerMessage::FullState {
                tick: self.tick,
                player,
                update,
                config: config_json,
            },
        );
    }

    // -- connection lifecycle ----------------------------------------------

    /// The transport lost this client. The champion stays in the
    /// simulation until the grace period runs out.
    pub fn disconnect(&mut self, player: PlayerId) {
        if let Some(slot) = self.clients.get_mut(&player) {
            slot.connected = false;
            slot.grace_remaining = self.config.reconnect_grace_s;
            info!(player = %player, "client disconnected; grace timer started");
        }
    }

    /// The client came back inside the grace window. Sends a full resync.
    pub fn reconnect(&mut self, player: PlayerId) -> bool {
        let Some(slot) = self.clients.get_mut(&player) else {
            return false;
        };
        slot.connected = true;
        slot.grace_remaining = self.config.reconnect_grace_s;
        self.send_full_state(player);
        true
    }

    /// End the session: discard pending work and flush a terminal event.
    pub fn end(&mut self, winner: Option<Team>) {
        if matches!(self.phase, SessionPhase::Ended { .. }) {
            return;
        }
        info!(?winner, tick = self.tick, "session ended");
        self.scheduler.clear();
        self.phase = SessionPhase::Ended { winner };
        self.broadcast(ServerMessage::GameEnd {
            winner,
            tick: self.tick,
        });
    }

    // -- the tick -----------------------------------------------------------

    /// Run one simulation tick to completion.
    pub fn tick(&mut self) {
        if self.phase != SessionPhase::Running {
            return;
        }
        let tick_start = Instant::now();
        let dt = self.config.tick_dt();
        // The time this tick advances the simulation to.
        let now = (self.tick + 1) as f64 * dt;
        let mut timings = TickTimings::default();

        // 1. Inputs.
        let phase_start = Instant::now();
        self.drain_inputs();
        self.tick_connection_timers(dt);
        timings.inputs = phase_start.elapsed();

        // 2. Timers, effects, interruption detection.
        let phase_start = Instant::now();
        let upkeep = upkeep::advance_timers(&mut self.world, &self.catalog, &self.config, dt);
        for periodic in upkeep.periodic {
            if let Some(template) = periodic.damage {
                damage::deal_damage(
                    &mut self.world,
                    &self.catalog,
                    &self.config,
                    &mut self.events,
                    periodic.source,
                    periodic.target,
                    template,
                    damage::Penetration::default(),
                    false,
                    now,
                );
            }
            if let Some(amount) = periodic.heal {
                damage::heal(&mut self.world, periodic.target, amount);
            }
        }
        for champion in upkeep.completed_recalls {
            let home = self
                .world
                .get(champion)
                .map(|r| self.spawn_point(r.team));
            if let (Some(record), Some(home)) = (self.world.get_mut(champion), home) {
                record.position = home;
                if let Some(motion) = record.motion.as_mut() {
                    motion.clear_command();
                }
            }
        }
        ability::cancel_interrupted(&mut self.world, &self.catalog, &mut self.scheduler);

        // 3. Fire due scheduled actions.
        let mut due: Vec<ScheduledAction> = Vec::new();
        self.scheduler.advance_to(now, |action| due.push(action.clone()));
        for action in &due {
            let entity = action.entity;
            let result = catch_unwind(AssertUnwindSafe(|| {
                ability::execute_actions(
                    &mut self.world,
                    &self.catalog,
                    &self.config,
                    &self.grid,
                    &mut self.events,
                    &mut self.rng,
                    std::slice::from_ref(action),
                    now,
                );
            }));
            if result.is_err() {
                error!(entity = %entity, "action execution panicked; marking entity dead");
                self.metrics.caught_panics += 1;
                self.poisoned.push(entity);
            }
        }

        // 4. Attack targeting.
        ability::drive_basic_attacks(&mut self.world, &self.catalog, &mut self.scheduler, now);
        timings.simulation = phase_start.elapsed();

        // 5. Motion integration; projectiles and zones.
        let phase_start = Instant::now();
        riftline_sim::motion::drive(
            &mut self.world,
            &self.catalog,
            self.path_provider.as_ref(),
            &self.catalog.map.bounds,
            dt,
        );
        projectile::advance_projectiles(
            &mut self.world,
            &self.catalog,
            &self.config,
            &self.grid,
            &mut self.events,
            dt,
            now,
        );
        projectile::advance_zones(
            &mut self.world,
            &self.catalog,
            &self.config,
            &self.grid,
            &mut self.events,
            dt,
            now,
        );

        // 6. Grid rebuild and collision resolution.
        self.grid.rebuild(&self.world);
        let report = collision::resolve(&mut self.world, &self.grid, &mut self.rng);
        self.metrics.collisions_resolved += report.resolved as u64;
        self.metrics.clamped_positions += report.clamped as u64;
        timings.physics = phase_start.elapsed();

        // 7. Deaths, rewards, respawns, game end.
        for entity in std::mem::take(&mut self.poisoned) {
            if let Some(record) = self.world.get_mut(entity) {
                record.dead = true;
            }
        }
        death::process_deaths(
            &mut self.world,
            &self.catalog,
            &mut self.scheduler,
            &mut self.events,
            &self.config,
            now,
        );
        reward::settle(
            &mut self.world,
            &self.catalog,
            &self.config,
            &mut self.events,
            now,
        );
        let fallen_nexus: Option<Team> = self
            .world
            .iter()
            .find(|r| r.kind == EntityKind::Nexus && r.dead)
            .map(|r| r.team);
        let blue_spawn = self.spawn_point(Team::Blue);
        let red_spawn = self.spawn_point(Team::Red);
        death::process_respawns(&mut self.world, &self.catalog, dt, |team| match team {
            Team::Blue => blue_spawn,
            _ => red_spawn,
        });

        // 8. Publish buffered events.
        let published = self.events.flush(self.tick);
        self.metrics.events_published += published.len() as u64;

        // 9. Per-client delivery: vision once per team, then priority and
        // delta per client.
        let phase_start = Instant::now();
        let vision = VisionSnapshot::compute(&self.world, &self.grid, &self.bushes, &self.config);
        let next_tick = self.tick + 1;
        let mut updates = Vec::new();
        for (player, slot) in self.clients.iter_mut() {
            if !slot.connected {
                continue;
            }
            let visible = vision.for_team(slot.view.team);
            let update = build_update(
                &self.world,
                visible,
                &published,
                &mut slot.view,
                &self.config,
                next_tick,
            );
            updates.push((*player, ServerMessage::StateUpdate(update)));
        }
        for (player, message) in updates {
            self.send_to(player, message);
        }
        timings.delivery = phase_start.elapsed();

        // 10. Commit removals and close out the tick.
        self.world.commit_removals();
        self.tick += 1;
        timings.total = tick_start.elapsed();
        let budget = Duration::from_secs_f64(dt);
        if timings.total > budget {
            warn!(
                tick = self.tick,
                elapsed_ms = timings.total.as_millis() as u64,
                "tick exceeded budget; absorbing lag"
            );
        }
        self.metrics.record_tick(timings, budget);

        if let Some(lost) = fallen_nexus {
            self.end(lost.opponent());
        }
    }

    /// Run `count` ticks back to back.
    pub fn run_ticks(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    // -- inputs -------------------------------------------------------------

    fn drain_inputs(&mut self) {
        let mut per_client: BTreeMap<PlayerId, Vec<ClientMessage>> = BTreeMap::new();
        for envelope in self.inputs.try_iter() {
            per_client
                .entry(envelope.player)
                .or_default()
                .push(envelope.message);
        }

        for (player, mut messages) in per_client {
            if !self.clients.contains_key(&player) {
                debug!(player = %player, "input from unknown player dropped");
                continue;
            }
            // Bounded drain: drop oldest first so a backed-up client cannot
            // amplify work.
            if messages.len() > self.config.max_inputs_per_tick {
                let dropped = messages.len() - self.config.max_inputs_per_tick;
                messages.drain(..dropped);
                self.metrics.dropped_inputs += dropped as u64;
                warn!(player = %player, dropped, "input queue over budget; dropped oldest");
            }
            for message in messages {
                let Some(slot) = self.clients.get_mut(&player) else {
                    break;
                };
                if !slot.view.sequence.accept(message.sequence) {
                    self.metrics.rejected_sequences += 1;
                    continue;
                }
                slot.afk_remaining = self.config.afk_timeout_s;
                slot.afk = false;

                let entity = slot.view.champion;
                let result = catch_unwind(AssertUnwindSafe(|| {
                    self.apply_input(player, &message);
                }));
                if result.is_err() {
                    error!(player = %player, "input application panicked");
                    self.metrics.caught_panics += 1;
                    if let Some(entity) = entity {
                        self.poisoned.push(entity);
                    }
                }
            }
        }
    }

    fn apply_input(&mut self, player: PlayerId, message: &ClientMessage) {
        let Some(champion) = self.champion_of(player) else {
            return;
        };
        let now = self.sim_time();
        match &message.payload {
            ClientPayload::Move(point) | ClientPayload::AttackMove(point) => {
                if !point.is_finite() {
                    self.send_error(player, "non-finite move target");
                    return;
                }
                let goal = self.catalog.map.bounds.clamp(*point);
                let attack = matches!(&message.payload, ClientPayload::AttackMove(_));
                if let Some(record) = self.world.get_mut(champion) {
                    if record.dead {
                        return;
                    }
                    if let Some(champ) = record.champion.as_deref_mut() {
                        champ.recall_remaining = None;
                    }
                    if let Some(motion) = record.motion.as_mut() {
                        motion.intent = if attack {
                            MovementIntent::AttackMoveTo(goal)
                        } else {
                            MovementIntent::MoveTo(goal)
                        };
                        motion.waypoints.clear();
                        motion.path_goal = None;
                    }
                }
            }
            ClientPayload::TargetUnit(target) => {
                let valid = self
                    .world
                    .get(*target)
                    .map(|t| !t.dead)
                    .unwrap_or(false);
                if !valid {
                    self.send_error(player, "target does not exist");
                    return;
                }
                if let Some(record) = self.world.get_mut(champion) {
                    if let Some(champ) = record.champion.as_deref_mut() {
                        champ.recall_remaining = None;
                    }
                    if let Some(motion) = record.motion.as_mut() {
                        motion.intent = MovementIntent::AttackTarget(*target);
                        motion.waypoints.clear();
                        motion.path_goal = None;
                    }
                }
            }
            ClientPayload::Stop => {
                if let Some(motion) = self
                    .world
                    .get_mut(champion)
                    .and_then(|r| r.motion.as_mut())
                {
                    motion.clear_command();
                }
            }
            ClientPayload::Ability {
                slot,
                target_unit,
                target_point,
            } => {
                let target = match (target_unit, target_point) {
                    (Some(unit), _) => TargetSelection::Unit(*unit),
                    (None, Some(point)) => TargetSelection::Point(*point),
                    (None, None) => TargetSelection::None,
                };
                // Cast refusals are structured results, not errors; the
                // client UI predicted wrong, nothing more.
                if let Err(reason) = ability::cast(
                    &mut self.world,
                    &self.catalog,
                    &mut self.scheduler,
                    &mut self.events,
                    champion,
                    *slot,
                    target,
                    now,
                ) {
                    debug!(player = %player, ?reason, "cast refused");
                }
            }
            ClientPayload::LevelUp { slot } => {
                self.apply_level_up(player, champion, *slot);
            }
            ClientPayload::BuyItem { item } => {
                self.apply_buy(player, champion, *item);
            }
            ClientPayload::SellItem { slot } => {
                self.apply_sell(player, champion, *slot);
            }
            ClientPayload::Recall => {
                if let Some(champ) = self
                    .world
                    .get_mut(champion)
                    .filter(|r| !r.dead)
                    .and_then(|r| r.champion.as_deref_mut())
                {
                    champ.recall_remaining = Some(self.config.recall_duration_s);
                }
            }
            ClientPayload::Ping { .. } => {
                // Map pings double as latency probes.
                let server_time = self.sim_time();
                self.send_to(
                    player,
                    ServerMessage::Pong {
                        client_time: message.client_time,
                        server_time,
                    },
                );
            }
            ClientPayload::Chat { text } => {
                debug!(player = %player, len = text.len(), "chat relayed by transport");
            }
            ClientPayload::PlaceWard { position } => {
                self.apply_place_ward(player, champion, *position);
            }
        }
    }

    fn apply_level_up(&mut self, player: PlayerId, champion: EntityId, slot: AbilitySlot) {
        let Some(state) = self
            .world
            .get(champion)
            .and_then(|r| r.champion.as_deref())
        else {
            return;
        };
        let level = state.level;
        let total_ranks: u8 = state.slots.iter().map(|s| s.rank).sum();
        let slot_state = state.slot(slot);
        let max_rank = self
            .catalog
            .ability(slot_state.ability)
            .map(|d| d.max_rank)
            .unwrap_or(0);

        if slot_state.rank >= max_rank || total_ranks >= level {
            self.send_error(player, "cannot rank that slot");
            return;
        }
        if let Some(state) = self
            .world
            .get_mut(champion)
            .and_then(|r| r.champion.as_deref_mut())
        {
            state.slot_mut(slot).rank += 1;
        }
    }

    fn apply_buy(&mut self, player: PlayerId, champion: EntityId, item: ItemId) {
        let Ok(def) = self.catalog.item(item) else {
            self.send_error(player, "unknown item");
            return;
        };
        let def = def.clone();
        let Some(state) = self
            .world
            .get_mut(champion)
            .and_then(|r| r.champion.as_deref_mut())
        else {
            return;
        };
        // One copy of each item; selling removes every modifier from the
        // item id, so duplicates would not stack correctly.
        if state.inventory.iter().flatten().any(|&owned| owned == item) {
            self.send_error(player, "item already owned");
            return;
        }
        let Some(slot) = state.free_item_slot() else {
            self.send_error(player, "inventory full");
            return;
        };
        if state.gold < def.cost {
            self.send_error(player, "not enough gold");
            return;
        }
        state.gold -= def.cost;
        state.inventory[slot] = Some(item);
        for template in &def.modifiers {
            state.modifiers.push(StatModifier {
                stat: template.stat,
                flat: template.flat,
                percent: template.percent,
                source: ModSource::Item(item),
            });
        }
    }

    fn apply_sell(&mut self, player: PlayerId, champion: EntityId, slot: usize) {
        let Some(state) = self
            .world
            .get_mut(champion)
            .and_then(|r| r.champion.as_deref_mut())
        else {
            return;
        };
        let Some(item) = state
            .inventory
            .get_mut(slot)
            .and_then(|s| s.take())
        else {
            self.send_error(player, "empty inventory slot");
            return;
        };
        state.remove_modifiers_from(ModSource::Item(item));
        let refund = self
            .catalog
            .item(item)
            .map(|d| d.sell_value)
            .unwrap_or(0);
        state.gold = state.gold.saturating_add(refund);
    }

    fn apply_place_ward(&mut self, player: PlayerId, champion: EntityId, position: Vec2) {
        let Some(record) = self.world.get(champion) else {
            return;
        };
        if record.dead {
            return;
        }
        if record.position.distance(position) > self.config.sight_ward {
            self.send_error(player, "ward placement out of reach");
            return;
        }
        let team = record.team;
        let live_wards = self
            .world
            .iter()
            .filter(|r| {
                r.kind == EntityKind::Ward
                    && !r.dead
                    && r.ward.map(|w| w.placed_by) == Some(player)
            })
            .count();
        if live_wards >= self.config.max_wards_per_player as usize {
            self.send_error(player, "ward limit reached");
            return;
        }
        let mut ward = EntityRecord::new(
            EntityKind::Ward,
            team,
            position,
            riftline_world::shape::Collider::circle(10.0),
        );
        ward.sight_range = self.config.sight_ward;
        ward.owner = Some(champion);
        ward.damageable = Some(Damageable::new(3.0, 0.0, 0.0));
        ward.ward = Some(WardState {
            remaining: self.config.ward_duration_s,
            placed_by: player,
        });
        self.world.insert(ward);
    }

    fn send_error(&mut self, player: PlayerId, text: &str) {
        self.send_to(
            player,
            ServerMessage::Error {
                code: ErrorCode::InvalidInput,
                text: text.to_owned(),
            },
        );
    }

    // -- connection upkeep ---------------------------------------------------

    fn tick_connection_timers(&mut self, dt: f64) {
        let mut expired: Vec<PlayerId> = Vec::new();
        for (player, slot) in self.clients.iter_mut() {
            if slot.connected {
                slot.afk_remaining -= dt;
                if slot.afk_remaining <= 0.0 && !slot.afk {
                    slot.afk = true;
                    info!(player = %player, "player is AFK");
                }
            } else {
                slot.grace_remaining -= dt;
                if slot.grace_remaining <= 0.0 {
                    expired.push(*player);
                }
            }
        }
        for player in expired {
            info!(player = %player, "reconnect grace expired; removing champion");
            if let Some(slot) = self.clients.get_mut(&player) {
                if let Some(champion) = slot.view.champion.take() {
                    self.world.mark_removed(champion);
                }
            }
        }
        // Everyone absent past grace: abandon the session.
        if !self.clients.is_empty()
            && self
                .clients
                .values()
                .all(|slot| !slot.connected && slot.view.champion.is_none())
        {
            self.end(None);
        }

        // Wards and zones burn down their lifetimes here; they are not
        // champions and have no other clock.
        for id in self.world.ids() {
            let Some(record) = self.world.get_mut(id) else { continue };
            if let Some(ward) = record.ward.as_mut() {
                ward.remaining -= dt;
                if ward.remaining <= 0.0 {
                    self.world.mark_removed(id);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use riftline_catalog::content::{demo_catalog, PYRE, WARDEN};
    use crate::queues::{input_queue, outbound_queue, InputSender, OutboundReceiver};

    fn session() -> (Session, InputSender, OutboundReceiver) {
        let (tx, rx) = input_queue();
        let (out_tx, out_rx) = outbound_queue();
        let session = Session::new(SessionSetup {
            catalog: Arc::new(demo_catalog()),
            config: SessionConfig::default(),
            seed: 42,
            inputs: rx,
            outbound: out_tx,
            sinks: Vec::new(),
            path_provider: None,
        })
        .unwrap();
        (session, tx, out_rx)
    }

    fn msg(seq: u32, payload: ClientPayload) -> ClientMessage {
        ClientMessage {
            sequence: seq,
            client_time: 0.0,
            payload,
        }
    }

    #[test]
    fn players_spawn_at_their_team_base() {
        let (mut session, _tx, _rx) = session();
        let blue = session
            .add_player(PlayerId(1), Team::Blue, WARDEN)
            .unwrap();
        let red = session.add_player(PlayerId(2), Team::Red, PYRE).unwrap();

        assert_eq!(
            session.world().get(blue).unwrap().position,
            Vec2::new(-3500.0, -3500.0)
        );
        assert_eq!(
            session.world().get(red).unwrap().position,
            Vec2::new(3500.0, 3500.0)
        );
    }

    #[test]
    fn start_broadcasts_game_start_and_full_state() {
        let (mut session, _tx, rx) = session();
        session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
        session.start();

        let messages: Vec<_> = rx.try_iter().collect();
        assert!(messages
            .iter()
            .any(|e| matches!(e.message, ServerMessage::GameStart { .. })));
        assert!(messages
            .iter()
            .any(|e| matches!(e.message, ServerMessage::FullState { .. })));
    }

    #[test]
    fn move_input_drives_the_champion() {
        let (mut session, tx, _rx) = session();
        let champion = session
            .add_player(PlayerId(1), Team::Blue, WARDEN)
            .unwrap();
        session.start();

        tx.send(crate::queues::InputEnvelope {
            player: PlayerId(1),
            message: msg(1, ClientPayload::Move(Vec2::new(0.0, 0.0))),
        })
        .unwrap();

        let before = session.world().get(champion).unwrap().position;
        session.run_ticks(10);
        let after = session.world().get(champion).unwrap().position;
        assert!(after.distance(Vec2::ZERO) < before.distance(Vec2::ZERO));
    }

    #[test]
    fn duplicate_sequences_are_rejected() {
        let (mut session, tx, _rx) = session();
        session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
        session.start();

        for _ in 0..3 {
            tx.send(crate::queues::InputEnvelope {
                player: PlayerId(1),
                message: msg(5, ClientPayload::Stop),
            })
            .unwrap();
        }
        session.tick();
        assert_eq!(session.metrics().rejected_sequences, 2);
    }

    #[test]
    fn input_flood_drops_oldest() {
        let (mut session, tx, _rx) = session();
        session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
        session.start();

        let flood = session.config().max_inputs_per_tick + 10;
        for i in 0..flood {
            tx.send(crate::queues::InputEnvelope {
                player: PlayerId(1),
                message: msg(i as u32 + 1, ClientPayload::Stop),
            })
            .unwrap();
        }
        session.tick();
        assert_eq!(session.metrics().dropped_inputs, 10);
    }

    #[test]
    fn state_updates_flow_every_tick() {
        let (mut session, _tx, rx) = session();
        session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
        session.start();
        let _ = rx.try_iter().count();

        session.run_ticks(3);
        let updates = rx
            .try_iter()
            .filter(|e| matches!(e.message, ServerMessage::StateUpdate(_)))
            .count();
        assert_eq!(updates, 3);
    }

    #[test]
    fn update_ticks_are_strictly_increasing() {
        let (mut session, _tx, rx) = session();
        session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
        session.start();
        let _ = rx.try_iter().count();

        session.run_ticks(5);
        let ticks: Vec<u64> = rx
            .try_iter()
            .filter_map(|e| match e.message {
                ServerMessage::StateUpdate(update) => Some(update.tick),
                _ => None,
            })
            .collect();
        assert_eq!(ticks.len(), 5);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn nexus_fall_ends_the_game() {
        let (mut session, _tx, rx) = session();
        session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
        let nexus = session.spawn_structure(EntityKind::Nexus, Team::Red, Vec2::new(3000.0, 3000.0));
        session.start();

        session
            .world_mut()
            .get_mut(nexus)
            .unwrap()
            .damageable
            .as_mut()
            .unwrap()
            .health = 0.0;
        session.tick();

        assert_eq!(
            session.phase(),
            SessionPhase::Ended {
                winner: Some(Team::Blue)
            }
        );
        assert!(rx
            .try_iter()
            .any(|e| matches!(e.message, ServerMessage::GameEnd { winner: Some(Team::Blue), .. })));
        // Ticks after the end are no-ops.
        let t = session.tick_count();
        session.run_ticks(3);
        assert_eq!(session.tick_count(), t);
    }

    #[test]
    fn grace_expiry_removes_the_champion_and_abandons() {
        let mut config = SessionConfig::default();
        config.reconnect_grace_s = 0.5;
        let (_tx, rx) = input_queue();
        let (out_tx, _out_rx) = outbound_queue();
        let mut session = Session::new(SessionSetup {
            catalog: Arc::new(demo_catalog()),
            config,
            seed: 1,
            inputs: rx,
            outbound: out_tx,
            sinks: Vec::new(),
            path_provider: None,
        })
        .unwrap();

        let champion = session
            .add_player(PlayerId(1), Team::Blue, WARDEN)
            .unwrap();
        session.start();
        session.disconnect(PlayerId(1));

        // 0.5s grace at 125 Hz is 63 ticks.
        session.run_ticks(80);
        assert!(session.world().get(champion).is_none());
        assert!(matches!(session.phase(), SessionPhase::Ended { winner: None }));
    }

    #[test]
    fn ward_cap_is_enforced() {
        let (mut session, tx, rx) = session();
        session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
        session.start();
        let _ = rx.try_iter().count();

        for i in 0..4u32 {
            tx.send(crate::queues::InputEnvelope {
                player: PlayerId(1),
                message: msg(
                    i + 1,
                    ClientPayload::PlaceWard {
                        position: Vec2::new(-3450.0 - i as f64, -3500.0),
                    },
                ),
            })
            .unwrap();
        }
        session.tick();

        let wards = session
            .world()
            .iter()
            .filter(|r| r.kind == EntityKind::Ward)
            .count();
        assert_eq!(wards, 3);
        assert!(rx
            .try_iter()
            .any(|e| matches!(e.message, ServerMessage::Error { .. })));
    }

    #[test]
    fn buy_and_sell_round_trip() {
        let (mut session, tx, _rx) = session();
        let champion = session
            .add_player(PlayerId(1), Team::Blue, WARDEN)
            .unwrap();
        session.start();
        session
            .world_mut()
            .get_mut(champion)
            .unwrap()
            .champion
            .as_deref_mut()
            .unwrap()
            .gold = 1000;

        tx.send(crate::queues::InputEnvelope {
            player: PlayerId(1),
            message: msg(
                1,
                ClientPayload::BuyItem {
                    item: riftline_catalog::content::LONGSWORD,
                },
            ),
        })
        .unwrap();
        session.tick();

        {
            let state = session
                .world()
                .get(champion)
                .unwrap()
                .champion
                .as_deref()
                .unwrap();
            assert_eq!(state.gold, 650);
            assert_eq!(state.inventory[0], Some(riftline_catalog::content::LONGSWORD));
            assert_eq!(state.modifiers.len(), 1);
        }

        tx.send(crate::queues::InputEnvelope {
            player: PlayerId(1),
            message: msg(2, ClientPayload::SellItem { slot: 0 }),
        })
        .unwrap();
        session.tick();

        let state = session
            .world()
            .get(champion)
            .unwrap()
            .champion
            .as_deref()
            .unwrap();
        assert_eq!(state.inventory[0], None);
        assert!(state.modifiers.is_empty());
        assert_eq!(state.gold, 650 + 245);
    }
}

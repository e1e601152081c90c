//! Run lifecycle and frame loop
//!
//! [`Game`] owns one run: the world, the player's build and stats, the shop,
//! and the boundary state for audio, rendering and the oracle. The host
//! calls [`Game::on_frame`] from its display callback and forwards discrete
//! input through [`Game::handle`].

use glam::Mat4;

use crate::advisor::{AdvisoryBoard, AdvisoryKind, AdvisoryRequest, AdvisoryResponse, RunId};
use crate::audio::{CuePlayer, Tone};
use crate::config::SimConfig;
use crate::progression::{GameStats, PurchaseRefusal, Shop};
use crate::render_sync::{RenderDiff, RenderRegistry, RenderSnapshot};
use crate::sim::{
    EntityId, GameEvent, HeldKeys, StepOutcome, TickInput, UpgradeSlot, UpgradeStats, World, tick,
};

/// Run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Title screen, waiting for the first start
    Start,
    Playing,
    Paused,
    GameOver,
}

/// Discrete player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    TogglePause,
    ToggleMute,
    ResumeAudio,
    Purchase(UpgradeSlot),
    DashRelease,
    AskForTip,
    Restart,
}

/// Ticket for one scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

/// Display-synchronized callback bookkeeping.
///
/// At most one frame is outstanding. A callback is honoured only if it
/// carries the handle of that frame, so callbacks that fire after a cancel
/// or a reschedule do nothing.
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    next_handle: u64,
    pending: Option<FrameHandle>,
    last_time_ms: Option<f64>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the next frame, superseding any outstanding one
    pub fn schedule(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle);
        self.next_handle += 1;
        self.pending = Some(handle);
        handle
    }

    /// Drop the outstanding frame, if any
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Forget the previous timestamp so the next frame has `dt = 0`
    pub fn reset_clock(&mut self) {
        self.last_time_ms = None;
    }

    /// Accept the callback for `handle` at `now_ms` and return the elapsed
    /// milliseconds, or `None` for a stale or cancelled frame.
    pub fn begin_frame(&mut self, handle: FrameHandle, now_ms: f64) -> Option<f32> {
        if self.pending != Some(handle) {
            return None;
        }
        self.pending = None;

        let dt = match self.last_time_ms {
            Some(last) => (now_ms - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_time_ms = Some(now_ms);
        Some(dt)
    }
}

/// Everything produced by one frame
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Handle for the following frame
    pub next: FrameHandle,
    pub dt_ms: f32,
    pub events: Vec<GameEvent>,
    /// Tones to synthesize, already filtered by mute state
    pub tones: Vec<Tone>,
    pub snapshot: RenderSnapshot,
    /// Visuals to tear down and create; apply `despawned` first
    pub diff: RenderDiff,
    pub view: Mat4,
}

/// One player's session, across restarts
pub struct Game {
    config: SimConfig,
    seed: u64,
    world: World,
    upgrades: UpgradeStats,
    stats: GameStats,
    shop: Shop,
    phase: RunPhase,
    run_id: RunId,
    audio: CuePlayer,
    registry: RenderRegistry,
    advisor: AdvisoryBoard,
    frame_loop: FrameLoop,
    dash_requested: bool,
    /// Lifecycle events raised between frames
    events: Vec<GameEvent>,
    /// Visuals from a previous run still owned by the renderer
    stale_visuals: Vec<EntityId>,
    /// Most shards collected in any finished run this session
    best_shards: u64,
}

impl Game {
    pub fn new(config: SimConfig, seed: u64) -> Self {
        let world = World::new(&config, seed);
        let upgrades = UpgradeStats::new(&config);
        let run_id = RunId::default();
        let mut frame_loop = FrameLoop::new();
        frame_loop.schedule();

        Self {
            seed,
            world,
            upgrades,
            stats: GameStats::default(),
            shop: Shop::new(),
            phase: RunPhase::Start,
            run_id,
            audio: CuePlayer::new(),
            registry: RenderRegistry::new(),
            advisor: AdvisoryBoard::new(run_id),
            frame_loop,
            dash_requested: false,
            events: Vec::new(),
            stale_visuals: Vec::new(),
            best_shards: 0,
            config,
        }
    }

    /// Leave the title screen. Starting is a user gesture, so audio resumes.
    pub fn start(&mut self) {
        if self.phase != RunPhase::Start {
            return;
        }
        self.audio.resume();
        self.phase = RunPhase::Playing;
        log::info!("Run {} started (seed {})", self.run_id.0, self.seed);
    }

    /// Throw the current run away and begin a fresh one
    pub fn restart(&mut self) {
        self.seed = self.seed.wrapping_add(1);
        self.run_id = self.run_id.next();
        self.world = World::new(&self.config, self.seed);
        self.upgrades = UpgradeStats::new(&self.config);
        self.stats = GameStats::default();
        self.shop = Shop::new();
        self.advisor.reset(self.run_id);
        self.dash_requested = false;
        self.events.clear();
        self.stale_visuals.extend(self.registry.clear().despawned);

        self.frame_loop.cancel();
        self.frame_loop.reset_clock();
        self.frame_loop.schedule();

        self.audio.resume();
        self.phase = RunPhase::Playing;
        log::info!("Run {} started (seed {})", self.run_id.0, self.seed);
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::TogglePause => self.toggle_pause(),
            InputEvent::ToggleMute => {
                self.audio.toggle_mute();
            }
            InputEvent::ResumeAudio => self.audio.resume(),
            InputEvent::Purchase(slot) => {
                if let Err(refusal) = self.purchase(slot) {
                    log::debug!("Purchase of {:?} refused: {:?}", slot, refusal);
                }
            }
            InputEvent::DashRelease => {
                if self.phase == RunPhase::Playing {
                    self.dash_requested = true;
                }
            }
            InputEvent::AskForTip => self.advisor.request(AdvisoryKind::Tip, &self.stats),
            InputEvent::Restart => self.restart(),
        }
    }

    fn toggle_pause(&mut self) {
        let paused = match self.phase {
            RunPhase::Playing => true,
            RunPhase::Paused => false,
            RunPhase::Start | RunPhase::GameOver => return,
        };
        self.phase = if paused {
            RunPhase::Paused
        } else {
            RunPhase::Playing
        };
        self.events.push(GameEvent::PausedToggled { paused });
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
    }

    /// Buy an upgrade with berries. Only allowed mid-run.
    pub fn purchase(&mut self, slot: UpgradeSlot) -> Result<u64, PurchaseRefusal> {
        if self.phase != RunPhase::Playing {
            return Err(PurchaseRefusal::NotPlaying);
        }
        let cost = self.shop.purchase(
            slot,
            &mut self.stats,
            &mut self.upgrades,
            &mut self.world.agent,
            &self.config,
        )?;
        self.events.push(GameEvent::UpgradePurchased(slot));
        Ok(cost)
    }

    /// Display callback. Returns `None` for a stale or cancelled frame.
    pub fn on_frame(&mut self, handle: FrameHandle, now_ms: f64, held: HeldKeys) -> Option<FrameOutput> {
        let dt_ms = self.frame_loop.begin_frame(handle, now_ms)?;
        // Keep the loop alive in every phase
        let next = self.frame_loop.schedule();

        let mut events = std::mem::take(&mut self.events);
        if self.phase == RunPhase::Playing {
            let input = TickInput {
                held,
                dash: std::mem::take(&mut self.dash_requested),
            };
            let outcome = tick(&mut self.world, &self.config, &self.upgrades, &input, dt_ms);
            let step_events = self.world.drain_events();
            self.stats.apply_events(&step_events);
            events.extend(step_events);

            if outcome == StepOutcome::Defeated {
                self.game_over();
            }
        }

        let tones = events
            .iter()
            .filter_map(|event| match event {
                GameEvent::Cue(cue) => {
                    log::trace!("cue {}", cue.as_str());
                    self.audio.play(*cue)
                }
                _ => None,
            })
            .collect();

        let snapshot = RenderSnapshot::capture(&self.world);
        let mut diff = self.registry.sync(&snapshot);
        if !self.stale_visuals.is_empty() {
            let mut despawned = std::mem::take(&mut self.stale_visuals);
            despawned.append(&mut diff.despawned);
            diff.despawned = despawned;
        }

        Some(FrameOutput {
            next,
            dt_ms,
            events,
            tones,
            snapshot,
            diff,
            view: self.world.camera.view_matrix(),
        })
    }

    fn game_over(&mut self) {
        self.phase = RunPhase::GameOver;
        if self.stats.shards > self.best_shards {
            log::info!("New best: {} shards (was {})", self.stats.shards, self.best_shards);
            self.best_shards = self.stats.shards;
        }
        self.advisor.request(AdvisoryKind::Death, &self.stats);
        log::info!(
            "Run {} over: survived {}s, {} kills, {} shards, {} berries",
            self.run_id.0,
            self.stats.seconds_survived(),
            self.stats.enemies_killed,
            self.stats.shards,
            self.stats.berries
        );
    }

    /// Oracle requests raised since the last call
    pub fn take_advisory_requests(&mut self) -> Vec<AdvisoryRequest> {
        self.advisor.take_requests()
    }

    /// Hand an oracle answer back. Answers for an earlier run are dropped.
    pub fn deliver_advice(&mut self, response: AdvisoryResponse) -> bool {
        self.advisor.deliver(response)
    }

    pub fn advice(&self) -> Option<&str> {
        self.advisor.message()
    }

    pub fn is_consulting(&self) -> bool {
        self.advisor.is_loading()
    }

    pub fn next_frame(&self) -> Option<FrameHandle> {
        self.frame_loop.pending()
    }

    /// Stop the frame loop; later callbacks are ignored
    pub fn stop(&mut self) {
        self.frame_loop.cancel();
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn upgrades(&self) -> &UpgradeStats {
        &self.upgrades
    }

    pub fn upgrade_cost(&self) -> u64 {
        self.shop.next_cost(&self.config)
    }

    pub fn can_afford_upgrade(&self) -> bool {
        self.shop.can_afford(&self.stats, &self.config)
    }

    /// Best shard total over the finished runs of this session
    pub fn best_shards(&self) -> u64 {
        self.best_shards
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn audio(&self) -> &CuePlayer {
        &self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::{OfflineAdvisor, consult};
    use crate::sim::{EntityKind, StatDelta};

    fn quiet_config() -> SimConfig {
        SimConfig {
            spawn_interval_initial_ms: 1.0e9,
            spawn_interval_floor_ms: 1.0e9,
            ..SimConfig::default()
        }
    }

    /// Drive `frames` frames `step_ms` apart, returning all events
    fn run(game: &mut Game, start_ms: f64, frames: usize, step_ms: f64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for i in 0..frames {
            let handle = game.next_frame().expect("loop stays scheduled");
            let now = start_ms + i as f64 * step_ms;
            let out = game.on_frame(handle, now, HeldKeys::default()).expect("fresh handle");
            events.extend(out.events);
        }
        events
    }

    #[test]
    fn test_frame_loop_handles() {
        let mut frames = FrameLoop::new();
        let first = frames.schedule();
        assert_eq!(frames.begin_frame(first, 1000.0), Some(0.0));
        // Already consumed
        assert_eq!(frames.begin_frame(first, 1016.0), None);

        let second = frames.schedule();
        assert_eq!(frames.begin_frame(second, 1016.0), Some(16.0));

        let third = frames.schedule();
        frames.cancel();
        frames.cancel();
        assert!(!frames.is_scheduled());
        assert_eq!(frames.begin_frame(third, 1032.0), None);

        let superseded = frames.schedule();
        let current = frames.schedule();
        assert_eq!(frames.begin_frame(superseded, 1048.0), None);
        assert_eq!(frames.begin_frame(current, 1048.0), Some(32.0));
    }

    #[test]
    fn test_title_screen_does_not_simulate() {
        let mut game = Game::new(quiet_config(), 1);
        run(&mut game, 0.0, 10, 100.0);
        assert_eq!(game.phase(), RunPhase::Start);
        assert_eq!(game.world().elapsed_ms, 0.0);

        game.start();
        // The clock ran on the title screen, so the first playing frame is a normal gap
        run(&mut game, 1000.0, 3, 100.0);
        assert_eq!(game.world().elapsed_ms, 300.0);
    }

    #[test]
    fn test_pause_freezes_simulation_but_not_clock() {
        let mut game = Game::new(quiet_config(), 1);
        game.start();
        run(&mut game, 0.0, 2, 100.0);
        assert_eq!(game.stats().time_survived_ms, 100.0);

        game.handle(InputEvent::TogglePause);
        assert_eq!(game.phase(), RunPhase::Paused);
        let events = run(&mut game, 200.0, 50, 100.0);
        assert!(events.contains(&GameEvent::PausedToggled { paused: true }));
        assert_eq!(game.stats().time_survived_ms, 100.0);

        // First frame after resume only covers the gap since the last paused frame
        game.handle(InputEvent::TogglePause);
        run(&mut game, 5200.0, 1, 100.0);
        assert_eq!(game.phase(), RunPhase::Playing);
        assert_eq!(game.stats().time_survived_ms, 200.0);
    }

    #[test]
    fn test_purchases_only_while_playing() {
        let mut game = Game::new(quiet_config(), 1);
        assert_eq!(game.purchase(UpgradeSlot::Orbital), Err(PurchaseRefusal::NotPlaying));

        game.start();
        game.stats.apply(StatDelta::Berries(5));
        assert_eq!(game.purchase(UpgradeSlot::Orbital), Ok(5));
        assert_eq!(game.upgrades().orbitals, 1);
        assert_eq!(game.upgrade_cost(), 7);
        assert!(!game.can_afford_upgrade());

        game.handle(InputEvent::TogglePause);
        game.stats.apply(StatDelta::Berries(10));
        assert_eq!(game.purchase(UpgradeSlot::MaxHp), Err(PurchaseRefusal::NotPlaying));
    }

    #[test]
    fn test_defeat_ends_run_and_asks_oracle() {
        let mut game = Game::new(quiet_config(), 1);
        game.start();
        run(&mut game, 0.0, 1, 16.0);

        let config = game.config().clone();
        let world = game.world_mut();
        world.agent.hp = 5.0;
        let on_top = world.agent.position;
        world.entities.spawn(
            on_top,
            config.enemy_size,
            EntityKind::Enemy {
                hp: 10.0,
                max_hp: 10.0,
                damage: config.enemy_damage,
                speed: 0.0,
            },
        );

        let events = run(&mut game, 16.0, 5, 16.0);
        assert_eq!(game.phase(), RunPhase::GameOver);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::Defeated).count(), 1);

        let requests = game.take_advisory_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, AdvisoryKind::Death);
        assert_eq!(requests[0].run_id, game.run_id());
        assert!(game.is_consulting());

        // Still rendering while the run is over
        assert!(game.next_frame().is_some());
    }

    /// End the run on the next frame with `shards` in the bank
    fn lose_with(game: &mut Game, shards: u32, now_ms: f64) {
        game.stats.apply(StatDelta::Shards(shards));
        let config = game.config().clone();
        let world = game.world_mut();
        world.agent.hp = 1.0;
        let on_top = world.agent.position;
        world.entities.spawn(
            on_top,
            config.enemy_size,
            EntityKind::Enemy {
                hp: 1000.0,
                max_hp: 1000.0,
                damage: config.enemy_damage,
                speed: 0.0,
            },
        );
        run(game, now_ms, 1, 16.0);
        assert_eq!(game.phase(), RunPhase::GameOver);
    }

    #[test]
    fn test_best_shards_survive_restart() {
        let mut game = Game::new(quiet_config(), 1);
        game.start();
        run(&mut game, 0.0, 1, 16.0);
        assert_eq!(game.best_shards(), 0);

        lose_with(&mut game, 30, 16.0);
        assert_eq!(game.best_shards(), 30);

        game.restart();
        assert_eq!(game.stats().shards, 0);
        assert_eq!(game.best_shards(), 30);

        // A worse run leaves the record alone
        run(&mut game, 100.0, 1, 16.0);
        lose_with(&mut game, 10, 116.0);
        assert_eq!(game.best_shards(), 30);

        game.restart();
        run(&mut game, 200.0, 1, 16.0);
        lose_with(&mut game, 45, 216.0);
        assert_eq!(game.best_shards(), 45);
    }

    #[test]
    fn test_restart_drops_stale_advice() {
        let mut game = Game::new(quiet_config(), 1);
        game.start();
        game.handle(InputEvent::AskForTip);
        let old = game.take_advisory_requests();
        let old_handle = game.next_frame();

        game.handle(InputEvent::Restart);
        assert_eq!(game.phase(), RunPhase::Playing);
        assert_ne!(game.run_id(), old[0].run_id);
        assert!(!game.deliver_advice(consult(&OfflineAdvisor, &old[0])));
        assert_eq!(game.advice(), None);

        // The pre-restart frame callback is dead
        if let Some(handle) = old_handle {
            assert!(game.on_frame(handle, 0.0, HeldKeys::default()).is_none());
        }
    }

    #[test]
    fn test_restart_tears_down_old_visuals() {
        let mut game = Game::new(quiet_config(), 1);
        game.start();
        let position = game.world().agent.position;
        let id = game.world_mut().entities.spawn(-position, 0.8, EntityKind::Pickup);
        let handle = game.next_frame().expect("scheduled");
        let out = game.on_frame(handle, 0.0, HeldKeys::default()).expect("fresh handle");
        assert!(out.diff.spawned.contains(&id));

        game.restart();
        let handle = game.next_frame().expect("scheduled");
        let out = game.on_frame(handle, 10.0, HeldKeys::default()).expect("fresh handle");
        assert!(out.diff.despawned.contains(&id));
        assert_eq!(out.dt_ms, 0.0);
    }

    #[test]
    fn test_muted_cues_produce_no_tones() {
        let mut game = Game::new(quiet_config(), 1);
        game.start();
        game.handle(InputEvent::DashRelease);
        let handle = game.next_frame().expect("scheduled");
        let out = game.on_frame(handle, 0.0, HeldKeys::default()).expect("fresh handle");
        assert!(!out.tones.is_empty());

        game.handle(InputEvent::ToggleMute);
        assert!(game.audio().is_muted());
        let mut tones = 0;
        for i in 1..20 {
            game.handle(InputEvent::DashRelease);
            let handle = game.next_frame().expect("scheduled");
            let out = game
                .on_frame(handle, i as f64 * 100.0, HeldKeys::default())
                .expect("fresh handle");
            tones += out.tones.len();
        }
        assert_eq!(tones, 0);
    }
}

//! Gift stacker - drop boxes from a sliding spawner and build the tallest
//! stack you can before running out of lives.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use stack_engine::{
    CollisionPair, EngineContext, EngineError, FpsMonitor, Game, GameConfig, GameEvent, InputEvent,
    InputQueue, Scheduler, SoundEvent, ViewTransform,
};

use crate::camera::CameraController;
use crate::config::{Difficulty, Layout, Settings, DEFAULT_VIEWPORT};
use crate::leaderboard::{prepare_submission, Leaderboard, SubmitReply};
use crate::persistence::{self, Profile};
use crate::registry::{BoxSpec, Registry};
use crate::scoring::{GameOverReport, Scoring, ScoringEvent};
use crate::spawner::{Spawner, RESPAWN_DELAY_MS};

const KEY_ENTER: u32 = 13;
const KEY_ESCAPE: u32 = 27;
const KEY_SPACE: u32 = 32;

/// Custom input kinds sent by the UI layer.
pub mod commands {
    pub const START: u32 = 1;
    pub const PAUSE: u32 = 2;
    pub const RESUME: u32 = 3;
    pub const QUIT: u32 = 4;
    /// a = difficulty index (0 easy, 1 standard, 2 hard)
    pub const SET_DIFFICULTY: u32 = 5;
    /// a = width, b = height
    pub const RESIZE: u32 = 6;
    pub const TOGGLE_SOUND: u32 = 7;
    pub const TOGGLE_RANDOM_SIZES: u32 = 8;
    pub const RESET_BEST: u32 = 9;
    /// a = slide, b = drop, c = bounce
    pub const SET_TUNING: u32 = 10;
}

/// Game event kinds sent to the UI layer.
pub mod events {
    /// a = score
    pub const SCORE: u32 = 1;
    /// a = lives, b = max lives
    pub const LIVES: u32 = 2;
    /// a = remaining fraction of the drop timer
    pub const DROP_TIMER: u32 = 3;
    /// a = phase (0 start, 1 playing, 2 game over), b = paused
    pub const PHASE: u32 = 4;
    /// a = final score, b = new record, c = worth submitting
    pub const GAME_OVER: u32 = 5;
    /// a = zoom, b = offset y, c = spawner y
    pub const CAMERA: u32 = 6;
    pub const PERF_DEGRADED: u32 = 7;
    /// a = best score
    pub const BEST: u32 = 8;
}

/// Message channels understood by [`GiftStacker::receive`].
pub mod channels {
    /// Payload: JSON array of `{name, score}`, best first.
    pub const LEADERBOARD_TOP: &str = "leaderboard.top";
    /// Payload: error text.
    pub const LEADERBOARD_FAILED: &str = "leaderboard.failed";
    /// Payload: player name. Reply: JSON `SubmitReply`.
    pub const LEADERBOARD_SUBMIT: &str = "leaderboard.submit";
    /// Empty payload queries the saved name; anything else stores it.
    pub const PLAYER_NAME: &str = "player.name";
}

/// Sound cues, forwarded to the host as `SoundEvent` ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Whoosh = 1,
    Land = 2,
    Score = 3,
    GameOverRecord = 4,
    GameOver = 5,
    LifeLost = 6,
}

impl From<Cue> for SoundEvent {
    fn from(cue: Cue) -> Self {
        SoundEvent(cue as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Start,
    Playing,
    GameOver,
}

impl RoundPhase {
    fn as_f32(self) -> f32 {
        match self {
            RoundPhase::Start => 0.0,
            RoundPhase::Playing => 1.0,
            RoundPhase::GameOver => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    SpawnBox,
}

pub struct GiftStacker {
    viewport: Vec2,
    settings: Settings,
    layout: Layout,
    phase: RoundPhase,
    paused: bool,
    /// Bumped on every start and quit; deferred work from older rounds is ignored.
    generation: u64,
    registry: Registry,
    spawner: Spawner,
    scoring: Scoring,
    camera: CameraController,
    leaderboard: Leaderboard,
    scheduler: Scheduler<Deferred>,
    perf: FpsMonitor,
    rng: Pcg32,
    best: u32,
    player: Option<String>,
    last_report: Option<GameOverReport>,
    effects_enabled: bool,
    needs_sync: bool,
}

impl GiftStacker {
    pub fn new() -> Self {
        let settings = Settings::default();
        let preset = settings.preset();
        let camera = CameraController::new();
        Self {
            viewport: DEFAULT_VIEWPORT,
            layout: Layout::new(DEFAULT_VIEWPORT, preset.width_pct),
            phase: RoundPhase::Start,
            paused: false,
            generation: 0,
            registry: Registry::new(),
            spawner: Spawner::new(camera.spawner_y()),
            scoring: Scoring::new(preset.lives),
            camera,
            leaderboard: Leaderboard::new(),
            scheduler: Scheduler::new(),
            perf: FpsMonitor::new(),
            rng: Pcg32::seed_from_u64(0),
            best: 0,
            player: None,
            last_report: None,
            effects_enabled: true,
            needs_sync: true,
            settings,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn score(&self) -> u32 {
        self.scoring.score()
    }

    pub fn lives(&self) -> u32 {
        self.scoring.lives()
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn last_report(&self) -> Option<GameOverReport> {
        self.last_report
    }

    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    pub fn min_to_beat(&self) -> u32 {
        self.leaderboard.min_to_beat()
    }

    pub fn effects_enabled(&self) -> bool {
        self.effects_enabled
    }

    // -- Round lifecycle --

    fn start(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        self.generation += 1;
        self.registry.reset_round(ctx);

        let preset = self.settings.preset();
        self.layout = Layout::new(self.viewport, preset.width_pct);
        ctx.physics.set_gravity(self.settings.gravity());
        self.rng = Pcg32::seed_from_u64(ctx.now_ms().to_bits() ^ self.generation);

        self.scoring.reset(preset.lives);
        self.camera.reset();
        self.spawner
            .reset_round(self.layout.width, self.camera.spawner_y(), preset.drop_time_ms);
        self.phase = RoundPhase::Playing;
        self.paused = false;
        self.last_report = None;

        self.registry.build_round(ctx, &self.layout)?;
        self.spawn_box(ctx)?;

        log::info!(
            "round {} started ({:?}, {} lives)",
            self.generation,
            self.settings.difficulty,
            preset.lives
        );
        self.emit_phase(ctx);
        self.emit_score(ctx);
        self.emit_lives(ctx);
        Ok(())
    }

    fn quit(&mut self, ctx: &mut EngineContext) {
        self.generation += 1;
        self.registry.reset_round(ctx);
        self.phase = RoundPhase::Start;
        self.paused = false;
        self.spawner.idle();
        self.camera.reset();
        log::info!("round abandoned, back to start");
        self.emit_phase(ctx);
    }

    fn set_paused(&mut self, ctx: &mut EngineContext, paused: bool) {
        if self.phase != RoundPhase::Playing || self.paused == paused {
            return;
        }
        self.paused = paused;
        log::debug!("paused: {}", paused);
        self.emit_phase(ctx);
    }

    fn finish_round(&mut self, ctx: &mut EngineContext) {
        let persisted = persistence::load_best(ctx.store());
        let report = {
            let world: &EngineContext = ctx;
            self.scoring.finalize(
                &self.registry,
                |id| world.body_state(id).map(|s| s.position),
                self.layout.height,
                persisted,
                self.leaderboard.min_to_beat(),
            )
        };
        let Some(report) = report else { return };

        self.best = self.best.max(persisted);
        if report.record {
            self.best = report.score;
            persistence::save_best(ctx.store_mut(), report.score);
            ctx.emit_event(GameEvent::new(events::BEST, self.best as f32, 0.0, 0.0));
        }

        self.phase = RoundPhase::GameOver;
        self.paused = false;
        self.spawner.idle();

        let cue = if report.record || report.notable {
            Cue::GameOverRecord
        } else {
            Cue::GameOver
        };
        ctx.emit_sound(cue.into());
        ctx.emit_event(GameEvent::new(
            events::GAME_OVER,
            report.score as f32,
            flag(report.record),
            flag(report.notable),
        ));
        self.emit_score(ctx);
        self.emit_phase(ctx);
        log::info!(
            "game over: score {}, record {}, notable {}",
            report.score,
            report.record,
            report.notable
        );
        self.last_report = Some(report);
    }

    // -- Boxes --

    fn spawn_box(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        if self.registry.pending().is_some() {
            return Ok(());
        }
        let spec = if self.settings.random_sizes {
            BoxSpec::random(self.layout.box_size, self.settings.bounce, &mut self.rng)
        } else {
            BoxSpec::fixed(self.layout.box_size, self.settings.bounce)
        };
        self.spawner.begin_hold(self.layout.width);
        let id = self
            .registry
            .spawn_pending(ctx, &spec, Vec2::new(self.spawner.x, self.spawner.y))?;
        ctx.emit_sound(Cue::Whoosh.into());
        log::debug!("box {:?} spawned ({}x{})", id, spec.size.x, spec.size.y);
        Ok(())
    }

    fn try_drop(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        if self.phase != RoundPhase::Playing || self.paused {
            return Ok(());
        }
        self.drop_box(ctx)
    }

    fn drop_box(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        let Some(id) = self.registry.drop_pending(ctx)? else {
            return Ok(());
        };
        self.spawner.release();
        self.scheduler
            .schedule(ctx.now_ms() + RESPAWN_DELAY_MS, self.generation, Deferred::SpawnBox);
        log::debug!("box {:?} dropped at x={:.0}", id, self.spawner.x);
        Ok(())
    }

    fn run_deferred(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        for due in self.scheduler.poll(ctx.now_ms()) {
            if due.generation != self.generation || self.phase != RoundPhase::Playing {
                log::debug!("skipping stale {:?} from round {}", due.task, due.generation);
                continue;
            }
            match due.task {
                Deferred::SpawnBox => self.spawn_box(ctx)?,
            }
        }
        Ok(())
    }

    // -- Per-frame simulation --

    fn advance(&mut self, ctx: &mut EngineContext, delta_ms: f32) -> Result<(), EngineError> {
        let top = self.stack_top(ctx);
        let view = self.camera.update(top, &self.layout);
        self.spawner.y = self.camera.spawner_y();
        ctx.emit_event(GameEvent::new(events::CAMERA, view.zoom, view.offset_y, self.spawner.y));

        if let Some((id, half)) = self.registry.pending().map(|b| (b.id, b.half_extents)) {
            if self.spawner.tick_timer(delta_ms) {
                log::debug!("drop timer expired");
                self.drop_box(ctx)?;
            } else {
                self.spawner
                    .oscillate(delta_ms, self.settings.slide_mult, self.layout.width, half.x);
                ctx.set_position(id, Vec2::new(self.spawner.x, self.spawner.y))?;
                ctx.set_velocity(id, Vec2::ZERO)?;
            }
            if let Some(fraction) = self.spawner.timer().fraction() {
                ctx.emit_event(GameEvent::new(events::DROP_TIMER, fraction, 0.0, 0.0));
            }
        }

        ctx.step_physics(delta_ms)?;
        self.score_landings(ctx);
        self.scan_offscreen(ctx);
        Ok(())
    }

    /// Highest top edge among boxes that are still part of the stack.
    fn stack_top(&self, ctx: &EngineContext) -> Option<f32> {
        self.registry
            .dropped()
            .iter()
            .filter(|b| b.has_scored && !b.lost_life)
            .filter_map(|b| {
                let state = ctx.body_state(b.id)?;
                (!state.is_static).then(|| state.position.y - b.half_extents.y)
            })
            .reduce(f32::min)
    }

    fn score_landings(&mut self, ctx: &mut EngineContext) {
        let started: Vec<CollisionPair> =
            ctx.collisions().iter().filter(|p| p.started).copied().collect();

        for pair in started {
            let touches_box = self.registry.is_box(pair.entity_a) || self.registry.is_box(pair.entity_b);
            if !pair.sensor && touches_box {
                ctx.emit_sound(Cue::Land.into());
            }
            for (body, other) in pair.both_ways() {
                if let Some(ScoringEvent::Increased(score)) =
                    self.scoring.on_collision(&mut self.registry, body, other)
                {
                    log::debug!("score {}", score);
                    ctx.emit_sound(Cue::Score.into());
                    self.emit_score(ctx);
                }
            }
        }
    }

    fn scan_offscreen(&mut self, ctx: &mut EngineContext) {
        let line = self.layout.offscreen_line();
        let outcome = {
            let world: &EngineContext = ctx;
            self.scoring.scan_offscreen(
                &mut self.registry,
                |id| world.body_state(id).map(|s| s.position),
                line,
            )
        };

        for event in outcome {
            match event {
                ScoringEvent::Decreased(_) | ScoringEvent::Increased(_) => self.emit_score(ctx),
                ScoringEvent::LifeLost { remaining } => {
                    log::info!("life lost, {} left", remaining);
                    if remaining > 0 {
                        ctx.emit_sound(Cue::LifeLost.into());
                    }
                    self.emit_lives(ctx);
                }
                ScoringEvent::OutOfLives => self.finish_round(ctx),
            }
        }
    }

    // -- Input --

    fn handle_input(&mut self, ctx: &mut EngineContext, event: &InputEvent) -> Result<(), EngineError> {
        match *event {
            InputEvent::PointerDown { .. } => self.try_drop(ctx)?,
            InputEvent::KeyDown { key_code } => match key_code {
                KEY_SPACE => self.try_drop(ctx)?,
                KEY_ENTER if self.phase != RoundPhase::Playing => self.start(ctx)?,
                KEY_ESCAPE => match self.phase {
                    RoundPhase::Playing => self.set_paused(ctx, !self.paused),
                    RoundPhase::GameOver => self.quit(ctx),
                    RoundPhase::Start => {}
                },
                _ => {}
            },
            InputEvent::Custom { kind, a, b, c } => self.handle_command(ctx, kind, a, b, c)?,
        }
        Ok(())
    }

    fn handle_command(
        &mut self,
        ctx: &mut EngineContext,
        kind: u32,
        a: f32,
        b: f32,
        c: f32,
    ) -> Result<(), EngineError> {
        match kind {
            commands::START => self.start(ctx)?,
            commands::PAUSE => self.set_paused(ctx, true),
            commands::RESUME => self.set_paused(ctx, false),
            commands::QUIT => self.quit(ctx),
            commands::SET_DIFFICULTY => {
                match (a >= 0.0).then(|| Difficulty::from_index(a as u32)).flatten() {
                    Some(difficulty) => {
                        self.settings.apply_difficulty(difficulty);
                        log::info!("difficulty set to {:?}", difficulty);
                        self.save_settings(ctx);
                    }
                    None => log::warn!("unknown difficulty index {}", a),
                }
            }
            commands::RESIZE => {
                if a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0 {
                    self.viewport = Vec2::new(a, b);
                } else {
                    log::warn!("ignoring invalid viewport {}x{}", a, b);
                }
            }
            commands::TOGGLE_SOUND => {
                self.settings.sound = !self.settings.sound;
                ctx.set_sound_enabled(self.settings.sound);
                self.save_settings(ctx);
            }
            commands::TOGGLE_RANDOM_SIZES => {
                self.settings.random_sizes = !self.settings.random_sizes;
                self.save_settings(ctx);
            }
            commands::RESET_BEST => {
                self.best = 0;
                persistence::save_best(ctx.store_mut(), 0);
                ctx.emit_event(GameEvent::new(events::BEST, 0.0, 0.0, 0.0));
            }
            commands::SET_TUNING => {
                self.settings.set_tuning(a, b, c);
                self.save_settings(ctx);
            }
            other => log::debug!("ignoring unknown command {}", other),
        }
        Ok(())
    }

    fn save_settings(&self, ctx: &mut EngineContext) {
        persistence::save_settings(ctx.store_mut(), &self.settings);
    }

    // -- Events to the host --

    fn emit_phase(&self, ctx: &mut EngineContext) {
        ctx.emit_event(GameEvent::new(events::PHASE, self.phase.as_f32(), flag(self.paused), 0.0));
    }

    fn emit_score(&self, ctx: &mut EngineContext) {
        ctx.emit_event(GameEvent::new(events::SCORE, self.scoring.score() as f32, 0.0, 0.0));
    }

    fn emit_lives(&self, ctx: &mut EngineContext) {
        ctx.emit_event(GameEvent::new(
            events::LIVES,
            self.scoring.lives() as f32,
            self.scoring.max_lives() as f32,
            0.0,
        ));
    }
}

impl Default for GiftStacker {
    fn default() -> Self {
        Self::new()
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl Game for GiftStacker {
    fn config(&self) -> GameConfig {
        GameConfig {
            world_width: self.viewport.x,
            world_height: self.viewport.y,
            gravity: self.settings.gravity(),
            ..GameConfig::default()
        }
    }

    fn init(&mut self, ctx: &mut EngineContext) {
        let profile = Profile::load(ctx.store());
        self.best = profile.best;
        self.player = profile.player;
        self.settings = profile.settings;
        ctx.set_sound_enabled(self.settings.sound);
        ctx.physics.set_gravity(self.settings.gravity());
        log::info!(
            "profile loaded: best {}, difficulty {:?}",
            self.best,
            self.settings.difficulty
        );
    }

    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) -> Result<(), EngineError> {
        if self.needs_sync {
            self.needs_sync = false;
            ctx.emit_event(GameEvent::new(events::BEST, self.best as f32, 0.0, 0.0));
            self.emit_phase(ctx);
        }

        if self.perf.record_frame(ctx.now_ms()) {
            self.effects_enabled = false;
            log::warn!("frame rate stayed low, disabling effects");
            ctx.emit_event(GameEvent::new(events::PERF_DEGRADED, 0.0, 0.0, 0.0));
        }

        for event in input.iter() {
            self.handle_input(ctx, event)?;
        }

        self.run_deferred(ctx)?;

        if self.phase == RoundPhase::Playing && !self.paused {
            let delta_ms = ctx.delta_ms();
            self.advance(ctx, delta_ms)?;
        }
        Ok(())
    }

    fn receive(&mut self, ctx: &mut EngineContext, channel: &str, payload: &str) -> Option<String> {
        match channel {
            channels::LEADERBOARD_TOP => {
                match Leaderboard::parse_top(payload) {
                    Ok(entries) => self.leaderboard.apply_top(&entries),
                    Err(err) => self.leaderboard.fetch_failed(&err.to_string()),
                }
                None
            }
            channels::LEADERBOARD_FAILED => {
                self.leaderboard.fetch_failed(payload);
                None
            }
            channels::LEADERBOARD_SUBMIT => {
                let score = self.last_report.map(|r| r.score).unwrap_or(0);
                let result = prepare_submission(payload, score);
                match &result {
                    Ok(submission) => {
                        let name = payload.trim().to_string();
                        persistence::save_player(ctx.store_mut(), &name);
                        self.player = Some(name);
                        log::info!("submitting {} for {}", submission.score, submission.name);
                    }
                    Err(err) => log::warn!("submission rejected: {}", err),
                }
                serde_json::to_string(&SubmitReply::from(result))
                    .map_err(|err| log::error!("could not encode reply: {}", err))
                    .ok()
            }
            channels::PLAYER_NAME => {
                let name = payload.trim();
                if name.is_empty() {
                    return Some(self.player.clone().unwrap_or_default());
                }
                persistence::save_player(ctx.store_mut(), name);
                self.player = Some(name.to_string());
                None
            }
            _ => {
                log::debug!("ignoring message on {}", channel);
                None
            }
        }
    }

    fn view(&self) -> ViewTransform {
        self.camera.view()
    }
}

use stack_engine::bridge::protocol::HEADER_FLOATS;
use stack_engine::{
    EngineContext, FrameCounts, Game, GameConfig, InputEvent, InputQueue, KeyValueStore,
    MemoryStore, ProtocolLayout, RenderBuffer, RenderSink, BodyView,
};

/// Generic game runner that wires up the engine loop.
///
/// Each concrete game creates a `thread_local!` GameRunner and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    render_buffer: RenderBuffer,
    config: GameConfig,
    layout: ProtocolLayout,
    initialized: bool,
    frame: u32,
    header: [f32; HEADER_FLOATS],
    /// Flat buffer of sound cue IDs for SharedArrayBuffer reads.
    sound_buffer: Vec<u8>,
}

impl<G: Game> GameRunner<G> {
    /// Runner backed by an in-memory store.
    pub fn new(game: G) -> Self {
        Self::with_store(game, Box::new(MemoryStore::new()))
    }

    pub fn with_store(game: G, store: Box<dyn KeyValueStore>) -> Self {
        let config = game.config();
        let layout = ProtocolLayout::from_config(&config);

        Self {
            ctx: EngineContext::with_gravity(config.gravity).with_store(store),
            input: InputQueue::new(),
            render_buffer: RenderBuffer::with_capacity(config.max_instances),
            sound_buffer: Vec::with_capacity(config.max_sounds),
            header: [0.0; HEADER_FLOATS],
            frame: 0,
            game,
            layout,
            config,
            initialized: false,
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.game.init(&mut self.ctx);
        self.refresh_config();
        self.initialized = true;
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Forward a text message to the game.
    pub fn receive(&mut self, channel: &str, payload: &str) -> Option<String> {
        if !self.initialized {
            return None;
        }
        self.game.receive(&mut self.ctx, channel, payload)
    }

    /// Run one display frame at host timestamp `now_ms`.
    pub fn tick(&mut self, now_ms: f64) {
        if !self.initialized {
            return;
        }

        // Clear per-frame transient data
        self.ctx.clear_frame_data();
        self.ctx.advance_clock(now_ms);

        if let Err(err) = self.game.update(&mut self.ctx, &self.input) {
            log::error!("frame {} update failed: {}", self.frame, err);
        }

        // Drain input after update
        self.input.drain();

        // Bodies are published every frame, paused or not
        self.ctx.sync_bodies();
        self.render_buffer.begin_frame();
        for entity in self.ctx.scene.iter() {
            self.render_buffer.publish(BodyView::from(entity));
        }
        self.render_buffer.apply_view(self.game.view());

        if self.ctx.sounds.len() > self.layout.max_sounds {
            log::warn!("dropping {} sound cues", self.ctx.sounds.len() - self.layout.max_sounds);
            self.ctx.sounds.truncate(self.layout.max_sounds);
        }
        if self.ctx.events.len() > self.layout.max_events {
            log::warn!("dropping {} game events", self.ctx.events.len() - self.layout.max_events);
            self.ctx.events.truncate(self.layout.max_events);
        }

        // Pack sound events into flat buffer
        self.sound_buffer.clear();
        self.sound_buffer.extend(self.ctx.sounds.iter().map(|s| s.0 as u8));

        self.refresh_config();
        self.frame = self.frame.wrapping_add(1);
        let counts = FrameCounts {
            instances: self.render_buffer.instances.len(),
            sounds: self.sound_buffer.len(),
            events: self.ctx.events.len(),
        };
        self.layout.write_header(
            &mut self.header,
            self.frame,
            counts,
            &self.config,
            self.render_buffer.view_floats(),
        );
    }

    /// Viewport size can change at runtime; capacities cannot.
    fn refresh_config(&mut self) {
        let latest = self.game.config();
        self.config.world_width = latest.world_width;
        self.config.world_height = latest.world_height;
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.render_buffer
    }

    // ---- Pointer accessors for SharedArrayBuffer reads ----

    pub fn header_ptr(&self) -> *const f32 {
        self.header.as_ptr()
    }

    pub fn instances_ptr(&self) -> *const f32 {
        self.render_buffer.instances_ptr()
    }

    pub fn instance_count(&self) -> u32 {
        self.render_buffer.instance_count()
    }

    pub fn sound_events_ptr(&self) -> *const u8 {
        self.sound_buffer.as_ptr()
    }

    pub fn sound_events_len(&self) -> u32 {
        self.sound_buffer.len() as u32
    }

    pub fn game_events_ptr(&self) -> *const f32 {
        self.ctx.events.as_ptr() as *const f32
    }

    pub fn game_events_len(&self) -> u32 {
        self.ctx.events.len() as u32
    }

    pub fn world_width(&self) -> f32 {
        self.config.world_width
    }

    pub fn world_height(&self) -> f32 {
        self.config.world_height
    }

    pub fn view_zoom(&self) -> f32 {
        self.render_buffer.view.zoom
    }

    pub fn view_offset_y(&self) -> f32 {
        self.render_buffer.view.offset_y
    }

    // ---- Capacity accessors ----

    pub fn max_instances(&self) -> u32 {
        self.layout.max_instances as u32
    }

    pub fn max_sounds(&self) -> u32 {
        self.layout.max_sounds as u32
    }

    pub fn max_events(&self) -> u32 {
        self.layout.max_events as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }
}

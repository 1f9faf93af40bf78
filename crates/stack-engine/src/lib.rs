pub mod api;
pub mod bridge;
pub mod components;
pub mod core;
pub mod error;
pub mod input;
pub mod renderer;
pub mod storage;

// Re-export key types at crate root for convenience
pub use api::game::{EngineContext, Game, GameConfig};
pub use api::types::{EntityId, GameEvent, SoundEvent};
pub use bridge::protocol::{FrameCounts, ProtocolLayout};
pub use components::entity::{BodyKind, Entity};
pub use core::physics::{
    BodyDesc, BodyState, BodyType, ColliderMaterial, CollisionPair, PhysicsBody, PhysicsWorld,
    MAX_STEP_MS,
};
pub use core::scene::Scene;
pub use core::schedule::{Scheduled, Scheduler};
pub use core::time::{FpsMonitor, FrameClock};
pub use error::{EngineError, PhysicsError, StorageError};
pub use input::queue::{InputEvent, InputQueue};
pub use renderer::{BodyInstance, BodyView, RenderBuffer, RenderSink, ViewTransform};
pub use storage::{load_json, save_json, KeyValueStore, MemoryStore};

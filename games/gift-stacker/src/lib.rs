use wasm_bindgen::prelude::*;
use stack_engine::*;

pub mod camera;
pub mod config;
pub mod game;
pub mod leaderboard;
pub mod persistence;
pub mod registry;
pub mod scoring;
pub mod spawner;

pub use game::GiftStacker;

stack_web::export_game!(GiftStacker, "gift-stacker");

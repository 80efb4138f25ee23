//! ai-threes: a self-play TD(0) trainer for a Threes!-like 4x4 merge puzzle.
//!
//! This crate provides:
//! - A compact `Board` type with Threes slide/merge rules, tile bag and hint
//!   bookkeeping (`engine` module)
//! - An n-tuple value network with symmetry-group weight sharing and a
//!   little-endian weight-file format (`ntuple` module)
//! - Placer/slider agents, including the TD(0) learning slider (`agent`
//!   module), configured through typed `key=value` options (`config` module)
//! - Episode statistics and a postcard training summary (`stats` module)
//!
//! Quick start:
//! ```
//! use ai_threes::agent::{Action, LearningSlider};
//! use ai_threes::engine::{self as GameEngine, Board};
//! use ai_threes::ntuple::{default_patterns, TupleNetwork};
//!
//! // One-time table init
//! GameEngine::new();
//!
//! let mut slider = LearningSlider::new(0.1, TupleNetwork::new(&default_patterns()));
//! let mut board = Board::new();
//! board.set_rank(5, 1);
//! board.set_rank(6, 2);
//! if let Some(Action::Slide(dir)) = slider.take_action(&board) {
//!     assert!(board.slide(dir) >= 0);
//! }
//! ```
pub mod agent;
pub mod config;
pub mod engine;
pub mod ntuple;
pub mod stats;

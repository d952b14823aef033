//! Library crate for arcade-save: the persisted save document shared by the
//! mini-games, its storage backends, and the per-game session controllers.

pub mod config;
pub mod dao;
pub mod error;
pub mod games;
pub mod services;
pub mod state;

// src/handlers/mod.rs

pub mod auth;
pub mod live;
pub mod play;
pub mod quiz;
pub mod room;

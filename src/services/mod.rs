// src/services/mod.rs

pub mod autopilot;
pub mod export;
pub mod grading;
pub mod leaderboard;
pub mod lifecycle;
pub mod tally;

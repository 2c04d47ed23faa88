// src/services/mod.rs
pub mod conversation;
pub mod generator;
pub mod membership;
pub mod relay;

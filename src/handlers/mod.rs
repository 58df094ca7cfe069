// src/handlers/mod.rs

pub mod admin;
pub mod analysis;
pub mod attempt;

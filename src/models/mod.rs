// src/models/mod.rs

pub mod attempt;
pub mod question;
pub mod report;
pub mod user;

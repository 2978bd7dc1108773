// src/services/mod.rs

pub mod completion;
pub mod extract;
pub mod gemini;
pub mod generator;
pub mod prompt;
pub mod tunnel;

// src/services/mod.rs
//
// Collaborators that reach outside the process (language model) and the
// prompts built for them.

pub mod ai;
pub mod commentary;
pub mod quiz_generator;
pub mod video_analyzer;

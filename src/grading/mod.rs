// src/grading/mod.rs
//
// Pure grading core: no I/O, no shared state.

pub mod feedback;
pub mod scoring;
pub mod statistics;

pub use feedback::{Performance, compose_result, fallback_feedback};
pub use scoring::{Score, score_answers};
pub use statistics::{ClassStatistics, StatisticsReport, class_statistics};

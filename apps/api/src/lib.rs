//! Rankwise: matches and ranks job postings and training programs against a session's
//! recommendation profile.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod recommendation;
pub mod routes;
pub mod scoring;
pub mod sources;
pub mod state;
pub mod text;

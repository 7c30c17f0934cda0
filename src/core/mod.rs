//! Event loop, application state and orchestration

pub mod app;
pub mod events;
pub mod state;

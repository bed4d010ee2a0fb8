pub mod controller;
pub mod event;
pub mod phase;
pub mod state;
pub mod stats;

pub mod engine;
pub mod event;
pub mod level;
pub mod progress;
pub mod save;
pub mod session;
pub mod step;
pub mod world;

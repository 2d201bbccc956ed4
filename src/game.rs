pub mod gesture;
pub mod judgment;
pub mod note;
pub mod scores;
pub mod session;
pub mod snapshot;
pub mod spawner;
pub mod style;
pub mod sweep;

pub mod clock;
pub mod engine;
pub mod feedback;
pub mod transport;

mod engine;
mod ticker;

pub use engine::SessionTimer;
pub use ticker::Ticker;

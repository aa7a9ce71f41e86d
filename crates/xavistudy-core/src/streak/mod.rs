mod coordinator;
mod memo;

pub use coordinator::{StreakUpdateCoordinator, StreakUpdateOutcome};
pub use memo::{update_key, InMemoryMemo, KvStreakMemo, StreakMemo};

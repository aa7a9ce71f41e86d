mod controller;
mod machine;

pub use controller::StudyController;
pub use machine::{
    CancelReason, FinishTicket, SessionConfig, SessionOutcome, SessionStatus, StudySession,
    StudySessionMachine,
};

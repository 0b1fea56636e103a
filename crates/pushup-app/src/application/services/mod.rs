pub mod bot_service;
pub mod clock;
pub mod commentator;
pub mod replies;
pub mod scheduler;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use bot_service::BotService;
pub use clock::{Clock, LocalClock};
pub use commentator::Commentator;
pub use scheduler::{DailyJobScheduler, JobKind, JobRunner};
pub use state::{BotState, SharedState};

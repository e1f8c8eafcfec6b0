pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliArgs, Command};

pub use adapters::OpenTableClient;
pub use config::{BotConfig, ServiceProfile};
pub use core::{
    engine::ReservationEngine,
    poller::{AvailabilityPoller, PollOutcome, PollPolicy, ShutdownSignal},
    selector::select_slot,
    submitter::ReservationSubmitter,
};
pub use utils::error::{BotError, Result};

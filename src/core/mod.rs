pub mod engine;
pub mod poller;
pub mod selector;
pub mod submitter;

pub use crate::domain::model::{
    AvailabilityResponse, BookingDefaults, BookingOutcome, BookingPayload, RawResponse,
    ReservationRequest, Slot, SlotEntry,
};
pub use crate::domain::ports::ReservationApi;
pub use crate::utils::error::Result;

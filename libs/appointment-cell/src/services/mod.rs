pub mod availability;
pub mod booking;

pub use availability::{available_doctors, AvailabilityService};
pub use booking::BookingService;

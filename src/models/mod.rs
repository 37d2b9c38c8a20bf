//! Data models for the booking gateway

pub mod availability;
pub mod booking;
pub mod schedule;
pub mod session;
pub mod tenant;
pub mod wire;

// Re-export commonly used types
pub use availability::{AvailabilityRequest, AvailabilityResponse, Service};
pub use booking::{Booking, BookingStatus, CreateBooking};
pub use schedule::{Closure, WeeklySchedule};
pub use session::{Capability, Session};
pub use tenant::TenantConfig;

//! Contractor entities: profile, weekly schedule, and vacations.

pub mod profile;
pub mod schedule;
pub mod vacation;

pub use profile::ContractorProfile;
pub use schedule::{DayWindow, WeeklySchedule};
pub use vacation::{VacationRequest, VacationStatus};

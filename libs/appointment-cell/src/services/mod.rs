pub mod booking;
pub mod lifecycle;
pub mod reporting;
pub mod slots;
pub mod validation;

pub use booking::BookingService;
pub use lifecycle::LifecycleService;
pub use reporting::ReportingService;
pub use slots::SlotFinderService;
pub use validation::ValidationService;

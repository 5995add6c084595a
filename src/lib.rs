// Core modules
pub mod event;
pub mod booking;
pub mod clock;
pub mod seat_aggregator;
pub mod refund_policy;
pub mod validation;
pub mod cancellation;
pub mod report;
pub mod settings;

// Re-exports
pub use event::{Event, PolicyTiersSpec, PricingMode, RefundPolicy, TicketCategory};
pub use booking::{Booking, BookingSeats, TicketItem};
pub use clock::{Clock, FixedClock, SystemClock};
pub use seat_aggregator::{aggregate, category_breakdown, CategoryStats, SeatStats};
pub use refund_policy::{
    evaluate_refund, refund_amount, MissingTierStrategy, PolicyTiers, RefundPolicyEvaluator,
    RefundQuote, RefundTier,
};
pub use validation::{aggregate_strict, ValidationError};
pub use cancellation::{CancellationError, CancellationQuote, CancellationQuoter};
pub use report::{BookingLine, EventReport, ReportBuilder};
pub use settings::ValuationConfig;

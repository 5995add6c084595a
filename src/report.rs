use crate::booking::Booking;
use crate::clock::Clock;
use crate::event::{Event, PricingMode};
use crate::refund_policy::{refund_amount, RefundPolicyEvaluator, RefundQuote};
use crate::seat_aggregator::{aggregate, category_breakdown, CategoryStats, SeatStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingLine {
    pub booking_id: String,
    pub seats: u64,
    pub cancelled: bool,
    pub amount_paid: f64,
    /// What cancelling now would refund; `None` for cancelled bookings.
    pub refund_amount: Option<f64>,
}

/// Everything a dashboard shows for one event, computed as of `generated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReport {
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub pricing_mode: PricingMode,
    pub generated_at: DateTime<Utc>,
    pub stats: SeatStats,
    pub categories: Vec<CategoryStats>,
    pub refund: RefundQuote,
    pub bookings: Vec<BookingLine>,
}

impl EventReport {
    /// Sum of refunds owed if every active booking cancelled now.
    pub fn refund_exposure(&self) -> f64 {
        self.bookings.iter().filter_map(|b| b.refund_amount).sum()
    }

    pub fn gross_revenue(&self) -> f64 {
        self.bookings
            .iter()
            .filter(|b| !b.cancelled)
            .map(|b| b.amount_paid)
            .sum()
    }
}

pub struct ReportBuilder {
    evaluator: RefundPolicyEvaluator,
    clock: Arc<dyn Clock>,
}

impl ReportBuilder {
    pub fn new(evaluator: RefundPolicyEvaluator, clock: Arc<dyn Clock>) -> Self {
        Self { evaluator, clock }
    }

    pub fn build(&self, event: &Event, bookings: &[Booking]) -> EventReport {
        let now = self.clock.now();
        let refund = self.evaluator.evaluate_policy(event.date, &event.refund_policy, now);
        let event_started = event.date <= now;

        let lines = bookings
            .iter()
            .map(|booking| {
                let amount_paid = booking.amount_paid_for(event);
                let refundable = booking.is_active() && !event_started;
                BookingLine {
                    booking_id: booking.id.clone(),
                    seats: booking.seat_count(),
                    cancelled: booking.cancelled,
                    amount_paid,
                    refund_amount: refundable
                        .then(|| refund_amount(amount_paid, refund.refund_percentage)),
                }
            })
            .collect();

        EventReport {
            event_id: event.id.clone(),
            title: event.title.clone(),
            pricing_mode: event.pricing_mode,
            generated_at: now,
            stats: aggregate(event, bookings),
            categories: category_breakdown(event, bookings),
            refund,
            bookings: lines,
        }
    }
}

use crate::booking::Booking;
use crate::event::Event;
use crate::refund_policy::{refund_amount, RefundPolicyEvaluator, RefundQuote};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CancellationError {
    #[error("booking {booking_id} is already cancelled")]
    AlreadyCancelled { booking_id: String },

    #[error("booking {booking_id} belongs to event {booking_event}, not {event_id}")]
    WrongEvent {
        booking_id: String,
        booking_event: String,
        event_id: String,
    },

    #[error("event {event_id} started at {started_at}; bookings can no longer be cancelled")]
    EventStarted {
        event_id: String,
        started_at: DateTime<Utc>,
    },
}

/// What the customer is told before confirming a cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationQuote {
    pub booking_id: String,
    pub seats_released: u64,
    pub amount_paid: f64,
    pub refund: RefundQuote,
    pub refund_amount: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CancellationQuoter {
    evaluator: RefundPolicyEvaluator,
}

impl CancellationQuoter {
    pub fn new(evaluator: RefundPolicyEvaluator) -> Self {
        Self { evaluator }
    }

    /// Check that `booking` can still be cancelled and price the refund.
    pub fn quote(
        &self,
        event: &Event,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<CancellationQuote, CancellationError> {
        if booking.cancelled {
            return Err(CancellationError::AlreadyCancelled {
                booking_id: booking.id.clone(),
            });
        }

        if !booking.event_id.is_empty() && !event.id.is_empty() && booking.event_id != event.id {
            return Err(CancellationError::WrongEvent {
                booking_id: booking.id.clone(),
                booking_event: booking.event_id.clone(),
                event_id: event.id.clone(),
            });
        }

        if event.date <= now {
            return Err(CancellationError::EventStarted {
                event_id: event.id.clone(),
                started_at: event.date,
            });
        }

        let refund = self.evaluator.evaluate_policy(event.date, &event.refund_policy, now);
        let amount_paid = booking.amount_paid_for(event);

        Ok(CancellationQuote {
            booking_id: booking.id.clone(),
            seats_released: booking.seat_count(),
            amount_paid,
            refund_amount: refund_amount(amount_paid, refund.refund_percentage),
            refund,
        })
    }

    /// The booking as it looks once the cancellation goes through.
    pub fn apply(&self, booking: &Booking, quote: &CancellationQuote) -> Booking {
        info!(
            "Cancelling booking {} - releasing {} seats, refunding {:.2} ({}%)",
            booking.id, quote.seats_released, quote.refund_amount, quote.refund.refund_percentage
        );
        booking.clone().with_cancelled(true)
    }
}

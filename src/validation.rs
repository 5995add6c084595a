use crate::booking::{Booking, BookingSeats};
use crate::event::{saturating_total, Event, PolicyTiersSpec, PricingMode, RefundPolicy};
use crate::refund_policy::RefundTier;
use crate::seat_aggregator::{aggregate, SeatStats};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("event {event_id}: flat event seat count {value:?} is not a non-negative integer")]
    InvalidSeatCount { event_id: String, value: Option<f64> },

    #[error("event {event_id}: price {price} is negative or not a number")]
    InvalidPrice { event_id: String, price: f64 },

    #[error("event {event_id}: categorized event has no ticket categories")]
    NoCategories { event_id: String },

    #[error("event {event_id}: category {name:?} must have a positive seat count")]
    EmptyCategory { event_id: String, name: String },

    #[error("event {event_id}: category {name:?} is declared more than once")]
    DuplicateCategory { event_id: String, name: String },

    #[error("refund policy is missing tiers {missing:?}")]
    IncompletePolicy { missing: Vec<RefundTier> },

    #[error("refund percentage {value} for {tier:?} is outside 0..=100")]
    PercentageOutOfRange { tier: RefundTier, value: f64 },

    #[error("booking {booking_id} belongs to event {actual}, expected {expected}")]
    WrongEvent {
        booking_id: String,
        expected: String,
        actual: String,
    },

    #[error("booking {booking_id} carries no seat or ticket data")]
    MissingSeatData { booking_id: String },

    #[error("booking {booking_id} is {booking:?} but its event is {event:?}")]
    ModeMismatch {
        booking_id: String,
        booking: PricingMode,
        event: PricingMode,
    },

    #[error("booking {booking_id} reserves no seats")]
    NoSeats { booking_id: String },

    #[error("booking {booking_id} references unknown category {category:?}")]
    UnknownCategory { booking_id: String, category: String },

    #[error("booking {booking_id}: totalQuantity {declared} does not match ticket items ({counted})")]
    QuantityMismatch {
        booking_id: String,
        declared: u64,
        counted: u64,
    },
}

pub fn validate_event(event: &Event) -> Result<(), ValidationError> {
    let event_id = || event.id.clone();

    match event.pricing_mode {
        PricingMode::Flat => {
            let valid_seats = matches!(
                event.total_seats,
                Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0
            );
            if !valid_seats {
                return Err(ValidationError::InvalidSeatCount {
                    event_id: event_id(),
                    value: event.total_seats,
                });
            }
            if let Some(price) = event.price {
                check_price(&event.id, price)?;
            }
        }
        PricingMode::Categorized => {
            let categories = event.categories();
            if categories.is_empty() {
                return Err(ValidationError::NoCategories { event_id: event_id() });
            }

            let mut seen = HashSet::new();
            for category in categories {
                if category.seats() == 0 {
                    return Err(ValidationError::EmptyCategory {
                        event_id: event_id(),
                        name: category.name.clone(),
                    });
                }
                check_price(&event.id, category.price)?;
                if !seen.insert(category.name.as_str()) {
                    return Err(ValidationError::DuplicateCategory {
                        event_id: event_id(),
                        name: category.name.clone(),
                    });
                }
            }
        }
    }

    if let RefundPolicy::Custom(spec) = &event.refund_policy {
        validate_policy(spec)?;
    }

    Ok(())
}

pub fn validate_policy(spec: &PolicyTiersSpec) -> Result<(), ValidationError> {
    let missing = spec.missing_tiers();
    if !missing.is_empty() {
        return Err(ValidationError::IncompletePolicy { missing });
    }

    for tier in RefundTier::ALL {
        if let Some(value) = spec.tier(tier) {
            if !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::PercentageOutOfRange { tier, value });
            }
        }
    }

    Ok(())
}

pub fn validate_booking(booking: &Booking, event: &Event) -> Result<(), ValidationError> {
    if !booking.event_id.is_empty() && !event.id.is_empty() && booking.event_id != event.id {
        return Err(ValidationError::WrongEvent {
            booking_id: booking.id.clone(),
            expected: event.id.clone(),
            actual: booking.event_id.clone(),
        });
    }

    let mode = booking.seats.mode().ok_or_else(|| ValidationError::MissingSeatData {
        booking_id: booking.id.clone(),
    })?;
    if mode != event.pricing_mode {
        return Err(ValidationError::ModeMismatch {
            booking_id: booking.id.clone(),
            booking: mode,
            event: event.pricing_mode,
        });
    }

    if booking.seat_count() == 0 {
        return Err(ValidationError::NoSeats {
            booking_id: booking.id.clone(),
        });
    }

    if let BookingSeats::Categorized {
        items,
        total_quantity,
    } = &booking.seats
    {
        for item in items {
            if event.category(&item.category_name).is_none() {
                return Err(ValidationError::UnknownCategory {
                    booking_id: booking.id.clone(),
                    category: item.category_name.clone(),
                });
            }
            if item.quantity == 0 {
                return Err(ValidationError::NoSeats {
                    booking_id: booking.id.clone(),
                });
            }
        }

        let counted = saturating_total(items.iter().map(|i| i.quantity));
        if counted != *total_quantity {
            return Err(ValidationError::QuantityMismatch {
                booking_id: booking.id.clone(),
                declared: *total_quantity,
                counted,
            });
        }
    }

    Ok(())
}

/// [`aggregate`] after validating the event and every booking. Stops at the
/// first error. For contexts where counting malformed records as zero would
/// hide a data-integrity problem; the lenient paths never call into here.
pub fn aggregate_strict(event: &Event, bookings: &[Booking]) -> Result<SeatStats, ValidationError> {
    validate_event(event)?;
    for booking in bookings {
        validate_booking(booking, event)?;
    }
    Ok(aggregate(event, bookings))
}

fn check_price(event_id: &str, price: f64) -> Result<(), ValidationError> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidPrice {
            event_id: event_id.to_string(),
            price,
        })
    }
}

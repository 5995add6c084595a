use crate::booking::Booking;
use crate::event::{saturating_total, Event, PricingMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatStats {
    pub total_seats: u64,
    pub booked_seats: u64,
    /// `total_seats - booked_seats`. Goes negative when upstream data is
    /// over-booked; see [`SeatStats::clamped_available`].
    pub available_seats: i64,
    pub cancelled_seats: u64,
    pub percent_booked: u64,
}

impl SeatStats {
    fn from_counts(total_seats: u64, booked_seats: u64, cancelled_seats: u64) -> Self {
        Self {
            total_seats,
            booked_seats,
            available_seats: signed_difference(total_seats, booked_seats),
            cancelled_seats,
            percent_booked: percent_of(booked_seats, total_seats),
        }
    }

    /// Availability floored at zero, for call sites that sell seats.
    pub fn clamped_available(&self) -> u64 {
        self.available_seats.max(0) as u64
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_seats <= 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub name: String,
    pub price: f64,
    pub total_seats: u64,
    pub booked_seats: u64,
    pub cancelled_seats: u64,
    pub available_seats: i64,
}

/// Reduce an event's bookings into seat counts.
///
/// The caller passes only bookings that belong to `event`. Records missing
/// their seat data contribute zero instead of failing.
pub fn aggregate(event: &Event, bookings: &[Booking]) -> SeatStats {
    let total_seats = event.capacity();

    let (active, cancelled): (Vec<&Booking>, Vec<&Booking>) =
        bookings.iter().partition(|b| b.is_active());

    let booked_seats = saturating_total(active.iter().map(|b| b.seat_count()));
    let cancelled_seats = saturating_total(cancelled.iter().map(|b| b.seat_count()));

    SeatStats::from_counts(total_seats, booked_seats, cancelled_seats)
}

/// Per-category counts for categorized events, in the event's category
/// order. Flat events have no categories and yield an empty list.
pub fn category_breakdown(event: &Event, bookings: &[Booking]) -> Vec<CategoryStats> {
    if event.pricing_mode != PricingMode::Categorized {
        return Vec::new();
    }

    let mut booked: HashMap<&str, u64> = HashMap::new();
    let mut cancelled: HashMap<&str, u64> = HashMap::new();

    for booking in bookings {
        for item in booking.seats.items() {
            if event.category(&item.category_name).is_none() {
                debug!(
                    "Booking {} references unknown category {:?}",
                    booking.id, item.category_name
                );
                continue;
            }

            let counts = if booking.is_active() {
                &mut booked
            } else {
                &mut cancelled
            };
            let count = counts.entry(item.category_name.as_str()).or_default();
            *count = count.saturating_add(item.quantity);
        }
    }

    event
        .categories()
        .iter()
        .map(|category| {
            let total_seats = category.seats();
            let booked_seats = booked.get(category.name.as_str()).copied().unwrap_or(0);
            CategoryStats {
                name: category.name.clone(),
                price: category.price,
                total_seats,
                booked_seats,
                cancelled_seats: cancelled.get(category.name.as_str()).copied().unwrap_or(0),
                available_seats: signed_difference(total_seats, booked_seats),
            }
        })
        .collect()
}

/// `total - booked`, saturating at the bounds of `i64`.
fn signed_difference(total: u64, booked: u64) -> i64 {
    let diff = i128::from(total) - i128::from(booked);
    diff.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

fn percent_of(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u64
}

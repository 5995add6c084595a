use crate::event::{coerce_seats, saturating_total, Event, PricingMode};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketItem {
    #[serde(default)]
    pub category_name: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub quantity: u64,
    #[serde(default)]
    pub price_per_ticket: f64,
}

impl TicketItem {
    pub fn new(category_name: impl Into<String>, quantity: u64, price_per_ticket: f64) -> Self {
        Self {
            category_name: category_name.into(),
            quantity,
            price_per_ticket,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.quantity as f64 * self.price_per_ticket
    }
}

/// What a booking reserved. Decided once when the record is read so that
/// everything downstream can match on it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingSeats {
    Flat {
        seats: u64,
    },
    Categorized {
        items: Vec<TicketItem>,
        total_quantity: u64,
    },
    /// Neither seat count nor ticket data was present.
    Unspecified,
}

impl BookingSeats {
    pub fn count(&self) -> u64 {
        match self {
            BookingSeats::Flat { seats } => *seats,
            BookingSeats::Categorized { total_quantity, .. } => *total_quantity,
            BookingSeats::Unspecified => 0,
        }
    }

    pub fn mode(&self) -> Option<PricingMode> {
        match self {
            BookingSeats::Flat { .. } => Some(PricingMode::Flat),
            BookingSeats::Categorized { .. } => Some(PricingMode::Categorized),
            BookingSeats::Unspecified => None,
        }
    }

    pub fn items(&self) -> &[TicketItem] {
        match self {
            BookingSeats::Categorized { items, .. } => items.as_slice(),
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BookingRecord", into = "BookingRecord")]
pub struct Booking {
    pub id: String,
    pub event_id: String,
    pub cancelled: bool,
    pub seats: BookingSeats,
    /// Total the customer paid, when the API reports it.
    pub amount_paid: Option<f64>,
}

impl Booking {
    pub fn flat(id: impl Into<String>, event_id: impl Into<String>, seats: u64) -> Self {
        Self {
            id: id.into(),
            event_id: event_id.into(),
            cancelled: false,
            seats: BookingSeats::Flat { seats },
            amount_paid: None,
        }
    }

    pub fn categorized(
        id: impl Into<String>,
        event_id: impl Into<String>,
        items: Vec<TicketItem>,
    ) -> Self {
        let total_quantity = saturating_total(items.iter().map(|i| i.quantity));
        Self {
            id: id.into(),
            event_id: event_id.into(),
            cancelled: false,
            seats: BookingSeats::Categorized {
                items,
                total_quantity,
            },
            amount_paid: None,
        }
    }

    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn with_amount_paid(mut self, amount: f64) -> Self {
        self.amount_paid = Some(amount);
        self
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled
    }

    pub fn seat_count(&self) -> u64 {
        self.seats.count()
    }

    /// Amount paid for this booking. Falls back to the event's flat price or
    /// the per-ticket prices when the API did not report a total.
    pub fn amount_paid_for(&self, event: &Event) -> f64 {
        if let Some(amount) = self.amount_paid.filter(|a| a.is_finite() && *a >= 0.0) {
            return amount;
        }

        match &self.seats {
            BookingSeats::Flat { seats } => *seats as f64 * event.flat_price(),
            BookingSeats::Categorized { items, .. } => items.iter().map(TicketItem::subtotal).sum(),
            BookingSeats::Unspecified => 0.0,
        }
    }
}

/// Booking as the bookings API sends it: flat and categorized fields side by
/// side, any of them possibly missing.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    event_id: String,
    #[serde(default)]
    cancelled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    no_of_seats: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ticket_items: Option<Vec<TicketItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_quantity: Option<f64>,
    #[serde(default, alias = "totalPrice", skip_serializing_if = "Option::is_none")]
    total_amount: Option<f64>,
}

impl From<BookingRecord> for Booking {
    fn from(record: BookingRecord) -> Self {
        let items = record.ticket_items.unwrap_or_default();
        let has_ticket_data = !items.is_empty() || record.total_quantity.is_some();

        let seats = if has_ticket_data {
            let total_quantity = match record.total_quantity {
                Some(q) => coerce_seats(Some(q)),
                None => saturating_total(items.iter().map(|i| i.quantity)),
            };
            BookingSeats::Categorized {
                items,
                total_quantity,
            }
        } else if record.no_of_seats.is_some() {
            BookingSeats::Flat {
                seats: coerce_seats(record.no_of_seats),
            }
        } else {
            BookingSeats::Unspecified
        };

        Self {
            id: record.id,
            event_id: record.event_id,
            cancelled: record.cancelled.unwrap_or(false),
            seats,
            amount_paid: record.total_amount,
        }
    }
}

impl From<Booking> for BookingRecord {
    fn from(booking: Booking) -> Self {
        let mut record = BookingRecord {
            id: booking.id,
            event_id: booking.event_id,
            cancelled: Some(booking.cancelled),
            total_amount: booking.amount_paid,
            ..Default::default()
        };

        match booking.seats {
            BookingSeats::Flat { seats } => record.no_of_seats = Some(seats as f64),
            BookingSeats::Categorized {
                items,
                total_quantity,
            } => {
                record.ticket_items = Some(items);
                record.total_quantity = Some(total_quantity as f64);
            }
            BookingSeats::Unspecified => {}
        }

        record
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(coerce_seats(value))
}

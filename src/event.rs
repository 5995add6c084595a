use crate::refund_policy::RefundTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    Flat,
    Categorized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub total_seats: Option<f64>,
}

impl TicketCategory {
    pub fn new(name: impl Into<String>, price: f64, total_seats: u64) -> Self {
        Self {
            name: name.into(),
            price,
            total_seats: Some(total_seats as f64),
        }
    }

    pub fn seats(&self) -> u64 {
        coerce_seats(self.total_seats)
    }
}

/// Event record as returned by the events API.
///
/// `price` and `total_seats` only mean something for flat events,
/// `ticket_categories` only for categorized ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub pricing_mode: PricingMode,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub total_seats: Option<f64>,
    #[serde(default)]
    pub ticket_categories: Option<Vec<TicketCategory>>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub refund_policy: RefundPolicy,
}

impl Event {
    pub fn flat(id: impl Into<String>, date: DateTime<Utc>, price: f64, total_seats: u64) -> Self {
        Self {
            id: id.into(),
            title: None,
            pricing_mode: PricingMode::Flat,
            price: Some(price),
            total_seats: Some(total_seats as f64),
            ticket_categories: None,
            date,
            refund_policy: RefundPolicy::Default,
        }
    }

    pub fn categorized(
        id: impl Into<String>,
        date: DateTime<Utc>,
        categories: Vec<TicketCategory>,
    ) -> Self {
        Self {
            id: id.into(),
            title: None,
            pricing_mode: PricingMode::Categorized,
            price: None,
            total_seats: None,
            ticket_categories: Some(categories),
            date,
            refund_policy: RefundPolicy::Default,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_refund_policy(mut self, policy: RefundPolicy) -> Self {
        self.refund_policy = policy;
        self
    }

    pub fn categories(&self) -> &[TicketCategory] {
        self.ticket_categories.as_deref().unwrap_or_default()
    }

    pub fn category(&self, name: &str) -> Option<&TicketCategory> {
        self.categories().iter().find(|c| c.name == name)
    }

    /// Seat capacity under the event's pricing mode. Missing or invalid
    /// data resolves to 0.
    pub fn capacity(&self) -> u64 {
        match self.pricing_mode {
            PricingMode::Categorized => saturating_total(self.categories().iter().map(TicketCategory::seats)),
            PricingMode::Flat => coerce_seats(self.total_seats),
        }
    }

    /// Flat ticket price, 0 when absent or negative.
    pub fn flat_price(&self) -> f64 {
        self.price.filter(|p| p.is_finite() && *p >= 0.0).unwrap_or(0.0)
    }
}

/// Largest seat count a single record can carry; keeps every count
/// representable as a signed availability.
pub const MAX_SEATS: u64 = i64::MAX as u64;

/// Seat counts arrive as JSON numbers; anything that is not a finite
/// non-negative number counts as zero. Fractions truncate and huge values
/// cap at [`MAX_SEATS`].
pub(crate) fn coerce_seats(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => (v.trunc() as u64).min(MAX_SEATS),
        _ => 0,
    }
}

pub(crate) fn saturating_total(counts: impl IntoIterator<Item = u64>) -> u64 {
    counts.into_iter().fold(0u64, |acc, n| acc.saturating_add(n))
}

/// Custom refund tiers as they appear on the wire. Each tier may be absent;
/// see [`crate::refund_policy::MissingTierStrategy`] for how gaps resolve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTiersSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seven_days_or_more: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_to_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less_than_day: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PolicyTiersSpec {
    pub fn new(seven_days_or_more: f64, one_to_days: f64, less_than_day: f64) -> Self {
        Self {
            seven_days_or_more: Some(seven_days_or_more),
            one_to_days: Some(one_to_days),
            less_than_day: Some(less_than_day),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tier(&self, tier: RefundTier) -> Option<f64> {
        match tier {
            RefundTier::SevenDaysOrMore => self.seven_days_or_more,
            RefundTier::OneToSevenDays => self.one_to_days,
            RefundTier::LessThanDay => self.less_than_day,
        }
    }

    pub fn missing_tiers(&self) -> Vec<RefundTier> {
        RefundTier::ALL
            .into_iter()
            .filter(|tier| self.tier(*tier).is_none())
            .collect()
    }
}

/// `"default"` on the wire, or an object of custom tiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RefundPolicyWire", into = "RefundPolicyWire")]
pub enum RefundPolicy {
    #[default]
    Default,
    Custom(PolicyTiersSpec),
}

impl RefundPolicy {
    pub fn custom(&self) -> Option<&PolicyTiersSpec> {
        match self {
            RefundPolicy::Default => None,
            RefundPolicy::Custom(spec) => Some(spec),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RefundPolicyWire {
    Custom(PolicyTiersSpec),
    Sentinel(String),
    Null,
}

impl From<RefundPolicyWire> for RefundPolicy {
    fn from(wire: RefundPolicyWire) -> Self {
        match wire {
            RefundPolicyWire::Custom(spec) => RefundPolicy::Custom(spec),
            RefundPolicyWire::Sentinel(s) => {
                if s != "default" {
                    tracing::debug!("Unknown refund policy sentinel {:?}, using default tiers", s);
                }
                RefundPolicy::Default
            }
            RefundPolicyWire::Null => RefundPolicy::Default,
        }
    }
}

impl From<RefundPolicy> for RefundPolicyWire {
    fn from(policy: RefundPolicy) -> Self {
        match policy {
            RefundPolicy::Default => RefundPolicyWire::Sentinel("default".to_string()),
            RefundPolicy::Custom(spec) => RefundPolicyWire::Custom(spec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_categorized_event_from_api_shape() {
        let event: Event = serde_json::from_value(json!({
            "id": "evt-1",
            "title": "Jazz Night",
            "pricingMode": "categorized",
            "ticketCategories": [
                { "name": "VIP", "price": 120.0, "totalSeats": 10 },
                { "name": "General", "price": 40.0, "totalSeats": 90 }
            ],
            "date": "2026-11-01T19:00:00Z",
            "refundPolicy": "default"
        }))
        .unwrap();

        assert_eq!(event.pricing_mode, PricingMode::Categorized);
        assert_eq!(event.capacity(), 100);
        assert_eq!(event.category("VIP").map(|c| c.price), Some(120.0));
        assert_eq!(event.refund_policy, RefundPolicy::Default);
    }

    #[test]
    fn refund_policy_object_is_custom() {
        let event: Event = serde_json::from_value(json!({
            "pricingMode": "flat",
            "price": 25,
            "totalSeats": 50,
            "date": "2026-11-01T19:00:00Z",
            "refundPolicy": { "sevenDaysOrMore": 80, "oneToDays": 20 }
        }))
        .unwrap();

        let spec = event.refund_policy.custom().unwrap();
        assert_eq!(spec.seven_days_or_more, Some(80.0));
        assert_eq!(spec.missing_tiers(), vec![RefundTier::LessThanDay]);
    }

    #[test]
    fn missing_or_null_refund_policy_is_default() {
        for policy in [json!(null), json!("something-else")] {
            let event: Event = serde_json::from_value(json!({
                "pricingMode": "flat",
                "date": "2026-11-01T19:00:00Z",
                "refundPolicy": policy
            }))
            .unwrap();
            assert_eq!(event.refund_policy, RefundPolicy::Default);
        }

        let event: Event = serde_json::from_value(json!({
            "pricingMode": "flat",
            "date": "2026-11-01T19:00:00Z"
        }))
        .unwrap();
        assert_eq!(event.refund_policy, RefundPolicy::Default);
    }

    #[test]
    fn default_policy_serializes_as_sentinel() {
        let value = serde_json::to_value(RefundPolicy::Default).unwrap();
        assert_eq!(value, json!("default"));
    }

    #[test]
    fn invalid_flat_capacity_coerces_to_zero() {
        let date = "2026-11-01T19:00:00Z".parse().unwrap();
        let mut event = Event::flat("evt", date, 10.0, 0);

        event.total_seats = Some(-5.0);
        assert_eq!(event.capacity(), 0);

        event.total_seats = None;
        assert_eq!(event.capacity(), 0);

        event.total_seats = Some(12.7);
        assert_eq!(event.capacity(), 12);

        event.total_seats = Some(1e19);
        assert_eq!(event.capacity(), MAX_SEATS);
    }

    #[test]
    fn huge_category_capacities_saturate() {
        let date = "2026-11-01T19:00:00Z".parse().unwrap();
        let event = Event::categorized(
            "evt",
            date,
            vec![
                TicketCategory::new("A", 10.0, u64::MAX),
                TicketCategory::new("B", 10.0, u64::MAX),
                TicketCategory::new("C", 10.0, u64::MAX),
            ],
        );
        assert_eq!(event.category("A").map(TicketCategory::seats), Some(MAX_SEATS));
        assert_eq!(event.capacity(), u64::MAX);
    }

    #[test]
    fn categorized_event_without_categories_has_no_capacity() {
        let date = "2026-11-01T19:00:00Z".parse().unwrap();
        let mut event = Event::categorized("evt", date, Vec::new());
        assert_eq!(event.capacity(), 0);

        event.ticket_categories = None;
        event.total_seats = Some(40.0);
        assert_eq!(event.capacity(), 0);
    }
}

use crate::event::{PolicyTiersSpec, RefundPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const MS_PER_DAY: f64 = 86_400_000.0;

/// About 1.4 minutes. Keeps quotes from flapping between tiers right at a
/// 7-day or 1-day boundary.
pub const DEFAULT_EPSILON_DAYS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefundTier {
    #[serde(rename = "sevenDaysOrMore")]
    SevenDaysOrMore,
    #[serde(rename = "oneToDays")]
    OneToSevenDays,
    #[serde(rename = "lessThanDay")]
    LessThanDay,
}

impl RefundTier {
    /// In evaluation order.
    pub const ALL: [RefundTier; 3] = [
        RefundTier::SevenDaysOrMore,
        RefundTier::OneToSevenDays,
        RefundTier::LessThanDay,
    ];

    pub fn window(&self) -> &'static str {
        match self {
            RefundTier::SevenDaysOrMore => "7 or more days before the event",
            RefundTier::OneToSevenDays => "1 to 7 days before the event",
            RefundTier::LessThanDay => "less than 24 hours before the event",
        }
    }
}

/// A complete refund table, percentages in `0..=100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTiers {
    pub seven_days_or_more: f64,
    pub one_to_days: f64,
    pub less_than_day: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for PolicyTiers {
    fn default() -> Self {
        Self {
            seven_days_or_more: 100.0,
            one_to_days: 50.0,
            less_than_day: 0.0,
            description: None,
        }
    }
}

impl PolicyTiers {
    pub fn new(seven_days_or_more: f64, one_to_days: f64, less_than_day: f64) -> Self {
        Self {
            seven_days_or_more,
            one_to_days,
            less_than_day,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn percentage(&self, tier: RefundTier) -> f64 {
        match tier {
            RefundTier::SevenDaysOrMore => self.seven_days_or_more,
            RefundTier::OneToSevenDays => self.one_to_days,
            RefundTier::LessThanDay => self.less_than_day,
        }
    }

    fn set_percentage(&mut self, tier: RefundTier, value: f64) {
        match tier {
            RefundTier::SevenDaysOrMore => self.seven_days_or_more = value,
            RefundTier::OneToSevenDays => self.one_to_days = value,
            RefundTier::LessThanDay => self.less_than_day = value,
        }
    }
}

/// How a custom policy that leaves out a tier gets completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTierStrategy {
    /// The missing tier refunds nothing.
    #[default]
    Zero,
    /// The missing tier takes its value from the default table.
    UseDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundQuote {
    /// Rounded to one decimal place.
    pub days_until_event: f64,
    pub refund_percentage: f64,
    pub refund_label: String,
    pub is_custom_policy: bool,
    pub tier: RefundTier,
}

#[derive(Debug, Clone)]
pub struct RefundPolicyEvaluator {
    epsilon_days: f64,
    default_tiers: PolicyTiers,
    missing_tier: MissingTierStrategy,
}

impl Default for RefundPolicyEvaluator {
    fn default() -> Self {
        Self {
            epsilon_days: DEFAULT_EPSILON_DAYS,
            default_tiers: PolicyTiers::default(),
            missing_tier: MissingTierStrategy::default(),
        }
    }
}

impl RefundPolicyEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(mut self, epsilon_days: f64) -> Self {
        self.epsilon_days = epsilon_days;
        self
    }

    pub fn with_default_tiers(mut self, tiers: PolicyTiers) -> Self {
        self.default_tiers = tiers;
        self
    }

    pub fn with_missing_tier_strategy(mut self, strategy: MissingTierStrategy) -> Self {
        self.missing_tier = strategy;
        self
    }

    pub fn default_tiers(&self) -> &PolicyTiers {
        &self.default_tiers
    }

    /// Warn once about a policy that will not be used as written. Call when
    /// the policy is loaded; returns the tiers it leaves out.
    pub fn check_policy(&self, policy: &RefundPolicy) -> Vec<RefundTier> {
        let Some(spec) = policy.custom() else {
            return Vec::new();
        };

        let missing = spec.missing_tiers();
        if !missing.is_empty() {
            warn!(
                "Custom refund policy is missing tiers {:?}; resolving them with {:?}",
                missing, self.missing_tier
            );
        }
        for tier in RefundTier::ALL {
            if let Some(value) = spec.tier(tier).filter(|v| !(0.0..=100.0).contains(v)) {
                warn!(
                    "Refund percentage {} for tier {:?} is outside 0..=100 and will be clamped",
                    value, tier
                );
            }
        }

        missing
    }

    /// Complete a custom policy from the wire. Missing tiers follow the
    /// configured [`MissingTierStrategy`]; out-of-range values are clamped.
    pub fn resolve_policy(&self, spec: &PolicyTiersSpec) -> PolicyTiers {
        let missing = spec.missing_tiers();
        if !missing.is_empty() {
            debug!("Resolving missing tiers {:?} with {:?}", missing, self.missing_tier);
        }

        let mut tiers = PolicyTiers {
            description: spec.description.clone(),
            ..PolicyTiers::new(0.0, 0.0, 0.0)
        };

        for tier in RefundTier::ALL {
            let value = match (spec.tier(tier), self.missing_tier) {
                (Some(value), _) => clamp_percentage(tier, value),
                (None, MissingTierStrategy::Zero) => 0.0,
                (None, MissingTierStrategy::UseDefault) => self.default_tiers.percentage(tier),
            };
            tiers.set_percentage(tier, value);
        }

        tiers
    }

    pub fn tier_for(&self, days_until_event: f64) -> RefundTier {
        if days_until_event >= 7.0 - self.epsilon_days {
            RefundTier::SevenDaysOrMore
        } else if days_until_event >= 1.0 - self.epsilon_days {
            RefundTier::OneToSevenDays
        } else {
            RefundTier::LessThanDay
        }
    }

    pub fn evaluate(
        &self,
        event_date: DateTime<Utc>,
        custom_policy: Option<&PolicyTiers>,
        now: DateTime<Utc>,
    ) -> RefundQuote {
        let days = days_until(event_date, now);
        let tier = self.tier_for(days);
        let tiers = custom_policy.unwrap_or(&self.default_tiers);
        let refund_percentage = clamp_percentage(tier, tiers.percentage(tier));

        let refund_label = match custom_policy.and_then(|p| p.description.as_ref()) {
            Some(description) => description.clone(),
            None => format!("{}% refund ({})", refund_percentage, tier.window()),
        };

        RefundQuote {
            days_until_event: (days * 10.0).round() / 10.0,
            refund_percentage,
            refund_label,
            is_custom_policy: custom_policy.is_some(),
            tier,
        }
    }

    /// Evaluate against an event's policy field, resolving custom tiers
    /// first.
    pub fn evaluate_policy(
        &self,
        event_date: DateTime<Utc>,
        policy: &RefundPolicy,
        now: DateTime<Utc>,
    ) -> RefundQuote {
        match policy.custom() {
            Some(spec) => {
                let tiers = self.resolve_policy(spec);
                self.evaluate(event_date, Some(&tiers), now)
            }
            None => self.evaluate(event_date, None, now),
        }
    }
}

/// Quote with the default epsilon and tier table.
pub fn evaluate_refund(
    event_date: DateTime<Utc>,
    custom_policy: Option<&PolicyTiers>,
    now: DateTime<Utc>,
) -> RefundQuote {
    RefundPolicyEvaluator::default().evaluate(event_date, custom_policy, now)
}

/// Fractional days from `now` until `event_date`; negative once the event
/// has started.
pub fn days_until(event_date: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (event_date - now).num_milliseconds() as f64 / MS_PER_DAY
}

/// Refund for one booking, rounded to a whole currency unit.
pub fn refund_amount(price_paid: f64, refund_percentage: f64) -> f64 {
    (price_paid * refund_percentage / 100.0).round()
}

fn clamp_percentage(tier: RefundTier, value: f64) -> f64 {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        return value;
    }

    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };
    debug!(
        "Refund percentage {} for tier {:?} is outside 0..=100, using {}",
        value, tier, clamped
    );
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-10-18T12:00:00Z".parse().unwrap()
    }

    fn days_from_now(days: f64) -> DateTime<Utc> {
        now() + Duration::milliseconds((days * MS_PER_DAY).round() as i64)
    }

    fn tier_at(days: f64) -> RefundTier {
        evaluate_refund(days_from_now(days), None, now()).tier
    }

    #[test]
    fn tier_boundaries_respect_epsilon() {
        assert_eq!(tier_at(7.0005), RefundTier::SevenDaysOrMore);
        assert_eq!(tier_at(6.9995), RefundTier::SevenDaysOrMore);
        assert_eq!(tier_at(6.9), RefundTier::OneToSevenDays);
        assert_eq!(tier_at(0.9999), RefundTier::OneToSevenDays);
        assert_eq!(tier_at(0.5), RefundTier::LessThanDay);
    }

    #[test]
    fn default_table_percentages() {
        assert_eq!(evaluate_refund(days_from_now(30.0), None, now()).refund_percentage, 100.0);
        assert_eq!(evaluate_refund(days_from_now(3.0), None, now()).refund_percentage, 50.0);
        assert_eq!(evaluate_refund(days_from_now(0.2), None, now()).refund_percentage, 0.0);
    }

    #[test]
    fn custom_policy_supplies_percentage() {
        let policy = PolicyTiers::new(90.0, 40.0, 10.0);
        let quote = evaluate_refund(days_from_now(10.0), Some(&policy), now());

        assert_eq!(quote.refund_percentage, 90.0);
        assert!(quote.is_custom_policy);
        assert_eq!(quote.tier, RefundTier::SevenDaysOrMore);
    }

    #[test]
    fn days_are_reported_with_one_decimal() {
        let quote = evaluate_refund(days_from_now(2.46), None, now());
        assert_eq!(quote.days_until_event, 2.5);

        let quote = evaluate_refund(days_from_now(-1.33), None, now());
        assert_eq!(quote.days_until_event, -1.3);
        assert_eq!(quote.tier, RefundTier::LessThanDay);
    }

    #[test]
    fn generated_label_names_percentage_and_window() {
        let quote = evaluate_refund(days_from_now(3.0), None, now());
        assert_eq!(quote.refund_label, "50% refund (1 to 7 days before the event)");
        assert!(!quote.is_custom_policy);
    }

    #[test]
    fn custom_description_replaces_label() {
        let policy = PolicyTiers::new(80.0, 30.0, 0.0).with_description("No refunds on the day");
        let quote = evaluate_refund(days_from_now(0.1), Some(&policy), now());
        assert_eq!(quote.refund_label, "No refunds on the day");
        assert_eq!(quote.refund_percentage, 0.0);
    }

    #[test]
    fn partial_policy_defaults_missing_tiers_to_zero() {
        let spec = PolicyTiersSpec {
            seven_days_or_more: Some(75.0),
            ..Default::default()
        };
        let tiers = RefundPolicyEvaluator::new().resolve_policy(&spec);
        assert_eq!(tiers, PolicyTiers::new(75.0, 0.0, 0.0));
    }

    #[test]
    fn partial_policy_can_fall_back_to_default_table() {
        let spec = PolicyTiersSpec {
            seven_days_or_more: Some(75.0),
            ..Default::default()
        };
        let tiers = RefundPolicyEvaluator::new()
            .with_missing_tier_strategy(MissingTierStrategy::UseDefault)
            .resolve_policy(&spec);
        assert_eq!(tiers, PolicyTiers::new(75.0, 50.0, 0.0));
    }

    #[test]
    fn out_of_range_percentages_are_clamped() {
        let spec = PolicyTiersSpec::new(150.0, -5.0, f64::NAN);
        let tiers = RefundPolicyEvaluator::new().resolve_policy(&spec);
        assert_eq!(tiers, PolicyTiers::new(100.0, 0.0, 0.0));
    }

    #[test]
    fn evaluate_clamps_tiers_passed_directly() {
        let policy = PolicyTiers::new(150.0, -20.0, f64::NAN);

        let quote = evaluate_refund(days_from_now(10.0), Some(&policy), now());
        assert_eq!(quote.refund_percentage, 100.0);
        assert_eq!(quote.refund_label, "100% refund (7 or more days before the event)");

        assert_eq!(evaluate_refund(days_from_now(3.0), Some(&policy), now()).refund_percentage, 0.0);
        assert_eq!(evaluate_refund(days_from_now(0.5), Some(&policy), now()).refund_percentage, 0.0);
    }

    #[test]
    fn out_of_range_default_table_is_clamped() {
        let evaluator = RefundPolicyEvaluator::new().with_default_tiers(PolicyTiers::new(250.0, 50.0, 0.0));
        let quote = evaluator.evaluate(days_from_now(10.0), None, now());
        assert_eq!(quote.refund_percentage, 100.0);
    }

    #[test]
    fn check_policy_reports_missing_tiers() {
        let evaluator = RefundPolicyEvaluator::new();
        let partial = RefundPolicy::Custom(PolicyTiersSpec {
            one_to_days: Some(40.0),
            ..Default::default()
        });

        assert_eq!(
            evaluator.check_policy(&partial),
            vec![RefundTier::SevenDaysOrMore, RefundTier::LessThanDay]
        );
        assert!(evaluator
            .check_policy(&RefundPolicy::Custom(PolicyTiersSpec::new(100.0, 50.0, 0.0)))
            .is_empty());
        assert!(evaluator.check_policy(&RefundPolicy::Default).is_empty());
    }

    #[test]
    fn evaluate_policy_resolves_event_policy() {
        let policy = RefundPolicy::Custom(PolicyTiersSpec::new(60.0, 30.0, 5.0));
        let quote = RefundPolicyEvaluator::new().evaluate_policy(days_from_now(2.0), &policy, now());
        assert_eq!(quote.refund_percentage, 30.0);
        assert!(quote.is_custom_policy);

        let quote =
            RefundPolicyEvaluator::new().evaluate_policy(days_from_now(2.0), &RefundPolicy::Default, now());
        assert_eq!(quote.refund_percentage, 50.0);
        assert!(!quote.is_custom_policy);
    }

    #[test]
    fn wider_epsilon_moves_boundary() {
        let evaluator = RefundPolicyEvaluator::new().with_epsilon(0.1);
        assert_eq!(evaluator.tier_for(6.95), RefundTier::SevenDaysOrMore);
        assert_eq!(evaluator.tier_for(0.85), RefundTier::LessThanDay);
    }

    #[test]
    fn refund_amount_rounds_per_booking() {
        assert_eq!(refund_amount(149.0, 50.0), 75.0);
        assert_eq!(refund_amount(99.0, 33.0), 33.0);
        assert_eq!(refund_amount(0.0, 100.0), 0.0);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let policy = PolicyTiers::new(90.0, 40.0, 10.0);
        let date = days_from_now(4.2);
        assert_eq!(
            evaluate_refund(date, Some(&policy), now()),
            evaluate_refund(date, Some(&policy), now())
        );
    }
}

//! Session pricing. Rates are classified off the free-text Cal.com event
//! title, so the classifier works by substring match rather than an exact
//! catalogue of event types.

const REGULAR_HOURLY_RATE: f64 = 30.0;
const TEST_PREP_FLAT_RATE: f64 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingTier {
    Regular,
    TestPrep,
    /// Matched neither "regular" nor "sat"/"act". Billed at the Regular
    /// proportional rate.
    Unknown,
}

/// Classify an event title into a pricing tier. Test-prep detection wins
/// over the regular match so titles like "SAT Prep" never fall through to
/// hourly billing.
pub fn classify(event_type: &str) -> PricingTier {
    let lower = event_type.to_lowercase();
    if lower.contains("sat") || lower.contains("act") {
        PricingTier::TestPrep
    } else if lower.contains("regular") {
        PricingTier::Regular
    } else {
        PricingTier::Unknown
    }
}

/// Amount owed for a single session, in whole currency units.
///
/// Test-prep sessions are a flat rate regardless of duration. Regular
/// sessions use fixed amounts at the common 60/90/120 minute lengths and
/// fall back to proportional hourly billing for anything else.
pub fn price(duration_minutes: i64, event_type: &str) -> f64 {
    match classify(event_type) {
        PricingTier::TestPrep => TEST_PREP_FLAT_RATE,
        PricingTier::Regular | PricingTier::Unknown => match duration_minutes {
            60 => 30.0,
            90 => 45.0,
            120 => 60.0,
            other => (other as f64 / 60.0) * REGULAR_HOURLY_RATE,
        },
    }
}

#![deny(warnings)]

//! Economic models: resource pricing and deal valuation for Voidtrade.
//!
//! This module provides validated utilities for:
//! - Scarcity-driven unit prices inside a resource's price band
//! - Price contexts (factory input/output, consumer, maintenance)
//! - Trade deal gain and scoring with transport costs
//! - Seeded daily price noise for reproducible market drift

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sim_core::{PriceContext, ResourceDescription};
use thiserror::Error;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Fill ratio must be finite and within [0, 1].
    #[error("invalid fill ratio: {0}")]
    InvalidFillRatio(f32),
    /// Noise amplitude must be finite and within [0, 1).
    #[error("invalid noise amplitude: {0}")]
    InvalidAmplitude(f32),
    /// Numeric conversion to or from floating point failed.
    #[error("non-finite numeric conversion")]
    NonFinite,
}

/// Unit price of a resource given how full local stocks are.
///
/// An empty market (fill 0) trades at `max_price`, a saturated one
/// (fill 1) at `min_price`, linearly in between.
///
/// Example:
/// let p = scarcity_price(&desc, 0.5).unwrap(); // mid-band
pub fn scarcity_price(desc: &ResourceDescription, fill_ratio: f32) -> Result<Decimal, EconError> {
    if !fill_ratio.is_finite() || !(0.0..=1.0).contains(&fill_ratio) {
        return Err(EconError::InvalidFillRatio(fill_ratio));
    }
    let fill = Decimal::from_f32(fill_ratio).ok_or(EconError::NonFinite)?;
    Ok(desc.max_price - (desc.max_price - desc.min_price) * fill)
}

/// Price multiplier for a trading context.
///
/// Buying from a factory's output buffer is cheapest; selling to needy
/// factories, populations and fleet maintenance commands premiums.
pub fn context_factor(context: PriceContext) -> Decimal {
    match context {
        PriceContext::Default => Decimal::ONE,
        PriceContext::FactoryInput => Decimal::new(110, 2),
        PriceContext::FactoryOutput => Decimal::new(95, 2),
        PriceContext::ConsumerConsumption => Decimal::new(120, 2),
        PriceContext::MaintenanceConsumption => Decimal::new(135, 2),
    }
}

/// Unit price in a sector under a given context.
pub fn context_price(base: Decimal, context: PriceContext) -> Decimal {
    base * context_factor(context)
}

/// Integer credit value of `quantity` units at `unit_price`, floored,
/// never negative.
pub fn total_value(unit_price: Decimal, quantity: i64) -> i64 {
    if quantity <= 0 {
        return 0;
    }
    (unit_price * Decimal::from(quantity))
        .floor()
        .to_i64()
        .unwrap_or(0)
        .max(0)
}

/// Hauling cost for moving `quantity` units over `travel_days`.
pub fn transport_cost(fee: Decimal, quantity: i64, travel_days: u32) -> i64 {
    total_value(fee * Decimal::from(travel_days), quantity)
}

/// Net gain of buying `quantity` at `unit_buy`, hauling it `travel_days`
/// and selling at `unit_sell`. May be negative.
pub fn deal_gain(
    unit_buy: Decimal,
    unit_sell: Decimal,
    quantity: i64,
    travel_days: u32,
    fee: Decimal,
) -> i64 {
    total_value(unit_sell, quantity)
        - total_value(unit_buy, quantity)
        - transport_cost(fee, quantity, travel_days)
}

/// Deal profitability score: gain discounted by the days the ship is tied
/// up. Higher is better; non-positive scores are unusable deals.
pub fn deal_score(gain: i64, travel_days: u32) -> f32 {
    gain as f32 / (1.0 + travel_days as f32)
}

/// Inhabitants served by one unit of a consumer resource per day.
pub const CONSUMER_POP_PER_UNIT: i64 = 100;

/// Daily demand of a sector population for one consumer resource,
/// ceil-divided so any population at all consumes something.
pub fn consumer_daily_demand(population: u32) -> i64 {
    (population as i64 + CONSUMER_POP_PER_UNIT - 1) / CONSUMER_POP_PER_UNIT
}

/// Move `current` one step of `1/rate_den` toward `target`.
pub fn drift_toward(current: Decimal, target: Decimal, rate_den: i64) -> Decimal {
    if rate_den <= 1 {
        return target;
    }
    current + (target - current) / Decimal::from(rate_den)
}

/// Multiplicative daily price noise in [1 - amplitude, 1 + amplitude].
///
/// Seeded from the world seed and the (day, sector, resource) coordinates
/// so replays are bit-identical.
///
/// Example:
/// let f = price_noise_factor(42, 10, 2, 0, 0.02).unwrap();
pub fn price_noise_factor(
    seed: u64,
    day: u64,
    sector_index: u64,
    resource_index: u64,
    amplitude: f32,
) -> Result<f32, EconError> {
    if !amplitude.is_finite() || !(0.0..1.0).contains(&amplitude) {
        return Err(EconError::InvalidAmplitude(amplitude));
    }
    if amplitude == 0.0 {
        return Ok(1.0);
    }
    let mixed = seed
        ^ day.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ sector_index.wrapping_mul(0xBF58_476D_1CE4_E5B9)
        ^ resource_index.wrapping_mul(0x94D0_49BB_1331_11EB);
    let mut rng = ChaCha8Rng::seed_from_u64(mixed);
    let u: f32 = rng.gen_range(-amplitude..=amplitude);
    Ok(1.0 + u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::ResourceId;

    fn steel() -> ResourceDescription {
        ResourceDescription {
            id: ResourceId("steel".into()),
            name: "Steel".into(),
            min_price: Decimal::new(20, 0),
            max_price: Decimal::new(60, 0),
            transport_fee: Decimal::new(1, 0),
            is_consumer: false,
            is_maintenance: false,
        }
    }

    #[test]
    fn scarcity_price_hits_band_edges() {
        let desc = steel();
        assert_eq!(scarcity_price(&desc, 0.0).unwrap(), Decimal::new(60, 0));
        assert_eq!(scarcity_price(&desc, 1.0).unwrap(), Decimal::new(20, 0));
    }

    #[test]
    fn scarcity_price_rejects_bad_ratio() {
        let desc = steel();
        assert!(scarcity_price(&desc, -0.1).is_err());
        assert!(scarcity_price(&desc, 1.1).is_err());
        assert!(scarcity_price(&desc, f32::NAN).is_err());
    }

    #[test]
    fn context_ordering_makes_trading_profitable() {
        let base = Decimal::new(100, 0);
        let buy = context_price(base, PriceContext::FactoryOutput);
        let default = context_price(base, PriceContext::Default);
        let to_factory = context_price(base, PriceContext::FactoryInput);
        let to_people = context_price(base, PriceContext::ConsumerConsumption);
        let to_fleet = context_price(base, PriceContext::MaintenanceConsumption);
        assert!(buy < default);
        assert!(default < to_factory);
        assert!(to_factory < to_people);
        assert!(to_people < to_fleet);
    }

    #[test]
    fn deal_gain_subtracts_transport() {
        let gain = deal_gain(
            Decimal::new(20, 0),
            Decimal::new(30, 0),
            10,
            2,
            Decimal::new(1, 0),
        );
        // 300 - 200 - 20
        assert_eq!(gain, 80);
    }

    #[test]
    fn deal_score_discounts_travel_time() {
        assert!(deal_score(100, 0) > deal_score(100, 3));
        assert_eq!(deal_score(0, 5), 0.0);
    }

    #[test]
    fn noise_is_seeded_and_bounded() {
        let a = price_noise_factor(42, 10, 1, 2, 0.05).unwrap();
        let b = price_noise_factor(42, 10, 1, 2, 0.05).unwrap();
        assert_eq!(a, b);
        assert!((0.95..=1.05).contains(&a));
        assert_eq!(price_noise_factor(42, 10, 1, 2, 0.0).unwrap(), 1.0);
        let c = price_noise_factor(42, 11, 1, 2, 0.05).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn consumer_demand_is_ceil_divided() {
        assert_eq!(consumer_daily_demand(0), 0);
        assert_eq!(consumer_daily_demand(50), 1);
        assert_eq!(consumer_daily_demand(100), 1);
        assert_eq!(consumer_daily_demand(101), 2);
    }

    #[test]
    fn drift_converges_in_steps() {
        let p = drift_toward(Decimal::new(20, 0), Decimal::new(60, 0), 4);
        assert_eq!(p, Decimal::new(30, 0));
        assert_eq!(
            drift_toward(Decimal::new(20, 0), Decimal::new(60, 0), 1),
            Decimal::new(60, 0)
        );
    }

    proptest! {
        #[test]
        fn price_stays_inside_band(fill in 0.0f32..=1.0) {
            let desc = steel();
            let p = scarcity_price(&desc, fill).unwrap();
            prop_assert!(p >= desc.min_price);
            prop_assert!(p <= desc.max_price);
        }

        #[test]
        fn scarcer_is_never_cheaper(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let desc = steel();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let scarce = scarcity_price(&desc, lo).unwrap();
            let abundant = scarcity_price(&desc, hi).unwrap();
            prop_assert!(scarce >= abundant);
        }

        #[test]
        fn total_value_monotone_in_quantity(q in 0i64..100_000) {
            let unit = Decimal::new(37, 1);
            prop_assert!(total_value(unit, q + 1) >= total_value(unit, q));
            prop_assert!(total_value(unit, q) >= 0);
        }
    }
}

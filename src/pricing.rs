// src/pricing.rs
// Product price formula and popularity scale conversions. Pure functions, no error paths.

/// Final product price in USD.
///
/// The [0,1] popularity score is rescaled to 0-100 and offset by one, so a zero
/// score still prices at `weight * gold_price_per_gram`.
pub fn price(popularity_score: f64, weight: f64, gold_price_per_gram: f64) -> f64 {
    (popularity_score * 100.0 + 1.0) * weight * gold_price_per_gram
}

/// Popularity on a 0-5 scale, one decimal place (0.85 -> 4.3).
pub fn to_five_point_scale(popularity_score: f64) -> f64 {
    round_to(popularity_score * 5.0, 1)
}

/// Popularity as a percentage, one decimal place (0.85 -> 85.0).
pub fn to_percentage(popularity_score: f64) -> f64 {
    round_to(popularity_score * 100.0, 1)
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    const SCORES: [f64; 7] = [0.0, 0.01, 0.15, 0.5, 0.85, 0.99, 1.0];
    const WEIGHTS: [f64; 6] = [0.0, 0.5, 2.1, 3.4, 5.0, 12.75];
    const GOLD: [f64; 5] = [0.0, 1.0, 64.3, 65.0, 120.0];

    #[test]
    fn reference_product() {
        assert_eq!(price(0.85, 5.0, 65.0), 27950.0);
        assert_eq!(to_five_point_scale(0.85), 4.3);
        assert_eq!(to_percentage(0.85), 85.0);
    }

    #[test]
    fn zero_popularity_keeps_price_floor() {
        assert_eq!(price(0.0, 2.0, 65.0), 130.0);
        for (p, w, g) in iproduct!(SCORES, WEIGHTS, GOLD) {
            assert!(price(p, w, g) >= w * g, "floor broken for p={} w={} g={}", p, w, g);
        }
    }

    #[test]
    fn price_is_monotonic_in_each_argument() {
        for (w, g) in iproduct!(WEIGHTS, GOLD) {
            for pair in SCORES.windows(2) {
                assert!(price(pair[0], w, g) <= price(pair[1], w, g));
            }
        }
        for (p, g) in iproduct!(SCORES, GOLD) {
            for pair in WEIGHTS.windows(2) {
                assert!(price(p, pair[0], g) <= price(p, pair[1], g));
            }
        }
        for (p, w) in iproduct!(SCORES, WEIGHTS) {
            for pair in GOLD.windows(2) {
                assert!(price(p, w, pair[0]) <= price(p, w, pair[1]));
            }
        }
    }

    #[test]
    fn scales_stay_in_range() {
        for p in SCORES {
            let five = to_five_point_scale(p);
            let pct = to_percentage(p);
            assert!((0.0..=5.0).contains(&five), "five={}", five);
            assert!((0.0..=100.0).contains(&pct), "pct={}", pct);
        }
        assert_eq!(to_five_point_scale(0.0), 0.0);
        assert_eq!(to_five_point_scale(1.0), 5.0);
        assert_eq!(to_percentage(1.0), 100.0);
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(to_five_point_scale(0.51), 2.6);
        assert_eq!(to_five_point_scale(0.45), 2.3);
        assert_eq!(round_to(145.349, 2), 145.35);
    }
}

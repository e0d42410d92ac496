use radar_core::{Candle, CandleShape, FeatureSet, Regime, Trend};
use tracing::warn;

/// Strictly positive floor for a candle's high-low range. A violated
/// high >= low invariant degrades to this instead of dividing by zero.
const RANGE_EPSILON: f64 = 1e-9;

/// Bars averaged for the volume and range baselines
const BASELINE_BARS: usize = 20;

/// Extract the full feature set from a chronological candle sequence.
///
/// Sparse or malformed input never fails: any feature whose window is not
/// available falls back to its neutral default (trend=Range, ratios=1.0,
/// change=0.0).
pub fn extract_features(candles: &[Candle]) -> FeatureSet {
    if candles.is_empty() {
        warn!("no candle history available, using neutral features");
        return FeatureSet::default();
    }

    let trend = detect_trend(candles);

    FeatureSet {
        trend,
        regime: Regime::from_trend(trend),
        volume_ratio: volume_ratio(candles),
        change_5d: change_5d(candles),
        last_candle: last_candle_shape(candles),
        range_multiplier: range_multiplier(candles),
    }
}

/// Up iff close[last] > close[last-4] > close[last-9] (the 5th and 10th most
/// recent closes), Down iff the reverse strict chain holds, else Range.
/// Ties resolve to Range.
fn detect_trend(candles: &[Candle]) -> Trend {
    if candles.len() < 10 {
        return Trend::Range;
    }

    let last = candles[candles.len() - 1].close;
    let back_5 = candles[candles.len() - 5].close;
    let back_10 = candles[candles.len() - 10].close;

    if last > back_5 && back_5 > back_10 {
        Trend::Up
    } else if last < back_5 && back_5 < back_10 {
        Trend::Down
    } else {
        Trend::Range
    }
}

/// Last bar volume over the mean volume of the 20 bars preceding it.
fn volume_ratio(candles: &[Candle]) -> f64 {
    if candles.len() < BASELINE_BARS + 1 {
        return 1.0;
    }

    let window = &candles[candles.len() - 1 - BASELINE_BARS..candles.len() - 1];
    let mean = window.iter().map(|c| c.volume).sum::<f64>() / BASELINE_BARS as f64;

    if mean <= 0.0 {
        warn!("non-positive mean volume over baseline window, using neutral ratio");
        return 1.0;
    }

    candles[candles.len() - 1].volume / mean
}

/// Percent change of close from the 5th most recent bar to the last.
fn change_5d(candles: &[Candle]) -> f64 {
    if candles.len() < 5 {
        return 0.0;
    }

    let base = candles[candles.len() - 5].close;
    if base <= 0.0 {
        warn!("non-positive base close for 5-day change, using 0.0");
        return 0.0;
    }

    (candles[candles.len() - 1].close - base) / base * 100.0
}

/// Wick dominance and color of the most recent candle.
fn last_candle_shape(candles: &[Candle]) -> CandleShape {
    let last = match candles.last() {
        Some(c) => c,
        None => return CandleShape::default(),
    };

    let range = (last.high - last.low).max(RANGE_EPSILON);
    let body = (last.close - last.open).abs();

    CandleShape {
        wick_ratio: ((range - body) / range).max(0.0),
        is_green: last.close > last.open,
        is_red: last.close < last.open,
    }
}

/// Last bar's high-low range over the mean range of the 20 bars before it.
fn range_multiplier(candles: &[Candle]) -> f64 {
    if candles.len() < BASELINE_BARS + 1 {
        return 1.0;
    }

    let bar_range = |c: &Candle| (c.high - c.low).max(RANGE_EPSILON);

    let window = &candles[candles.len() - 1 - BASELINE_BARS..candles.len() - 1];
    let mean = window.iter().map(bar_range).sum::<f64>() / BASELINE_BARS as f64;

    bar_range(&candles[candles.len() - 1]) / mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{candle, flat_candles};
    use radar_core::Regime;

    #[test]
    fn test_short_history_returns_neutral_defaults() {
        for len in 0..5 {
            let candles = flat_candles(len, 100.0, 1000.0);
            let features = extract_features(&candles);

            assert_eq!(features.trend, Trend::Range);
            assert_eq!(features.regime, Regime::ChopMode);
            assert_eq!(features.volume_ratio, 1.0);
            assert_eq!(features.change_5d, 0.0);
            assert_eq!(features.range_multiplier, 1.0);
        }
    }

    #[test]
    fn test_uptrend_detection() {
        let candles: Vec<_> = (0..30)
            .map(|i| candle(i, 100.0 + i as f64, 1000.0))
            .collect();

        let features = extract_features(&candles);

        assert_eq!(features.trend, Trend::Up);
        assert_eq!(features.regime, Regime::BullMode);
    }

    #[test]
    fn test_downtrend_detection() {
        let candles: Vec<_> = (0..30)
            .map(|i| candle(i, 200.0 - i as f64, 1000.0))
            .collect();

        let features = extract_features(&candles);

        assert_eq!(features.trend, Trend::Down);
        assert_eq!(features.regime, Regime::BearMode);
    }

    #[test]
    fn test_flat_closes_resolve_to_range() {
        let candles = flat_candles(30, 100.0, 1000.0);
        assert_eq!(extract_features(&candles).trend, Trend::Range);
    }

    #[test]
    fn test_volume_ratio_against_baseline() {
        let mut candles = flat_candles(30, 100.0, 1000.0);
        candles.last_mut().unwrap().volume = 2500.0;

        let features = extract_features(&candles);
        assert!((features.volume_ratio - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_change_5d() {
        let mut candles = flat_candles(30, 100.0, 1000.0);
        candles.last_mut().unwrap().close = 96.0;

        let features = extract_features(&candles);
        assert!((features.change_5d - (-4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_wick_ratio_of_doji_like_candle() {
        // 10-point range, 1-point body: wick ratio 0.9
        let mut candles = flat_candles(30, 100.0, 1000.0);
        let last = candles.last_mut().unwrap();
        last.open = 100.0;
        last.close = 101.0;
        last.high = 106.0;
        last.low = 96.0;

        let features = extract_features(&candles);
        assert!((features.last_candle.wick_ratio - 0.9).abs() < 1e-9);
        assert!(features.last_candle.is_green);
        assert!(!features.last_candle.is_red);
    }

    #[test]
    fn test_zero_range_candle_does_not_divide_by_zero() {
        let mut candles = flat_candles(30, 100.0, 1000.0);
        let last = candles.last_mut().unwrap();
        last.open = 100.0;
        last.close = 100.0;
        last.high = 100.0;
        last.low = 100.0;

        let features = extract_features(&candles);
        assert!(features.last_candle.wick_ratio.is_finite());
        assert!(features.range_multiplier.is_finite());
    }

    #[test]
    fn test_inverted_high_low_is_clamped() {
        // Violated invariant: high below low
        let mut candles = flat_candles(30, 100.0, 1000.0);
        let last = candles.last_mut().unwrap();
        last.high = 90.0;
        last.low = 110.0;

        let features = extract_features(&candles);
        assert!(features.last_candle.wick_ratio.is_finite());
        assert!(features.range_multiplier.is_finite());
        assert!(features.range_multiplier >= 0.0);
    }
}

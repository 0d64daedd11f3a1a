//! Property tests for the aggregation math

use proptest::prelude::*;

use urbansense_core::constants::audio::SMOOTHING_ALPHA;
use urbansense_core::{CalendarTime, LoudnessReading, MinuteAggregator};

fn spl(value: f32) -> LoudnessReading {
    LoudnessReading {
        raw_dbfs: value - 120.0,
        smoothed_dbfs: value - 120.0,
        estimated_spl_db: value,
    }
}

fn minute_start(minute: u8) -> CalendarTime {
    CalendarTime {
        year: 2025,
        month: 7,
        day: 14,
        hour: 12,
        minute,
        second: 0,
    }
}

proptest! {
    #[test]
    fn flush_average_matches_sum_over_count(
        values in prop::collection::vec(20.0f32..100.0, 1..200)
    ) {
        let mut agg = MinuteAggregator::new();
        agg.observe(minute_start(0));
        for &v in &values {
            agg.add_loudness(&spl(v));
        }
        let bucket = agg.observe(minute_start(1)).unwrap();

        let expected_avg = values.iter().sum::<f32>() / values.len() as f32;
        let expected_max = values.iter().cloned().fold(f32::MIN, f32::max);

        prop_assert_eq!(bucket.loudness_samples as usize, values.len());
        prop_assert!((bucket.avg_spl_db - expected_avg).abs() < 1e-3);
        prop_assert_eq!(bucket.max_spl_db, expected_max);
        // The max bounds every accumulated value
        for &v in &values {
            prop_assert!(bucket.max_spl_db >= v);
        }
    }

    #[test]
    fn smoothing_recurrence_holds_for_arbitrary_states(
        prev in -150.0f32..10.0,
        instant in -150.0f32..10.0,
    ) {
        // The recurrence the estimator applies, checked symbolically
        let smoothed = (1.0 - SMOOTHING_ALPHA) * prev + SMOOTHING_ALPHA * instant;
        // Convexity: the result lies between the operands
        let lo = prev.min(instant);
        let hi = prev.max(instant);
        prop_assert!(smoothed >= lo - 1e-4);
        prop_assert!(smoothed <= hi + 1e-4);
    }

    #[test]
    fn bucket_key_equality_is_field_wise(minute_a in 0u8..60, minute_b in 0u8..60) {
        use urbansense_core::BucketKey;
        let a = BucketKey::from(minute_start(minute_a));
        let b = BucketKey::from(minute_start(minute_b));
        prop_assert_eq!(a == b, minute_a == minute_b);
        prop_assert_eq!(a, a);
    }
}

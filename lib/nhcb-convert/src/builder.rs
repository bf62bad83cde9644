use snafu::{ensure, OptionExt as _};
use tracing::trace;

use crate::{
    accumulator::TempHistogram,
    bounds::ProcessedBounds,
    error::{BoundsExceedBuckets, ConversionError, MissingBaseHistogram},
    histogram::{ConvertedHistogram, FloatHistogram, Histogram},
};

/// Builds the native histogram for a series from its accumulated classic histogram observations.
///
/// `upper_bounds` are walked in order, and the occupancy of each bucket is derived as the difference between its
/// cumulative count and the cumulative count of the previous bucket. When no cumulative count was recorded for an
/// upper bound, the previous cumulative count is carried forward, which leaves that bucket with an occupancy of zero.
///
/// The integer form is built from `base` when `temp` holds only integral values, and the float form is built from
/// `float_base` otherwise. The total count and sum are taken as-is from `temp`.
///
/// # Errors
///
/// If the base histogram for the required form is not provided, or if there are more upper bounds than buckets in it,
/// an error is returned.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn new_histogram(
    temp: TempHistogram, upper_bounds: &[f64], base: Option<&Histogram>, float_base: Option<&FloatHistogram>,
) -> Result<ConvertedHistogram, ConversionError> {
    if temp.has_float() {
        let mut fh = float_base.context(MissingBaseHistogram { fractional: true })?.clone();
        fill_occupancy(&temp, upper_bounds, fh.positive_buckets_mut(), |current, previous| {
            current - previous
        })?;
        fh.set_totals(temp.count(), temp.sum());

        Ok(ConvertedHistogram::Float(fh))
    } else {
        let mut h = base.context(MissingBaseHistogram { fractional: false })?.clone();

        // SAFETY: Without the float marker, every cumulative count and the total count is integral and within
        // `[0, 2^63)`, so these casts are exact and the differences cannot overflow.
        fill_occupancy(&temp, upper_bounds, h.positive_buckets_mut(), |current, previous| {
            current as i64 - previous as i64
        })?;
        h.set_totals(temp.count() as u64, temp.sum());

        Ok(ConvertedHistogram::Integer(h))
    }
}

/// Builds the native histogram for a series, picking the base histogram matching `temp` from `processed`.
///
/// # Errors
///
/// See [`new_histogram`].
pub fn build_histogram(temp: TempHistogram, processed: &ProcessedBounds) -> Result<ConvertedHistogram, ConversionError> {
    if temp.has_float() {
        let float_base = processed.base_float_histogram();
        new_histogram(temp, processed.upper_bounds(), None, Some(&float_base))
    } else {
        new_histogram(temp, processed.upper_bounds(), Some(processed.base_histogram()), None)
    }
}

fn fill_occupancy<T, F>(
    temp: &TempHistogram, upper_bounds: &[f64], buckets: &mut [T], occupancy: F,
) -> Result<(), ConversionError>
where
    F: Fn(f64, f64) -> T,
{
    ensure!(
        upper_bounds.len() <= buckets.len(),
        BoundsExceedBuckets {
            bounds: upper_bounds.len(),
            buckets: buckets.len()
        }
    );

    let mut previous = 0.0;
    for (bucket, upper_bound) in buckets.iter_mut().zip(upper_bounds.iter().copied()) {
        let current = match temp.bucket_count(upper_bound) {
            Some(current) => current,
            None => {
                trace!(upper_bound, cumulative = previous, "No count recorded for bucket. Carrying forward.");
                previous
            }
        };

        *bucket = occupancy(current, previous);
        previous = current;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::{collection::btree_map as arb_btree_map, prelude::*};

    use super::*;
    use crate::bounds::process_upper_bounds;

    fn temp_histogram(bucket_counts: &[(f64, f64)], count: f64, sum: f64) -> TempHistogram {
        let mut th = TempHistogram::new();
        for (upper_bound, cumulative) in bucket_counts {
            th.set_bucket_count(*upper_bound, *cumulative).unwrap();
        }
        th.set_count(count).unwrap();
        th.set_sum(sum);
        th
    }

    #[test]
    fn integer_histogram() {
        let th = temp_histogram(&[(1.0, 10.0), (2.0, 15.0), (3.0, 25.0)], 25.0, 50.0);
        let base = Histogram::with_custom_buckets(vec![1.0, 2.0, 3.0], 3);

        let converted = new_histogram(th, &[1.0, 2.0, 3.0], Some(&base), None).unwrap();
        let h = converted.as_integer().unwrap();
        assert_eq!(h.positive_buckets(), &[10, 5, 10]);
        assert_eq!(h.count(), 25);
        assert_eq!(h.sum(), 50.0);
        assert_eq!(h.custom_values(), &[1.0, 2.0, 3.0]);
        assert!(converted.as_float().is_none());
    }

    #[test]
    fn float_histogram() {
        let th = temp_histogram(&[(1.0, 10.5), (2.0, 14.5), (3.0, 24.0)], 25.0, 50.0);
        let float_base = FloatHistogram::with_custom_buckets(vec![1.0, 2.0, 3.0], 3);

        let converted = new_histogram(th, &[1.0, 2.0, 3.0], None, Some(&float_base)).unwrap();
        let fh = converted.as_float().unwrap();
        assert_eq!(fh.positive_buckets(), &[10.5, 4.0, 9.5]);
        assert_eq!(fh.count(), 25.0);
        assert_eq!(fh.sum(), 50.0);
        assert!(converted.as_integer().is_none());
    }

    #[test]
    fn missing_bucket_integer() {
        let th = temp_histogram(&[(1.0, 10.0), (3.0, 25.0)], 25.0, 50.0);
        let base = Histogram::with_custom_buckets(vec![1.0, 2.0, 3.0], 3);

        let converted = new_histogram(th, &[1.0, 2.0, 3.0], Some(&base), None).unwrap();
        let h = converted.as_integer().unwrap();
        assert_eq!(h.positive_buckets(), &[10, 0, 15]);
        assert_eq!(h.count(), 25);
        assert_eq!(h.sum(), 50.0);
    }

    #[test]
    fn missing_bucket_float() {
        let th = temp_histogram(&[(1.0, 10.5), (3.0, 24.0)], 25.0, 50.0);
        let float_base = FloatHistogram::with_custom_buckets(vec![1.0, 2.0, 3.0], 3);

        let converted = new_histogram(th, &[1.0, 2.0, 3.0], None, Some(&float_base)).unwrap();
        assert_eq!(converted.as_float().unwrap().positive_buckets(), &[10.5, 0.0, 13.5]);
    }

    #[test]
    fn base_histogram_left_untouched() {
        let th = temp_histogram(&[(1.0, 4.0)], 4.0, 2.0);
        let base = Histogram::with_custom_buckets(vec![1.0], 2);

        new_histogram(th, &[1.0, f64::INFINITY], Some(&base), None).unwrap();
        assert_eq!(base, Histogram::with_custom_buckets(vec![1.0], 2));
    }

    #[test]
    fn count_not_derived_from_buckets() {
        let th = temp_histogram(&[(1.0, 10.0), (2.0, 15.0)], 40.0, 7.0);
        let base = Histogram::with_custom_buckets(vec![1.0, 2.0], 2);

        let converted = new_histogram(th, &[1.0, 2.0], Some(&base), None).unwrap();
        assert_eq!(converted.count(), 40.0);
        assert_eq!(converted.sum(), 7.0);
    }

    #[test]
    fn counts_beyond_integer_range_use_float_form() {
        let large = 9_223_372_036_854_775_808.0;
        let th = temp_histogram(&[(1.0, 1.0), (f64::INFINITY, large)], large, 0.0);
        let processed = process_upper_bounds(&th.upper_bounds(), false);

        let converted = build_histogram(th, &processed).unwrap();
        let fh = converted.as_float().unwrap();
        assert_eq!(fh.positive_buckets(), &[1.0, large - 1.0]);
        assert_eq!(fh.count(), large);
    }

    #[test]
    fn bounds_exceed_buckets() {
        let th = temp_histogram(&[(1.0, 10.0), (2.0, 15.0), (3.0, 25.0)], 25.0, 50.0);
        let base = Histogram::with_custom_buckets(vec![1.0, 2.0], 2);

        let result = new_histogram(th, &[1.0, 2.0, 3.0], Some(&base), None);
        assert!(matches!(
            result,
            Err(ConversionError::BoundsExceedBuckets { bounds: 3, buckets: 2 })
        ));
    }

    #[test]
    fn missing_base_histogram() {
        let th = temp_histogram(&[(1.0, 0.5)], 0.5, 1.0);
        let base = Histogram::with_custom_buckets(vec![1.0], 1);

        let result = new_histogram(th, &[1.0], Some(&base), None);
        assert!(matches!(
            result,
            Err(ConversionError::MissingBaseHistogram { fractional: true })
        ));

        let th = temp_histogram(&[(1.0, 1.0)], 1.0, 1.0);
        let result = new_histogram(th, &[1.0], None, None);
        assert!(matches!(
            result,
            Err(ConversionError::MissingBaseHistogram { fractional: false })
        ));
    }

    #[test]
    fn infinite_bucket_populated() {
        let th = temp_histogram(&[(1.0, 10.0), (2.0, 15.0), (3.0, 25.0), (f64::INFINITY, 27.0)], 27.0, 60.0);
        let processed = process_upper_bounds(&th.upper_bounds(), false);

        let converted = build_histogram(th, &processed).unwrap();
        let h = converted.as_integer().unwrap();
        assert_eq!(h.custom_values(), &[1.0, 2.0, 3.0]);
        assert_eq!(h.positive_buckets(), &[10, 5, 10, 2]);
        assert_eq!(
            h.buckets().collect::<Vec<_>>(),
            vec![(1.0, 10), (2.0, 5), (3.0, 10), (f64::INFINITY, 2)]
        );
    }

    #[test]
    fn build_histogram_picks_float_base() {
        let th = temp_histogram(&[(0.5, 1.5), (f64::INFINITY, 2.0)], 2.0, 0.75);
        let processed = process_upper_bounds(&th.upper_bounds(), false);

        let converted = build_histogram(th, &processed).unwrap();
        let fh = converted.as_float().unwrap();
        assert_eq!(fh.custom_values(), &[0.5]);
        assert_eq!(fh.positive_buckets(), &[1.5, 0.5]);
        assert_eq!(fh.count(), 2.0);
    }

    #[test]
    fn empty_bounds() {
        let th = temp_histogram(&[], 3.0, 4.0);
        let processed = process_upper_bounds(&[], false);

        let converted = build_histogram(th, &processed).unwrap();
        let h = converted.as_integer().unwrap();
        assert!(h.positive_buckets().is_empty());
        assert_eq!(h.count(), 3);
        assert_eq!(h.sum(), 4.0);
    }

    // Cumulative counts for a subset of the upper bounds `0..16`, non-decreasing in upper bound order.
    fn arb_cumulative_counts() -> impl Strategy<Value = Vec<(f64, f64)>> {
        arb_btree_map(0u8..16, 0u32..100, 0..16).prop_map(|increments| {
            let mut cumulative = 0.0;
            increments
                .into_iter()
                .map(|(upper_bound, increment)| {
                    cumulative += f64::from(increment);
                    (f64::from(upper_bound), cumulative)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn property_test_occupancy_sums_to_largest_cumulative(bucket_counts in arb_cumulative_counts()) {
            let upper_bounds = (0u8..16).map(f64::from).collect::<Vec<_>>();
            let largest = bucket_counts.last().map(|(_, cumulative)| *cumulative).unwrap_or(0.0);
            let th = temp_histogram(&bucket_counts, largest, 0.0);
            let processed = process_upper_bounds(&upper_bounds, false);

            let converted = build_histogram(th, &processed).unwrap();
            let total = converted.as_integer().unwrap().positive_buckets().iter().sum::<i64>();
            prop_assert_eq!(total as f64, largest);
        }

        #[test]
        fn property_test_missing_bound_carries_forward(bucket_counts in arb_cumulative_counts(), missing in 0u8..16) {
            // Dropping the observation for one upper bound zeroes its bucket and folds its occupancy into the next
            // observed bucket, without changing any other bucket.
            let upper_bounds = (0u8..16).map(f64::from).collect::<Vec<_>>();
            let missing = f64::from(missing);
            let processed = process_upper_bounds(&upper_bounds, false);

            let full = build_histogram(temp_histogram(&bucket_counts, 0.0, 0.0), &processed).unwrap();
            let partial_counts = bucket_counts.iter().copied().filter(|(ub, _)| *ub != missing).collect::<Vec<_>>();
            let partial = build_histogram(temp_histogram(&partial_counts, 0.0, 0.0), &processed).unwrap();

            let full = full.as_integer().unwrap().positive_buckets().to_vec();
            let partial = partial.as_integer().unwrap().positive_buckets().to_vec();
            let missing_idx = missing as usize;
            let next_observed = partial_counts
                .iter()
                .map(|(ub, _)| *ub as usize)
                .find(|idx| *idx > missing_idx);

            prop_assert_eq!(partial[missing_idx], 0);
            for idx in 0..upper_bounds.len() {
                if idx == missing_idx {
                    continue;
                }
                if Some(idx) == next_observed {
                    prop_assert_eq!(partial[idx], full[idx] + full[missing_idx]);
                } else {
                    prop_assert_eq!(partial[idx], full[idx]);
                }
            }
        }
    }
}

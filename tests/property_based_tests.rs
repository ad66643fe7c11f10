//! Property-based tests over the reporting pipeline
//!
//! Invariants covered:
//! 1. Histogram construction never loses or invents samples
//! 2. Explicit bin counts are honored whenever the data has spread
//! 3. Wildcard-free partition patterns behave as exact equality
//! 4. Duration parsing and formatting agree with each other
//! 5. The filter accounts for every input row exactly once
//! 6. Means stay inside the sample bounds

use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_histogram_counts_every_sample(
        samples in prop::collection::vec(0.0f64..100_000.0, 1..200),
    ) {
        use slurm_waiting_times::histogram::{build_histogram, Unit};

        let hist = build_histogram(&samples, None, Unit::Seconds).unwrap();

        let total: u64 = hist.counts.iter().sum();
        prop_assert_eq!(total as usize, samples.len());
        prop_assert_eq!(hist.edges.len(), hist.counts.len() + 1);

        for pair in hist.edges.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(hist.edges[0], min);
        prop_assert!(*hist.edges.last().unwrap() >= max);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_explicit_bin_count_is_honored(
        samples in prop::collection::vec(0.0f64..10_000.0, 2..100),
        bins in 1usize..40,
    ) {
        use slurm_waiting_times::histogram::{build_histogram, Unit};

        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assume!(max > min);

        let hist = build_histogram(&samples, Some(bins), Unit::Seconds).unwrap();
        prop_assert_eq!(hist.bin_count(), bins);
        prop_assert_eq!(hist.counts.iter().sum::<u64>() as usize, samples.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_wildcard_free_pattern_is_exact_equality(
        name in "[A-Za-z0-9_.-]{1,16}",
        candidate in "[A-Za-z0-9_.-]{1,16}",
    ) {
        use slurm_waiting_times::filter::GlobPattern;

        let glob = GlobPattern::new(&name).unwrap();
        prop_assert!(glob.matches(&name));
        prop_assert_eq!(glob.matches(&candidate), name == candidate);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_duration_parse_and_format_agree(
        days in 0u32..30,
        hours in 0u32..24,
        minutes in 0u32..60,
        seconds in 0u32..60,
    ) {
        use slurm_waiting_times::time_utils::{format_hms, parse_duration_to_seconds};

        let total = f64::from(days * 86_400 + hours * 3_600 + minutes * 60 + seconds);

        let with_days = format!("{days}-{hours:02}:{minutes:02}:{seconds:02}");
        prop_assert_eq!(parse_duration_to_seconds(&with_days).unwrap(), total);

        // format_hms folds days into the hour field; parsing accepts that too
        prop_assert_eq!(parse_duration_to_seconds(&format_hms(total)).unwrap(), total);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_filter_accounts_for_every_row(
        jobs in prop::collection::vec((0i64..100_000, -500i64..100_000), 1..50),
        include_steps: bool,
    ) {
        use chrono::Duration;
        use chrono::TimeZone;
        use slurm_waiting_times::filter::{filter_rows, FilterConfig};
        use slurm_waiting_times::record::SacctRow;

        let base = chrono_tz::UTC.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let rows: Vec<SacctRow> = jobs
            .iter()
            .enumerate()
            .map(|(i, &(submit_off, wait))| SacctRow {
                job_id: if i % 3 == 0 {
                    format!("{i}.batch")
                } else {
                    i.to_string()
                },
                user: format!("user{}", i % 4),
                submit: Some(base + Duration::seconds(submit_off)),
                start: Some(base + Duration::seconds(submit_off + wait)),
                state: "COMPLETED".to_string(),
                partition: "main".to_string(),
                nodes: Some(1),
                alloc_tres: None,
                elapsed_seconds: Some(60.0),
            })
            .collect();

        let config = FilterConfig {
            include_steps,
            ..FilterConfig::default()
        };
        let outcome = filter_rows(&rows, &config);

        prop_assert_eq!(
            outcome.records.len() + outcome.drops.total() as usize,
            rows.len()
        );
        for record in &outcome.records {
            prop_assert!(record.wait_seconds >= 0.0);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_mean_lies_within_sample_bounds(
        waits in prop::collection::vec(0u32..2_000_000, 1..500),
    ) {
        use slurm_waiting_times::stats::WaitStats;

        let samples: Vec<f64> = waits.iter().map(|&w| f64::from(w)).collect();
        let stats = WaitStats::from_samples(&samples);

        prop_assert_eq!(stats.count, samples.len());
        let mean = stats.mean_seconds.unwrap();
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(min <= mean && mean <= max);
    }
}

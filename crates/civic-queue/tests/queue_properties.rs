use chrono::{DateTime, Duration, TimeZone, Utc};
use civic_queue::workflows::prioritization::{
    rank, score, urgency, Category, RequestRecord, SlaTable, URGENCY_HORIZON_DAYS,
};
use proptest::prelude::*;

fn evaluation_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

fn category(index: u8) -> Category {
    match index % 7 {
        0 => Category::CertificatUrbanism,
        1 => Category::AutorizatieConstruire,
        2 => Category::AutorizatieDemolare,
        3 => Category::AvizPreliminar,
        4 => Category::AvizOportunitate,
        5 => Category::Altele,
        _ => Category::Unrecognized("racordare_utilitati".to_string()),
    }
}

/// (category, submitted hours ago, override hours from now)
type RequestShape = (u8, i64, Option<i64>);

fn request_shapes() -> impl Strategy<Value = Vec<RequestShape>> {
    prop::collection::vec(
        (
            0u8..7,
            0i64..(24 * 200),
            prop::option::of(-(24 * 60)..(24 * 120i64)),
        ),
        0..40,
    )
}

fn build_batch(shapes: &[RequestShape]) -> Vec<RequestRecord> {
    let now = evaluation_time();
    shapes
        .iter()
        .enumerate()
        .map(|(index, (category_index, submitted_hours, override_hours))| {
            // Coarse submission times so ties on every key actually occur.
            let submitted = now - Duration::hours(submitted_hours - submitted_hours % 24);
            let record =
                RequestRecord::new(format!("req-{index}"), category(*category_index), submitted);
            match override_hours {
                Some(hours) => record.with_legal_due_date(now + Duration::hours(*hours)),
                None => record,
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn scores_follow_urgency_and_backlog(shapes in request_shapes()) {
        let requests = build_batch(&shapes);
        let batch = rank(&requests, &SlaTable::standard(), evaluation_time()).expect("ranks");

        for result in &batch.results {
            let expected_urgency = (URGENCY_HORIZON_DAYS - result.days_left.max(0)).max(0);
            prop_assert_eq!(result.urgency, expected_urgency);
            prop_assert_eq!(urgency(result.days_left), expected_urgency);
            prop_assert_eq!(
                result.priority_score,
                expected_urgency * 2 + result.backlog_in_category as i64
            );
            prop_assert_eq!(
                result.priority_score,
                score(result.days_left, result.backlog_in_category)
            );
        }
    }

    #[test]
    fn backlog_is_uniform_within_a_category(shapes in request_shapes()) {
        let requests = build_batch(&shapes);
        let batch = rank(&requests, &SlaTable::standard(), evaluation_time()).expect("ranks");

        for result in &batch.results {
            let expected = requests
                .iter()
                .filter(|request| request.category == result.category)
                .count();
            prop_assert_eq!(result.backlog_in_category, expected);
        }
    }

    #[test]
    fn output_is_a_ranked_permutation_in_queue_order(shapes in request_shapes()) {
        let requests = build_batch(&shapes);
        let batch = rank(&requests, &SlaTable::standard(), evaluation_time()).expect("ranks");

        prop_assert_eq!(batch.results.len(), requests.len());
        let mut seen: Vec<_> = batch.results.iter().map(|result| result.id.clone()).collect();
        seen.sort();
        let mut expected: Vec<_> = requests.iter().map(|request| request.id.clone()).collect();
        expected.sort();
        prop_assert_eq!(seen, expected);

        for (position, result) in batch.results.iter().enumerate() {
            prop_assert_eq!(result.rank, position);
        }

        let input_index = |id: &str| -> usize {
            id.trim_start_matches("req-").parse().expect("generated id")
        };
        for pair in batch.results.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let key_a = (a.days_left, -a.priority_score, a.submitted_at);
            let key_b = (b.days_left, -b.priority_score, b.submitted_at);
            prop_assert!(key_a <= key_b);
            if key_a == key_b {
                prop_assert!(input_index(a.id.as_str()) < input_index(b.id.as_str()));
            }
        }
    }

    #[test]
    fn ranking_is_repeatable(shapes in request_shapes()) {
        let requests = build_batch(&shapes);
        let first = rank(&requests, &SlaTable::standard(), evaluation_time()).expect("ranks");
        let second = rank(&requests, &SlaTable::standard(), evaluation_time()).expect("ranks");
        prop_assert_eq!(first, second);
    }
}

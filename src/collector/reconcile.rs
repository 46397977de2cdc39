//! Zero-fill reconciliation.
//!
//! A (type, status) combination with no current tasks is still a data point.
//! Emitting it as an explicit zero keeps dashboards drawing a flat line
//! instead of a gap.

use std::collections::HashSet;

use crate::types::{LabelUniverse, MetricSample, TaskCountRecord};

/// Known combinations absent from `observed`, in universe order.
///
/// Set difference between `universe.types × universe.statuses` and the
/// observed `(type, status)` keys.
pub fn missing_pairs<'u>(
    observed: &[TaskCountRecord],
    universe: &'u LabelUniverse,
) -> Vec<(&'u str, &'u str)> {
    let seen: HashSet<(&str, &str)> = observed.iter().map(TaskCountRecord::key).collect();
    universe.pairs().filter(|pair| !seen.contains(pair)).collect()
}

/// Turn decoded records into the samples to emit.
///
/// Observed records come first, unchanged and in upstream order, including
/// duplicates and combinations outside the universe. With a universe,
/// one zero sample is appended per known combination that was not observed.
/// Without one, the output is exactly the observed records.
pub fn reconcile(records: Vec<TaskCountRecord>, universe: Option<&LabelUniverse>) -> Vec<MetricSample> {
    let backfill: Vec<MetricSample> = universe
        .map(|u| {
            missing_pairs(&records, u)
                .into_iter()
                .map(|(task_type, status)| MetricSample::zero(task_type, status))
                .collect()
        })
        .unwrap_or_default();

    let mut samples: Vec<MetricSample> = Vec::with_capacity(records.len() + backfill.len());
    samples.extend(records.into_iter().map(MetricSample::from));
    samples.extend(backfill);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults;
    use std::collections::HashMap;

    fn default_universe() -> LabelUniverse {
        LabelUniverse::new(
            defaults::to_owned_list(defaults::KNOWN_TYPES),
            defaults::to_owned_list(defaults::KNOWN_RUNNER_STATUSES),
        )
    }

    fn by_key(samples: &[MetricSample]) -> HashMap<(String, String), u64> {
        samples
            .iter()
            .map(|s| ((s.task_type.clone(), s.status.clone()), s.total))
            .collect()
    }

    #[test]
    fn test_single_running_index_task_fills_to_twenty() {
        let universe = default_universe();
        let samples = reconcile(vec![TaskCountRecord::new("index", "RUNNING", 3)], Some(&universe));

        assert_eq!(samples.len(), 20);
        let totals = by_key(&samples);
        assert_eq!(totals.len(), 20, "no duplicate pairs");
        for (key, total) in &totals {
            if key.0 == "index" && key.1 == "RUNNING" {
                assert_eq!(*total, 3);
            } else {
                assert_eq!(*total, 0, "{key:?}");
            }
        }
        assert_eq!(samples.iter().filter(|s| s.synthetic).count(), 19);
    }

    #[test]
    fn test_empty_response_yields_all_zeros() {
        let universe = default_universe();
        let samples = reconcile(Vec::new(), Some(&universe));
        assert_eq!(samples.len(), universe.len());
        assert!(samples.iter().all(|s| s.total == 0 && s.synthetic));
    }

    #[test]
    fn test_count_is_product_for_any_in_universe_subset() {
        let universe = default_universe();
        let all: Vec<_> = universe.pairs().map(|(t, s)| (t.to_string(), s.to_string())).collect();

        for take in [0, 1, 7, 19, 20] {
            let records: Vec<_> = all
                .iter()
                .take(take)
                .enumerate()
                .map(|(i, (t, s))| TaskCountRecord::new(t.clone(), s.clone(), i as u64 + 1))
                .collect();
            let samples = reconcile(records, Some(&universe));
            assert_eq!(samples.len(), 20, "take={take}");
            assert_eq!(samples.iter().filter(|s| !s.synthetic).count(), take);
        }
    }

    #[test]
    fn test_observed_totals_pass_through_exactly() {
        let universe = default_universe();
        let records = vec![
            TaskCountRecord::new("kill", "PENDING", 12),
            TaskCountRecord::new("compact", "WAITING", u64::from(u32::MAX) + 5),
        ];
        let totals = by_key(&reconcile(records, Some(&universe)));
        assert_eq!(totals[&("kill".to_string(), "PENDING".to_string())], 12);
        assert_eq!(
            totals[&("compact".to_string(), "WAITING".to_string())],
            u64::from(u32::MAX) + 5
        );
    }

    #[test]
    fn test_complete_response_adds_nothing() {
        let universe = default_universe();
        let records: Vec<_> = universe
            .pairs()
            .map(|(t, s)| TaskCountRecord::new(t, s, 2))
            .collect();
        let expected = by_key(&records.iter().cloned().map(MetricSample::from).collect::<Vec<_>>());

        let samples = reconcile(records, Some(&universe));
        assert!(samples.iter().all(|s| !s.synthetic));
        assert_eq!(by_key(&samples), expected);
    }

    #[test]
    fn test_without_universe_emits_exactly_observed() {
        let records = vec![
            TaskCountRecord::new("index", "RUNNING", 3),
            TaskCountRecord::new("noop", "SUCCESS", 1),
        ];
        let samples = reconcile(records.clone(), None);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], MetricSample::from(records[0].clone()));
        assert_eq!(samples[1], MetricSample::from(records[1].clone()));

        assert!(reconcile(Vec::new(), None).is_empty());
    }

    #[test]
    fn test_records_outside_universe_are_kept() {
        let universe = default_universe();
        let samples = reconcile(vec![TaskCountRecord::new("noop", "RUNNING", 4)], Some(&universe));
        assert_eq!(samples.len(), 21);
        assert_eq!(samples[0].task_type, "noop");
        assert_eq!(samples[0].total, 4);
    }

    #[test]
    fn test_duplicate_upstream_rows_are_all_emitted() {
        let universe = default_universe();
        let records = vec![
            TaskCountRecord::new("index", "RUNNING", 3),
            TaskCountRecord::new("index", "RUNNING", 5),
        ];
        let samples = reconcile(records, Some(&universe));
        let dupes: Vec<_> = samples
            .iter()
            .filter(|s| s.key() == ("index", "RUNNING"))
            .map(|s| s.total)
            .collect();
        assert_eq!(dupes, vec![3, 5]);
        assert_eq!(samples.len(), 21);
    }

    #[test]
    fn test_missing_pairs_is_set_difference() {
        let universe = LabelUniverse::new(
            vec!["a".to_string(), "b".to_string()],
            vec!["X".to_string(), "Y".to_string()],
        );
        let observed = vec![
            TaskCountRecord::new("a", "X", 1),
            TaskCountRecord::new("b", "Y", 1),
            TaskCountRecord::new("c", "X", 1),
        ];
        assert_eq!(missing_pairs(&observed, &universe), vec![("b", "X"), ("a", "Y")]);
    }
}

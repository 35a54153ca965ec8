use super::model::{BenchmarkRecord, ConvergenceRow, ResultTable};

// ---------------------------------------------------------------------------
// Result-table selection by metric name
// ---------------------------------------------------------------------------

/// How a metric substring is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchCase {
    Sensitive,
    Insensitive,
}

impl ResultTable {
    /// Records whose metric contains `needle`, in file order.
    pub fn matching(&self, needle: &str, case: MatchCase) -> Vec<&BenchmarkRecord> {
        let needle_lower = needle.to_lowercase();
        self.records
            .iter()
            .filter(|r| match case {
                MatchCase::Sensitive => r.metric.contains(needle),
                MatchCase::Insensitive => r.metric.to_lowercase().contains(&needle_lower),
            })
            .collect()
    }

    /// `Min` time of the first single-worker record matching `needle` (T1).
    pub fn single_worker_time(&self, needle: &str) -> Option<f64> {
        self.matching(needle, MatchCase::Sensitive)
            .into_iter()
            .find(|r| r.workers == 1)
            .map(|r| r.min)
    }

    /// Sorted, de-duplicated worker counts of the records matching `needle`.
    pub fn worker_counts(&self, needle: &str) -> Vec<u32> {
        let mut counts: Vec<u32> = self
            .matching(needle, MatchCase::Sensitive)
            .iter()
            .map(|r| r.workers)
            .collect();
        counts.sort_unstable();
        counts.dedup();
        counts
    }
}

// ---------------------------------------------------------------------------
// Convergence rows grouped per function
// ---------------------------------------------------------------------------

/// Group rows by function name, keeping first-appearance order.
pub fn group_by_function(rows: &[ConvergenceRow]) -> Vec<(String, Vec<&ConvergenceRow>)> {
    let mut groups: Vec<(String, Vec<&ConvergenceRow>)> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|(name, _)| *name == row.function) {
            Some((_, members)) => members.push(row),
            None => groups.push((row.function.clone(), vec![row])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::WorkerColumn;

    fn record(metric: &str, workers: u32, min: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            metric: metric.to_string(),
            n: 8192,
            workers,
            min,
            avg: min,
            std_dev: 0.0,
        }
    }

    fn table() -> ResultTable {
        ResultTable {
            worker_column: WorkerColumn::Threads,
            records: vec![
                record("OpenMP_static", 1, 100.0),
                record("OpenMP_dynamic", 1, 110.0),
                record("OpenMP_static", 2, 52.0),
                record("Threads_atomic", 1, 120.0),
                record("OpenMP_static", 4, 27.0),
            ],
        }
    }

    #[test]
    fn test_matching_keeps_file_order() {
        let t = table();
        let workers: Vec<u32> = t
            .matching("OpenMP_static", MatchCase::Sensitive)
            .iter()
            .map(|r| r.workers)
            .collect();
        assert_eq!(workers, vec![1, 2, 4]);
    }

    #[test]
    fn test_case_insensitive_matching() {
        let t = table();
        assert!(t.matching("openmp", MatchCase::Sensitive).is_empty());
        assert_eq!(t.matching("openmp", MatchCase::Insensitive).len(), 4);
    }

    #[test]
    fn test_single_worker_time() {
        let t = table();
        assert_eq!(t.single_worker_time("OpenMP_dynamic"), Some(110.0));
        assert_eq!(t.single_worker_time("OpenMP_guided"), None);
        assert_eq!(t.worker_counts("OpenMP_static"), vec![1, 2, 4]);
    }

    #[test]
    fn test_group_by_function_first_appearance() {
        let row = |f: &str, i: u32| ConvergenceRow {
            function: f.to_string(),
            precision: "double".to_string(),
            iteration: i,
            root: 0.0,
            residual: 1.0,
        };
        let rows = vec![row("b", 0), row("a", 0), row("b", 1)];
        let groups = group_by_function(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "a");
    }
}

//! Manual sanity checks against a live source: how the draws are distributed,
//! and how the provider copes with increasing request rates.
use super::error::{Error, Result};
use super::source::RandomByteSource;
use super::weighted_random::{ChoiceMap, WeightedChooser};
use chrono::{DateTime, Local};
use linked_hash_set::LinkedHashSet;
use log::{debug, info};
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_SAMPLES: usize = 1000;
pub const DEFAULT_FREQUENCIES: [f64; 9] = [0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0];
pub const DEFAULT_CALLS_PER_STEP: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRow {
    pub label: String,
    pub count: usize,
    pub actual_pct: f64,
    pub expected_pct: f64,
}

///
/// Draws `samples` choices and tallies them per distinct label, in the order
/// labels first appear in `choices`. Repeated labels pool their weights.
///
pub fn distribution_check<S, T>(
    chooser: &mut WeightedChooser<S>,
    choices: &[T],
    weights: Option<&[f64]>,
    samples: usize,
) -> Result<Vec<DistributionRow>>
where
    S: RandomByteSource,
    T: Display + Debug + Eq + Hash,
{
    ChoiceMap::new(choices, weights)?;
    let uniform = vec![1.0; choices.len()];
    let expected_weights = weights.unwrap_or(&uniform);

    let mut counts: HashMap<&T, usize> = HashMap::new();
    for sample in 0..samples {
        let choice = chooser.choose(choices, weights)?;
        *counts.entry(choice).or_insert(0) += 1;
        if sample % 100 == 99 {
            debug!("{} of {} samples drawn", sample + 1, samples);
        }
    }

    let total_weight: f64 = expected_weights.iter().sum();
    let mut labels: LinkedHashSet<&T> = LinkedHashSet::with_capacity(choices.len());
    for choice in choices {
        labels.insert_if_absent(choice);
    }
    Ok(labels
        .iter()
        .map(|label| {
            let count = counts.get(label).copied().unwrap_or(0);
            let label_weight: f64 = choices
                .iter()
                .zip(expected_weights)
                .filter(|(choice, _)| choice == label)
                .map(|(_, weight)| weight)
                .sum();
            DistributionRow {
                label: label.to_string(),
                count,
                actual_pct: if samples == 0 {
                    0.0
                } else {
                    100.0 * count as f64 / samples as f64
                },
                expected_pct: 100.0 * label_weight / total_weight,
            }
        })
        .collect())
}

pub fn format_distribution(rows: &[DistributionRow]) -> String {
    let mut table = format!("{:<10} {:>10} {:>12}\n", "Choice", "Actual %", "Expected %");
    table.push_str(&"-".repeat(32));
    table.push('\n');
    for row in rows {
        table.push_str(&format!(
            "{:<10} {:>10.1}% {:>11.1}%\n",
            row.label, row.actual_pct, row.expected_pct
        ));
    }
    table
}

#[derive(Debug, Clone)]
pub struct RateLimitStep {
    pub frequency: f64,
    pub calls: usize,
    pub elapsed: Duration,
    pub finished_at: DateTime<Local>,
}

///
/// For each frequency, makes `calls_per_step` single-choice calls with a
/// `1 / frequency` second pause after each. `on_step` sees every finished
/// step. The first failing call ends the check.
///
pub fn rate_limit_check<S, F>(
    chooser: &mut WeightedChooser<S>,
    frequencies: &[f64],
    calls_per_step: usize,
    mut on_step: F,
) -> Result<Vec<RateLimitStep>>
where
    S: RandomByteSource,
    F: FnMut(&RateLimitStep),
{
    if let Some(bad) = frequencies.iter().find(|f| !f.is_finite() || **f <= 0.0) {
        return Err(Error::InvalidArguments(format!(
            "frequencies must be positive, got {}",
            bad
        )));
    }

    let mut steps = Vec::with_capacity(frequencies.len());
    for frequency in frequencies {
        let pause = Duration::from_secs_f64(1.0 / frequency);
        let start = Instant::now();
        for _ in 0..calls_per_step {
            chooser.choose(&["test"], Some(&[1.0]))?;
            thread::sleep(pause);
        }
        let step = RateLimitStep {
            frequency: *frequency,
            calls: calls_per_step,
            elapsed: start.elapsed(),
            finished_at: Local::now(),
        };
        info!(
            "{} calls at {} per second took {:.2}s",
            step.calls,
            step.frequency,
            step.elapsed.as_secs_f64()
        );
        on_step(&step);
        steps.push(step);
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrng::source::LocalSource;
    use crate::qrng::{DEFAULT_CHOICES, DEFAULT_WEIGHTS};
    use crate::test::fixed_source::{FailingSource, FixedSource};

    #[test]
    fn test_sweep_distribution_matches_slots() {
        // One pass over every byte gives the exact slot counts
        let mut chooser = WeightedChooser::new(FixedSource::sweep());
        let rows =
            distribution_check(&mut chooser, &DEFAULT_CHOICES, Some(&DEFAULT_WEIGHTS), 256)
                .unwrap();
        let counts: Vec<usize> = rows.iter().map(|row| row.count).collect();
        assert_eq!(counts, vec![42, 85, 129]);
        assert_eq!(rows[0].label, "apple");
        assert!((rows[2].expected_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_labels_pool() {
        let mut chooser = WeightedChooser::new(LocalSource::seeded(5));
        let choices = ["heads", "tails", "heads"];
        let rows = distribution_check(&mut chooser, &choices, None, 100).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "heads");
        assert_eq!(rows[1].label, "tails");
        assert_eq!(rows.iter().map(|row| row.count).sum::<usize>(), 100);
        assert!((rows[0].expected_pct - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_distribution_error_stops_early() {
        let mut chooser = WeightedChooser::new(FailingSource);
        assert!(distribution_check(&mut chooser, &DEFAULT_CHOICES, None, 10).is_err());
    }

    #[test]
    fn test_format_distribution() {
        let rows = vec![DistributionRow {
            label: "apple".to_string(),
            count: 1,
            actual_pct: 16.66,
            expected_pct: 16.6667,
        }];
        let table = format_distribution(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Choice"));
        assert_eq!(lines[1], "-".repeat(32));
        assert_eq!(lines[2], "apple            16.7%        16.7%");
    }

    #[test]
    fn test_rate_limit_steps() {
        let mut chooser = WeightedChooser::new(FixedSource::new(vec![1, 2, 3]));
        let mut seen = Vec::new();
        let steps = rate_limit_check(&mut chooser, &[1000.0, 500.0], 3, |step| {
            seen.push(step.frequency)
        })
        .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(seen, vec![1000.0, 500.0]);
        assert_eq!(chooser.into_source().fetches(), 6);
    }

    #[test]
    fn test_rate_limit_rejects_zero_frequency() {
        let mut chooser = WeightedChooser::new(FixedSource::new(vec![0]));
        assert!(matches!(
            rate_limit_check(&mut chooser, &[0.0], 1, |_| {}),
            Err(Error::InvalidArguments(_))
        ));
        assert_eq!(chooser.into_source().fetches(), 0);
    }
}

//! Workout statistics
//!
//! A fixed reduction over a user's workouts, served by the stats endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::workout::Workout;

/// Totals over a set of workouts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub total_workouts: usize,
    pub total_exercises: usize,
    pub total_sets: usize,
    /// Reps that do not parse as a number count as zero; saturates at `u64::MAX`
    pub total_reps: u64,
    /// Σ reps × weight over sets where both parse
    pub total_volume: f64,
    pub workouts_by_type: BTreeMap<String, usize>,
}

impl WorkoutStats {
    /// Reduce the given workouts
    pub fn from_workouts<'a, I>(workouts: I) -> Self
    where
        I: IntoIterator<Item = &'a Workout>,
    {
        let mut stats = Self::default();
        for workout in workouts {
            stats.total_workouts += 1;
            *stats
                .workouts_by_type
                .entry(workout.workout_type.clone())
                .or_insert(0) += 1;

            for exercise in &workout.exercises {
                stats.total_exercises += 1;
                for set in &exercise.sets {
                    stats.total_sets += 1;
                    let reps = set.reps.trim().parse::<u64>().ok();
                    stats.total_reps = stats.total_reps.saturating_add(reps.unwrap_or(0));

                    let weight = set
                        .weight
                        .as_deref()
                        .and_then(|w| w.trim().parse::<f64>().ok());
                    if let (Some(reps), Some(weight)) = (reps, weight) {
                        stats.total_volume += reps as f64 * weight;
                    }
                }
            }
        }
        stats
    }
}

/**
 * Workout Payload
 *
 * The domain record submitted by the workout form, persisted in the
 * offline queue and sent to the create endpoint.
 *
 * Set fields (`reps`, `rest`, `weight`) are kept as the strings the form
 * produced; parsing happens only where arithmetic is needed (statistics).
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// A single set of an exercise
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseSet {
    /// Repetitions, as entered
    pub reps: String,
    /// Rest after the set, as entered
    #[serde(default)]
    pub rest: String,
    /// Optional load, as entered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

/// One exercise of a workout
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    /// Exercise name
    pub name: String,
    /// Performed sets, in order
    #[serde(default)]
    pub sets: Vec<ExerciseSet>,
}

/// Workout record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workout {
    /// Workout date (ISO `YYYY-MM-DD` as entered)
    pub date: String,
    /// Workout type, e.g. "push"
    #[serde(rename = "type")]
    pub workout_type: String,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
    /// Exercises, in order
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Workout {
    /// Create a workout without exercises
    pub fn new(date: impl Into<String>, workout_type: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            workout_type: workout_type.into(),
            notes: String::new(),
            exercises: Vec::new(),
        }
    }

    /// Append an exercise (builder style)
    pub fn with_exercise(mut self, exercise: Exercise) -> Self {
        self.exercises.push(exercise);
        self
    }

    /// Set the notes (builder style)
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Check the business fields the form is expected to fill in
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.date.trim().is_empty() {
            return Err(SharedError::validation("date", "Workout date is required"));
        }
        if self.workout_type.trim().is_empty() {
            return Err(SharedError::validation("type", "Workout type is required"));
        }
        if let Some(index) = self.exercises.iter().position(|e| e.name.trim().is_empty()) {
            return Err(SharedError::validation(
                format!("exercises[{}].name", index),
                "Exercise name is required",
            ));
        }
        Ok(())
    }

    /// Total number of sets across all exercises
    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

impl Exercise {
    /// Create an exercise with the given sets
    pub fn new(name: impl Into<String>, sets: Vec<ExerciseSet>) -> Self {
        Self {
            name: name.into(),
            sets,
        }
    }
}

impl ExerciseSet {
    /// Create a set without weight
    pub fn new(reps: impl Into<String>, rest: impl Into<String>) -> Self {
        Self {
            reps: reps.into(),
            rest: rest.into(),
            weight: None,
        }
    }

    /// Set the weight (builder style)
    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = Some(weight.into());
        self
    }
}

/// Body of the create call: the workout plus the `synced` flag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutSubmission {
    /// Workout fields, flattened into the body
    #[serde(flatten)]
    pub workout: Workout,
    /// Whether this write confirms a record created on the client
    #[serde(default)]
    pub synced: bool,
}

impl WorkoutSubmission {
    /// Body used by the façade's online path and by sync passes
    pub fn synced(workout: Workout) -> Self {
        Self {
            workout,
            synced: true,
        }
    }
}

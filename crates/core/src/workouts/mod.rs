//! Workouts module - logged activity and the daily points total.

mod workouts_model;
mod workouts_service;
mod workouts_traits;

pub use workouts_model::{NewWorkoutLog, WorkoutEntry, WorkoutLog};
pub use workouts_service::WorkoutService;
pub use workouts_traits::{WorkoutRepositoryTrait, WorkoutServiceTrait};

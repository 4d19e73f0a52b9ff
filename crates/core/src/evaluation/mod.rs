//! Evaluation module - the daily target rule and the run that applies it.

mod evaluation_model;
mod evaluation_service;
mod evaluation_traits;

pub use evaluation_model::{
    evaluate_target, DailyRunReport, DailyTarget, EvaluationSummary, MemberEvaluation, Verdict,
};
pub use evaluation_service::EvaluationService;
pub use evaluation_traits::EvaluationServiceTrait;

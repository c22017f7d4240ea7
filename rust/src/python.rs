//! PyO3 bindings, exposed as the `coursetime.rust` Python module.
//!
//! Structured results cross the boundary as JSON strings.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::{DateTime, Utc};
use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use serde::Serialize;

use crate::config::PlannerConfig;
use crate::error::{ErrorKind, PlannerError};
use crate::request::CompletionRequest;
use crate::service::MealPlanner;

fn to_py_err(err: PlannerError) -> PyErr {
    let msg = format!("{}: {}", err.code(), err);
    match err.kind() {
        ErrorKind::Validation => PyValueError::new_err(msg),
        ErrorKind::NotFound => PyKeyError::new_err(msg),
        ErrorKind::Internal => PyRuntimeError::new_err(msg),
    }
}

fn to_json<T: Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

/// In-memory meal planner.
#[pyclass(name = "MealPlanner")]
pub struct PyMealPlanner {
    inner: MealPlanner,
}

#[pymethods]
impl PyMealPlanner {
    #[new]
    #[pyo3(signature = (stagger_minutes=None, rounding_minutes=None, upcoming_limit=None, verbosity=None))]
    fn new(
        stagger_minutes: Option<i64>,
        rounding_minutes: Option<i64>,
        upcoming_limit: Option<usize>,
        verbosity: Option<u8>,
    ) -> PyResult<Self> {
        let config =
            PlannerConfig::new(stagger_minutes, rounding_minutes, upcoming_limit, verbosity)
                .map_err(to_py_err)?;
        let inner = MealPlanner::in_memory(config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Create a meal from a JSON request; returns the meal as JSON.
    fn create_meal(&self, request_json: &str) -> PyResult<String> {
        let meal = self.inner.create_meal_json(request_json).map_err(to_py_err)?;
        to_json(&meal)
    }

    /// Timeline with progress as JSON.
    fn timeline(&self, meal_id: &str) -> PyResult<String> {
        to_json(&self.inner.timeline(meal_id).map_err(to_py_err)?)
    }

    /// Complete a task from a `{"taskId", "completedAt"}` JSON body.
    fn complete_task(&self, request_json: &str) -> PyResult<String> {
        let request = CompletionRequest::from_json(request_json).map_err(to_py_err)?;
        to_json(&self.inner.complete_task_request(&request).map_err(to_py_err)?)
    }

    /// Mark a task as started; returns the task as JSON.
    fn start_task(&self, task_id: &str) -> PyResult<String> {
        to_json(&self.inner.start_task(task_id).map_err(to_py_err)?)
    }

    /// Current and upcoming tasks at `now` (timezone-aware datetime) as JSON.
    fn current_tasks(&self, meal_id: &str, now: DateTime<Utc>) -> PyResult<String> {
        to_json(&self.inner.current_tasks(meal_id, now).map_err(to_py_err)?)
    }

    fn __repr__(&self) -> String {
        let config = self.inner.config();
        format!(
            "MealPlanner(stagger_minutes={}, rounding_minutes={}, upcoming_limit={})",
            config.stagger_minutes, config.rounding_minutes, config.upcoming_limit
        )
    }
}

/// The coursetime.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyMealPlanner>()?;
    Ok(())
}

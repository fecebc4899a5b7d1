//! Fractional ordering of tasks.
//!
//! Tasks carry a real-valued `order` key. New positions are derived from
//! the neighbours' keys (append, prepend, or a midpoint between two tasks)
//! so no other task ever needs renumbering.
//!
//! Repeated bisection of the same gap runs out of `f64` precision after 52
//! steps between 1.0 and 2.0; the 53rd midpoint collapses onto the lower
//! neighbour. That case is reported through
//! [`PlacementOutcome::precision_exhausted`] rather than silently renumbered.

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::error::{EntityKind, Error, Result};
use crate::model::{Store, Task};

/// Step used for append, prepend and the open ends of relative placement
pub const ORDER_STEP: f64 = 1.0;

/// Where a task should land
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// After every other task
    End,
    /// Before every other task
    Start,
    /// Explicit order key
    At(f64),
    /// Immediately before the task with this id
    Before(String),
    /// Immediately after the task with this id
    After(String),
}

/// Order chosen for a placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementOutcome {
    pub order: f64,
    /// Midpoint collapsed onto one of its endpoints
    pub precision_exhausted: bool,
}

impl PlacementOutcome {
    fn exact(order: f64) -> Self {
        Self {
            order,
            precision_exhausted: false,
        }
    }

    /// Turn a collapsed midpoint into an error
    pub fn strict(self) -> Result<Self> {
        if self.precision_exhausted {
            return Err(Error::PrecisionExhausted { order: self.order });
        }
        Ok(self)
    }
}

fn compare_order(a: &Task, b: &Task) -> Ordering {
    a.order.partial_cmp(&b.order).unwrap_or(Ordering::Equal)
}

/// Tasks ascending by order; equal keys keep their slice order.
pub fn sorted(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| compare_order(a, b));
    sorted
}

/// Greatest existing order plus one step (1.0 on an empty set)
pub fn append_order<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> f64 {
    tasks
        .into_iter()
        .map(|task| task.order)
        .fold(None, |max: Option<f64>, order| {
            Some(max.map_or(order, |max| max.max(order)))
        })
        .unwrap_or(0.0)
        + ORDER_STEP
}

/// Smallest existing order minus one step (-1.0 on an empty set)
pub fn prepend_order<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> f64 {
    tasks
        .into_iter()
        .map(|task| task.order)
        .fold(None, |min: Option<f64>, order| {
            Some(min.map_or(order, |min| min.min(order)))
        })
        .unwrap_or(0.0)
        - ORDER_STEP
}

/// Midpoint of two keys without overflowing on large magnitudes
pub fn midpoint(low: f64, high: f64) -> f64 {
    low + (high - low) / 2.0
}

/// One step away from `anchor` at an open end of the list
fn beyond(anchor: f64, step: f64) -> PlacementOutcome {
    let order = anchor + step;
    PlacementOutcome {
        order,
        precision_exhausted: order == anchor,
    }
}

fn between(low: f64, high: f64) -> PlacementOutcome {
    let order = midpoint(low, high);
    PlacementOutcome {
        order,
        precision_exhausted: order == low || order == high,
    }
}

/// Compute the order for `placement` without touching the store.
///
/// `mover` is the task being placed, if it already exists; it is left out of
/// the neighbour computation so it never counts as its own neighbour.
pub fn resolve_order(
    tasks: &[Task],
    mover: Option<&str>,
    placement: &Placement,
) -> Result<PlacementOutcome> {
    let mut others: Vec<&Task> = tasks
        .iter()
        .filter(|task| Some(task.id.as_str()) != mover)
        .collect();

    let outcome = match placement {
        Placement::End => PlacementOutcome::exact(append_order(others.iter().copied())),
        Placement::Start => PlacementOutcome::exact(prepend_order(others.iter().copied())),
        Placement::At(order) => {
            if !order.is_finite() {
                return Err(Error::InvalidArgument(format!(
                    "order must be a finite number, got {order}"
                )));
            }
            PlacementOutcome::exact(*order)
        }
        Placement::Before(target) | Placement::After(target) => {
            if Some(target.as_str()) == mover {
                return Err(Error::InvalidArgument(
                    "cannot place a task relative to itself".to_string(),
                ));
            }
            others.sort_by(|a, b| compare_order(a, b));
            let neighbours = others;
            let idx = neighbours
                .iter()
                .position(|task| &task.id == target)
                .ok_or_else(|| Error::not_found(EntityKind::Task, target.clone()))?;
            let anchor = neighbours[idx].order;

            if matches!(placement, Placement::Before(_)) {
                match idx.checked_sub(1).map(|prev| neighbours[prev]) {
                    Some(prev) => between(prev.order, anchor),
                    None => beyond(anchor, -ORDER_STEP),
                }
            } else {
                match neighbours.get(idx + 1) {
                    Some(next) => between(anchor, next.order),
                    None => beyond(anchor, ORDER_STEP),
                }
            }
        }
    };

    if outcome.precision_exhausted {
        warn!(order = outcome.order, "order precision exhausted between neighbours");
    }
    Ok(outcome)
}

/// Move an existing task and return the order it received.
pub fn place_task(store: &mut Store, task_id: &str, placement: &Placement) -> Result<PlacementOutcome> {
    if store.task(task_id).is_none() {
        return Err(Error::not_found(EntityKind::Task, task_id));
    }
    let outcome = resolve_order(&store.tasks, Some(task_id), placement)?;
    store.require_task_mut(task_id)?.set_order(outcome.order);
    debug!(task = task_id, order = outcome.order, ?placement, "placed task");
    Ok(outcome)
}

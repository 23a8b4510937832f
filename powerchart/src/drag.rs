use crate::pacing::{pause, Pacing};
use crate::platforms::AutomationEngine;
use crate::AutomationError;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Upper bound on intermediate moves, reached after ten minutes of drag time.
pub const MAX_DRAG_STEPS: u32 = 6_000;

/// Intermediate pointer positions for a drag, ten per second of drag time
/// with at least ten and at most [`MAX_DRAG_STEPS`]. The last point is `to`.
pub fn interpolate(from: Point, to: Point, drag_duration: Duration) -> Vec<Point> {
    let steps = ((drag_duration.as_secs_f64() * 10.0) as u32).clamp(10, MAX_DRAG_STEPS);
    let lerp = |start: i32, end: i32, progress: f64| {
        let start = f64::from(start);
        (start + (f64::from(end) - start) * progress) as i32
    };
    (1..=steps)
        .map(|i| {
            let progress = f64::from(i) / f64::from(steps);
            Point {
                x: lerp(from.x, to.x, progress),
                y: lerp(from.y, to.y, progress),
            }
        })
        .collect()
}

/// Press at `from`, drag to `to` over `drag_duration`, hold for
/// `hold_duration`, then release at `to`.
///
/// `app` is brought to the front first. The button is released even when an
/// intermediate move fails.
#[instrument(skip(engine, pacing))]
pub fn drag_and_hold(
    engine: &dyn AutomationEngine,
    app: &str,
    from: Point,
    to: Point,
    drag_duration: Duration,
    hold_duration: Duration,
    pacing: &Pacing,
) -> Result<(), AutomationError> {
    engine.activate_application(app)?;
    pause(pacing.activation);

    engine.move_mouse(from.x, from.y)?;
    pause(pacing.settle);
    engine.mouse_down(from.x, from.y)?;
    pause(pacing.settle);

    let path = interpolate(from, to, drag_duration);
    let step_delay = drag_duration / path.len() as u32;
    info!(
        steps = path.len(),
        "Dragging to ({}, {}) over {:?}", to.x, to.y, drag_duration
    );

    let moved = path.iter().try_for_each(|point| {
        engine.move_mouse(point.x, point.y)?;
        pause(step_delay);
        Ok::<_, AutomationError>(())
    });

    if moved.is_ok() {
        info!("Holding at ({}, {}) for {:?}", to.x, to.y, hold_duration);
        pause(hold_duration);
    }
    engine.mouse_up(to.x, to.y)?;
    moved
}

//! Open-loop descent: a closed-form plan tabulated into a piecewise-constant command profile.
//!
//! The plan has up to four phases:
//!
//! 1. bang-bang rotation to a tilt opposing the horizontal velocity,
//! 2. a burn at that tilt until the horizontal velocity is cancelled,
//! 3. bang-bang rotation back upright,
//! 4. a ballistic coast followed by a constant-thrust vertical brake that reaches zero height
//!    and zero vertical speed together.
//!
//! Every phase lasts a whole number of profile rows. The coast length is found by bisection
//! so that the descent ends near the requested target time without the braking thrust
//! exceeding the actuator limit.

use descent_core::angle::normalize;
use descent_core::{ActuatorLimits, Command};
use descent_dynamics::LanderState;

use crate::GuidanceError;

const BISECTION_ITERATIONS: usize = 200;

/// Relative slack when snapping a duration onto the profile grid.
const GRID_SNAP: f64 = 1e-9;

/// One tabulated command, held from `t` until the next row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileEntry {
    pub t: f64,
    pub thrust: f64,
    pub torque: f64,
}

/// Piecewise-constant `(t, thrust, torque)` table owned by a single controller instance.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenLoopProfile {
    entries: Vec<ProfileEntry>,
    resolution: f64,
}

impl OpenLoopProfile {
    pub fn new(entries: Vec<ProfileEntry>, resolution: f64) -> Result<Self, GuidanceError> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(GuidanceError::InvalidResolution(resolution));
        }
        if entries.windows(2).any(|pair| pair[1].t <= pair[0].t) {
            return Err(GuidanceError::UnorderedProfile);
        }
        Ok(Self {
            entries,
            resolution,
        })
    }

    pub fn entries(&self) -> &[ProfileEntry] {
        &self.entries
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn start_time(&self) -> Option<f64> {
        self.entries.first().map(|entry| entry.t)
    }

    /// End of the last row's hold interval.
    pub fn end_time(&self) -> Option<f64> {
        self.entries.last().map(|entry| entry.t + self.resolution)
    }

    fn entry_at(&self, t: f64) -> Option<&ProfileEntry> {
        let end = self.end_time()?;
        if t >= end {
            return None;
        }
        let index = self.entries.partition_point(|entry| entry.t <= t);
        index.checked_sub(1).map(|i| &self.entries[i])
    }

    /// Last row at or before `t`; idle before the first row and from `end_time` on.
    pub fn lookup(&self, t: f64) -> Command {
        self.entry_at(t)
            .map(|entry| Command::new(entry.thrust, entry.torque))
            .unwrap_or(Command::IDLE)
    }

    pub fn lookup_thrust(&self, t: f64) -> f64 {
        self.lookup(t).thrust
    }

    pub fn lookup_torque(&self, t: f64) -> f64 {
        self.lookup(t).torque
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanOptions {
    /// Profile row spacing (s).
    pub resolution: f64,
    /// Tilt magnitude used for the horizontal burn (rad), in (0, π/2).
    pub tilt: f64,
    /// Desired touchdown time measured from the plan start (s).
    pub target_time: f64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            resolution: 0.1,
            tilt: 0.25,
            target_time: 120.0,
        }
    }
}

impl PlanOptions {
    fn validate(&self) -> Result<(), GuidanceError> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(GuidanceError::InvalidResolution(self.resolution));
        }
        if !(self.tilt > 0.0 && self.tilt < std::f64::consts::FRAC_PI_2) {
            return Err(GuidanceError::InvalidTilt(self.tilt));
        }
        if !(self.target_time.is_finite() && self.target_time > 0.0) {
            return Err(GuidanceError::InvalidTargetTime(self.target_time));
        }
        Ok(())
    }
}

/// Whole number of rows covering `duration`, snapping values within rounding noise of the grid.
fn rows_covering(duration: f64, resolution: f64) -> usize {
    let exact = duration / resolution;
    let nearest = exact.round();
    if (exact - nearest).abs() < GRID_SNAP * nearest.max(1.0) {
        nearest as usize
    } else {
        exact.ceil() as usize
    }
}

struct Segment {
    rows: usize,
    thrust: f64,
    torque: f64,
}

/// Accumulates phase segments while tracking the vertical motion they produce.
struct Planner {
    resolution: f64,
    gravity: f64,
    segments: Vec<Segment>,
    rows: usize,
    height: f64,
    vertical_speed: f64,
}

impl Planner {
    fn push(&mut self, rows: usize, thrust: f64, torque: f64, attitude: f64) {
        if rows == 0 {
            return;
        }
        let dt = rows as f64 * self.resolution;
        let accel = thrust * attitude.cos() - self.gravity;
        self.height += self.vertical_speed * dt + 0.5 * accel * dt * dt;
        self.vertical_speed += accel * dt;
        self.rows += rows;
        self.segments.push(Segment {
            rows,
            thrust,
            torque,
        });
    }

    /// Symmetric bang-bang rotation by `delta`, torque scaled down so each half spans whole rows.
    fn rotate(&mut self, delta: f64, max_torque: f64) -> Result<(), GuidanceError> {
        if delta == 0.0 {
            return Ok(());
        }
        if max_torque <= 0.0 {
            return Err(GuidanceError::InfeasiblePlan(
                "rotation requires torque authority",
            ));
        }
        let half_rows = rows_covering((delta.abs() / max_torque).sqrt(), self.resolution);
        let half = half_rows as f64 * self.resolution;
        let torque = delta / (half * half);
        self.push(half_rows, 0.0, torque, 0.0);
        self.push(half_rows, 0.0, -torque, 0.0);
        Ok(())
    }

    fn elapsed(&self) -> f64 {
        self.rows as f64 * self.resolution
    }
}

/// Height and downward speed at the end of a coast of length `coast`, while still descending
/// above ground.
fn braking_arc(height: f64, vertical_speed: f64, gravity: f64, coast: f64) -> Option<(f64, f64)> {
    let h = height + vertical_speed * coast - 0.5 * gravity * coast * coast;
    let speed = gravity * coast - vertical_speed;
    (h > 0.0 && speed > 0.0).then_some((h, speed))
}

/// Coast length before the final constant-thrust brake.
fn coast_duration(
    height: f64,
    vertical_speed: f64,
    gravity: f64,
    max_thrust: f64,
    remaining: f64,
) -> Result<f64, GuidanceError> {
    if height <= 0.0 {
        return Err(GuidanceError::InfeasiblePlan(
            "ground reached before the braking phase",
        ));
    }
    if gravity <= 0.0 {
        return Err(GuidanceError::InfeasiblePlan(
            "a ballistic coast requires positive gravity",
        ));
    }
    let arc = |coast: f64| braking_arc(height, vertical_speed, gravity, coast);
    let brake_thrust = |h: f64, speed: f64| gravity + speed * speed / (2.0 * h);
    let total = |coast: f64| match arc(coast) {
        Some((h, speed)) => coast + 2.0 * h / speed,
        None => f64::INFINITY,
    };

    let apex = (vertical_speed / gravity).max(0.0);
    let ground = (vertical_speed
        + (vertical_speed * vertical_speed + 2.0 * gravity * height).sqrt())
        / gravity;

    let slowest = match arc(apex) {
        Some((h, speed)) => brake_thrust(h, speed),
        None => gravity,
    };
    if slowest > max_thrust {
        return Err(GuidanceError::InfeasibleBraking {
            required: slowest,
            available: max_thrust,
        });
    }

    // Braking thrust grows with the coast length; find the longest coast the engine can stop.
    let (mut lo, mut hi) = (apex, ground);
    for _ in 0..BISECTION_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        match arc(mid) {
            Some((h, speed)) if brake_thrust(h, speed) <= max_thrust => lo = mid,
            _ => hi = mid,
        }
    }
    let longest = lo;

    // Total descent time shrinks as the coast grows.
    Ok(if total(longest) >= remaining {
        longest
    } else if total(apex) <= remaining {
        apex
    } else {
        let (mut lo, mut hi) = (apex, longest);
        for _ in 0..BISECTION_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            if total(mid) > remaining {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        hi
    })
}

/// Build the open-loop profile for a descent starting at `t0` from `initial`.
///
/// The vehicle is assumed to start without spin. Phases 1 and 2 are skipped when the
/// horizontal velocity is already zero; phase 3 still rights a tilted vehicle.
pub fn plan_descent(
    t0: f64,
    initial: &LanderState,
    gravity: f64,
    limits: ActuatorLimits,
    options: &PlanOptions,
) -> Result<OpenLoopProfile, GuidanceError> {
    options.validate()?;
    if !limits.is_valid() {
        return Err(GuidanceError::InvalidLimits);
    }
    if !(gravity.is_finite() && gravity >= 0.0) {
        return Err(GuidanceError::InvalidGravity(gravity));
    }

    let resolution = options.resolution;
    let mut planner = Planner {
        resolution,
        gravity,
        segments: Vec::new(),
        rows: 0,
        height: initial.y,
        vertical_speed: initial.vy,
    };

    let mut attitude = normalize(initial.theta);
    if initial.vx != 0.0 {
        let burn_attitude = -initial.vx.signum() * options.tilt;
        planner.rotate(burn_attitude - attitude, limits.max_torque)?;
        attitude = burn_attitude;

        let lateral_authority = options.tilt.sin() * limits.max_thrust;
        if lateral_authority <= 0.0 {
            return Err(GuidanceError::InfeasiblePlan(
                "cancelling horizontal velocity requires thrust",
            ));
        }
        let burn_rows = rows_covering(initial.vx.abs() / lateral_authority, resolution);
        let burn_time = burn_rows as f64 * resolution;
        let thrust = initial.vx.abs() / (options.tilt.sin() * burn_time);
        planner.push(burn_rows, thrust, 0.0, attitude);
    }
    planner.rotate(-attitude, limits.max_torque)?;

    let remaining = options.target_time - planner.elapsed();
    let coast = coast_duration(
        planner.height,
        planner.vertical_speed,
        gravity,
        limits.max_thrust,
        remaining,
    )?;

    // Round the coast down so the braking thrust stays within the limit, then size the brake.
    // Low starts can need less than one row of coast; the brake still has to begin descending.
    let descending_rows = if planner.vertical_speed >= 0.0 {
        (planner.vertical_speed / (gravity * resolution)).floor() as usize + 1
    } else {
        0
    };
    let coast_rows = ((coast / resolution + GRID_SNAP).floor() as usize).max(descending_rows);
    let coast = coast_rows as f64 * resolution;
    let (h, speed) = braking_arc(planner.height, planner.vertical_speed, gravity, coast).ok_or(
        GuidanceError::InfeasiblePlan("no descending arc after the coast"),
    )?;
    let brake_time = 2.0 * h / speed;
    let brake_thrust = (gravity + speed / brake_time).min(limits.max_thrust);
    planner.push(coast_rows, 0.0, 0.0, 0.0);
    planner.push(rows_covering(brake_time, resolution), brake_thrust, 0.0, 0.0);

    let mut entries = Vec::with_capacity(planner.rows);
    let mut row = 0usize;
    for segment in &planner.segments {
        for _ in 0..segment.rows {
            entries.push(ProfileEntry {
                t: t0 + row as f64 * resolution,
                thrust: segment.thrust,
                torque: segment.torque,
            });
            row += 1;
        }
    }
    OpenLoopProfile::new(entries, resolution)
}

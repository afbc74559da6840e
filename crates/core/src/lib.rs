//! Core units, constants, and shared primitives for the descent simulation workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Newtonian gravitational constant (m³/(kg·s²)).
    pub const G: f64 = 6.674_30e-11;
    /// Standard gravity at Earth's surface (m/s²).
    pub const G0: f64 = 9.80665;
    /// Surface gravity of Titan (m/s²).
    pub const TITAN_SURFACE_GRAVITY: f64 = 1.352;
    /// Atmospheric density at Titan's surface (kg/m³).
    pub const TITAN_SURFACE_DENSITY: f64 = 5.4;
    /// Metres per astronomical unit.
    pub const AU_M: f64 = 149_597_870_700.0;
    /// Seconds per Julian day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
}

/// Lightweight time utilities shared across crates.
pub mod time {
    use super::constants::SECONDS_PER_DAY;

    /// Convert days to seconds.
    #[inline]
    pub fn days_to_seconds(days: f64) -> f64 {
        days * SECONDS_PER_DAY
    }

    /// Convert seconds to days.
    #[inline]
    pub fn seconds_to_days(seconds: f64) -> f64 {
        seconds / SECONDS_PER_DAY
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in metres or m/s depending on context.
    pub type Vector3 = [f64; 3];

    /// The zero vector.
    pub const ZERO: Vector3 = [0.0; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Linear interpolation `a + (b - a) * s`.
    #[inline]
    pub fn lerp(a: &Vector3, b: &Vector3, s: f64) -> Vector3 {
        add(a, &scale(&sub(b, a), s))
    }

    /// Read three consecutive components of a flat state slice.
    #[inline]
    pub fn from_slice(values: &[f64], offset: usize) -> Vector3 {
        [values[offset], values[offset + 1], values[offset + 2]]
    }
}

/// Angle helpers.
pub mod angle {
    use std::f64::consts::{PI, TAU};

    /// Map any angle (radians) into the half-open interval (−π, π].
    pub fn normalize(theta: f64) -> f64 {
        if !theta.is_finite() {
            return theta;
        }
        let mut wrapped = theta % TAU;
        if wrapped <= -PI {
            wrapped += TAU;
        } else if wrapped > PI {
            wrapped -= TAU;
        }
        wrapped
    }
}

/// Actuator command issued by a controller: thrust and torque, both per unit mass/inertia.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Command {
    /// Thrust acceleration along the body axis (m/s²).
    pub thrust: f64,
    /// Angular acceleration about the out-of-plane axis (rad/s²).
    pub torque: f64,
}

impl Command {
    /// Zero thrust and zero torque.
    pub const IDLE: Command = Command {
        thrust: 0.0,
        torque: 0.0,
    };

    pub fn new(thrust: f64, torque: f64) -> Self {
        Self { thrust, torque }
    }
}

/// Actuator limits shared by the dynamics and guidance layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorLimits {
    /// Maximum thrust acceleration (m/s²); thrust is clamped to `[0, max_thrust]`.
    pub max_thrust: f64,
    /// Maximum angular acceleration (rad/s²); torque is clamped to `[-max_torque, max_torque]`.
    pub max_torque: f64,
}

impl ActuatorLimits {
    pub fn new(max_thrust: f64, max_torque: f64) -> Self {
        Self {
            max_thrust,
            max_torque,
        }
    }

    /// Both limits finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.max_thrust.is_finite()
            && self.max_torque.is_finite()
            && self.max_thrust >= 0.0
            && self.max_torque >= 0.0
    }

    /// Clamp thrust to `[0, max_thrust]`.
    #[inline]
    pub fn clamp_thrust(&self, thrust: f64) -> f64 {
        thrust.clamp(0.0, self.max_thrust)
    }

    /// Clamp torque to `[-max_torque, max_torque]`.
    #[inline]
    pub fn clamp_torque(&self, torque: f64) -> f64 {
        torque.clamp(-self.max_torque, self.max_torque)
    }

    /// Saturate both components of a command. The limits must satisfy [`Self::is_valid`];
    /// controllers only hold limits that were checked at construction.
    pub fn saturate(&self, command: Command) -> Command {
        Command {
            thrust: self.clamp_thrust(command.thrust),
            torque: self.clamp_torque(command.torque),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::angle::normalize;
    use std::f64::consts::PI;

    #[test]
    fn normalize_maps_into_half_open_interval() {
        assert!((normalize(PI) - PI).abs() < 1e-12);
        assert!((normalize(-PI) - PI).abs() < 1e-12);
        assert!((normalize(3.0 * PI - 0.1) - (PI - 0.1)).abs() < 1e-9);
        assert!((normalize(0.5) - 0.5).abs() < 1e-15);
        assert!((normalize(-7.0) - (-7.0 + 2.0 * PI)).abs() < 1e-12);
        for k in -20..20 {
            let a = normalize(0.37 * k as f64);
            assert!(a > -PI && a <= PI, "{a}");
        }
    }
}

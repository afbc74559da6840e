//! Quadratic aerodynamic drag relative to the local wind.

use descent_core::vector::{self, Vector3};

use crate::DynamicsError;
use crate::environment::Environment;

/// Density variation with altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AtmosphereProfile {
    /// Constant density up to the ceiling.
    Uniform,
    /// Density falls off as `exp(-altitude / scale_height)`.
    Exponential { scale_height: f64 },
}

/// Drag force `-k * |v_rel| * v_rel`, active only at or below `ceiling` altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragModel {
    /// Lumped drag constant `k = ½ ρ C_d A` at zero altitude (kg/m).
    pub coefficient: f64,
    /// Altitude above terrain beyond which drag is zero (m).
    pub ceiling: f64,
    pub atmosphere: AtmosphereProfile,
}

impl DragModel {
    pub fn new(coefficient: f64, ceiling: f64) -> Result<Self, DynamicsError> {
        if !(coefficient.is_finite() && coefficient >= 0.0) {
            return Err(DynamicsError::InvalidDragCoefficient(coefficient));
        }
        if !(ceiling.is_finite() && ceiling >= 0.0) {
            return Err(DynamicsError::InvalidDragCeiling(ceiling));
        }
        Ok(Self {
            coefficient,
            ceiling,
            atmosphere: AtmosphereProfile::Uniform,
        })
    }

    /// Build the lumped coefficient from density, drag coefficient and reference area.
    pub fn from_aerodynamics(
        density_kg_m3: f64,
        drag_coefficient: f64,
        area_m2: f64,
        ceiling: f64,
    ) -> Result<Self, DynamicsError> {
        Self::new(0.5 * density_kg_m3 * drag_coefficient * area_m2, ceiling)
    }

    pub fn with_atmosphere(mut self, atmosphere: AtmosphereProfile) -> Result<Self, DynamicsError> {
        if let AtmosphereProfile::Exponential { scale_height } = atmosphere {
            if !(scale_height.is_finite() && scale_height > 0.0) {
                return Err(DynamicsError::InvalidScaleHeight(scale_height));
            }
        }
        self.atmosphere = atmosphere;
        Ok(self)
    }

    fn density_factor(&self, altitude: f64) -> f64 {
        match self.atmosphere {
            AtmosphereProfile::Uniform => 1.0,
            AtmosphereProfile::Exponential { scale_height } => {
                (-altitude.max(0.0) / scale_height).exp()
            }
        }
    }

    /// Drag force (N) on a body at `position` moving with `velocity`.
    pub fn force<E: Environment + ?Sized>(
        &self,
        position: &Vector3,
        velocity: &Vector3,
        environment: &E,
    ) -> Vector3 {
        let altitude = environment.altitude(position);
        if altitude > self.ceiling {
            return vector::ZERO;
        }
        let relative = vector::sub(velocity, &environment.wind(position));
        let speed = vector::norm(&relative);
        let k = self.coefficient * self.density_factor(altitude);
        vector::scale(&relative, -k * speed)
    }
}

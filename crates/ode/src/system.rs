//! The derivative-function contract.

/// System of ordinary differential equations `dy/dt = f(t, y)`.
///
/// Implementations must be pure in `(t, y)`: two calls with the same inputs write the same
/// derivative. Physical parameters are captured by the implementing type.
pub trait OdeSystem {
    /// Length of the state vector this system was built for.
    fn dimension(&self) -> usize;

    /// Write `dy/dt` evaluated at `(t, y)` into `dydt` (same length as `y`).
    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]);
}

impl<S: OdeSystem + ?Sized> OdeSystem for &S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        (**self).rhs(t, y, dydt)
    }
}

/// Optional early-stop predicate, checked after every accepted step.
pub type StopFn<'a> = dyn Fn(f64, &[f64]) -> bool + 'a;

/// Adapter turning a closure into an [`OdeSystem`] of a fixed dimension.
pub struct FnSystem<F> {
    dimension: usize,
    f: F,
}

impl<F> FnSystem<F>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    pub fn new(dimension: usize, f: F) -> Self {
        Self { dimension, f }
    }
}

impl<F> OdeSystem for FnSystem<F>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        (self.f)(t, y, dydt)
    }
}

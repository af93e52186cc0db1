//! Continuous output assembled from the step interpolators of a whole run.

use serde::{Deserialize, Serialize};

use crate::{
    Float,
    core::{
        interpolate::{Interpolate, StepInterpolator},
        solout::{ControlFlag, SolOut},
    },
    error::{Error, Result},
};

/// Piecewise dense output over all accepted steps.
///
/// Attach it as a step handler; every reported step (or step piece, when
/// events split a step) is copied. Queries locate the containing step by
/// binary search and fall back to the nearest boundary step outside the
/// covered range.
///
/// The model serializes as the ordered sequence of its steps; a reloaded
/// model interpolates exactly like the original.
///
/// ```
/// use ivp_engine::prelude::*;
///
/// struct Decay;
///
/// impl ODE for Decay {
///     fn dimension(&self) -> usize {
///         1
///     }
///
///     fn ode(&self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
///         dydt[0] = -y[0];
///         Ok(())
///     }
/// }
///
/// let mut output = ContinuousOutput::new();
/// let mut dopri = DormandPrince54::new(Settings::builder().rtol(1e-9).atol(1e-12).build())?;
/// let mut y = [0.0];
/// dopri.integrate(&Decay, 0.0, &[1.0], 3.0, &mut y, &mut Handlers::new().with_solout(&mut output))?;
///
/// let mut mid = [0.0];
/// output.interpolate(1.5, &mut mid);
/// assert!((mid[0] - (-1.5f64).exp()).abs() < 1e-8);
/// assert_eq!(output.final_time(), Some(3.0));
/// # Ok::<(), ivp_engine::Error>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContinuousOutput {
    steps: Vec<StepInterpolator>,
}

impl ContinuousOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[StepInterpolator] {
        &self.steps
    }

    /// Start of the covered range.
    pub fn initial_time(&self) -> Option<Float> {
        self.steps.first().map(StepInterpolator::previous_time)
    }

    /// End of the covered range.
    pub fn final_time(&self) -> Option<Float> {
        self.steps.last().map(StepInterpolator::current_time)
    }

    /// Whether the covered range runs forward in time.
    pub fn is_forward(&self) -> Option<bool> {
        self.steps.first().map(StepInterpolator::is_forward)
    }

    pub fn dimension(&self) -> Option<usize> {
        self.steps.first().map(StepInterpolator::dimension)
    }

    /// Interpolated state at `t`, or `None` for an empty model.
    pub fn state_at(&self, t: Float) -> Option<Vec<Float>> {
        let step = self.locate(t)?;
        let mut y = vec![0.0; step.dimension()];
        step.interpolate(t, &mut y);
        Some(y)
    }

    /// Append the steps of a model that continues this one.
    ///
    /// Both models must have the same dimension and direction, and `other`
    /// must start where this model ends.
    pub fn append(&mut self, other: &ContinuousOutput) -> Result<()> {
        let (Some(first), Some(last)) = (other.steps.first(), self.steps.last()) else {
            self.steps.extend(other.steps.iter().cloned());
            return Ok(());
        };

        if first.dimension() != last.dimension() {
            return Err(Error::IncompatibleOutput {
                reason: "state dimensions differ",
            });
        }
        if first.is_forward() != last.is_forward() {
            return Err(Error::IncompatibleOutput {
                reason: "integration directions differ",
            });
        }
        let gap = (first.previous_time() - last.current_time()).abs();
        let step = (last.current_time() - last.previous_time()).abs();
        if gap > 1.0e-3 * step {
            return Err(Error::IncompatibleOutput {
                reason: "models are not contiguous",
            });
        }

        self.steps.extend(other.steps.iter().cloned());
        Ok(())
    }

    /// Step containing `t`, or the nearest boundary step.
    fn locate(&self, t: Float) -> Option<&StepInterpolator> {
        let last = self.steps.len().checked_sub(1)?;
        let forward = self.steps[0].is_forward();
        let index = self.steps.partition_point(|step| {
            if forward {
                step.current_time() < t
            } else {
                step.current_time() > t
            }
        });
        Some(&self.steps[index.min(last)])
    }
}

impl SolOut for ContinuousOutput {
    fn reset(&mut self) {
        self.steps.clear();
    }

    fn solout(&mut self, interpolator: &StepInterpolator, _last: bool) -> ControlFlag {
        self.steps.push(interpolator.clone());
        ControlFlag::Continue
    }
}

impl Interpolate for ContinuousOutput {
    /// Fills `y` with NaN when the model is empty.
    fn interpolate(&self, t: Float, y: &mut [Float]) {
        match self.locate(t) {
            Some(step) => step.interpolate(t, y),
            None => y.fill(Float::NAN),
        }
    }

    fn interpolate_derivative(&self, t: Float, dydt: &mut [Float]) {
        match self.locate(t) {
            Some(step) => step.interpolate_derivative(t, dydt),
            None => dydt.fill(Float::NAN),
        }
    }
}

//! Computation handle: one validated book plus its latest result set

use crate::engine::{self, EngineConfig, FtpOutputs, Method, OutputKind};
use crate::error::{FtpError, Result};
use crate::inputs::FtpInputs;
use crate::matrix::Matrix;

/// Owns copies of the three inputs and, once computed, the seven outputs
///
/// Results are replaced wholesale by each successful [`compute`](Self::compute);
/// a failed compute leaves the previous result set in place.
///
/// # Example
/// ```
/// use ftp_engine::{Computation, Matrix, Method};
///
/// let mut calc = Computation::new(
///     Matrix::column(vec![1000.0]),
///     Matrix::from_rows(vec![vec![1.0, 0.5, 0.2]]).unwrap(),
///     Matrix::from_rows(vec![vec![0.01, 0.02]]).unwrap(),
/// ).unwrap();
/// calc.compute(Method::Stock).unwrap();
/// assert_eq!(calc.dims().unwrap(), (1, 2));
/// ```
#[derive(Debug, Clone)]
pub struct Computation {
    inputs: FtpInputs,
    config: EngineConfig,
    results: Option<(Method, FtpOutputs)>,
}

impl Computation {
    /// Validate the inputs and take ownership of them
    pub fn new(outstanding: Matrix, profiles: Matrix, rates: Matrix) -> Result<Self> {
        Self::from_inputs(FtpInputs::new(outstanding, profiles, rates))
    }

    pub fn from_inputs(inputs: FtpInputs) -> Result<Self> {
        inputs.validate()?;
        log::debug!(
            "created computation for {} positions x {} periods",
            inputs.positions(),
            inputs.periods()
        );
        Ok(Self {
            inputs,
            config: EngineConfig::default(),
            results: None,
        })
    }

    /// Replace the engine configuration used by later computes
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    /// Run `method`, replacing any previous result set on success
    pub fn compute(&mut self, method: Method) -> Result<()> {
        let outputs = engine::compute(&self.inputs, method, &self.config)?;
        self.results = Some((method, outputs));
        Ok(())
    }

    /// Method that produced the current result set
    pub fn method(&self) -> Option<Method> {
        self.results.as_ref().map(|(method, _)| *method)
    }

    pub fn is_computed(&self) -> bool {
        self.results.is_some()
    }

    pub fn outputs(&self) -> Result<&FtpOutputs> {
        self.results
            .as_ref()
            .map(|(_, outputs)| outputs)
            .ok_or(FtpError::NotComputed)
    }

    /// `(rows, cols)` of the result set
    pub fn dims(&self) -> Result<(usize, usize)> {
        self.outputs().map(FtpOutputs::dims)
    }

    pub fn output(&self, kind: OutputKind) -> Result<&Matrix> {
        self.outputs().map(|outputs| outputs.get(kind))
    }

    /// Copy one output row-major into `dst`; `dst` is untouched on failure
    pub fn copy_output(&self, kind: OutputKind, dst: &mut [f64]) -> Result<usize> {
        self.output(kind)?.copy_into(dst)
    }

    pub fn inputs(&self) -> &FtpInputs {
        &self.inputs
    }

    pub fn outstanding(&self) -> &Matrix {
        &self.inputs.outstanding
    }

    pub fn profiles(&self) -> &Matrix {
        &self.inputs.profiles
    }

    pub fn rates(&self) -> &Matrix {
        &self.inputs.rates
    }

    /// Take the result set out, consuming the handle
    pub fn into_outputs(self) -> Result<FtpOutputs> {
        self.results
            .map(|(_, outputs)| outputs)
            .ok_or(FtpError::NotComputed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RateBlending;

    fn test_computation() -> Computation {
        Computation::new(
            Matrix::column(vec![1000.0, 1200.0, 1350.0]),
            Matrix::from_rows(vec![vec![1.00, 0.50, 0.20, 0.05]; 3]).unwrap(),
            Matrix::from_rows(vec![
                vec![0.01300, 0.01400, 0.01600],
                vec![0.01360, 0.01460, 0.01660],
                vec![0.01430, 0.01530, 0.01730],
            ])
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_short_rates() {
        let err = Computation::new(
            Matrix::column(vec![1000.0]),
            Matrix::from_rows(vec![vec![1.0, 0.5, 0.2, 0.05]]).unwrap(),
            Matrix::from_rows(vec![vec![0.01, 0.02]]).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, FtpError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_results_absent_until_computed() {
        let calc = test_computation();
        assert!(!calc.is_computed());
        assert_eq!(calc.method(), None);
        assert_eq!(calc.dims(), Err(FtpError::NotComputed));

        let mut buf = [7.0; 9];
        assert_eq!(
            calc.copy_output(OutputKind::StockAmort, &mut buf),
            Err(FtpError::NotComputed)
        );
        assert_eq!(buf, [7.0; 9]);
    }

    #[test]
    fn test_dims_follow_rates() {
        let mut calc = test_computation();
        calc.compute(Method::Stock).unwrap();
        assert_eq!(calc.dims().unwrap(), calc.rates().dims());
        assert_eq!(calc.method(), Some(Method::Stock));
    }

    #[test]
    fn test_switching_method_replaces_all_outputs() {
        let mut calc = test_computation();
        calc.compute(Method::Stock).unwrap();
        calc.compute(Method::Flux).unwrap();

        let fresh = {
            let mut c = test_computation();
            c.compute(Method::Flux).unwrap();
            c.into_outputs().unwrap()
        };
        assert_eq!(calc.method(), Some(Method::Flux));
        assert_eq!(calc.outputs().unwrap(), &fresh);
    }

    #[test]
    fn test_failed_compute_keeps_previous_results() {
        let mut calc = test_computation();
        calc.compute(Method::Stock).unwrap();
        let before = calc.outputs().unwrap().clone();

        calc.set_config(EngineConfig {
            periods_per_year: 0,
            ..EngineConfig::default()
        });
        assert!(calc.compute(Method::Flux).is_err());
        assert_eq!(calc.method(), Some(Method::Stock));
        assert_eq!(calc.outputs().unwrap(), &before);
    }

    #[test]
    fn test_config_changes_rate_convention() {
        let mut simple = test_computation();
        simple.compute(Method::Stock).unwrap();
        let mut compounded = test_computation().with_config(EngineConfig {
            blending: RateBlending::Compounded,
            ..EngineConfig::default()
        });
        compounded.compute(Method::Stock).unwrap();

        let a = simple.output(OutputKind::FtpRate).unwrap();
        let b = compounded.output(OutputKind::FtpRate).unwrap();
        // Last period blends a single rate
        assert!((a[(0, 2)] - 0.016).abs() < 1e-15);
        assert!((b[(0, 2)] - 0.016).abs() < 1e-15);
        // Geometric blend never exceeds the arithmetic one
        assert!(b[(0, 0)] < a[(0, 0)]);
    }

    #[test]
    fn test_input_copies_are_owned() {
        let outstanding = Matrix::column(vec![5.0]);
        let calc = Computation::new(
            outstanding.clone(),
            Matrix::from_rows(vec![vec![1.0, 0.0]]).unwrap(),
            Matrix::from_rows(vec![vec![0.03]]).unwrap(),
        )
        .unwrap();
        drop(outstanding);
        assert_eq!(calc.outstanding().as_slice(), &[5.0]);
    }
}

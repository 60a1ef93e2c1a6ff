
use std::sync::Arc;

use num_complex::Complex;
use num_traits::Zero;
use rustfft::FFTplanner;
use rustfft::FFT as PlannedFFT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Forward,
	Inverse,
}

/// A planned transform of a fixed size.  The inverse direction is scaled by 1/n, so running a forward
/// transform followed by an inverse one returns the original sequence.  Clones share the plan and get
/// their own scratch buffer.
#[derive(Clone)]
pub struct FFT {
	n: usize,
	direction: Direction,
	plan: Arc<dyn PlannedFFT<f64>>,
	scratch: Vec<Complex<f64>>,
}

impl FFT {

	pub fn new(n:usize, direction:Direction) -> Self {
		let mut planner = FFTplanner::new(direction == Direction::Inverse);
		let plan = planner.plan_fft(n);
		let scratch = vec![Complex::zero(); n];
		Self { n, direction, plan, scratch }
	}

	pub fn len(&self) -> usize { self.n }

	pub fn direction(&self) -> Direction { self.direction }

	pub fn execute(&mut self, x:&[Complex<f64>]) -> Result<Vec<Complex<f64>>, &'static str> {
		let mut out:Vec<Complex<f64>> = vec![Complex::zero(); self.n];
		self.execute_into(x, &mut out)?;
		Ok(out)
	}

	pub fn execute_into(&mut self, x:&[Complex<f64>], out:&mut [Complex<f64>]) -> Result<(), &'static str> {
		if x.len() != self.n || out.len() != self.n {
			return Err("Wrong-sized input for FFT");
		}

		// rustfft uses the input as scratch space, so work on a copy
		self.scratch.copy_from_slice(x);
		self.plan.process(&mut self.scratch, out);

		if self.direction == Direction::Inverse {
			let scale:f64 = 1.0 / (self.n as f64);
			for c in out.iter_mut() {
				*c = *c * scale;
			}
		}

		Ok(())
	}

}

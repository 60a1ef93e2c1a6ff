
use num_complex::Complex;

/// Mean power of a window, (1/N) * sum |x[n]|^2.  Zero for an empty window.
pub fn input_power(signal:&[Complex<f64>]) -> f64 {
	if signal.is_empty() { return 0.0; }
	let total:f64 = signal.iter().map(|c| c.re*c.re + c.im*c.im).sum();
	total / (signal.len() as f64)
}

/// Running best hypothesis over one search.  Only a strictly larger power replaces the current best, so
/// the first hypothesis found in search order wins a tie.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detector {
	pub s_max: f64,
	pub code_phase: usize,
	pub doppler_hz: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
	pub code_phase: usize,
	pub doppler_hz: i32,
	pub peak_power: f64,
	pub test_statistic: f64,
	pub detected: bool,
}

impl Detector {

	pub fn new() -> Self { Self { s_max: 0.0, code_phase: 0, doppler_hz: 0 } }

	pub fn update(&mut self, power:f64, code_phase:usize, doppler_hz:i32) {
		if power > self.s_max {
			self.s_max = power;
			self.code_phase = code_phase;
			self.doppler_hz = doppler_hz;
		}
	}

	/// Feeds a full row of code phase powers for one Doppler hypothesis.
	pub fn update_row(&mut self, powers:&[f64], doppler_hz:i32) {
		for (tau, p) in powers.iter().enumerate() {
			self.update(*p, tau, doppler_hz);
		}
	}

	/// Folds in the best of another detector that covered a later part of the search order.
	pub fn merge(&mut self, later:&Detector) {
		self.update(later.s_max, later.code_phase, later.doppler_hz);
	}

	/// Normalizes the peak by N^2 and the input power and compares it against the threshold.  With no
	/// input power the test statistic is zero.
	pub fn decide(&self, window_len:usize, p_in:f64, threshold:f64) -> Detection {
		let n:f64 = window_len as f64;
		let peak_power:f64 = self.s_max / (n * n);
		let test_statistic:f64 = if p_in > 0.0 { peak_power / p_in } else { 0.0 };

		Detection {
			code_phase: self.code_phase,
			doppler_hz: self.doppler_hz,
			peak_power,
			test_statistic,
			detected: test_statistic > threshold,
		}
	}

}

impl Default for Detector {
	fn default() -> Self { Self::new() }
}


use std::f64::consts;

use num_complex::Complex;

use crate::AcqErr;

/// Wipes a carrier of `doppler_hz` off `signal` by mixing with exp(-j*2*pi*f*n/fs), writing the result
/// into `out`.  Only the first min(signal.len(), out.len()) samples are touched.
pub fn wipe_carrier(signal:&[Complex<f64>], doppler_hz:f64, fs:f64, out:&mut [Complex<f64>]) {
	let phase_step_rad:f64 = (-2.0 * consts::PI * doppler_hz) / fs;

	for (idx, (s, o)) in signal.iter().zip(out.iter_mut()).enumerate() {
		let phase:f64 = phase_step_rad * (idx as f64);
		let (sin_val, cos_val) = phase.sin_cos();
		*o = Complex{ re: s.re*cos_val - s.im*sin_val, im: s.re*sin_val + s.im*cos_val };
	}
}

/// Symmetric grid of Doppler hypotheses from -|max_hz| to +|max_hz| (inclusive) in steps of step_hz.
/// |i32::MIN| saturates to i32::MAX.
pub fn doppler_hypotheses(max_hz:i32, step_hz:i32) -> Result<Vec<i32>, AcqErr> {
	if step_hz <= 0 { return Err(AcqErr::InvalidConfig("Doppler step must be positive")); }

	let max_hz:i32 = max_hz.checked_abs().unwrap_or(i32::MAX);
	Ok((-max_hz..=max_hz).step_by(step_hz as usize).collect())
}

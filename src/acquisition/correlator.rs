
use std::sync::Arc;

use num_complex::Complex;
use num_traits::Zero;
use serde::{Serialize, Deserialize};

use crate::AcqErr;
use crate::fourier_analysis::{Direction, FFT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelatorKind {
	Direct,
	Fft,
}

impl Default for CorrelatorKind {
	fn default() -> Self { CorrelatorKind::Direct }
}

/// Circular correlation of a carrier-wiped window against one code period.
pub trait CircularCorrelator {

	/// Fills `power[tau]` with |sum_n shifted[(n+tau) mod N] * conj(code[n])|^2 for every code phase.
	/// `shifted` and `power` must both be as long as the code; otherwise `power` is left untouched.
	fn correlate(&mut self, shifted:&[Complex<f64>], power:&mut [f64]) -> Result<(), AcqErr>;

}

pub fn make_correlator<'a>(kind:CorrelatorKind, code:&'a [Complex<f64>]) -> Result<Box<dyn CircularCorrelator + 'a>, AcqErr> {
	match kind {
		CorrelatorKind::Direct => Ok(Box::new(DirectCorrelator::new(code))),
		CorrelatorKind::Fft    => Ok(Box::new(FftCorrelator::new(code)?)),
	}
}

fn check_lengths(n:usize, shifted:&[Complex<f64>], power:&[f64]) -> Result<(), AcqErr> {
	if shifted.len() != n || power.len() != n { Err(AcqErr::LengthMismatch) } else { Ok(()) }
}

pub struct DirectCorrelator<'a> {
	code: &'a [Complex<f64>],
}

impl<'a> DirectCorrelator<'a> {

	pub fn new(code:&'a [Complex<f64>]) -> Self { Self { code } }

	pub fn correlation(&self, shifted:&[Complex<f64>], tau:usize) -> Complex<f64> {
		let (head, tail) = shifted.split_at(tau);
		let mut re_sum:f64 = 0.0;
		let mut im_sum:f64 = 0.0;

		// tail ++ head is the window rotated left by tau, i.e. index (n+tau) mod N
		for (s, c) in tail.iter().chain(head.iter()).zip(self.code.iter()) {
			re_sum += s.re*c.re + s.im*c.im;
			im_sum += s.im*c.re - s.re*c.im;
		}

		Complex{ re: re_sum, im: im_sum }
	}

}

impl<'a> CircularCorrelator for DirectCorrelator<'a> {

	fn correlate(&mut self, shifted:&[Complex<f64>], power:&mut [f64]) -> Result<(), AcqErr> {
		check_lengths(self.code.len(), shifted, power)?;

		for (tau, p) in power.iter_mut().enumerate() {
			*p = self.correlation(shifted, tau).norm_sqr();
		}
		Ok(())
	}

}

/// Frequency-domain correlator.  The conjugated code spectrum is computed once and shared by clones, so
/// a clone per worker only costs its own scratch buffers.
#[derive(Clone)]
pub struct FftCorrelator {
	fwd: FFT,
	inv: FFT,
	code_freq_domain_conj: Arc<Vec<Complex<f64>>>,
	freq_domain: Vec<Complex<f64>>,
	time_domain: Vec<Complex<f64>>,
}

impl FftCorrelator {

	pub fn new(code:&[Complex<f64>]) -> Result<Self, AcqErr> {
		let n = code.len();
		let mut fwd = FFT::new(n, Direction::Forward);
		let inv = FFT::new(n, Direction::Inverse);

		let code_freq_domain:Vec<Complex<f64>> = fwd.execute(code).map_err(|_| AcqErr::LengthMismatch)?;
		let code_freq_domain_conj:Vec<Complex<f64>> = code_freq_domain.into_iter().map(|c| c.conj()).collect();

		Ok(Self { fwd, inv, code_freq_domain_conj: Arc::new(code_freq_domain_conj),
			freq_domain: vec![Complex::zero(); n], time_domain: vec![Complex::zero(); n] })
	}

	pub fn code_spectrum(&self) -> &Arc<Vec<Complex<f64>>> { &self.code_freq_domain_conj }

}

impl CircularCorrelator for FftCorrelator {

	fn correlate(&mut self, shifted:&[Complex<f64>], power:&mut [f64]) -> Result<(), AcqErr> {
		check_lengths(self.code_freq_domain_conj.len(), shifted, power)?;

		self.fwd.execute_into(shifted, &mut self.freq_domain).map_err(|_| AcqErr::LengthMismatch)?;

		// Multiplication by the conjugate in the freq domain is circular correlation in the time domain
		for (a, b) in self.freq_domain.iter_mut().zip(self.code_freq_domain_conj.iter()) {
			*a = *a * b;
		}

		self.inv.execute_into(&self.freq_domain, &mut self.time_domain).map_err(|_| AcqErr::LengthMismatch)?;

		for (p, c) in power.iter_mut().zip(self.time_domain.iter()) {
			*p = c.norm_sqr();
		}
		Ok(())
	}

}

#[cfg(test)]
mod tests {

	use super::*;

	fn code_4() -> Vec<Complex<f64>> {
		[1.0, -1.0, 1.0, -1.0].iter().map(|x| Complex{ re: *x, im: 0.0 }).collect()
	}

	#[test]
	fn direct_matches_definition() {
		let code:Vec<Complex<f64>> = (0..7).map(|i| Complex{ re: (i as f64).cos(), im: (i as f64 * 1.7).sin() }).collect();
		let shifted:Vec<Complex<f64>> = (0..7).map(|i| Complex{ re: (i as f64 * 0.4).sin(), im: 0.5 - i as f64 }).collect();
		let corr = DirectCorrelator::new(&code);

		for tau in 0..7 {
			let mut expected:Complex<f64> = Complex::zero();
			for n in 0..7 {
				expected += shifted[(n + tau) % 7] * code[n].conj();
			}
			let got = corr.correlation(&shifted, tau);
			assert!((got - expected).norm() < 1.0e-9);
		}
	}

	#[test]
	fn direct_finds_cyclic_shift() {
		let code = code_4();
		let shifted:Vec<Complex<f64>> = [-1.0, 1.0, -1.0, 1.0].iter().map(|x| Complex{ re: *x, im: 0.0 }).collect();
		let mut power:Vec<f64> = vec![0.0; 4];
		DirectCorrelator::new(&code).correlate(&shifted, &mut power).unwrap();
		assert_eq!(power, vec![16.0, 16.0, 16.0, 16.0]);
		assert_eq!(DirectCorrelator::new(&code).correlation(&shifted, 1), Complex{ re: 4.0, im: 0.0 });
		assert_eq!(DirectCorrelator::new(&code).correlation(&shifted, 0), Complex{ re: -4.0, im: 0.0 });
	}

	#[test]
	fn fft_agrees_with_direct() {
		let n:usize = 50;
		let code:Vec<Complex<f64>> = (0..n).map(|i| Complex{ re: if (i*7)%3 == 0 { 1.0 } else { -1.0 }, im: 0.0 }).collect();
		let shifted:Vec<Complex<f64>> = (0..n).map(|i| Complex{ re: (i as f64 * 0.9).cos(), im: (i as f64 * 0.2).sin() }).collect();

		let mut p_direct:Vec<f64> = vec![0.0; n];
		let mut p_fft:Vec<f64> = vec![0.0; n];
		make_correlator(CorrelatorKind::Direct, &code).unwrap().correlate(&shifted, &mut p_direct).unwrap();
		make_correlator(CorrelatorKind::Fft, &code).unwrap().correlate(&shifted, &mut p_fft).unwrap();

		for (a, b) in p_direct.iter().zip(p_fft.iter()) {
			assert!((a - b).abs() < 1.0e-6 * (1.0 + a.abs()));
		}
	}

	#[test]
	fn wrong_sized_buffers_are_rejected() {
		let code = code_4();
		let short:Vec<Complex<f64>> = vec![Complex::zero(); 3];
		let full:Vec<Complex<f64>> = vec![Complex{ re: 1.0, im: 0.0 }; 4];

		for kind in &[CorrelatorKind::Direct, CorrelatorKind::Fft] {
			let mut corr = make_correlator(*kind, &code).unwrap();

			// A short window leaves the previous row alone
			let mut power:Vec<f64> = vec![-1.0; 4];
			assert_eq!(corr.correlate(&short, &mut power), Err(AcqErr::LengthMismatch));
			assert_eq!(power, vec![-1.0; 4]);

			let mut long_power:Vec<f64> = vec![-1.0; 5];
			assert_eq!(corr.correlate(&full, &mut long_power), Err(AcqErr::LengthMismatch));
			assert_eq!(long_power, vec![-1.0; 5]);

			assert!(corr.correlate(&full, &mut power).is_ok());
		}
	}

	#[test]
	fn clones_share_code_spectrum() {
		let code = code_4();
		let corr = FftCorrelator::new(&code).unwrap();
		let worker = corr.clone();
		assert!(Arc::ptr_eq(corr.code_spectrum(), worker.code_spectrum()));
	}

}

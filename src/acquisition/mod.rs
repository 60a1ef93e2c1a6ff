
use std::sync::Arc;

use num_complex::Complex;
use num_traits::Zero;
use serde::{Serialize, Deserialize};
use tokio::task::JoinHandle;

use crate::AcqErr;

pub mod buffer;
pub mod correlator;
pub mod detector;
pub mod doppler;


pub use self::correlator::CorrelatorKind;
pub use self::doppler::doppler_hypotheses;

use self::buffer::WindowBuffer;
use self::correlator::{make_correlator, CircularCorrelator, DirectCorrelator, FftCorrelator};
use self::detector::Detector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
	/// Samples per code period, N
	pub window_len: usize,
	/// Sampling frequency [samples/sec]
	pub fs: f64,
	/// Minimum test statistic (normalized peak over input power) for a detection
	pub threshold: f64,
	pub correlator: CorrelatorKind,
}

impl Default for AcquisitionConfig {

	fn default() -> Self {
		Self { window_len: 1000, fs: 2.0e6, threshold: 0.015, correlator: CorrelatorKind::Direct }
	}

}

impl AcquisitionConfig {

	pub fn new(window_len:usize, fs:f64, threshold:f64) -> Self {
		Self { window_len, fs, threshold, ..Self::default() }
	}

	/// Window of one code period, rounded to the nearest whole sample
	pub fn for_code_period(fs:f64, code_length_sec:f64, threshold:f64) -> Self {
		let window_len:usize = (fs * code_length_sec).round() as usize;
		Self::new(window_len, fs, threshold)
	}

	pub fn with_correlator(mut self, correlator:CorrelatorKind) -> Self {
		self.correlator = correlator;
		self
	}

	pub fn validate(&self) -> Result<(), AcqErr> {
		if self.window_len == 0 {
			Err(AcqErr::InvalidConfig("Window length must be at least one sample"))
		} else if !self.fs.is_finite() || self.fs <= 0.0 {
			Err(AcqErr::InvalidConfig("Sampling frequency must be positive"))
		} else if !self.threshold.is_finite() || self.threshold < 0.0 {
			Err(AcqErr::InvalidConfig("Threshold must be non-negative"))
		} else {
			Ok(())
		}
	}

}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionResult {
	pub code_phase: usize,
	pub doppler_hz: i32,
	pub detected: bool,
	pub test_statistic: f64,
	pub peak_power: f64,
	pub input_power: f64,
}

/// One acquisition window: a sample buffer and a code buffer that are filled in order, plus the working
/// buffers for the Doppler/code phase search.  All buffers are sized once at creation.
pub struct Acquisition {
	config: AcquisitionConfig,
	samples: WindowBuffer,
	code: WindowBuffer,
	shifted: Vec<Complex<f64>>,
	power: Vec<f64>,
	last_result: Option<AcquisitionResult>,
}

fn try_filled<T: Clone>(n:usize, val:T) -> Result<Vec<T>, AcqErr> {
	let mut v:Vec<T> = Vec::new();
	v.try_reserve_exact(n).map_err(|_| AcqErr::AllocationFailure)?;
	v.resize(n, val);
	Ok(v)
}

// Mixes one hypothesis off the samples and feeds every code phase to the detector
fn sweep_hypothesis<C: CircularCorrelator + ?Sized>(samples:&[Complex<f64>], doppler_hz:i32, fs:f64, corr:&mut C,
	shifted:&mut [Complex<f64>], power:&mut [f64], det:&mut Detector) -> Result<(), AcqErr> {

	if shifted.len() != samples.len() { return Err(AcqErr::LengthMismatch); }

	doppler::wipe_carrier(samples, doppler_hz as f64, fs, shifted);
	corr.correlate(shifted, power)?;
	det.update_row(power, doppler_hz);
	Ok(())
}

impl Acquisition {

	pub fn new(config:AcquisitionConfig) -> Result<Self, AcqErr> {
		config.validate()?;

		let n:usize = config.window_len;
		let samples = WindowBuffer::with_capacity(n)?;
		let code    = WindowBuffer::with_capacity(n)?;
		let shifted = try_filled(n, Complex::zero())?;
		let power   = try_filled(n, 0.0)?;

		Ok(Self { config, samples, code, shifted, power, last_result: None })
	}

	pub fn with_defaults() -> Result<Self, AcqErr> { Self::new(AcquisitionConfig::default()) }

	pub fn config(&self) -> &AcquisitionConfig { &self.config }
	pub fn window_len(&self) -> usize { self.config.window_len }
	pub fn samples_len(&self) -> usize { self.samples.len() }
	pub fn code_len(&self) -> usize { self.code.len() }
	pub fn is_ready(&self) -> bool { self.samples.is_full() && self.code.is_full() }

	/// Best hypothesis of the most recent search, whether or not it was a detection
	pub fn last_result(&self) -> Option<&AcquisitionResult> { self.last_result.as_ref() }

	pub fn append_sample(&mut self, re:f64, im:f64) -> Result<(), AcqErr> {
		self.samples.push(Complex{ re, im })
	}

	pub fn append_code(&mut self, re:f64, im:f64) -> Result<(), AcqErr> {
		self.code.push(Complex{ re, im })
	}

	pub fn extend_samples<I: IntoIterator<Item=Complex<f64>>>(&mut self, vals:I) -> Result<(), AcqErr> {
		self.samples.extend(vals)
	}

	pub fn extend_code<I: IntoIterator<Item=Complex<f64>>>(&mut self, vals:I) -> Result<(), AcqErr> {
		self.code.extend(vals)
	}

	/// Starts a new window with the same code
	pub fn clear_samples(&mut self) { self.samples.clear(); }

	pub fn reset(&mut self) {
		self.samples.clear();
		self.code.clear();
	}

	/// Searches every code phase for each Doppler hypothesis in the order given.  The best hypothesis is
	/// recorded as the last result even when it falls below the threshold.
	pub fn search(&mut self, hypotheses:&[i32]) -> Result<AcquisitionResult, AcqErr> {
		if !self.is_ready() { return Err(AcqErr::NotReady); }

		let fs:f64 = self.config.fs;
		let p_in:f64 = detector::input_power(self.samples.as_slice());
		let mut det = Detector::new();

		{
			let mut corr = make_correlator(self.config.correlator, self.code.as_slice())?;
			for doppler_hz in hypotheses {
				sweep_hypothesis(self.samples.as_slice(), *doppler_hz, fs, corr.as_mut(), &mut self.shifted, &mut self.power, &mut det)?;
			}
		}

		Ok(self.record(&det, p_in))
	}

	/// Same search as `search`, with each Doppler hypothesis evaluated on the blocking thread pool.  Rows
	/// are reduced in hypothesis order, so the result is identical to the sequential one.
	pub async fn search_concurrent(&mut self, hypotheses:&[i32]) -> Result<AcquisitionResult, AcqErr> {
		if !self.is_ready() { return Err(AcqErr::NotReady); }

		let fs:f64 = self.config.fs;
		let kind:CorrelatorKind = self.config.correlator;
		let p_in:f64 = detector::input_power(self.samples.as_slice());
		let samples:Arc<Vec<Complex<f64>>> = Arc::new(self.samples.as_slice().to_vec());
		let code:Arc<Vec<Complex<f64>>> = Arc::new(self.code.as_slice().to_vec());

		// The code spectrum is computed here once; each worker clones only the FFT scratch buffers
		let fft_corr:Option<FftCorrelator> = match kind {
			CorrelatorKind::Fft    => Some(FftCorrelator::new(&code)?),
			CorrelatorKind::Direct => None,
		};

		let handles:Vec<JoinHandle<Result<Detector, AcqErr>>> = hypotheses.iter().map(|doppler_hz| {
			let doppler_hz:i32 = *doppler_hz;
			let samples = samples.clone();
			let code = code.clone();
			let fft_corr = fft_corr.clone();

			tokio::task::spawn_blocking(move || -> Result<Detector, AcqErr> {
				let n:usize = samples.len();
				let mut shifted:Vec<Complex<f64>> = vec![Complex::zero(); n];
				let mut power:Vec<f64> = vec![0.0; n];
				let mut row = Detector::new();
				match fft_corr {
					Some(mut corr) => sweep_hypothesis(&samples, doppler_hz, fs, &mut corr, &mut shifted, &mut power, &mut row)?,
					None => sweep_hypothesis(&samples, doppler_hz, fs, &mut DirectCorrelator::new(&code), &mut shifted, &mut power, &mut row)?,
				}
				Ok(row)
			})
		}).collect();

		let mut det = Detector::new();
		for handle in handles {
			let row:Detector = handle.await.map_err(|_| AcqErr::Other("Acquisition worker failed"))??;
			det.merge(&row);
		}

		Ok(self.record(&det, p_in))
	}

	fn record(&mut self, det:&Detector, p_in:f64) -> AcquisitionResult {
		let d = det.decide(self.config.window_len, p_in, self.config.threshold);
		let result = AcquisitionResult {
			code_phase:     d.code_phase,
			doppler_hz:     d.doppler_hz,
			detected:       d.detected,
			test_statistic: d.test_statistic,
			peak_power:     d.peak_power,
			input_power:    p_in,
		};

		self.last_result = Some(result);
		result
	}

}


use std::fmt;

use num_complex::Complex;

pub mod acquisition;
pub mod fourier_analysis;
pub mod io;

#[derive(Debug, Clone)]
pub struct Sample {
	pub val: Complex<f64>,
	pub idx: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AcqErr {
	AllocationFailure,
	CapacityExceeded,
	NotReady,
	LengthMismatch,
	InvalidConfig(&'static str),
	Other(&'static str),
}

impl fmt::Display for AcqErr {

	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result {
		match self {
			AcqErr::AllocationFailure => write!(f, "Unable to allocate acquisition buffers"),
			AcqErr::CapacityExceeded  => write!(f, "Acquisition window is already full"),
			AcqErr::NotReady          => write!(f, "Acquisition window is not full yet"),
			AcqErr::LengthMismatch    => write!(f, "Buffer length doesn't match the window length"),
			AcqErr::InvalidConfig(s)  => write!(f, "Invalid acquisition configuration: {}", s),
			AcqErr::Other(s)          => write!(f, "{}", s),
		}
	}

}

impl std::error::Error for AcqErr {}

impl From<AcqErr> for &'static str {

	fn from(e:AcqErr) -> &'static str {
		match e {
			AcqErr::AllocationFailure => "Unable to allocate acquisition buffers",
			AcqErr::CapacityExceeded  => "Acquisition window is already full",
			AcqErr::NotReady          => "Acquisition window is not full yet",
			AcqErr::LengthMismatch    => "Buffer length doesn't match the window length",
			AcqErr::InvalidConfig(s)  => s,
			AcqErr::Other(s)          => s,
		}
	}

}


use num_complex::Complex;

use crate::AcqErr;

/// Fixed-capacity, append-only window of complex values.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
	data: Vec<Complex<f64>>,
	capacity: usize,
}

impl WindowBuffer {

	/// Storage is reserved up front so that appending never reallocates; a failed reservation is
	/// reported instead of aborting the process.
	pub fn with_capacity(capacity:usize) -> Result<Self, AcqErr> {
		let mut data:Vec<Complex<f64>> = Vec::new();
		data.try_reserve_exact(capacity).map_err(|_| AcqErr::AllocationFailure)?;
		Ok(Self { data, capacity })
	}

	pub fn push(&mut self, val:Complex<f64>) -> Result<(), AcqErr> {
		if self.is_full() {
			Err(AcqErr::CapacityExceeded)
		} else {
			self.data.push(val);
			Ok(())
		}
	}

	pub fn extend<I: IntoIterator<Item=Complex<f64>>>(&mut self, vals:I) -> Result<(), AcqErr> {
		for val in vals {
			self.push(val)?;
		}
		Ok(())
	}

	/// Rewinds the write cursor; capacity is kept.
	pub fn clear(&mut self) { self.data.clear(); }

	pub fn len(&self) -> usize { self.data.len() }
	pub fn capacity(&self) -> usize { self.capacity }
	pub fn is_empty(&self) -> bool { self.data.is_empty() }
	pub fn is_full(&self) -> bool { self.data.len() >= self.capacity }

	pub fn as_slice(&self) -> &[Complex<f64>] { &self.data }

}

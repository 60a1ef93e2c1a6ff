use std::fs::File;
use std::io::{BufReader, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use num_complex::Complex;

use crate::Sample;

pub const BUFFER_SIZE:usize = 8192;

/// Reads interleaved little-endian i16 IQ pairs and yields them as indexed complex samples.  A trailing
/// partial pair at the end of the stream is dropped.
pub struct BufferedSource<S: Read> {
	src: BufReader<S>,
	idx: usize,
}

impl<S: Read> BufferedSource<S> {

	pub fn new(src:S) -> Self {
		Self { src: BufReader::with_capacity(BUFFER_SIZE, src), idx: 0 }
	}

	pub fn samples_read(&self) -> usize { self.idx }

	fn read_pair(&mut self) -> std::io::Result<(i16, i16)> {
		let re = self.src.read_i16::<LittleEndian>()?;
		let im = self.src.read_i16::<LittleEndian>()?;
		Ok((re, im))
	}

}

impl BufferedSource<File> {

	pub fn open(fname:&str) -> Result<Self, &'static str> {
		let file = File::open(fname).map_err(|_| "Unable to open input file")?;
		Ok(Self::new(file))
	}

}

impl<S: Read> Iterator for BufferedSource<S> {
	type Item = Sample;

	fn next(&mut self) -> Option<Sample> {
		match self.read_pair() {
			Ok((re, im)) => {
				let ans = Sample{ val: Complex{ re: re as f64, im: im as f64 }, idx: self.idx };
				self.idx += 1;
				Some(ans)
			},
			// Includes UnexpectedEof, which is the normal end of the recording
			Err(_) => None
		}
	}
}

#[cfg(test)]
mod tests {

	use super::*;
	use byteorder::WriteBytesExt;

	#[test]
	fn decodes_interleaved_i16() {
		let mut bytes:Vec<u8> = vec![];
		for x in &[1i16, -2, 300, -400, 5] {
			bytes.write_i16::<LittleEndian>(*x).unwrap();
		}

		let mut src = BufferedSource::new(&bytes[..]);
		let samples:Vec<Sample> = (&mut src).collect();

		// The dangling real part at the end doesn't make a full sample
		assert_eq!(samples.len(), 2);
		assert_eq!(samples[0].val, Complex{ re: 1.0, im: -2.0 });
		assert_eq!(samples[1].val, Complex{ re: 300.0, im: -400.0 });
		assert_eq!(samples[1].idx, 1);
		assert_eq!(src.samples_read(), 2);
	}

}

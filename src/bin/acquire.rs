
use std::fs::File;
use std::io::BufReader;

use clap::{Arg, App};
use colored::*;
use num_complex::Complex;
use serde::{Serialize, Deserialize};

use acq_search::io::BufferedSource;
use acq_search::acquisition::{Acquisition, AcquisitionConfig, AcquisitionResult, CorrelatorKind, doppler_hypotheses};

#[derive(Debug, Serialize, Deserialize)]
struct CodeSpec {
	code: Vec<i8>,
	code_length_sec: Option<f64>,
	code_rate_cps: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AcquisitionRecord {
	window_idx: usize,
	start_sample_idx: usize,
	code_phase: usize,
	doppler_hz: i32,
	detected: bool,
	test_statistic: f64,
}

#[tokio::main]
async fn main() -> Result<(), &'static str> {

	let matches = App::new("Acquisition Search")
		.version("0.1.0")
		.author("John Stanford (johnwstanford@gmail.com)")
		.about("Takes IQ samples and a JSON-formatted spreading code and searches each code period for the code phase and Doppler")
		.arg(Arg::with_name("filename")
			.short("f").long("filename")
			.help("Input filename, interleaved little-endian i16 IQ")
			.required(true).takes_value(true))
		.arg(Arg::with_name("sample_rate_sps")
			.short("s").long("sample_rate_sps")
			.takes_value(true).required(true))
		.arg(Arg::with_name("json_spec")
			.short("j").long("json_spec")
			.help("Code specification with a code length or a chipping rate")
			.required(true).takes_value(true))
		.arg(Arg::with_name("doppler_max")
			.short("d").long("doppler_max")
			.takes_value(true))
		.arg(Arg::with_name("doppler_step")
			.long("doppler_step")
			.help("Doppler bin spacing [Hz], must be positive")
			.takes_value(true))
		.arg(Arg::with_name("threshold")
			.short("g").long("threshold")
			.takes_value(true))
		.arg(Arg::with_name("fft")
			.long("fft")
			.help("Correlate in the frequency domain"))
		.arg(Arg::with_name("concurrent")
			.long("concurrent")
			.help("Search Doppler hypotheses in parallel"))
		.arg(Arg::with_name("max_records")
			.short("m").long("max_records")
			.takes_value(true))
		.get_matches();

	// Read command line arguments
	let fname:&str = matches.value_of("filename").ok_or("No input filename provided")?;
	let fs:f64 = matches.value_of("sample_rate_sps").ok_or("No sample rate provided")?.parse().map_err(|_| "Unable to parse sample rate as an f64")?;
	let doppler_max:i32 = matches.value_of("doppler_max").unwrap_or("5000").parse().map_err(|_| "Unable to parse max Doppler")?;
	let doppler_step:i32 = matches.value_of("doppler_step").unwrap_or("500").parse().map_err(|_| "Unable to parse Doppler step")?;
	let threshold:f64 = matches.value_of("threshold").unwrap_or("0.015").parse().map_err(|_| "Unable to parse threshold")?;
	let opt_max_records:Option<usize> = match matches.value_of("max_records") {
		Some(s) => Some(s.parse().map_err(|_| "Unable to parse max records")?),
		None => None,
	};
	let concurrent:bool = matches.is_present("concurrent");
	let correlator = if matches.is_present("fft") { CorrelatorKind::Fft } else { CorrelatorKind::Direct };

	// Open specification file
	let spec:CodeSpec = {
		let fname:&str = matches.value_of("json_spec").ok_or("No JSON specification file provided")?;
		let file = File::open(fname).map_err(|_| "Unable to open JSON specification file")?;
		let reader = BufReader::new(file);
		serde_json::from_reader(reader).map_err(|_| "Unable to parse JSON specification")?
	};

	if spec.code.is_empty() { return Err("Code specification contains no chips"); }

	let (code_length_sec, code_rate_cps) = match (spec.code_length_sec, spec.code_rate_cps) {
		(Some(code_length_sec), None) =>
			// [chips] / [sec] = [chips/sec]
			(code_length_sec, (spec.code.len() as f64) / code_length_sec),
		(None, Some(code_rate_cps)) =>
			// [chips] / [chips/sec] = [sec]
			((spec.code.len() as f64) / code_rate_cps, code_rate_cps),
		(_, _) => return Err("Must specify either code length or chipping rate, but not both")
	};

	// One code period at the input sample rate
	let config = AcquisitionConfig::for_code_period(fs, code_length_sec, threshold).with_correlator(correlator);
	let window_len:usize = config.window_len;
	let resampled_code:Vec<Complex<f64>> = (0..window_len).map(|i| {
		let idx:f64 = (i as f64) * (code_rate_cps / fs);
		Complex{ re: spec.code[(idx as usize) % spec.code.len()] as f64, im: 0.0 }
	}).collect();

	let mut acq = Acquisition::new(config)?;
	acq.extend_code(resampled_code)?;

	let hypotheses:Vec<i32> = doppler_hypotheses(doppler_max, doppler_step)?;

	eprintln!("Searching {} at {} [samples/sec], {} [samples/window], {} Doppler bins, max_records={:?}",
		&fname, &fs, window_len, hypotheses.len(), &opt_max_records);

	let mut all_records:Vec<AcquisitionRecord> = vec![];
	let mut start_sample_idx:usize = 0;

	for s in BufferedSource::open(fname)? {

		if acq.samples_len() == 0 { start_sample_idx = s.idx; }
		acq.append_sample(s.val.re, s.val.im)?;

		if acq.is_ready() {
			let search:Result<AcquisitionResult, _> = if concurrent {
				acq.search_concurrent(&hypotheses).await
			} else {
				acq.search(&hypotheses)
			};

			match search {
				Ok(result) => {
					let result_str = format!("{:9} [Hz], {:6} [samples], {:.8}", result.doppler_hz, result.code_phase, result.test_statistic);
					let t:f64 = start_sample_idx as f64 / fs;
					if result.detected {
						eprintln!("{:6.3} [sec] {}", t, result_str.green());
					} else {
						eprintln!("{:6.3} [sec] {}", t, result_str.yellow());
					}

					all_records.push(AcquisitionRecord {
						window_idx:       all_records.len(),
						start_sample_idx,
						code_phase:       result.code_phase,
						doppler_hz:       result.doppler_hz,
						detected:         result.detected,
						test_statistic:   result.test_statistic,
					});
				},
				Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
			}

			acq.clear_samples();

			if let Some(max_records) = opt_max_records {
				if all_records.len() >= max_records { break; }
			}
		}

	}

	if acq.samples_len() > 0 {
		eprintln!("Dropped {} trailing samples that don't fill a window", acq.samples_len());
	}

	// Output data in JSON format
	println!("{}", serde_json::to_string_pretty(&all_records).map_err(|_| "Unable to serialize results")?);

	Ok(())

}

//! Sphere point editor tooling.
//!
//! - `generate`: write a synthetic dataset in the upload format
//! - `upload`: validate a payload and replace the point store with it
//! - `inspect`: run a background pass and report compartment occupancy
//! - `view`: open a headless editor session and print what it would draw

mod config;
mod generate;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use globe_core::{
	compartment_cells, compartment_index, initial_load, BackgroundLoader, EditorSession, JsonFileKeyValue, JsonFileStore,
	PointStore, RenderFrame, Renderer, WorkerResponse, GRID_SIZE,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use config::Config;

/// Sphere point editor tooling.
#[derive(Parser, Debug)]
#[command(name = "globe")]
#[command(about = "Generate, upload and inspect sphere point datasets")]
struct Args {
	/// Path to configuration TOML file.
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Write random points as a JSON array.
	Generate {
		/// Output file.
		#[arg(short, long, default_value = "data.json")]
		output: PathBuf,

		/// Number of records.
		#[arg(short = 'n', long, default_value_t = 150_000)]
		count: usize,

		/// RNG seed (random when omitted).
		#[arg(long)]
		seed: Option<u64>,
	},

	/// Replace the point store with the contents of a JSON payload.
	Upload {
		/// Payload file: an array of objects with `id`, `x` and `y`.
		payload: PathBuf,

		/// Point store file.
		#[arg(short, long, default_value = "points.jsonl")]
		store: PathBuf,
	},

	/// Bucket the whole store and print per-compartment counts.
	Inspect {
		/// Point store file.
		#[arg(short, long, default_value = "points.jsonl")]
		store: PathBuf,

		/// Seconds to wait for the background pass.
		#[arg(long, default_value_t = 60)]
		timeout: u64,
	},

	/// Open an editor session, apply view changes, and print one frame.
	View {
		/// Point store file.
		#[arg(short, long, default_value = "points.jsonl")]
		store: PathBuf,

		/// Persisted view state file.
		#[arg(long, default_value = "view_state.json")]
		state: PathBuf,

		/// Zoom to apply (clamped to the configured range).
		#[arg(long)]
		zoom: Option<f64>,

		/// Rotation delta around X and Y, in radians.
		#[arg(long, num_args = 2, value_names = ["DX", "DY"], allow_negative_numbers = true)]
		rotate: Option<Vec<f64>>,

		/// Advance keyboard focus this many points before drawing.
		#[arg(long, default_value_t = 0)]
		tab: usize,

		/// Seconds to wait for the background pass.
		#[arg(long, default_value_t = 60)]
		timeout: u64,
	},
}

fn main() -> Result<()> {
	fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();
	let config = Config::load_or_default(args.config.as_deref())?;

	match args.command {
		Command::Generate { output, count, seed } => {
			let records = generate::generate_records(count, seed);
			generate::write_records(&output, &records)?;
			println!("Wrote {} records to {}", records.len(), output.display());
		}
		Command::Upload { payload, store } => {
			let text = std::fs::read_to_string(&payload)
				.with_context(|| format!("Failed to read payload: {}", payload.display()))?;
			let store: Arc<dyn PointStore> = Arc::new(JsonFileStore::new(store));
			let message = globe_core::spawn_upload(store, text)
				.recv()
				.context("Upload worker exited without reporting")?;
			if !message.is_done() {
				bail!("{}", message.text());
			}
			println!("{}", message.text());
		}
		Command::Inspect { store, timeout } => {
			let store: Arc<dyn PointStore> = Arc::new(JsonFileStore::new(store));
			let initial = initial_load(store.as_ref(), config.editor.initial_batch_size)?;
			println!("Initial batch: {} points", initial.len());

			let mut loader = BackgroundLoader::spawn(Arc::clone(&store));
			match wait_for_pass(&mut loader, timeout)? {
				WorkerResponse::ProcessedData { compartments, stats } => {
					println!(
						"Background pass: {} records bucketed, {} skipped, {} us",
						stats.scanned, stats.skipped, stats.elapsed_us
					);
					print_occupancy(&compartments.occupancy());
				}
				WorkerResponse::Failed { message } => bail!("Background pass failed: {message}"),
			}
			let metrics = loader.metrics();
			if let Some((index, count)) = metrics.busiest_compartment() {
				let (lat, lon) = compartment_cells(index);
				println!("Busiest compartment: {index} (lat {lat}, lon {lon}) with {count} points");
			}
			if let (Some(last), Some((min, max))) = (metrics.pass_timings.last(), metrics.pass_timings.min_max()) {
				println!(
					"Pass timing: last {last} us, avg {:.0} us, range {min}..{max} us over {} passes",
					metrics.avg_pass_timing_us(),
					metrics.passes_completed
				);
			}
		}
		Command::View {
			store,
			state,
			zoom,
			rotate,
			tab,
			timeout,
		} => {
			let store: Arc<dyn PointStore> = Arc::new(JsonFileStore::new(store));
			let kv = Arc::new(JsonFileKeyValue::new(state));
			let mut session = EditorSession::open(config.editor.clone(), store.as_ref(), kv)?;

			let mut loader = BackgroundLoader::spawn(Arc::clone(&store));
			session.apply_worker_response(wait_for_pass(&mut loader, timeout)?);

			if let Some(delta) = rotate {
				session.rotate_by(delta[0], delta[1]);
			}
			if let Some(zoom) = zoom {
				session.set_zoom(zoom);
			}
			for _ in 0..tab {
				session.cycle_focus(true);
			}

			let mut summary = FrameSummary::default();
			session.render(&mut summary);

			let orientation = session.orientation();
			println!(
				"Orientation: rotation ({:.3}, {:.3}), zoom {:.2}",
				orientation.rotation_x(),
				orientation.rotation_y(),
				orientation.zoom_scale()
			);
			println!("View policy: {:?}", session.viewport().policy());
			println!(
				"Frame: {} points drawn, {} in hierarchy",
				summary.drawn,
				session.hierarchy().total_points()
			);
			if let Some(readout) = session.readout() {
				println!("{readout}");
			}
			if !session.status().is_empty() {
				println!("Status: {}", session.status());
			}
		}
	}

	Ok(())
}

fn wait_for_pass(loader: &mut BackgroundLoader, timeout: u64) -> Result<WorkerResponse> {
	match loader.wait(Duration::from_secs(timeout))? {
		Some(response) => Ok(response),
		None => bail!("Background pass did not finish within {timeout}s"),
	}
}

fn print_occupancy(occupancy: &[usize]) {
	println!("Occupancy (rows: latitude cells, columns: longitude cells):");
	for lat in 0..GRID_SIZE {
		let row: Vec<String> = (0..GRID_SIZE)
			.map(|lon| format!("{:>7}", occupancy[compartment_index(lat, lon)]))
			.collect();
		println!("{}", row.join(""));
	}
}

/// Renderer that only counts what it is asked to draw.
#[derive(Default)]
struct FrameSummary {
	drawn: usize,
}

impl Renderer for FrameSummary {
	fn draw(&mut self, frame: &RenderFrame) {
		self.drawn = frame.positions.len();
		tracing::debug!(points = self.drawn, focused = ?frame.focused, "frame");
	}
}

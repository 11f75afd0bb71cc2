//! Synthetic dataset generation.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Record shape accepted by `upload`. `children` is always empty.
#[derive(Debug, Serialize)]
pub struct GeneratedRecord {
	pub id: u64,
	pub x: f64,
	pub y: f64,
	pub children: Vec<GeneratedRecord>,
}

/// `count` records with sequential ids and `(x, y)` uniform in `[-1, 1)`.
pub fn generate_records(count: usize, seed: Option<u64>) -> Vec<GeneratedRecord> {
	let mut rng = match seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};
	(0..count as u64)
		.map(|id| GeneratedRecord {
			id,
			x: rng.random_range(-1.0..1.0),
			y: rng.random_range(-1.0..1.0),
			children: Vec::new(),
		})
		.collect()
}

/// Write records as a pretty-printed JSON array.
pub fn write_records(path: &Path, records: &[GeneratedRecord]) -> Result<()> {
	let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
	let mut writer = BufWriter::new(file);
	serde_json::to_writer_pretty(&mut writer, records).context("Failed to serialize records")?;
	writer
		.flush()
		.with_context(|| format!("Failed to write {}", path.display()))?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn coordinates_in_unit_square() {
		let records = generate_records(1000, Some(7));
		assert_eq!(records.len(), 1000);
		for (i, r) in records.iter().enumerate() {
			assert_eq!(r.id, i as u64);
			assert!((-1.0..1.0).contains(&r.x));
			assert!((-1.0..1.0).contains(&r.y));
			assert!(r.children.is_empty());
		}
	}

	#[test]
	fn seed_is_reproducible() {
		let a = generate_records(16, Some(42));
		let b = generate_records(16, Some(42));
		assert!(a.iter().zip(&b).all(|(a, b)| a.x == b.x && a.y == b.y));
	}

	#[test]
	fn output_passes_upload_validation() {
		let text = serde_json::to_string_pretty(&generate_records(10, Some(1))).unwrap();
		let records = globe_core::validate_payload(&text).unwrap();
		assert_eq!(records.len(), 10);
		assert_eq!(records[3].id, globe_core::RecordId::Int(3));
	}
}

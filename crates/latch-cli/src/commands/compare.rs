use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use latch_core::io::read_descriptors;
use latch_core::verify::{checksum, compare};

#[derive(Args)]
pub struct CompareArgs {
    /// First descriptor dump
    pub left: PathBuf,
    /// Second descriptor dump
    pub right: PathBuf,
}

pub fn run(args: &CompareArgs) -> Result<()> {
    let left = read_descriptors(&args.left)
        .with_context(|| format!("Failed to read {}", args.left.display()))?;
    let right = read_descriptors(&args.right)
        .with_context(|| format!("Failed to read {}", args.right.display()))?;

    let cmp = compare(&left, &right);
    println!("Left:        {} descs, checksum {:x}", left.len(), checksum(&left));
    println!("Right:       {} descs, checksum {:x}", right.len(), checksum(&right));
    if !cmp.lengths_match() {
        println!("Warning:     lengths differ, compared the first {}", cmp.compared);
    }
    println!("Identical:   {}", cmp.identical);
    println!("Differing:   {}", cmp.differing());
    println!("Mean dist:   {:.3} bits", cmp.mean_hamming);
    println!("Max dist:    {} bits", cmp.max_hamming);

    Ok(())
}

//! Dump a .tex texture to a PPM image for inspection

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use mwf_atlas::tex;
use mwf_tools::DumpArgs;

fn main() -> anyhow::Result<()> {
    mwf_tools::init_logging();

    let args = DumpArgs::parse();

    let input = File::open(&args.tex)
        .with_context(|| format!("failed to open {}", args.tex.display()))?;
    let output = File::create(&args.ppm)
        .with_context(|| format!("failed to create {}", args.ppm.display()))?;

    let mut reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);
    let header = tex::write_ppm(&mut reader, &mut writer)
        .with_context(|| format!("failed to convert {}", args.tex.display()))?;
    writer.flush()?;

    tracing::info!("width {:#x} height {:#x}", header.width, header.height);
    Ok(())
}

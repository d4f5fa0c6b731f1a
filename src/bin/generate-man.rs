//! Render the mstodo man page
//!
//! Usage: `generate-man [OUTPUT_DIR]`. Without a directory the page is
//! written to stdout.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_mangen::Man;
use mstodo::cli::Cli;

fn main() -> Result<()> {
    let man = Man::new(Cli::command());

    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let path = dir.join("mstodo.1");
            let mut file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            man.render(&mut file)?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            man.render(&mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

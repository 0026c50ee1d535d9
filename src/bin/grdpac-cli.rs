//! grdpac-cli - Command-line interface for grdpac
//!
//! Lists and extracts PAC archives and converts GRD images to PNG.

use clap::{Parser, Subcommand};
use grdpac::batch::{
    convert_directory, convert_grd_to_png, extract_archive, find_grd_files, BatchOptions,
};
use grdpac::{ArcView, GrdMetadata, PacArchive};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "grdpac-cli")]
#[command(about = "A CLI tool for PAC archives and GRD images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries of a PAC archive
    List {
        /// Archive to list
        archive: PathBuf,
    },

    /// Extract every entry of a PAC archive
    Extract {
        /// Archive to extract
        archive: PathBuf,

        /// Output directory
        output: PathBuf,

        /// Force overwrite of existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Convert a GRD file, or every GRD file in a directory, to PNG
    Convert {
        /// Input GRD file or directory
        input: PathBuf,

        /// Output PNG file or directory
        output: PathBuf,

        /// Force overwrite of existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Show the header of a GRD file
    Info {
        /// GRD file to analyze
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let result = match cli.command {
        Commands::List { archive } => list_archive(&archive),
        Commands::Extract {
            archive,
            output,
            force,
        } => extract(&archive, &output, force, cli.quiet),
        Commands::Convert {
            input,
            output,
            force,
        } => convert(&input, &output, force, cli.quiet),
        Commands::Info { input } => show_file_info(&input, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn list_archive(archive: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let archive_data = PacArchive::open(archive)?;
    let index = archive_data.index();

    println!("PAC Archive: {}", archive.display());
    println!("  Version: {:?}", index.version);
    println!("  Entries: {}", index.len());
    println!("  Data offset: {:#x}", index.data_base_offset);
    println!();
    println!("{:<10} {:>10} {:>10}  name", "kind", "offset", "size");
    for entry in index {
        println!(
            "{:<10} {:>#10x} {:>10}  {}",
            entry.kind.as_str(),
            entry.offset,
            entry.size,
            entry.name
        );
    }
    Ok(())
}

fn extract(
    archive: &Path,
    output: &Path,
    force: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !archive.exists() {
        return Err(format!("Input file '{}' does not exist", archive.display()).into());
    }

    let start_time = Instant::now();
    let options = BatchOptions { overwrite: force };
    let report = extract_archive(archive, output, &options)?;

    if !quiet {
        for path in &report.written {
            println!("Extracted: {}", path.display());
        }
        for (path, reason) in &report.skipped {
            println!("Skipped:   {} ({reason})", path.display());
        }
        if report.skipped.is_empty() {
            println!("✓ Extraction complete!");
        } else {
            println!("Extraction finished with skipped entries. Use --force to overwrite");
        }
        println!("  Files:   {}", report.written.len());
        println!("  Skipped: {}", report.skipped.len());
        println!("  Time:    {:.2?}", start_time.elapsed());
    }
    Ok(())
}

fn convert(
    input: &Path,
    output: &Path,
    force: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input '{}' does not exist", input.display()).into());
    }

    if !input.is_dir() {
        if output.exists() && !force {
            return Err(format!(
                "Output file '{}' already exists. Use --force to overwrite",
                output.display()
            )
            .into());
        }
        convert_grd_to_png(input, output)?;
        if !quiet {
            println!("Converted: {} -> {}", input.display(), output.display());
        }
        return Ok(());
    }

    let start_time = Instant::now();
    let total = find_grd_files(input).len() as u64;

    // Show progress bar for directory conversion
    let progress = if !quiet {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        pb.set_message("Converting...");
        Some(pb)
    } else {
        None
    };

    let options = BatchOptions { overwrite: force };
    let report = convert_directory(input, output, &options, |path| {
        if let Some(ref pb) = progress {
            pb.set_message(path.display().to_string());
            pb.inc(1);
        }
    })?;

    if let Some(ref pb) = progress {
        pb.finish_with_message("Conversion complete");
    }

    if !quiet {
        println!("✓ Converted {} of {} files", report.converted.len(), report.total());
        println!("  Skipped: {}", report.skipped.len());
        println!("  Failed:  {}", report.failed.len());
        println!("  Time:    {:.2?}", start_time.elapsed());
        for (path, e) in &report.failed {
            println!("  ✗ {}: {}", path.display(), e);
        }
    }
    Ok(())
}

fn show_file_info(input: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Check if input file exists
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }

    let mut view = ArcView::open(input)?;
    let file_size = view.max_offset();

    println!("GRD File Information:");
    println!("  File: {}", input.display());
    println!("  Size: {} bytes", file_size);

    let meta = match GrdMetadata::read_from(&mut view) {
        Ok(meta) => meta,
        Err(e) => {
            println!("  Status: ✗ Not a valid GRD file");
            if verbose {
                println!("  Error: {}", e);
            }
            return Ok(());
        }
    };

    println!("  Format: {:#06x} ({})", meta.format, meta.pack_type().as_str());
    println!("  Dimensions: {}x{} @ {} bpp", meta.width, meta.height, meta.bpp);
    println!(
        "  Placement: ({}, {}) on {}x{} screen",
        meta.offset_x, meta.offset_y, meta.screen_width, meta.screen_height
    );
    println!(
        "  Planes: alpha {} / red {} / green {} / blue {} bytes",
        meta.alpha_size, meta.red_size, meta.green_size, meta.blue_size
    );

    if verbose {
        let header = view.read_bytes(0, grdpac::GRD_HEADER_SIZE as u64)?;
        let hex: Vec<String> = header.iter().map(|b| format!("{b:02x}")).collect();
        println!("  Header bytes: {}", hex.join(" "));
    }

    // Try a full decode to validate the planes
    drop(view);
    match grdpac::decode_grd_file(input) {
        Ok(image) => {
            println!("  Decoded Size: {} bytes", image.pixels.len());
            println!("  Status: ✓ Valid GRD file");
        }
        Err(e) => {
            println!("  Status: ✗ Invalid or corrupted GRD file");
            if verbose {
                println!("  Error: {}", e);
            }
        }
    }

    Ok(())
}

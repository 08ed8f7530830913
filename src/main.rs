use clap::{Parser, Subcommand};
use roadsave::checksum;
use roadsave::container::{self, DecodeOptions, EncodeOptions};
use roadsave::header::HEADER_SIZE;
use roadsave::savefile::SaveFile;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "roadsave", about = "RoadCraft CompleteSave codec and editor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a save and print its JSON document
    Export {
        input: PathBuf,
        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Verify lengths, digest and per-chunk checksums while decoding
        #[arg(long)]
        strict: bool,
    },
    /// Re-encode an edited JSON document into a save
    Import {
        /// The save whose version marker (and by default whose path) is reused
        input: PathBuf,
        /// The edited JSON document
        #[arg(short = 'j', long)]
        json: PathBuf,
        /// Write here instead of overwriting the input save
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Maximum chunk size in KiB (default 1024 = 1 MiB)
        #[arg(long, default_value = "1024")]
        chunk_size: usize,
        /// Skip the .bak copy of the destination
        #[arg(long)]
        no_backup: bool,
    },
    /// Show header fields and chunk layout
    Info {
        input: PathBuf,
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Full integrity check; fails on the first mismatch
    Verify {
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        // ── Export ───────────────────────────────────────────────────────────
        Commands::Export { input, output, strict } => {
            let save = SaveFile::load_with(&input, &DecodeOptions { strict })?;
            let text = serde_json::to_string_pretty(&save.document)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    println!("Exported: {}", path.display());
                }
                None => println!("{text}"),
            }
        }

        // ── Import ───────────────────────────────────────────────────────────
        Commands::Import { input, json, output, chunk_size, no_backup } => {
            let mut save = SaveFile::load(&input)?;
            save.document = serde_json::from_str(&std::fs::read_to_string(&json)?)?;

            let opts = EncodeOptions {
                chunk_size: chunk_size.saturating_mul(1024),
                ..EncodeOptions::default()
            };
            let dest = output.unwrap_or_else(|| input.clone());
            let report = save.save_with(&dest, &opts, !no_backup)?;

            println!("Saved: {}", report.saved_path.display());
            if let Some(bak) = report.backup_path {
                println!("Backup: {}", bak.display());
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, json } => {
            let bytes = std::fs::read(&input)?;
            let header = container::read_header(&bytes)?;
            let chunks = container::inspect(&bytes)?;
            let digest_ok =
                header.digest[..] == *checksum::md5_hex(&bytes[HEADER_SIZE..]).as_bytes();

            if json {
                let report = serde_json::json!({
                    "magic": hex::encode(header.magic),
                    "compressed_size": header.compressed_size,
                    "decompressed_size": header.decompressed_size,
                    "digest": header.digest_str(),
                    "digest_ok": digest_ok,
                    "chunks": chunks,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("── CompleteSave ─────────────────────────────────────────");
                println!("  Path              {}", input.display());
                println!("  Magic             {}", hex::encode(header.magic));
                println!("  Compressed size   {} B", header.compressed_size);
                println!("  Decompressed size {} B", header.decompressed_size);
                println!("  Digest            {}", header.digest_str().unwrap_or("<non-ascii>"));
                println!("  Digest matches    {digest_ok}");
                println!("  Chunks            {}", chunks.len());
                println!("{:>12} {:>14} {:>12}", "Offset", "Uncompressed", "Block");
                for c in &chunks {
                    println!("{:>12} {:>14} {:>12}", c.offset, c.uncompressed_size, c.block_len);
                }
            }
        }

        // ── Verify ───────────────────────────────────────────────────────────
        Commands::Verify { input } => {
            let bytes = std::fs::read(&input)?;
            let decoded = container::decode_with(&bytes, &DecodeOptions { strict: true })?;
            println!(
                "OK: {} body bytes, {} payload bytes",
                bytes.len() - HEADER_SIZE,
                decoded.payload.len()
            );
        }
    }

    Ok(())
}

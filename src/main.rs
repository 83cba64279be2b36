use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use stunres::archive::ResourceFile;
use stunres::codec::Resource;
use stunres::envelope::Envelope;
use stunres::io_stream::{self, ResourceReader};
use stunres::registry::TypeMap;
use stunres::ResourceId;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stunres", about = "Inspect and rewrite Stunts resource files")]
struct Cli {
    /// Log per-record detail (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TypeArgs {
    /// JSON file mapping resource ids to types: {"types": {"ID": "text"}}
    #[arg(short, long)]
    types: Option<PathBuf>,
    /// Declare a single id's type, e.g. --type gnam=text (repeatable)
    #[arg(long = "type", value_name = "ID=TYPE", value_parser = TypeMap::parse_assignment)]
    type_overrides: Vec<(ResourceId, String)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show container metadata
    Info {
        input: PathBuf,
        #[command(flatten)]
        types: TypeArgs,
    },
    /// List records in file order
    List {
        input: PathBuf,
        #[command(flatten)]
        types: TypeArgs,
    },
    /// Write every record to its own file
    Extract {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
        #[command(flatten)]
        types: TypeArgs,
    },
    /// Hex-dump one record's encoded payload
    Dump {
        input: PathBuf,
        id: String,
        #[command(flatten)]
        types: TypeArgs,
    },
    /// Parse and write back as an uncompressed container
    Repack {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        types: TypeArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, types } => {
            let types = load_types(&types)?;
            let res = ResourceFile::open(&input, &ResourceReader::new(&types))?;

            println!("── Resource file ────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  File size      {} B", res.file_size());
            match res.envelope() {
                Envelope::Plain { size } => {
                    println!("  Compression    none");
                    println!("  Reported size  {size} B");
                }
                Envelope::Compressed { passes, decompressed_size } => {
                    println!("  Compression    {passes} pass(es)");
                    println!("  Unpacked size  {decompressed_size} B");
                }
            }
            println!("  Records        {}", res.resources().len());
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, types } => {
            let types = load_types(&types)?;
            let res = ResourceFile::open(&input, &ResourceReader::new(&types))?;
            println!("{:<6} {:<8} {:>10} {:>10}  CRC-32", "Id", "Type", "Offset", "Size");
            for (info, (_, resource)) in res.list().iter().zip(res.resources().iter()) {
                let crc = crc32fast::hash(&resource.to_bytes()?);
                println!("{:<6} {:<8} {:>10} {:>10}  {:08x}",
                    info.id, info.kind, offset_cell(info.offset), info.encoded_len, crc);
            }
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { input, output_dir, types } => {
            let types = load_types(&types)?;
            let resources = ResourceReader::new(&types).read_file(&input)?;
            fs::create_dir_all(&output_dir)?;
            for (id, resource) in resources.iter() {
                let name = hex_if_unprintable(id);
                let (file, data) = match resource {
                    Resource::Text(t)   => (format!("{name}.txt"), t.as_bytes().to_vec()),
                    Resource::Bitmap(_) => (format!("{name}.bin"), resource.to_bytes()?),
                };
                let path = output_dir.join(file);
                fs::write(&path, data)?;
                println!("  extracted  {}", path.display());
            }
        }

        // ── Dump ─────────────────────────────────────────────────────────────
        Commands::Dump { input, id, types } => {
            let types = load_types(&types)?;
            let resources = ResourceReader::new(&types).read_file(&input)?;
            let id = ResourceId::parse_escaped(&id)?;
            let resource = resources.get(&id)
                .ok_or_else(|| format!("no resource with id \"{id}\""))?;
            let bytes = resource.to_bytes()?;
            for (i, line) in bytes.chunks(16).enumerate() {
                println!("{:08x}  {}", i * 16, hex::encode(line));
            }
        }

        // ── Repack ───────────────────────────────────────────────────────────
        Commands::Repack { input, output, types } => {
            let types = load_types(&types)?;
            let resources = ResourceReader::new(&types).read_file(&input)?;
            let size = io_stream::write_file(&output, &resources)?;
            println!("{}", repack_summary(resources.len(), &output, size));
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn load_types(args: &TypeArgs) -> Result<TypeMap, Box<dyn std::error::Error>> {
    let mut types = match &args.types {
        Some(path) => TypeMap::from_json_file(path)?,
        None       => TypeMap::new(),
    };
    types.extend(args.type_overrides.iter().cloned().collect());
    Ok(types)
}

fn hex_if_unprintable(id: &ResourceId) -> String {
    let trimmed = id.trimmed();
    if !trimmed.is_empty() && trimmed.iter().all(|b| b.is_ascii_alphanumeric()) {
        String::from_utf8_lossy(trimmed).into_owned()
    } else {
        hex::encode(id.as_bytes())
    }
}

fn offset_cell(offset: Option<u32>) -> String {
    offset.map(|o| o.to_string()).unwrap_or_else(|| "-".into())
}

fn repack_summary(count: usize, output: &Path, size: u64) -> String {
    format!("Repacked {count} record(s) -> {} ({size} B)", output.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_plain_ascii() {
        assert_eq!(offset_cell(None), "-");
        assert_eq!(offset_cell(Some(22)), "22");

        let summary = repack_summary(3, Path::new("out.res"), 80);
        assert_eq!(summary, "Repacked 3 record(s) -> out.res (80 B)");
        assert!(summary.is_ascii());
    }
}

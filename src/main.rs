use clap::{Parser, Subcommand};
use image_variations::config::{self, CONFIG_FILENAME};
use image_variations::imaging::RustBackend;
use image_variations::logging::{self, LogFormat};
use image_variations::output::{self, ParseReport};
use image_variations::pipeline::VariationPipeline;
use image_variations::storage::{LocalStorage, Storage};
use image_variations::uri::VariationUriStrategy;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "image-variations")]
#[command(about = "Named, reproducible image variations with reversible filenames")]
#[command(long_about = "\
Named, reproducible image variations with reversible filenames

Variations are declared once in image-variations.toml and applied to any
source image. Every derived file gets a name that encodes its source stem
and the variation id, so it can be traced back later:

  photos/cat.png  + thumb (id t1, jpg)  →  photos/cat__t1.jpg

Pass-through formats (gif, svg by default) are copied byte for byte and
keep their own extension.

Run 'image-variations gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Storage root (overrides [storage] root)
    #[arg(long, global = true)]
    root: Option<String>,

    /// Naming pattern (overrides [naming] pattern)
    #[arg(long, global = true)]
    pattern: Option<String>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print dimensions, placeholder and average color as JSON lines
    Meta {
        /// Source names; directories are walked recursively
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Create variations of a source
    Create {
        name: String,
        /// Variation aliases to create
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        aliases: Vec<String>,
        /// Create every registered variation
        #[arg(long)]
        all: bool,
    },
    /// Delete every registered variation of a source
    Delete { name: String },
    /// Recover alias, stem, id and extension from a derived name
    Parse { derived: String },
    /// Print the public URI of a variation
    Url { name: String, alias: String },
    /// List registered variations
    List,
    /// Print a stock config file with all options documented
    GenConfig,
}

type Pipeline = VariationPipeline<RustBackend, LocalStorage>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.log_format, cli.verbose)?;

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let flags = config::flag_overrides(cli.root.as_deref(), cli.pattern.as_deref());
    let file = config::load_raw_config(&cli.config)?;
    let settings = config::resolve_config(file.into_iter().chain([flags]))?;
    debug!(config = %cli.config.display(), root = %settings.storage.root, "loaded config");

    let pipeline = VariationPipeline::with_options(
        settings.build_resolver()?,
        RustBackend::new(),
        LocalStorage::new(&settings.storage.root),
        settings.pipeline_options(),
    );

    match cli.command {
        Command::Meta { names } => {
            let sources = expand_sources(&pipeline, &names);
            let results: Vec<_> = sources
                .par_iter()
                .map(|name| pipeline.compute_metadata(name))
                .collect();
            for (name, meta) in sources.iter().zip(results) {
                println!("{}", output::format_meta(name, &meta?)?);
            }
        }
        Command::Create {
            name,
            aliases,
            all,
        } => {
            let derived = if all {
                pipeline.create_all_variations(&name)?
            } else {
                aliases
                    .iter()
                    .map(|alias| pipeline.create_variation(&name, alias))
                    .collect::<Result<Vec<_>, _>>()?
            };
            output::print_created(&name, &derived);
        }
        Command::Delete { name } => {
            pipeline.delete_variations(&name)?;
            println!("Deleted variations of {name}");
        }
        Command::Parse { derived } => {
            let report = ParseReport::new(pipeline.resolver(), &derived);
            println!("{}", output::format_parse(&report)?);
        }
        Command::Url { name, alias } => {
            let strategy =
                VariationUriStrategy::new(pipeline.resolver(), alias, settings.uri.clone());
            println!("{}", strategy.apply(&name)?);
        }
        Command::List => output::print_variation_list(pipeline.resolver().registry()),
        // Printed before config loading.
        Command::GenConfig => {}
    }

    Ok(())
}

/// Replace directory names with the files below them, sorted by path.
fn expand_sources(pipeline: &Pipeline, names: &[String]) -> Vec<String> {
    let root = pipeline.storage().root().to_path_buf();
    let mut sources = Vec::new();
    for name in names {
        let path = pipeline.storage().real_path(name);
        if !path.is_dir() {
            sources.push(name.clone());
            continue;
        }
        for entry in WalkDir::new(&path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            sources.push(storage_name(&root, entry.path()));
        }
    }
    sources
}

/// `/`-separated name of `path` relative to the storage root.
fn storage_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

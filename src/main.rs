use clap::{Parser, Subcommand};
use lightbox::config::{self, LibraryConfig};
use lightbox::library::Library;
use lightbox::locator::Locator;
use lightbox::{logging, output};
use serde::Serialize;
use std::path::PathBuf;

fn version_string() -> &'static str {
    match option_env!("LIGHTBOX_GIT_DESCRIBE") {
        Some(describe) if !describe.is_empty() && env!("ON_RELEASE_TAG") != "true" => {
            // Leaked once at startup; clap needs a 'static str
            Box::leak(format!("{} ({describe})", env!("CARGO_PKG_VERSION")).into_boxed_str())
        }
        _ => env!("CARGO_PKG_VERSION"),
    }
}

#[derive(Parser)]
#[command(name = "lightbox")]
#[command(about = "Browse image trees with cached thumbnails and metadata")]
#[command(long_about = "\
Browse image trees with cached thumbnails and metadata

Each configured index exposes one directory tree. Resources are addressed
as INDEX PATH, where PATH is relative to the index root:

  lightbox ls 0 trips/2024
  lightbox meta 0 trips/2024/dawn.jpg
  lightbox thumb 0 trips          # a directory uses its first image

Thumbnails (256x256 center crops) and metadata records are written once to
the cache directory and reused from then on, across runs. Delete them to
force regeneration.

Run 'lightbox gen-config' to generate a documented lightbox.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, short, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// A resource inside an index.
#[derive(clap::Args)]
struct Target {
    /// Index id, as shown by `lightbox indexes`
    index: usize,
    /// Path relative to the index root
    #[arg(default_value = "")]
    path: String,
}

impl Target {
    fn locator(&self) -> Locator {
        Locator::new(self.index, self.path.clone())
    }
}

#[derive(Subcommand)]
enum Command {
    /// List configured indexes
    Indexes {
        #[arg(long)]
        json: bool,
    },
    /// List a directory: subdirectories and images with metadata
    Ls {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        json: bool,
    },
    /// Show an image's dimensions and movie flag
    Meta {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        json: bool,
    },
    /// Generate (if needed) and print the thumbnail path
    Thumb {
        #[command(flatten)]
        target: Target,
    },
    /// Print the path of an image's sibling movie
    Movie {
        #[command(flatten)]
        target: Target,
    },
    /// Pre-generate thumbnails and metadata for one or all indexes
    Warm {
        /// Index id; all indexes when omitted
        index: Option<usize>,
    },
    /// Print a stock lightbox.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let open = || -> Result<Library, Box<dyn std::error::Error>> {
        let config = config::load_config(&cli.config)?;
        init_thread_pool(&config);
        Ok(Library::open(&config)?)
    };

    match cli.command {
        Command::Indexes { json } => {
            let library = open()?;
            let indexes = library.list_indexes();
            if json {
                print_json(&indexes)?;
            } else {
                print_lines(output::format_indexes(&indexes));
            }
        }
        Command::Ls { target, json } => {
            let library = open()?;
            let locator = target.locator();
            let listing = library.list_directory(&locator)?;
            if json {
                print_json(&listing)?;
            } else {
                print_lines(output::format_listing(&locator, &listing));
            }
        }
        Command::Meta { target, json } => {
            let library = open()?;
            let locator = target.locator();
            let metadata = library.image_metadata(&locator)?;
            if json {
                print_json(&metadata)?;
            } else {
                print_lines(output::format_metadata(&locator, &metadata));
            }
        }
        Command::Thumb { target } => {
            let library = open()?;
            let media = library.thumbnail(&target.locator())?;
            println!("{}", media.path.display());
        }
        Command::Movie { target } => {
            let library = open()?;
            let media = library.movie(&target.locator())?;
            println!("{}", media.path.display());
        }
        Command::Warm { index } => {
            let library = open()?;
            let indexes: Vec<_> = library
                .list_indexes()
                .into_iter()
                .filter(|i| index.is_none_or(|wanted| wanted == i.id))
                .collect();
            if indexes.is_empty() {
                return Err(format!("unknown index: {}", index.unwrap_or_default()).into());
            }
            for summary in &indexes {
                let stats = library.warm(summary.id)?;
                println!("{}", output::format_warm(summary, &stats));
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(config: &LibraryConfig) {
    let threads = config::effective_threads(&config.processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

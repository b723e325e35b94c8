use clap::{Parser, Subcommand};
use org_jekyll::config::{self, SiteConfig};
use org_jekyll::publish::{Dispatcher, FsIndex, FsPublisher, LayoutKind, PublishEvent};
use org_jekyll::reader::MetadataReader;
use org_jekyll::{output, render};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Called once per process.
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "org-jekyll")]
#[command(about = "Publish org-mode posts and pages into a Jekyll site")]
#[command(long_about = "\
Publish org-mode posts and pages into a Jekyll site

Each document starts with a header block that becomes YAML front matter:

  #+LAYOUT: post                   # 'post' → _posts/, 'default' → page
  #+TITLE: Hello World
  #+DATE: <2020-05-01 Fri 10:30>   # → date: 2020-05-01 10:30
  #+CATEGORIES: tech life          # → categories: [tech,life]
  #+TAGS: rust org                 # suppressed by #+OPTIONS: tags:nil
  #+DESCRIPTION: A first post      # → excerpt: A first post

Site layout (paths configurable in config.toml):

  site/
  ├── config.toml
  ├── org/                         # Source documents
  │   ├── hello-world.org          # Post
  │   └── about.org                # Page
  ├── _posts/
  │   └── 2020-05-01-hello-world.org
  └── about.org

Run 'org-jekyll gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root (holds config.toml; configured paths are relative to it)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish a single document as a post or page
    Publish { file: PathBuf },
    /// Publish every document whose layout is the post layout
    PublishPosts,
    /// Publish every document whose layout is the page layout
    PublishPages,
    /// Publish all posts, then all pages
    PublishAll,
    /// Show the front matter a document would publish with, or why it can't
    Check {
        file: PathBuf,
        /// Print the metadata as JSON instead of front matter
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = config::load_config(&cli.root)?;
    let reader = MetadataReader::new(&site_config);

    match cli.command {
        Command::Publish { file } => {
            let dispatcher = Dispatcher::new(
                &site_config,
                reader,
                FsPublisher::new(&cli.root, &site_config),
            );
            let outcome = dispatcher.dispatch(&file);
            output::print_outcome(&outcome, &file, &cli.root);
        }
        Command::PublishPosts => {
            publish_kinds(&cli.root, &site_config, reader, &[LayoutKind::Post])?;
        }
        Command::PublishPages => {
            publish_kinds(&cli.root, &site_config, reader, &[LayoutKind::Page])?;
        }
        Command::PublishAll => {
            publish_kinds(
                &cli.root,
                &site_config,
                reader,
                &[LayoutKind::Post, LayoutKind::Page],
            )?;
        }
        Command::Check { file, json } => match reader.read_metadata(&file) {
            Ok(metadata) if json => println!("{}", serde_json::to_string_pretty(&metadata)?),
            Ok(metadata) => {
                let block = render::render(&metadata);
                output::print_check(&file, &cli.root, Ok(block.as_str()));
            }
            Err(e) => {
                let message = e.to_string();
                output::print_check(&file, &cli.root, Err(message.as_str()));
            }
        },
        Command::GenConfig => {}
    }

    Ok(())
}

/// Bulk-publish each layout kind in turn, streaming per-file status lines.
fn publish_kinds(
    root: &Path,
    site_config: &SiteConfig,
    reader: MetadataReader,
    kinds: &[LayoutKind],
) -> Result<(), Box<dyn std::error::Error>> {
    init_thread_pool(&site_config.processing);
    let index = FsIndex::new(root, site_config);
    let dispatcher = Dispatcher::new(site_config, reader, FsPublisher::new(root, site_config));

    for &kind in kinds {
        println!("==> Publishing {}s", kind.to_string().to_lowercase());
        let (tx, rx) = std::sync::mpsc::channel::<PublishEvent>();
        let printer_root = root.to_path_buf();
        let printer = std::thread::spawn(move || {
            for event in rx {
                for line in output::format_publish_event(&event, &printer_root) {
                    println!("{}", line);
                }
            }
        });
        let report = dispatcher.publish_kind(&index, kind, Some(tx));
        printer
            .join()
            .map_err(|_| "progress printer thread panicked")?;
        output::print_bulk_summary(&report?);
    }
    Ok(())
}

/// Size the global rayon pool from `[processing]`.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

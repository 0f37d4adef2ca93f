//! sitewatch CLI
//!
//! Manages scrape resources, runs one-off scrapes and hosts the periodic
//! scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use sitewatch::{
    error::{AppError, Result},
    models::{Config, Item, ResourceConfig},
    pipeline::{DiffEngine, ResourceRegistry, RunOptions, Scheduler, check_resource, parse_once},
    services::{HttpFetcher, Notifier},
    storage::LocalStorage,
};

/// sitewatch - page scraper with new-item notifications
#[derive(Parser, Debug)]
#[command(name = "sitewatch", version, about = "Scrape pages and announce new items")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Override the data directory from the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one scrape over all active resources
    Run {
        /// Item limit per resource (default: schedule.run_limit)
        #[arg(long)]
        limit: Option<usize>,

        /// Print the summary without sending a notification
        #[arg(long)]
        no_notify: bool,
    },

    /// Run on the configured interval until interrupted
    Watch,

    /// Scrape one resource without recording anything
    Preview {
        /// Name of a stored resource
        name: Option<String>,

        #[command(flatten)]
        adhoc: AdhocResource,

        /// Item limit (default: schedule.preview_limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Manage stored resources
    #[command(subcommand)]
    Resources(ResourceCommand),

    /// Validate configuration and stored resources
    Validate,
}

/// Resource definition given on the command line.
#[derive(Args, Debug, Default)]
struct AdhocResource {
    #[arg(long)]
    url: Option<String>,
    #[arg(long = "item")]
    item_selector: Option<String>,
    #[arg(long = "title")]
    title_selector: Option<String>,
    #[arg(long = "link")]
    link_selector: Option<String>,
}

impl AdhocResource {
    fn into_resource(self, name: &str) -> Result<ResourceConfig> {
        let missing = |field: &str| AppError::validation(format!("--{field} is required"));
        Ok(ResourceConfig::new(
            name,
            self.url.ok_or_else(|| missing("url"))?,
            self.item_selector.ok_or_else(|| missing("item"))?,
            self.title_selector.ok_or_else(|| missing("title"))?,
            self.link_selector.ok_or_else(|| missing("link"))?,
        ))
    }

    /// Overlay the given fields onto an existing definition.
    fn apply_to(self, resource: &mut ResourceConfig) {
        if let Some(url) = self.url {
            resource.url = url;
        }
        if let Some(item) = self.item_selector {
            resource.item_selector = item;
        }
        if let Some(title) = self.title_selector {
            resource.title_selector = title;
        }
        if let Some(link) = self.link_selector {
            resource.link_selector = link;
        }
    }
}

#[derive(Subcommand, Debug)]
enum ResourceCommand {
    /// List stored resources
    List,
    /// Add a resource
    Add {
        name: String,
        #[command(flatten)]
        fields: AdhocResource,
    },
    /// Change fields of a resource
    Edit {
        name: String,
        /// New name
        #[arg(long)]
        rename: Option<String>,
        #[command(flatten)]
        fields: AdhocResource,
    },
    /// Delete a resource
    Remove { name: String },
    /// Toggle the paused flag
    Pause { name: String },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_items(items: &[Item]) {
    for item in items {
        println!("• {}\n  → {}", item.title, item.url);
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env()?;
    if let Some(dir) = cli.data_dir {
        config.paths.data_dir = dir;
    }
    log::info!("Using data directory {}", config.paths.data_dir.display());

    let storage = Arc::new(LocalStorage::new(&config.paths.data_dir));
    let registry = ResourceRegistry::new(storage.clone());

    match cli.command {
        Command::Run { limit, no_notify } => {
            let fetcher = Arc::new(HttpFetcher::new(&config.scraper)?);
            let engine = DiffEngine::new(
                storage.clone(),
                storage.clone(),
                fetcher,
                RunOptions {
                    limit: limit.unwrap_or(config.schedule.run_limit),
                    max_concurrent: config.scraper.max_concurrent,
                },
            );

            let batch = match engine.run_once().await {
                Ok(batch) => batch,
                Err(e) => {
                    if !no_notify {
                        let notifier = Notifier::from_config(&config.notifier)?;
                        if let Err(send_err) = notifier.send_error(&e.to_string()).await {
                            log::error!("Failed to deliver error report: {}", send_err);
                        }
                    }
                    return Err(e);
                }
            };

            println!(
                "{} items, {} new, {} failed resources",
                batch.all_items.len(),
                batch.new_items.len(),
                batch.failures.len()
            );
            for failure in &batch.failures {
                println!("  ! {}: {}", failure.resource, failure.message);
            }

            if !no_notify {
                Notifier::from_config(&config.notifier)?
                    .send_batch(&batch)
                    .await?;
            }
        }

        Command::Watch => {
            config.validate()?;
            let fetcher = Arc::new(HttpFetcher::new(&config.scraper)?);
            let engine = Arc::new(DiffEngine::new(
                storage.clone(),
                storage.clone(),
                fetcher,
                RunOptions {
                    limit: config.schedule.run_limit,
                    max_concurrent: config.scraper.max_concurrent,
                },
            ));
            let notifier = Notifier::from_config(&config.notifier)?;
            let scheduler = Scheduler::from_config(engine, notifier.clone(), &config.schedule);

            tokio::select! {
                _ = scheduler.run() => {}
                result = tokio::signal::ctrl_c() => {
                    result?;
                    log::info!("Interrupted, shutting down");
                    if let Err(e) = notifier.send_shutdown().await {
                        log::error!("Failed to send shutdown message: {}", e);
                    }
                }
            }
        }

        Command::Preview { name, adhoc, limit } => {
            let resource = match name {
                Some(name) => registry.get(&name).await?,
                None => adhoc.into_resource("preview")?,
            };
            check_resource(&resource)?;

            let fetcher = HttpFetcher::new(&config.scraper)?;
            let items = parse_once(
                &fetcher,
                &resource,
                limit.unwrap_or(config.schedule.preview_limit),
            )
            .await?;
            if items.is_empty() {
                return Err(AppError::extraction(
                    &resource.name,
                    "nothing matched the configured selectors",
                ));
            }

            println!("{} items from {}", items.len(), resource.name);
            print_items(&items);
        }

        Command::Resources(command) => match command {
            ResourceCommand::List => {
                for resource in registry.list().await? {
                    println!(
                        "{}{}\n  {}\n  item={} title={} link={}",
                        resource.name,
                        if resource.paused { " (paused)" } else { "" },
                        resource.url,
                        resource.item_selector,
                        resource.title_selector,
                        resource.link_selector
                    );
                }
            }
            ResourceCommand::Add { name, fields } => {
                registry.add(fields.into_resource(&name)?).await?;
                println!("Added {name}");
            }
            ResourceCommand::Edit {
                name,
                rename,
                fields,
            } => {
                let mut resource = registry.get(&name).await?;
                fields.apply_to(&mut resource);
                if let Some(new_name) = rename {
                    resource.name = new_name;
                }
                let new_name = resource.name.clone();
                registry.update(&name, resource).await?;
                println!("Updated {name} -> {new_name}");
            }
            ResourceCommand::Remove { name } => {
                registry.remove(&name).await?;
                println!("Removed {name}");
            }
            ResourceCommand::Pause { name } => {
                let paused = registry.toggle_pause(&name).await?;
                println!("{name} is now {}", if paused { "paused" } else { "active" });
            }
        },

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("✓ Config OK");

            let resources = registry.list().await?;
            let mut invalid = 0;
            for resource in &resources {
                if let Err(e) = check_resource(resource) {
                    invalid += 1;
                    log::error!("✗ {}: {}", resource.name, e);
                }
            }
            if invalid > 0 {
                return Err(AppError::validation(format!(
                    "{invalid} of {} resources are invalid",
                    resources.len()
                )));
            }
            log::info!("✓ {} resources OK", resources.len());
        }
    }

    Ok(())
}

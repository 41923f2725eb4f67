use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use dex_catalog::{CategoryName, EntityKey};
use dex_config::{report_unused_keys, AppConfig, ConfigConsumer, UnusedKeyPolicy};
use dex_db::RecordPatch;
use dex_sync::{BootstrapOutcome, CatalogService};

#[derive(Parser)]
#[command(name = "dex")]
#[command(about = "Catalog sync CLI", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (overrides DEX_CONFIG)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Fail instead of warn when the config carries keys the CLI never reads
    #[arg(long, global = true, default_value_t = false)]
    strict_config: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands (requires DEX_DATABASE_URL)
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Populate an empty store from upstream; no-op when records exist
    Bootstrap {
        /// Entities to fetch (defaults to sync.bootstrap_target)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        target: Option<u64>,
    },

    /// Fetch entities from upstream and append them to the store
    Seed {
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
        limit: u64,
    },

    /// Fetch one upstream entity by name or id and store it
    Import { key: EntityKey },

    /// Local catalog records
    Records {
        #[command(subcommand)]
        cmd: RecordsCmd,
    },

    /// Read-only upstream queries
    Upstream {
        #[command(subcommand)]
        cmd: UpstreamCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    /// Apply SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum RecordsCmd {
    /// List records (id + name unless --full)
    List {
        #[arg(long, default_value_t = false)]
        full: bool,
    },
    Get { id: i64 },
    /// Patch a record with a JSON object, e.g. '{"price": 1200}'
    Update {
        id: i64,
        #[arg(long)]
        patch: String,
    },
    Remove { id: i64 },
}

#[derive(Subcommand)]
enum UpstreamCmd {
    Get { key: EntityKey },
    List {
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    Category {
        name: CategoryName,
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
        limit: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = dex_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = dex_db::status(&pool).await?;
                    println!("db_ok={} has_catalog_table={}", s.ok, s.has_catalog_table);
                }
                DbCmd::Migrate => {
                    dex_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = dex_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Bootstrap { target } => {
            let (cfg, svc) = service(&cli.config_paths, cli.strict_config).await?;
            let target = target.unwrap_or(cfg.sync.bootstrap_target);
            match svc.bootstrap_if_empty(target).await? {
                BootstrapOutcome::Skipped { existing } => {
                    println!("bootstrap=skipped existing={existing}");
                }
                BootstrapOutcome::Seeded { inserted, report } => {
                    println!(
                        "bootstrap=seeded run_id={} inserted={} skipped={}",
                        report.run_id,
                        inserted,
                        report.skipped.len()
                    );
                }
            }
        }

        Commands::Seed { limit } => {
            let (_, svc) = service(&cli.config_paths, cli.strict_config).await?;
            let out = svc.seed(limit).await?;
            println!(
                "seeded=true run_id={} inserted={} skipped={}",
                out.report.run_id,
                out.records.len(),
                out.report.skipped.len()
            );
            for s in &out.report.skipped {
                println!("skipped key={} reason={}", s.key, s.reason);
            }
        }

        Commands::Import { key } => {
            let (_, svc) = service(&cli.config_paths, cli.strict_config).await?;
            print_json(&svc.import_one(&key).await?)?;
        }

        Commands::Records { cmd } => {
            let (_, svc) = service(&cli.config_paths, cli.strict_config).await?;
            match cmd {
                RecordsCmd::List { full: true } => print_json(&svc.get_all().await?)?,
                RecordsCmd::List { full: false } => print_json(&svc.get_basic_list().await?)?,
                RecordsCmd::Get { id } => print_json(&svc.get_one(id).await?)?,
                RecordsCmd::Update { id, patch } => {
                    let patch: RecordPatch =
                        serde_json::from_str(&patch).context("--patch is not a valid record patch")?;
                    print_json(&svc.update(id, patch).await?)?;
                }
                RecordsCmd::Remove { id } => {
                    let rec = svc.remove(id).await?;
                    println!("removed=true id={}", rec.id);
                }
            }
        }

        Commands::Upstream { cmd } => {
            let (_, svc) = service(&cli.config_paths, cli.strict_config).await?;
            match cmd {
                UpstreamCmd::Get { key } => print_json(&svc.query_upstream_by_name(&key).await?)?,
                UpstreamCmd::List { limit, offset } => {
                    print_json(&svc.query_upstream_list(limit, offset).await?)?
                }
                UpstreamCmd::Category { name, limit } => {
                    print_json(&svc.query_upstream_by_category(&name, limit).await?)?
                }
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}

fn load_config(paths: &[String], strict: bool) -> Result<AppConfig> {
    let (loaded, cfg) = if paths.is_empty() {
        dex_config::load_from_env()?
    } else {
        let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        let loaded = dex_config::load_layered_yaml(&refs)?;
        let cfg = loaded.app()?;
        (loaded, cfg)
    };

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(ConfigConsumer::Cli, &loaded.config_json, policy)?;
    if !report.is_clean() {
        tracing::warn!(keys = ?report.unused_leaf_pointers, "config has keys the cli does not read");
    }
    Ok(cfg)
}

async fn service(paths: &[String], strict: bool) -> Result<(AppConfig, CatalogService)> {
    let cfg = load_config(paths, strict)?;
    let secrets = dex_config::resolve_secrets(&cfg);
    let svc = dex_sync::wiring::build_service(&cfg, &secrets).await?;
    Ok((cfg, svc))
}

fn print_json<T: Serialize>(v: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

use std::sync::Arc;

use anyhow::{Context, Result};
use cfbd_seeder::database_ops::db::Db;
use cfbd_seeder::provider::cfbd::CfbdClient;
use cfbd_seeder::task::TaskContext;
use cfbd_seeder::throttle::ThrottleHandle;
use cfbd_seeder::{cli, entities, Seeder, SeederConfig};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "cfbd-seeder", version, about = "Seed the cfbd Postgres schema from CollegeFootballData")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    // `cfbd-seeder --only games` works without the explicit `run` subcommand.
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sentinel check, schema setup if needed, then every phase (default)
    Run(RunArgs),
    /// Run schema setup even if the store looks initialized
    Init,
    /// Print sentinel signals and per-table row counts
    Status,
    /// List phases and their task names
    Tasks,
}

#[derive(Debug, Default, Args)]
struct RunArgs {
    /// Restrict the run to these task names (comma-separated); phase order is kept
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,
    /// First season to seed (overrides SEED_YEAR_MIN)
    #[arg(long)]
    year_min: Option<i32>,
    /// Last season to seed (overrides SEED_YEAR_MAX)
    #[arg(long)]
    year_max: Option<i32>,
    /// Fan-out worker count (overrides FANOUT_CONCURRENCY)
    #[arg(long)]
    concurrency: Option<usize>,
    /// Upstream requests per second (overrides THROTTLE_RPS)
    #[arg(long)]
    rps: Option<u32>,
}

impl RunArgs {
    fn apply(&self, cfg: &mut SeederConfig) -> Result<()> {
        if let Some(v) = self.year_min {
            cfg.year_min = v;
        }
        if let Some(v) = self.year_max {
            cfg.year_max = v;
        }
        if let Some(v) = self.concurrency {
            cfg.fanout_concurrency = v;
        }
        if let Some(v) = self.rps {
            cfg.throttle.rate_per_sec = v;
        }
        cfg.validate().context("invalid command-line override")?;
        Ok(())
    }
}

type Live = Seeder<Db, CfbdClient>;

async fn build(cfg: &SeederConfig, cancel: CancellationToken) -> Result<(Live, Arc<Db>)> {
    let db = Arc::new(
        Db::connect(&cfg.database_url, cfg.db)
            .await
            .context("Db::connect failed")?,
    );
    let client = CfbdClient::new(cfg.base_url.as_deref(), &cfg.api_key, cfg.http_timeout)
        .context("building CFBD client failed")?;
    let throttle =
        ThrottleHandle::from_config(cfg.throttle).context("invalid throttle settings")?;
    let ctx = TaskContext::new(db.clone(), Arc::new(client), throttle, cancel, cfg.settings());
    Ok((Seeder::new(ctx), db))
}

fn print_tasks() {
    for phase in entities::plan::<Db, CfbdClient>() {
        println!("{}:", phase.name);
        for name in phase.task_names() {
            println!("  {name}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    cfbd_seeder::util::env::init_env();
    cfbd_seeder::tracing::init_tracing(cfbd_seeder::tracing::DEFAULT_FILTER)?;

    let args = Cli::parse();
    let command = args.command.unwrap_or(Command::Run(args.run));
    if let Command::Tasks = command {
        print_tasks();
        return Ok(());
    }

    let mut cfg = SeederConfig::from_env().context("loading configuration")?;
    if let Command::Run(run) = &command {
        run.apply(&mut cfg)?;
    }
    info!(
        years = %format!("{}..={}", cfg.year_min, cfg.year_max),
        rps = cfg.throttle.rate_per_sec,
        burst = cfg.throttle.burst,
        fanout = cfg.fanout_concurrency,
        "configuration loaded"
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; cancelling");
                cancel.cancel();
            }
        });
    }

    let (seeder, db) = build(&cfg, cancel).await?;
    match command {
        Command::Run(run) => {
            if let Err(e) = seeder.run(&run.only).await {
                error!(error = %e, "seed failed");
                return Err(e).context("seed run failed");
            }
        }
        Command::Init => {
            seeder.ensure_schema(true).await.context("schema setup failed")?;
        }
        Command::Status => {
            let report = cli::status::render(&*db).await.context("status query failed")?;
            println!("{report}");
        }
        Command::Tasks => {}
    }
    Ok(())
}

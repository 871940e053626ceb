use anyhow::Result;
use clap::{Parser, Subcommand};
use jobio::config::AppConfig;
use jobio::pipeline::{self, Stores};
use jobio::report::{self, SortKey};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Per-job I/O on shared filesystems.
#[derive(Parser, Debug)]
#[command(name = "jobio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show current rates of active jobs
    Top {
        /// Filesystem name
        filesystem: String,
        /// Sort key: meta, iops or bw
        #[arg(value_parser = SortKey::from_str)]
        key: SortKey,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show totals over the runtime of running jobs
    Sum {
        /// Filesystem name
        filesystem: String,
        /// Sort key: meta, iops or bw
        #[arg(value_parser = SortKey::from_str)]
        key: SortKey,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show filesystem-wide totals per timestamp
    Timeline {
        /// Filesystem name
        filesystem: String,
        /// How far back to look
        #[arg(long, default_value_t = 300)]
        seconds: i64,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = AppConfig::load()?;
    let stores = Stores::connect(&app_config).await?;
    let now = chrono::Utc::now().timestamp();

    match cli.command {
        Commands::Top {
            filesystem,
            key,
            json,
        } => {
            let r = pipeline::top(&stores, &app_config, &filesystem, key, now).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&r)?);
            } else {
                println!("{}\n", format_ts(r.timestamp));
                print!("{}", report::render_top_table(&r.jobs));
                let m = &r.maxima.values;
                let (wbw, wunit) = report::normalize_bw(m[4] as f64);
                let (rbw, runit) = report::normalize_bw(m[5] as f64);
                println!(
                    "\npeak: {} nodes, {} meta ops/s, {} write iops/s, {} read iops/s, \
                     {:.2} {} write, {:.2} {} read",
                    m[0],
                    m[1],
                    m[2],
                    m[3],
                    wbw,
                    wunit,
                    rbw,
                    runit
                );
            }
        }
        Commands::Sum {
            filesystem,
            key,
            json,
        } => {
            let r = pipeline::sum(&stores, &app_config, &filesystem, key, now).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&r)?);
            } else {
                print!("{}", report::render_sum_table(&r.jobs));
            }
        }
        Commands::Timeline {
            filesystem,
            seconds,
            json,
        } => {
            let points =
                pipeline::timeline(&stores.samples, &filesystem, now - seconds, now).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else {
                for p in &points {
                    let c = &p.counters;
                    println!(
                        "{}  meta {:>8}  wr {:>8} {:>12}  rd {:>8} {:>12}",
                        format_ts(p.timestamp),
                        c.miops,
                        c.wiops,
                        report::normalize_size(c.wbw as f64),
                        c.riops,
                        report::normalize_size(c.rbw as f64),
                    );
                }
            }
        }
    }

    Ok(())
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%a %b %e %H:%M:%S %Y")
                .to_string()
        })
        .unwrap_or_else(|| ts.to_string())
}

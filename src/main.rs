use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use feed_digest::normalizer::target_tz;
use feed_digest::{
    digest, mailer, persist, window, EmailConfig, FeedAggregator, FeedFetcher, FeedList,
    FetchConfig, LimitPolicy, SmtpSettings, WindowPolicy,
};

#[derive(Parser)]
#[command(name = "feed-digest", about = "RSS/Atom aggregation and daily email digest")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all subscriptions and write the JSON snapshot.
    Fetch {
        /// Feed list: category headers followed by feed URLs.
        #[arg(long, default_value = "feed.list")]
        feed_list: PathBuf,
        /// Per-category article limits (YAML).
        #[arg(long, default_value = "config/labels.yml")]
        labels: PathBuf,
        /// Snapshot output path.
        #[arg(long, default_value = "feed.json")]
        output: PathBuf,
    },
    /// Filter the snapshot through a time window and email the digest.
    SendDigest {
        #[arg(long, default_value = "feed.json")]
        snapshot: PathBuf,
        #[arg(long, default_value = "config/email.yml")]
        email_config: PathBuf,
        #[arg(long, value_enum, default_value_t = WindowArg::CalendarDay)]
        window: WindowArg,
        /// Write the rendered HTML to this path for inspection.
        #[arg(long)]
        preview: Option<PathBuf>,
        /// Render but do not connect to the SMTP server.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WindowArg {
    CalendarDay,
    Rolling8am,
}

impl From<WindowArg> for WindowPolicy {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::CalendarDay => WindowPolicy::CalendarDay,
            WindowArg::Rolling8am => WindowPolicy::RollingEightAm,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Fetch {
            feed_list,
            labels,
            output,
        } => fetch(&feed_list, &labels, &output).await,
        Command::SendDigest {
            snapshot,
            email_config,
            window,
            preview,
            dry_run,
        } => send_digest(&snapshot, &email_config, window.into(), preview.as_deref(), dry_run),
    }
}

async fn fetch(feed_list: &Path, labels: &Path, output: &Path) -> anyhow::Result<()> {
    // Configuration problems are fatal before any fetching starts.
    let feed_list = FeedList::load(feed_list).context("loading feed list")?;
    let limits = LimitPolicy::load(labels).context("loading limit config")?;

    if feed_list.is_empty() {
        warn!("Feed list contains no subscriptions");
    }

    let fetcher = FeedFetcher::new(&FetchConfig::default());
    let aggregator = FeedAggregator::new(fetcher, feed_list, limits);
    let (snapshot, failures) = aggregator.run().await;

    for failure in &failures {
        warn!("Skipped feed {}: {}", failure.url, failure.reason);
    }
    info!(
        "Aggregated {} articles ({} feeds failed)",
        snapshot.articles.len(),
        failures.len()
    );

    persist::write_snapshot(&snapshot, output).context("writing snapshot")?;
    Ok(())
}

fn send_digest(
    snapshot_path: &Path,
    email_config: &Path,
    policy: WindowPolicy,
    preview: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let email = EmailConfig::load(email_config).context("loading email config")?;
    let snapshot = persist::load_snapshot(snapshot_path).context("loading snapshot")?;

    let now_local = Utc::now().with_timezone(&target_tz());
    let selected = window::filter_articles(&snapshot.articles, policy, now_local);

    let rendered = match digest::render_digest(&selected, now_local) {
        Some(rendered) => rendered,
        None => {
            info!("No articles in the digest window; skipping delivery");
            return Ok(());
        }
    };
    info!("Digest contains {} article(s)", selected.len());

    if let Some(path) = preview {
        std::fs::write(path, &rendered.html)
            .with_context(|| format!("writing preview to {}", path.display()))?;
        info!("Wrote HTML preview to {}", path.display());
    }

    if dry_run {
        info!("Dry run, not sending");
        return Ok(());
    }
    if !email.enabled {
        info!("Email delivery disabled in config");
        return Ok(());
    }

    let settings = SmtpSettings::from_env().context("reading SMTP settings")?;
    mailer::send_digest(&settings, &email, &rendered).context("sending digest")?;
    Ok(())
}

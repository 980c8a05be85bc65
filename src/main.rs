use anyhow::Result;
use cdnwatch::*;
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

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load(&cli.config)?;

    if !cli.dns && !cli.download {
        println!("Please select a mode: --dns or --download");
        return Ok(());
    }

    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        "starting"
    );

    let repo = stats_repo::StatsRepo::connect(&app_config.database.path).await?;
    repo.init().await?;
    let probe = probe::Probe::new(repo, app_config);

    if cli.dns {
        probe.check_dns().await?;
    } else {
        let written = probe.run_downloads().await?;
        tracing::info!(samples_written = written, "download pass complete");
        probe.rebuild_reports().await?;
        probe.apply_retention().await?;
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use slurm_waiting_times::{
    cli::{self, Cli},
    csv_output, filter, histogram,
    json_output::PlotData,
    output, sacct, stats,
    svg_output::SvgHistogram,
    time_utils,
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Validate numeric options before touching sacct
    if let Some(hours) = args.max_wait_hours {
        if hours <= 0.0 {
            anyhow::bail!(
                "Invalid value for --max-wait-hours: {} (must be greater than zero)",
                hours
            );
        }
    }
    if args.bins == Some(0) {
        anyhow::bail!("Invalid value for --bins: 0 (must be a positive integer)");
    }

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let runtime = args
        .runtime
        .iter()
        .map(|expr| {
            filter::parse_runtime_expr(expr)
                .with_context(|| format!("Invalid --runtime value '{}'", expr.trim()))
        })
        .collect::<Result<Vec<_>>>()?;

    let tz = time_utils::resolve_timezone(args.tz.as_deref())?;
    let now = chrono::Utc::now().with_timezone(&tz);
    let window = time_utils::resolve_window(args.start.as_deref(), args.end.as_deref(), now)?;

    let users = cli::split_arg(args.user.as_deref());
    let partitions = cli::split_arg(args.partition.as_deref());

    // Wildcard partitions are matched locally, so sacct must not see them
    let command_partitions = partitions.as_deref().filter(|p| !cli::has_wildcard(p));

    let command = sacct::build_sacct_command(
        window.start,
        window.end,
        users.as_deref(),
        command_partitions,
        args.include_steps,
    );

    if args.dry_run {
        println!("{}", command.join(" "));
        return Ok(());
    }

    tracing::debug!(command = %command.join(" "), "querying sacct");
    let payload = sacct::run_sacct(&command)?;
    let rows = sacct::parse_sacct_output(&payload, tz);
    tracing::debug!(rows = rows.len(), "parsed sacct output");

    let glob_partitions = partitions
        .map(|patterns| {
            patterns
                .iter()
                .map(|p| filter::GlobPattern::new(p))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .transpose()
        .context("invalid --partition pattern")?;

    let config = filter::FilterConfig {
        include_steps: args.include_steps,
        users: users.map(|u| u.into_iter().collect()),
        partitions: glob_partitions,
        job_type: args.job_type,
        max_wait_hours: args.max_wait_hours,
        runtime,
    };

    let outcome = filter::filter_rows(&rows, &config);
    let drops = &outcome.drops;
    tracing::debug!(
        kept = outcome.records.len(),
        dropped = drops.total(),
        invalid_timestamp = drops.invalid_timestamp,
        step_excluded = drops.step_excluded,
        user_excluded = drops.user_excluded,
        partition_excluded = drops.partition_excluded,
        job_type_excluded = drops.job_type_excluded,
        outlier_excluded = drops.outlier_excluded,
        runtime_excluded = drops.runtime_excluded,
        "filtered sacct rows"
    );

    let samples: Vec<f64> = outcome.records.iter().map(|r| r.wait_seconds).collect();
    let wait_stats = stats::WaitStats::from_samples(&samples);

    let Some(mean_seconds) = wait_stats.mean_seconds else {
        eprintln!("No jobs found in the specified window.");
        std::process::exit(1);
    };

    println!(
        "Jobs: {} | Window: {} -> {} | Mean wait: {}",
        wait_stats.count,
        window.start.to_rfc3339(),
        window.end.to_rfc3339(),
        time_utils::format_hms(mean_seconds)
    );

    let hist = histogram::build_histogram(&samples, args.bins, args.unit())?;

    let tokens = args.option_tokens(&window);
    let prefix = output::build_prefix(now, &tokens);
    let dir = output::ensure_output_dir()?;

    let csv_path = output::results_csv_path(&dir, &prefix);
    std::fs::write(&csv_path, csv_output::to_csv(&outcome.records))
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let svg = SvgHistogram::new(&hist, mean_seconds, args.report_title(&window)).render();
    let svg_path = output::histogram_path(&dir, &prefix);
    std::fs::write(&svg_path, svg)
        .with_context(|| format!("failed to write {}", svg_path.display()))?;

    let plot_data = PlotData::new(&window, &wait_stats, &hist);
    let json_path = output::plot_data_path(&dir, &prefix);
    std::fs::write(&json_path, plot_data.to_json()?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    tracing::info!(
        csv = %csv_path.display(),
        svg = %svg_path.display(),
        json = %json_path.display(),
        "report artifacts written"
    );

    Ok(())
}

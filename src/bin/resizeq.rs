//! resizeq CLI: queue image files and resize them through the pool.

use clap::Parser;
use resizeq::config::Config;
use resizeq::dispatch::Dispatcher;
use resizeq::model::EffectiveStatus;
use resizeq::telemetry::init_telemetry;

#[derive(Parser)]
#[command(name = "resizeq", about = "Batch image resizer")]
struct Cli {
    /// Image files to convert
    #[arg(required = true)]
    files: Vec<String>,

    /// Resize scale percentage
    #[arg(long, default_value_t = 50.0)]
    scale: f64,

    /// Destination template (%p = parent dir, %n = base name without
    /// extension); derived from the first file when omitted
    #[arg(long)]
    template: Option<String>,

    /// Number of concurrent convert processes
    #[arg(long)]
    jobs: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_telemetry(&config.log_level)?;

    let pool_size = cli.jobs.unwrap_or(config.pool_size);
    anyhow::ensure!(pool_size >= 1, "--jobs must be at least 1");

    let mut dispatcher = Dispatcher::new(pool_size, config.convert_bin);
    dispatcher.set_scale(cli.scale);
    // template first, so add() resolves destinations against it instead
    // of deriving a default
    if let Some(ref tmpl) = cli.template {
        dispatcher.set_template(tmpl);
    }
    dispatcher.add(cli.files);

    dispatcher.run_to_completion().await;

    let items = dispatcher.items();
    let failed = items
        .iter()
        .filter(|i| matches!(i.status, EffectiveStatus::Failed { .. }))
        .count();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        print_table(&items);
        println!("\n{} converted, {} failed", items.len() - failed, failed);
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_table(items: &[resizeq::model::ItemView]) {
    println!("{:<6}  {:<8}  {:<40}  DESTINATION", "ID", "STATUS", "SOURCE");
    println!("{}", "-".repeat(100));

    for item in items {
        let status = match &item.status {
            EffectiveStatus::Waiting => "waiting",
            EffectiveStatus::Running => "running",
            EffectiveStatus::Ok => "ok",
            EffectiveStatus::Failed { .. } => "failed",
        };
        println!(
            "{:<6}  {:<8}  {:<40}  {}",
            item.id.to_string(),
            status,
            item.source,
            item.destination
        );
    }

    // diagnostics below the table, where they can wrap freely
    for item in items {
        if let EffectiveStatus::Failed { error } = &item.status {
            println!("\n{} {}: {}", item.id, item.source, error.trim_end());
        }
    }
}

use tokio::runtime::Runtime;
use clap::Parser;
use owo_colors::OwoColorize;

use lockin::cli::{Cli, Commands};
use lockin::config::Config;
use lockin::level::{bands, Tone};
use lockin::meter::{Meter, StatusKind};
use lockin::payload::NotificationPayload;
use lockin::server::serve;
use lockin::submit::Submitter;
use lockin::telemetry;

use tabled::{Table, Tabled};
use tabled::settings::{Style, Modify, Alignment, Padding, object::{Columns, Rows}};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let rt = Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Serve { bind } => {
                let config = Config::load(cli.config.clone())?;
                let addr = bind.unwrap_or(config.server.bind);
                serve(&config, addr).await?;
            }
            Commands::Submit { level, endpoint } => {
                let config = Config::load(cli.config.clone())?;
                let endpoint = endpoint.unwrap_or_else(|| config.client_endpoint());

                let meter = Meter::new(config.client.style(), config.status_ttl());
                meter.set_level(level);
                let result = Submitter::new(endpoint).submit(&meter).await;

                if let Some(status) = meter.status() {
                    match status.kind {
                        StatusKind::Success => println!("{}", status.message.green()),
                        StatusKind::Error => eprintln!("{}", status.message.red()),
                    }
                }

                // Exit code: 0 = delivered, 1 = rejected or failed
                if result.is_err() {
                    std::process::exit(1);
                }
            }
            Commands::Preview { level } => {
                let config = Config::load(cli.config.clone())?;
                let payload =
                    NotificationPayload::build(level, &config.client.style(), chrono::Utc::now());
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            Commands::Levels => {
                #[derive(Tabled)]
                struct Row {
                    #[tabled(rename = "levels")]
                    range: String,
                    #[tabled(rename = "status")]
                    label: &'static str,
                    #[tabled(rename = "tone")]
                    tone: String,
                    #[tabled(rename = "notification")]
                    text: &'static str,
                }

                let rows: Vec<Row> = bands()
                    .into_iter()
                    .map(|(start, end)| Row {
                        range: format!("{start}–{end}"),
                        label: start.status_label(),
                        tone: match start.tone() {
                            Tone::Red => "red".red().to_string(),
                            Tone::Orange => "orange".yellow().to_string(),
                            Tone::Green => "green".green().to_string(),
                        },
                        text: start.notification_text(),
                    })
                    .collect();

                let mut table = Table::new(rows);
                table
                    .with(Style::modern())
                    .with(Modify::new(Columns::single(0)).with(Alignment::right()))
                    .with(Modify::new(Columns::single(2)).with(Alignment::center()))
                    .with(Modify::new(Rows::new(0..)).with(Padding::new(1, 1, 0, 0)));

                println!("{}", table);
            }
            Commands::Version { json } => {
                if json {
                    let info = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "commit": option_env!("GIT_SHA").unwrap_or("unknown"),
                        "build_date": option_env!("BUILD_DATE").unwrap_or("unknown"),
                    });
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    println!(
                        "lockin {} (commit: {}, built: {})",
                        env!("CARGO_PKG_VERSION"),
                        option_env!("GIT_SHA").unwrap_or("unknown"),
                        option_env!("BUILD_DATE").unwrap_or("unknown"),
                    );
                }
            }
        }
        Ok(())
    })
}

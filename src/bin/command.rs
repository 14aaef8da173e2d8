use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use comfy_table::Table;
use snafu::ResultExt;

use crate::{
    config::Config,
    consts,
    error::{self, Error},
    session::{self, SessionReport},
};

#[derive(Debug, Parser)]
#[command(name = consts::APP_NAME, author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Shows current version")]
    Version,

    #[command(about = "Shows shell completions")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Prints the default configuration")]
    DefaultConfig,

    #[command(about = "Runs a simulated camera session")]
    Simulate(SimulateOptions),
}

#[derive(Debug, Args)]
pub struct SimulateOptions {
    #[arg(long = "config", short = 'c', env = "AWAITCAST_CONFIG", help = "Configuration file")]
    config_file: Option<PathBuf>,

    #[arg(long, help = "Number of parameter updates to publish")]
    updates: Option<u64>,

    #[arg(long = "interval-ms", help = "Delay between two publishes, in milliseconds")]
    interval_ms: Option<u64>,

    #[arg(long, help = "Prints the session report as JSON")]
    json: bool,
}

impl SimulateOptions {
    fn load_config(&self) -> Result<Config, Error> {
        let mut config = match &self.config_file {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(updates) = self.updates {
            config.updates = updates;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.publish_interval_ms = interval_ms;
        }
        Ok(config)
    }
}

impl Cli {
    #[inline]
    pub fn new() -> Self { Self::parse() }

    pub fn run(self) -> Result<(), Error> {
        match self.commands {
            Commands::Version => {
                print!("{}", Self::command().render_long_version());
                Ok(())
            }
            Commands::Completions { shell } => {
                let mut app = Self::command();
                clap_complete::generate(shell, &mut app, consts::APP_NAME, &mut std::io::stdout());
                Ok(())
            }
            Commands::DefaultConfig => {
                print!("{}", Config::default().to_toml()?);
                Ok(())
            }
            Commands::Simulate(options) => {
                println!("{}", simulate(&options)?);
                Ok(())
            }
        }
    }
}

fn simulate(options: &SimulateOptions) -> Result<String, Error> {
    let config = options.load_config()?;
    let report = execute(session::run(config))??;
    if options.json {
        serde_json::to_string_pretty(&report).context(error::SerializeReportSnafu)
    } else {
        Ok(render_report(&report))
    }
}

fn execute<F>(fut: F) -> Result<F::Output, Error>
where
    F: Future,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name(consts::THREAD_NAME)
        .enable_all()
        .build()
        .context(error::InitializeTokioRuntimeSnafu)?;

    Ok(runtime.block_on(fut))
}

fn render_report(report: &SessionReport) -> String {
    let mut table = Table::new();
    let _ = table.set_header(vec!["Subscriber", "Delay (ms)", "Received", "Last frame", "Ended"]);
    for subscriber in &report.subscribers {
        let _ = table.add_row(vec![
            subscriber.name.clone(),
            subscriber.processing_delay_ms.to_string(),
            subscriber.received.to_string(),
            subscriber.last_frame.map_or_else(|| "-".to_owned(), |frame| frame.to_string()),
            subscriber.ended.to_string(),
        ]);
    }

    let first_value = report
        .first_value_frame
        .map_or_else(|| "none".to_owned(), |frame| format!("frame {frame}"));
    format!(
        "FPS range: {}\nPublished: {}{}\nFirst value: {first_value}\n{table}",
        report.fps_range,
        report.published,
        if report.interrupted { " (interrupted)" } else { "" },
    )
}

#[cfg(test)]
mod tests {
    use awaitcast::parameter::FpsRange;

    use super::*;
    use crate::session::{SubscriberReport, Termination};

    #[test]
    fn verify_cli() { Cli::command().debug_assert(); }

    #[test]
    fn flags_override_config() -> Result<(), Error> {
        let options = simulate_options(&["--updates", "3", "--interval-ms", "7"]);

        let config = options.load_config()?;
        assert_eq!(config.updates, 3);
        assert_eq!(config.publish_interval_ms, 7);
        assert_eq!(config.subscribers, Config::default().subscribers);
        Ok(())
    }

    fn simulate_options(args: &[&str]) -> SimulateOptions {
        let cli = Cli::try_parse_from(["awaitcast", "simulate"].into_iter().chain(args.iter().copied()))
            .expect("arguments are valid");
        let Commands::Simulate(options) = cli.commands else {
            panic!("expected simulate command");
        };
        options
    }

    #[test]
    fn simulate_prints_json_report() -> Result<(), Box<dyn std::error::Error>> {
        let options = simulate_options(&["--updates", "2", "--interval-ms", "1", "--json"]);

        let report: serde_json::Value = serde_json::from_str(&simulate(&options)?)?;
        assert_eq!(report["published"], 2);
        assert_eq!(report["fps_range"]["max"], 30000);
        assert_eq!(report["subscribers"].as_array().map(Vec::len), Some(3));
        Ok(())
    }

    #[test]
    fn simulate_prints_table_report() -> Result<(), Error> {
        let options = simulate_options(&["--updates", "1", "--interval-ms", "1"]);

        let rendered = simulate(&options)?;
        assert!(rendered.contains("Published: 1"));
        assert!(rendered.contains("recorder"));
        Ok(())
    }

    #[test]
    fn simulate_rejects_zero_interval() {
        let options = simulate_options(&["--interval-ms", "0"]);
        assert!(matches!(simulate(&options), Err(Error::Config { .. })));
    }

    #[test]
    fn report_table() {
        let report = SessionReport {
            fps_range: FpsRange::new(30000, 30000),
            published: 4,
            first_value_frame: Some(0),
            interrupted: false,
            subscribers: vec![SubscriberReport {
                name: "preview".to_owned(),
                processing_delay_ms: 0,
                received: 4,
                last_frame: Some(3),
                ended: Termination::Closed,
            }],
        };

        let rendered = render_report(&report);
        assert!(rendered.starts_with("FPS range: [30000, 30000]\nPublished: 4\nFirst value: frame 0"));
        assert!(rendered.contains("preview"));
    }
}

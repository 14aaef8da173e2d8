mod command;
mod config;
mod error;
mod session;
mod signal_handler;

use tracing_subscriber::EnvFilter;

use self::command::Cli;

mod consts {
    pub const APP_NAME: &str = "awaitcast";

    pub const THREAD_NAME: &str = "awaitcast";
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::new();
    if let Err(err) = cli.run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

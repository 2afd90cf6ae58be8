use std::env;
use std::io;
use std::process;

use tracing::{error, info};

use route_punter::config::{Command, Config, Mode};
use route_punter::session::{Outcome, Session};
use route_punter::{transport, Result};

fn play(config: &Config) -> Result<Outcome> {
    match config.mode {
        Mode::Online => {
            let stream = transport::connect(&config.server, config.port, config.read_timeout)?;
            Session::new(stream, config).run()
        }
        Mode::Offline => Session::new(transport::stdio(), config).run(),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "punter".to_string());

    let config = match Config::parse(&program, args.get(1..).unwrap_or(&[])) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help(usage)) => {
            println!("{}", usage);
            return;
        }
        Err(e) => {
            eprintln!("{}: {}", program, e);
            process::exit(2);
        }
    };

    // stdout carries the protocol in offline mode, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(config.log_level)
        .with_target(false)
        .init();

    info!("{:?} mode, strategy {}", config.mode, config.strategy);
    match play(&config) {
        Ok(outcome) => info!("done: {:?}", outcome),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

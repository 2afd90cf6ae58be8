use std::time::Duration;

use getopts::{Matches, Options};
use tracing::Level;

use crate::error::{Error, Result};
use crate::strategy::Strategy;

pub const DEFAULT_SERVER: &str = "punter.inf.ed.ac.uk";
pub const DEFAULT_PORT: u16 = 9001;
pub const DEFAULT_NAME: &str = "route extender";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One long-lived TCP connection for the whole game.
    Online,
    /// One process per server message over stdin/stdout; the game state
    /// travels inside the messages.
    Offline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub server: String,
    pub port: u16,
    pub name: String,
    pub mode: Mode,
    pub strategy: Strategy,
    pub read_timeout: Option<Duration>,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            server: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
            name: DEFAULT_NAME.to_string(),
            mode: Mode::Offline,
            strategy: Strategy::default(),
            read_timeout: None,
            log_level: Level::INFO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Config),
    Help(String),
}

fn options() -> Options {
    let mut opts = Options::new();
    opts.optopt("s", "server", "server address (online mode)", "ADDRESS");
    opts.optopt("p", "port", "server port (online mode)", "PORT");
    opts.optopt("n", "name", "AI name", "NAME");
    opts.optflag("", "online", "play over TCP instead of stdin/stdout");
    opts.optopt("S", "strategy", "move strategy: route, first or random", "NAME");
    opts.optopt("", "search-budget", "river expansions per route search", "N");
    opts.optopt("t", "read-timeout", "socket read timeout in seconds, 0 for none", "SECS");
    opts.optflagmulti("v", "verbose", "log more (repeat for trace output)");
    opts.optflag("q", "quiet", "only log warnings and errors");
    opts.optflag("h", "help", "print this help menu");
    opts
}

fn parse_opt<T: std::str::FromStr>(matches: &Matches, name: &str) -> Result<Option<T>> {
    match matches.opt_str(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Usage(format!("invalid value '{}' for --{}", raw, name))),
    }
}

impl Config {
    /// Parse the command line. `args` excludes the program name.
    pub fn parse(program: &str, args: &[String]) -> Result<Command> {
        let opts = options();
        let matches = opts
            .parse(args)
            .map_err(|e| Error::Usage(e.to_string()))?;
        if matches.opt_present("h") {
            let brief = format!("Usage: {} [options]", program);
            return Ok(Command::Help(opts.usage(&brief)));
        }

        let mut config = Config::default();
        if let Some(server) = matches.opt_str("server") {
            config.server = server;
        }
        if let Some(port) = parse_opt(&matches, "port")? {
            config.port = port;
        }
        if let Some(name) = matches.opt_str("name") {
            config.name = name;
        }
        if matches.opt_present("online") {
            config.mode = Mode::Online;
        }
        if let Some(strategy) = matches.opt_str("strategy") {
            config.strategy = strategy.parse()?;
        }
        if let Some(n) = parse_opt::<usize>(&matches, "search-budget")? {
            match config.strategy {
                Strategy::RouteExtension { ref mut budget } => *budget = n,
                _ => {
                    return Err(Error::Usage(
                        "--search-budget only applies to the route strategy".into(),
                    ))
                }
            }
        }
        if let Some(secs) = parse_opt::<u64>(&matches, "read-timeout")? {
            config.read_timeout = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }
        config.log_level = match (matches.opt_present("q"), matches.opt_count("v")) {
            (true, 0) => Level::WARN,
            (true, _) => return Err(Error::Usage("--quiet and --verbose conflict".into())),
            (false, 0) => Level::INFO,
            (false, 1) => Level::DEBUG,
            (false, _) => Level::TRACE,
        };
        Ok(Command::Run(config))
    }
}

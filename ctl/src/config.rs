use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::Deserialize;
use shared::address_book::{AddressBook, AddressBookEntry, Topology};
use shared::msg::Target;
use shared::parser::duration;
use shared::transport::{DEFAULT_COMMAND_ADDR, DEFAULT_HEARTBEAT_ADDR};
use shared::types::{MacAddr, NodeIndex};
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "/etc/mesh-ctl/mesh-ctl.toml";

#[derive(Debug)]
pub struct Config {
    pub address_book: AddressBook,
    pub command_addr: SocketAddr,
    pub heartbeat_addr: SocketAddr,
    pub log_target: LogTarget,
    pub log_level: LevelFilter,
    /// Used by `dfu-sequential` if no interval is given on the command line
    pub dfu_interval: Duration,
    /// Used by `blink` if no interval is given on the command line
    pub blink_interval: Duration,
    pub command: Command,
}

/// Mesh lab control tool
///
/// Sends reset, firmware update and LED commands to the mesh nodes and tracks their heartbeats.
#[derive(Debug, Default, Parser, Deserialize)]
#[command(
    version,
    rename_all = "kebab-case",
    hide_possible_values = false,
    subcommand_required = true,
    arg_required_else_help = true
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigArgs {
    //
    // CLI and config file args - can be filled in later from another ConfigArgs if they are
    // still none
    /// The built-in node installation to use [default: 21]
    ///
    /// Ignored if the config file defines custom nodes and this is not given on the command line.
    #[arg(long, short = 't')]
    topology: Option<Topology>,
    /// Where control packets are sent to [default: 255.255.255.255:10000]
    #[arg(long)]
    command_addr: Option<SocketAddr>,
    /// Where heartbeats are received on [default: 0.0.0.0:10001]
    #[arg(long)]
    heartbeat_addr: Option<SocketAddr>,
    /// Log target [default: std]
    ///
    /// Sets the logging mechanism to use.
    #[arg(long)]
    log_target: Option<LogTarget>,
    /// Log level [default: warn]
    ///
    /// Sets the maximum level to log.
    ///
    /// When logging to std, the logging behavior can be fine controlled by
    /// setting the RUST_LOG environment variable. This overwrites this
    /// setting. See the env_logger documentation for more details:
    ///
    /// https://docs.rs/env_logger/latest/env_logger/#enabling-logging
    #[arg(long)]
    log_level: Option<LogLevel>,

    //
    // Config file only args
    /// Custom node list, replaces the built-in topologies
    #[arg(skip)]
    nodes: Option<Vec<AddressBookEntry>>,
    /// Default wait between two nodes for dfu-sequential [default: 2s]
    #[arg(skip)]
    #[serde(default, deserialize_with = "duration::optional::deserialize")]
    dfu_interval: Option<Duration>,
    /// Default blink interval [default: 1s]
    #[arg(skip)]
    #[serde(default, deserialize_with = "duration::optional::deserialize")]
    blink_interval: Option<Duration>,

    //
    // CLI only args - we do not parse them from file and also do not update them
    /// Config file location [default: /etc/mesh-ctl/mesh-ctl.toml]
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, hide_default_value = true)]
    #[serde(skip)]
    config_file: Option<PathBuf>,
    /// The command to execute
    #[command(subcommand)]
    #[serde(skip)]
    command: Option<Command>,
}

impl ConfigArgs {
    /// Fill None fields from another source - ignore Some(_) fields
    /// This means, what is put in first has higher priority
    fn fill_from(&mut self, other: Self) {
        // The topology and a custom node list both define the address book, so they are taken
        // together
        if self.topology.is_none() && self.nodes.is_none() {
            self.topology = other.topology;
            self.nodes = other.nodes;
        }

        if self.command_addr.is_none() {
            self.command_addr = other.command_addr
        };

        if self.heartbeat_addr.is_none() {
            self.heartbeat_addr = other.heartbeat_addr
        };

        if self.log_target.is_none() {
            self.log_target = other.log_target
        };

        if self.log_level.is_none() {
            self.log_level = other.log_level
        };

        if self.dfu_interval.is_none() {
            self.dfu_interval = other.dfu_interval
        };

        if self.blink_interval.is_none() {
            self.blink_interval = other.blink_interval
        };
    }

    fn into_config(self) -> Result<Config> {
        let Some(command) = self.command else {
            bail!("No command given");
        };

        let address_book = match self.nodes {
            Some(nodes) => {
                AddressBook::from_entries(nodes).context("Invalid node list in config file")?
            }
            None => AddressBook::for_topology(self.topology.unwrap_or_default()),
        };

        Ok(Config {
            address_book,
            command_addr: self.command_addr.unwrap_or(DEFAULT_COMMAND_ADDR),
            heartbeat_addr: self.heartbeat_addr.unwrap_or(DEFAULT_HEARTBEAT_ADDR),
            log_target: self.log_target.unwrap_or_default(),
            log_level: self.log_level.unwrap_or(LogLevel::Warn).into(),
            dfu_interval: self.dfu_interval.unwrap_or(Duration::from_secs(2)),
            blink_interval: self.blink_interval.unwrap_or(Duration::from_secs(1)),
            command,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Restart nodes
    Reset(TargetArgs),
    /// Make nodes start a firmware update from this host
    Dfu(TargetArgs),
    /// Trigger a firmware update on every known node, one after the other
    DfuSequential {
        /// Time to wait between two nodes [default: dfu-interval from the config file or 2s]
        #[arg(long, value_parser = duration::parse)]
        interval: Option<Duration>,
    },
    /// Switch the LED of nodes on or off
    Led {
        state: LedState,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Toggle the LED of nodes until interrupted
    Blink {
        #[command(flatten)]
        target: TargetArgs,
        /// Time between switching on and off [default: blink-interval from the config file or 1s]
        #[arg(long, value_parser = duration::parse)]
        interval: Option<Duration>,
    },
    /// Print node heartbeats with new firmware versions until interrupted
    Listen,
    /// Print the known nodes
    Nodes,
}

/// Selects the nodes a command is sent to. All nodes if neither is given.
#[derive(Clone, Debug, Default, PartialEq, Eq, Args)]
#[group(multiple = false)]
pub struct TargetArgs {
    /// Only address the node with this index
    #[arg(long, short = 'n')]
    pub node: Option<NodeIndex>,
    /// Only address the node with this MAC
    #[arg(long, short = 'm')]
    pub mac: Option<MacAddr>,
}

impl TargetArgs {
    /// Looks up the given node index. Fails if the address book doesn't know it.
    pub fn resolve(&self, address_book: &AddressBook) -> Result<Target> {
        match (self.node, self.mac) {
            (Some(index), _) => Ok(Target::Unicast(address_book.resolve(index)?.mac)),
            (None, Some(mac)) => Ok(Target::Unicast(mac)),
            (None, None) => Ok(Target::Broadcast),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LedState {
    On,
    Off,
}

impl LedState {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

/// Parses the command line and the config file
///
/// Returns the config and a list of info messages to be logged after the logger has been set up.
pub fn load_and_parse() -> Result<(Config, Vec<String>)> {
    load_and_parse_from(std::env::args_os())
}

/// Like [load_and_parse], but parses the given arguments instead of the process command line
pub fn load_and_parse_from<I, T>(args: I) -> Result<(Config, Vec<String>)>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut args = ConfigArgs::parse_from(args);
    let mut info_log = vec![];

    if let Some(ref file) = args.config_file {
        match std::fs::read_to_string(file) {
            Ok(ref toml_config) => {
                let file_args: ConfigArgs =
                    toml::from_str(toml_config).with_context(|| "Couldn't parse config file")?;

                info_log.push(format!("Loaded configuration from {file:?}"));

                args.fill_from(file_args);
            }
            Err(err) => {
                if file != Path::new(DEFAULT_CONFIG_FILE) {
                    return Err(err)
                        .with_context(|| format!("Could not open config file at {file:?}"));
                }

                info_log.push("No config file found at default location, ignoring".to_string());
            }
        }
    }

    Ok((args.into_config()?, info_log))
}

#[derive(Clone, Debug, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Std,
    Journald,
}

// To be able to parse the log level, we need to make our own enum and convert
// it
#[derive(Clone, Debug, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

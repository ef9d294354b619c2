//! Command-line interface definitions.
//!
//! Defines the CLI structure for the ordersync binary using `clap`: a live
//! `run` mode, one-shot order management under `orders`, and diagnostics
//! under `check`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DateRange, OrderFilter, OrderStatus};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Live order feed and order management for the store admin backend
#[derive(Parser, Debug)]
#[command(name = "ordersync")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the live order feed until Ctrl-C
    Run(RunArgs),

    /// Inspect and manage orders
    #[command(subcommand)]
    Orders(OrdersCommand),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `ordersync orders`.
#[derive(Subcommand, Debug)]
pub enum OrdersCommand {
    /// List orders, newest first
    List(ListArgs),
    /// Show one order with its line items
    Show(OrderIdArgs),
    /// Per-status counts and revenue
    Stats(ConfigPathArg),
    /// Change the status of an order
    SetStatus(SetStatusArgs),
    /// Delete an order
    Delete(DeleteArgs),
}

/// Subcommands for `ordersync check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file
    Config(ConfigPathArg),
    /// Test REST and realtime connectivity to the backend
    Connection(ConnectionArgs),
}

/// Shared argument for commands that only need a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Arguments for `run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Override the configured log level (e.g. debug, info)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

/// Arguments for `orders list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Only orders with this status (pending, in-progress, completed, cancelled)
    #[arg(long)]
    pub status: Option<OrderStatus>,

    /// Case-insensitive text search over contact fields, id and items
    #[arg(long)]
    pub search: Option<String>,

    /// Creation window
    #[arg(long, value_enum, default_value = "all")]
    pub range: RangeArg,

    /// Show at most this many orders
    #[arg(long)]
    pub limit: Option<usize>,
}

impl ListArgs {
    /// Filter described by the arguments.
    #[must_use]
    pub fn filter(&self) -> OrderFilter {
        OrderFilter {
            search: self.search.clone(),
            status: self.status,
            range: self.range.into(),
        }
    }
}

/// Creation window accepted by `orders list --range`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RangeArg {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl From<RangeArg> for DateRange {
    fn from(range: RangeArg) -> Self {
        match range {
            RangeArg::All => Self::All,
            RangeArg::Today => Self::Today,
            RangeArg::Week => Self::Week,
            RangeArg::Month => Self::Month,
        }
    }
}

/// Arguments for commands addressing one order.
#[derive(Parser, Debug)]
pub struct OrderIdArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Order id
    pub id: String,
}

/// Arguments for `orders set-status`.
#[derive(Parser, Debug)]
pub struct SetStatusArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Order id
    pub id: String,

    /// New status (pending, in-progress, completed, cancelled)
    pub status: OrderStatus,
}

/// Arguments for `orders delete`.
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Order id
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `check connection`.
#[derive(Parser, Debug)]
pub struct ConnectionArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Seconds to wait for the realtime subscription to be confirmed
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;

use cmd::{CallArgs, DescribeArgs, ListArgs};

/// chateau-call - call one remote method described by a generated schema.
///
///   chateau-call -s geo.yaml list [--json]
///   chateau-call -s geo.yaml describe Locate [--json]
///   chateau-call -s geo.yaml call -c HOST:PORT -e Service.Method [--args JSON] [--param K=V ...]
///
/// Global flags / env:
///   -v / -vv / -vvv   Increase log verbosity (stderr); RUST_LOG overrides
///   -q / --quiet      Errors only
///   -s / --schema     Schema descriptor (or CHATEAU_SCHEMA env)
///   CHATEAU_CONN      Fallback for call --conn-string
///
/// Examples:
///   chateau-call -s geo.yaml call -c 127.0.0.1:9090 -e Geo.Locate --args '{"Query":"cafe","Near":"{\"X\":\"5\"}"}'
///   chateau-call -s geo.yaml call -c 127.0.0.1:9090 -e Geo.Locate --param Query=cafe --param 'Near={"X":"5"}' --json
#[derive(Parser, Debug)]
#[command(
    name = "chateau-call",
    version,
    author,
    about = "Call one remote method from a generated schema with string arguments",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Schema descriptor file (JSON or YAML)
    #[arg(
        short = 's',
        long = "schema",
        alias = "chateau_file",
        global = true,
        value_name = "PATH"
    )]
    schema: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Call one method and print its response
    Call(CallArgs),

    /// List methods declared by the schema
    List(ListArgs),

    /// Show request/response fields of one method
    Describe(DescribeArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = chateau_call::utils::derive_level(cli.verbose, cli.quiet);
    chateau_call::utils::init_logging(level);

    // Schema: CLI flag > CHATEAU_SCHEMA env
    let schema = cmd::shared::flag_or_env(cli.schema, cmd::shared::SCHEMA_ENV);

    match cli.command {
        Commands::Call(args) => cmd::execute_call(args, schema),
        Commands::List(args) => cmd::execute_list(args, schema),
        Commands::Describe(args) => cmd::execute_describe(args, schema),
    }
}

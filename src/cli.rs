// Command line surface.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "redfish-cli")]
#[clap(version, propagate_version = true)]
#[clap(about = "Send raw requests to Redfish management controllers")]
pub struct Cli {
    #[clap(long, global = true, env = "REDFISH_CLI_CONFIG")]
    #[clap(help = "Configuration file. Defaults to <config dir>/redfish-cli/config.json.")]
    pub config: Option<PathBuf>,

    #[clap(short, long, global = true, help = "Show more detail about each request")]
    pub verbose: bool,

    #[clap(short, long, global = true, action = ArgAction::Count)]
    #[clap(help = "Increase log level. Repeat for more.")]
    pub debug: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[clap(about = "Raw form of the PUT command")]
    #[clap(long_about = RAWPUT_ABOUT)]
    Rawput(RawPutOptions),
    #[clap(about = "Display all selectable types of the logged in server")]
    Types(TypesOptions),
    #[clap(about = "End the current session")]
    Logout,
}

const RAWPUT_ABOUT: &str = "Send a PUT built from the data in the input file.

Example input file:
{
    \"path\": \"/redfish/v1/systems/1/bios/Settings/\",
    \"body\": {
        \"Attributes\": {
            \"BaseConfig\": \"default\"
        }
    }
}";

#[derive(Parser, Debug, Clone, Default)]
pub struct RawPutOptions {
    #[clap(value_name = "FILENAME", help = "JSON file holding the path and body of the request")]
    pub files: Vec<String>,

    #[clap(long, help = "Use the provided URL to login")]
    pub url: Option<String>,

    #[clap(short = 'u', long = "user")]
    #[clap(help = "Username, used to log in within the same command when not logged in yet")]
    pub user: Option<String>,

    #[clap(short = 'p', long, help = "Use the provided password to log in")]
    pub password: Option<String>,

    #[clap(long, help = "Print the response body")]
    pub response: bool,

    #[clap(long, help = "Print the response headers as JSON")]
    pub getheaders: bool,

    #[clap(long, value_name = "HEADER:VALUE,HEADER:VALUE")]
    #[clap(help = "Extra headers to add to the request")]
    pub headers: Option<String>,

    #[clap(long, help = "Do not echo the outcome of the request")]
    pub silent: bool,

    #[clap(long, help = "Connect using an existing session id instead of a normal login")]
    pub sessionid: Option<String>,

    #[clap(long, help = "Value of the provider id header")]
    pub providerid: Option<String>,

    #[clap(long, help = "BIOS password, for commands that need second-level BIOS authentication")]
    pub biospassword: Option<String>,

    #[clap(long, help = "Service mode: less output, faster requests")]
    pub service: bool,
}

#[derive(Parser, Debug, Clone, Default)]
pub struct TypesOptions {
    #[clap(hide = true)]
    pub args: Vec<String>,

    #[clap(long, help = "Use the provided URL to login")]
    pub url: Option<String>,

    #[clap(short = 'u', long = "user")]
    #[clap(help = "Username, used to log in within the same command when not logged in yet")]
    pub user: Option<String>,

    #[clap(short = 'p', long, help = "Use the provided password to log in")]
    pub password: Option<String>,

    #[clap(long, help = "Include log services when collecting data")]
    pub includelogs: bool,

    #[clap(long)]
    #[clap(
        help = "Starting point for data collection, /redfish/v1/ by default. Only applies at login time."
    )]
    pub path: Option<String>,

    #[clap(long, help = "Show full type names instead of the simplified versions")]
    pub fulltypes: bool,
}

// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Command-line definitions shared by one-shot invocations and the shell.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use optrack::pagination::{INVENTORY_PAGE_SIZES, REPORT_PAGE_SIZE};
use optrack::types::Role;
use optrack::validation::{parse_decimal, parse_whole_number};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "optrack")]
#[command(version = VERSION)]
#[command(about = "Production order (OP) tracking client.")]
#[command(long_about = "optrack - Production order tracking client\n\n\
    Log in:              optrack login\n\
    Inventory:           optrack products list\n\
    Find an OP:          optrack search 4512\n\
    Team load:           optrack teams list\n\
    Interactive session: optrack shell\n\n\
    The backend URL is read from ~/.optrack/config.json, OPTRACK_API_URL or --api-url.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides config and OPTRACK_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Quiet mode: only warnings and errors are logged
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode: debug logging
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store the session token
    ///
    /// Examples:
    ///   optrack login
    ///   optrack login --user ana
    Login {
        /// User name (prompted when omitted)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Remove the stored session token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Find a production order and show its size summary
    ///
    /// Without an OP the five most recent products are listed.
    ///
    /// Examples:
    ///   optrack search
    ///   optrack search 4512
    ///   optrack search 4512 --export ./reports
    Search {
        /// OP number (digits only)
        #[arg(value_parser = parse_whole_number)]
        op: Option<i64>,

        /// Write OP_Report_<op>.txt for the first match into this directory
        #[arg(long, value_name = "DIR", requires = "op")]
        export: Option<PathBuf>,
    },

    /// Inventory: list, create, edit and delete products
    #[command(subcommand)]
    Products(ProductCommands),

    /// Teams and their workload
    #[command(subcommand)]
    Teams(TeamCommands),

    /// User accounts
    #[command(subcommand)]
    Users(UserCommands),

    /// Date-range report and scheduled report e-mails
    #[command(subcommand)]
    Reports(ReportCommands),

    /// Show or change client configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Interactive session with inactivity auto-logout
    Shell,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProductCommands {
    /// List products, newest first
    ///
    /// Examples:
    ///   optrack products list
    ///   optrack products list --search camisa --per-page 20
    ///   optrack products list --page 3
    List {
        /// Search term; blank lists everything
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// 10, 20 or 30
        #[arg(long, default_value_t = INVENTORY_PAGE_SIZES[0], value_parser = parse_inventory_page_size)]
        per_page: usize,
    },

    /// Show one product with its size breakdown
    Show { id: i64 },

    /// Products assigned to a team
    ByTeam { team_id: i64 },

    /// Create a product
    ///
    /// Example:
    ///   optrack products add --op 4512 --reference REF-22 --brand Marca \
    ///     --campaign C3 --type Camisa --team 3 --price 15000 --sam 11.5 \
    ///     --assigned 2025-01-10 --entry 2025-01-12 --size S=10 --size M=20
    Add(ProductFields),

    /// Edit a product; only the given fields change
    Edit {
        id: i64,
        #[command(flatten)]
        fields: ProductFields,
    },

    /// Delete a product
    Delete {
        id: i64,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProductFields {
    /// OP number (digits only)
    #[arg(long, value_parser = parse_whole_number)]
    pub op: Option<i64>,
    #[arg(long)]
    pub reference: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub campaign: Option<String>,
    #[arg(long = "type", value_name = "TYPE")]
    pub product_type: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Unit price
    #[arg(long, value_parser = parse_decimal)]
    pub price: Option<f64>,
    /// Standard allowed minutes per garment
    #[arg(long, value_parser = parse_decimal)]
    pub sam: Option<f64>,
    /// Assigned date (YYYY-MM-DD or dd/mm/yyyy)
    #[arg(long, value_name = "DATE")]
    pub assigned: Option<String>,
    /// Plant entry date (YYYY-MM-DD or dd/mm/yyyy)
    #[arg(long, value_name = "DATE")]
    pub entry: Option<String>,
    /// Team id
    #[arg(long, value_parser = parse_whole_number)]
    pub team: Option<i64>,
    /// SIZE=QUANTITY, repeatable (kids 2-16, adults XS-XXL)
    #[arg(long = "size", value_name = "SIZE=QTY")]
    pub sizes: Vec<String>,
    /// Production status (edit only)
    #[arg(long)]
    pub status: Option<String>,
    /// Stoppage reason (edit only)
    #[arg(long)]
    pub stoppage_reason: Option<String>,
    /// Actual delivery date (edit only)
    #[arg(long, value_name = "DATE")]
    pub delivered: Option<String>,
    /// Garments finished so far (edit only)
    #[arg(long, value_parser = parse_whole_number)]
    pub quantity_made: Option<i64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TeamCommands {
    /// Team dashboard with workload levels
    List,

    Show { id: i64 },

    /// Create a team
    ///
    /// Example:
    ///   optrack teams add --name Costura --persons 12
    Add(TeamFields),

    /// Edit a team; only the given fields change
    Edit {
        id: i64,
        #[command(flatten)]
        fields: TeamFields,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct TeamFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Number of persons in the team
    #[arg(long, value_parser = parse_whole_number)]
    pub persons: Option<i64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserCommands {
    List,

    /// Create a user; the password is prompted
    ///
    /// Example:
    ///   optrack users add --name maria --email maria@planta.co --role full-access
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// USER, FULL_ACCESS or RECIPIENT
        #[arg(long, default_value = "USER")]
        role: Role,
    },

    /// Edit a user; only the given fields change
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },

    /// Delete a user (not your own account)
    Delete {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportCommands {
    /// Products assigned within a date range
    ///
    /// Example:
    ///   optrack reports range --start 2025-01-01 --end 2025-01-31 --team 3
    Range {
        #[arg(long, value_name = "DATE")]
        start: Option<String>,
        #[arg(long, value_name = "DATE")]
        end: Option<String>,
        /// Only this team
        #[arg(long, value_parser = parse_whole_number)]
        team: Option<i64>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = REPORT_PAGE_SIZE)]
        per_page: usize,
    },

    /// Scheduled report e-mails
    #[command(subcommand)]
    Schedule(ScheduleCommands),
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScheduleCommands {
    List,

    Show { id: i64 },

    /// Schedule a report e-mail
    ///
    /// Example:
    ///   optrack reports schedule add --date 2025-02-01 --time 08:00 --email planta@example.com
    Add {
        #[arg(long, value_name = "DATE")]
        date: String,
        /// HH:MM, 24h
        #[arg(long)]
        time: String,
        #[arg(long)]
        email: String,
    },

    Edit {
        id: i64,
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    Delete {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Store the backend base URL
    SetApiUrl { url: String },
}

/// One line typed into the interactive shell.
#[derive(Parser, Debug)]
#[command(name = "optrack", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    /// Dismiss the inactivity warning and keep the session
    Continue,

    /// Leave the shell
    #[command(alias = "quit")]
    Exit,

    #[command(flatten)]
    App(Commands),
}

fn parse_inventory_page_size(input: &str) -> Result<usize, String> {
    let size: usize = input.trim().parse().map_err(|_| format!("'{}' is not a number", input))?;
    if INVENTORY_PAGE_SIZES.contains(&size) {
        Ok(size)
    } else {
        Err(format!("page size must be one of {:?}", INVENTORY_PAGE_SIZES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
        ShellLine::command().debug_assert();
    }

    #[test]
    fn test_parse_product_add() {
        let cli = Cli::try_parse_from([
            "optrack", "products", "add", "--op", "4512", "--type", "Camisa", "--size", "S=10",
            "--size", "M=20", "--price", "15000.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Products(ProductCommands::Add(fields)) => {
                assert_eq!(fields.op, Some(4512));
                assert_eq!(fields.product_type.as_deref(), Some("Camisa"));
                assert_eq!(fields.sizes, vec!["S=10", "M=20"]);
                assert_eq!(fields.price, Some(15000.5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_numeric_only_arguments() {
        assert!(Cli::try_parse_from(["optrack", "search", "45a"]).is_err());
        assert!(Cli::try_parse_from(["optrack", "products", "add", "--price", "-3"]).is_err());
        assert!(Cli::try_parse_from(["optrack", "products", "list", "--per-page", "15"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["optrack", "teams", "list", "-v", "--api-url", "http://x:1"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.api_url.as_deref(), Some("http://x:1"));
        assert!(Cli::try_parse_from(["optrack", "-v", "-q", "whoami"]).is_err());
    }

    #[test]
    fn test_shell_line_parsing() {
        let line = ShellLine::try_parse_from(["continue"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Continue));
        let line = ShellLine::try_parse_from(["quit"]).unwrap();
        assert!(matches!(line.command, ShellCommand::Exit));
        let line = ShellLine::try_parse_from(["users", "delete", "4", "--yes"]).unwrap();
        assert!(matches!(
            line.command,
            ShellCommand::App(Commands::Users(UserCommands::Delete { id: 4, yes: true }))
        ));
    }
}

use clap::{Parser as ClapParser, Subcommand};
use exhibit_expression::{
    Registry,
    cli::{self, CheckOptions, CheckResult, CliError},
    output::{to_json, to_json_pretty},
};
use log::LevelFilter;
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "exhibit")]
#[command(about = "Exhibit - evaluate data exhibit expressions against an item database")]
#[command(version)]
struct Cli {
    /// Log parsing and evaluation details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and evaluate an expression
    Check {
        /// The expression to evaluate
        expression: String,

        /// Exhibit JSON data file (reads from stdin if not provided)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Evaluate on this item instead of on every item
        #[arg(short, long)]
        item: Option<String>,

        /// Root name the items are bound to
        #[arg(short, long)]
        root: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// List registered controls, functions and operators
    Functions,

    /// Show an overview of the expression syntax
    Syntax,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new().filter_level(level).init();

    let result = match cli.command {
        Commands::Check {
            expression,
            data,
            item,
            root,
            pretty,
            syntax_only,
        } => run_check(expression, data, item, root, pretty, syntax_only),
        Commands::Functions => {
            print!("{}", cli::get_registry_overview(&Registry::standard()));
            Ok(())
        }
        Commands::Syntax => {
            print!("{}", cli::get_syntax_overview());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    expression: String,
    data: Option<PathBuf>,
    item: Option<String>,
    root: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let data = match data {
        Some(path) => Some(fs::read_to_string(path)?),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        expression,
        data,
        item,
        root,
        syntax_only,
    };

    match cli::execute_check(&options) {
        Ok(CheckResult::SyntaxValid(printed)) => println!("Syntax is valid: {}", printed),
        Ok(CheckResult::Success(result)) => {
            let json = if pretty { to_json_pretty(&result) } else { to_json(&result) };
            println!("{}", json);
        }
        Err(CliError::Parse(e)) => {
            eprintln!("{}", options.expression);
            eprintln!("{}^", " ".repeat(e.position()));
            return Err(CliError::Parse(e));
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

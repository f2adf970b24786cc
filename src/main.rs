use clap::Parser;
use pylet::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pylet")]
#[command(about = "A tree-walking interpreter for a small Python subset")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a source file
    #[command(alias = "r")]
    Run {
        /// Input file to run
        input: PathBuf,
    },

    /// Dump lexer tokens as JSON
    #[command(alias = "l")]
    Lex {
        /// Input file to tokenize
        input: PathBuf,

        /// Output JSON file name (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump the parsed syntax tree as JSON
    Ast {
        /// Input file to parse
        input: PathBuf,

        /// Output JSON file name (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { input } => cli::run(input)?,
        Commands::Lex { input, output } => cli::lex(input, output)?,
        Commands::Ast { input, output } => cli::gen_ast(input, output)?,
    }

    Ok(())
}

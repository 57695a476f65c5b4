mod cli;
mod config;
mod run;

use clap::Parser;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            use clap::error::ErrorKind;
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
            std::process::exit(code);
        }
    };

    match cli.command {
        cli::Command::Run(args) => {
            if let Err(err) = run::run(args).await {
                eprintln!("{err:#}");
                std::process::exit(1);
            }
        }
    }
}

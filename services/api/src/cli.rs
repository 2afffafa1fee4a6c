use crate::demo::{print_programs, run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use enrollment_wizard::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Enrollment Wizard",
    about = "Serve or walk through the multi-step program enrollment wizard",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a scripted applicant through every wizard step
    Demo(DemoArgs),
    /// List program categories and the courses offered under each
    Programs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args).await,
        Command::Programs => {
            print_programs();
            Ok(())
        }
    }
}

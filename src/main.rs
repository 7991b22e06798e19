use clap::Parser;
use miette::Result;
use votelist::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Terminate quietly on a closed pipe (`votelist voters list | head`)
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    votelist::logging::init(global.verbose, global.quiet);

    match cli.command {
        Commands::Init(args) => votelist::cli::commands::init::run(args),
        Commands::Import(args) => votelist::cli::commands::import::run(args, &global),
        Commands::Voters(cmd) => votelist::cli::commands::voters::run(cmd, &global),
        Commands::Lists(cmd) => votelist::cli::commands::lists::run(cmd, &global),
        Commands::Print(args) => votelist::cli::commands::print::run(args, &global),
        Commands::Tasks(cmd) => votelist::cli::commands::tasks::run(cmd, &global),
        Commands::Templates(args) => votelist::cli::commands::templates::run(args, &global),
        Commands::Columns => votelist::cli::commands::columns::run(&global),
        Commands::ReportTask(args) => votelist::cli::commands::report_task::run(args, &global),
        Commands::Completions(args) => votelist::cli::commands::completions::run(args),
    }
}

use clap::Parser;

use statdash_console::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli::load_config(&cli)?;

    let code = cli::run(cli, config).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

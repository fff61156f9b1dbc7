use anyhow::Result;

use notas_escolaweb::app::{App, Command};
use notas_escolaweb::config::Config;
use notas_escolaweb::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = Config::load();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    App::initialize(config).await?.run(command).await?;

    Ok(())
}

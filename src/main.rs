use std::sync::Arc;

use anyhow::Result;

use toolkit::command::Availability;
use toolkit::config::ToolkitConfig;
use toolkit::logging;

mod cmd;

fn main() -> Result<()> {
    // A missing .env is fine; variables may come from the shell.
    dotenvy::dotenv().ok();

    let config = ToolkitConfig::load()?;
    let availability = Arc::new(Availability::compiled());
    let _guard = logging::init(config.logging(), &availability)?;
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    let mut manager = cmd::command_manager(&config, availability);
    manager.load_commands()?;
    let parser = manager.build_parser()?;

    let matches = parser.get_matches();
    manager.dispatch(&matches)
}

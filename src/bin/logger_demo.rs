use strongbox::logger::*;
use strongbox::settings::parse_settings;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let settings = parse_settings(None)?;
    logger.reload_from_config(&LogConfig::from(&settings.log))?;
    trace!("application trace log");
    debug!("application debug log");
    info!(user_id = "00000000-0000-0000-0000-000000000000", "structured application log");

    Ok(())
}

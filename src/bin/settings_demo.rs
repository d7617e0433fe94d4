use strongbox::settings::*;

fn main() -> anyhow::Result<()> {
    // Load settings from the default location
    let project_settings = parse_settings(None)?;
    println!("Loaded settings: {:?}", project_settings);
    println!("Redis URL host: {:?}", project_settings.redis.as_ref().map(|r| &r.host));

    // Attempt to load from an invalid path (expected to fail)
    let is_err = parse_settings(Some("")).is_err();
    println!("Error on invalid path: {:?}", is_err);

    // Environment overrides apply on top of the file, e.g.
    // $ STRONGBOX_SESSION__MAX_SESSIONS=3 cargo run --bin settings_demo -- --settings=settings/dev.toml
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    println!("max_sessions: {}", project_settings.session.max_sessions);

    Ok(())
}

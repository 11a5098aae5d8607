/// Look up the latest Plex Media Server package without installing it
///
/// Pass an alternate manifest URL as the first argument to query a mirror.

use pmsu::{PlexUpgrader, UpgradeConfig};

fn main() -> anyhow::Result<()> {
    let mut config = UpgradeConfig::new();
    if let Some(url) = std::env::args().nth(1) {
        config = config.api_url(url);
    }

    let upgrader = PlexUpgrader::new(config);
    println!("Manifest: {}", upgrader.config().api_url);
    println!("Filter:   {} / {}", upgrader.config().build, upgrader.config().distro);

    let status = upgrader.check()?;
    println!("Latest:    {}", status.latest.version.as_deref().unwrap_or("unknown"));
    println!("URL:       {}", status.latest.url);
    println!("Installed: {}", status.installed.as_deref().unwrap_or("not installed"));

    Ok(())
}

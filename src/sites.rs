use anyhow::Result;

use crate::config::{Config, SiteMode};

/// List configured sites and whether their scan roots exist.
pub fn list_sites(config: &Config) -> Result<()> {
    println!("{:<16} {:<10} {:<40} HEALTHY", "SITE", "MODE", "SUBDIR");

    for (name, site) in &config.sites {
        let mode = match site.mode {
            SiteMode::Markdown => "markdown",
            SiteMode::Openapi => "openapi",
        };
        for subdir in &site.subdirs {
            let healthy = config.repo.path.join(subdir).exists();
            println!("{:<16} {:<10} {:<40} {}", name, mode, subdir, healthy);
        }
    }

    Ok(())
}

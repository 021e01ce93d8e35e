//! `pixgrab config` – show config path and effective values.

use anyhow::Result;
use pixgrab_core::config::{self, PixgrabConfig};

pub fn show_config(cfg: &PixgrabConfig) -> Result<()> {
    println!("config file: {}", config::config_path()?.display());
    println!("n_thread:    {}", cfg.download.n_thread);
    println!("capacity:    {}", cfg.download.capacity);
    println!(
        "download dir: {}",
        cfg.download
            .download_dir
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(current directory)".to_string())
    );
    println!("site:        {}", cfg.site.base_url);
    println!(
        "cookie:      {}",
        if cfg.user.cookie.trim().is_empty() {
            "(not set)"
        } else {
            "(set)"
        }
    );
    Ok(())
}

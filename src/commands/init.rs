//! Initialize a new blog

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# Blog configuration

# Site
title: Ignite Blog
description: ''
language: pt-BR
timezone: UTC

# URL
url: http://example.com
root: /

# Content API
# PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these
api_endpoint: https://your-repo.cdn.prismic.io/api/v2
access_token:
document_type: post
page_size: 3
max_pages: 50

# Directory
source_dir: source
public_dir: public

# Presentation
logo: Logo.svg
load_more_label: Carregar mais posts
retry_label: Falha ao carregar posts. Tentar novamente
words_per_minute: 200

# Seconds between regenerations while serving
revalidate: 86400
"#;

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="26" viewBox="0 0 240 26"><text x="0" y="20" font-family="sans-serif" font-size="22" fill="#ff57b2">blog</text></svg>
"##;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{:?} already exists", config_path);
    }

    fs::create_dir_all(target_dir.join("source"))?;
    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let logo_path = target_dir.join("source/Logo.svg");
    if !logo_path.exists() {
        fs::write(&logo_path, LOGO_SVG)?;
    }

    tracing::info!("Wrote {:?}", config_path);
    Ok(())
}

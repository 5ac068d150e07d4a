//! Configuration loading.
use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::RouterConfig;

/// Load configuration from a file using the config crate.
/// Supports multiple formats: TOML, YAML, JSON, etc.
pub fn load_config(config_path: &str) -> Result<RouterConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml,
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let router_config: RouterConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(router_config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_toml_config() {
        let toml_content = r#"
base_url = "http://example.org"
handle_all_requests = true

[[routes]]
pattern = "product/{name?}"
name = "product.show"
controller = "ProductController::show"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://example.org"));
        assert!(config.handle_all_requests);
        assert_eq!(config.routes.len(), 1);
    }

    #[test]
    fn test_load_json_config() {
        let json_content = r#"
{
  "base_url": "http://example.org",
  "routes": [
    {
      "pattern": "product/{name}",
      "controller": "ProductController::show"
    }
  ],
  "predicates": [
    {
      "name": "search",
      "conditions": [
        { "key": "s", "operator": "!=", "value": null }
      ]
    }
  ]
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.predicates.len(), 1);
    }
}

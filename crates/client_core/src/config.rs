use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "blog_desk.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub supabase_url: String,
    pub anon_key: String,
    pub bucket: String,
    pub session_file: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supabase_url: "http://127.0.0.1:54321".into(),
            anon_key: String::new(),
            bucket: "blog-images".into(),
            session_file: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    supabase_url: Option<String>,
    anon_key: Option<String>,
    bucket: Option<String>,
    session_file: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn base_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.supabase_url.trim())
            .with_context(|| format!("invalid supabase_url '{}'", self.supabase_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("supabase_url must start with http:// or https://");
        }
        Ok(url)
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.supabase_url {
            self.supabase_url = v;
        }
        if let Some(v) = file.anon_key {
            self.anon_key = v;
        }
        if let Some(v) = file.bucket {
            self.bucket = v;
        }
        if let Some(v) = file.session_file {
            self.session_file = Some(v);
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
    }

    /// Later names win, so `APP__*` overrides the bare variable.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in ["SUPABASE_URL", "APP__SUPABASE_URL"] {
            if let Some(v) = lookup(key) {
                self.supabase_url = v;
            }
        }
        for key in ["SUPABASE_ANON_KEY", "APP__ANON_KEY"] {
            if let Some(v) = lookup(key) {
                self.anon_key = v;
            }
        }
        if let Some(v) = lookup("APP__BUCKET") {
            self.bucket = v;
        }
        if let Some(v) = lookup("APP__SESSION_FILE") {
            self.session_file = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.request_timeout_secs = parsed;
            }
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE))
}

/// Defaults, then the TOML file if present, then the environment.
pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        settings.apply_file(parse_file(&raw).with_context(|| {
            format!("failed to parse config file '{}'", path.display())
        })?);
    }

    settings.apply_env(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()));
    Ok(settings)
}

fn parse_file(raw: &str) -> anyhow::Result<FileSettings> {
    Ok(toml::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        settings.apply_file(
            parse_file(
                r#"
supabase_url = "https://demo.supabase.co"
anon_key = "anon"
request_timeout_secs = 5
"#,
            )
            .expect("valid toml"),
        );
        assert_eq!(settings.supabase_url, "https://demo.supabase.co");
        assert_eq!(settings.anon_key, "anon");
        assert_eq!(settings.bucket, "blog-images");
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn prefixed_env_wins_over_plain_env() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SUPABASE_URL", "https://plain.supabase.co"),
            ("APP__SUPABASE_URL", "https://prefixed.supabase.co"),
            ("SUPABASE_ANON_KEY", "key"),
            ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
        ]);
        let mut settings = Settings::default();
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.supabase_url, "https://prefixed.supabase.co");
        assert_eq!(settings.anon_key, "key");
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let settings = Settings {
            supabase_url: "ftp://example.com".into(),
            ..Settings::default()
        };
        assert!(settings.base_url().is_err());
        assert!(Settings::default().base_url().is_ok());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blog_desk.toml");
        fs::write(&path, "request_timeout_secs = \"soon\"").expect("write");
        let err = load_settings_from(&path).expect_err("bad type");
        assert!(err.to_string().contains("failed to parse config file"));
    }
}

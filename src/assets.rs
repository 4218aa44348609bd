use std::fs;
use std::path::{Path, PathBuf};

pub const LOGO_FILE: &str = "logo.png";
pub const STYLESHEET_FILE: &str = "style.css";

/// Optional branding assets. Anything missing or unreadable is treated as absent.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    pub logo: Option<PathBuf>,
    pub stylesheet: Option<String>,
}

impl Assets {
    pub fn discover(dir: &Path) -> Self {
        let logo_path = dir.join(LOGO_FILE);
        let logo = if logo_path.is_file() {
            Some(logo_path)
        } else {
            tracing::debug!(path = %logo_path.display(), "logo not found, using text brand");
            None
        };

        let stylesheet_path = dir.join(STYLESHEET_FILE);
        let stylesheet = match fs::read_to_string(&stylesheet_path) {
            Ok(css) => Some(css),
            Err(err) => {
                tracing::debug!(path = %stylesheet_path.display(), error = %err, "no stylesheet");
                None
            }
        };

        Self { logo, stylesheet }
    }

    /// Brand line used in the top bar and splash.
    pub fn brand(&self) -> String {
        match &self.logo {
            Some(path) => format!("[logo: {}] BAQĀ", path.display()),
            None => "BAQĀ".to_string(),
        }
    }

    /// Accent colour taken from a `--accent: <value>;` declaration in the stylesheet.
    pub fn accent(&self) -> Option<&str> {
        let css = self.stylesheet.as_deref()?;
        let start = css.find("--accent:")? + "--accent:".len();
        let rest = &css[start..];
        let end = rest.find(|c| c == ';' || c == '}' || c == '\n')?;
        let value = rest[..end].trim();
        (!value.is_empty()).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_assets_degrade_to_text() {
        let dir = tempfile::tempdir().unwrap();
        let assets = Assets::discover(&dir.path().join("does-not-exist"));
        assert!(assets.logo.is_none());
        assert!(assets.stylesheet.is_none());
        assert_eq!(assets.brand(), "BAQĀ");
        assert_eq!(assets.accent(), None);
    }

    #[test]
    fn present_assets_are_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LOGO_FILE), b"png").unwrap();
        fs::write(
            dir.path().join(STYLESHEET_FILE),
            ":root { --accent: #0f766e; }\n",
        )
        .unwrap();

        let assets = Assets::discover(dir.path());
        assert_eq!(assets.logo, Some(dir.path().join(LOGO_FILE)));
        assert!(assets.brand().starts_with("[logo: "));
        assert_eq!(assets.accent(), Some("#0f766e"));
    }
}

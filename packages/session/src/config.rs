//! Portal configuration.
//!
//! The reference configuration lives in `packages/session/portal.toml` and
//! is baked into the binary at compile time via [`include_str!`]. A user
//! config file only needs the keys it overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use citius_extract::{ExtractConfig, Locator};
use citius_record_models::criteria::{CourtSet, DaysFilter, SearchSubject};
use serde::Deserialize;

/// Reference configuration, embedded at compile time.
const BUILTIN_TOML: &str = include_str!("../portal.toml");

/// Environment variable naming a config file to load instead of the
/// built-in one.
pub const CONFIG_ENV: &str = "CITIUS_CONFIG";

/// Errors raised while loading a [`PortalConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`PortalConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Addresses, element ids and timings for one portal deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Search form address.
    pub search_url: String,
    /// Default wait for elements and page loads, in seconds.
    pub timeout_secs: u64,
    /// Run Chrome without a window.
    pub headless: bool,
    /// Pause after controls that trigger a postback, in milliseconds.
    pub settle_delay_ms: u64,
    /// Pause after submitting the search, in milliseconds.
    pub results_delay_ms: u64,
    /// Browser window width.
    pub window_width: u32,
    /// Browser window height.
    pub window_height: u32,
    /// Search form element ids.
    pub form: FormIds,
    /// Result page reading.
    pub extraction: ExtractConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.citius.mj.pt/portal/consultas/consultascire.aspx".to_owned(),
            timeout_secs: 60,
            headless: false,
            settle_delay_ms: 2000,
            results_delay_ms: 5000,
            window_width: 1920,
            window_height: 1080,
            form: FormIds::default(),
            extraction: ExtractConfig::default(),
        }
    }
}

impl PortalConfig {
    /// Parses the embedded reference configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the embedded file is malformed.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(BUILTIN_TOML)
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or mistyped values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Read`] if the file cannot be read
    /// * [`ConfigError::Parse`] if it is not a valid config
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Loads `explicit` if given, else the file named by
    /// [`CONFIG_ENV`], else the built-in configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the chosen file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::info!("Loading portal config from {}", path.display());
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            let path = PathBuf::from(path);
            log::info!("Loading portal config from {} ({CONFIG_ENV})", path.display());
            return Self::from_file(&path);
        }
        Self::builtin()
    }

    /// Default wait for elements and page loads.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause after postback controls.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Pause after submitting the search.
    #[must_use]
    pub const fn results_delay(&self) -> Duration {
        Duration::from_millis(self.results_delay_ms)
    }

    /// Overrides the wait timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Overrides the headless flag.
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

/// Element ids of the search form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormIds {
    /// Search text box.
    pub search_input: String,
    /// "NIF/NIPC" subject radio.
    pub subject_tax_id: String,
    /// "Designação" subject radio.
    pub subject_name: String,
    /// Start date box.
    pub start_date: String,
    /// End date box.
    pub end_date: String,
    /// "Nova Estrutura Judiciária" radio.
    pub court_new: String,
    /// "Tribunais Extintos" radio.
    pub court_extinct: String,
    /// Act group dropdown.
    pub act_group: String,
    /// Act dropdown.
    pub act: String,
    /// Last-15-days radio.
    pub days_15: String,
    /// Last-30-days radio.
    pub days_30: String,
    /// All-dates radio.
    pub days_all: String,
    /// Search button.
    pub search_button: String,
    /// "No results" label.
    pub no_results: String,
    /// CSS selector for validator messages. Not an id.
    pub validation_selector: String,
}

impl Default for FormIds {
    fn default() -> Self {
        const PREFIX: &str = "ctl00_ContentPlaceHolder1_";
        let id = |suffix: &str| format!("{PREFIX}{suffix}");

        Self {
            search_input: id("txtPesquisa"),
            subject_tax_id: id("rblTipo_0"),
            subject_name: id("rblTipo_1"),
            start_date: id("txtCalendarDesde"),
            end_date: id("txtCalendarAte"),
            court_new: id("rbtlTribunais_0"),
            court_extinct: id("rbtlTribunais_1"),
            act_group: id("ddlGrupoActos"),
            act: id("ddlActos"),
            days_15: id("rblDias_0"),
            days_30: id("rblDias_1"),
            days_all: id("rblDias_2"),
            search_button: id("btnSearch"),
            no_results: id("lblNoResults"),
            validation_selector: "span[style*='color:Red']".to_owned(),
        }
    }
}

impl FormIds {
    /// Radio for the kind of search subject.
    #[must_use]
    pub fn subject_radio(&self, subject: &SearchSubject) -> Locator {
        match subject {
            SearchSubject::TaxId(_) => Locator::id(&self.subject_tax_id),
            SearchSubject::EntityName(_) => Locator::id(&self.subject_name),
        }
    }

    /// Radio for a court set.
    #[must_use]
    pub fn court_radio(&self, court: CourtSet) -> Locator {
        match court {
            CourtSet::NewStructure => Locator::id(&self.court_new),
            CourtSet::Extinct => Locator::id(&self.court_extinct),
        }
    }

    /// Radio for a publication window.
    #[must_use]
    pub fn days_radio(&self, days: DaysFilter) -> Locator {
        match days {
            DaysFilter::Last15 => Locator::id(&self.days_15),
            DaysFilter::Last30 => Locator::id(&self.days_30),
            DaysFilter::All => Locator::id(&self.days_all),
        }
    }

    /// Validator message spans.
    #[must_use]
    pub fn validation(&self) -> Locator {
        Locator::css(self.validation_selector.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_matches_defaults() {
        assert_eq!(PortalConfig::builtin().unwrap(), PortalConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = PortalConfig::from_toml(
            "timeout_secs = 5\n\n[extraction]\nbudget_secs = 30\n",
        )
        .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.extraction.budget_secs, 30);
        assert_eq!(
            config.extraction.results_table_id,
            ExtractConfig::default().results_table_id
        );
        assert_eq!(config.form, FormIds::default());
    }

    #[test]
    fn rejects_mistyped_values() {
        assert!(matches!(
            PortalConfig::from_toml("timeout_secs = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn explicit_path_wins_and_missing_file_is_reported() {
        let dir = std::env::temp_dir().join("citius_session_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("portal.toml");
        std::fs::write(&path, "headless = true\n").unwrap();

        assert!(PortalConfig::load(Some(&path)).unwrap().headless);
        assert!(matches!(
            PortalConfig::load(Some(&dir.join("missing.toml"))),
            Err(ConfigError::Read { .. })
        ));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn overrides_apply() {
        let config = PortalConfig::default()
            .with_timeout_secs(10)
            .with_headless(true);
        assert_eq!(config.timeout_secs, 10);
        assert!(config.headless);
    }

    #[test]
    fn radios_follow_selection() {
        let ids = FormIds::default();
        assert_eq!(
            ids.days_radio(DaysFilter::Last30).as_str(),
            "#ctl00_ContentPlaceHolder1_rblDias_1"
        );
        assert_eq!(
            ids.court_radio(CourtSet::Extinct).as_str(),
            "#ctl00_ContentPlaceHolder1_rbtlTribunais_1"
        );
        assert_eq!(
            ids.subject_radio(&SearchSubject::EntityName("X".to_owned())).as_str(),
            "#ctl00_ContentPlaceHolder1_rblTipo_1"
        );
    }
}

//! Export service configuration.
//!
//! The base URL is passed to the viewer at construction. Two helpers read
//! `XLEXPORT_API_BASE`: at run time for native builds, at compile time for the
//! browser bundle. Either way an unset or blank value falls back to
//! [`DEFAULT_API_BASE`].

/// Base URL used when nothing is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Environment variable holding the export service base URL.
pub const API_BASE_ENV: &str = "XLEXPORT_API_BASE";

/// The only file suffix accepted for uploads.
pub const ACCEPTED_EXTENSION: &str = ".xlsx";

/// Prefix of the synthesized download name (`modified-<sheet>.xlsx`).
pub const DOWNLOAD_PREFIX: &str = "modified-";

/// Largest dense grid one sheet may project to, counted in cells.
///
/// Past this a sheet is rejected at parse time instead of exhausting memory.
pub const MAX_PROJECTED_CELLS: u64 = 4_000_000;

/// Path of the export endpoint, relative to the base URL.
const EXPORT_PATH: &str = "/export";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    api_base: String,
}

impl ExportConfig {
    /// Build a config from a base URL, stripping trailing slashes.
    pub fn new(api_base: impl AsRef<str>) -> Self {
        let trimmed = api_base.as_ref().trim().trim_end_matches('/');
        let api_base = if trimmed.is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            trimmed.to_string()
        };
        Self { api_base }
    }

    /// Build from an optional value; `None` means the default.
    pub fn from_optional(value: Option<&str>) -> Self {
        Self::new(value.unwrap_or(DEFAULT_API_BASE))
    }

    /// Read `XLEXPORT_API_BASE` from the process environment.
    pub fn from_env() -> Self {
        Self::from_optional(std::env::var(API_BASE_ENV).ok().as_deref())
    }

    /// Read `XLEXPORT_API_BASE` as it was when the crate was compiled.
    pub fn from_build_env() -> Self {
        Self::from_optional(option_env!("XLEXPORT_API_BASE"))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Full URL of the export endpoint.
    pub fn export_url(&self) -> String {
        format!("{}{EXPORT_PATH}", self.api_base)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

/// Whether a file name carries the accepted spreadsheet extension.
pub fn has_accepted_extension(file_name: &str) -> bool {
    file_name.ends_with(ACCEPTED_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("http://api.local", "http://api.local/export" ; "plain")]
    #[test_case("http://api.local/", "http://api.local/export" ; "trailing slash")]
    #[test_case("http://api.local///", "http://api.local/export" ; "several slashes")]
    #[test_case("  http://api.local/v1/ ", "http://api.local/v1/export" ; "whitespace and prefix")]
    #[test_case("", "http://localhost:8000/export" ; "blank falls back")]
    fn export_url_is_normalized(base: &str, expected: &str) {
        assert_eq!(ExportConfig::new(base).export_url(), expected);
    }

    #[test]
    fn missing_value_uses_loopback_default() {
        let config = ExportConfig::from_optional(None);
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
        assert_eq!(config, ExportConfig::default());
    }

    #[test_case("report.xlsx", true)]
    #[test_case("archive.tar.xlsx", true)]
    #[test_case("report.xls", false)]
    #[test_case("report.XLSX", false)]
    #[test_case("report.xlsx.csv", false)]
    #[test_case("", false)]
    fn extension_check(name: &str, accepted: bool) {
        assert_eq!(has_accepted_extension(name), accepted);
    }
}

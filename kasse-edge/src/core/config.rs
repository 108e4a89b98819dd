use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::order_money::MoneyFormat;
use crate::printing::{JsonFileStore, PipelineError, PipelineResult, ReceiptRenderer};

/// Print pipeline configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | PRINT_DATA_DIR | ./data | Setup, orders and job log |
/// | PRINT_SETUP_FILE | $PRINT_DATA_DIR/setup.json | Rules and printer profiles |
/// | PRINT_TIMEOUT_MS | 10000 | Per-attempt delivery timeout |
/// | PRINT_TIMEZONE | Europe/Copenhagen | Timezone for printed timestamps |
/// | PRINT_CURRENCY | kr. | Currency suffix on receipts |
/// | PRINT_DECIMAL_SEPARATOR | , | Decimal separator for amounts |
/// | LOG_LEVEL | info | Log filter |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | (unset) | Daily log files go here when set |
///
/// # Example
///
/// ```ignore
/// PRINT_TIMEOUT_MS=3000 LOG_LEVEL=debug kasse-print print 1042 --trigger placed
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub setup_file: PathBuf,
    pub timeout_ms: u64,
    /// IANA name, parsed on use
    pub timezone: String,
    pub currency: String,
    pub decimal_separator: char,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = PathBuf::from(var("PRINT_DATA_DIR").unwrap_or_else(|| "./data".into()));
        let setup_file = var("PRINT_SETUP_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("setup.json"));

        Self {
            setup_file,
            timeout_ms: var("PRINT_TIMEOUT_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(10000),
            timezone: var("PRINT_TIMEZONE").unwrap_or_else(|| "Europe/Copenhagen".into()),
            currency: var("PRINT_CURRENCY").unwrap_or_else(|| "kr.".into()),
            decimal_separator: var("PRINT_DECIMAL_SEPARATOR")
                .and_then(|v| v.chars().next())
                .unwrap_or(','),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: var("LOG_JSON").is_some_and(|v| v == "1" || v == "true"),
            log_dir: var("LOG_DIR").filter(|d| !d.is_empty()),
            data_dir,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn tz(&self) -> PipelineResult<Tz> {
        self.timezone.parse().map_err(|_| {
            PipelineError::Configuration(format!("unknown timezone '{}'", self.timezone))
        })
    }

    pub fn money_format(&self) -> MoneyFormat {
        MoneyFormat::new(self.decimal_separator, self.currency.clone())
    }

    pub fn renderer(&self) -> PipelineResult<ReceiptRenderer> {
        Ok(ReceiptRenderer::new(self.tz()?, self.money_format()))
    }

    /// File store over `data_dir`, reading setup from `setup_file`
    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(
            self.setup_file.clone(),
            self.data_dir.join("orders"),
            self.data_dir.join("print_jobs.jsonl"),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_money::Money;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]);
        assert_eq!(c.timeout(), Duration::from_secs(10));
        assert_eq!(c.tz().unwrap(), chrono_tz::Europe::Copenhagen);
        assert_eq!(c.money_format(), MoneyFormat::new(',', "kr."));
        assert_eq!(c.setup_file, PathBuf::from("./data/setup.json"));
        assert_eq!(c.log_level, "info");
        assert!(c.log_dir.is_none());
        assert!(!c.log_json);
    }

    #[test]
    fn test_overrides() {
        let c = config(&[
            ("PRINT_DATA_DIR", "/srv/kasse"),
            ("PRINT_TIMEOUT_MS", "2500"),
            ("PRINT_TIMEZONE", "Europe/Oslo"),
            ("PRINT_CURRENCY", "NOK"),
            ("PRINT_DECIMAL_SEPARATOR", "."),
            ("LOG_DIR", "/var/log/kasse"),
        ]);
        assert_eq!(c.timeout(), Duration::from_millis(2500));
        assert_eq!(c.tz().unwrap(), chrono_tz::Europe::Oslo);
        assert_eq!(
            c.money_format().with_currency(Money::from_minor(995)),
            "9.95 NOK"
        );
        assert_eq!(c.setup_file, PathBuf::from("/srv/kasse/setup.json"));
        assert_eq!(c.log_dir.as_deref(), Some("/var/log/kasse"));
    }

    #[test]
    fn test_invalid_values() {
        let c = config(&[("PRINT_TIMEOUT_MS", "soon"), ("PRINT_TIMEZONE", "Mars/Base")]);
        assert_eq!(c.timeout_ms, 10000);
        assert!(matches!(c.tz(), Err(PipelineError::Configuration(_))));
        assert!(c.renderer().is_err());

        let c = config(&[("PRINT_TIMEOUT_MS", "0")]);
        assert_eq!(c.timeout_ms, 10000);
    }
}

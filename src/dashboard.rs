//! Dashboard Pipeline
//! Load → clean → aggregate for one run, plus the country-driven refresh.

use crate::config::DashboardConfig;
use crate::data::{DataLoader, Table};
use crate::report::Report;
use crate::selector::CountrySelector;
use anyhow::{Context, Result};

/// Everything the presenters need for one loaded dataset.
pub struct Dashboard {
    pub table: Table,
    pub selector: CountrySelector,
    pub report: Report,
}

impl Dashboard {
    pub fn load(config: &DashboardConfig) -> Result<Self> {
        let table = DataLoader::load_csv(&config.source_path)
            .with_context(|| format!("loading {}", config.source_path.display()))?;

        let mut selector = CountrySelector::new(&table)?;
        if let Some(country) = &config.country {
            if let Err(e) = selector.choose(country) {
                log::warn!("{e}; showing {:?} instead", selector.selected());
            }
        }

        let report = Report::build(&table, config, selector.selected())
            .context("building report")?;

        Ok(Self {
            table,
            selector,
            report,
        })
    }

    /// Switch the trend view to another country of the dataset.
    pub fn choose_country(&mut self, country: &str) -> Result<()> {
        self.selector.choose(country)?;
        self.report
            .select_country(&self.table, self.selector.selected())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoadError;
    use crate::report::Figure;
    use std::io::Write;

    fn write_dataset(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("master.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "country,year,sex,age,suicides_no,population,suicides/100k pop,country-year,\
HDI for year, gdp_for_year ($) ,gdp_per_capita ($),generation"
        )
        .unwrap();
        for line in [
            "Albania,1987,male,15-24 years,21,312900,6.71,Albania1987,,\"2,156,624,900\",796,Generation X",
            "Albania,1988,female,35-54 years,16,308000,5.19,Albania1988,,\"2,126,000,000\",769,Silent",
            "Chile,1990,male,75+ years,40,80000,50.0,Chile1990,0.7,\"30,000,000,000\",2500,G.I. Generation",
        ] {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn test_load_and_switch_country() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            source_path: write_dataset(&dir),
            country: Some("Chile".to_string()),
            ..DashboardConfig::default()
        };

        let mut dashboard = Dashboard::load(&config).unwrap();
        assert_eq!(dashboard.selector.selected(), Some("Chile"));
        assert_eq!(dashboard.report.trend().title, "Suicide Trends Over Time in Chile");

        dashboard.choose_country("Albania").unwrap();
        match &dashboard.report.trend().figure {
            Figure::Line(series) => {
                assert_eq!(series.pairs(), vec![("1987".to_string(), 21.0), ("1988".to_string(), 16.0)]);
            }
            other => panic!("unexpected figure: {other:?}"),
        }

        assert!(dashboard.choose_country("Atlantis").is_err());
        assert_eq!(dashboard.selector.selected(), Some("Albania"));
    }

    #[test]
    fn test_unknown_configured_country_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            source_path: write_dataset(&dir),
            country: Some("Atlantis".to_string()),
            ..DashboardConfig::default()
        };
        let dashboard = Dashboard::load(&config).unwrap();
        assert_eq!(dashboard.selector.selected(), Some("Albania"));
    }

    #[test]
    fn test_missing_source_keeps_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            source_path: dir.path().join("missing.csv"),
            ..DashboardConfig::default()
        };
        let err = Dashboard::load(&config).err().unwrap();
        assert!(err.downcast_ref::<DataLoadError>().is_some());
    }
}

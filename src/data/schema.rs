//! Dataset Schema Module
//! Column layout of the suicide statistics dataset and its typed record.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const COUNTRY: &str = "country";
pub const YEAR: &str = "year";
pub const SEX: &str = "sex";
pub const AGE: &str = "age";
pub const SUICIDES_NO: &str = "suicides_no";
pub const POPULATION: &str = "population";
pub const RATE_PER_100K: &str = "suicides/100k pop";
pub const COUNTRY_YEAR: &str = "country-year";
pub const HDI_FOR_YEAR: &str = "HDI for year";
pub const GDP_FOR_YEAR: &str = "gdp_for_year ($)";
pub const GDP_PER_CAPITA: &str = "gdp_per_capita ($)";
pub const GENERATION: &str = "generation";

/// How raw text in a column is coerced on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    /// Free text restricted to `Sex` labels
    Sex,
    /// Free text restricted to `AgeGroup` labels
    Age,
    /// Non-negative integer count
    Count,
    Integer,
    /// Non-negative real
    Rate,
    Real,
    /// Real written with `,` thousands separators
    GroupedReal,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnKind::Count
                | ColumnKind::Integer
                | ColumnKind::Rate
                | ColumnKind::Real
                | ColumnKind::GroupedReal
        )
    }
}

/// One expected column of the source file.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required: true,
    }
}

/// Canonical column order of a loaded table.
pub const SCHEMA: [ColumnSpec; 12] = [
    required(COUNTRY, ColumnKind::Text),
    required(YEAR, ColumnKind::Integer),
    required(SEX, ColumnKind::Sex),
    required(AGE, ColumnKind::Age),
    required(SUICIDES_NO, ColumnKind::Count),
    required(POPULATION, ColumnKind::Count),
    required(RATE_PER_100K, ColumnKind::Rate),
    ColumnSpec {
        name: COUNTRY_YEAR,
        kind: ColumnKind::Text,
        required: false,
    },
    required(HDI_FOR_YEAR, ColumnKind::Real),
    required(GDP_FOR_YEAR, ColumnKind::GroupedReal),
    required(GDP_PER_CAPITA, ColumnKind::Real),
    required(GENERATION, ColumnKind::Text),
];

pub fn column_spec(name: &str) -> Option<&'static ColumnSpec> {
    SCHEMA.iter().find(|spec| spec.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" => Ok(Sex::Female),
            "male" => Ok(Sex::Male),
            other => Err(format!("unknown sex '{other}'")),
        }
    }
}

/// Age bands in their natural order (variant order drives `Ord`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgeGroup {
    Years5To14,
    Years15To24,
    Years25To34,
    Years35To54,
    Years55To74,
    Years75Plus,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::Years5To14,
        AgeGroup::Years15To24,
        AgeGroup::Years25To34,
        AgeGroup::Years35To54,
        AgeGroup::Years55To74,
        AgeGroup::Years75Plus,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Years5To14 => "5-14 years",
            AgeGroup::Years15To24 => "15-24 years",
            AgeGroup::Years25To34 => "25-34 years",
            AgeGroup::Years35To54 => "35-54 years",
            AgeGroup::Years55To74 => "55-74 years",
            AgeGroup::Years75Plus => "75+ years",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AgeGroup::ALL
            .into_iter()
            .find(|group| group.label() == s)
            .ok_or_else(|| format!("unknown age group '{s}'"))
    }
}

/// One typed row of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub country: String,
    pub year: i64,
    pub sex: Sex,
    pub age: AgeGroup,
    pub generation: String,
    pub suicides_no: i64,
    pub population: i64,
    pub suicides_per_100k: f64,
    pub hdi_for_year: Option<f64>,
    pub gdp_for_year: f64,
    pub gdp_per_capita: f64,
}

impl Record {
    /// Minimal record for building tables by hand.
    ///
    /// Age defaults to `35-54 years` and generation to `"Boomers"`; the other
    /// numeric fields are zero and HDI is missing. Override them with the
    /// `with_*` builders.
    pub fn new(country: &str, year: i64, sex: Sex, suicides_no: i64) -> Self {
        Self {
            country: country.to_string(),
            year,
            sex,
            age: AgeGroup::Years35To54,
            generation: "Boomers".to_string(),
            suicides_no,
            population: 0,
            suicides_per_100k: 0.0,
            hdi_for_year: None,
            gdp_for_year: 0.0,
            gdp_per_capita: 0.0,
        }
    }

    pub fn with_age(mut self, age: AgeGroup) -> Self {
        self.age = age;
        self
    }

    pub fn with_generation(mut self, generation: &str) -> Self {
        self.generation = generation.to_string();
        self
    }

    pub fn with_population(mut self, population: i64) -> Self {
        self.population = population;
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.suicides_per_100k = rate;
        self
    }

    pub fn with_hdi(mut self, hdi: f64) -> Self {
        self.hdi_for_year = Some(hdi);
        self
    }

    pub fn with_gdp(mut self, gdp_for_year: f64, gdp_per_capita: f64) -> Self {
        self.gdp_for_year = gdp_for_year;
        self.gdp_per_capita = gdp_per_capita;
        self
    }
}

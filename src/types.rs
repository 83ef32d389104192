use geo::MultiPolygon;
use std::collections::BTreeSet;

/// A boundary feature joined to its region code.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: Option<String>,
    pub code: Option<&'static str>,
    pub geometry: MultiPolygon<f64>,
}

/// One CSV row: a (year, jurisdiction) measurement. Missing numbers stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub year: i32,
    pub jurisdiction: String,
    pub fines: Option<f64>,
    pub total_licences: Option<f64>,
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub measurements: Vec<Measurement>,
    pub regions: Vec<Region>,
}

impl Dataset {
    pub fn new(measurements: Vec<Measurement>, regions: Vec<Region>) -> Self {
        Self { measurements, regions }
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.measurements
            .iter()
            .map(|m| m.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn rows_for_year(&self, year: i32) -> impl Iterator<Item = &Measurement> {
        self.measurements.iter().filter(move |m| m.year == year)
    }

    /// Every non-missing rate across all years.
    pub fn all_rates(&self) -> impl Iterator<Item = f64> + '_ {
        self.measurements.iter().filter_map(|m| m.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, jurisdiction: &str, rate: Option<f64>) -> Measurement {
        Measurement {
            year,
            jurisdiction: jurisdiction.to_string(),
            fines: None,
            total_licences: None,
            rate,
        }
    }

    #[test]
    fn years_are_distinct_and_sorted() {
        let dataset = Dataset::new(
            vec![
                row(2021, "NSW", Some(1.0)),
                row(2019, "VIC", None),
                row(2021, "VIC", Some(2.0)),
                row(2020, "QLD", Some(3.0)),
            ],
            Vec::new(),
        );
        assert_eq!(dataset.years(), vec![2019, 2020, 2021]);
    }

    #[test]
    fn all_rates_skips_missing() {
        let dataset = Dataset::new(
            vec![row(2020, "NSW", Some(4.0)), row(2020, "VIC", None)],
            Vec::new(),
        );
        assert_eq!(dataset.all_rates().collect::<Vec<_>>(), vec![4.0]);
        assert_eq!(dataset.rows_for_year(2020).count(), 2);
        assert_eq!(dataset.rows_for_year(1999).count(), 0);
    }
}

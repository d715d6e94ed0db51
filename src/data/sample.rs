//! Synthetic mortality and population tables.
//!
//! Each `(region, age band)` series is generated independently:
//!
//! deaths(week) = population * weekly_risk(age) * region_scale * season(week) * drift(year) * wave(week)
//!
//! plus Poisson-like noise (normal with variance equal to the mean), rounded
//! to whole deaths. The RNG is seeded per series from the configured seed, so
//! adding a region never changes the numbers of another one.

use std::collections::hash_map::DefaultHasher;
use std::f64::consts::TAU;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::RawDataSource;
use crate::domain::{
    AgeBand, MortalityRecord, MortalityTable, PopulationRecord, PopulationTable, Region, Week,
};
use crate::error::MortalityError;

/// Population of the youngest band before age and region scaling.
const BASE_BAND_POPULATION: f64 = 600_000.0;

/// Weekly death risk at age 0; grows exponentially with age.
const BASE_WEEKLY_RISK: f64 = 2e-6;
const RISK_PER_YEAR_OF_AGE: f64 = 0.085;

/// Peak-to-mean amplitude of the winter season.
const SEASON_AMPLITUDE: f64 = 0.15;

/// Weeks (inclusive) hit by the excess wave.
const WAVE_WEEKS: (u32, u32) = (12, 20);

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub regions: Vec<Region>,
    pub first_year: i32,
    pub last_year: i32,
    pub seed: u64,
    /// Yearly growth of deaths (ageing population), e.g. `0.005`.
    pub yearly_drift: f64,
    /// Year with an extra spring wave, if any.
    pub wave_year: Option<i32>,
    /// Peak relative increase of the wave for the oldest bands.
    pub wave_strength: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            regions: vec![Region::new("AA"), Region::new("BB")],
            first_year: 2013,
            last_year: 2022,
            seed: 7,
            yearly_drift: 0.005,
            wave_year: Some(2020),
            wave_strength: 0.6,
        }
    }
}

impl SyntheticConfig {
    fn validate(&self) -> Result<(), MortalityError> {
        if self.regions.is_empty() {
            return Err(MortalityError::invalid_input("Synthetic data needs at least one region."));
        }
        if self.last_year < self.first_year {
            return Err(MortalityError::invalid_input(format!(
                "Invalid synthetic year range {}..={}.",
                self.first_year, self.last_year
            )));
        }
        let end = self.last_year.checked_add(1).and_then(|y| Week::from_iso(y, 1));
        if Week::from_iso(self.first_year, 1).is_none() || end.is_none() {
            return Err(MortalityError::invalid_input(format!(
                "Synthetic years {}..={} are outside the supported calendar.",
                self.first_year, self.last_year
            )));
        }
        if i64::from(self.last_year) - i64::from(self.first_year) >= MAX_SYNTHETIC_YEARS {
            return Err(MortalityError::invalid_input(format!(
                "Synthetic data is limited to {MAX_SYNTHETIC_YEARS} years."
            )));
        }
        if !(self.yearly_drift.is_finite() && self.wave_strength.is_finite() && self.wave_strength >= 0.0) {
            return Err(MortalityError::invalid_input("Invalid synthetic drift or wave settings."));
        }
        Ok(())
    }
}

/// Generated tables plus the source that serves them.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    mortality: MortalityTable,
    population: PopulationTable,
}

impl SyntheticSource {
    pub fn generate(config: &SyntheticConfig) -> Result<Self, MortalityError> {
        config.validate()?;
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| MortalityError::invalid_input(format!("Noise distribution error: {e}")))?;

        let weeks = weeks_between(config.first_year, config.last_year)?;
        let mut mortality = Vec::with_capacity(weeks.len() * config.regions.len() * AgeBand::ALL.len());
        let mut population = Vec::new();

        for region in &config.regions {
            let scale = region_scale(config.seed, region);
            for band in AgeBand::ALL {
                let mut rng = StdRng::seed_from_u64(series_seed(config.seed, region, band));

                for year in config.first_year..=config.last_year {
                    population.push(PopulationRecord {
                        year,
                        region: region.clone(),
                        age: band,
                        population: band_population(band, scale, year - config.first_year),
                    });
                }

                for &week in &weeks {
                    let mean = expected_weekly_deaths(config, band, scale, week);
                    let noisy = mean + normal.sample(&mut rng) * mean.sqrt();
                    mortality.push(MortalityRecord {
                        week,
                        region: region.clone(),
                        age: band,
                        deaths: noisy.round().max(0.0),
                    });
                }
            }
        }

        log::debug!(
            "generated {} mortality and {} population rows for {} region(s)",
            mortality.len(),
            population.len(),
            config.regions.len()
        );

        Ok(Self {
            mortality: MortalityTable::new(mortality),
            population: PopulationTable::new(population),
        })
    }

    pub fn mortality_table(&self) -> &MortalityTable {
        &self.mortality
    }

    pub fn population_table(&self) -> &PopulationTable {
        &self.population
    }
}

impl RawDataSource for SyntheticSource {
    fn describe(&self) -> String {
        "synthetic sample".to_string()
    }

    fn mortality(&self, regions: &[Region], ages: &[AgeBand]) -> Result<MortalityTable, MortalityError> {
        Ok(self.mortality.restricted_to(regions, ages))
    }

    fn population(&self, regions: &[Region], ages: &[AgeBand]) -> Result<PopulationTable, MortalityError> {
        Ok(self.population.restricted_to(regions, ages))
    }
}

const MAX_SYNTHETIC_YEARS: i64 = 200;

fn weeks_between(first_year: i32, last_year: i32) -> Result<Vec<Week>, MortalityError> {
    let start = Week::from_iso(first_year, 1)
        .ok_or_else(|| MortalityError::invalid_input(format!("Invalid first year {first_year}.")))?;
    Ok((0..)
        .map(|i| start.offset(i))
        .take_while(|w| w.year() <= last_year)
        .collect())
}

fn band_population(band: AgeBand, scale: f64, years_elapsed: i32) -> f64 {
    let age = f64::from(band.lower());
    // Older bands grow a little every year, younger ones shrink.
    let ageing = 1.0 + (age - 45.0) / 45.0 * 0.01 * f64::from(years_elapsed);
    (BASE_BAND_POPULATION * scale * (-0.02 * age).exp() * ageing.max(0.1)).round()
}

fn expected_weekly_deaths(config: &SyntheticConfig, band: AgeBand, scale: f64, week: Week) -> f64 {
    let age = f64::from(band.lower());
    let risk = BASE_WEEKLY_RISK * (RISK_PER_YEAR_OF_AGE * age).exp();
    let population = band_population(band, scale, week.year() - config.first_year);

    // Peaks in early January, trough in early July.
    let phase = TAU * (f64::from(week.week()) - 2.0) / 52.0;
    let season = 1.0 + SEASON_AMPLITUDE * phase.cos();

    let drift = (1.0 + config.yearly_drift).powi(week.year() - config.first_year);

    population * risk * season * drift * wave_factor(config, band, week)
}

/// Triangular spring bump in `wave_year`, stronger for older bands.
fn wave_factor(config: &SyntheticConfig, band: AgeBand, week: Week) -> f64 {
    let (start, end) = WAVE_WEEKS;
    if config.wave_year != Some(week.year()) || week.week() < start || week.week() > end {
        return 1.0;
    }
    let mid = f64::from(start + end) / 2.0;
    let half = f64::from(end - start) / 2.0;
    let shape = 1.0 - (f64::from(week.week()) - mid).abs() / (half + 1.0);
    let age_weight = (f64::from(band.lower()) / 90.0).powi(2);
    1.0 + config.wave_strength * shape * age_weight
}

fn region_scale(seed: u64, region: &Region) -> f64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    region.hash(&mut hasher);
    // 0.5 ..= 2.5
    0.5 + (hasher.finish() % 2001) as f64 / 1000.0
}

fn series_seed(seed: u64, region: &Region, band: AgeBand) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    region.hash(&mut hasher);
    band.lower().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SyntheticConfig {
        SyntheticConfig {
            regions: vec![Region::new("AA")],
            first_year: 2015,
            last_year: 2020,
            ..SyntheticConfig::default()
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = SyntheticSource::generate(&small_config()).unwrap();
        let b = SyntheticSource::generate(&small_config()).unwrap();
        assert_eq!(a.mortality_table(), b.mortality_table());
        assert_eq!(a.population_table(), b.population_table());
    }

    #[test]
    fn adding_a_region_keeps_existing_series() {
        let one = SyntheticSource::generate(&small_config()).unwrap();
        let mut config = small_config();
        config.regions.push(Region::new("ZZ"));
        let two = SyntheticSource::generate(&config).unwrap();

        let aa = [Region::new("AA")];
        assert_eq!(one.mortality(&aa, &[]).unwrap(), two.mortality(&aa, &[]).unwrap());
    }

    #[test]
    fn covers_every_week_and_band() {
        let source = SyntheticSource::generate(&small_config()).unwrap();
        // 2015 and 2020 have 53 ISO weeks.
        let weeks = 52 * 6 + 2;
        assert_eq!(source.mortality_table().len(), weeks * AgeBand::ALL.len());
        assert_eq!(source.population_table().len(), 6 * AgeBand::ALL.len());
        assert!(source.mortality_table().records().iter().all(|r| r.deaths >= 0.0));
    }

    #[test]
    fn wave_raises_spring_deaths_for_the_old() {
        let config = small_config();
        let band = AgeBand::parse("Y_GE90").unwrap();
        let scale = region_scale(config.seed, &config.regions[0]);

        let in_wave = expected_weekly_deaths(&config, band, scale, Week::from_iso(2020, 16).unwrap());
        let no_wave = expected_weekly_deaths(
            &SyntheticConfig {
                wave_year: None,
                ..config.clone()
            },
            band,
            scale,
            Week::from_iso(2020, 16).unwrap(),
        );
        assert!(in_wave > no_wave * 1.3);
    }

    #[test]
    fn rejects_empty_year_range() {
        let config = SyntheticConfig {
            first_year: 2020,
            last_year: 2019,
            ..small_config()
        };
        assert!(SyntheticSource::generate(&config).is_err());
    }

    #[test]
    fn rejects_years_beyond_the_calendar() {
        let config = SyntheticConfig {
            last_year: i32::MAX,
            ..small_config()
        };
        assert!(matches!(
            SyntheticSource::generate(&config),
            Err(MortalityError::InvalidInput { .. })
        ));

        let config = SyntheticConfig {
            first_year: 1000,
            last_year: 3000,
            ..small_config()
        };
        assert!(SyntheticSource::generate(&config).is_err());
    }
}

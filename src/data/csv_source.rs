//! Raw tables from a directory of CSV files.
//!
//! Layout:
//!
//! ```text
//! <dir>/mortality.csv    geo,age,sex,time,value   (time = 2020W05)
//! <dir>/population.csv   geo,age,sex,time,value   (time = 2020)
//! ```
//!
//! The population file is optional; without it the per-million path has no
//! denominators and every week becomes a gap.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::data::RawDataSource;
use crate::domain::{AgeBand, MortalityTable, PopulationTable, Region};
use crate::error::MortalityError;
use crate::io::ingest::{load_mortality_csv, load_population_csv, write_mortality_csv, write_population_csv};

pub const MORTALITY_FILE: &str = "mortality.csv";
pub const POPULATION_FILE: &str = "population.csv";

#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write both tables into `dir` and return a source reading them back.
    pub fn create(
        dir: impl Into<PathBuf>,
        mortality: &MortalityTable,
        population: &PopulationTable,
    ) -> Result<Self, MortalityError> {
        let source = Self::new(dir);
        fs::create_dir_all(&source.dir)?;
        write_mortality_csv(BufWriter::new(File::create(source.mortality_path())?), mortality)?;
        write_population_csv(BufWriter::new(File::create(source.population_path())?), population)?;
        Ok(source)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mortality_path(&self) -> PathBuf {
        self.dir.join(MORTALITY_FILE)
    }

    pub fn population_path(&self) -> PathBuf {
        self.dir.join(POPULATION_FILE)
    }
}

impl RawDataSource for CsvDirectorySource {
    fn describe(&self) -> String {
        format!("csv directory {}", self.dir.display())
    }

    fn mortality(&self, regions: &[Region], ages: &[AgeBand]) -> Result<MortalityTable, MortalityError> {
        let path = self.mortality_path();
        let table = load_mortality_csv(&path)?.into_table(MORTALITY_FILE);
        Ok(table.restricted_to(regions, ages))
    }

    fn population(&self, regions: &[Region], ages: &[AgeBand]) -> Result<PopulationTable, MortalityError> {
        let path = self.population_path();
        if !path.is_file() {
            log::warn!("{} not found; population will be empty", path.display());
            return Ok(PopulationTable::default());
        }
        let table = load_population_csv(&path)?.into_table(POPULATION_FILE);
        Ok(table.restricted_to(regions, ages))
    }
}

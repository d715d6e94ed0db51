//! Snapshot codec: how tables are stored in the cache.
//!
//! Snapshots are plain CSV with one record per row, using the canonical
//! spellings (`2020-W05`, `Y35-39`):
//!
//! - mortality: `period,geo,age,deaths`
//! - population: `year,geo,age,population`

use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{MortalityRecord, MortalityTable, PopulationRecord, PopulationTable};
use crate::error::MortalityError;

/// A table that can be written to and restored from a snapshot.
pub trait Snapshot: Sized {
    fn write_snapshot<W: Write>(&self, writer: W) -> Result<(), MortalityError>;
    fn read_snapshot<R: Read>(reader: R) -> Result<Self, MortalityError>;
}

impl Snapshot for MortalityTable {
    fn write_snapshot<W: Write>(&self, writer: W) -> Result<(), MortalityError> {
        write_records(writer, self.records())
    }

    fn read_snapshot<R: Read>(reader: R) -> Result<Self, MortalityError> {
        read_records::<R, MortalityRecord>(reader).map(MortalityTable::new)
    }
}

impl Snapshot for PopulationTable {
    fn write_snapshot<W: Write>(&self, writer: W) -> Result<(), MortalityError> {
        write_records(writer, self.records())
    }

    fn read_snapshot<R: Read>(reader: R) -> Result<Self, MortalityError> {
        read_records::<R, PopulationRecord>(reader).map(PopulationTable::new)
    }
}

fn write_records<W: Write, T: Serialize>(writer: W, records: &[T]) -> Result<(), MortalityError> {
    let mut out = csv::Writer::from_writer(writer);
    for record in records {
        out.serialize(record)?;
    }
    out.flush()?;
    Ok(())
}

fn read_records<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<T>, MortalityError> {
    let mut reader = csv::Reader::from_reader(reader);
    reader
        .deserialize()
        .map(|row| row.map_err(MortalityError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgeBand, Region, Week};

    #[test]
    fn mortality_snapshot_layout() {
        let table = MortalityTable::new(vec![MortalityRecord {
            week: Week::from_iso(2015, 7).unwrap(),
            region: Region::new("AL"),
            age: AgeBand::parse("Y10-14").unwrap(),
            deaths: 0.0,
        }]);

        let mut buf = Vec::new();
        table.write_snapshot(&mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text, "period,geo,age,deaths\n2015-W07,AL,Y10-14,0.0\n");

        let back = MortalityTable::read_snapshot(buf.as_slice()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let err = PopulationTable::read_snapshot("year,geo,age,population\nnope,SE,Y_LT5,1\n".as_bytes());
        assert!(err.is_err());
    }
}

//! CSV export of a run
//!
//! One row per region with prices; one column per fuel type present in the
//! run. The file starts with a UTF-8 byte order mark.

use crate::fuel::FuelTag;
use crate::observation::AcquisitionRun;
use crate::output::traits::{OutputResult, SnapshotExporter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const BOM: &[u8] = b"\xEF\xBB\xBF";
const SEP: char = ',';
const BASE_COLUMNS: [&str; 5] = ["region_id", "region_name", "timestamp", "url", "status"];

/// Exports successful observations as comma-separated values
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl SnapshotExporter for CsvExporter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn export(&self, run: &AcquisitionRun, path: &Path) -> OutputResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        write_csv(run, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Writes the CSV rendering of `run` to any writer
pub fn write_csv<W: Write>(run: &AcquisitionRun, mut w: W) -> io::Result<()> {
    let fuels: Vec<FuelTag> = run.fuel_types_present().into_iter().collect();

    w.write_all(BOM)?;

    let header: Vec<String> = BASE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(fuels.iter().map(|f| f.as_str().to_string()))
        .collect();
    write_row(&mut w, &header)?;

    for observation in run.usable() {
        let mut row = vec![
            observation.region_id.to_string(),
            observation.region_name.clone(),
            observation.observed_at.to_rfc3339(),
            observation.source_url.clone(),
            observation.status.to_string(),
        ];
        row.extend(fuels.iter().map(|fuel| {
            observation
                .fuel_prices
                .get(fuel)
                .map(|price| price.to_string())
                .unwrap_or_default()
        }));
        write_row(&mut w, &row)?;
    }

    Ok(())
}

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, "{}", SEP)?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PriceMap;
    use crate::observation::PriceObservation;
    use crate::regions::Region;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn sample_run() -> AcquisitionRun {
        let moscow = PriceObservation::success(
            &Region::new(77, "Москва"),
            "https://example.com/?region=77",
            PriceMap::from([
                (FuelTag::Ai92, Decimal::new(5310, 2)),
                (FuelTag::Ai95, Decimal::new(5735, 2)),
            ]),
        );
        let quoted = PriceObservation::success(
            &Region::new(18, "Удмуртская Республика, \"Ижевск\""),
            "https://example.com/?region=18",
            PriceMap::from([(FuelTag::Diesel, Decimal::new(6680, 2))]),
        );
        let failed = PriceObservation::error(&Region::new(50, "Московская область"), "u", "HTTP 500");
        let now = Utc::now();
        AcquisitionRun::new(vec![moscow, quoted, failed], now, now)
    }

    fn render(run: &AcquisitionRun) -> String {
        let mut out = Vec::new();
        write_csv(run, &mut out).unwrap();
        assert!(out.starts_with(BOM));
        String::from_utf8(out[BOM.len()..].to_vec()).unwrap()
    }

    #[test]
    fn test_header_has_fuel_columns() {
        let csv = render(&sample_run());
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "region_id,region_name,timestamp,url,status,AI-92,AI-95,Diesel");
    }

    #[test]
    fn test_rows_only_for_regions_with_prices() {
        let csv = render(&sample_run());
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("77,Москва,"));
        assert!(rows[0].ends_with(",success,53.10,57.35,"));
        assert!(!csv.contains("Московская область"));
    }

    #[test]
    fn test_quotes_escaped() {
        let csv = render(&sample_run());
        assert!(csv.contains("\"Удмуртская Республика, \"\"Ижевск\"\"\""));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        CsvExporter.export(&sample_run(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(BOM));
    }
}

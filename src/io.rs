//! Reading and writing of delimited irradiance files.
//!
//! Source files carry a two-line metadata preamble, then a header row, then
//! numeric data rows. Parsing uses the `csv` crate record-by-record; the
//! parsed columns are assembled into a single all-`Float64` `DataFrame`,
//! with files appended in list order.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::info;
use polars::prelude::*;

use crate::errors::PipelineError;

/// Number of non-data metadata lines before the header row.
pub const PREAMBLE_LINES: usize = 2;

struct RawFile {
    headers: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

/// Read one or more source files into a single concatenated table.
///
/// The first file fixes the column order. Later files must carry the same
/// column set (`SchemaMismatch` otherwise) but may order columns differently;
/// their rows are appended in list order.
pub fn read_table<P: AsRef<Path>>(paths: &[P]) -> Result<DataFrame, PipelineError> {
    if paths.is_empty() {
        return Err(PipelineError::InvalidConfig(
            "at least one source file is required".to_string(),
        ));
    }

    let first = parse_file(paths[0].as_ref())?;
    let headers = first.headers.clone();
    let mut df = to_frame(&headers, first.columns)?;

    for path in &paths[1..] {
        let path = path.as_ref();
        let mut raw = parse_file(path)?;

        let mut expected = headers.clone();
        let mut found = raw.headers.clone();
        expected.sort();
        found.sort();
        if expected != found {
            return Err(PipelineError::SchemaMismatch {
                path: path.to_path_buf(),
                expected: headers.clone(),
                found: raw.headers,
            });
        }

        // Same column set, possibly different order: realign to the first file.
        let mut columns = Vec::with_capacity(headers.len());
        for name in &headers {
            let idx = raw
                .headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PipelineError::SchemaMismatch {
                    path: path.to_path_buf(),
                    expected: headers.clone(),
                    found: raw.headers.clone(),
                })?;
            columns.push(std::mem::take(&mut raw.columns[idx]));
        }
        let next = to_frame(&headers, columns)?;
        df = df.vstack(&next)?;
    }

    info!(
        "read {} file(s) into a {} x {} table",
        paths.len(),
        df.height(),
        df.width()
    );
    Ok(df)
}

fn parse_file(path: &Path) -> Result<RawFile, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Preamble lines need not match the data field count.
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut record = csv::StringRecord::new();
    for i in 0..PREAMBLE_LINES {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => {
                return Err(PipelineError::MalformedSource {
                    path: path.to_path_buf(),
                    reason: format!("file ends inside the {}-line preamble (line {})", PREAMBLE_LINES, i + 1),
                });
            }
            Err(e) => {
                return Err(PipelineError::Csv {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }
    }

    let has_header = reader.read_record(&mut record).map_err(|e| PipelineError::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;
    if !has_header {
        return Err(PipelineError::MalformedSource {
            path: path.to_path_buf(),
            reason: "file has no header row after the preamble".to_string(),
        });
    }
    let headers: Vec<String> = record.iter().map(|h| h.trim().to_string()).collect();

    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); headers.len()];
    let mut row = 0usize;
    while reader.read_record(&mut record).map_err(|e| PipelineError::Csv {
        path: path.to_path_buf(),
        source: e,
    })? {
        row += 1;
        if record.len() != headers.len() {
            return Err(PipelineError::MalformedSource {
                path: path.to_path_buf(),
                reason: format!(
                    "data row {} has {} fields, header has {}",
                    row,
                    record.len(),
                    headers.len()
                ),
            });
        }
        for (j, field) in record.iter().enumerate() {
            let field = field.trim();
            if field.is_empty() {
                columns[j].push(None);
            } else {
                let value = field.parse::<f64>().map_err(|_| PipelineError::InvalidNumber {
                    path: path.to_path_buf(),
                    row,
                    column: headers[j].clone(),
                    value: field.to_string(),
                })?;
                columns[j].push(Some(value));
            }
        }
    }

    Ok(RawFile { headers, columns })
}

fn to_frame(headers: &[String], columns: Vec<Vec<Option<f64>>>) -> Result<DataFrame, PipelineError> {
    let series: Vec<Series> = headers
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name.as_str(), values))
        .collect();
    Ok(DataFrame::new(series)?)
}

/// Write a table as delimited text: header row then data rows, no preamble.
///
/// Numeric values round-trip losslessly (shortest `f64` representation);
/// nulls encode as empty fields.
pub fn write_table(df: &DataFrame, path: &Path) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(df.get_column_names())
        .map_err(|e| PipelineError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

    let columns = df
        .get_columns()
        .iter()
        .map(|s| s.f64())
        .collect::<PolarsResult<Vec<_>>>()?;
    for i in 0..df.height() {
        let record: Vec<String> = columns
            .iter()
            .map(|ca| ca.get(i).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        writer.write_record(&record).map_err(|e| PipelineError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    writer.flush().map_err(|e| PipelineError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("wrote {} x {} table to {}", df.height(), df.width(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    const PREAMBLE: &str = "Source,NSRDB\nLocation ID,105130,Lat,36.17\n";

    #[test]
    fn concatenates_files_in_list_then_row_order() {
        let dir = TempDir::new().unwrap();
        let a = fixture(
            &dir,
            "2016.csv",
            &format!("{PREAMBLE}Year,Month,Day,GHI\n2016,1,1,0\n2016,1,2,12\n2016,1,3,34\n"),
        );
        let b = fixture(
            &dir,
            "2017.csv",
            &format!("{PREAMBLE}Year,Month,Day,GHI\n2017,1,1,56\n2017,1,2,78\n"),
        );

        let df = read_table(&[a, b]).unwrap();
        assert_eq!(df.height(), 5);
        assert_eq!(df.width(), 4);

        let ghi: Vec<Option<f64>> = df.column("GHI").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(
            ghi,
            vec![Some(0.0), Some(12.0), Some(34.0), Some(56.0), Some(78.0)]
        );
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_table(&[dir.path().join("nope.csv")]).unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound { .. }));
    }

    #[test]
    fn differing_column_set_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let a = fixture(
            &dir,
            "a.csv",
            &format!("{PREAMBLE}Year,GHI\n2016,0\n"),
        );
        let b = fixture(
            &dir,
            "b.csv",
            &format!("{PREAMBLE}Year,DNI\n2017,0\n"),
        );
        let err = read_table(&[a, b]).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn later_files_may_reorder_columns() {
        let dir = TempDir::new().unwrap();
        let a = fixture(
            &dir,
            "a.csv",
            &format!("{PREAMBLE}Year,GHI\n2016,11\n"),
        );
        let b = fixture(
            &dir,
            "b.csv",
            &format!("{PREAMBLE}GHI,Year\n22,2017\n"),
        );

        let df = read_table(&[a, b]).unwrap();
        let years: Vec<Option<f64>> = df.column("Year").unwrap().f64().unwrap().into_iter().collect();
        let ghi: Vec<Option<f64>> = df.column("GHI").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(years, vec![Some(2016.0), Some(2017.0)]);
        assert_eq!(ghi, vec![Some(11.0), Some(22.0)]);
    }

    #[test]
    fn empty_field_becomes_null() {
        let dir = TempDir::new().unwrap();
        let a = fixture(
            &dir,
            "a.csv",
            &format!("{PREAMBLE}Year,GHI\n2016,\n"),
        );
        let df = read_table(&[a]).unwrap();
        let ghi: Vec<Option<f64>> = df.column("GHI").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(ghi, vec![None]);
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let dir = TempDir::new().unwrap();
        let a = fixture(
            &dir,
            "a.csv",
            &format!("{PREAMBLE}Year,GHI\n2016,cloudy\n"),
        );
        let err = read_table(&[a]).unwrap_err();
        match err {
            PipelineError::InvalidNumber { row, column, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "GHI");
                assert_eq!(value, "cloudy");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn truncated_preamble_is_malformed() {
        let dir = TempDir::new().unwrap();
        let a = fixture(&dir, "a.csv", "Source,NSRDB\n");
        let err = read_table(&[a]).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedSource { .. }));
    }

    #[test]
    fn ragged_data_row_is_malformed() {
        let dir = TempDir::new().unwrap();
        let a = fixture(
            &dir,
            "a.csv",
            &format!("{PREAMBLE}Year,GHI\n2016,1,99\n"),
        );
        let err = read_table(&[a]).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedSource { .. }));
    }

    #[test]
    fn write_round_trips_numeric_values() {
        let dir = TempDir::new().unwrap();
        let df = df! {
            "Hour" => [0.0f64, 13.5, 23.5],
            "GHI" => [Some(0.1f64), None, Some(812.25)],
        }
        .unwrap();

        let path = dir.path().join("out.csv");
        write_table(&df, &path).unwrap();

        let body = fs::read_to_string(&path).unwrap();
        let mut reader = csv::Reader::from_reader(body.as_bytes());
        let mut values: Vec<Option<f64>> = Vec::new();
        for record in reader.records() {
            let record = record.unwrap();
            for field in record.iter() {
                values.push(if field.is_empty() {
                    None
                } else {
                    Some(field.parse().unwrap())
                });
            }
        }
        assert_eq!(
            values,
            vec![
                Some(0.0),
                Some(0.1),
                Some(13.5),
                None,
                Some(23.5),
                Some(812.25)
            ]
        );
    }
}

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use webproj::{parse_number, CoordinateTuple, TransformService};

use super::{build_service, ServiceOptions};

/// Input column names for each coordinate component.
pub struct Columns {
    pub x: String,
    pub y: String,
    pub z: Option<String>,
    pub t: Option<String>,
}

/// Resolved column positions in the CSV header.
struct ColumnIndices {
    x: usize,
    y: usize,
    z: Option<usize>,
    t: Option<usize>,
}

pub fn run(
    options: &ServiceOptions,
    input: PathBuf,
    output: Option<PathBuf>,
    src: &str,
    dst: &str,
    columns: Columns,
) -> Result<()> {
    let service = build_service(options)?;

    // Fail early on unknown or incompatible CRSs instead of once per row
    service
        .transformer(src, dst)
        .with_context(|| format!("Cannot transform from {src} to {dst}"))?;

    let output_path = match output {
        Some(path) => path,
        None => default_output_path(&input, dst)?,
    };

    let file = File::open(&input).context("Failed to open input file")?;
    let output_file = File::create(&output_path).context("Failed to create output file")?;

    let (rows, failed) = process_csv(
        &service,
        BufReader::new(file),
        BufWriter::new(output_file),
        src,
        dst,
        &columns,
    )?;

    println!("Output written to: {}", output_path.display());
    if failed > 0 {
        println!("{} of {} rows could not be transformed", failed, rows);
    }
    Ok(())
}

fn default_output_path(input: &Path, dst: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .with_context(|| format!("Invalid input path: {}", input.display()))?
        .to_string_lossy();
    let suffix = dst.replace([':', '+'], "_");
    Ok(input.with_file_name(format!("{}_{}.csv", stem, suffix)))
}

/// Transform every record, appending `v1_out`..`v4_out` and `error` columns.
///
/// Returns the number of rows and the number of failed rows.
fn process_csv<R: Read, W: Write>(
    service: &TransformService,
    input: R,
    output: W,
    src: &str,
    dst: &str,
    columns: &Columns,
) -> Result<(u64, u64)> {
    let mut reader = csv::Reader::from_reader(input);

    // Find column indices
    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Column '{}' not found in CSV", name))
    };
    let indices = ColumnIndices {
        x: position(&columns.x)?,
        y: position(&columns.y)?,
        z: columns.z.as_deref().map(position).transpose()?,
        t: columns.t.as_deref().map(position).transpose()?,
    };

    // Collect records for progress bar
    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;
    let total = records.len() as u64;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut writer = csv::Writer::from_writer(output);

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.extend(["v1_out", "v2_out", "v3_out", "v4_out", "error"]);
    writer.write_record(&new_headers)?;

    let mut failed = 0;
    for record in &records {
        let outcome = read_coordinate(record, &indices)
            .and_then(|coord| service.transform(src, dst, coord).map_err(|e| e.to_string()));

        let extra = match outcome {
            Ok(result) => [
                result.v1.to_string(),
                result.v2.to_string(),
                result.v3.map(|v| v.to_string()).unwrap_or_default(),
                result.v4.map(|v| v.to_string()).unwrap_or_default(),
                String::new(),
            ],
            Err(message) => {
                failed += 1;
                [String::new(), String::new(), String::new(), String::new(), message]
            }
        };

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.extend(extra.iter().map(String::as_str));
        writer.write_record(&new_record)?;

        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;

    Ok((total, failed))
}

fn read_coordinate(record: &csv::StringRecord, indices: &ColumnIndices) -> Result<CoordinateTuple, String> {
    let field = |idx: usize| -> Result<f64, String> {
        let raw = record.get(idx).unwrap_or("").trim();
        parse_number(raw).ok_or_else(|| format!("invalid number '{}'", raw))
    };

    let x = field(indices.x)?;
    let y = field(indices.y)?;
    let z = indices.z.map(field).transpose()?;
    let t = indices.t.map(field).transpose()?;

    Ok(match (z, t) {
        (Some(z), Some(t)) => CoordinateTuple::new_4d(x, y, z, t),
        (Some(z), None) => CoordinateTuple::new_3d(x, y, z),
        _ => CoordinateTuple::new_2d(x, y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(z: Option<&str>) -> Columns {
        Columns {
            x: "lat".to_string(),
            y: "lon".to_string(),
            z: z.map(str::to_string),
            t: None,
        }
    }

    fn run_csv(input: &str, columns: &Columns) -> (String, u64) {
        let service = TransformService::new().unwrap();
        let mut output = Vec::new();
        let (_, failed) = process_csv(
            &service,
            input.as_bytes(),
            &mut output,
            "EPSG:4258",
            "EPSG:25832",
            columns,
        )
        .unwrap();
        (String::from_utf8(output).unwrap(), failed)
    }

    #[test]
    fn test_appends_output_columns() {
        let (output, failed) = run_csv("name,lat,lon\na,56,12\n", &columns(None));
        assert_eq!(failed, 0);

        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,lat,lon,v1_out,v2_out,v3_out,v4_out,error"
        );
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(&row[..3], &["a", "56", "12"]);
        let v1: f64 = row[3].parse().unwrap();
        assert!((v1 - 687071.4391094431).abs() < 1e-6);
        assert_eq!(row[5], "");
        assert_eq!(row[7], "");
    }

    #[test]
    fn test_height_column() {
        let (output, _) = run_csv("lat,lon,h\n56,12,30\n", &columns(Some("h")));
        let row: Vec<&str> = output.lines().nth(1).unwrap().split(',').collect();
        let v3: f64 = row[5].parse().unwrap();
        assert!((v3 - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_bad_rows_are_reported() {
        let (output, failed) = run_csv("lat,lon\nabc,12\n95,12\n56,12\n", &columns(None));
        assert_eq!(failed, 2);

        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[1].ends_with("invalid number 'abc'"));
        assert!(lines[2].contains("outside area of use"));
        assert!(lines[3].ends_with(','));
    }

    #[test]
    fn test_missing_column() {
        let service = TransformService::new().unwrap();
        let err = process_csv(
            &service,
            "x,y\n1,2\n".as_bytes(),
            Vec::new(),
            "EPSG:4258",
            "EPSG:25832",
            &columns(None),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Column 'lat' not found"));
    }

    #[test]
    fn test_run_writes_default_output_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("points.csv");
        std::fs::write(&input, "lat,lon\n56,12\n95,12\n").unwrap();

        run(
            &ServiceOptions::default(),
            input,
            None,
            "EPSG:4258",
            "EPSG:25832",
            columns(None),
        )
        .unwrap();

        let output = std::fs::read_to_string(dir.path().join("points_EPSG_25832.csv")).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("56,12,687071.43"));
        assert!(lines[2].contains("outside area of use"));
    }

    #[test]
    fn test_run_rejects_incompatible_pair() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("points.csv");
        std::fs::write(&input, "lat,lon\n56,12\n").unwrap();
        let output = dir.path().join("out.csv");

        let err = run(
            &ServiceOptions::default(),
            input,
            Some(output.clone()),
            "EPSG:4258",
            "EPSG:4909",
            columns(None),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Cannot transform from EPSG:4258 to EPSG:4909"));
        assert!(!output.exists());
    }

    #[test]
    fn test_default_output_path() {
        let path = default_output_path(Path::new("/tmp/points.csv"), "EPSG:23032+5733").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/points_EPSG_23032_5733.csv"));
    }
}

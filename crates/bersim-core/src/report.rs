//! Results Report — output path resolution and CSV records
//!
//! The configured output path may be a literal file or a directory: an
//! existing directory (or anything ending in a path separator) receives an
//! auto-composed file name `<coder>_<modem>_<channel>.csv` built from
//! lower-cased, filesystem-safe tokens. Missing directories are created on
//! the way. Records are fixed-point with six fractional digits.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::simulation::BerResult;

/// Lower-cased filesystem-safe token: alphanumerics kept, `.`/`-`/`_`
/// kept, anything else replaced by `_`.
fn slug(s: &str) -> String {
    s.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else if ch == '.' || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Turn the configured output path into a concrete file path, creating
/// directories as needed.
pub fn resolve_output_path(
    outfile: &str,
    coder: &str,
    modem: &str,
    channel: &str,
) -> Result<PathBuf> {
    let path = Path::new(outfile);
    let ends_with_sep = outfile.ends_with('/') || outfile.ends_with('\\');

    if ends_with_sep || path.is_dir() {
        fs::create_dir_all(path).map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        })?;
        let name = format!("{}_{}_{}.csv", slug(coder), slug(modem), slug(channel));
        return Ok(path.join(name));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| Error::Output {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(path.to_path_buf())
}

/// Buffered CSV writer for sweep results.
pub struct CsvReport {
    path: PathBuf,
    out: BufWriter<File>,
}

impl CsvReport {
    /// Create the file and write the header line.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        })?;
        let mut report = Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
        };
        writeln!(report.out, "snr_db,ber,num_bits,num_errors,ci_low,ci_high")
            .map_err(|e| report.io_err(e))?;
        Ok(report)
    }

    /// Append one record in sweep order.
    pub fn write_point(&mut self, snr_db: f64, r: &BerResult) -> Result<()> {
        writeln!(
            self.out,
            "{:.6},{:.6},{},{},{:.6},{:.6}",
            snr_db, r.ber, r.bits, r.errs, r.ci_lo, r.ci_hi
        )
        .map_err(|e| self.io_err(e))
    }

    /// Flush and close the report.
    pub fn finish(mut self) -> Result<()> {
        self.out.flush().map_err(|e| self.io_err(e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> Error {
        Error::Output {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bersim_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Conv K7/R12"), "conv_k7_r12");
        assert_eq!(slug("ask4_gray"), "ask4_gray");
        assert_eq!(slug("a.b-c_d"), "a.b-c_d");
        assert_eq!(slug("AWGN!"), "awgn_");
    }

    #[test]
    fn test_trailing_separator_composes_name() {
        let dir = temp_dir("sep");
        let target = format!("{}/", dir.display());
        let path = resolve_output_path(&target, "conv_k7_r12", "ask2", "awgn").unwrap();
        assert!(dir.is_dir());
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "conv_k7_r12_ask2_awgn.csv"
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_existing_dir_composes_name() {
        let dir = temp_dir("dir");
        fs::create_dir_all(&dir).unwrap();
        let target = dir.display().to_string();
        let path = resolve_output_path(&target, "Uncoded", "ASK4 Gray", "AWGN").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "uncoded_ask4_gray_awgn.csv"
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_literal_path_creates_parent() {
        let dir = temp_dir("literal");
        let target = dir.join("sub").join("out.csv");
        let path = resolve_output_path(target.to_str().unwrap(), "u", "m", "c").unwrap();
        assert_eq!(path, target);
        assert!(dir.join("sub").is_dir());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_csv_contents() {
        let dir = temp_dir("csv");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.csv");

        let mut report = CsvReport::create(&path).unwrap();
        report
            .write_point(
                1.0,
                &BerResult {
                    ber: 0.0786,
                    bits: 100_000,
                    errs: 7_860,
                    ci_lo: 0.077,
                    ci_hi: 0.081,
                },
            )
            .unwrap();
        report.finish().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "snr_db,ber,num_bits,num_errors,ci_low,ci_high"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1.000000,0.078600,100000,7860,0.077000,0.081000"
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_in_missing_dir_fails() {
        let bogus = Path::new("/nonexistent_bersim_dir/out.csv");
        assert!(matches!(
            CsvReport::create(bogus),
            Err(Error::Output { .. })
        ));
    }
}

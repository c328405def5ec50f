//! Result rows and the tab-separated writer.
//!
//! Column order is fixed per table; downstream spreadsheets depend on it.
//! Every table starts with the same bacterium columns:
//!
//! ```text
//! Image name | Bacterium ID | Bacterium area (µm2) | Bacterium length (µm) | ...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::BactError;
use crate::geom::Label;
use crate::relations::Channel;

/// Columns shared by every table.
#[derive(Clone, Debug, PartialEq)]
pub struct BacteriumInfo {
    pub image: String,
    pub label: Label,
    /// Physical area (volume for multi-slice labels).
    pub area: f64,
    /// Feret length in physical units.
    pub length: f64,
}

impl BacteriumInfo {
    fn header(unit: &str) -> Vec<String> {
        vec![
            "Image name".to_string(),
            "Bacterium ID".to_string(),
            format!("Bacterium area ({}2)", unit),
            format!("Bacterium length ({})", unit),
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.image.clone(),
            self.label.to_string(),
            self.area.to_string(),
            self.length.to_string(),
        ]
    }
}

/// Something the TSV writer can emit.
pub trait ResultRow {
    fn fields(&self) -> Vec<String>;
}

/// Mean channel intensity inside a bacterium and on its border shell.
#[derive(Clone, Debug, PartialEq)]
pub struct BorderRow {
    pub bacterium: BacteriumInfo,
    pub interior_mean: f64,
    pub border_mean: f64,
}

impl BorderRow {
    pub fn header(unit: &str) -> Vec<String> {
        let mut h = BacteriumInfo::header(unit);
        h.push("DNA mean intensity inside bacterium".to_string());
        h.push("DNA mean intensity on bacterium edges".to_string());
        h
    }
}

impl ResultRow for BorderRow {
    fn fields(&self) -> Vec<String> {
        let mut f = self.bacterium.fields();
        f.push(self.interior_mean.to_string());
        f.push(self.border_mean.to_string());
        f
    }
}

/// Foci counts of one bacterium, one per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FociCounts {
    pub first: usize,
    pub second: usize,
}

/// One focus of a [`DistanceRow`].
#[derive(Clone, Debug, PartialEq)]
pub struct FocusEntry {
    pub channel: Channel,
    pub focus: Label,
    pub pole_distance: f64,
    /// Nearest first.
    pub distances: Vec<f64>,
}

/// Distances of one focus, or a blank placeholder for a bacterium without foci.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceRow {
    pub bacterium: BacteriumInfo,
    pub counts: FociCounts,
    pub focus: Option<FocusEntry>,
}

impl DistanceRow {
    pub fn header(unit: &str, max_reported: usize) -> Vec<String> {
        let mut h = BacteriumInfo::header(unit);
        h.push("Nb foci ch1".to_string());
        h.push("Nb foci ch2".to_string());
        h.push("Focus channel".to_string());
        h.push("Focus ID".to_string());
        h.push("Focus-bacterium pole distance".to_string());
        for i in 1..=max_reported {
            h.push(format!("Focus-focus {} distance", i));
        }
        h
    }
}

impl ResultRow for DistanceRow {
    fn fields(&self) -> Vec<String> {
        let mut f = self.bacterium.fields();
        f.push(self.counts.first.to_string());
        f.push(self.counts.second.to_string());
        match &self.focus {
            Some(entry) => {
                f.push(entry.channel.to_string());
                f.push(entry.focus.to_string());
                f.push(entry.pole_distance.to_string());
                f.extend(entry.distances.iter().map(f64::to_string));
            }
            None => f.extend(std::iter::repeat(String::new()).take(3)),
        }
        f
    }
}

/// A focus of a colocalizing pair with its pole distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairedFocus {
    pub label: Label,
    pub pole_distance: f64,
}

/// One colocalization event, or the single "No" row of a bacterium without any.
#[derive(Clone, Debug, PartialEq)]
pub struct ColocRow {
    pub bacterium: BacteriumInfo,
    pub counts: FociCounts,
    pub pair: Option<(PairedFocus, PairedFocus)>,
}

impl ColocRow {
    pub fn header(unit: &str) -> Vec<String> {
        let mut h = BacteriumInfo::header(unit);
        h.push("Nb foci ch1".to_string());
        h.push("Nb foci ch2".to_string());
        h.push("Colocalization?".to_string());
        h.push("Colocalizing focus ch1 ID".to_string());
        h.push("Focus ch1-bacterium pole distance".to_string());
        h.push("Colocalizing focus ch2 ID".to_string());
        h.push("Focus ch2-bacterium pole distance".to_string());
        h
    }

    pub fn is_event(&self) -> bool {
        self.pair.is_some()
    }
}

impl ResultRow for ColocRow {
    fn fields(&self) -> Vec<String> {
        let mut f = self.bacterium.fields();
        f.push(self.counts.first.to_string());
        f.push(self.counts.second.to_string());
        match &self.pair {
            Some((a, b)) => {
                f.push("Yes".to_string());
                f.push(a.label.to_string());
                f.push(a.pole_distance.to_string());
                f.push(b.label.to_string());
                f.push(b.pole_distance.to_string());
            }
            None => f.push("No".to_string()),
        }
        f
    }
}

/// Tab-separated table written row by row.
///
/// Records may be shorter than the header (distance rows with fewer
/// partners, placeholder rows).
pub struct TsvWriter<W: Write> {
    inner: csv::Writer<W>,
    path: PathBuf,
}

impl TsvWriter<BufWriter<File>> {
    /// Creates (truncates) `path` and writes the header.
    pub fn create(path: &Path, header: &[String]) -> Result<Self, BactError> {
        let file = File::create(path).map_err(BactError::Io)?;
        Self::from_writer(BufWriter::new(file), path, header)
    }
}

impl<W: Write> TsvWriter<W> {
    /// Wraps any writer; `path` only labels errors.
    pub fn from_writer(writer: W, path: &Path, header: &[String]) -> Result<Self, BactError> {
        let inner = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_writer(writer);
        let mut out = Self {
            inner,
            path: path.to_path_buf(),
        };
        out.write_record(header)?;
        Ok(out)
    }

    fn write_record(&mut self, fields: &[String]) -> Result<(), BactError> {
        self.inner
            .write_record(fields)
            .map_err(|source| BactError::ReportWrite {
                path: self.path.clone(),
                source,
            })
    }

    pub fn write_row(&mut self, row: &impl ResultRow) -> Result<(), BactError> {
        self.write_record(&row.fields())
    }

    pub fn write_rows<'a, R: ResultRow + 'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a R>,
    ) -> Result<(), BactError> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(self) -> Result<W, BactError> {
        let mut writer = self
            .inner
            .into_inner()
            .map_err(|e| BactError::Io(e.into_error()))?;
        writer.flush().map_err(BactError::Io)?;
        Ok(writer)
    }
}

/// Renders rows to a string, header first.
pub fn to_tsv_string<R: ResultRow>(header: &[String], rows: &[R]) -> Result<String, BactError> {
    let mut writer = TsvWriter::from_writer(Vec::new(), Path::new("<memory>"), header)?;
    writer.write_rows(rows)?;
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|e| BactError::UnsupportedFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> BacteriumInfo {
        BacteriumInfo {
            image: "img".to_string(),
            label: Label(3),
            area: 1.5,
            length: 2.25,
        }
    }

    #[test]
    fn test_border_table() {
        let row = BorderRow {
            bacterium: info(),
            interior_mean: 10.0,
            border_mean: 0.0,
        };
        let out = to_tsv_string(&BorderRow::header("µm"), &[row]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "Image name\tBacterium ID\tBacterium area (µm2)\tBacterium length (µm)\t\
             DNA mean intensity inside bacterium\tDNA mean intensity on bacterium edges"
        );
        assert_eq!(lines[1], "img\t3\t1.5\t2.25\t10\t0");
    }

    #[test]
    fn test_distance_header_width() {
        let h = DistanceRow::header("µm", 6);
        assert_eq!(h.len(), 4 + 5 + 6);
        assert_eq!(h.last().unwrap(), "Focus-focus 6 distance");
    }

    #[test]
    fn test_distance_rows() {
        let with_focus = DistanceRow {
            bacterium: info(),
            counts: FociCounts { first: 1, second: 0 },
            focus: Some(FocusEntry {
                channel: Channel::First,
                focus: Label(1),
                pole_distance: 0.5,
                distances: vec![],
            }),
        };
        let blank = DistanceRow {
            bacterium: info(),
            counts: FociCounts::default(),
            focus: None,
        };
        assert_eq!(
            with_focus.fields()[4..],
            ["1", "0", "1", "1", "0.5"].map(String::from)
        );
        assert_eq!(blank.fields()[4..], ["0", "0", "", "", ""].map(String::from));
    }

    #[test]
    fn test_coloc_rows() {
        let no = ColocRow {
            bacterium: info(),
            counts: FociCounts { first: 1, second: 1 },
            pair: None,
        };
        let yes = ColocRow {
            pair: Some((
                PairedFocus {
                    label: Label(1),
                    pole_distance: 0.25,
                },
                PairedFocus {
                    label: Label(2),
                    pole_distance: 0.75,
                },
            )),
            ..no.clone()
        };
        let out = to_tsv_string(&ColocRow::header("µm"), &[no, yes]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "img\t3\t1.5\t2.25\t1\t1\tNo");
        assert_eq!(lines[2], "img\t3\t1.5\t2.25\t1\t1\tYes\t1\t0.25\t2\t0.75");
    }
}

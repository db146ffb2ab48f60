//! Reading and writing rasters in the ESRI ASCII grid format.
//!
//! Land cover rasters are held as grids of optional class codes, with nodata cells as `None`.
//! Carbon and value rasters are grids of `f64`, with nodata cells as NaN.
use crate::error::ModelError;
use crate::input::input_err_msg;
use crate::lulc::{LulcClassMap, LulcCode};
use anyhow::{Context, Result, bail, ensure};
use float_cmp::approx_eq;
use ndarray::{Array2, Zip};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// The nodata value used when writing floating-point rasters
pub const FLOAT_NODATA: f64 = -9999.0;

/// The position and size of a raster grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Number of columns
    pub ncols: usize,
    /// Number of rows
    pub nrows: usize,
    /// X coordinate of the lower-left corner
    pub xllcorner: f64,
    /// Y coordinate of the lower-left corner
    pub yllcorner: f64,
    /// Width and height of a cell
    pub cellsize: f64,
}

impl GridGeometry {
    /// The shape of the grid as (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Whether two grids cover the same cells
    pub fn matches(&self, other: &GridGeometry) -> bool {
        self.ncols == other.ncols
            && self.nrows == other.nrows
            && approx_eq!(f64, self.xllcorner, other.xllcorner, epsilon = 1e-9)
            && approx_eq!(f64, self.yllcorner, other.yllcorner, epsilon = 1e-9)
            && approx_eq!(f64, self.cellsize, other.cellsize, epsilon = 1e-9)
    }
}

/// A land cover raster
#[derive(Debug, Clone, PartialEq)]
pub struct LulcRaster {
    /// Grid position and size
    pub geometry: GridGeometry,
    /// The value used to mark nodata cells in the file, if any
    pub nodata: Option<f64>,
    /// Class code of each cell, or `None` for nodata
    pub codes: Array2<Option<LulcCode>>,
}

impl LulcRaster {
    /// Check that every code in the raster is a defined class
    pub fn check_codes(&self, lulc_classes: &LulcClassMap) -> Result<()> {
        for code in self.codes.iter().flatten() {
            ensure!(
                lulc_classes.contains_code(*code),
                ModelError::Data(format!(
                    "Raster contains LULC code {code}, which is not in the LULC lookup table"
                ))
            );
        }

        Ok(())
    }

    /// Check that another raster has the same grid and nodata value as this one
    pub fn check_aligned(&self, other: &LulcRaster) -> Result<()> {
        ensure!(
            self.geometry.matches(&other.geometry),
            ModelError::Validation(
                "LULC rasters must all have the same extent and resolution".into()
            )
        );
        let same_nodata = match (self.nodata, other.nodata) {
            (Some(a), Some(b)) => approx_eq!(f64, a, b),
            (None, None) => true,
            _ => false,
        };
        ensure!(
            same_nodata,
            ModelError::Validation("LULC rasters must all have the same nodata value".into())
        );

        Ok(())
    }
}

/// The header fields and values of an ASCII grid file
struct AsciiGrid {
    geometry: GridGeometry,
    nodata: Option<f64>,
    values: Vec<f64>,
}

/// Parse the contents of an ASCII grid file
fn parse_ascii_grid(contents: &str) -> Result<AsciiGrid> {
    let mut tokens = contents.split_whitespace().peekable();

    let mut ncols = None;
    let mut nrows = None;
    let mut xll = None;
    let mut yll = None;
    let mut centred = false;
    let mut cellsize = None;
    let mut nodata = None;
    while let Some(key) = tokens.next_if(|tok| tok.starts_with(|c: char| c.is_ascii_alphabetic()))
    {
        let value = tokens
            .next()
            .with_context(|| format!("Missing value for header field {key}"))?;
        let parse = || {
            value
                .parse::<f64>()
                .with_context(|| format!("Invalid value for header field {key}: {value}"))
        };
        match key.to_ascii_lowercase().as_str() {
            "ncols" => ncols = Some(value.parse::<usize>()?),
            "nrows" => nrows = Some(value.parse::<usize>()?),
            "xllcorner" => xll = Some(parse()?),
            "yllcorner" => yll = Some(parse()?),
            "xllcenter" => {
                xll = Some(parse()?);
                centred = true;
            }
            "yllcenter" => {
                yll = Some(parse()?);
                centred = true;
            }
            "cellsize" => cellsize = Some(parse()?),
            "nodata_value" => nodata = Some(parse()?),
            _ => bail!("Unknown header field: {key}"),
        }
    }

    let ncols = ncols.context("Missing header field ncols")?;
    let nrows = nrows.context("Missing header field nrows")?;
    let cellsize = cellsize.context("Missing header field cellsize")?;
    let mut xllcorner = xll.context("Missing header field xllcorner")?;
    let mut yllcorner = yll.context("Missing header field yllcorner")?;
    if centred {
        xllcorner -= cellsize / 2.0;
        yllcorner -= cellsize / 2.0;
    }
    ensure!(ncols > 0 && nrows > 0, "Raster must have at least one cell");
    ensure!(cellsize > 0.0, "cellsize must be greater than zero");

    let values: Vec<f64> = tokens
        .map(|tok| {
            tok.parse::<f64>()
                .with_context(|| format!("Invalid cell value: {tok}"))
        })
        .collect::<Result<_>>()?;
    ensure!(
        values.len() == ncols * nrows,
        "Expected {} cell values but found {}",
        ncols * nrows,
        values.len()
    );

    Ok(AsciiGrid {
        geometry: GridGeometry {
            ncols,
            nrows,
            xllcorner,
            yllcorner,
            cellsize,
        },
        nodata,
        values,
    })
}

/// Whether a cell value marks nodata
fn is_nodata(value: f64, nodata: Option<f64>) -> bool {
    value.is_nan() || nodata.is_some_and(|nodata| approx_eq!(f64, value, nodata))
}

/// Read a land cover raster from an ASCII grid file
pub fn read_lulc_raster(file_path: &Path) -> Result<LulcRaster> {
    let contents = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let grid = parse_ascii_grid(&contents).with_context(|| input_err_msg(file_path))?;

    let codes = grid
        .values
        .iter()
        .map(|&value| {
            if is_nodata(value, grid.nodata) {
                return Ok(None);
            }
            ensure!(
                value.fract() == 0.0
                    && value >= f64::from(LulcCode::MIN)
                    && value <= f64::from(LulcCode::MAX),
                "LULC raster values must be integers, found {value}"
            );
            #[allow(clippy::cast_possible_truncation)]
            Ok(Some(value as LulcCode))
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| input_err_msg(file_path))?;

    Ok(LulcRaster {
        geometry: grid.geometry,
        nodata: grid.nodata,
        codes: Array2::from_shape_vec(grid.geometry.shape(), codes)?,
    })
}

/// Read a floating-point raster from an ASCII grid file, with nodata cells as NaN.
///
/// This is the reader for the rasters written by [`write_float_raster`], for loading results back.
pub fn read_float_raster(file_path: &Path) -> Result<(GridGeometry, Array2<f64>)> {
    let contents = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let grid = parse_ascii_grid(&contents).with_context(|| input_err_msg(file_path))?;
    let values = grid
        .values
        .iter()
        .map(|&value| {
            if is_nodata(value, grid.nodata) {
                f64::NAN
            } else {
                value
            }
        })
        .collect();

    Ok((
        grid.geometry,
        Array2::from_shape_vec(grid.geometry.shape(), values)?,
    ))
}

/// Write a floating-point raster to an ASCII grid file.
///
/// NaN cells are written as [`FLOAT_NODATA`].
pub fn write_float_raster(
    file_path: &Path,
    geometry: &GridGeometry,
    data: &Array2<f64>,
) -> Result<()> {
    ensure!(
        data.dim() == geometry.shape(),
        "Raster data does not match the grid size"
    );

    let mut out = String::new();
    writeln!(out, "ncols {}", geometry.ncols)?;
    writeln!(out, "nrows {}", geometry.nrows)?;
    writeln!(out, "xllcorner {}", geometry.xllcorner)?;
    writeln!(out, "yllcorner {}", geometry.yllcorner)?;
    writeln!(out, "cellsize {}", geometry.cellsize)?;
    writeln!(out, "NODATA_value {FLOAT_NODATA}")?;
    for row in data.rows() {
        let line = row
            .iter()
            .map(|value| {
                if value.is_nan() {
                    FLOAT_NODATA.to_string()
                } else {
                    value.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{line}")?;
    }

    fs::write(file_path, out)
        .with_context(|| format!("Failed to write raster to {}", file_path.display()))
}

/// Set every masked cell of a floating-point raster to NaN
pub fn mask_nodata(values: &mut Array2<f64>, mask: &Array2<bool>) {
    Zip::from(values).and(mask).for_each(|value, &masked| {
        if masked {
            *value = f64::NAN;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixture::lulc_classes;
    use ndarray::array;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const GRID: &str = "ncols 2
nrows 2
xllcorner 100.0
yllcorner 200.0
cellsize 30
NODATA_value -9999
-9999 1
2 3
";

    fn write_grid(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn test_read_lulc_raster() {
        let dir = tempdir().unwrap();
        let path = write_grid(dir.path(), "lulc.asc", GRID);
        let raster = read_lulc_raster(&path).unwrap();
        assert_eq!(raster.geometry.shape(), (2, 2));
        assert_eq!(raster.nodata, Some(-9999.0));
        assert_eq!(raster.codes, array![[None, Some(1)], [Some(2), Some(3)]]);
    }

    #[test]
    fn test_read_lulc_raster_centre_origin() {
        let dir = tempdir().unwrap();
        let contents = GRID
            .replace("xllcorner 100.0", "xllcenter 115.0")
            .replace("yllcorner 200.0", "yllcenter 215.0");
        let path = write_grid(dir.path(), "lulc.asc", &contents);
        let raster = read_lulc_raster(&path).unwrap();
        let expected = read_lulc_raster(&write_grid(dir.path(), "corner.asc", GRID)).unwrap();
        assert!(raster.geometry.matches(&expected.geometry));
    }

    #[rstest]
    #[case("ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n")] // too few values
    #[case("ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1.5\n")] // not an integer
    #[case("ncols 1\nnrows 1\nxllcorner 0\ncellsize 1\n1\n")] // missing field
    #[case("ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nbands 3\n1\n")] // bad field
    fn test_read_lulc_raster_invalid(#[case] contents: &str) {
        let dir = tempdir().unwrap();
        let path = write_grid(dir.path(), "lulc.asc", contents);
        assert!(read_lulc_raster(&path).is_err());
    }

    #[rstest]
    fn test_check_codes(lulc_classes: LulcClassMap) {
        let dir = tempdir().unwrap();
        let raster = read_lulc_raster(&write_grid(dir.path(), "a.asc", GRID)).unwrap();
        raster.check_codes(&lulc_classes).unwrap();

        let raster =
            read_lulc_raster(&write_grid(dir.path(), "b.asc", &GRID.replace("2 3", "2 9")))
                .unwrap();
        let err = raster.check_codes(&lulc_classes).unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Data));
    }

    #[test]
    fn test_check_aligned() {
        let dir = tempdir().unwrap();
        let a = read_lulc_raster(&write_grid(dir.path(), "a.asc", GRID)).unwrap();
        a.check_aligned(&a.clone()).unwrap();

        let other_nodata = GRID.replace("-9999", "-1");
        let b = read_lulc_raster(&write_grid(dir.path(), "b.asc", &other_nodata)).unwrap();
        let err = a.check_aligned(&b).unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Validation));

        let shifted = GRID.replace("xllcorner 100.0", "xllcorner 130.0");
        let c = read_lulc_raster(&write_grid(dir.path(), "c.asc", &shifted)).unwrap();
        assert!(a.check_aligned(&c).is_err());
    }

    #[test]
    fn test_float_raster_write_read() {
        let dir = tempdir().unwrap();
        let geometry = GridGeometry {
            ncols: 2,
            nrows: 1,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 10.0,
        };
        let path = dir.path().join("out.asc");
        write_float_raster(&path, &geometry, &array![[f64::NAN, 10.5]]).unwrap();

        let (read_geometry, data) = read_float_raster(&path).unwrap();
        assert_eq!(read_geometry, geometry);
        assert!(data[[0, 0]].is_nan());
        assert_eq!(data[[0, 1]], 10.5);
    }

    #[test]
    fn test_write_float_raster_wrong_shape() {
        let dir = tempdir().unwrap();
        let geometry = GridGeometry {
            ncols: 3,
            nrows: 1,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 10.0,
        };
        assert!(
            write_float_raster(&dir.path().join("out.asc"), &geometry, &array![[1.0]]).is_err()
        );
    }
}

//! NTv2 grid shift file loading and datum shifting.
//!
//! A grid shift file is an overview header followed by sub-grids, each a
//! sub-grid header and its node records:
//!
//! | Section          | Size (bytes)           |
//! |------------------|------------------------|
//! | overview header  | 176 (11 records)       |
//! | sub-grid header  | 176 (11 records)       |
//! | node records     | 16 × node count        |
//! | ...              | repeated `NUM_FILE` times |
//! | `END` record     | 16                     |
//!
//! Sub-grids whose parent is `NONE` are roots; every other sub-grid refines
//! the sub-grid named as its parent.

use crate::decode::{ByteOrder, RecordReader, HEADER_SIZE, NODE_SIZE, RECORD_SIZE};
use crate::options::{LoadOptions, StorageMode};
use crate::shift::GridShift;
use crate::source::SharedSource;
use crate::subgrid::SubGrid;
use crate::{GridError, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace, warn};

/// Parent name marking a root sub-grid.
const ROOT_PARENT: &str = "NONE";

/// Number of records in a valid overview header.
const OVERVIEW_RECORDS: i32 = 11;

/// Forward iterations used to invert a shift.
const REVERSE_ITERATIONS: usize = 4;

/// The file-level header of an NTv2 grid shift file.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewHeader {
    /// Byte order detected from the first record.
    pub byte_order: ByteOrder,
    /// Number of records in the overview header.
    pub overview_records: i32,
    /// Number of records in each sub-grid header.
    pub sub_grid_records: i32,
    /// Number of sub-grids in the file.
    pub sub_grid_count: usize,
    /// Shift units, normally `SECONDS`.
    pub shift_type: String,
    /// Format version, e.g. `NTv2.0`.
    pub version: String,
    /// Name of the source datum.
    pub from_system: String,
    /// Name of the target datum.
    pub to_system: String,
    /// Source ellipsoid semi-major axis, in metres.
    pub from_semi_major_axis: f64,
    /// Source ellipsoid semi-minor axis, in metres.
    pub from_semi_minor_axis: f64,
    /// Target ellipsoid semi-major axis, in metres.
    pub to_semi_major_axis: f64,
    /// Target ellipsoid semi-minor axis, in metres.
    pub to_semi_minor_axis: f64,
}

impl OverviewHeader {
    /// Decode the overview header from the start of a grid file.
    ///
    /// The byte order is little endian when `NUM_OREC` reads as 11 in little
    /// endian, big endian otherwise.
    pub fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut probe = RecordReader::new(&mut *reader, 0, ByteOrder::Little);
        let first = probe.record_value("NUM_OREC")?;
        let byte_order = if ByteOrder::Little.record_i32(first) == OVERVIEW_RECORDS {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };

        let overview_records = byte_order.record_i32(first);
        if overview_records != OVERVIEW_RECORDS {
            return Err(GridError::invalid_format(format!(
                "NUM_OREC is {} in either byte order, expected {}",
                overview_records, OVERVIEW_RECORDS
            )));
        }

        let mut records = RecordReader::new(&mut *reader, RECORD_SIZE as u64, byte_order);
        let sub_grid_records = records.i32_record("NUM_SREC")?;
        let sub_grid_count = records.i32_record("NUM_FILE")?;
        let shift_type = records.string_record("GS_TYPE")?;
        let version = records.string_record("VERSION")?;
        let from_system = records.string_record("SYSTEM_F")?;
        let to_system = records.string_record("SYSTEM_T")?;
        let from_semi_major_axis = records.f64_record("MAJOR_F")?;
        let from_semi_minor_axis = records.f64_record("MINOR_F")?;
        let to_semi_major_axis = records.f64_record("MAJOR_T")?;
        let to_semi_minor_axis = records.f64_record("MINOR_T")?;

        let sub_grid_count = usize::try_from(sub_grid_count).map_err(|_| {
            GridError::invalid_format(format!("negative sub-grid count {}", sub_grid_count))
        })?;

        Ok(Self {
            byte_order,
            overview_records,
            sub_grid_records,
            sub_grid_count,
            shift_type,
            version,
            from_system,
            to_system,
            from_semi_major_axis,
            from_semi_minor_axis,
            to_semi_major_axis,
            to_semi_minor_axis,
        })
    }
}

/// An opened NTv2 grid shift file: the overview header and the sub-grid tree.
///
/// Lookups and in-memory interpolation need no locking. File-backed
/// sub-grids serialize their node reads on the shared source, so the file can
/// be shared across threads either way.
///
/// # Example
///
/// ```no_run
/// use ntv2_grid::{GridShift, GridShiftFile, LoadOptions};
///
/// let file = GridShiftFile::open("NTv2_0.gsb", LoadOptions::file_backed())?;
///
/// let mut shift = GridShift::from_degrees(45.5, -73.6);
/// if file.shift_forward(&mut shift)? {
///     println!(
///         "{} -> {}: {:.8}, {:.8}",
///         file.from_system(),
///         file.to_system(),
///         shift.shifted_lat_degrees(),
///         shift.shifted_lon_degrees()
///     );
/// }
/// # Ok::<(), ntv2_grid::GridError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GridShiftFile {
    header: OverviewHeader,
    roots: Vec<SubGrid>,
}

impl GridShiftFile {
    /// Open a grid file from disk.
    pub fn open<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), ?options, "Opening grid shift file");
        match options.storage {
            StorageMode::InMemory => Self::from_reader(File::open(path)?, options),
            StorageMode::FileBacked => Self::from_source(SharedSource::open(path)?, options),
        }
    }

    /// Load every sub-grid from a sequential stream into memory.
    ///
    /// Streams cannot be read lazily, so `options.storage` is not consulted.
    pub fn from_reader<R: Read>(reader: R, options: LoadOptions) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let header = OverviewHeader::decode(&mut reader)?;
        let mut records = RecordReader::new(reader, HEADER_SIZE as u64, header.byte_order);
        let grids = read_sub_grids(&mut records, header.sub_grid_count, options.load_accuracy)?;
        Self::assemble(header, grids)
    }

    /// Load a grid file from a random-access source.
    ///
    /// With [`StorageMode::FileBacked`] only headers are decoded and every
    /// sub-grid keeps a handle to `source`.
    pub fn from_source(source: SharedSource, options: LoadOptions) -> Result<Self> {
        let header = {
            let mut cursor = source.lock();
            cursor.seek(SeekFrom::Start(0))?;
            OverviewHeader::decode(&mut **cursor)?
        };

        let grids = match options.storage {
            StorageMode::InMemory => {
                let mut cursor = source.lock();
                cursor.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
                let mut records = RecordReader::new(
                    BufReader::new(&mut **cursor),
                    HEADER_SIZE as u64,
                    header.byte_order,
                );
                read_sub_grids(&mut records, header.sub_grid_count, options.load_accuracy)?
            }
            StorageMode::FileBacked => {
                let mut grids = Vec::with_capacity(header.sub_grid_count);
                let mut offset = HEADER_SIZE as u64;
                for _ in 0..header.sub_grid_count {
                    let grid = SubGrid::from_source(&source, offset, header.byte_order)?;
                    offset += (HEADER_SIZE + grid.node_count() * NODE_SIZE) as u64;
                    grids.push(grid);
                }
                grids
            }
        };

        Self::assemble(header, grids)
    }

    fn assemble(header: OverviewHeader, grids: Vec<SubGrid>) -> Result<Self> {
        let roots = build_tree(grids)?;
        debug!(
            from = %header.from_system,
            to = %header.to_system,
            sub_grids = header.sub_grid_count,
            roots = roots.len(),
            "Loaded grid shift file"
        );
        Ok(Self { header, roots })
    }

    /// Get the overview header.
    pub fn header(&self) -> &OverviewHeader {
        &self.header
    }

    /// Name of the datum shifted from.
    pub fn from_system(&self) -> &str {
        &self.header.from_system
    }

    /// Name of the datum shifted to.
    pub fn to_system(&self) -> &str {
        &self.header.to_system
    }

    /// Root sub-grids, in file order.
    pub fn roots(&self) -> &[SubGrid] {
        &self.roots
    }

    /// Total number of sub-grids in the tree.
    pub fn sub_grid_count(&self) -> usize {
        self.header.sub_grid_count
    }

    /// Find a sub-grid anywhere in the tree by name.
    pub fn find_sub_grid(&self, name: &str) -> Option<&SubGrid> {
        fn search<'a>(grids: &'a [SubGrid], name: &str) -> Option<&'a SubGrid> {
            grids.iter().find_map(|grid| {
                if grid.name() == name {
                    Some(grid)
                } else {
                    search(grid.children(), name)
                }
            })
        }
        search(&self.roots, name)
    }

    /// Find the most specific sub-grid containing `(lon, lat)`, searching the
    /// roots in file order.
    pub fn find_enclosing(&self, lon: f64, lat: f64) -> Option<&SubGrid> {
        self.roots
            .iter()
            .find_map(|root| root.find_enclosing(lon, lat))
    }

    /// Shift the coordinate in `gs` from the source datum to the target datum.
    ///
    /// Returns `Ok(false)` if no sub-grid covers the coordinate. On error `gs`
    /// is left untouched.
    pub fn shift_forward(&self, gs: &mut GridShift) -> Result<bool> {
        let lon = gs.lon_positive_west_seconds();
        let lat = gs.lat_seconds();
        let Some(sub_grid) = self.find_enclosing(lon, lat) else {
            trace!(lon, lat, "Coordinate outside grid coverage");
            return Ok(false);
        };
        sub_grid.interpolate_grid_shift(gs)?;
        gs.set_sub_grid_name(Some(sub_grid.name().to_string()));
        Ok(true)
    }

    /// Shift the coordinate in `gs` from the target datum back to the source
    /// datum by iterating the forward shift.
    ///
    /// Returns `Ok(false)` if any iteration leaves the grid coverage.
    pub fn shift_reverse(&self, gs: &mut GridShift) -> Result<bool> {
        let mut forward = GridShift::new(gs.lat_seconds(), gs.lon_positive_west_seconds());
        for _ in 0..REVERSE_ITERATIONS {
            if !self.shift_forward(&mut forward)? {
                return Ok(false);
            }
            forward.set_lon_positive_west_seconds(
                gs.lon_positive_west_seconds() - forward.lon_shift_positive_west_seconds(),
            );
            forward.set_lat_seconds(gs.lat_seconds() - forward.lat_shift_seconds());
        }

        gs.set_lon_shift_positive_west_seconds(-forward.lon_shift_positive_west_seconds());
        gs.set_lat_shift_seconds(-forward.lat_shift_seconds());
        gs.set_lon_accuracy_seconds(forward.lon_accuracy_seconds());
        gs.set_lat_accuracy_seconds(forward.lat_accuracy_seconds());
        gs.set_sub_grid_name(forward.sub_grid_name().map(str::to_string));
        Ok(true)
    }
}

fn read_sub_grids<R: Read>(
    records: &mut RecordReader<R>,
    count: usize,
    load_accuracy: bool,
) -> Result<Vec<SubGrid>> {
    (0..count)
        .map(|_| SubGrid::from_reader(&mut *records, load_accuracy))
        .collect()
}

/// Attach every sub-grid to its parent, bottom-up, and return the roots.
///
/// Siblings keep file order. Children are attached before their parent is
/// itself moved into the tree, so no sub-grid is ever observed half-built.
fn build_tree(grids: Vec<SubGrid>) -> Result<Vec<SubGrid>> {
    let count = grids.len();

    let mut parents = Vec::with_capacity(count);
    for grid in &grids {
        if grid.parent_name().eq_ignore_ascii_case(ROOT_PARENT) {
            parents.push(None);
            continue;
        }
        match grids.iter().position(|g| g.name() == grid.parent_name()) {
            Some(parent) => parents.push(Some(parent)),
            None => {
                warn!(
                    name = grid.name(),
                    parent = grid.parent_name(),
                    "Sub-grid references an unknown parent"
                );
                return Err(GridError::invalid_format(format!(
                    "sub-grid {} has unknown parent {}",
                    grid.name(),
                    grid.parent_name()
                )));
            }
        }
    }

    let mut depths = Vec::with_capacity(count);
    for (index, grid) in grids.iter().enumerate() {
        let mut depth = 0;
        let mut current = parents[index];
        while let Some(parent) = current {
            depth += 1;
            if depth > count {
                return Err(GridError::invalid_format(format!(
                    "sub-grid {} is part of a parent cycle",
                    grid.name()
                )));
            }
            current = parents[parent];
        }
        depths.push(depth);
    }

    let max_depth = depths.iter().copied().max().unwrap_or(0);
    let mut slots: Vec<Option<SubGrid>> = grids.into_iter().map(Some).collect();
    let mut pending: Vec<Vec<SubGrid>> = (0..count).map(|_| Vec::new()).collect();
    let mut roots = Vec::new();

    for depth in (0..=max_depth).rev() {
        for index in (0..count).filter(|&i| depths[i] == depth) {
            let Some(grid) = slots[index].take() else {
                continue;
            };
            let grid = grid.with_children(std::mem::take(&mut pending[index]));
            match parents[index] {
                Some(parent) => pending[parent].push(grid),
                None => roots.push(grid),
            }
        }
    }

    Ok(roots)
}

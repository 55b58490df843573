//! A single NTv2 sub-grid and its nested children.

use crate::decode::{ByteOrder, RecordReader, HEADER_SIZE};
use crate::interpolate::{Cell, CornerValues};
use crate::shift::GridShift;
use crate::source::SharedSource;
use crate::{GridError, Result};
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, trace};

/// Geographic bounds of a sub-grid, in seconds of arc.
///
/// Longitudes are positive west.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBounds {
    /// Southern edge (inclusive).
    pub min_lat: f64,
    /// Northern edge (exclusive).
    pub max_lat: f64,
    /// Eastern edge, positive west (inclusive).
    pub min_lon: f64,
    /// Western edge, positive west (exclusive).
    pub max_lon: f64,
}

impl GridBounds {
    /// Check if a coordinate is within the bounds.
    ///
    /// The maximum latitude and longitude edges are outside.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon < self.max_lon && lat >= self.min_lat && lat < self.max_lat
    }
}

/// Decoded sub-grid header with derived lattice dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct SubGridHeader {
    /// Sub-grid name, trimmed.
    pub name: String,
    /// Parent sub-grid name, or `NONE` for a root.
    pub parent_name: String,
    /// Creation stamp, kept verbatim.
    pub created: String,
    /// Update stamp, kept verbatim.
    pub updated: String,
    /// Coverage in seconds of arc.
    pub bounds: GridBounds,
    /// Latitude spacing between nodes, in seconds.
    pub lat_interval: f64,
    /// Longitude spacing between nodes, in seconds.
    pub lon_interval: f64,
    /// Number of node records.
    pub node_count: usize,
    /// Nodes per row, west from the eastern edge.
    pub lon_columns: usize,
    /// Rows of nodes, north from the southern edge.
    pub lat_rows: usize,
}

impl SubGridHeader {
    /// Build a header, deriving the lattice dimensions from the bounds.
    ///
    /// Fails with `InvalidFormat` if a bound or interval is not finite, an
    /// interval is not positive, the bounds are inverted or the lattice is too
    /// large to index. Fails with `InconsistentDimensions` if `node_count`
    /// disagrees with the derived dimensions.
    pub fn new(
        name: impl Into<String>,
        parent_name: impl Into<String>,
        bounds: GridBounds,
        lat_interval: f64,
        lon_interval: f64,
        node_count: i64,
    ) -> Result<Self> {
        let name = name.into();
        let finite = [
            bounds.min_lat,
            bounds.max_lat,
            bounds.min_lon,
            bounds.max_lon,
            lat_interval,
            lon_interval,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(GridError::invalid_format(format!(
                "sub-grid {} has non-finite bounds or interval",
                name
            )));
        }
        if !(lat_interval > 0.0 && lon_interval > 0.0) {
            return Err(GridError::invalid_format(format!(
                "sub-grid {} has non-positive node interval ({}, {})",
                name, lat_interval, lon_interval
            )));
        }
        if !(bounds.max_lat >= bounds.min_lat && bounds.max_lon >= bounds.min_lon) {
            return Err(GridError::invalid_format(format!(
                "sub-grid {} has inverted bounds",
                name
            )));
        }

        let (Some(lon_columns), Some(lat_rows)) = (
            lattice_len(bounds.max_lon - bounds.min_lon, lon_interval),
            lattice_len(bounds.max_lat - bounds.min_lat, lat_interval),
        ) else {
            return Err(GridError::invalid_format(format!(
                "sub-grid {} spans too many nodes",
                name
            )));
        };

        let expected = lon_columns.checked_mul(lat_rows);
        if node_count < 0 || expected != Some(node_count as usize) {
            return Err(GridError::InconsistentDimensions {
                name,
                node_count,
                columns: lon_columns,
                rows: lat_rows,
            });
        }

        Ok(Self {
            name,
            parent_name: parent_name.into(),
            created: String::new(),
            updated: String::new(),
            bounds,
            lat_interval,
            lon_interval,
            node_count: node_count as usize,
            lon_columns,
            lat_rows,
        })
    }

    /// Decode the eleven header records.
    pub fn decode<R: Read>(records: &mut RecordReader<R>) -> Result<Self> {
        let name = records.string_record("SUB_NAME")?;
        let parent_name = records.string_record("PARENT")?;
        let created = records.raw_string_record("CREATED")?;
        let updated = records.raw_string_record("UPDATED")?;
        let min_lat = records.f64_record("S_LAT")?;
        let max_lat = records.f64_record("N_LAT")?;
        let min_lon = records.f64_record("E_LONG")?;
        let max_lon = records.f64_record("W_LONG")?;
        let lat_interval = records.f64_record("LAT_INC")?;
        let lon_interval = records.f64_record("LONG_INC")?;
        let node_count = records.i32_record("GS_COUNT")?;

        let bounds = GridBounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        };
        let mut header = Self::new(
            name,
            parent_name,
            bounds,
            lat_interval,
            lon_interval,
            node_count as i64,
        )?;
        header.created = created;
        header.updated = updated;
        Ok(header)
    }
}

/// Upper bound on node storage reserved before any node record is read.
const MAX_PREALLOCATED_NODES: usize = 64 * 1024;

/// Number of nodes along one axis, or `None` if it cannot be indexed.
fn lattice_len(extent: f64, interval: f64) -> Option<usize> {
    let steps = (extent / interval).floor();
    if !(steps >= 0.0 && steps < u32::MAX as f64) {
        return None;
    }
    (steps as usize).checked_add(1)
}

/// Node values held in memory, one entry per node in flattened order.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeValues {
    lat_shift: Vec<f32>,
    lon_shift: Vec<f32>,
    accuracy: Option<(Vec<f32>, Vec<f32>)>,
}

impl NodeValues {
    /// Shift-only node values.
    pub fn new(lat_shift: Vec<f32>, lon_shift: Vec<f32>) -> Self {
        Self {
            lat_shift,
            lon_shift,
            accuracy: None,
        }
    }

    /// Attach latitude and longitude accuracy series.
    pub fn with_accuracy(mut self, lat_accuracy: Vec<f32>, lon_accuracy: Vec<f32>) -> Self {
        self.accuracy = Some((lat_accuracy, lon_accuracy));
        self
    }

    /// Latitude shifts in seconds.
    pub fn lat_shift(&self) -> &[f32] {
        &self.lat_shift
    }

    /// Longitude shifts in positive west seconds.
    pub fn lon_shift(&self) -> &[f32] {
        &self.lon_shift
    }

    /// Latitude accuracies in seconds, if loaded.
    pub fn lat_accuracy(&self) -> Option<&[f32]> {
        self.accuracy.as_ref().map(|(lat, _)| lat.as_slice())
    }

    /// Longitude accuracies in seconds, if loaded.
    pub fn lon_accuracy(&self) -> Option<&[f32]> {
        self.accuracy.as_ref().map(|(_, lon)| lon.as_slice())
    }

    fn has_len(&self, len: usize) -> bool {
        self.lat_shift.len() == len
            && self.lon_shift.len() == len
            && self
                .accuracy
                .as_ref()
                .map_or(true, |(lat, lon)| lat.len() == len && lon.len() == len)
    }

    fn corners(&self, indices: [usize; 4]) -> CornerValues {
        let pick = |series: &[f32]| indices.map(|i| series[i]);
        CornerValues {
            lat_shift: pick(&self.lat_shift),
            lon_shift: pick(&self.lon_shift),
            accuracy: self
                .accuracy
                .as_ref()
                .map(|(lat, lon)| (pick(lat), pick(lon))),
        }
    }
}

/// Where a sub-grid's node values live.
#[derive(Debug, Clone)]
enum NodeStorage {
    InMemory(NodeValues),
    FileBacked {
        source: SharedSource,
        offset: u64,
        byte_order: ByteOrder,
    },
}

/// One rectangular lattice of shift nodes, possibly refined by children.
///
/// Cloning a sub-grid clones its whole subtree and node arrays; a file-backed
/// sub-grid's clone shares the underlying source.
#[derive(Debug, Clone)]
pub struct SubGrid {
    header: SubGridHeader,
    storage: NodeStorage,
    children: Vec<SubGrid>,
}

impl SubGrid {
    /// Build an in-memory sub-grid from a header and its node values.
    pub fn with_nodes(header: SubGridHeader, nodes: NodeValues) -> Result<Self> {
        if !nodes.has_len(header.node_count) {
            return Err(GridError::InconsistentDimensions {
                name: header.name,
                node_count: nodes.lat_shift.len() as i64,
                columns: header.lon_columns,
                rows: header.lat_rows,
            });
        }
        Ok(Self {
            header,
            storage: NodeStorage::InMemory(nodes),
            children: Vec::new(),
        })
    }

    /// Decode a sub-grid header and all of its node records from a stream.
    ///
    /// Accuracy fields are always consumed; they are kept only when
    /// `load_accuracy` is set.
    pub fn from_reader<R: Read>(records: &mut RecordReader<R>, load_accuracy: bool) -> Result<Self> {
        let header = SubGridHeader::decode(records)?;
        let count = header.node_count;
        // The header count is untrusted until the node bytes have been read.
        let reserve = count.min(MAX_PREALLOCATED_NODES);

        let mut lat_shift = Vec::with_capacity(reserve);
        let mut lon_shift = Vec::with_capacity(reserve);
        let (mut lat_accuracy, mut lon_accuracy) = if load_accuracy {
            (Vec::with_capacity(reserve), Vec::with_capacity(reserve))
        } else {
            (Vec::new(), Vec::new())
        };

        for _ in 0..count {
            let [lat, lon, lat_acc, lon_acc] = records.node_record()?;
            lat_shift.push(lat);
            lon_shift.push(lon);
            if load_accuracy {
                lat_accuracy.push(lat_acc);
                lon_accuracy.push(lon_acc);
            }
        }

        let mut nodes = NodeValues::new(lat_shift, lon_shift);
        if load_accuracy {
            nodes = nodes.with_accuracy(lat_accuracy, lon_accuracy);
        }

        debug!(
            name = %header.name,
            columns = header.lon_columns,
            rows = header.lat_rows,
            accuracy = load_accuracy,
            "Loaded sub-grid into memory"
        );

        Self::with_nodes(header, nodes)
    }

    /// Decode only the header at `offset`; node values are read from `source`
    /// on demand.
    pub fn from_source(source: &SharedSource, offset: u64, byte_order: ByteOrder) -> Result<Self> {
        let mut bytes = [0u8; HEADER_SIZE];
        let read = {
            let mut cursor = source.lock();
            cursor.seek(SeekFrom::Start(offset))?;
            read_up_to(&mut **cursor, &mut bytes)?
        };

        let mut records = RecordReader::new(&bytes[..read], offset, byte_order);
        let header = SubGridHeader::decode(&mut records)?;

        debug!(
            name = %header.name,
            offset,
            columns = header.lon_columns,
            rows = header.lat_rows,
            "Indexed file-backed sub-grid"
        );

        Ok(Self {
            header,
            storage: NodeStorage::FileBacked {
                source: source.clone(),
                offset,
                byte_order,
            },
            children: Vec::new(),
        })
    }

    /// Attach the child sub-grids, in lookup order.
    pub fn with_children(mut self, children: Vec<SubGrid>) -> Self {
        self.children = children;
        self
    }

    /// Find the most specific sub-grid containing `(lon, lat)`.
    ///
    /// Returns `None` outside this sub-grid. Inside it, the first child
    /// containing the point is searched recursively; if no child contains
    /// it, this sub-grid is returned.
    pub fn find_enclosing(&self, lon: f64, lat: f64) -> Option<&SubGrid> {
        if !self.contains(lon, lat) {
            return None;
        }
        match self.children.iter().find(|child| child.contains(lon, lat)) {
            Some(child) => child.find_enclosing(lon, lat),
            None => Some(self),
        }
    }

    /// Check whether `(lon, lat)` lies inside this sub-grid's bounds.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.header.bounds.contains(lon, lat)
    }

    /// Interpolate the shift (and accuracy, when available) at the request
    /// coordinate of `gs`, writing the results into it.
    ///
    /// On error `gs` is left untouched.
    pub fn interpolate_grid_shift(&self, gs: &mut GridShift) -> Result<()> {
        let lon = gs.lon_positive_west_seconds();
        let lat = gs.lat_seconds();
        let cell = self.locate(lon, lat)?;
        let indices = cell.corners();

        let corners = match &self.storage {
            NodeStorage::InMemory(nodes) => nodes.corners(indices),
            NodeStorage::FileBacked {
                source,
                offset,
                byte_order,
            } => CornerValues::from_nodes(source.read_nodes(*offset, indices, *byte_order)?),
        };

        trace!(
            name = %self.header.name,
            column = cell.column,
            row = cell.row,
            "Interpolating grid shift"
        );

        corners.interpolate(&cell).apply(gs);
        Ok(())
    }

    /// Locate the cell whose four corners all lie inside the lattice.
    fn locate(&self, lon: f64, lat: f64) -> Result<Cell> {
        let h = &self.header;
        let out_of_bounds = || GridError::OutOfBounds {
            name: h.name.clone(),
            lon,
            lat,
        };
        if !self.contains(lon, lat) {
            return Err(out_of_bounds());
        }
        let cell = Cell::locate(
            lon,
            lat,
            h.bounds.min_lon,
            h.bounds.min_lat,
            h.lon_interval,
            h.lat_interval,
            h.lon_columns,
        )
        .ok_or_else(out_of_bounds)?;
        if cell.column + 1 >= h.lon_columns || cell.row + 1 >= h.lat_rows {
            return Err(out_of_bounds());
        }
        Ok(cell)
    }

    /// Get the decoded header.
    pub fn header(&self) -> &SubGridHeader {
        &self.header
    }

    /// Get the sub-grid name.
    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Get the parent sub-grid name.
    pub fn parent_name(&self) -> &str {
        &self.header.parent_name
    }

    /// Get the coverage bounds.
    pub fn bounds(&self) -> GridBounds {
        self.header.bounds
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.header.node_count
    }

    /// Get the child sub-grids in lookup order.
    pub fn children(&self) -> &[SubGrid] {
        &self.children
    }

    /// Get the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Get a child by index.
    pub fn child(&self, index: usize) -> Option<&SubGrid> {
        self.children.get(index)
    }

    /// In-memory node values, or `None` for a file-backed sub-grid.
    pub fn nodes(&self) -> Option<&NodeValues> {
        match &self.storage {
            NodeStorage::InMemory(nodes) => Some(nodes),
            NodeStorage::FileBacked { .. } => None,
        }
    }

    /// The shared source of a file-backed sub-grid.
    pub fn source(&self) -> Option<&SharedSource> {
        match &self.storage {
            NodeStorage::InMemory(_) => None,
            NodeStorage::FileBacked { source, .. } => Some(source),
        }
    }

    /// Check whether node values are read from the source on demand.
    pub fn is_file_backed(&self) -> bool {
        matches!(self.storage, NodeStorage::FileBacked { .. })
    }

    /// Multi-line summary of the header.
    pub fn details(&self) -> String {
        let h = &self.header;
        format!(
            "Sub Grid : {}\nParent   : {}\nCreated  : {}\nUpdated  : {}\n\
             Min Lat  : {}\nMax Lat  : {}\nMin Lon  : {}\nMax Lon  : {}\n\
             Lat Intvl: {}\nLon Intvl: {}\nNode Cnt : {}",
            h.name,
            h.parent_name,
            h.created,
            h.updated,
            h.bounds.min_lat,
            h.bounds.max_lat,
            h.bounds.min_lon,
            h.bounds.max_lon,
            h.lat_interval,
            h.lon_interval,
            h.node_count
        )
    }
}

impl fmt::Display for SubGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header.name)
    }
}

/// Fill as much of `buf` as the source allows, returning the byte count.
///
/// A header cut short by end of file is reported by the record decoder.
fn read_up_to<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

//! # ntv2-grid
//!
//! Reader for NTv2 grid shift files, used to transform coordinates between
//! two geodetic datums (for example NAD27 to NAD83, or AGD66 to GDA94).
//!
//! ## Overview
//!
//! An NTv2 file holds one or more rectangular lattices ("sub-grids") of
//! latitude/longitude shift values. Sub-grids nest: a coarse national grid may
//! be refined by denser regional grids, which may be refined again. For any
//! coordinate the most specific sub-grid containing it is selected and the
//! shift is bilinearly interpolated from the four surrounding nodes.
//!
//! Coordinates follow the NTv2 convention: seconds of arc, with longitude
//! positive **west**. [`GridShift::from_degrees`] converts from the usual
//! decimal degrees with longitude positive east.
//!
//! Node values can be held in two ways:
//! - **In memory**: every node record is decoded when the file is opened.
//! - **File backed**: only headers are decoded; the four nodes around a
//!   coordinate are read on demand through a mutex-guarded shared handle.
//!
//! ## Examples
//!
//! ```no_run
//! use ntv2_grid::{GridShift, GridShiftFile, LoadOptions};
//!
//! // Decode everything up front
//! let file = GridShiftFile::open("NTv2_0.gsb", LoadOptions::default())?;
//!
//! let mut shift = GridShift::from_degrees(45.5, -73.6); // Montreal
//! if file.shift_forward(&mut shift)? {
//!     println!("Shifted: {:.8}, {:.8}", shift.shifted_lat_degrees(), shift.shifted_lon_degrees());
//!     println!("Sub-grid: {:?}", shift.sub_grid_name());
//! }
//!
//! // Or keep node data on disk and read it lazily
//! let lazy = GridShiftFile::open("NTv2_0.gsb", LoadOptions::file_backed())?;
//! let sub_grid = lazy.find_enclosing(
//!     shift.lon_positive_west_seconds(),
//!     shift.lat_seconds(),
//! );
//! # Ok::<(), ntv2_grid::GridError>(())
//! ```

pub mod decode;
mod error;
mod file;
mod interpolate;
mod options;
mod shift;
mod source;
mod subgrid;

pub use decode::ByteOrder;
pub use error::GridError;
pub use file::{GridShiftFile, OverviewHeader};
pub use interpolate::{interpolate, Cell};
pub use options::{LoadOptions, StorageMode};
pub use shift::{GridShift, SECONDS_PER_DEGREE};
pub use source::{RandomAccess, SharedSource};
pub use subgrid::{GridBounds, NodeValues, SubGrid, SubGridHeader};

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

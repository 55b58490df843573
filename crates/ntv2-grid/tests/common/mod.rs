//! Synthetic NTv2 files for integration tests.

#![allow(dead_code)]

use ntv2_grid::ByteOrder;

/// One sub-grid to write: header fields plus node values in flattened order.
#[derive(Debug, Clone)]
pub struct SubGridSpec {
    pub name: String,
    pub parent: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub lat_interval: f64,
    pub lon_interval: f64,
    /// `[lat_shift, lon_shift, lat_accuracy, lon_accuracy]` per node.
    pub nodes: Vec<[f32; 4]>,
    /// Overrides the node count written to the header.
    pub declared_count: Option<i32>,
}

impl SubGridSpec {
    /// A sub-grid whose node values come from `f(column, row)`.
    pub fn generated(
        name: &str,
        parent: &str,
        (min_lon, max_lon): (f64, f64),
        (min_lat, max_lat): (f64, f64),
        interval: f64,
        f: impl Fn(usize, usize) -> [f32; 4],
    ) -> Self {
        let columns = ((max_lon - min_lon) / interval).floor() as usize + 1;
        let rows = ((max_lat - min_lat) / interval).floor() as usize + 1;
        let mut nodes = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            for column in 0..columns {
                nodes.push(f(column, row));
            }
        }
        Self {
            name: name.to_string(),
            parent: parent.to_string(),
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            lat_interval: interval,
            lon_interval: interval,
            nodes,
            declared_count: None,
        }
    }
}

/// Node values that vary smoothly and differ per field.
pub fn smooth_node(column: usize, row: usize) -> [f32; 4] {
    let (c, r) = (column as f32, row as f32);
    [
        0.5 * c - 0.25 * r + 0.125 * c * r,
        1.0 + 0.75 * c + 0.5 * r,
        0.01 * (c + r) + 0.02,
        0.03 * c + 0.005 * r + 0.01,
    ]
}

/// Lon shift `column + row`, as used by the 4x4 interpolation scenario.
pub fn ramp_node(column: usize, row: usize) -> [f32; 4] {
    [
        -((row * 4 + column) as f32),
        (column + row) as f32,
        0.1 * column as f32,
        0.1 * row as f32,
    ]
}

fn label(name: &str) -> [u8; 8] {
    let mut bytes = [b' '; 8];
    bytes[..name.len()].copy_from_slice(name.as_bytes());
    bytes
}

struct Writer {
    bytes: Vec<u8>,
    order: ByteOrder,
}

impl Writer {
    fn text(&mut self, code: &str, value: &str) {
        self.bytes.extend_from_slice(&label(code));
        self.bytes.extend_from_slice(&label(value));
    }

    fn int(&mut self, code: &str, value: i32) {
        self.bytes.extend_from_slice(&label(code));
        let encoded = match self.order {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.bytes.extend_from_slice(&encoded);
        self.bytes.extend_from_slice(&[0u8; 4]);
    }

    fn double(&mut self, code: &str, value: f64) {
        self.bytes.extend_from_slice(&label(code));
        let encoded = match self.order {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.bytes.extend_from_slice(&encoded);
    }

    fn float(&mut self, value: f32) {
        let encoded = match self.order {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        };
        self.bytes.extend_from_slice(&encoded);
    }

    fn sub_grid(&mut self, spec: &SubGridSpec) {
        self.text("SUB_NAME", &spec.name);
        self.text("PARENT", &spec.parent);
        self.text("CREATED", "20240101");
        self.text("UPDATED", "20240202");
        self.double("S_LAT", spec.min_lat);
        self.double("N_LAT", spec.max_lat);
        self.double("E_LONG", spec.min_lon);
        self.double("W_LONG", spec.max_lon);
        self.double("LAT_INC", spec.lat_interval);
        self.double("LONG_INC", spec.lon_interval);
        let count = spec.declared_count.unwrap_or(spec.nodes.len() as i32);
        self.int("GS_COUNT", count);
        for node in &spec.nodes {
            for &field in node {
                self.float(field);
            }
        }
    }
}

/// Encode a complete grid shift file.
pub fn write_grid_file(order: ByteOrder, sub_grids: &[SubGridSpec]) -> Vec<u8> {
    let mut w = Writer {
        bytes: Vec::new(),
        order,
    };
    w.int("NUM_OREC", 11);
    w.int("NUM_SREC", 11);
    w.int("NUM_FILE", sub_grids.len() as i32);
    w.text("GS_TYPE", "SECONDS");
    w.text("VERSION", "NTv2.0");
    w.text("SYSTEM_F", "NAD27");
    w.text("SYSTEM_T", "NAD83");
    w.double("MAJOR_F", 6_378_206.4);
    w.double("MINOR_F", 6_356_583.8);
    w.double("MAJOR_T", 6_378_137.0);
    w.double("MINOR_T", 6_356_752.314);
    for spec in sub_grids {
        w.sub_grid(spec);
    }
    w.text("END", "");
    w.bytes
}

/// A root covering [0, 60) x [0, 60) seconds at 10 second spacing, refined by
/// two children and one grandchild, leaving a gap the root alone covers.
pub fn nested_grids() -> Vec<SubGridSpec> {
    vec![
        SubGridSpec::generated("ROOT", "NONE", (0.0, 60.0), (0.0, 60.0), 10.0, smooth_node),
        SubGridSpec::generated("WEST", "ROOT", (30.0, 60.0), (0.0, 30.0), 5.0, |c, r| {
            let [lat, lon, lat_acc, lon_acc] = smooth_node(c, r);
            [lat + 10.0, lon + 10.0, lat_acc, lon_acc]
        }),
        SubGridSpec::generated("EAST", "ROOT", (0.0, 20.0), (0.0, 20.0), 5.0, |c, r| {
            let [lat, lon, lat_acc, lon_acc] = smooth_node(c, r);
            [lat + 20.0, lon + 20.0, lat_acc, lon_acc]
        }),
        SubGridSpec::generated("EASTFINE", "EAST", (5.0, 10.0), (5.0, 10.0), 1.0, |c, r| {
            let [lat, lon, lat_acc, lon_acc] = smooth_node(c, r);
            [lat + 30.0, lon + 30.0, lat_acc, lon_acc]
        }),
    ]
}

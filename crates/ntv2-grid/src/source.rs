//! Shared random-access byte source for file-backed sub-grids.
//!
//! All file-backed sub-grids of one grid file read through a single cursor.
//! The cursor sits behind a mutex so that a seek and the reads that follow it
//! happen as one critical section.

use crate::decode::{decode_node, ByteOrder, HEADER_SIZE, NODE_SIZE};
use crate::Result;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

/// A seekable byte source that can be moved between threads.
pub trait RandomAccess: Read + Seek + Send {}

impl<T: Read + Seek + Send> RandomAccess for T {}

/// Reference-counted, mutex-guarded handle to a random-access source.
///
/// Cloning the handle shares the underlying source.
#[derive(Clone)]
pub struct SharedSource {
    inner: Arc<Mutex<Box<dyn RandomAccess>>>,
}

impl SharedSource {
    /// Wrap a seekable source.
    pub fn new<S: RandomAccess + 'static>(source: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(source))),
        }
    }

    /// Open a grid file for random access.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }

    /// Acquire exclusive access to the cursor.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn RandomAccess>> {
        self.inner.lock()
    }

    /// Check whether two handles share one underlying source.
    pub fn same_source(&self, other: &SharedSource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read the node records at `indices` of the sub-grid whose header starts
    /// at `header_offset`.
    ///
    /// The lock is held for the whole seek/read burst and released before
    /// returning. Fields come back in file order: lat shift, lon shift,
    /// lat accuracy, lon accuracy.
    pub fn read_nodes<const N: usize>(
        &self,
        header_offset: u64,
        indices: [usize; N],
        byte_order: ByteOrder,
    ) -> Result<[[f32; 4]; N]> {
        let mut nodes = [[0f32; 4]; N];
        let mut cursor = self.lock();
        for (node, index) in nodes.iter_mut().zip(indices) {
            let offset = header_offset + HEADER_SIZE as u64 + (index * NODE_SIZE) as u64;
            cursor.seek(SeekFrom::Start(offset))?;
            let mut bytes = [0u8; NODE_SIZE];
            cursor.read_exact(&mut bytes)?;
            *node = decode_node(&bytes, byte_order);
        }
        Ok(nodes)
    }
}

impl fmt::Debug for SharedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSource")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

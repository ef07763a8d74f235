//! Read-only input views.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::config::LoadMode;
use crate::error::Result;

/// The whole input as one byte slice, either mapped or read into memory.
#[derive(Debug)]
pub enum Source {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl Source {
    pub fn open(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        let source = match mode {
            // Zero-length files cannot be mapped everywhere.
            LoadMode::Mmap if len == 0 => Source::Buffered(Vec::new()),
            LoadMode::Mmap => {
                // SAFETY: the map is only ever read. Truncating the file while it
                // is mapped is outside what this crate supports.
                let map = unsafe { Mmap::map(&file)? };
                Source::Mapped(map)
            }
            LoadMode::Buffered => {
                let mut data = usize::try_from(len)
                    .map(Vec::with_capacity)
                    .unwrap_or_default();
                file.read_to_end(&mut data)?;
                Source::Buffered(data)
            }
        };

        debug!(path = %path.display(), bytes = len, mode = ?mode, "Opened input");
        Ok(source)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Source::Mapped(map) => map.as_ref(),
            Source::Buffered(data) => data.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AsRef<[u8]> for Source {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

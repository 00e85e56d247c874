use tracing::debug;

use crate::{DirEntry, Error, FileSession, Result};

/// Cursor handing out a directory listing a page at a time.
///
/// Every call re-lists the directory; entries added or removed between
/// calls can shift what later pages contain.
#[derive(Debug, Clone)]
pub struct DirectoryPager {
    dir: String,
    offset: usize,
    done: bool,
}

impl DirectoryPager {
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            offset: 0,
            done: false,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Return up to `count` entries sorted by name, or everything remaining
    /// when `count` is zero
    ///
    /// The call that hands out the last entries marks the pager done.
    ///
    /// # Errors
    ///
    /// Returns
    ///   - [`Error::EndOfSequence`] on any call after the pager is done
    ///   - `Err` if the directory listing fails
    pub async fn next<S: FileSession>(&mut self, session: &S, count: usize) -> Result<Vec<DirEntry>> {
        if self.done {
            return Err(Error::EndOfSequence);
        }

        let mut entries = session.read_dir(&self.dir).await?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(dir = %self.dir, total = entries.len(), offset = self.offset, count, "paging directory");

        let start = self.offset.min(entries.len());
        let remaining = entries.len() - start;

        if count == 0 || remaining <= count {
            self.done = true;

            return Ok(entries.split_off(start));
        }

        let page = entries.drain(start..start + count).collect();
        self.offset += count;

        Ok(page)
    }
}

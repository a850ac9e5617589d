use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::types::{PAGE_SIZE, PageNum, error::DatabaseError};

pub type PageBuffer = [u8; PAGE_SIZE];

/// Maps page numbers to in-memory buffers backed by a single file. Pages are
/// loaded lazily and stay resident until the pager is closed.
pub struct Pager {
    path: PathBuf,
    file: File,
    file_length: u64,
    pages: Vec<Option<Box<PageBuffer>>>,
    num_pages: u32,
    max_pages: u32,
}

impl Pager {
    pub fn open<P: AsRef<Path>>(path: P, max_pages: u32) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_length = file.metadata()?.len();
        // A partially written tail page still counts as a page.
        let num_pages = file_length.div_ceil(PAGE_SIZE as u64);
        let num_pages = PageNum::try_from(num_pages).map_err(|_| DatabaseError::CorruptedPage {
            page_num: PageNum::MAX,
            reason: format!("file length {} exceeds addressable pages", file_length),
        })?;
        let pages = std::iter::repeat_with(|| None)
            .take(max_pages as usize)
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            file,
            file_length,
            pages,
            num_pages,
            max_pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Number of page numbers in use: pages on disk plus pages materialized
    /// since the file was opened.
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn is_materialized(&self, page_num: PageNum) -> bool {
        self.pages
            .get(page_num as usize)
            .is_some_and(|slot| slot.is_some())
    }

    fn check_bounds(&self, page_num: PageNum) -> Result<usize, DatabaseError> {
        if page_num >= self.max_pages {
            return Err(DatabaseError::PageOutOfBounds {
                page_num,
                max_pages: self.max_pages,
            });
        }
        Ok(page_num as usize)
    }

    pub fn get_page(&mut self, page_num: PageNum) -> Result<&mut PageBuffer, DatabaseError> {
        let index = self.check_bounds(page_num)?;
        let page = match self.pages[index].take() {
            Some(page) => page,
            None => {
                let page = self.read_page(page_num)?;
                if page_num >= self.num_pages {
                    self.num_pages = page_num + 1;
                }
                page
            }
        };
        Ok(&mut **self.pages[index].insert(page))
    }

    fn read_page(&mut self, page_num: PageNum) -> Result<Box<PageBuffer>, DatabaseError> {
        let mut page = Box::new([0u8; PAGE_SIZE]);
        let offset = page_num as u64 * PAGE_SIZE as u64;
        if offset < self.file_length {
            self.file.seek(SeekFrom::Start(offset))?;
            // The tail page may be short; whatever is missing stays zero.
            let mut filled = 0;
            while filled < PAGE_SIZE {
                match self.file.read(&mut page[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            debug!(page_num, bytes_read = filled, "loaded page from disk");
        }
        Ok(page)
    }

    /// Next never-used page number. The page is materialized by the first
    /// `get_page` call on it.
    pub fn allocate_page_number(&self) -> PageNum {
        self.num_pages
    }

    pub fn flush_page(&mut self, page_num: PageNum, size: usize) -> Result<(), DatabaseError> {
        let index = self.check_bounds(page_num)?;
        let Some(page) = self.pages[index].as_deref() else {
            return Err(DatabaseError::FlushUnmaterializedPage { page_num });
        };
        let size = size.min(PAGE_SIZE);
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(&page[..size])?;
        let end = page_num as u64 * PAGE_SIZE as u64 + size as u64;
        if end > self.file_length {
            self.file_length = end;
        }
        Ok(())
    }

    /// Flush every materialized page at full size, sync the file and drop
    /// all buffers. This is the only persistence barrier.
    pub fn close(mut self) -> Result<(), DatabaseError> {
        for page_num in 0..self.num_pages {
            if self.is_materialized(page_num) {
                self.flush_page(page_num, PAGE_SIZE)?;
            }
        }
        self.file.flush()?;
        self.file.sync_all()?;
        self.pages.iter_mut().for_each(|slot| *slot = None);
        Ok(())
    }
}

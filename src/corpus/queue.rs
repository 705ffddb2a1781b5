//! Work queues
//!
//! Two ways for a pool of workers to pick files from a corpus:
//!
//! - [`CursorQueue`]: one shared lazy walk. Each file is handed out once and
//!   the queue is exhausted when the walk ends. The mutex is held only while
//!   the walk advances, which may list a directory when the walk enters it;
//!   it is never held while a primitive runs.
//! - [`SamplerQueue`]: an immutable list shared by all workers. Each worker
//!   draws uniformly with replacement using its own generator, so the queue
//!   needs no lock and never runs dry.

use super::{CorpusWalk, FileCorpus, FileSpec};
use crate::error::{DrillError, DrillResult};
use rand::Rng;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Single-pass shared cursor over a corpus
#[derive(Debug)]
pub struct CursorQueue {
    walk: Mutex<CorpusWalk>,
    taken: AtomicU64,
}

impl CursorQueue {
    pub fn new(walk: CorpusWalk) -> Self {
        Self {
            walk: Mutex::new(walk),
            taken: AtomicU64::new(0),
        }
    }

    /// Walk `root` lazily
    pub fn open(root: &Path) -> DrillResult<Self> {
        Ok(Self::new(FileCorpus::walk(root)?))
    }

    /// Take the next file
    ///
    /// `None` once the corpus is exhausted. Directories that fail to list
    /// come back as `Some(Err(_))`.
    pub fn take_next(&self) -> Option<DrillResult<FileSpec>> {
        let next = {
            let mut walk = self.walk.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            walk.next()
        };
        if matches!(next, Some(Ok(_))) {
            self.taken.fetch_add(1, Ordering::Relaxed);
        }
        next
    }

    /// Number of files handed out so far
    pub fn taken(&self) -> u64 {
        self.taken.load(Ordering::Relaxed)
    }
}

/// Shared immutable list sampled with replacement
#[derive(Debug, Clone)]
pub struct SamplerQueue {
    files: Arc<Vec<FileSpec>>,
}

impl SamplerQueue {
    /// # Errors
    ///
    /// `InvalidArgument` when `files` is empty.
    pub fn new(files: Vec<FileSpec>) -> DrillResult<Self> {
        if files.is_empty() {
            return Err(DrillError::invalid("corpus contains no files"));
        }
        Ok(Self { files: Arc::new(files) })
    }

    /// Enumerate `root` eagerly
    pub fn open(root: &Path) -> DrillResult<Self> {
        Self::new(FileCorpus::enumerate(root)?)
    }

    #[inline]
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &FileSpec {
        // Never empty, checked at construction
        &self.files[rng.gen_range(0..self.files.len())]
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[FileSpec] {
        &self.files
    }
}

/// Corpus consumption mode handed to a worker pool
#[derive(Debug, Clone)]
pub enum WorkSource {
    Cursor(Arc<CursorQueue>),
    Sampler(SamplerQueue),
}

impl WorkSource {
    /// Finite single pass over `root`
    pub fn cursor(root: &Path) -> DrillResult<Self> {
        Ok(WorkSource::Cursor(Arc::new(CursorQueue::open(root)?)))
    }

    /// Endless uniform sampling over the files under `root`
    pub fn sampler(root: &Path) -> DrillResult<Self> {
        Ok(WorkSource::Sampler(SamplerQueue::open(root)?))
    }

    pub fn is_cursor(&self) -> bool {
        matches!(self, WorkSource::Cursor(_))
    }

    /// Next target for a worker
    ///
    /// A sampler always yields; a cursor yields `None` when exhausted.
    pub fn next_target<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<DrillResult<FileSpec>> {
        match self {
            WorkSource::Cursor(cursor) => cursor.take_next(),
            WorkSource::Sampler(sampler) => Some(Ok(sampler.pick(rng).clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn corpus(n: usize) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..n {
            std::fs::write(temp_dir.path().join(format!("f{:02}", i)), b"data").unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_cursor_hands_out_each_file_once() {
        let dir = corpus(50);
        let cursor = Arc::new(CursorQueue::open(dir.path()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cursor = Arc::clone(&cursor);
                std::thread::spawn(move || {
                    let mut mine = Vec::new();
                    while let Some(next) = cursor.take_next() {
                        mine.push(next.unwrap().path);
                    }
                    mine
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), 50);
        assert_eq!(unique.len(), 50);
        assert_eq!(cursor.taken(), 50);
        assert!(cursor.take_next().is_none());
    }

    #[test]
    fn test_sampler_rejects_empty() {
        let dir = TempDir::new().unwrap();
        assert!(SamplerQueue::open(dir.path()).unwrap_err().is_invalid_argument());
        assert!(SamplerQueue::new(Vec::new()).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_sampler_picks_every_file() {
        let dir = corpus(5);
        let sampler = SamplerQueue::open(dir.path()).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);

        let seen: HashSet<_> = (0..500).map(|_| sampler.pick(&mut rng).path.clone()).collect();
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_work_source_modes() {
        let dir = corpus(3);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);

        let cursor = WorkSource::cursor(dir.path()).unwrap();
        assert!(cursor.is_cursor());
        let taken: Vec<_> = std::iter::from_fn(|| cursor.next_target(&mut rng)).collect();
        assert_eq!(taken.len(), 3);

        let sampler = WorkSource::sampler(dir.path()).unwrap();
        assert!(!sampler.is_cursor());
        for _ in 0..10 {
            assert!(sampler.next_target(&mut rng).unwrap().is_ok());
        }
    }
}

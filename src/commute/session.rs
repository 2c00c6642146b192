//! Preview-then-full generation with a per-algorithm cache.
//!
//! Selecting an algorithm returns its cached full batch when there is one.
//! Otherwise a small preview is generated on the spot and the full batch is
//! started on a background thread. Finished batches are written to the cache
//! whole, once per algorithm; a later write for the same key replaces the old one.

use std::{
    collections::HashMap,
    sync::Arc,
    thread::{self, JoinHandle},
};

use anyhow::anyhow;
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    commute::{CommuteConfig, Generator, StudentBatch},
    graph::TransitGraph,
    search::{Algorithm, PathFinder},
};

#[derive(Debug, Default)]
pub struct BatchCache {
    batches: HashMap<Algorithm, Arc<StudentBatch>>,
}

impl BatchCache {
    pub fn get(&self, algorithm: Algorithm) -> Option<Arc<StudentBatch>> {
        self.batches.get(&algorithm).cloned()
    }

    pub fn insert(&mut self, algorithm: Algorithm, batch: StudentBatch) -> Arc<StudentBatch> {
        let batch = Arc::new(batch);
        self.batches.insert(algorithm, batch.clone());
        batch
    }

    pub fn contains(&self, algorithm: Algorithm) -> bool {
        self.batches.contains_key(&algorithm)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[derive(Debug)]
pub enum Selection {
    /// Full batch computed earlier for this algorithm.
    Cached(Arc<StudentBatch>),
    /// Quick batch to show while the full one is still running.
    Preview(StudentBatch),
}

impl Selection {
    pub fn batch(&self) -> &StudentBatch {
        match self {
            Selection::Cached(batch) => batch,
            Selection::Preview(batch) => batch,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Selection::Cached(_))
    }
}

pub struct Session<F: PathFinder + 'static> {
    graph: Arc<TransitGraph>,
    finder: Arc<F>,
    config: Arc<CommuteConfig>,
    cache: BatchCache,
    pending: HashMap<Algorithm, JoinHandle<StudentBatch>>,
    rng: ChaCha8Rng,
}

impl<F: PathFinder + 'static> Session<F> {
    pub fn new(graph: Arc<TransitGraph>, finder: Arc<F>, config: CommuteConfig, seed: u64) -> Self {
        Self {
            graph,
            finder,
            config: Arc::new(config),
            cache: BatchCache::default(),
            pending: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn cache(&self) -> &BatchCache {
        &self.cache
    }

    pub fn is_pending(&self, algorithm: Algorithm) -> bool {
        self.pending.contains_key(&algorithm)
    }

    pub fn select(&mut self, algorithm: Algorithm) -> Selection {
        self.collect_finished();

        if let Some(batch) = self.cache.get(algorithm) {
            debug!("Serving cached {algorithm} batch");
            return Selection::Cached(batch);
        }

        let preview = Generator::new(&self.graph, self.finder.as_ref(), &self.config).generate(
            self.config.preview_size,
            algorithm,
            &mut self.rng,
        );

        if !self.pending.contains_key(&algorithm) {
            self.spawn_full(algorithm);
        }

        Selection::Preview(preview)
    }

    fn spawn_full(&mut self, algorithm: Algorithm) {
        let graph = self.graph.clone();
        let finder = self.finder.clone();
        let config = self.config.clone();
        let seed = self.rng.gen::<u64>();

        info!("Starting full {algorithm} batch of {}", config.full_size);
        let handle = thread::spawn(move || {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            Generator::new(&graph, finder.as_ref(), &config).generate(
                config.full_size,
                algorithm,
                &mut rng,
            )
        });

        self.pending.insert(algorithm, handle);
    }

    /// Moves every finished background batch into the cache.
    pub fn collect_finished(&mut self) {
        let done: Vec<Algorithm> = self
            .pending
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(algorithm, _)| *algorithm)
            .collect();

        for algorithm in done {
            if let Err(e) = self.finish(algorithm) {
                warn!("{e:#}");
            }
        }
    }

    /// Blocks until the full batch for `algorithm` is cached. Returns `None` when
    /// none was ever started.
    pub fn wait(&mut self, algorithm: Algorithm) -> anyhow::Result<Option<Arc<StudentBatch>>> {
        if self.pending.contains_key(&algorithm) {
            self.finish(algorithm)?;
        }
        Ok(self.cache.get(algorithm))
    }

    fn finish(&mut self, algorithm: Algorithm) -> anyhow::Result<()> {
        let Some(handle) = self.pending.remove(&algorithm) else {
            return Ok(());
        };

        let batch = handle
            .join()
            .map_err(|_| anyhow!("Full {algorithm} batch panicked, nothing cached"))?;
        self.cache.insert(algorithm, batch);

        Ok(())
    }
}

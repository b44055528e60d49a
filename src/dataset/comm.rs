use crate::error::DatasetError;
use std::sync::{Arc, Barrier, Mutex};

/// Collective exchange between the ranks sharing a dataset.
///
/// `all_gather` blocks until every rank of the group has contributed.
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    /// Returns every rank's contribution, indexed by rank.
    fn all_gather(&self, local: &[f64]) -> Result<Vec<Vec<f64>>, DatasetError>;
}

/// Single-process group.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalComm;

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather(&self, local: &[f64]) -> Result<Vec<Vec<f64>>, DatasetError> {
        Ok(vec![local.to_vec()])
    }
}

#[derive(Debug)]
struct Exchange {
    slots: Mutex<Vec<Vec<f64>>>,
    barrier: Barrier,
}

/// In-process group of ranks running on separate threads.
#[derive(Debug, Clone)]
pub struct SharedMemoryComm {
    rank: usize,
    size: usize,
    exchange: Arc<Exchange>,
}

impl SharedMemoryComm {
    /// One handle per rank; hand each to its own thread.
    pub fn group(size: usize) -> Vec<Self> {
        let size = size.max(1);
        let exchange = Arc::new(Exchange {
            slots: Mutex::new(vec![Vec::new(); size]),
            barrier: Barrier::new(size),
        });
        (0..size)
            .map(|rank| Self {
                rank,
                size,
                exchange: Arc::clone(&exchange),
            })
            .collect()
    }
}

impl Communicator for SharedMemoryComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_gather(&self, local: &[f64]) -> Result<Vec<Vec<f64>>, DatasetError> {
        {
            let mut slots = self.exchange.slots.lock().map_err(poisoned)?;
            slots[self.rank] = local.to_vec();
        }
        self.exchange.barrier.wait();
        let gathered = self.exchange.slots.lock().map_err(poisoned)?.clone();
        // Nobody may overwrite a slot before every rank has read the round.
        self.exchange.barrier.wait();
        Ok(gathered)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> DatasetError {
    DatasetError::Communication {
        reason: "exchange lock poisoned by a panicked rank".to_string(),
    }
}

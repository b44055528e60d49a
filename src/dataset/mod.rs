//! Dataset interface consulted by reduction and cycle filters.
//!
//! Every reduction method may run a collective exchange across all ranks that
//! share the dataset. Callers must invoke the same sequence of reductions on
//! every rank; a rank that skips one stalls the others.

mod comm;
mod mesh;
mod stats;

pub use comm::{Communicator, LocalComm, SharedMemoryComm};
pub use mesh::{Association, Domain, FieldDecl, MeshDataset};

use crate::error::DatasetError;
use crate::types::Number;

/// Global extremum of a field and where it occurs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub value: f64,
    pub position: [f64; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Number(Number),
    Text(String),
}

pub trait Dataset {
    /// Declared field names, used for diagnostics.
    fn field_names(&self) -> Vec<String>;
    fn has_field(&self, field: &str) -> bool;
    /// True when the field has exactly one component.
    fn is_scalar_field(&self, field: &str) -> bool;
    fn field_min(&self, field: &str) -> Result<Extremum, DatasetError>;
    fn field_max(&self, field: &str) -> Result<Extremum, DatasetError>;
    fn field_avg(&self, field: &str) -> Result<f64, DatasetError>;
    fn field_histogram(
        &self,
        field: &str,
        min_val: f64,
        max_val: f64,
        num_bins: usize,
    ) -> Result<Vec<u64>, DatasetError>;
    fn state_var(&self, name: &str) -> Option<StateValue>;
}

use super::comm::{Communicator, LocalComm};
use super::stats::{self, Extreme, SumCount};
use super::{Dataset, Extremum, StateValue};
use crate::error::DatasetError;
use crate::types::Number;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    Vertex,
    Element,
}

/// Field declaration shared by every rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub association: Association,
    pub components: usize,
}

impl FieldDecl {
    pub const fn scalar(association: Association) -> Self {
        Self {
            association,
            components: 1,
        }
    }

    pub const fn vector(association: Association, components: usize) -> Self {
        Self {
            association,
            components,
        }
    }
}

/// One locally owned block of the mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    vertex_positions: Vec<[f64; 3]>,
    element_positions: Vec<[f64; 3]>,
    fields: BTreeMap<String, Vec<f64>>,
}

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertices(mut self, positions: Vec<[f64; 3]>) -> Self {
        self.vertex_positions = positions;
        self
    }

    /// Element centroids; used as the location of element-associated samples.
    pub fn with_elements(mut self, centroids: Vec<[f64; 3]>) -> Self {
        self.element_positions = centroids;
        self
    }

    /// Values are interleaved by component.
    pub fn with_field(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.fields.insert(name.into(), values);
        self
    }

    #[inline]
    fn positions(&self, association: Association) -> &[[f64; 3]] {
        match association {
            Association::Vertex => &self.vertex_positions,
            Association::Element => &self.element_positions,
        }
    }
}

/// Distributed mesh: a schema shared by all ranks plus the local domains.
#[derive(Debug, Clone)]
pub struct MeshDataset<C: Communicator = LocalComm> {
    schema: BTreeMap<String, FieldDecl>,
    domains: Vec<Domain>,
    state: BTreeMap<String, StateValue>,
    comm: C,
}

impl MeshDataset<LocalComm> {
    pub fn new() -> Self {
        Self::with_comm(LocalComm)
    }
}

impl Default for MeshDataset<LocalComm> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Communicator> MeshDataset<C> {
    pub fn with_comm(comm: C) -> Self {
        Self {
            schema: BTreeMap::new(),
            domains: Vec::new(),
            state: BTreeMap::new(),
            comm,
        }
    }

    pub fn with_field_decl(mut self, name: impl Into<String>, decl: FieldDecl) -> Self {
        self.schema.insert(name.into(), decl);
        self
    }

    pub fn with_state(mut self, name: impl Into<String>, value: StateValue) -> Self {
        self.state.insert(name.into(), value);
        self
    }

    pub fn set_state(&mut self, name: impl Into<String>, value: StateValue) {
        self.state.insert(name.into(), value);
    }

    /// Sets the `cycle` state variable.
    pub fn set_cycle(&mut self, cycle: i32) {
        self.set_state("cycle", StateValue::Number(Number::Int(cycle)));
    }

    pub fn add_domain(&mut self, domain: Domain) -> Result<(), DatasetError> {
        for (name, values) in &domain.fields {
            let decl = self
                .schema
                .get(name)
                .ok_or_else(|| DatasetError::SchemaMismatch {
                    field: name.clone(),
                    reason: "field is not declared".to_string(),
                })?;
            let expected = domain.positions(decl.association).len() * decl.components;
            if values.len() != expected {
                return Err(DatasetError::SchemaMismatch {
                    field: name.clone(),
                    reason: format!("expected {expected} values, got {}", values.len()),
                });
            }
        }
        self.domains.push(domain);
        Ok(())
    }

    #[inline]
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    #[inline]
    pub fn comm(&self) -> &C {
        &self.comm
    }

    fn scalar_decl(&self, field: &str) -> Result<FieldDecl, DatasetError> {
        let decl = *self
            .schema
            .get(field)
            .ok_or_else(|| DatasetError::FieldNotFound {
                field: field.to_string(),
            })?;
        if decl.components != 1 {
            return Err(DatasetError::SchemaMismatch {
                field: field.to_string(),
                reason: format!("reductions need 1 component, field has {}", decl.components),
            });
        }
        Ok(decl)
    }

    /// Local sample arrays with their positions; domains lacking the field are skipped.
    fn local_samples<'a>(
        &'a self,
        field: &'a str,
        decl: FieldDecl,
    ) -> impl Iterator<Item = (&'a [f64], &'a [[f64; 3]])> + 'a {
        self.domains.iter().filter_map(move |domain| {
            domain
                .fields
                .get(field)
                .map(|values| (values.as_slice(), domain.positions(decl.association)))
        })
    }

    fn extremum(&self, field: &str, which: Extreme) -> Result<Extremum, DatasetError> {
        let decl = self.scalar_decl(field)?;
        let local = self
            .local_samples(field, decl)
            .fold(None, |acc, (values, positions)| {
                stats::scan_extremum(values, positions, acc, which)
            });
        let gathered = self.comm.all_gather(&stats::encode_located(local))?;
        let best = stats::combine_located(&gathered, which)?.ok_or_else(|| {
            DatasetError::EmptyField {
                field: field.to_string(),
            }
        })?;
        Ok(Extremum {
            value: best.value,
            position: best.position,
        })
    }
}

impl<C: Communicator> Dataset for MeshDataset<C> {
    fn field_names(&self) -> Vec<String> {
        self.schema.keys().cloned().collect()
    }

    fn has_field(&self, field: &str) -> bool {
        self.schema.contains_key(field)
    }

    fn is_scalar_field(&self, field: &str) -> bool {
        self.schema
            .get(field)
            .is_some_and(|decl| decl.components == 1)
    }

    fn field_min(&self, field: &str) -> Result<Extremum, DatasetError> {
        self.extremum(field, Extreme::Min)
    }

    fn field_max(&self, field: &str) -> Result<Extremum, DatasetError> {
        self.extremum(field, Extreme::Max)
    }

    fn field_avg(&self, field: &str) -> Result<f64, DatasetError> {
        let decl = self.scalar_decl(field)?;
        let mut local = SumCount::default();
        for (values, _) in self.local_samples(field, decl) {
            local.extend(values);
        }
        let gathered = self.comm.all_gather(&local.encode())?;
        SumCount::combine(&gathered)?
            .mean()
            .ok_or_else(|| DatasetError::EmptyField {
                field: field.to_string(),
            })
    }

    fn field_histogram(
        &self,
        field: &str,
        min_val: f64,
        max_val: f64,
        num_bins: usize,
    ) -> Result<Vec<u64>, DatasetError> {
        let decl = self.scalar_decl(field)?;
        let mut local = vec![0.0; num_bins];
        for (values, _) in self.local_samples(field, decl) {
            stats::accumulate_bins(&mut local, values, min_val, max_val);
        }
        let gathered = self.comm.all_gather(&local)?;
        stats::combine_bins(&gathered, num_bins)
    }

    fn state_var(&self, name: &str) -> Option<StateValue> {
        self.state.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_dataset(values: Vec<f64>) -> MeshDataset {
        let positions = (0..values.len()).map(|i| [i as f64, 0.0, 0.0]).collect();
        let mut dataset = MeshDataset::new()
            .with_field_decl("e", FieldDecl::scalar(Association::Vertex))
            .with_field_decl("vel", FieldDecl::vector(Association::Vertex, 3));
        dataset
            .add_domain(Domain::new().with_vertices(positions).with_field("e", values))
            .expect("domain should match schema");
        dataset
    }

    #[test]
    fn min_max_report_value_and_position() {
        let dataset = line_dataset(vec![4.0, -2.0, 9.0, 1.0]);
        let min = dataset.field_min("e").expect("min");
        assert_eq!(min.value, -2.0);
        assert_eq!(min.position, [1.0, 0.0, 0.0]);
        let max = dataset.field_max("e").expect("max");
        assert_eq!(max.value, 9.0);
        assert_eq!(max.position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn average_spans_all_domains() {
        let mut dataset = line_dataset(vec![1.0, 2.0]);
        dataset
            .add_domain(
                Domain::new()
                    .with_vertices(vec![[0.0; 3]; 2])
                    .with_field("e", vec![3.0, 6.0]),
            )
            .expect("second domain");
        assert_eq!(dataset.field_avg("e").expect("avg"), 3.0);
    }

    #[test]
    fn histogram_counts_every_sample() {
        let dataset = line_dataset(vec![0.0, 0.5, 1.0, 9.9, 10.0]);
        let counts = dataset.field_histogram("e", 0.0, 10.0, 10).expect("hist");
        assert_eq!(counts.len(), 10);
        assert_eq!(counts[0], 2);
        assert_eq!(counts[1], 1);
        assert_eq!(counts[9], 2);
        assert_eq!(counts.iter().sum::<u64>(), 5);
    }

    #[test]
    fn add_domain_rejects_wrong_length_and_undeclared_fields() {
        let mut dataset =
            MeshDataset::new().with_field_decl("e", FieldDecl::scalar(Association::Element));
        let err = dataset
            .add_domain(
                Domain::new()
                    .with_elements(vec![[0.0; 3]; 2])
                    .with_field("e", vec![1.0]),
            )
            .expect_err("length mismatch");
        assert!(matches!(err, DatasetError::SchemaMismatch { .. }));
        let err = dataset
            .add_domain(Domain::new().with_field("p", vec![]))
            .expect_err("undeclared");
        assert!(matches!(err, DatasetError::SchemaMismatch { .. }));
    }

    #[test]
    fn declared_field_without_samples_is_empty() {
        let dataset =
            MeshDataset::new().with_field_decl("e", FieldDecl::scalar(Association::Vertex));
        assert!(matches!(
            dataset.field_min("e"),
            Err(DatasetError::EmptyField { .. })
        ));
        assert!(matches!(
            dataset.field_avg("e"),
            Err(DatasetError::EmptyField { .. })
        ));
    }

    #[test]
    fn schema_drives_existence_and_scalar_checks() {
        let dataset = line_dataset(vec![1.0]);
        assert!(dataset.has_field("vel"));
        assert!(!dataset.is_scalar_field("vel"));
        assert!(dataset.is_scalar_field("e"));
        assert!(!dataset.has_field("missing"));
        assert_eq!(dataset.field_names(), vec!["e".to_string(), "vel".to_string()]);
    }
}

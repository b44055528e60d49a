use crate::ops::{self, FilterFamily, FilterKind, Kernel, ParamSpec, MAX_FILTER_INPUTS};
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub name: &'static str,
    /// Optional ports accept the empty sentinel; they still must be wired.
    pub optional: bool,
}

impl PortSpec {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            optional: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FilterMeta {
    /// Type name used by graph documents.
    pub name: &'static str,
    pub kind: FilterKind,
    pub family: FilterFamily,
    /// Fixed input ports; index = input slot handed to the kernel.
    pub ports: &'static [PortSpec],
    pub param_spec: ParamSpec,
    pub kernel: Kernel,
    /// Whether the kernel runs a collective reduction over the dataset.
    pub collective: bool,
}

impl FilterMeta {
    #[inline]
    pub fn port_index(&self, port: &str) -> Option<usize> {
        self.ports.iter().position(|spec| spec.name == port)
    }

    #[inline]
    pub fn input_count(&self) -> usize {
        self.ports.len()
    }

    pub fn port_names(&self) -> String {
        self.ports
            .iter()
            .map(|spec| spec.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub struct FilterRegistry;

impl FilterRegistry {
    pub fn get(name: &str) -> Option<&'static FilterMeta> {
        let index = REGISTRY_INDEX.get_or_init(build_registry_index);
        index.by_name.get(name).map(|idx| &FILTER_METAS[*idx])
    }

    pub fn get_by_kind(kind: FilterKind) -> &'static FilterMeta {
        let index = REGISTRY_INDEX.get_or_init(build_registry_index);
        &FILTER_METAS[index.by_kind[kind.as_usize()]]
    }

    pub fn all() -> &'static [FilterMeta] {
        &FILTER_METAS
    }
}

struct RegistryIndex {
    by_name: HashMap<&'static str, usize>,
    by_kind: [usize; FILTER_KIND_COUNT],
}

static REGISTRY_INDEX: OnceLock<RegistryIndex> = OnceLock::new();
const MISSING_IDX: usize = usize::MAX;
const FILTER_KIND_COUNT: usize = FilterKind::COUNT;

fn build_registry_index() -> RegistryIndex {
    let mut by_name = HashMap::with_capacity(FILTER_METAS.len());
    let mut by_kind = [MISSING_IDX; FILTER_KIND_COUNT];

    for (idx, meta) in FILTER_METAS.iter().enumerate() {
        validate_meta(meta);
        if by_name.insert(meta.name, idx).is_some() {
            panic!("duplicate filter name in registry: {}", meta.name);
        }
        let slot = meta.kind.as_usize();
        if by_kind[slot] != MISSING_IDX {
            panic!("duplicate filter kind in registry: {:?}", meta.kind);
        }
        by_kind[slot] = idx;
    }

    for (slot, idx) in by_kind.iter().enumerate() {
        if *idx == MISSING_IDX {
            panic!("filter kind slot not registered: {}", slot);
        }
    }

    RegistryIndex { by_name, by_kind }
}

fn validate_meta(meta: &FilterMeta) {
    if meta.ports.len() > MAX_FILTER_INPUTS {
        panic!(
            "filter `{}` declares {} ports, at most {MAX_FILTER_INPUTS} supported",
            meta.name,
            meta.ports.len()
        );
    }
    for (idx, port) in meta.ports.iter().enumerate() {
        if meta.ports[..idx].iter().any(|prev| prev.name == port.name) {
            panic!("filter `{}` declares port `{}` twice", meta.name, port.name);
        }
    }
    if meta.collective && meta.family != FilterFamily::Reduction {
        panic!("filter `{}` is collective but not a reduction", meta.name);
    }
}

const NO_PORTS: &[PortSpec] = &[];
const BINARY_PORTS: &[PortSpec] = &[PortSpec::required("lhs"), PortSpec::required("rhs")];
const ONE_ARG: &[PortSpec] = &[PortSpec::required("arg1")];
const TWO_ARGS: &[PortSpec] = &[PortSpec::required("arg1"), PortSpec::required("arg2")];
const THREE_ARGS: &[PortSpec] = &[
    PortSpec::required("arg1"),
    PortSpec::required("arg2"),
    PortSpec::required("arg3"),
];
const HISTOGRAM_PORTS: &[PortSpec] = &[
    PortSpec::required("field"),
    PortSpec::optional("num_bins"),
    PortSpec::optional("min_val"),
    PortSpec::optional("max_val"),
];

static FILTER_METAS: [FilterMeta; FilterKind::COUNT] = [
    FilterMeta {
        name: "null_arg",
        kind: FilterKind::NullArg,
        family: FilterFamily::Leaf,
        ports: NO_PORTS,
        param_spec: ParamSpec::None,
        kernel: ops::null_arg,
        collective: false,
    },
    FilterMeta {
        name: "expr_identifier",
        kind: FilterKind::Identifier,
        family: FilterFamily::Leaf,
        ports: NO_PORTS,
        param_spec: ParamSpec::Name,
        kernel: ops::identifier,
        collective: false,
    },
    FilterMeta {
        name: "expr_integer",
        kind: FilterKind::Integer,
        family: FilterFamily::Leaf,
        ports: NO_PORTS,
        param_spec: ParamSpec::Int,
        kernel: ops::integer,
        collective: false,
    },
    FilterMeta {
        name: "expr_double",
        kind: FilterKind::Double,
        family: FilterFamily::Leaf,
        ports: NO_PORTS,
        param_spec: ParamSpec::Float,
        kernel: ops::double,
        collective: false,
    },
    FilterMeta {
        name: "expr_meshvar",
        kind: FilterKind::FieldRef,
        family: FilterFamily::Leaf,
        ports: NO_PORTS,
        param_spec: ParamSpec::Name,
        kernel: ops::field_ref,
        collective: false,
    },
    FilterMeta {
        name: "expr_binary_op",
        kind: FilterKind::BinaryOp,
        family: FilterFamily::Operator,
        ports: BINARY_PORTS,
        param_spec: ParamSpec::Op,
        kernel: ops::binary_op,
        collective: false,
    },
    FilterMeta {
        name: "scalar_min",
        kind: FilterKind::ScalarMin,
        family: FilterFamily::Reduction,
        ports: TWO_ARGS,
        param_spec: ParamSpec::None,
        kernel: ops::scalar_min,
        collective: false,
    },
    FilterMeta {
        name: "scalar_max",
        kind: FilterKind::ScalarMax,
        family: FilterFamily::Reduction,
        ports: TWO_ARGS,
        param_spec: ParamSpec::None,
        kernel: ops::scalar_max,
        collective: false,
    },
    FilterMeta {
        name: "field_min",
        kind: FilterKind::FieldMin,
        family: FilterFamily::Reduction,
        ports: ONE_ARG,
        param_spec: ParamSpec::None,
        kernel: ops::field_min,
        collective: true,
    },
    FilterMeta {
        name: "field_max",
        kind: FilterKind::FieldMax,
        family: FilterFamily::Reduction,
        ports: ONE_ARG,
        param_spec: ParamSpec::None,
        kernel: ops::field_max,
        collective: true,
    },
    FilterMeta {
        name: "field_avg",
        kind: FilterKind::FieldAvg,
        family: FilterFamily::Reduction,
        ports: ONE_ARG,
        param_spec: ParamSpec::None,
        kernel: ops::field_avg,
        collective: true,
    },
    FilterMeta {
        name: "histogram",
        kind: FilterKind::Histogram,
        family: FilterFamily::Reduction,
        ports: HISTOGRAM_PORTS,
        param_spec: ParamSpec::None,
        kernel: ops::histogram,
        collective: true,
    },
    FilterMeta {
        name: "expr_position",
        kind: FilterKind::Position,
        family: FilterFamily::Derived,
        ports: ONE_ARG,
        param_spec: ParamSpec::None,
        kernel: ops::position,
        collective: false,
    },
    FilterMeta {
        name: "cycle",
        kind: FilterKind::Cycle,
        family: FilterFamily::Derived,
        ports: NO_PORTS,
        param_spec: ParamSpec::None,
        kernel: ops::cycle,
        collective: false,
    },
    FilterMeta {
        name: "vector",
        kind: FilterKind::Vector,
        family: FilterFamily::Derived,
        ports: THREE_ARGS,
        param_spec: ParamSpec::None,
        kernel: ops::vector,
        collective: false,
    },
    FilterMeta {
        name: "magnitude",
        kind: FilterKind::Magnitude,
        family: FilterFamily::Derived,
        ports: ONE_ARG,
        param_spec: ParamSpec::None,
        kernel: ops::magnitude,
        collective: false,
    },
];

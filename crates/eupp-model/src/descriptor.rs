//! Metadata derived from a source file's name.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::kind::RecordKind;

/// Token used by control-run files; folded into the ensemble grouping.
pub const CONTROL_RUN: &str = "ctr";

/// Token the control run is folded into.
pub const ENSEMBLE: &str = "ens";

/// Everything the pipeline knows about a source file before opening it.
///
/// Built once per file by the filename extractor and never mutated.
/// `product` and `sub_kind` never hold `"ctr"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFileDescriptor {
    pub record_kind: RecordKind,
    pub product: String,
    pub sub_kind: String,
    pub version: Option<i64>,
}

impl SourceFileDescriptor {
    /// Build a descriptor, folding the control run into the ensemble.
    pub fn new(
        record_kind: RecordKind,
        product: impl Into<String>,
        sub_kind: impl Into<String>,
        version: Option<i64>,
    ) -> Self {
        Self {
            record_kind,
            product: fold_control_run(product.into()),
            sub_kind: fold_control_run(sub_kind.into()),
            version,
        }
    }

    /// Name of the dataset this file is committed to.
    pub fn dataset_name(&self) -> &'static str {
        self.record_kind.as_str()
    }
}

impl fmt::Display for SourceFileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.record_kind, self.product, self.sub_kind)?;
        match self.version {
            Some(version) => write!(f, " v{version}"),
            None => Ok(()),
        }
    }
}

fn fold_control_run(value: String) -> String {
    if value == CONTROL_RUN {
        ENSEMBLE.to_string()
    } else {
        value
    }
}

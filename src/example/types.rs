//! Core example data types shared by the parser, the sources, the history
//! encoder and the learner.

use serde::{Deserialize, Serialize};

/// Namespace reserved for injected history features.
pub const HISTORY_NAMESPACE: u8 = 127;
/// Namespace holding the per-example constant (bias) feature.
pub const CONSTANT_NAMESPACE: u8 = 128;
/// Hash of the constant feature before masking.
pub const CONSTANT_FEATURE: u32 = 11_650_396;

// ---------------------------------------------------------------------------
// Features and namespaces
// ---------------------------------------------------------------------------

/// A single hashed feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub value: f32,
    pub weight_index: u32,
}

impl Feature {
    pub fn new(weight_index: u32, value: f32) -> Self {
        Self {
            value,
            weight_index,
        }
    }
}

/// A group of features sharing a one-byte namespace id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    pub id: u8,
    pub features: Vec<Feature>,
    /// Sum of squared feature values in this namespace.
    pub sum_feat_sq: f32,
    /// Readable feature names, parallel to `features`, only kept when auditing.
    pub audit: Vec<String>,
}

impl Namespace {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Append a feature and keep the square-sum accounting current.
    pub fn push(&mut self, feature: Feature) {
        self.sum_feat_sq += feature.value * feature.value;
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Reset for reuse while keeping the allocated buffers.
    fn clear(&mut self) {
        self.features.clear();
        self.audit.clear();
        self.sum_feat_sq = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// A multiclass label. `class == None` marks a test (unlabeled) example.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MulticlassLabel {
    pub class: Option<u32>,
    pub weight: f32,
}

impl MulticlassLabel {
    pub fn new(class: u32, weight: f32) -> Self {
        Self {
            class: Some(class),
            weight,
        }
    }

    pub fn test() -> Self {
        Self {
            class: None,
            weight: 1.0,
        }
    }

    pub fn is_test(&self) -> bool {
        self.class.is_none()
    }
}

/// Per-class costs handed to the learner; entry `i` is the cost of class `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSensitiveLabel {
    pub costs: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Label {
    Class(MulticlassLabel),
    Costs(CostSensitiveLabel),
}

impl Label {
    /// The multiclass label, if this is one.
    pub fn multiclass(&self) -> Option<&MulticlassLabel> {
        match self {
            Self::Class(label) => Some(label),
            Self::Costs(_) => None,
        }
    }

    pub fn costs(&self) -> Option<&[f32]> {
        match self {
            Self::Class(_) => None,
            Self::Costs(label) => Some(&label.costs),
        }
    }
}

// ---------------------------------------------------------------------------
// Example
// ---------------------------------------------------------------------------

/// One input example: namespaces of hashed features plus a label.
///
/// Feature count and sum of squares are derived from the namespaces, so
/// popping a namespace restores both exactly.
#[derive(Debug, Clone)]
pub struct Example {
    pub label: Label,
    /// Global read counter stamped by the source.
    pub example_counter: u64,
    /// Zero-based pass over the data this example was read in.
    pub pass: u64,
    namespaces: Vec<Namespace>,
    /// Cleared buffer kept from the last popped namespace.
    spare: Option<Namespace>,
}

impl Example {
    pub fn new(label: MulticlassLabel) -> Self {
        Self {
            label: Label::Class(label),
            example_counter: 0,
            pass: 0,
            namespaces: Vec::new(),
            spare: None,
        }
    }

    /// The empty example that separates sequences.
    pub fn boundary() -> Self {
        Self::new(MulticlassLabel::test())
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn namespaces_mut(&mut self) -> &mut [Namespace] {
        &mut self.namespaces
    }

    pub fn last_namespace(&self) -> Option<u8> {
        self.namespaces.last().map(|ns| ns.id)
    }

    pub fn has_namespace(&self, id: u8) -> bool {
        self.namespaces.iter().any(|ns| ns.id == id)
    }

    /// Hand out an empty namespace, reusing the last popped buffer when present.
    pub fn begin_namespace(&mut self, id: u8) -> Namespace {
        match self.spare.take() {
            Some(mut ns) => {
                ns.id = id;
                ns
            }
            None => Namespace::new(id),
        }
    }

    pub fn push_namespace(&mut self, namespace: Namespace) {
        self.namespaces.push(namespace);
    }

    pub fn pop_namespace(&mut self) -> Option<Namespace> {
        self.namespaces.pop()
    }

    /// Keep a popped namespace's buffers for the next `begin_namespace`.
    pub fn recycle_namespace(&mut self, mut namespace: Namespace) {
        namespace.clear();
        self.spare = Some(namespace);
    }

    /// Return the namespace with `id`, creating it at the end if absent.
    pub fn namespace_entry(&mut self, id: u8) -> &mut Namespace {
        let pos = match self.namespaces.iter().position(|ns| ns.id == id) {
            Some(pos) => pos,
            None => {
                self.namespaces.push(Namespace::new(id));
                self.namespaces.len() - 1
            }
        };
        &mut self.namespaces[pos]
    }

    pub fn num_features(&self) -> usize {
        self.namespaces.iter().map(Namespace::len).sum()
    }

    pub fn total_sum_feat_sq(&self) -> f32 {
        self.namespaces.iter().map(|ns| ns.sum_feat_sq).sum()
    }

    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.namespaces.iter().flat_map(|ns| ns.features.iter())
    }

    /// Add `amount` (wrapping) to every feature index.
    pub fn shift_indices(&mut self, amount: u32, add: bool) {
        for feature in self.namespaces.iter_mut().flat_map(|ns| ns.features.iter_mut()) {
            feature.weight_index = if add {
                feature.weight_index.wrapping_add(amount)
            } else {
                feature.weight_index.wrapping_sub(amount)
            };
        }
    }

    /// Whether this example separates sequences: no namespaces, or only the
    /// constant namespace.
    pub fn is_boundary(&self) -> bool {
        match self.namespaces.as_slice() {
            [] => true,
            [only] => only.id == CONSTANT_NAMESPACE,
            _ => false,
        }
    }

    /// Whether this example carries no true label.
    pub fn is_test(&self) -> bool {
        self.label.multiclass().map_or(true, MulticlassLabel::is_test)
    }

    pub fn multiclass(&self) -> Option<&MulticlassLabel> {
        self.label.multiclass()
    }

    pub fn multiclass_mut(&mut self) -> Option<&mut MulticlassLabel> {
        match &mut self.label {
            Label::Class(label) => Some(label),
            Label::Costs(_) => None,
        }
    }
}

//! Tree flattener: walk a JSON tree and collect eligible string leaves.

use page_path::{Path, Step};
use serde_json::Value;
use tracing::debug;

use crate::mapping::FlatMapping;
use crate::policy::{EligibilityPolicy, Verdict};

/// An eligible leaf and its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    pub path: Path,
    pub value: String,
    pub verdict: Verdict,
}

/// Leaf counts from one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenStats {
    /// Addressable scalar leaves visited.
    pub leaves: usize,
    pub eligible: usize,
    pub ineligible: usize,
    /// Leaves below an empty key, an array nested directly in an array, or
    /// an array at the root with no root label. They cannot be written as a
    /// path and are skipped.
    pub unaddressable: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flattened {
    pub entries: Vec<FlatEntry>,
    pub stats: FlattenStats,
}

impl Flattened {
    pub fn to_mapping(&self) -> FlatMapping {
        self.entries.iter().collect()
    }
}

/// Depth-first walker parameterized by a policy and an optional root label.
///
/// # Example
///
/// ```
/// use page_translate::flatten::Flattener;
/// use page_translate::policy::EligibilityPolicy;
/// use serde_json::json;
///
/// let policy = EligibilityPolicy::permissive();
/// let tree = json!({"a": {"b": ["x", "", 3]}, "c": true});
/// let out = Flattener::new(&policy).with_root_label("root").flatten(&tree);
///
/// let keys: Vec<String> = out.entries.iter().map(|e| e.path.to_string()).collect();
/// assert_eq!(keys, vec!["root.a.b[0]"]);
/// assert_eq!(out.stats.leaves, 4);
/// assert_eq!(out.stats.ineligible, 3);
/// ```
#[derive(Debug, Clone)]
pub struct Flattener<'p> {
    policy: &'p EligibilityPolicy,
    root_label: Option<String>,
}

impl<'p> Flattener<'p> {
    pub fn new(policy: &'p EligibilityPolicy) -> Self {
        Self {
            policy,
            root_label: None,
        }
    }

    /// Prefix every emitted path with a field step named `label`.
    ///
    /// An empty label is ignored.
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.root_label = (!label.is_empty()).then_some(label);
        self
    }

    pub fn flatten(&self, tree: &Value) -> Flattened {
        let mut path = Path::root();
        if let Some(label) = &self.root_label {
            // Non-empty by construction.
            let _ = path.push_field(label.as_str());
        }
        let mut out = Flattened::default();
        self.walk(tree, &mut path, &mut out);
        out
    }

    fn walk(&self, node: &Value, path: &mut Path, out: &mut Flattened) {
        match node {
            Value::Object(map) => {
                for (key, child) in map {
                    self.descend(Step::Field(key.clone()), child, path, out);
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    self.descend(Step::Index(idx), child, path, out);
                }
            }
            leaf => {
                out.stats.leaves += 1;
                let verdict = self.policy.verdict(path, leaf);
                match (verdict, leaf) {
                    (Verdict::Eligible, Value::String(text)) => {
                        out.stats.eligible += 1;
                        out.entries.push(FlatEntry {
                            path: path.clone(),
                            value: text.clone(),
                            verdict,
                        });
                    }
                    _ => {
                        out.stats.ineligible += 1;
                    }
                }
            }
        }
    }

    fn descend(&self, step: Step, child: &Value, path: &mut Path, out: &mut Flattened) {
        if let Err(err) = path.push(step) {
            let skipped = count_leaves(child);
            debug!(parent = %path, %err, skipped, "skipping unaddressable subtree");
            out.stats.unaddressable += skipped;
            return;
        }
        self.walk(child, path, out);
        path.pop();
    }
}

/// Flatten `tree` without a root label.
pub fn flatten(tree: &Value, policy: &EligibilityPolicy) -> Vec<FlatEntry> {
    Flattener::new(policy).flatten(tree).entries
}

fn count_leaves(node: &Value) -> usize {
    match node {
        Value::Object(map) => map.values().map(count_leaves).sum(),
        Value::Array(items) => items.iter().map(count_leaves).sum(),
        _ => 1,
    }
}

//! State file structures for recorded resource instances

use serde::Deserialize;
use std::collections::BTreeMap;

use blueprint_core::addrs::{AbsResourceInstance, InstanceKey, ResourceMode};
use blueprint_core::value::Value;

/// The state file recording created resources
///
/// Only read here; an absent state file is the empty default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    #[serde(default)]
    pub serial: u64,
    /// Unique identifier for this state lineage
    #[serde(default)]
    pub lineage: String,
    /// All recorded resources
    #[serde(default)]
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    /// Find the recorded object of one resource instance
    pub fn find_instance(&self, addr: &AbsResourceInstance) -> Option<&InstanceState> {
        let module = addr.module.to_string();
        let resource = addr.containing_resource();
        self.resources
            .iter()
            .find(|r| {
                r.module == module
                    && r.mode == resource.mode
                    && r.resource_type == resource.type_name
                    && r.name == resource.name
            })?
            .instances
            .iter()
            .find(|instance| instance.matches_key(addr.key.as_ref()))
    }
}

/// State of a single resource and its instances
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceState {
    /// Module instance path (e.g. `module.child`); empty for the root module
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub mode: ResourceMode,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Provider address (e.g. `registry.terraform.io/hashicorp/aws`)
    pub provider: String,
    #[serde(default)]
    pub instances: Vec<InstanceState>,
}

/// One instance of a resource with its recorded attributes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceState {
    /// `count` index or `for_each` key; absent for single-instance resources
    #[serde(default)]
    pub index_key: Option<serde_json::Value>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl InstanceState {
    fn matches_key(&self, key: Option<&InstanceKey>) -> bool {
        match (key, &self.index_key) {
            (None, None) => true,
            (Some(InstanceKey::Int(i)), Some(serde_json::Value::Number(n))) => n.as_i64() == Some(*i),
            (Some(InstanceKey::String(s)), Some(serde_json::Value::String(k))) => s == k,
            _ => false,
        }
    }

    /// Attributes as an object value
    pub fn value(&self) -> Value {
        Value::Map(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::from_json(v)))
                .collect(),
        )
    }
}

use std::collections::HashMap;
use std::sync::OnceLock;

/// A named set of symbolic constants, declared as an ordered list of `(name, value)`
/// pairs. Both lookup tables are built on first use.
#[derive(Debug)]
pub struct Enumeration {
    type_name: &'static str,
    members: &'static [(&'static str, i64)],
    tables: OnceLock<Tables>,
}

#[derive(Debug)]
struct Tables {
    value_map: HashMap<i64, &'static str>,
    str_map: HashMap<&'static str, i64>,
}

impl Enumeration {
    pub const fn new(type_name: &'static str, members: &'static [(&'static str, i64)]) -> Self {
        Self {
            type_name,
            members,
            tables: OnceLock::new(),
        }
    }

    fn tables(&self) -> &Tables {
        self.tables.get_or_init(|| Tables {
            value_map: self.members.iter().map(|&(name, value)| (value, name)).collect(),
            str_map: self.members.iter().copied().collect(),
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// value → name
    pub fn value_map(&self) -> &HashMap<i64, &'static str> {
        &self.tables().value_map
    }

    /// name → value
    pub fn str_map(&self) -> &HashMap<&'static str, i64> {
        &self.tables().str_map
    }

    pub fn name(&self, value: i64) -> Option<&'static str> {
        self.value_map().get(&value).copied()
    }

    /// Member names in declaration order
    pub fn names(&self) -> Vec<&'static str> {
        self.members.iter().map(|&(name, _)| name).collect()
    }

    pub fn from_str(&self, name: &str) -> Option<i64> {
        self.str_map().get(name).copied()
    }
}

/// Float helpers; rendered as `pull-<name>` classes
pub static QUICK_FLOAT: Enumeration =
    Enumeration::new("QuickFloat", &[("default", 0), ("left", 1), ("right", 2)]);

use crate::types::Region;
use std::collections::HashMap;

/// The frozen set of selectable districts plus the (at most one) active one.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: Vec<Region>,
    by_code: HashMap<String, usize>,
    active: Option<usize>,
}

impl RegionRegistry {
    /// Later duplicates of a code are ignored.
    pub fn new(regions: Vec<Region>) -> Self {
        let mut by_code = HashMap::with_capacity(regions.len());
        for (i, region) in regions.iter().enumerate() {
            by_code.entry(region.code.clone()).or_insert(i);
        }
        Self {
            regions,
            by_code,
            active: None,
        }
    }

    pub fn get(&self, code: &str) -> Option<&Region> {
        self.by_code.get(code).map(|&i| &self.regions[i])
    }

    pub fn active(&self) -> Option<&Region> {
        self.active.map(|i| &self.regions[i])
    }

    pub fn is_active(&self, code: &str) -> bool {
        self.active().is_some_and(|r| r.code == code)
    }

    /// Make `code` the active district and return the code it replaced.
    /// Unknown codes leave the selection untouched and return `None`.
    pub fn activate(&mut self, code: &str) -> Option<String> {
        let &index = self.by_code.get(code)?;
        let previous = self.active.replace(index);
        previous.map(|i| self.regions[i].code.clone())
    }

    /// Drop the active district, returning its code.
    pub fn clear(&mut self) -> Option<String> {
        self.active.take().map(|i| self.regions[i].code.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

use log::warn;
use std::collections::HashMap;
use std::hash::Hash;

/// An index of all the (ancestor, descendant, depth) pairs of a tree.
///
/// Every node is its own ancestor at depth 0. Membership of a node in the
/// subtree of another node is a single lookup, no traversal is required.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ClosureTable<Id: Eq + Hash> {
    // ancestor -> descendant -> depth, including the node itself at depth 0
    descendants: HashMap<Id, HashMap<Id, u32>>,
    // descendant -> proper ancestors with their depth, the root first
    ancestors: HashMap<Id, Vec<(Id, u32)>>,
}

impl<Id: Eq + Hash + Copy + Ord> Default for ClosureTable<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Eq + Hash + Copy + Ord> ClosureTable<Id> {
    pub fn new() -> ClosureTable<Id> {
        ClosureTable {
            descendants: HashMap::new(),
            ancestors: HashMap::new(),
        }
    }

    pub fn contains(&self, node: Id) -> bool {
        self.ancestors.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.ancestors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ancestors.is_empty()
    }

    /// Adds a node under the given parent (or as a root).
    ///
    /// Returns false if the node is already present or if the parent is unknown.
    pub fn insert(&mut self, node: Id, parent: Option<Id>) -> bool {
        if self.contains(node) {
            return false;
        }
        let mut node_ancestors: Vec<(Id, u32)> = Vec::new();
        if let Some(pid) = parent {
            match self.ancestors.get(&pid) {
                Some(parent_ancestors) => {
                    node_ancestors.extend(parent_ancestors.iter().map(|(a, d)| (*a, d + 1)));
                    node_ancestors.push((pid, 1));
                }
                None => return false,
            }
        }
        for (a, d) in node_ancestors.iter() {
            self.descendants.entry(*a).or_default().insert(node, *d);
        }
        self.descendants
            .entry(node)
            .or_default()
            .insert(node, 0);
        self.ancestors.insert(node, node_ancestors);
        true
    }

    /// The proper ancestors of a node, from the root down to the parent.
    pub fn ancestors(&self, node: Id) -> Vec<Id> {
        self.ancestors
            .get(&node)
            .map(|l| l.iter().map(|(a, _)| *a).collect())
            .unwrap_or_default()
    }

    /// The proper descendants of a node, ordered by depth.
    pub fn descendants(&self, node: Id) -> Vec<Id> {
        let mut res: Vec<(u32, Id)> = self
            .descendants
            .get(&node)
            .map(|m| {
                m.iter()
                    .filter(|(_, d)| **d > 0)
                    .map(|(id, d)| (*d, *id))
                    .collect()
            })
            .unwrap_or_default();
        res.sort();
        res.iter().map(|(_, id)| *id).collect()
    }

    pub fn children(&self, node: Id) -> Vec<Id> {
        let mut res: Vec<Id> = self
            .descendants
            .get(&node)
            .map(|m| {
                m.iter()
                    .filter(|(_, d)| **d == 1)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default();
        res.sort();
        res
    }

    pub fn depth(&self, ancestor: Id, descendant: Id) -> Option<u32> {
        self.descendants
            .get(&ancestor)
            .and_then(|m| m.get(&descendant))
            .cloned()
    }

    pub fn is_descendant_or_self(&self, ancestor: Id, descendant: Id) -> bool {
        self.depth(ancestor, descendant).is_some()
    }

    /// The nodes without a proper ancestor.
    pub fn roots(&self) -> Vec<Id> {
        let mut res: Vec<Id> = self
            .ancestors
            .iter()
            .filter(|(_, l)| l.is_empty())
            .map(|(id, _)| *id)
            .collect();
        res.sort();
        res
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct LocationTypeId(pub usize);

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct LocationId(pub usize);

/// A level of the administrative divisions (Province, District, Polling Station, ...).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LocationType {
    pub id: LocationTypeId,
    pub name: String,
    /// Results are broken down by the political location types.
    pub is_political: bool,
    pub is_administrative: bool,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Location {
    pub id: LocationId,
    pub code: String,
    pub name: String,
    pub location_type: LocationTypeId,
    pub registered_voters: Option<u64>,
}

/// The administrative divisions of an election.
///
/// Use the `LocationTreeBuilder` to create one.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LocationTree {
    pub(crate) location_types: Vec<LocationType>,
    pub(crate) locations: Vec<Location>,
    pub(crate) type_paths: ClosureTable<LocationTypeId>,
    pub(crate) paths: ClosureTable<LocationId>,
    pub(crate) codes: HashMap<String, LocationId>,
}

impl LocationTree {
    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.0]
    }

    pub fn location_type(&self, id: LocationTypeId) -> &LocationType {
        &self.location_types[id.0]
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn by_code(&self, code: &str) -> Option<&Location> {
        self.codes.get(code).map(|id| self.location(*id))
    }

    pub fn location_type_by_name(&self, name: &str) -> Option<&LocationType> {
        self.location_types.iter().find(|lt| lt.name == name)
    }

    pub fn type_name(&self, location: LocationId) -> &str {
        self.location_type(self.location(location).location_type)
            .name
            .as_str()
    }

    /// The top location. With several top locations, the first one declared.
    pub fn root(&self) -> Option<&Location> {
        let roots = self.paths.roots();
        if roots.len() > 1 {
            warn!(
                "LocationTree::root: {} locations without a parent, using {:?}",
                roots.len(),
                self.location(roots[0]).code
            );
        }
        roots.first().map(|id| self.location(*id))
    }

    pub fn ancestors(&self, location: LocationId) -> Vec<&Location> {
        self.paths
            .ancestors(location)
            .iter()
            .map(|id| self.location(*id))
            .collect()
    }

    pub fn descendants(&self, location: LocationId) -> Vec<&Location> {
        self.paths
            .descendants(location)
            .iter()
            .map(|id| self.location(*id))
            .collect()
    }

    pub fn children(&self, location: LocationId) -> Vec<&Location> {
        self.paths
            .children(location)
            .iter()
            .map(|id| self.location(*id))
            .collect()
    }

    pub fn contains(&self, ancestor: LocationId, descendant: LocationId) -> bool {
        self.paths.is_descendant_or_self(ancestor, descendant)
    }

    /// The location itself or its ancestor with the given location type.
    pub fn ancestor_of_type(
        &self,
        location: LocationId,
        location_type: LocationTypeId,
    ) -> Option<LocationId> {
        if self.location(location).location_type == location_type {
            return Some(location);
        }
        self.paths
            .ancestors(location)
            .into_iter()
            .find(|id| self.location(*id).location_type == location_type)
    }

    /// The names of the ancestors (and the location itself), keyed by location type.
    pub fn make_path(&self, location: LocationId) -> Vec<(String, String)> {
        let mut res: Vec<(String, String)> = self
            .ancestors(location)
            .iter()
            .map(|l| {
                (
                    self.location_type(l.location_type).name.clone(),
                    l.name.clone(),
                )
            })
            .collect();
        let loc = self.location(location);
        res.push((
            self.location_type(loc.location_type).name.clone(),
            loc.name.clone(),
        ));
        res
    }

    /// All the location types, from the top of the hierarchy down.
    pub fn ordered_location_types(&self) -> Vec<&LocationType> {
        let mut res: Vec<&LocationType> = Vec::new();
        for root in self.type_paths.roots() {
            res.push(self.location_type(root));
            res.extend(
                self.type_paths
                    .descendants(root)
                    .iter()
                    .map(|id| self.location_type(*id)),
            );
        }
        res
    }

    /// The political location types below the top of the hierarchy.
    pub fn political_location_types(&self) -> Vec<&LocationType> {
        let mut res: Vec<&LocationType> = Vec::new();
        for root in self.type_paths.roots() {
            res.extend(
                self.type_paths
                    .descendants(root)
                    .iter()
                    .map(|id| self.location_type(*id))
                    .filter(|lt| lt.is_political),
            );
        }
        res
    }

    pub fn is_type_ancestor(&self, ancestor: LocationTypeId, descendant: LocationTypeId) -> bool {
        self.type_paths
            .depth(ancestor, descendant)
            .map(|d| d > 0)
            .unwrap_or(false)
    }

    /// The locations of a type within the subtree of a location, sorted by name.
    pub fn locations_of_type(
        &self,
        location_type: LocationTypeId,
        within: LocationId,
    ) -> Vec<&Location> {
        let mut res: Vec<&Location> = Vec::new();
        let within_loc = self.location(within);
        if within_loc.location_type == location_type {
            res.push(within_loc);
        }
        res.extend(
            self.descendants(within)
                .into_iter()
                .filter(|l| l.location_type == location_type),
        );
        res.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> ClosureTable<u32> {
        // 1 -> 2 -> {3, 4}, 1 -> 5
        let mut ct = ClosureTable::new();
        assert!(ct.insert(1, None));
        assert!(ct.insert(2, Some(1)));
        assert!(ct.insert(3, Some(2)));
        assert!(ct.insert(4, Some(2)));
        assert!(ct.insert(5, Some(1)));
        ct
    }

    #[test]
    fn closure_depths() {
        let ct = sample_table();
        assert_eq!(ct.depth(1, 1), Some(0));
        assert_eq!(ct.depth(1, 2), Some(1));
        assert_eq!(ct.depth(1, 4), Some(2));
        assert_eq!(ct.depth(2, 5), None);
        assert_eq!(ct.depth(3, 1), None);
        assert_eq!(ct.len(), 5);
    }

    #[test]
    fn closure_navigation() {
        let ct = sample_table();
        assert_eq!(ct.ancestors(4), vec![1, 2]);
        assert_eq!(ct.ancestors(1), Vec::<u32>::new());
        assert_eq!(ct.descendants(1), vec![2, 5, 3, 4]);
        assert_eq!(ct.children(1), vec![2, 5]);
        assert_eq!(ct.children(3), Vec::<u32>::new());
        assert_eq!(ct.roots(), vec![1]);
        assert!(ct.is_descendant_or_self(2, 3));
        assert!(ct.is_descendant_or_self(3, 3));
        assert!(!ct.is_descendant_or_self(5, 3));
    }

    #[test]
    fn closure_rejects_bad_inserts() {
        let mut ct = sample_table();
        assert!(!ct.insert(3, Some(1)));
        assert!(!ct.insert(6, Some(42)));
        assert!(!ct.contains(6));
        assert_eq!(ct.len(), 5);
    }
}

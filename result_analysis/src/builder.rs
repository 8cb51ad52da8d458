use std::collections::HashMap;

pub use crate::config::*;
use crate::location::*;

/// A builder for the administrative divisions.
///
/// Location types and locations must be added parents first.
///
/// ```
/// pub use result_analysis::builder::LocationTreeBuilder;
/// # use result_analysis::AnalysisErrors;
///
/// let mut builder = LocationTreeBuilder::new();
/// builder.location_type("Country", None, false, true)?;
/// builder.location_type("Ward", Some("Country"), true, true)?;
/// builder.location("ZM", "Zambia", "Country", None, None)?;
/// builder.location("W1", "Ward 1", "Ward", Some("ZM"), Some(2000))?;
/// let tree = builder.build();
///
/// assert_eq!(tree.root().map(|l| l.name.as_str()), Some("Zambia"));
/// # Ok::<(), AnalysisErrors>(())
/// ```
pub struct LocationTreeBuilder {
    _location_types: Vec<LocationType>,
    _locations: Vec<Location>,
    _type_paths: ClosureTable<LocationTypeId>,
    _paths: ClosureTable<LocationId>,
    _codes: HashMap<String, LocationId>,
}

impl Default for LocationTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationTreeBuilder {
    pub fn new() -> LocationTreeBuilder {
        LocationTreeBuilder {
            _location_types: Vec::new(),
            _locations: Vec::new(),
            _type_paths: ClosureTable::new(),
            _paths: ClosureTable::new(),
            _codes: HashMap::new(),
        }
    }

    fn type_id(&self, name: &str) -> Result<LocationTypeId, AnalysisErrors> {
        self._location_types
            .iter()
            .find(|lt| lt.name == name)
            .map(|lt| lt.id)
            .ok_or_else(|| AnalysisErrors::UnknownLocationType(name.to_string()))
    }

    pub fn location_type(
        &mut self,
        name: &str,
        parent: Option<&str>,
        is_political: bool,
        is_administrative: bool,
    ) -> Result<LocationTypeId, AnalysisErrors> {
        if self.type_id(name).is_ok() {
            return Err(AnalysisErrors::DuplicateLocationType(name.to_string()));
        }
        let parent_id = match parent {
            Some(p) => Some(self.type_id(p)?),
            None => None,
        };
        let id = LocationTypeId(self._location_types.len());
        self._type_paths.insert(id, parent_id);
        self._location_types.push(LocationType {
            id,
            name: name.to_string(),
            is_political,
            is_administrative,
        });
        Ok(id)
    }

    /// Adds a location.
    ///
    /// The location type of the parent must be an ancestor of the location type
    /// of the new location.
    pub fn location(
        &mut self,
        code: &str,
        name: &str,
        location_type: &str,
        parent: Option<&str>,
        registered_voters: Option<u64>,
    ) -> Result<LocationId, AnalysisErrors> {
        if self._codes.contains_key(code) {
            return Err(AnalysisErrors::DuplicateLocation(code.to_string()));
        }
        let type_id = self.type_id(location_type)?;
        let parent_id = match parent {
            Some(p) => {
                let pid = *self
                    ._codes
                    .get(p)
                    .ok_or_else(|| AnalysisErrors::UnknownLocation(p.to_string()))?;
                let ptype = self._locations[pid.0].location_type;
                let valid = self
                    ._type_paths
                    .depth(ptype, type_id)
                    .map(|d| d > 0)
                    .unwrap_or(false);
                if !valid {
                    return Err(AnalysisErrors::InvalidParent {
                        location: code.to_string(),
                        parent: p.to_string(),
                    });
                }
                Some(pid)
            }
            None => None,
        };
        let id = LocationId(self._locations.len());
        self._paths.insert(id, parent_id);
        self._codes.insert(code.to_string(), id);
        self._locations.push(Location {
            id,
            code: code.to_string(),
            name: name.to_string(),
            location_type: type_id,
            registered_voters,
        });
        Ok(id)
    }

    pub fn build(self) -> LocationTree {
        LocationTree {
            location_types: self._location_types,
            locations: self._locations,
            type_paths: self._type_paths,
            paths: self._paths,
            codes: self._codes,
        }
    }
}

//! Department → province → district hierarchy.
//!
//! The bundled hierarchy is compiled in from `data/peru_locations.yaml`; an
//! alternative file with the same shape can be loaded with
//! [`LocationHierarchy::load`]. Order in the file is preserved everywhere,
//! so searches always run in the same sequence.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::record::SearchLocation;
use crate::{ConfigError, HierarchyError};

const BUNDLED_LOCATIONS: &str = include_str!("../data/peru_locations.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct Province {
    pub name: String,
    pub districts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Department {
    pub name: String,
    pub provinces: Vec<Province>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationHierarchy {
    pub departments: Vec<Department>,
}

/// Which parts of the hierarchy a run should cover.
///
/// Empty `provinces`/`districts` mean "all of them" within the selected
/// departments. `all` ignores the other fields and selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationSelection {
    pub all: bool,
    pub departments: Vec<String>,
    pub provinces: Vec<String>,
    pub districts: Vec<String>,
}

impl LocationHierarchy {
    /// Parses the hierarchy compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the bundled file fails to parse or validate.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_yaml_str(BUNDLED_LOCATIONS)
    }

    /// Loads and validates a hierarchy from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocationFileIo {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parses and validates a hierarchy from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on malformed YAML, empty names, or duplicate
    /// department/province names.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let hierarchy: LocationHierarchy = serde_yaml::from_str(content)?;
        hierarchy.validate()?;
        Ok(hierarchy)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_departments = HashSet::new();
        for department in &self.departments {
            if department.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "department name must be non-empty".to_string(),
                ));
            }
            if !seen_departments.insert(department.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate department: '{}'",
                    department.name
                )));
            }

            let mut seen_provinces = HashSet::new();
            for province in &department.provinces {
                if !seen_provinces.insert(province.name.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "duplicate province '{}' in department '{}'",
                        province.name, department.name
                    )));
                }
                if province.districts.iter().any(|d| d.trim().is_empty()) {
                    return Err(ConfigError::Validation(format!(
                        "empty district name in province '{}'",
                        province.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn department_names(&self) -> impl Iterator<Item = &str> {
        self.departments.iter().map(|d| d.name.as_str())
    }

    /// # Errors
    ///
    /// Returns [`HierarchyError::DepartmentNotFound`] for an unknown department.
    pub fn department(&self, name: &str) -> Result<&Department, HierarchyError> {
        self.departments
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| HierarchyError::DepartmentNotFound(name.to_string()))
    }

    /// Ordered province names of a department.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::DepartmentNotFound`] for an unknown department.
    pub fn provinces(&self, department: &str) -> Result<Vec<&str>, HierarchyError> {
        Ok(self
            .department(department)?
            .provinces
            .iter()
            .map(|p| p.name.as_str())
            .collect())
    }

    /// Ordered district names of a province.
    ///
    /// # Errors
    ///
    /// Returns a not-found error naming whichever level failed to resolve.
    pub fn districts(&self, department: &str, province: &str) -> Result<&[String], HierarchyError> {
        self.department(department)?
            .provinces
            .iter()
            .find(|p| p.name == province)
            .map(|p| p.districts.as_slice())
            .ok_or_else(|| HierarchyError::ProvinceNotFound {
                department: department.to_string(),
                province: province.to_string(),
            })
    }

    /// Every location in hierarchy order.
    #[must_use]
    pub fn all_locations(&self) -> Vec<SearchLocation> {
        self.departments
            .iter()
            .flat_map(|d| {
                d.provinces.iter().flat_map(move |p| {
                    p.districts
                        .iter()
                        .map(move |district| SearchLocation::new(&d.name, &p.name, district))
                })
            })
            .collect()
    }

    /// Expands a selection into concrete search locations, in hierarchy order.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for any named department, province, or
    /// district that does not exist under the selected parents, and
    /// [`HierarchyError::NothingSelected`] if the selection is empty.
    pub fn select(&self, selection: &LocationSelection) -> Result<Vec<SearchLocation>, HierarchyError> {
        if selection.all {
            return Ok(self.all_locations());
        }
        if selection.departments.is_empty() {
            return Err(HierarchyError::NothingSelected);
        }

        let mut matched_provinces: HashSet<&str> = HashSet::new();
        let mut matched_districts: HashSet<&str> = HashSet::new();
        let mut locations = Vec::new();

        for department_name in &selection.departments {
            let department = self.department(department_name)?;
            for province in &department.provinces {
                if !selection.provinces.is_empty() && !selection.provinces.contains(&province.name) {
                    continue;
                }
                matched_provinces.insert(province.name.as_str());
                for district in &province.districts {
                    if !selection.districts.is_empty() && !selection.districts.contains(district) {
                        continue;
                    }
                    matched_districts.insert(district.as_str());
                    locations.push(SearchLocation::new(&department.name, &province.name, district));
                }
            }
        }

        if let Some(missing) = selection
            .provinces
            .iter()
            .find(|p| !matched_provinces.contains(p.as_str()))
        {
            return Err(HierarchyError::ProvinceNotFound {
                department: selection.departments.join(", "),
                province: missing.clone(),
            });
        }
        if let Some(missing) = selection
            .districts
            .iter()
            .find(|d| !matched_districts.contains(d.as_str()))
        {
            return Err(HierarchyError::DistrictNotFound(missing.clone()));
        }
        if locations.is_empty() {
            return Err(HierarchyError::NothingSelected);
        }
        Ok(locations)
    }
}

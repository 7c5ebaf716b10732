//! The `locations` command: browse the department → province → district tree.

use mapscout_core::hierarchy::LocationHierarchy;
use mapscout_core::HierarchyError;

/// Names one level down from the given parents.
///
/// No department lists departments, a department lists its provinces, and a
/// department plus province lists its districts.
///
/// # Errors
///
/// Returns a not-found error for an unknown department or province, or
/// [`HierarchyError::NothingSelected`] if a province is given without its
/// department.
pub fn listing(
    hierarchy: &LocationHierarchy,
    department: Option<&str>,
    province: Option<&str>,
) -> Result<Vec<String>, HierarchyError> {
    match (department, province) {
        (None, None) => Ok(hierarchy.department_names().map(str::to_string).collect()),
        (Some(department), None) => Ok(hierarchy
            .provinces(department)?
            .into_iter()
            .map(str::to_string)
            .collect()),
        (Some(department), Some(province)) => Ok(hierarchy.districts(department, province)?.to_vec()),
        (None, Some(_)) => Err(HierarchyError::NothingSelected),
    }
}

/// Prints one name per line.
///
/// # Errors
///
/// See [`listing`].
pub fn run_locations(
    hierarchy: &LocationHierarchy,
    department: Option<&str>,
    province: Option<&str>,
) -> Result<(), HierarchyError> {
    for name in listing(hierarchy, department, province)? {
        println!("{name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hierarchy() -> LocationHierarchy {
        LocationHierarchy::from_yaml_str(
            r"
departments:
  - name: Lima
    provinces:
      - name: Lima
        districts: [Miraflores, Barranco]
      - name: Huaral
        districts: [Chancay]
  - name: Cusco
    provinces:
      - name: Cusco
        districts: [Wanchaq]
",
        )
        .unwrap()
    }

    #[test]
    fn lists_each_level_in_file_order() {
        let h = hierarchy();
        assert_eq!(listing(&h, None, None).unwrap(), vec!["Lima", "Cusco"]);
        assert_eq!(listing(&h, Some("Lima"), None).unwrap(), vec!["Lima", "Huaral"]);
        assert_eq!(
            listing(&h, Some("Lima"), Some("Lima")).unwrap(),
            vec!["Miraflores", "Barranco"]
        );
    }

    #[test]
    fn unknown_names_are_reported() {
        let h = hierarchy();
        assert_eq!(
            listing(&h, Some("Tacna"), None).unwrap_err(),
            HierarchyError::DepartmentNotFound("Tacna".into())
        );
        assert!(matches!(
            listing(&h, Some("Cusco"), Some("Urubamba")),
            Err(HierarchyError::ProvinceNotFound { .. })
        ));
    }

    #[test]
    fn province_needs_a_department() {
        assert_eq!(
            listing(&hierarchy(), None, Some("Lima")).unwrap_err(),
            HierarchyError::NothingSelected
        );
    }
}

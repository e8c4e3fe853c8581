//! Azure region data model.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct LocationList {
    #[serde(rename = "Location", default)]
    pub locations: Vec<Location>,
}

/// Represents an Azure region and the services it offers.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Location {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "DisplayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "AvailableServices", default)]
    pub available_services: AvailableServices,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AvailableServices {
    #[serde(rename = "AvailableService", default)]
    pub services: Vec<String>,
}

impl Location {
    pub fn offers(&self, service: &str) -> bool {
        self.available_services
            .services
            .iter()
            .any(|s| s.eq_ignore_ascii_case(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::from_xml;

    #[test]
    fn test_parse_locations() {
        let list: LocationList = from_xml(include_str!("../tests/test_data/locations.xml"))
            .expect("Error parsing locations");
        assert_eq!(list.locations.len(), 2);
        assert_eq!(list.locations[0].name, "West US");
        assert!(list.locations[0].offers("compute"));
        assert!(!list.locations[1].offers("PersistentVMRole"));
    }
}

//! Sample routing-table entry used by the demo.

use serde::{Deserialize, Serialize};

/// One line of a kernel routing table (`route -n`).
///
/// Fields follow protobuf JSON conventions: lower-case names and zero
/// values left out of the stored document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    /// Destination network
    #[serde(skip_serializing_if = "String::is_empty")]
    pub destination: String,
    /// Next hop; `0.0.0.0` for directly connected networks
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gateway: String,
    /// Netmask for the destination
    #[serde(skip_serializing_if = "String::is_empty")]
    pub genmask: String,
    /// Route flags such as `U` or `UG`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub flags: String,
    /// Distance to the target
    #[serde(skip_serializing_if = "is_zero")]
    pub metric: i32,
    /// Number of references to this route
    #[serde(rename = "ref", skip_serializing_if = "is_zero")]
    pub references: i32,
    /// Count of lookups for the route
    #[serde(rename = "use", skip_serializing_if = "is_zero")]
    pub uses: i32,
    /// Interface packets for this route are sent on
    #[serde(skip_serializing_if = "String::is_empty")]
    pub iface: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &i32) -> bool {
    *value == 0
}

impl Route {
    /// The directly connected LAN route inserted by the demo.
    pub fn sample() -> Self {
        Self {
            destination: "192.168.79.0".to_string(),
            gateway: "0.0.0.0".to_string(),
            genmask: "255.255.255.0".to_string(),
            flags: "U".to_string(),
            metric: 100,
            references: 0,
            uses: 0,
            iface: "ens33".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routedb_core::bson;

    #[test]
    fn test_sample_route_document_omits_zero_values() {
        let document = bson::to_document(&Route::sample()).unwrap();

        assert_eq!(document.get_str("destination").unwrap(), "192.168.79.0");
        assert_eq!(document.get_str("gateway").unwrap(), "0.0.0.0");
        assert_eq!(document.get_i32("metric").unwrap(), 100);
        assert!(!document.contains_key("ref"));
        assert!(!document.contains_key("use"));
    }

    #[test]
    fn test_route_reads_back_with_reserved_names() {
        let document = bson::doc! {
            "_id": bson::oid::ObjectId::new(),
            "destination": "0.0.0.0",
            "gateway": "192.168.79.2",
            "flags": "UG",
            "ref": 2,
            "use": 7,
            "iface": "ens33",
        };

        let route: Route = bson::from_document(document).unwrap();
        assert_eq!(route.gateway, "192.168.79.2");
        assert_eq!(route.references, 2);
        assert_eq!(route.uses, 7);
        assert_eq!(route.metric, 0);
        assert_eq!(route.genmask, "");
    }
}

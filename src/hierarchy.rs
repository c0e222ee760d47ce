//! # Location Hierarchy Module
//!
//! Read-only region → district → neighborhood tree loaded once at startup.
//! Each neighborhood leaf carries the chat that receives submissions for it.
//!
//! The source document is a nested JSON object:
//!
//! ```json
//! { "North": { "CityA": { "ZoneX": -1001234567890, "ZoneY": "@zone_y_officer" } } }
//! ```
//!
//! Keys keep their document order so menus list them the way the file does.
//! Lookups are exact, case- and whitespace-sensitive string matches.

use std::fmt;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::HierarchyError;

/// Public Telegram username: a letter, then letters, digits or `_`; 5 to 32 long
pub const CHANNEL_USERNAME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_]{4,31}$";

lazy_static! {
    static ref CHANNEL_USERNAME: Regex =
        Regex::new(CHANNEL_USERNAME_PATTERN).expect("Channel username pattern should be valid");
}

/// Destination chat for a neighborhood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelId {
    /// Numeric chat id (private chat, group or channel)
    Numeric(i64),
    /// Public channel username, always starting with `@`
    Username(String),
}

impl ChannelId {
    /// Parse a string leaf: integers are numeric ids, otherwise a public
    /// channel username with or without the leading `@`
    pub fn parse_str(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(id) = trimmed.parse::<i64>() {
            return Some(ChannelId::Numeric(id));
        }
        let name = trimmed.strip_prefix('@').unwrap_or(trimmed);
        if !CHANNEL_USERNAME.is_match(name) {
            return None;
        }
        Some(ChannelId::Username(format!("@{name}")))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Numeric(id) => write!(f, "{id}"),
            ChannelId::Username(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Neighborhood {
    pub name: String,
    pub channel: ChannelId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct District {
    pub name: String,
    pub neighborhoods: Vec<Neighborhood>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub districts: Vec<District>,
}

impl Region {
    pub fn district(&self, name: &str) -> Option<&District> {
        self.districts.iter().find(|d| d.name == name)
    }
}

impl District {
    pub fn neighborhood(&self, name: &str) -> Option<&Neighborhood> {
        self.neighborhoods.iter().find(|n| n.name == name)
    }
}

/// Immutable three-level location tree
#[derive(Debug, Clone, PartialEq)]
pub struct LocationHierarchy {
    regions: Vec<Region>,
}

impl LocationHierarchy {
    /// Load the hierarchy from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HierarchyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| HierarchyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let hierarchy = Self::from_json_str(&content)?;

        info!(
            path = %path.display(),
            regions = hierarchy.regions.len(),
            destinations = hierarchy.destination_count(),
            "Location hierarchy loaded"
        );

        Ok(hierarchy)
    }

    /// Parse and validate a hierarchy document
    pub fn from_json_str(content: &str) -> Result<Self, HierarchyError> {
        let root: Value = serde_json::from_str(content)?;
        let root = as_non_empty_object(&root, "<root>")?;

        let mut regions = Vec::with_capacity(root.len());
        for (region_name, districts_value) in root {
            let districts_map = as_non_empty_object(districts_value, region_name)?;

            let mut districts = Vec::with_capacity(districts_map.len());
            for (district_name, neighborhoods_value) in districts_map {
                let path = format!("{region_name} / {district_name}");
                let neighborhoods_map = as_non_empty_object(neighborhoods_value, &path)?;

                let mut neighborhoods = Vec::with_capacity(neighborhoods_map.len());
                for (neighborhood_name, leaf) in neighborhoods_map {
                    let leaf_path = format!("{path} / {neighborhood_name}");
                    neighborhoods.push(Neighborhood {
                        name: neighborhood_name.clone(),
                        channel: parse_channel(leaf, leaf_path)?,
                    });
                }

                districts.push(District {
                    name: district_name.clone(),
                    neighborhoods,
                });
            }

            regions.push(Region {
                name: region_name.clone(),
                districts,
            });
        }

        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Region names in document order
    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name.clone()).collect()
    }

    /// District names under a region, `None` if the region is unknown
    pub fn district_names(&self, region: &str) -> Option<Vec<String>> {
        self.region(region)
            .map(|r| r.districts.iter().map(|d| d.name.clone()).collect())
    }

    /// Neighborhood names under a district, `None` if the path is unknown
    pub fn neighborhood_names(&self, region: &str, district: &str) -> Option<Vec<String>> {
        self.region(region)
            .and_then(|r| r.district(district))
            .map(|d| d.neighborhoods.iter().map(|n| n.name.clone()).collect())
    }

    /// Destination channel for a full selection
    pub fn resolve(&self, region: &str, district: &str, neighborhood: &str) -> Option<&ChannelId> {
        self.region(region)
            .and_then(|r| r.district(district))
            .and_then(|d| d.neighborhood(neighborhood))
            .map(|n| &n.channel)
    }

    /// Number of neighborhood leaves
    pub fn destination_count(&self) -> usize {
        self.regions
            .iter()
            .flat_map(|r| r.districts.iter())
            .map(|d| d.neighborhoods.len())
            .sum()
    }
}

fn as_non_empty_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a Map<String, Value>, HierarchyError> {
    let map = value.as_object().ok_or_else(|| HierarchyError::InvalidShape {
        path: path.to_string(),
        expected: "an object",
    })?;
    if map.is_empty() {
        return Err(HierarchyError::Empty {
            path: path.to_string(),
        });
    }
    Ok(map)
}

fn parse_channel(value: &Value, path: String) -> Result<ChannelId, HierarchyError> {
    let channel = match value {
        Value::Number(n) => n.as_i64().map(ChannelId::Numeric),
        Value::String(s) => ChannelId::parse_str(s),
        _ => None,
    };
    channel.ok_or(HierarchyError::InvalidShape {
        path,
        expected: "an integer chat id or a channel username",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_from_string() {
        assert_eq!(
            ChannelId::parse_str("-100123"),
            Some(ChannelId::Numeric(-100123))
        );
        assert_eq!(
            ChannelId::parse_str("zone_officer"),
            Some(ChannelId::Username("@zone_officer".to_string()))
        );
        assert_eq!(
            ChannelId::parse_str("@zone_officer"),
            Some(ChannelId::Username("@zone_officer".to_string()))
        );
        assert_eq!(ChannelId::parse_str("  "), None);
        assert_eq!(ChannelId::parse_str("@"), None);
    }

    #[test]
    fn test_channel_username_charset() {
        for raw in [
            "Навбахор канал",
            "zone officer",
            "@@zone_officer",
            "abc",
            "1zone_officer",
            "zone-officer",
            "@a_very_long_channel_name_over_32_chars",
        ] {
            assert_eq!(ChannelId::parse_str(raw), None, "{raw} should be rejected");
        }
        assert_eq!(
            ChannelId::parse_str(" @Zone_5 "),
            Some(ChannelId::Username("@Zone_5".to_string()))
        );
    }

    #[test]
    fn test_keys_keep_document_order() {
        let hierarchy =
            LocationHierarchy::from_json_str(r#"{"Zeta": {"B": {"x": 1}}, "Alpha": {"A": {"y": 2}}}"#)
                .unwrap();
        assert_eq!(hierarchy.region_names(), vec!["Zeta", "Alpha"]);
    }
}

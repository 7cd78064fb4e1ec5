//! Table descriptors and the per-map naming convention.
//!
//! Every map (tenant) owns a private copy of six canonical tables, named by
//! suffixing the canonical name with `_<map id>`, plus four id sequences named
//! `<canonical>_<map id>_id_seq`. This module is the only place that spells the
//! convention out; the overlay and the lifecycle manager both derive names here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::SEQUENCE_SUFFIX;
use crate::error::{AppError, Result};

/// A shared table whose rows can be referenced by id or by display name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Entity label used in error messages
    pub entity: &'static str,
    pub name: &'static str,
    pub id_column: &'static str,
    pub display_name_column: &'static str,
}

/// Map registry: one row per tenant
pub const MAPS: TableDescriptor = TableDescriptor {
    entity: "map",
    name: "maps",
    id_column: "id",
    display_name_column: "display_name",
};

pub const USERS: TableDescriptor = TableDescriptor {
    entity: "user",
    name: "users",
    id_column: "id",
    display_name_column: "display_name",
};

/// Identifies one map's private table set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    pub fn new(id: i64) -> Result<Self> {
        if id < 0 {
            return Err(AppError::InvalidInput(format!(
                "Map ID must be non-negative, got {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tables replicated per map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalTable {
    CurrentWayNodes,
    CurrentRelationMembers,
    CurrentNodes,
    CurrentWays,
    CurrentRelations,
    Changesets,
}

impl CanonicalTable {
    pub const ALL: [CanonicalTable; 6] = [
        CanonicalTable::CurrentWayNodes,
        CanonicalTable::CurrentRelationMembers,
        CanonicalTable::CurrentNodes,
        CanonicalTable::CurrentWays,
        CanonicalTable::CurrentRelations,
        CanonicalTable::Changesets,
    ];

    /// Tables with a generated id column, in sequence enumeration order
    pub const SEQUENCED: [CanonicalTable; 4] = [
        CanonicalTable::CurrentNodes,
        CanonicalTable::CurrentWays,
        CanonicalTable::CurrentRelations,
        CanonicalTable::Changesets,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalTable::CurrentWayNodes => "current_way_nodes",
            CanonicalTable::CurrentRelationMembers => "current_relation_members",
            CanonicalTable::CurrentNodes => "current_nodes",
            CanonicalTable::CurrentWays => "current_ways",
            CanonicalTable::CurrentRelations => "current_relations",
            CanonicalTable::Changesets => "changesets",
        }
    }
}

/// Physical table name for `canonical` in the given map
pub fn physical_table_name(canonical: &str, tenant: TenantId) -> String {
    format!("{canonical}_{tenant}")
}

/// Physical id sequence name for `canonical` in the given map
pub fn sequence_name(canonical: &str, tenant: TenantId) -> String {
    format!("{canonical}_{tenant}{SEQUENCE_SUFFIX}")
}

pub fn all_table_names(tenant: TenantId) -> [String; 6] {
    CanonicalTable::ALL.map(|table| physical_table_name(table.as_str(), tenant))
}

pub fn all_sequence_names(tenant: TenantId) -> [String; 4] {
    CanonicalTable::SEQUENCED.map(|table| sequence_name(table.as_str(), tenant))
}

/// Parses a string made only of ASCII digits
pub(crate) fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Quote an SQL identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: i64) -> TenantId {
        TenantId::new(id).unwrap()
    }

    #[test]
    fn test_physical_names() {
        assert_eq!(physical_table_name("current_nodes", tenant(7)), "current_nodes_7");
        assert_eq!(sequence_name("changesets", tenant(7)), "changesets_7_id_seq");
        assert_eq!(
            physical_table_name("current_nodes", tenant(7)),
            physical_table_name("current_nodes", tenant(7))
        );
    }

    #[test]
    fn test_distinct_tenants_never_share_names() {
        for table in CanonicalTable::ALL {
            for (a, b) in [(1, 2), (1, 11), (2, 12), (0, 10), (5, 55)] {
                assert_ne!(
                    physical_table_name(table.as_str(), tenant(a)),
                    physical_table_name(table.as_str(), tenant(b))
                );
                assert_ne!(
                    sequence_name(table.as_str(), tenant(a)),
                    sequence_name(table.as_str(), tenant(b))
                );
            }
        }
    }

    #[test]
    fn test_full_table_set() {
        assert_eq!(
            all_table_names(tenant(3)),
            [
                "current_way_nodes_3",
                "current_relation_members_3",
                "current_nodes_3",
                "current_ways_3",
                "current_relations_3",
                "changesets_3",
            ]
        );
        assert_eq!(
            all_sequence_names(tenant(3)),
            [
                "current_nodes_3_id_seq",
                "current_ways_3_id_seq",
                "current_relations_3_id_seq",
                "changesets_3_id_seq",
            ]
        );
    }

    #[test]
    fn test_negative_tenant_rejected() {
        assert!(matches!(TenantId::new(-1), Err(AppError::InvalidInput(_))));
        assert_eq!(TenantId::new(0).unwrap().get(), 0);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("current_nodes_1"), "\"current_nodes_1\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}

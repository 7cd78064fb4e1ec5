//! Per-request table name overlay.
//!
//! Queries are written against canonical table names using `{name}`
//! placeholders. A [`QueryConfig`] renders them against either the shared
//! tables or one map's physical tables. The base [`SchemaConfig`] is built once
//! at startup and never mutated; overlays are derived from it per call.

use std::collections::HashMap;

use super::tables::{physical_table_name, quote_ident, CanonicalTable, TenantId};

/// Immutable settings shared by every query
#[derive(Debug, Clone)]
pub struct SchemaConfig {
    schema: String,
}

impl SchemaConfig {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Overlay addressing shared tables by their canonical names
    pub fn shared(&self) -> QueryConfig<'_> {
        build_overlay(self, None)
    }

    /// Overlay redirecting the canonical map tables to one tenant
    pub fn for_tenant(&self, tenant: TenantId) -> QueryConfig<'_> {
        build_overlay(self, Some(tenant))
    }
}

/// Build the name overlay for a single query scope
pub fn build_overlay(base: &SchemaConfig, tenant: Option<TenantId>) -> QueryConfig<'_> {
    let overrides = tenant
        .map(|tenant| {
            CanonicalTable::ALL
                .into_iter()
                .map(|table| (table.as_str(), physical_table_name(table.as_str(), tenant)))
                .collect()
        })
        .unwrap_or_default();

    QueryConfig {
        base,
        tenant,
        overrides,
    }
}

/// Name mapping for one query scope
#[derive(Debug)]
pub struct QueryConfig<'a> {
    base: &'a SchemaConfig,
    tenant: Option<TenantId>,
    overrides: HashMap<&'static str, String>,
}

impl<'a> QueryConfig<'a> {
    pub fn tenant(&self) -> Option<TenantId> {
        self.tenant
    }

    /// Unquoted physical name for a canonical table
    pub fn table_name<'s>(&'s self, canonical: &'s str) -> &'s str {
        self.overrides
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }

    /// Schema-qualified, quoted physical name for a canonical table
    pub fn qualified(&self, canonical: &str) -> String {
        format!(
            "{}.{}",
            quote_ident(self.base.schema()),
            quote_ident(self.table_name(canonical))
        )
    }

    /// Replace every `{table}` placeholder with its qualified physical name.
    ///
    /// Braces that do not enclose a plain lowercase identifier are copied
    /// through untouched.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len() + 64);
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) if is_identifier(&after[..end]) => {
                    out.push_str(&self.qualified(&after[..end]));
                    rest = &after[end + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SchemaConfig {
        SchemaConfig::new("public")
    }

    #[test]
    fn test_shared_overlay_keeps_canonical_names() {
        let base = base();
        let overlay = base.shared();
        assert_eq!(overlay.tenant(), None);
        assert_eq!(overlay.table_name("current_nodes"), "current_nodes");
        assert_eq!(overlay.qualified("maps"), "\"public\".\"maps\"");
    }

    #[test]
    fn test_tenant_overlay_rewrites_all_canonical_tables() {
        let base = base();
        let tenant = TenantId::new(12).unwrap();
        let overlay = base.for_tenant(tenant);

        for table in CanonicalTable::ALL {
            assert_eq!(
                overlay.table_name(table.as_str()),
                physical_table_name(table.as_str(), tenant)
            );
        }
        // shared tables pass through
        assert_eq!(overlay.table_name("maps"), "maps");
    }

    #[test]
    fn test_overlays_are_independent_per_tenant() {
        let base = base();
        let a = base.for_tenant(TenantId::new(1).unwrap());
        let b = base.for_tenant(TenantId::new(2).unwrap());
        assert_eq!(a.table_name("current_ways"), "current_ways_1");
        assert_eq!(b.table_name("current_ways"), "current_ways_2");
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let base = SchemaConfig::new("osm");
        let overlay = base.for_tenant(TenantId::new(4).unwrap());
        let sql = overlay.render(
            "SELECT count(*) FROM {current_way_nodes} w JOIN {current_ways} c ON c.id = w.way_id",
        );
        assert_eq!(
            sql,
            "SELECT count(*) FROM \"osm\".\"current_way_nodes_4\" w \
             JOIN \"osm\".\"current_ways_4\" c ON c.id = w.way_id"
        );
    }

    #[test]
    fn test_render_leaves_other_braces_alone() {
        let base = base();
        let overlay = base.shared();
        assert_eq!(
            overlay.render("SELECT '{}'::jsonb, '{Not An Ident}' FROM {maps}"),
            "SELECT '{}'::jsonb, '{Not An Ident}' FROM \"public\".\"maps\""
        );
        assert_eq!(overlay.render("unterminated {maps"), "unterminated {maps");
    }
}

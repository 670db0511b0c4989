use serde::Serialize;

/// Catalog item a branch can request.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub description: Option<String>,
}

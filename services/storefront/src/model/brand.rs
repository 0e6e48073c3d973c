use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandModel {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub logo_url: Option<String>,
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Vector-bearing fields of an indexed listing. They are excluded from every read.
pub const VECTOR_FIELDS: [&str; 3] = ["text_vector", "logo.vector", "ad_photos.vector"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingUser {
	pub user_id: String,
	#[serde(default)]
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingCategory {
	pub category_id: String,
	#[serde(default)]
	pub category: String,
}

/// An image reference. Embedded vectors in the indexed source are dropped on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingImage {
	#[serde(default)]
	pub file_path: String,
}

/// The external-facing listing shape decoded from an index hit's `_source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseListing {
	pub id: String,
	pub user: ListingUser,
	pub category: ListingCategory,
	pub brand: String,
	pub logo: ListingImage,
	#[serde(default)]
	pub ad_photos: Vec<ListingImage>,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub investment: i64,
	#[serde(default)]
	pub monthly_revenue: i64,
	#[serde(default)]
	pub roi: i64,
	#[serde(default)]
	pub branch_count: i64,
	#[serde(default)]
	pub year_founded: i64,
	#[serde(default)]
	pub website: String,
	#[serde(default)]
	pub whatsapp_contact: String,
	#[serde(default)]
	pub is_boosted: bool,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

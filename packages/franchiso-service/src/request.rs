use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

const INTEGER_FIELDS: [&str; 11] = [
	"min_investment",
	"max_investment",
	"min_monthly_revenue",
	"min_roi",
	"max_roi",
	"min_branch_count",
	"max_branch_count",
	"min_year_founded",
	"max_year_founded",
	"page",
	"limit",
];

/// An uploaded query image, passed through to the planner untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
	pub file_name: Option<String>,
	pub content_type: Option<String>,
	pub bytes: Vec<u8>,
}
impl ImageUpload {
	/// Extension for the temporary upload, from the declared content type first.
	pub fn extension(&self) -> &str {
		match self.content_type.as_deref().map(str::trim) {
			Some("image/png") => return "png",
			Some("image/jpeg") | Some("image/jpg") => return "jpg",
			Some("image/webp") => return "webp",
			_ => {},
		}

		self.file_name
			.as_deref()
			.and_then(|name| name.rsplit_once('.'))
			.map(|(_, ext)| ext)
			.filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
			.unwrap_or("bin")
	}
}
impl std::fmt::Debug for ImageUpload {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ImageUpload")
			.field("file_name", &self.file_name)
			.field("content_type", &self.content_type)
			.field("len", &self.bytes.len())
			.finish()
	}
}

/// Raw search input after transport decoding. Numeric fields are already integers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
	pub search_query: Option<String>,
	pub category: Option<String>,
	pub min_investment: Option<i64>,
	pub max_investment: Option<i64>,
	pub min_monthly_revenue: Option<i64>,
	pub min_roi: Option<i64>,
	pub max_roi: Option<i64>,
	pub min_branch_count: Option<i64>,
	pub max_branch_count: Option<i64>,
	pub min_year_founded: Option<i64>,
	pub max_year_founded: Option<i64>,
	pub page: Option<i64>,
	pub limit: Option<i64>,
	pub image: Option<ImageUpload>,
}
impl SearchRequest {
	/// Reads a JSON object body. Integers may arrive as numbers or numeric strings.
	pub fn from_json(body: &Value) -> Result<Self> {
		let obj = match body {
			Value::Object(obj) => obj,
			Value::Null => return Ok(Self::default()),
			_ => return Err(invalid("Request body must be a JSON object.")),
		};
		let mut req = Self::default();

		for (name, value) in obj {
			match value {
				Value::Null => continue,
				Value::String(raw) => req.set_field(name, raw)?,
				Value::Number(number) if INTEGER_FIELDS.contains(&name.as_str()) => {
					let parsed = number.as_i64().ok_or_else(|| not_an_integer(name))?;

					req.set_integer(name, parsed);
				},
				_ if is_known(name) => {
					return Err(invalid(&format!("Field {name} has an unsupported type.")));
				},
				_ => {},
			}
		}

		Ok(req)
	}

	/// Reads text fields from a form-encoded body or multipart text parts.
	pub fn from_fields<I>(fields: I) -> Result<Self>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut req = Self::default();

		for (name, value) in fields {
			req.set_field(&name, &value)?;
		}

		Ok(req)
	}

	pub fn with_image(mut self, image: ImageUpload) -> Self {
		self.image = Some(image);

		self
	}

	/// Applies trimming and pagination defaults.
	pub fn canonicalize(self) -> CanonicalQuery {
		CanonicalQuery {
			search_query: self.search_query.as_deref().map(str::trim).unwrap_or_default().to_string(),
			category: self.category,
			min_investment: self.min_investment,
			max_investment: self.max_investment,
			min_monthly_revenue: self.min_monthly_revenue,
			min_roi: self.min_roi,
			max_roi: self.max_roi,
			min_branch_count: self.min_branch_count,
			max_branch_count: self.max_branch_count,
			min_year_founded: self.min_year_founded,
			max_year_founded: self.max_year_founded,
			page: self.page.filter(|page| *page > 0).unwrap_or(DEFAULT_PAGE),
			limit: self.limit.filter(|limit| *limit > 0).unwrap_or(DEFAULT_LIMIT),
			image: self.image,
		}
	}

	fn set_field(&mut self, name: &str, raw: &str) -> Result<()> {
		match name {
			"search_query" => self.search_query = Some(raw.to_string()),
			"category" => self.category = Some(raw.to_string()),
			_ if INTEGER_FIELDS.contains(&name) => {
				let trimmed = raw.trim();

				if trimmed.is_empty() {
					return Ok(());
				}

				let parsed = trimmed.parse::<i64>().map_err(|_| not_an_integer(name))?;

				self.set_integer(name, parsed);
			},
			_ => {},
		}

		Ok(())
	}

	fn set_integer(&mut self, name: &str, value: i64) {
		let slot = match name {
			"min_investment" => &mut self.min_investment,
			"max_investment" => &mut self.max_investment,
			"min_monthly_revenue" => &mut self.min_monthly_revenue,
			"min_roi" => &mut self.min_roi,
			"max_roi" => &mut self.max_roi,
			"min_branch_count" => &mut self.min_branch_count,
			"max_branch_count" => &mut self.max_branch_count,
			"min_year_founded" => &mut self.min_year_founded,
			"max_year_founded" => &mut self.max_year_founded,
			"page" => &mut self.page,
			"limit" => &mut self.limit,
			_ => return,
		};

		*slot = Some(value);
	}
}

/// The normalised query. Field order is the serialisation order, which the cache key depends on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalQuery {
	pub search_query: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min_investment: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_investment: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min_monthly_revenue: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min_roi: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_roi: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min_branch_count: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_branch_count: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min_year_founded: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_year_founded: Option<i64>,
	pub page: i64,
	pub limit: i64,
	#[serde(skip)]
	pub image: Option<ImageUpload>,
}
impl CanonicalQuery {
	pub fn offset(&self) -> i64 {
		(self.page - 1).saturating_mul(self.limit)
	}

	pub fn has_phrase(&self) -> bool {
		!self.search_query.is_empty()
	}
}

fn is_known(name: &str) -> bool {
	matches!(name, "search_query" | "category") || INTEGER_FIELDS.contains(&name)
}

fn not_an_integer(name: &str) -> Error {
	invalid(&format!("Field {name} must be an integer."))
}

fn invalid(message: &str) -> Error {
	Error::InvalidRequest { message: message.to_string() }
}

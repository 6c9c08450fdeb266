use franchiso_storage::models::{FranchiseListing, VECTOR_FIELDS};

use crate::{Error, FranchiseService, Result};

impl FranchiseService {
	/// Point read of one listing. Never cached.
	pub async fn get_franchise(&self, id: &str) -> Result<FranchiseListing> {
		let id = id.trim();

		if id.is_empty() {
			return Err(Error::InvalidRequest { message: "Franchise id must be non-empty.".to_string() });
		}

		let Some(source) = self.index.get_source(id, &VECTOR_FIELDS).await? else {
			return Err(Error::NotFound { message: format!("Franchise {id} was not found.") });
		};

		serde_json::from_value(source).map_err(|err| Error::BackendFailure {
			message: format!("Franchise {id} has a malformed source: {err}"),
		})
	}
}

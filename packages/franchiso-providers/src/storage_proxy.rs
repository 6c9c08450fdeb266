use std::time::Duration;

use reqwest::{
	Client,
	multipart::{Form, Part},
};
use serde::Deserialize;

use crate::{Error, Result};

const TARGET: &str = "storage proxy";

#[derive(Debug, Deserialize)]
struct UploadResponse {
	#[serde(rename = "fileUrl")]
	file_url: String,
}

/// Uploads `bytes` as the `file` part and returns the proxy URL, shaped `/file/<name>`.
pub async fn upload(
	cfg: &franchiso_config::StorageProxyConfig,
	file_name: &str,
	content_type: &str,
	bytes: Vec<u8>,
) -> Result<String> {
	let part = Part::bytes(bytes)
		.file_name(file_name.to_string())
		.mime_str(content_type)
		.map_err(|err| Error::InvalidArgument { message: format!("Invalid content type: {err}") })?;
	let form = Form::new().part("file", part);
	let res = client(cfg)?
		.post(format!("{}/upload", cfg.base_url.trim_end_matches('/')))
		.multipart(form)
		.send()
		.await
		.map_err(|err| Error::from_reqwest(TARGET, err))?;
	let parsed: UploadResponse = crate::check_status(TARGET, res)
		.await?
		.json()
		.await
		.map_err(|err| Error::from_reqwest(TARGET, err))?;

	if parsed.file_url.trim().is_empty() {
		return Err(Error::InvalidResponse { message: "Storage proxy returned an empty fileUrl.".to_string() });
	}

	Ok(parsed.file_url)
}

/// Deletes a file by URL (`/file/abc.jpg` or an absolute URL ending in the file name).
pub async fn delete(cfg: &franchiso_config::StorageProxyConfig, file_url: &str) -> Result<()> {
	let name = file_name_from_url(file_url)?;
	let res = client(cfg)?
		.delete(format!("{}/file/{name}", cfg.base_url.trim_end_matches('/')))
		.send()
		.await
		.map_err(|err| Error::from_reqwest(TARGET, err))?;

	crate::check_status(TARGET, res).await?;

	Ok(())
}

pub fn file_name_from_url(file_url: &str) -> Result<&str> {
	let name = file_url.rsplit('/').next().unwrap_or_default();

	if name.is_empty() || name == "." || name == ".." {
		return Err(Error::InvalidArgument { message: format!("Invalid file URL {file_url:?}.") });
	}

	Ok(name)
}

fn client(cfg: &franchiso_config::StorageProxyConfig) -> Result<Client> {
	Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.build()
		.map_err(|err| Error::from_reqwest(TARGET, err))
}

//! File upload to the analyzer endpoint.

use log::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FormData, RequestCache, RequestInit, Response};

use crate::components::code_graph::config::UploadConfig;
use crate::components::code_graph::error::{VizError, js_error};
use crate::components::code_graph::types::{GraphData, UploadResponse};

/// Rejects files the analyzer would refuse before any request is made.
pub fn check_file(name: &str, size: f64, config: &UploadConfig) -> Result<(), VizError> {
	let extension = name
		.rsplit_once('.')
		.map(|(_, ext)| ext.to_ascii_lowercase())
		.unwrap_or_default();
	if !config.allowed_extensions.iter().any(|e| *e == extension) {
		return Err(VizError::InvalidUpload(format!(
			"Invalid file type; expected one of: {}",
			config.allowed_extensions.join(", ")
		)));
	}
	if size > config.max_bytes {
		return Err(VizError::InvalidUpload(format!(
			"File is too large ({:.1} MiB max)",
			config.max_bytes / (1024.0 * 1024.0)
		)));
	}
	Ok(())
}

/// Interprets an analyzer response.
///
/// An `{error}` body is an analysis failure whatever the status; any other
/// non-2xx status or an unreadable body is a transport failure. A readable
/// body whose graph breaks the data contract is a contract failure.
pub fn parse_response(ok: bool, status: u16, body: &str) -> Result<GraphData, VizError> {
	let parsed = serde_json::from_str::<UploadResponse>(body);
	if let Ok(UploadResponse {
		error: Some(message),
		..
	}) = &parsed
	{
		return Err(VizError::Analysis(message.clone()));
	}
	if !ok {
		return Err(VizError::Transport(format!("HTTP error! status: {}", status)));
	}
	match parsed {
		Ok(UploadResponse {
			graph_data: Some(data),
			..
		}) => Ok(GraphData::from_value(data)?),
		Ok(_) => Err(VizError::Transport("response has no graph data".into())),
		Err(e) => Err(VizError::Transport(format!("malformed response: {}", e))),
	}
}

/// Posts `file` as multipart field `file` and returns the analyzed graph.
pub async fn upload(file: &File, config: &UploadConfig) -> Result<GraphData, VizError> {
	check_file(&file.name(), file.size(), config)?;

	let window = web_sys::window().ok_or_else(|| VizError::Transport("no window".into()))?;
	let form = FormData::new().map_err(|e| VizError::Transport(js_error(&e)))?;
	form.append_with_blob("file", file)
		.map_err(|e| VizError::Transport(js_error(&e)))?;

	let init = RequestInit::new();
	init.set_method("POST");
	init.set_body(&form);
	init.set_cache(RequestCache::NoStore);

	info!("code-graph: uploading {} ({} bytes)", file.name(), file.size());
	let response: Response = JsFuture::from(window.fetch_with_str_and_init(&config.endpoint, &init))
		.await
		.map_err(|e| VizError::Transport(js_error(&e)))?
		.dyn_into()
		.map_err(|_| VizError::Transport("fetch did not return a Response".into()))?;

	let body = JsFuture::from(
		response
			.text()
			.map_err(|e| VizError::Transport(js_error(&e)))?,
	)
	.await
	.map_err(|e| VizError::Transport(js_error(&e)))?
	.as_string()
	.unwrap_or_default();

	let result = parse_response(response.ok(), response.status(), &body);
	if let Err(e) = &result {
		warn!("code-graph: upload failed: {}", e);
	}
	result
}

//! code-graph-viz: interactive force-directed visualization of code structure.
//!
//! This crate provides a WASM front end that uploads a source file to the
//! analyzer, then renders the returned graph of files, classes, functions and
//! their relationships with physics-based layout, pan/zoom, drag and hover
//! inspection.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use log::{Level, error, info};

pub mod components;

pub use components::code_graph::{
	CodeGraphViewport, GraphData, GraphEdge, GraphHandle, GraphNode, VizConfig, VizError,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("code-graph: logging initialized");
}

/// Main application component.
/// Hosts the upload form, status and error banners, and the graph viewport.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = VizConfig::load();
	let handle = GraphHandle::default();
	let upload_generation = Rc::new(Cell::new(0u64));

	let (busy, set_busy) = signal(false);
	let (error_message, set_error_message) = signal(None::<String>);
	let (status, set_status) = signal(None::<String>);
	let file_ref = NodeRef::<leptos::html::Input>::new();

	let show_status = move |message: &str, duration_ms: u64| {
		let message = message.to_string();
		set_status.set(Some(message.clone()));
		set_timeout(
			move || {
				if status.get_untracked().as_deref() == Some(message.as_str()) {
					set_status.set(None);
				}
			},
			Duration::from_millis(duration_ms),
		);
	};

	let upload_config = config.upload.clone();
	let (submit_handle, submit_generation) = (handle.clone(), upload_generation.clone());
	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		let Some(input) = file_ref.get() else {
			return;
		};
		let Some(file) = input.files().and_then(|files| files.get(0)) else {
			set_error_message.set(Some("Please select a file".to_string()));
			return;
		};

		show_status("Clearing previous visualization...", 2000);
		submit_handle.clear();

		// Last submit wins: older responses are dropped when they arrive.
		let generation = submit_generation.get() + 1;
		submit_generation.set(generation);

		set_busy.set(true);
		set_error_message.set(None);
		show_status("Processing new file...", 5000);

		let (handle, current_generation, upload_config) = (
			submit_handle.clone(),
			submit_generation.clone(),
			upload_config.clone(),
		);
		spawn_local(async move {
			let result = components::upload::upload(&file, &upload_config).await;
			if current_generation.get() != generation {
				info!("code-graph: dropping response for superseded upload #{}", generation);
				return;
			}

			let result = result.and_then(|data| {
				show_status("Creating new visualization...", 2000);
				handle.show(&data)
			});
			set_busy.set(false);
			input.set_value("");

			if let Err(e) = result {
				error!("code-graph: {}", e);
				set_error_message.set(Some(e.user_message()));
				show_status("Error processing file", 3000);
			}
		});
	};

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Code Structure Visualizer" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="app">
			<form id="uploadForm" class="upload-form" on:submit=on_submit>
				<input type="file" id="fileInput" accept=".py,.zip" node_ref=file_ref />
				<button type="submit" disabled=move || busy.get()>"Analyze"</button>
			</form>

			{move || busy.get().then(|| view! { <div id="status" class="status">"Analyzing..."</div> })}
			{move || {
				error_message
					.get()
					.map(|message| view! { <div id="error" class="alert alert-danger">{message}</div> })
			}}
			{move || {
				status
					.get()
					.map(|message| view! { <div id="cache-status" class="status-text">{message}</div> })
			}}

			<CodeGraphViewport handle=handle config=config />
		</div>
	}
}

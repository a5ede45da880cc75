//! Sunburst chart output
//!
//! Writes an HTML page with a plotly.js sunburst of the tensor tree (area is
//! bytes, colour is tensor count) next to a table of file metadata, then
//! optionally opens it with the platform's default handler.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::display::{format_shape, format_size};
use crate::error::{ExplorerError, Result};
use crate::record::MetadataEntry;
use crate::rollup::{rollup, RollupEntry};
use crate::tree::TensorTree;

/// plotly.js bundle loaded by the page
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const ROOT_ID: &str = "root";

#[derive(Debug, Serialize)]
struct ColorBar {
    title: &'static str,
}

#[derive(Debug, Serialize)]
struct Marker {
    colors: Vec<u64>,
    colorscale: &'static str,
    showscale: bool,
    colorbar: ColorBar,
}

#[derive(Debug, Serialize)]
struct SunburstTrace {
    #[serde(rename = "type")]
    kind: &'static str,
    ids: Vec<String>,
    labels: Vec<String>,
    parents: Vec<String>,
    values: Vec<u64>,
    hovertext: Vec<String>,
    hovertemplate: &'static str,
    branchvalues: &'static str,
    textinfo: &'static str,
    marker: Marker,
}

/// Groups and tensors may share a path, so the kind is part of the id
fn node_id(entry: &RollupEntry) -> String {
    let kind = if entry.is_tensor { 't' } else { 'g' };
    format!("{kind}:{}", entry.path)
}

fn parent_id(entry: &RollupEntry) -> String {
    if entry.parent_path.is_empty() {
        ROOT_ID.to_string()
    } else {
        format!("g:{}", entry.parent_path)
    }
}

fn hover_text(tree: &TensorTree, entry: &RollupEntry) -> String {
    if entry.is_tensor {
        if let Some(record) = tree.find(&entry.path) {
            return format!(
                "{}<br>Shape: {}<br>Type: {}<br>Size: {}",
                record.name,
                format_shape(&record.shape),
                record.dtype,
                format_size(record.byte_size)
            );
        }
    }
    format!(
        "Group: {}<br>Tensors: {}<br>Size: {}",
        entry.path,
        entry.tensor_count,
        format_size(entry.total_bytes)
    )
}

fn sunburst_trace(tree: &TensorTree) -> SunburstTrace {
    let entries = rollup(tree);
    let n = entries.len() + 1;
    let mut trace = SunburstTrace {
        kind: "sunburst",
        ids: Vec::with_capacity(n),
        labels: Vec::with_capacity(n),
        parents: Vec::with_capacity(n),
        values: Vec::with_capacity(n),
        hovertext: Vec::with_capacity(n),
        hovertemplate: "<b>%{label}</b><br>%{hovertext}<extra></extra>",
        branchvalues: "total",
        textinfo: "label+percent entry",
        marker: Marker {
            colors: Vec::with_capacity(n),
            colorscale: "Viridis",
            showscale: true,
            colorbar: ColorBar {
                title: "Tensor Count",
            },
        },
    };

    trace.ids.push(ROOT_ID.to_string());
    trace.labels.push("Model".to_string());
    trace.parents.push(String::new());
    trace.values.push(tree.total_bytes());
    trace.hovertext.push(format!(
        "{} tensors, {}",
        tree.tensor_count(),
        format_size(tree.total_bytes())
    ));
    trace.marker.colors.push(tree.tensor_count());

    for entry in &entries {
        trace.ids.push(node_id(entry));
        trace.labels.push(entry.name.clone());
        trace.parents.push(parent_id(entry));
        trace.values.push(entry.total_bytes);
        trace.hovertext.push(hover_text(tree, entry));
        trace.marker.colors.push(entry.tensor_count);
    }
    trace
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn metadata_table(metadata: &[MetadataEntry]) -> String {
    if metadata.is_empty() {
        return "<table><thead><tr><th>No Metadata</th></tr></thead></table>".to_string();
    }
    let mut html = String::from("<table><thead><tr><th>Key</th><th>Value</th></tr></thead><tbody>");
    for entry in metadata {
        html.push_str(&format!(
            "<tr><td title=\"{}\">{}</td><td>{}</td></tr>",
            escape_html(&entry.value_type),
            escape_html(&entry.key),
            escape_html(&entry.value)
        ));
    }
    html.push_str("</tbody></table>");
    html
}

/// Render the complete HTML page
///
/// # Errors
///
/// Returns `ExplorerError::Format` if the chart data cannot be serialized.
pub fn render_html(tree: &TensorTree, metadata: &[MetadataEntry]) -> Result<String> {
    let trace = sunburst_trace(tree);
    let data = serde_json::to_string(&[trace]).map_err(|e| ExplorerError::Format {
        reason: format!("Failed to serialize chart data: {e}"),
    })?;
    // Keep tensor names from closing the script element
    let data = data.replace("</", "<\\/");
    let title = format!(
        "Model Structure Visualization ({} tensors)",
        tree.tensor_count()
    );

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
<style>
body {{ font-family: sans-serif; margin: 0; }}
h1 {{ font-size: 1.2em; margin: 12px; }}
#layout {{ display: flex; height: calc(100vh - 56px); }}
#chart {{ flex: 7; }}
#metadata {{ flex: 3; overflow: auto; padding: 0 10px; }}
table {{ border-collapse: collapse; width: 100%; font-size: 11px; }}
th {{ background: #444; color: white; text-align: left; padding: 4px; }}
td {{ background: #F5F5F5; border-bottom: 1px solid #ddd; padding: 4px; word-break: break-all; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div id="layout">
<div id="chart"></div>
<div id="metadata"><h2>Metadata</h2>{table}</div>
</div>
<script>
Plotly.newPlot("chart", {data}, {{margin: {{t: 10, l: 10, r: 10, b: 10}}}}, {{responsive: true}});
</script>
</body>
</html>
"#,
        title = escape_html(&title),
        table = metadata_table(metadata),
    ))
}

/// Default output location in the system temp directory
#[must_use]
pub fn default_output_path() -> PathBuf {
    std::env::temp_dir().join(format!("tensor-explorer-{}.html", std::process::id()))
}

/// Write the page to `output` (or the default path) and return where it went
///
/// # Errors
///
/// Returns `ExplorerError::Io` if the file cannot be written.
pub fn write_visualization(
    tree: &TensorTree,
    metadata: &[MetadataEntry],
    output: Option<&Path>,
) -> Result<PathBuf> {
    let path = output.map_or_else(default_output_path, Path::to_path_buf);
    let html = render_html(tree, metadata)?;
    std::fs::write(&path, html).map_err(|e| ExplorerError::Io {
        message: format!("Failed to write '{}': {}", path.display(), e),
    })?;
    info!(path = %path.display(), tensors = tree.tensor_count(), "wrote visualization");
    Ok(path)
}

/// Open `path` with the platform's default handler
///
/// # Errors
///
/// Returns `ExplorerError::Io` if the opener cannot be spawned.
pub fn open_in_browser(path: &Path) -> Result<()> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    };
    #[cfg(target_os = "macos")]
    let mut command = std::process::Command::new("open");
    #[cfg(all(unix, not(target_os = "macos")))]
    let mut command = std::process::Command::new("xdg-open");

    command.arg(path).spawn().map_err(|e| ExplorerError::Io {
        message: format!("Failed to open '{}': {}", path.display(), e),
    })?;
    Ok(())
}

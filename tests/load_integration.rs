//! End-to-end loading: on-disk SafeTensors/GGUF files through path
//! resolution, parallel decode and the merged tree.

use std::io::Write;
use std::path::{Path, PathBuf};

use tensor_explorer::discover::resolve_paths;
use tensor_explorer::error::ExplorerError;
use tensor_explorer::format::ModelFormat;
use tensor_explorer::gguf::test_factory::GGUFBuilder;
use tensor_explorer::gguf::{GGUF_TYPE_F32, GGUF_TYPE_Q4_K, GGUF_TYPE_Q8_0};
use tensor_explorer::loader::load;
use tensor_explorer::navigation::{apply, Effect, InputEvent, NavigationState, Session};
use tensor_explorer::rollup::rollup;

/// Write a safetensors file with zeroed payloads
fn write_safetensors(
    path: &Path,
    tensors: &[(&str, &str, &[u64], usize)],
    metadata: Option<serde_json::Value>,
) {
    let mut header = serde_json::Map::new();
    if let Some(meta) = metadata {
        header.insert("__metadata__".to_string(), meta);
    }
    let mut offset = 0usize;
    for (name, dtype, shape, len) in tensors {
        header.insert(
            (*name).to_string(),
            serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + len],
            }),
        );
        offset += len;
    }
    let json = serde_json::to_vec(&header).expect("serialize header");

    let mut file = std::fs::File::create(path).expect("create file");
    file.write_all(&(json.len() as u64).to_le_bytes())
        .expect("write length");
    file.write_all(&json).expect("write header");
    file.write_all(&vec![0u8; offset]).expect("write data");
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn sharded_checkpoint(dir: &Path) {
    write_safetensors(
        &dir.join("model-00001-of-00002.safetensors"),
        &[
            ("model.embed_tokens.weight", "BF16", &[32, 8], 512),
            ("model.layers.0.self_attn.q_proj.weight", "BF16", &[8, 8], 128),
            ("model.layers.1.self_attn.q_proj.weight", "BF16", &[8, 8], 128),
        ],
        Some(serde_json::json!({"format": "pt"})),
    );
    write_safetensors(
        &dir.join("model-00002-of-00002.safetensors"),
        &[
            ("model.layers.10.self_attn.q_proj.weight", "BF16", &[8, 8], 128),
            ("model.layers.2.self_attn.q_proj.weight", "BF16", &[8, 8], 128),
            ("model.norm.weight", "F32", &[8], 32),
            ("lm_head.weight", "BF16", &[32, 8], 512),
        ],
        None,
    );
    std::fs::write(
        dir.join("model.safetensors.index.json"),
        serde_json::json!({
            "metadata": {"total_size": 1568},
            "weight_map": {
                "model.embed_tokens.weight": "model-00001-of-00002.safetensors",
                "model.layers.0.self_attn.q_proj.weight": "model-00001-of-00002.safetensors",
                "model.layers.1.self_attn.q_proj.weight": "model-00001-of-00002.safetensors",
                "model.layers.2.self_attn.q_proj.weight": "model-00002-of-00002.safetensors",
                "model.layers.10.self_attn.q_proj.weight": "model-00002-of-00002.safetensors",
                "model.norm.weight": "model-00002-of-00002.safetensors",
                "lm_head.weight": "model-00002-of-00002.safetensors"
            }
        })
        .to_string(),
    )
    .expect("write index");
}

#[test]
fn test_sharded_safetensors_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    sharded_checkpoint(dir.path());

    let sources = resolve_paths(&[arg(dir.path())], false).expect("resolve");
    assert_eq!(sources.len(), 2);
    assert!(sources.iter().all(|s| s.format == ModelFormat::SafeTensors));

    let report = load(&sources).expect("load");
    assert_eq!(report.file_count(), 2);
    assert!(report.failures.is_empty());
    assert!(report.overwrites.is_empty());
    assert_eq!(report.tree.tensor_count(), 7);
    assert_eq!(report.tree.total_bytes(), 1568);
    assert_eq!(report.metadata.len(), 1);
    assert_eq!(report.metadata[0].key, "format");

    let layers = report.tree.group("model.layers").expect("layers group");
    let order: Vec<&str> = layers.children().map(|n| n.name()).collect();
    assert_eq!(order, vec!["0", "1", "2", "10"]);
    assert_eq!(layers.tensor_count(), 4);
    assert_eq!(layers.total_bytes(), 512);
}

#[test]
fn test_gguf_and_safetensors_together() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gguf_path = dir.path().join("model.gguf");
    let gguf = GGUFBuilder::new()
        .architecture("llama")
        .add_string("general.name", "tiny")
        .add_tensor("token_embd.weight", &[256, 4], GGUF_TYPE_Q8_0)
        .add_tensor("blk.0.attn_q.weight", &[256, 4], GGUF_TYPE_Q4_K)
        .add_tensor("output_norm.weight", &[4], GGUF_TYPE_F32)
        .build();
    std::fs::write(&gguf_path, gguf).expect("write gguf");

    let st_path = dir.path().join("adapter.safetensors");
    write_safetensors(&st_path, &[("lora.a", "F32", &[2, 2], 16)], None);

    let sources = resolve_paths(&[arg(&gguf_path), arg(&st_path)], false).expect("resolve");
    let report = load(&sources).expect("load");
    assert_eq!(report.file_count(), 2);
    assert_eq!(report.tree.tensor_count(), 4);

    let q = report.tree.find("blk.0.attn_q.weight").expect("q");
    assert_eq!(q.dtype, "Q4_K");
    assert_eq!(q.shape, vec![4, 256]);
    assert_eq!(q.byte_size, 4 * 144);
    assert_eq!(q.source(), Some(gguf_path.as_path()));

    let embd = report.tree.find("token_embd.weight").expect("embd");
    assert_eq!(embd.byte_size, 1024 / 32 * 34);

    assert!(report
        .metadata
        .iter()
        .any(|m| m.key == "general.architecture" && m.value == "llama"));
}

#[test]
fn test_later_file_wins_on_duplicates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = dir.path().join("a.safetensors");
    let second = dir.path().join("b.safetensors");
    write_safetensors(&first, &[("shared.weight", "F32", &[4], 16)], None);
    write_safetensors(&second, &[("shared.weight", "F16", &[4], 8)], None);

    let sources = resolve_paths(&[arg(dir.path())], false).expect("resolve");
    let report = load(&sources).expect("load");
    assert_eq!(report.tree.tensor_count(), 1);
    assert_eq!(report.tree.total_bytes(), 8);
    let record = report.tree.find("shared.weight").expect("shared");
    assert_eq!(record.dtype, "F16");
    assert_eq!(report.overwrites.len(), 1);
    assert_eq!(report.overwrites[0].previous, Some(first));
    assert_eq!(report.overwrites[0].replacement, Some(second));
}

#[test]
fn test_corrupt_file_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_safetensors(&dir.path().join("good.safetensors"), &[("w", "F32", &[1], 4)], None);
    let bad = dir.path().join("bad.safetensors");
    let mut data = 64u64.to_le_bytes().to_vec();
    data.extend_from_slice(b"{ not json");
    std::fs::write(&bad, data).expect("write bad");

    let sources = resolve_paths(&[arg(dir.path())], false).expect("resolve");
    let report = load(&sources).expect("load");
    assert_eq!(report.tree.tensor_count(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, bad);
    assert!(matches!(
        report.failures[0].error,
        ExplorerError::Decode { .. }
    ));
}

#[test]
fn test_deeply_nested_gguf_does_not_stop_other_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut nested = Vec::new();
    for _ in 0..200_000 {
        nested.extend_from_slice(&9u32.to_le_bytes());
        nested.extend_from_slice(&1u64.to_le_bytes());
    }
    let bad = dir.path().join("bad.gguf");
    let gguf = GGUFBuilder::new()
        .add_raw("nested", 9, nested)
        .add_tensor("w", &[4], GGUF_TYPE_F32)
        .build();
    std::fs::write(&bad, gguf).expect("write gguf");
    write_safetensors(&dir.path().join("good.safetensors"), &[("ok", "F32", &[1], 4)], None);

    let sources = resolve_paths(&[arg(dir.path())], false).expect("resolve");
    let report = load(&sources).expect("load");
    assert_eq!(report.file_count(), 1);
    assert!(report.tree.find("ok").is_some());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, bad);
    assert!(matches!(
        report.failures[0].error,
        ExplorerError::Decode { .. }
    ));
}

#[test]
fn test_only_corrupt_files_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("x.gguf"), b"GGUF").expect("write");
    let sources = resolve_paths(&[arg(dir.path())], false).expect("resolve");
    let err = load(&sources).expect_err("all failed");
    assert!(matches!(err, ExplorerError::AllFilesFailed { count: 1 }));
    assert!(err.is_fatal());
}

#[test]
fn test_glob_and_recursive_resolution() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("ckpt").join("step-10");
    std::fs::create_dir_all(&nested).expect("mkdir");
    write_safetensors(&nested.join("model.safetensors"), &[("a", "F32", &[1], 4)], None);
    write_safetensors(&dir.path().join("top.safetensors"), &[("b", "F32", &[1], 4)], None);

    let flat = resolve_paths(&[arg(dir.path())], false).expect("flat");
    assert_eq!(flat.len(), 1);
    let deep = resolve_paths(&[arg(dir.path())], true).expect("recursive");
    assert_eq!(deep.len(), 2);

    let pattern = format!("{}/ckpt/*/*.safetensors", dir.path().display());
    let globbed = resolve_paths(&[pattern], false).expect("glob");
    let paths: Vec<PathBuf> = globbed.into_iter().map(|s| s.path).collect();
    assert_eq!(paths, vec![nested.join("model.safetensors")]);
}

#[test]
fn test_browse_loaded_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    sharded_checkpoint(dir.path());
    let sources = resolve_paths(&[arg(dir.path())], false).expect("resolve");
    let report = load(&sources).expect("load");

    let session = Session::new(report.tree);
    let mut state = NavigationState::new();
    // Top level: lm_head, model
    assert_eq!(state.rows(session.tree()).len(), 2);

    for event in [InputEvent::Down, InputEvent::Enter] {
        state = apply(state, event, &session).state;
    }
    assert_eq!(state.rows(session.tree()).len(), 5);

    state = apply(state, InputEvent::Char('/'), &session).state;
    for c in "q_proj".chars() {
        state = apply(state, InputEvent::Char(c), &session).state;
    }
    assert_eq!(state.query, "q_proj");
    assert_eq!(state.results.len(), 4);
    assert!(state.results[0].path.starts_with("model.layers."));

    state = apply(state, InputEvent::Esc, &session).state;
    assert_eq!(state.cursor, 1);
    let t = apply(state, InputEvent::Char('q'), &session);
    assert_eq!(t.effect, Some(Effect::Quit));
}

#[test]
fn test_rollup_of_loaded_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    sharded_checkpoint(dir.path());
    let sources = resolve_paths(&[arg(dir.path())], false).expect("resolve");
    let report = load(&sources).expect("load");

    let entries = rollup(&report.tree);
    let model = entries
        .iter()
        .find(|e| e.path == "model" && !e.is_tensor)
        .expect("model group");
    assert_eq!(model.parent_path, "");
    assert_eq!(model.tensor_count, 6);
    assert_eq!(model.total_bytes, 1056);
    assert_eq!(entries.iter().filter(|e| e.is_tensor).count(), 7);
}

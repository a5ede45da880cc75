use std::io::Write;

use super::test_factory::GGUFBuilder;
use super::*;

fn write_temp(data: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file creation");
    file.write_all(data).expect("write gguf");
    file.flush().expect("flush file");
    file
}

#[test]
fn test_parse_header_and_tensors() {
    let data = GGUFBuilder::new()
        .architecture("llama")
        .add_u32("llama.block_count", 2)
        .add_tensor("token_embd.weight", &[32, 16], GGUF_TYPE_F32)
        .add_tensor("blk.0.attn_q.weight", &[16, 256], GGUF_TYPE_Q4_K)
        .build();

    let model = GGUFModel::from_bytes(&data).expect("parse");
    assert_eq!(model.header.version, GGUF_VERSION_V3);
    assert_eq!(model.header.tensor_count, 2);
    assert_eq!(model.header.metadata_count, 2);
    assert_eq!(model.architecture(), Some("llama"));

    let embd = &model.tensors[0];
    assert_eq!(embd.name, "token_embd.weight");
    assert_eq!(embd.dims, vec![32, 16]);
    assert_eq!(embd.n_dims, 2);

    let q = &model.tensors[1];
    assert_eq!(q.dtype_name(), "Q4_K");
    assert_eq!(q.byte_size(), Some(16 * 256 / 256 * 144));
}

#[test]
fn test_version_2_accepted() {
    let data = GGUFBuilder::new()
        .version(GGUF_VERSION_V2)
        .add_tensor("w", &[4], GGUF_TYPE_F16)
        .build();
    let model = GGUFModel::from_bytes(&data).expect("v2");
    assert_eq!(model.header.version, 2);
}

#[test]
fn test_version_1_rejected() {
    let data = GGUFBuilder::new().version(1).build();
    let err = GGUFModel::from_bytes(&data).expect_err("v1");
    assert!(err.to_string().contains("Unsupported GGUF version"));
}

#[test]
fn test_bad_magic() {
    let mut data = GGUFBuilder::new().build();
    data[0..4].copy_from_slice(b"GGML");
    let err = GGUFModel::from_bytes(&data).expect_err("magic");
    assert!(err.to_string().contains("Invalid GGUF magic"));
}

#[test]
fn test_tensor_count_limit() {
    let mut data = GGUFBuilder::new().build();
    data[8..16].copy_from_slice(&(MAX_TENSOR_COUNT + 1).to_le_bytes());
    let err = GGUFModel::from_bytes(&data).expect_err("count");
    assert!(err.to_string().contains("tensor_count"));
}

#[test]
fn test_metadata_count_limit() {
    let mut data = GGUFBuilder::new().build();
    data[16..24].copy_from_slice(&(MAX_METADATA_COUNT + 1).to_le_bytes());
    assert!(GGUFModel::from_bytes(&data).is_err());
}

#[test]
fn test_too_many_dims() {
    let dims = [1u64; 9];
    let data = GGUFBuilder::new().add_tensor("x", &dims, GGUF_TYPE_F32).build();
    let err = GGUFModel::from_bytes(&data).expect_err("dims");
    assert!(err.to_string().contains("dimensions"));
}

#[test]
fn test_truncated_header() {
    let data = GGUFBuilder::new()
        .add_tensor("blk.0.ffn_up.weight", &[64, 64], GGUF_TYPE_Q8_0)
        .build();
    let cut = &data[..30];
    assert!(GGUFModel::from_bytes(cut).is_err());
}

#[test]
fn test_unsupported_value_type() {
    let data = GGUFBuilder::new().add_raw("weird", 42, vec![0; 4]).build();
    let err = GGUFModel::from_bytes(&data).expect_err("value type");
    assert!(err.to_string().contains("weird"));
    assert!(err.to_string().contains("Unsupported value type"));
}

#[test]
fn test_metadata_entries_rendered() {
    let tokens: Vec<String> = (0..200).map(|i| format!("tok{i}")).collect();
    let token_refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
    let data = GGUFBuilder::new()
        .architecture("qwen2")
        .add_f32("qwen2.rope.freq_base", 10000.0)
        .add_string_array("tokenizer.ggml.tokens", &token_refs)
        .build();
    let model = GGUFModel::from_bytes(&data).expect("parse");
    let entries = model.metadata_entries();
    assert_eq!(entries.len(), 3);

    assert_eq!(entries[0].key, "general.architecture");
    assert_eq!(entries[0].value, "qwen2");
    assert_eq!(entries[0].value_type, "STRING");

    assert_eq!(entries[1].value, "10000");
    assert_eq!(entries[1].value_type, "FLOAT32");

    assert_eq!(entries[2].value_type, "ARRAY[STRING]");
    assert!(entries[2].value.starts_with(r#"["tok0", "tok1""#));
    assert!(entries[2].value.chars().count() <= crate::record::MAX_METADATA_VALUE_LEN);
}

#[test]
fn test_unknown_type_has_zero_size() {
    let data = GGUFBuilder::new().add_tensor("mystery", &[8], 77).build();
    let model = GGUFModel::from_bytes(&data).expect("parse");
    let records = model.tensor_records();
    assert_eq!(records[0].dtype, "TYPE_77");
    assert_eq!(records[0].byte_size, 0);
    assert_eq!(records[0].shape, vec![8]);
}

#[test]
fn test_read_file() {
    let data = GGUFBuilder::new()
        .architecture("llama")
        .add_tensor("output_norm.weight", &[16], GGUF_TYPE_F32)
        .add_tensor("blk.0.attn_k.weight", &[16, 32], GGUF_TYPE_Q8_0)
        .build();
    let file = write_temp(&data);
    let decoded = read_file(file.path()).expect("decode");
    assert_eq!(decoded.records.len(), 2);
    assert_eq!(decoded.records[0].name, "output_norm.weight");
    assert_eq!(decoded.records[0].byte_size, 64);
    assert_eq!(decoded.records[1].byte_size, 16 * 32 / 32 * 34);
    assert_eq!(decoded.records[1].source(), Some(file.path()));
    assert_eq!(decoded.metadata.len(), 1);
}

#[test]
fn test_read_file_error_names_path() {
    let file = write_temp(b"not a gguf file at all");
    match read_file(file.path()) {
        Err(ExplorerError::Decode { path, reason }) => {
            assert_eq!(path, file.path());
            assert!(reason.contains("magic"));
        },
        other => panic!("expected Decode error, got {other:?}"),
    }
}

/// Value bytes for `levels` arrays nested one inside the next, each holding
/// a single element, ending in one `u8`
fn nested_array_bytes(levels: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(levels * 12 + 13);
    for _ in 1..levels {
        bytes.extend_from_slice(&9u32.to_le_bytes());
        bytes.extend_from_slice(&1u64.to_le_bytes());
    }
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.push(7);
    bytes
}

#[test]
fn test_nested_arrays_within_limit() {
    let data = GGUFBuilder::new()
        .add_raw("nested", 9, nested_array_bytes(MAX_ARRAY_DEPTH))
        .add_tensor("w", &[4], GGUF_TYPE_F32)
        .build();
    let model = GGUFModel::from_bytes(&data).expect("parse");
    let entries = model.metadata_entries();
    assert_eq!(entries[0].value_type, "ARRAY[ARRAY]");
    assert_eq!(model.tensors.len(), 1);
}

#[test]
fn test_nested_array_depth_limit() {
    let data = GGUFBuilder::new()
        .add_raw("deep", 9, nested_array_bytes(MAX_ARRAY_DEPTH + 1))
        .build();
    let err = GGUFModel::from_bytes(&data).expect_err("too deep");
    assert!(err.to_string().contains("deep"));
    assert!(err.to_string().contains("nested array depth"));
}

#[test]
fn test_deeply_nested_header_is_decode_error() {
    let data = GGUFBuilder::new()
        .architecture("llama")
        .add_raw("tokenizer.ggml.merges", 9, nested_array_bytes(200_000))
        .add_tensor("w", &[4], GGUF_TYPE_F32)
        .build();
    let file = write_temp(&data);
    match read_file(file.path()) {
        Err(ExplorerError::Decode { path, reason }) => {
            assert_eq!(path, file.path());
            assert!(reason.contains("nested array depth"), "{reason}");
        },
        other => panic!("expected Decode error, got {other:?}"),
    }
}

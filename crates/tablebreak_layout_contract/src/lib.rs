use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

pub const CONTRACT_ID: &str = "tablebreak.fragment_contract";
pub const CONTRACT_VERSION: &str = "1";

const FRAGMENT_CONTRACT_SCHEMA_ID: &str = "tablebreak.fragment_contract.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Bool,
    Object,
    Array,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub key: &'static str,
    pub field_type: FieldType,
}

pub const TABLE_FRAGMENT_FIELDS_V1: [FieldDef; 10] = [
    FieldDef { key: "kind", field_type: FieldType::String },
    FieldDef { key: "blockId", field_type: FieldType::String },
    FieldDef { key: "fromRow", field_type: FieldType::Number },
    FieldDef { key: "toRow", field_type: FieldType::Number },
    FieldDef { key: "x", field_type: FieldType::Number },
    FieldDef { key: "y", field_type: FieldType::Number },
    FieldDef { key: "width", field_type: FieldType::Number },
    FieldDef { key: "height", field_type: FieldType::Number },
    FieldDef { key: "repeatHeaderCount", field_type: FieldType::Number },
    FieldDef { key: "metadata", field_type: FieldType::Object },
];

pub const METADATA_FIELDS_V1: [FieldDef; 2] = [
    FieldDef { key: "columnBoundaries", field_type: FieldType::Array },
    FieldDef { key: "coordinateSystem", field_type: FieldType::String },
];

pub const COLUMN_BOUNDARY_FIELDS_V1: [FieldDef; 5] = [
    FieldDef { key: "index", field_type: FieldType::Number },
    FieldDef { key: "x", field_type: FieldType::Number },
    FieldDef { key: "width", field_type: FieldType::Number },
    FieldDef { key: "minWidth", field_type: FieldType::Number },
    FieldDef { key: "resizable", field_type: FieldType::Bool },
];

/// Flags that are written only when set.
pub const TRUE_ONLY_FLAGS_V1: [&str; 2] = ["continuesOnNext", "continuesFromPrev"];

/// Metadata keys downstream resize tooling relies on being absent.
pub const FORBIDDEN_METADATA_KEYS_V1: [&str; 1] = ["rowBoundaries"];

pub const COORDINATE_SYSTEM_V1: &str = "fragment";

// Frozen contract payload, compiled in; runtime never reads it from disk.
const FRAGMENT_CONTRACT_V1_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/contract/fragment_contract.v1.json"
));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    pub path: String,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct LayoutContractMetadata {
    pub contract_id: &'static str,
    pub contract_version: &'static str,
    pub contract_fingerprint_sha256: String,
    pub schema_id: &'static str,
    pub schema_hash_sha256: String,
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_digest(hasher)
}

fn hex_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

static SCHEMA_HASH: OnceLock<String> = OnceLock::new();
static CONTRACT_FINGERPRINT: OnceLock<String> = OnceLock::new();

pub fn fragment_contract_v1_json() -> &'static str {
    FRAGMENT_CONTRACT_V1_JSON
}

pub fn fragment_contract_v1_hash_sha256() -> String {
    SCHEMA_HASH
        .get_or_init(|| hex_sha256(FRAGMENT_CONTRACT_V1_JSON.as_bytes()))
        .clone()
}

pub fn contract_fingerprint_sha256() -> String {
    CONTRACT_FINGERPRINT
        .get_or_init(|| {
            let mut hasher = Sha256::new();
            hasher.update(CONTRACT_ID.as_bytes());
            hasher.update(b"\n");
            hasher.update(CONTRACT_VERSION.as_bytes());
            hasher.update(b"\n");
            hasher.update(FRAGMENT_CONTRACT_SCHEMA_ID.as_bytes());
            hasher.update(b"\n");
            hasher.update(fragment_contract_v1_hash_sha256().as_bytes());
            hex_digest(hasher)
        })
        .clone()
}

/// SHA-256 over the canonical JSON of a layout result. Object keys are sorted,
/// so equal layouts hash equally regardless of construction order.
pub fn layout_fingerprint_sha256(layout: &Value) -> String {
    let canonical = serde_json::to_string(layout).unwrap_or_default();
    hex_sha256(canonical.as_bytes())
}

fn check_fields(
    object: &serde_json::Map<String, Value>,
    fields: &[FieldDef],
    path: &str,
    out: &mut Vec<ContractViolation>,
) {
    for field in fields {
        match object.get(field.key) {
            None => out.push(ContractViolation {
                path: format!("{path}.{}", field.key),
                code: "missing_field",
                message: format!("required field {} is missing", field.key),
            }),
            Some(value) if !field.field_type.matches(value) => out.push(ContractViolation {
                path: format!("{path}.{}", field.key),
                code: "wrong_type",
                message: format!("expected {} for {}", field.field_type.name(), field.key),
            }),
            Some(_) => {}
        }
    }
}

/// Checks one serialized table fragment against the v1 contract. Fragments of
/// other kinds are ignored.
pub fn validate_table_fragment(fragment: &Value) -> Vec<ContractViolation> {
    let mut out = Vec::new();
    let Some(object) = fragment.as_object() else {
        out.push(ContractViolation {
            path: "$".to_string(),
            code: "not_an_object",
            message: "fragment must be a JSON object".to_string(),
        });
        return out;
    };
    if object.get("kind").and_then(Value::as_str) != Some("table") {
        return out;
    }
    check_fields(object, &TABLE_FRAGMENT_FIELDS_V1, "$", &mut out);

    for flag in TRUE_ONLY_FLAGS_V1 {
        if let Some(value) = object.get(flag) {
            if value.as_bool() != Some(true) {
                out.push(ContractViolation {
                    path: format!("$.{flag}"),
                    code: "flag_not_true",
                    message: format!("{flag} must be omitted unless true"),
                });
            }
        }
    }

    if let (Some(from), Some(to)) = (
        object.get("fromRow").and_then(Value::as_u64),
        object.get("toRow").and_then(Value::as_u64),
    ) {
        if from > to {
            out.push(ContractViolation {
                path: "$.fromRow".to_string(),
                code: "inverted_row_range",
                message: format!("fromRow {from} is past toRow {to}"),
            });
        }
    }

    let Some(metadata) = object.get("metadata").and_then(Value::as_object) else {
        return out;
    };
    check_fields(metadata, &METADATA_FIELDS_V1, "$.metadata", &mut out);
    for key in FORBIDDEN_METADATA_KEYS_V1 {
        if metadata.contains_key(key) {
            out.push(ContractViolation {
                path: format!("$.metadata.{key}"),
                code: "forbidden_field",
                message: format!("{key} is not part of the v1 contract"),
            });
        }
    }
    if let Some(system) = metadata.get("coordinateSystem").and_then(Value::as_str) {
        if system != COORDINATE_SYSTEM_V1 {
            out.push(ContractViolation {
                path: "$.metadata.coordinateSystem".to_string(),
                code: "unknown_coordinate_system",
                message: format!("unexpected coordinate system {system}"),
            });
        }
    }
    if let Some(boundaries) = metadata.get("columnBoundaries").and_then(Value::as_array) {
        for (idx, boundary) in boundaries.iter().enumerate() {
            let path = format!("$.metadata.columnBoundaries[{idx}]");
            match boundary.as_object() {
                Some(boundary) => {
                    check_fields(boundary, &COLUMN_BOUNDARY_FIELDS_V1, &path, &mut out);
                    if boundary.get("resizable").and_then(Value::as_bool) == Some(false) {
                        out.push(ContractViolation {
                            path: format!("{path}.resizable"),
                            code: "not_resizable",
                            message: "column boundaries are always resizable".to_string(),
                        });
                    }
                }
                None => out.push(ContractViolation {
                    path,
                    code: "not_an_object",
                    message: "column boundary must be a JSON object".to_string(),
                }),
            }
        }
    }
    out
}

pub fn metadata() -> LayoutContractMetadata {
    LayoutContractMetadata {
        contract_id: CONTRACT_ID,
        contract_version: CONTRACT_VERSION,
        contract_fingerprint_sha256: contract_fingerprint_sha256(),
        schema_id: FRAGMENT_CONTRACT_SCHEMA_ID,
        schema_hash_sha256: fragment_contract_v1_hash_sha256(),
    }
}

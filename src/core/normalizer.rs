//! Flat CSV rows to nested prediction records, and back for display.
//!
//! Both directions are total: unexpected shapes fall back to schema defaults
//! or are passed through untouched, they never fail.

use crate::domain::model::FlatRow;
use crate::domain::schema::{self, FieldSpec, StructuredRecord};
use serde_json::{Number, Value};

pub use crate::domain::model::DefaultPolicy;

/// Features that the model stores as whole numbers.
pub const INTEGER_FIELDS: [&str; 12] = [
    "age",
    "hdb_bki_total_products",
    "hdb_bki_total_pil_cnt",
    "hdb_bki_total_ip_cnt",
    "hdb_bki_active_pil_cnt",
    "dp_ils_uniq_companies_1y",
    "dp_ils_days_from_last_doc",
    "dp_ils_cnt_changes_1y",
    "blacklist_flag",
    "nonresident_flag",
    "client_active_flag",
    "accountsalary_out_flag",
];

pub const GENDER_FIELD: &str = "gender";
pub const EMPLOYMENT_POSITION_FIELD: &str = "dp_ewb_last_employment_position";
pub const EMPLOYMENT_POSITION_PLACEHOLDER: &str = "manager";

/// Maps any JSON value onto the fixed schema. Non-object input is treated as
/// an empty row.
pub fn to_structured(row: &Value, policy: DefaultPolicy) -> StructuredRecord {
    match row {
        Value::Object(map) => structure_row(map, policy),
        _ => structure_row(&FlatRow::new(), policy),
    }
}

pub fn structure_row(row: &FlatRow, policy: DefaultPolicy) -> StructuredRecord {
    StructuredRecord::from_lookup(|spec| pick_field(row, spec, policy))
}

/// First source key (canonical name, then aliases) holding a usable value,
/// else the kind's default.
fn pick_field(row: &FlatRow, spec: &FieldSpec, policy: DefaultPolicy) -> Value {
    spec.source_keys()
        .filter_map(|key| row.get(key))
        .find(|value| !is_missing(value, policy))
        .cloned()
        .unwrap_or_else(|| spec.kind.default_value())
}

pub fn is_missing(value: &Value, policy: DefaultPolicy) -> bool {
    match (value, policy) {
        // schema values are scalars only
        (Value::Null | Value::Array(_) | Value::Object(_), _) => true,
        (_, DefaultPolicy::Absent) => false,
        (Value::Bool(b), DefaultPolicy::Falsy) => !b,
        (Value::Number(n), DefaultPolicy::Falsy) => n.as_f64().is_some_and(|f| f == 0.0),
        (Value::String(s), DefaultPolicy::Falsy) => s.is_empty(),
    }
}

/// Shallow display copy of a structured (or already flat) row.
///
/// Group objects are flattened one level, integer fields are rounded half
/// away from zero, `gender` is decoded from its sign and the employment
/// position is replaced by a placeholder. A group field overrides a
/// top-level key of the same name. The result is not an inverse of
/// [`to_structured`].
pub fn to_denormalized_flat(row: &Value) -> FlatRow {
    let mut flat = FlatRow::new();
    if let Value::Object(map) = row {
        let (groups, top_level): (Vec<_>, Vec<_>) = map
            .iter()
            .partition(|(key, value)| value.is_object() && schema::is_group_name(key));

        flat.extend(top_level.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        for (_, group) in groups {
            if let Value::Object(fields) = group {
                flat.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
    }
    denormalize_fields(&mut flat);
    flat
}

pub fn denormalize_record(record: &StructuredRecord) -> FlatRow {
    let mut flat = record.to_flat();
    denormalize_fields(&mut flat);
    flat
}

fn denormalize_fields(flat: &mut FlatRow) {
    for field in INTEGER_FIELDS {
        if let Some(value) = flat.get_mut(field) {
            if let Some(rounded) = round_to_integer(value) {
                *value = rounded;
            }
        }
    }

    if let Some(gender) = flat.get_mut(GENDER_FIELD) {
        *gender = Value::String(decode_gender(gender).to_string());
    }

    if let Some(position) = flat.get_mut(EMPLOYMENT_POSITION_FIELD) {
        *position = Value::String(decode_employment_position(position).to_string());
    }
}

/// Gender is encoded as a signed score: positive means `"F"`.
pub fn decode_gender(value: &Value) -> &'static str {
    if numeric_value(value).is_some_and(|score| score > 0.0) {
        "F"
    } else {
        "M"
    }
}

/// The position encoding is not known; every value maps to the same
/// placeholder.
pub fn decode_employment_position(_value: &Value) -> &'static str {
    EMPLOYMENT_POSITION_PLACEHOLDER
}

fn round_to_integer(value: &Value) -> Option<Value> {
    let rounded = numeric_value(value)?.round();
    if rounded >= i64::MIN as f64 && rounded <= i64::MAX as f64 {
        Some(Value::from(rounded as i64))
    } else {
        Number::from_f64(rounded).map(Value::Number)
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

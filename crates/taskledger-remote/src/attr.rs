//! Conversion between flat JSON objects and typed attribute maps
//! (`{"name": {"S": "..."}}`, `{"runTime": {"N": "90"}}`).

use serde_json::{Map, Value, json};

use crate::error::RemoteError;

pub fn to_attribute(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => Some(json!({ "S": s })),
        Value::Number(n) => Some(json!({ "N": n.to_string() })),
        Value::Bool(b) => Some(json!({ "BOOL": b })),
        // absent optionals are simply not written
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn to_attribute_map(item: &Value) -> Result<Map<String, Value>, RemoteError> {
    let object = item
        .as_object()
        .ok_or_else(|| RemoteError::InvalidResponse("item is not an object".into()))?;
    Ok(object
        .iter()
        .filter_map(|(k, v)| to_attribute(v).map(|attr| (k.clone(), attr)))
        .collect())
}

pub fn from_attribute(name: &str, attr: &Value) -> Result<Value, RemoteError> {
    let invalid = || RemoteError::InvalidResponse(format!("unsupported attribute {name}: {attr}"));
    let (tag, inner) = attr
        .as_object()
        .and_then(|o| o.iter().next())
        .ok_or_else(invalid)?;

    match (tag.as_str(), inner) {
        ("S", Value::String(s)) => Ok(Value::String(s.clone())),
        ("N", Value::String(n)) => n
            .parse::<u64>()
            .map(Value::from)
            .or_else(|_| n.parse::<f64>().map(Value::from))
            .map_err(|_| invalid()),
        ("BOOL", Value::Bool(b)) => Ok(Value::Bool(*b)),
        ("NULL", _) => Ok(Value::Null),
        _ => Err(invalid()),
    }
}

pub fn from_attribute_map(map: &Map<String, Value>) -> Result<Value, RemoteError> {
    let mut out = Map::with_capacity(map.len());
    for (name, attr) in map {
        out.insert(name.clone(), from_attribute(name, attr)?);
    }
    Ok(Value::Object(out))
}

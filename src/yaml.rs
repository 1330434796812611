//! YAML bridging for raw provider spec payloads.
//!
//! Legacy provider specs arrive as YAML or JSON. This converts YAML input into
//! `serde_json::Value` so the typed decoder only deals with one representation.

use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::{Error, Result};

/// Parse a YAML payload into a `serde_json::Value`.
///
/// Only the first document of a multi-document payload is used. Empty input
/// yields `Value::Null`.
pub(crate) fn parse_yaml(input: &str) -> Result<Value> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| Error::decode(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => to_json(doc),
        None => Ok(Value::Null),
    }
}

fn to_json(node: Yaml) -> Result<Value> {
    match node {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(repr) => {
            let f: f64 = repr.parse().map_err(|e| Error::decode(format!("{e}")))?;
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(items) => items
            .into_iter()
            .map(to_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Yaml::Hash(entries) => entries
            .into_iter()
            .map(|(k, v)| match k {
                Yaml::String(key) => to_json(v).map(|v| (key, v)),
                other => Err(Error::decode(format!("non-string YAML key: {other:?}"))),
            })
            .collect::<Result<Map<String, Value>>>()
            .map(Value::Object),
        Yaml::Alias(_) => Err(Error::decode("YAML aliases not supported")),
        Yaml::BadValue => Err(Error::decode("bad YAML value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_mappings() {
        let value = parse_yaml("osDisk:\n  diskSizeGB: 128\nvmSize: Standard_D2s_v3").unwrap();
        assert_eq!(value["osDisk"]["diskSizeGB"], 128);
        assert_eq!(value["vmSize"], "Standard_D2s_v3");
    }

    #[test]
    fn empty_input_is_null() {
        assert_eq!(parse_yaml("").unwrap(), Value::Null);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_yaml("not: valid: yaml: {{").is_err());
    }
}

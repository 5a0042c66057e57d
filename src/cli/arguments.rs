//! Parsed command arguments and the per-invocation argument bundle

use clap::ArgMatches;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::cli::options::CommandSpec;
use crate::error::CommandError;

/// Every keyword argument of one invocation, keyed by option name.
/// Absent options without a default are present as `Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    pub fn from_matches(spec: &CommandSpec, matches: &ArgMatches) -> Self {
        let values = spec
            .options
            .iter()
            .map(|option| (option.name.clone(), option.value_from(matches)))
            .collect();
        Self { values }
    }

    pub fn view(&self) -> ArgumentView<'_> {
        ArgumentView { values: &self.values }
    }
}

#[cfg(test)]
impl Arguments {
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Snapshot separating all supplied arguments from those a service
/// operation accepts.
///
/// `service` holds only the arguments whose names match one of the
/// operation's formal parameters and whose values are not null.
#[derive(Debug, Clone)]
pub struct ArgumentBundle {
    original: Map<String, Value>,
    service: Map<String, Value>,
}

impl ArgumentBundle {
    pub fn for_operation(arguments: &Arguments, parameters: &[&str]) -> Self {
        let service = parameters
            .iter()
            .filter_map(|name| match arguments.values.get(*name) {
                Some(Value::Null) | None => None,
                Some(value) => Some((name.to_string(), value.clone())),
            })
            .collect();

        Self {
            original: arguments.values.clone(),
            service,
        }
    }

    pub fn original(&self) -> ArgumentView<'_> {
        ArgumentView { values: &self.original }
    }

    pub fn service(&self) -> ArgumentView<'_> {
        ArgumentView { values: &self.service }
    }
}

/// Read-only typed access over an argument map
#[derive(Debug, Clone, Copy)]
pub struct ArgumentView<'a> {
    values: &'a Map<String, Value>,
}

#[cfg(test)]
impl ArgumentView<'_> {
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

impl<'a> ArgumentView<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        match self.values.get(name) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    pub fn str(&self, name: &str) -> Result<Option<&'a str>, CommandError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(invalid(name, "a string", other)),
        }
    }

    pub fn required_str(&self, name: &str) -> Result<&'a str, CommandError> {
        self.str(name)?.ok_or_else(|| CommandError::MissingArgument {
            option: name.to_string(),
        })
    }

    pub fn integer(&self, name: &str) -> Result<Option<i64>, CommandError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid(name, "an integer", value)),
        }
    }

    /// Flags read as `false` when absent
    pub fn flag(&self, name: &str) -> Result<bool, CommandError> {
        match self.get(name) {
            None => Ok(false),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(invalid(name, "a flag", other)),
        }
    }

    pub fn path(&self, name: &str) -> Result<Option<PathBuf>, CommandError> {
        Ok(self.str(name)?.map(PathBuf::from))
    }

    /// Deserialize the whole view into a typed query
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, CommandError> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
            CommandError::InvalidArgument {
                option: "*".to_string(),
                reason: e.to_string(),
            }
        })
    }
}

fn invalid(name: &str, expected: &str, found: &Value) -> CommandError {
    CommandError::InvalidArgument {
        option: name.to_string(),
        reason: format!("expected {}, found {}", expected, found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn arguments() -> Arguments {
        let value = json!({
            "keywords": "red panda",
            "max_results": 20,
            "region": null,
            "folder": "/tmp/out",
            "del_duplicates": true,
        });
        match value {
            Value::Object(map) => Arguments::from_map(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_bundle_filters_to_operation_parameters() {
        let bundle = ArgumentBundle::for_operation(&arguments(), &["keywords", "region", "max_results", "size"]);

        for name in ["keywords", "max_results", "region", "folder", "del_duplicates"] {
            assert!(bundle.original().contains(name));
        }
        assert!(bundle.service().contains("keywords"));
        assert!(bundle.service().contains("max_results"));
        // Null and unknown parameters are dropped
        assert!(!bundle.service().contains("region"));
        assert!(!bundle.service().contains("size"));
        assert!(!bundle.service().contains("folder"));
    }

    #[test]
    fn test_typed_access() {
        let arguments = arguments();
        let view = arguments.view();

        assert_eq!(view.required_str("keywords").unwrap(), "red panda");
        assert_eq!(view.integer("max_results").unwrap(), Some(20));
        assert_eq!(view.str("region").unwrap(), None);
        assert!(view.flag("del_duplicates").unwrap());
        assert!(!view.flag("remove_metadata").unwrap());
        assert_eq!(view.path("folder").unwrap(), Some(PathBuf::from("/tmp/out")));

        assert!(view.integer("keywords").is_err());
        assert!(matches!(
            view.required_str("proxy"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_deserialize_service_view() {
        #[derive(Deserialize)]
        struct Query {
            keywords: String,
            #[serde(default)]
            region: Option<String>,
            max_results: Option<usize>,
        }

        let bundle = ArgumentBundle::for_operation(&arguments(), &["keywords", "region", "max_results"]);
        let query: Query = bundle.service().deserialize().unwrap();
        assert_eq!(query.keywords, "red panda");
        assert_eq!(query.region, None);
        assert_eq!(query.max_results, Some(20));
    }
}

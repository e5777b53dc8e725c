//! Parsing of resource descriptions returned by `read-resource-description`.
//!
//! A description node looks like this (trimmed):
//!
//! ```text
//! {
//!   "access-control": {
//!     "default": {
//!       "read": true, "write": false,
//!       "attributes": { "level": { "read": true, "write": false } },
//!       "operations": { "add": { "execute": false } }
//!     },
//!     "exceptions": { ... }
//!   },
//!   "children": {
//!     "logger": { "model-description": { "*": { ...description... } } }
//!   }
//! }
//! ```

use crate::{AttributePermission, Constraints, MetadataError, ResourceAddress};
use serde_json::{Map, Value};

pub(crate) const RESULT: &str = "result";
pub(crate) const OUTCOME: &str = "outcome";
pub(crate) const FAILED: &str = "failed";
pub(crate) const FAILURE_DESCRIPTION: &str = "failure-description";

const ACCESS_CONTROL: &str = "access-control";
const DEFAULT: &str = "default";
const EXCEPTIONS: &str = "exceptions";
const ADDRESS: &str = "address";
const READ: &str = "read";
const WRITE: &str = "write";
const EXECUTE: &str = "execute";
const ATTRIBUTES: &str = "attributes";
const OPERATIONS: &str = "operations";
const CHILDREN: &str = "children";
const MODEL_DESCRIPTION: &str = "model-description";

/// `null` is how the protocol spells "undefined".
pub(crate) fn defined(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

fn object<'a>(
    value: &'a Value,
    address: &ResourceAddress,
    path: &str,
) -> Result<&'a Map<String, Value>, MetadataError> {
    value.as_object().ok_or_else(|| MetadataError::UnexpectedShape {
        address: address.to_string(),
        path: path.to_string(),
        expected: "object",
    })
}

fn flag(
    model: &Map<String, Value>,
    name: &'static str,
    address: &ResourceAddress,
    path: &str,
) -> Result<bool, MetadataError> {
    match defined(model.get(name)) {
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(MetadataError::UnexpectedShape {
            address: address.to_string(),
            path: format!("{path}.{name}"),
            expected: "boolean",
        }),
        None => Err(MetadataError::MissingFlag {
            address: address.to_string(),
            path: path.to_string(),
            flag: name,
        }),
    }
}

/// The description inside a node: its `result` if it has one, otherwise
/// the node itself.
pub fn description(node: &Value) -> &Value {
    defined(node.get(RESULT)).unwrap_or(node)
}

/// What a composite step yielded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepPayload<'a> {
    /// A description node to parse.
    Node(&'a Value),
    /// A wildcard address that expanded to no instances.
    Empty,
    /// The step carried no result.
    Missing,
}

/// Extract the node to parse from one step of a composite result.
pub fn step_payload<'a>(
    address: &ResourceAddress,
    step: &'a Value,
) -> Result<StepPayload<'a>, MetadataError> {
    let step = object(step, address, "step")?;
    match defined(step.get(RESULT)) {
        None => Ok(StepPayload::Missing),
        Some(Value::Array(nodes)) => Ok(select_representative(nodes)
            .map(StepPayload::Node)
            .unwrap_or(StepPayload::Empty)),
        Some(node @ Value::Object(_)) => Ok(StepPayload::Node(node)),
        Some(_) => Err(MetadataError::UnexpectedShape {
            address: address.to_string(),
            path: RESULT.to_string(),
            expected: "object or list",
        }),
    }
}

/// Pick the node that models the permission shape of a wildcard
/// expansion.
///
/// Every instance of a type shares the same shape, so one representative is
/// enough: the first entry whose address ends in a concrete instance,
/// otherwise the first whose address ends in a wildcard, otherwise the
/// first entry. `None` when the expansion is empty.
pub fn select_representative(nodes: &[Value]) -> Option<&Value> {
    let trailing = |node: &Value| {
        defined(node.get(ADDRESS))
            .and_then(ResourceAddress::from_model)
            .and_then(|address| address.last().map(|segment| segment.is_wildcard()))
    };

    let representative = nodes
        .iter()
        .find(|node| trailing(node) == Some(false))
        .or_else(|| nodes.iter().find(|node| trailing(node) == Some(true)))
        .or_else(|| nodes.first())?;

    let reference = defined(representative.get(ADDRESS))
        .map(Value::to_string)
        .unwrap_or_default();
    tracing::debug!(%reference, candidates = nodes.len(), "Using representative");
    Some(representative)
}

/// Turn the access-control block of a description into [`Constraints`].
///
/// Returns `None` when the description has no access-control block, or one
/// without a `default` permission set. If `exceptions` has entries, the
/// first one governs instead of `default`.
pub fn parse_access_control(
    address: &ResourceAddress,
    description: &Value,
) -> Result<Option<Constraints>, MetadataError> {
    let Some(access_control) = defined(description.get(ACCESS_CONTROL)) else {
        return Ok(None);
    };
    let access_control = object(access_control, address, ACCESS_CONTROL)?;
    let Some(default) = defined(access_control.get(DEFAULT)) else {
        return Ok(None);
    };

    let mut path = format!("{ACCESS_CONTROL}.{DEFAULT}");
    let mut model = default;
    if let Some(exceptions) = defined(access_control.get(EXCEPTIONS)) {
        let exceptions = object(exceptions, address, &format!("{ACCESS_CONTROL}.{EXCEPTIONS}"))?;
        // Exceptions are not merged, the first one wins.
        if let Some((key, exception)) = exceptions.iter().next() {
            path = format!("{ACCESS_CONTROL}.{EXCEPTIONS}.{key}");
            model = exception;
        }
    }
    let model = object(model, address, &path)?;

    let mut constraints = Constraints::new();
    match defined(model.get(ADDRESS)) {
        Some(Value::Bool(false)) => constraints.set_address_visible(false),
        Some(Value::Bool(true)) | None => {
            let read = flag(model, READ, address, &path)?;
            let write = flag(model, WRITE, address, &path)?;
            // The access-control section does not separate runtime from
            // configuration access, so both pairs carry the same flags.
            constraints.set_config(read, write);
            constraints.set_runtime(read, write);
        }
        Some(_) => {
            return Err(MetadataError::UnexpectedShape {
                address: address.to_string(),
                path: format!("{path}.{ADDRESS}"),
                expected: "boolean",
            });
        }
    }

    if let Some(operations) = defined(model.get(OPERATIONS)) {
        let operations_path = format!("{path}.{OPERATIONS}");
        for (name, operation) in object(operations, address, &operations_path)? {
            let operation_path = format!("{operations_path}.{name}");
            let operation = object(operation, address, &operation_path)?;
            let exec = flag(operation, EXECUTE, address, &operation_path)?;
            constraints.set_operation_exec(address.clone(), name.as_str(), exec);
        }
    }

    if let Some(attributes) = defined(model.get(ATTRIBUTES)) {
        let attributes_path = format!("{path}.{ATTRIBUTES}");
        for (name, attribute) in object(attributes, address, &attributes_path)? {
            let attribute_path = format!("{attributes_path}.{name}");
            let attribute = object(attribute, address, &attribute_path)?;
            constraints.set_attribute(
                name.as_str(),
                AttributePermission {
                    read: flag(attribute, READ, address, &attribute_path)?,
                    write: flag(attribute, WRITE, address, &attribute_path)?,
                },
            );
        }
    }

    Ok(Some(constraints))
}

/// Child resource descriptions nested in a description, by child type.
///
/// Only children that carry a `model-description` are returned; that is
/// the case for recursive requests within the requested depth. The first
/// entry of `model-description` is the child's description.
pub fn child_descriptions<'a>(
    address: &ResourceAddress,
    description: &'a Value,
) -> Result<Vec<(&'a str, &'a Value)>, MetadataError> {
    let Some(children) = defined(description.get(CHILDREN)) else {
        return Ok(Vec::new());
    };

    let mut descriptions = Vec::new();
    for (child_type, child) in object(children, address, CHILDREN)? {
        let child_path = format!("{CHILDREN}.{child_type}");
        let child = object(child, address, &child_path)?;
        let Some(model_description) = defined(child.get(MODEL_DESCRIPTION)) else {
            continue;
        };
        let model_description = object(
            model_description,
            address,
            &format!("{child_path}.{MODEL_DESCRIPTION}"),
        )?;
        let (_, payload) =
            model_description
                .iter()
                .next()
                .ok_or_else(|| MetadataError::EmptyModelDescription {
                    address: address.to_string(),
                    child: child_type.clone(),
                })?;
        descriptions.push((child_type.as_str(), payload));
    }

    Ok(descriptions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decision, Facet, Privilege};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testresult::TestResult;

    fn logging() -> ResourceAddress {
        ResourceAddress::root().child("subsystem", "logging")
    }

    fn entry(address: Value) -> Value {
        json!({ "address": address, "outcome": "success", "result": {} })
    }

    #[test]
    fn it_prefers_a_concrete_instance() {
        let nodes = vec![
            entry(json!([{"subsystem": "a"}, {"x": "*"}])),
            entry(json!([{"subsystem": "a"}, {"x": "foo"}])),
        ];
        assert_eq!(select_representative(&nodes), Some(&nodes[1]));
    }

    #[test]
    fn it_falls_back_to_the_first_wildcard() {
        let nodes = vec![
            entry(json!("garbage")),
            entry(json!([{"subsystem": "a"}, {"x": "*"}])),
            entry(json!([{"subsystem": "b"}, {"y": "*"}])),
        ];
        assert_eq!(select_representative(&nodes), Some(&nodes[1]));
    }

    #[test]
    fn it_falls_back_to_the_first_entry() {
        let nodes = vec![json!({"result": {}}), json!({"result": {"x": 1}})];
        assert_eq!(select_representative(&nodes), Some(&nodes[0]));
        assert_eq!(select_representative(&[]), None);
    }

    #[test]
    fn it_classifies_step_payloads() -> TestResult {
        let address = logging();
        let node = json!({"access-control": {}});

        assert_eq!(
            step_payload(&address, &json!({"outcome": "success", "result": node}))?,
            StepPayload::Node(&node)
        );
        assert_eq!(
            step_payload(&address, &json!({"outcome": "success", "result": []}))?,
            StepPayload::Empty
        );
        assert_eq!(
            step_payload(&address, &json!({"outcome": "success"}))?,
            StepPayload::Missing
        );
        assert!(step_payload(&address, &json!({"result": 7})).is_err());
        assert!(step_payload(&address, &json!("step")).is_err());
        Ok(())
    }

    #[test]
    fn it_parses_the_default_permission_set() -> TestResult {
        let description = json!({
            "access-control": {
                "default": {
                    "read": true,
                    "write": false,
                    "attributes": { "level": { "read": true, "write": false } },
                    "operations": { "add": { "execute": false }, "read-resource": { "execute": true } }
                },
                "exceptions": {}
            }
        });

        let constraints = parse_access_control(&logging(), &description)?.ok_or("no constraints")?;

        assert!(constraints.address_visible());
        assert!(constraints.read_config());
        assert!(!constraints.write_config());
        assert_eq!(
            constraints.attribute("level"),
            Some(AttributePermission {
                read: true,
                write: false
            })
        );
        assert_eq!(constraints.operation_exec(&logging(), "add"), Some(false));
        assert_eq!(constraints.operation_exec(&logging(), "read-resource"), Some(true));
        Ok(())
    }

    #[test]
    fn it_lets_the_first_exception_govern() -> TestResult {
        let description = json!({
            "access-control": {
                "default": { "read": false, "write": false },
                "exceptions": {
                    "subsystem=logging": { "read": true, "write": true },
                    "subsystem=other": { "read": false, "write": false }
                }
            }
        });

        let constraints = parse_access_control(&logging(), &description)?.ok_or("no constraints")?;

        assert!(constraints.read_config());
        assert!(constraints.write_config());
        Ok(())
    }

    #[test]
    fn it_hides_unaddressable_resources() -> TestResult {
        let description = json!({
            "access-control": { "default": { "address": false, "operations": { "add": { "execute": true } } } }
        });

        let constraints = parse_access_control(&logging(), &description)?.ok_or("no constraints")?;

        assert!(!constraints.address_visible());
        assert_eq!(
            constraints.decide(&logging(), Facet::Administrable, &Privilege::Execute("add".into())),
            Decision::Denied
        );
        Ok(())
    }

    #[test]
    fn it_skips_descriptions_without_metadata() -> TestResult {
        assert_eq!(parse_access_control(&logging(), &json!({}))?, None);
        assert_eq!(
            parse_access_control(&logging(), &json!({"access-control": null}))?,
            None
        );
        assert_eq!(
            parse_access_control(&logging(), &json!({"access-control": {"exceptions": {}}}))?,
            None
        );
        Ok(())
    }

    #[test]
    fn it_reports_malformed_metadata() {
        let cases = [
            json!({"access-control": "trim-descriptions"}),
            json!({"access-control": {"default": []}}),
            json!({"access-control": {"default": {"read": true}}}),
            json!({"access-control": {"default": {"read": "yes", "write": false}}}),
            json!({"access-control": {"default": {"address": "no"}}}),
            json!({"access-control": {"default": {"read": true, "write": true, "attributes": {"a": {"read": true}}}}}),
            json!({"access-control": {"default": {"read": true, "write": true, "operations": {"add": {}}}}}),
            json!({"access-control": {"default": {"read": true, "write": true}, "exceptions": []}}),
        ];

        for description in cases {
            assert!(
                parse_access_control(&logging(), &description).is_err(),
                "{description}"
            );
        }
    }

    #[test]
    fn it_reports_the_missing_flag() {
        let error = parse_access_control(
            &logging(),
            &json!({"access-control": {"default": {"read": true}}}),
        )
        .unwrap_err();

        assert_eq!(
            error,
            MetadataError::MissingFlag {
                address: "subsystem=logging".into(),
                path: "access-control.default".into(),
                flag: "write",
            }
        );
    }

    #[test]
    fn it_lists_described_children_only() -> TestResult {
        let description = json!({
            "children": {
                "logger": { "model-description": { "*": { "access-control": {} } } },
                "handler": { "description": "no nested description" },
                "periodic-rotating-file-handler": { "model-description": null }
            }
        });

        let children = child_descriptions(&logging(), &description)?;

        assert_eq!(children.len(), 1);
        assert_eq!(children[0].0, "logger");
        assert_eq!(children[0].1, &json!({ "access-control": {} }));
        Ok(())
    }

    #[test]
    fn it_rejects_an_empty_model_description() {
        let description = json!({ "children": { "logger": { "model-description": {} } } });

        assert_eq!(
            child_descriptions(&logging(), &description),
            Err(MetadataError::EmptyModelDescription {
                address: "subsystem=logging".into(),
                child: "logger".into(),
            })
        );
    }
}

//! Management resource addresses.

use crate::AccessControlError;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The segment value that stands for "any instance of this type".
pub const WILDCARD: &str = "*";

/// One `type=name` step of a [`ResourceAddress`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    key: String,
    value: String,
}

impl Segment {
    /// Create a segment from a resource type and an instance name.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The resource type, e.g. `subsystem`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The instance name, e.g. `logging`, or [`WILDCARD`].
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this segment addresses any instance of its type.
    pub fn is_wildcard(&self) -> bool {
        self.value == WILDCARD
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Path of a management resource, such as `subsystem=logging/logger=*`.
///
/// The root resource has no segments and is written `/`. Addresses order
/// and hash structurally, so they can key maps and sets directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceAddress(Vec<Segment>);

impl ResourceAddress {
    /// The root resource.
    pub fn root() -> Self {
        Self::default()
    }

    /// The segments of this address, outermost first.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Whether this is the root resource.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The trailing segment, if any.
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Whether the trailing segment is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.last().is_some_and(Segment::is_wildcard)
    }

    /// Address of a child resource below this one.
    pub fn child(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::new(key, value));
        Self(segments)
    }

    /// The same address with its trailing segment replaced by a wildcard.
    ///
    /// Returns `None` for the root and for addresses that already end in a
    /// wildcard.
    pub fn wildcarded(&self) -> Option<Self> {
        let last = self.last()?;
        if last.is_wildcard() {
            return None;
        }
        let mut segments = self.0.clone();
        let index = segments.len() - 1;
        segments[index] = Segment::new(last.key(), WILDCARD);
        Some(Self(segments))
    }

    /// Read an address in the management protocol's list form,
    /// `[{"subsystem": "logging"}, {"logger": "*"}]`.
    ///
    /// Returns `None` if the value does not have that shape.
    pub fn from_model(value: &Value) -> Option<Self> {
        let mut segments = Vec::new();
        for token in value.as_array()? {
            let (key, value) = token.as_object()?.iter().next()?;
            segments.push(Segment::new(key.as_str(), value.as_str()?));
        }
        Some(Self(segments))
    }
}

impl From<Vec<Segment>> for ResourceAddress {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

impl FromStr for ResourceAddress {
    type Err = AccessControlError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| AccessControlError::InvalidAddress {
            address: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("address is empty"));
        }

        let path = trimmed.strip_prefix('/').unwrap_or(trimmed);
        if path.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in path.split('/') {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| invalid("segment is not of the form type=name"))?;
            if key.is_empty() || value.is_empty() {
                return Err(invalid("segment has an empty type or name"));
            }
            segments.push(Segment::new(key, value));
        }

        Ok(Self(segments))
    }
}

impl Display for ResourceAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            return write!(f, "/");
        }
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Serializes to the management protocol's address list.
impl Serialize for ResourceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for segment in &self.0 {
            seq.serialize_element(&Token(segment))?;
        }
        seq.end()
    }
}

struct Token<'a>(&'a Segment);

impl Serialize for Token<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0.key(), self.0.value())?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testresult::TestResult;

    #[test]
    fn it_parses_and_prints_an_address() -> TestResult {
        let address: ResourceAddress = "/subsystem=logging/logger=*".parse()?;

        assert_eq!(address.segments().len(), 2);
        assert_eq!(address.segments()[0], Segment::new("subsystem", "logging"));
        assert!(address.is_wildcard());
        assert_eq!(address.to_string(), "subsystem=logging/logger=*");
        Ok(())
    }

    #[test]
    fn it_treats_a_lone_slash_as_root() -> TestResult {
        let address: ResourceAddress = "/".parse()?;
        assert!(address.is_root());
        assert!(!address.is_wildcard());
        assert_eq!(address.to_string(), "/");
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_addresses() {
        for input in ["", "  ", "subsystem", "subsystem=logging//logger=*", "=x", "x="] {
            assert!(
                matches!(
                    input.parse::<ResourceAddress>(),
                    Err(AccessControlError::InvalidAddress { .. })
                ),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn it_derives_children_and_wildcards() -> TestResult {
        let logger: ResourceAddress = "subsystem=logging/logger=org.jboss".parse()?;

        assert_eq!(
            logger.wildcarded(),
            Some("subsystem=logging/logger=*".parse()?)
        );
        assert_eq!(
            logger.child("handler", "*").to_string(),
            "subsystem=logging/logger=org.jboss/handler=*"
        );
        assert_eq!(ResourceAddress::root().wildcarded(), None);
        assert_eq!(logger.wildcarded().and_then(|a| a.wildcarded()), None);
        Ok(())
    }

    #[test]
    fn it_serializes_to_the_protocol_list_form() -> TestResult {
        let address: ResourceAddress = "subsystem=logging/logger=*".parse()?;

        assert_eq!(
            serde_json::to_value(&address)?,
            json!([{"subsystem": "logging"}, {"logger": "*"}])
        );
        assert_eq!(serde_json::to_value(ResourceAddress::root())?, json!([]));
        Ok(())
    }

    #[test]
    fn it_reads_the_protocol_list_form() -> TestResult {
        let model = json!([{"subsystem": "datasources"}, {"data-source": "ExampleDS"}]);

        let address = ResourceAddress::from_model(&model).ok_or("not an address")?;

        assert_eq!(address, "subsystem=datasources/data-source=ExampleDS".parse()?);
        assert!(!address.is_wildcard());
        assert_eq!(ResourceAddress::from_model(&json!("nope")), None);
        assert_eq!(ResourceAddress::from_model(&json!([{"a": 1}])), None);
        Ok(())
    }
}

use crate::{Decision, Facet, Privilege, ResourceAddress};
use std::collections::BTreeMap;

/// Read and write permission on a single attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributePermission {
    /// Whether the attribute may be read.
    pub read: bool,
    /// Whether the attribute may be written.
    pub write: bool,
}

/// The permission shape recorded for one resource address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraints {
    address_visible: bool,
    read_config: bool,
    write_config: bool,
    read_runtime: bool,
    write_runtime: bool,
    attributes: BTreeMap<String, AttributePermission>,
    operations: BTreeMap<ResourceAddress, BTreeMap<String, bool>>,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            address_visible: true,
            read_config: false,
            write_config: false,
            read_runtime: false,
            write_runtime: false,
            attributes: BTreeMap::new(),
            operations: BTreeMap::new(),
        }
    }
}

impl Constraints {
    /// Visible resource with every flag denied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the resource is visible at all.
    pub fn address_visible(&self) -> bool {
        self.address_visible
    }

    /// Mark the resource (in)visible.
    pub fn set_address_visible(&mut self, visible: bool) {
        self.address_visible = visible;
    }

    #[allow(missing_docs)]
    pub fn read_config(&self) -> bool {
        self.read_config
    }

    #[allow(missing_docs)]
    pub fn write_config(&self) -> bool {
        self.write_config
    }

    #[allow(missing_docs)]
    pub fn read_runtime(&self) -> bool {
        self.read_runtime
    }

    #[allow(missing_docs)]
    pub fn write_runtime(&self) -> bool {
        self.write_runtime
    }

    /// Set the configuration flag pair.
    pub fn set_config(&mut self, read: bool, write: bool) {
        self.read_config = read;
        self.write_config = write;
    }

    /// Set the runtime flag pair.
    pub fn set_runtime(&mut self, read: bool, write: bool) {
        self.read_runtime = read;
        self.write_runtime = write;
    }

    /// Record the permission for one attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, permission: AttributePermission) {
        self.attributes.insert(name.into(), permission);
    }

    /// Permission recorded for an attribute, if it was listed.
    pub fn attribute(&self, name: &str) -> Option<AttributePermission> {
        self.attributes.get(name).copied()
    }

    /// All listed attributes, by name.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, AttributePermission)> {
        self.attributes
            .iter()
            .map(|(name, permission)| (name.as_str(), *permission))
    }

    /// Record whether `operation` may be executed on `address`.
    pub fn set_operation_exec(
        &mut self,
        address: ResourceAddress,
        operation: impl Into<String>,
        exec: bool,
    ) {
        self.operations
            .entry(address)
            .or_default()
            .insert(operation.into(), exec);
    }

    /// Exec permission recorded for `operation` on `address`, if listed.
    pub fn operation_exec(&self, address: &ResourceAddress, operation: &str) -> Option<bool> {
        self.operations.get(address)?.get(operation).copied()
    }

    /// All listed operations on `address`, by name.
    pub fn operations(&self, address: &ResourceAddress) -> impl Iterator<Item = (&str, bool)> {
        self.operations
            .get(address)
            .into_iter()
            .flatten()
            .map(|(name, exec)| (name.as_str(), *exec))
    }

    fn resource_read(&self, facet: Facet) -> bool {
        match facet {
            Facet::Administrable => self.read_config,
            Facet::ReadOnly => self.read_runtime,
        }
    }

    fn resource_write(&self, facet: Facet) -> bool {
        match facet {
            Facet::Administrable => self.write_config,
            Facet::ReadOnly => self.write_runtime,
        }
    }

    /// Decide `privilege` for the resource these constraints were recorded
    /// at (`address`).
    ///
    /// An invisible resource denies everything. Attributes that were not
    /// listed inherit the resource-level flag; operations that were not
    /// listed are denied.
    pub fn decide(&self, address: &ResourceAddress, facet: Facet, privilege: &Privilege) -> Decision {
        if !self.address_visible {
            return Decision::Denied;
        }

        Decision::from_flag(match privilege {
            Privilege::Address => true,
            Privilege::Read => self.resource_read(facet),
            Privilege::Write => self.resource_write(facet),
            Privilege::ReadAttribute(name) => self
                .attribute(name)
                .map_or_else(|| self.resource_read(facet), |permission| permission.read),
            Privilege::WriteAttribute(name) => self
                .attribute(name)
                .map_or_else(|| self.resource_write(facet), |permission| permission.write),
            Privilege::Execute(operation) => {
                self.operation_exec(address, operation).unwrap_or(false)
            }
        })
    }
}

//! The per-view aggregate of constraints and the queries it answers.

use crate::{AccessControlError, Constraints, Decision, Facet, Privilege, ResourceAddress};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use web_time::SystemTime;

/// A non-fatal finding recorded while a context was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Diagnostic {
    /// The resource description carried no usable `access-control` block;
    /// queries against it answer [`Decision::UnknownResource`].
    MissingMetadata {
        /// The resource that could not be modeled.
        address: ResourceAddress,
    },
    /// A wildcard address expanded to no instances at all.
    EmptyExpansion {
        /// The requested wildcard address.
        address: ResourceAddress,
    },
    /// The composite result had no entry for a step.
    MissingStep {
        /// Step key, e.g. `step-3`.
        step: String,
        /// The resource the step described.
        address: ResourceAddress,
    },
}

impl Diagnostic {
    /// The resource the finding is about.
    pub fn address(&self) -> &ResourceAddress {
        match self {
            Self::MissingMetadata { address }
            | Self::EmptyExpansion { address }
            | Self::MissingStep { address, .. } => address,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingMetadata { address } => {
                write!(f, "Access-control meta data missing for {address}")
            }
            Self::EmptyExpansion { address } => {
                write!(f, "No instances found for {address}")
            }
            Self::MissingStep { step, address } => {
                write!(f, "No result for {step} ({address})")
            }
        }
    }
}

/// The sealed, per-view aggregate of constraints for every resource the
/// view touches.
///
/// A context is filled in by [`crate::ContextBuilder`] and sealed exactly
/// once; afterwards every mutation fails with
/// [`AccessControlError::Sealed`] and the context is only ever shared.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    id: String,
    facet: Facet,
    required_resources: BTreeSet<ResourceAddress>,
    constraints: BTreeMap<ResourceAddress, Constraints>,
    diagnostics: Vec<Diagnostic>,
    created_at: SystemTime,
    sealed: bool,
}

impl SecurityContext {
    pub(crate) fn new(
        id: impl Into<String>,
        facet: Facet,
        required_resources: BTreeSet<ResourceAddress>,
        created_at: SystemTime,
    ) -> Self {
        Self {
            id: id.into(),
            facet,
            required_resources,
            constraints: BTreeMap::new(),
            diagnostics: Vec::new(),
            created_at,
            sealed: false,
        }
    }

    /// The view identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The facet the view operates in.
    pub fn facet(&self) -> Facet {
        self.facet
    }

    /// Every resource the view needs, including child resources discovered
    /// while the context was built.
    pub fn required_resources(&self) -> &BTreeSet<ResourceAddress> {
        &self.required_resources
    }

    /// Non-fatal findings of the build.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// When the context was built.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Whether the context has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Constraints recorded at exactly `address`.
    pub fn constraints(&self, address: &ResourceAddress) -> Option<&Constraints> {
        self.constraints.get(address)
    }

    /// Every modeled resource with its constraints.
    pub fn resources(&self) -> impl Iterator<Item = (&ResourceAddress, &Constraints)> {
        self.constraints.iter()
    }

    fn ensure_unsealed(&self) -> Result<(), AccessControlError> {
        if self.sealed {
            return Err(AccessControlError::Sealed {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Add a resource to the required set. Returns whether it was new.
    pub fn require(&mut self, address: ResourceAddress) -> Result<bool, AccessControlError> {
        self.ensure_unsealed()?;
        Ok(self.required_resources.insert(address))
    }

    /// Record the constraints for a resource.
    pub fn update_constraints(
        &mut self,
        address: ResourceAddress,
        constraints: Constraints,
    ) -> Result<(), AccessControlError> {
        self.ensure_unsealed()?;
        self.constraints.insert(address, constraints);
        Ok(())
    }

    /// Record a non-fatal finding.
    pub fn record(&mut self, diagnostic: Diagnostic) -> Result<(), AccessControlError> {
        self.ensure_unsealed()?;
        self.diagnostics.push(diagnostic);
        Ok(())
    }

    /// Make the context immutable. Sealing happens once.
    pub fn seal(&mut self) -> Result<(), AccessControlError> {
        self.ensure_unsealed()?;
        self.sealed = true;
        Ok(())
    }

    /// Constraints that govern `address`: the exact entry, or the entry of
    /// the wildcard address for the same resource type.
    fn lookup(&self, address: &ResourceAddress) -> Option<(&ResourceAddress, &Constraints)> {
        self.constraints.get_key_value(address).or_else(|| {
            address
                .wildcarded()
                .and_then(|wildcard| self.constraints.get_key_value(&wildcard))
        })
    }

    /// Decide a privilege on a resource.
    pub fn check(&self, address: &ResourceAddress, privilege: &Privilege) -> Decision {
        match self.lookup(address) {
            Some((recorded, constraints)) => constraints.decide(recorded, self.facet, privilege),
            None => Decision::UnknownResource,
        }
    }

    /// Is the resource visible at all.
    pub fn is_visible(&self, address: &ResourceAddress) -> Decision {
        self.check(address, &Privilege::Address)
    }

    /// Can the resource be read.
    pub fn can_read(&self, address: &ResourceAddress) -> Decision {
        self.check(address, &Privilege::Read)
    }

    /// Can the resource be written.
    pub fn can_write(&self, address: &ResourceAddress) -> Decision {
        self.check(address, &Privilege::Write)
    }

    /// Can attribute `name` of the resource be read.
    pub fn can_read_attribute(&self, address: &ResourceAddress, name: &str) -> Decision {
        self.check(address, &Privilege::ReadAttribute(name.to_string()))
    }

    /// Can attribute `name` of the resource be written.
    pub fn can_write_attribute(&self, address: &ResourceAddress, name: &str) -> Decision {
        self.check(address, &Privilege::WriteAttribute(name.to_string()))
    }

    /// Can `operation` be executed on the resource.
    pub fn can_execute(&self, address: &ResourceAddress, operation: &str) -> Decision {
        self.check(address, &Privilege::Execute(operation.to_string()))
    }

    /// The form items among `names` that must be rendered read-only
    /// because their attribute is not writable on `address`.
    pub fn read_only_attributes<'a>(
        &self,
        address: &ResourceAddress,
        names: impl IntoIterator<Item = &'a str>,
    ) -> BTreeSet<String> {
        names
            .into_iter()
            .filter(|name| !self.can_write_attribute(address, name).is_granted())
            .map(str::to_string)
            .collect()
    }

    /// Human readable listing of required resources and their constraints,
    /// for troubleshooting.
    pub fn dump(&self) -> ContextDump<'_> {
        ContextDump(self)
    }
}

/// Display adapter returned by [`SecurityContext::dump`].
pub struct ContextDump<'a>(&'a SecurityContext);

impl Display for ContextDump<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let context = self.0;

        writeln!(f, "Required resources for: {} ({})", context.id, context.facet)?;
        for resource in &context.required_resources {
            writeln!(f, "  - {resource}")?;
        }

        writeln!(f, "Constraints")?;
        for (address, constraints) in &context.constraints {
            writeln!(f, "  {address}")?;
            writeln!(f, "    address: {}", constraints.address_visible())?;
            writeln!(f, "    read-config: {}", constraints.read_config())?;
            writeln!(f, "    write-config: {}", constraints.write_config())?;
            writeln!(f, "    read-runtime: {}", constraints.read_runtime())?;
            writeln!(f, "    write-runtime: {}", constraints.write_runtime())?;

            writeln!(f, "    Attributes")?;
            for (name, permission) in constraints.attributes() {
                writeln!(
                    f,
                    "      {name}: read={} write={}",
                    permission.read, permission.write
                )?;
            }

            writeln!(f, "    Operations")?;
            for (name, exec) in constraints.operations(address) {
                writeln!(f, "      {name}: exec={exec}")?;
            }
        }

        if !context.diagnostics.is_empty() {
            writeln!(f, "Diagnostics")?;
            for diagnostic in &context.diagnostics {
                writeln!(f, "  - {diagnostic}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributePermission;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn logging() -> ResourceAddress {
        ResourceAddress::root().child("subsystem", "logging")
    }

    fn context() -> SecurityContext {
        SecurityContext::new(
            "logging-view",
            Facet::Administrable,
            BTreeSet::from([logging()]),
            SystemTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn it_rejects_mutation_once_sealed() -> TestResult {
        let mut context = context();
        context.update_constraints(logging(), Constraints::new())?;
        context.seal()?;

        assert!(context.is_sealed());
        assert!(matches!(
            context.require(logging().child("logger", "*")),
            Err(AccessControlError::Sealed { .. })
        ));
        assert!(matches!(
            context.update_constraints(logging(), Constraints::new()),
            Err(AccessControlError::Sealed { .. })
        ));
        assert!(matches!(
            context.record(Diagnostic::MissingMetadata { address: logging() }),
            Err(AccessControlError::Sealed { .. })
        ));
        assert!(matches!(context.seal(), Err(AccessControlError::Sealed { .. })));
        assert_eq!(context.required_resources().len(), 1);
        Ok(())
    }

    #[test]
    fn it_answers_unknown_for_unmodeled_resources() -> TestResult {
        let mut context = context();
        context.seal()?;

        let decision = context.can_write_attribute(&logging(), "level");
        assert_eq!(decision, Decision::UnknownResource);
        assert!(!decision.is_granted());
        Ok(())
    }

    #[test]
    fn it_falls_back_from_an_instance_to_its_wildcard() -> TestResult {
        let mut context = context();
        let mut constraints = Constraints::new();
        constraints.set_config(true, false);
        context.update_constraints(logging().child("logger", "*"), constraints)?;
        context.seal()?;

        let instance = logging().child("logger", "org.jboss.as");
        assert_eq!(context.can_read(&instance), Decision::Granted);
        assert_eq!(context.can_write(&instance), Decision::Denied);
        assert_eq!(
            context.can_read(&logging().child("handler", "FILE")),
            Decision::UnknownResource
        );
        Ok(())
    }

    #[test]
    fn it_lists_read_only_form_items() -> TestResult {
        let mut context = context();
        let mut constraints = Constraints::new();
        constraints.set_config(true, true);
        constraints.set_attribute(
            "level",
            AttributePermission {
                read: true,
                write: false,
            },
        );
        context.update_constraints(logging(), constraints)?;
        context.seal()?;

        let read_only = context.read_only_attributes(&logging(), ["level", "use-parent-handlers"]);
        assert_eq!(read_only, BTreeSet::from(["level".to_string()]));

        let unknown = context.read_only_attributes(&"subsystem=web".parse()?, ["x"]);
        assert_eq!(unknown, BTreeSet::from(["x".to_string()]));
        Ok(())
    }

    #[test]
    fn it_dumps_resources_and_constraints() -> TestResult {
        let mut context = context();
        let mut constraints = Constraints::new();
        constraints.set_config(true, false);
        constraints.set_runtime(true, false);
        constraints.set_attribute(
            "level",
            AttributePermission {
                read: true,
                write: false,
            },
        );
        constraints.set_operation_exec(logging(), "read-log-file", true);
        context.update_constraints(logging(), constraints)?;
        context.record(Diagnostic::MissingMetadata {
            address: "subsystem=web".parse()?,
        })?;
        context.seal()?;

        let expected = "\
Required resources for: logging-view (administrable)
  - subsystem=logging
Constraints
  subsystem=logging
    address: true
    read-config: true
    write-config: false
    read-runtime: true
    write-runtime: false
    Attributes
      level: read=true write=false
    Operations
      read-log-file: exec=true
Diagnostics
  - Access-control meta data missing for subsystem=web
";
        assert_eq!(context.dump().to_string(), expected);
        Ok(())
    }
}

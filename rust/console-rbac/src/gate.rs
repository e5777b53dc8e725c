use crate::{Decision, Privilege, ResourceAddress, SecurityContext};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

/// A refused authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Not authorized to {privilege} on {address} in {id}: {decision}")]
pub struct Denial {
    /// The view whose context answered.
    pub id: String,
    /// The queried resource.
    pub address: ResourceAddress,
    /// The privilege that was asked for.
    pub privilege: Privilege,
    /// Why it was refused; never [`Decision::Granted`].
    pub decision: Decision,
}

/// Guards actions behind security-context checks and publishes every
/// refusal, so an "unauthorized" view can always show the latest one.
#[derive(Debug)]
pub struct AuthorizationGate {
    last_denial: watch::Sender<Option<Denial>>,
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationGate {
    /// A gate that has refused nothing yet.
    pub fn new() -> Self {
        let (last_denial, _) = watch::channel(None);
        Self { last_denial }
    }

    /// Check `privilege` on `address` and publish the refusal if it is not
    /// granted.
    pub fn authorize(
        &self,
        context: &SecurityContext,
        address: &ResourceAddress,
        privilege: &Privilege,
    ) -> Decision {
        let decision = context.check(address, privilege);
        if !decision.is_granted() {
            tracing::warn!(
                id = %context.id(),
                %address,
                %privilege,
                %decision,
                write = privilege.is_write(),
                "Authorization refused"
            );
            self.last_denial.send_replace(Some(Denial {
                id: context.id().to_string(),
                address: address.clone(),
                privilege: privilege.clone(),
                decision,
            }));
        }
        decision
    }

    /// Like [`Self::authorize`], as a `Result`.
    pub fn require(
        &self,
        context: &SecurityContext,
        address: &ResourceAddress,
        privilege: &Privilege,
    ) -> Result<(), Denial> {
        match self.authorize(context, address, privilege) {
            Decision::Granted => Ok(()),
            decision => Err(Denial {
                id: context.id().to_string(),
                address: address.clone(),
                privilege: privilege.clone(),
                decision,
            }),
        }
    }

    /// The most recent refusal, if any.
    pub fn last_denial(&self) -> Option<Denial> {
        self.last_denial.borrow().clone()
    }

    /// Receive every future refusal.
    pub fn subscribe(&self) -> watch::Receiver<Option<Denial>> {
        self.last_denial.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Constraints, Facet};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use testresult::TestResult;
    use web_time::SystemTime;

    fn context(address: &ResourceAddress) -> TestResult<SecurityContext> {
        let mut constraints = Constraints::new();
        constraints.set_config(true, false);
        constraints.set_operation_exec(address.clone(), "reload", true);

        let mut context = SecurityContext::new(
            "logging-view",
            Facet::Administrable,
            BTreeSet::from([address.clone()]),
            SystemTime::now(),
        );
        context.update_constraints(address.clone(), constraints)?;
        context.seal()?;
        Ok(context)
    }

    #[test]
    fn it_publishes_the_last_denial() -> TestResult {
        let logging: ResourceAddress = "subsystem=logging".parse()?;
        let context = context(&logging)?;
        let gate = AuthorizationGate::new();
        let mut receiver = gate.subscribe();

        assert_eq!(
            gate.authorize(&context, &logging, &Privilege::Read),
            Decision::Granted
        );
        assert!(!receiver.has_changed()?);
        assert_eq!(gate.last_denial(), None);

        assert_eq!(
            gate.authorize(&context, &logging, &Privilege::Write),
            Decision::Denied
        );
        assert!(receiver.has_changed()?);

        let unknown: ResourceAddress = "subsystem=web".parse()?;
        let denial = gate
            .require(&context, &unknown, &Privilege::Execute("reload".into()))
            .unwrap_err();
        assert_eq!(denial.decision, Decision::UnknownResource);
        assert_eq!(gate.last_denial(), Some(denial.clone()));
        assert_eq!(receiver.borrow_and_update().clone(), Some(denial));
        Ok(())
    }

    #[test]
    fn it_lets_granted_actions_through() -> TestResult {
        let logging: ResourceAddress = "subsystem=logging".parse()?;
        let context = context(&logging)?;
        let gate = AuthorizationGate::default();

        gate.require(&context, &logging, &Privilege::Execute("reload".into()))?;
        assert_eq!(gate.last_denial(), None);
        Ok(())
    }

    #[test]
    fn it_describes_the_denial() {
        let denial = Denial {
            id: "logging-view".into(),
            address: "subsystem=logging".parse().unwrap(),
            privilege: Privilege::WriteAttribute("level".into()),
            decision: Decision::Denied,
        };
        assert_eq!(
            denial.to_string(),
            "Not authorized to write attribute 'level' on subsystem=logging in logging-view: denied"
        );
    }
}

use crate::config::ConfigDb;
use crate::driver::Driver;
use crate::error::HarnessError;
use crate::request::Randomise;
use crate::sequencer::{ItemPort, Sequencer};
use crate::signal::Bus;
use crate::simulation::Process;
use log::{debug, info};

struct Active<D: Driver> {
    sequencer: Sequencer<D::Item>,
    driver: D,
}

/// Sequencer and driver for one bus. A passive agent has neither.
pub struct Agent<D: Driver> {
    name: String,
    active: Option<Active<D>>,
    idle_cycles: u64,
}

impl<D: Driver> std::fmt::Debug for Agent<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("active", &self.active.is_some())
            .field("idle_cycles", &self.idle_cycles)
            .finish()
    }
}

impl<D> Agent<D>
where
    D: Driver,
    D::Item: Randomise,
    D::Bus: Bus,
{
    /// Builds the agent at `scope`. The sequencer and driver exist only when
    /// `is_active` is set for the scope; `make_driver` is not called
    /// otherwise.
    pub fn build(
        scope: &str,
        db: &ConfigDb,
        bus: &D::Bus,
        seed: u64,
        make_driver: impl FnOnce() -> D,
    ) -> Result<Self, HarnessError> {
        db.get_bus(scope, "vif")?.check(bus.name())?;
        let active = if db.get_bool_or(scope, "is_active", false)? {
            Some(Active {
                sequencer: Sequencer::new(format!("{scope}.sequencer"), seed),
                driver: make_driver(),
            })
        } else {
            info!("{scope}: passive");
            None
        };
        Ok(Self {
            name: scope.to_string(),
            active,
            idle_cycles: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn sequencer(&self) -> Option<&Sequencer<D::Item>> {
        self.active.as_ref().map(|a| &a.sequencer)
    }

    pub fn sequencer_mut(&mut self) -> Option<&mut Sequencer<D::Item>> {
        self.active.as_mut().map(|a| &mut a.sequencer)
    }

    pub fn driver(&self) -> Option<&D> {
        self.active.as_ref().map(|a| &a.driver)
    }

    /// Edges at which no item was available.
    pub fn idle_cycles(&self) -> u64 {
        self.idle_cycles
    }
}

impl<D> Process<D::Bus> for Agent<D>
where
    D: Driver,
    D::Item: Randomise,
    D::Bus: Bus,
{
    fn name(&self) -> &str {
        &self.name
    }

    /// The item driven at the previous edge has just been consumed, so it is
    /// acknowledged before the next one is fetched.
    fn posedge(&mut self, time: u64, bus: &mut D::Bus) -> Result<(), HarnessError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        if active.sequencer.has_outstanding() {
            active.sequencer.item_done()?;
        }
        match active.sequencer.get_next_item()? {
            Some(item) => active.driver.drive(&item, bus),
            None => {
                self.idle_cycles += 1;
                debug!("{}@{time}: no item, bus holds", self.name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SingleCycleBus;
    use crate::config::BusBinding;
    use crate::driver::SingleCycleDriver;

    fn db(is_active: bool) -> ConfigDb {
        let mut db = ConfigDb::new();
        db.set("env.*", "vif", BusBinding::new("vif"));
        db.set("env.*", "is_active", is_active);
        db
    }

    #[test]
    fn passive_agent_never_builds_a_driver() {
        let bus = SingleCycleBus::default();
        let agent = Agent::<SingleCycleDriver>::build("env.agent", &db(false), &bus, 0, || {
            panic!("driver built for a passive agent")
        })
        .unwrap();
        assert!(!agent.is_active());
        assert!(agent.sequencer().is_none());
    }

    #[test]
    fn active_agent_has_sequencer_and_driver() {
        let bus = SingleCycleBus::default();
        let agent =
            Agent::build("env.agent", &db(true), &bus, 0, SingleCycleDriver::default).unwrap();
        assert!(agent.is_active());
        assert_eq!(agent.sequencer().map(|s| s.name()), Some("env.agent.sequencer"));
    }

    #[test]
    fn wrong_bus_is_a_configuration_error() {
        let bus = SingleCycleBus::new("other");
        let err = Agent::build("env.agent", &db(true), &bus, 0, SingleCycleDriver::default)
            .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Config(crate::error::ConfigError::UnknownBus { .. })
        ));
    }
}

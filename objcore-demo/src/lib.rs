//! Console walkthrough of the objcore kernel.
//!
//! The sample variants live in [`variants`]; [`Demo::run`] prints one or all
//! scenarios to any writer.

pub mod variants;

use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use objcore_model::{
    Codec, CodecConfig, Entity, FieldType, General, Registry, VOID, Value, safe_cast,
};
use tracing::{debug, info};

use variants::{EMPLOYEE, PERSON, TEAM, car, employee, person, team};

/// Which part of the kernel to walk through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    Cast,
    Copy,
    Clone,
    Serialize,
    Metadata,
    All,
}

impl Scenario {
    const EACH: [Scenario; 5] = [
        Scenario::Cast,
        Scenario::Copy,
        Scenario::Clone,
        Scenario::Serialize,
        Scenario::Metadata,
    ];
}

/// Runs scenarios with a fixed codec configuration.
pub struct Demo {
    config: CodecConfig,
    registry: Registry,
}

impl Demo {
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            registry: variants::registry(),
        }
    }

    fn codec(&self) -> Codec<'_> {
        self.registry.codec(self.config)
    }

    /// Prints `scenario` (or every scenario for [`Scenario::All`]) to `out`.
    pub fn run(&self, scenario: Scenario, out: &mut impl Write) -> Result<()> {
        if scenario == Scenario::All {
            for each in Scenario::EACH {
                self.run(each, out)?;
            }
            return Ok(());
        }
        info!(?scenario, "running scenario");
        match scenario {
            Scenario::Cast => self.cast(out),
            Scenario::Copy => self.copy(out),
            Scenario::Clone => self.clone_objects(out),
            Scenario::Serialize => self.serialize(out),
            Scenario::Metadata => self.metadata(out),
            Scenario::All => Ok(()),
        }
    }

    fn cast(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "=== Safe cast ===")?;
        let anna = person("Anna", 25)?;
        let camry = car("Toyota", "Camry", 2020)?;
        let bob = employee("Bob", 41, "IT", 5200.0)?;

        writeln!(out, "Person <- Person: {}", short(safe_cast(Some(&anna), &PERSON).value()))?;
        writeln!(out, "Person <- Car: {}", short(safe_cast(Some(&camry), &PERSON).value()))?;
        writeln!(out, "Person <- Employee: {}", short(bob.try_as(&PERSON).value()))?;
        writeln!(out, "Employee <- Person: {}", short(anna.try_as(&EMPLOYEE).value()))?;
        writeln!(out, "Person <- nothing: {}", short(safe_cast::<Entity>(None, &PERSON).value()))?;
        writeln!(out, "Person <- Void: {}", short(VOID.try_as(&PERSON).value()))?;
        writeln!(out, "employee is Person: {}", bob.is_type(&PERSON))?;
        writeln!(out, "real type of employee: {}", bob.real_type())?;
        writeln!(out)?;
        Ok(())
    }

    fn copy(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "=== Copy ===")?;
        let anna = person("Anna", 25)?;
        let mut blank = Entity::new(&PERSON);
        anna.copy_to(&mut blank).context("copying into a Person")?;
        writeln!(out, "after copy_to: {}", blank.describe())?;

        let mut camry = car("Toyota", "Camry", 2020)?;
        match anna.copy_to(&mut camry) {
            Ok(()) => writeln!(out, "copy_to Car: ok")?,
            Err(e) => writeln!(out, "copy_to Car: {e}")?,
        }
        writeln!(out, "safe_copy_to Car: {}", anna.safe_copy_to(&mut camry))?;
        writeln!(out, "Void copy_to: {}", describe_error(VOID.copy_to(&mut blank)))?;

        let core = team("core", person("Lena", 38)?, &["Anna", "Bob"])?;
        let mut shallow = Entity::new(&TEAM);
        let mut deep = Entity::new(&TEAM);
        core.copy_to(&mut shallow)?;
        core.deep_copy_to(&mut deep)?;
        push_member(&shallow, "Carl");
        push_member(&deep, "Dora");
        writeln!(out, "original members after edits: {}", field(&core, "members"))?;
        writeln!(out, "deep copy members: {}", field(&deep, "members"))?;
        writeln!(out)?;
        Ok(())
    }

    fn clone_objects(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "=== Clone & equality ===")?;
        let anna = person("Anna", 25)?;
        let twin = anna.clone();
        writeln!(out, "clone: {}", twin.describe())?;
        writeln!(out, "clone equals source: {}", twin.equals(&anna))?;
        writeln!(out, "clone is a new identity: {}", twin.id() != anna.id())?;
        writeln!(out, "Person equals Car: {}", anna.equals(&car("Toyota", "Camry", 2020)?))?;
        writeln!(out, "try_clone of Void: {}", VOID.try_clone())?;
        writeln!(out)?;
        Ok(())
    }

    fn serialize(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "=== Serialization ===")?;
        let codec = self.codec();
        let anna = person("Anna", 25)?;
        let text = anna.serialize_with(&codec)?;
        writeln!(out, "{text}")?;
        let back = codec.decode(&PERSON, &text).context("decoding Person")?;
        writeln!(out, "round-trip deep_equals: {}", back.deep_equals(&anna))?;

        let bob = employee("Bob", 41, "IT", 5200.0)?;
        let bob_text = bob.serialize_with(&codec)?;
        let decoded = self.registry.deserialize_any(&bob_text)?;
        writeln!(out, "decoded by tag: {}", short(decoded.value().as_ref()))?;

        let core = team("core", bob, &["Anna"])?;
        writeln!(out, "{}", core.serialize_with(&codec)?)?;
        writeln!(out, "Void: {}", VOID.serialize()?)?;
        writeln!(out, "garbage -> {}", Entity::safe_deserialize(&PERSON, "garbage"))?;
        writeln!(out)?;
        Ok(())
    }

    fn metadata(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "=== Metadata ===")?;
        let mut anna = person("Anna", 25)?;
        anna.set_metadata("department", "IT")?;
        writeln!(out, "existing key: {}", anna.try_get_metadata("department", FieldType::Text))?;
        writeln!(out, "missing key: {}", anna.try_get_metadata("nonexistent", FieldType::Text))?;
        writeln!(out, "wrong kind: {}", anna.try_get_metadata("department", FieldType::Int))?;
        writeln!(out, "blank key accepted: {}", anna.safe_set_metadata(" ", 1))?;
        writeln!(out)?;
        Ok(())
    }
}

impl Default for Demo {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

fn short(entity: Option<&Entity>) -> String {
    match entity {
        Some(e) => match e.get("name") {
            Some(name) => format!("{} {name}", e.variant()),
            None => e.variant().to_string(),
        },
        None => VOID.to_string(),
    }
}

fn field(entity: &Entity, name: &str) -> String {
    entity.get(name).map_or_else(|| "-".to_string(), Value::to_string)
}

fn push_member(team: &Entity, name: &str) {
    if let Some(Value::List(members)) = team.get("members") {
        members.borrow_mut().push(Value::from(name));
        debug!(member = name, "member added");
    }
}

fn describe_error(result: objcore_model::KernelResult<()>) -> String {
    match result {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    }
}

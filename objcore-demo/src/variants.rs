//! Sample variants used by the walkthrough.

use objcore_model::{ANY, Entity, FieldSpec, FieldType, KernelResult, Registry, Value, Variant};

static PERSON_FIELDS: [FieldSpec; 2] = [
    FieldSpec::new("name", FieldType::Text),
    FieldSpec::new("age", FieldType::Int),
];

/// Declares [`EMPLOYEE`], so a team lead may be an employee.
pub static PERSON: Variant =
    Variant::derived("Person", &ANY, &PERSON_FIELDS).with_subvariants(&PERSON_SUBVARIANTS);

static PERSON_SUBVARIANTS: [&Variant; 1] = [&EMPLOYEE];

static EMPLOYEE_FIELDS: [FieldSpec; 2] = [
    FieldSpec::new("department", FieldType::Text),
    FieldSpec::new("salary", FieldType::Float),
];

/// A person with a job. Casts to [`PERSON`].
pub static EMPLOYEE: Variant = Variant::derived("Employee", &PERSON, &EMPLOYEE_FIELDS);

static CAR_FIELDS: [FieldSpec; 3] = [
    FieldSpec::new("brand", FieldType::Text),
    FieldSpec::new("model", FieldType::Text),
    FieldSpec::new("year", FieldType::Int),
];

pub static CAR: Variant = Variant::derived("Car", &ANY, &CAR_FIELDS);

static TEAM_FIELDS: [FieldSpec; 3] = [
    FieldSpec::new("name", FieldType::Text),
    FieldSpec::new("lead", FieldType::Object(&PERSON)),
    FieldSpec::new("members", FieldType::List),
];

/// Composite variant: a nested lead and a shared member list.
pub static TEAM: Variant = Variant::derived("Team", &ANY, &TEAM_FIELDS);

pub fn person(name: &str, age: i64) -> KernelResult<Entity> {
    Entity::with_fields(&PERSON, [("name", Value::from(name)), ("age", Value::from(age))])
}

pub fn employee(name: &str, age: i64, department: &str, salary: f64) -> KernelResult<Entity> {
    Entity::with_fields(
        &EMPLOYEE,
        [
            ("name", Value::from(name)),
            ("age", Value::from(age)),
            ("department", Value::from(department)),
            ("salary", Value::from(salary)),
        ],
    )
}

pub fn car(brand: &str, model: &str, year: i64) -> KernelResult<Entity> {
    Entity::with_fields(
        &CAR,
        [
            ("brand", Value::from(brand)),
            ("model", Value::from(model)),
            ("year", Value::from(year)),
        ],
    )
}

pub fn team(name: &str, lead: Entity, members: &[&str]) -> KernelResult<Entity> {
    let members = members.iter().map(|m| Value::from(*m)).collect::<Vec<_>>();
    Entity::with_fields(
        &TEAM,
        [
            ("name", Value::from(name)),
            ("lead", Value::from(lead)),
            ("members", Value::from(members)),
        ],
    )
}

/// Registry holding every sample variant.
#[must_use]
pub fn registry() -> Registry {
    Registry::with_variants([&PERSON, &EMPLOYEE, &CAR, &TEAM])
}

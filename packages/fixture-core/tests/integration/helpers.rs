//! Shared schemas and factories for the integration suite.

use fixture_core::config::FixtureConfig;
use fixture_core::context::FixtureContext;
use fixture_core::factory::Factory;
use fixture_core::generator::Generator;
use fixture_core::schema::{EntitySchema, FieldDef, RelationDef};

pub const GLOBAL_KEY: &str = "global_entity";

/// Ownership flavour of a relationship fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Standard,
    Cascade,
}

impl Mode {
    pub fn prefix(self) -> &'static str {
        match self {
            Mode::Standard => "Standard",
            Mode::Cascade => "Cascade",
        }
    }

    pub fn relationship_with_global(self) -> String {
        format!("{}RelationshipWithGlobalEntity", self.prefix())
    }

    pub fn inversed_side(self) -> String {
        format!("{}InversedSideEntity", self.prefix())
    }

    pub fn owning_side(self) -> String {
        format!("{}OwningSideEntity", self.prefix())
    }
}

fn relation(mode: Mode, relation: RelationDef) -> RelationDef {
    match mode {
        Mode::Standard => relation,
        Mode::Cascade => relation.cascade(),
    }
}

/// Creates a seeded context with every schema of the suite registered.
pub fn context() -> FixtureContext {
    let ctx = FixtureContext::new(FixtureConfig::seeded(42));
    register_schemas(&ctx);
    ctx
}

pub fn register_schemas(ctx: &FixtureContext) {
    ctx.register(
        EntitySchema::new("GlobalEntity")
            .field(FieldDef::required("name").generated(Generator::sequence("global_{n}"))),
    )
    .unwrap();

    for mode in [Mode::Standard, Mode::Cascade] {
        ctx.register(
            EntitySchema::new(mode.relationship_with_global())
                .field(FieldDef::optional("label").generated(Generator::text()))
                .relation(relation(mode, RelationDef::to_one("global_entity", "GlobalEntity"))),
        )
        .unwrap();

        // Rich domain: the owning side cannot exist without its inversed side
        ctx.register(
            EntitySchema::new(mode.inversed_side())
                .field(FieldDef::optional("name").generated(Generator::text()))
                .relation(relation(
                    mode,
                    RelationDef::to_many("relations", mode.owning_side())
                        .inversed_by("inversed_side")
                        .mandatory(),
                )),
        )
        .unwrap();
        ctx.register(
            EntitySchema::new(mode.owning_side())
                .field(FieldDef::optional("rank").generated(Generator::integer(1, 100)))
                .relation(
                    RelationDef::to_one("inversed_side", mode.inversed_side())
                        .inversed_by("relations")
                        .mandatory(),
                ),
        )
        .unwrap();
    }

    // Two independent collections of the same type on one owner
    ctx.register(
        EntitySchema::new("MultiInversedSideEntity")
            .relation(
                RelationDef::to_many("main_relations", "MultiOwningSideEntity")
                    .inversed_by("main")
                    .mandatory(),
            )
            .relation(
                RelationDef::to_many("secondary_relations", "MultiOwningSideEntity")
                    .inversed_by("secondary")
                    .mandatory(),
            ),
    )
    .unwrap();
    ctx.register(
        EntitySchema::new("MultiOwningSideEntity")
            .relation(
                RelationDef::to_one("main", "MultiInversedSideEntity")
                    .inversed_by("main_relations"),
            )
            .relation(
                RelationDef::to_one("secondary", "MultiInversedSideEntity")
                    .inversed_by("secondary_relations"),
            ),
    )
    .unwrap();
}

pub fn global_entity_factory() -> Factory {
    Factory::new("GlobalEntity")
}

/// Loads the shared fixtures, the way a story would at boot.
pub fn load_global_story(ctx: &FixtureContext) {
    ctx.global(GLOBAL_KEY, &global_entity_factory()).unwrap();
}

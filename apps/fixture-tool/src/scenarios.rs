//! Relationship scenarios run by the tool.

use anyhow::{ensure, Context, Result};
use clap::ValueEnum;

use fixture_core::context::FixtureContext;
use fixture_core::factory::Factory;
use fixture_core::generator::Generator;
use fixture_core::schema::{EntitySchema, FieldDef, RelationDef};
use fixture_core::spec::{Attribute, Specification};

pub const GLOBAL_KEY: &str = "global_entity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Entity referencing a global fixture inside a deferred scope
    Global,
    /// Owner with a mandatory to-many collection
    Inversed,
    /// Owner with two collections of the same type
    Dual,
    /// Every scenario, in order
    All,
}

impl Scenario {
    pub fn expand(self) -> Vec<Scenario> {
        match self {
            Scenario::All => vec![Scenario::Global, Scenario::Inversed, Scenario::Dual],
            other => vec![other],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Standard,
    Cascade,
}

impl Mode {
    fn prefix(self) -> &'static str {
        match self {
            Mode::Standard => "Standard",
            Mode::Cascade => "Cascade",
        }
    }

    fn apply(self, relation: RelationDef) -> RelationDef {
        match self {
            Mode::Standard => relation,
            Mode::Cascade => relation.cascade(),
        }
    }
}

/// Options shared by all scenarios.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioOptions {
    pub mode: Mode,
    pub members: usize,
    pub as_proxy: bool,
}

/// Registers the schemas used by every scenario, for one ownership mode.
pub fn register_schemas(ctx: &FixtureContext, mode: Mode) -> Result<()> {
    let owner = format!("{}Owner", mode.prefix());
    let member = format!("{}Member", mode.prefix());

    ctx.register(
        EntitySchema::new("GlobalEntity")
            .field(FieldDef::required("name").generated(Generator::sequence("global_{n}"))),
    )?;
    ctx.register(
        EntitySchema::new("GlobalUser")
            .field(FieldDef::optional("email").generated(Generator::sequence("user_{n}@example.com")))
            .relation(mode.apply(RelationDef::to_one("global_entity", "GlobalEntity"))),
    )?;
    ctx.register(
        EntitySchema::new(owner.as_str())
            .field(FieldDef::optional("name").generated(Generator::text()))
            .relation(mode.apply(
                RelationDef::to_many("members", member.as_str())
                    .inversed_by("owner")
                    .mandatory(),
            )),
    )?;
    ctx.register(
        EntitySchema::new(member.as_str())
            .field(FieldDef::optional("rank").generated(Generator::integer(1, 100)))
            .relation(
                RelationDef::to_one("owner", owner.as_str())
                    .inversed_by("members")
                    .mandatory(),
            ),
    )?;
    ctx.register(
        EntitySchema::new("Board")
            .relation(RelationDef::to_many("main_members", "Seat").inversed_by("main_board"))
            .relation(
                RelationDef::to_many("secondary_members", "Seat").inversed_by("secondary_board"),
            ),
    )?;
    ctx.register(
        EntitySchema::new("Seat")
            .relation(RelationDef::to_one("main_board", "Board").inversed_by("main_members"))
            .relation(
                RelationDef::to_one("secondary_board", "Board").inversed_by("secondary_members"),
            ),
    )?;
    ctx.schemas().validate()?;
    Ok(())
}

/// Runs one scenario and returns a one-line summary.
pub fn run(ctx: &FixtureContext, scenario: Scenario, options: ScenarioOptions) -> Result<String> {
    match scenario {
        Scenario::Global => run_global(ctx, options),
        Scenario::Inversed => run_inversed(ctx, options),
        Scenario::Dual => run_dual(ctx, options),
        Scenario::All => {
            let mut lines = Vec::new();
            for scenario in Scenario::All.expand() {
                lines.push(run(ctx, scenario, options)?);
            }
            Ok(lines.join("\n"))
        }
    }
}

fn run_global(ctx: &FixtureContext, options: ScenarioOptions) -> Result<String> {
    let globals = Factory::new("GlobalEntity");
    let users = Factory::new("GlobalUser");

    ctx.with_deferred_flush(|ctx| {
        let global: Attribute = if options.as_proxy {
            ctx.global_proxy(GLOBAL_KEY, &globals)?.into()
        } else {
            ctx.global(GLOBAL_KEY, &globals)?.into()
        };
        users.create_with(ctx, Specification::new().with("global_entity", global))
    })
    .context("global scenario failed")?;

    let global_count = globals.repository(ctx).count()?;
    let user_count = users.repository(ctx).count()?;
    ensure!(global_count == 1, "expected 1 global entity, found {}", global_count);
    Ok(format!(
        "global: {} global entity, {} user(s), proxy={}",
        global_count, user_count, options.as_proxy
    ))
}

fn run_inversed(ctx: &FixtureContext, options: ScenarioOptions) -> Result<String> {
    let owners = Factory::new(format!("{}Owner", options.mode.prefix()));
    let members = Factory::new(format!("{}Member", options.mode.prefix()));

    let owner = owners
        .create_with(
            ctx,
            Specification::new().with("members", members.many(options.members)),
        )
        .context("inversed scenario failed")?;

    ensure!(
        owner.many("members").len() == options.members,
        "owner holds {} members, expected {}",
        owner.many("members").len(),
        options.members
    );
    Ok(format!(
        "inversed ({:?}): {} owner(s), {} member(s)",
        options.mode,
        owners.repository(ctx).count()?,
        members.repository(ctx).count()?
    ))
}

fn run_dual(ctx: &FixtureContext, options: ScenarioOptions) -> Result<String> {
    let boards = Factory::new("Board");
    let seats = Factory::new("Seat");

    let board = boards
        .create_with(
            ctx,
            Specification::new()
                .with("main_members", seats.many(options.members))
                .with("secondary_members", seats.many(options.members)),
        )
        .context("dual scenario failed")?;

    Ok(format!(
        "dual: {} board(s), {} seat(s) ({} main, {} secondary)",
        boards.repository(ctx).count()?,
        seats.repository(ctx).count()?,
        board.many("main_members").len(),
        board.many("secondary_members").len()
    ))
}

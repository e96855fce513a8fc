use crate::context::FixtureContext;
use crate::entity::{Entity, EntityRef};
use crate::error::FixtureError;
use crate::generator::Generator;

/// Read-only view over the committed rows of one entity type.
#[derive(Debug, Clone)]
pub struct Repository<'a> {
    ctx: &'a FixtureContext,
    entity_type: String,
}

impl<'a> Repository<'a> {
    pub fn new(ctx: &'a FixtureContext, entity_type: impl Into<String>) -> Self {
        Self {
            ctx,
            entity_type: entity_type.into(),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn count(&self) -> Result<usize, FixtureError> {
        self.ctx.storage().count(&self.entity_type)
    }

    pub fn first(&self) -> Result<Option<Entity>, FixtureError> {
        self.ctx.storage().first(&self.entity_type)
    }

    pub fn all(&self) -> Result<Vec<Entity>, FixtureError> {
        self.ctx.storage().all(&self.entity_type)
    }

    /// Returns the committed row with `id`; staged rows are not visible.
    pub fn find(&self, id: u64) -> Result<Option<Entity>, FixtureError> {
        Ok(self.all()?.into_iter().find(|row| row.id() == id))
    }

    /// Picks a committed row through the context's generator source.
    pub fn random(&self) -> Result<Entity, FixtureError> {
        let mut rows = self.all()?;
        if rows.is_empty() {
            return Err(FixtureError::AssertionFailed {
                entity_type: self.entity_type.clone(),
                message: "no rows to pick from".to_string(),
            });
        }
        let max = (rows.len() - 1) as i64;
        let index = self
            .ctx
            .generate("__random_row", &Generator::integer(0, max))
            .as_u64()
            .unwrap_or(0) as usize;
        Ok(rows.swap_remove(index.min(rows.len() - 1)))
    }

    /// Fails unless exactly `expected` rows are committed.
    pub fn assert_count(&self, expected: usize) -> Result<(), FixtureError> {
        let actual = self.count()?;
        if actual != expected {
            return Err(FixtureError::AssertionFailed {
                entity_type: self.entity_type.clone(),
                message: format!("expected {} rows, found {}", expected, actual),
            });
        }
        Ok(())
    }

    pub fn assert_empty(&self) -> Result<(), FixtureError> {
        self.assert_count(0)
    }

    /// Fails unless a row with `id` is committed.
    pub fn assert_exists(&self, id: u64) -> Result<(), FixtureError> {
        let reference = EntityRef::new(&self.entity_type, id);
        if self.find(id)?.is_none() {
            return Err(FixtureError::AssertionFailed {
                entity_type: self.entity_type.clone(),
                message: format!("{} is not committed", reference),
            });
        }
        Ok(())
    }
}

use crate::entity::{Entity, EntityRef};
use crate::factory::{Factory, FactoryCollection};
use crate::generator::Generator;
use crate::registry::Proxy;

/// How one attribute of a specification is resolved.
#[derive(Debug, Clone)]
pub enum Attribute {
    /// Literal scalar value
    Value(serde_json::Value),
    /// Value produced by the generator source
    Generate(Generator),
    /// Existing entity, by identity
    Entity(EntityRef),
    /// Existing entity behind a proxy
    Proxy(Proxy),
    /// Existing entities, by identity (to-many)
    Entities(Vec<EntityRef>),
    /// Nested creation of one entity
    Factory(Factory),
    /// Nested creation of several entities (to-many)
    Collection(FactoryCollection),
    /// Global fixture bound to a key, created by the factory on first use
    Global { key: String, factory: Factory },
}

impl Attribute {
    /// Refers to the global fixture bound to `key`.
    pub fn global(key: impl Into<String>, factory: Factory) -> Self {
        Attribute::Global {
            key: key.into(),
            factory,
        }
    }
}

impl From<serde_json::Value> for Attribute {
    fn from(value: serde_json::Value) -> Self {
        Attribute::Value(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::Value(value.into())
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Attribute::Value(value.into())
    }
}

impl From<i64> for Attribute {
    fn from(value: i64) -> Self {
        Attribute::Value(value.into())
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Attribute::Value(value.into())
    }
}

impl From<Generator> for Attribute {
    fn from(generator: Generator) -> Self {
        Attribute::Generate(generator)
    }
}

impl From<EntityRef> for Attribute {
    fn from(reference: EntityRef) -> Self {
        Attribute::Entity(reference)
    }
}

impl From<&Entity> for Attribute {
    fn from(entity: &Entity) -> Self {
        Attribute::Entity(entity.reference().clone())
    }
}

impl From<Entity> for Attribute {
    fn from(entity: Entity) -> Self {
        Attribute::from(&entity)
    }
}

impl From<Proxy> for Attribute {
    fn from(proxy: Proxy) -> Self {
        Attribute::Proxy(proxy)
    }
}

impl From<Vec<EntityRef>> for Attribute {
    fn from(references: Vec<EntityRef>) -> Self {
        Attribute::Entities(references)
    }
}

impl From<&[Entity]> for Attribute {
    fn from(entities: &[Entity]) -> Self {
        Attribute::Entities(entities.iter().map(|e| e.reference().clone()).collect())
    }
}

impl From<Factory> for Attribute {
    fn from(factory: Factory) -> Self {
        Attribute::Factory(factory)
    }
}

impl From<FactoryCollection> for Attribute {
    fn from(collection: FactoryCollection) -> Self {
        Attribute::Collection(collection)
    }
}

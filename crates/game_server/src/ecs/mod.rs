//! Entity-component-system world model.
//!
//! Each game session owns one [`EntityStore`], an ID-indexed collection of
//! [`Entity`] values. An entity is nothing but a bag of typed components;
//! all behavior lives in the systems that scan entities every tick and in
//! the session's message handlers.
//!
//! ## Concurrency
//!
//! The store and every entity carry their own reader/writer lock. The store
//! lock guards the ID index only; an entity's lock guards its own component
//! bag. The two are never held at the same time, so there is no lock
//! ordering to get wrong between them.

pub mod component;
pub mod entity;
pub mod store;

pub use component::{
    AttackComponent, Component, ComponentKind, DestructibleComponent, DoorComponent,
    HealthComponent, InteractableComponent, ItemComponent, OpenableComponent, PlayerComponent,
    SkillComponent, StatsComponent, TransformComponent, VelocityComponent,
};
pub use entity::{Entity, EntityId};
pub use store::EntityStore;

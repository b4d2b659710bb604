//! Deterministic simulation module
//!
//! All bubble logic lives here. This module must be pure and deterministic:
//! - Time only advances through `Session::advance`
//! - Seeded RNG only
//! - Stable iteration order (insertion order of the store)
//! - No rendering or platform dependencies; output goes through `Sinks`

pub mod bubble;
pub mod cascade;
pub mod collision;
pub mod lifecycle;
pub mod physics;
pub mod schedule;
pub mod state;
pub mod store;
pub mod tick;
pub mod world;

pub use bubble::{Bubble, BubbleColor, BubbleId, BubbleShape};
pub use cascade::{CascadePhase, CascadeSequencer, CascadeSession, DetonateError, explosion_order};
pub use collision::{CollisionResult, circle_circle_collision};
pub use lifecycle::{HoldSpawner, Lifecycle, SpawnOptions};
pub use physics::{Bounce, PhysicsBackend, SimpleIntegrator, StepReport};
pub use schedule::{ScheduledAction, Scheduler};
pub use state::{FrameReport, Session};
pub use store::BubbleStore;
pub use tick::{HoldInput, TickInput, TickOutcome, tick};
pub use world::World;

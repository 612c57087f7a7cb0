//! 2D scene hierarchy with retained-renderer synchronization
//!
//! This crate provides an entity hierarchy (parent/child links with
//! transform inheritance), dirty tracking for renderer-visible state and a
//! sync bridge that pushes changes into a retained-mode scene once per frame.

pub mod config;
pub mod core;
pub mod graphics;
pub mod scene;
pub mod sync;

// Re-export commonly used types
pub mod prelude {
    // Entity system types
    pub use crate::core::entity::{
        Children, Entity, HierarchyError, HierarchyListener, Parent, ParentOptions,
        Transform, World, MAX_HIERARCHY_DEPTH,
    };

    // Visual components
    pub use crate::core::entity::{
        Color, Shape, ShapeKind, Sprite, Text, Visible, VisualKind, ZIndex,
    };

    // Math types
    pub use glam::Vec2;

    // Retained scene types
    pub use crate::graphics::{
        MemoryScene, PositionData, RetainedError, RetainedHandle, RetainedScene, Visual,
        VisualData,
    };

    // Sync types
    pub use crate::sync::{SyncBridge, SyncError, SyncStats};

    // Scene types
    pub use crate::config::{ConfigError, SceneConfig};
    pub use crate::scene::Scene;
}

/// Initialize logging for the scene
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

//! Visual resource provider
//!
//! Models and textures belong to the host. The simulation only asks for a
//! handle per entity kind and never waits on one: failures become the
//! placeholder handle and the level carries on.

use thiserror::Error;

use crate::sim::entity::EntityTag;

/// Opaque reference to a host-side mesh/texture bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u32);

impl VisualHandle {
    /// Drawn when the real visual is unavailable
    pub const PLACEHOLDER: VisualHandle = VisualHandle(0);

    pub fn is_placeholder(&self) -> bool {
        *self == Self::PLACEHOLDER
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResourceError {
    #[error("no visual registered for {kind:?}")]
    Missing { kind: EntityTag },
    #[error("visual for {kind:?} failed to load: {reason}")]
    LoadFailed { kind: EntityTag, reason: String },
}

/// Host-side visual loader
pub trait ResourceProvider {
    fn load_visual(
        &mut self,
        kind: EntityTag,
        variant: Option<&str>,
    ) -> Result<VisualHandle, ResourceError>;
}

/// Resolve a visual, substituting the placeholder on failure
pub fn visual_or_placeholder(
    provider: &mut dyn ResourceProvider,
    kind: EntityTag,
    variant: Option<&str>,
) -> VisualHandle {
    match provider.load_visual(kind, variant) {
        Ok(handle) => handle,
        Err(e) => {
            log::warn!("{}, drawing placeholder", e);
            VisualHandle::PLACEHOLDER
        }
    }
}

/// Hands out one stable handle per kind (headless runs and tests)
#[derive(Debug, Default)]
pub struct KindHandles;

impl ResourceProvider for KindHandles {
    fn load_visual(
        &mut self,
        kind: EntityTag,
        _variant: Option<&str>,
    ) -> Result<VisualHandle, ResourceError> {
        Ok(VisualHandle(kind as u32 + 1))
    }
}

/// Provider with nothing loaded; every request fails
#[derive(Debug, Default)]
pub struct NoResources;

impl ResourceProvider for NoResources {
    fn load_visual(
        &mut self,
        kind: EntityTag,
        _variant: Option<&str>,
    ) -> Result<VisualHandle, ResourceError> {
        Err(ResourceError::Missing { kind })
    }
}

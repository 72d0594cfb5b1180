use std::fmt;

use crate::error::{Result, SkyshiftError};

use super::backend::{BatchFftBackend, FftDirection, SoftwareBatchFft};
use super::context::FftContext;

/// What a cached context is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextRole {
    Reference,
    Sample,
    Inverse,
}

impl ContextRole {
    pub const ALL: [ContextRole; 3] = [Self::Reference, Self::Sample, Self::Inverse];

    pub fn direction(self) -> FftDirection {
        match self {
            Self::Reference | Self::Sample => FftDirection::Forward,
            Self::Inverse => FftDirection::Inverse,
        }
    }
}

impl fmt::Display for ContextRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Sample => write!(f, "sample"),
            Self::Inverse => write!(f, "inverse"),
        }
    }
}

#[derive(Default)]
struct RoleContexts {
    reference: Option<FftContext>,
    sample: Option<FftContext>,
    inverse: Option<FftContext>,
}

impl RoleContexts {
    fn slot(&self, role: ContextRole) -> &Option<FftContext> {
        match role {
            ContextRole::Reference => &self.reference,
            ContextRole::Sample => &self.sample,
            ContextRole::Inverse => &self.inverse,
        }
    }

    fn slot_mut(&mut self, role: ContextRole) -> &mut Option<FftContext> {
        match role {
            ContextRole::Reference => &mut self.reference,
            ContextRole::Sample => &mut self.sample,
            ContextRole::Inverse => &mut self.inverse,
        }
    }

    fn clear(&mut self) -> usize {
        ContextRole::ALL
            .iter()
            .filter_map(|&role| self.slot_mut(role).take())
            .count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// No context prepared yet.
    Uninitialized,
    /// At least one role is bound to a context.
    Initialized,
    /// Released by [`ContextCache::teardown`]; terminal.
    TornDown,
}

/// Role-keyed cache of prepared FFT contexts.
///
/// Contexts are prepared on first use and kept until [`teardown`] so that
/// per-frame calls never pay the accelerator setup cost. The cache is plain
/// mutable state: share it between threads only behind a lock.
///
/// [`teardown`]: ContextCache::teardown
pub struct ContextCache {
    backend: Box<dyn BatchFftBackend>,
    contexts: RoleContexts,
    torn_down: bool,
}

impl ContextCache {
    pub fn new(backend: Box<dyn BatchFftBackend>) -> Self {
        Self {
            backend,
            contexts: RoleContexts::default(),
            torn_down: false,
        }
    }

    /// Cache over the rustfft-backed batch FFT.
    pub fn software() -> Self {
        Self::new(Box::new(SoftwareBatchFft::new()))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn state(&self) -> CacheState {
        if self.torn_down {
            CacheState::TornDown
        } else if ContextRole::ALL.iter().any(|&r| self.contexts.slot(r).is_some()) {
            CacheState::Initialized
        } else {
            CacheState::Uninitialized
        }
    }

    /// Side length of the context bound to `role`, if any.
    pub fn bound_side(&self, role: ContextRole) -> Option<usize> {
        self.contexts.slot(role).as_ref().map(FftContext::side)
    }

    pub fn get(&self, role: ContextRole) -> Option<&FftContext> {
        self.contexts.slot(role).as_ref()
    }

    /// Context for `role` sized `side x side`, prepared on first use.
    ///
    /// A context of a different size is replaced. If preparing the new one
    /// fails, the cache is left exactly as it was.
    pub fn context(&mut self, role: ContextRole, side: usize) -> Result<&mut FftContext> {
        if self.torn_down {
            return Err(SkyshiftError::InvalidArgument(
                "context cache has been torn down".into(),
            ));
        }

        let needs_prepare = match self.contexts.slot(role) {
            Some(ctx) if ctx.side() == side => false,
            Some(ctx) => {
                tracing::warn!(
                    "Rebuilding {} context: {}x{} -> {}x{}",
                    role,
                    ctx.side(),
                    ctx.side(),
                    side,
                    side
                );
                true
            }
            None => true,
        };

        if needs_prepare {
            let ctx = FftContext::new(self.backend.as_ref(), side, role.direction())?;
            tracing::info!(
                "Prepared {} context {}x{} on {} (step {})",
                role,
                side,
                side,
                self.backend.name(),
                ctx.step()
            );
            *self.contexts.slot_mut(role) = Some(ctx);
        }

        self.contexts
            .slot_mut(role)
            .as_mut()
            .ok_or_else(|| SkyshiftError::Backend(format!("{role} context missing after prepare")))
    }

    /// The three contexts of one correlation: both forwards read-only, the
    /// inverse writable. All three must already be bound.
    pub(crate) fn correlation_contexts(
        &mut self,
    ) -> Result<(&FftContext, &FftContext, &mut FftContext)> {
        let RoleContexts {
            reference,
            sample,
            inverse,
        } = &mut self.contexts;
        match (reference.as_ref(), sample.as_ref(), inverse.as_mut()) {
            (Some(r), Some(s), Some(i)) => Ok((r, s, i)),
            _ => Err(SkyshiftError::Backend(
                "correlation contexts are not all prepared".into(),
            )),
        }
    }

    /// Release every context. Further use of the cache is an error.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let released = self.contexts.clear();
        self.torn_down = true;
        tracing::info!(
            "Context cache on {} torn down ({} contexts released)",
            self.backend.name(),
            released
        );
    }
}

impl fmt::Debug for ContextCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextCache")
            .field("backend", &self.backend.name())
            .field("state", &self.state())
            .field("reference", &self.bound_side(ContextRole::Reference))
            .field("sample", &self.bound_side(ContextRole::Sample))
            .field("inverse", &self.bound_side(ContextRole::Inverse))
            .finish()
    }
}

//! Tool resolution: pick one generator per (scope, family) and remember it.
//!
//! Candidates are visited in the registry's fixed priority order and the
//! first acceptable one wins. The choice is stored on the `Scope` object the
//! caller passes in, never in process-wide state. Each family slot has its
//! own lock, held across detection, so concurrent first use within a scope
//! resolves exactly once.

use super::error::{Attempt, DetectionError, Rejection, ResolveError};
use super::registry::ToolRegistry;
use super::types::{Implementation, ResolutionOrigin, ResolveRequest, ResolvedTool, ToolFamily};
use super::version::VersionSpec;
use crate::transport::ToolProbe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct Slot {
    tool: Arc<ResolvedTool>,
    origin: ResolutionOrigin,
}

/// A build scope (subproject). Resolutions live as long as the scope does.
#[derive(Debug)]
pub struct Scope {
    name: String,
    lexer: Mutex<Option<Slot>>,
    parser: Mutex<Option<Slot>>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lexer: Mutex::new(None),
            parser: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tool already chosen for a family, if any.
    pub fn resolved(&self, family: ToolFamily) -> Option<Arc<ResolvedTool>> {
        self.slot(family).as_ref().map(|s| Arc::clone(&s.tool))
    }

    fn slot(&self, family: ToolFamily) -> MutexGuard<'_, Option<Slot>> {
        let m = match family {
            ToolFamily::Lexer => &self.lexer,
            ToolFamily::Parser => &self.parser,
        };
        // A panic mid-detection leaves the slot empty; still usable.
        m.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves tools against a registry through a probe.
pub struct ToolResolver<'a> {
    registry: &'a ToolRegistry,
    probe: &'a dyn ToolProbe,
}

impl<'a> ToolResolver<'a> {
    pub fn new(registry: &'a ToolRegistry, probe: &'a dyn ToolProbe) -> Self {
        Self { registry, probe }
    }

    /// Explicit find. Fails if the family was already resolved in this scope.
    pub fn find(
        &self,
        scope: &Scope,
        family: ToolFamily,
        request: &ResolveRequest,
    ) -> Result<Arc<ResolvedTool>, ResolveError> {
        self.resolve(scope, family, request, ResolutionOrigin::Explicit)
    }

    /// Explicit find with the version constraint as written (`">=2.6, <3"`).
    /// A malformed constraint fails the call before anything is probed.
    pub fn find_matching(
        &self,
        scope: &Scope,
        family: ToolFamily,
        allowed: &[Implementation],
        version: &str,
    ) -> Result<Arc<ResolvedTool>, ResolveError> {
        let mut request = ResolveRequest {
            version: VersionSpec::parse(version)?,
            ..Default::default()
        };
        if !allowed.is_empty() {
            request = request.allow(allowed);
        }
        self.find(scope, family, &request)
    }

    /// Resolve `family` in `scope`.
    ///
    /// Implicit calls return the cached tool when one exists, as long as it
    /// satisfies `request.version`. Explicit calls are allowed only on an
    /// unresolved slot.
    pub fn resolve(
        &self,
        scope: &Scope,
        family: ToolFamily,
        request: &ResolveRequest,
        origin: ResolutionOrigin,
    ) -> Result<Arc<ResolvedTool>, ResolveError> {
        check_family(family, request)?;

        let mut slot = scope.slot(family);
        if let Some(existing) = slot.as_ref() {
            return reuse(scope, family, existing, request, origin);
        }

        let tool = Arc::new(self.search(scope, family, request)?);
        info!(
            scope = scope.name(),
            %family,
            implementation = %tool.implementation,
            version = %tool.version,
            path = %tool.path.display(),
            "resolved {} {}",
            family,
            origin
        );
        *slot = Some(Slot {
            tool: Arc::clone(&tool),
            origin,
        });
        Ok(tool)
    }

    /// First-match-wins walk over the family's candidates.
    fn search(
        &self,
        scope: &Scope,
        family: ToolFamily,
        request: &ResolveRequest,
    ) -> Result<ResolvedTool, ResolveError> {
        let mut attempts = Vec::new();

        for &implementation in self.registry.implementations_for(family) {
            if !request.is_allowed(implementation) {
                continue;
            }
            match self.try_candidate(implementation, request) {
                Ok(tool) => return Ok(tool),
                Err(rejection) => {
                    debug!(
                        scope = scope.name(),
                        %implementation,
                        %rejection,
                        "candidate rejected"
                    );
                    attempts.push(Attempt {
                        implementation,
                        rejection,
                    });
                }
            }
        }

        Err(ResolveError::NoSuitableTool {
            scope: scope.name().to_string(),
            family,
            attempts,
        })
    }

    fn try_candidate(
        &self,
        implementation: Implementation,
        request: &ResolveRequest,
    ) -> Result<ResolvedTool, Rejection> {
        let (path, version) = self
            .registry
            .detect(implementation, self.probe)
            .map_err(|e| match e {
                DetectionError::NotFound { .. } => Rejection::NotFound,
                other => Rejection::Detection(other),
            })?;

        let wanted = combined_spec(implementation, request);
        if !wanted.satisfied_by(&version) {
            return Err(Rejection::VersionMismatch {
                found: version,
                wanted,
            });
        }

        Ok(ResolvedTool {
            family: implementation.family(),
            implementation,
            path,
            version,
        })
    }
}

/// Per-implementation constraints plus the per-call constraint.
fn combined_spec(implementation: Implementation, request: &ResolveRequest) -> VersionSpec {
    match request.versions.get(&implementation) {
        Some(spec) => spec.and(&request.version),
        None => request.version.clone(),
    }
}

fn check_family(family: ToolFamily, request: &ResolveRequest) -> Result<(), ResolveError> {
    let named = request
        .allowed
        .iter()
        .flatten()
        .chain(request.versions.keys());
    for &implementation in named {
        if implementation.family() != family {
            return Err(ResolveError::WrongFamily {
                implementation,
                family,
            });
        }
    }
    Ok(())
}

fn reuse(
    scope: &Scope,
    family: ToolFamily,
    existing: &Slot,
    request: &ResolveRequest,
    origin: ResolutionOrigin,
) -> Result<Arc<ResolvedTool>, ResolveError> {
    let already = |reason: String| ResolveError::AlreadyResolved {
        scope: scope.name().to_string(),
        family,
        existing: Box::new((*existing.tool).clone()),
        reason,
    };

    if origin == ResolutionOrigin::Explicit {
        return Err(already(format!(
            "it was resolved {} before; find may be called once, before any generation",
            existing.origin
        )));
    }
    let implementation = existing.tool.implementation;
    if !request.is_allowed(implementation) {
        return Err(already(format!(
            "cached implementation {} is not in the allowed list",
            implementation
        )));
    }
    let wanted = combined_spec(implementation, request);
    if !wanted.satisfied_by(&existing.tool.version) {
        return Err(already(format!(
            "cached version does not satisfy {}",
            wanted
        )));
    }

    debug!(scope = scope.name(), %family, "using cached resolution");
    Ok(Arc::clone(&existing.tool))
}

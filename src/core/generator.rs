//! `lex()` / `yacc()` entry points: resolve implicitly, plan, build.

use super::codegen::InvocationBuilder;
use super::error::{GenerateError, ResolveError};
use super::planner;
use super::registry::ToolRegistry;
use super::resolver::{Scope, ToolResolver};
use super::types::*;
use crate::transport::ToolProbe;
use std::sync::Arc;
use tracing::debug;

/// Result of one generation request.
#[derive(Debug, Clone)]
pub struct Generated {
    pub tool: Arc<ResolvedTool>,
    pub outputs: OutputSet,
    pub command: CommandDescription,
}

/// Code generator front end shared by all scopes.
pub struct CodeGen<'a> {
    registry: &'a ToolRegistry,
    probe: &'a dyn ToolProbe,
}

impl<'a> CodeGen<'a> {
    pub fn new(registry: &'a ToolRegistry, probe: &'a dyn ToolProbe) -> Self {
        Self { registry, probe }
    }

    fn resolver(&self) -> ToolResolver<'a> {
        ToolResolver::new(self.registry, self.probe)
    }

    /// Explicitly pick the tool for a family. Once per scope, before generation.
    pub fn find(
        &self,
        scope: &Scope,
        family: ToolFamily,
        request: &ResolveRequest,
    ) -> Result<Arc<ResolvedTool>, ResolveError> {
        self.resolver().find(scope, family, request)
    }

    /// Explicit find with a constraint string, as typed by a user.
    pub fn find_matching(
        &self,
        scope: &Scope,
        family: ToolFamily,
        allowed: &[Implementation],
        version: &str,
    ) -> Result<Arc<ResolvedTool>, ResolveError> {
        self.resolver().find_matching(scope, family, allowed, version)
    }

    pub fn lex(
        &self,
        scope: &Scope,
        request: &GenerationRequest,
    ) -> Result<Generated, GenerateError> {
        self.generate(scope, ToolFamily::Lexer, request)
    }

    pub fn yacc(
        &self,
        scope: &Scope,
        request: &GenerationRequest,
    ) -> Result<Generated, GenerateError> {
        self.generate(scope, ToolFamily::Parser, request)
    }

    /// Resolve (or reuse) the scope's tool, plan outputs, build the command.
    pub fn generate(
        &self,
        scope: &Scope,
        family: ToolFamily,
        request: &GenerationRequest,
    ) -> Result<Generated, GenerateError> {
        self.generate_with(scope, family, request, &ResolveRequest::default())
    }

    /// Like `generate`, with scope-level preferences used if this call resolves.
    /// The request's own version constraint is added to the preferences.
    pub fn generate_with(
        &self,
        scope: &Scope,
        family: ToolFamily,
        request: &GenerationRequest,
        preferences: &ResolveRequest,
    ) -> Result<Generated, GenerateError> {
        let mut resolve = preferences.clone();
        resolve.version = resolve.version.and(&request.version);
        let tool = self
            .resolver()
            .resolve(scope, family, &resolve, ResolutionOrigin::Implicit)?;

        let outputs = planner::plan(family, tool.implementation, &request.input, &request.options)?;
        let input = request
            .input
            .path()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let command = InvocationBuilder::new(self.registry).build(&tool, &outputs, &input, &request.args);

        debug!(
            scope = scope.name(),
            target = %command.target,
            outputs = ?command.outputs,
            "planned generation"
        );
        Ok(Generated {
            tool,
            outputs,
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::error::PlanError;
    use super::super::registry::testing::FakeProbe;
    use super::super::version::VersionSpec;
    use super::*;

    fn probe() -> FakeProbe {
        FakeProbe::new()
            .with_tool("flex", "flex 2.6.4")
            .with_tool("bison", "bison (GNU Bison) 3.8.2")
    }

    #[test]
    fn test_lex_end_to_end() {
        let probe = probe();
        let registry = ToolRegistry::default();
        let codegen = CodeGen::new(&registry, &probe);
        let scope = Scope::new("main");

        let mut request = GenerationRequest::new("src/lexer.l");
        request.options.header = Some("lexer.h".to_string());
        let generated = codegen.lex(&scope, &request).unwrap();

        assert_eq!(generated.tool.implementation, Implementation::Flex);
        assert_eq!(generated.outputs.names(), vec!["lexer.c", "lexer.h"]);
        assert_eq!(
            generated.command.args,
            vec!["-o", "lexer.c", "--header-file=lexer.h", "src/lexer.l"]
        );
    }

    #[test]
    fn test_repeated_generation_reuses_tool() {
        let probe = probe();
        let registry = ToolRegistry::default();
        let codegen = CodeGen::new(&registry, &probe);
        let scope = Scope::new("main");

        let a = codegen.yacc(&scope, &GenerationRequest::new("a.y")).unwrap();
        let runs = probe.run_count();
        let b = codegen.yacc(&scope, &GenerationRequest::new("b.yy")).unwrap();

        assert!(Arc::ptr_eq(&a.tool, &b.tool));
        assert_eq!(probe.run_count(), runs);
        assert_eq!(b.outputs.names(), vec!["b.cpp", "b.hpp"]);
    }

    #[test]
    fn test_find_then_generate() {
        let probe = probe();
        let registry = ToolRegistry::default();
        let codegen = CodeGen::new(&registry, &probe);
        let scope = Scope::new("main");

        let found = codegen
            .find(
                &scope,
                ToolFamily::Parser,
                &ResolveRequest::default().allow(&[Implementation::Bison]),
            )
            .unwrap();
        let generated = codegen.yacc(&scope, &GenerationRequest::new("p.y")).unwrap();
        assert!(Arc::ptr_eq(&found, &generated.tool));
    }

    #[test]
    fn test_find_after_generate_fails() {
        let probe = probe();
        let registry = ToolRegistry::default();
        let codegen = CodeGen::new(&registry, &probe);
        let scope = Scope::new("main");

        codegen.lex(&scope, &GenerationRequest::new("l.l")).unwrap();
        let err = codegen
            .find(&scope, ToolFamily::Lexer, &ResolveRequest::default())
            .unwrap_err();
        assert!(matches!(err, ResolveError::AlreadyResolved { .. }));
    }

    #[test]
    fn test_per_call_version_only_on_first_use() {
        let probe = probe();
        let registry = ToolRegistry::default();
        let codegen = CodeGen::new(&registry, &probe);
        let scope = Scope::new("main");

        let mut request = GenerationRequest::new("l.l");
        request.version = VersionSpec::parse(">=2.6").unwrap();
        codegen.lex(&scope, &request).unwrap();

        request.version = VersionSpec::parse(">=3").unwrap();
        let err = codegen.lex(&scope, &request).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Resolve(ResolveError::AlreadyResolved { .. })
        ));
    }

    #[test]
    fn test_plan_error_surfaces() {
        let probe = probe();
        let registry = ToolRegistry::default();
        let codegen = CodeGen::new(&registry, &probe);
        let scope = Scope::new("main");

        let mut request = GenerationRequest::new("p.y");
        request.options.table = Some("p.tab".to_string());
        let err = codegen.yacc(&scope, &request).unwrap_err();
        assert!(matches!(err, GenerateError::Plan(PlanError::UnsupportedOutput { .. })));
        // The tool stays resolved; only this call failed.
        assert!(scope.resolved(ToolFamily::Parser).is_some());
    }

    #[test]
    fn test_no_tool_installed() {
        let probe = FakeProbe::new();
        let registry = ToolRegistry::default();
        let codegen = CodeGen::new(&registry, &probe);
        let scope = Scope::new("main");

        let err = codegen.lex(&scope, &GenerationRequest::new("l.l")).unwrap_err();
        match err {
            GenerateError::Resolve(ResolveError::NoSuitableTool { attempts, .. }) => {
                assert_eq!(attempts.len(), 4)
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

//! Bound declaration nodes.

use std::rc::Rc;

use keel_core::{rewrite_all, rewrite_opt, MaybeChanged};

use crate::analyze::symbol::SymbolId;
use crate::context::CompileContext;
use crate::diagnostics::Expected;
use crate::span::Span;

use super::stmts::{BlockStmt, StmtContext};

/// A bound module: resolved symbol plus the bound bodies beneath it.
#[derive(Debug)]
pub struct Module {
    pub span: Span,
    pub symbol: SymbolId,
    pub modules: Vec<Rc<Module>>,
    /// Module-level and impl-member functions, in declaration order.
    pub functions: Vec<Rc<Function>>,
}

/// A bound function: its symbol and, for non-native functions, its body.
#[derive(Debug)]
pub struct Function {
    pub span: Span,
    pub symbol: SymbolId,
    pub body: Option<Rc<BlockStmt>>,
}

impl Module {
    pub fn type_check(
        this: &Rc<Module>,
        ctx: &mut CompileContext,
    ) -> Expected<MaybeChanged<Rc<Module>>> {
        let modules = rewrite_all(&this.modules, |m| Module::type_check(m, ctx))?;
        let functions = rewrite_all(&this.functions, |f| Function::type_check(f, ctx))?;
        if !modules.changed && !functions.changed {
            return Ok(MaybeChanged::unchanged(this.clone()));
        }
        Ok(MaybeChanged::changed(Rc::new(Module {
            span: this.span,
            symbol: this.symbol,
            modules: modules.value,
            functions: functions.value,
        })))
    }

    pub fn lower(
        this: &Rc<Module>,
        ctx: &mut CompileContext,
    ) -> Expected<MaybeChanged<Rc<Module>>> {
        let modules = rewrite_all(&this.modules, |m| Module::lower(m, ctx))?;
        let functions = rewrite_all(&this.functions, |f| Function::lower(f, ctx))?;
        if !modules.changed && !functions.changed {
            return Ok(MaybeChanged::unchanged(this.clone()));
        }
        Ok(MaybeChanged::changed(Rc::new(Module {
            span: this.span,
            symbol: this.symbol,
            modules: modules.value,
            functions: functions.value,
        })))
    }

    /// Every function node in this module subtree.
    pub fn collect_functions(&self, out: &mut Vec<Rc<Function>>) {
        for module in &self.modules {
            module.collect_functions(out);
        }
        out.extend(self.functions.iter().cloned());
    }
}

impl Function {
    pub fn type_check(
        this: &Rc<Function>,
        ctx: &mut CompileContext,
    ) -> Expected<MaybeChanged<Rc<Function>>> {
        let return_ty = ctx.symbol(this.symbol).as_function().return_ty;
        let body = rewrite_opt(&this.body, |body| {
            BlockStmt::type_check(body, ctx, StmtContext { return_ty })
        })?;
        if !body.changed {
            return Ok(MaybeChanged::unchanged(this.clone()));
        }
        Ok(MaybeChanged::changed(Rc::new(Function {
            span: this.span,
            symbol: this.symbol,
            body: body.value,
        })))
    }

    pub fn lower(
        this: &Rc<Function>,
        ctx: &mut CompileContext,
    ) -> Expected<MaybeChanged<Rc<Function>>> {
        let body = rewrite_opt(&this.body, |body| BlockStmt::lower(body, ctx))?;
        if !body.changed {
            return Ok(MaybeChanged::unchanged(this.clone()));
        }
        Ok(MaybeChanged::changed(Rc::new(Function {
            span: this.span,
            symbol: this.symbol,
            body: body.value,
        })))
    }
}

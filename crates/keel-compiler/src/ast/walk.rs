//! Deterministic parse-tree walk.
//!
//! Flattens a module tree into a vector of node references, children before
//! parents, covering every node that introduces a symbol or wires an
//! association. Symbol construction and the association pass iterate this
//! list; the traversal never copies node payloads (the `Rc` clones are
//! pointer copies).

use std::rc::Rc;

use crate::analyze::scope::ScopeId;

use super::items::{
    FnItem, FnTemplateItem, ImplItem, Module, StaticVarItem, StructItem, TemplateParam,
    TemplatedImplItem, TypeAliasItem, TypeTemplateItem,
};
use super::stmts::{BlockStmt, LabelStmt, Stmt, VarStmt};

/// A flattened reference to a symbol-bearing or association-bearing parse
/// node.
#[derive(Debug, Clone)]
pub enum Node {
    Module(Rc<Module>),
    Struct(Rc<StructItem>),
    Field(Rc<super::items::FieldItem>),
    Alias(Rc<TypeAliasItem>),
    TypeTemplate(Rc<TypeTemplateItem>),
    FnTemplate(Rc<FnTemplateItem>),
    Fn(Rc<FnItem>),
    SelfParam(Rc<super::items::SelfParamItem>),
    Param(Rc<super::items::ParamItem>),
    /// A type- or function-template parameter, defined into the template's
    /// self-scope.
    TypeParam { param: TemplateParam, scope: ScopeId },
    /// A templated-impl parameter, defined into the impl's self-scope.
    ImplParam { param: TemplateParam, scope: ScopeId },
    Impl(Rc<ImplItem>),
    TemplatedImpl(Rc<TemplatedImplItem>),
    StaticVar(Rc<StaticVarItem>),
    Var(Rc<VarStmt>),
    Label(Rc<LabelStmt>),
}

/// Flatten `module` and everything beneath it.
pub fn walk_module(module: &Rc<Module>) -> Vec<Node> {
    let mut nodes = Vec::new();
    collect_module(module, &mut nodes);
    nodes
}

/// Flatten several root modules in order.
pub fn walk_modules(modules: &[Rc<Module>]) -> Vec<Node> {
    let mut nodes = Vec::new();
    for module in modules {
        collect_module(module, &mut nodes);
    }
    nodes
}

fn collect_module(module: &Rc<Module>, out: &mut Vec<Node>) {
    for child in &module.modules {
        collect_module(child, out);
    }
    for strct in &module.structs {
        collect_struct(strct, out);
    }
    for alias in &module.aliases {
        out.push(Node::Alias(alias.clone()));
    }
    for template in &module.type_templates {
        for param in &template.params {
            out.push(Node::TypeParam {
                param: param.clone(),
                scope: template.self_scope,
            });
        }
        collect_struct(&template.strct, out);
        out.push(Node::TypeTemplate(template.clone()));
    }
    for func in &module.fns {
        collect_fn(func, out);
    }
    for template in &module.fn_templates {
        for param in &template.params {
            out.push(Node::TypeParam {
                param: param.clone(),
                scope: template.self_scope,
            });
        }
        collect_fn(&template.func, out);
        out.push(Node::FnTemplate(template.clone()));
    }
    for imp in &module.impls {
        for func in &imp.fns {
            collect_fn(func, out);
        }
        out.push(Node::Impl(imp.clone()));
    }
    for imp in &module.templated_impls {
        for param in &imp.params {
            out.push(Node::ImplParam {
                param: param.clone(),
                scope: imp.self_scope,
            });
        }
        for func in &imp.fns {
            collect_fn(func, out);
        }
        out.push(Node::TemplatedImpl(imp.clone()));
    }
    for var in &module.static_vars {
        out.push(Node::StaticVar(var.clone()));
    }
    out.push(Node::Module(module.clone()));
}

fn collect_struct(strct: &Rc<StructItem>, out: &mut Vec<Node>) {
    for field in &strct.fields {
        out.push(Node::Field(field.clone()));
    }
    out.push(Node::Struct(strct.clone()));
}

/// Flatten a function: self parameter, declared parameters, body-nested
/// declarations, then the function itself.
pub fn collect_fn(func: &Rc<FnItem>, out: &mut Vec<Node>) {
    if let Some(self_param) = &func.self_param {
        out.push(Node::SelfParam(self_param.clone()));
    }
    for param in &func.params {
        out.push(Node::Param(param.clone()));
    }
    if let Some(body) = &func.body {
        collect_block(body, out);
    }
    out.push(Node::Fn(func.clone()));
}

fn collect_block(block: &Rc<BlockStmt>, out: &mut Vec<Node>) {
    for stmt in &block.stmts {
        collect_stmt(stmt, out);
    }
}

fn collect_stmt(stmt: &Stmt, out: &mut Vec<Node>) {
    match stmt {
        Stmt::Block(block) => collect_block(block, out),
        Stmt::If(s) => {
            for body in &s.bodies {
                collect_block(body, out);
            }
        }
        Stmt::While(s) => collect_block(&s.body, out),
        Stmt::Var(var) => out.push(Node::Var(var.clone())),
        Stmt::Label(label) => out.push(Node::Label(label.clone())),
        Stmt::Return(_)
        | Stmt::Exit(_)
        | Stmt::Assert(_)
        | Stmt::Assign(_)
        | Stmt::CompoundAssign(_)
        | Stmt::Expr(_) => {}
    }
}

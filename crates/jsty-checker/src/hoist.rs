//! The hoisting pass.
//!
//! Scans a statement list (through nested statement bodies, not into
//! function bodies) for `function`, `var`, and `class` declarations and
//! pre-binds them: functions and classes to `any` (their real types land
//! when their declaration transfers), `var`s to `undefined` and not
//! definitely assigned.

use crate::env::{Binding, BindingKind, TypeEnvironment};
use jsty_ast::{ForHead, ForInit, Pattern, Stmt, VarDecl, VarKind};
use jsty_common::Spanned;
use jsty_solver::TypeId;

pub(crate) fn hoist_declarations(env: &mut TypeEnvironment, body: &[Stmt]) {
    for stmt in body {
        hoist_stmt(env, stmt);
    }
}

fn hoist_stmt(env: &mut TypeEnvironment, stmt: &Stmt) {
    match stmt {
        Stmt::Function { function, span } => {
            if let Some(name) = &function.name {
                env.declare(Binding::new(name, TypeId::ANY, BindingKind::Function, *span));
            }
        }
        Stmt::Class { class, span } => {
            if let Some(name) = &class.name {
                env.declare(Binding::new(name, TypeId::ANY, BindingKind::Class, *span));
            }
        }
        Stmt::VarDecl(decl) => hoist_var_decl(env, decl),
        Stmt::If {
            consequent,
            alternate,
            ..
        } => {
            hoist_stmt(env, consequent);
            if let Some(alternate) = alternate {
                hoist_stmt(env, alternate);
            }
        }
        Stmt::While { body, .. }
        | Stmt::DoWhile { body, .. }
        | Stmt::Labeled { body, .. } => hoist_stmt(env, body),
        Stmt::For { init, body, .. } => {
            if let Some(init) = init {
                if let ForInit::VarDecl(decl) = init.as_ref() {
                    hoist_var_decl(env, decl);
                }
            }
            hoist_stmt(env, body);
        }
        Stmt::ForIn { left, body, .. } | Stmt::ForOf { left, body, .. } => {
            if let ForHead::VarDecl(decl) = left.as_ref() {
                hoist_var_decl(env, decl);
            }
            hoist_stmt(env, body);
        }
        Stmt::Block { body, .. } => hoist_declarations(env, body),
        Stmt::Switch { cases, .. } => {
            for case in cases {
                hoist_declarations(env, &case.body);
            }
        }
        Stmt::Try {
            block,
            handler,
            finalizer,
            ..
        } => {
            hoist_declarations(env, block);
            if let Some(handler) = handler {
                hoist_declarations(env, &handler.body);
            }
            if let Some(finalizer) = finalizer {
                hoist_declarations(env, finalizer);
            }
        }
        _ => {}
    }
}

fn hoist_var_decl(env: &mut TypeEnvironment, decl: &VarDecl) {
    // Only `var` hoists; let/const have a dead zone the transfer models
    // by not pre-binding them.
    if decl.kind != VarKind::Var {
        return;
    }
    for declarator in &decl.declarators {
        hoist_pattern(env, &declarator.pattern);
    }
}

fn hoist_pattern(env: &mut TypeEnvironment, pattern: &Pattern) {
    match pattern {
        Pattern::Ident { name, .. } => {
            let mut binding =
                Binding::new(name, TypeId::UNDEFINED, BindingKind::Var, pattern.span());
            binding.definitely_assigned = false;
            env.declare(binding);
        }
        Pattern::Array { elements, .. } => {
            for element in elements.iter().flatten() {
                hoist_pattern(env, element);
            }
        }
        Pattern::Object {
            properties, rest, ..
        } => {
            for prop in properties {
                hoist_pattern(env, &prop.value);
            }
            if let Some(rest) = rest {
                hoist_pattern(env, rest);
            }
        }
        Pattern::Assign { target, .. } => hoist_pattern(env, target),
        Pattern::Rest { argument, .. } => hoist_pattern(env, argument),
    }
}

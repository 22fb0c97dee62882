//! Constraint generation: the polymorphic front-end.
//!
//! Instead of direct transfer, this walk emits flow constraints
//! `τ⁺ ≤ τ⁻` for the biunification solver. `let` bindings generalize
//! into typing schemes over the variables introduced at a deeper level
//! (rank-1 let-polymorphism); uses instantiate the scheme with fresh
//! variables.

use jsty_ast::{
    BinaryOp, Declarator, Expr, Function, FunctionBody, LogicalOp, Pattern, Stmt, UnaryOp,
};
use jsty_common::{Span, Spanned};
use jsty_solver::intern::{FieldShape, ParamShape};
use jsty_solver::{ConstraintSet, TypeId, TypeScheme, TypeStore};
use rustc_hash::FxHashMap;

/// The output of one generation walk.
pub struct GeneratedConstraints {
    pub constraints: ConstraintSet,
    /// The scheme bound for each top-level declaration, by name.
    pub bindings: FxHashMap<String, TypeScheme>,
}

/// Walk a statement list, producing the constraint set and the scheme
/// environment it implies. `store` supplies the fresh variables.
pub fn generate(store: &mut TypeStore, body: &[Stmt]) -> GeneratedConstraints {
    let mut generator = Generator {
        store,
        constraints: ConstraintSet::new(),
        scopes: vec![FxHashMap::default()],
        level: 0,
        return_slots: Vec::new(),
    };
    for stmt in body {
        generator.gen_stmt(stmt);
    }
    let bindings = generator.scopes.pop().unwrap_or_default();
    GeneratedConstraints {
        constraints: generator.constraints,
        bindings,
    }
}

struct Generator<'a> {
    store: &'a mut TypeStore,
    constraints: ConstraintSet,
    scopes: Vec<FxHashMap<String, TypeScheme>>,
    level: u32,
    /// Result-type variables of enclosing functions.
    return_slots: Vec<TypeId>,
}

impl Generator<'_> {
    fn lookup(&self, name: &str) -> Option<&TypeScheme> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn bind(&mut self, name: &str, scheme: TypeScheme) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), scheme);
        }
    }

    /// Solve the constraints a definition produced and push the resulting
    /// bisubstitution through its type before generalizing, so the scheme
    /// carries the definition's bounds into every instantiation. Errors
    /// are left in place; the caller's full solve reports them.
    fn resolve_before_generalize(&mut self, mark: usize, ty: TypeId) -> TypeId {
        let slice: Vec<jsty_solver::Constraint> =
            self.constraints.as_slice()[mark..].to_vec();
        match jsty_solver::biunify(self.store, &slice) {
            Ok(subst) => subst.apply_pos(self.store, ty),
            Err(_) => ty,
        }
    }

    fn gen_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(decl) => {
                for Declarator { pattern, init, .. } in &decl.declarators {
                    let Pattern::Ident { name, span } = pattern else {
                        // Destructuring stays monomorphic through a field
                        // constraint per bound name.
                        if let Some(init) = init {
                            self.gen_expr(init);
                        }
                        continue;
                    };
                    // let x = e: fresh α, ⟨type(e) ≤ α⟩, generalize α.
                    self.level += 1;
                    let mark = self.constraints.len();
                    let alpha = self.store.fresh_var(Some(name.as_str()), self.level);
                    if let Some(init) = init {
                        let init_ty = self.gen_expr(init);
                        self.constraints.push(init_ty, alpha, *span);
                    } else {
                        self.constraints.push(TypeId::UNDEFINED, alpha, *span);
                    }
                    self.level -= 1;
                    let resolved = self.resolve_before_generalize(mark, alpha);
                    let scheme = TypeScheme::generalize(self.store, resolved, self.level);
                    self.bind(name, scheme);
                }
            }
            Stmt::Function { function, span } => {
                let mark = self.constraints.len();
                let fn_ty = self.gen_function(function, *span);
                if let Some(name) = &function.name {
                    let resolved = self.resolve_before_generalize(mark, fn_ty);
                    let scheme = TypeScheme::generalize(self.store, resolved, self.level);
                    self.bind(name, scheme);
                }
            }
            Stmt::Expr { expr, .. } => {
                self.gen_expr(expr);
            }
            Stmt::Return { argument, span } => {
                let ty = match argument {
                    Some(argument) => self.gen_expr(argument),
                    None => TypeId::UNDEFINED,
                };
                if let Some(&slot) = self.return_slots.last() {
                    // ⟨type(e) ≤ ρ⟩ for the enclosing result type.
                    self.constraints.push(ty, slot, *span);
                }
            }
            Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.gen_expr(test);
                self.gen_stmt(consequent);
                if let Some(alternate) = alternate {
                    self.gen_stmt(alternate);
                }
            }
            Stmt::While { test, body, .. } | Stmt::DoWhile { test, body, .. } => {
                self.gen_expr(test);
                self.gen_stmt(body);
            }
            Stmt::Block { body, .. } => {
                self.scopes.push(FxHashMap::default());
                for stmt in body {
                    self.gen_stmt(stmt);
                }
                self.scopes.pop();
            }
            Stmt::Throw { argument, .. } => {
                self.gen_expr(argument);
            }
            _ => {}
        }
    }

    fn gen_expr(&mut self, expr: &Expr) -> TypeId {
        match expr {
            Expr::Bool { value, .. } => self.store.literal_bool(*value),
            Expr::Number { value, .. } => self.store.literal_number(*value),
            Expr::String { value, .. } => self.store.literal_string(value.clone()),
            Expr::BigInt { value, .. } => self.store.literal_bigint(value.clone()),
            Expr::Null { .. } => TypeId::NULL,
            Expr::Undefined { .. } => TypeId::UNDEFINED,

            Expr::Ident { name, .. } => match self.lookup(name) {
                Some(scheme) => {
                    let scheme = scheme.clone();
                    scheme.instantiate(self.store, self.level)
                }
                None => TypeId::ANY,
            },

            // f(e₁,…,eₙ): fresh ρ, ⟨type(f) ≤ (type(e₁),…) → ρ⟩.
            Expr::Call { callee, args, span, .. } => {
                let callee_ty = self.gen_expr(callee);
                let params: Vec<ParamShape> = args
                    .iter()
                    .enumerate()
                    .map(|(i, arg)| {
                        let arg_ty = self.gen_expr(arg);
                        ParamShape::new(format!("arg{i}"), arg_ty)
                    })
                    .collect();
                let rho = self.store.fresh_var(None, self.level);
                let expected = self.store.function(params, rho);
                self.constraints.push(callee_ty, expected, *span);
                rho
            }

            // e.ℓ: fresh ρ, ⟨type(e) ≤ {ℓ: ρ}⟩.
            Expr::Member {
                object,
                property,
                span,
                ..
            } => {
                let object_ty = self.gen_expr(object);
                let rho = self.store.fresh_var(None, self.level);
                let expected = self
                    .store
                    .record(vec![FieldShape::new(property.clone(), rho)]);
                self.constraints.push(object_ty, expected, *span);
                rho
            }

            Expr::Binary {
                op, left, right, span,
            } => {
                let left_ty = self.gen_expr(left);
                let right_ty = self.gen_expr(right);
                if op.is_comparison() {
                    return TypeId::BOOLEAN;
                }
                if op.is_numeric() {
                    self.constraints.push(left_ty, TypeId::NUMBER, *span);
                    self.constraints.push(right_ty, TypeId::NUMBER, *span);
                    return TypeId::NUMBER;
                }
                debug_assert_eq!(*op, BinaryOp::Add);
                // Addition stays overloaded; the merge is a positive join.
                self.store.union(vec![left_ty, right_ty])
            }

            Expr::Logical {
                op, left, right, ..
            } => {
                let left_ty = self.gen_expr(left);
                let right_ty = self.gen_expr(right);
                match op {
                    LogicalOp::And | LogicalOp::Or | LogicalOp::Nullish => {
                        self.store.union(vec![left_ty, right_ty])
                    }
                }
            }

            Expr::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.gen_expr(test);
                let cons_ty = self.gen_expr(consequent);
                let alt_ty = self.gen_expr(alternate);
                // Control-flow merge at a positive position: join.
                self.store.union(vec![cons_ty, alt_ty])
            }

            Expr::Unary { op, argument, span } => {
                let arg_ty = self.gen_expr(argument);
                match op {
                    UnaryOp::Not => TypeId::BOOLEAN,
                    UnaryOp::TypeOf => TypeId::STRING,
                    UnaryOp::Void => TypeId::UNDEFINED,
                    UnaryOp::Delete => TypeId::BOOLEAN,
                    UnaryOp::Minus | UnaryOp::Plus | UnaryOp::BitNot => {
                        self.constraints.push(arg_ty, TypeId::NUMBER, *span);
                        TypeId::NUMBER
                    }
                }
            }

            Expr::Object { properties, .. } => {
                let mut fields = Vec::new();
                for prop in properties {
                    if let jsty_ast::ObjectProp::Init { key, value, .. } = prop {
                        let value_ty = self.gen_expr(value);
                        if let Some(name) = key.as_static_name() {
                            fields.push(FieldShape::new(name, value_ty));
                        }
                    }
                }
                self.store.record(fields)
            }

            Expr::Array { elements, .. } => {
                let elem_tys: Vec<TypeId> = elements
                    .iter()
                    .flatten()
                    .map(|e| self.gen_expr(e))
                    .collect();
                let elem = self.store.union(elem_tys);
                self.store.array(elem)
            }

            Expr::Function { function, span } | Expr::Arrow { function, span } => {
                self.gen_function(function, *span)
            }

            Expr::Sequence { exprs, .. } => {
                let mut last = TypeId::UNDEFINED;
                for e in exprs {
                    last = self.gen_expr(e);
                }
                last
            }

            _ => TypeId::ANY,
        }
    }

    fn gen_function(&mut self, function: &Function, span: Span) -> TypeId {
        self.level += 1;
        self.scopes.push(FxHashMap::default());

        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            let alpha = self.store.fresh_var(None, self.level);
            if let Pattern::Ident { name, .. } = &param.pattern {
                self.bind(name, TypeScheme::mono(alpha));
                params.push(ParamShape::new(name.clone(), alpha));
            } else {
                params.push(ParamShape::new("param", alpha));
            }
        }

        let rho = self.store.fresh_var(None, self.level);
        self.return_slots.push(rho);
        match &function.body {
            FunctionBody::Expr { expr, .. } => {
                let ty = self.gen_expr(expr);
                self.constraints.push(ty, rho, expr.span());
            }
            FunctionBody::Block { body, .. } => {
                for stmt in body {
                    self.gen_stmt(stmt);
                }
            }
        }
        self.return_slots.pop();

        self.scopes.pop();
        self.level -= 1;
        let _ = span;
        self.store.function(params, rho)
    }
}

#[cfg(test)]
#[path = "tests/constraint_gen_tests.rs"]
mod tests;

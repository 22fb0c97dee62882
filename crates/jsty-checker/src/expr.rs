//! Expression transfer: the typing rules for every expression form.
//!
//! Every rule is total: on a diagnostic the expression gets `any` with a
//! reason string and analysis continues. Literal arithmetic stays literal
//! where the `+` rule allows it; everything else follows the operator
//! tables.

use crate::builtins::{array_member, prim_member, promise_member};
use crate::checker::Checker;
use crate::env::{Binding, BindingKind};
use crate::state::TypingState;
use jsty_ast::{
    AssignOp, AssignTarget, BinaryOp, Expr, LogicalOp, ObjectProp, UnaryOp,
};
use jsty_common::limits::MAX_EXPR_DEPTH;
use jsty_common::{DiagnosticKind, Span, Spanned};
use jsty_solver::display::{diagnostic_type_string, typeof_name};
use jsty_solver::intern::{FieldShape, LiteralValue, PrimKind, TypeData};
use jsty_solver::narrow::remove_nullable;
use jsty_solver::{SubtypeChecker, TypeId};

impl Checker {
    /// Infer the type of an expression, updating `state` for any
    /// assignments it performs and recording the result in the state's
    /// expression map.
    pub(crate) fn infer_expr(&mut self, state: &mut TypingState, expr: &Expr) -> TypeId {
        if self.depth >= MAX_EXPR_DEPTH {
            return self.any_because("expression nesting too deep");
        }
        self.depth += 1;
        let ty = self.infer_expr_inner(state, expr);
        self.depth -= 1;
        state.record_expr(expr.span(), ty);
        ty
    }

    fn infer_expr_inner(&mut self, state: &mut TypingState, expr: &Expr) -> TypeId {
        match expr {
            Expr::Bool { value, .. } => self.store.literal_bool(*value),
            Expr::Number { value, .. } => self.store.literal_number(*value),
            Expr::String { value, .. } => self.store.literal_string(value.clone()),
            Expr::BigInt { value, .. } => self.store.literal_bigint(value.clone()),
            Expr::Null { .. } => TypeId::NULL,
            Expr::Undefined { .. } => TypeId::UNDEFINED,

            Expr::Template { quasis, exprs, .. } => {
                for e in exprs {
                    self.infer_expr(state, e);
                }
                if exprs.is_empty() {
                    let text = quasis.first().cloned().unwrap_or_default();
                    self.store.literal_string(text)
                } else {
                    TypeId::STRING
                }
            }

            Expr::Regex { .. } => match state.env.lookup("RegExp").map(|b| b.ty) {
                Some(regexp) => match self.store.data(regexp) {
                    TypeData::Class(shape) => shape.instance,
                    _ => TypeId::ANY,
                },
                None => TypeId::ANY,
            },

            Expr::Ident { name, span } => self.read_name(state, name, *span),

            Expr::This { .. } => state
                .env
                .lookup("this")
                .map_or(TypeId::ANY, |binding| binding.ty),
            Expr::Super { .. } => TypeId::ANY,

            Expr::Member {
                object,
                property,
                optional,
                span,
            } => {
                let object_ty = self.infer_expr(state, object);
                self.member_access(object_ty, property, *span, *optional)
            }

            Expr::Index {
                object,
                index,
                optional,
                span,
            } => {
                let object_ty = self.infer_expr(state, object);
                let index_ty = self.infer_expr(state, index);
                self.index_access(object_ty, index_ty, *span, *optional)
            }

            Expr::Unary { op, argument, .. } => {
                let arg_ty = self.infer_expr(state, argument);
                match op {
                    UnaryOp::Not => TypeId::BOOLEAN,
                    UnaryOp::TypeOf => match typeof_name(&self.store, arg_ty) {
                        Some(name) => self.store.literal_string(name),
                        None => TypeId::STRING,
                    },
                    UnaryOp::Void => TypeId::UNDEFINED,
                    UnaryOp::Delete => TypeId::BOOLEAN,
                    UnaryOp::Minus | UnaryOp::Plus | UnaryOp::BitNot => TypeId::NUMBER,
                }
            }

            Expr::Update { argument, .. } => {
                if let Expr::Ident { name, .. } = argument.as_ref() {
                    self.write_name(state, name, TypeId::NUMBER, argument.span());
                } else {
                    self.infer_expr(state, argument);
                }
                TypeId::NUMBER
            }

            Expr::Binary {
                op, left, right, ..
            } => {
                let left_ty = self.infer_expr(state, left);
                let right_ty = self.infer_expr(state, right);
                self.binary_result(*op, left_ty, right_ty)
            }

            Expr::Logical {
                op, left, right, ..
            } => {
                let left_ty = self.infer_expr(state, left);
                let right_ty = self.infer_expr(state, right);
                match op {
                    LogicalOp::And | LogicalOp::Or => {
                        self.store.union(vec![left_ty, right_ty])
                    }
                    LogicalOp::Nullish => {
                        if !self.store.is_nullable(left_ty) {
                            left_ty
                        } else {
                            let non_null =
                                remove_nullable(&mut self.store, left_ty, true, true);
                            if non_null == TypeId::NEVER {
                                right_ty
                            } else {
                                self.store.union(vec![non_null, right_ty])
                            }
                        }
                    }
                }
            }

            Expr::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.infer_expr(state, test);
                let cons_ty = self.infer_expr(state, consequent);
                let alt_ty = self.infer_expr(state, alternate);
                self.store.union(vec![cons_ty, alt_ty])
            }

            Expr::Assign {
                op,
                target,
                value,
                span,
            } => self.assignment(state, *op, target, value, *span),

            Expr::Call {
                callee,
                args,
                optional,
                span,
            } => {
                let callee_ty = self.infer_expr(state, callee);
                let arg_tys: Vec<TypeId> =
                    args.iter().map(|a| self.infer_expr(state, a)).collect();
                let has_spread = args.iter().any(|a| matches!(a, Expr::Spread { .. }));
                if *optional && self.store.is_nullable(callee_ty) {
                    let non_null = remove_nullable(&mut self.store, callee_ty, true, true);
                    let result = if non_null == TypeId::NEVER {
                        TypeId::UNDEFINED
                    } else {
                        self.call_result(non_null, &arg_tys, has_spread, *span, false)
                    };
                    return self.store.union(vec![TypeId::UNDEFINED, result]);
                }
                self.call_result(callee_ty, &arg_tys, has_spread, *span, false)
            }

            Expr::New { callee, args, span } => {
                let callee_ty = self.infer_expr(state, callee);
                let arg_tys: Vec<TypeId> =
                    args.iter().map(|a| self.infer_expr(state, a)).collect();
                let has_spread = args.iter().any(|a| matches!(a, Expr::Spread { .. }));
                self.call_result(callee_ty, &arg_tys, has_spread, *span, true)
            }

            Expr::Array { elements, .. } => {
                let mut elem_tys = Vec::with_capacity(elements.len());
                let mut spread = false;
                for element in elements {
                    match element {
                        None => elem_tys.push(TypeId::UNDEFINED),
                        Some(Expr::Spread { argument, .. }) => {
                            spread = true;
                            let spread_ty = self.infer_expr(state, argument);
                            elem_tys.push(self.spread_element_type(spread_ty));
                        }
                        Some(e) => elem_tys.push(self.infer_expr(state, e)),
                    }
                }
                if elem_tys.is_empty() {
                    self.store.array(TypeId::ANY)
                } else if spread {
                    let elem = self.store.union(elem_tys);
                    self.store.array(elem)
                } else {
                    self.store.tuple(elem_tys)
                }
            }

            Expr::Object { properties, .. } => self.object_literal(state, properties),

            Expr::Function { function, span } | Expr::Arrow { function, span } => {
                let _ = span;
                self.infer_function(state, function)
            }

            Expr::Class { class, .. } => self.infer_class(state, class),

            Expr::Spread { argument, .. } => self.infer_expr(state, argument),

            Expr::Sequence { exprs, .. } => {
                let mut last = TypeId::UNDEFINED;
                for e in exprs {
                    last = self.infer_expr(state, e);
                }
                last
            }

            Expr::Await { argument, .. } => {
                let arg_ty = self.infer_expr(state, argument);
                self.await_type(arg_ty)
            }
        }
    }

    /// Read a binding; missing names are `any` plus a diagnostic.
    pub(crate) fn read_name(&mut self, state: &mut TypingState, name: &str, span: Span) -> TypeId {
        match state.env.lookup(name) {
            Some(binding) => binding.ty,
            None => {
                self.report(
                    DiagnosticKind::UndefinedVariable,
                    format!("'{name}' is not defined"),
                    span,
                );
                self.any_because("undefined variable")
            }
        }
    }

    /// Write a binding; const writes diagnose and keep the old type,
    /// unknown names become implicit vars.
    pub(crate) fn write_name(
        &mut self,
        state: &mut TypingState,
        name: &str,
        ty: TypeId,
        span: Span,
    ) {
        match state.env.lookup(name) {
            Some(binding) if binding.kind.is_const() => {
                self.report(
                    DiagnosticKind::ConstAssignment,
                    format!("cannot assign to '{name}' because it is a constant"),
                    span,
                );
            }
            Some(_) => {
                state.env.assign(name, ty);
            }
            None => {
                self.report(
                    DiagnosticKind::UndefinedVariable,
                    format!("'{name}' is not defined"),
                    span,
                );
                state
                    .env
                    .declare(Binding::new(name, ty, BindingKind::Var, span));
            }
        }
    }

    fn assignment(
        &mut self,
        state: &mut TypingState,
        op: AssignOp,
        target: &AssignTarget,
        value: &Expr,
        span: Span,
    ) -> TypeId {
        let value_ty = self.infer_expr(state, value);
        let assigned_ty = match (op.binary_op(), op.logical_op()) {
            (Some(binop), _) => {
                let current = self.target_current_type(state, target);
                self.binary_result(binop, current, value_ty)
            }
            (_, Some(_)) => {
                let current = self.target_current_type(state, target);
                self.store.union(vec![current, value_ty])
            }
            _ => value_ty,
        };

        match target {
            AssignTarget::Ident { name, span } => {
                self.write_name(state, name, assigned_ty, *span);
            }
            AssignTarget::Member { object, .. } => {
                self.infer_expr(state, object);
            }
            AssignTarget::Index { object, index, .. } => {
                self.infer_expr(state, object);
                self.infer_expr(state, index);
            }
            AssignTarget::Pattern { pattern, .. } => {
                self.assign_pattern(state, pattern, assigned_ty);
            }
        }
        let _ = span;
        assigned_ty
    }

    fn target_current_type(&mut self, state: &mut TypingState, target: &AssignTarget) -> TypeId {
        match target {
            AssignTarget::Ident { name, .. } => state
                .env
                .lookup(name)
                .map_or(TypeId::ANY, |binding| binding.ty),
            AssignTarget::Member {
                object, property, ..
            } => {
                let object_ty = self.infer_expr(state, object);
                self.member_access(object_ty, property, target.span(), true)
            }
            _ => TypeId::ANY,
        }
    }

    /// The `+` rule and the always-number operators.
    pub(crate) fn binary_result(&mut self, op: BinaryOp, left: TypeId, right: TypeId) -> TypeId {
        if op.is_comparison() {
            return TypeId::BOOLEAN;
        }
        if op.is_numeric() {
            return TypeId::NUMBER;
        }
        debug_assert_eq!(op, BinaryOp::Add);

        let store = &self.store;
        if store.is_string(left) || store.is_string(right) {
            return TypeId::STRING;
        }
        if store.is_numeric(left) && store.is_numeric(right) {
            // Both literal numbers fold to the literal sum.
            if let (
                TypeData::Prim {
                    value: Some(LiteralValue::Number(a)),
                    ..
                },
                TypeData::Prim {
                    value: Some(LiteralValue::Number(b)),
                    ..
                },
            ) = (store.data(left), store.data(right))
            {
                let sum = a.0 + b.0;
                return self.store.literal_number(sum);
            }
            return TypeId::NUMBER;
        }
        let left_untyped = matches!(store.data(left), TypeData::Any { .. } | TypeData::Unknown);
        let right_untyped = matches!(store.data(right), TypeData::Any { .. } | TypeData::Unknown);
        if (store.is_numeric(left) && right_untyped) || (store.is_numeric(right) && left_untyped) {
            // One numeric side and an untyped one: optimistically number.
            return TypeId::NUMBER;
        }
        self.store.union(vec![TypeId::STRING, TypeId::NUMBER])
    }

    /// Member access obeying structural record subtyping.
    pub(crate) fn member_access(
        &mut self,
        object_ty: TypeId,
        property: &str,
        span: Span,
        optional: bool,
    ) -> TypeId {
        match self.store.data(object_ty).clone() {
            TypeData::Any { .. } | TypeData::Unknown | TypeData::Var { .. } => TypeId::ANY,
            TypeData::Top | TypeData::Bottom | TypeData::Never => TypeId::ANY,

            TypeData::Prim {
                kind: PrimKind::Null | PrimKind::Undef,
                ..
            } => {
                if optional {
                    TypeId::UNDEFINED
                } else {
                    self.report(
                        DiagnosticKind::UndefinedProperty,
                        format!(
                            "cannot read property '{property}' of '{}'",
                            diagnostic_type_string(&self.store, object_ty)
                        ),
                        span,
                    );
                    self.any_because("property access on nullable")
                }
            }

            TypeData::Prim { kind, .. } => match prim_member(&mut self.store, kind, property) {
                Some(ty) => ty,
                None => {
                    self.report(
                        DiagnosticKind::UndefinedProperty,
                        format!("property '{property}' does not exist on type '{}'", kind.name()),
                        span,
                    );
                    self.any_because("unknown member")
                }
            },

            TypeData::Record { fields } => match fields.iter().find(|f| f.name == property) {
                Some(field) => {
                    if field.optional {
                        self.store.union(vec![field.ty, TypeId::UNDEFINED])
                    } else {
                        field.ty
                    }
                }
                None => {
                    self.report(
                        DiagnosticKind::MissingProperty,
                        format!(
                            "property '{property}' does not exist on type '{}'",
                            diagnostic_type_string(&self.store, object_ty)
                        ),
                        span,
                    );
                    self.any_because("missing property")
                }
            },

            TypeData::Array { elem, .. } => {
                match array_member(&mut self.store, elem, property) {
                    Some(ty) => ty,
                    None => {
                        self.report(
                            DiagnosticKind::UndefinedProperty,
                            format!("property '{property}' does not exist on arrays"),
                            span,
                        );
                        self.any_because("unknown member")
                    }
                }
            }

            TypeData::Promise { resolved } => {
                match promise_member(&mut self.store, resolved, property) {
                    Some(ty) => ty,
                    None => {
                        self.report(
                            DiagnosticKind::UndefinedProperty,
                            format!("property '{property}' does not exist on promises"),
                            span,
                        );
                        self.any_because("unknown member")
                    }
                }
            }

            // Member access on a class value reads its static side.
            TypeData::Class(shape) => self.member_access(shape.statics, property, span, optional),

            TypeData::Function(_) => match property {
                "name" => TypeId::STRING,
                "length" => TypeId::NUMBER,
                "call" | "apply" | "bind" => TypeId::ANY,
                _ => TypeId::ANY,
            },

            TypeData::Union(members) => {
                let mut nullable_seen = false;
                let mut parts = Vec::new();
                for member in members {
                    let is_nullable = matches!(
                        self.store.data(member),
                        TypeData::Prim {
                            kind: PrimKind::Null | PrimKind::Undef,
                            ..
                        }
                    );
                    if is_nullable {
                        nullable_seen = true;
                        continue;
                    }
                    parts.push(self.member_access(member, property, span, optional));
                }
                if optional && nullable_seen {
                    parts.push(TypeId::UNDEFINED);
                }
                self.store.union(parts)
            }

            TypeData::Intersection(members) => {
                // The first constituent that knows the member wins; a
                // record meet already merged duplicate domains.
                for member in members {
                    let found = self.member_quiet(member, property);
                    if let Some(ty) = found {
                        return ty;
                    }
                }
                self.report(
                    DiagnosticKind::MissingProperty,
                    format!(
                        "property '{property}' does not exist on type '{}'",
                        diagnostic_type_string(&self.store, object_ty)
                    ),
                    span,
                );
                self.any_because("missing property")
            }

            TypeData::Recursive { var, body } => {
                let unrolled = self.store.substitute(body, var, object_ty);
                self.member_access(unrolled, property, span, optional)
            }
        }
    }

    /// Member lookup without diagnostics (used for intersections).
    fn member_quiet(&mut self, object_ty: TypeId, property: &str) -> Option<TypeId> {
        match self.store.data(object_ty).clone() {
            TypeData::Record { fields } => {
                fields.iter().find(|f| f.name == property).map(|f| f.ty)
            }
            TypeData::Prim { kind, .. } => prim_member(&mut self.store, kind, property),
            TypeData::Array { elem, .. } => array_member(&mut self.store, elem, property),
            TypeData::Promise { resolved } => {
                promise_member(&mut self.store, resolved, property)
            }
            TypeData::Class(shape) => self.member_quiet(shape.statics, property),
            TypeData::Function(_) => None,
            _ => None,
        }
    }

    fn index_access(
        &mut self,
        object_ty: TypeId,
        index_ty: TypeId,
        span: Span,
        optional: bool,
    ) -> TypeId {
        match self.store.data(object_ty).clone() {
            TypeData::Array { elem, tuple } => {
                if let (
                    Some(elems),
                    TypeData::Prim {
                        value: Some(LiteralValue::Number(n)),
                        ..
                    },
                ) = (&tuple, self.store.data(index_ty))
                {
                    let i = n.0;
                    if i.fract() == 0.0 && i >= 0.0 && (i as usize) < elems.len() {
                        return elems[i as usize];
                    }
                    return TypeId::UNDEFINED;
                }
                elem
            }
            TypeData::Prim {
                kind: PrimKind::Str,
                ..
            } => TypeId::STRING,
            TypeData::Record { .. } => {
                if let TypeData::Prim {
                    value: Some(LiteralValue::String(name)),
                    ..
                } = self.store.data(index_ty).clone()
                {
                    return self.member_access(object_ty, &name, span, optional);
                }
                TypeId::ANY
            }
            _ => TypeId::ANY,
        }
    }

    /// Call/new resolution following the callee's signature. Argument
    /// types flow into parameter types by subtyping.
    pub(crate) fn call_result(
        &mut self,
        callee_ty: TypeId,
        args: &[TypeId],
        has_spread: bool,
        span: Span,
        is_new: bool,
    ) -> TypeId {
        match self.store.data(callee_ty).clone() {
            TypeData::Any { .. } | TypeData::Unknown | TypeData::Var { .. } => TypeId::ANY,

            TypeData::Function(shape) => {
                if is_new {
                    // Constructor-function pattern: untyped instance.
                    return TypeId::ANY;
                }
                if !has_spread && !shape.accepts_arity(args.len()) {
                    self.report(
                        DiagnosticKind::ArgumentCount,
                        format!(
                            "expected {} argument(s), got {}",
                            shape.params.len(),
                            args.len()
                        ),
                        span,
                    );
                }
                self.check_argument_flow(&shape.params, args, span);
                shape.ret
            }

            TypeData::Class(shape) => {
                if !is_new {
                    self.report(
                        DiagnosticKind::NotCallable,
                        format!("class '{}' cannot be invoked without 'new'", shape.name),
                        span,
                    );
                    return self.any_because("class called without new");
                }
                if let Some(ctor) = &shape.ctor {
                    if !has_spread && !ctor.accepts_arity(args.len()) {
                        self.report(
                            DiagnosticKind::ArgumentCount,
                            format!(
                                "expected {} argument(s), got {}",
                                ctor.params.len(),
                                args.len()
                            ),
                            span,
                        );
                    }
                    self.check_argument_flow(&ctor.params, args, span);
                }
                // `new C()` yields the instance record.
                shape.instance
            }

            TypeData::Union(members) => {
                let results = members
                    .into_iter()
                    .map(|m| self.call_result(m, args, has_spread, span, is_new))
                    .collect();
                self.store.union(results)
            }

            TypeData::Intersection(members) => {
                for member in members {
                    let data = self.store.data(member);
                    let usable = if is_new {
                        matches!(data, TypeData::Class(_))
                    } else {
                        matches!(data, TypeData::Function(_))
                    };
                    if usable {
                        return self.call_result(member, args, has_spread, span, is_new);
                    }
                }
                let kind = if is_new {
                    DiagnosticKind::NotConstructable
                } else {
                    DiagnosticKind::NotCallable
                };
                self.report(
                    kind,
                    format!(
                        "type '{}' has no matching signature",
                        diagnostic_type_string(&self.store, callee_ty)
                    ),
                    span,
                );
                self.any_because("no matching signature")
            }

            TypeData::Recursive { var, body } => {
                let unrolled = self.store.substitute(body, var, callee_ty);
                self.call_result(unrolled, args, has_spread, span, is_new)
            }

            _ => {
                let (kind, what) = if is_new {
                    (DiagnosticKind::NotConstructable, "constructable")
                } else {
                    (DiagnosticKind::NotCallable, "callable")
                };
                self.report(
                    kind,
                    format!(
                        "type '{}' is not {what}",
                        diagnostic_type_string(&self.store, callee_ty)
                    ),
                    span,
                );
                self.any_because("not callable")
            }
        }
    }

    fn check_argument_flow(
        &mut self,
        params: &[jsty_solver::intern::ParamShape],
        args: &[TypeId],
        span: Span,
    ) {
        let mut mismatches = Vec::new();
        {
            let mut sub = SubtypeChecker::new(&self.store);
            for (i, (&arg, param)) in args.iter().zip(params).enumerate() {
                if param.rest {
                    break;
                }
                if !sub.is_subtype_of(arg, param.ty) {
                    mismatches.push((i, arg, param.ty));
                }
            }
        }
        for (i, arg, param_ty) in mismatches {
            self.report(
                DiagnosticKind::IncompatibleTypes,
                format!(
                    "argument {} of type '{}' is not assignable to parameter of type '{}'",
                    i + 1,
                    diagnostic_type_string(&self.store, arg),
                    diagnostic_type_string(&self.store, param_ty)
                ),
                span,
            );
        }
    }

    fn object_literal(&mut self, state: &mut TypingState, properties: &[ObjectProp]) -> TypeId {
        let mut fields: Vec<FieldShape> = Vec::with_capacity(properties.len());
        for prop in properties {
            match prop {
                ObjectProp::Init { key, value, .. } => {
                    let value_ty = self.infer_expr(state, value);
                    if let Some(name) = key.as_static_name() {
                        fields.push(FieldShape::new(name, value_ty));
                    }
                }
                ObjectProp::Method { key, function, .. } => {
                    let fn_ty = self.infer_function(state, function);
                    if let Some(name) = key.as_static_name() {
                        fields.push(FieldShape::new(name, fn_ty));
                    }
                }
                ObjectProp::Spread { argument, .. } => {
                    let spread_ty = self.infer_expr(state, argument);
                    if let TypeData::Record {
                        fields: spread_fields,
                    } = self.store.data(spread_ty).clone()
                    {
                        fields.extend(spread_fields);
                    }
                }
            }
        }
        self.store.record(fields)
    }

    /// The element type produced by spreading a value into an array.
    fn spread_element_type(&mut self, ty: TypeId) -> TypeId {
        match self.store.data(ty) {
            TypeData::Array { elem, .. } => *elem,
            TypeData::Prim {
                kind: PrimKind::Str,
                ..
            } => TypeId::STRING,
            _ => TypeId::ANY,
        }
    }

    /// `await` unwraps a promise; non-promises pass through.
    pub(crate) fn await_type(&mut self, ty: TypeId) -> TypeId {
        match self.store.data(ty) {
            TypeData::Promise { resolved } => *resolved,
            TypeData::Union(members) => {
                let members = members.clone();
                let unwrapped = members.into_iter().map(|m| self.await_type(m)).collect();
                self.store.union(unwrapped)
            }
            _ => ty,
        }
    }
}

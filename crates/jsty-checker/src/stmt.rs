//! Statement transfer: declarations, destructuring, functions, classes,
//! and the per-block driver the fixed point calls.

use crate::annotations::AnnotationKind;
use crate::checker::Checker;
use crate::env::{Binding, BindingKind, TypeEnvironment};
use crate::state::TypingState;
use jsty_ast::{
    ClassMember, Declarator, Expr, ForHead, Function, FunctionBody, MethodKind, Pattern, Stmt,
    VarDecl, VarKind,
};
use jsty_cfg::{BlockId, BlockItem, ControlFlowGraph, Terminator};
use jsty_common::{Span, Spanned};
use jsty_solver::TypeId;
use jsty_solver::intern::{ClassShape, FieldShape, FunctionShape, ParamShape, TypeData};

impl Checker {
    /// Run the transfer function over one block, producing its exit state.
    pub(crate) fn transfer_block<'a>(
        &mut self,
        cfg: &ControlFlowGraph<'a>,
        block: BlockId,
        mut state: TypingState,
    ) -> TypingState {
        if !state.reachable {
            return state;
        }
        let data = cfg.block(block);
        for item in &data.items {
            self.transfer_item(&mut state, item);
        }
        match &data.terminator {
            Some(Terminator::Branch { test, .. }) => {
                self.infer_expr(&mut state, test);
            }
            Some(Terminator::Switch {
                discriminant,
                cases,
                ..
            }) => {
                self.infer_expr(&mut state, discriminant);
                for (test, _) in cases {
                    self.infer_expr(&mut state, test);
                }
            }
            Some(Terminator::Return { argument }) => {
                let ty = match argument {
                    Some(arg) => self.infer_expr(&mut state, arg),
                    None => TypeId::UNDEFINED,
                };
                self.return_types.push(ty);
            }
            Some(Terminator::Throw { argument, .. }) => {
                self.infer_expr(&mut state, argument);
            }
            _ => {}
        }
        state
    }

    fn transfer_item(&mut self, state: &mut TypingState, item: &BlockItem<'_>) {
        match item {
            BlockItem::Stmt(stmt) => self.transfer_stmt(state, stmt),
            BlockItem::VarDecl(decl) => self.transfer_var_decl(state, decl),
            BlockItem::Expr(expr) => {
                self.infer_expr(state, expr);
            }
            BlockItem::IterBinding {
                head,
                iterable,
                of,
            } => self.transfer_iter_binding(state, head, iterable, *of),
            BlockItem::CatchBinding { param } => {
                // The caught value is untyped.
                self.bind_pattern(state, param, TypeId::ANY, BindingKind::Let, None);
            }
        }
    }

    fn transfer_stmt(&mut self, state: &mut TypingState, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(decl) => self.transfer_var_decl(state, decl),
            Stmt::Expr { expr, .. } => {
                self.infer_expr(state, expr);
            }
            Stmt::Function { function, span } => {
                let ty = self.infer_function(state, function);
                if let Some(name) = &function.name {
                    state
                        .env
                        .declare(Binding::new(name, ty, BindingKind::Function, *span));
                    self.record_decl(
                        name,
                        *span,
                        "FunctionDeclaration",
                        AnnotationKind::Function,
                        ty,
                        true,
                    );
                }
            }
            Stmt::Class { class, span } => {
                let ty = self.infer_class(state, class);
                if let Some(name) = &class.name {
                    state
                        .env
                        .declare(Binding::new(name, ty, BindingKind::Class, *span));
                    self.record_decl(
                        name,
                        *span,
                        "ClassDeclaration",
                        AnnotationKind::Class,
                        ty,
                        true,
                    );
                }
            }
            // Control flow was lowered into the CFG; nothing reaches here.
            _ => {}
        }
    }

    fn transfer_var_decl(&mut self, state: &mut TypingState, decl: &VarDecl) {
        let kind = match decl.kind {
            VarKind::Var => BindingKind::Var,
            VarKind::Let => BindingKind::Let,
            VarKind::Const => BindingKind::Const,
        };
        let anno = match decl.kind {
            VarKind::Const => AnnotationKind::Const,
            _ => AnnotationKind::Variable,
        };
        for Declarator { pattern, init, .. } in &decl.declarators {
            let init_ty = match init {
                Some(init) => self.infer_expr(state, init),
                None => TypeId::UNDEFINED,
            };
            self.bind_pattern(state, pattern, init_ty, kind, Some(anno));
        }
    }

    /// Distribute a type over a binding pattern, declaring each bound
    /// name. Destructuring (array/object, rest, defaults) distributes
    /// element-wise.
    pub(crate) fn bind_pattern(
        &mut self,
        state: &mut TypingState,
        pattern: &Pattern,
        ty: TypeId,
        kind: BindingKind,
        record: Option<AnnotationKind>,
    ) {
        match pattern {
            Pattern::Ident { name, span } => {
                state.env.declare(Binding::new(name, ty, kind, *span));
                if let Some(anno) = record {
                    self.record_decl(name, *span, "Identifier", anno, ty, false);
                }
            }
            Pattern::Array { elements, .. } => {
                for (i, element) in elements.iter().enumerate() {
                    let Some(element) = element else { continue };
                    if let Pattern::Rest { argument, .. } = element {
                        let rest_ty = self.rest_array_type(ty, i);
                        self.bind_pattern(state, argument, rest_ty, kind, record);
                        continue;
                    }
                    let elem_ty = self.element_type_at(ty, i);
                    self.bind_pattern(state, element, elem_ty, kind, record);
                }
            }
            Pattern::Object {
                properties, rest, ..
            } => {
                for prop in properties {
                    let field_ty = self.member_access(ty, &prop.key, prop.span, true);
                    self.bind_pattern(state, &prop.value, field_ty, kind, record);
                }
                if let Some(rest) = rest {
                    let taken: Vec<&str> =
                        properties.iter().map(|p| p.key.as_str()).collect();
                    let rest_ty = self.rest_record_type(ty, &taken);
                    self.bind_pattern(state, rest, rest_ty, kind, record);
                }
            }
            Pattern::Assign {
                target, default, ..
            } => {
                let default_ty = self.infer_expr(state, default);
                let present = jsty_solver::narrow::remove_nullable(
                    &mut self.store,
                    ty,
                    false,
                    true,
                );
                let merged = if present == TypeId::NEVER {
                    default_ty
                } else if present == ty {
                    ty
                } else {
                    self.store.union(vec![present, default_ty])
                };
                self.bind_pattern(state, target, merged, kind, record);
            }
            Pattern::Rest { argument, .. } => {
                self.bind_pattern(state, argument, ty, kind, record);
            }
        }
    }

    /// Assignment (not declaration) through a pattern.
    pub(crate) fn assign_pattern(
        &mut self,
        state: &mut TypingState,
        pattern: &Pattern,
        ty: TypeId,
    ) {
        match pattern {
            Pattern::Ident { name, span } => self.write_name(state, name, ty, *span),
            Pattern::Array { elements, .. } => {
                for (i, element) in elements.iter().enumerate() {
                    let Some(element) = element else { continue };
                    if let Pattern::Rest { argument, .. } = element {
                        let rest_ty = self.rest_array_type(ty, i);
                        self.assign_pattern(state, argument, rest_ty);
                        continue;
                    }
                    let elem_ty = self.element_type_at(ty, i);
                    self.assign_pattern(state, element, elem_ty);
                }
            }
            Pattern::Object {
                properties, rest, ..
            } => {
                for prop in properties {
                    let field_ty = self.member_access(ty, &prop.key, prop.span, true);
                    self.assign_pattern(state, &prop.value, field_ty);
                }
                if let Some(rest) = rest {
                    let taken: Vec<&str> =
                        properties.iter().map(|p| p.key.as_str()).collect();
                    let rest_ty = self.rest_record_type(ty, &taken);
                    self.assign_pattern(state, rest, rest_ty);
                }
            }
            Pattern::Assign {
                target, default, ..
            } => {
                let default_ty = self.infer_expr(state, default);
                let merged = self.store.union(vec![ty, default_ty]);
                self.assign_pattern(state, target, merged);
            }
            Pattern::Rest { argument, .. } => self.assign_pattern(state, argument, ty),
        }
    }

    fn element_type_at(&mut self, ty: TypeId, index: usize) -> TypeId {
        match self.store.data(ty).clone() {
            TypeData::Array { elem, tuple } => match tuple {
                Some(elems) => elems.get(index).copied().unwrap_or(TypeId::UNDEFINED),
                None => elem,
            },
            TypeData::Prim {
                kind: jsty_solver::intern::PrimKind::Str,
                ..
            } => TypeId::STRING,
            _ => TypeId::ANY,
        }
    }

    fn rest_array_type(&mut self, ty: TypeId, from: usize) -> TypeId {
        match self.store.data(ty).clone() {
            TypeData::Array { elem, tuple } => match tuple {
                Some(elems) if elems.len() > from => {
                    self.store.tuple(elems[from..].to_vec())
                }
                Some(_) => self.store.tuple(Vec::new()),
                None => self.store.array(elem),
            },
            _ => self.store.array(TypeId::ANY),
        }
    }

    /// The residual record a rest pattern binds: the source record minus
    /// the explicitly taken fields.
    fn rest_record_type(&mut self, ty: TypeId, taken: &[&str]) -> TypeId {
        match self.store.data(ty).clone() {
            TypeData::Record { fields } => {
                let rest: Vec<FieldShape> = fields
                    .into_iter()
                    .filter(|f| !taken.contains(&f.name.as_str()))
                    .collect();
                self.store.record(rest)
            }
            _ => TypeId::ANY,
        }
    }

    fn transfer_iter_binding(
        &mut self,
        state: &mut TypingState,
        head: &ForHead,
        iterable: &Expr,
        of: bool,
    ) {
        let iterable_ty = self.infer_expr(state, iterable);
        let value_ty = if of {
            self.iterated_element(iterable_ty)
        } else {
            // for…in iterates property names.
            TypeId::STRING
        };
        match head {
            ForHead::VarDecl(decl) => {
                let kind = match decl.kind {
                    VarKind::Var => BindingKind::Var,
                    VarKind::Let => BindingKind::Let,
                    VarKind::Const => BindingKind::Const,
                };
                for declarator in &decl.declarators {
                    self.bind_pattern(
                        state,
                        &declarator.pattern,
                        value_ty,
                        kind,
                        Some(AnnotationKind::Variable),
                    );
                }
            }
            ForHead::Pattern { pattern, .. } => self.assign_pattern(state, pattern, value_ty),
        }
    }

    fn iterated_element(&mut self, ty: TypeId) -> TypeId {
        match self.store.data(ty).clone() {
            TypeData::Array { elem, .. } => elem,
            TypeData::Prim {
                kind: jsty_solver::intern::PrimKind::Str,
                ..
            } => TypeId::STRING,
            TypeData::Union(members) => {
                let elems = members
                    .into_iter()
                    .map(|m| self.iterated_element(m))
                    .collect();
                self.store.union(elems)
            }
            _ => TypeId::ANY,
        }
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Infer a function's type by running the fixed point over its body.
    pub(crate) fn infer_function(&mut self, state: &mut TypingState, func: &Function) -> TypeId {
        let mut env = state.env.child();
        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let shape = self.bind_param(&mut env, param);
            params.push(shape);
        }

        let ret = match &func.body {
            FunctionBody::Expr { expr, .. } => {
                let mut body_state = TypingState::reachable(env);
                body_state.expr_types = state.expr_types.clone();
                let ty = self.infer_expr(&mut body_state, expr);
                if self.reporting {
                    state.expr_types.extend(body_state.expr_types);
                }
                ty
            }
            FunctionBody::Block { body, .. } => {
                let initial = TypingState::reachable(env);
                let outcome = self.run_flow(body, initial);
                outcome.return_type
            }
        };

        let ret = if func.is_generator {
            // Generators yield an opaque iterator.
            TypeId::ANY
        } else {
            ret
        };
        let ret = if func.is_async {
            self.store.promise(ret)
        } else {
            ret
        };

        let mut shape = FunctionShape::new(params, ret);
        shape.is_async = func.is_async;
        shape.is_generator = func.is_generator;
        self.store.function_shape(shape)
    }

    fn bind_param(&mut self, env: &mut TypeEnvironment, param: &jsty_ast::Param) -> ParamShape {
        let (name, span) = param_display_name(&param.pattern, param.span);
        let ty = if param.rest {
            self.store.array(TypeId::ANY)
        } else {
            TypeId::ANY
        };

        // Bind every name in the pattern; simple identifiers dominate.
        let mut scratch = TypingState::reachable(env.clone());
        self.bind_pattern(
            &mut scratch,
            &param.pattern,
            ty,
            BindingKind::Param,
            None,
        );
        *env = scratch.env;

        self.record_decl(
            &name,
            span,
            "Identifier",
            AnnotationKind::Parameter,
            ty,
            true,
        );

        let mut shape = ParamShape::new(name, ty);
        if param.default.is_some() || matches!(param.pattern, Pattern::Assign { .. }) {
            shape = shape.optional();
        }
        if param.rest {
            shape = shape.rest();
        }
        shape
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// Synthesize a class type in two passes: gather constructor-assigned
    /// fields and property declarations into the instance record first,
    /// then infer method types with `this` bound to that instance.
    pub(crate) fn infer_class(&mut self, state: &mut TypingState, class: &jsty_ast::Class) -> TypeId {
        let name = class.name.clone().unwrap_or_else(|| "<anonymous>".into());

        let parent_ty = class.parent.as_ref().map(|p| self.infer_expr(state, p));
        let parent_class = parent_ty.filter(|&p| matches!(self.store.data(p), TypeData::Class(_)));

        // Pass 1: instance fields.
        let mut fields: Vec<FieldShape> = Vec::new();
        if let Some(parent) = parent_class {
            if let TypeData::Class(parent_shape) = self.store.data(parent).clone() {
                if let TypeData::Record {
                    fields: parent_fields,
                } = self.store.data(parent_shape.instance).clone()
                {
                    fields.extend(parent_fields);
                }
            }
        }

        let ctor = class.members.iter().find_map(|m| match m {
            ClassMember::Constructor { function, .. } => Some(function.as_ref()),
            _ => None,
        });

        let mut static_fields: Vec<FieldShape> = Vec::new();
        for member in &class.members {
            if let ClassMember::Property {
                name: field_name,
                value,
                is_static,
                span,
            } = member
            {
                let ty = match value {
                    Some(value) => self.infer_expr(state, value),
                    None => TypeId::UNDEFINED,
                };
                if *is_static {
                    static_fields.push(FieldShape::new(field_name.clone(), ty));
                } else {
                    fields.push(FieldShape::new(field_name.clone(), ty));
                    self.record_decl(
                        field_name,
                        *span,
                        "PropertyDefinition",
                        AnnotationKind::Property,
                        ty,
                        true,
                    );
                }
            }
        }

        let mut ctor_shape = None;
        if let Some(ctor_fn) = ctor {
            // Constructor parameters, then every `this.x = e` in its body.
            let mut ctor_env = state.env.child();
            let mut ctor_params = Vec::new();
            for param in &ctor_fn.params {
                ctor_params.push(self.bind_param(&mut ctor_env, param));
            }
            let mut ctor_state = TypingState::reachable(ctor_env);
            if let FunctionBody::Block { body, .. } = &ctor_fn.body {
                self.collect_this_assignments(&mut ctor_state, body, &mut fields);
            }
            ctor_shape = Some(FunctionShape::new(ctor_params, TypeId::UNDEFINED));
        }

        // Pass 2: methods, with `this` bound to the instance. Methods see
        // each other as untyped until their own types land.
        let mut this_fields = fields.clone();
        for member in &class.members {
            if let ClassMember::Method {
                name: method_name,
                is_static: false,
                ..
            } = member
            {
                this_fields.push(FieldShape::new(method_name.clone(), TypeId::ANY));
            }
        }
        let provisional_this = self.store.record(this_fields);

        let mut method_fields: Vec<FieldShape> = Vec::new();
        let mut getters: Vec<(String, TypeId, bool)> = Vec::new();
        let mut setters: Vec<(String, TypeId, bool)> = Vec::new();
        for member in &class.members {
            if let ClassMember::Method {
                name: method_name,
                function,
                kind,
                is_static,
                span,
            } = member
            {
                let mut method_state = state.clone();
                let mut env = method_state.env.child();
                let this_ty = if *is_static { TypeId::ANY } else { provisional_this };
                env.declare(Binding::new("this", this_ty, BindingKind::Param, *span));
                method_state.env = env;

                let fn_ty = self.infer_function(&mut method_state, function);
                if self.reporting {
                    state.expr_types.extend(method_state.expr_types);
                }
                match kind {
                    MethodKind::Method => {
                        let field = FieldShape::new(method_name.clone(), fn_ty);
                        if *is_static {
                            static_fields.push(field);
                        } else {
                            method_fields.push(field);
                        }
                    }
                    // Accessors declare a field, not a method: a getter
                    // contributes its return type, a setter the type its
                    // parameter accepts. Pairing happens below.
                    MethodKind::Get => {
                        let ret = match self.store.data(fn_ty) {
                            TypeData::Function(shape) => shape.ret,
                            _ => TypeId::ANY,
                        };
                        getters.push((method_name.clone(), ret, *is_static));
                    }
                    MethodKind::Set => {
                        let accepts = match self.store.data(fn_ty) {
                            TypeData::Function(shape) => {
                                shape.params.first().map_or(TypeId::ANY, |p| p.ty)
                            }
                            _ => TypeId::ANY,
                        };
                        setters.push((method_name.clone(), accepts, *is_static));
                    }
                }
            }
        }

        // A getter with no matching setter is a readonly field; a setter
        // with no getter still declares the field at its parameter type.
        for (accessor_name, ty, is_static) in &getters {
            let mut field = FieldShape::new(accessor_name.clone(), *ty);
            if !setters
                .iter()
                .any(|(n, _, s)| n == accessor_name && s == is_static)
            {
                field = field.readonly();
            }
            if *is_static {
                static_fields.push(field);
            } else {
                method_fields.push(field);
            }
        }
        for (accessor_name, ty, is_static) in &setters {
            if getters
                .iter()
                .any(|(n, _, s)| n == accessor_name && s == is_static)
            {
                continue;
            }
            let field = FieldShape::new(accessor_name.clone(), *ty);
            if *is_static {
                static_fields.push(field);
            } else {
                method_fields.push(field);
            }
        }

        let mut instance_fields = fields;
        instance_fields.extend(method_fields);
        let instance = self.store.record(instance_fields);
        let statics = self.store.record(static_fields);

        self.store.class(ClassShape {
            name,
            ctor: ctor_shape,
            instance,
            statics,
            parent: parent_class,
        })
    }

    /// Walk a constructor body (through nested statements, not nested
    /// functions) collecting `this.x = expr` assignments.
    fn collect_this_assignments(
        &mut self,
        state: &mut TypingState,
        stmts: &[Stmt],
        fields: &mut Vec<FieldShape>,
    ) {
        for stmt in stmts {
            self.collect_this_in_stmt(state, stmt, fields);
        }
    }

    fn collect_this_in_stmt(
        &mut self,
        state: &mut TypingState,
        stmt: &Stmt,
        fields: &mut Vec<FieldShape>,
    ) {
        match stmt {
            Stmt::Expr { expr, .. } => self.collect_this_in_expr(state, expr, fields),
            Stmt::If {
                consequent,
                alternate,
                ..
            } => {
                self.collect_this_in_stmt(state, consequent, fields);
                if let Some(alternate) = alternate {
                    self.collect_this_in_stmt(state, alternate, fields);
                }
            }
            Stmt::While { body, .. }
            | Stmt::DoWhile { body, .. }
            | Stmt::For { body, .. }
            | Stmt::ForIn { body, .. }
            | Stmt::ForOf { body, .. }
            | Stmt::Labeled { body, .. } => self.collect_this_in_stmt(state, body, fields),
            Stmt::Block { body, .. } => self.collect_this_assignments(state, body, fields),
            Stmt::Try {
                block,
                handler,
                finalizer,
                ..
            } => {
                self.collect_this_assignments(state, block, fields);
                if let Some(handler) = handler {
                    self.collect_this_assignments(state, &handler.body, fields);
                }
                if let Some(finalizer) = finalizer {
                    self.collect_this_assignments(state, finalizer, fields);
                }
            }
            Stmt::VarDecl(decl) => self.transfer_var_decl(state, decl),
            _ => {}
        }
    }

    fn collect_this_in_expr(
        &mut self,
        state: &mut TypingState,
        expr: &Expr,
        fields: &mut Vec<FieldShape>,
    ) {
        if let Expr::Assign {
            op: jsty_ast::AssignOp::Assign,
            target: jsty_ast::AssignTarget::Member { object, property, .. },
            value,
            ..
        } = expr
        {
            if matches!(object.as_ref(), Expr::This { .. }) {
                let value_ty = self.infer_expr(state, value);
                let span = value.span();
                fields.push(FieldShape::new(property.clone(), value_ty));
                self.record_decl(
                    property,
                    span,
                    "PropertyDefinition",
                    AnnotationKind::Property,
                    value_ty,
                    true,
                );
                return;
            }
        }
        // Other expressions are evaluated for their side effects only.
        self.infer_expr(state, expr);
    }
}

fn param_display_name(pattern: &Pattern, fallback: Span) -> (String, Span) {
    match pattern {
        Pattern::Ident { name, span } => (name.clone(), *span),
        Pattern::Assign { target, .. } => param_display_name(target, fallback),
        Pattern::Rest { argument, .. } => param_display_name(argument, fallback),
        _ => ("param".into(), fallback),
    }
}

//! Builtin globals and host-library member tables.
//!
//! Seeds the root environment with types for the standard globals and
//! provides member lookup for primitive receivers (`"x".length`,
//! `[1].push`, promises). The shapes model what the analyzer needs for
//! sound member access, not the full host library surface.

use crate::env::{Binding, BindingKind, TypeEnvironment};
use jsty_common::Span;
use jsty_solver::intern::{ClassShape, FieldShape, FunctionShape, ParamShape, PrimKind};
use jsty_solver::{TypeId, TypeStore};

fn fun(store: &mut TypeStore, params: Vec<ParamShape>, ret: TypeId) -> TypeId {
    store.function(params, ret)
}

fn variadic(store: &mut TypeStore, ret: TypeId) -> TypeId {
    let args = store.array(TypeId::ANY);
    store.function(vec![ParamShape::new("args", args).rest()], ret)
}

fn unary(store: &mut TypeStore, name: &str, param: TypeId, ret: TypeId) -> TypeId {
    store.function(vec![ParamShape::new(name, param)], ret)
}

/// Seed the root environment with the standard globals.
pub fn seed_globals(store: &mut TypeStore) -> TypeEnvironment {
    let mut env = TypeEnvironment::new();
    let bind = |env: &mut TypeEnvironment, name: &str, ty: TypeId| {
        env.declare(Binding::new(name, ty, BindingKind::Const, Span::dummy()));
    };

    // console
    let log = variadic(store, TypeId::UNDEFINED);
    let console = store.record(vec![
        FieldShape::new("log", log),
        FieldShape::new("error", log),
        FieldShape::new("warn", log),
        FieldShape::new("info", log),
        FieldShape::new("debug", log),
    ]);
    bind(&mut env, "console", console);

    // Math
    let num_to_num = unary(store, "x", TypeId::NUMBER, TypeId::NUMBER);
    let two_nums = fun(
        store,
        vec![
            ParamShape::new("x", TypeId::NUMBER),
            ParamShape::new("y", TypeId::NUMBER),
        ],
        TypeId::NUMBER,
    );
    let num_rest = store.array(TypeId::NUMBER);
    let nary_num = store.function(
        vec![ParamShape::new("values", num_rest).rest()],
        TypeId::NUMBER,
    );
    let random = fun(store, vec![], TypeId::NUMBER);
    let math = store.record(vec![
        FieldShape::new("PI", TypeId::NUMBER).readonly(),
        FieldShape::new("E", TypeId::NUMBER).readonly(),
        FieldShape::new("abs", num_to_num),
        FieldShape::new("floor", num_to_num),
        FieldShape::new("ceil", num_to_num),
        FieldShape::new("round", num_to_num),
        FieldShape::new("trunc", num_to_num),
        FieldShape::new("sqrt", num_to_num),
        FieldShape::new("sign", num_to_num),
        FieldShape::new("log", num_to_num),
        FieldShape::new("pow", two_nums),
        FieldShape::new("min", nary_num),
        FieldShape::new("max", nary_num),
        FieldShape::new("random", random),
    ]);
    bind(&mut env, "Math", math);

    // JSON
    let parse = unary(store, "text", TypeId::STRING, TypeId::ANY);
    let stringify = unary(store, "value", TypeId::ANY, TypeId::STRING);
    let json = store.record(vec![
        FieldShape::new("parse", parse),
        FieldShape::new("stringify", stringify),
    ]);
    bind(&mut env, "JSON", json);

    // Object: callable plus a record of static members.
    let string_arr = store.array(TypeId::STRING);
    let any_arr = store.array(TypeId::ANY);
    let keys = unary(store, "o", TypeId::ANY, string_arr);
    let values = unary(store, "o", TypeId::ANY, any_arr);
    let to_any = unary(store, "o", TypeId::ANY, TypeId::ANY);
    let assign = variadic(store, TypeId::ANY);
    let object_statics = store.record(vec![
        FieldShape::new("keys", keys),
        FieldShape::new("values", values),
        FieldShape::new("entries", values),
        FieldShape::new("assign", assign),
        FieldShape::new("freeze", to_any),
        FieldShape::new("create", to_any),
        FieldShape::new("getPrototypeOf", to_any),
    ]);
    let object_callable = unary(store, "value", TypeId::ANY, TypeId::ANY);
    let object = store.intersection(vec![object_callable, object_statics]);
    bind(&mut env, "Object", object);

    // Array is the intersection of a callable signature and its statics.
    let array_callable = variadic(store, any_arr);
    let is_array = unary(store, "value", TypeId::ANY, TypeId::BOOLEAN);
    let from = unary(store, "iterable", TypeId::ANY, any_arr);
    let of = variadic(store, any_arr);
    let array_statics = store.record(vec![
        FieldShape::new("isArray", is_array),
        FieldShape::new("from", from),
        FieldShape::new("of", of),
    ]);
    let array = store.intersection(vec![array_callable, array_statics]);
    bind(&mut env, "Array", array);

    // String / Number / Boolean / Function
    let string_callable = unary(store, "value", TypeId::ANY, TypeId::STRING);
    let from_char_code = variadic(store, TypeId::STRING);
    let string_statics = store.record(vec![FieldShape::new("fromCharCode", from_char_code)]);
    let string_ctor = store.intersection(vec![string_callable, string_statics]);
    bind(&mut env, "String", string_ctor);

    let number_callable = unary(store, "value", TypeId::ANY, TypeId::NUMBER);
    let any_to_bool = unary(store, "value", TypeId::ANY, TypeId::BOOLEAN);
    let number_statics = store.record(vec![
        FieldShape::new("isInteger", any_to_bool),
        FieldShape::new("isFinite", any_to_bool),
        FieldShape::new("isNaN", any_to_bool),
        FieldShape::new("MAX_SAFE_INTEGER", TypeId::NUMBER).readonly(),
        FieldShape::new("MIN_SAFE_INTEGER", TypeId::NUMBER).readonly(),
        FieldShape::new("EPSILON", TypeId::NUMBER).readonly(),
    ]);
    let number_ctor = store.intersection(vec![number_callable, number_statics]);
    bind(&mut env, "Number", number_ctor);

    let boolean_ctor = unary(store, "value", TypeId::ANY, TypeId::BOOLEAN);
    bind(&mut env, "Boolean", boolean_ctor);
    bind(&mut env, "Function", variadic(store, TypeId::ANY));

    // Promise
    let any_promise = store.promise(TypeId::ANY);
    let then = fun(
        store,
        vec![
            ParamShape::new("onFulfilled", TypeId::ANY),
            ParamShape::new("onRejected", TypeId::ANY).optional(),
        ],
        any_promise,
    );
    let catch = unary(store, "onRejected", TypeId::ANY, any_promise);
    let promise_instance = store.record(vec![
        FieldShape::new("then", then),
        FieldShape::new("catch", catch),
        FieldShape::new("finally", catch),
    ]);
    let resolve = unary(store, "value", TypeId::ANY, any_promise);
    let promise_statics = store.record(vec![
        FieldShape::new("resolve", resolve),
        FieldShape::new("reject", resolve),
        FieldShape::new("all", resolve),
        FieldShape::new("race", resolve),
    ]);
    let executor_ctor = FunctionShape::new(
        vec![ParamShape::new("executor", TypeId::ANY)],
        TypeId::UNDEFINED,
    );
    let promise = store.class(ClassShape {
        name: "Promise".into(),
        ctor: Some(executor_ctor),
        instance: promise_instance,
        statics: promise_statics,
        parent: None,
    });
    bind(&mut env, "Promise", promise);

    // Symbol
    let symbol_callable = store.function(
        vec![ParamShape::new("description", TypeId::STRING).optional()],
        TypeId::SYMBOL,
    );
    let symbol_statics = store.record(vec![
        FieldShape::new("iterator", TypeId::SYMBOL).readonly(),
        FieldShape::new("asyncIterator", TypeId::SYMBOL).readonly(),
    ]);
    let symbol = store.intersection(vec![symbol_callable, symbol_statics]);
    bind(&mut env, "Symbol", symbol);

    // Date carries a back-reference to its instance record so `new Date()`
    // yields the instance.
    let to_number = fun(store, vec![], TypeId::NUMBER);
    let to_string = fun(store, vec![], TypeId::STRING);
    let date_instance = store.record(vec![
        FieldShape::new("getTime", to_number),
        FieldShape::new("getFullYear", to_number),
        FieldShape::new("getMonth", to_number),
        FieldShape::new("getDate", to_number),
        FieldShape::new("getHours", to_number),
        FieldShape::new("getMinutes", to_number),
        FieldShape::new("getSeconds", to_number),
        FieldShape::new("toISOString", to_string),
        FieldShape::new("toString", to_string),
    ]);
    let now = fun(store, vec![], TypeId::NUMBER);
    let parse_date = unary(store, "text", TypeId::STRING, TypeId::NUMBER);
    let date_statics = store.record(vec![
        FieldShape::new("now", now),
        FieldShape::new("parse", parse_date),
    ]);
    let date_ctor = FunctionShape::new(
        vec![ParamShape::new("value", TypeId::ANY).optional()],
        TypeId::UNDEFINED,
    );
    let date = store.class(ClassShape {
        name: "Date".into(),
        ctor: Some(date_ctor),
        instance: date_instance,
        statics: date_statics,
        parent: None,
    });
    bind(&mut env, "Date", date);

    // RegExp
    let test = unary(store, "text", TypeId::STRING, TypeId::BOOLEAN);
    let exec = unary(store, "text", TypeId::STRING, TypeId::ANY);
    let regexp_instance = store.record(vec![
        FieldShape::new("test", test),
        FieldShape::new("exec", exec),
        FieldShape::new("source", TypeId::STRING).readonly(),
        FieldShape::new("flags", TypeId::STRING).readonly(),
        FieldShape::new("lastIndex", TypeId::NUMBER),
    ]);
    let empty = store.record(vec![]);
    let regexp_ctor = FunctionShape::new(
        vec![
            ParamShape::new("pattern", TypeId::STRING),
            ParamShape::new("flags", TypeId::STRING).optional(),
        ],
        TypeId::UNDEFINED,
    );
    let regexp = store.class(ClassShape {
        name: "RegExp".into(),
        ctor: Some(regexp_ctor),
        instance: regexp_instance,
        statics: empty,
        parent: None,
    });
    bind(&mut env, "RegExp", regexp);

    // Map / Set
    let get = unary(store, "key", TypeId::ANY, TypeId::ANY);
    let set_entry = fun(
        store,
        vec![
            ParamShape::new("key", TypeId::ANY),
            ParamShape::new("value", TypeId::ANY),
        ],
        TypeId::ANY,
    );
    let has = unary(store, "key", TypeId::ANY, TypeId::BOOLEAN);
    let map_clear = fun(store, vec![], TypeId::UNDEFINED);
    let map_instance = store.record(vec![
        FieldShape::new("get", get),
        FieldShape::new("set", set_entry),
        FieldShape::new("has", has),
        FieldShape::new("delete", has),
        FieldShape::new("clear", map_clear),
        FieldShape::new("size", TypeId::NUMBER).readonly(),
    ]);
    let iterable_ctor = FunctionShape::new(
        vec![ParamShape::new("entries", TypeId::ANY).optional()],
        TypeId::UNDEFINED,
    );
    let map = store.class(ClassShape {
        name: "Map".into(),
        ctor: Some(iterable_ctor.clone()),
        instance: map_instance,
        statics: empty,
        parent: None,
    });
    bind(&mut env, "Map", map);

    let add = unary(store, "value", TypeId::ANY, TypeId::ANY);
    let set_clear = fun(store, vec![], TypeId::UNDEFINED);
    let set_instance = store.record(vec![
        FieldShape::new("add", add),
        FieldShape::new("has", has),
        FieldShape::new("delete", has),
        FieldShape::new("clear", set_clear),
        FieldShape::new("size", TypeId::NUMBER).readonly(),
    ]);
    let set = store.class(ClassShape {
        name: "Set".into(),
        ctor: Some(iterable_ctor),
        instance: set_instance,
        statics: empty,
        parent: None,
    });
    bind(&mut env, "Set", set);

    // Error and subclasses
    let stack = store.union(vec![TypeId::STRING, TypeId::UNDEFINED]);
    let error_instance = store.record(vec![
        FieldShape::new("name", TypeId::STRING),
        FieldShape::new("message", TypeId::STRING),
        FieldShape::new("stack", stack),
    ]);
    let error_ctor = FunctionShape::new(
        vec![ParamShape::new("message", TypeId::STRING).optional()],
        TypeId::UNDEFINED,
    );
    let error = store.class(ClassShape {
        name: "Error".into(),
        ctor: Some(error_ctor.clone()),
        instance: error_instance,
        statics: empty,
        parent: None,
    });
    bind(&mut env, "Error", error);
    for name in [
        "TypeError",
        "RangeError",
        "SyntaxError",
        "ReferenceError",
        "EvalError",
        "URIError",
    ] {
        let subclass = store.class(ClassShape {
            name: name.into(),
            ctor: Some(error_ctor.clone()),
            instance: error_instance,
            statics: empty,
            parent: Some(error),
        });
        bind(&mut env, name, subclass);
    }

    // Free functions
    let parse_int = fun(
        store,
        vec![
            ParamShape::new("text", TypeId::STRING),
            ParamShape::new("radix", TypeId::NUMBER).optional(),
        ],
        TypeId::NUMBER,
    );
    bind(&mut env, "parseInt", parse_int);
    let parse_float = unary(store, "text", TypeId::STRING, TypeId::NUMBER);
    bind(&mut env, "parseFloat", parse_float);
    bind(&mut env, "isNaN", any_to_bool);
    bind(&mut env, "isFinite", any_to_bool);
    let str_to_str = unary(store, "uri", TypeId::STRING, TypeId::STRING);
    for name in [
        "encodeURI",
        "decodeURI",
        "encodeURIComponent",
        "decodeURIComponent",
    ] {
        bind(&mut env, name, str_to_str);
    }
    let timer = fun(
        store,
        vec![
            ParamShape::new("handler", TypeId::ANY),
            ParamShape::new("timeout", TypeId::NUMBER).optional(),
        ],
        TypeId::NUMBER,
    );
    bind(&mut env, "setTimeout", timer);
    bind(&mut env, "setInterval", timer);
    let clear = unary(store, "id", TypeId::NUMBER, TypeId::UNDEFINED);
    bind(&mut env, "clearTimeout", clear);
    bind(&mut env, "clearInterval", clear);

    // Pseudo-constants
    bind(&mut env, "undefined", TypeId::UNDEFINED);
    bind(&mut env, "NaN", TypeId::NUMBER);
    bind(&mut env, "Infinity", TypeId::NUMBER);
    bind(&mut env, "globalThis", TypeId::ANY);

    env
}

/// Member lookup on a primitive receiver.
pub fn prim_member(store: &mut TypeStore, kind: PrimKind, name: &str) -> Option<TypeId> {
    match kind {
        PrimKind::Str => string_member(store, name),
        PrimKind::Num => number_member(store, name),
        PrimKind::Bool => match name {
            "toString" => Some(fun(store, vec![], TypeId::STRING)),
            "valueOf" => Some(fun(store, vec![], TypeId::BOOLEAN)),
            _ => None,
        },
        PrimKind::BigInt => match name {
            "toString" => Some(fun(store, vec![], TypeId::STRING)),
            _ => None,
        },
        PrimKind::Sym => match name {
            "toString" => Some(fun(store, vec![], TypeId::STRING)),
            "description" => Some(store.union(vec![TypeId::STRING, TypeId::UNDEFINED])),
            _ => None,
        },
        PrimKind::Null | PrimKind::Undef => None,
    }
}

fn string_member(store: &mut TypeStore, name: &str) -> Option<TypeId> {
    let string_arr = store.array(TypeId::STRING);
    Some(match name {
        "length" => TypeId::NUMBER,
        "charAt" | "at" => unary(store, "index", TypeId::NUMBER, TypeId::STRING),
        "charCodeAt" | "codePointAt" => unary(store, "index", TypeId::NUMBER, TypeId::NUMBER),
        "indexOf" | "lastIndexOf" => unary(store, "search", TypeId::STRING, TypeId::NUMBER),
        "includes" | "startsWith" | "endsWith" => {
            unary(store, "search", TypeId::STRING, TypeId::BOOLEAN)
        }
        "slice" | "substring" => store.function(
            vec![
                ParamShape::new("start", TypeId::NUMBER).optional(),
                ParamShape::new("end", TypeId::NUMBER).optional(),
            ],
            TypeId::STRING,
        ),
        "toUpperCase" | "toLowerCase" | "trim" | "trimStart" | "trimEnd" | "toString" => {
            fun(store, vec![], TypeId::STRING)
        }
        "concat" => variadic(store, TypeId::STRING),
        "repeat" => unary(store, "count", TypeId::NUMBER, TypeId::STRING),
        "padStart" | "padEnd" => store.function(
            vec![
                ParamShape::new("length", TypeId::NUMBER),
                ParamShape::new("pad", TypeId::STRING).optional(),
            ],
            TypeId::STRING,
        ),
        "replace" | "replaceAll" => store.function(
            vec![
                ParamShape::new("pattern", TypeId::ANY),
                ParamShape::new("replacement", TypeId::ANY),
            ],
            TypeId::STRING,
        ),
        "split" => unary(store, "separator", TypeId::ANY, string_arr),
        "match" => unary(store, "pattern", TypeId::ANY, TypeId::ANY),
        _ => return None,
    })
}

fn number_member(store: &mut TypeStore, name: &str) -> Option<TypeId> {
    Some(match name {
        "toFixed" | "toPrecision" | "toExponential" => store.function(
            vec![ParamShape::new("digits", TypeId::NUMBER).optional()],
            TypeId::STRING,
        ),
        "toString" => store.function(
            vec![ParamShape::new("radix", TypeId::NUMBER).optional()],
            TypeId::STRING,
        ),
        "valueOf" => fun(store, vec![], TypeId::NUMBER),
        _ => return None,
    })
}

/// Member lookup on an array receiver with element type `elem`.
pub fn array_member(store: &mut TypeStore, elem: TypeId, name: &str) -> Option<TypeId> {
    let elem_arr = store.array(elem);
    let elem_or_undef = store.union(vec![elem, TypeId::UNDEFINED]);
    let any_arr = store.array(TypeId::ANY);
    Some(match name {
        "length" => TypeId::NUMBER,
        "push" | "unshift" => {
            let items = store.array(elem);
            store.function(vec![ParamShape::new("items", items).rest()], TypeId::NUMBER)
        }
        "pop" | "shift" => fun(store, vec![], elem_or_undef),
        "at" => unary(store, "index", TypeId::NUMBER, elem_or_undef),
        "indexOf" | "lastIndexOf" => unary(store, "search", elem, TypeId::NUMBER),
        "includes" => unary(store, "search", elem, TypeId::BOOLEAN),
        "join" => store.function(
            vec![ParamShape::new("separator", TypeId::STRING).optional()],
            TypeId::STRING,
        ),
        "slice" => store.function(
            vec![
                ParamShape::new("start", TypeId::NUMBER).optional(),
                ParamShape::new("end", TypeId::NUMBER).optional(),
            ],
            elem_arr,
        ),
        "concat" => variadic(store, elem_arr),
        "reverse" | "sort" => fun(store, vec![], elem_arr),
        "map" | "flatMap" => unary(store, "callback", TypeId::ANY, any_arr),
        "filter" => unary(store, "callback", TypeId::ANY, elem_arr),
        "forEach" => unary(store, "callback", TypeId::ANY, TypeId::UNDEFINED),
        "find" => unary(store, "callback", TypeId::ANY, elem_or_undef),
        "findIndex" => unary(store, "callback", TypeId::ANY, TypeId::NUMBER),
        "some" | "every" => unary(store, "callback", TypeId::ANY, TypeId::BOOLEAN),
        "reduce" | "reduceRight" => store.function(
            vec![
                ParamShape::new("callback", TypeId::ANY),
                ParamShape::new("initial", TypeId::ANY).optional(),
            ],
            TypeId::ANY,
        ),
        "flat" => any_arr,
        _ => return None,
    })
}

/// Member lookup on a promise receiver.
pub fn promise_member(store: &mut TypeStore, resolved: TypeId, name: &str) -> Option<TypeId> {
    let any_promise = store.promise(TypeId::ANY);
    let same_promise = store.promise(resolved);
    Some(match name {
        "then" => store.function(
            vec![
                ParamShape::new("onFulfilled", TypeId::ANY),
                ParamShape::new("onRejected", TypeId::ANY).optional(),
            ],
            any_promise,
        ),
        "catch" => unary(store, "onRejected", TypeId::ANY, any_promise),
        "finally" => unary(store, "callback", TypeId::ANY, same_promise),
        _ => return None,
    })
}

#[cfg(test)]
#[path = "tests/builtins_tests.rs"]
mod tests;

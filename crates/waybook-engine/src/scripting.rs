//! In-process Rhai execution strategy.
//!
//! [`RhaiFunctions`] is a [`FunctionCompiler`] backed by a registry of
//! Rhai sources keyed by function reference. Each source is a script
//! whose final expression is the column value; the ordered argument list
//! is exposed in scope as the `args` array.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use rhai::{AST, Dynamic, Engine, Scope};

use crate::engine::{CellValue, FunctionRef};
use crate::error::{EngineError, Result};
use crate::functions::{Callable, FunctionCompiler};

/// Rhai-backed function compiler with an in-memory source registry.
pub struct RhaiFunctions {
    engine: Arc<Engine>,
    sources: DashMap<FunctionRef, String>,
}

impl RhaiFunctions {
    pub fn new() -> Self {
        RhaiFunctions {
            engine: Arc::new(Engine::new()),
            sources: DashMap::new(),
        }
    }

    /// Register (or replace) the source for a function version.
    pub fn register(&self, name: impl Into<String>, version: u32, source: impl Into<String>) {
        self.sources
            .insert(FunctionRef::new(name, version), source.into());
    }
}

impl Default for RhaiFunctions {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FunctionCompiler for RhaiFunctions {
    async fn get_callable(&self, function: &FunctionRef) -> Result<Arc<dyn Callable>> {
        let source = self
            .sources
            .get(function)
            .ok_or_else(|| EngineError::UnknownFunction(function.clone()))?;

        let ast = self
            .engine
            .compile(source.value())
            .map_err(|e| EngineError::Compile {
                function: function.clone(),
                message: e.to_string(),
            })?;

        Ok(Arc::new(RhaiCallable {
            engine: self.engine.clone(),
            ast,
            function: function.clone(),
        }))
    }
}

struct RhaiCallable {
    engine: Arc<Engine>,
    ast: AST,
    function: FunctionRef,
}

#[async_trait]
impl Callable for RhaiCallable {
    async fn call(&self, args: Vec<CellValue>) -> Result<CellValue> {
        let mut scope = Scope::new();
        let array: rhai::Array = args.into_iter().map(value_to_dynamic).collect();
        scope.push("args", array);

        let out = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
            .map_err(|e| EngineError::Eval {
                function: self.function.clone(),
                message: e.to_string(),
            })?;

        Ok(dynamic_to_value(out))
    }
}

fn value_to_dynamic(value: CellValue) -> Dynamic {
    match value {
        CellValue::Null => Dynamic::UNIT,
        CellValue::Text(s) => s.into(),
        CellValue::Number(n) => Dynamic::from_float(n),
        CellValue::Bool(b) => b.into(),
        // Dates cross the scripting boundary as ISO strings.
        CellValue::Date(d) => d.format("%Y-%m-%d").to_string().into(),
        CellValue::List(items) => {
            let array: rhai::Array = items.into_iter().map(value_to_dynamic).collect();
            Dynamic::from(array)
        }
    }
}

fn dynamic_to_value(value: Dynamic) -> CellValue {
    if value.is_unit() {
        return CellValue::Null;
    }
    if let Some(b) = value.clone().try_cast::<bool>() {
        return CellValue::Bool(b);
    }
    if let Some(n) = value.clone().try_cast::<i64>() {
        return CellValue::Number(n as f64);
    }
    if let Some(n) = value.clone().try_cast::<f64>() {
        return CellValue::Number(n);
    }
    if let Some(array) = value.clone().try_cast::<rhai::Array>() {
        return CellValue::List(array.into_iter().map(dynamic_to_value).collect());
    }
    if let Some(s) = value.clone().try_cast::<rhai::ImmutableString>() {
        return CellValue::Text(s.to_string());
    }
    CellValue::Text(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_expression_over_args() {
        let functions = RhaiFunctions::new();
        functions.register("subtract", 1, "args[0] - args[1]");

        let callable = functions
            .get_callable(&FunctionRef::new("subtract", 1))
            .await
            .unwrap();
        let out = callable
            .call(vec![CellValue::Number(100.0), CellValue::Number(30.0)])
            .await
            .unwrap();
        assert_eq!(out, CellValue::Number(70.0));
    }

    #[tokio::test]
    async fn test_list_argument_sums_in_script() {
        let functions = RhaiFunctions::new();
        functions.register(
            "total",
            1,
            "let sum = 0.0; for v in args[0] { sum += v; } sum",
        );

        let callable = functions
            .get_callable(&FunctionRef::new("total", 1))
            .await
            .unwrap();
        let out = callable
            .call(vec![CellValue::List(vec![
                CellValue::Number(1.5),
                CellValue::Number(2.5),
            ])])
            .await
            .unwrap();
        assert_eq!(out, CellValue::Number(4.0));
    }

    #[tokio::test]
    async fn test_unknown_reference() {
        let functions = RhaiFunctions::new();
        let err = functions
            .get_callable(&FunctionRef::new("nope", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownFunction(_)));
    }

    #[tokio::test]
    async fn test_compile_error_is_typed() {
        let functions = RhaiFunctions::new();
        functions.register("broken", 1, "args[0] +");
        let err = functions
            .get_callable(&FunctionRef::new("broken", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Compile { .. }));
    }

    #[tokio::test]
    async fn test_runtime_throw_is_typed() {
        let functions = RhaiFunctions::new();
        functions.register("boom", 1, r#"throw "boom""#);
        let callable = functions
            .get_callable(&FunctionRef::new("boom", 1))
            .await
            .unwrap();
        let err = callable.call(Vec::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Eval { .. }));
    }
}

//! The function-execution capability interface and memoizing resolver.
//!
//! Computed columns reference named, versioned callables that are
//! compiled by an external service. The engine only sees the narrow
//! [`FunctionCompiler`] / [`Callable`] pair, so the concrete execution
//! strategy (in-process scripting, sandboxed evaluation, remote
//! invocation) can vary without touching graph or propagation logic.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::engine::{CellValue, FunctionRef};
use crate::error::Result;

/// A compiled computation, invoked once per (row, column) evaluation.
#[async_trait]
pub trait Callable: Send + Sync {
    async fn call(&self, args: Vec<CellValue>) -> Result<CellValue>;
}

impl std::fmt::Debug for dyn Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Callable")
    }
}

/// Obtains callables for function references. May fail with
/// [`crate::EngineError::UnknownFunction`] or a compile error.
#[async_trait]
pub trait FunctionCompiler: Send + Sync {
    async fn get_callable(&self, function: &FunctionRef) -> Result<Arc<dyn Callable>>;
}

/// Memoizing resolver over a [`FunctionCompiler`].
///
/// Repeated resolution of the same function reference never re-fetches or
/// re-compiles. The cache is keyed by the full (name, version) reference,
/// so publishing a new function version naturally misses the cache.
pub struct FunctionResolver {
    compiler: Arc<dyn FunctionCompiler>,
    cache: DashMap<FunctionRef, Arc<dyn Callable>>,
}

impl FunctionResolver {
    pub fn new(compiler: Arc<dyn FunctionCompiler>) -> Self {
        FunctionResolver {
            compiler,
            cache: DashMap::new(),
        }
    }

    pub async fn resolve(&self, function: &FunctionRef) -> Result<Arc<dyn Callable>> {
        if let Some(callable) = self.cache.get(function) {
            return Ok(callable.clone());
        }
        debug!(function = %function, "compiling function");
        let callable = self.compiler.get_callable(function).await?;
        self.cache.insert(function.clone(), callable.clone());
        Ok(callable)
    }

    /// Drop all memoized callables, e.g. after function definitions change.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Constant(CellValue);

    #[async_trait]
    impl Callable for Constant {
        async fn call(&self, _args: Vec<CellValue>) -> Result<CellValue> {
            Ok(self.0.clone())
        }
    }

    struct CountingCompiler {
        compiles: AtomicUsize,
    }

    #[async_trait]
    impl FunctionCompiler for CountingCompiler {
        async fn get_callable(&self, function: &FunctionRef) -> Result<Arc<dyn Callable>> {
            if function.name == "missing" {
                return Err(EngineError::UnknownFunction(function.clone()));
            }
            self.compiles.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Constant(CellValue::Number(1.0))))
        }
    }

    #[tokio::test]
    async fn test_resolve_is_memoized_per_reference() {
        let compiler = Arc::new(CountingCompiler {
            compiles: AtomicUsize::new(0),
        });
        let resolver = FunctionResolver::new(compiler.clone());

        let f = FunctionRef::new("margin", 1);
        resolver.resolve(&f).await.unwrap();
        resolver.resolve(&f).await.unwrap();
        assert_eq!(compiler.compiles.load(Ordering::SeqCst), 1);

        // A new version is a distinct reference.
        resolver.resolve(&FunctionRef::new("margin", 2)).await.unwrap();
        assert_eq!(compiler.compiles.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_function_surfaces_typed_error() {
        let resolver = FunctionResolver::new(Arc::new(CountingCompiler {
            compiles: AtomicUsize::new(0),
        }));
        let err = resolver
            .resolve(&FunctionRef::new("missing", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownFunction(_)));
    }
}

//! # Thread-Local Plan Cache
//!
//! Amortises validation cost across all records sharing an expression.
//! Each thread owns an independent `expr -> Rc<EvaluationPlan>` map with no
//! eviction and no cross-thread synchronisation; plans are read-only after
//! insertion and shared by reference count instead of deep-cloning. The
//! cache is torn down with the thread.
//!
//! A cache hit whose stored schema differs from the caller's current tuple
//! schema is a caller bug and reported as a fatal error, never recompiled
//! silently.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::compiler::compile_predicate;
use crate::error::{EvalError, EvalResult};
use crate::plan::EvaluationPlan;

thread_local! {
    /// Per-thread predicate plan cache, lazily created on first use
    static PLAN_CACHE: RefCell<HashMap<String, Rc<EvaluationPlan>>> =
        RefCell::new(HashMap::new());
}

/// Return the cached plan for `expr`, compiling and inserting on a miss.
pub fn get_or_compile(expr: &str, schema: &str) -> EvalResult<Rc<EvaluationPlan>> {
    PLAN_CACHE.with(|cache| {
        if let Some(plan) = cache.borrow().get(expr) {
            if plan.schema() != schema {
                return Err(EvalError::TupleSchemaMismatchInPlanCache);
            }
            tracing::trace!(target: "rulegate::cache", expression = expr, "plan cache hit");
            return Ok(Rc::clone(plan));
        }
        let plan = Rc::new(compile_predicate(expr, schema)?);
        tracing::debug!(
            target: "rulegate::cache",
            expression = expr,
            "plan cache miss, compiled and inserted"
        );
        cache
            .borrow_mut()
            .insert(expr.to_string(), Rc::clone(&plan));
        Ok(plan)
    })
}

/// Number of plans cached on this thread
pub fn plan_cache_size() -> usize {
    PLAN_CACHE.with(|cache| cache.borrow().len())
}

/// Drop every plan cached on this thread (mainly for tests)
pub fn clear_plan_cache() {
    PLAN_CACHE.with(|cache| cache.borrow_mut().clear());
}

//! Parse-once, resolve-per-schema filter over table slices.

use std::collections::{hash_map::Entry, HashMap};

use arrow::array::BooleanArray;
use sieve_predicate::{normalize, validate, Expr, MetaExtractorKind, Operand, Predicate, Schema};

use crate::{
    config::{FilterConfig, PruningPolicy},
    diagnostics::DiagnosticHandler,
    error::{Error, ResolveError},
    eval,
    logging::{sieve_log, LogContext},
    matcher::schema_might_match,
    resolve::resolve,
    slice::TableSlice,
    synopsis::{synopsis_might_match, PartitionSynopsis},
};

const FILTER_LOG_CTX: LogContext = LogContext::new("component=filter");

/// A normalized, validated expression together with its per-schema resolutions.
///
/// With `prune_meta` enabled, top-level `#schema` and `#schema_id` conjuncts
/// are decided once per schema and left out of row evaluation. Metadata
/// predicates anywhere else stay in the residual and evaluate row-constant.
#[derive(Debug)]
pub struct Filter {
    config: FilterConfig,
    expr: Expr,
    /// `None` once every conjunct is decided by the schema check.
    residual: Option<Expr>,
    resolved: HashMap<String, Resolved>,
}

#[derive(Debug)]
struct Resolved {
    expr: Expr,
    residual: Option<Expr>,
}

impl Filter {
    /// Normalizes and validates `expr`.
    pub fn new(expr: &Expr, config: FilterConfig) -> Result<Self, Error> {
        let config = config.effective();
        let normalized = normalize(expr);
        validate(&normalized)?;
        let residual = if config.normalize.prune_meta {
            without_schema_conjuncts(&normalized)
        } else {
            Some(normalized.clone())
        };
        sieve_log!(
            log::Level::Debug,
            ctx: FILTER_LOG_CTX,
            "filter_created",
            "expr={} residual={} pruning={:?}",
            normalized,
            residual.as_ref().map_or_else(|| "<schema only>".to_string(), Expr::to_string),
            config.pruning,
        );
        Ok(Self {
            config,
            expr: normalized,
            residual,
            resolved: HashMap::new(),
        })
    }

    /// The normalized expression.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The effective configuration.
    #[must_use]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// The expression bound to `schema`; resolved once per schema fingerprint.
    pub fn resolve(&mut self, schema: &Schema) -> Result<&Expr, ResolveError> {
        let resolved =
            resolve_cached(&mut self.resolved, &self.expr, self.residual.as_ref(), schema)?;
        Ok(&resolved.expr)
    }

    /// Returns false only if no row of `partition` can satisfy the filter.
    pub fn might_match(&mut self, partition: &PartitionSynopsis) -> Result<bool, ResolveError> {
        let schema = partition.schema();
        let verdict = match self.config.pruning {
            PruningPolicy::Disabled => true,
            PruningPolicy::SchemaOnly => schema_might_match(&self.expr, schema),
            PruningPolicy::Auto => {
                schema_might_match(&self.expr, schema) && {
                    let resolved = resolve_cached(
                        &mut self.resolved,
                        &self.expr,
                        self.residual.as_ref(),
                        schema,
                    )?;
                    synopsis_might_match(&resolved.expr, partition)
                }
            }
        };
        sieve_log!(
            log::Level::Trace,
            ctx: FILTER_LOG_CTX,
            "partition_checked",
            "schema={} events={} might_match={}",
            schema.name(),
            partition.events(),
            verdict,
        );
        Ok(verdict)
    }

    /// Evaluates the filter for every row of `slice`.
    ///
    /// Slices whose schema cannot match, or against which the expression
    /// resolves to nothing, yield all-false without reading any column.
    pub fn evaluate(
        &mut self,
        slice: &TableSlice,
        dh: &mut dyn DiagnosticHandler,
    ) -> Result<BooleanArray, ResolveError> {
        let schema = slice.schema();
        let rows = slice.rows();
        if !schema_might_match(&self.expr, schema) {
            return Ok(constant(false, rows));
        }
        let resolved =
            resolve_cached(&mut self.resolved, &self.expr, self.residual.as_ref(), schema)?;
        match &resolved.residual {
            None => Ok(constant(true, rows)),
            Some(Expr::None) => Ok(constant(false, rows)),
            Some(residual) => Ok(eval::evaluate(residual, slice, dh)),
        }
    }
}

/// Drops the top-level conjuncts that [`schema_might_match`] decides exactly.
///
/// Returns `None` if nothing is left.
fn without_schema_conjuncts(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Conjunction(children) => {
            let rest: Vec<Expr> = children
                .iter()
                .filter(|child| !is_schema_predicate(child))
                .cloned()
                .collect();
            (!rest.is_empty()).then(|| Expr::all(rest))
        }
        expr if is_schema_predicate(expr) => None,
        expr => Some(expr.clone()),
    }
}

fn is_schema_predicate(expr: &Expr) -> bool {
    let Expr::Predicate(Predicate { lhs, rhs, .. }) = expr else {
        return false;
    };
    let meta = match (lhs, rhs) {
        (Operand::MetaExtractor(meta), Operand::Literal(_))
        | (Operand::Literal(_), Operand::MetaExtractor(meta)) => meta,
        _ => return false,
    };
    matches!(meta.kind, MetaExtractorKind::Schema | MetaExtractorKind::SchemaId)
}

fn resolve_cached<'a>(
    cache: &'a mut HashMap<String, Resolved>,
    expr: &Expr,
    residual: Option<&Expr>,
    schema: &Schema,
) -> Result<&'a Resolved, ResolveError> {
    match cache.entry(schema.fingerprint().to_string()) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let resolved_expr = resolve(expr, schema)?;
            let resolved_residual = match residual {
                None => None,
                Some(residual) if residual == expr => Some(resolved_expr.clone()),
                Some(residual) => Some(resolve(residual, schema)?),
            };
            sieve_log!(
                log::Level::Debug,
                ctx: FILTER_LOG_CTX,
                "schema_resolved",
                "schema={} fingerprint={} expr={}",
                schema.name(),
                schema.fingerprint(),
                resolved_expr,
            );
            Ok(entry.insert(Resolved {
                expr: resolved_expr,
                residual: resolved_residual,
            }))
        }
    }
}

fn constant(value: bool, rows: usize) -> BooleanArray {
    BooleanArray::from(vec![value; rows])
}

//! Evaluation of resolved expressions over table slices.
//!
//! Connectives use Kleene logic so that unknown (null) comparisons propagate;
//! [`evaluate`] folds the remaining unknowns to `false` at the top.

mod compare;

use arrow::{
    array::{Array, BooleanArray},
    compute::{and_kleene, not, or_kleene, prep_null_mask_filter},
    error::ArrowError,
};
use sieve_predicate::{
    evaluate as evaluate_literals, Data, DataExtractor, Expr, MetaExtractorKind, Operand,
    RelationalOperator,
};

use crate::{
    diagnostics::{CollectingDiagnosticHandler, Diagnostic, DiagnosticHandler, ErrorTracker},
    error::Failure,
    slice::TableSlice,
};

/// Where extractors read from.
#[derive(Clone, Copy)]
enum Input<'a> {
    Slice(&'a TableSlice),
    /// A single virtual row without any columns.
    Constant,
}

impl Input<'_> {
    fn rows(&self) -> usize {
        match self {
            Input::Slice(slice) => slice.rows(),
            Input::Constant => 1,
        }
    }
}

/// Evaluates `expr` for every row of `slice`.
///
/// The result has exactly one entry per row; rows whose outcome is unknown
/// are `false`. Problems such as unresolved extractors are reported to `dh`
/// and make the affected predicate unknown.
pub fn evaluate(expr: &Expr, slice: &TableSlice, dh: &mut dyn DiagnosticHandler) -> BooleanArray {
    let result = eval_expr(expr, Input::Slice(slice), dh);
    debug_assert_eq!(result.len(), slice.rows());
    if result.nulls().is_some() {
        prep_null_mask_filter(&result)
    } else {
        result
    }
}

/// Evaluates `expr` without input.
///
/// Fails once any error diagnostic was emitted, for example because `expr`
/// refers to fields or metadata. An unknown outcome yields [`Data::Null`].
pub fn const_eval(expr: &Expr, dh: &mut dyn DiagnosticHandler) -> Result<Data, Failure> {
    let mut tracker = ErrorTracker::new(dh);
    let result = eval_expr(expr, Input::Constant, &mut tracker);
    if tracker.failed() {
        return Err(Failure);
    }
    if result.len() != 1 {
        tracker.emit(Diagnostic::error(format!(
            "constant evaluation produced {} rows",
            result.len()
        )));
        return Err(Failure);
    }
    if result.is_null(0) {
        Ok(Data::Null)
    } else {
        Ok(Data::Bool(result.value(0)))
    }
}

/// Best-effort constant folding.
///
/// Diagnostics are collected privately and forwarded to `dh` only when folding
/// succeeds; otherwise `None` is returned and nothing is emitted.
pub fn try_const_eval(expr: &Expr, dh: &mut dyn DiagnosticHandler) -> Option<Data> {
    let mut collector = CollectingDiagnosticHandler::new();
    let result = const_eval(expr, &mut collector).ok()?;
    collector.forward_to(dh);
    Some(result)
}

fn eval_expr(expr: &Expr, input: Input<'_>, dh: &mut dyn DiagnosticHandler) -> BooleanArray {
    let rows = input.rows();
    match expr {
        Expr::None => constant(Some(false), rows),
        Expr::Conjunction(children) => {
            let mut acc = constant(Some(true), rows);
            for child in children {
                let next = eval_expr(child, input, dh);
                acc = checked(and_kleene(&acc, &next), rows, dh);
            }
            acc
        }
        Expr::Disjunction(children) => {
            let mut acc = constant(Some(false), rows);
            for child in children {
                let next = eval_expr(child, input, dh);
                acc = checked(or_kleene(&acc, &next), rows, dh);
            }
            acc
        }
        Expr::Negation(child) => {
            let child = eval_expr(child, input, dh);
            checked(not(&child), rows, dh)
        }
        Expr::Predicate(predicate) => match (&predicate.lhs, &predicate.rhs) {
            (Operand::Literal(lhs), Operand::Literal(rhs)) => {
                constant(Some(evaluate_literals(lhs, predicate.op, rhs)), rows)
            }
            (extractor, Operand::Literal(literal)) => {
                eval_extractor(extractor, predicate.op, literal, input, dh)
            }
            (Operand::Literal(literal), extractor) => {
                eval_extractor(extractor, predicate.op.flip(), literal, input, dh)
            }
            _ => {
                dh.emit(Diagnostic::error(format!(
                    "cannot compare two extractors: {predicate}"
                )));
                constant(None, rows)
            }
        },
    }
}

fn eval_extractor(
    extractor: &Operand,
    op: RelationalOperator,
    literal: &Data,
    input: Input<'_>,
    dh: &mut dyn DiagnosticHandler,
) -> BooleanArray {
    let rows = input.rows();
    let slice = match input {
        Input::Slice(slice) => slice,
        Input::Constant => {
            if let Operand::Literal(value) = extractor {
                return constant(Some(evaluate_literals(value, op, literal)), rows);
            }
            dh.emit(
                Diagnostic::error(format!("cannot evaluate {extractor} without input"))
                    .note("expected a constant expression"),
            );
            return constant(None, rows);
        }
    };
    match extractor {
        Operand::MetaExtractor(meta) => {
            let value = match meta.kind {
                MetaExtractorKind::Schema => Some(Data::from(slice.schema().name())),
                MetaExtractorKind::SchemaId => Some(Data::from(slice.schema().fingerprint())),
                MetaExtractorKind::ImportTime => slice.import_time().map(Data::time),
            };
            constant(
                value.map(|value| evaluate_literals(&value, op, literal)),
                rows,
            )
        }
        Operand::DataExtractor(extractor) => eval_column(extractor, op, literal, slice, dh),
        Operand::FieldExtractor(_) | Operand::TypeExtractor(_) => {
            dh.emit(
                Diagnostic::warning(format!("unresolved extractor {extractor}"))
                    .note(format!("resolve against schema '{}' first", slice.schema().name())),
            );
            constant(None, rows)
        }
        Operand::Literal(value) => constant(Some(evaluate_literals(value, op, literal)), rows),
    }
}

fn eval_column(
    extractor: &DataExtractor,
    op: RelationalOperator,
    literal: &Data,
    slice: &TableSlice,
    dh: &mut dyn DiagnosticHandler,
) -> BooleanArray {
    let rows = slice.rows();
    if extractor.schema != *slice.schema() {
        dh.emit(Diagnostic::warning(format!(
            "extractor bound to schema '{}' applied to '{}'",
            extractor.schema.name(),
            slice.schema().name()
        )));
        return constant(None, rows);
    }
    let array = match slice.column(&extractor.offset) {
        Ok(array) => array,
        Err(err) => {
            dh.emit(Diagnostic::warning(err.to_string()));
            return constant(None, rows);
        }
    };
    checked(compare::compare_column(&array, op, literal), rows, dh)
}

fn checked(
    result: Result<BooleanArray, ArrowError>,
    rows: usize,
    dh: &mut dyn DiagnosticHandler,
) -> BooleanArray {
    match result {
        Ok(array) => array,
        Err(err) => {
            dh.emit(Diagnostic::error(err.to_string()));
            constant(None, rows)
        }
    }
}

fn constant(value: Option<bool>, rows: usize) -> BooleanArray {
    std::iter::repeat(value).take(rows).collect()
}

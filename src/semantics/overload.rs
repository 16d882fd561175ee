//! Overload scoring.
//!
//! A candidate whose arity differs from the call scores 0. A candidate
//! with no parameters called with no arguments scores 1. Otherwise the
//! score is the product of per-parameter weights: 1 for a template
//! placeholder, 2 for an exactly equal type, 0 for anything else. Any
//! list of matching parameters therefore scores at least 1, and 0 always
//! means "not applicable".

use std::rc::Rc;

use log::trace;

use super::{symbol::FuncSymbol, types::Type};

const TEMPLATE_WEIGHT: u32 = 1;
const EXACT_WEIGHT: u32 = 2;

fn param_weight(param: &Type, arg: &Type) -> u32 {
    if param.is_template() {
        TEMPLATE_WEIGHT
    } else if param == arg {
        EXACT_WEIGHT
    } else {
        0
    }
}

pub fn score_params(params: &[Type], args: &[Type]) -> u32 {
    if params.len() != args.len() {
        return 0;
    }
    if params.is_empty() {
        return 1;
    }

    params
        .iter()
        .zip(args)
        .map(|(param, arg)| param_weight(param, arg))
        .fold(1, u32::saturating_mul)
}

pub fn overload_score(func: &FuncSymbol, args: &[Type]) -> u32 {
    score_params(&func.param_types(), args)
}

/// Scans `candidates` in order and keeps the best-scoring function named
/// `name`. Only a strictly greater score replaces the current best, so the
/// earliest declaration wins a tie. Returns `None` when nothing scores
/// above 0.
pub fn select_overload<'a>(
    candidates: impl IntoIterator<Item = &'a Rc<FuncSymbol>>,
    name: &str,
    args: &[Type],
) -> Option<(Rc<FuncSymbol>, u32)> {
    let mut best: Option<(Rc<FuncSymbol>, u32)> = None;

    for candidate in candidates.into_iter().filter(|func| func.name == name) {
        let score = overload_score(candidate, args);
        trace!("Overload candidate {} scored {}", candidate, score);

        let current = best.as_ref().map_or(0, |(_, score)| *score);
        if score > current {
            best = Some((Rc::clone(candidate), score));
        }
    }

    best
}

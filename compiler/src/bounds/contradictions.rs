//! Group-level queries over a [`KnownConstraints`] store

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::config::BoundsConfig;
use super::known::KnownConstraints;
use super::node::{AndGroup, OrGroup, SumGroup};
use super::Result;

/// Facts rejected while inserting each AndGroup of `group` into its own
/// empty store. A fact in the result witnesses that its AndGroup can never
/// hold.
pub fn find_contradictions(group: &OrGroup) -> Result<Vec<Rc<SumGroup>>> {
    find_contradictions_with(group, &BoundsConfig::default())
}

pub fn find_contradictions_with(group: &OrGroup, config: &BoundsConfig) -> Result<Vec<Rc<SumGroup>>> {
    let mut result = Vec::new();
    for and in &group.ands {
        let mut scratch = KnownConstraints::with_config(config);
        result.extend(insert_and_group(&mut scratch, and)?);
    }
    if !result.is_empty() {
        debug!(count = result.len(), "contradictions found");
    }
    Ok(result)
}

/// Insert every fact of `group`, returning the ones that were rejected.
pub fn insert_and_group(known: &mut KnownConstraints, group: &AndGroup) -> Result<Vec<Rc<SumGroup>>> {
    let mut rejected = Vec::new();
    for sum in &group.sums {
        if !known.insert_sum_group(sum)? {
            rejected.push(Rc::clone(sum));
        }
    }
    Ok(rejected)
}

/// True iff every fact of `group` is implied.
pub fn check_and_group(known: &KnownConstraints, group: &AndGroup) -> Result<bool> {
    for sum in &group.sums {
        if !known.check_sum_group(sum)?.is_true {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True iff some AndGroup of `group` is implied. The empty OrGroup places
/// no constraint and always holds.
pub fn check_or_group(known: &KnownConstraints, group: &OrGroup) -> Result<bool> {
    if group.is_unconstrained() {
        return Ok(true);
    }

    let mut answers: FxHashMap<u32, bool> = FxHashMap::default();
    'clauses: for and in &group.ands {
        for sum in &and.sums {
            let holds = match answers.get(&sum.id) {
                Some(&holds) => holds,
                None => {
                    let holds = known.check_sum_group(sum)?.is_true;
                    answers.insert(sum.id, holds);
                    holds
                }
            };
            if !holds {
                continue 'clauses;
            }
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::normalizer::NormalizerState;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn session() -> NormalizerState {
        let mut state = NormalizerState::new();
        state.use_identifier_mapping("a", 1);
        state.use_identifier_mapping("b", 2);
        state
    }

    fn or(state: &mut NormalizerState, source: &str) -> Rc<OrGroup> {
        let tokens = lex(source).unwrap();
        let predicate = parse(&tokens, source).unwrap();
        state.normalize_to_or_group(&predicate.expr)
    }

    #[test]
    fn test_find_contradictions() {
        let mut state = session();
        let group = or(&mut state, "a >= 10 && a < 0 || b > 0");
        let found = find_contradictions(&group).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].to_string(), "-1*a + -1");
    }

    #[test]
    fn test_consistent_group_has_no_contradictions() {
        let mut state = session();
        let group = or(&mut state, "a >= 0 && b >= a && b <= 100");
        assert!(find_contradictions(&group).unwrap().is_empty());
        let empty = state.unconstrained();
        assert!(find_contradictions(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_false_is_a_contradiction() {
        let mut state = session();
        let group = or(&mut state, "false");
        let found = find_contradictions(&group).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].to_string(), "-1");
    }

    #[test]
    fn test_check_groups() {
        let mut state = session();
        let mut known = KnownConstraints::new();
        let facts = or(&mut state, "a >= 3 && b >= a");
        let rejected = insert_and_group(&mut known, &facts.ands[0]).unwrap();
        assert!(rejected.is_empty());

        let both = or(&mut state, "a > 0 && b > 2");
        assert!(check_and_group(&known, &both.ands[0]).unwrap());
        assert!(check_or_group(&known, &both).unwrap());

        let either = or(&mut state, "a > 100 || b >= 3");
        assert!(check_or_group(&known, &either).unwrap());

        let neither = or(&mut state, "a > 100 || b > 100");
        assert!(!check_or_group(&known, &neither).unwrap());

        let anything = state.unconstrained();
        assert!(check_or_group(&known, &anything).unwrap());
    }

    #[test]
    fn test_insert_and_group_reports_rejected() {
        let mut state = session();
        let mut known = KnownConstraints::new();
        let facts = or(&mut state, "a >= 5 && a <= 2");
        let rejected = insert_and_group(&mut known, &facts.ands[0]).unwrap();
        assert_eq!(rejected.len(), 1);
    }
}

//! Fuzz target for the constraint store
//!
//! Inserts arbitrary small linear facts, forks, and checks queries. Every
//! accepted conclusion is verified on a grid of integer points.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::rc::Rc;

use zen::bounds::{KnownConstraints, NormalizerState, SumGroup};

const VARS: [&str; 3] = ["a", "b", "c"];

/// `c0*a + c1*b + c2*c + offset >= 0` with every value in -4..=4
#[derive(Debug, Clone, Copy, Arbitrary)]
struct Fact {
    coefficients: [i8; 3],
    offset: i8,
}

#[derive(Debug, Arbitrary)]
enum Step {
    Insert(Fact),
    Check(Fact),
    Fork,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    steps: Vec<Step>,
}

impl Fact {
    fn coefficients(&self) -> [i64; 3] {
        self.coefficients.map(|c| i64::from(c % 5))
    }

    fn offset(&self) -> i64 {
        i64::from(self.offset % 5)
    }

    fn source(&self) -> String {
        let mut terms: Vec<String> = self
            .coefficients()
            .iter()
            .zip(VARS)
            .filter(|(c, _)| **c != 0)
            .map(|(c, v)| format!("{c}*{v}"))
            .collect();
        terms.push(self.offset().to_string());
        terms.join(" + ")
    }

    fn evaluate(&self, point: [i64; 3]) -> i64 {
        self.coefficients().iter().zip(point).map(|(c, x)| c * x).sum::<i64>() + self.offset()
    }
}

fn grid() -> impl Iterator<Item = [i64; 3]> {
    (-3i64..=3).flat_map(|a| (-3i64..=3).flat_map(move |b| (-3i64..=3).map(move |c| [a, b, c])))
}

fn sum_of(state: &mut NormalizerState, fact: &Fact) -> Option<Rc<SumGroup>> {
    zen::normalize_expression(state, &fact.source()).ok()
}

fuzz_target!(|input: FuzzInput| {
    let mut state = NormalizerState::new();
    for (slot, name) in VARS.iter().enumerate() {
        state.use_identifier_mapping(*name, slot as i64 + 1);
    }

    let mut known = KnownConstraints::new();
    let mut accepted: Vec<Fact> = Vec::new();
    let mut snapshot: Option<(KnownConstraints, usize)> = None;

    for step in input.steps.iter().take(24) {
        match step {
            Step::Insert(fact) => {
                let Some(sum) = sum_of(&mut state, fact) else { continue };
                match known.insert_sum_group(&sum) {
                    Ok(true) => accepted.push(*fact),
                    Ok(false) => {
                        let feasible = grid()
                            .any(|p| fact.evaluate(p) >= 0 && accepted.iter().all(|f| f.evaluate(p) >= 0));
                        assert!(!feasible, "rejected a satisfiable fact: {sum}");
                    }
                    Err(_) => return,
                }
            }
            Step::Check(fact) => {
                let Some(sum) = sum_of(&mut state, fact) else { continue };
                if let Ok(result) = known.check_sum_group(&sum) {
                    if result.is_true {
                        for p in grid().filter(|p| accepted.iter().all(|f| f.evaluate(*p) >= 0)) {
                            assert!(fact.evaluate(p) >= 0, "{sum} does not hold at {p:?}");
                        }
                    }
                }
            }
            Step::Fork => {
                let fork = known.fork();
                let bound = fork.bound_facts().count();
                snapshot = Some((fork, bound));
            }
        }
    }

    // A fork taken earlier must not see later inserts
    if let Some((fork, bound)) = snapshot {
        assert_eq!(fork.bound_facts().count(), bound);
    }
});

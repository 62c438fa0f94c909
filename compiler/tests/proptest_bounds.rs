//! Property-based tests for the bounds checker
//!
//! Uses proptest to check canonical-form identities, the structural
//! invariants of the polytope, and that every conclusion drawn by the
//! constraint store holds on concrete integer points.

use std::rc::Rc;

use proptest::prelude::*;
use zen::bounds::{ConvexNDVolume, KnownConstraints, NormalizerState, SumGroup};
use zen::datastructures::BitSet32;
use zen::zmath::{Matrix, Rational};
use zen::{normalize_expression, normalize_predicate};

const VARS: [&str; 3] = ["a", "b", "c"];

/// Half-width of the integer grid; well past any fact offset
const GRID_RADIUS: i64 = 16;

fn session() -> NormalizerState {
    let mut state = NormalizerState::new();
    for (slot, name) in VARS.iter().enumerate() {
        state.use_identifier_mapping(*name, slot as i64 + 1);
    }
    state
}

fn same(state: &mut NormalizerState, lhs: &str, rhs: &str) -> bool {
    let left = normalize_expression(state, lhs).unwrap();
    let right = normalize_expression(state, rhs).unwrap();
    Rc::ptr_eq(&left, &right)
}

// ============================================================================
// Strategies
// ============================================================================

/// Arithmetic over a, b, c and small literals, fully parenthesized
fn arb_arith(depth: u32) -> BoxedStrategy<String> {
    let leaf = prop_oneof![
        prop::sample::select(VARS.to_vec()).prop_map(str::to_string),
        (0i64..10).prop_map(|n| n.to_string()),
    ];
    leaf.prop_recursive(depth, 16, 2, |inner| {
        (inner.clone(), prop::sample::select(vec!["+", "-", "*"]), inner)
            .prop_map(|(l, op, r)| format!("({l}) {op} ({r})"))
    })
    .boxed()
}

/// Token sequences, mostly ill-formed
fn arb_token_soup() -> impl Strategy<Value = String> {
    let tokens = vec![
        "a", "b", "c", "a.len", "0", "1", "7", "+", "-", "*", "(", ")", "<", "<=", ">", ">=",
        "==", "!=", "!", "&&", "||", "true", "false",
    ];
    prop::collection::vec(prop::sample::select(tokens), 0..16).prop_map(|parts| parts.join(" "))
}

/// Linear fact `c . (a, b, c) + offset`
fn arb_fact() -> impl Strategy<Value = ([i64; 3], i64)> {
    (prop::array::uniform3(-3i64..=3), -6i64..=6)
}

/// Dimension count and a list of extrusion directions
fn arb_volume_script() -> impl Strategy<Value = (usize, Vec<Vec<i64>>)> {
    (1usize..=4).prop_flat_map(|dims| {
        (
            Just(dims),
            prop::collection::vec(prop::collection::vec(-3i64..=3, dims), 0..6),
        )
    })
}

// ============================================================================
// Linear fact helpers
// ============================================================================

fn linear_source(coefficients: &[i64; 3], offset: i64) -> String {
    let mut terms: Vec<String> = coefficients
        .iter()
        .zip(VARS)
        .filter(|(c, _)| **c != 0)
        .map(|(c, v)| format!("{c}*{v}"))
        .collect();
    terms.push(offset.to_string());
    terms.join(" + ")
}

fn linear_sum(state: &mut NormalizerState, fact: &([i64; 3], i64)) -> Rc<SumGroup> {
    normalize_expression(state, &linear_source(&fact.0, fact.1)).unwrap()
}

fn evaluate(fact: &([i64; 3], i64), point: [i64; 3]) -> i64 {
    fact.0.iter().zip(point).map(|(c, x)| c * x).sum::<i64>() + fact.1
}

fn grid() -> impl Iterator<Item = [i64; 3]> {
    let range = || -GRID_RADIUS..=GRID_RADIUS;
    range().flat_map(move |a| range().flat_map(move |b| range().map(move |c| [a, b, c])))
}

fn satisfies(facts: &[([i64; 3], i64)], point: [i64; 3]) -> bool {
    facts.iter().all(|fact| evaluate(fact, point) >= 0)
}

// ============================================================================
// Polytope helpers
// ============================================================================

fn volume_with_axes(state: &mut NormalizerState, dims: usize) -> ConvexNDVolume {
    let mut volume = ConvexNDVolume::new();
    for slot in 0..dims {
        let var = state.variable(format!("x{slot}"), 100 + slot as i64);
        let axis = state.factor_sum(var);
        volume.extend_dimension(axis).unwrap();
    }
    volume
}

fn pairs_of(volume: &ConvexNDVolume, coordinates: &[Rational]) -> Vec<(Rc<SumGroup>, Rational)> {
    volume
        .axes()
        .iter()
        .cloned()
        .zip(coordinates.iter().copied())
        .collect()
}

fn coordinates_of(vector: &Matrix) -> Vec<Rational> {
    (0..vector.rows()).map(|i| vector.get(i, 0)).collect()
}

/// Inward normals of every hyperplane through `dims - 1` spanning vectors
/// that keeps all spanning vectors on one side
fn enumerated_facets(volume: &ConvexNDVolume) -> Vec<Matrix> {
    let dims = volume.dimensions();
    let vectors = volume.vectors();
    let all: BitSet32 = (0..vectors.len()).collect();
    let mut normals = Vec::new();
    for subset in all.subsets(dims - 1) {
        let members: Vec<Matrix> = subset.iter().map(|i| vectors[i].clone()).collect();
        let mut normal = Matrix::orthogonal_vector(&members, dims).unwrap();
        if normal.is_zero() {
            continue;
        }
        let dots: Vec<Rational> = vectors.iter().map(|v| normal.dot(v).unwrap()).collect();
        let positive = dots.iter().any(Rational::is_positive);
        let negative = dots.iter().any(Rational::is_negative);
        if positive && negative {
            continue;
        }
        if negative {
            normal.scale(Rational::MINUS_ONE);
        }
        normals.push(normal);
    }
    normals
}

fn inside_all(normals: &[Matrix], coordinates: &[Rational]) -> bool {
    let point = Matrix::column(coordinates);
    normals
        .iter()
        .all(|normal| !normal.dot(&point).unwrap().is_negative())
}

fn check_volume_invariants(volume: &ConvexNDVolume) -> Result<(), TestCaseError> {
    let dims = volume.dimensions();
    let faces = volume.faces();
    for (index, face) in faces.iter().enumerate() {
        prop_assert!(face.basis.len() + 1 >= dims);
        for basis in face.basis.iter() {
            let dot = face.normal.dot(&volume.vectors()[basis]).unwrap();
            prop_assert!(dot.is_zero(), "face {} not orthogonal to vector {}", index, basis);
        }
        for vector in volume.vectors() {
            prop_assert!(!face.normal.dot(vector).unwrap().is_negative());
        }
        for edge in &face.edges {
            prop_assert_eq!(edge.from, index);
            prop_assert_ne!(edge.to, index);
        }
        for (other, neighbour) in faces.iter().enumerate() {
            if other == index {
                continue;
            }
            let shared = face.basis.intersection(&neighbour.basis);
            let edge = face.edges.iter().find(|edge| edge.to == other);
            if shared.len() >= dims.saturating_sub(2) {
                let edge = edge.ok_or_else(|| TestCaseError::fail("missing edge"))?;
                prop_assert_eq!(&edge.basis, &shared);
            } else {
                prop_assert!(edge.is_none());
            }
        }
    }
    Ok(())
}

// ============================================================================
// Normalization Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn addition_commutes(l in arb_arith(3), r in arb_arith(3)) {
        let mut state = session();
        let (lhs, rhs) = (format!("({l}) + ({r})"), format!("({r}) + ({l})"));
        prop_assert!(same(&mut state, &lhs, &rhs));
    }

    #[test]
    fn multiplication_commutes(l in arb_arith(3), r in arb_arith(3)) {
        let mut state = session();
        let (lhs, rhs) = (format!("({l}) * ({r})"), format!("({r}) * ({l})"));
        prop_assert!(same(&mut state, &lhs, &rhs));
    }

    #[test]
    fn multiplication_distributes(x in arb_arith(2), y in arb_arith(2), z in arb_arith(2)) {
        let mut state = session();
        let lhs = format!("({x}) * (({y}) + ({z}))");
        let rhs = format!("({x}) * ({y}) + ({x}) * ({z})");
        prop_assert!(same(&mut state, &lhs, &rhs));
    }

    #[test]
    fn subtraction_cancels(x in arb_arith(3)) {
        let mut state = session();
        let diff = format!("({x}) - ({x})");
        prop_assert!(same(&mut state, &diff, "0"));
        let neg_neg = format!("-(-({x}))");
        prop_assert!(same(&mut state, &neg_neg, &x));
    }

    #[test]
    fn comparison_mirrors_and_double_not(l in arb_arith(2), r in arb_arith(2)) {
        let mut state = session();
        let lt = normalize_predicate(&mut state, &format!("({l}) < ({r})")).unwrap();
        let gt = normalize_predicate(&mut state, &format!("({r}) > ({l})")).unwrap();
        let not_not = normalize_predicate(&mut state, &format!("!(!(({l}) < ({r})))")).unwrap();
        prop_assert!(Rc::ptr_eq(&lt, &gt));
        prop_assert!(Rc::ptr_eq(&lt, &not_not));
    }
}

// ============================================================================
// Polytope Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn extrusion_keeps_face_invariants((dims, directions) in arb_volume_script()) {
        let mut state = NormalizerState::new();
        let mut volume = volume_with_axes(&mut state, dims);
        check_volume_invariants(&volume)?;

        for direction in &directions {
            let coordinates: Vec<Rational> = direction.iter().map(|&n| Rational::from(n)).collect();
            let pairs = pairs_of(&volume, &coordinates);
            volume.extrude(&pairs).unwrap();
            check_volume_invariants(&volume)?;
            prop_assert!(volume.is_bounded(&pairs).unwrap());
        }
    }

    #[test]
    fn nonnegative_combinations_stay_inside(
        (dims, directions) in arb_volume_script(),
        weights in prop::collection::vec(0i64..3, 10),
    ) {
        let mut state = NormalizerState::new();
        let mut volume = volume_with_axes(&mut state, dims);
        for direction in &directions {
            let coordinates: Vec<Rational> = direction.iter().map(|&n| Rational::from(n)).collect();
            let pairs = pairs_of(&volume, &coordinates);
            volume.extrude(&pairs).unwrap();
        }

        let mut combined = vec![Rational::ZERO; dims];
        for (vector, &weight) in volume.vectors().iter().zip(&weights) {
            for (total, value) in combined.iter_mut().zip(coordinates_of(vector)) {
                *total = *total + value.scale(weight);
            }
        }
        let pairs = pairs_of(&volume, &combined);
        prop_assert!(volume.is_bounded(&pairs).unwrap());
    }

    #[test]
    fn membership_matches_enumerated_facets(
        (dims, directions) in arb_volume_script(),
        points in prop::collection::vec(prop::array::uniform4(-4i64..=4), 1..12),
    ) {
        let mut state = NormalizerState::new();
        let mut volume = volume_with_axes(&mut state, dims);
        for direction in &directions {
            let coordinates: Vec<Rational> = direction.iter().map(|&n| Rational::from(n)).collect();
            let pairs = pairs_of(&volume, &coordinates);
            volume.extrude(&pairs).unwrap();
        }
        let facets = enumerated_facets(&volume);

        let mut samples: Vec<Vec<Rational>> = points
            .iter()
            .map(|point| point[..dims].iter().map(|&n| Rational::from(n)).collect())
            .collect();
        // Reflected spanning vectors sit outside unless the volume contains a line
        samples.extend(
            volume
                .vectors()
                .iter()
                .map(|vector| coordinates_of(vector).into_iter().map(Rational::negate).collect()),
        );

        for coordinates in &samples {
            let expected = inside_all(&facets, coordinates);
            let pairs = pairs_of(&volume, coordinates);
            prop_assert_eq!(
                volume.is_bounded(&pairs).unwrap(),
                expected,
                "{:?} against\n{}",
                coordinates,
                volume
            );
        }
    }
}

// ============================================================================
// Constraint Store Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn conclusions_hold_on_integer_points(
        facts in prop::collection::vec(arb_fact(), 1..6),
        query in arb_fact(),
    ) {
        let mut state = session();
        let mut known = KnownConstraints::new();
        let mut accepted = Vec::new();

        for fact in &facts {
            let sum = linear_sum(&mut state, fact);
            if known.insert_sum_group(&sum).unwrap() {
                accepted.push(*fact);
            } else {
                let mut together = accepted.clone();
                together.push(*fact);
                prop_assert!(
                    grid().all(|point| !satisfies(&together, point)),
                    "rejected {} but a point satisfies it",
                    sum
                );
            }
        }

        // Accepted facts without an integer point would make the check vacuous
        prop_assume!(grid().any(|point| satisfies(&accepted, point)));

        let sum = linear_sum(&mut state, &query);
        if known.check_sum_group(&sum).unwrap().is_true {
            for point in grid().filter(|point| satisfies(&accepted, *point)) {
                prop_assert!(evaluate(&query, point) >= 0, "{} fails at {:?}", sum, point);
            }
        }
    }

    #[test]
    fn fork_does_not_leak(
        base in prop::collection::vec(arb_fact(), 0..4),
        branch_facts in prop::collection::vec(arb_fact(), 1..4),
        queries in prop::collection::vec(arb_fact(), 1..6),
    ) {
        let mut state = session();
        let mut known = KnownConstraints::new();
        for fact in &base {
            let sum = linear_sum(&mut state, fact);
            known.insert_sum_group(&sum).unwrap();
        }
        let queries: Vec<Rc<SumGroup>> = queries.iter().map(|q| linear_sum(&mut state, q)).collect();
        let answer = |store: &KnownConstraints| -> Vec<bool> {
            queries.iter().map(|q| store.check_sum_group(q).unwrap().is_true).collect()
        };

        let before = answer(&known);
        let mut branch = known.fork();
        for fact in &branch_facts {
            let sum = linear_sum(&mut state, fact);
            branch.insert_sum_group(&sum).unwrap();
        }
        prop_assert_eq!(answer(&known), before.clone());

        let branch_answers = answer(&branch);
        for fact in &branch_facts {
            let sum = linear_sum(&mut state, fact);
            known.insert_sum_group(&sum).unwrap();
        }
        prop_assert_eq!(answer(&branch), branch_answers);
    }
}

// ============================================================================
// Reader Robustness
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn reader_never_panics(source in arb_token_soup()) {
        let mut state = session();
        if let Ok(predicate) = zen::parse_predicate(&source) {
            let _ = state.normalize_to_or_group(&predicate.expr);
            let _ = state.normalize_to_sum_group(&predicate.expr);
        }
    }
}

// ============================================================================
// Manual Tests
// ============================================================================

#[test]
fn test_linear_source_format() {
    assert_eq!(linear_source(&[1, 0, -2], 3), "1*a + -2*c + 3");
    assert_eq!(linear_source(&[0, 0, 0], -1), "-1");
}

#[test]
fn test_grid_covers_cube() {
    assert_eq!(grid().count(), 33 * 33 * 33);
    assert!(grid().any(|p| p == [-16, 16, 0]));
    assert!(grid().all(|p| p.iter().all(|x| x.abs() <= GRID_RADIUS)));
}

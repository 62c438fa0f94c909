//! Slot remapping of normal forms
//!
//! Rebuilds a normal form with every variable and property slot rewritten
//! through a `slot -> slot` table. Used to line up the parameter slots of one
//! signature with another before comparing their constraints. Slots missing
//! from the table are kept as they are.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::node::{AndGroup, Node, NodeArray, OrGroup, SumGroup};
use super::normalizer::NormalizerState;

/// Slot rewrite table
pub type SlotMapping = FxHashMap<i64, i64>;

pub fn map_or_group(state: &mut NormalizerState, group: &OrGroup, mapping: &SlotMapping) -> Rc<OrGroup> {
    let ands = group
        .ands
        .iter()
        .map(|and| map_and_group(state, and, mapping))
        .collect();
    state.or_group(ands)
}

pub fn map_and_group(state: &mut NormalizerState, group: &AndGroup, mapping: &SlotMapping) -> Rc<AndGroup> {
    let sums = group
        .sums
        .iter()
        .map(|sum| map_sum_group(state, sum, mapping))
        .collect();
    state.and_group(sums)
}

pub fn map_sum_group(state: &mut NormalizerState, sum: &SumGroup, mapping: &SlotMapping) -> Rc<SumGroup> {
    let terms = sum
        .products
        .iter()
        .map(|product| (map_array(state, &product.factors, mapping), product.coefficient))
        .collect();
    state.sum_group(terms, sum.offset)
}

fn map_array(state: &mut NormalizerState, array: &NodeArray, mapping: &SlotMapping) -> Rc<NodeArray> {
    let factors = array
        .factors
        .iter()
        .map(|factor| map_factor(state, factor, mapping))
        .collect();
    state.node_array(factors)
}

fn map_factor(state: &mut NormalizerState, factor: &Node, mapping: &SlotMapping) -> Node {
    let remap = |slot: i64| mapping.get(&slot).copied().unwrap_or(slot);
    match factor {
        Node::Variable(var) => state.variable(var.name.clone(), remap(var.slot)),
        Node::Property(prop) => {
            let owner = map_factor(state, &prop.owner, mapping);
            state.property(owner, prop.name.clone(), remap(prop.slot))
        }
        other => other.clone(),
    }
}

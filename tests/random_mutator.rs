//! Random mutator sequences checked against a shadow model of the object
//! graph. The model tracks every allocation and the root stack by index;
//! after each collection the runtime's survivor count must equal the number
//! of nodes reachable in the model, and the surviving graph must stay
//! isomorphic to the model graph, cycles included.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use slidegc::{ObjRef, Payload, Runtime};

#[derive(Debug, Clone)]
enum Op {
    PushInt(i64),
    PushPair,
    Pop,
    SetHead,
    SetTail,
    Gc,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => any::<i64>().prop_map(Op::PushInt),
        3 => Just(Op::PushPair),
        3 => Just(Op::Pop),
        1 => Just(Op::SetHead),
        1 => Just(Op::SetTail),
        2 => Just(Op::Gc),
    ]
}

#[derive(Clone, Copy)]
enum Node {
    Int(i64),
    Pair(usize, usize),
}

struct Model {
    nodes: Vec<Node>,
    stack: Vec<usize>,
}

impl Model {
    fn new() -> Self {
        Model {
            nodes: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn reachable(&self) -> usize {
        let mut seen = HashSet::new();
        let mut pending = self.stack.clone();
        while let Some(i) = pending.pop() {
            if !seen.insert(i) {
                continue;
            }
            if let Node::Pair(head, tail) = self.nodes[i] {
                pending.push(head);
                pending.push(tail);
            }
        }
        seen.len()
    }
}

/// Walk runtime and model graphs in lockstep, building a bijection between
/// runtime cells and model nodes. Revisiting a paired cell checks the
/// pairing instead of recursing, which terminates cycles.
fn check_same_shape(
    rt: &Runtime,
    r: ObjRef,
    model: &Model,
    mi: usize,
    pairing: &mut HashMap<ObjRef, usize>,
) -> Result<(), TestCaseError> {
    if let Some(&paired) = pairing.get(&r) {
        prop_assert_eq!(paired, mi);
        return Ok(());
    }
    pairing.insert(r, mi);
    match (rt.payload(r), &model.nodes[mi]) {
        (Payload::Int(actual), Node::Int(expected)) => {
            prop_assert_eq!(actual, *expected);
        }
        (Payload::Pair { head, tail }, Node::Pair(mh, mt)) => {
            check_same_shape(rt, head, model, *mh, pairing)?;
            check_same_shape(rt, tail, model, *mt, pairing)?;
        }
        _ => {
            return Err(TestCaseError::fail("cell kind diverged from model"));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64, .. ProptestConfig::default()
    })]
    #[test]
    fn survivors_match_shadow_model(ops in proptest::collection::vec(op_strategy(), 1..120)) {
        let mut rt = Runtime::new().unwrap();
        let mut model = Model::new();

        for op in ops {
            match op {
                Op::PushInt(value) => {
                    rt.push_int(value).unwrap();
                    model.nodes.push(Node::Int(value));
                    model.stack.push(model.nodes.len() - 1);
                }
                Op::PushPair => {
                    if model.stack.len() < 2 {
                        continue;
                    }
                    rt.push_pair().unwrap();
                    let tail = model.stack.pop().unwrap();
                    let head = model.stack.pop().unwrap();
                    model.nodes.push(Node::Pair(head, tail));
                    model.stack.push(model.nodes.len() - 1);
                }
                Op::Pop => {
                    if model.stack.is_empty() {
                        continue;
                    }
                    rt.pop().unwrap();
                    model.stack.pop();
                }
                Op::SetHead | Op::SetTail => {
                    if model.stack.len() < 2 {
                        continue;
                    }
                    let value_mi = model.stack[model.stack.len() - 1];
                    let pair_mi = model.stack[model.stack.len() - 2];
                    let Node::Pair(head, tail) = model.nodes[pair_mi] else {
                        continue;
                    };
                    let roots: Vec<ObjRef> = rt.roots().collect();
                    let value_r = roots[roots.len() - 1];
                    let pair_r = roots[roots.len() - 2];
                    if matches!(op, Op::SetHead) {
                        rt.set_head(pair_r, value_r).unwrap();
                        model.nodes[pair_mi] = Node::Pair(value_mi, tail);
                    } else {
                        rt.set_tail(pair_r, value_r).unwrap();
                        model.nodes[pair_mi] = Node::Pair(head, value_mi);
                    }
                }
                Op::Gc => {
                    rt.gc().unwrap();
                    prop_assert_eq!(rt.live_count(), model.reachable());
                }
            }
        }

        // Rendering depends only on graph structure, so relocation and heap
        // movement must not change it.
        let before: Vec<String> = rt.roots().map(|r| rt.render(r)).collect();
        rt.gc().unwrap();
        let after: Vec<String> = rt.roots().map(|r| rt.render(r)).collect();
        prop_assert_eq!(after, before);

        prop_assert_eq!(rt.live_count(), model.reachable());
        prop_assert_eq!(rt.stack_depth(), model.stack.len());

        let roots: Vec<ObjRef> = rt.roots().collect();
        let mut pairing = HashMap::new();
        for (r, mi) in roots.iter().zip(model.stack.iter()) {
            check_same_shape(&rt, *r, &model, *mi, &mut pairing)?;
        }
    }
}

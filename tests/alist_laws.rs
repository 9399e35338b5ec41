//! Property-based laws for the indexed tree sequence: agreement with a
//! `Vec` model, and exactness of the incrementally-maintained sum.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use vlists::alist::{AList, SumTracker};

#[derive(Debug, Clone)]
enum Operation {
    Push(i64),
    Pop,
    Insert(usize, i64),
    Remove(usize),
    Set(usize, i64),
    Snapshot,
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    // Small item values keep sums far from overflow.
    let item = -1000i64..1000i64;
    prop_oneof![
        3 => item.clone().prop_map(Operation::Push),
        1 => Just(Operation::Pop),
        2 => (any::<usize>(), item.clone()).prop_map(|(index, value)| Operation::Insert(index, value)),
        2 => any::<usize>().prop_map(Operation::Remove),
        1 => (any::<usize>(), item).prop_map(|(index, value)| Operation::Set(index, value)),
        1 => Just(Operation::Snapshot),
    ]
}

proptest! {
    /// The tree agrees with a `Vec` model element for element, across
    /// random operation mixes spanning several leaf and inner capacities.
    /// Snapshots taken along the way must keep reading their frozen state.
    #[test]
    fn alist_agrees_with_vec_model(
        seed in proptest::collection::vec(-1000i64..1000i64, 0..400),
        operations in proptest::collection::vec(operation_strategy(), 1..150)
    ) {
        let mut list: AList<i64> = seed.clone().into_iter().collect();
        let mut model: Vec<i64> = seed;
        let mut snapshots: Vec<(AList<i64>, Vec<i64>)> = Vec::new();
        for operation in operations {
            match operation {
                Operation::Push(value) => {
                    list.push(value);
                    model.push(value);
                }
                Operation::Pop => {
                    match list.pop() {
                        Ok(item) => prop_assert_eq!(Some(item), model.pop()),
                        Err(_) => prop_assert!(model.is_empty()),
                    }
                }
                Operation::Insert(index, value) => {
                    let index = index % (model.len() + 1);
                    list.insert(index, value).expect("index within bounds");
                    model.insert(index, value);
                }
                Operation::Remove(index) => {
                    if model.is_empty() {
                        prop_assert!(list.remove_at(index).is_err());
                    } else {
                        let index = index % model.len();
                        let removed = list.remove_at(index).expect("index within bounds");
                        prop_assert_eq!(removed, model.remove(index));
                    }
                }
                Operation::Set(index, value) => {
                    if model.is_empty() {
                        prop_assert!(list.set(index, value).is_err());
                    } else {
                        let index = index % model.len();
                        let previous = list.set(index, value).expect("index within bounds");
                        prop_assert_eq!(previous, model[index]);
                        model[index] = value;
                    }
                }
                Operation::Snapshot => {
                    snapshots.push((list.clone(), model.clone()));
                }
            }
            prop_assert_eq!(list.len(), model.len());
        }
        let collected: Vec<i64> = list.iter().copied().collect();
        prop_assert_eq!(&collected, &model);
        for index in 0..model.len() {
            prop_assert_eq!(list.get(index), Some(&model[index]));
        }
        for (snapshot, frozen_model) in &snapshots {
            let snapshot_items: Vec<i64> = snapshot.iter().copied().collect();
            prop_assert_eq!(&snapshot_items, frozen_model);
        }
    }

    /// The tracker's incrementally-maintained sum equals a naive
    /// recomputation after every single mutation.
    #[test]
    fn tracked_sum_equals_naive_recomputation(
        seed in proptest::collection::vec(-1000i64..1000i64, 0..100),
        operations in proptest::collection::vec(operation_strategy(), 1..120)
    ) {
        let mut list: AList<i64> = seed.into_iter().collect();
        let tracker = Rc::new(RefCell::new(SumTracker::new()));
        list.add_observer(tracker.clone()).expect("fresh observer");
        let naive = |list: &AList<i64>| -> i64 { list.iter().sum() };
        prop_assert_eq!(tracker.borrow().sum(list.id()), Some(naive(&list)));
        for operation in operations {
            match operation {
                Operation::Push(value) => list.push(value),
                Operation::Pop => {
                    let _ = list.pop();
                }
                Operation::Insert(index, value) => {
                    let index = index % (list.len() + 1);
                    list.insert(index, value).expect("index within bounds");
                }
                Operation::Remove(index) => {
                    if !list.is_empty() {
                        let index = index % list.len();
                        list.remove_at(index).expect("index within bounds");
                    }
                }
                Operation::Set(index, value) => {
                    if !list.is_empty() {
                        let index = index % list.len();
                        list.set(index, value).expect("index within bounds");
                    }
                }
                // Snapshots force copy-on-write on the next mutations; the
                // sum must stay exact through the node identity churn.
                Operation::Snapshot => {
                    let _ = list.clone();
                }
            }
            prop_assert_eq!(tracker.borrow().sum(list.id()), Some(naive(&list)));
        }
    }
}

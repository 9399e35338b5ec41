//! Integration tests for the indexed tree sequence.

use rstest::rstest;
use vlists::alist::AList;
use vlists::error::Error;

#[rstest]
fn test_append_then_drain_downward() {
    // Append 1..=1000, then remove at 500, 499, ..., 0, checking the front
    // and the length after every removal.
    let mut list: AList<i32> = (1..=1000).collect();
    assert_eq!(list.len(), 1000);
    let mut expected_len = 1000;
    for index in (0..=500).rev() {
        let removed = list.remove_at(index).expect("within bounds");
        assert_eq!(removed, i32::try_from(index).expect("fits") + 1);
        expected_len -= 1;
        assert_eq!(list.len(), expected_len);
        let expected_front = if index == 0 { 2 } else { 1 };
        assert_eq!(list.get(0), Some(&expected_front));
    }
    // 1..=501 are gone; 502..=1000 remain.
    let collected: Vec<i32> = list.iter().copied().collect();
    let expected: Vec<i32> = (502..=1000).collect();
    assert_eq!(collected, expected);
}

#[rstest]
fn test_interleaved_inserts_match_vec_model() {
    let mut list: AList<usize> = AList::new();
    let mut model: Vec<usize> = Vec::new();
    for value in 0..600 {
        let index = (value * 13) % (model.len() + 1);
        list.insert(index, value).expect("within bounds");
        model.insert(index, value);
    }
    assert_eq!(list.len(), model.len());
    let collected: Vec<usize> = list.iter().copied().collect();
    assert_eq!(collected, model);
    for index in 0..model.len() {
        assert_eq!(list.get(index), Some(&model[index]));
    }
}

#[rstest]
fn test_priority_queue_backing_contract() {
    // The array-heap usage pattern: push at the back, read and write by
    // index, remove the last.
    let mut list: AList<u64> = AList::new();
    for value in [5, 3, 8, 1, 9, 2] {
        list.push(value);
        // Bubble up naively.
        let mut index = list.len() - 1;
        while index > 0 {
            let parent = (index - 1) / 2;
            let child_value = *list.get(index).expect("within bounds");
            let parent_value = *list.get(parent).expect("within bounds");
            if child_value >= parent_value {
                break;
            }
            list.set(index, parent_value).expect("within bounds");
            list.set(parent, child_value).expect("within bounds");
            index = parent;
        }
    }
    assert_eq!(list.get(0), Some(&1));
    assert_eq!(list.len(), 6);
    assert!(list.pop().is_ok());
    assert_eq!(list.len(), 5);
}

#[rstest]
fn test_snapshots_are_cheap_and_isolated() {
    let mut list: AList<i32> = (1..=512).collect();
    let mut snapshots = Vec::new();
    for round in 0..8 {
        snapshots.push((round, list.clone()));
        list.set(usize::try_from(round).expect("fits") * 10, -round)
            .expect("within bounds");
    }
    for (round, snapshot) in &snapshots {
        // Each snapshot sees exactly the edits made before it was taken.
        for earlier in 0..*round {
            let index = usize::try_from(earlier).expect("fits") * 10;
            assert_eq!(snapshot.get(index), Some(&-earlier));
        }
        let own_index = usize::try_from(*round).expect("fits") * 10;
        let original = i32::try_from(own_index).expect("fits") + 1;
        assert_eq!(snapshot.get(own_index), Some(&original));
    }
}

#[rstest]
fn test_remove_everything_then_reuse() {
    let mut list: AList<i32> = (1..=200).collect();
    while !list.is_empty() {
        list.remove_at(0).expect("within bounds");
    }
    assert_eq!(list.pop(), Err(Error::EmptySequence));
    list.push(42);
    assert_eq!(list.get(0), Some(&42));
    assert_eq!(list.len(), 1);
}

#[rstest]
fn test_boundary_errors_leave_list_unchanged() {
    let mut list: AList<i32> = (1..=10).collect();
    assert_eq!(
        list.insert(11, 0).err(),
        Some(Error::IndexOutOfRange {
            index: 11,
            length: 10
        })
    );
    assert_eq!(
        list.remove_at(10).err(),
        Some(Error::IndexOutOfRange {
            index: 10,
            length: 10
        })
    );
    assert_eq!(
        list.set(10, 0).err(),
        Some(Error::IndexOutOfRange {
            index: 10,
            length: 10
        })
    );
    let collected: Vec<i32> = list.iter().copied().collect();
    let expected: Vec<i32> = (1..=10).collect();
    assert_eq!(collected, expected);
}

#[rstest]
#[case(1)]
#[case(32)]
#[case(33)]
#[case(256)]
#[case(257)]
#[case(2048)]
fn test_iteration_at_capacity_boundaries(#[case] count: usize) {
    let list: AList<usize> = (0..count).collect();
    let collected: Vec<usize> = list.iter().copied().collect();
    let expected: Vec<usize> = (0..count).collect();
    assert_eq!(collected, expected);
    assert_eq!(list.iter().len(), count);
    assert_eq!(list.last(), expected.last());
}

#[rstest]
fn test_owning_iteration() {
    let list: AList<String> = (1..=5).map(|value| value.to_string()).collect();
    let collected: Vec<String> = list.into_iter().collect();
    assert_eq!(collected, vec!["1", "2", "3", "4", "5"]);
}

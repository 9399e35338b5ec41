//! Integration tests for the tree observer protocol and the sum tracker.

use std::cell::RefCell;
use std::rc::Rc;

use rstest::rstest;
use vlists::alist::{AList, Node, NodeId, ObserverRef, SumTracker, TreeId, TreeObserver};
use vlists::error::Error;

// =============================================================================
// Recording Observer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Attached(TreeId),
    Detached(TreeId),
    RootChanged { present: bool, cleared: bool },
    CheckPoint(usize),
    ItemAdded(i64),
    ItemRemoved(i64),
    NodeAdded,
    NodeRemoved,
}

#[derive(Default)]
struct Recorder {
    events: Vec<Event>,
}

impl Recorder {
    fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    fn count_of(&self, wanted: &Event) -> usize {
        self.events.iter().filter(|event| *event == wanted).count()
    }
}

impl TreeObserver<i64> for Recorder {
    fn attach(&mut self, tree: TreeId) -> Result<bool, Error> {
        self.events.push(Event::Attached(tree));
        Ok(true)
    }

    fn detach(&mut self, tree: TreeId, _root: Option<&Node<i64>>) {
        self.events.push(Event::Detached(tree));
    }

    fn root_changed(&mut self, _tree: TreeId, root: Option<&Node<i64>>, clear: bool) {
        self.events.push(Event::RootChanged {
            present: root.is_some(),
            cleared: clear,
        });
    }

    fn check_point(&mut self, _tree: TreeId, count: usize) {
        self.events.push(Event::CheckPoint(count));
    }

    fn item_added(&mut self, _tree: TreeId, item: &i64, _leaf: NodeId) {
        self.events.push(Event::ItemAdded(*item));
    }

    fn item_removed(&mut self, _tree: TreeId, item: &i64, _leaf: NodeId) {
        self.events.push(Event::ItemRemoved(*item));
    }

    fn node_added(&mut self, _tree: TreeId, _child: NodeId, _parent: NodeId) {
        self.events.push(Event::NodeAdded);
    }

    fn node_removed(&mut self, _tree: TreeId, _child: NodeId, _parent: NodeId) {
        self.events.push(Event::NodeRemoved);
    }
}

// =============================================================================
// SumTracker Scenarios
// =============================================================================

#[rstest]
fn test_sum_tracker_lifecycle() {
    let mut list: AList<i64> = (1..=5).collect();
    let tracker = Rc::new(RefCell::new(SumTracker::new()));
    let handle: ObserverRef<i64> = tracker.clone();
    list.add_observer(handle.clone()).expect("fresh observer");
    assert_eq!(tracker.borrow().sum(list.id()), Some(15));

    // Removing the 3 drops the sum to 12.
    assert_eq!(list.remove_at(2), Ok(3));
    assert_eq!(tracker.borrow().sum(list.id()), Some(12));

    // After detaching, further mutations notify nothing.
    list.remove_observer(&handle).expect("attached observer");
    assert!(!tracker.borrow().is_tracking(list.id()));
    list.push(100);
    list.remove_at(0).expect("within bounds");
    assert_eq!(tracker.borrow().sum(list.id()), None);
}

#[rstest]
fn test_sum_tracker_follows_every_mutation_kind() {
    let mut list: AList<i64> = AList::new();
    let tracker = Rc::new(RefCell::new(SumTracker::new()));
    list.add_observer(tracker.clone()).expect("fresh observer");

    for value in 1..=200 {
        list.push(value);
    }
    assert_eq!(tracker.borrow().sum(list.id()), Some(201 * 100));

    // set is a remove plus an add.
    assert_eq!(list.set(0, 1000), Ok(1));
    assert_eq!(tracker.borrow().sum(list.id()), Some(201 * 100 - 1 + 1000));

    // insert in the middle, forcing splits along the way.
    list.insert(100, -500).expect("within bounds");
    assert_eq!(
        tracker.borrow().sum(list.id()),
        Some(201 * 100 - 1 + 1000 - 500)
    );

    // clear walks the dropped tree back out.
    list.clear();
    assert_eq!(tracker.borrow().sum(list.id()), Some(0));
}

#[rstest]
fn test_sum_tracker_serves_multiple_trees() {
    let mut first: AList<i64> = (1..=10).collect();
    let mut second: AList<i64> = (1..=3).collect();
    let tracker = Rc::new(RefCell::new(SumTracker::new()));
    first.add_observer(tracker.clone()).expect("fresh observer");
    second.add_observer(tracker.clone()).expect("fresh observer");
    assert_eq!(tracker.borrow().sum(first.id()), Some(55));
    assert_eq!(tracker.borrow().sum(second.id()), Some(6));
    first.pop().expect("non-empty");
    assert_eq!(tracker.borrow().sum(first.id()), Some(45));
    assert_eq!(tracker.borrow().sum(second.id()), Some(6));
}

#[rstest]
fn test_sum_tracker_survives_snapshot_copy_on_write() {
    let mut list: AList<i64> = (1..=100).collect();
    let tracker = Rc::new(RefCell::new(SumTracker::new()));
    list.add_observer(tracker.clone()).expect("fresh observer");
    let snapshot = list.clone();
    // Every mutation now copy-on-writes; the sum keyed by tree id stays
    // exact regardless of node identity churn.
    list.set(50, 0).expect("within bounds");
    list.remove_at(0).expect("within bounds");
    list.push(7);
    assert_eq!(tracker.borrow().sum(list.id()), Some(5050 - 51 - 1 + 7));
    assert_eq!(snapshot.len(), 100);
}

// =============================================================================
// Protocol Details
// =============================================================================

#[rstest]
fn test_attach_reports_existing_contents() {
    let mut list: AList<i64> = (1..=40).collect();
    let recorder = Recorder::shared();
    list.add_observer(recorder.clone()).expect("fresh observer");
    let recorder = recorder.borrow();
    assert_eq!(recorder.events.first(), Some(&Event::Attached(list.id())));
    for value in 1..=40 {
        assert_eq!(recorder.count_of(&Event::ItemAdded(value)), 1);
    }
}

#[rstest]
fn test_duplicate_attach_is_rejected() {
    let mut list: AList<i64> = (1..=3).collect();
    let recorder = Recorder::shared();
    let handle: ObserverRef<i64> = recorder.clone();
    list.add_observer(handle.clone()).expect("fresh observer");
    assert_eq!(
        list.add_observer(handle.clone()),
        Err(Error::InvalidState("observer is already attached"))
    );
    assert_eq!(
        list.remove_observer(&handle),
        Ok(())
    );
    assert_eq!(
        list.remove_observer(&handle),
        Err(Error::InvalidState("observer is not attached"))
    );
}

#[rstest]
fn test_check_point_fires_once_per_mutation() {
    let mut list: AList<i64> = AList::new();
    let recorder = Recorder::shared();
    list.add_observer(recorder.clone()).expect("fresh observer");
    list.push(1);
    list.push(2);
    list.insert(1, 3).expect("within bounds");
    list.set(0, 9).expect("within bounds");
    list.remove_at(2).expect("within bounds");
    let recorder = recorder.borrow();
    let check_points: Vec<usize> = recorder
        .events
        .iter()
        .filter_map(|event| match event {
            Event::CheckPoint(count) => Some(*count),
            _ => None,
        })
        .collect();
    assert_eq!(check_points, vec![1, 2, 3, 3, 2]);
}

#[rstest]
fn test_root_changes_are_reported() {
    let mut list: AList<i64> = AList::new();
    let recorder = Recorder::shared();
    list.add_observer(recorder.clone()).expect("fresh observer");
    // First push creates the root.
    list.push(1);
    assert_eq!(
        recorder.borrow().count_of(&Event::RootChanged {
            present: true,
            cleared: false
        }),
        1
    );
    // Filling past one leaf grows a new root above it.
    for value in 2..=40 {
        list.push(value);
    }
    assert!(
        recorder.borrow().count_of(&Event::RootChanged {
            present: true,
            cleared: false
        }) >= 2
    );
    assert!(recorder.borrow().count_of(&Event::NodeAdded) >= 2);
}

#[rstest]
fn test_copy_on_write_raises_the_clear_flag() {
    let mut list: AList<i64> = (1..=100).collect();
    let recorder = Recorder::shared();
    list.add_observer(recorder.clone()).expect("fresh observer");
    assert_eq!(
        recorder.borrow().count_of(&Event::RootChanged {
            present: true,
            cleared: true
        }),
        0
    );
    let snapshot = list.clone();
    list.set(10, -1).expect("within bounds");
    assert_eq!(
        recorder.borrow().count_of(&Event::RootChanged {
            present: true,
            cleared: true
        }),
        1
    );
    drop(snapshot);
    // Exclusive again: plain edits no longer clear.
    list.set(11, -2).expect("within bounds");
    assert_eq!(
        recorder.borrow().count_of(&Event::RootChanged {
            present: true,
            cleared: true
        }),
        1
    );
}

#[rstest]
fn test_clear_reports_drop_and_walkout() {
    let mut list: AList<i64> = (1..=10).collect();
    let recorder = Recorder::shared();
    list.add_observer(recorder.clone()).expect("fresh observer");
    list.clear();
    let recorder = recorder.borrow();
    assert_eq!(
        recorder.count_of(&Event::RootChanged {
            present: false,
            cleared: true
        }),
        1
    );
    for value in 1..=10 {
        assert_eq!(recorder.count_of(&Event::ItemRemoved(value)), 1);
    }
    assert_eq!(recorder.events.last(), Some(&Event::CheckPoint(0)));
}

#[rstest]
fn test_failed_operations_fire_no_events() {
    let mut list: AList<i64> = (1..=5).collect();
    let recorder = Recorder::shared();
    list.add_observer(recorder.clone()).expect("fresh observer");
    let baseline = recorder.borrow().events.len();
    assert!(list.set(5, 0).is_err());
    assert!(list.remove_at(9).is_err());
    assert!(list.insert(7, 0).is_err());
    assert_eq!(recorder.borrow().events.len(), baseline);
}

#[rstest]
fn test_snapshot_carries_no_observers() {
    let mut list: AList<i64> = (1..=5).collect();
    let recorder = Recorder::shared();
    list.add_observer(recorder.clone()).expect("fresh observer");
    let mut snapshot = list.clone();
    let baseline = recorder.borrow().events.len();
    snapshot.push(6);
    snapshot.remove_at(0).expect("within bounds");
    assert_eq!(recorder.borrow().events.len(), baseline);
}

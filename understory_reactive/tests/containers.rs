// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reactive lists and dicts, and how their changes reach owning properties.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_reactive::{
    Callback, CallbackDict, CallbackList, ContainerKind, DeliveryMode, PropertyError,
    PropertyMetadata, PropertyMetadataBuilder, PropertyRegistry, ReactiveObject, Value,
};

fn registry() -> Rc<PropertyRegistry> {
    let mut registry = PropertyRegistry::new();
    registry.register("items", PropertyMetadataBuilder::list().build());
    registry.register("table", PropertyMetadataBuilder::dict().build());
    registry.register("scalar", PropertyMetadata::new(0));
    Rc::new(registry)
}

fn watch(object: &ReactiveObject, name: &str) -> Rc<Cell<u32>> {
    let hits = Rc::new(Cell::new(0));
    let counter = hits.clone();
    object
        .add_observer(
            name,
            Callback::new(move |_| counter.set(counter.get() + 1)),
            0,
            DeliveryMode::VALUE,
        )
        .unwrap();
    hits
}

fn watch_list(list: &CallbackList) -> Rc<Cell<u32>> {
    let hits = Rc::new(Cell::new(0));
    let counter = hits.clone();
    list.add_callback(Callback::new(move |_| counter.set(counter.get() + 1)), 0)
        .unwrap();
    hits
}

#[test]
fn list_defaults_are_fresh_per_instance() {
    let registry = registry();
    let first = ReactiveObject::new(&registry);
    let second = ReactiveObject::new(&registry);
    let a = first.get("items").unwrap();
    let b = second.get("items").unwrap();
    assert!(!a.same_handle(&b));
    a.as_list().unwrap().append(1);
    assert_eq!(b.as_list().unwrap().len(), 0);
}

#[test]
fn every_list_mutation_notifies_the_property() {
    let object = ReactiveObject::new(&registry());
    let hits = watch(&object, "items");
    let value = object.get("items").unwrap();
    let list = value.as_list().unwrap();

    list.append(3);
    list.extend([Value::Int(1), Value::Int(2)]);
    list.insert(0, 9);
    list.sort();
    list.reverse();
    assert_eq!(list.pop(), Some(Value::Int(1)));
    assert!(list.remove(&Value::Int(9)));
    list.set(0, 7).unwrap();
    list.set_slice(0..1, [Value::Int(5), Value::Int(6)]);
    assert_eq!(list.pop_at(0), Ok(Value::Int(5)));
    list.clear();
    assert_eq!(hits.get(), 11);

    // Misses change nothing and stay quiet.
    assert_eq!(list.pop(), None);
    assert!(!list.remove(&Value::Int(1)));
    assert_eq!(
        list.pop_at(4),
        Err(PropertyError::IndexOutOfRange { index: 4, len: 0 })
    );
    assert_eq!(hits.get(), 11);
}

#[test]
fn dict_mutations_notify_the_property() {
    let object = ReactiveObject::new(&registry());
    let hits = watch(&object, "table");
    let value = object.get("table").unwrap();
    let dict = value.as_dict().unwrap();
    dict.insert("a", 1);
    dict.update([("b", Value::Int(2)), ("c", Value::Int(3))]);
    dict.pop("a");
    dict.popitem();
    dict.clear();
    assert_eq!(hits.get(), 5);
}

#[test]
fn assignment_rewraps_and_notifies_on_content_change() {
    let object = ReactiveObject::new(&registry());
    let hits = watch(&object, "items");
    let owner = Value::Object(object.clone());
    let old = object.get("items").unwrap();

    let raw = CallbackList::from_iter([Value::Int(1), Value::Int(2)]);
    object.set("items", raw.clone()).unwrap();
    assert_eq!(hits.get(), 1);

    // Same content again: no notification.
    object.set("items", Value::list([Value::Int(1), Value::Int(2)])).unwrap();
    assert_eq!(hits.get(), 1);

    // Mutating the old wrapper or the caller's list no longer reaches the
    // property.
    old.as_list().unwrap().append(0);
    raw.append(3);
    assert_eq!(hits.get(), 1);
    assert_eq!(old.link_count(&owner), 0);
    assert_eq!(Value::List(raw).link_count(&owner), 0);

    let current = object.get("items").unwrap();
    assert_eq!(current.link_count(&owner), 1);
    current.as_list().unwrap().append(3);
    assert_eq!(hits.get(), 2);
}

#[test]
fn wrong_container_type_is_rejected_before_mutation() {
    let object = ReactiveObject::new(&registry());
    object.set("items", Value::list([Value::Int(1)])).unwrap();
    assert_eq!(
        object.set("items", Value::dict([("a", Value::Int(1))])),
        Err(PropertyError::WrongContainerType {
            name: "items".into(),
            expected: ContainerKind::List,
        })
    );
    assert_eq!(
        object.set("table", Value::None),
        Err(PropertyError::WrongContainerType {
            name: "table".into(),
            expected: ContainerKind::Dict,
        })
    );
    assert_eq!(object.get("items").unwrap(), Value::list([Value::Int(1)]));
    assert_eq!(
        PropertyError::WrongContainerType {
            name: "items".into(),
            expected: ContainerKind::List,
        }
        .to_string(),
        "callback property should be a list"
    );
}

#[test]
fn nested_containers_bubble_to_the_property() {
    let object = ReactiveObject::new(&registry());
    let hits = watch(&object, "items");
    let inner = CallbackDict::new();
    let deepest = CallbackList::new();
    inner.insert("values", deepest.clone());

    let value = object.get("items").unwrap();
    let list = value.as_list().unwrap();
    list.append(inner.clone());
    assert_eq!(hits.get(), 1);

    deepest.append(1);
    assert_eq!(hits.get(), 2);
    inner.insert("other", 2);
    assert_eq!(hits.get(), 3);

    // Removing the dict severs the path.
    list.clear();
    assert_eq!(hits.get(), 4);
    deepest.append(2);
    assert_eq!(hits.get(), 4);
}

#[test]
fn bubble_edges_track_membership() {
    let outer = CallbackList::new();
    let outer_value = Value::List(outer.clone());
    let a = Value::list([]);
    let b = Value::dict::<&str>([]);

    outer.extend([a.clone(), b.clone(), Value::Int(1)]);
    assert_eq!(a.link_count(&outer_value), 1);
    assert_eq!(b.link_count(&outer_value), 1);

    // Overwrite.
    outer.set(0, 5).unwrap();
    assert_eq!(a.link_count(&outer_value), 0);

    // Slice replace.
    outer.set_slice(1..3, [a.clone()]);
    assert_eq!(b.link_count(&outer_value), 0);
    assert_eq!(a.link_count(&outer_value), 1);

    // The same element twice holds one edge until both are gone.
    outer.append(a.clone());
    assert_eq!(a.link_count(&outer_value), 1);
    assert!(outer.remove(&a));
    assert_eq!(a.link_count(&outer_value), 1);
    assert_eq!(outer.pop(), Some(a.clone()));
    assert_eq!(a.link_count(&outer_value), 0);
}

#[test]
fn objects_inside_containers_bubble() {
    let registry = registry();
    let child = ReactiveObject::new(&registry);
    let child_value = Value::Object(child.clone());
    let list = CallbackList::new();
    let list_value = Value::List(list.clone());
    let hits = watch_list(&list);

    list.append(child.clone());
    assert_eq!(hits.get(), 1);
    assert_eq!(child_value.link_count(&list_value), 1);
    assert_eq!(child.global_observer_count(), 0);

    child.set("scalar", 5).unwrap();
    assert_eq!(hits.get(), 2);
    // Mutating a list property of the child reaches the outer list too.
    child.get("items").unwrap().as_list().unwrap().append(1);
    assert_eq!(hits.get(), 3);

    assert_eq!(list.pop(), Some(child_value.clone()));
    assert_eq!(hits.get(), 4);
    assert_eq!(child_value.link_count(&list_value), 0);
    child.set("scalar", 6).unwrap();
    assert_eq!(hits.get(), 4);
}

#[test]
fn scalar_properties_do_not_bubble() {
    let object = ReactiveObject::new(&registry());
    let hits = watch(&object, "scalar");
    let list = CallbackList::new();
    object.set("scalar", list.clone()).unwrap();
    assert_eq!(hits.get(), 1);
    list.append(1);
    assert_eq!(hits.get(), 1);
}

#[test]
fn delayed_in_place_mutation_fires_once() {
    let object = ReactiveObject::new(&registry());
    let hits = watch(&object, "items");
    let value = object.get("items").unwrap();
    {
        let _delay = object.delay(&["items"]).unwrap();
        let list = value.as_list().unwrap();
        list.append(1);
        list.append(2);
        assert_eq!(hits.get(), 0);
    }
    assert_eq!(hits.get(), 1);
}

#[test]
fn ignored_in_place_mutation_is_dropped() {
    let object = ReactiveObject::new(&registry());
    let hits = watch(&object, "items");
    let value = object.get("items").unwrap();
    object
        .with_ignore(&["items"], |_| {
            value.as_list().unwrap().append(1);
            Ok::<_, PropertyError>(())
        })
        .unwrap();
    assert_eq!(hits.get(), 0);
    assert_eq!(value.as_list().unwrap().len(), 1);
}

#[test]
fn self_containing_list_does_not_recurse() {
    let list = CallbackList::new();
    let hits = watch_list(&list);
    list.append(list.clone());
    assert_eq!(hits.get(), 1);
    // Break the cycle so the allocation is freed.
    list.clear();
    assert_eq!(hits.get(), 2);
}

#[test]
fn mutual_containment_notifies_each_list_once() {
    let a = CallbackList::new();
    let b = CallbackList::new();
    a.append(b.clone());
    b.append(a.clone());
    let a_hits = watch_list(&a);
    let b_hits = watch_list(&b);

    a.append(1);
    assert_eq!((a_hits.get(), b_hits.get()), (1, 1));
    b.append(2);
    assert_eq!((a_hits.get(), b_hits.get()), (2, 2));

    a.clear();
    b.clear();
}

#[test]
fn mutations_made_by_observers_reach_every_observer() {
    let list = CallbackList::new();
    let lens = Rc::new(RefCell::new(Vec::new()));
    let log = lens.clone();
    list.add_callback(
        Callback::new(move |n| log.borrow_mut().push(n.value().as_list().unwrap().len())),
        0,
    )
    .unwrap();
    list.add_callback(
        Callback::new(|n| {
            let list = n.value().as_list().unwrap();
            if list.len() == 1 {
                list.append(0);
            }
        }),
        0,
    )
    .unwrap();

    list.append(1);
    assert_eq!(*lens.borrow(), [1, 2]);
    assert_eq!(list.len(), 2);
}

#[test]
fn observer_mutations_reach_the_owning_property() {
    let object = ReactiveObject::new(&registry());
    let hits = watch(&object, "items");
    let value = object.get("items").unwrap();
    let list = value.as_list().unwrap();
    list.add_callback(
        Callback::new(|n| {
            let list = n.value().as_list().unwrap();
            if list.len() == 1 {
                list.append(2);
            }
        }),
        0,
    )
    .unwrap();

    list.append(1);
    assert_eq!(hits.get(), 2);
}

#[test]
fn container_callbacks_are_independent() {
    let list = CallbackList::new();
    let first = watch_list(&list);
    let second = watch_list(&list);
    list.append(1);
    assert_eq!((first.get(), second.get()), (1, 1));
    assert_eq!(list.callback_count(), 2);
}

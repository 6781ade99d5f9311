// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property reads, writes, dispatch and batching.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_reactive::{
    Callback, DeliveryMode, Notification, PropertyError, PropertyMetadata,
    PropertyMetadataBuilder, PropertyRegistry, ReactiveObject, Value,
};

fn registry() -> Rc<PropertyRegistry> {
    let mut registry = PropertyRegistry::new();
    registry.register("a", PropertyMetadata::new(1));
    registry.register("b", PropertyMetadata::new("x"));
    registry.register(
        "positive",
        PropertyMetadataBuilder::new(1)
            .validator(|v| match v.as_float() {
                Some(f) if f > 0.0 => Ok(v.clone()),
                _ => Err(PropertyError::validation("must be positive")),
            })
            .coerce(|v| match v {
                Value::Int(i) => Value::Float(i as f64),
                other => other,
            })
            .doc("A strictly positive number")
            .build(),
    );
    registry.register_plain("plain");
    Rc::new(registry)
}

fn counter() -> (Callback, Rc<Cell<u32>>) {
    let hits = Rc::new(Cell::new(0));
    let inner = hits.clone();
    (Callback::new(move |_| inner.set(inner.get() + 1)), hits)
}

fn observed(name: &str) -> (ReactiveObject, Rc<Cell<u32>>) {
    let object = ReactiveObject::new(&registry());
    let (cb, hits) = counter();
    object.add_observer(name, cb, 0, DeliveryMode::VALUE).unwrap();
    (object, hits)
}

#[test]
fn unchanged_values_never_notify() {
    let (object, hits) = observed("a");
    object.set("a", 1).unwrap();
    object.set("a", 1.0).unwrap();
    assert_eq!(hits.get(), 0);
    object.set("a", 2).unwrap();
    object.set("a", 2).unwrap();
    assert_eq!(hits.get(), 1);
}

#[test]
fn payload_follows_delivery_mode() {
    let object = ReactiveObject::new(&registry());
    let seen = Rc::new(RefCell::new(Vec::new()));
    for mode in [
        DeliveryMode::VALUE,
        DeliveryMode::ECHO_OLD,
        DeliveryMode::ECHO_NAME,
        DeliveryMode::ECHO_OLD | DeliveryMode::ECHO_NAME,
    ] {
        let seen = seen.clone();
        object
            .add_observer(
                "b",
                Callback::new(move |n: &Notification<'_>| {
                    seen.borrow_mut().push((
                        n.name().map(String::from),
                        n.old().cloned(),
                        n.value().clone(),
                    ));
                }),
                0,
                mode,
            )
            .unwrap();
    }

    object.set("b", "y").unwrap();
    let x = Value::from("x");
    let y = Value::from("y");
    assert_eq!(
        *seen.borrow(),
        [
            (None, None, y.clone()),
            (None, Some(x.clone()), y.clone()),
            (Some("b".to_owned()), None, y.clone()),
            (Some("b".to_owned()), Some(x), y),
        ]
    );
}

#[test]
fn priority_order() {
    let object = ReactiveObject::new(&registry());
    let order = Rc::new(RefCell::new(Vec::new()));
    for (tag, priority) in [("first", 0), ("high", 5), ("second", 0)] {
        let order = order.clone();
        object
            .add_observer(
                "a",
                Callback::new(move |_| order.borrow_mut().push(tag)),
                priority,
                DeliveryMode::VALUE,
            )
            .unwrap();
    }
    object.set("a", 2).unwrap();
    assert_eq!(*order.borrow(), ["high", "first", "second"]);
}

#[test]
fn duplicate_registration_fires_once() {
    let object = ReactiveObject::new(&registry());
    let (cb, hits) = counter();
    assert!(object.add_observer("a", cb.clone(), 0, DeliveryMode::VALUE).unwrap());
    assert!(!object.add_observer("a", cb.clone(), 0, DeliveryMode::VALUE).unwrap());
    assert_eq!(object.observer_count("a"), Ok(1));
    object.set("a", 2).unwrap();
    assert_eq!(hits.get(), 1);

    object.remove_observer("a", &cb).unwrap();
    assert_eq!(object.has_observer("a", &cb), Ok(false));
    object.set("a", 3).unwrap();
    assert_eq!(hits.get(), 1);
}

#[test]
fn wildcard_observer() {
    let object = ReactiveObject::new(&registry());
    let names = Rc::new(RefCell::new(Vec::new()));
    let log = names.clone();
    let cb = Callback::new(move |n| log.borrow_mut().push(n.name().map(String::from)));
    assert!(object.add_observer("*", cb.clone(), 0, DeliveryMode::VALUE).unwrap());
    assert!(object.has_observer("a", &cb).unwrap());

    object.set("a", 5).unwrap();
    object.set("b", "z").unwrap();
    assert_eq!(*names.borrow(), [Some("a".to_owned()), Some("b".to_owned())]);

    object.remove_observer("*", &cb).unwrap();
    object.set("a", 6).unwrap();
    assert_eq!(names.borrow().len(), 2);
    assert!(matches!(
        object.remove_observer("*", &cb),
        Err(PropertyError::CallbackNotFound { .. })
    ));
}

#[test]
fn delay_coalesces_to_final_value() {
    let object = ReactiveObject::new(&registry());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    object
        .add_observer(
            "a",
            Callback::new(move |n| log.borrow_mut().push((n.old().cloned(), n.value().clone()))),
            0,
            DeliveryMode::ECHO_OLD,
        )
        .unwrap();

    {
        let _delay = object.delay(&["a"]).unwrap();
        for v in 2..6 {
            object.set("a", v).unwrap();
        }
        assert!(seen.borrow().is_empty());
    }
    assert_eq!(*seen.borrow(), [(Some(Value::Int(1)), Value::Int(5))]);
}

#[test]
fn delay_back_to_starting_value_does_not_fire() {
    let (object, hits) = observed("a");
    {
        let _delay = object.delay(&["a"]).unwrap();
        object.set("a", 7).unwrap();
        object.set("a", 1).unwrap();
    }
    assert_eq!(hits.get(), 0);
}

#[test]
fn nested_delays_flush_once_at_outermost_exit() {
    let (object, hits) = observed("a");
    {
        let _outer = object.delay(&["a", "b"]).unwrap();
        {
            let _inner = object.delay(&["a"]).unwrap();
            object.set("a", 2).unwrap();
            {
                let _innermost = object.delay(&["a"]).unwrap();
                object.set("a", 3).unwrap();
            }
            assert_eq!(hits.get(), 0);
        }
        object.set("a", 4).unwrap();
        assert_eq!(hits.get(), 0);
    }
    assert_eq!(hits.get(), 1);
}

#[test]
fn ignore_drops_notifications() {
    let (object, hits) = observed("a");
    {
        let _ignore = object.ignore(&["a"]).unwrap();
        object.set("a", 2).unwrap();
        object.set("a", 3).unwrap();
    }
    assert_eq!(hits.get(), 0);
    assert_eq!(object.get("a"), Ok(Value::Int(3)));
    object.set("a", 4).unwrap();
    assert_eq!(hits.get(), 1);
}

#[test]
fn batching_is_per_object() {
    let registry = registry();
    let first = ReactiveObject::new(&registry);
    let second = ReactiveObject::new(&registry);
    let (cb, hits) = counter();
    first.add_observer("a", cb.clone(), 0, DeliveryMode::VALUE).unwrap();
    second.add_observer("a", cb, 0, DeliveryMode::VALUE).unwrap();

    let _delay = first.delay(&["a"]).unwrap();
    first.set("a", 2).unwrap();
    second.set("a", 2).unwrap();
    assert_eq!(hits.get(), 1);
}

#[test]
fn name_resolution_errors() {
    let object = ReactiveObject::new(&registry());
    let (cb, _) = counter();

    let unknown = PropertyError::UnknownAttribute { name: "missing".into() };
    assert_eq!(object.get("missing"), Err(unknown.clone()));
    assert_eq!(
        object.add_observer("missing", cb.clone(), 0, DeliveryMode::VALUE),
        Err(unknown.clone())
    );
    assert_eq!(object.delay(&["missing"]).map(|_| ()), Err(unknown));

    let plain = PropertyError::NotCallbackProperty { name: "plain".into() };
    assert_eq!(object.remove_observer("plain", &cb), Err(plain.clone()));
    assert_eq!(object.ignore(&["plain"]).map(|_| ()), Err(plain.clone()));
    assert_eq!(plain.to_string(), "plain is not a callback property");

    let err = object.remove_observer("a", &cb).unwrap_err();
    assert!(matches!(err, PropertyError::CallbackNotFound { ref name, .. } if name == "a"));
    assert!(err.to_string().starts_with("Callback function not found: "));
}

#[test]
fn failed_validation_leaves_value_unchanged() {
    let (object, hits) = observed("positive");
    object.set("positive", 3).unwrap();
    assert_eq!(object.get("positive"), Ok(Value::Float(3.0)));
    assert_eq!(hits.get(), 1);

    assert_eq!(
        object.set("positive", -1),
        Err(PropertyError::validation("must be positive"))
    );
    assert_eq!(object.get("positive"), Ok(Value::Float(3.0)));
    assert_eq!(hits.get(), 1);

    let doc = object.registry().property("positive").and_then(|p| p.doc());
    assert_eq!(doc, Some("A strictly positive number"));
}

struct View {
    hits: Cell<u32>,
}

impl View {
    fn on_change(&self, _: &Notification<'_>) {
        self.hits.set(self.hits.get() + 1);
    }
}

#[test]
fn method_observers_do_not_keep_receiver_alive() {
    let object = ReactiveObject::new(&registry());
    let view = Rc::new(View { hits: Cell::new(0) });
    object
        .add_observer("a", Callback::method(&view, View::on_change), 0, DeliveryMode::VALUE)
        .unwrap();
    object.set("a", 2).unwrap();
    assert_eq!(view.hits.get(), 1);
    assert_eq!(Rc::strong_count(&view), 1);

    let weak = Rc::downgrade(&view);
    drop(view);
    assert!(weak.upgrade().is_none());
    assert_eq!(object.observer_count("a"), Ok(0));
    // Still dispatches without error after the receiver is gone.
    object.set("a", 3).unwrap();
}

#[test]
fn method_removal_matches_receiver_and_function() {
    let object = ReactiveObject::new(&registry());
    let view = Rc::new(View { hits: Cell::new(0) });
    object
        .add_observer("a", Callback::method(&view, View::on_change), 0, DeliveryMode::VALUE)
        .unwrap();
    object
        .add_observer("a", Callback::method(&view, View::on_change), 3, DeliveryMode::VALUE)
        .unwrap();
    assert_eq!(object.observer_count("a"), Ok(2));
    object
        .remove_observer("a", &Callback::method(&view, View::on_change))
        .unwrap();
    assert_eq!(object.observer_count("a"), Ok(0));
}

struct Tagger {
    tags: RefCell<Vec<&'static str>>,
}

impl Tagger {
    fn tag_a(&self, _: &Notification<'_>) {
        self.tags.borrow_mut().push("a");
    }

    fn tag_b(&self, _: &Notification<'_>) {
        self.tags.borrow_mut().push("b");
    }
}

#[test]
fn distinct_methods_on_one_receiver_are_distinct_observers() {
    let object = ReactiveObject::new(&registry());
    let tagger = Rc::new(Tagger {
        tags: RefCell::new(Vec::new()),
    });
    let added: Vec<bool> = [Tagger::tag_a, Tagger::tag_b]
        .into_iter()
        .map(|f| {
            object
                .add_observer("a", Callback::method(&tagger, f), 0, DeliveryMode::VALUE)
                .unwrap()
        })
        .collect();
    assert_eq!(added, [true, true]);
    // The same function again is a duplicate.
    assert!(
        !object
            .add_observer("a", Callback::method(&tagger, Tagger::tag_a), 0, DeliveryMode::VALUE)
            .unwrap()
    );

    object.set("a", 2).unwrap();
    assert_eq!(*tagger.tags.borrow(), ["a", "b"]);
}

#[test]
fn dead_method_observer_is_rejected() {
    let view = Rc::new(View { hits: Cell::new(0) });
    let weak = Rc::downgrade(&view);
    drop(view);
    assert_eq!(
        Callback::from_weak(&weak, View::on_change).map(|_| ()),
        Err(PropertyError::NotCallable)
    );
}

#[test]
fn introspection() {
    let object = ReactiveObject::new(&registry());
    assert!(object.is_callback_property("a"));
    assert!(!object.is_callback_property("plain"));
    assert!(!object.is_alias("a"));
    assert_eq!(object.callback_properties(), ["a", "b", "positive"]);
    let values: Vec<_> = object.iter_callback_properties().collect();
    assert_eq!(
        values,
        [
            ("a", Value::Int(1)),
            ("b", Value::from("x")),
            ("positive", Value::Int(1)),
        ]
    );
}

#[test]
fn factory_defaults_are_per_instance() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut registry = PropertyRegistry::new();
    registry.register(
        "n",
        PropertyMetadataBuilder::new(Value::None)
            .factory(move || {
                counter.set(counter.get() + 1);
                Value::Int(i64::from(counter.get()))
            })
            .build(),
    );
    let registry = Rc::new(registry);
    let first = ReactiveObject::new(&registry);
    let second = ReactiveObject::new(&registry);
    assert_eq!(first.get("n"), Ok(Value::Int(1)));
    assert_eq!(first.get("n"), Ok(Value::Int(1)));
    assert_eq!(second.get("n"), Ok(Value::Int(2)));
    assert_eq!(calls.get(), 2);
}

#[cfg(feature = "std")]
#[test]
fn panic_inside_delay_discards_held_notifications() {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    let (object, hits) = observed("a");
    let result = catch_unwind(AssertUnwindSafe(|| {
        let _delay = object.delay(&["a"]).unwrap();
        object.set("a", 2).unwrap();
        panic!("failed inside a delay scope");
    }));
    assert!(result.is_err());
    assert_eq!(hits.get(), 0);
    assert_eq!(object.get("a"), Ok(Value::Int(2)));

    // The scope was fully unwound, so later writes notify right away.
    object.set("a", 3).unwrap();
    assert_eq!(hits.get(), 1);
}

fn doubled() -> ReactiveObject {
    let mut registry = PropertyRegistry::new();
    registry.register("val", PropertyMetadata::new(1));
    registry.register(
        "prop",
        PropertyMetadataBuilder::computed(
            |o| {
                let val = o.get("val").ok().and_then(|v| v.as_int()).unwrap_or(0);
                Value::Int(val * 2)
            },
            |o, v| o.set("val", v),
        )
        .build(),
    );
    ReactiveObject::new(&Rc::new(registry))
}

#[test]
fn computed_property_reads_through_getter_and_notifies_on_set() {
    let object = doubled();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    object
        .add_observer(
            "prop",
            Callback::new(move |n| log.borrow_mut().push(n.value().clone())),
            0,
            DeliveryMode::VALUE,
        )
        .unwrap();

    assert_eq!(object.get("prop"), Ok(Value::Int(2)));
    object.set("prop", 5).unwrap();
    assert_eq!(*seen.borrow(), [Value::Int(10)]);
    assert_eq!(object.get("prop"), Ok(Value::Int(10)));

    // A write that leaves the getter's result alone stays quiet.
    object.set("prop", 5).unwrap();
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn computed_property_respects_batching_and_validation() {
    let object = doubled();
    let (cb, hits) = counter();
    object.add_observer("prop", cb, 0, DeliveryMode::VALUE).unwrap();

    {
        let _delay = object.delay(&["prop"]).unwrap();
        object.set("prop", 3).unwrap();
        object.set("prop", 4).unwrap();
        assert_eq!(hits.get(), 0);
    }
    assert_eq!(hits.get(), 1);

    object
        .with_ignore(&["prop"], |o| o.set("prop", 6))
        .unwrap();
    object.disable("prop").unwrap();
    object.set("prop", 7).unwrap();
    object.enable("prop").unwrap();
    assert_eq!(hits.get(), 1);
    assert_eq!(object.get("prop"), Ok(Value::Int(14)));

    object
        .add_validator(
            "prop",
            |v| match v.as_int() {
                Some(i) if i < 100 => Ok(v.clone()),
                _ => Err(PropertyError::validation("too large")),
            },
            0,
        )
        .unwrap();
    assert!(object.set("prop", 100).is_err());
    assert_eq!(object.get("val"), Ok(Value::Int(7)));
    assert_eq!(hits.get(), 1);
}

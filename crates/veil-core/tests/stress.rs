//! Stress tests for veil-core
//!
//! These tests exercise the discovery cache and views under concurrent
//! access from many threads.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

use veil_core::{Class, DiscoveryCache, Object, Value, ViewOptions, create_view_with_cache};

fn make_class(index: usize) -> Arc<Class> {
    Class::builder(format!("Shape{}", index))
        .field("width")
        .field("height")
        .field_with("_revision", 0)
        .getter("area", |o| {
            let w = o.field("width").and_then(|v| v.as_int()).unwrap_or(0);
            let h = o.field("height").and_then(|v| v.as_int()).unwrap_or(0);
            Value::Int(w * h)
        })
        .build()
}

#[test]
fn test_concurrent_cache_population() {
    const NUM_THREADS: usize = 32;
    const NUM_CLASSES: usize = 8;
    const ITERATIONS: usize = 200;

    let cache = Arc::new(DiscoveryCache::new());
    let classes: Arc<Vec<Arc<Class>>> = Arc::new((0..NUM_CLASSES).map(make_class).collect());
    let barrier = Arc::new(Barrier::new(NUM_THREADS));
    let mut handles = vec![];

    let start = Instant::now();

    for thread_id in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        let classes = Arc::clone(&classes);
        let barrier = Arc::clone(&barrier);

        handles.push(thread::spawn(move || {
            barrier.wait();

            for i in 0..ITERATIONS {
                let class = &classes[(thread_id + i) % NUM_CLASSES];
                let options = ViewOptions::default().with_allow_protected_field(i % 2 == 0);
                let obj = Object::new(class);
                let view = create_view_with_cache(&cache, &obj, Some(options));

                let expected = if options.allow_protected_field { 4 } else { 3 };
                assert_eq!(view.list_fields().len(), expected);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let elapsed = start.elapsed();
    println!(
        "Created {} views across {} threads in {:?}",
        NUM_THREADS * ITERATIONS,
        NUM_THREADS,
        elapsed
    );

    // One entry per (class, options) pair
    assert_eq!(cache.len(), NUM_CLASSES * 2);
}

#[test]
fn test_concurrent_views_over_shared_instance() {
    const NUM_THREADS: usize = 16;

    let class = make_class(100);
    let obj = Object::new(&class);
    let cache = DiscoveryCache::new();
    let barrier = Barrier::new(NUM_THREADS);

    thread::scope(|scope| {
        for thread_id in 0..NUM_THREADS {
            let obj = &obj;
            let cache = &cache;
            let barrier = &barrier;

            scope.spawn(move || {
                let view = create_view_with_cache(cache, obj, None);
                barrier.wait();

                view.set("width", thread_id as i64).unwrap();
                view.set("_revision", thread_id as i64).unwrap();

                let width = view.get("width").unwrap();
                assert!(width.as_int().is_some());
                assert_eq!(view.get("_revision").unwrap(), Value::Undefined);
            });
        }
    });

    // Protected writes were all dropped
    assert_eq!(obj.field("_revision"), Some(Value::Int(0)));
    assert_eq!(cache.len(), 1);
}

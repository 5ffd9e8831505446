use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc, Arc, Barrier,
    },
    time::Duration,
};

use wireup_di::{
    Binding, DependencyGraphError, DependencyInfo, DiBuilder, DiContainer, DiHandle, DuplicatePolicy,
    DynError, InitError, InstanceFactory, Key, Lazy, RequireError, Resolver,
};

#[derive(Debug, PartialEq)]
struct Config {
    name: &'static str,
}

struct Service {
    config: Arc<Config>,
}

struct ServiceFactory;
impl InstanceFactory for ServiceFactory {
    type Provides = Service;

    fn get_dependencies() -> Vec<DependencyInfo> {
        vec![Arc::<Config>::dependency_info()]
    }

    fn construct(&self, di: &DiHandle<'_>) -> Result<Self::Provides, RequireError> {
        Ok(Service {
            config: di.resolve()?,
        })
    }
}

fn container_with(name: &'static str) -> DiContainer {
    DiBuilder::new()
        .label(name)
        .add_instance(Config { name })
        .build()
        .unwrap()
}

#[test]
fn scoped_binding_yields_identical_instance() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let container = DiBuilder::new()
        .add_scoped_provider(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, DynError>(String::from("scoped"))
        })
        .build()
        .unwrap();

    let first = container.require::<String>().unwrap();
    for _ in 0..10 {
        assert!(Arc::ptr_eq(&first, &container.require::<String>().unwrap()));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn unscoped_binding_calls_provider_each_time() {
    let container = DiBuilder::new()
        .add_provider(|_| Ok::<_, DynError>(String::from("transient")))
        .build()
        .unwrap();

    let first = container.require::<String>().unwrap();
    let second = container.require::<String>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(container.constructed_count(), 0);
}

#[test]
fn concurrent_resolution_runs_provider_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let container = DiBuilder::new()
        .add_scoped_provider(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(25));
            Ok::<_, DynError>(vec![1_u8, 2, 3])
        })
        .build()
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let container = container.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                container.require::<Vec<u8>>().unwrap()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&results[0], &results[1]));
}

#[test]
fn lazy_cycle_across_threads_fails_instead_of_deadlocking() {
    struct Front;
    struct Back;

    let barrier = Arc::new(Barrier::new(2));
    let front_first = Arc::new(AtomicBool::new(true));
    let back_first = Arc::new(AtomicBool::new(true));

    let front_barrier = barrier.clone();
    let back_barrier = barrier.clone();
    let container = DiBuilder::new()
        .add_binding(
            Binding::provider(move |di| {
                let back: Lazy<Back> = di.resolve()?;
                if front_first.swap(false, Ordering::SeqCst) {
                    front_barrier.wait();
                }
                back.get()?;
                Ok::<_, RequireError>(Front)
            })
            .scoped()
            .depends_on(Lazy::<Back>::dependency_info()),
        )
        .add_binding(
            Binding::provider(move |di| {
                if back_first.swap(false, Ordering::SeqCst) {
                    back_barrier.wait();
                }
                di.require::<Front>()?;
                Ok::<_, RequireError>(Back)
            })
            .scoped()
            .depends_on(Arc::<Front>::dependency_info()),
        )
        .build()
        .unwrap();

    // Both providers are running before either one needs the other
    let (tx, rx) = mpsc::channel();
    let front = container.clone();
    let front_tx = tx.clone();
    std::thread::spawn(move || {
        front_tx.send(front.require::<Front>().map(|_| ())).unwrap();
    });
    let back = container.clone();
    std::thread::spawn(move || {
        tx.send(back.require::<Back>().map(|_| ())).unwrap();
    });

    for _ in 0..2 {
        let result = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("resolution deadlocked");
        let Err(err) = result else {
            panic!("cyclic resolution succeeded");
        };
        assert!(err.to_string().contains("being constructed"), "{err}");
    }
    assert_eq!(container.constructed_count(), 0);
}

#[test]
fn factory_resolves_dependencies() {
    let container = DiBuilder::new()
        .add_instance(Config { name: "root" })
        .add_factory(ServiceFactory)
        .build()
        .unwrap();

    let service = container.require::<Service>().unwrap();
    assert_eq!(service.config.name, "root");
    // Factories are scoped unless they say otherwise
    assert!(Arc::ptr_eq(&service, &container.require::<Service>().unwrap()));
}

#[test]
fn missing_dependency_fails_at_link_time() {
    let result = DiBuilder::new().add_factory(ServiceFactory).build();

    let Err(InitError::DependencyGraphError(errors)) = result else {
        panic!("expected link failure");
    };
    assert_eq!(
        errors.errors,
        vec![DependencyGraphError::MissingBinding {
            dependency: Key::of::<Config>(),
            required_by: Some(Key::of::<Service>()),
        }]
    );
}

#[test]
fn missing_key_at_resolution() {
    let container = DiBuilder::new().build().unwrap();

    assert!(matches!(
        container.require::<Config>(),
        Err(RequireError::MissingBinding(key)) if key == Key::of::<Config>()
    ));
}

#[test]
fn cycle_fails_at_link_time() {
    struct A;
    struct B;

    let result = DiBuilder::new()
        .add_binding(
            Binding::provider(|_| Ok::<_, DynError>(A)).depends_on(DependencyInfo::required(Key::of::<B>())),
        )
        .add_binding(
            Binding::provider(|_| Ok::<_, DynError>(B)).depends_on(DependencyInfo::required(Key::of::<A>())),
        )
        .build();

    let Err(InitError::DependencyGraphError(errors)) = result else {
        panic!("expected link failure");
    };
    assert!(matches!(
        errors.errors.as_slice(),
        [DependencyGraphError::CyclicDependency { .. }]
    ));
}

#[test]
fn child_binding_shadows_parent() {
    let parent = container_with("parent");
    let child = parent
        .child()
        .add_instance(Config { name: "child" })
        .build()
        .unwrap();

    assert_eq!(child.require::<Config>().unwrap().name, "child");
    assert_eq!(parent.require::<Config>().unwrap().name, "parent");
    assert!(child.lookup(&Key::of::<Config>()).is_some());
}

#[test]
fn inherited_scoped_binding_is_owned_by_parent() {
    let parent = DiBuilder::new()
        .add_instance(Config { name: "parent" })
        .add_factory(ServiceFactory)
        .build()
        .unwrap();
    let first_child = parent
        .child()
        .add_instance(Config { name: "ignored by parent bindings" })
        .build()
        .unwrap();
    let second_child = parent.child().build().unwrap();

    let from_first = first_child.require::<Service>().unwrap();
    let from_second = second_child.require::<Service>().unwrap();

    // The parent's binding sees the parent's graph, and its value lives in the parent
    assert_eq!(from_first.config.name, "parent");
    assert!(Arc::ptr_eq(&from_first, &from_second));
    assert_eq!(parent.constructed_count(), 1);
    assert_eq!(first_child.constructed_count(), 0);
}

#[test]
fn child_scoped_values_are_per_container() {
    let parent = container_with("parent");
    let build_child = || {
        parent
            .child()
            .add_factory(ServiceFactory)
            .build()
            .unwrap()
    };
    let first = build_child();
    let second = build_child();

    let a = first.require::<Service>().unwrap();
    let b = second.require::<Service>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a.config, &b.config));
}

#[test]
fn sibling_parents_conflict_at_link_time() {
    let left = container_with("left");
    let right = container_with("right");

    let result = DiBuilder::new().with_parent(left).with_parent(right).build();

    let Err(InitError::DependencyGraphError(errors)) = result else {
        panic!("expected a conflict");
    };
    let [DependencyGraphError::ConflictingBinding { key, containers }] = errors.errors.as_slice() else {
        panic!("expected a single conflict, got {errors}");
    };
    assert_eq!(*key, Key::of::<Config>());
    assert_eq!(containers, &vec!["left".to_string(), "right".to_string()]);
}

#[test]
fn own_binding_settles_sibling_conflict() {
    let child = DiBuilder::new()
        .with_parent(container_with("left"))
        .with_parent(container_with("right"))
        .add_instance(Config { name: "own" })
        .build()
        .unwrap();

    assert_eq!(child.require::<Config>().unwrap().name, "own");
}

#[test]
fn overriding_sibling_wins() {
    let left = container_with("left");
    let right = DiBuilder::new()
        .label("right")
        .add_binding(Binding::instance(Config { name: "right" }).overriding())
        .build()
        .unwrap();

    let child = DiBuilder::new().with_parent(left).with_parent(right).build().unwrap();
    assert_eq!(child.require::<Config>().unwrap().name, "right");
}

#[test]
fn ignoring_sibling_yields() {
    let left = DiBuilder::new()
        .label("left")
        .add_binding(Binding::instance(Config { name: "left" }).policy(DuplicatePolicy::Ignore))
        .build()
        .unwrap();
    let right = container_with("right");

    let child = DiBuilder::new().with_parent(left).with_parent(right).build().unwrap();
    assert_eq!(child.require::<Config>().unwrap().name, "right");
}

#[test]
fn shared_ancestor_is_not_a_conflict() {
    let root = container_with("root");
    let left = root.child().label("left").build().unwrap();
    let right = root.child().label("right").build().unwrap();

    let child = DiBuilder::new().with_parent(left).with_parent(right).build().unwrap();
    assert_eq!(child.require::<Config>().unwrap().name, "root");
}

#[test]
fn qualifiers_separate_bindings() {
    let container = DiBuilder::new()
        .add_instance(Config { name: "default" })
        .add_instance_named("backup", Config { name: "backup" })
        .build()
        .unwrap();

    assert_eq!(container.require::<Config>().unwrap().name, "default");
    assert_eq!(container.require_named::<Config>("backup").unwrap().name, "backup");
    assert!(container.require_named::<Config>("other").is_err());
}

#[test]
fn provider_errors_name_the_binding() {
    let container = DiBuilder::new()
        .add_provider(|_| Err::<Config, DynError>("unreachable host".into()))
        .build()
        .unwrap();

    let err = container.require::<Config>().unwrap_err();
    assert!(matches!(err, RequireError::ProviderFailed { key, .. } if key == Key::of::<Config>()));
    assert!(err.to_string().contains("unreachable host"));
}

#[test]
fn dropping_container_drops_scoped_values() {
    let container = DiBuilder::new()
        .add_scoped_provider(|_| Ok::<_, DynError>(String::from("scoped")))
        .build()
        .unwrap();

    let value = container.require::<String>().unwrap();
    assert_eq!(Arc::strong_count(&value), 2);
    drop(container);
    assert_eq!(Arc::strong_count(&value), 1);
}

use heapcascade::addressing::ChildSpan;
use heapcascade::cascade::{PipelineQueue, QUEUE_CAPACITY};
use heapcascade::geometry::{HeapGeometry, cluster_size};
use heapcascade::pipeline::PrefixCounters;
use heapcascade::prelude::*;

const COUNT: usize = 5000;

/// Every slot is the child of exactly one parent, and `descend` agrees with `locate`.
fn check_tree<A>(addressing: &A)
where
    A: Addressing,
    A::Cursor: PartialEq + std::fmt::Debug,
{
    let mut parents = vec![None; COUNT];
    for slot in 0..COUNT {
        let cursor = addressing.locate(slot);
        assert_eq!(addressing.slot(&cursor), slot);

        let degree = addressing.degree(&cursor);
        assert!(degree <= addressing.arity());
        for k in 0..degree {
            let Some(child) = addressing.child_slot(&cursor, k, COUNT) else {
                continue;
            };
            assert!(child > slot, "child {} of {} is not after it", child, slot);
            assert!(parents[child].is_none(), "slot {} has two parents", child);
            parents[child] = Some(slot);

            let descended = addressing.descend(&cursor, k);
            assert_eq!(descended, addressing.locate(child));
            assert_eq!(addressing.parent_slot(child), Some(slot));
        }
    }

    assert_eq!(addressing.parent_slot(0), None);
    assert!(parents.iter().skip(1).all(|p| p.is_some()));
}

fn check_predecessor<A>(addressing: &A)
where
    A: Addressing,
    A::Cursor: PartialEq + std::fmt::Debug,
{
    let mut cursor = addressing.locate(COUNT - 1);
    for slot in (0..COUNT - 1).rev() {
        cursor = addressing.predecessor(&cursor).unwrap();
        assert_eq!(cursor, addressing.locate(slot));
    }
    assert!(addressing.predecessor(&cursor).is_none());
}

/// `last_internal` is exactly the highest slot with a live child.
fn check_last_internal<A: Addressing>(addressing: &A) {
    let mut highest = 0;
    for count in 1..COUNT {
        if count >= 2 {
            highest = highest.max(addressing.parent_slot(count - 1).unwrap());
        }
        assert_eq!(addressing.last_internal(count), highest, "count {}", count);
    }
}

#[test]
fn test_flat_trees() {
    check_tree(&FlatAddressing::<2>::new(Base::Zero));
    check_tree(&FlatAddressing::<2>::new(Base::One));
    check_tree(&FlatAddressing::<3>::new(Base::Zero));
    check_tree(&FlatAddressing::<3>::new(Base::One));
    check_tree(&FlatAddressing::<4>::new(Base::One));
    check_tree(&FlatAddressing::<8>::new(Base::Zero));
    check_predecessor(&FlatAddressing::<4>::new(Base::One));
}

#[test]
fn test_clustered_trees() {
    for levels in 1..=4 {
        check_tree(&ClusteredAddressing::<2>::new(levels));
        check_tree(&ClusteredAddressing::<3>::new(levels));
        check_tree(&ClusteredAddressing::<4>::new(levels));
        check_tree(&ClusteredAddressing::<8>::new(levels));

        check_predecessor(&ClusteredAddressing::<2>::new(levels));
        check_predecessor(&ClusteredAddressing::<8>::new(levels));
    }
}

#[test]
fn test_rootless_trees() {
    for levels in 1..=4 {
        check_tree(&RootlessAddressing::<2>::new(levels));
        check_tree(&RootlessAddressing::<3>::new(levels));
        check_tree(&RootlessAddressing::<4>::new(levels));
        check_tree(&RootlessAddressing::<8>::new(levels));

        check_predecessor(&RootlessAddressing::<2>::new(levels));
        check_predecessor(&RootlessAddressing::<4>::new(levels));
    }
}

#[test]
fn test_hybrid_trees() {
    // Depth 8 puts the first small cluster at 3280, inside COUNT.
    for top_levels in [1, 2, 3, 5, 8] {
        let hybrid = HybridAddressing::new(top_levels);
        check_tree(&hybrid);
        check_predecessor(&hybrid);
    }
    assert_eq!(HybridAddressing::default().top_size(), 3280);
}

#[test]
fn test_last_internal_is_tight() {
    check_last_internal(&FlatAddressing::<2>::new(Base::Zero));
    check_last_internal(&FlatAddressing::<3>::new(Base::One));
    for levels in 1..=4 {
        check_last_internal(&ClusteredAddressing::<2>::new(levels));
        check_last_internal(&ClusteredAddressing::<4>::new(levels));
        check_last_internal(&RootlessAddressing::<2>::new(levels));
        check_last_internal(&RootlessAddressing::<8>::new(levels));
    }
    for top_levels in [1, 2, 5, 8] {
        check_last_internal(&HybridAddressing::new(top_levels));
    }

    // Binary clusters of two levels: slot 6 roots a cluster whose parent is slot 1,
    // but slot 5 is a child of slot 3.
    let clustered = ClusteredAddressing::<2>::new(2);
    assert_eq!(clustered.parent_slot(6), Some(1));
    assert_eq!(clustered.last_internal(7), 3);
}

#[test]
fn test_flat_numberings_describe_the_same_tree() {
    let zero = FlatAddressing::<3>::new(Base::Zero);
    let one = FlatAddressing::<3>::new(Base::One);
    for slot in 1..COUNT {
        assert_eq!(zero.parent_slot(slot), one.parent_slot(slot));
    }
    assert_eq!(one.root(), 1);
    assert_eq!(zero.root(), 0);
    assert_eq!(one.last_internal(10), 2);
    assert_eq!(zero.last_internal(10), 2);
}

#[test]
fn test_clustered_child_spans() {
    // Binary clusters of three levels: 7 nodes, 8 child clusters behind each.
    let clustered = ClusteredAddressing::<2>::new(3);
    let g = clustered.geometry();
    assert_eq!(g.cluster_size, 7);
    assert_eq!(g.last_level_start, 3);
    assert_eq!(g.last_level_size, 4);
    assert_eq!(g.fanout, 8);

    let inner = clustered.locate(1);
    assert_eq!(clustered.children(&inner), ChildSpan { first: 3, stride: 1 });

    // Last-level slot 3 owns the first two child clusters.
    let last = clustered.locate(3);
    assert_eq!(clustered.children(&last), ChildSpan { first: 7, stride: 7 });
    let last = clustered.locate(6);
    assert_eq!(clustered.children(&last), ChildSpan { first: 49, stride: 7 });

    let child = clustered.descend(&clustered.locate(6), 1);
    assert_eq!(clustered.slot(&child), 56);
    assert_eq!(clustered.parent_slot(56), Some(6));
}

#[test]
fn test_rootless_child_spans() {
    // Binary blocks of three levels: 2 + 4 + 8 = 14 slots behind the root.
    let rootless = RootlessAddressing::<2>::new(3);
    assert_eq!(rootless.cluster_size(), 14);

    let root = rootless.root();
    assert_eq!(rootless.children(&root), ChildSpan { first: 1, stride: 1 });

    // Block-relative 0 has children at relative 2 and 3.
    let top = rootless.locate(1);
    assert_eq!(rootless.children(&top), ChildSpan { first: 3, stride: 1 });

    // Relative 6 is the first last-level node and owns block 1.
    let last = rootless.locate(7);
    assert_eq!(rootless.children(&last), ChildSpan { first: 15, stride: 1 });
    let last = rootless.locate(14);
    assert_eq!(rootless.children(&last), ChildSpan { first: 113, stride: 1 });

    let child = rootless.descend(&rootless.locate(14), 1);
    assert_eq!(child.slot, 114);
    assert_eq!(child.cluster, 8);
    assert_eq!(rootless.parent_slot(114), Some(14));
    assert_eq!(rootless.parent_slot(2), Some(0));
}

#[test]
fn test_hybrid_child_spans() {
    let hybrid = HybridAddressing::default();
    let top = hybrid.top_size();

    // Ternary inside the top cluster.
    assert_eq!(hybrid.degree(&0), 3);
    assert_eq!(hybrid.children(&0), ChildSpan { first: 1, stride: 1 });
    assert_eq!(hybrid.degree(&1092), 3);

    // The top cluster's last level starts at 1093 and owns 2187 small clusters.
    assert_eq!(hybrid.degree(&1093), 4);
    assert_eq!(hybrid.children(&1093).first, top);
    assert_eq!(hybrid.children(&3279).first, top + 2186 * 16);

    // First level of a small cluster: three children on its second level.
    assert_eq!(hybrid.degree(&top), 3);
    assert_eq!(hybrid.children(&(top + 2)).first, top + 10);
    assert_eq!(hybrid.parent_slot(top + 12), Some(top + 2));

    // Second level: four children, the first level of a later small cluster.
    assert_eq!(hybrid.degree(&(top + 4)), 4);
    assert_eq!(hybrid.children(&(top + 4)).first, top + 2187 * 16);
    assert_eq!(hybrid.children(&(top + 16 + 15)).first, top + (2187 + 23) * 16);
    assert_eq!(hybrid.parent_slot(top + 2187 * 16 + 3), Some(top + 4));
    assert_eq!(hybrid.parent_slot(top), Some(1093));
}

#[test]
fn test_geometry() {
    assert_eq!(cluster_size(0, 2), 0);
    assert_eq!(cluster_size(4, 2), 15);
    assert_eq!(cluster_size(3, 4), 21);
    assert_eq!(cluster_size(2, 8), 9);

    let g = HeapGeometry::new(4, 2);
    assert_eq!(g.cluster_size, 5);
    assert_eq!(g.last_level_start, 1);
    assert_eq!(g.fanout, 16);
    assert!(!g.is_last_level(0));
    assert!(g.is_last_level(4));
}

#[test]
fn test_queue_fifo_and_removal() {
    let mut queue = PipelineQueue::new(0u32);
    assert!(queue.is_empty());

    for value in 0..10 {
        queue.push_back(value);
    }
    assert_eq!(queue.len(), 10);

    // Drop the odd entries from the middle.
    let mut visited = Vec::new();
    queue.service(|value| {
        visited.push(*value);
        *value % 2 == 1
    });
    assert_eq!(visited, (0..10).collect::<Vec<_>>());
    assert_eq!(queue.len(), 5);
    assert!(queue.sanity_check());

    let remaining: Vec<u32> = queue.slots().map(|slot| *queue.get(slot)).collect();
    assert_eq!(remaining, vec![0, 2, 4, 6, 8]);

    queue.push_back(100);
    assert_eq!(queue.pop_front(), Some(0));
    assert_eq!(queue.pop_front(), Some(2));

    queue.service(|_| true);
    assert!(queue.is_empty());
    assert_eq!(queue.pop_front(), None);
    assert!(queue.sanity_check());
}

#[test]
fn test_queue_fills_to_capacity() {
    let mut queue = PipelineQueue::new(0usize);
    for round in 0..3 {
        for value in 0..QUEUE_CAPACITY {
            queue.push_back(value + round);
        }
        assert_eq!(queue.len(), QUEUE_CAPACITY);
        assert!(queue.sanity_check());

        for value in 0..QUEUE_CAPACITY {
            assert_eq!(queue.pop_front(), Some(value + round));
        }
        assert!(queue.is_empty());
    }
}

#[test]
fn test_prefix_counters() {
    // Frontier level 2 has nodes 4..=7 in one-based numbering.
    let mut counters = PrefixCounters::new(2);
    assert!(counters.is_clear());

    assert_eq!(counters.increment(5), 0);
    assert_eq!(counters.increment(5), 1);
    assert_eq!(counters.increment(7), 0);
    assert_eq!(counters.get(5), 2);
    assert_eq!(counters.get(4), 0);

    counters.decrement(5);
    counters.decrement(5);
    counters.decrement(7);
    assert!(counters.is_clear());
}

#[test]
fn test_config_validation() {
    assert!(HeapSortConfig::default().validate().is_ok());

    assert_eq!(
        HeapSortConfig::new().arity(5).validate(),
        Err(ConfigError::UnsupportedArity(5))
    );
    assert_eq!(
        HeapSortConfig::new()
            .arity(8)
            .strategy(Strategy::Straight)
            .layout(Layout::Clustered { levels: 7 })
            .validate(),
        Err(ConfigError::ClusterTooDeep { arity: 8, levels: 7 })
    );
    assert!(matches!(
        HeapSortConfig::new().arity(3).strategy(Strategy::Pipelined).validate(),
        Err(ConfigError::IncompatibleStrategy {
            strategy: Strategy::Pipelined,
            ..
        })
    ));
    assert!(matches!(
        HeapSortConfig::new()
            .strategy(Strategy::Cached)
            .layout(Layout::Clustered { levels: 3 })
            .validate(),
        Err(ConfigError::IncompatibleStrategy {
            strategy: Strategy::Cached,
            ..
        })
    ));
    assert_eq!(
        HeapSortConfig::new().top_levels(30).validate(),
        Err(ConfigError::TopLevelsOutOfRange(30))
    );

    // Out-of-range depths only matter to the pipelined engine.
    assert!(
        HeapSortConfig::new()
            .strategy(Strategy::Straight)
            .top_levels(30)
            .validate()
            .is_ok()
    );
    // Zero cluster levels is the flat layout.
    assert!(
        HeapSortConfig::new()
            .strategy(Strategy::Cached)
            .layout(Layout::Clustered { levels: 0 })
            .validate()
            .is_ok()
    );

    assert!(HeapSorter::new(HeapSortConfig::new().arity(7)).is_err());

    assert_eq!(
        HeapSortConfig::new()
            .arity(8)
            .strategy(Strategy::Straight)
            .layout(Layout::Rootless { levels: 6 })
            .validate(),
        Err(ConfigError::ClusterTooDeep { arity: 8, levels: 6 })
    );
    assert!(
        HeapSortConfig::new()
            .arity(8)
            .strategy(Strategy::Straight)
            .layout(Layout::Rootless { levels: 5 })
            .validate()
            .is_ok()
    );
    assert!(matches!(
        HeapSortConfig::new()
            .arity(2)
            .strategy(Strategy::Cascading)
            .layout(Layout::Hybrid { levels: 8 })
            .validate(),
        Err(ConfigError::IncompatibleLayout { .. })
    ));
    assert!(matches!(
        HeapSortConfig::new()
            .arity(3)
            .strategy(Strategy::Straight)
            .layout(Layout::Hybrid { levels: 0 })
            .validate(),
        Err(ConfigError::IncompatibleLayout { .. })
    ));
    assert_eq!(
        HeapSortConfig::new()
            .arity(3)
            .strategy(Strategy::Straight)
            .layout(Layout::Hybrid { levels: 11 })
            .validate(),
        Err(ConfigError::ClusterTooDeep { arity: 3, levels: 11 })
    );
    assert!(
        HeapSortConfig::new()
            .arity(3)
            .strategy(Strategy::Cascading)
            .layout(Layout::Hybrid { levels: 8 })
            .validate()
            .is_ok()
    );
    // The pipelined engine brings its own layout.
    assert!(matches!(
        HeapSortConfig::new()
            .layout(Layout::Rootless { levels: 3 })
            .validate(),
        Err(ConfigError::IncompatibleStrategy {
            strategy: Strategy::Pipelined,
            ..
        })
    ));
}

#[test]
fn test_config_parsing() {
    for strategy in Strategy::ALL {
        assert_eq!(strategy.to_string().parse::<Strategy>(), Ok(strategy));
    }
    assert_eq!("ahead-simple".parse::<Strategy>(), Ok(Strategy::AheadSimple));
    assert_eq!("flat".parse::<Layout>(), Ok(Layout::Flat));
    assert_eq!(
        "clustered:4".parse::<Layout>(),
        Ok(Layout::Clustered { levels: 4 })
    );
    assert_eq!("one".parse::<Base>(), Ok(Base::One));
    assert_eq!("0".parse::<Base>(), Ok(Base::Zero));

    let err = "bubble".parse::<Strategy>().unwrap_err();
    assert_eq!(err.to_string(), "unknown strategy `bubble`");
    assert_eq!(
        "rootless:3".parse::<Layout>(),
        Ok(Layout::Rootless { levels: 3 })
    );
    assert_eq!("hybrid".parse::<Layout>(), Ok(Layout::Hybrid { levels: 8 }));
    assert_eq!("hybrid:5".parse::<Layout>(), Ok(Layout::Hybrid { levels: 5 }));
    for layout in [
        Layout::Flat,
        Layout::Clustered { levels: 2 },
        Layout::Rootless { levels: 4 },
        Layout::Hybrid { levels: 6 },
    ] {
        assert_eq!(layout.to_string().parse::<Layout>(), Ok(layout));
    }
    assert!("clustered:x".parse::<Layout>().is_err());
    assert!("rootless".parse::<Layout>().is_err());
    assert!("tree".parse::<Layout>().is_err());
    assert!("two".parse::<Base>().is_err());

    let config = HeapSortConfig::new().top_levels(10);
    assert_eq!(
        config.to_string(),
        "arity=2 layout=flat strategy=pipelined top_levels=10"
    );
}

#[test]
fn test_base_shown_only_where_used() {
    let flat = HeapSortConfig::new().base(Base::Zero).strategy(Strategy::AheadSimple);
    assert!(flat.uses_base());
    assert_eq!(flat.to_string(), "arity=2 base=zero layout=flat strategy=ahead-simple");

    for strategy in [Strategy::Cached, Strategy::Pipelined] {
        let config = HeapSortConfig::new().base(Base::Zero).strategy(strategy);
        assert!(config.validate().is_ok());
        assert!(!config.uses_base());
        assert!(!config.to_string().contains("base="), "{config}");
    }

    let clustered = flat.layout(Layout::Clustered { levels: 3 });
    assert!(!clustered.uses_base());
    assert_eq!(
        clustered.to_string(),
        "arity=2 layout=clustered:3 strategy=ahead-simple"
    );

    // Ignored settings really are ignored.
    let input: Vec<u32> = (0..500).map(|i| (i * 7919) % 613).collect();
    for strategy in [Strategy::Cached, Strategy::Pipelined] {
        let mut zero = input.clone();
        let mut zero_count = Counting::new(Natural);
        HeapSorter::new(HeapSortConfig::new().base(Base::Zero).strategy(strategy))
            .unwrap()
            .sort_with(&mut zero, &mut zero_count);

        let mut one = input.clone();
        let mut one_count = Counting::new(Natural);
        HeapSorter::new(HeapSortConfig::new().base(Base::One).strategy(strategy))
            .unwrap()
            .sort_with(&mut one, &mut one_count);

        assert_eq!(zero, one);
        assert_eq!(zero_count.count(), one_count.count());
    }
}

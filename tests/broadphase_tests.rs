use glam::Vec2;
use kinetic2d::{Aabb, DynamicTree};

/// Minimal deterministic generator so the churn test is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_f32(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f32) / (u32::MAX >> 1) as f32
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }
}

fn random_aabb(rng: &mut Lcg) -> Aabb {
    let center = Vec2::new(rng.range(-50.0, 50.0), rng.range(-50.0, 50.0));
    let extent = Vec2::new(rng.range(0.1, 2.0), rng.range(0.1, 2.0));
    Aabb::new(center - extent, center + extent)
}

#[test]
fn tree_invariants_hold_under_random_churn() {
    let mut rng = Lcg(0x9e3779b97f4a7c15);
    let mut tree: DynamicTree<usize> = DynamicTree::new();
    let mut live = Vec::new();

    for round in 0..400usize {
        let action = (rng.next_f32() * 3.0) as usize;
        match action {
            0 => {
                let id = tree.create_proxy(random_aabb(&mut rng), round);
                live.push(id);
            }
            1 if !live.is_empty() => {
                let index = (rng.next_f32() * live.len() as f32) as usize % live.len();
                let displacement = Vec2::new(rng.range(-5.0, 5.0), rng.range(-5.0, 5.0));
                tree.move_proxy(live[index], random_aabb(&mut rng), displacement);
            }
            _ if !live.is_empty() => {
                let index = (rng.next_f32() * live.len() as f32) as usize % live.len();
                tree.destroy_proxy(live.swap_remove(index));
            }
            _ => {
                let id = tree.create_proxy(random_aabb(&mut rng), round);
                live.push(id);
            }
        }

        // Every internal node must contain its children, heights must be
        // consistent, and the pool must account for every node.
        assert!(tree.validate(), "tree invariants broken at round {round}");
        assert_eq!(tree.node_count() + tree.free_list_len(), tree.node_capacity());
    }

    for id in live {
        tree.destroy_proxy(id);
        assert!(tree.validate());
    }
    assert_eq!(tree.node_count(), 0);
}

#[test]
fn query_matches_brute_force() {
    let mut rng = Lcg(12345);
    let mut tree: DynamicTree<usize> = DynamicTree::new();
    let mut boxes = Vec::new();

    for i in 0..100usize {
        let aabb = random_aabb(&mut rng);
        tree.create_proxy(aabb, i);
        boxes.push(aabb);
    }

    for _ in 0..25 {
        let probe = random_aabb(&mut rng);

        let mut reported = Vec::new();
        tree.query(&probe, |proxy| {
            reported.push(tree.data(proxy));
            true
        });
        reported.sort_unstable();

        let mut expected: Vec<usize> = boxes
            .iter()
            .enumerate()
            .filter(|(_, aabb)| {
                // Fat AABBs contain the tight ones, so every true overlap
                // must be reported.
                aabb.overlaps(&probe)
            })
            .map(|(i, _)| i)
            .collect();
        expected.sort_unstable();

        for index in expected {
            assert!(reported.contains(&index), "missing overlap {index}");
        }
    }
}

#[test]
fn destroyed_proxies_are_not_reported() {
    let mut tree: DynamicTree<usize> = DynamicTree::new();
    let keep = tree.create_proxy(Aabb::new(Vec2::ZERO, Vec2::ONE), 1);
    let gone = tree.create_proxy(Aabb::new(Vec2::ZERO, Vec2::ONE), 2);
    tree.destroy_proxy(gone);

    let mut found = Vec::new();
    tree.query(&Aabb::new(Vec2::splat(-1.0), Vec2::splat(2.0)), |proxy| {
        found.push(tree.data(proxy));
        true
    });
    assert_eq!(found, vec![1]);
    let _ = keep;
}

#[test]
fn query_visitor_can_stop_early() {
    let mut tree: DynamicTree<usize> = DynamicTree::new();
    for i in 0..10 {
        tree.create_proxy(
            Aabb::new(Vec2::new(i as f32, 0.0), Vec2::new(i as f32 + 0.5, 0.5)),
            i,
        );
    }

    let mut visits = 0;
    tree.query(&Aabb::new(Vec2::splat(-100.0), Vec2::splat(100.0)), |_| {
        visits += 1;
        false
    });
    assert_eq!(visits, 1);
}

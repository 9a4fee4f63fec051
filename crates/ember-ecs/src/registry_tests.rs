use glam::Vec2;

use crate::color::Color;
use crate::entity::EntityHandle;
use crate::flags::{components, state};
use crate::registry::Registry;

fn count_active(reg: &Registry) -> u32 {
    (0..reg.capacity() as usize)
        .filter(|&i| reg.is_active(i))
        .count() as u32
}

fn assert_bijection(reg: &Registry) {
    assert_eq!(count_active(reg), reg.active_count());
    assert_eq!(reg.active_count() + reg.free_count(), reg.capacity());
}

#[test]
fn test_new_registry_pops_slot_zero_first() {
    let mut reg = Registry::new(16);
    let a = reg.create(1, Vec2::ZERO, 0, 0);
    let b = reg.create(1, Vec2::ZERO, 0, 0);
    assert_eq!(a, EntityHandle::new(0, 0));
    assert_eq!(b, EntityHandle::new(1, 0));
    assert_eq!(reg.max_used_bound(), 2);
    assert_bijection(&reg);
}

#[test]
fn test_create_destroy_churn() {
    let mut reg = Registry::default();
    let max = reg.capacity();
    let handles: Vec<_> = (0..1000)
        .map(|_| {
            reg.create(
                1,
                Vec2::ZERO,
                components::PHYSICS | components::SPRITE,
                state::ACTIVE | state::VISIBLE,
            )
        })
        .collect();
    assert!(handles.iter().all(|h| h.is_valid()));

    for h in handles.iter().filter(|h| h.id % 2 == 1) {
        assert!(reg.destroy(*h));
    }
    assert_eq!(reg.active_count(), 500);
    assert_eq!(reg.free_count(), max - 500);
    assert_bijection(&reg);

    let recreated: Vec<_> = (0..500)
        .map(|_| reg.create(1, Vec2::ZERO, 0, state::VISIBLE))
        .collect();
    for h in &recreated {
        assert!(h.id < 1000, "freed slots are reused first");
        assert_eq!(h.id % 2, 1);
        assert_eq!(h.generation, 1);
    }
    assert_eq!(reg.active_count(), 1000);
    assert_eq!(reg.max_used_bound(), 1000);
    assert_bijection(&reg);
}

#[test]
fn test_destroyed_handle_is_dead_forever() {
    let mut reg = Registry::new(4);
    let h = reg.create(0, Vec2::ZERO, 0, 0);
    assert!(reg.destroy(h));
    assert!(!reg.is_alive(h));

    let again = reg.create(0, Vec2::ZERO, 0, 0);
    assert_eq!(again.id, h.id);
    assert_ne!(again.generation, h.generation);
    assert!(!reg.is_alive(h));
    assert!(reg.is_alive(again));
}

#[test]
fn test_destroy_stale_or_invalid_is_noop() {
    let mut reg = Registry::new(4);
    let h = reg.create(0, Vec2::ZERO, 0, 0);
    assert!(reg.destroy(h));
    let free_before = reg.free_count();
    assert!(!reg.destroy(h));
    assert!(!reg.destroy(EntityHandle::INVALID));
    assert!(!reg.destroy(EntityHandle::new(99, 0)));
    assert_eq!(reg.free_count(), free_before);
    assert_bijection(&reg);
}

#[test]
fn test_create_on_full_registry_returns_invalid() {
    let mut reg = Registry::new(2);
    assert!(reg.create(0, Vec2::ZERO, 0, 0).is_valid());
    assert!(reg.create(0, Vec2::ZERO, 0, 0).is_valid());
    assert_eq!(reg.create(0, Vec2::ZERO, 0, 0), EntityHandle::INVALID);
    assert_eq!(reg.reserve_slot(), EntityHandle::INVALID);
    assert_bijection(&reg);
}

#[test]
fn test_max_used_bound_does_not_shrink() {
    let mut reg = Registry::new(8);
    let handles: Vec<_> = (0..5).map(|_| reg.create(0, Vec2::ZERO, 0, 0)).collect();
    for h in handles {
        reg.destroy(h);
    }
    assert_eq!(reg.active_count(), 0);
    assert_eq!(reg.max_used_bound(), 5);
}

#[test]
fn test_reserve_and_return() {
    let mut reg = Registry::new(4);
    let h = reg.reserve_slot();
    assert!(h.is_valid());
    assert!(reg.is_reserved(h));
    assert!(!reg.is_alive(h));
    assert_eq!(reg.free_count(), 3);

    assert!(reg.return_reserved(h));
    assert!(!reg.return_reserved(h), "double return is rejected");
    assert_eq!(reg.free_count(), 4);
    assert_bijection(&reg);
}

#[test]
fn test_return_reserved_rejects_active_slot() {
    let mut reg = Registry::new(4);
    let h = reg.create(0, Vec2::ZERO, 0, 0);
    assert!(!reg.return_reserved(h));
    assert!(reg.is_alive(h));
}

#[test]
fn test_reset_preserves_generations() {
    let mut reg = Registry::new(4);
    let a = reg.create(0, Vec2::new(5.0, 5.0), components::SPRITE, state::VISIBLE);
    let reserved = reg.reserve_slot();
    reg.reset();

    assert_eq!(reg.active_count(), 0);
    assert_eq!(reg.free_count(), 4);
    assert_eq!(reg.max_used_bound(), 0);
    assert!(!reg.is_alive(a));
    assert!(!reg.return_reserved(reserved));

    let b = reg.create(0, Vec2::ZERO, 0, 0);
    assert_eq!(b.id, a.id);
    assert_ne!(b.generation, a.generation);
    assert_eq!(reg.pos_x[b.index()], 0.0);
}

#[test]
fn test_clone_copies_payload_and_scrubs_transients() {
    let mut reg = Registry::new(8);
    let proto = reg.create(
        7,
        Vec2::new(10.0, 20.0),
        components::SPRITE | components::PHYSICS,
        state::VISIBLE | state::SLEEPING | state::CULLED | state::layer(2) | state::mask(4),
    );
    let p = proto.index();
    reg.vel_x[p] = 30.0;
    reg.size_w[p] = 64.0;
    reg.sprite_ids[p] = 42;
    reg.colors[p] = Color::RED;
    reg.material_id[p] = 2;
    reg.anim_frames[p] = 3;
    reg.anim_timers[p] = 0.7;
    reg.anim_start_sprites[p] = 40;

    let dst = reg.reserve_slot();
    assert!(reg.clone_into(dst, proto, Vec2::new(-1.0, -2.0)));

    let d = dst.index();
    assert!(reg.is_alive(dst));
    assert_eq!(reg.types[d], 7);
    assert_eq!(reg.position(d), Vec2::new(-1.0, -2.0));
    assert_eq!(reg.velocity(d), Vec2::ZERO);
    assert_eq!(reg.size_w[d], 64.0);
    assert_eq!(reg.sprite_ids[d], 42);
    assert_eq!(reg.colors[d], Color::RED);
    assert_eq!(reg.material_id[d], 2);
    assert_eq!(reg.anim_start_sprites[d], 40);
    assert_eq!(reg.anim_frames[d], 0);
    assert_eq!(reg.anim_timers[d], 0.0);
    assert_eq!(reg.state_flags[d] & (state::SLEEPING | state::CULLED), 0);
    assert_eq!(state::get_layer(reg.state_flags[d]), 2);
    assert_eq!(state::get_mask(reg.state_flags[d]), 4);
    assert_eq!(reg.active_count(), 2);
    assert_bijection(&reg);
}

#[test]
fn test_clone_determinism() {
    let mut reg = Registry::new(8);
    let proto = reg.create(3, Vec2::ZERO, components::SPRITE, state::VISIBLE | state::SLEEPING);
    reg.sprite_ids[proto.index()] = 9;

    let a = reg.reserve_slot();
    let b = reg.reserve_slot();
    let at = Vec2::new(4.0, 4.0);
    assert!(reg.clone_into(a, proto, at));
    assert!(reg.clone_into(b, proto, at));

    let (a, b) = (a.index(), b.index());
    assert_eq!(reg.position(a), reg.position(b));
    assert_eq!(reg.state_flags[a], reg.state_flags[b]);
    assert_eq!(reg.component_masks[a], reg.component_masks[b]);
    assert_eq!(reg.sprite_ids[a], reg.sprite_ids[b]);
    assert_eq!(reg.types[a], reg.types[b]);
}

#[test]
fn test_clone_from_dead_source_returns_reservation() {
    let mut reg = Registry::new(4);
    let proto = reg.create(0, Vec2::ZERO, 0, 0);
    reg.destroy(proto);

    let dst = reg.reserve_slot();
    let free_before = reg.free_count();
    assert!(!reg.clone_into(dst, proto, Vec2::ZERO));
    assert!(!reg.is_alive(dst));
    assert_eq!(reg.free_count(), free_before + 1);
    assert_bijection(&reg);
}

#[test]
fn test_clone_into_self_is_rejected() {
    let mut reg = Registry::new(4);
    let dst = reg.reserve_slot();
    assert!(!reg.clone_into(dst, dst, Vec2::ZERO));
    assert!(!reg.is_reserved(dst));
}

#[test]
fn test_clone_into_unreserved_slot_is_rejected() {
    let mut reg = Registry::new(4);
    let proto = reg.create(0, Vec2::ZERO, 0, 0);
    let free_slot = reg.handle_of(3);
    assert!(!reg.clone_into(free_slot, proto, Vec2::ZERO));
    assert!(!reg.is_active(3));
    assert_bijection(&reg);
}

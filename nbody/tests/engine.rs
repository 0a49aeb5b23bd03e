//! End-to-end scenarios and numerical-property tests driven entirely
//! through the public `Engine` facade.

use nbody::{BodyDataUpdates, BodyId, Engine, SimDataUpdates};

fn configured_engine(time_step: f64, theta: f64) -> Engine {
    let mut engine = Engine::new();
    engine.update_simulation(SimDataUpdates {
        time_step: Some(time_step),
        theta: Some(theta),
        ..Default::default()
    });
    engine
}

#[test]
fn single_body_constant_velocity() {
    let mut engine = configured_engine(1.0, 0.0);
    let id = engine.create_body();
    engine.update_body(
        id,
        BodyDataUpdates {
            enabled: Some(true),
            vel_x: Some(1.0),
            ..Default::default()
        },
    );

    for _ in 0..5 {
        engine.tick();
    }

    let body = engine.view().bodies().next().unwrap();
    assert_eq!(body.pos_x, 5.0);
    assert_eq!(body.pos_y, 0.0);
    assert_eq!(body.vel_x, 1.0);
    assert_eq!(body.acc_x, 0.0);
    assert_eq!(body.acc_y, 0.0);
}

#[test]
fn disabled_body_is_inert() {
    let mut engine = configured_engine(1.0, 0.0);

    let a = engine.create_body();
    engine.update_body(
        a,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(10.0),
            ..Default::default()
        },
    );
    let b = engine.create_body();
    engine.update_body(
        b,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(1.0),
            pos_x: Some(1.0),
            ..Default::default()
        },
    );
    let disabled = engine.create_body();
    engine.update_body(
        disabled,
        BodyDataUpdates {
            mass: Some(1.0),
            pos_y: Some(1.0),
            ..Default::default()
        },
    );

    engine.tick();

    let disabled_view = engine
        .view()
        .bodies()
        .find(|body| body.id == disabled.value())
        .unwrap();
    assert_eq!(disabled_view.pos_x, 0.0);
    assert_eq!(disabled_view.pos_y, 1.0);
}

#[test]
fn coincident_bodies_with_softening_feel_no_force() {
    let mut engine = configured_engine(1.0, 0.0);
    engine.update_simulation(SimDataUpdates {
        epsilon: Some(0.01),
        ..Default::default()
    });

    let a = engine.create_body();
    engine.update_body(
        a,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(1.0),
            pos_x: Some(1.0),
            pos_y: Some(1.0),
            ..Default::default()
        },
    );
    let b = engine.create_body();
    engine.update_body(
        b,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(10.0),
            pos_x: Some(1.0),
            pos_y: Some(1.0),
            ..Default::default()
        },
    );

    engine.tick();

    for body in engine.view().bodies() {
        assert_eq!(body.acc_x, 0.0);
        assert_eq!(body.acc_y, 0.0);
    }
}

#[test]
fn negative_mass_pair_runs_away() {
    let mut engine = configured_engine(1.0, 0.0);

    let positive = engine.create_body();
    engine.update_body(
        positive,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(1.0),
            pos_x: Some(1.0),
            ..Default::default()
        },
    );
    let negative = engine.create_body();
    engine.update_body(
        negative,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(-1.0),
            ..Default::default()
        },
    );

    engine.tick();

    let bodies: Vec<_> = engine.view().bodies().collect();
    for body in &bodies {
        assert!(body.vel_x > 0.0);
    }
    let dx = bodies[0].pos_x - bodies[1].pos_x;
    let dy = bodies[0].pos_y - bodies[1].pos_y;
    assert!(((dx * dx + dy * dy).sqrt() - 1.0).abs() < 1e-9);
}

#[test]
fn two_body_isolated_system_conserves_momentum_over_many_steps() {
    let mut engine = configured_engine(0.5, 0.0);

    let a = engine.create_body();
    engine.update_body(
        a,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(1.0),
            pos_x: Some(-10.0),
            vel_y: Some(1.0),
            ..Default::default()
        },
    );
    let b = engine.create_body();
    engine.update_body(
        b,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(1.0),
            pos_x: Some(10.0),
            vel_y: Some(-1.0),
            ..Default::default()
        },
    );

    for _ in 0..200 {
        engine.tick();
    }

    let (px, py): (f64, f64) = engine
        .view()
        .bodies()
        .map(|body| (body.vel_x * body.mass, body.vel_y * body.mass))
        .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
    assert!(px.abs() < 1e-9);
    assert!(py.abs() < 1e-9);
}

#[test]
fn four_body_symmetric_system_keeps_equal_radii_and_speeds() {
    let mut engine = configured_engine(0.1, 0.0);
    let corners = [
        (10.0, 0.0, 0.0, 1.0),
        (0.0, 10.0, -1.0, 0.0),
        (-10.0, 0.0, 0.0, -1.0),
        (0.0, -10.0, 1.0, 0.0),
    ];
    for (x, y, vx, vy) in corners {
        let id = engine.create_body();
        engine.update_body(
            id,
            BodyDataUpdates {
                enabled: Some(true),
                mass: Some(1.0),
                pos_x: Some(x),
                pos_y: Some(y),
                vel_x: Some(vx),
                vel_y: Some(vy),
                ..Default::default()
            },
        );
    }

    for _ in 0..100 {
        engine.tick();
    }

    let radii: Vec<f64> = engine
        .view()
        .bodies()
        .map(|b| (b.pos_x * b.pos_x + b.pos_y * b.pos_y).sqrt())
        .collect();
    let speeds: Vec<f64> = engine
        .view()
        .bodies()
        .map(|b| (b.vel_x * b.vel_x + b.vel_y * b.vel_y).sqrt())
        .collect();

    let r0 = radii[0];
    for r in &radii {
        assert!((r - r0).abs() < 1e-6, "radii diverged: {:?}", radii);
    }
    let s0 = speeds[0];
    for s in &speeds {
        assert!((s - s0).abs() < 1e-6, "speeds diverged: {:?}", speeds);
    }
}

fn total_energy(engine: &Engine) -> f64 {
    let bodies: Vec<_> = engine.view().bodies().collect();
    let g = engine.view().g_si();
    let kinetic: f64 = bodies
        .iter()
        .map(|b| 0.5 * b.mass * (b.vel_x * b.vel_x + b.vel_y * b.vel_y))
        .sum();
    let mut potential = 0.0;
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let dx = bodies[i].pos_x - bodies[j].pos_x;
            let dy = bodies[i].pos_y - bodies[j].pos_y;
            let d = (dx * dx + dy * dy).sqrt();
            potential -= g * bodies[i].mass * bodies[j].mass / d;
        }
    }
    kinetic + potential
}

#[test]
fn bound_two_body_orbit_conserves_energy_within_one_percent() {
    let mut engine = Engine::new();
    engine.update_simulation(SimDataUpdates {
        time_step: Some(1.0),
        theta: Some(0.0),
        g_si: Some(6.674_30e-11),
        epsilon: Some(0.01),
        ..Default::default()
    });

    let heavy = engine.create_body();
    engine.update_body(
        heavy,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(1.0),
            ..Default::default()
        },
    );
    let light = engine.create_body();
    engine.update_body(
        light,
        BodyDataUpdates {
            enabled: Some(true),
            mass: Some(1e-5),
            pos_y: Some(5.0),
            vel_x: Some(5.0),
            ..Default::default()
        },
    );

    let e0 = total_energy(&engine);
    for _ in 0..10_000 {
        engine.tick();
    }
    let e1 = total_energy(&engine);

    assert!(((e1 - e0) / e0).abs() < 0.01, "energy drifted by {}%", ((e1 - e0) / e0).abs() * 100.0);
}

#[test]
fn delete_body_then_create_reuses_the_freed_id() {
    let mut engine = Engine::new();
    let a = engine.create_body();
    let b = engine.create_body();
    assert!(engine.delete_body(a));
    let c = engine.create_body();
    assert_eq!(c, a);
    assert_ne!(c, b);
}

#[test]
fn delete_body_reports_missing_id_without_panicking() {
    let mut engine = Engine::new();
    assert!(!engine.delete_body(BodyId(999)));
}

use ivp_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

mod common;
use common::{Kepler, SHO, adaptive_methods, sho_exact};

/// Checks every reported step against its own boundary states.
#[derive(Default)]
struct BoundaryCheck {
    steps: usize,
    previous_end: Option<(f64, Vec<f64>)>,
}

impl SolOut for BoundaryCheck {
    fn solout(&mut self, interpolator: &StepInterpolator, _last: bool) -> ControlFlag {
        let mut y = vec![0.0; interpolator.dimension()];
        interpolator.interpolate(interpolator.previous_time(), &mut y);
        assert_eq!(y, interpolator.previous_state());
        interpolator.interpolate(interpolator.current_time(), &mut y);
        assert_eq!(y, interpolator.current_state());

        // consecutive steps join without a gap
        if let Some((t, state)) = &self.previous_end {
            assert_eq!(*t, interpolator.previous_time());
            assert_eq!(state.as_slice(), interpolator.previous_state());
        }
        self.previous_end = Some((interpolator.current_time(), interpolator.current_state().to_vec()));
        self.steps += 1;
        ControlFlag::Continue
    }
}

/// Continue-only event at a fixed time, to split steps.
struct Tick(f64);

impl EventHandler for Tick {
    fn g(&self, t: f64, _y: &[f64]) -> f64 {
        t - self.0
    }

    fn event_occurred(&mut self, _t: f64, _y: &[f64], _increasing: bool) -> Action {
        Action::Continue
    }
}

#[test]
fn interpolation_matches_step_boundaries() {
    let methods = adaptive_methods().into_iter().chain([Method::RK4]);
    for method in methods {
        let mut check = BoundaryCheck::default();
        let mut tick = Tick(1.234);
        let options = IVPOptions::builder()
            .method(method)
            .rtol(1e-8)
            .atol(1e-8)
            .solout(&mut check)
            .events(vec![(&mut tick as &mut dyn EventHandler, EventConfig::default())])
            .build();
        let sol = solve_ivp(&SHO, 0.0, 3.0, &[1.0, 0.0], options).unwrap();
        assert_eq!(sol.status, Status::Success);
        // the event splits one step in two
        assert_eq!(check.steps, sol.naccpt + 1, "{method:?}");
        assert_eq!(check.previous_end.map(|(t, _)| t), Some(3.0));
    }
}

#[test]
fn dense_output_derivative_follows_the_solution() {
    for method in adaptive_methods() {
        let sol = solve_ivp(&SHO, 0.0, 5.0, &[1.0, 0.0], common::default_opts_dense(method)).unwrap();
        let output = sol.continuous_output().unwrap();
        let mut dydt = [0.0; 2];
        for t in [0.3, 1.7, 2.9, 4.4] {
            output.interpolate_derivative(t, &mut dydt);
            let exact = sho_exact(t);
            // y0' = y1, y1' = -y0
            assert!((dydt[0] - exact[1]).abs() < 1e-6, "{method:?} at {t}");
            assert!((dydt[1] + exact[0]).abs() < 1e-6, "{method:?} at {t}");
        }
    }
}

/// Integrate with the method's integrator directly, collecting its steps.
fn record(method: Method, f: &Kepler, t_end: f64) -> ContinuousOutput {
    let settings = Settings::builder().rtol(1e-10).atol(1e-10).build();
    let y0 = f.initial_state();
    let mut y = [0.0; 4];
    let mut output = ContinuousOutput::new();
    let mut handlers = Handlers::new().with_solout(&mut output);
    let result = match method {
        Method::DOPRI5 => DormandPrince54::new(settings).and_then(|mut m| m.integrate(f, 0.0, &y0, t_end, &mut y, &mut handlers)),
        Method::DOP853 => DormandPrince853::new(settings).and_then(|mut m| m.integrate(f, 0.0, &y0, t_end, &mut y, &mut handlers)),
        Method::AdamsBashforth(k) => Adams::bashforth(k, settings).and_then(|mut m| m.integrate(f, 0.0, &y0, t_end, &mut y, &mut handlers)),
        Method::AdamsMoulton(k) => Adams::moulton(k, settings).and_then(|mut m| m.integrate(f, 0.0, &y0, t_end, &mut y, &mut handlers)),
        Method::RK4 => panic!("fixed step method"),
    };
    assert_eq!(result.unwrap().status, Status::Success);
    drop(handlers);
    output
}

#[test]
fn continuous_output_survives_serialization() {
    let kepler = Kepler { eccentricity: 0.6 };
    let t_end = 2.0 * std::f64::consts::PI;
    let mut rng = StdRng::seed_from_u64(20251018);

    for method in adaptive_methods() {
        let output = record(method, &kepler, t_end);
        let json = serde_json::to_string(&output).unwrap();
        let restored: ContinuousOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, output);
        assert_eq!(restored.initial_time(), Some(0.0));
        assert_eq!(restored.final_time(), Some(t_end));

        let mut a = [0.0; 4];
        let mut b = [0.0; 4];
        for _ in 0..1000 {
            let t = rng.gen_range(0.0..t_end);
            output.interpolate(t, &mut a);
            restored.interpolate(t, &mut b);
            assert_eq!(a, b, "{method:?} at {t}");

            let exact = kepler.position(t);
            let err = (a[0] - exact[0]).hypot(a[1] - exact[1]);
            assert!(err < 1e-6, "{method:?} at {t}: {err}");
        }
    }
}

#[test]
fn pieces_of_a_run_can_be_appended() {
    let options = || {
        IVPOptions::builder()
            .method(Method::DOP853)
            .rtol(1e-10)
            .atol(1e-10)
            .dense_output(true)
            .build()
    };
    let first = solve_ivp(&SHO, 0.0, 2.0, &[1.0, 0.0], options()).unwrap();
    let y_mid = first.y.last().unwrap().clone();
    let second = solve_ivp(&SHO, 2.0, 4.0, &y_mid, options()).unwrap();

    let mut merged = first.continuous_output().unwrap().clone();
    merged.append(second.continuous_output().unwrap()).unwrap();
    assert_eq!(merged.final_time(), Some(4.0));
    for t in [0.5, 1.999, 2.0, 3.5] {
        let y = merged.state_at(t).unwrap();
        assert!((y[0] - t.cos()).abs() < 1e-8, "at {t}");
    }

    // a model that starts somewhere else does not continue this one
    let detached = solve_ivp(&SHO, 5.0, 6.0, &[1.0, 0.0], options()).unwrap();
    assert!(matches!(
        merged.append(detached.continuous_output().unwrap()),
        Err(Error::IncompatibleOutput { .. })
    ));
}

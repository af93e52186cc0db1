use ivp_engine::prelude::*;

mod common;
use common::{Cubic, Kepler, SHO, cubic_exact, sho_exact};

fn sho_error(sol: &IVPSolution, t_end: f64) -> f64 {
    let y = sol.y.last().unwrap();
    let exact = sho_exact(t_end);
    (y[0] - exact[0]).abs().max((y[1] - exact[1]).abs())
}

/// Run an Adams method with every step pinned to `h`.
fn adams_fixed(method: Method, h: f64, t_end: f64) -> IVPSolution {
    let options = IVPOptions::builder()
        .method(method)
        .rtol(1e-3)
        .atol(1e-3)
        .first_step(h)
        .max_step(h)
        .build();
    solve_ivp(&SHO, 0.0, t_end, &[1.0, 0.0], options).unwrap()
}

#[test]
fn rk4_error_drops_by_order_when_halving() {
    let t_end = 2.0;
    let mut previous = f64::INFINITY;
    for h in [0.1, 0.05, 0.025, 0.0125] {
        let options = IVPOptions::builder().method(Method::RK4).first_step(h).build();
        let sol = solve_ivp(&SHO, 0.0, t_end, &[1.0, 0.0], options).unwrap();
        assert_eq!(sol.t_final, t_end);
        assert_eq!(sol.nrejct, 0);
        let err = sho_error(&sol, t_end);
        assert!(err < previous, "h = {h}: {err} vs {previous}");
        if previous.is_finite() {
            // fourth order: a factor near 16
            assert!(previous / err > 10.0, "h = {h}: ratio {}", previous / err);
        }
        previous = err;
    }
}

#[test]
fn adams_error_drops_when_halving() {
    let t_end = 2.0;
    for method in [
        Method::AdamsBashforth(3),
        Method::AdamsBashforth(4),
        Method::AdamsMoulton(3),
        Method::AdamsMoulton(4),
    ] {
        let mut previous = f64::INFINITY;
        for h in [0.04, 0.02, 0.01] {
            let sol = adams_fixed(method, h, t_end);
            assert_eq!(sol.nrejct, 0, "{method:?}");
            let err = sho_error(&sol, t_end);
            assert!(err < previous, "{method:?}, h = {h}: {err} vs {previous}");
            previous = err;
        }
        assert!(previous < 1e-5, "{method:?}: {previous}");
    }
}

#[test]
fn adams_is_exact_on_low_degree_polynomials() {
    for method in [Method::AdamsBashforth(3), Method::AdamsMoulton(3), Method::AdamsMoulton(5)] {
        let options = IVPOptions::builder()
            .method(method)
            .rtol(1e-10)
            .atol(1e-10)
            .first_step(0.1)
            .dense_output(true)
            .build();
        let sol = solve_ivp(&Cubic, 0.0, 3.0, &[1.0], options).unwrap();
        for (t, y) in sol.iter() {
            assert!((y[0] - cubic_exact(t)).abs() < 1e-9, "{method:?} at {t}");
        }
        for t in [0.05, 1.33, 2.71] {
            let y = sol.sol(t).unwrap();
            assert!((y[0] - cubic_exact(t)).abs() < 1e-9, "{method:?} dense at {t}");
        }
    }
}

#[test]
fn tighter_tolerances_give_smaller_errors() {
    let kepler = Kepler { eccentricity: 0.6 };
    let y0 = kepler.initial_state();
    let t_end = 2.0 * std::f64::consts::PI;
    for method in [Method::DOPRI5, Method::DOP853, Method::AdamsMoulton(5)] {
        let mut previous = f64::INFINITY;
        let mut previous_nfev = 0;
        for tol in [1e-5, 1e-7, 1e-9] {
            let options = IVPOptions::builder().method(method).rtol(tol).atol(tol).build();
            let sol = solve_ivp(&kepler, 0.0, t_end, &y0, options).unwrap();
            let y = sol.y.last().unwrap();
            let exact = kepler.position(t_end);
            let err = (y[0] - exact[0]).hypot(y[1] - exact[1]);
            assert!(err < previous, "{method:?}, tol = {tol}: {err} vs {previous}");
            assert!(sol.nfev > previous_nfev);
            previous = err;
            previous_nfev = sol.nfev;
        }
        assert!(previous < 1e-5, "{method:?}: {previous}");
    }
}

#[test]
fn step_statistics_are_consistent() {
    let kepler = Kepler { eccentricity: 0.8 };
    for method in [Method::DOPRI5, Method::DOP853, Method::AdamsBashforth(5), Method::AdamsMoulton(5)] {
        let options = IVPOptions::builder().method(method).rtol(1e-8).atol(1e-8).build();
        let sol = solve_ivp(&kepler, 0.0, 7.0, &kepler.initial_state(), options).unwrap();
        assert_eq!(sol.nstep, sol.naccpt + sol.nrejct, "{method:?}");
        assert!(sol.naccpt > 0);
        assert_eq!(sol.status, Status::Success);
    }
}

//! Unit tests for bs-core primitives.

#[cfg(test)]
mod ids {
    use crate::{RunId, Station};

    #[test]
    fn index_roundtrip() {
        let id = RunId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(RunId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(RunId(0) < RunId(1));
    }

    #[test]
    fn display() {
        assert_eq!(RunId(7).to_string(), "RunId(7)");
        assert_eq!(Station::Mailly.to_string(), "mailly");
        assert_eq!(Station::Moulin.to_string(), "moulin");
    }

    #[test]
    fn stations_in_table_order() {
        assert_eq!(Station::ALL, [Station::Mailly, Station::Moulin]);
    }
}

#[cfg(test)]
mod params {
    use crate::{ParamError, RunParameters};

    fn base() -> RunParameters {
        RunParameters::new(5, 3, 100, 0.3, 0.4, 11)
    }

    #[test]
    fn valid_parameters_pass() {
        let v = base().validate().unwrap();
        assert_eq!(v.init_mailly, 5);
        assert_eq!(v.init_moulin, 3);
        assert_eq!(v.steps, 100);
        assert_eq!(v.seed, 11);
        assert_eq!(v.total_bikes(), 8);
    }

    #[test]
    fn probability_bounds_are_inclusive() {
        let mut p = base();
        p.p1 = 0.0;
        p.p2 = 1.0;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn negative_counts_rejected() {
        let mut p = base();
        p.init_moulin = -1;
        assert_eq!(
            p.validate(),
            Err(ParamError::NegativeValue { field: "init_moulin", value: -1 })
        );

        let mut p = base();
        p.steps = -10;
        assert!(matches!(p.validate(), Err(ParamError::NegativeValue { field: "steps", .. })));

        let mut p = base();
        p.seed = -2;
        assert!(matches!(p.validate(), Err(ParamError::NegativeValue { field: "seed", .. })));
    }

    #[test]
    fn probability_out_of_range_rejected() {
        let mut p = base();
        p.p2 = 1.5;
        assert!(matches!(
            p.validate(),
            Err(ParamError::ProbabilityOutOfRange { field: "p2", .. })
        ));

        let mut p = base();
        p.p1 = -0.1;
        assert!(matches!(
            p.validate(),
            Err(ParamError::ProbabilityOutOfRange { field: "p1", .. })
        ));
    }

    #[test]
    fn nan_probability_rejected() {
        let mut p = base();
        p.p1 = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn largest_counts_do_not_overflow_total() {
        let v = RunParameters::new(i64::MAX, i64::MAX, 1, 0.5, 0.5, 0).validate().unwrap();
        assert_eq!(v.total_bikes(), 2 * (i64::MAX as u64));
    }

    #[test]
    fn error_messages_name_the_field() {
        let mut p = base();
        p.init_mailly = -4;
        let msg = p.validate().unwrap_err().to_string();
        assert!(msg.contains("init_mailly"), "got {msg}");
        assert!(msg.contains("-4"), "got {msg}");
    }
}

#[cfg(test)]
mod rng {
    use crate::{DrawSource, RunRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = RunRng::new(12345);
        let mut r2 = RunRng::new(12345);
        for _ in 0..100 {
            assert_eq!(r1.draw().to_bits(), r2.draw().to_bits());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut r0 = RunRng::new(0);
        let mut r1 = RunRng::new(1);
        assert_ne!(r0.draw(), r1.draw(), "adjacent seeds should diverge");
    }

    #[test]
    fn draws_in_unit_interval() {
        let mut rng = RunRng::new(7);
        for _ in 0..10_000 {
            let v = rng.draw();
            assert!((0.0..1.0).contains(&v), "draw {v} out of [0, 1)");
        }
    }
}

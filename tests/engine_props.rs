//! Property tests for the pet engine invariants.

use proptest::prelude::*;

use pixelgotchi::appearance::Appearance;
use pixelgotchi::pet::{Action, Needs, PetState, StatDelta, EXHAUSTED, STARVED};

const T0: f64 = 1_700_000_000.0;

#[derive(Clone, Debug)]
enum Op {
    Offline(f64),
    Act(Action),
    Nudge(StatDelta),
}

fn arb_needs() -> impl Strategy<Value = Needs> {
    (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64).prop_map(
        |(hunger, energy, fun, hygiene)| Needs {
            hunger,
            energy,
            fun,
            hygiene,
        },
    )
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-100.0..200_000.0f64).prop_map(Op::Offline),
        prop::sample::select(Action::ALL.to_vec()).prop_map(Op::Act),
        (-3.0..3.0f64, -3.0..3.0f64, -3.0..3.0f64, -3.0..3.0f64).prop_map(
            |(hunger, energy, fun, hygiene)| Op::Nudge(StatDelta {
                hunger,
                energy,
                fun,
                hygiene,
            })
        ),
    ]
}

fn apply(st: &mut PetState, op: &Op) {
    match op {
        Op::Offline(dt) => {
            st.apply_offline(st.last_timestamp() + dt);
        }
        Op::Act(a) => st.perform(*a),
        Op::Nudge(d) => st.nudge(*d),
    }
}

fn in_range(st: &PetState) -> bool {
    [st.hunger(), st.energy(), st.fun(), st.hygiene()]
        .iter()
        .all(|v| (0.0..=1.0).contains(v))
}

proptest! {
    #[test]
    fn stats_stay_in_unit_range(
        needs in arb_needs(),
        asleep in any::<bool>(),
        ops in prop::collection::vec(arb_op(), 0..40),
    ) {
        let mut st = PetState::from_parts(needs, asleep, None, T0, Appearance::default());
        for op in &ops {
            apply(&mut st, op);
            prop_assert!(in_range(&st), "out of range after {:?}: {:?}", op, st);
        }
    }

    #[test]
    fn catch_up_is_idempotent(
        needs in arb_needs(),
        asleep in any::<bool>(),
        dt in 0.0..500_000.0f64,
    ) {
        let mut st = PetState::from_parts(needs, asleep, None, T0, Appearance::default());
        st.apply_offline(T0 + dt);
        let once = st.clone();
        let again = st.apply_offline(T0 + dt);
        prop_assert_eq!(again.elapsed, 0.0);
        prop_assert!(!again.died);
        prop_assert_eq!(st, once);
    }

    #[test]
    fn timestamp_never_goes_back(
        needs in arb_needs(),
        ops in prop::collection::vec(arb_op(), 0..40),
    ) {
        let mut st = PetState::from_parts(needs, false, None, T0, Appearance::default());
        let mut last = st.last_timestamp();
        for op in &ops {
            apply(&mut st, op);
            prop_assert!(st.last_timestamp() >= last);
            last = st.last_timestamp();
        }
    }

    #[test]
    fn death_is_permanent(
        needs in arb_needs(),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let mut st = PetState::from_parts(needs, false, None, T0, Appearance::default());
        // A full week awake is always fatal.
        st.apply_offline(T0 + 7.0 * 86_400.0);
        prop_assert!(!st.is_alive());
        let reason = st.death_reason().to_string();
        let frozen = st.needs();
        for op in &ops {
            apply(&mut st, op);
            prop_assert!(!st.is_alive());
            prop_assert!(!st.is_asleep());
            prop_assert_eq!(st.death_reason(), reason.as_str());
            prop_assert_eq!(st.needs(), frozen);
        }
    }

    #[test]
    fn starvation_wins_over_exhaustion(
        hunger in 0.999..=1.0f64,
        energy in 0.0..=0.001f64,
        fun in 0.0..=1.0f64,
        hygiene in 0.0..=1.0f64,
    ) {
        let needs = Needs { hunger, energy, fun, hygiene };
        let mut st = PetState::from_parts(needs, false, None, T0, Appearance::default());
        let c = st.apply_offline(T0);
        prop_assert!(c.died);
        prop_assert_eq!(st.death_reason(), STARVED);
    }

    #[test]
    fn reason_is_set_exactly_when_dead(
        needs in arb_needs(),
        asleep in any::<bool>(),
        dt in 0.0..1_000_000.0f64,
    ) {
        let mut st = PetState::from_parts(needs, asleep, None, T0, Appearance::default());
        st.apply_offline(T0 + dt);
        if st.is_alive() {
            prop_assert_eq!(st.death_reason(), "");
        } else {
            prop_assert!(st.death_reason() == STARVED || st.death_reason() == EXHAUSTED);
        }
    }
}

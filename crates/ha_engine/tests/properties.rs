//! Invariants swept over deterministic input grids.

use chrono::{Duration, TimeZone, Utc};
use ha_engine::aggro::AggroLevel;
use ha_engine::classifiers::{classify_risk_map, RiskInputs};
use ha_engine::composer::ev_gate;
use ha_engine::normalizers::{dominance_score, momentum, pressure_index, shadow_xg};
use ha_engine::{
    CooldownTracker, EngineConfig, InMemorySnapshotStore, LiveAnalysisInput, MatchStatSnapshot, Mode, Profile,
    RiskMap, TeamStats,
};

const COUNTS: [f64; 6] = [0.0, 1.0, 4.0, 9.0, 30.0, 250.0];
const POSSESSION: [f64; 5] = [0.0, 25.0, 50.0, 75.0, 100.0];
const XG: [Option<f64>; 5] = [None, Some(0.0), Some(0.3), Some(1.8), Some(6.0)];

fn within(value: f64, low: f64, high: f64) -> bool {
    value.is_finite() && value >= low && value <= high
}

#[test]
fn normalizers_stay_in_their_intervals() {
    for &shots in &COUNTS {
        for &sot in &COUNTS {
            for &poss in &POSSESSION {
                for &da in &COUNTS {
                    for &xg in &XG {
                        let rds = dominance_score(shots, sot, poss, da, xg);
                        assert!(within(rds, 0.0, 100.0), "rds {rds} for {shots}/{sot}/{poss}/{da}/{xg:?}");

                        let shadow = shadow_xg(da, shots, sot, xg);
                        assert!(within(shadow, 0.0, 1.5), "shadow {shadow}");

                        let p = pressure_index(sot, da, xg);
                        assert!(within(p.index, 0.0, 100.0), "pressure {}", p.index);
                    }
                    let m = momentum(da, sot, poss);
                    for w in [m.last5, m.last10, m.last15] {
                        assert!(within(w, 0.0, 100.0), "momentum window {w}");
                    }
                }
            }
        }
    }
}

#[test]
fn dominance_never_drops_when_one_input_grows() {
    let base = [6.0, 3.0, 50.0, 20.0];
    for slot in 0..4 {
        for xg in [None, Some(1.0)] {
            let mut previous = f64::MIN;
            for step in 0..=60 {
                let mut inputs = base;
                inputs[slot] = step as f64 * if slot == 2 { 2.0 } else { 1.0 };
                let rds = dominance_score(inputs[0], inputs[1], inputs[2], inputs[3], xg);
                assert!(rds >= previous, "slot {slot} step {step}: {rds} < {previous}");
                previous = rds;
            }
        }
    }

    // a reported xG takes over the slot the on-target count fills when xG is
    // missing, so the first small xG reads lower than no xG at all
    assert!(dominance_score(6.0, 3.0, 50.0, 20.0, Some(0.1)) < dominance_score(6.0, 3.0, 50.0, 20.0, None));
    assert_eq!(
        dominance_score(6.0, 3.0, 50.0, 20.0, Some(0.0)),
        dominance_score(6.0, 3.0, 50.0, 20.0, None)
    );

    let mut previous = f64::MIN;
    for step in 1..=40 {
        let rds = dominance_score(6.0, 3.0, 50.0, 20.0, Some(step as f64 * 0.1));
        assert!(rds >= previous, "xg step {step}");
        previous = rds;
    }
}

#[test]
fn risk_map_is_total_and_defaults_to_locked() {
    let mut seen = Vec::new();
    for shots in [0.0, 9.0, 12.0, 30.0] {
        for da in [0.0, 40.0, 80.0] {
            for xg in [0.0, 0.4, 1.5, 3.5] {
                for (rds_home, rds_away) in [(50.0, 45.0), (80.0, 30.0), (30.0, 80.0)] {
                    for score_diff in [-1, 0, 2] {
                        let map = classify_risk_map(&RiskInputs {
                            total_shots: shots,
                            dangerous_attacks: da,
                            total_xg: xg,
                            rds_home,
                            rds_away,
                            score_diff,
                        });
                        if !seen.contains(&map) {
                            seen.push(map);
                        }
                    }
                }
            }
        }
    }
    assert_eq!(seen.len(), 5, "{seen:?}");

    let nothing_specific = RiskInputs {
        total_shots:       12.0,
        dangerous_attacks: 30.0,
        total_xg:          1.0,
        rds_home:          50.0,
        rds_away:          45.0,
        score_diff:        0,
    };
    assert_eq!(classify_risk_map(&nothing_specific), RiskMap::Locked);
}

#[test]
fn ev_gate_holds_exactly_at_each_floor() {
    for level in AggroLevel::ALL {
        let floor = level.ev_floor();
        assert!(ev_gate(floor, level, Profile::UltraConservative, false), "{level:?} at floor");
        assert!(!ev_gate(floor - 1.0, level, Profile::UltraConservative, false), "{level:?} below floor");
        assert!(ev_gate(floor - 1.0, level, Profile::UltraConservative, true), "{level:?} green light");
    }
}

fn team(goals: u32, shots: u32, sot: u32, poss: f64, da: u32, reds: u32, xg: f64) -> TeamStats {
    TeamStats {
        goals,
        shots_total: shots,
        shots_on_target: sot,
        possession: poss,
        dangerous_attacks: da,
        corners: sot / 2,
        fouls: 10,
        red_cards: reds,
        xg: Some(xg),
        ..TeamStats::default()
    }
}

#[test]
fn any_red_flag_forces_a_zero_no_bet() {
    let base = Utc.with_ymd_and_hms(2026, 5, 10, 21, 0, 0).unwrap();
    let mut blocked_runs = 0;
    let mut fixture_id = 0;

    for odd in [1.3, 1.55, 1.9, 2.6] {
        for minute in [30, 50, 65, 85] {
            for (home_reds, away_reds) in [(0, 0), (0, 1), (1, 1)] {
                for (away_xg, away_shots) in [(0.1, 1), (0.9, 8), (1.6, 14)] {
                    for mode in [Mode::Lab, Mode::Real] {
                        fixture_id += 1;
                        let input = LiveAnalysisInput {
                            snapshot: MatchStatSnapshot {
                                fixture_id,
                                home_team: "Cruzeiro".into(),
                                away_team: "Mirassol".into(),
                                minute,
                                home: team(1, 9, 4, 55.0, 35, home_reds, 1.2),
                                away: team(1, away_shots, away_shots / 2, 45.0, 25, away_reds, away_xg),
                            },
                            team_name: String::new(),
                            line: "+0.5".parse().unwrap(),
                            odd,
                            mode,
                            profile: Profile::Balanced,
                        };
                        let result = ha_engine::analyze_live(
                            &input,
                            &InMemorySnapshotStore::new(),
                            &mut CooldownTracker::new(180),
                            &EngineConfig::default(),
                            base + Duration::minutes(minute as i64),
                        );

                        let d = &result.decision;
                        assert!(within(d.confidence, 0.0, 100.0), "confidence {}", d.confidence);
                        if result.metrics.gates.blocked() {
                            blocked_runs += 1;
                            assert_eq!(d.confidence, 0.0, "fixture {fixture_id}");
                            assert!(d.recommendation.contains("NÃO APOSTAR"), "fixture {fixture_id}");
                            assert!(d.handicap.is_none());
                        }
                        if odd < 1.6 || away_reds > 0 {
                            assert!(result.metrics.gates.blocked(), "fixture {fixture_id} not vetoed");
                        }
                    }
                }
            }
        }
    }
    assert!(blocked_runs > 0);
}

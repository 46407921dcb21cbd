use chrono::{Duration, TimeZone, Utc};
use ha_engine::composer::{green_light, GreenLightInputs};
use ha_engine::gates::YellowFlag;
use ha_engine::normalizers::Trend;
use ha_engine::{
    Coherence, EngineConfig, HaEngine, LiveAnalysisInput, MatchStatSnapshot, Mode, Profile, RedFlag,
    RiskMap, SnapshotRepository, TeamStats,
};

fn side(shots: u32, sot: u32, possession: f64, da: u32) -> TeamStats {
    TeamStats {
        shots_total: shots,
        shots_on_target: sot,
        possession,
        dangerous_attacks: da,
        xg: None,
        ..TeamStats::default()
    }
}

fn stats(fixture_id: u64, minute: u32, home: TeamStats, away: TeamStats) -> MatchStatSnapshot {
    MatchStatSnapshot {
        fixture_id,
        home_team: "São Paulo".into(),
        away_team: "Ceará".into(),
        minute,
        home,
        away,
    }
}

fn live(snapshot: MatchStatSnapshot) -> LiveAnalysisInput {
    LiveAnalysisInput {
        snapshot,
        team_name: String::new(),
        line: "+1.0".parse().unwrap(),
        odd: 1.95,
        mode: Mode::Lab,
        profile: Profile::Balanced,
    }
}

#[test]
fn half_time_read_feeds_the_second_half() {
    let kickoff = Utc.with_ymd_and_hms(2026, 8, 2, 19, 0, 0).unwrap();
    let mut engine = HaEngine::default();

    let ht = engine.read_half_time(stats(5, 45, side(3, 1, 35.0, 10), side(12, 6, 65.0, 40)), kickoff);
    assert_eq!(ht.profile, "Visitante dominando");
    assert_eq!(engine.snapshots().len(), 1);

    let turned = stats(5, 75, side(20, 9, 68.0, 70), side(6, 6, 32.0, 42));
    let result = engine.analyze_live(&live(turned.clone()), kickoff + Duration::minutes(90));
    assert_eq!(result.metrics.classification.coherence, Coherence::ScriptBroken);

    // a different fixture has no half-time read
    let other = engine.analyze_live(&live(stats(6, 75, turned.home, turned.away)), kickoff + Duration::minutes(90));
    assert_eq!(other.metrics.classification.coherence, Coherence::Neutral);
}

#[test]
fn second_read_replaces_the_first() {
    let now = Utc::now();
    let mut engine = HaEngine::new(EngineConfig::default());
    engine.read_half_time(stats(9, 45, side(2, 0, 50.0, 5), side(2, 0, 50.0, 5)), now);
    engine.read_half_time(stats(9, 46, side(2, 0, 40.0, 5), side(9, 4, 60.0, 30)), now);

    assert_eq!(engine.snapshots().len(), 1);
    let stored = engine.snapshots().get(9).unwrap();
    assert_eq!(stored.stats.minute, 46);
}

#[test]
fn lock_window_is_per_fixture() {
    let now = Utc.with_ymd_and_hms(2026, 8, 2, 20, 0, 0).unwrap();
    let mut engine = HaEngine::default();

    // 60 dangerous attacks and 6 corners push the away shadow xG past the spike level
    let spiking = stats(
        11,
        70,
        TeamStats { xg: Some(1.0), ..side(8, 3, 50.0, 30) },
        TeamStats { xg: Some(1.2), corners: 6, ..side(10, 4, 50.0, 60) },
    );
    let first = engine.analyze_live(&live(spiking), now);
    assert!(first.metrics.gates.lock_window);

    let calm = stats(
        12,
        70,
        TeamStats { xg: Some(1.0), ..side(8, 3, 50.0, 20) },
        TeamStats { xg: Some(1.0), ..side(9, 4, 50.0, 15) },
    );
    let other = engine.analyze_live(&live(calm.clone()), now + Duration::seconds(30));
    assert!(!other.metrics.gates.lock_window);

    let same = engine.analyze_live(
        &live(MatchStatSnapshot { fixture_id: 11, ..calm }),
        now + Duration::seconds(60),
    );
    assert!(same
        .metrics
        .gates
        .red_flags
        .iter()
        .any(|f| matches!(f, RedFlag::LockWindow { remaining_secs: 120 })));
    assert_eq!(same.decision.confidence, 0.0);
}

#[test]
fn momentum_reads_the_current_totals_after_half_time() {
    let kickoff = Utc.with_ymd_and_hms(2026, 8, 9, 16, 0, 0).unwrap();
    let mut engine = HaEngine::default();
    engine.read_half_time(stats(21, 45, side(6, 2, 50.0, 24), side(5, 4, 50.0, 25)), kickoff);

    let now = stats(21, 60, side(8, 3, 50.0, 30), side(7, 5, 50.0, 30));
    let result = engine.analyze_live(&live(now), kickoff + Duration::minutes(75));

    let momentum = &result.metrics.normalized.momentum;
    assert_eq!(momentum.last5, 100.0);
    assert!(
        !result.metrics.gates.yellow_flags.contains(&YellowFlag::WeakMomentum),
        "{:?}",
        result.metrics.gates.yellow_flags
    );
}

fn all_green() -> GreenLightInputs {
    GreenLightInputs {
        blocked:         false,
        coherence:       Coherence::Neutral,
        trend:           Trend::Neutral,
        hot_moment:      false,
        shadow_xg:       0.30,
        risk_map:        RiskMap::Locked,
        ha_friendly:     true,
        confidence:      65.0,
        regime_approved: true,
    }
}

#[test]
fn green_light_needs_every_condition() {
    let base = all_green();
    assert!(green_light(&base));
    assert!(green_light(&GreenLightInputs { risk_map: RiskMap::Controlled, ..base }));
    assert!(green_light(&GreenLightInputs { coherence: Coherence::ScriptConfirmed, trend: Trend::Rising, ..base }));

    let failing = [
        GreenLightInputs { blocked: true, ..base },
        GreenLightInputs { coherence: Coherence::ScriptBroken, ..base },
        GreenLightInputs { trend: Trend::Falling, ..base },
        GreenLightInputs { hot_moment: true, ..base },
        GreenLightInputs { shadow_xg: 0.31, ..base },
        GreenLightInputs { risk_map: RiskMap::Chaotic, ..base },
        GreenLightInputs { risk_map: RiskMap::Explosive, ..base },
        GreenLightInputs { risk_map: RiskMap::Dead, ..base },
        GreenLightInputs { ha_friendly: false, ..base },
        GreenLightInputs { confidence: 64.9, ..base },
        GreenLightInputs { regime_approved: false, ..base },
    ];
    for (i, inputs) in failing.iter().enumerate() {
        assert!(!green_light(inputs), "case {i}: {inputs:?}");
    }
}

/// Locked 0-0 at 58', away side on top: 63.2% real probability.
fn locked_underdog_game(fixture_id: u64) -> MatchStatSnapshot {
    stats(
        fixture_id,
        58,
        TeamStats { xg: Some(0.6), corners: 3, fouls: 9, ..side(7, 2, 48.0, 22) },
        TeamStats { xg: Some(1.1), corners: 2, fouls: 8, ..side(10, 5, 52.0, 30) },
    )
}

#[test]
fn green_light_waives_the_balanced_ev_edge() {
    let mut engine = HaEngine::default();
    let now = Utc.with_ymd_and_hms(2026, 8, 9, 18, 0, 0).unwrap();

    // +1.5 at 1.60 is a heavy-shield entry with EV below 2%
    let input = LiveAnalysisInput { line: "+1.5".parse().unwrap(), odd: 1.60, ..live(locked_underdog_game(31)) };
    let result = engine.analyze_live(&input, now);
    let d = &result.decision;

    assert!(d.real_probability >= 62.0, "{}", d.real_probability);
    assert!(d.ev > 0.0 && d.ev <= 2.0, "{}", d.ev);
    assert!(result.metrics.green_light, "{:#?}", d.justification);
    assert!(d.recommends(), "{:#?}", d.justification);
    assert!(d.justification.iter().any(|l| l.contains("piso de EV dispensado")));

    // a tight line rejects the regime, so the same EV has no edge
    let tight = LiveAnalysisInput { line: "+0.5".parse().unwrap(), odd: 1.60, ..live(locked_underdog_game(32)) };
    let result = engine.analyze_live(&tight, now);
    assert!(!result.metrics.green_light);
    assert!(!result.decision.recommends());
    assert!(result.decision.justification.iter().any(|l| l.contains("Sem edge matemático")));
}

#[test]
fn new_favourite_chances_open_the_dead_zone() {
    let kickoff = Utc.with_ymd_and_hms(2026, 8, 9, 21, 0, 0).unwrap();
    let mut engine = HaEngine::default();

    let ht = engine.read_half_time(stats(41, 45, side(12, 2, 65.0, 40), side(3, 0, 35.0, 10)), kickoff);
    assert!(ht.rds_home > ht.rds_away);

    let one_more = stats(41, 55, side(13, 3, 62.0, 44), side(5, 1, 38.0, 14));
    let result = engine.analyze_live(&live(one_more), kickoff + Duration::minutes(70));
    assert!(!result.metrics.gates.red_flags.iter().any(|f| matches!(f, RedFlag::DeadZone { reasons }
        if reasons.iter().any(|r| r.contains("chances contra")))));

    let two_more = stats(41, 60, side(15, 4, 62.0, 48), side(5, 1, 38.0, 15));
    let result = engine.analyze_live(&live(two_more), kickoff + Duration::minutes(75));
    assert!(result.metrics.gates.dead_zone);
    assert!(
        result.metrics.gates.red_flags.iter().any(|f| matches!(f, RedFlag::DeadZone { reasons }
            if reasons.iter().any(|r| r == "2 chances contra"))),
        "{:?}",
        result.metrics.gates.red_flags
    );
    assert!(!result.decision.recommends());
    assert_eq!(result.decision.confidence, 0.0);
}

use chrono::Utc;
use ha_engine::classifiers::{compare_half_to_full_time, detect_time_bomb, time_bomb_score};
use ha_engine::normalizers::{dominance_score, Level, Trend};
use ha_engine::opc::{analyze_opc, OpcInputs, OPC_NOT_NEEDED};
use ha_engine::{
    Coherence, CooldownTracker, EngineConfig, HalfTimeSnapshot, InMemorySnapshotStore, LiveAnalysisInput,
    MatchStatSnapshot, Mode, OpcStatus, Profile, RedFlag, TeamStats,
};

fn side(shots: u32, sot: u32, possession: f64, da: u32, xg: Option<f64>) -> TeamStats {
    TeamStats {
        shots_total: shots,
        shots_on_target: sot,
        possession,
        dangerous_attacks: da,
        xg,
        ..TeamStats::default()
    }
}

fn snapshot(minute: u32, home: TeamStats, away: TeamStats) -> MatchStatSnapshot {
    MatchStatSnapshot {
        fixture_id: 1_208_311,
        home_team:  "Flamengo".into(),
        away_team:  "Vitória".into(),
        minute,
        home,
        away,
    }
}

#[test]
fn empty_box_score_has_zero_dominance() {
    assert_eq!(dominance_score(0.0, 0.0, 0.0, 0.0, None), 0.0);
    assert_eq!(TeamStats::default().dominance(), 0.0);
}

#[test]
fn away_script_turned_by_the_favourite_is_broken() {
    let first_half = snapshot(45, side(3, 1, 35.0, 10, None), side(12, 6, 65.0, 40, None));
    let ht = HalfTimeSnapshot::capture(first_half, Utc::now());
    assert!(ht.rds_away > ht.rds_home + 10.0, "ht {} vs {}", ht.rds_away, ht.rds_home);

    let now = snapshot(75, side(20, 9, 68.0, 70, None), side(6, 6, 32.0, 42, None));
    let coherence = compare_half_to_full_time(Some(&ht), 70.0, 30.0, &now);
    assert_eq!(coherence, Coherence::ScriptBroken);
    assert_eq!(coherence.label(), "ROTEIRO ROMPIDO");
}

#[test]
fn loaded_game_is_a_time_bomb() {
    assert_eq!(time_bomb_score(1.6, 0.55, 75.0, 7.0), 10);
    assert!(detect_time_bomb(1.6, 0.55, 75.0, 7.0));
    assert!(!detect_time_bomb(1.6, 0.4, 60.0, 7.0));
}

#[test]
fn odd_below_floor_zeroes_a_favourable_game() {
    let stats = snapshot(
        58,
        TeamStats { fouls: 9, corners: 3, ..side(7, 2, 48.0, 22, Some(0.6)) },
        TeamStats { fouls: 8, corners: 2, ..side(10, 5, 52.0, 18, Some(1.1)) },
    );
    let input = LiveAnalysisInput {
        snapshot:  stats,
        team_name: String::new(),
        line:      "+0.5".parse().unwrap(),
        odd:       1.5,
        mode:      Mode::Lab,
        profile:   Profile::Balanced,
    };
    let result = ha_engine::analyze_live(
        &input,
        &InMemorySnapshotStore::new(),
        &mut CooldownTracker::new(180),
        &EngineConfig::default(),
        Utc::now(),
    );

    let flags = &result.metrics.gates.red_flags;
    assert!(
        flags.iter().any(|f| matches!(f, RedFlag::OddBelowFloor { odd, .. } if *odd == 1.5)),
        "{flags:?}"
    );
    assert_eq!(result.decision.confidence, 0.0);
    assert!(result.decision.recommendation.contains("NÃO APOSTAR"));
}

#[test]
fn opc_is_off_when_the_primary_has_an_edge() {
    let busy = OpcInputs {
        ev:             5.0,
        confidence:     70.0,
        coherence:      Coherence::ScriptBroken,
        trend:          Trend::Rising,
        momentum_last5: 95.0,
        pressure_index: 90.0,
        shadow_xg:      1.2,
        time_bomb:      true,
        dominance:      40.0,
        tempo:          Level::High,
        yellow_cards:   6,
        red_cards:      1,
        total_xg:       3.4,
        minute:         80,
    };
    let quiet = OpcInputs {
        momentum_last5: 0.0,
        pressure_index: 0.0,
        shadow_xg:      0.0,
        time_bomb:      false,
        yellow_cards:   0,
        red_cards:      0,
        total_xg:       0.2,
        ..busy
    };

    for inputs in [busy, quiet] {
        let verdict = analyze_opc(&inputs);
        assert_eq!(verdict.status, OpcStatus::Off);
        assert_eq!(verdict.rationale, OPC_NOT_NEEDED);
        assert!(verdict.signals.is_empty());
    }
}
